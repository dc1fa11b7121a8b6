//! Permission names granted to roles and embedded in session tokens.

pub const USERS_CREATE: &str = "usuarios:crear";
pub const USERS_READ: &str = "usuarios:leer";
pub const USERS_EDIT: &str = "usuarios:editar";
pub const USERS_DELETE: &str = "usuarios:eliminar";

pub const CLASSES_CREATE: &str = "clases:crear";
pub const CLASSES_EDIT: &str = "clases:editar";
pub const CLASSES_DELETE: &str = "clases:eliminar";

pub const BOOKINGS_CREATE: &str = "agendamientos:crear";
pub const BOOKINGS_READ: &str = "agendamientos:leer";
pub const BOOKINGS_EDIT: &str = "agendamientos:editar";
pub const BOOKINGS_CONFIRM: &str = "agendamientos:confirmar";
pub const BOOKINGS_CANCEL: &str = "agendamientos:cancelar";

/// Every permission known to the application, in seeding order.
pub const ALL: &[&str] = &[
    USERS_CREATE,
    USERS_READ,
    USERS_EDIT,
    USERS_DELETE,
    CLASSES_CREATE,
    CLASSES_EDIT,
    CLASSES_DELETE,
    BOOKINGS_CREATE,
    BOOKINGS_READ,
    BOOKINGS_EDIT,
    BOOKINGS_CONFIRM,
    BOOKINGS_CANCEL,
];

/// Role ids seeded by the initial migration.
pub const ROLE_ADMIN: i64 = 1;
pub const ROLE_INSTRUCTOR: i64 = 2;
pub const ROLE_STUDENT: i64 = 3;
