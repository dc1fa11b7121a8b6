use idrive_core::{AuthConfig, AuthService};
use idrive_db::{Database, UserRepository};

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub db: Database,
    pub auth: AuthService<UserRepository>,
    /// Echo raw reset tokens in responses (no mail delivery exists).
    pub expose_reset_tokens: bool,
}

impl AppState {
    pub fn new(db: Database, auth_config: AuthConfig, expose_reset_tokens: bool) -> Self {
        let auth = AuthService::new(db.user_repo(), auth_config);
        Self {
            db,
            auth,
            expose_reset_tokens,
        }
    }
}
