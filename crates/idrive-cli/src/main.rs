use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use idrive_core::models::NewUser;
use idrive_core::password::{hash_password, validate_password_policy};
use idrive_core::permissions::ROLE_ADMIN;
use idrive_core::{AuthConfig, AuthService};
use idrive_db::{Database, DatabaseConfig};

#[derive(Parser)]
#[command(name = "idrive", version, about = "iDrive scheduling backend administration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the Argon2 hash of a password, for seeding users by hand
    HashPassword {
        /// Plain-text password to hash
        password: String,

        /// Skip the password policy check
        #[arg(long, default_value_t = false)]
        allow_weak: bool,
    },

    /// Apply pending database migrations (requires DATABASE_URL)
    Migrate,

    /// Create an administrator account and print its temporary password
    CreateAdmin {
        /// Full name
        #[arg(long)]
        name: String,

        /// Login email
        #[arg(long)]
        email: String,

        /// National identity number (cédula)
        #[arg(long)]
        national_id: String,

        /// Ten-digit phone number, optionally prefixed with +57
        #[arg(long)]
        phone: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("idrive=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::HashPassword {
            password,
            allow_weak,
        } => cmd_hash_password(&password, allow_weak)?,
        Commands::Migrate => {
            let db = connect_db().await?;
            db.migrate().await.context("Failed to run migrations")?;
            tracing::info!("Migrations applied");
            db.close().await;
        }
        Commands::CreateAdmin {
            name,
            email,
            national_id,
            phone,
        } => {
            let db = connect_db().await?;
            let result = cmd_create_admin(&db, name, email, national_id, phone).await;
            db.close().await;
            result?;
        }
    }

    Ok(())
}

/// Connect to PostgreSQL using DATABASE_URL.
async fn connect_db() -> Result<Database> {
    let config = DatabaseConfig::from_env()
        .context("DATABASE_URL not set. Required for migrate and create-admin.")?;
    Database::connect(&config)
        .await
        .context("Failed to connect to database")
}

fn cmd_hash_password(password: &str, allow_weak: bool) -> Result<()> {
    if !allow_weak {
        validate_password_policy(password)?;
    }
    let hash = hash_password(password)?;
    println!("{hash}");
    Ok(())
}

async fn cmd_create_admin(
    db: &Database,
    name: String,
    email: String,
    national_id: String,
    phone: String,
) -> Result<()> {
    let auth_config = AuthConfig::from_env()?;
    let service = AuthService::new(db.user_repo(), auth_config);

    let created = service
        .create_user(NewUser {
            name,
            email,
            phone,
            national_id,
            role_id: ROLE_ADMIN,
        })
        .await
        .context("Failed to create administrator")?;

    println!("Administrator created");
    println!("  id:                 {}", created.user.id);
    println!("  email:              {}", created.user.email);
    println!("  temporary password: {}", created.temporary_password);
    println!();
    println!("The password must be changed at first login.");

    Ok(())
}
