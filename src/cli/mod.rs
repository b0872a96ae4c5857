use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::app::{app, AppState};
use crate::auth::hash_password;
use crate::clock::{Clock, SystemClock};
use crate::config::{config, port_from_env, StoreBackend};
use crate::database::models::NewAlumnus;
use crate::database::{DatabaseManager, MemoryStore, PgStore, Store};

#[derive(Parser)]
#[command(name = "alumni-api")]
#[command(about = "Alumni and employment tracking API")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server")]
    Serve {
        #[arg(long, help = "Port to listen on (defaults to ALUMNI_API_PORT, PORT, then 3000)")]
        port: Option<u16>,

        #[arg(long, help = "Storage backend: postgres or memory (overrides STORE_BACKEND)")]
        backend: Option<String>,

        #[arg(long, env = "ADMIN_EMAIL", help = "Seed an admin account (memory backend only)")]
        admin_email: Option<String>,

        #[arg(long, env = "ADMIN_PASSWORD", help = "Password for the seeded admin account")]
        admin_password: Option<String>,
    },

    #[command(about = "Apply the PostgreSQL schema and exit")]
    Migrate,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port, backend, admin_email, admin_password } => {
            let backend = match backend {
                Some(raw) => StoreBackend::parse(&raw).with_context(|| format!("unknown backend '{}'", raw))?,
                None => config().database.backend,
            };
            let clock: Arc<dyn Clock> = Arc::new(SystemClock);
            let store = open_store(backend, clock.clone()).await?;

            if let (Some(email), Some(password)) = (admin_email, admin_password) {
                if backend == StoreBackend::Memory {
                    seed_admin(store.as_ref(), &email, &password).await?;
                }
            }

            serve(AppState::new(store, clock), port.or_else(port_from_env).unwrap_or(3000)).await
        }
        Commands::Migrate => {
            let pool = DatabaseManager::connect(&config().database).await?;
            DatabaseManager::migrate(&pool).await?;
            println!("✓ Schema applied");
            Ok(())
        }
    }
}

async fn open_store(backend: StoreBackend, clock: Arc<dyn Clock>) -> anyhow::Result<Arc<dyn Store>> {
    match backend {
        StoreBackend::Postgres => {
            let pool = DatabaseManager::connect(&config().database)
                .await
                .context("failed to connect to PostgreSQL")?;
            DatabaseManager::migrate(&pool).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new(clock))),
    }
}

/// Inserts an admin alumnus so a fresh in-memory store can be logged into.
async fn seed_admin(store: &dyn Store, email: &str, password: &str) -> anyhow::Result<()> {
    if store.get_alumnus_by_email(email).await?.is_some() {
        return Ok(());
    }
    let admin_role = store
        .list_roles()
        .await?
        .into_iter()
        .find(|r| r.name == "admin")
        .context("admin role is missing")?;

    let admin = store
        .create_alumnus(NewAlumnus {
            student_number: "ADMIN".to_string(),
            name: "Administrator".to_string(),
            major: "-".to_string(),
            cohort: 2000,
            graduation_year: 2000,
            email: email.to_string(),
            phone: None,
            address: None,
            password_hash: hash_password(password)?,
            role_id: admin_role.id,
        })
        .await?;
    info!("Seeded admin account {} (id {})", admin.email, admin.id);
    Ok(())
}

async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    info!("Starting alumni API in {:?} mode ({} store)", config().environment, state.store.backend_name());

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    println!("🚀 Alumni API listening on http://{}", bind_addr);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
