//! Gatehouse - credential verification and bearer-token authorization

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatehouse::{
    auth::PasswordHasher,
    config::{Args, LogFormat},
    credentials::{Authenticator, CredentialStore, MemoryCredentialStore},
    db::{MongoClient, MongoCredentialStore},
    server::{self, AppState, StoreBackend},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    // Initialize tracing/logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("gatehouse={},info", args.log_level).into());
    let registry = tracing_subscriber::registry().with(filter);
    match args.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Gatehouse v{}", env!("CARGO_PKG_VERSION"));
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("Token algorithm: {:?}", args.algorithm());
    info!("Token expiry: {}s", args.jwt_expiry_seconds);
    info!("MongoDB: {}", args.mongodb_uri);
    info!("======================================");

    let issuer = args.token_issuer()?;
    if args.jwt_secret.is_none() {
        warn!("No JWT_SECRET set - using an ephemeral secret, tokens will not survive a restart");
    }

    // MongoDB is optional in dev mode
    let (store, backend): (Arc<dyn CredentialStore>, StoreBackend) =
        match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
            Ok(client) => {
                info!("MongoDB connected");
                let store = MongoCredentialStore::new(&client).await?;
                (Arc::new(store) as Arc<dyn CredentialStore>, StoreBackend::Mongo)
            }
            Err(e) if args.dev_mode => {
                warn!("MongoDB connection failed, using in-memory store: {}", e);
                let store = MemoryCredentialStore::new();
                (Arc::new(store) as Arc<dyn CredentialStore>, StoreBackend::Memory)
            }
            Err(e) => {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        };

    let authenticator = Authenticator::new(
        store,
        PasswordHasher::default(),
        issuer,
        args.request_timeout(),
    );

    let state = Arc::new(AppState::new(args, authenticator, backend));
    server::run(state).await?;

    info!("Gatehouse stopped");
    Ok(())
}
