use anyhow::{Context, Result};
use pkce_sso::application::{
    ports::{
        kv_store::ExpiringKvStore,
        mailer::VerificationMailer,
        security::{PasswordHasher, TokenSigner},
        time::Clock,
    },
    services::{ApplicationServices, ServicePorts, ServiceSettings},
};
use pkce_sso::config::AppConfig;
use pkce_sso::domain::user::UserDirectory;
use pkce_sso::infrastructure::{
    database,
    mailer::LoggingMailer,
    repositories::{InMemoryUserDirectory, PostgresUserDirectory},
    security::{Argon2PasswordHasher, JwtTokenSigner},
    store::{InMemoryKvStore, RedisKvStore},
    time::SystemClock,
};
use pkce_sso::presentation::http::{
    routes::build_router, session::SessionCookies, state::HttpState,
};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    if let Err(err) = bootstrap().await {
        tracing::error!(error = %err, "fatal error");
        eprintln!("fatal error: {err:#}");
        std::process::exit(1);
    }
}

async fn bootstrap() -> Result<()> {
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(mode = %config.mode(), "configuration loaded");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = build_store(&config, &clock).await?;
    let users = build_user_directory(&config).await?;

    let signer: Arc<dyn TokenSigner> = Arc::new(JwtTokenSigner::new(
        config.access_token_secret(),
        config.refresh_token_secret(),
        Arc::clone(&clock),
    ));
    let password_hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher);
    let mailer: Arc<dyn VerificationMailer> =
        Arc::new(LoggingMailer::new(!config.mode().is_production()));

    let services = Arc::new(ApplicationServices::new(
        ServicePorts {
            store,
            users,
            signer,
            password_hasher,
            mailer,
            clock,
        },
        ServiceSettings {
            mode: config.mode(),
            redirect_whitelist: config.redirect_whitelist().to_vec(),
            ip_limit: config.ip_limit().clone(),
            email_limit: config.email_limit().clone(),
            failure_policy: config.failure_policy(),
        },
    ));

    if std::env::args().nth(1).as_deref() == Some("clear-tokens") {
        let removed = services.tokens.clear_all().await?;
        tracing::info!(removed, "token state cleared");
        println!("cleared {removed} token entries");
        return Ok(());
    }

    let state = HttpState {
        services,
        cookies: SessionCookies::new(config.session_secret(), config.mode().is_production()),
        allowed_origins: Arc::from(config.allowed_origins()),
    };

    let app = build_router(state);
    let service = app.into_make_service_with_connect_info::<SocketAddr>();

    let listener = tokio::net::TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr()))?;
    let address: SocketAddr = listener.local_addr()?;
    tracing::info!("listening on {address}");

    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Redis when configured, otherwise a process-local store with a sweeper.
async fn build_store(
    config: &AppConfig,
    clock: &Arc<dyn Clock>,
) -> Result<Arc<dyn ExpiringKvStore>> {
    if let Some(url) = config.redis_url() {
        let store = RedisKvStore::from_url(url, config.store_key_prefix())?;
        store.ping().await.context("redis is unreachable")?;
        tracing::info!("using redis store");
        return Ok(Arc::new(store));
    }

    if config.mode().is_production() {
        tracing::warn!("REDIS_URL not set; state is process-local and lost on restart");
    }
    let store = Arc::new(InMemoryKvStore::new(Arc::clone(clock)));
    // Detached; the sweeper exits once the store is dropped.
    let _sweeper = store.spawn_sweeper(config.store_sweep_interval());
    Ok(store)
}

async fn build_user_directory(config: &AppConfig) -> Result<Arc<dyn UserDirectory>> {
    match config.database_url() {
        Some(url) => {
            let pool = database::init_pool(url).await?;
            database::run_migrations(&pool).await?;
            tracing::info!("using postgres user directory");
            Ok(Arc::new(PostgresUserDirectory::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; users are kept in memory");
            Ok(Arc::new(InMemoryUserDirectory::new()))
        }
    }
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .ok()
        .unwrap_or_else(|| "info,tower_http=info,sqlx=warn".to_string());

    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(env_filter))
        .with(tracing_subscriber::fmt::layer());

    if subscriber.try_init().is_err() {
        tracing::warn!("tracing subscriber already initialised");
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for CTRL+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
