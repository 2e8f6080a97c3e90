use std::{env, net::SocketAddr, sync::Arc};

use axum::Router;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::info;

use service::notify::transport::{HttpMailer, LogMailer, MailTransport};
use service::notify::{spawn_dispatcher, Notifier};

use crate::auth::{ServerAuthConfig, ServerState};
use crate::routes;

/// Initialize logging via shared common utils
fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load host/port from configs or env vars, with sensible fallbacks
fn load_bind_addr(cfg: Option<&configs::AppConfig>) -> anyhow::Result<SocketAddr> {
    let (host, port) = match cfg {
        Some(cfg) => (cfg.server.host.clone(), cfg.server.port),
        None => {
            let host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
            let port = env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(8080);
            (host, port)
        }
    };
    Ok(format!("{}:{}", host, port).parse()?)
}

fn mail_transport(cfg: Option<&configs::AppConfig>) -> Arc<dyn MailTransport> {
    match cfg.map(|c| &c.mail) {
        Some(mail) if !mail.api_url.is_empty() => Arc::new(HttpMailer::new(mail)),
        _ => Arc::new(LogMailer),
    }
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    // Optional config file; env vars carry everything needed without one
    let cfg = configs::AppConfig::load_and_validate().ok();

    let db = match &cfg {
        Some(cfg) => models::db::connect_with_config(&cfg.database).await?,
        None => models::db::connect().await?,
    };
    migration::Migrator::up(&db, None).await?;

    let jwt_secret = cfg
        .as_ref()
        .map(|c| c.auth.jwt_secret.clone())
        .filter(|s| !s.is_empty())
        .or_else(|| env::var("JWT_SECRET").ok())
        .unwrap_or_else(|| "dev-secret-change-me".to_string());
    let token_ttl_hours = cfg.as_ref().map(|c| c.auth.token_ttl_hours).unwrap_or(12);

    // Notification side channel: enqueue after commit, deliver off-path
    let (notifier, rx) = Notifier::new();
    let _dispatcher = spawn_dispatcher(rx, mail_transport(cfg.as_ref()));

    let state = ServerState {
        db,
        auth: ServerAuthConfig { jwt_secret, token_ttl_hours },
        notifier,
    };

    let app: Router = routes::build_router(build_cors(), state);

    let addr = load_bind_addr(cfg.as_ref())?;
    info!(%addr, "starting bnb server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
