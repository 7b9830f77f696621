use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use waymark::auth::{password, token::TokenSigner};
use waymark::share::RandomTokenSource;
use waymark::store::postgres::PgStore;
use waymark::store::{NewUser, UserStore};
use waymark::{config, AppState};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "waymark=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(cli::Commands::User { command }) => {
            let db = PgStore::connect(&cfg.database_url).await?;
            handle_user_command(&db, command).await
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Connecting to database...");
    let db = PgStore::connect(&cfg.database_url).await?;

    tracing::info!("Running migrations...");
    db.migrate().await?;

    let signer = TokenSigner::new(&cfg.jwt_secret, cfg.token_ttl_days);

    let state = Arc::new(AppState {
        users: Arc::new(db.clone()),
        routes: Arc::new(db),
        signer,
        share_tokens: Arc::new(RandomTokenSource),
        config: cfg.clone(),
    });

    let app = waymark::app(state)
        // Route payloads carry the raw provider response; 2 MB is plenty.
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer({
            use axum::http::{HeaderName, Method};
            use tower_http::cors::AllowOrigin;
            let frontend = cfg.frontend_url.clone();
            CorsLayer::new()
                .allow_origin(AllowOrigin::predicate(move |origin, _| {
                    let origin_str = origin.to_str().unwrap_or("");
                    origin_str == frontend
                        || origin_str.starts_with("http://localhost:")
                        || origin_str.starts_with("http://127.0.0.1:")
                }))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    HeaderName::from_static("content-type"),
                    HeaderName::from_static("authorization"),
                ])
        })
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Waymark API listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Middleware: injects a unique X-Request-Id into every response so
/// clients can correlate errors with server logs.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = axum::http::HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

/// Middleware: standard security headers on every response.
async fn security_headers_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();
    headers.insert("X-Content-Type-Options", "nosniff".parse().unwrap());
    headers.insert("X-Frame-Options", "DENY".parse().unwrap());
    // API responses may embed bearer-token-derived data; never cache.
    headers.insert("Cache-Control", "no-store".parse().unwrap());
    headers.insert("Referrer-Policy", "no-referrer".parse().unwrap());
    resp
}

async fn handle_user_command(db: &PgStore, cmd: cli::UserCommands) -> anyhow::Result<()> {
    match cmd {
        cli::UserCommands::Create {
            name,
            email,
            password,
        } => {
            let password_hash = password::hash(&password)?;
            let user = db
                .insert_user(NewUser {
                    name,
                    email: email.trim().to_lowercase(),
                    password_hash,
                })
                .await?;
            println!(
                "User created:\n  ID:     {}\n  Name:   {}\n  Email:  {}",
                user.id, user.name, user.email
            );
        }
    }
    Ok(())
}
