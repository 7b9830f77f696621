use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Symmetric secret for signing identity tokens. Loaded once at
    /// startup; never mutated afterwards.
    pub jwt_secret: String,
    /// Token lifetime in days. Default: 30.
    pub token_ttl_days: i64,
    /// Origin used when building share URLs returned to clients.
    pub frontend_url: String,
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let jwt_secret = std::env::var("WAYMARK_JWT_SECRET")
        .unwrap_or_else(|_| "CHANGE_ME_DEV_ONLY_SECRET".into());

    if jwt_secret == "CHANGE_ME_DEV_ONLY_SECRET" {
        let env_mode = std::env::var("WAYMARK_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "WAYMARK_JWT_SECRET is still the insecure placeholder. \
                 Set a proper random secret before running in production."
            );
        }
        eprintln!("⚠️  WAYMARK_JWT_SECRET is not set — using insecure placeholder. Set a random secret for production.");
    }

    Ok(Config {
        port: std::env::var("WAYMARK_PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .unwrap_or(5000),
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/waymark".into()),
        jwt_secret,
        token_ttl_days: std::env::var("WAYMARK_TOKEN_TTL_DAYS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30),
        frontend_url: std::env::var("FRONTEND_URL")
            .unwrap_or_else(|_| "http://localhost:8000".into()),
    })
}
