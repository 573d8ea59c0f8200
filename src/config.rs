#[derive(Debug, Clone)]
pub struct Config {
    pub upstream_url: String,
    pub port: u16,
}

impl Config {
    /// Reads `.env` if present, then `PORTAL_UPSTREAM_URL` and `PORT`.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();

        let upstream_url = std::env::var("PORTAL_UPSTREAM_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());
        let port: u16 = std::env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(8080);

        Self { upstream_url, port }
    }
}
