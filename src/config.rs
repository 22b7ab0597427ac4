use std::net::IpAddr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub host: IpAddr,
    pub port: u16,
    pub upload_dir: String,
    pub max_upload_size: usize,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;
        let jwt_secret = env_required("JWT_SECRET")?;

        let host: IpAddr = env_or("USERDESK_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid USERDESK_HOST: {e}"))?;

        let port: u16 = env_or("USERDESK_PORT", "5001")
            .parse()
            .map_err(|e| format!("Invalid USERDESK_PORT: {e}"))?;

        let upload_dir = env_or("USERDESK_UPLOAD_DIR", "uploads");

        let max_upload_size: usize = env_or("USERDESK_MAX_UPLOAD_SIZE", "5242880")
            .parse()
            .map_err(|e| format!("Invalid USERDESK_MAX_UPLOAD_SIZE: {e}"))?;

        let log_level = env_or("USERDESK_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            jwt_secret,
            host,
            port,
            upload_dir,
            max_upload_size,
            log_level,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
