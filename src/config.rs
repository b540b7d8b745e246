use std::env;

/// Server configuration, loaded once at startup and passed explicitly
/// into the application state.
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub session_secret: String,
    pub session_expiration_hours: i64,
    pub admin_username: String,
    pub admin_password: String,
    pub tracking_api_url: String,
}

impl Config {
    pub fn init() -> Self {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();

        Self {
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://database.sqlite".to_string()),
            session_secret: env::var("SESSION_SECRET").expect("SESSION_SECRET must be set"),
            session_expiration_hours: env::var("SESSION_EXPIRATION_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .expect("SESSION_EXPIRATION_HOURS must be a number"),
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").expect("ADMIN_PASSWORD must be set"),
            tracking_api_url: env::var("TRACKING_API_URL")
                .unwrap_or_else(|_| "https://api.uapis.cn/express".to_string()),
        }
    }

    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
