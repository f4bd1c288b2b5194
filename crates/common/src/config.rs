use serde::Deserialize;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Redis connection string
    pub redis_url: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub db_max_connections: u32,

    /// Port the API server binds on (default: 3000)
    pub api_port: u16,

    /// Redis sorted set holding deferred dispatch units
    pub dispatch_queue_key: String,

    /// How often the notifier worker looks for due units, in milliseconds (default: 1000)
    pub worker_poll_interval_ms: u64,

    /// Maximum number of due units claimed per poll (default: 100)
    pub worker_batch_size: usize,

    /// Telegram Bot API base URL; the bot token is appended to it
    pub telegram_api_url: String,

    /// Telegram bot token
    pub telegram_bot_token: Option<String>,

    /// Resend endpoint for outgoing email
    pub resend_api_url: String,

    /// Resend API key for email delivery
    pub resend_api_key: Option<String>,

    /// Email sender address
    pub email_from: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("API_PORT must be a valid u16"))?,
            dispatch_queue_key: std::env::var("DISPATCH_QUEUE_KEY")
                .unwrap_or_else(|_| "herald:dispatch:scheduled".to_string()),
            worker_poll_interval_ms: std::env::var("WORKER_POLL_INTERVAL_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("WORKER_POLL_INTERVAL_MS must be a valid u64"))?,
            worker_batch_size: std::env::var("WORKER_BATCH_SIZE")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("WORKER_BATCH_SIZE must be a valid usize"))?,
            telegram_api_url: std::env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| "https://api.telegram.org/bot".to_string()),
            telegram_bot_token: non_empty_var("TELEGRAM_BOT_TOKEN"),
            resend_api_url: std::env::var("RESEND_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com/emails".to_string()),
            resend_api_key: non_empty_var("RESEND_API_KEY"),
            email_from: non_empty_var("EMAIL_FROM"),
        })
    }
}

/// Read an optional variable, treating an empty value as unset.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
