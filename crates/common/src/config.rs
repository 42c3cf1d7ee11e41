use serde::Deserialize;

use crate::plan::PriceIds;

/// Global application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,

    /// Maximum number of PostgreSQL connections in the pool (default: 20)
    pub db_max_connections: u32,

    /// Public base URL used to build absolute management links
    pub app_base_url: String,

    /// Port the API server binds to (default: 3000)
    pub api_port: u16,

    /// Shared secret the external scheduler sends with each reminder trigger
    pub cron_secret: String,

    /// WhatsApp Cloud API access token
    pub whatsapp_access_token: Option<String>,

    /// WhatsApp sender phone number ID
    pub whatsapp_phone_number_id: Option<String>,

    /// Graph API version (default: v21.0)
    pub whatsapp_api_version: String,

    /// Resend API key for email delivery
    pub resend_api_key: Option<String>,

    /// Email sender address
    pub email_from: Option<String>,

    /// Billing price identifiers for each plan/interval
    pub price_ids: PriceIds,

    /// Run the reminder job from an in-process timer instead of an external trigger
    pub reminder_scheduler_enabled: bool,

    /// In-process reminder interval in seconds (default: 900)
    pub reminder_interval_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: std::env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("DB_MAX_CONNECTIONS must be a valid u32"))?,
            app_base_url: std::env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string())
                .trim_end_matches('/')
                .to_string(),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("API_PORT must be a valid u16"))?,
            cron_secret: std::env::var("CRON_SECRET")
                .map_err(|_| anyhow::anyhow!("CRON_SECRET environment variable is required"))?,
            whatsapp_access_token: std::env::var("WHATSAPP_ACCESS_TOKEN").ok(),
            whatsapp_phone_number_id: std::env::var("WHATSAPP_PHONE_NUMBER_ID").ok(),
            whatsapp_api_version: std::env::var("WHATSAPP_API_VERSION")
                .unwrap_or_else(|_| "v21.0".to_string()),
            resend_api_key: std::env::var("RESEND_API_KEY").ok(),
            email_from: std::env::var("EMAIL_FROM").ok(),
            price_ids: PriceIds {
                essential_monthly: std::env::var("STRIPE_PRICE_ESSENTIAL_MONTHLY").ok(),
                essential_yearly: std::env::var("STRIPE_PRICE_ESSENTIAL_YEARLY").ok(),
                professional_monthly: std::env::var("STRIPE_PRICE_PROFESSIONAL_MONTHLY").ok(),
                professional_yearly: std::env::var("STRIPE_PRICE_PROFESSIONAL_YEARLY").ok(),
            },
            reminder_scheduler_enabled: std::env::var("REMINDER_SCHEDULER_ENABLED")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            reminder_interval_secs: std::env::var("REMINDER_INTERVAL_SECS")
                .unwrap_or_else(|_| "900".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("REMINDER_INTERVAL_SECS must be a valid u64"))?,
        })
    }
}
