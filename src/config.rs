use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub cashfree_base_url: String,
    pub cashfree_app_id: String,
    pub cashfree_secret_key: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "stayhub.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            cashfree_base_url: env::var("CASHFREE_BASE_URL")
                .unwrap_or_else(|_| "https://sandbox.cashfree.com".to_string()),
            cashfree_app_id: env::var("CASHFREE_APP_ID").unwrap_or_default(),
            cashfree_secret_key: env::var("CASHFREE_SECRET_KEY").unwrap_or_default(),
        }
    }
}
