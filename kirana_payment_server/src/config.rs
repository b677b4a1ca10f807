use std::env;

use esewa_tools::EsewaConfig;
use kirana_payment_engine::SQLITE_DB_URL;
use log::*;

const DEFAULT_KPG_HOST: &str = "127.0.0.1";
const DEFAULT_KPG_PORT: u16 = 8360;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The store mailbox that gets copied in on new-order notifications.
    pub ops_email: Option<String>,
    /// Endpoint that receives order notification POSTs. When unset, order events are only logged.
    pub notify_url: Option<String>,
    /// eSewa gateway configuration: environment, product code, signing secret and endpoint URLs.
    pub esewa: EsewaConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_KPG_HOST.to_string(),
            port: DEFAULT_KPG_PORT,
            database_url: String::default(),
            ops_email: None,
            notify_url: None,
            esewa: EsewaConfig::sandbox(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("KPG_HOST").ok().unwrap_or_else(|| DEFAULT_KPG_HOST.into());
        let port = env::var("KPG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for KPG_PORT. {e} Using the default, {DEFAULT_KPG_PORT}, instead."
                    );
                    DEFAULT_KPG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_KPG_PORT);
        let database_url = env::var("KPG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ KPG_DATABASE_URL is not set. Using the default, {SQLITE_DB_URL}, instead.");
            SQLITE_DB_URL.to_string()
        });
        let ops_email = env::var("KPG_OPS_EMAIL").ok().filter(|s| !s.trim().is_empty());
        let notify_url = env::var("KPG_NOTIFY_URL").ok().filter(|s| !s.trim().is_empty());
        if notify_url.is_none() {
            info!("🪛️ KPG_NOTIFY_URL is not set. Order notifications will be logged but not delivered.");
        }
        let esewa = EsewaConfig::new_from_env_or_default();
        Self { host, port, database_url, ops_email, notify_url, esewa }
    }
}
