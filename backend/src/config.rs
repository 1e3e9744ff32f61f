use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::warn;

const DEV_JWT_SECRET: &str = "digibank-development-secret-change-me";
const MIN_PRODUCTION_SECRET_LEN: usize = 16;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// `None` keeps the record store in memory only.
    pub data_path: Option<PathBuf>,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub seed_demo_data: bool,
    pub demo_password: String,
    pub price_max_swing: f64,
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            data_path: None,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_ttl_hours: 168,
            seed_demo_data: false,
            demo_password: "demo123".to_string(),
            price_max_swing: 0.10,
            environment: "development".to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let bind_addr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| format!("BIND_ADDR is not a socket address: {}", e))?;

        let data_path = match std::env::var("DATA_PATH") {
            Ok(path) if path.trim().is_empty() => None,
            Ok(path) => Some(PathBuf::from(path)),
            Err(_) => Some(PathBuf::from("data/digibank-db.json")),
        };

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("⚠️ JWT_SECRET not set, using the development secret");
            DEV_JWT_SECRET.to_string()
        });

        let jwt_ttl_hours = std::env::var("JWT_TTL_HOURS")
            .unwrap_or_else(|_| "168".to_string())
            .parse::<i64>()
            .map_err(|e| format!("JWT_TTL_HOURS must be an integer: {}", e))?;

        let seed_demo_data = std::env::var("SEED_DEMO_DATA")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        let price_max_swing = std::env::var("PRICE_MAX_SWING")
            .unwrap_or_else(|_| "0.10".to_string())
            .parse::<f64>()
            .map_err(|e| format!("PRICE_MAX_SWING must be a number: {}", e))?;

        let config = Self {
            bind_addr,
            data_path,
            jwt_secret,
            jwt_ttl_hours,
            seed_demo_data,
            demo_password: std::env::var("DEMO_PASSWORD").unwrap_or_else(|_| "demo123".to_string()),
            price_max_swing,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.jwt_ttl_hours <= 0 {
            return Err("JWT_TTL_HOURS must be positive".to_string());
        }
        if !(0.0..=1.0).contains(&self.price_max_swing) {
            return Err("PRICE_MAX_SWING must be between 0 and 1".to_string());
        }
        if self.environment == "production" {
            if self.jwt_secret == DEV_JWT_SECRET {
                return Err("JWT_SECRET must be set in production".to_string());
            }
            if self.jwt_secret.len() < MIN_PRODUCTION_SECRET_LEN {
                return Err(format!(
                    "JWT_SECRET must be at least {} bytes in production",
                    MIN_PRODUCTION_SECRET_LEN
                ));
            }
        }
        Ok(())
    }
}
