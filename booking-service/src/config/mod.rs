use secrecy::Secret;
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub storage: StorageBackend,
    pub mongodb: MongoConfig,
    pub stripe: StripeConfig,
    pub auth: AuthConfig,
    /// ISO currency code used for every payment intent.
    pub currency: String,
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Mongodb,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: Secret<String>,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeConfig {
    pub secret_key: Secret<String>,
    pub api_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
}

impl BookingConfig {
    pub fn load() -> Result<Self, AppError> {
        // Handles .env and the APP__ prefix.
        let common = core_config::Config::load()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let storage: StorageBackend = get_env("BOOKING_STORAGE", Some("mongodb"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        // The URI is only mandatory when Mongo is actually used.
        let mongo_uri = match storage {
            StorageBackend::Mongodb => get_env("MONGODB_URI", None, is_prod)?,
            StorageBackend::Memory => env::var("MONGODB_URI").unwrap_or_default(),
        };

        let currency = get_env("BOOKING_CURRENCY", Some("usd"), false)?.to_lowercase();

        let stripe_secret = env::var("STRIPE_SECRET_KEY").unwrap_or_default();
        if stripe_secret.is_empty() && is_prod {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "STRIPE_SECRET_KEY is required in production but not set"
            )));
        }

        Ok(BookingConfig {
            common,
            storage,
            mongodb: MongoConfig {
                uri: Secret::new(mongo_uri),
                database: get_env("MONGODB_DATABASE", Some("booking_db"), is_prod)?,
            },
            stripe: StripeConfig {
                secret_key: Secret::new(stripe_secret),
                api_base_url: get_env(
                    "STRIPE_API_BASE_URL",
                    Some("https://api.stripe.com/v1"),
                    false,
                )?,
            },
            auth: AuthConfig {
                jwt_secret: Secret::new(get_env(
                    "JWT_SECRET",
                    Some("dev-jwt-secret"),
                    is_prod,
                )?),
            },
            currency,
            service_name: "booking-service".to_string(),
        })
    }
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(StorageBackend::Mongodb),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
