use std::env;

use fos_common::{parse_boolean_flag, Secret};
use gateway_tools::GatewayConfig;
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::errors::ServerError;

const DEFAULT_FOS_HOST: &str = "127.0.0.1";
const DEFAULT_FOS_PORT: u16 = 8460;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/food_orders.db";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// Payment gateway credentials and client settings
    pub gateway: GatewayConfig,
    /// If true, outstanding database migrations are applied at start-up.
    pub run_migrations: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_FOS_HOST.to_string(),
            port: DEFAULT_FOS_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            gateway: GatewayConfig::default(),
            run_migrations: true,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("FOS_HOST").ok().unwrap_or_else(|| DEFAULT_FOS_HOST.into());
        let port = env::var("FOS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for FOS_PORT. {e} Using the default, {DEFAULT_FOS_PORT}, instead."
                    );
                    DEFAULT_FOS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_FOS_PORT);
        let database_url = env::var("FOS_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ FOS_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let gateway = GatewayConfig::new_from_env_or_default();
        let run_migrations = parse_boolean_flag(env::var("FOS_RUN_MIGRATIONS").ok(), true);
        Self { host, port, database_url, auth, gateway, run_migrations }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// The HMAC secret shared with the identity provider, used to verify access tokens.
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. No tokens issued by \
             the identity provider will be accepted. DO NOT operate on production like this. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(48).map(char::from).collect::<String>();
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: &str) -> Self {
        Self { jwt_secret: Secret::new(jwt_secret.to_string()) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("FOS_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [FOS_JWT_SECRET]")))?;
        if secret.len() < 32 {
            return Err(ServerError::ConfigurationError("FOS_JWT_SECRET must be at least 32 characters long".into()));
        }
        Ok(Self::new(&secret))
    }
}
