use derive_builder::Builder;

use crate::registry::{DEFAULT_MAX_CAPACITY, FilterRegistry};

pub struct AppState {
    pub registry: FilterRegistry,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            registry: FilterRegistry::new(config.max_capacity),
        }
    }
}

#[derive(Builder, Clone, Debug)]
#[builder(pattern = "owned")]
pub struct ServerConfig {
    #[builder(default = "\"127.0.0.1\".to_string()")]
    pub server_host: String,
    #[builder(default = "50051")]
    pub server_port: u16,
    #[builder(default = "DEFAULT_MAX_CAPACITY")]
    pub max_capacity: u64,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server_host: std::env::var("SERVER_HOST")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            server_port: std::env::var("SERVER_PORT")
                .unwrap_or_else(|_| "50051".to_string())
                .parse()
                .map_err(|_| "Invalid SERVER_PORT")?,
            max_capacity: std::env::var("FILTER_MAX_CAPACITY")
                .unwrap_or_else(|_| DEFAULT_MAX_CAPACITY.to_string())
                .parse()
                .map_err(|_| "Invalid FILTER_MAX_CAPACITY")?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
