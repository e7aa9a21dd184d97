//! On-disk settings and the persisted account-mapping store.

pub mod config;
pub mod mappings;

pub use config::{
    default_config_path, ApiSettings, ConfigError, ImportSettings, Settings, DEFAULT_API_URL,
};
pub use mappings::FileMappingStore;
