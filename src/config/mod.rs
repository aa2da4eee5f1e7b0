//! Application configuration

mod app_config;

pub use app_config::{
    AppConfig, DeepseekSettings, LlmSettings, LogFormat, LoggingConfig, OllamaSettings,
    ProviderKind, StoreBackend, StoreSettings,
};
