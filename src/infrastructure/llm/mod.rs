//! Generation provider implementations

mod deepseek;
mod factory;
mod http_client;
mod ollama;

pub use deepseek::DeepseekProvider;
pub use factory::LlmProviderFactory;
pub use http_client::{ByteStream, HttpClient, HttpClientTrait};
pub use ollama::OllamaProvider;

#[cfg(test)]
pub use http_client::mock::MockHttpClient;
