//! Application services

mod chat_service;

pub use chat_service::{ChatService, CompletionHandler};
