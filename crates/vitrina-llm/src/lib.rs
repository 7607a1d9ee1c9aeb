//! Vitrina LLM - Language-completion provider abstraction
//!
//! This crate provides the completion layer for Vitrina:
//! - Provider: trait definition and request/response types
//! - OpenAI: OpenAI-compatible chat-completions provider (reqwest)
//! - Message: normalized conversation message types

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod message;
pub mod openai;
pub mod provider;

pub use error::{Error, Result};
pub use message::{Message, MessageRole};
pub use openai::{OpenAiConfig, OpenAiProvider};
pub use provider::{CompletionProvider, CompletionRequest, CompletionResponse, ResponseFormat};
