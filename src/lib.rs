pub mod banner;
pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod llm;
pub mod prompts;
pub mod server;

pub use error::{Error, ErrorKind, Result, ServiceError};
