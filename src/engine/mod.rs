pub mod parallel;
pub mod router;

use async_trait::async_trait;

use crate::error::Result;

/// The outermost boundary. The HTTP front-end and the CLI only know this
/// trait; both engines implement it over a single string input.
#[async_trait]
pub trait Engine: Send + Sync {
    async fn run(&self, input: &str) -> Result<String>;
}
