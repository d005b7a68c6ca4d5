pub mod simulated;

use anyhow::Result;
use async_trait::async_trait;

/// Something a routed request can be delegated to.
///
/// Handlers receive the request exactly as the caller supplied it. The
/// reference handlers are pure; real ones may book, query or write, so
/// `handle` is async and fallible.
#[async_trait]
pub trait Handler: Send + Sync {
    fn name(&self) -> &str;
    async fn handle(&self, request: &str) -> Result<String>;
}
