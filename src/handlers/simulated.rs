//! Stand-in specialists that only describe what they would have done.

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use super::Handler;

pub struct BookingHandler;

#[async_trait]
impl Handler for BookingHandler {
    fn name(&self) -> &str {
        "booker"
    }

    async fn handle(&self, request: &str) -> Result<String> {
        info!("delegating to booking handler");
        Ok(format!(
            "Booking handler processed request: '{}'. Result: simulated booking action.",
            request
        ))
    }
}

pub struct InfoHandler;

#[async_trait]
impl Handler for InfoHandler {
    fn name(&self) -> &str {
        "info"
    }

    async fn handle(&self, request: &str) -> Result<String> {
        info!("delegating to info handler");
        Ok(format!(
            "Info handler processed request: '{}'. Result: simulated information retrieval.",
            request
        ))
    }
}

/// Fallback for requests that could not be classified.
pub struct UnclearHandler;

#[async_trait]
impl Handler for UnclearHandler {
    fn name(&self) -> &str {
        "unclear"
    }

    async fn handle(&self, request: &str) -> Result<String> {
        info!("request could not be delegated");
        Ok(format!(
            "Coordinator could not delegate request: '{}'. Please clarify.",
            request
        ))
    }
}
