use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use super::Engine;
use crate::error::{Error, Result};
use crate::handlers::Handler;
use crate::handlers::simulated::{BookingHandler, InfoHandler, UnclearHandler};
use crate::llm::{LanguageModel, Prompt};
use crate::prompts::router::build_router_system_prompt;

/// Outcome of classifying a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Booker,
    Info,
    Unclear,
}

impl Decision {
    /// Labels tried in order. Anything that matches none is `Unclear`.
    const PRIORITY: [Decision; 2] = [Decision::Booker, Decision::Info];

    pub fn label(self) -> &'static str {
        match self {
            Decision::Booker => "booker",
            Decision::Info => "info",
            Decision::Unclear => "unclear",
        }
    }

    /// Map raw classifier output to a decision. Case and surrounding
    /// whitespace are ignored; extra text is not.
    pub fn from_classification(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        Self::PRIORITY
            .into_iter()
            .find(|decision| normalized == decision.label())
            .unwrap_or(Decision::Unclear)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct Route {
    decision: Decision,
    handler: Arc<dyn Handler>,
}

/// Ordered decision table. Routes are checked in registration order and
/// the first match wins; the fallback takes everything else.
pub struct RouteTable {
    routes: Vec<Route>,
    fallback: Arc<dyn Handler>,
}

impl RouteTable {
    pub fn new(fallback: Arc<dyn Handler>) -> Self {
        Self {
            routes: Vec::new(),
            fallback,
        }
    }

    pub fn route(mut self, decision: Decision, handler: Arc<dyn Handler>) -> Self {
        self.routes.push(Route { decision, handler });
        self
    }

    /// Booking and info specialists with the unclear fallback.
    pub fn simulated() -> Self {
        Self::new(Arc::new(UnclearHandler))
            .route(Decision::Booker, Arc::new(BookingHandler))
            .route(Decision::Info, Arc::new(InfoHandler))
    }

    pub fn select(&self, decision: Decision) -> &dyn Handler {
        self.routes
            .iter()
            .find(|route| route.decision == decision)
            .map(|route| route.handler.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }
}

/// Classifies a request with one completion call and hands it to exactly
/// one handler.
pub struct RouterEngine {
    llm: Arc<dyn LanguageModel>,
    routes: RouteTable,
    system_prompt: String,
}

impl RouterEngine {
    pub fn new(llm: Arc<dyn LanguageModel>, routes: RouteTable) -> Self {
        Self {
            llm,
            routes,
            system_prompt: build_router_system_prompt(),
        }
    }

    /// A classifier failure is an error, not an `Unclear` decision.
    pub async fn classify(&self, request: &str) -> Result<Decision> {
        let prompt = Prompt::new(self.system_prompt.as_str(), request);
        let completion = self
            .llm
            .complete(&prompt)
            .await
            .map_err(|e| Error::service("classification", e))?;

        debug!(raw = %completion.text, "classifier output");
        Ok(Decision::from_classification(&completion.text))
    }

    pub async fn dispatch(&self, request: &str) -> Result<String> {
        let decision = self.classify(request).await?;
        let handler = self.routes.select(decision);
        info!(decision = %decision, handler = handler.name(), "routing request");

        handler
            .handle(request)
            .await
            .map_err(|source| Error::Handler {
                handler: handler.name().to_string(),
                source,
            })
    }
}

#[async_trait]
impl Engine for RouterEngine {
    async fn run(&self, request: &str) -> Result<String> {
        self.dispatch(request).await
    }
}
