use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use maestro::banner::{BannerInfo, print_banner, print_session_summary};
use maestro::config::{Settings, validate_temperature};
use maestro::engine::Engine;
use maestro::engine::parallel::{FanOutConfig, FanOutEngine, PromptTask};
use maestro::engine::router::{RouteTable, RouterEngine};
use maestro::llm::LanguageModel;
use maestro::llm::metered::MeteredModel;
use maestro::llm::openai::OpenAiClient;
use maestro::server::{self, AppState};

const EXAMPLE_TOPIC: &str = "the history of space exploration";

const EXAMPLE_REQUESTS: &[&str] = &[
    "Book me a flight to London.",
    "What is the capital of Italy?",
    "Something about quantum physics.",
    "I had dinner today.",
];

#[derive(Parser)]
#[command(
    name = "maestro",
    version,
    about = "Fan-out and routing orchestration over an LLM."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Model name (overrides LLM_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    /// OpenAI-compatible base URL (overrides LLM_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Sampling temperature (overrides LLM_TEMPERATURE)
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// Fan-out timeout in seconds (overrides FANOUT_TIMEOUT_SECS)
    #[arg(short, long, global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Run several prompts over one topic concurrently and synthesize them
    Parallel {
        /// Topic to explore
        #[arg(long, default_value = EXAMPLE_TOPIC)]
        topic: String,
    },
    /// Classify requests and delegate each to one handler
    Route {
        /// Requests to route (defaults to a built-in set)
        requests: Vec<String>,
    },
    /// Serve the HTTP front-end for the parallel pipeline
    Serve {
        /// Listen address (overrides BIND_ADDR)
        #[arg(short, long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // `.env` may carry RUST_LOG, so it loads before the subscriber exists.
    let env_file = dotenvy::dotenv();
    init_tracing();
    report_env_file(env_file);

    let cli = Cli::parse();

    // Missing credentials stop us here, before any engine exists.
    let mut settings = Settings::from_env()?;
    if let Some(model) = cli.model {
        settings.model = model;
    }
    if let Some(base_url) = cli.base_url {
        settings.base_url = base_url;
    }
    if let Some(temperature) = cli.temperature {
        validate_temperature(temperature)?;
        settings.temperature = temperature;
    }
    if let Some(secs) = cli.timeout {
        settings.fanout_timeout = Some(Duration::from_secs(secs));
    }
    debug!(?settings, "resolved settings");

    let client: Arc<dyn LanguageModel> = Arc::new(OpenAiClient::new(&settings)?);
    let metered = Arc::new(MeteredModel::new(client));
    let llm: Arc<dyn LanguageModel> = metered.clone();
    info!(model = llm.model(), "language model initialized");

    let fan_out_config = FanOutConfig {
        timeout: settings.fanout_timeout,
    };

    let mode = match &cli.command {
        Command::Parallel { .. } => "parallel",
        Command::Route { .. } => "route",
        Command::Serve { .. } => "serve",
    };
    print_banner(&BannerInfo {
        mode,
        endpoint: &settings.base_url,
        model: &settings.model,
        temperature: settings.temperature,
        timeout: settings.fanout_timeout,
    });

    match cli.command {
        Command::Parallel { topic } => {
            let engine = FanOutEngine::new(llm, PromptTask::defaults(), fan_out_config)?;
            println!("--- running the parallel pipeline for topic: '{}' ---", topic);
            let answer = engine.run(&topic).await?;
            println!("\n--- final response ---\n{}", answer);
        }
        Command::Route { requests } => {
            let engine = RouterEngine::new(llm, RouteTable::simulated());
            let requests = if requests.is_empty() {
                EXAMPLE_REQUESTS.iter().map(|r| r.to_string()).collect()
            } else {
                requests
            };
            for request in &requests {
                println!("\n--- routing request: '{}' ---", request);
                let result = engine.dispatch(request).await?;
                println!("=> {}", result);
            }
        }
        Command::Serve { bind } => {
            let engine = FanOutEngine::new(llm, PromptTask::defaults(), fan_out_config)?;
            let addr = bind.unwrap_or(settings.bind_addr);
            server::serve(&addr, AppState::new(Arc::new(engine))).await?;
        }
    }

    print_session_summary(metered.usage());
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn report_env_file(result: dotenvy::Result<std::path::PathBuf>) {
    match result {
        Ok(path) => info!(path = %path.display(), "loaded environment from .env"),
        Err(e) if e.not_found() => debug!("no .env file found; using process environment only"),
        Err(e) => warn!(error = %e, "failed to load .env file"),
    }
}
