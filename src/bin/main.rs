//! Account Expansion Agent entry point
//!
//! Detokenizes the account number carried by an event and logs the outcome.

use std::io::Read;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use account_expansion::config::{Credentials, HandlerConfig, LogFormat, LogLevel, LoggingConfig};
use account_expansion::contracts::EventEnvelope;
use account_expansion::handler::{create_router, EventHandler, AGENT_ID, AGENT_VERSION};
use account_expansion::telemetry::LogContext;
use account_expansion::DetokenizeClient;

#[derive(Parser)]
#[command(name = "account-expansion")]
#[command(about = "Account Expansion Agent - account number detokenization")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Settings {
    /// Detokenization service base URL
    #[arg(long, global = true, env = "API_ENDPOINT", default_value = "")]
    endpoint: String,

    /// Bearer token
    #[arg(long, global = true, env = "AUTH_TOKEN", default_value = "", hide_env_values = true)]
    auth_token: String,

    /// API key
    #[arg(long, global = true, env = "API_KEY", default_value = "", hide_env_values = true)]
    api_key: String,

    /// Identity claim
    #[arg(long, global = true, env = "ID-CLAIM", default_value = "", hide_env_values = true)]
    id_claim: String,

    /// Data element naming the detokenization rule
    #[arg(long, global = true, env = "DATA_ELEMENT", default_value = "deACCOUNTNUM")]
    data_element: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Handle a single event read from a file or stdin
    Invoke {
        /// Path to the event (JSON, or YAML by extension); `-` reads stdin
        #[arg(short, long, default_value = "-")]
        file: String,
    },

    /// Detokenize values directly
    Detokenize {
        /// Token to resolve; repeat for several
        #[arg(short, long = "value", required = true)]
        values: Vec<String>,

        /// Print the recovered values instead of masked ones
        #[arg(long)]
        reveal: bool,
    },

    /// Start the HTTP invoke surface
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8083", env = "PORT")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
    },
}

impl Settings {
    fn logging(&self) -> anyhow::Result<LoggingConfig> {
        let mut config = LoggingConfig::from_env()?;
        if let Some(level) = self.log_level {
            config = config.with_level(level);
        }
        if let Some(format) = self.log_format {
            config = config.with_format(format);
        }
        Ok(config)
    }

    fn handler_config(&self) -> HandlerConfig {
        HandlerConfig::new(self.endpoint.clone()).with_data_element(self.data_element.clone())
    }

    fn credentials(&self) -> Credentials {
        Credentials::new(&self.auth_token, &self.api_key, &self.id_claim)
    }
}

fn read_event(file: &str) -> anyhow::Result<EventEnvelope> {
    let content = if file == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read event from stdin")?;
        buf
    } else {
        std::fs::read_to_string(file).with_context(|| format!("failed to read event file {}", file))?
    };

    let event: EventEnvelope = if file.ends_with(".yaml") || file.ends_with(".yml") {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(event)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logging = LogContext::new(cli.settings.logging()?);
    logging.install()?;

    match cli.command {
        Commands::Invoke { file } => {
            let event = read_event(&file)?;
            let handler = EventHandler::new(
                cli.settings.handler_config(),
                cli.settings.credentials(),
                &logging,
            );

            let response = handler
                .handle(&event)
                .await
                .map_err(|e| anyhow::anyhow!(e.summary()))?;

            println!(
                "{}",
                serde_json::json!({
                    "status": "ok",
                    "event_id": event.event_id(),
                    "results": response.results.len(),
                    "encoding": response.encoding,
                    "success": response.success,
                })
            );
        }

        Commands::Detokenize { values, reveal } => {
            let client =
                DetokenizeClient::with_formatter(cli.settings.credentials(), logging.formatter());

            let response = client
                .detokenize(&cli.settings.endpoint, &cli.settings.data_element, &values)
                .await
                .map_err(|e| anyhow::anyhow!(e.summary()))?;

            if reveal {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&logging.formatter().format(&response))?
                );
            }
        }

        Commands::Serve { port, host } => {
            let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
            let handler = Arc::new(EventHandler::new(
                cli.settings.handler_config(),
                cli.settings.credentials(),
                &logging,
            ));
            let router = create_router(handler);

            tracing::info!("Starting Account Expansion Agent on {}", addr);
            tracing::info!("Agent ID: {}, Version: {}", AGENT_ID, AGENT_VERSION);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, router).await?;
        }
    }

    Ok(())
}
