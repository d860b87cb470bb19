//! Stock newsletter CLI
//!
//! # Usage
//!
//! ```bash
//! # Serve the web UI on 127.0.0.1:8501
//! cargo run --bin stock-newsletter -- serve
//!
//! # Write one newsletter and print it
//! cargo run --bin stock-newsletter -- run AAPL
//! ```
//!
//! `OPENAI_API_KEY` is read from the environment, then `.env`, then
//! `secrets.toml`.

use clap::{Parser, Subcommand};
use crew_llm::providers::{OpenAIConfig, OpenAIProvider};
use crew_utils::{Config, init_tracing};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use stock_newsletter::web::{self, Submission};
use stock_newsletter::{
    Credential, CredentialError, CredentialResolver, NewsletterConfig, build_crew,
};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "stock-newsletter", version, about = "Stock analysis newsletter crew")]
struct Cli {
    /// Local environment file holding OPENAI_API_KEY
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,

    /// Hosted secrets file holding OPENAI_API_KEY
    #[arg(long, global = true, default_value = "secrets.toml")]
    secrets_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the research web UI
    Serve {
        /// Listen address, overrides LISTEN_ADDR
        #[arg(long)]
        listen: Option<SocketAddr>,
    },
    /// Research one ticker and print the newsletter
    Run {
        /// Stock ticker, e.g. AAPL
        ticker: String,
    },
}

/// Exit code when no API key can be resolved
const MISSING_CREDENTIAL_EXIT: i32 = 1;

/// The API key, or the exit code after reporting why there is none
fn api_key_or_exit(
    resolved: Result<Credential, CredentialError>,
    stderr: &mut impl Write,
) -> Result<String, i32> {
    match resolved {
        Ok(credential) => {
            info!(source = %credential.source(), "Loaded OpenAI API key");
            Ok(credential.into_value())
        }
        Err(e) => {
            // Nothing more to report if stderr itself is gone.
            let _ = writeln!(stderr, "{e}");
            Err(MISSING_CREDENTIAL_EXIT)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&Config::from_env("stock-newsletter"));

    let resolved = CredentialResolver::default()
        .with_dotenv_path(cli.env_file)
        .with_secrets_path(cli.secrets_file)
        .resolve();
    let api_key = match api_key_or_exit(resolved, &mut io::stderr()) {
        Ok(key) => key,
        Err(code) => std::process::exit(code),
    };

    let config = NewsletterConfig::from_env()?;
    let mut openai = OpenAIConfig::new(api_key).with_timeout(config.request_timeout.as_secs());
    if let Some(api_base) = &config.api_base {
        openai = openai.with_api_base(api_base);
    }
    let llm = Arc::new(OpenAIProvider::with_config(openai)?);
    let crew = build_crew(llm, &config)?;

    match cli.command {
        Command::Serve { listen } => {
            let addr = listen.unwrap_or(config.listen_addr);
            let app = web::router(Arc::new(crew))?;
            let listener = TcpListener::bind(addr).await?;
            info!(%addr, model = %config.model, "Stock newsletter UI listening");
            axum::serve(listener, app).await?;
        }
        Command::Run { ticker } => {
            match web::submit(&web::ResearchForm::new(ticker), &crew).await {
                Submission::Completed(newsletter) => println!("{newsletter}"),
                Submission::Invalid(message) | Submission::Failed(message) => {
                    anyhow::bail!(message)
                }
            }
        }
    }

    Ok(())
}
