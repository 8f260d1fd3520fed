//! yaa: yet another agent.
//!
//! Chats with a local Ollama model in the terminal. The model can read
//! files, list directories, fetch web pages, and check the time and the
//! working directory; tool results are fed straight back to it.
//!
//! Type `!clear` to reset the conversation and `!retry` to re-ask the last
//! question.

use clap::Parser;
use yaa_config::AppConfig;

mod chat;
mod input;
mod terminal;

#[derive(Parser)]
#[command(
    name = "yaa",
    about = "yaa: a terminal agent for local Ollama models",
    version
)]
struct Cli {
    /// Model to chat with (overrides OLLAMA_MODEL and the config file)
    #[arg(short, long)]
    model: Option<String>,

    /// Ollama server URL (overrides OLLAMA_HOST)
    #[arg(long)]
    host: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Don't ask the model for a name and User-Agent at startup
    #[arg(long)]
    skip_identity: bool,

    /// Show the model's reasoning instead of hiding it
    #[arg(long)]
    show_reasoning: bool,
}

impl Cli {
    /// Flags win over the config file and the environment.
    fn apply(&self, config: &mut AppConfig) {
        if let Some(model) = self.model.as_ref().filter(|m| !m.is_empty()) {
            config.model = model.clone();
        }
        if let Some(host) = self.host.as_ref().filter(|h| !h.is_empty()) {
            config.ollama_host = yaa_config::normalize_host(host);
        }
        if self.verbose {
            config.debug = true;
        }
        if self.show_reasoning {
            config.hide_reasoning = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    cli.apply(&mut config);

    // Logs go to stderr so they never interleave with the transcript
    let filter = if config.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    chat::run(config, cli.skip_identity).await
}
