//! Interactive chat session: startup checks, identity probe, then the loop.

use std::sync::Arc;

use chrono::Local;
use tracing::info;
use yaa_agent::{AgentLoop, DEFAULT_AGENT_NAME, probe_identity};
use yaa_config::AppConfig;
use yaa_core::message::Message;
use yaa_core::provider::Provider;
use yaa_providers::OllamaProvider;
use yaa_tools::{ToolOptions, default_registry};

use crate::input;
use crate::terminal::Terminal;

pub async fn run(config: AppConfig, skip_identity: bool) -> Result<(), Box<dyn std::error::Error>> {
    let provider: Arc<dyn Provider> = Arc::new(OllamaProvider::from_config(&config)?);

    // The only fatal runtime failure: the service isn't there
    match provider.health_check().await {
        Ok(true) => {}
        Ok(false) => {
            return Err(format!(
                "Ollama at {} did not answer the health check",
                config.ollama_host
            )
            .into());
        }
        Err(e) => {
            return Err(format!("Cannot reach Ollama at {}: {e}", config.ollama_host).into());
        }
    }

    let system_prompt = config.system_prompt_at(&Local::now());
    let baseline: Vec<Message> = system_prompt.iter().cloned().map(Message::system).collect();

    let mut terminal = Terminal::stdout(DEFAULT_AGENT_NAME);

    let identity = if skip_identity {
        None
    } else {
        terminal.preparing()?;
        let identity = probe_identity(
            provider.as_ref(),
            &config.model,
            &baseline,
            config.identity_attempts,
            Some(config.keep_alive()),
        )
        .await;
        terminal.clear_line()?;
        identity
    };

    let user_agent = identity.as_ref().map(|id| id.ua.clone());
    if let Some(identity) = &identity {
        terminal.set_agent_name(&identity.name);
    }

    // Built after the probe so fetch can send the model's User-Agent
    let tools = Arc::new(default_registry(&ToolOptions {
        user_agent: user_agent.clone(),
    }));

    let mut agent = AgentLoop::new(provider, &config.model, tools)?
        .with_system_prompt(system_prompt)
        .with_keep_alive(config.keep_alive())
        .with_reasoning_hidden(config.hide_reasoning);

    info!(
        model = %config.model,
        host = %config.ollama_host,
        hide_reasoning = config.hide_reasoning,
        "Starting conversation"
    );

    terminal.banner(&config.model, user_agent.as_deref())?;
    agent.run(input::stdin_lines(), &mut terminal).await;

    Ok(())
}
