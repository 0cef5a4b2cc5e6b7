//! Chat service: one agent run per user message

use std::sync::Arc;

use futures::StreamExt;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info};

use crate::config::AppConfig;
use crate::llm::{
    create_provider, Agent, AgentError, AgentEvent, FunctionRegistry, GenerationConfig, LlmError,
    LlmProvider, RegistryError, ToolDeclaration,
};
use crate::weather::{register_weather_tools, WeatherClient, WeatherError};

#[derive(Debug, Error)]
pub enum ChatSetupError {
    #[error("LLM client setup failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Tool registration failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("Weather client setup failed: {0}")]
    Weather(#[from] WeatherError),
}

/// Shared entry point for handling user messages
///
/// Holds everything an agent needs. Each call builds a fresh agent, so
/// requests never share conversation history.
pub struct ChatService {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<FunctionRegistry>,
    declarations: Vec<ToolDeclaration>,
    config: GenerationConfig,
    system: Option<String>,
    max_iterations: usize,
}

impl ChatService {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: FunctionRegistry,
        config: GenerationConfig,
        system: Option<String>,
    ) -> Self {
        let declarations = tools.declarations();
        Self {
            provider,
            tools: Arc::new(tools),
            declarations,
            config,
            system,
            max_iterations: 10,
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Wire the OpenAI-compatible provider and the weather tools
    pub fn from_config(config: &AppConfig) -> Result<Self, ChatSetupError> {
        let provider = create_provider(config.llm.clone())?;

        let weather = Arc::new(WeatherClient::new(config.weather.clone())?);
        if !weather.is_configured() {
            info!("OPENWEATHER_API_KEY not set, weather tools will report an error");
        }

        let mut tools = FunctionRegistry::new();
        register_weather_tools(&mut tools, weather)?;

        info!(
            model = %config.llm.model,
            tools = tools.len(),
            max_iterations = config.agent.max_iterations,
            "Chat service ready"
        );

        Ok(Self::new(
            provider,
            tools,
            config.agent.generation.clone(),
            Some(config.agent.system_prompt.clone()),
        )
        .with_max_iterations(config.agent.max_iterations))
    }

    /// Names of the tools offered to the model
    pub fn tool_names(&self) -> Vec<String> {
        self.declarations.iter().map(|d| d.name.clone()).collect()
    }

    fn new_agent(&self) -> Agent {
        Agent::new(
            self.provider.clone(),
            self.tools.clone(),
            self.declarations.clone(),
            self.config.clone(),
            self.system.clone(),
        )
        .with_max_iterations(self.max_iterations)
    }

    /// Run the agent to completion and return the final answer
    pub async fn reply(&self, message: &str) -> Result<String, AgentError> {
        let mut agent = self.new_agent();

        {
            let mut stream = agent.run(message).await?;
            while let Some(event) = stream.next().await {
                event?;
            }
        }

        let text = agent.final_text().unwrap_or_default();
        if text.trim().is_empty() {
            return Err(AgentError::EmptyResponse);
        }

        debug!(reply_len = text.len(), "Reply ready");
        Ok(text)
    }

    /// Run the agent on a background task and stream its events
    ///
    /// The task stops once the receiving side is dropped.
    pub fn stream(
        self: Arc<Self>,
        message: String,
    ) -> UnboundedReceiverStream<Result<AgentEvent, AgentError>> {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut agent = self.new_agent();
            let mut stream = match agent.run(message).await {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = tx.send(Err(e));
                    return;
                }
            };

            while let Some(event) = stream.next().await {
                if tx.send(event).is_err() {
                    debug!("Stream receiver dropped, stopping agent");
                    return;
                }
            }
        });

        UnboundedReceiverStream::new(rx)
    }
}
