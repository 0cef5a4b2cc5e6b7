//! Tool-calling agent loop
//!
//! For one user message the agent:
//! - Calls the LLM with the conversation so far and streams every event
//! - Executes the tool calls the model asks for and feeds the results back
//! - Loops until the model answers without calling tools

mod error;

pub use error::AgentError;

use crate::llm::core::{
    config::GenerationConfig,
    provider::LlmProvider,
    types::{
        ContentBlock, ContentBlockStart, ContentDelta, GenerateRequest, Message, MessageRole,
        StreamEvent, ToolDeclaration,
    },
};
use crate::llm::tools::executor::ToolExecutor;
use async_stream::stream;
use futures::stream::Stream;
use futures::StreamExt;
use pin_utils::pin_mut;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, warn};

/// Events emitted by the agent during execution
#[derive(Debug, Clone)]
pub enum AgentEvent {
    /// Raw LLM streaming event (text deltas, tool calls, etc.)
    LlmEvent(StreamEvent),

    ToolExecutionStarted {
        tool_use_id: String,
        name: String,
        input: serde_json::Value,
    },

    ToolExecutionCompleted {
        tool_use_id: String,
        name: String,
        result: String,
    },

    ToolExecutionFailed {
        tool_use_id: String,
        name: String,
        error: String,
    },

    /// A new LLM call is starting (1-based)
    IterationStarted { iteration: usize },

    /// Final response received, no further tool calls
    Completed,
}

/// Helper struct for accumulating partial tool use data
struct PartialToolUseAccumulator {
    id: String,
    name: String,
    input: String,
}

/// Agent holding one conversation
///
/// Provider and tool executor are shared, so building an agent per request
/// is cheap.
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tool_executor: Arc<dyn ToolExecutor>,
    tool_declarations: Vec<ToolDeclaration>,
    /// Conversation history (kept in memory)
    messages: Vec<Message>,
    config: GenerationConfig,
    system: Option<String>,
    /// Maximum number of LLM calls per user message (default: 10)
    max_iterations: usize,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tool_executor: Arc<dyn ToolExecutor>,
        tool_declarations: Vec<ToolDeclaration>,
        config: GenerationConfig,
        system: Option<String>,
    ) -> Self {
        Self {
            provider,
            tool_executor,
            tool_declarations,
            messages: Vec::new(),
            config,
            system,
            max_iterations: 10,
        }
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Process a new user message through the agent loop
    ///
    /// The returned stream emits `IterationStarted` before every LLM call,
    /// `LlmEvent` for each provider event, `ToolExecution*` around each tool
    /// call and `Completed` once the model answers without tools. An `Err`
    /// item ends the stream.
    pub async fn run(
        &mut self,
        user_message: impl Into<String>,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<AgentEvent, AgentError>> + Send + '_>>, AgentError>
    {
        self.messages.push(Message::user(user_message));

        let stream = self.create_agent_stream();

        Ok(Box::pin(stream))
    }

    /// Text of the last assistant message, if the conversation ends with one
    pub fn final_text(&self) -> Option<String> {
        self.messages
            .last()
            .filter(|m| m.role == MessageRole::Assistant)
            .map(Message::text)
    }

    fn create_agent_stream(
        &mut self,
    ) -> impl Stream<Item = Result<AgentEvent, AgentError>> + Send + '_ {
        stream! {
            let mut iteration = 0;

            loop {
                iteration += 1;

                if iteration > self.max_iterations {
                    warn!(max_iterations = self.max_iterations, "Agent iteration limit reached");
                    yield Err(AgentError::MaxIterationsReached(iteration - 1));
                    return;
                }

                yield Ok(AgentEvent::IterationStarted { iteration });

                let request = GenerateRequest {
                    messages: self.messages.clone(),
                    tools: Some(self.tool_declarations.clone()),
                    config: self.config.clone(),
                    system: self.system.clone(),
                };

                let llm_stream = match self.provider.stream_generate(request).await {
                    Ok(s) => s,
                    Err(e) => {
                        yield Err(AgentError::Llm(e));
                        return;
                    }
                };

                // Forward events while accumulating text and tool uses
                let mut text_content = String::new();
                let mut tool_uses = Vec::new();
                let mut current_tool_use: Option<PartialToolUseAccumulator> = None;

                pin_mut!(llm_stream);

                while let Some(event_result) = llm_stream.next().await {
                    let event = match event_result {
                        Ok(e) => e,
                        Err(e) => {
                            yield Err(AgentError::Llm(e));
                            return;
                        }
                    };

                    if let StreamEvent::Error { error } = &event {
                        yield Err(AgentError::Provider(error.clone()));
                        return;
                    }

                    yield Ok(AgentEvent::LlmEvent(event.clone()));

                    match &event {
                        StreamEvent::ContentBlockStart { block, .. } => match block {
                            ContentBlockStart::Text { text } => {
                                text_content.push_str(text);
                            }
                            ContentBlockStart::ToolUse { id, name } => {
                                current_tool_use = Some(PartialToolUseAccumulator {
                                    id: id.clone(),
                                    name: name.clone(),
                                    input: String::new(),
                                });
                            }
                        },
                        StreamEvent::ContentDelta { delta, .. } => match delta {
                            ContentDelta::TextDelta { text } => {
                                text_content.push_str(text);
                            }
                            ContentDelta::ToolUseDelta { partial } => {
                                if let Some(tool_use) = &mut current_tool_use {
                                    tool_use.input.push_str(&partial.partial_json);
                                }
                            }
                        },
                        StreamEvent::ContentBlockEnd { .. } => {
                            if let Some(tool_use) = current_tool_use.take() {
                                // Tools without parameters may stream no arguments at all
                                let input = if tool_use.input.trim().is_empty() {
                                    Ok(serde_json::json!({}))
                                } else {
                                    serde_json::from_str(&tool_use.input)
                                };
                                match input {
                                    Ok(input) => {
                                        tool_uses.push(ContentBlock::ToolUse {
                                            id: tool_use.id,
                                            name: tool_use.name,
                                            input,
                                        });
                                    }
                                    Err(e) => {
                                        yield Err(AgentError::ToolInputParse(e));
                                        return;
                                    }
                                }
                            }
                        }
                        StreamEvent::MessageEnd { .. } => break,
                        _ => {}
                    }
                }

                let turn = Message::assistant_turn(text_content, tool_uses.clone());
                let wants_tools = turn.has_tool_calls();
                self.messages.push(turn);

                if !wants_tools {
                    debug!(iterations = iteration, "Agent completed");
                    yield Ok(AgentEvent::Completed);
                    return;
                }

                for block in &tool_uses {
                    if let ContentBlock::ToolUse { id, name, input } = block {
                        yield Ok(AgentEvent::ToolExecutionStarted {
                            tool_use_id: id.clone(),
                            name: name.clone(),
                            input: input.clone(),
                        });

                        match self.tool_executor.execute(
                            id.clone(),
                            name.clone(),
                            input.clone(),
                        ).await {
                            Ok(result) => {
                                yield Ok(AgentEvent::ToolExecutionCompleted {
                                    tool_use_id: id.clone(),
                                    name: name.clone(),
                                    result: result.clone(),
                                });
                                self.messages.push(Message::tool_result(id.clone(), result));
                            }
                            Err(error) => {
                                warn!(tool = %name, "Tool execution failed: {}", error);
                                yield Ok(AgentEvent::ToolExecutionFailed {
                                    tool_use_id: id.clone(),
                                    name: name.clone(),
                                    error: error.clone(),
                                });
                                self.messages.push(Message::tool_error(id.clone(), error));
                            }
                        }
                    }
                }

                // Next iteration calls the LLM again with the tool results
            }
        }
    }
}
