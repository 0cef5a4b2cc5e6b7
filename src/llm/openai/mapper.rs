//! Mapping between abstraction types and OpenAI-compatible wire types

use crate::llm::core::types::{
    ContentBlock, ContentBlockStart, ContentDelta, FinishReason, GenerateRequest, Message,
    MessageMetadata, MessageRole, PartialToolUse, StreamEvent, ToolDeclaration, UsageMetadata,
};

use super::types::{
    ChatCompletionChunk, ChatCompletionRequest, ChatFunction, ChatFunctionCall, ChatMessage,
    ChatTool, ChatToolCall, StreamOptions,
};

/// Convert our abstraction request to a chat-completion request
pub fn to_openai_request(request: GenerateRequest, model: &str) -> ChatCompletionRequest {
    let mut messages = Vec::with_capacity(request.messages.len() + 1);
    if let Some(system) = request.system {
        messages.push(ChatMessage::text("system", system));
    }
    for message in request.messages {
        messages.extend(to_openai_messages(message));
    }

    let tools = request
        .tools
        .filter(|tools| !tools.is_empty())
        .map(|tools| tools.into_iter().map(to_openai_tool).collect());

    ChatCompletionRequest {
        model: model.to_string(),
        messages,
        tools,
        max_tokens: request.config.max_tokens,
        temperature: request.config.temperature,
        top_p: request.config.top_p,
        stop: request.config.stop_sequences,
        stream: true,
        stream_options: Some(StreamOptions {
            include_usage: true,
        }),
    }
}

/// Convert one of our messages into one or more wire messages
///
/// Tool results are split so that every result gets its own `tool` message.
fn to_openai_messages(message: Message) -> Vec<ChatMessage> {
    match message.role {
        MessageRole::User => vec![ChatMessage::text("user", message.text())],
        MessageRole::Assistant => {
            let text = message.text();
            let tool_calls: Vec<ChatToolCall> = message
                .content
                .into_iter()
                .filter_map(|block| match block {
                    ContentBlock::ToolUse { id, name, input } => Some(ChatToolCall {
                        id,
                        call_type: "function".to_string(),
                        function: ChatFunctionCall {
                            name,
                            arguments: input.to_string(),
                        },
                    }),
                    _ => None,
                })
                .collect();

            let content = if text.is_empty() && !tool_calls.is_empty() {
                None
            } else {
                Some(text)
            };

            vec![ChatMessage {
                role: "assistant".to_string(),
                content,
                tool_calls: if tool_calls.is_empty() {
                    None
                } else {
                    Some(tool_calls)
                },
                tool_call_id: None,
            }]
        }
        MessageRole::Tool => message
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => Some(ChatMessage {
                    role: "tool".to_string(),
                    content: Some(if is_error {
                        format!("Error: {}", content)
                    } else {
                        content
                    }),
                    tool_calls: None,
                    tool_call_id: Some(tool_use_id),
                }),
                _ => None,
            })
            .collect(),
    }
}

fn to_openai_tool(tool: ToolDeclaration) -> ChatTool {
    ChatTool {
        tool_type: "function".to_string(),
        function: ChatFunction {
            name: tool.name,
            description: tool.description,
            parameters: tool.input_schema,
        },
    }
}

/// Block currently receiving deltas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenBlock {
    Text { index: usize },
    Tool { index: usize, call_index: usize },
}

/// Stateful translator from chat-completion chunks to [`StreamEvent`]s
///
/// Chat-completion chunks carry flat deltas, while the agent expects explicit
/// block boundaries. The mapper opens a text block on the first content
/// delta, a tool-use block per tool call index, and closes whatever is open
/// when the provider switches kind or reports a finish reason. The message
/// end is produced by [`ChunkMapper::finish`] once the stream is over, so
/// it carries the usage of the trailing usage-only chunk.
#[derive(Debug, Default)]
pub struct ChunkMapper {
    started: bool,
    finished: bool,
    next_index: usize,
    open: Option<OpenBlock>,
    finish_reason: Option<FinishReason>,
    usage: UsageMetadata,
}

impl ChunkMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate one chunk
    pub fn map_chunk(&mut self, chunk: ChatCompletionChunk) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        if !self.started {
            self.started = true;
            events.push(StreamEvent::MessageStart {
                message: MessageMetadata {
                    id: chunk.id.clone(),
                    role: MessageRole::Assistant,
                    usage: None,
                },
            });
        }

        if let Some(usage) = chunk.usage {
            self.usage = UsageMetadata::new(usage.prompt_tokens, usage.completion_tokens);
            events.push(StreamEvent::MessageDelta {
                usage: Some(self.usage),
            });
        }

        // Only the first choice is requested, so others are ignored
        if let Some(choice) = chunk.choices.into_iter().find(|c| c.index == 0) {
            if let Some(text) = choice.delta.content.filter(|t| !t.is_empty()) {
                let index = match self.open {
                    Some(OpenBlock::Text { index }) => index,
                    _ => {
                        self.close_open(&mut events);
                        let index = self.open_block(|index| OpenBlock::Text { index });
                        events.push(StreamEvent::ContentBlockStart {
                            index,
                            block: ContentBlockStart::Text {
                                text: String::new(),
                            },
                        });
                        index
                    }
                };
                events.push(StreamEvent::ContentDelta {
                    index,
                    delta: ContentDelta::TextDelta { text },
                });
            }

            for call in choice.delta.tool_calls.unwrap_or_default() {
                let function = call.function.unwrap_or_default();
                let index = match self.open {
                    Some(OpenBlock::Tool { index, call_index }) if call_index == call.index => {
                        index
                    }
                    _ => {
                        self.close_open(&mut events);
                        let call_index = call.index;
                        let index =
                            self.open_block(|index| OpenBlock::Tool { index, call_index });
                        let id = call
                            .id
                            .clone()
                            .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple()));
                        events.push(StreamEvent::ContentBlockStart {
                            index,
                            block: ContentBlockStart::ToolUse {
                                id,
                                name: function.name.clone().unwrap_or_default(),
                            },
                        });
                        index
                    }
                };

                if let Some(arguments) = function.arguments.filter(|a| !a.is_empty()) {
                    events.push(StreamEvent::ContentDelta {
                        index,
                        delta: ContentDelta::ToolUseDelta {
                            partial: PartialToolUse {
                                id: call.id,
                                name: function.name,
                                partial_json: arguments,
                            },
                        },
                    });
                }
            }

            if let Some(reason) = choice.finish_reason {
                self.close_open(&mut events);
                self.finish_reason = Some(FinishReason::from_openai(&reason));
            }
        }

        events
    }

    /// Close the message; later calls return nothing
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;

        let mut events = Vec::new();
        self.close_open(&mut events);
        events.push(StreamEvent::MessageEnd {
            finish_reason: self.finish_reason.take().unwrap_or(FinishReason::Stop),
            usage: self.usage,
        });
        events
    }

    fn open_block(&mut self, make: impl FnOnce(usize) -> OpenBlock) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        self.open = Some(make(index));
        index
    }

    fn close_open(&mut self, events: &mut Vec<StreamEvent>) {
        if let Some(block) = self.open.take() {
            let index = match block {
                OpenBlock::Text { index } | OpenBlock::Tool { index, .. } => index,
            };
            events.push(StreamEvent::ContentBlockEnd { index });
        }
    }
}
