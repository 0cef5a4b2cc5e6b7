use std::path::PathBuf;
use std::sync::Arc;

use crate::chat::ChatService;

/// State shared by all request handlers
#[derive(Clone)]
pub struct AppState {
    /// `None` when the chat service failed to initialize
    pub chat: Option<Arc<ChatService>>,
    /// Directory holding `index.html`
    pub web_dir: PathBuf,
}

impl AppState {
    pub fn new(chat: Option<ChatService>, web_dir: impl Into<PathBuf>) -> Self {
        Self {
            chat: chat.map(Arc::new),
            web_dir: web_dir.into(),
        }
    }

    pub fn agent_ready(&self) -> bool {
        self.chat.is_some()
    }
}
