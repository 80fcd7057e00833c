use super::models::ModelId;
use serde::{Deserialize, Serialize};

/// System instruction sent with every request.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert code reviewer. \
Always respond with valid JSON only. \
Do not include any markdown, code fences, or explanation outside the JSON.";

/// Low temperature keeps free-tier models close to deterministic output.
pub const TEMPERATURE: f32 = 0.1;

/// Upper bound on generated tokens per attempt.
pub const MAX_TOKENS: u32 = 4096;

// `response_format` is not sent: most free-tier models reject json_object mode
// with a 400.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

/// Build the chat-completions payload for one attempt.
pub fn build_request(model: &ModelId, prompt: &str) -> ChatRequest {
    ChatRequest {
        model: model.as_str().to_string(),
        messages: vec![
            Message::new("system", SYSTEM_INSTRUCTION),
            Message::new("user", prompt),
        ],
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
    }
}
