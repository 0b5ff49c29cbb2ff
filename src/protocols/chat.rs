use serde::{Deserialize, Serialize};

use crate::thought_parser::{Fragment, StreamError};

/// One `chat.completion.chunk` of an OpenAI-compatible streaming response.
///
/// Only the fields the translator consumes are modelled; everything else in
/// the payload is ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatCompletionStreamChunk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatStreamChoice>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatStreamChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<ChatMessageDelta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Delta structure for streaming chat completion responses
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ChatMessageDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Native reasoning channel (e.g. DeepSeek)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
}

impl ChatCompletionStreamChunk {
    /// Fragment carried by the first choice, if it has any text.
    pub fn into_fragment(self) -> Option<Fragment> {
        let delta = self.choices.into_iter().next()?.delta?;
        let fragment = Fragment {
            content: delta.content.filter(|c| !c.is_empty()),
            reasoning: delta.reasoning_content.filter(|r| !r.is_empty()),
        };
        (!fragment.is_empty()).then_some(fragment)
    }
}

/// Decode the JSON payload of one SSE `data:` event into a fragment.
///
/// Returns `Ok(None)` for well-formed chunks without text (role headers,
/// finish markers, usage reports).
pub fn decode_chat_chunk(payload: &str) -> Result<Option<Fragment>, StreamError> {
    let chunk: ChatCompletionStreamChunk =
        serde_json::from_str(payload).map_err(|e| StreamError::malformed(e.to_string()))?;
    Ok(chunk.into_fragment())
}
