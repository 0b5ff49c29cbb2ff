pub mod chat;
pub mod sse;

pub use chat::{ChatCompletionStreamChunk, ChatMessageDelta, ChatStreamChoice, decode_chat_chunk};
pub use sse::{SseDecoder, SseEvent};
