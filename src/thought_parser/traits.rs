use std::fmt;

use crate::config::ConfigError;

/// One arrival unit of the translation stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    /// Primary content, scanned for inline thought markers.
    pub content: Option<String>,

    /// Native reasoning side channel, merged into the thought text verbatim.
    pub reasoning: Option<String>,
}

impl Fragment {
    /// Create a fragment carrying only primary content.
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            reasoning: None,
        }
    }

    /// Create a fragment carrying only side-channel reasoning.
    pub fn reasoning(text: impl Into<String>) -> Self {
        Self {
            content: None,
            reasoning: Some(text.into()),
        }
    }

    pub fn with_reasoning(mut self, text: impl Into<String>) -> Self {
        self.reasoning = Some(text.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.content.as_deref().is_none_or(str::is_empty)
            && self.reasoning.as_deref().is_none_or(str::is_empty)
    }
}

/// Snapshot of what the renderer should display after a fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmissionState {
    /// Translated answer so far, markers and thought content removed.
    pub answer_text: String,

    /// Thought text so far, including the preview of an unterminated thought.
    pub thought_text: String,

    /// Becomes true once any thought content has been produced.
    pub thought_visible: bool,
}

impl EmissionState {
    /// Thought text to display under the user's preference, if any.
    pub fn visible_thought(&self, show_thoughts: bool) -> Option<&str> {
        (show_thoughts && self.thought_visible).then_some(self.thought_text.as_str())
    }
}

impl fmt::Display for EmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EmissionState {{ answer: {} chars, thought: {} chars, visible: {} }}",
            self.answer_text.len(),
            self.thought_text.len(),
            self.thought_visible
        )
    }
}

/// Generation identifier of one translation stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub(crate) u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// The fragment source failed before the end of the stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Transport error: {message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(err: std::io::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Error types for stream decoding operations.
///
/// Marker shape never produces an error: unterminated or stray markers are
/// resolved by the segmenter and by `end()`.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Malformed fragment: {reason}")]
    MalformedFragment { reason: String },

    #[error("No active stream, call start() first")]
    NotStreaming,

    #[error("Buffer overflow: {0} bytes exceeds maximum")]
    BufferOverflow(usize),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl StreamError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedFragment {
            reason: reason.into(),
        }
    }

    /// Whether the stream can continue after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedFragment { .. })
    }
}
