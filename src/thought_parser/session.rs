// Stream reducer owning the buffer and emission state of one translation.

use tracing::debug;

use crate::{
    config::{ConfigResult, ConfigValidator, DEFAULT_MAX_BUFFER_SIZE, DelimiterPair, StreamConfig},
    thought_parser::{
        scanner::scan,
        segmenter::{Segment, segment},
        traits::{EmissionState, Fragment, StreamError},
    },
};

#[derive(Debug, Clone, Default)]
struct ActiveStream {
    buffer: String,
    answer: String,
    thought: String,
    /// Answer text before an unterminated open marker, display only.
    pending_answer: String,
    /// Uncommitted content after an unterminated open marker, display only.
    pending_thought: String,
    /// Bytes of the open thought body already moved into `thought`, because
    /// side-channel reasoning arrived after them.
    open_committed: usize,
    thought_visible: bool,
}

impl ActiveStream {
    /// Segment the buffer until nothing resolvable remains.
    fn resolve(&mut self, pair: &DelimiterPair) {
        self.pending_answer.clear();
        self.pending_thought.clear();

        loop {
            match segment(&self.buffer, pair) {
                Segment::Plain { answer, pending } => {
                    let held = pending.len();
                    self.answer.push_str(answer);
                    let consumed = self.buffer.len() - held;
                    self.buffer.drain(..consumed);
                    return;
                }
                Segment::Closed {
                    answer,
                    thought,
                    remainder,
                } => {
                    let consumed = self.buffer.len() - remainder.len();
                    if consumed == 0 {
                        return;
                    }
                    debug!(
                        answer_len = answer.len(),
                        thought_len = thought.len(),
                        "Resolved thought block"
                    );
                    self.answer.push_str(answer);
                    if self.open_committed == 0 {
                        self.thought.push_str(thought);
                    } else {
                        // Part of the body was committed ahead of reasoning;
                        // append only the rest.
                        let body_start = answer.len() + pair.open.len() + self.open_committed;
                        let body_end = consumed - pair.close.len();
                        let rest = self.buffer.get(body_start..body_end).unwrap_or_default();
                        self.thought.push_str(rest.trim_end());
                        self.open_committed = 0;
                    }
                    self.thought_visible = true;
                    self.buffer.drain(..consumed);
                }
                Segment::Open {
                    answer,
                    thought_preview,
                } => {
                    let committed = self.open_committed.min(thought_preview.len());
                    self.pending_answer.push_str(answer);
                    self.pending_thought.push_str(&thought_preview[committed..]);
                    self.thought_visible = true;
                    return;
                }
            }
        }
    }

    /// Append side-channel reasoning after everything displayed so far.
    fn merge_reasoning(&mut self, reasoning: &str) {
        if !self.pending_thought.is_empty() {
            let preview = std::mem::take(&mut self.pending_thought);
            if self.open_committed == 0 {
                self.thought.push_str(preview.trim_start());
            } else {
                self.thought.push_str(&preview);
            }
            self.open_committed += preview.len();
        }
        self.thought.push_str(reasoning);
        self.thought_visible = true;
    }

    /// Move everything still buffered into the committed channels.
    fn flush(&mut self, pair: &DelimiterPair) {
        self.resolve(pair);
        self.pending_answer.clear();
        self.pending_thought.clear();

        let buffer = std::mem::take(&mut self.buffer);
        match scan(&buffer, pair).open {
            Some(open) => {
                debug!("Stream ended inside an unterminated thought");
                self.answer.push_str(&buffer[..open]);
                let body = &buffer[open + pair.open.len()..];
                if self.open_committed == 0 {
                    self.thought.push_str(body.trim());
                } else {
                    let rest = body.get(self.open_committed..).unwrap_or_default();
                    self.thought.push_str(rest.trim_end());
                }
                self.open_committed = 0;
                self.thought_visible = true;
            }
            None => self.answer.push_str(&buffer),
        }
    }

    fn snapshot(&self) -> EmissionState {
        let mut answer_text = self.answer.clone();
        answer_text.push_str(&self.pending_answer);
        let mut thought_text = self.thought.clone();
        thought_text.push_str(&self.pending_thought);

        EmissionState {
            answer_text,
            thought_text,
            thought_visible: self.thought_visible,
        }
    }
}

#[derive(Debug, Clone, Default)]
enum SessionState {
    #[default]
    Idle,
    Streaming(ActiveStream),
}

/// Incremental decoder separating inline thought content from the answer.
///
/// A session is `Idle` until [`start`](Self::start) and returns to `Idle` on
/// [`end`](Self::end) or [`cancel`](Self::cancel). Each call to
/// [`feed`](Self::feed) fully consumes its fragment and returns the updated
/// [`EmissionState`].
#[derive(Debug, Clone)]
pub struct StreamSession {
    delimiters: DelimiterPair,
    max_buffer_size: usize,
    state: SessionState,
}

impl StreamSession {
    /// Create an idle session. Fails if the delimiter pair is unusable,
    /// e.g. an empty marker.
    pub fn new(delimiters: DelimiterPair) -> ConfigResult<Self> {
        ConfigValidator::validate_delimiters(&delimiters)?;
        Ok(Self {
            delimiters,
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            state: SessionState::Idle,
        })
    }

    pub fn from_config(config: &StreamConfig) -> ConfigResult<Self> {
        ConfigValidator::validate(config)?;
        Ok(Self::new(config.delimiters.clone())?.with_max_buffer_size(config.max_buffer_size))
    }

    pub fn with_max_buffer_size(mut self, max_buffer_size: usize) -> Self {
        self.max_buffer_size = max_buffer_size;
        self
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self.state, SessionState::Streaming(_))
    }

    /// Current emission state, `None` while idle.
    pub fn snapshot(&self) -> Option<EmissionState> {
        match &self.state {
            SessionState::Streaming(stream) => Some(stream.snapshot()),
            SessionState::Idle => None,
        }
    }

    /// Begin a new stream with an empty buffer and emission state.
    /// Any stream already in progress is discarded.
    pub fn start(&mut self) {
        if self.is_streaming() {
            debug!("Restarting stream, discarding previous state");
        }
        self.state = SessionState::Streaming(ActiveStream::default());
    }

    /// Consume one fragment and return the updated emission state.
    pub fn feed(&mut self, fragment: &Fragment) -> Result<EmissionState, StreamError> {
        let SessionState::Streaming(stream) = &mut self.state else {
            return Err(StreamError::NotStreaming);
        };

        if let Some(content) = fragment.content.as_deref().filter(|c| !c.is_empty()) {
            let needed = stream.buffer.len() + content.len();
            if needed > self.max_buffer_size {
                return Err(StreamError::BufferOverflow(needed));
            }
            stream.buffer.push_str(content);
            stream.resolve(&self.delimiters);
        }

        if let Some(reasoning) = fragment.reasoning.as_deref().filter(|r| !r.is_empty()) {
            stream.merge_reasoning(reasoning);
        }

        Ok(stream.snapshot())
    }

    /// Flush the buffer and return the final emission state.
    ///
    /// An open marker still waiting for its close marker is not an error:
    /// text before it stays in the answer and the thought keeps its preview.
    pub fn end(&mut self) -> Result<EmissionState, StreamError> {
        let SessionState::Streaming(mut stream) = std::mem::take(&mut self.state) else {
            return Err(StreamError::NotStreaming);
        };
        stream.flush(&self.delimiters);
        Ok(stream.snapshot())
    }

    /// Discard the stream without emitting anything further.
    pub fn cancel(&mut self) {
        if self.is_streaming() {
            debug!("Stream cancelled");
        }
        self.state = SessionState::Idle;
    }

    /// Decode a complete, non-streamed response in one pass.
    pub fn parse_complete(config: &StreamConfig, text: &str) -> Result<EmissionState, StreamError> {
        let mut session = Self::from_config(config)?;
        session.start();
        session.feed(&Fragment::content(text))?;
        session.end()
    }
}
