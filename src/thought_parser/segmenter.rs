// Classification of the accumulated buffer into answer text, thought text
// and the part that has to stay buffered until more fragments arrive.

use crate::{
    config::DelimiterPair,
    thought_parser::scanner::{partial_prefix_len, scan},
};

/// Result of segmenting the current buffer. Slices borrow from the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// No open marker. `answer` is final; `pending` is a trailing proper
    /// prefix of the open marker that must stay buffered.
    Plain { answer: &'a str, pending: &'a str },

    /// A complete open/close pair. `thought` is trimmed; `remainder` follows
    /// the close marker and must be segmented again.
    Closed {
        answer: &'a str,
        thought: &'a str,
        remainder: &'a str,
    },

    /// An open marker without its close marker yet. Both values are
    /// previews; the buffer is kept intact.
    Open {
        answer: &'a str,
        thought_preview: &'a str,
    },
}

/// Segment `buffer` according to the active delimiter pair.
pub fn segment<'a>(buffer: &'a str, pair: &DelimiterPair) -> Segment<'a> {
    let markers = scan(buffer, pair);

    let Some(open) = markers.open else {
        let split = buffer.len() - partial_prefix_len(buffer, &pair.open);
        return Segment::Plain {
            answer: &buffer[..split],
            pending: &buffer[split..],
        };
    };

    let thought_start = open + pair.open.len();
    match markers.closing {
        Some(close) => Segment::Closed {
            answer: &buffer[..open],
            thought: buffer[thought_start..close].trim(),
            remainder: &buffer[close + pair.close.len()..],
        },
        None => {
            let tail = &buffer[thought_start..];
            let visible = tail.len() - partial_prefix_len(tail, &pair.close);
            Segment::Open {
                answer: &buffer[..open],
                thought_preview: &tail[..visible],
            }
        }
    }
}
