// Marker location inside the accumulated stream buffer.

use crate::config::DelimiterPair;

/// Byte offsets of the delimiter markers found in a buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkerScan {
    /// First occurrence of the open marker.
    pub open: Option<usize>,

    /// First occurrence of the close marker anywhere in the buffer.
    pub close: Option<usize>,

    /// First close marker starting at or after the end of `open`.
    /// This is the one that terminates the thought; a close marker before
    /// the open marker is inert text.
    pub closing: Option<usize>,
}

/// Locate the open and close markers of `pair` in `buffer`.
pub fn scan(buffer: &str, pair: &DelimiterPair) -> MarkerScan {
    let open = buffer.find(&pair.open);
    let close = buffer.find(&pair.close);
    let closing = open.and_then(|start| {
        let after_open = start + pair.open.len();
        match close {
            Some(idx) if idx >= after_open => Some(idx),
            _ => buffer[after_open..]
                .find(&pair.close)
                .map(|idx| idx + after_open),
        }
    });

    MarkerScan {
        open,
        close,
        closing,
    }
}

/// Length of the longest proper prefix of `marker` that `buffer` ends with.
///
/// Such a suffix may still grow into a full marker once the next fragment
/// arrives, so it must not be emitted yet.
pub fn partial_prefix_len(buffer: &str, marker: &str) -> usize {
    let max = marker.len().saturating_sub(1).min(buffer.len());
    (1..=max)
        .rev()
        .find(|&len| {
            let start = buffer.len() - len;
            buffer.is_char_boundary(start) && marker.starts_with(&buffer[start..])
        })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> DelimiterPair {
        DelimiterPair::bracketed()
    }

    #[test]
    fn test_scan_no_markers() {
        let markers = scan("plain translated text", &pair());
        assert_eq!(markers, MarkerScan::default());
    }

    #[test]
    fn test_scan_matched_pair() {
        let buffer = "A<<<THOUGHT>>>B<<<END>>>C";
        let markers = scan(buffer, &pair());
        assert_eq!(markers.open, Some(1));
        assert_eq!(markers.close, Some(15));
        assert_eq!(markers.closing, Some(15));
    }

    #[test]
    fn test_scan_open_only() {
        let markers = scan("A<<<THOUGHT>>>still thinking", &pair());
        assert_eq!(markers.open, Some(1));
        assert_eq!(markers.close, None);
        assert_eq!(markers.closing, None);
    }

    #[test]
    fn test_scan_stray_close_before_open() {
        let buffer = "x<<<END>>>y<<<THOUGHT>>>z";
        let markers = scan(buffer, &pair());
        assert_eq!(markers.close, Some(1));
        assert_eq!(markers.open, Some(11));
        assert_eq!(markers.closing, None);

        let buffer = "x<<<END>>>y<<<THOUGHT>>>z<<<END>>>";
        let markers = scan(buffer, &pair());
        assert_eq!(markers.close, Some(1));
        assert_eq!(markers.closing, Some(25));
    }

    #[test]
    fn test_scan_close_only_is_not_matched() {
        let markers = scan("A</think>B", &DelimiterPair::think_tags());
        assert_eq!(markers.open, None);
        assert_eq!(markers.close, Some(1));
        assert_eq!(markers.closing, None);
    }

    #[test]
    fn test_scan_think_tags_overlap() {
        // "</think>" must not be mistaken for the open tag
        let markers = scan("<think>a</think>", &DelimiterPair::think_tags());
        assert_eq!(markers.open, Some(0));
        assert_eq!(markers.closing, Some(8));
    }

    #[test]
    fn test_partial_prefix_len() {
        let marker = "<<<THOUGHT>>>";
        assert_eq!(partial_prefix_len("A<<<THO", marker), 6);
        assert_eq!(partial_prefix_len("A<", marker), 1);
        assert_eq!(partial_prefix_len("A<<", marker), 2);
        assert_eq!(partial_prefix_len("A", marker), 0);
        assert_eq!(partial_prefix_len("", marker), 0);
        // A complete marker is not a partial one
        assert_eq!(partial_prefix_len("<<<THOUGHT>>>", marker), 0);
        // Longest suffix wins
        assert_eq!(partial_prefix_len("<<<<", marker), 3);
    }

    #[test]
    fn test_partial_prefix_len_multibyte() {
        assert_eq!(partial_prefix_len("译文<th", "<think>"), 3);
        assert_eq!(partial_prefix_len("译文", "文<think>"), 3);
        assert_eq!(partial_prefix_len("日本", "<think>"), 0);
    }
}
