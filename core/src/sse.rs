//! Incremental decoding of `text/event-stream` framing.
//!
//! Bytes arrive in arbitrary chunks: a chunk boundary may fall inside a
//! `data:` line, inside the blank line separating frames, or inside a
//! multi-byte UTF-8 character. [`FrameDecoder`] owns the state needed to
//! reassemble complete frames regardless of where the boundaries fall.
//!
//! # Framing
//!
//! ```text
//! event: ready\n
//! data: {}\n
//! \n                      ← frame boundary ("\n\n")
//! : keep-alive\n
//! \n
//! data: {"service":"tickets"}\n
//! \n
//! ```

/// A single `\n\n`-delimited unit of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    raw: String,
}

impl Frame {
    /// Wrap the raw text of one frame (without the trailing delimiter).
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The frame text as received.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The joined `data:` payload.
    ///
    /// Every line starting with `data:` contributes its value, with the
    /// prefix and at most one following whitespace character removed. Values
    /// are joined with `\n` and the result is trimmed. Returns `None` when
    /// the frame has no `data:` line at all.
    ///
    /// # Examples
    ///
    /// ```
    /// use ashva_realtime_core::sse::Frame;
    ///
    /// let frame = Frame::new("event: update\ndata: {\"a\":\ndata:1}");
    /// assert_eq!(frame.data().as_deref(), Some("{\"a\":\n1}"));
    /// assert_eq!(Frame::new(": keep-alive").data(), None);
    /// ```
    #[must_use]
    pub fn data(&self) -> Option<String> {
        let values: Vec<&str> = self
            .raw
            .split('\n')
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|value| value.strip_prefix(char::is_whitespace).unwrap_or(value))
            .collect();

        if values.is_empty() {
            return None;
        }

        Some(values.join("\n").trim().to_owned())
    }

    /// The `event:` field, if present.
    #[must_use]
    pub fn event_name(&self) -> Option<&str> {
        self.raw
            .split('\n')
            .find_map(|line| line.strip_prefix("event:"))
            .map(str::trim)
    }

    /// Whether the frame consists only of comment lines (`: keep-alive`).
    #[must_use]
    pub fn is_comment(&self) -> bool {
        let mut lines = self.raw.split('\n').filter(|line| !line.is_empty()).peekable();
        lines.peek().is_some() && lines.all(|line| line.starts_with(':'))
    }
}

/// Encode a data frame, optionally named, including its terminating blank
/// line. A multi-line payload becomes one `data:` line per line.
///
/// ```
/// use ashva_realtime_core::sse::encode_data_frame;
///
/// assert_eq!(encode_data_frame(Some("ready"), "{}"), "event: ready\ndata: {}\n\n");
/// assert_eq!(encode_data_frame(None, "a\nb"), "data: a\ndata: b\n\n");
/// ```
#[must_use]
pub fn encode_data_frame(event: Option<&str>, payload: &str) -> String {
    let mut frame = String::with_capacity(payload.len() + 16);
    if let Some(event) = event {
        frame.push_str("event: ");
        frame.push_str(event);
        frame.push('\n');
    }
    for line in payload.split('\n') {
        frame.push_str("data: ");
        frame.push_str(line);
        frame.push('\n');
    }
    frame.push('\n');
    frame
}

/// Encode a comment frame (`: text`).
#[must_use]
pub fn encode_comment(text: &str) -> String {
    format!(": {text}{}", FrameDecoder::DELIMITER)
}

/// Reassembles frames from a chunked byte stream.
///
/// # Example
///
/// ```
/// use ashva_realtime_core::sse::FrameDecoder;
///
/// let mut decoder = FrameDecoder::new();
/// assert!(decoder.push(b"data: {\"serv").is_empty());
///
/// let frames = decoder.push(b"ice\":\"tickets\"}\n\ndata: {}");
/// assert_eq!(frames.len(), 1);
/// assert_eq!(frames[0].data().as_deref(), Some(r#"{"service":"tickets"}"#));
/// assert_eq!(decoder.pending(), "data: {}");
/// ```
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Trailing bytes of an incomplete UTF-8 sequence
    utf8_tail: Vec<u8>,
    /// Decoded text not yet terminated by `\n\n`
    buffer: String,
}

impl FrameDecoder {
    /// Frame delimiter.
    pub const DELIMITER: &'static str = "\n\n";

    /// Create an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every frame it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
        self.decode(chunk);
        self.drain_frames()
    }

    /// Text received after the last complete frame.
    #[must_use]
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Discard buffered state, returning how many bytes were dropped.
    ///
    /// An unterminated trailing frame is never dispatched.
    pub fn finish(&mut self) -> usize {
        let dropped = self.buffer.len() + self.utf8_tail.len();
        self.buffer.clear();
        self.utf8_tail.clear();
        dropped
    }

    /// Decode bytes into the text buffer, holding back an incomplete
    /// trailing sequence and replacing invalid ones with U+FFFD.
    fn decode(&mut self, chunk: &[u8]) {
        let mut bytes = std::mem::take(&mut self.utf8_tail);
        bytes.extend_from_slice(chunk);

        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    return;
                },
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    self.buffer.push_str(&String::from_utf8_lossy(valid));

                    match err.error_len() {
                        Some(invalid) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[invalid..];
                        },
                        None => {
                            self.utf8_tail = after.to_vec();
                            return;
                        },
                    }
                },
            }
        }
    }

    fn drain_frames(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        let mut start = 0;

        while let Some(offset) = self.buffer[start..].find(Self::DELIMITER) {
            let end = start + offset;
            frames.push(Frame::new(&self.buffer[start..end]));
            start = end + Self::DELIMITER.len();
        }

        if start > 0 {
            self.buffer.drain(..start);
        }

        frames
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn decode_all(chunks: &[&[u8]]) -> Vec<Frame> {
        let mut decoder = FrameDecoder::new();
        chunks.iter().flat_map(|chunk| decoder.push(chunk)).collect()
    }

    #[test]
    fn test_data_prefix_stripping() {
        assert_eq!(Frame::new("data:x").data().as_deref(), Some("x"));
        assert_eq!(Frame::new("data: x").data().as_deref(), Some("x"));
        // Only one space is part of the prefix; trimming handles the rest
        assert_eq!(Frame::new("data:  x\ndata:  y").data().as_deref(), Some("x\n y"));
        assert_eq!(Frame::new("data:").data().as_deref(), Some(""));
        assert_eq!(Frame::new("  \n\t").data(), None);
        assert_eq!(Frame::new("id: 1\nretry: 10").data(), None);
    }

    #[test]
    fn test_data_lines_must_start_the_line() {
        assert_eq!(Frame::new(" data: x").data(), None);
    }

    #[test]
    fn test_event_name_and_comments() {
        let ready = Frame::new("event: ready\ndata: {}");
        assert_eq!(ready.event_name(), Some("ready"));
        assert!(!ready.is_comment());

        assert!(Frame::new(": keep-alive").is_comment());
        assert!(!Frame::new("").is_comment());
        assert_eq!(Frame::new("data: {}").event_name(), None);
    }

    #[test]
    fn test_split_mid_delimiter() {
        let frames = decode_all(&[b"data: a\n".as_slice(), b"\ndata: b\n\n".as_slice()]);
        let data: Vec<_> = frames.iter().filter_map(Frame::data).collect();
        assert_eq!(data, vec!["a", "b"]);
    }

    #[test]
    fn test_consecutive_delimiters_yield_empty_frames() {
        let frames = decode_all(&[b"data: a\n\n\n\ndata: b\n\n".as_slice()]);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1].raw(), "");
        assert_eq!(frames[1].data(), None);
    }

    #[test]
    fn test_split_mid_utf8_sequence() {
        let text = "data: {\"data\":\"Jalandhar ₹ पानी\"}\n\n".as_bytes();
        let rupee = text.iter().position(|b| *b == 0xE2).unwrap();

        let frames = decode_all(&[&text[..=rupee], &text[rupee + 1..]]);
        assert_eq!(frames.len(), 1);
        assert_eq!(
            frames[0].data().as_deref(),
            Some("{\"data\":\"Jalandhar ₹ पानी\"}")
        );
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let frames = decode_all(&[b"data: a\xFFb\n\n".as_slice()]);
        assert_eq!(frames[0].data().as_deref(), Some("a\u{FFFD}b"));
    }

    #[test]
    fn test_incomplete_tail_is_retained_then_finished() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(b"data: {\"service\":\"tickets\"}\n").is_empty());
        assert_eq!(decoder.pending(), "data: {\"service\":\"tickets\"}\n");

        assert_eq!(decoder.finish(), 28);
        assert_eq!(decoder.pending(), "");
    }

    #[test]
    fn test_encoded_frames_decode_back() {
        let body = [
            encode_data_frame(Some("ready"), "{}"),
            encode_comment("keep-alive"),
            encode_data_frame(None, "{\"type\":\n\"tickets.changed\"}"),
        ]
        .concat();

        let frames = decode_all(&[body.as_bytes()]);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].event_name(), Some("ready"));
        assert!(frames[1].is_comment());
        assert_eq!(
            frames[2].data().as_deref(),
            Some("{\"type\":\n\"tickets.changed\"}")
        );
    }

    proptest! {
        #[test]
        fn prop_any_chunking_yields_same_frames(
            splits in proptest::collection::vec(any::<prop::sample::Index>(), 0..12)
        ) {
            let stream = "event: ready\ndata: {}\n\n: keep-alive\n\n\
                          data: {\"service\":\"tickets\",\"data\":\"नमस्ते ₹499\"}\n\n\
                          data: {\"type\":\n\
                          data: \"assignments.created\"}\n\ndata: partial"
                .as_bytes();

            let mut cuts: Vec<usize> = splits.iter().map(|i| i.index(stream.len() + 1)).collect();
            cuts.sort_unstable();

            let mut chunks = Vec::new();
            let mut last = 0;
            for cut in cuts {
                chunks.push(&stream[last..cut]);
                last = cut;
            }
            chunks.push(&stream[last..]);

            prop_assert_eq!(decode_all(&chunks), decode_all(&[stream]));
        }
    }
}
