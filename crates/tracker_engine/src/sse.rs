//! Incremental decoder for `text/event-stream` bodies.
//!
//! Chunks arrive with arbitrary boundaries; [`SseDecoder::push`] buffers
//! partial lines and returns every frame completed by a blank line. Lines end
//! with LF, CRLF or a lone CR, and a CRLF split across two chunks counts once.
//! Frames without any `data` line are dropped, as are comment lines
//! (`: keep-alive`). A line or frame larger than [`MAX_FRAME_BYTES`] is
//! discarded whole.

use tracker_logging::tracker_warn;

/// Event name used when a frame carries no `event:` field.
pub const DEFAULT_EVENT: &str = "message";

/// Upper bound on one pending line and on the data of one frame.
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
    pub id: Option<String>,
}

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
    data_len: usize,
    last_id: Option<String>,
    /// The previous line ended with CR; a leading LF belongs to it.
    after_cr: bool,
    /// Dropping the rest of an oversized line.
    skip_line: bool,
    /// Dropping the rest of an oversized frame.
    skip_frame: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);
        let mut frames = Vec::new();
        loop {
            if self.after_cr && !self.buffer.is_empty() {
                if self.buffer[0] == b'\n' {
                    self.buffer.drain(..1);
                }
                self.after_cr = false;
            }
            let Some(pos) = self
                .buffer
                .iter()
                .position(|byte| *byte == b'\n' || *byte == b'\r')
            else {
                break;
            };
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.after_cr = line.pop() == Some(b'\r');
            if self.skip_line {
                self.skip_line = false;
                continue;
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(frame) = self.process_line(&line) {
                frames.push(frame);
            }
        }

        if self.buffer.len() > MAX_FRAME_BYTES {
            tracker_warn!(
                "Discarding event stream line over {} bytes",
                MAX_FRAME_BYTES
            );
            self.buffer.clear();
            self.skip_line = true;
            self.drop_frame();
        } else if self.skip_line {
            self.buffer.clear();
        }
        frames
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') || self.skip_frame {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => {
                self.data_len += value.len() + 1;
                if self.data_len > MAX_FRAME_BYTES {
                    tracker_warn!("Discarding event stream frame over {} bytes", MAX_FRAME_BYTES);
                    self.drop_frame();
                } else {
                    self.data.push(value.to_string());
                }
            }
            "id" => self.last_id = Some(value.to_string()),
            _ => {}
        }
        None
    }

    /// Forgets the frame being assembled and ignores its remaining lines.
    fn drop_frame(&mut self) {
        self.event = None;
        self.data.clear();
        self.data_len = 0;
        self.skip_frame = true;
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        self.data_len = 0;
        if std::mem::take(&mut self.skip_frame) || self.data.is_empty() {
            self.data.clear();
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame {
            event: event
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data,
            id: self.last_id.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(event: &str, data: &str) -> SseFrame {
        SseFrame {
            event: event.to_string(),
            data: data.to_string(),
            id: None,
        }
    }

    #[test]
    fn decodes_named_frames() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(
            b"event: busca_iniciada\ndata: {\"robo\":\"zap\"}\n\nevent: concluido\ndata: {}\n\n",
        );
        assert_eq!(
            frames,
            vec![
                frame("busca_iniciada", "{\"robo\":\"zap\"}"),
                frame("concluido", "{}"),
            ]
        );
    }

    #[test]
    fn frames_may_span_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: cards_enc").is_empty());
        assert!(decoder.push(b"ontrados\r\ndata: {\"total\"").is_empty());
        assert!(decoder.push(b":12}\r\n").is_empty());
        let frames = decoder.push(b"\r\n");
        assert_eq!(frames, vec![frame("cards_encontrados", "{\"total\":12}")]);
    }

    #[test]
    fn multibyte_text_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        let text = "event: endereco_obtido\ndata: {\"endereco\":\"São José\"}\n\n".as_bytes();
        let split = text.iter().position(|byte| *byte == 0xC3).unwrap() + 1;
        assert!(decoder.push(&text[..split]).is_empty());
        let frames = decoder.push(&text[split..]);
        assert_eq!(frames[0].data, "{\"endereco\":\"São José\"}");
    }

    #[test]
    fn comments_and_unknown_fields_are_ignored() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b": keep-alive\n\nretry: 1000\nevent: x\ndata: 1\n\n");
        assert_eq!(frames, vec![frame("x", "1")]);
    }

    #[test]
    fn data_lines_are_joined_and_default_event_applies() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b"data: a\ndata:b\nid: 7\n\n");
        assert_eq!(
            frames,
            vec![SseFrame {
                event: DEFAULT_EVENT.to_string(),
                data: "a\nb".to_string(),
                id: Some("7".to_string()),
            }]
        );
    }

    #[test]
    fn frame_without_data_is_dropped() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: concluido\n\n").is_empty());
        // The dangling event name does not leak into the next frame.
        assert_eq!(decoder.push(b"data: 1\n\n"), vec![frame("message", "1")]);
    }

    #[test]
    fn lone_cr_ends_lines() {
        let mut decoder = SseDecoder::new();
        let frames = decoder.push(b"event: concluido\rdata: {}\r\rdata: 2\r\r");
        assert_eq!(frames, vec![frame("concluido", "{}"), frame("message", "2")]);
    }

    #[test]
    fn crlf_split_between_chunks_is_one_line_end() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: x\r").is_empty());
        assert!(decoder.push(b"\ndata: 1\r").is_empty());
        // Had the LF counted as a second line end, the frame would already
        // have been dispatched above.
        let frames = decoder.push(b"\n\r\n");
        assert_eq!(frames, vec![frame("x", "1")]);
    }

    #[test]
    fn oversized_line_is_discarded_and_decoding_resumes() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: big\ndata: ").is_empty());
        let filler = vec![b'a'; MAX_FRAME_BYTES + 1];
        assert!(decoder.push(&filler).is_empty());
        assert!(decoder.buffer.is_empty());
        // The tail of the long line and its frame are dropped.
        assert!(decoder.push(b"aaaa\ndata: tail\n\n").is_empty());

        let frames = decoder.push(b"event: next\ndata: 1\n\n");
        assert_eq!(frames, vec![frame("next", "1")]);
    }

    #[test]
    fn oversized_frame_data_is_discarded() {
        let mut decoder = SseDecoder::new();
        let line = format!("data: {}\n", "b".repeat(MAX_FRAME_BYTES / 2));
        assert!(decoder.push(b"event: big\n").is_empty());
        for _ in 0..3 {
            assert!(decoder.push(line.as_bytes()).is_empty());
        }
        assert!(decoder.push(b"\n").is_empty());
        assert_eq!(decoder.push(b"data: ok\n\n"), vec![frame("message", "ok")]);
    }
}
