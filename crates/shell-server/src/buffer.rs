//! Output coalescing.
//!
//! A terminal emits many tiny writes (every echoed keystroke, every redraw
//! fragment). The coalescer gathers them and hands back one frame per
//! debounce interval. The flush deadline lives here as plain state; the
//! session loop sleeps until it and then calls [`OutputCoalescer::flush`].

use std::time::Duration;

use shell_core::{FramingMode, OutputFrame};
use shell_pty::Utf8Decoder;
use tokio::time::Instant;

enum Pending {
    Binary(Vec<u8>),
    Text { text: String, decoder: Utf8Decoder },
}

pub struct OutputCoalescer {
    interval: Duration,
    pending: Pending,
    deadline: Option<Instant>,
}

impl OutputCoalescer {
    pub fn new(mode: FramingMode, interval: Duration) -> Self {
        let pending = match mode {
            FramingMode::Binary => Pending::Binary(Vec::new()),
            FramingMode::Text => Pending::Text {
                text: String::new(),
                decoder: Utf8Decoder::new(),
            },
        };
        Self {
            interval,
            pending,
            deadline: None,
        }
    }

    /// Append a chunk of terminal output.
    ///
    /// Returns `true` if this call scheduled a flush; chunks arriving while a
    /// flush is already scheduled join it.
    pub fn push(&mut self, chunk: &[u8]) -> bool {
        match &mut self.pending {
            Pending::Binary(buf) => buf.extend_from_slice(chunk),
            Pending::Text { text, decoder } => text.push_str(&decoder.decode(chunk)),
        }

        if self.deadline.is_some() {
            return false;
        }
        self.deadline = Some(Instant::now() + self.interval);
        true
    }

    /// When the scheduled flush is due, if one is scheduled.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_scheduled(&self) -> bool {
        self.deadline.is_some()
    }

    /// Take everything accumulated so far as one frame and clear the schedule.
    pub fn flush(&mut self) -> Option<OutputFrame> {
        self.deadline = None;
        let frame = match &mut self.pending {
            Pending::Binary(buf) => OutputFrame::Binary(std::mem::take(buf)),
            Pending::Text { text, .. } => OutputFrame::Text(std::mem::take(text)),
        };
        if frame.is_empty() {
            None
        } else {
            Some(frame)
        }
    }

    /// Like [`flush`](Self::flush), but also emits a truncated UTF-8 tail.
    /// Used when no more output will follow.
    pub fn drain(&mut self) -> Option<OutputFrame> {
        if let Pending::Text { text, decoder } = &mut self.pending {
            text.push_str(&decoder.finish());
        }
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(5);

    #[tokio::test]
    async fn burst_becomes_single_binary_frame() {
        let mut buf = OutputCoalescer::new(FramingMode::Binary, INTERVAL);
        assert!(buf.push(b"l"));
        assert!(!buf.push(b"s"));
        assert!(!buf.push(b"\r\n"));
        assert_eq!(buf.flush(), Some(OutputFrame::Binary(b"ls\r\n".to_vec())));
    }

    #[tokio::test]
    async fn burst_becomes_single_text_frame() {
        let mut buf = OutputCoalescer::new(FramingMode::Text, INTERVAL);
        buf.push(b"shell@");
        buf.push("dévice".as_bytes());
        buf.push(b":/ $ ");
        assert_eq!(
            buf.flush(),
            Some(OutputFrame::Text("shell@dévice:/ $ ".to_string()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn only_one_deadline_while_pending() {
        let mut buf = OutputCoalescer::new(FramingMode::Binary, INTERVAL);
        let start = Instant::now();
        buf.push(b"a");
        let first = buf.deadline().unwrap();
        assert_eq!(first, start + INTERVAL);

        tokio::time::advance(Duration::from_millis(3)).await;
        buf.push(b"b");
        assert_eq!(buf.deadline(), Some(first));
        assert_eq!(buf.flush(), Some(OutputFrame::Binary(b"ab".to_vec())));
    }

    #[tokio::test(start_paused = true)]
    async fn flush_resets_and_next_chunk_reschedules() {
        let mut buf = OutputCoalescer::new(FramingMode::Binary, INTERVAL);
        buf.push(b"first");
        assert!(buf.flush().is_some());
        assert!(!buf.is_scheduled());
        assert_eq!(buf.flush(), None);

        tokio::time::advance(Duration::from_millis(50)).await;
        assert!(buf.push(b"second"));
        assert_eq!(buf.deadline(), Some(Instant::now() + INTERVAL));
        assert_eq!(buf.flush(), Some(OutputFrame::Binary(b"second".to_vec())));
    }

    #[tokio::test]
    async fn text_mode_keeps_split_characters_intact() {
        let mut buf = OutputCoalescer::new(FramingMode::Text, INTERVAL);
        let bytes = "→ done".as_bytes();
        buf.push(&bytes[..2]);
        assert_eq!(buf.flush(), None);
        buf.push(&bytes[2..]);
        assert_eq!(buf.flush(), Some(OutputFrame::Text("→ done".to_string())));
    }

    #[tokio::test]
    async fn drain_emits_truncated_tail() {
        let mut buf = OutputCoalescer::new(FramingMode::Text, INTERVAL);
        buf.push(b"bye\xE2\x86");
        assert_eq!(
            buf.drain(),
            Some(OutputFrame::Text("bye\u{FFFD}".to_string()))
        );
        assert_eq!(buf.drain(), None);
    }
}
