//! Output framing: whether terminal output travels as binary or text frames.

/// Transport framing used for terminal output.
///
/// Resolved once at startup and handed to every session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingMode {
    Binary,
    Text,
}

impl FramingMode {
    /// Text framing on Windows, binary framing everywhere else.
    pub fn for_host() -> Self {
        if cfg!(windows) {
            FramingMode::Text
        } else {
            FramingMode::Binary
        }
    }
}

/// A single message sent back over the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFrame {
    Text(String),
    Binary(Vec<u8>),
}

impl OutputFrame {
    pub fn len(&self) -> usize {
        match self {
            OutputFrame::Text(s) => s.len(),
            OutputFrame::Binary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_framing() {
        #[cfg(windows)]
        assert_eq!(FramingMode::for_host(), FramingMode::Text);
        #[cfg(not(windows))]
        assert_eq!(FramingMode::for_host(), FramingMode::Binary);
    }

    #[test]
    fn test_frame_len() {
        assert_eq!(OutputFrame::Text("héllo".into()).len(), 6);
        assert_eq!(OutputFrame::Binary(vec![1, 2, 3]).len(), 3);
        assert!(OutputFrame::Binary(Vec::new()).is_empty());
    }
}
