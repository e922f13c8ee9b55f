use crate::FrameError;

/// Acknowledgement token sent back for a control frame or a finished upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Ok,
    Abort,
}

impl Response {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Abort => "abort",
        }
    }

    pub const fn as_bytes(self) -> &'static [u8] {
        self.as_str().as_bytes()
    }

    /// Matches a received message against the known tokens.
    pub fn parse(raw: &[u8]) -> Option<Self> {
        match raw {
            b"ok" => Some(Self::Ok),
            b"abort" => Some(Self::Abort),
            _ => None,
        }
    }

    /// Length of the longest token.
    pub const MAX_LEN: usize = 5;
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders the download size message: decimal digits and a newline.
///
/// The newline is not part of the historical wire format, which sent the
/// bare digits unframed. Peers that expect the bare form do not interoperate
/// with this framing: they read the newline as content, and
/// [`decode_size_line`] readers wait for a newline that never arrives.
pub fn encode_size(size: u64) -> String {
    format!("{size}\n")
}

/// Parses a size message, ignoring surrounding whitespace.
pub fn decode_size_line(line: &str) -> Result<u64, FrameError> {
    let trimmed = line.trim();
    trimmed
        .parse()
        .map_err(|_| FrameError::BadSize(trimmed.to_string()))
}
