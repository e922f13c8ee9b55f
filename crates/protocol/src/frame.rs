use crate::FrameError;
use crate::constants::{
    ACTION_DOWNLOAD, ACTION_UPLOAD, EXIT_FILENAME, FILENAME_PLACEHOLDER, FRAME_PREFIX,
    FRAME_SEPARATOR, FRAME_SUFFIX,
};

/// A decoded control message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlFrame {
    /// The client is about to push `size` bytes stored under `filename`.
    Upload { filename: String, size: u64 },
    /// The client asks for the content of `filename`.
    Download { filename: String },
    /// The client is done with the connection.
    Exit,
}

impl ControlFrame {
    pub fn upload(filename: impl Into<String>, size: u64) -> Self {
        Self::Upload {
            filename: filename.into(),
            size,
        }
    }

    pub fn download(filename: impl Into<String>) -> Self {
        Self::Download {
            filename: filename.into(),
        }
    }

    /// Renders the frame as wire text.
    ///
    /// Filenames are passed through [`sanitize_filename`] first. The teardown
    /// frame carries the upload action code and is recognised by its filename.
    pub fn encode(&self) -> String {
        let sep = FRAME_SEPARATOR;
        match self {
            Self::Upload { filename, size } => format!(
                "{FRAME_PREFIX}{sep}{ACTION_UPLOAD}{sep}{}{sep}{size}{sep}{FRAME_SUFFIX}",
                sanitize_filename(filename)
            ),
            Self::Download { filename } => format!(
                "{FRAME_PREFIX}{sep}{ACTION_DOWNLOAD}{sep}{}{sep}{FRAME_SUFFIX}",
                sanitize_filename(filename)
            ),
            Self::Exit => format!(
                "{FRAME_PREFIX}{sep}{ACTION_UPLOAD}{sep}{EXIT_FILENAME}{sep}{FRAME_SUFFIX}"
            ),
        }
    }

    /// Parses one control frame from raw bytes.
    ///
    /// Only the action, filename and size fields are inspected; the prefix
    /// and suffix markers are not validated. A filename of `exit` yields
    /// [`ControlFrame::Exit`] whatever the action code.
    pub fn decode(raw: &[u8]) -> Result<Self, FrameError> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| FrameError::Malformed(format!("not valid UTF-8: {e}")))?;
        let fields: Vec<&str> = text.split(FRAME_SEPARATOR).collect();

        let action_field = fields
            .get(1)
            .ok_or_else(|| FrameError::Malformed("missing action field".into()))?;
        let action: i64 = action_field.parse().map_err(|_| {
            FrameError::Malformed(format!("action is not an integer: {action_field:?}"))
        })?;

        let filename = match fields.get(2) {
            Some(name) if !name.is_empty() => *name,
            _ => return Err(FrameError::Malformed("missing filename field".into())),
        };

        if filename == EXIT_FILENAME {
            return Ok(Self::Exit);
        }

        match action {
            ACTION_UPLOAD => {
                let size_field = fields
                    .get(3)
                    .ok_or_else(|| FrameError::Malformed("missing size field".into()))?;
                let size = size_field.parse().map_err(|_| {
                    FrameError::Malformed(format!("size is not an integer: {size_field:?}"))
                })?;
                Ok(Self::upload(filename, size))
            }
            ACTION_DOWNLOAD => Ok(Self::download(filename)),
            other => Err(FrameError::UnknownAction(other)),
        }
    }

    /// The filename carried by the frame, if any.
    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::Upload { filename, .. } | Self::Download { filename } => Some(filename),
            Self::Exit => None,
        }
    }
}

/// Replaces the field separator in `name` so it cannot forge frame boundaries.
pub fn sanitize_filename(name: &str) -> String {
    name.replace(FRAME_SEPARATOR, FILENAME_PLACEHOLDER)
}
