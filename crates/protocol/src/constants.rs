/// Size of one bulk-transfer chunk in bytes.
///
/// Every raw read and write of file content on the wire is bounded by this
/// value, and a declared size maps to `ceil(size / CHUNK_SIZE)` chunks.
pub const CHUNK_SIZE: usize = 2048;

/// Leading marker and protocol tag of every control frame.
pub const FRAME_PREFIX: &str = "RR***Great";

/// Field separator inside a control frame.
pub const FRAME_SEPARATOR: &str = "++";

/// Trailing marker of every control frame (after the last separator).
pub const FRAME_SUFFIX: &str = "***";

/// Substituted for [`FRAME_SEPARATOR`] inside filenames before encoding.
///
/// The substitution is not reversed on decode.
pub const FILENAME_PLACEHOLDER: &str = "!!?";

/// Filename that turns a frame into a connection teardown.
pub const EXIT_FILENAME: &str = "exit";

/// Action code for uploads (client to server). Also tags the teardown frame.
pub const ACTION_UPLOAD: i64 = 1;

/// Action code for downloads (server to client).
pub const ACTION_DOWNLOAD: i64 = 2;

/// Consecutive empty reads tolerated on an idle connection before it is closed.
pub const DEFAULT_MAX_EMPTY_READS: u32 = 10;

/// Listen backlog used by the server.
pub const DEFAULT_BACKLOG: u32 = 10;
