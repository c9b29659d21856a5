use std::fmt::Display;
use std::io;

/// Header validation failures. Every variant means "no sync at this offset".
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Invalid syncword, Read {0:#06X}")]
    InvalidSyncWord(u16),

    #[error("Unsupported bsid {0}, expected < 12")]
    UnsupportedBsid(u8),

    #[error("Invalid frmsizecod {0}, expected < 38")]
    InvalidFrameSizeCode(u8),

    #[error("Reserved fscod")]
    ReservedSampleRateCode,

    #[error("Frame length {len} exceeds buffer capacity {capacity}")]
    FrameTooLong { len: usize, capacity: usize },

    #[error("Header prefix too short: {0} bytes")]
    Truncated(usize),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("Unsupported sample rate {0} Hz")]
    UnsupportedSampleRate(u32),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Decode engine initialization failed: {0}")]
    Init(String),

    #[error("Frame decode failed: {0}")]
    Frame(String),

    #[error("Block {block} decode failed: {reason}")]
    Block { block: usize, reason: String },
}

#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("Output write failed: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Rejected(String),
}

/// Per-frame failures. All of them are recovered by discarding the frame and
/// going back to header search.
#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    #[error("CRC check failed for {region}, remainder {remainder:#06X}")]
    CrcMismatch { region: CrcRegion, remainder: u16 },

    #[error("Setup rejected frame: {0}")]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Decode(#[from] EngineError),

    #[error("Sample buffer holds {actual} samples, {expected} needed")]
    SampleBuffer { expected: usize, actual: usize },

    #[error("Output sink rejected block {block}: {source}")]
    Sink { block: usize, source: SinkError },
}

/// Error taxonomy used for accounting and log levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NoSync,
    Setup,
    Decode,
    Sink,
}

impl FrameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FrameError::CrcMismatch { .. } => ErrorKind::NoSync,
            FrameError::Setup(_) => ErrorKind::Setup,
            FrameError::Decode(_) | FrameError::SampleBuffer { .. } => ErrorKind::Decode,
            FrameError::Sink { .. } => ErrorKind::Sink,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrcRegion {
    Crc1,
    Crc2,
}

impl Display for CrcRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CrcRegion::Crc1 => write!(f, "crc1"),
            CrcRegion::Crc2 => write!(f, "crc2"),
        }
    }
}

/// Session-terminating failures.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    EngineInit(EngineError),

    #[error("Byte source read failed: {0}")]
    Read(#[source] io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
