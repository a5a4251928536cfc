use thiserror::Error;

use crate::surface::SurfaceError;

/**
    Errors returned by visual operations.

    `EndOfStream` is the only expected terminal condition; it is what makes
    [`Visual::stream`](crate::Visual::stream) finish successfully.
*/
#[derive(Debug, Error)]
pub enum Error {
    #[error("end of stream")]
    EndOfStream,

    #[error("decode error: {0}")]
    Decode(String),

    #[error("out of memory")]
    OutOfMemory,

    #[error("{0} is not available in this build")]
    Unimplemented(&'static str),

    #[error("row stride {0} is not a multiple of 4")]
    InvalidStride(usize),

    #[error("invalid region: {0}")]
    InvalidRegion(String),

    #[error("visual has no pixels")]
    NoPixels,

    #[error("visual has no surface")]
    NoSurface,

    #[error("surface error: {0}")]
    Surface(SurfaceError),
}

impl Error {
    pub(crate) fn region(msg: impl Into<String>) -> Self {
        Self::InvalidRegion(msg.into())
    }
}

impl From<cellvis_types::Error> for Error {
    fn from(err: cellvis_types::Error) -> Self {
        match err {
            cellvis_types::Error::EndOfStream => Self::EndOfStream,
            cellvis_types::Error::OutOfMemory => Self::OutOfMemory,
            other => Self::Decode(other.to_string()),
        }
    }
}

impl From<SurfaceError> for Error {
    fn from(err: SurfaceError) -> Self {
        match err {
            SurfaceError::OutOfMemory => Self::OutOfMemory,
            other => Self::Surface(other),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
