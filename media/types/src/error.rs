/*!
    Decode error taxonomy.
*/

use thiserror::Error;

/**
    Errors produced while opening, demuxing, decoding or scaling media.

    Backend-native error codes are mapped into these variants at the
    backend boundary. `EndOfStream` is the only expected terminal condition.
*/
#[derive(Debug, Error)]
pub enum Error {
    #[error("end of stream")]
    EndOfStream,

    #[error("corrupt media: {0}")]
    Corrupt(String),

    #[error("unsupported media: {0}")]
    Unsupported(String),

    #[error("out of memory")]
    OutOfMemory,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /**
        Create a `Corrupt` error from any displayable message.
    */
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }

    /**
        Create an `Unsupported` error from any displayable message.
    */
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
