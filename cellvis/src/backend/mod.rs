/*!
    Decode backends.

    A backend turns a media file into a sequence of RGBA frames. Which
    backend [`open`] uses is fixed when the crate is built: the `ffmpeg`
    feature selects [`StreamingMediaBackend`], otherwise the `image`
    feature selects [`StillImageBackend`]. Any other implementation can be
    handed to [`Visual::with_backend`](crate::Visual::with_backend).
*/

#[cfg(any(feature = "ffmpeg", test))]
mod pump;
#[cfg(feature = "image")]
mod still;
#[cfg(feature = "ffmpeg")]
mod streaming;

use std::path::Path;

use cellvis_types::FrameTiming;

use crate::error::{Error, Result};

#[cfg(feature = "image")]
pub use still::{StillImageBackend, StillImageConfig};
#[cfg(feature = "ffmpeg")]
pub use streaming::{StreamingConfig, StreamingMediaBackend};

/**
    Native size and timing of a freshly decoded frame.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameInfo {
    pub width: usize,
    pub height: usize,
    pub timing: FrameTiming,
}

/**
    One media source, decoded frame by frame.
*/
pub trait DecodeBackend {
    /**
        Decode the next frame. Returns [`Error::EndOfStream`] once the
        source is exhausted.
    */
    fn decode_next(&mut self) -> Result<FrameInfo>;

    /**
        Size of the source in pixels, as (width, height).
    */
    fn native_dimensions(&self) -> (usize, usize);

    /**
        Scale the last decoded frame to `width` x `height` RGBA pixels.
        Returns the row stride of the result.
    */
    fn scale(&mut self, width: usize, height: usize) -> Result<usize>;

    /**
        Pixels of the last scaled frame.

        `None` from the moment [`decode_next`](Self::decode_next) moves to a
        new frame until [`scale`](Self::scale) succeeds on it, so pixels of
        one frame are never read with the stride of another.
    */
    fn pixels(&self) -> Option<&[u8]>;

    /**
        Text of the current subtitle, if the source has one.
    */
    fn subtitle(&self) -> Option<String> {
        None
    }
}

/**
    True when this build has a backend at all.
*/
pub(crate) const AVAILABLE: bool = cfg!(any(feature = "ffmpeg", feature = "image"));

/**
    Open `path` with the backend this build was configured with.
*/
pub fn open(path: &Path) -> Result<Box<dyn DecodeBackend>> {
    #[cfg(feature = "ffmpeg")]
    {
        let backend = StreamingMediaBackend::open(path, StreamingConfig::default())?;
        Ok(Box::new(backend))
    }

    #[cfg(all(feature = "image", not(feature = "ffmpeg")))]
    {
        let backend = StillImageBackend::open(path, StillImageConfig::default())?;
        Ok(Box::new(backend))
    }

    #[cfg(not(any(feature = "ffmpeg", feature = "image")))]
    {
        let _ = path;
        Err(Error::Unimplemented("media decoding"))
    }
}

/**
    Reject scale targets with no area.
*/
pub(crate) fn check_target(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Error::Decode(format!(
            "cannot scale to {}x{}",
            width, height
        )));
    }
    Ok(())
}
