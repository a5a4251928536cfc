/*!
    Pixel storage behind a visual.
*/

use crate::backend::DecodeBackend;
use crate::error::{Error, Result};

/**
    Byte order of the pixels in a buffer.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelOrder {
    #[default]
    Rgba,
    Bgra,
}

/**
    The pixels of a visual.

    A buffer either owns its bytes or is a view over the last frame the
    decode backend produced. Replacing the buffer drops whatever was owned
    before.
*/
#[derive(Clone, Debug, Default)]
pub enum PixelBuffer {
    #[default]
    Empty,
    Owned { data: Vec<u8>, stride: usize },
    /// Pixels live in the backend; read them through
    /// [`DecodeBackend::pixels`].
    Decoded { stride: usize },
}

impl PixelBuffer {
    /**
        Row stride in bytes. Zero for an empty buffer.
    */
    pub fn stride(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Owned { stride, .. } | Self::Decoded { stride } => *stride,
        }
    }

    /**
        Resolve the buffer to its bytes.
    */
    pub fn bytes<'a>(&'a self, backend: Option<&'a dyn DecodeBackend>) -> Option<&'a [u8]> {
        match self {
            Self::Empty => None,
            Self::Owned { data, .. } => Some(data),
            Self::Decoded { .. } => backend?.pixels(),
        }
    }
}

pub(crate) fn check_stride(stride: usize) -> Result<()> {
    if stride % 4 != 0 {
        return Err(Error::InvalidStride(stride));
    }
    Ok(())
}

/**
    Allocate a zeroed buffer, reporting allocation failure instead of
    aborting.
*/
pub(crate) fn try_alloc(len: usize) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len).map_err(|_| Error::OutOfMemory)?;
    data.resize(len, 0);
    Ok(data)
}

/**
    Copy `src` into a new buffer, reporting allocation failure.
*/
pub(crate) fn try_copy(src: &[u8]) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    data.try_reserve_exact(src.len()).map_err(|_| Error::OutOfMemory)?;
    data.extend_from_slice(src);
    Ok(data)
}

/**
    Swap the red and blue channels of the first `cols` pixels of every row,
    in place. Applying it twice restores the input.
*/
pub fn bgra_to_rgba(data: &mut [u8], stride: usize, cols: usize) -> Result<()> {
    check_stride(stride)?;
    if cols * 4 > stride {
        return Err(Error::region(format!(
            "{} pixels do not fit a {} byte row",
            cols, stride
        )));
    }
    if stride == 0 {
        return Ok(());
    }
    for row in data.chunks_mut(stride) {
        for pixel in row.chunks_exact_mut(4).take(cols) {
            pixel.swap(0, 2);
        }
    }
    Ok(())
}
