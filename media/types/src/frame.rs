/*!
    Decoded video frames.
*/

use crate::{Error, FrameTiming, PixelFormat, Result};

/**
    A decoded video frame with its planes stored contiguously.

    Planes follow [`PixelFormat::planes`] back to back, with no row padding.
    For packed formats `stride()` is the byte width of a row.
*/
#[derive(Clone, Debug)]
pub struct VideoFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub timing: FrameTiming,
}

impl VideoFrame {
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        timing: FrameTiming,
    ) -> Self {
        Self {
            data,
            width,
            height,
            format,
            timing,
        }
    }

    /**
        Checked constructor: rejects empty frames and buffers that are
        too short for the declared geometry.
    */
    pub fn try_new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: PixelFormat,
        timing: FrameTiming,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::corrupt("frame has zero dimensions"));
        }
        let needed = format.frame_size(width, height);
        if data.len() < needed {
            return Err(Error::corrupt(format!(
                "frame buffer holds {} bytes, {}x{} {:?} needs {}",
                data.len(),
                width,
                height,
                format,
                needed
            )));
        }
        Ok(Self::new(data, width, height, format, timing))
    }

    /**
        Bytes per row of the first plane.
    */
    pub fn stride(&self) -> usize {
        self.format
            .planes(self.width, self.height)
            .first()
            .map_or(0, |plane| plane.row_bytes)
    }
}
