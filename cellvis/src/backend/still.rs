/*!
    Still image backend over the `image` crate.
*/

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::codecs::gif::GifDecoder;
use image::imageops::{self, FilterType};
use image::{AnimationDecoder, ImageDecoder, ImageError, ImageFormat, ImageReader, RgbaImage};

use cellvis_types::{FrameTiming, Rational};

use super::{DecodeBackend, FrameInfo, check_target};
use crate::error::{Error, Result};

/**
    Configuration for the still image backend.
*/
#[derive(Clone, Copy, Debug)]
pub struct StillImageConfig {
    pub filter: FilterType,
}

impl Default for StillImageConfig {
    fn default() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }
}

enum Frames {
    /// GIF frames, composited to the full canvas.
    Animated(image::Frames<'static>),
    /// Any other format: exactly one frame.
    Single { path: PathBuf, done: bool },
}

/**
    Decodes image files.

    Each decode advances to the next frame of an animated GIF. Every other
    format has a single frame. Images must have three or four channels;
    three-channel images get an opaque alpha channel.
*/
pub struct StillImageBackend {
    frames: Frames,
    native: (usize, usize),
    config: StillImageConfig,
    frame: Option<RgbaImage>,
    scaled: Option<RgbaImage>,
    /// Whether the last frame has been through `scale`.
    ready: bool,
}

impl StillImageBackend {
    pub fn open(path: &Path, config: StillImageConfig) -> Result<Self> {
        let reader = ImageReader::open(path)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(cellvis_types::Error::from)?;

        let (frames, (width, height)) = if reader.format() == Some(ImageFormat::Gif) {
            let file = File::open(path).map_err(cellvis_types::Error::from)?;
            let decoder = GifDecoder::new(BufReader::new(file)).map_err(error_from_image)?;
            let dims = decoder.dimensions();
            (Frames::Animated(decoder.into_frames()), dims)
        } else {
            let dims = reader.into_dimensions().map_err(error_from_image)?;
            let single = Frames::Single {
                path: path.to_path_buf(),
                done: false,
            };
            (single, dims)
        };

        log::debug!("opened {} ({}x{})", path.display(), width, height);
        Ok(Self {
            frames,
            native: (width as usize, height as usize),
            config,
            frame: None,
            scaled: None,
            ready: false,
        })
    }

    fn next_image(&mut self) -> Result<(RgbaImage, FrameTiming)> {
        match &mut self.frames {
            Frames::Animated(frames) => {
                let frame = frames
                    .next()
                    .ok_or(Error::EndOfStream)?
                    .map_err(error_from_image)?;
                let (numer, denom) = frame.delay().numer_denom_ms();
                let delay_ms = if denom == 0 { 0 } else { numer / denom };
                let timing = FrameTiming::new(None, i64::from(delay_ms), Rational::new(1, 1000));
                Ok((frame.into_buffer(), timing))
            }
            Frames::Single { path, done } => {
                if *done {
                    return Err(Error::EndOfStream);
                }
                *done = true;

                let decoded = ImageReader::open(&*path)
                    .and_then(|reader| reader.with_guessed_format())
                    .map_err(cellvis_types::Error::from)?
                    .decode()
                    .map_err(error_from_image)?;

                let channels = decoded.color().channel_count();
                if !(3..=4).contains(&channels) {
                    return Err(cellvis_types::Error::unsupported(format!(
                        "{} channel image",
                        channels
                    ))
                    .into());
                }
                Ok((decoded.to_rgba8(), FrameTiming::default()))
            }
        }
    }
}

impl DecodeBackend for StillImageBackend {
    fn decode_next(&mut self) -> Result<FrameInfo> {
        let (image, timing) = self.next_image()?;
        let info = FrameInfo {
            width: image.width() as usize,
            height: image.height() as usize,
            timing,
        };
        self.frame = Some(image);
        self.scaled = None;
        self.ready = false;
        Ok(info)
    }

    fn native_dimensions(&self) -> (usize, usize) {
        self.native
    }

    fn scale(&mut self, width: usize, height: usize) -> Result<usize> {
        check_target(width, height)?;
        let frame = self.frame.as_ref().ok_or(Error::NoPixels)?;
        let (width, height) = match (u32::try_from(width), u32::try_from(height)) {
            (Ok(width), Ok(height)) => (width, height),
            _ => return Err(Error::Decode(format!("cannot scale to {}x{}", width, height))),
        };

        self.scaled = if frame.dimensions() == (width, height) {
            None
        } else {
            Some(imageops::resize(frame, width, height, self.config.filter))
        };
        self.ready = true;
        Ok(width as usize * 4)
    }

    fn pixels(&self) -> Option<&[u8]> {
        if !self.ready {
            return None;
        }
        self.scaled
            .as_ref()
            .or(self.frame.as_ref())
            .map(|image| image.as_raw().as_slice())
    }
}

impl std::fmt::Debug for StillImageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StillImageBackend")
            .field("native", &self.native)
            .field("animated", &matches!(self.frames, Frames::Animated(_)))
            .finish_non_exhaustive()
    }
}

fn error_from_image(err: ImageError) -> cellvis_types::Error {
    match err {
        ImageError::Unsupported(e) => cellvis_types::Error::unsupported(e.to_string()),
        ImageError::Limits(_) => cellvis_types::Error::OutOfMemory,
        ImageError::IoError(e) => cellvis_types::Error::Io(e),
        other => cellvis_types::Error::corrupt(other.to_string()),
    }
}
