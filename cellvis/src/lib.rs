/*!
    Images and video on character-cell surfaces.

    A [`Visual`] holds decoded pixels and the surface they are drawn onto.
    Visuals come from raw RGBA or BGRA memory, from a region of an existing
    surface, or from a media file decoded by a [`backend::DecodeBackend`].
    They can be rendered in whole or in part, rotated, and streamed with
    frame pacing.

    The terminal itself is behind the [`RenderHost`] trait: this crate never
    writes escape sequences. It computes pixels and asks the host to create,
    resize and blit surfaces.

    # Features

    - `image` (default): still images and animated GIF via the `image` crate.
    - `ffmpeg`: video files and subtitles via FFmpeg. Takes precedence over
      `image` when both are enabled.

    With neither, constructors from memory and surfaces still work, and
    media operations fail with [`Error::Unimplemented`].
*/

pub mod backend;
pub mod buffer;
mod error;
pub mod geometry;
pub mod render;
pub mod rotate;
mod stream;
mod surface;
mod visual;

#[cfg(test)]
mod test_utils;

pub use buffer::{ChannelOrder, PixelBuffer};
pub use error::{Error, Result};
pub use geometry::{Geometry, Placement, Style, VerticalFactor};
pub use render::{TO_EDGE, Window};
pub use stream::StreamOutcome;
pub use surface::{Blit, PixelRegion, RenderHost, SurfaceError, SurfaceId};
pub use visual::Visual;

pub use cellvis_types::{FrameTiming, Pts, Rational};

/**
    Prepare the media backends.

    Calling this is optional; backends initialize themselves on first use.
    With the `ffmpeg` feature it also sets FFmpeg's own log verbosity to
    match `level`.
*/
pub fn init(level: log::LevelFilter) -> Result<()> {
    #[cfg(feature = "ffmpeg")]
    {
        use ffmpeg_next::util::log::{self as av_log, Level};

        ffmpeg_next::init()
            .map_err(cellvis_source::error_from_ffmpeg)
            .map_err(Error::from)?;
        av_log::set_level(match level {
            log::LevelFilter::Off => Level::Quiet,
            log::LevelFilter::Error => Level::Error,
            log::LevelFilter::Warn => Level::Warning,
            log::LevelFilter::Info => Level::Info,
            log::LevelFilter::Debug => Level::Debug,
            log::LevelFilter::Trace => Level::Trace,
        });
    }

    log::debug!(
        "cellvis ready (images: {}, videos: {}, log level: {})",
        can_open_images(),
        can_open_videos(),
        level
    );
    Ok(())
}

/**
    Whether this build can decode image files.
*/
pub fn can_open_images() -> bool {
    backend::AVAILABLE
}

/**
    Whether this build can decode video files.
*/
pub fn can_open_videos() -> bool {
    cfg!(feature = "ffmpeg")
}
