/*!
    Demuxing of streaming media sources for cellvis.

    This crate handles the input side of the streaming backend. It opens a
    container, selects a primary video stream and an optional subtitle
    stream, and produces compressed packets that `cellvis-decode` turns
    into frames.
*/

mod codec_config;
mod convert;
mod source;

pub use codec_config::CodecConfig;
pub use convert::{copy_planes_from_ffmpeg, error_from_ffmpeg, pixel_format_to_ffmpeg};
pub use source::{Source, SourceConfig};
