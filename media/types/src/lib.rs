/*!
    Shared types for the cellvis media crates.

    This crate defines the vocabulary that crosses crate boundaries: pixel
    formats, timestamps, compressed packets, decoded frames, subtitle rects
    and the decode error taxonomy. It has no dependency on FFmpeg, so the
    still-image backend and the aggregate crate can use it without pulling
    in FFmpeg bindings.
*/

mod error;
mod format;
mod frame;
mod packet;
pub mod subtitle;
mod time;

pub use error::{Error, Result};
pub use format::{PixelFormat, PlaneLayout};
pub use frame::VideoFrame;
pub use packet::{Packet, SendOutcome, StreamKind};
pub use subtitle::SubtitleRect;
pub use time::{FrameTiming, Pts, Rational};
