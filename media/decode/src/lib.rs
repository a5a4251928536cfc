/*!
    Video and subtitle decoding for the cellvis streaming backend.

    This crate turns the compressed packets produced by `cellvis-source`
    into raw frames and subtitle rectangles. The video decoder exposes the
    codec's send/receive state machine directly so the caller can decide
    how to handle back-pressure and rejected packets.
*/

mod subtitle;
mod video;

pub use subtitle::SubtitleDecoder;
pub use video::{DecodedFrame, VideoDecoder};

pub use cellvis_types::SendOutcome;
