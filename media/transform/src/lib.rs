/*!
    Frame scaling and pixel format conversion for the cellvis streaming
    backend.

    Decoded frames arrive in whatever format the codec produced; the
    renderer only consumes packed 32-bit RGBA at the size the geometry
    resolver asked for. This crate bridges the two.
*/

mod video;

pub use video::{ScalingAlgorithm, VideoTransform, VideoTransformConfig};
