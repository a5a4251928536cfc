/*!
    Conversion utilities between ffmpeg-next types and cellvis-types.
*/

use ffmpeg_next::{format::Pixel, util::frame::video::Video as VideoFrameFFmpeg};

use cellvis_types::{Error, PixelFormat, Pts, Rational};

/**
    Map an FFmpeg error into the decode error taxonomy.

    Anything without a more specific meaning is treated as corrupt input.
*/
pub fn error_from_ffmpeg(err: ffmpeg_next::Error) -> Error {
    use ffmpeg_next::Error as E;

    match err {
        E::Eof => Error::EndOfStream,
        E::Other { errno } if errno == ffmpeg_next::error::ENOMEM => Error::OutOfMemory,
        E::DecoderNotFound
        | E::DemuxerNotFound
        | E::StreamNotFound
        | E::ProtocolNotFound
        | E::PatchWelcome => Error::unsupported(err.to_string()),
        other => Error::corrupt(other.to_string()),
    }
}

pub(crate) fn rational_from_ffmpeg(r: ffmpeg_next::Rational) -> Rational {
    Rational::new(r.numerator(), r.denominator())
}

pub(crate) fn pts_from_ffmpeg(pts: Option<i64>) -> Option<Pts> {
    pts.map(Pts)
}

/**
    Convert our pixel format to FFmpeg's.
*/
pub fn pixel_format_to_ffmpeg(format: PixelFormat) -> Result<Pixel, Error> {
    match format {
        PixelFormat::Yuv420p => Ok(Pixel::YUV420P),
        PixelFormat::Yuv422p => Ok(Pixel::YUV422P),
        PixelFormat::Yuv444p => Ok(Pixel::YUV444P),
        PixelFormat::Nv12 => Ok(Pixel::NV12),
        PixelFormat::Gray8 => Ok(Pixel::GRAY8),
        PixelFormat::Rgb24 => Ok(Pixel::RGB24),
        PixelFormat::Bgr24 => Ok(Pixel::BGR24),
        PixelFormat::Rgba => Ok(Pixel::RGBA),
        PixelFormat::Bgra => Ok(Pixel::BGRA),
        _ => Err(Error::unsupported(format!(
            "pixel format {:?} has no FFmpeg equivalent",
            format
        ))),
    }
}

/**
    Copy the planes of an FFmpeg frame into one contiguous buffer.

    Row padding is dropped; the result follows [`PixelFormat::planes`].
*/
pub fn copy_planes_from_ffmpeg(
    frame: &VideoFrameFFmpeg,
    format: PixelFormat,
) -> Result<Vec<u8>, Error> {
    let planes = format.planes(frame.width(), frame.height());
    let mut output = Vec::with_capacity(planes.iter().map(|p| p.len()).sum());

    for (index, layout) in planes.iter().enumerate() {
        let stride = frame.stride(index);
        let data = frame.data(index);
        for row in 0..layout.rows {
            let start = row * stride;
            let bytes = data
                .get(start..start + layout.row_bytes)
                .ok_or_else(|| Error::corrupt(format!("plane {} is truncated", index)))?;
            output.extend_from_slice(bytes);
        }
    }

    Ok(output)
}
