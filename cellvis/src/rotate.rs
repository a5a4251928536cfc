/*!
    Rotation of a visual's pixels about their center.

    The rotated pixels land in a square `pdiam` x `pdiam` buffer, where
    `pdiam` is the longer side of the source. Source pixels whose rotated
    position falls outside that square are clipped.
*/

use crate::buffer::try_alloc;
use crate::error::{Error, Result};
use crate::geometry::VerticalFactor;

/**
    Cell dimensions that make a surface square in pixels.

    Returns `None` when `rows` x `cols` is already square, so rotating
    repeatedly never resizes twice.
*/
pub fn square_cells(rows: usize, cols: usize, factor: VerticalFactor) -> Option<(usize, usize)> {
    let scaled_rows = rows * factor.get();
    if cols == scaled_rows {
        return None;
    }
    let diam = scaled_rows.max(cols);
    Some((diam / factor.get(), diam))
}

/**
    Where one source pixel goes.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mapping {
    pub src_y: usize,
    pub src_x: usize,
    pub dst_y: usize,
    pub dst_x: usize,
}

/**
    Map every pixel of a `width` x `height` image rotated by `radians`
    into the `max(width, height)` square.

    Every yielded destination lies inside the square.
*/
pub fn destinations(width: usize, height: usize, radians: f64) -> impl Iterator<Item = Mapping> {
    let (sin, cos) = radians.sin_cos();
    let pdiam = width.max(height) as i64;
    let half = pdiam / 2;
    let cent_x = (width / 2) as i64;
    let cent_y = (height / 2) as i64;

    (0..height).flat_map(move |src_y| {
        (0..width).filter_map(move |src_x| {
            let conv_y = (src_y as i64 - cent_y) as f64;
            let conv_x = (src_x as i64 - cent_x) as f64;
            // rows come from the sine term, columns from the cosine term
            let targ_y = (conv_x * sin + conv_y * cos) as i64;
            let targ_x = (conv_x * cos + conv_y * sin) as i64;
            let dst_y = targ_y + half;
            let dst_x = targ_x + half;
            if (0..pdiam).contains(&dst_y) && (0..pdiam).contains(&dst_x) {
                Some(Mapping {
                    src_y,
                    src_x,
                    dst_y: dst_y as usize,
                    dst_x: dst_x as usize,
                })
            } else {
                None
            }
        })
    })
}

/**
    Rotate RGBA pixels into a fresh square buffer.

    Returns the new buffer and its side length; its stride is
    `side * 4`. Pixels nothing maps to stay zero.
*/
pub fn rotate_pixels(
    src: &[u8],
    stride: usize,
    width: usize,
    height: usize,
    radians: f64,
) -> Result<(Vec<u8>, usize)> {
    if width == 0 || height == 0 {
        return Err(Error::NoPixels);
    }
    if stride < width * 4 || src.len() < stride * (height - 1) + width * 4 {
        return Err(Error::region(format!(
            "{} bytes with stride {} cannot hold {}x{} pixels",
            src.len(),
            stride,
            width,
            height
        )));
    }

    let pdiam = width.max(height);
    let mut data = try_alloc(pdiam * pdiam * 4)?;

    for m in destinations(width, height, radians) {
        let from = m.src_y * stride + m.src_x * 4;
        let to = (m.dst_y * pdiam + m.dst_x) * 4;
        data[to..to + 4].copy_from_slice(&src[from..from + 4]);
    }

    Ok((data, pdiam))
}
