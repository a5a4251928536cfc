/*!
    Sub-window validation for blits.
*/

use crate::error::{Error, Result};

/**
    Length value meaning "everything from the origin to the edge".
*/
pub const TO_EDGE: isize = -1;

/**
    A validated pixel window of a visual's buffer.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Window {
    pub beg_y: usize,
    pub beg_x: usize,
    pub len_y: usize,
    pub len_x: usize,
}

/**
    Validate a requested window against a `height` x `width` buffer.

    A length of [`TO_EDGE`] extends to the buffer edge. Returns `Ok(None)`
    for a window with no area, which callers treat as nothing to draw.
*/
pub fn window(
    height: usize,
    width: usize,
    beg_y: isize,
    beg_x: isize,
    len_y: isize,
    len_x: isize,
) -> Result<Option<Window>> {
    if beg_y < 0 || beg_x < 0 {
        return Err(Error::region(format!("negative origin {},{}", beg_y, beg_x)));
    }
    if len_y < TO_EDGE || len_x < TO_EDGE {
        return Err(Error::region(format!("invalid length {}x{}", len_y, len_x)));
    }
    let (beg_y, beg_x) = (beg_y as usize, beg_x as usize);
    if beg_y >= height || beg_x >= width {
        return Err(Error::region(format!(
            "origin {},{} is outside {}x{}",
            beg_y, beg_x, height, width
        )));
    }

    let len_y = if len_y == TO_EDGE { height - beg_y } else { len_y as usize };
    let len_x = if len_x == TO_EDGE { width - beg_x } else { len_x as usize };
    if len_y == 0 || len_x == 0 {
        return Ok(None);
    }
    if beg_y + len_y > height || beg_x + len_x > width {
        return Err(Error::region(format!(
            "{}x{} at {},{} exceeds {}x{}",
            len_y, len_x, beg_y, beg_x, height, width
        )));
    }

    Ok(Some(Window {
        beg_y,
        beg_x,
        len_y,
        len_x,
    }))
}
