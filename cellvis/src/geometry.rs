/*!
    Pixel-space and cell-space geometry.

    A cell is one column wide in pixels and either one or two pixels tall,
    depending on whether the host can draw half blocks.
*/

use crate::error::{Error, Result};

/**
    How target pixel dimensions are derived.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Style {
    /// Native resolution, one pixel per column.
    #[default]
    None,
    /// Fill the terminal area from the placement to the bottom right.
    Scale,
    /// Same area as `Scale`.
    Stretch,
}

/**
    Offset of a visual on its surface, in cells.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Placement {
    pub y: usize,
    pub x: usize,
}

impl Placement {
    pub const fn new(y: usize, x: usize) -> Self {
        Self { y, x }
    }
}

/**
    Pixel rows per cell.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum VerticalFactor {
    #[default]
    Single = 1,
    Double = 2,
}

impl VerticalFactor {
    pub fn from_half_block(half_block: bool) -> Self {
        if half_block { Self::Double } else { Self::Single }
    }

    pub const fn get(self) -> usize {
        self as usize
    }
}

/**
    Resolved dimensions of a visual: `width` x `height` pixels drawn into
    `rows` x `cols` cells.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub width: usize,
    pub height: usize,
    pub rows: usize,
    pub cols: usize,
}

impl Geometry {
    /**
        Geometry that exactly fills `rows` x `cols` cells.
    */
    pub fn from_cells(rows: usize, cols: usize, factor: VerticalFactor) -> Self {
        Self {
            width: cols,
            height: rows * factor.get(),
            rows,
            cols,
        }
    }

    /**
        Geometry of a `width` x `height` image at native resolution.
    */
    pub fn from_pixels(width: usize, height: usize, factor: VerticalFactor) -> Self {
        Self {
            width,
            height,
            rows: height.div_ceil(factor.get()),
            cols: width,
        }
    }

    /**
        Whether a surface of `rows` x `cols` cells still fits this geometry.
    */
    pub fn matches_cells(&self, rows: usize, cols: usize) -> bool {
        self.rows == rows && self.cols == cols
    }
}

/**
    Compute the geometry of a visual that has no surface yet.

    With [`Style::None`] the media is shown at its native size. Otherwise
    it fills the terminal from `placement` to the bottom right corner, and
    a placement at or beyond the terminal edge is an error.
*/
pub fn resolve(
    style: Style,
    placement: Placement,
    term: (usize, usize),
    factor: VerticalFactor,
    native: (usize, usize),
) -> Result<Geometry> {
    let (native_width, native_height) = native;
    if native_width == 0 || native_height == 0 {
        return Err(Error::Decode(format!(
            "media has no area ({}x{})",
            native_width, native_height
        )));
    }

    match style {
        Style::None => Ok(Geometry::from_pixels(native_width, native_height, factor)),
        Style::Scale | Style::Stretch => {
            let (term_rows, term_cols) = term;
            if placement.y >= term_rows || placement.x >= term_cols {
                return Err(Error::Decode(format!(
                    "placement {},{} is outside the {}x{} terminal",
                    placement.y, placement.x, term_rows, term_cols
                )));
            }
            Ok(Geometry::from_cells(
                term_rows - placement.y,
                term_cols - placement.x,
                factor,
            ))
        }
    }
}
