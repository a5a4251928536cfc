/*!
    Pixel format types.
*/

/**
    Pixel formats of frames cellvis stores.

    Scaler output uses one of the packed 32-bit formats. Decoded frames are
    never narrowed to this list; they keep the codec's own format until the
    scaler has converted them.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, 12bpp (most common video format)
    Yuv420p,
    /// Planar YUV 4:2:2, 16bpp
    Yuv422p,
    /// Planar YUV 4:4:4, 24bpp
    Yuv444p,
    /// Semi-planar YUV 4:2:0, 12bpp (common hardware decoder output)
    Nv12,
    /// Single 8-bit luma plane
    Gray8,
    /// Packed RGB, 24bpp
    Rgb24,
    /// Packed BGR, 24bpp
    Bgr24,
    /// Packed RGBA, 32bpp (what the renderer consumes)
    Rgba,
    /// Packed BGRA, 32bpp
    Bgra,
}

/**
    Geometry of one plane of a frame stored contiguously without padding.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaneLayout {
    /// Meaningful bytes per row.
    pub row_bytes: usize,
    /// Number of rows.
    pub rows: usize,
}

impl PlaneLayout {
    pub const fn len(&self) -> usize {
        self.row_bytes * self.rows
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PixelFormat {
    /**
        Returns the number of bits per pixel for this format.

        For planar formats, this is the average bits per pixel.
    */
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            Self::Gray8 => 8,
            Self::Yuv420p | Self::Nv12 => 12,
            Self::Yuv422p => 16,
            Self::Rgb24 | Self::Bgr24 | Self::Yuv444p => 24,
            Self::Bgra | Self::Rgba => 32,
        }
    }

    /**
        Returns true if this is a planar (or semi-planar) format.
    */
    pub const fn is_planar(self) -> bool {
        matches!(
            self,
            Self::Yuv420p | Self::Yuv422p | Self::Yuv444p | Self::Nv12
        )
    }

    /**
        Returns the plane layout of a `width` x `height` frame.

        Chroma dimensions round up, matching how FFmpeg sizes subsampled
        planes for odd frame sizes.
    */
    pub fn planes(self, width: u32, height: u32) -> Vec<PlaneLayout> {
        let w = width as usize;
        let h = height as usize;
        let cw = w.div_ceil(2);
        let ch = h.div_ceil(2);
        let plane = |row_bytes, rows| PlaneLayout { row_bytes, rows };

        match self {
            Self::Yuv420p => vec![plane(w, h), plane(cw, ch), plane(cw, ch)],
            Self::Yuv422p => vec![plane(w, h), plane(cw, h), plane(cw, h)],
            Self::Yuv444p => vec![plane(w, h), plane(w, h), plane(w, h)],
            Self::Nv12 => vec![plane(w, h), plane(cw * 2, ch)],
            Self::Gray8 => vec![plane(w, h)],
            Self::Rgb24 | Self::Bgr24 => vec![plane(w * 3, h)],
            Self::Rgba | Self::Bgra => vec![plane(w * 4, h)],
        }
    }

    /**
        Total bytes of a tightly packed `width` x `height` frame.
    */
    pub fn frame_size(self, width: u32, height: u32) -> usize {
        self.planes(width, height).iter().map(PlaneLayout::len).sum()
    }
}
