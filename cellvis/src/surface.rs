/*!
    The character-cell rendering surface collaborator.

    Surfaces, their lifetime and the pixel-to-glyph blit belong to the host
    application. A [`Visual`](crate::Visual) only talks to them through
    [`RenderHost`].
*/

use thiserror::Error;

use crate::buffer::ChannelOrder;
use crate::geometry::Placement;
use crate::render::Window;

/**
    Handle to a surface owned by the host.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub u64);

impl std::fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("out of memory")]
    OutOfMemory,

    #[error("unknown surface {0}")]
    Unknown(SurfaceId),

    #[error("{0}")]
    Failed(String),
}

/**
    Pixels read back from a surface region, packed RGBA with a row stride
    of `width * 4`.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelRegion {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

/**
    One blit request.

    `data` is the whole visual buffer; only `window` of it is drawn, at
    `placement` cells from the surface origin.
*/
#[derive(Clone, Copy, Debug)]
pub struct Blit<'a> {
    pub placement: Placement,
    pub window: Window,
    pub stride: usize,
    pub data: &'a [u8],
    pub order: ChannelOrder,
}

/**
    Everything a visual needs from the host terminal and its surfaces.

    Dimensions are in cells and given as (rows, cols). All methods take
    `&self`; hosts keep their own interior state.
*/
pub trait RenderHost: Send + Sync {
    /**
        Size of the terminal, as (rows, cols).
    */
    fn term_dims(&self) -> (usize, usize);

    /**
        Whether one cell can show two vertically stacked pixels.
    */
    fn can_half_block(&self) -> bool;

    fn create_surface(
        &self,
        rows: usize,
        cols: usize,
        y: usize,
        x: usize,
    ) -> Result<SurfaceId, SurfaceError>;

    fn duplicate_surface(&self, id: SurfaceId) -> Result<SurfaceId, SurfaceError>;

    fn resize_surface(&self, id: SurfaceId, rows: usize, cols: usize) -> Result<(), SurfaceError>;

    fn destroy_surface(&self, id: SurfaceId);

    fn surface_dims(&self, id: SurfaceId) -> Result<(usize, usize), SurfaceError>;

    /**
        Read back the pixels behind a cell region of a surface.
    */
    fn read_rgba(
        &self,
        id: SurfaceId,
        beg_y: usize,
        beg_x: usize,
        len_y: usize,
        len_x: usize,
    ) -> Result<PixelRegion, SurfaceError>;

    /**
        Draw pixels onto a surface. Returns the number of cells written.
    */
    fn blit_rgba(&self, id: SurfaceId, blit: &Blit<'_>) -> Result<usize, SurfaceError>;
}

/**
    How a visual holds its surface.

    Only an `Owned` surface is destroyed along with the visual.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SurfaceBinding {
    /// Created on the first successful decode.
    Deferred,
    Owned(SurfaceId),
    /// Supplied by the caller; never destroyed here.
    External(SurfaceId),
}

impl SurfaceBinding {
    pub(crate) fn id(self) -> Option<SurfaceId> {
        match self {
            Self::Deferred => None,
            Self::Owned(id) | Self::External(id) => Some(id),
        }
    }

    pub(crate) fn owned(self) -> Option<SurfaceId> {
        match self {
            Self::Owned(id) => Some(id),
            _ => None,
        }
    }
}
