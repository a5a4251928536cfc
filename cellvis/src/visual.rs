/*!
    The visual: decode state, pixels and a surface binding in one object.
*/

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cellvis_types::FrameTiming;

use crate::backend::{self, DecodeBackend};
use crate::buffer::{self, ChannelOrder, PixelBuffer};
use crate::error::{Error, Result};
use crate::geometry::{self, Geometry, Placement, Style, VerticalFactor};
use crate::render;
use crate::rotate;
use crate::stream::{self, StreamOutcome};
use crate::surface::{Blit, RenderHost, SurfaceBinding, SurfaceId};

/**
    An image or video bound to a character-cell surface.

    A visual owns its pixels and, unless the surface was handed in by the
    caller, its surface: dropping the visual destroys an owned surface and
    leaves an external one alone.

    # Example

    ```ignore
    let mut visual = Visual::open(host, "clip.mkv", Placement::default(), Style::Scale)?;
    visual.stream(1.0, |_| ControlFlow::Continue(()))?;
    ```
*/
pub struct Visual {
    host: Arc<dyn RenderHost>,
    backend: Option<Box<dyn DecodeBackend>>,
    path: Option<PathBuf>,
    buffer: PixelBuffer,
    order: ChannelOrder,
    geometry: Option<Geometry>,
    placement: Placement,
    style: Style,
    factor: VerticalFactor,
    frame_index: u64,
    timing: FrameTiming,
    surface: SurfaceBinding,
}

impl Visual {
    fn new(host: Arc<dyn RenderHost>, placement: Placement, style: Style) -> Self {
        let factor = VerticalFactor::from_half_block(host.can_half_block());
        Self {
            host,
            backend: None,
            path: None,
            buffer: PixelBuffer::Empty,
            order: ChannelOrder::Rgba,
            geometry: None,
            placement,
            style,
            factor,
            frame_index: 0,
            timing: FrameTiming::default(),
            surface: SurfaceBinding::Deferred,
        }
    }

    /**
        Copy `rows` rows of RGBA pixels into a new visual with its own
        surface at the terminal origin.
    */
    pub fn from_rgba(
        host: Arc<dyn RenderHost>,
        data: &[u8],
        rows: usize,
        stride: usize,
        cols: usize,
    ) -> Result<Self> {
        Self::from_raw(host, data, rows, stride, cols, ChannelOrder::Rgba)
    }

    /**
        Like [`from_rgba`](Self::from_rgba), for BGRA pixels. The bytes are
        kept as they are; see
        [`normalize_channel_order`](Self::normalize_channel_order).
    */
    pub fn from_bgra(
        host: Arc<dyn RenderHost>,
        data: &[u8],
        rows: usize,
        stride: usize,
        cols: usize,
    ) -> Result<Self> {
        Self::from_raw(host, data, rows, stride, cols, ChannelOrder::Bgra)
    }

    fn from_raw(
        host: Arc<dyn RenderHost>,
        data: &[u8],
        rows: usize,
        stride: usize,
        cols: usize,
        order: ChannelOrder,
    ) -> Result<Self> {
        buffer::check_stride(stride)?;
        if rows == 0 || cols == 0 {
            return Err(Error::region(format!("empty {}x{} image", rows, cols)));
        }
        let len = match (cols.checked_mul(4), rows.checked_mul(stride)) {
            (Some(row_bytes), Some(len)) if row_bytes <= stride && len <= data.len() => len,
            _ => {
                return Err(Error::region(format!(
                    "{} bytes with stride {} cannot hold {}x{} pixels",
                    data.len(),
                    stride,
                    rows,
                    cols
                )));
            }
        };

        let mut visual = Self::new(host, Placement::default(), Style::None);
        let pixels = buffer::try_copy(&data[..len])?;
        let geometry = Geometry::from_pixels(cols, rows, visual.factor);
        let id = visual.host.create_surface(geometry.rows, geometry.cols, 0, 0)?;

        visual.surface = SurfaceBinding::Owned(id);
        visual.buffer = PixelBuffer::Owned {
            data: pixels,
            stride,
        };
        visual.order = order;
        visual.geometry = Some(geometry);
        Ok(visual)
    }

    /**
        Read back a cell region of an existing surface.

        Lengths of [`TO_EDGE`](render::TO_EDGE) extend to the surface edge. The visual draws
        onto its own duplicate of the surface.
    */
    pub fn from_surface(
        host: Arc<dyn RenderHost>,
        id: SurfaceId,
        beg_y: isize,
        beg_x: isize,
        len_y: isize,
        len_x: isize,
    ) -> Result<Self> {
        let (rows, cols) = host.surface_dims(id)?;
        let region = render::window(rows, cols, beg_y, beg_x, len_y, len_x)?
            .ok_or_else(|| Error::region("empty surface region"))?;

        let pixels = host.read_rgba(id, region.beg_y, region.beg_x, region.len_y, region.len_x)?;
        if pixels.width == 0
            || pixels.height == 0
            || pixels.data.len() < pixels.width * pixels.height * 4
        {
            return Err(Error::NoPixels);
        }

        let mut visual = Self::new(host, Placement::default(), Style::None);
        let dup = visual.host.duplicate_surface(id)?;
        visual.surface = SurfaceBinding::Owned(dup);
        visual.geometry = Some(Geometry {
            width: pixels.width,
            height: pixels.height,
            rows: region.len_y,
            cols: region.len_x,
        });
        visual.buffer = PixelBuffer::Owned {
            stride: pixels.width * 4,
            data: pixels.data,
        };
        Ok(visual)
    }

    /**
        Open a media file. Nothing is decoded and no surface is created
        until the first [`decode`](Self::decode).
    */
    pub fn open<P: AsRef<Path>>(
        host: Arc<dyn RenderHost>,
        path: P,
        placement: Placement,
        style: Style,
    ) -> Result<Self> {
        let backend = backend::open(path.as_ref())?;
        let mut visual = Self::with_backend(host, backend, placement, style);
        visual.path = Some(path.as_ref().to_path_buf());
        Ok(visual)
    }

    /**
        Open a media file and stretch it over an existing surface, which
        stays owned by the caller.
    */
    pub fn open_on_surface<P: AsRef<Path>>(
        host: Arc<dyn RenderHost>,
        id: SurfaceId,
        path: P,
    ) -> Result<Self> {
        let mut visual = Self::open(host, path, Placement::default(), Style::Stretch)?;
        visual.surface = SurfaceBinding::External(id);
        Ok(visual)
    }

    /**
        Drive a caller-supplied decode backend.
    */
    pub fn with_backend(
        host: Arc<dyn RenderHost>,
        backend: Box<dyn DecodeBackend>,
        placement: Placement,
        style: Style,
    ) -> Self {
        let mut visual = Self::new(host, placement, style);
        visual.backend = Some(backend);
        visual
    }

    /**
        Decode the next frame and scale it to the visual's geometry.

        The first frame creates the surface if the visual has none. Later
        frames pick up any change in the surface size, which is how a
        terminal resize is absorbed. If decoding or scaling fails, the
        visual keeps the pixels it had.
    */
    pub fn decode(&mut self) -> Result<()> {
        let Some(backend) = self.backend.as_mut() else {
            return Err(no_backend("decoding"));
        };
        let frame = backend.decode_next()?;

        let (geometry, created) = match self.surface {
            SurfaceBinding::Deferred => {
                let geometry = geometry::resolve(
                    self.style,
                    self.placement,
                    self.host.term_dims(),
                    self.factor,
                    (frame.width, frame.height),
                )?;
                let id = self.host.create_surface(
                    geometry.rows,
                    geometry.cols,
                    self.placement.y,
                    self.placement.x,
                )?;
                (geometry, Some(id))
            }
            SurfaceBinding::Owned(id) | SurfaceBinding::External(id) => {
                let (rows, cols) = self.host.surface_dims(id)?;
                let geometry = match self.geometry {
                    Some(geometry) if geometry.matches_cells(rows, cols) => geometry,
                    previous => {
                        if previous.is_some() {
                            log::debug!("{} resized to {}x{} cells", id, rows, cols);
                        }
                        Geometry::from_cells(rows, cols, self.factor)
                    }
                };
                (geometry, None)
            }
        };

        let scaled = backend
            .scale(geometry.width, geometry.height)
            .and_then(|stride| buffer::check_stride(stride).map(|()| stride));
        let stride = match scaled {
            Ok(stride) => stride,
            Err(e) => {
                if let Some(id) = created {
                    self.host.destroy_surface(id);
                }
                return Err(e);
            }
        };

        if let Some(id) = created {
            log::debug!(
                "created {} of {}x{} cells at {},{}",
                id,
                geometry.rows,
                geometry.cols,
                self.placement.y,
                self.placement.x
            );
            self.surface = SurfaceBinding::Owned(id);
            // The surface already sits at the placement.
            self.placement = Placement::default();
        }
        self.geometry = Some(geometry);
        self.buffer = PixelBuffer::Decoded { stride };
        self.order = ChannelOrder::Rgba;
        self.frame_index += 1;
        self.timing = frame.timing;
        Ok(())
    }

    /**
        Blit a pixel window of the visual onto its surface.

        Lengths of [`TO_EDGE`](render::TO_EDGE) extend to the buffer edge. A window with no
        area draws nothing and succeeds. Returns the number of cells the
        host drew.
    */
    pub fn render(&mut self, beg_y: isize, beg_x: isize, len_y: isize, len_x: isize) -> Result<usize> {
        let geometry = self.geometry.ok_or(Error::NoPixels)?;
        let Some(window) =
            render::window(geometry.height, geometry.width, beg_y, beg_x, len_y, len_x)?
        else {
            return Ok(0);
        };
        let id = self.surface.id().ok_or(Error::NoSurface)?;
        let data = self.pixels().ok_or(Error::NoPixels)?;

        let blit = Blit {
            placement: self.placement,
            window,
            stride: self.buffer.stride(),
            data,
            order: self.order,
        };
        Ok(self.host.blit_rgba(id, &blit)?)
    }

    /**
        Rotate the visual about its center by `radians`.

        The surface is replaced by a duplicate that the visual owns, made
        square if it was not. The old surface is never resized, and is
        destroyed only if it was owned. Nothing changes if any step fails.
    */
    pub fn rotate(&mut self, radians: f64) -> Result<()> {
        let geometry = self.geometry.ok_or(Error::NoPixels)?;
        let id = self.surface.id().ok_or(Error::NoSurface)?;

        let (data, pdiam) = {
            let pixels = self.pixels().ok_or(Error::NoPixels)?;
            rotate::rotate_pixels(
                pixels,
                self.buffer.stride(),
                geometry.width,
                geometry.height,
                radians,
            )?
        };

        let (rows, cols) = self.host.surface_dims(id)?;
        let rotated = self.host.duplicate_surface(id)?;
        let squared = match rotate::square_cells(rows, cols, self.factor) {
            Some((rows, cols)) => self.host.resize_surface(rotated, rows, cols),
            None => Ok(()),
        };
        let (rows, cols) = match squared.and_then(|()| self.host.surface_dims(rotated)) {
            Ok(dims) => dims,
            Err(e) => {
                self.host.destroy_surface(rotated);
                return Err(e.into());
            }
        };

        if let Some(old) = self.surface.owned() {
            self.host.destroy_surface(old);
        }
        self.surface = SurfaceBinding::Owned(rotated);
        self.buffer = PixelBuffer::Owned {
            data,
            stride: pdiam * 4,
        };
        self.geometry = Some(Geometry {
            width: pdiam,
            height: pdiam,
            rows,
            cols,
        });
        Ok(())
    }

    /**
        Play the visual: decode, render and call `on_frame` for every frame,
        sleeping between frames to keep time. `timescale` stretches (above
        1) or compresses (below 1) the media's own timing.

        Returns [`StreamOutcome::Finished`] at the end of the source, or
        [`StreamOutcome::Stopped`] with the code `on_frame` broke with.
    */
    pub fn stream<F>(&mut self, timescale: f64, on_frame: F) -> Result<StreamOutcome>
    where
        F: FnMut(&mut Visual) -> ControlFlow<i32>,
    {
        if self.backend.is_none() {
            return Err(no_backend("streaming"));
        }
        stream::run(self, timescale, on_frame)
    }

    /**
        Text of the subtitle currently showing, if any.
    */
    pub fn subtitle(&self) -> Result<Option<String>> {
        match &self.backend {
            Some(backend) => Ok(backend.subtitle()),
            None if backend::AVAILABLE => Ok(None),
            None => Err(Error::Unimplemented("subtitles")),
        }
    }

    /**
        Draw onto `id` from now on. The surface stays owned by the caller; a
        surface the visual owned is destroyed.
    */
    pub fn set_surface(&mut self, id: SurfaceId) {
        if let Some(old) = self.surface.owned() {
            if old != id {
                self.host.destroy_surface(old);
            }
        }
        self.surface = SurfaceBinding::External(id);
        self.placement = Placement::default();
    }

    /**
        Convert BGRA pixels to RGBA in place. Does nothing if the pixels are
        already RGBA.
    */
    pub fn normalize_channel_order(&mut self) -> Result<()> {
        if self.order == ChannelOrder::Rgba {
            return Ok(());
        }
        let geometry = self.geometry.ok_or(Error::NoPixels)?;
        match &mut self.buffer {
            PixelBuffer::Owned { data, stride } => {
                buffer::bgra_to_rgba(data, *stride, geometry.width)?;
                self.order = ChannelOrder::Rgba;
                Ok(())
            }
            _ => Err(Error::NoPixels),
        }
    }

    pub fn surface(&self) -> Option<SurfaceId> {
        self.surface.id()
    }

    /**
        Whether the visual destroys its surface when dropped.
    */
    pub fn owns_surface(&self) -> bool {
        self.surface.owned().is_some()
    }

    /**
        Pixel size of the current buffer, as (width, height).
    */
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        self.geometry.map(|g| (g.width, g.height))
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn stride(&self) -> usize {
        self.buffer.stride()
    }

    pub fn pixels(&self) -> Option<&[u8]> {
        self.buffer.bytes(self.backend.as_deref())
    }

    pub fn channel_order(&self) -> ChannelOrder {
        self.order
    }

    /**
        Number of frames decoded so far.
    */
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /**
        Timing of the last decoded frame.
    */
    pub fn timing(&self) -> &FrameTiming {
        &self.timing
    }

    pub fn vertical_factor(&self) -> VerticalFactor {
        self.factor
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Drop for Visual {
    fn drop(&mut self) {
        if let Some(id) = self.surface.owned() {
            self.host.destroy_surface(id);
        }
    }
}

impl std::fmt::Debug for Visual {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Visual")
            .field("path", &self.path)
            .field("geometry", &self.geometry)
            .field("surface", &self.surface)
            .field("style", &self.style)
            .field("frame_index", &self.frame_index)
            .finish_non_exhaustive()
    }
}

fn no_backend(what: &'static str) -> Error {
    if backend::AVAILABLE {
        Error::Decode(format!("{} needs a media source", what))
    } else {
        Error::Unimplemented(what)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::TO_EDGE;
    use proptest::prelude::*;
    use crate::test_utils::{MockHost, SyntheticBackend};
    use std::time::{Duration, Instant};

    fn host(rows: usize, cols: usize, half_block: bool) -> Arc<MockHost> {
        Arc::new(MockHost::new(rows, cols, half_block))
    }

    fn pattern(rows: usize, stride: usize) -> Vec<u8> {
        (0..rows * stride).map(|i| (i * 7 % 256) as u8).collect()
    }

    #[test]
    fn from_rgba_renders_exact_pixels() {
        let host = host(24, 80, true);
        let data = pattern(5, 12);
        let mut visual = Visual::from_rgba(host.clone(), &data, 5, 12, 3).unwrap();

        // 5 pixel rows need 3 half-block rows
        let id = visual.surface().unwrap();
        assert_eq!(host.surface_dims(id).unwrap(), (3, 3));

        visual.render(0, 0, TO_EDGE, TO_EDGE).unwrap();
        let blits = host.blits();
        assert_eq!(blits.len(), 1);
        assert_eq!(blits[0].surface, id);
        assert_eq!(blits[0].data, data);
        assert_eq!(blits[0].stride, 12);
        assert_eq!((blits[0].window.len_y, blits[0].window.len_x), (5, 3));
        assert_eq!(blits[0].order, ChannelOrder::Rgba);
    }

    #[test]
    fn from_bgra_rejects_unaligned_stride() {
        let host = host(24, 80, false);
        let err = Visual::from_bgra(host.clone(), &[0; 30], 3, 10, 2).unwrap_err();
        assert!(matches!(err, Error::InvalidStride(10)));
        assert!(host.live_surfaces().is_empty());
    }

    #[test]
    fn from_rgba_rejects_short_buffers() {
        let host = host(24, 80, false);
        assert!(matches!(
            Visual::from_rgba(host.clone(), &[0; 15], 2, 8, 2),
            Err(Error::InvalidRegion(_))
        ));
        assert!(matches!(
            Visual::from_rgba(host, &[0; 32], 2, 8, 3),
            Err(Error::InvalidRegion(_))
        ));
    }

    #[test]
    fn from_rgba_rejects_overflowing_sizes() {
        let host = host(24, 80, false);
        assert!(matches!(
            Visual::from_rgba(host.clone(), &[0; 64], usize::MAX / 2, 16, 2),
            Err(Error::InvalidRegion(_))
        ));
        assert!(matches!(
            Visual::from_rgba(host.clone(), &[0; 64], 2, 16, usize::MAX / 2),
            Err(Error::InvalidRegion(_))
        ));
        assert!(host.live_surfaces().is_empty());
    }

    proptest! {
        #[test]
        fn raw_buffers_blit_exactly(
            rows in 1usize..12,
            cols in 1usize..12,
            pad in 0usize..3,
            bgra in any::<bool>(),
            seed in any::<u8>(),
            tail in 0usize..8,
        ) {
            let host = host(24, 80, true);
            let stride = (cols + pad) * 4;
            let data: Vec<u8> = (0..rows * stride + tail)
                .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
                .collect();
            let (mut visual, order) = if bgra {
                (Visual::from_bgra(host.clone(), &data, rows, stride, cols).unwrap(), ChannelOrder::Bgra)
            } else {
                (Visual::from_rgba(host.clone(), &data, rows, stride, cols).unwrap(), ChannelOrder::Rgba)
            };

            visual.render(0, 0, TO_EDGE, TO_EDGE).unwrap();
            let blits = host.blits();
            prop_assert_eq!(blits.len(), 1);
            prop_assert_eq!(&blits[0].data, &data[..rows * stride]);
            prop_assert_eq!(blits[0].stride, stride);
            prop_assert_eq!(blits[0].order, order);
            prop_assert_eq!((blits[0].window.len_y, blits[0].window.len_x), (rows, cols));
        }
    }

    #[test]
    fn bgra_is_tagged_then_normalized() {
        let host = host(24, 80, false);
        let data = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let mut visual = Visual::from_bgra(host.clone(), &data, 1, 8, 2).unwrap();

        visual.render(0, 0, TO_EDGE, TO_EDGE).unwrap();
        assert_eq!(host.blits()[0].order, ChannelOrder::Bgra);
        assert_eq!(host.blits()[0].data, data);

        visual.normalize_channel_order().unwrap();
        assert_eq!(visual.channel_order(), ChannelOrder::Rgba);
        assert_eq!(visual.pixels().unwrap(), &[3, 2, 1, 4, 7, 6, 5, 8]);
    }

    #[test]
    fn render_rejects_bad_windows_without_blitting() {
        let host = host(24, 80, false);
        let mut visual = Visual::from_rgba(host.clone(), &pattern(4, 16), 4, 16, 4).unwrap();

        for (by, bx, ly, lx) in [(-1, 0, 1, 1), (0, -1, 1, 1), (4, 0, 1, 1), (0, 2, 1, 3), (1, 0, 4, 1), (0, 0, -2, 1)] {
            assert!(visual.render(by, bx, ly, lx).is_err());
        }
        assert!(host.blits().is_empty());
    }

    #[test]
    fn zero_window_is_a_silent_success() {
        let host = host(24, 80, false);
        let mut visual = Visual::from_rgba(host.clone(), &pattern(4, 16), 4, 16, 4).unwrap();
        assert_eq!(visual.render(1, 1, 0, 0).unwrap(), 0);
        assert!(host.blits().is_empty());
    }

    #[test]
    fn partial_window_is_passed_through() {
        let host = host(24, 80, false);
        let mut visual = Visual::from_rgba(host.clone(), &pattern(4, 16), 4, 16, 4).unwrap();
        visual.render(1, 2, 2, TO_EDGE).unwrap();

        let window = host.blits()[0].window;
        assert_eq!((window.beg_y, window.beg_x, window.len_y, window.len_x), (1, 2, 2, 2));
    }

    #[test]
    fn dropping_destroys_only_owned_surfaces() {
        let host = host(24, 80, false);
        let owned = Visual::from_rgba(host.clone(), &pattern(2, 8), 2, 8, 2).unwrap();
        let owned_id = owned.surface().unwrap();
        drop(owned);
        assert_eq!(host.destroyed(), vec![owned_id]);

        let external = host.create_surface(4, 4, 0, 0).unwrap();
        let mut visual = Visual::with_backend(
            host.clone(),
            Box::new(SyntheticBackend::new(1, 4, 4)),
            Placement::default(),
            Style::Scale,
        );
        visual.set_surface(external);
        visual.decode().unwrap();
        drop(visual);
        assert_eq!(host.destroyed(), vec![owned_id]);
    }

    #[test]
    fn set_surface_releases_an_owned_surface() {
        let host = host(24, 80, false);
        let mut visual = Visual::from_rgba(host.clone(), &pattern(2, 8), 2, 8, 2).unwrap();
        let owned = visual.surface().unwrap();
        let external = host.create_surface(2, 2, 0, 0).unwrap();

        visual.set_surface(external);
        assert_eq!(host.destroyed(), vec![owned]);
        assert!(!visual.owns_surface());
        assert_eq!(visual.surface(), Some(external));
    }

    #[test]
    fn first_decode_creates_surface_at_placement() {
        let host = host(24, 80, true);
        let mut visual = Visual::with_backend(
            host.clone(),
            Box::new(SyntheticBackend::new(2, 640, 480)),
            Placement::new(4, 10),
            Style::Scale,
        );
        assert_eq!(visual.surface(), None);

        visual.decode().unwrap();
        let id = visual.surface().unwrap();
        assert_eq!(host.surface_origin(id), Some((4, 10)));
        assert_eq!(host.surface_dims(id).unwrap(), (20, 70));
        assert_eq!(visual.dimensions(), Some((70, 40)));
        assert_eq!(visual.stride(), 70 * 4);
        assert_eq!(visual.pixels().unwrap().len(), 70 * 40 * 4);
        assert_eq!(visual.frame_index(), 1);

        visual.render(0, 0, TO_EDGE, TO_EDGE).unwrap();
        assert_eq!(host.blits()[0].placement, Placement::default());
    }

    #[test]
    fn placement_outside_terminal_fails_decode() {
        let host = host(24, 80, false);
        let mut visual = Visual::with_backend(
            host.clone(),
            Box::new(SyntheticBackend::new(1, 8, 8)),
            Placement::new(0, 80),
            Style::Stretch,
        );
        assert!(matches!(visual.decode(), Err(Error::Decode(_))));
        assert!(host.live_surfaces().is_empty());
    }

    #[test]
    fn failed_scale_leaves_no_surface_behind() {
        let host = host(24, 80, false);
        let mut visual = Visual::with_backend(
            host.clone(),
            Box::new(SyntheticBackend::new(2, 8, 8).failing_scale_after(0)),
            Placement::new(2, 2),
            Style::Scale,
        );
        assert!(matches!(visual.decode(), Err(Error::OutOfMemory)));
        assert_eq!(visual.surface(), None);
        assert!(visual.pixels().is_none());
        assert_eq!(visual.frame_index(), 0);
        assert_eq!(host.destroyed().len(), 1);
        assert!(host.live_surfaces().is_empty());
    }

    #[test]
    fn failed_decode_keeps_the_rotated_pixels() {
        let host = host(24, 80, false);
        let mut visual = Visual::with_backend(
            host.clone(),
            Box::new(SyntheticBackend::new(3, 8, 8).failing_scale_after(1)),
            Placement::default(),
            Style::None,
        );
        visual.decode().unwrap();
        visual.rotate(0.0).unwrap();
        let rotated = visual.pixels().unwrap().to_vec();
        let geometry = *visual.geometry().unwrap();

        assert!(matches!(visual.decode(), Err(Error::OutOfMemory)));
        assert_eq!(visual.pixels(), Some(rotated.as_slice()));
        assert_eq!(visual.geometry(), Some(&geometry));
        assert_eq!(visual.frame_index(), 1);

        visual.render(0, 0, TO_EDGE, TO_EDGE).unwrap();
        assert_eq!(host.blits()[0].data, rotated);
    }

    #[test]
    fn native_style_keeps_media_size() {
        let host = host(24, 80, true);
        let mut visual = Visual::with_backend(
            host.clone(),
            Box::new(SyntheticBackend::new(3, 9, 5)),
            Placement::default(),
            Style::None,
        );
        visual.decode().unwrap();
        visual.decode().unwrap();
        assert_eq!(visual.dimensions(), Some((9, 5)));
        assert_eq!(host.surface_dims(visual.surface().unwrap()).unwrap(), (3, 9));
    }

    #[test]
    fn surface_resize_is_absorbed_on_next_decode() {
        let host = host(10, 20, true);
        let backend = SyntheticBackend::new(3, 100, 100);
        let scales = backend.scale_log();
        let mut visual = Visual::with_backend(
            host.clone(),
            Box::new(backend),
            Placement::default(),
            Style::Scale,
        );

        visual.decode().unwrap();
        assert_eq!(visual.dimensions(), Some((20, 20)));

        let id = visual.surface().unwrap();
        host.resize_surface(id, 5, 8).unwrap();
        visual.decode().unwrap();
        assert_eq!(visual.dimensions(), Some((8, 10)));
        assert_eq!(*scales.lock(), vec![(20, 20), (8, 10)]);
    }

    #[test]
    fn open_on_surface_stretches_over_it() {
        let host = host(24, 80, false);
        let external = host.create_surface(6, 12, 3, 3).unwrap();
        let mut visual = Visual::with_backend(
            host.clone(),
            Box::new(SyntheticBackend::new(1, 50, 50)),
            Placement::default(),
            Style::Stretch,
        );
        visual.set_surface(external);
        visual.decode().unwrap();
        assert_eq!(visual.dimensions(), Some((12, 6)));
        assert_eq!(host.live_surfaces(), vec![external]);
    }

    #[test]
    fn rotate_by_zero_keeps_square_content() {
        let host = host(24, 80, true);
        // 4x4 pixels on 2 half-block rows of 4 columns: already square
        let data = pattern(4, 16);
        let mut visual = Visual::from_rgba(host.clone(), &data, 4, 16, 4).unwrap();
        let before = visual.surface().unwrap();

        visual.rotate(0.0).unwrap();
        assert_eq!(visual.pixels().unwrap(), data.as_slice());
        assert_eq!(visual.stride(), 16);
        assert_ne!(visual.surface(), Some(before));
        assert_eq!(host.destroyed(), vec![before]);
        assert!(host.resizes().is_empty());
    }

    #[test]
    fn rotate_squares_a_wide_surface() {
        let host = host(24, 80, false);
        let mut visual = Visual::from_rgba(host.clone(), &pattern(2, 24), 2, 24, 6).unwrap();
        let before = visual.surface().unwrap();

        visual.rotate(std::f64::consts::FRAC_PI_2).unwrap();
        let rotated = visual.surface().unwrap();
        assert_ne!(rotated, before);
        assert_eq!(host.resizes(), vec![(rotated, 6, 6)]);
        assert_eq!(visual.dimensions(), Some((6, 6)));
        assert_eq!(visual.stride(), 24);
        assert_eq!(visual.pixels().unwrap().len(), 6 * 6 * 4);
        let geometry = visual.geometry().unwrap();
        assert_eq!((geometry.rows, geometry.cols), (6, 6));
    }

    #[test]
    fn failed_duplicate_leaves_the_visual_unchanged() {
        let host = host(24, 80, false);
        let data = pattern(2, 24);
        let mut visual = Visual::from_rgba(host.clone(), &data, 2, 24, 6).unwrap();
        let id = visual.surface().unwrap();
        let geometry = *visual.geometry().unwrap();

        host.fail_duplicates();
        assert!(matches!(visual.rotate(1.0), Err(Error::Surface(_))));
        assert_eq!(visual.surface(), Some(id));
        assert_eq!(host.surface_dims(id).unwrap(), (2, 6));
        assert_eq!(visual.geometry(), Some(&geometry));
        assert_eq!(visual.pixels(), Some(data.as_slice()));
        assert!(host.resizes().is_empty());
        assert_eq!(host.live_surfaces(), vec![id]);
    }

    #[test]
    fn rotate_keeps_external_surface() {
        let host = host(24, 80, false);
        let external = host.create_surface(4, 8, 0, 0).unwrap();
        let mut visual = Visual::with_backend(
            host.clone(),
            Box::new(SyntheticBackend::new(1, 4, 4)),
            Placement::default(),
            Style::Stretch,
        );
        visual.set_surface(external);
        visual.decode().unwrap();
        visual.rotate(1.0).unwrap();

        assert!(visual.owns_surface());
        assert!(host.destroyed().is_empty());
        assert_eq!(host.surface_dims(external).unwrap(), (4, 8));
        assert_eq!(host.resizes(), vec![(visual.surface().unwrap(), 8, 8)]);
        drop(visual);
        assert_eq!(host.live_surfaces(), vec![external]);
    }

    #[test]
    fn rotate_without_pixels_fails() {
        let host = host(24, 80, false);
        let mut visual = Visual::with_backend(
            host,
            Box::new(SyntheticBackend::new(1, 4, 4)),
            Placement::default(),
            Style::Scale,
        );
        assert!(matches!(visual.rotate(1.0), Err(Error::NoPixels)));
    }

    #[test]
    fn stream_paces_by_duration() {
        let host = host(24, 80, false);
        let backend = SyntheticBackend::new(5, 8, 8).with_duration(Duration::from_millis(20));
        let mut visual =
            Visual::with_backend(host.clone(), Box::new(backend), Placement::default(), Style::Scale);

        let mut calls = 0;
        let start = Instant::now();
        let outcome = visual
            .stream(1.0, |_| {
                calls += 1;
                ControlFlow::Continue(())
            })
            .unwrap();

        assert_eq!(outcome, StreamOutcome::Finished);
        assert_eq!(calls, 5);
        assert_eq!(host.blits().len(), 5);
        assert!(start.elapsed() >= Duration::from_millis(95));
    }

    #[test]
    fn stream_paces_by_timestamps() {
        let host = host(24, 80, false);
        let backend = SyntheticBackend::new(4, 8, 8)
            .with_duration(Duration::from_millis(1))
            .with_timestamps(Duration::from_millis(30));
        let mut visual =
            Visual::with_backend(host, Box::new(backend), Placement::default(), Style::Scale);

        let start = Instant::now();
        let outcome = visual.stream(1.0, |_| ControlFlow::Continue(())).unwrap();
        assert_eq!(outcome, StreamOutcome::Finished);
        // the last frame is stamped at 4 * 30ms
        assert!(start.elapsed() >= Duration::from_millis(115));
    }

    #[test]
    fn stream_stops_when_the_callback_breaks() {
        let host = host(24, 80, false);
        let backend = SyntheticBackend::new(10, 8, 8).with_duration(Duration::from_millis(1));
        let mut visual =
            Visual::with_backend(host, Box::new(backend), Placement::default(), Style::Scale);

        let mut calls = 0;
        let outcome = visual
            .stream(1.0, |visual| {
                calls += 1;
                if visual.frame_index() == 3 {
                    ControlFlow::Break(7)
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();

        assert_eq!(outcome, StreamOutcome::Stopped(7));
        assert_eq!(calls, 3);
    }

    #[test]
    fn stream_surfaces_decode_errors() {
        let host = host(24, 80, false);
        let backend = SyntheticBackend::new(10, 8, 8).failing_at(2);
        let mut visual =
            Visual::with_backend(host, Box::new(backend), Placement::default(), Style::Scale);

        let mut calls = 0;
        let err = visual
            .stream(0.0, |_| {
                calls += 1;
                ControlFlow::Continue(())
            })
            .unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert_eq!(calls, 2);
    }

    #[test]
    fn subtitle_comes_from_the_backend() {
        let host = host(24, 80, false);
        let mut visual = Visual::with_backend(
            host,
            Box::new(SyntheticBackend::new(2, 4, 4)),
            Placement::default(),
            Style::Scale,
        );
        assert_eq!(visual.subtitle().unwrap(), None);
        visual.decode().unwrap();
        assert_eq!(visual.subtitle().unwrap().as_deref(), Some("frame 1"));
    }

    #[test]
    fn from_surface_reads_the_requested_region() {
        let host = host(24, 80, true);
        let source = host.create_surface(10, 10, 0, 0).unwrap();
        let visual = Visual::from_surface(host.clone(), source, 2, 3, 4, TO_EDGE).unwrap();

        assert_eq!(host.reads(), vec![(source, 2, 3, 4, 7)]);
        assert_eq!(visual.dimensions(), Some((7, 8)));
        assert_ne!(visual.surface(), Some(source));
        assert!(visual.owns_surface());
        let expected = MockHost::region_pixels(source, 2, 3, 8, 7);
        assert_eq!(visual.pixels().unwrap(), expected.as_slice());
    }

    #[test]
    fn from_surface_rejects_regions_outside() {
        let host = host(24, 80, false);
        let source = host.create_surface(4, 4, 0, 0).unwrap();
        assert!(Visual::from_surface(host.clone(), source, 4, 0, 1, 1).is_err());
        assert!(Visual::from_surface(host.clone(), source, -1, 0, 1, 1).is_err());
        assert!(host.reads().is_empty());
    }

    #[cfg(not(any(feature = "ffmpeg", feature = "image")))]
    #[test]
    fn everything_is_unimplemented_without_a_backend() {
        let host = host(24, 80, false);
        assert!(matches!(
            Visual::open(host.clone(), "clip.mkv", Placement::default(), Style::Scale),
            Err(Error::Unimplemented(_))
        ));

        let mut visual = Visual::from_rgba(host, &pattern(2, 8), 2, 8, 2).unwrap();
        assert!(matches!(visual.decode(), Err(Error::Unimplemented(_))));
        assert!(matches!(
            visual.stream(1.0, |_| ControlFlow::Continue(())),
            Err(Error::Unimplemented(_))
        ));
        assert!(matches!(visual.subtitle(), Err(Error::Unimplemented(_))));
    }

    #[cfg(any(feature = "ffmpeg", feature = "image"))]
    #[test]
    fn decode_needs_a_source() {
        let host = host(24, 80, false);
        let mut visual = Visual::from_rgba(host, &pattern(2, 8), 2, 8, 2).unwrap();
        assert!(matches!(visual.decode(), Err(Error::Decode(_))));
        assert_eq!(visual.subtitle().unwrap(), None);
    }

    #[cfg(all(feature = "image", not(feature = "ffmpeg")))]
    #[test]
    fn open_decodes_an_image_file() {
        use image::{Rgb, RgbImage};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        RgbImage::from_pixel(6, 4, Rgb([9, 8, 7])).save(&path).unwrap();

        let host = host(24, 80, true);
        let mut visual = Visual::open(host.clone(), &path, Placement::default(), Style::None).unwrap();
        assert_eq!(visual.path(), Some(path.as_path()));
        visual.decode().unwrap();
        assert_eq!(visual.dimensions(), Some((6, 4)));
        assert!(visual.pixels().unwrap().chunks(4).all(|px| px == [9, 8, 7, 255]));
        assert!(matches!(visual.decode(), Err(Error::EndOfStream)));
    }
}
