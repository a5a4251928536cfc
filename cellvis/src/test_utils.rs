/*!
    In-memory render host and decode backend for tests.
*/

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use cellvis_types::{FrameTiming, Pts, Rational};

use crate::backend::{DecodeBackend, FrameInfo};
use crate::buffer::ChannelOrder;
use crate::error::{Error, Result};
use crate::geometry::Placement;
use crate::render::Window;
use crate::surface::{Blit, PixelRegion, RenderHost, SurfaceError, SurfaceId};

/**
    A blit as the host saw it, with its pixels copied out.
*/
#[derive(Clone, Debug)]
pub struct BlitRecord {
    pub surface: SurfaceId,
    pub placement: Placement,
    pub window: Window,
    pub stride: usize,
    pub data: Vec<u8>,
    pub order: ChannelOrder,
}

#[derive(Clone, Copy, Debug)]
struct MockSurface {
    rows: usize,
    cols: usize,
    origin: (usize, usize),
}

#[derive(Default)]
struct MockState {
    next_id: u64,
    surfaces: BTreeMap<SurfaceId, MockSurface>,
    blits: Vec<BlitRecord>,
    resizes: Vec<(SurfaceId, usize, usize)>,
    destroyed: Vec<SurfaceId>,
    reads: Vec<(SurfaceId, usize, usize, usize, usize)>,
    fail_duplicates: bool,
}

/**
    Render host that records every call.
*/
pub struct MockHost {
    term: (usize, usize),
    half_block: bool,
    state: Mutex<MockState>,
}

impl MockHost {
    pub fn new(rows: usize, cols: usize, half_block: bool) -> Self {
        Self {
            term: (rows, cols),
            half_block,
            state: Mutex::new(MockState::default()),
        }
    }

    /**
        Make every later `duplicate_surface` call fail.
    */
    pub fn fail_duplicates(&self) {
        self.state.lock().fail_duplicates = true;
    }

    pub fn blits(&self) -> Vec<BlitRecord> {
        self.state.lock().blits.clone()
    }

    pub fn resizes(&self) -> Vec<(SurfaceId, usize, usize)> {
        self.state.lock().resizes.clone()
    }

    pub fn destroyed(&self) -> Vec<SurfaceId> {
        self.state.lock().destroyed.clone()
    }

    pub fn reads(&self) -> Vec<(SurfaceId, usize, usize, usize, usize)> {
        self.state.lock().reads.clone()
    }

    /**
        Surfaces not yet destroyed, in creation order.
    */
    pub fn live_surfaces(&self) -> Vec<SurfaceId> {
        self.state.lock().surfaces.keys().copied().collect()
    }

    pub fn surface_origin(&self, id: SurfaceId) -> Option<(usize, usize)> {
        self.state.lock().surfaces.get(&id).map(|s| s.origin)
    }

    fn factor(&self) -> usize {
        if self.half_block { 2 } else { 1 }
    }

    /**
        The pixels [`read_rgba`](RenderHost::read_rgba) returns for a region
        of `height` x `width` pixels starting at cell `beg_y`,`beg_x`.
    */
    pub fn region_pixels(
        id: SurfaceId,
        beg_y: usize,
        beg_x: usize,
        height: usize,
        width: usize,
    ) -> Vec<u8> {
        let mut data = Vec::with_capacity(width * height * 4);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[
                    (beg_y + y) as u8,
                    (beg_x + x) as u8,
                    id.0 as u8,
                    255,
                ]);
            }
        }
        data
    }
}

impl RenderHost for MockHost {
    fn term_dims(&self) -> (usize, usize) {
        self.term
    }

    fn can_half_block(&self) -> bool {
        self.half_block
    }

    fn create_surface(
        &self,
        rows: usize,
        cols: usize,
        y: usize,
        x: usize,
    ) -> Result<SurfaceId, SurfaceError> {
        if rows == 0 || cols == 0 {
            return Err(SurfaceError::Failed(format!("{}x{} surface", rows, cols)));
        }
        let mut state = self.state.lock();
        state.next_id += 1;
        let id = SurfaceId(state.next_id);
        state.surfaces.insert(
            id,
            MockSurface {
                rows,
                cols,
                origin: (y, x),
            },
        );
        Ok(id)
    }

    fn duplicate_surface(&self, id: SurfaceId) -> Result<SurfaceId, SurfaceError> {
        let mut state = self.state.lock();
        if state.fail_duplicates {
            return Err(SurfaceError::Failed(format!("cannot duplicate {}", id)));
        }
        let surface = *state.surfaces.get(&id).ok_or(SurfaceError::Unknown(id))?;
        state.next_id += 1;
        let dup = SurfaceId(state.next_id);
        state.surfaces.insert(dup, surface);
        Ok(dup)
    }

    fn resize_surface(&self, id: SurfaceId, rows: usize, cols: usize) -> Result<(), SurfaceError> {
        let mut state = self.state.lock();
        let surface = state.surfaces.get_mut(&id).ok_or(SurfaceError::Unknown(id))?;
        surface.rows = rows;
        surface.cols = cols;
        state.resizes.push((id, rows, cols));
        Ok(())
    }

    fn destroy_surface(&self, id: SurfaceId) {
        let mut state = self.state.lock();
        if state.surfaces.remove(&id).is_some() {
            state.destroyed.push(id);
        }
    }

    fn surface_dims(&self, id: SurfaceId) -> Result<(usize, usize), SurfaceError> {
        let state = self.state.lock();
        let surface = state.surfaces.get(&id).ok_or(SurfaceError::Unknown(id))?;
        Ok((surface.rows, surface.cols))
    }

    fn read_rgba(
        &self,
        id: SurfaceId,
        beg_y: usize,
        beg_x: usize,
        len_y: usize,
        len_x: usize,
    ) -> Result<PixelRegion, SurfaceError> {
        let height = len_y * self.factor();
        let mut state = self.state.lock();
        if !state.surfaces.contains_key(&id) {
            return Err(SurfaceError::Unknown(id));
        }
        state.reads.push((id, beg_y, beg_x, len_y, len_x));
        Ok(PixelRegion {
            data: Self::region_pixels(id, beg_y, beg_x, height, len_x),
            width: len_x,
            height,
        })
    }

    fn blit_rgba(&self, id: SurfaceId, blit: &Blit<'_>) -> Result<usize, SurfaceError> {
        let mut state = self.state.lock();
        if !state.surfaces.contains_key(&id) {
            return Err(SurfaceError::Unknown(id));
        }
        state.blits.push(BlitRecord {
            surface: id,
            placement: blit.placement,
            window: blit.window,
            stride: blit.stride,
            data: blit.data.to_vec(),
            order: blit.order,
        });
        let rows = blit.window.len_y.div_ceil(self.factor());
        Ok(rows * blit.window.len_x)
    }
}

/**
    Backend producing a fixed number of generated frames.
*/
pub struct SyntheticBackend {
    frames: u64,
    decoded: u64,
    native: (usize, usize),
    duration: Duration,
    timestamps: Option<Duration>,
    fail_after: Option<u64>,
    scale_fails_after: Option<usize>,
    scales: Arc<Mutex<Vec<(usize, usize)>>>,
    pixels: Option<Vec<u8>>,
}

impl SyntheticBackend {
    pub fn new(frames: u64, width: usize, height: usize) -> Self {
        Self {
            frames,
            decoded: 0,
            native: (width, height),
            duration: Duration::ZERO,
            timestamps: None,
            fail_after: None,
            scale_fails_after: None,
            scales: Arc::default(),
            pixels: None,
        }
    }

    /**
        Give every frame this display duration.
    */
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /**
        Stamp frame `n` (counting from 1) with `n * interval`.
    */
    pub fn with_timestamps(mut self, interval: Duration) -> Self {
        self.timestamps = Some(interval);
        self
    }

    /**
        Fail every decode after `frames` good ones.
    */
    pub fn failing_at(mut self, frames: u64) -> Self {
        self.fail_after = Some(frames);
        self
    }

    /**
        Make every `scale` call after the first `calls` fail.
    */
    pub fn failing_scale_after(mut self, calls: usize) -> Self {
        self.scale_fails_after = Some(calls);
        self
    }

    /**
        Shared log of the targets passed to `scale`.
    */
    pub fn scale_log(&self) -> Arc<Mutex<Vec<(usize, usize)>>> {
        self.scales.clone()
    }
}

impl DecodeBackend for SyntheticBackend {
    fn decode_next(&mut self) -> Result<FrameInfo> {
        if self.fail_after.is_some_and(|good| self.decoded >= good) {
            return Err(Error::Decode("synthetic failure".into()));
        }
        if self.decoded >= self.frames {
            return Err(Error::EndOfStream);
        }
        self.decoded += 1;
        self.pixels = None;

        let time_base = Rational::new(1, 1000);
        let pts = self
            .timestamps
            .map(|interval| Pts(interval.as_millis() as i64 * self.decoded as i64));
        let timing = FrameTiming::new(pts, self.duration.as_millis() as i64, time_base);
        Ok(FrameInfo {
            width: self.native.0,
            height: self.native.1,
            timing,
        })
    }

    fn native_dimensions(&self) -> (usize, usize) {
        self.native
    }

    fn scale(&mut self, width: usize, height: usize) -> Result<usize> {
        let calls = {
            let mut scales = self.scales.lock();
            scales.push((width, height));
            scales.len() - 1
        };
        if self.scale_fails_after.is_some_and(|good| calls >= good) {
            return Err(Error::OutOfMemory);
        }
        let shade = self.decoded as u8;
        let data = (0..width * height)
            .flat_map(|i| [shade, (i % 256) as u8, 0, 255])
            .collect();
        self.pixels = Some(data);
        Ok(width * 4)
    }

    fn pixels(&self) -> Option<&[u8]> {
        self.pixels.as_deref()
    }

    fn subtitle(&self) -> Option<String> {
        (self.decoded > 0).then(|| format!("frame {}", self.decoded))
    }
}
