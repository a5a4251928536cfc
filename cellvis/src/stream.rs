/*!
    Paced playback.

    The pacing mode is picked once, from the first frame: if it carries a
    real presentation timestamp every frame is scheduled at
    `start + pts * time_base * timescale`, otherwise frame durations are
    summed and each frame waits until `start + sum * timescale`.
*/

use std::ops::ControlFlow;
use std::thread;
use std::time::{Duration, Instant};

use cellvis_types::FrameTiming;

use crate::error::{Error, Result};
use crate::render::TO_EDGE;
use crate::visual::Visual;

/**
    How a stream ended without error.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The source ran out of frames.
    Finished,
    /// The frame callback asked to stop with this code.
    Stopped(i32),
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Pacing {
    Timestamps,
    /// Seconds of media shown so far, already scaled.
    Durations { elapsed: f64 },
}

impl Pacing {
    fn for_first_frame(timing: &FrameTiming) -> Self {
        if timing.has_timestamp() && !timing.time_base.is_zero() {
            log::debug!("pacing by presentation timestamps");
            Self::Timestamps
        } else {
            log::debug!("pacing by frame durations");
            Self::Durations { elapsed: 0.0 }
        }
    }

    /**
        Seconds after the start at which the next frame is due.
    */
    fn advance(&mut self, timing: &FrameTiming, timescale: f64) -> f64 {
        match self {
            Self::Timestamps => match timing.pts_secs() {
                Some(pts) => pts.max(0.0) * timescale,
                // A frame without a timestamp in a timestamped stream is due now.
                None => 0.0,
            },
            Self::Durations { elapsed } => {
                *elapsed += timing.duration_secs() * timescale;
                *elapsed
            }
        }
    }
}

/**
    Decode, render and hand every frame to `on_frame` until the source ends
    or the callback breaks.
*/
pub(crate) fn run<F>(visual: &mut Visual, timescale: f64, mut on_frame: F) -> Result<StreamOutcome>
where
    F: FnMut(&mut Visual) -> ControlFlow<i32>,
{
    // NaN and negative scales play as fast as possible.
    let timescale = if timescale > 0.0 { timescale } else { 0.0 };
    let start = Instant::now();
    let mut pacing = None;

    loop {
        match visual.decode() {
            Ok(()) => {}
            Err(Error::EndOfStream) => return Ok(StreamOutcome::Finished),
            Err(e) => return Err(e),
        }
        visual.render(0, 0, TO_EDGE, TO_EDGE)?;

        if let ControlFlow::Break(code) = on_frame(visual) {
            log::debug!("stream stopped by callback at frame {}", visual.frame_index());
            return Ok(StreamOutcome::Stopped(code));
        }

        let timing = *visual.timing();
        let mode = pacing.get_or_insert_with(|| Pacing::for_first_frame(&timing));
        let due = mode.advance(&timing, timescale);

        let wake = Duration::try_from_secs_f64(due)
            .ok()
            .and_then(|offset| start.checked_add(offset));
        if let Some(delay) = wake.and_then(|wake| wake.checked_duration_since(Instant::now())) {
            thread::sleep(delay);
        }
    }
}
