/*!
    Time bases and frame timing.
*/

/**
    A rational number, used for stream time bases.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /**
        Returns the value as a float. A zero denominator yields zero.
    */
    pub fn to_f64(self) -> f64 {
        if self.den == 0 {
            0.0
        } else {
            self.num as f64 / self.den as f64
        }
    }

    pub const fn is_zero(self) -> bool {
        self.num == 0 || self.den == 0
    }
}

impl Default for Rational {
    fn default() -> Self {
        Self::new(0, 1)
    }
}

/**
    Presentation timestamp in stream time base units.
*/
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pts(pub i64);

/**
    Timing attached to a decoded frame.

    `pts` is the best-effort presentation timestamp when the source has one,
    `duration` is how long the frame is shown, both in `time_base` units.
*/
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameTiming {
    pub pts: Option<Pts>,
    pub duration: i64,
    pub time_base: Rational,
}

impl FrameTiming {
    pub fn new(pts: Option<Pts>, duration: i64, time_base: Rational) -> Self {
        Self {
            pts,
            duration,
            time_base,
        }
    }

    /**
        True when the frame carries a usable, non-zero presentation timestamp.
    */
    pub fn has_timestamp(&self) -> bool {
        matches!(self.pts, Some(Pts(ts)) if ts != 0)
    }

    /**
        The display duration in seconds. Negative durations count as zero.
    */
    pub fn duration_secs(&self) -> f64 {
        (self.duration as f64 * self.time_base.to_f64()).max(0.0)
    }

    /**
        The presentation timestamp in seconds, if any.
    */
    pub fn pts_secs(&self) -> Option<f64> {
        self.pts.map(|Pts(ts)| ts as f64 * self.time_base.to_f64())
    }
}
