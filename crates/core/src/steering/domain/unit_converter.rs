use std::f64::consts::TAU;

/// Linear conversions between image pixels, flight-controller axis-rotation
/// units (ARU) and radians.
///
/// Absolute values are clamped to the configured ranges; deltas (rates) are
/// scaled without clamping. One full pixel range or one full ARU range
/// corresponds to a full turn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UnitConverter {
    aru_min: f64,
    aru_max: f64,
    px_min: f64,
    px_max: f64,
}

pub const DEFAULT_ARU_MIN: f64 = 989.0;
pub const DEFAULT_ARU_MAX: f64 = 2012.0;
pub const DEFAULT_PX_MIN: f64 = 0.0;
pub const DEFAULT_PX_MAX: f64 = 640.0;

impl UnitConverter {
    /// Returns `None` when either range is empty or inverted.
    pub fn new(aru_min: f64, aru_max: f64, px_min: f64, px_max: f64) -> Option<Self> {
        if aru_max <= aru_min || px_max <= px_min {
            return None;
        }
        Some(Self {
            aru_min,
            aru_max,
            px_min,
            px_max,
        })
    }

    /// Converter whose pixel range spans a frame of the given width.
    pub fn for_frame_width(width: u32) -> Self {
        Self {
            px_max: DEFAULT_PX_MIN + width.max(1) as f64,
            ..Self::default()
        }
    }

    fn aru_span(&self) -> f64 {
        self.aru_max - self.aru_min
    }

    fn px_span(&self) -> f64 {
        self.px_max - self.px_min
    }

    pub fn aru_to_px(&self, aru: f64) -> f64 {
        let px = self.px_span() / self.aru_span() * (aru - self.aru_min) + self.px_min;
        px.clamp(self.px_min, self.px_max)
    }

    pub fn px_to_aru(&self, px: f64) -> f64 {
        let aru = self.aru_span() / self.px_span() * (px - self.px_min) + self.aru_min;
        aru.clamp(self.aru_min, self.aru_max)
    }

    pub fn aru_delta_to_radian_delta(&self, aru_delta: f64) -> f64 {
        aru_delta * TAU / self.aru_span()
    }

    pub fn radian_delta_to_aru_delta(&self, radian_delta: f64) -> f64 {
        radian_delta * self.aru_span() / TAU
    }

    pub fn px_delta_to_radian_delta(&self, px_delta: f64) -> f64 {
        px_delta * TAU / self.px_span()
    }

    pub fn radian_delta_to_px_delta(&self, radian_delta: f64) -> f64 {
        radian_delta * self.px_span() / TAU
    }

    pub fn px_delta_to_aru_delta(&self, px_delta: f64) -> f64 {
        px_delta * self.aru_span() / self.px_span()
    }

    pub fn aru_delta_to_px_delta(&self, aru_delta: f64) -> f64 {
        aru_delta * self.px_span() / self.aru_span()
    }
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self {
            aru_min: DEFAULT_ARU_MIN,
            aru_max: DEFAULT_ARU_MAX,
            px_min: DEFAULT_PX_MIN,
            px_max: DEFAULT_PX_MAX,
        }
    }
}
