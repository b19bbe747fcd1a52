use std::time::Instant;

/// Longest frame delta handed to the simulation; longer gaps (window drag, suspend) are dropped.
pub const MAX_FRAME_DELTA: f32 = 0.25;

pub struct FrameTick {
    pub dt: f32,
    /// Seconds discarded by the clamp, if any.
    pub dropped: Option<f32>,
}

pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(now: Instant) -> Self {
        Self { last: now }
    }

    pub fn tick(&mut self) -> FrameTick {
        self.tick_at(Instant::now())
    }

    pub fn tick_at(&mut self, now: Instant) -> FrameTick {
        let raw = now.saturating_duration_since(self.last).as_secs_f32();
        self.last = now;
        if raw > MAX_FRAME_DELTA {
            FrameTick { dt: MAX_FRAME_DELTA, dropped: Some(raw - MAX_FRAME_DELTA) }
        } else {
            FrameTick { dt: raw, dropped: None }
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
