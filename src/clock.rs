/// Pattern time added per frame at speed 1.0.
const TIME_STEP: f32 = 0.02;

/// Shared "pattern time" scalar, advanced once per display frame.
///
/// The engine only calls `advance` while enabled and active, so a disabled
/// pattern costs nothing and re-enabling resumes exactly where it stopped.
pub struct AnimationClock {
    time: f32,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self { time: 0.0 }
    }

    pub fn advance(&mut self, speed: f32) {
        self.time += TIME_STEP * speed;
    }

    pub fn time(&self) -> f32 {
        self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_by_step_times_speed() {
        let mut clock = AnimationClock::new();
        clock.advance(1.0);
        assert!((clock.time() - 0.02).abs() < 1e-7);
        clock.advance(0.5);
        assert!((clock.time() - 0.03).abs() < 1e-7);
    }

    #[test]
    fn holds_still_between_advances() {
        let mut clock = AnimationClock::new();
        clock.advance(2.0);
        let t = clock.time();
        assert_eq!(clock.time(), t);
        assert_eq!(clock.time(), t);
    }
}
