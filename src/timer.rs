use std::time::{Duration, Instant};

/// One tick of the 60 Hz delay and sound timers
pub const TIMER_INTERVAL: Duration = Duration::from_nanos(16_666_667);

/// An 8-bit countdown that stops at zero
#[derive(Debug, Default, Copy, Clone)]
pub struct Timer {
    left: u8,
}

impl Timer {
    pub fn new() -> Timer {
        Timer { left: 0 }
    }

    pub fn step(&mut self, ticks: u32) {
        self.left = self.left.saturating_sub(ticks.min(u8::MAX as u32) as u8);
    }

    pub fn get(&self) -> u8 {
        self.left
    }

    pub fn set(&mut self, ticks: u8) {
        self.left = ticks
    }
}

/// Drives the delay and sound timers from wall-clock time, independent of how many
/// instructions run in between.
#[derive(Debug)]
pub struct Clock {
    pub delay: Timer,
    pub sound: Timer,
    last_tick: Instant,
}

impl Clock {
    pub fn new(now: Instant) -> Clock {
        Clock {
            delay: Timer::new(),
            sound: Timer::new(),
            last_tick: now,
        }
    }

    /// Decrement both timers once
    pub fn tick(&mut self) {
        self.delay.step(1);
        self.sound.step(1);
    }

    /// Apply every whole 60 Hz tick that elapsed between the last tick and `now`,
    /// carrying the remainder over to the next call. Returns the number of ticks applied.
    pub fn update(&mut self, now: Instant) -> u32 {
        let elapsed = now.saturating_duration_since(self.last_tick);
        let ticks = (elapsed.as_nanos() / TIMER_INTERVAL.as_nanos()) as u32;

        if ticks > 0 {
            self.delay.step(ticks);
            self.sound.step(ticks);
            self.last_tick += TIMER_INTERVAL * ticks;
        }

        ticks
    }
}
