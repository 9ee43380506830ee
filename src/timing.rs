//! Pipeline phase timing.

use std::time::Instant;

/// A simple timer for measuring phase durations.
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    /// Start a new timer with the given phase name.
    pub fn start(name: &str) -> Self {
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }

    /// Finish the timer, print the elapsed time, and return it in seconds.
    pub fn finish(self) -> f64 {
        let secs = self.start.elapsed().as_secs_f64();
        if secs >= 60.0 {
            println!("  [{:.1}m] {}", secs / 60.0, self.name);
        } else {
            println!("  [{:.1}s] {}", secs, self.name);
        }
        secs
    }
}
