use std::time::Instant;

/// `HH:MM:SS`, each field zero-padded to two digits.
/// Hours are not wrapped; 100h and up simply render wider.
pub fn format_time(total_secs: u64) -> String {
    let hrs = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hrs, mins, secs)
}

/// Seconds since the value last changed.
#[derive(Clone, Copy, Debug, Default)]
pub struct ElapsedClock {
    last_change: Option<Instant>,
    elapsed_secs: u64,
}

impl ElapsedClock {
    pub fn rearm(&mut self, now: Instant) {
        self.last_change = Some(now);
        self.elapsed_secs = 0;
    }

    /// Recompute from the recorded timestamp. Without one this is a no-op.
    pub fn tick(&mut self, now: Instant) -> u64 {
        if let Some(at) = self.last_change {
            self.elapsed_secs = now.saturating_duration_since(at).as_secs();
        }
        self.elapsed_secs
    }

    pub fn readout(&self) -> String {
        format_time(self.elapsed_secs)
    }
}
