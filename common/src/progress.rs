use std::time::Instant;

use log::info;

/// Logs a line every `interval` ticks with the time taken since the previous line.
pub struct Progress {
    label: &'static str,
    interval: usize,
    count: usize,
    last_report: Instant,
}

impl Progress {
    pub fn new(label: &'static str, interval: usize) -> Self {
        Self {
            label,
            interval,
            count: 0,
            last_report: Instant::now(),
        }
    }

    pub fn tick(&mut self) {
        self.tick_by(1);
    }

    pub fn tick_by(&mut self, amount: usize) {
        let before = self.count;
        self.count += amount;

        if self.interval == 0 || before / self.interval == self.count / self.interval {
            return;
        }

        info!(
            "{} {}, the last {} in {:.2}s",
            self.count,
            self.label,
            self.interval,
            self.last_report.elapsed().as_secs_f32()
        );

        self.last_report = Instant::now();
    }

    pub fn count(&self) -> usize {
        self.count
    }
}
