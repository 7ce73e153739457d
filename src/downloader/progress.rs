use super::models::DownloadProgress;
use log::info;
use std::time::{Duration, Instant};

/// Log-side consumer of progress events. Throttles output so a fast
/// transfer does not flood the log.
pub struct ProgressReporter {
    name: String,
    last_fraction: Option<f32>,
    start_time: Instant,
    last_display: Instant,
    completed: bool,
}

impl ProgressReporter {
    pub fn new(name: String) -> Self {
        let now = Instant::now();
        Self {
            name,
            last_fraction: None,
            start_time: now,
            last_display: now,
            completed: false,
        }
    }

    pub fn update(&mut self, progress: DownloadProgress) {
        match progress {
            DownloadProgress::Indeterminate => {
                info!("{}: downloading (size unknown)", self.name);
            }
            DownloadProgress::Fraction(fraction) => {
                self.last_fraction = Some(fraction);
                // Only log every 500ms to avoid spam
                if self.last_display.elapsed() >= Duration::from_millis(500) {
                    self.display(fraction);
                    self.last_display = Instant::now();
                }
            }
        }
    }

    pub fn complete(&mut self) {
        if !self.completed {
            self.completed = true;
            let elapsed = self.start_time.elapsed();
            info!("{}: Complete in {:.1}s", self.name, elapsed.as_secs_f64());
        }
    }

    fn display(&self, fraction: f32) {
        let percentage = (fraction * 100.0).round() as u8;
        info!("{}: {}%", self.name, percentage);
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if !self.completed && self.last_fraction == Some(1.0) {
            self.complete();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_is_idempotent() {
        let mut reporter = ProgressReporter::new("app.apk".to_string());
        reporter.update(DownloadProgress::Fraction(0.5));
        reporter.complete();
        reporter.complete();
        assert!(reporter.completed);
    }
}
