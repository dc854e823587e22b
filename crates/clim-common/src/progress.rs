//! Progress reporting for long-running, blocking operations.
//!
//! Loaders and builders call [`ProgressSink::update`] at coarse milestones.
//! Returning `ControlFlow::Break(())` asks the operation to stop; whatever
//! was already completed stays usable.

use std::ops::ControlFlow;

/// A single progress milestone.
#[derive(Debug, Clone, Copy)]
pub struct ProgressUpdate<'a> {
    /// Zero-based index of the milestone being started.
    pub step: usize,
    /// Total number of milestones expected.
    pub total: usize,
    pub message: &'a str,
}

impl ProgressUpdate<'_> {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.step as f64 / self.total as f64
        }
    }
}

pub trait ProgressSink {
    fn update(&mut self, update: ProgressUpdate<'_>) -> ControlFlow<()>;
}

impl<F> ProgressSink for F
where
    F: FnMut(ProgressUpdate<'_>) -> ControlFlow<()>,
{
    fn update(&mut self, update: ProgressUpdate<'_>) -> ControlFlow<()> {
        self(update)
    }
}

/// A sink that never aborts.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&mut self, _update: ProgressUpdate<'_>) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_sink_can_abort() {
        let mut seen = Vec::new();
        let mut sink = |u: ProgressUpdate<'_>| {
            seen.push(u.step);
            if u.step >= 1 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        };

        let first = sink.update(ProgressUpdate { step: 0, total: 2, message: "a" });
        let second = sink.update(ProgressUpdate { step: 1, total: 2, message: "b" });
        assert!(first.is_continue());
        assert!(second.is_break());
        assert_eq!(seen, vec![0, 1]);
    }

    #[test]
    fn test_fraction() {
        let u = ProgressUpdate { step: 3, total: 4, message: "" };
        assert_eq!(u.fraction(), 0.75);
        let empty = ProgressUpdate { step: 0, total: 0, message: "" };
        assert_eq!(empty.fraction(), 1.0);
    }
}
