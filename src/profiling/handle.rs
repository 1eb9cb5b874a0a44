use std::sync::{Arc, Weak};
use parking_lot::Mutex;

use crate::error::{ProfilingError, ProfilingResult};
use super::benchmark::{SampleBenchmark, TimedBenchmark};
use super::BenchmarkCategory;

/// Non-owning handle to a benchmark stored in a [`Profiler`](super::Profiler).
///
/// The profiler keeps the only strong reference, so the event is released on
/// dump no matter how many handles are still around. Operations on a
/// released handle return [`ProfilingError::EventReleased`].
#[derive(Debug)]
pub struct BenchmarkHandle<T> {
    inner: Weak<Mutex<T>>,
    category: BenchmarkCategory,
}

impl<T> Clone for BenchmarkHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            category: self.category,
        }
    }
}

impl<T> BenchmarkHandle<T> {
    pub(crate) fn new(event: &Arc<Mutex<T>>, category: BenchmarkCategory) -> Self {
        Self {
            inner: Arc::downgrade(event),
            category,
        }
    }

    pub fn category(&self) -> BenchmarkCategory {
        self.category
    }

    pub fn is_released(&self) -> bool {
        self.inner.strong_count() == 0
    }

    fn with_event<R>(&self, f: impl FnOnce(&mut T) -> R) -> ProfilingResult<R> {
        match self.inner.upgrade() {
            Some(event) => Ok(f(&mut event.lock())),
            None => {
                tracing::warn!(category = self.category.label(), "benchmark handle used after dump");
                Err(ProfilingError::released(self.category))
            }
        }
    }
}

impl<T: TimedBenchmark + Clone> BenchmarkHandle<T> {
    pub fn finish(&self) -> ProfilingResult<()> {
        self.with_event(|event| event.finish())
    }

    /// Copy of the current event state, or `None` once released.
    pub fn snapshot(&self) -> Option<T> {
        self.inner.upgrade().map(|event| event.lock().clone())
    }
}

impl BenchmarkHandle<SampleBenchmark> {
    pub fn mark_success(&self) -> ProfilingResult<()> {
        self.with_event(|sample| sample.mark_success())
    }

    pub fn mark_failure(&self) -> ProfilingResult<()> {
        self.with_event(|sample| sample.mark_failure())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiling::benchmark::{KernelBenchmark, SampleResult};

    #[test]
    fn test_handle_mutates_stored_event() {
        let event = Arc::new(Mutex::new(KernelBenchmark::new(7)));
        let handle = BenchmarkHandle::new(&event, BenchmarkCategory::KernelExecutions);

        assert!(!handle.snapshot().unwrap().is_finished());
        handle.finish().unwrap();
        assert!(event.lock().is_finished());
    }

    #[test]
    fn test_handle_does_not_keep_event_alive() {
        let event = Arc::new(Mutex::new(KernelBenchmark::new(1)));
        let handle = BenchmarkHandle::new(&event, BenchmarkCategory::KernelExecutions);
        drop(event);

        assert!(handle.is_released());
        assert!(handle.snapshot().is_none());
        let err = handle.finish().unwrap_err();
        assert!(matches!(err, ProfilingError::EventReleased { .. }));
    }

    #[test]
    fn test_sample_handle_outcome() {
        let sample = Arc::new(Mutex::new(SampleBenchmark::new("s", vec![])));
        let handle = BenchmarkHandle::new(&sample, BenchmarkCategory::Sample);

        handle.mark_failure().unwrap();
        handle.mark_success().unwrap();
        assert_eq!(sample.lock().result(), SampleResult::Success);
    }
}
