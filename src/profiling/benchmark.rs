//! Benchmark event model

use std::time::{Duration, Instant};

/// A timed interval. `start` is fixed at construction; `end` equals `start`
/// until the benchmark is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Benchmark {
    start: Instant,
    end: Instant,
    finished: bool,
}

impl Benchmark {
    pub fn new() -> Self {
        let start = Instant::now();
        Self {
            start,
            end: start,
            finished: false,
        }
    }

    /// Repeated calls overwrite `end` with the latest timestamp.
    pub fn finish(&mut self) {
        self.end = Instant::now();
        self.finished = true;
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    pub fn end(&self) -> Instant {
        self.end
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn duration(&self) -> Duration {
        self.end.saturating_duration_since(self.start)
    }

    /// Duration in nanoseconds, saturating at `u64::MAX`.
    pub fn duration_ns(&self) -> u64 {
        u64::try_from(self.duration().as_nanos()).unwrap_or(u64::MAX)
    }
}

impl Default for Benchmark {
    fn default() -> Self {
        Self::new()
    }
}

/// Uniform access to the interval embedded in every benchmark kind.
pub trait TimedBenchmark {
    fn timing(&self) -> &Benchmark;
    fn timing_mut(&mut self) -> &mut Benchmark;

    fn finish(&mut self) {
        self.timing_mut().finish();
    }

    fn is_finished(&self) -> bool {
        self.timing().is_finished()
    }

    fn duration_ns(&self) -> u64 {
        self.timing().duration_ns()
    }
}

macro_rules! impl_timed_benchmark {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl TimedBenchmark for $ty {
                fn timing(&self) -> &Benchmark {
                    &self.timing
                }

                fn timing_mut(&mut self) -> &mut Benchmark {
                    &mut self.timing
                }
            }
        )+
    };
}

/// A single buffer read or write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferBenchmark {
    timing: Benchmark,
    buffer_id: u32,
    size: u64,
}

impl BufferBenchmark {
    pub fn new(buffer_id: u32, size: u64) -> Self {
        Self {
            timing: Benchmark::new(),
            buffer_id,
            size,
        }
    }

    pub fn buffer_id(&self) -> u32 {
        self.buffer_id
    }

    /// Transfer size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KernelBenchmark {
    timing: Benchmark,
    kernel_id: u32,
}

impl KernelBenchmark {
    pub fn new(kernel_id: u32) -> Self {
        Self {
            timing: Benchmark::new(),
            kernel_id,
        }
    }

    pub fn kernel_id(&self) -> u32 {
        self.kernel_id
    }
}

/// One allocation or deallocation batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceBenchmark {
    timing: Benchmark,
    kernel_amount: usize,
    buffer_amount: usize,
    event_amount: usize,
}

impl ResourceBenchmark {
    pub fn new(kernel_amount: usize, buffer_amount: usize, event_amount: usize) -> Self {
        Self {
            timing: Benchmark::new(),
            kernel_amount,
            buffer_amount,
            event_amount,
        }
    }

    pub fn kernel_amount(&self) -> usize {
        self.kernel_amount
    }

    pub fn buffer_amount(&self) -> usize {
        self.buffer_amount
    }

    pub fn event_amount(&self) -> usize {
        self.event_amount
    }
}

/// Outcome of a sample run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleResult {
    #[default]
    Unknown,
    Success,
    Failure,
}

impl SampleResult {
    pub fn label(&self) -> &'static str {
        match self {
            SampleResult::Unknown => "UNKNOWN",
            SampleResult::Success => "SUCCESS",
            SampleResult::Failure => "FAILURE",
        }
    }
}

impl std::fmt::Display for SampleResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// An end-to-end sample run with its parameters and outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBenchmark {
    timing: Benchmark,
    name: String,
    parameters: Vec<(String, String)>,
    result: SampleResult,
}

impl SampleBenchmark {
    pub fn new(name: impl Into<String>, parameters: Vec<(String, String)>) -> Self {
        Self {
            timing: Benchmark::new(),
            name: name.into(),
            parameters,
            result: SampleResult::Unknown,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter pairs in insertion order, duplicates included.
    pub fn parameters(&self) -> &[(String, String)] {
        &self.parameters
    }

    pub fn result(&self) -> SampleResult {
        self.result
    }

    // Last write wins for both outcome markers.
    pub fn mark_success(&mut self) {
        self.result = SampleResult::Success;
    }

    pub fn mark_failure(&mut self) {
        self.result = SampleResult::Failure;
    }
}

impl_timed_benchmark!(BufferBenchmark, KernelBenchmark, ResourceBenchmark, SampleBenchmark);

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_new_benchmark_is_unfinished() {
        let bench = Benchmark::new();
        assert!(!bench.is_finished());
        assert_eq!(bench.start(), bench.end());
        assert_eq!(bench.duration_ns(), 0);
    }

    #[test]
    fn test_finish_records_end() {
        let mut bench = Benchmark::new();
        thread::sleep(Duration::from_millis(2));
        bench.finish();

        assert!(bench.is_finished());
        assert!(bench.end() >= bench.start());
        assert!(bench.duration() >= Duration::from_millis(2));
    }

    #[test]
    fn test_repeated_finish_overwrites_end() {
        let mut bench = Benchmark::new();
        bench.finish();
        let first_end = bench.end();
        thread::sleep(Duration::from_millis(1));
        bench.finish();

        assert!(bench.end() > first_end);
        assert!(bench.is_finished());
    }

    #[test]
    fn test_buffer_metadata() {
        let mut bench = BufferBenchmark::new(3, 4096);
        assert_eq!(bench.buffer_id(), 3);
        assert_eq!(bench.size(), 4096);
        assert!(!bench.is_finished());

        bench.finish();
        assert!(bench.is_finished());
    }

    #[test]
    fn test_resource_metadata() {
        let bench = ResourceBenchmark::new(2, 5, 7);
        assert_eq!(bench.kernel_amount(), 2);
        assert_eq!(bench.buffer_amount(), 5);
        assert_eq!(bench.event_amount(), 7);
    }

    #[test]
    fn test_sample_outcome_last_write_wins() {
        let mut sample = SampleBenchmark::new("vector_add", vec![]);
        assert_eq!(sample.result(), SampleResult::Unknown);

        sample.mark_success();
        assert_eq!(sample.result(), SampleResult::Success);

        sample.mark_failure();
        assert_eq!(sample.result(), SampleResult::Failure);
        assert_eq!(sample.result().label(), "FAILURE");
    }

    #[test]
    fn test_sample_keeps_duplicate_parameters() {
        let params = vec![
            ("n".to_string(), "1".to_string()),
            ("n".to_string(), "2".to_string()),
        ];
        let sample = SampleBenchmark::new("dup", params.clone());
        assert_eq!(sample.parameters(), params.as_slice());
    }
}
