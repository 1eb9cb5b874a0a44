use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::Mutex;

use crate::config::ProfilingConfig;
use crate::error::{ProfilingError, ProfilingResult};
use super::benchmark::{BufferBenchmark, KernelBenchmark, ResourceBenchmark, SampleBenchmark};
use super::handle::BenchmarkHandle;
use super::report::{self, ProfilingReport, SampleSummary};
use super::BenchmarkCategory;

type Slot<T> = Arc<Mutex<T>>;

#[derive(Debug, Default)]
struct ProfilerState {
    buffer_reads: Vec<Slot<BufferBenchmark>>,
    buffer_writes: Vec<Slot<BufferBenchmark>>,
    kernel_executions: Vec<Slot<KernelBenchmark>>,
    resource_allocations: Vec<Slot<ResourceBenchmark>>,
    resource_deallocations: Vec<Slot<ResourceBenchmark>>,
    sample: Option<Slot<SampleBenchmark>>,
    all_dumped: bool,
}

fn records<T, R>(slots: &[Slot<T>]) -> Vec<R>
where
    for<'a> R: From<&'a T>,
{
    slots.iter().map(|slot| R::from(&*slot.lock())).collect()
}

impl ProfilerState {
    fn report(&self) -> ProfilingReport {
        ProfilingReport {
            sample: self
                .sample
                .as_ref()
                .map(|sample| SampleSummary::from(&*sample.lock())),
            buffer_reads: records(&self.buffer_reads),
            buffer_writes: records(&self.buffer_writes),
            kernel_executions: records(&self.kernel_executions),
            resource_allocations: records(&self.resource_allocations),
            resource_deallocations: records(&self.resource_deallocations),
        }
    }

    /// Drop every strong reference; outstanding handles become released.
    fn clear(&mut self) {
        self.sample = None;
        self.buffer_reads.clear();
        self.buffer_writes.clear();
        self.kernel_executions.clear();
        self.resource_allocations.clear();
        self.resource_deallocations.clear();
        self.all_dumped = true;
    }
}

/// What a dump produced.
#[derive(Debug, Clone)]
pub struct DumpOutcome {
    pub report: ProfilingReport,
    /// Path of the JSON profile, when one was written
    pub saved_to: Option<PathBuf>,
    pub persist_error: Option<ProfilingError>,
}

impl DumpOutcome {
    pub fn persisted(&self) -> bool {
        self.saved_to.is_some()
    }
}

/// Collector that owns every benchmark it starts.
///
/// Callers get [`BenchmarkHandle`]s to finish events; the profiler decides
/// when the storage is released, which happens on [`dump`](Profiler::dump).
/// Dropping a profiler that holds undumped state performs one final dump.
#[derive(Debug)]
pub struct Profiler {
    config: ProfilingConfig,
    state: Mutex<ProfilerState>,
}

impl Profiler {
    pub fn new() -> Self {
        Self::with_config(ProfilingConfig::default())
    }

    pub fn with_config(config: ProfilingConfig) -> Self {
        Self {
            config,
            state: Mutex::new(ProfilerState::default()),
        }
    }

    pub fn config(&self) -> &ProfilingConfig {
        &self.config
    }

    fn record<T>(
        &self,
        category: BenchmarkCategory,
        event: T,
        sequence: fn(&mut ProfilerState) -> &mut Vec<Slot<T>>,
    ) -> BenchmarkHandle<T> {
        let slot = Arc::new(Mutex::new(event));
        let handle = BenchmarkHandle::new(&slot, category);

        let mut state = self.state.lock();
        sequence(&mut *state).push(slot);
        state.all_dumped = false;

        handle
    }

    pub fn start_buffer_read(&self, buffer_id: u32, size: u64) -> BenchmarkHandle<BufferBenchmark> {
        tracing::debug!(buffer_id, size, "buffer read started");
        self.record(
            BenchmarkCategory::BufferReads,
            BufferBenchmark::new(buffer_id, size),
            |state| &mut state.buffer_reads,
        )
    }

    pub fn start_buffer_write(&self, buffer_id: u32, size: u64) -> BenchmarkHandle<BufferBenchmark> {
        tracing::debug!(buffer_id, size, "buffer write started");
        self.record(
            BenchmarkCategory::BufferWrites,
            BufferBenchmark::new(buffer_id, size),
            |state| &mut state.buffer_writes,
        )
    }

    pub fn start_kernel_execution(&self, kernel_id: u32) -> BenchmarkHandle<KernelBenchmark> {
        tracing::debug!(kernel_id, "kernel execution started");
        self.record(
            BenchmarkCategory::KernelExecutions,
            KernelBenchmark::new(kernel_id),
            |state| &mut state.kernel_executions,
        )
    }

    pub fn start_resource_allocation(
        &self,
        kernel_amount: usize,
        buffer_amount: usize,
        event_amount: usize,
    ) -> BenchmarkHandle<ResourceBenchmark> {
        tracing::debug!(kernel_amount, buffer_amount, event_amount, "resource allocation started");
        self.record(
            BenchmarkCategory::ResourceAllocations,
            ResourceBenchmark::new(kernel_amount, buffer_amount, event_amount),
            |state| &mut state.resource_allocations,
        )
    }

    pub fn start_resource_deallocation(
        &self,
        kernel_amount: usize,
        buffer_amount: usize,
        event_amount: usize,
    ) -> BenchmarkHandle<ResourceBenchmark> {
        tracing::debug!(kernel_amount, buffer_amount, event_amount, "resource deallocation started");
        self.record(
            BenchmarkCategory::ResourceDeallocations,
            ResourceBenchmark::new(kernel_amount, buffer_amount, event_amount),
            |state| &mut state.resource_deallocations,
        )
    }

    /// Replaces any held sample; a replaced sample is never reported.
    pub fn start_sample_benchmark(
        &self,
        name: impl Into<String>,
        parameters: Vec<(String, String)>,
    ) -> BenchmarkHandle<SampleBenchmark> {
        let sample = SampleBenchmark::new(name, parameters);
        tracing::debug!(name = sample.name(), "sample benchmark started");

        let slot = Arc::new(Mutex::new(sample));
        let handle = BenchmarkHandle::new(&slot, BenchmarkCategory::Sample);

        let mut state = self.state.lock();
        if let Some(previous) = state.sample.replace(slot) {
            tracing::warn!(
                name = previous.lock().name(),
                "previous sample benchmark discarded without being reported"
            );
        }
        state.all_dumped = false;

        handle
    }

    /// Number of events currently held in `category`.
    pub fn len(&self, category: BenchmarkCategory) -> usize {
        let state = self.state.lock();
        match category {
            BenchmarkCategory::BufferReads => state.buffer_reads.len(),
            BenchmarkCategory::BufferWrites => state.buffer_writes.len(),
            BenchmarkCategory::KernelExecutions => state.kernel_executions.len(),
            BenchmarkCategory::ResourceAllocations => state.resource_allocations.len(),
            BenchmarkCategory::ResourceDeallocations => state.resource_deallocations.len(),
            BenchmarkCategory::Sample => usize::from(state.sample.is_some()),
        }
    }

    pub fn has_sample(&self) -> bool {
        self.state.lock().sample.is_some()
    }

    /// True when nothing was started since the last dump.
    pub fn is_dumped(&self) -> bool {
        self.state.lock().all_dumped
    }

    /// Snapshot of the held events without clearing them.
    pub fn report(&self) -> ProfilingReport {
        self.state.lock().report()
    }

    pub fn write_summary<W: Write>(&self, out: &mut W) -> io::Result<()> {
        report::write_summary(&self.report(), out)
    }

    /// Print the summary, persist the JSON profile when no sample is in
    /// flight, then release every held event.
    ///
    /// Never fails: console and persist errors are logged, and a persist
    /// error is also returned in the outcome.
    pub fn dump(&self) -> DumpOutcome {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.dump_to(&mut out)
    }

    /// [`dump`](Profiler::dump) with the console output sent to `out`.
    pub fn dump_to<W: Write>(&self, out: &mut W) -> DumpOutcome {
        let report = self.take_report(false).unwrap_or_default();
        self.emit(report, out)
    }

    /// The teardown dump: runs only if something was started since the last dump.
    pub fn dump_if_pending(&self) -> Option<DumpOutcome> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.dump_if_pending_to(&mut out)
    }

    pub fn dump_if_pending_to<W: Write>(&self, out: &mut W) -> Option<DumpOutcome> {
        let report = self.take_report(true)?;
        Some(self.emit(report, out))
    }

    fn take_report(&self, only_if_pending: bool) -> Option<ProfilingReport> {
        let mut state = self.state.lock();
        if only_if_pending && state.all_dumped {
            return None;
        }
        let report = state.report();
        state.clear();
        Some(report)
    }

    fn emit<W: Write>(&self, report: ProfilingReport, out: &mut W) -> DumpOutcome {
        tracing::info!(
            buffer_reads = report.buffer_reads.len(),
            buffer_writes = report.buffer_writes.len(),
            kernel_executions = report.kernel_executions.len(),
            resource_allocations = report.resource_allocations.len(),
            resource_deallocations = report.resource_deallocations.len(),
            sample = report.sample.is_some(),
            "dumping profiler"
        );

        if self.config.print_summary {
            if let Err(e) = report::write_summary(&report, out) {
                tracing::error!("Failed to print profiling summary: {}", e);
            }
        }

        let mut outcome = DumpOutcome {
            report,
            saved_to: None,
            persist_error: None,
        };

        if !outcome.report.should_persist() {
            tracing::warn!("sample benchmark not finished, profiling file not written");
            return outcome;
        }
        if !self.config.persist {
            return outcome;
        }

        match report::persist(&outcome.report, &self.config.output_dir, &self.config.file_prefix) {
            Ok(path) => {
                if self.config.print_summary {
                    if let Err(e) = writeln!(out, "Profiling file saved at: {}", path.display()) {
                        tracing::error!("Failed to print profiling file path: {}", e);
                    }
                }
                outcome.saved_to = Some(path);
            }
            Err(e) => {
                tracing::error!("Failed to save profiling file: {}", e);
                outcome.persist_error = Some(e);
            }
        }
        outcome
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Profiler {
    fn drop(&mut self) {
        self.dump_if_pending();
    }
}

static GLOBAL_INITIALIZED: AtomicBool = AtomicBool::new(false);

lazy_static! {
    static ref PENDING_CONFIG: Mutex<Option<ProfilingConfig>> = Mutex::new(None);
    static ref GLOBAL_PROFILER: Profiler = {
        let mut pending = PENDING_CONFIG.lock();
        GLOBAL_INITIALIZED.store(true, Ordering::SeqCst);
        Profiler::with_config(pending.take().unwrap_or_default())
    };
}

/// The process-wide profiler, created on first use.
pub fn global() -> &'static Profiler {
    &GLOBAL_PROFILER
}

/// Configure the process-wide profiler. Must run before its first use.
pub fn init_global(config: ProfilingConfig) -> ProfilingResult<()> {
    config.validate()?;
    let mut pending = PENDING_CONFIG.lock();
    if GLOBAL_INITIALIZED.load(Ordering::SeqCst) {
        return Err(ProfilingError::AlreadyInitialized);
    }
    *pending = Some(config);
    Ok(())
}

/// Guard that runs the teardown dump of the process-wide profiler on drop.
///
/// Statics are never dropped, so hold this in `main()` for the lifetime of
/// the run. The dump also runs while unwinding from a panic.
pub struct ProfilingGuard {
    _private: (),
}

impl Drop for ProfilingGuard {
    fn drop(&mut self) {
        global().dump_if_pending();
    }
}

/// Start a profiling session on the process-wide profiler.
///
/// # Example
///
/// ```rust,ignore
/// let _session = mango_profiling::profiling::session();
/// let kernel = mango_profiling::profiling::global().start_kernel_execution(7);
/// // ... run the kernel ...
/// kernel.finish()?;
/// // summary and profile are emitted when _session is dropped
/// ```
pub fn session() -> ProfilingGuard {
    let _ = global();
    ProfilingGuard { _private: () }
}
