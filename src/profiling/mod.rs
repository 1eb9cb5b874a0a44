//! Benchmark collection and reporting

pub mod benchmark;
pub mod handle;
pub mod profiler;
pub mod report;

pub use benchmark::*;
pub use handle::*;
pub use profiler::*;
pub use report::*;

/// Which collection a benchmark belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BenchmarkCategory {
    BufferReads,
    BufferWrites,
    KernelExecutions,
    ResourceAllocations,
    ResourceDeallocations,
    Sample,
}

impl BenchmarkCategory {
    /// The event categories in report order. The sample slot is not included.
    pub const ALL: [BenchmarkCategory; 5] = [
        BenchmarkCategory::BufferReads,
        BenchmarkCategory::BufferWrites,
        BenchmarkCategory::KernelExecutions,
        BenchmarkCategory::ResourceAllocations,
        BenchmarkCategory::ResourceDeallocations,
    ];

    /// Console section heading
    pub fn label(&self) -> &'static str {
        match self {
            BenchmarkCategory::BufferReads => "Buffer reads",
            BenchmarkCategory::BufferWrites => "Buffer writes",
            BenchmarkCategory::KernelExecutions => "Kernel executions",
            BenchmarkCategory::ResourceAllocations => "Resource allocations",
            BenchmarkCategory::ResourceDeallocations => "Resource deallocations",
            BenchmarkCategory::Sample => "Sample",
        }
    }

    /// Key of the category in the JSON profile
    pub fn json_key(&self) -> &'static str {
        match self {
            BenchmarkCategory::BufferReads => "buffer_reads",
            BenchmarkCategory::BufferWrites => "buffer_writes",
            BenchmarkCategory::KernelExecutions => "kernel_executions",
            BenchmarkCategory::ResourceAllocations => "resource_allocations",
            BenchmarkCategory::ResourceDeallocations => "resource_deallocations",
            BenchmarkCategory::Sample => "sample",
        }
    }
}

impl std::fmt::Display for BenchmarkCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
