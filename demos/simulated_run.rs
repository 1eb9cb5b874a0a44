//! Profiles a fake compute run: allocate, upload, launch kernels, download, release.

use std::thread;
use std::time::Duration;

use mango_profiling::profiling::{global, session};
use mango_profiling::{init_logging, ProfilingResult};

fn main() -> ProfilingResult<()> {
    init_logging();
    let _session = session();
    let profiler = global();

    let sample = profiler.start_sample_benchmark(
        "vector_add",
        vec![
            ("elements".to_string(), "1048576".to_string()),
            ("iterations".to_string(), "3".to_string()),
        ],
    );

    let alloc = profiler.start_resource_allocation(1, 3, 2);
    thread::sleep(Duration::from_micros(200));
    alloc.finish()?;

    for buffer_id in 0..2 {
        let write = profiler.start_buffer_write(buffer_id, 4 * 1_048_576);
        thread::sleep(Duration::from_micros(500));
        write.finish()?;
    }

    for _ in 0..3 {
        let kernel = profiler.start_kernel_execution(0);
        thread::sleep(Duration::from_millis(1));
        kernel.finish()?;
    }

    let read = profiler.start_buffer_read(2, 4 * 1_048_576);
    thread::sleep(Duration::from_micros(500));
    read.finish()?;

    let dealloc = profiler.start_resource_deallocation(1, 3, 2);
    dealloc.finish()?;

    sample.mark_success()?;
    sample.finish()?;
    Ok(())
}
