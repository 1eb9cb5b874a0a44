//! Console summary and JSON persistence of collected benchmarks

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;
use serde::{Serialize, Serializer};

use crate::error::ProfilingResult;
use super::benchmark::{
    BufferBenchmark, KernelBenchmark, ResourceBenchmark, SampleBenchmark, SampleResult,
    TimedBenchmark,
};
use super::BenchmarkCategory;

impl Serialize for SampleResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Sample state captured at dump time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleSummary {
    pub name: String,
    /// Insertion order, duplicates kept
    pub parameters: Vec<(String, String)>,
    pub result: SampleResult,
    pub total_duration: u64,
    pub finished: bool,
}

impl From<&SampleBenchmark> for SampleSummary {
    fn from(sample: &SampleBenchmark) -> Self {
        Self {
            name: sample.name().to_string(),
            parameters: sample.parameters().to_vec(),
            result: sample.result(),
            total_duration: sample.duration_ns(),
            finished: sample.is_finished(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SampleDocument<'a> {
    name: &'a str,
    /// Later duplicate keys overwrite earlier ones
    params: BTreeMap<&'a str, &'a str>,
    result: SampleResult,
    total_duration: u64,
}

impl<'a> From<&'a SampleSummary> for SampleDocument<'a> {
    fn from(sample: &'a SampleSummary) -> Self {
        Self {
            name: &sample.name,
            params: sample
                .parameters
                .iter()
                .map(|(key, value)| (key.as_str(), value.as_str()))
                .collect(),
            result: sample.result,
            total_duration: sample.total_duration,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BufferRecord {
    pub buffer_id: u32,
    pub size: u64,
    pub duration: u64,
}

impl From<&BufferBenchmark> for BufferRecord {
    fn from(bench: &BufferBenchmark) -> Self {
        Self {
            buffer_id: bench.buffer_id(),
            size: bench.size(),
            duration: bench.duration_ns(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KernelRecord {
    pub kernel_id: u32,
    pub duration: u64,
}

impl From<&KernelBenchmark> for KernelRecord {
    fn from(bench: &KernelBenchmark) -> Self {
        Self {
            kernel_id: bench.kernel_id(),
            duration: bench.duration_ns(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResourceRecord {
    pub kernel_amount: usize,
    pub buffer_amount: usize,
    pub event_amount: usize,
    pub duration: u64,
}

impl From<&ResourceBenchmark> for ResourceRecord {
    fn from(bench: &ResourceBenchmark) -> Self {
        Self {
            kernel_amount: bench.kernel_amount(),
            buffer_amount: bench.buffer_amount(),
            event_amount: bench.event_amount(),
            duration: bench.duration_ns(),
        }
    }
}

/// Snapshot of everything a profiler held at dump time. Drives both the
/// console summary and the JSON profile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfilingReport {
    pub sample: Option<SampleSummary>,
    pub buffer_reads: Vec<BufferRecord>,
    pub buffer_writes: Vec<BufferRecord>,
    pub kernel_executions: Vec<KernelRecord>,
    pub resource_allocations: Vec<ResourceRecord>,
    pub resource_deallocations: Vec<ResourceRecord>,
}

/// The persisted JSON document, borrowed from a [`ProfilingReport`].
#[derive(Debug, Serialize)]
pub struct ProfileDocument<'a> {
    #[serde(flatten)]
    sample: Option<SampleDocument<'a>>,
    buffer_reads: &'a [BufferRecord],
    buffer_writes: &'a [BufferRecord],
    kernel_executions: &'a [KernelRecord],
    resource_allocations: &'a [ResourceRecord],
    resource_deallocations: &'a [ResourceRecord],
}

impl ProfilingReport {
    /// An in-flight sample suppresses the JSON profile.
    pub fn should_persist(&self) -> bool {
        self.sample.as_ref().map_or(true, |sample| sample.finished)
    }

    pub fn len(&self, category: BenchmarkCategory) -> usize {
        match category {
            BenchmarkCategory::BufferReads => self.buffer_reads.len(),
            BenchmarkCategory::BufferWrites => self.buffer_writes.len(),
            BenchmarkCategory::KernelExecutions => self.kernel_executions.len(),
            BenchmarkCategory::ResourceAllocations => self.resource_allocations.len(),
            BenchmarkCategory::ResourceDeallocations => self.resource_deallocations.len(),
            BenchmarkCategory::Sample => usize::from(self.sample.is_some()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sample.is_none() && BenchmarkCategory::ALL.iter().all(|c| self.len(*c) == 0)
    }

    pub fn document(&self) -> ProfileDocument<'_> {
        ProfileDocument {
            sample: self.sample.as_ref().map(SampleDocument::from),
            buffer_reads: &self.buffer_reads,
            buffer_writes: &self.buffer_writes,
            kernel_executions: &self.kernel_executions,
            resource_allocations: &self.resource_allocations,
            resource_deallocations: &self.resource_deallocations,
        }
    }

    pub fn to_json(&self) -> ProfilingResult<serde_json::Value> {
        Ok(serde_json::to_value(self.document())?)
    }
}

fn write_buffer_lines<W: Write>(out: &mut W, records: &[BufferRecord]) -> io::Result<()> {
    for record in records {
        writeln!(
            out,
            "Id: {} | Size (bytes): {} | Duration (ns): {}",
            record.buffer_id, record.size, record.duration
        )?;
    }
    Ok(())
}

fn write_resource_lines<W: Write>(out: &mut W, records: &[ResourceRecord]) -> io::Result<()> {
    for record in records {
        writeln!(
            out,
            "# Kernels: {} | # Buffers: {} | # Events: {} | Duration (ns): {}",
            record.kernel_amount, record.buffer_amount, record.event_amount, record.duration
        )?;
    }
    Ok(())
}

/// Write the human-readable summary: the sample block (if any), then one
/// section per category in report order.
pub fn write_summary<W: Write>(report: &ProfilingReport, out: &mut W) -> io::Result<()> {
    if let Some(sample) = &report.sample {
        writeln!(out, "Sample finished")?;
        writeln!(out, "Name: {}", sample.name)?;
        writeln!(out, "Parameters: ")?;
        for (key, value) in &sample.parameters {
            writeln!(out, "\t{}: {}", key, value)?;
        }
        writeln!(
            out,
            "Result: {} | Duration (ns): {}",
            sample.result, sample.total_duration
        )?;
    }

    for category in BenchmarkCategory::ALL {
        writeln!(out, "{}:", category.label())?;
        match category {
            BenchmarkCategory::BufferReads => write_buffer_lines(out, &report.buffer_reads)?,
            BenchmarkCategory::BufferWrites => write_buffer_lines(out, &report.buffer_writes)?,
            BenchmarkCategory::KernelExecutions => {
                for record in &report.kernel_executions {
                    writeln!(out, "Id: {} | Duration (ns): {}", record.kernel_id, record.duration)?;
                }
            }
            BenchmarkCategory::ResourceAllocations => {
                write_resource_lines(out, &report.resource_allocations)?
            }
            BenchmarkCategory::ResourceDeallocations => {
                write_resource_lines(out, &report.resource_deallocations)?
            }
            BenchmarkCategory::Sample => {}
        }
    }
    Ok(())
}

/// `<prefix>_[<sample>_]<epoch seconds>_<4-digit suffix>.json`
pub fn profile_file_name(
    prefix: &str,
    sample_name: Option<&str>,
    epoch_secs: u64,
    suffix: u16,
) -> String {
    let mut name = format!("{}_", prefix);
    if let Some(sample) = sample_name {
        name.push_str(sample);
        name.push('_');
    }
    name.push_str(&format!("{}_{:04}.json", epoch_secs, suffix % 10_000));
    name
}

fn unix_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

/// Write the report as compact JSON into `dir` and return the file path.
/// The random suffix only separates dumps taken within the same second.
pub fn persist(report: &ProfilingReport, dir: &Path, prefix: &str) -> ProfilingResult<PathBuf> {
    let suffix: u16 = rand::thread_rng().gen_range(0..=9999);
    let file_name = profile_file_name(
        prefix,
        report.sample.as_ref().map(|sample| sample.name.as_str()),
        unix_epoch_secs(),
        suffix,
    );
    let path = dir.join(file_name);

    let mut writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer(&mut writer, &report.document())?;
    writer.flush()?;

    tracing::info!(path = %path.display(), "profiling file written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_summary(finished: bool) -> SampleSummary {
        SampleSummary {
            name: "matmul".to_string(),
            parameters: vec![
                ("iter".to_string(), "10".to_string()),
                ("mode".to_string(), "slow".to_string()),
                ("mode".to_string(), "fast".to_string()),
            ],
            result: SampleResult::Success,
            total_duration: 1500,
            finished,
        }
    }

    fn full_report() -> ProfilingReport {
        ProfilingReport {
            sample: Some(sample_summary(true)),
            buffer_reads: vec![BufferRecord { buffer_id: 1, size: 64, duration: 10 }],
            buffer_writes: vec![BufferRecord { buffer_id: 2, size: 128, duration: 20 }],
            kernel_executions: vec![KernelRecord { kernel_id: 7, duration: 30 }],
            resource_allocations: vec![ResourceRecord {
                kernel_amount: 1,
                buffer_amount: 2,
                event_amount: 3,
                duration: 40,
            }],
            resource_deallocations: vec![],
        }
    }

    #[test]
    fn test_file_name_with_sample() {
        assert_eq!(
            profile_file_name("mango_profiling", Some("matmul"), 1_700_000_000, 42),
            "mango_profiling_matmul_1700000000_0042.json"
        );
    }

    #[test]
    fn test_file_name_without_sample() {
        assert_eq!(
            profile_file_name("mango_profiling", None, 1_700_000_000, 9999),
            "mango_profiling_1700000000_9999.json"
        );
        assert_eq!(
            profile_file_name("mango_profiling", None, 5, 0),
            "mango_profiling_5_0000.json"
        );
    }

    #[test]
    fn test_summary_format() {
        let mut out = Vec::new();
        write_summary(&full_report(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let expected = [
            "Sample finished",
            "Name: matmul",
            "Parameters: ",
            "\titer: 10",
            "\tmode: slow",
            "\tmode: fast",
            "Result: SUCCESS | Duration (ns): 1500",
            "Buffer reads:",
            "Id: 1 | Size (bytes): 64 | Duration (ns): 10",
            "Buffer writes:",
            "Id: 2 | Size (bytes): 128 | Duration (ns): 20",
            "Kernel executions:",
            "Id: 7 | Duration (ns): 30",
            "Resource allocations:",
            "# Kernels: 1 | # Buffers: 2 | # Events: 3 | Duration (ns): 40",
            "Resource deallocations:",
        ]
        .iter()
        .map(|line| format!("{}\n", line))
        .collect::<String>();
        assert_eq!(text, expected);
    }

    #[test]
    fn test_empty_summary_has_all_sections() {
        let mut out = Vec::new();
        write_summary(&ProfilingReport::default(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(!text.contains("Sample finished"));
        for category in BenchmarkCategory::ALL {
            assert!(text.contains(&format!("{}:\n", category.label())));
        }
    }

    #[test]
    fn test_json_shape() {
        let json = full_report().to_json().unwrap();

        assert_eq!(json["name"], "matmul");
        assert_eq!(json["result"], "SUCCESS");
        assert_eq!(json["total_duration"], 1500);
        assert_eq!(json["params"].as_object().unwrap().len(), 2);
        assert_eq!(json["params"]["mode"], "fast");
        assert_eq!(json["kernel_executions"][0]["kernel_id"], 7);
        assert_eq!(json["resource_allocations"][0]["event_amount"], 3);
        assert!(json["resource_deallocations"].as_array().unwrap().is_empty());
        assert!(json.get("parameters").is_none());
        assert!(json.get("finished").is_none());
    }

    #[test]
    fn test_summary_keeps_pairs_document_collapses_them() {
        let report = full_report();
        assert_eq!(report.sample.as_ref().unwrap().parameters.len(), 3);

        let json = report.to_json().unwrap();
        assert_eq!(json["params"], serde_json::json!({"iter": "10", "mode": "fast"}));
        assert_eq!(json.as_object().unwrap().len(), 4 + BenchmarkCategory::ALL.len());
    }

    #[test]
    fn test_json_without_sample_omits_sample_keys() {
        let json = ProfilingReport::default().to_json().unwrap();
        let object = json.as_object().unwrap();

        assert!(!object.contains_key("name"));
        assert!(!object.contains_key("params"));
        assert!(!object.contains_key("result"));
        assert!(!object.contains_key("total_duration"));
        for category in BenchmarkCategory::ALL {
            assert!(object[category.json_key()].as_array().unwrap().is_empty());
        }
    }

    #[test]
    fn test_persistence_gate() {
        assert!(ProfilingReport::default().should_persist());

        let mut report = full_report();
        assert!(report.should_persist());

        report.sample = Some(sample_summary(false));
        assert!(!report.should_persist());
    }

    #[test]
    fn test_persist_writes_file() {
        let dir = tempdir().unwrap();
        let report = full_report();
        let path = persist(&report, dir.path(), "mango_profiling").unwrap();

        let file_name = path.file_name().unwrap().to_str().unwrap();
        assert!(file_name.starts_with("mango_profiling_matmul_"));
        assert!(file_name.ends_with(".json"));

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, report.to_json().unwrap());
    }

    #[test]
    fn test_persist_into_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does/not/exist");
        let err = persist(&ProfilingReport::default(), &missing, "mango_profiling").unwrap_err();
        assert!(err.is_recoverable());
    }
}
