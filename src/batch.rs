//! Runs the n-gram pipeline over every record file in a directory.
//!
//! Every (file, n, include_abstract) combination is an independent job.
//! A failing job is logged and recorded in the [`BatchReport`]; the others
//! still run.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::{info, warn};
use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use crate::clean::{Stoplist, TextCleaningConfig};
use crate::error::{Error, Result};
use crate::export::{ExportFormat, load_file, write_histogram, write_json};
use crate::ngram::{HistogramKind, NgramOrder, WindowMode, keyword_histogram};
use crate::ngram_histogram;
use crate::record::Record;

pub const REPORT_FILE: &str = "batch_report.json";

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub orders: Vec<NgramOrder>,
    pub include_abstract: Vec<bool>,
    pub window: WindowMode,
    pub format: ExportFormat,
    /// Also write the keyword histogram of every file
    pub keywords: bool,
    /// Run jobs on the rayon thread pool
    pub parallel: bool,
    pub cleaning: TextCleaningConfig,
}

impl BatchConfig {
    /// All three orders, with and without abstracts, JSON output.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            orders: NgramOrder::ALL.to_vec(),
            include_abstract: vec![true, false],
            window: WindowMode::default(),
            format: ExportFormat::default(),
            keywords: false,
            parallel: false,
            cleaning: TextCleaningConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Task {
    Ngrams {
        order: NgramOrder,
        include_abstract: bool,
    },
    Keywords,
}

impl Task {
    /// Output file name for this task applied to the input named `stem`.
    pub fn output_name(&self, stem: &str, format: ExportFormat) -> String {
        let ext = format.extension();
        match self {
            Task::Ngrams {
                order,
                include_abstract,
            } => {
                let source = if *include_abstract {
                    "with-abstract"
                } else {
                    "title-only"
                };
                format!("{stem}_{order}gram_{source}.{ext}")
            }
            Task::Keywords => format!("{stem}_keywords.{ext}"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub file: PathBuf,
    pub task: Task,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub generated_at: DateTime<Local>,
    pub written: Vec<PathBuf>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Whether `path` looks like something [`run_all`] writes: the report or a
/// histogram named by [`Task::output_name`].
fn is_batch_output(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name == REPORT_FILE {
        return true;
    }
    let Some(stem) = name.strip_suffix(".json") else {
        return false;
    };
    if stem.ends_with("_keywords") {
        return true;
    }
    ["_with-abstract", "_title-only"].iter().any(|source| {
        stem.strip_suffix(source)
            .and_then(|rest| rest.get(rest.len().saturating_sub(6)..))
            .is_some_and(|tail| matches!(tail, "_1gram" | "_2gram" | "_3gram"))
    })
}

/// The `*.json` files directly inside `dir`, sorted by name. Outputs of an
/// earlier batch run in the same directory are left out.
pub fn collect_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::InvalidArgument(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    let files = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping unreadable entry: {e}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .filter(|p| {
            let output = is_batch_output(p);
            if output {
                info!("skipping batch output {}", p.display());
            }
            !output
        })
        .collect();
    Ok(files)
}

struct Job<'a> {
    file: &'a Path,
    stem: String,
    records: &'a std::result::Result<Vec<Record>, String>,
    task: Task,
}

/// Runs every configured task over every input file and writes a
/// [`REPORT_FILE`] next to the outputs.
pub fn run_all(config: &BatchConfig) -> Result<BatchReport> {
    if config.orders.is_empty() || config.include_abstract.is_empty() {
        return Err(Error::InvalidArgument(
            "at least one n-gram order and one abstract setting are required".to_string(),
        ));
    }
    let files = collect_files(&config.input_dir)?;
    fs::create_dir_all(&config.output_dir).map_err(|e| Error::io(&config.output_dir, e))?;
    info!(
        "batch over {} files in {}",
        files.len(),
        config.input_dir.display()
    );

    let loaded: Vec<std::result::Result<Vec<Record>, String>> = files
        .iter()
        .map(|file| load_file(file).map_err(|e| e.to_string()))
        .collect();

    let mut tasks: Vec<Task> = Vec::new();
    for &order in &config.orders {
        for &include_abstract in &config.include_abstract {
            let task = Task::Ngrams {
                order,
                include_abstract,
            };
            // repeated settings would write the same file twice
            if !tasks.contains(&task) {
                tasks.push(task);
            }
        }
    }
    if config.keywords {
        tasks.push(Task::Keywords);
    }

    let jobs: Vec<Job<'_>> = files
        .iter()
        .zip(&loaded)
        .flat_map(|(file, records)| {
            let stem = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            tasks.iter().map(move |&task| Job {
                file,
                stem: stem.clone(),
                records,
                task,
            })
        })
        .collect();

    let stoplists: Vec<(NgramOrder, Stoplist)> = config
        .orders
        .iter()
        .map(|&order| (order, config.cleaning.stoplist(order)))
        .collect();

    let results: Vec<std::result::Result<PathBuf, String>> = if config.parallel {
        jobs.par_iter()
            .map(|job| run_job(job, config, &stoplists))
            .collect()
    } else {
        jobs.iter()
            .map(|job| run_job(job, config, &stoplists))
            .collect()
    };

    let mut written = Vec::new();
    let mut failures = Vec::new();
    for (job, result) in jobs.iter().zip(results) {
        match result {
            Ok(path) => written.push(path),
            Err(e) => {
                warn!("{} {:?} failed: {e}", job.file.display(), job.task);
                failures.push(BatchFailure {
                    file: job.file.to_path_buf(),
                    task: job.task,
                    error: e,
                });
            }
        }
    }

    let report = BatchReport {
        generated_at: Local::now(),
        written,
        failures,
    };
    write_json(&report, &config.output_dir.join(REPORT_FILE))?;
    info!(
        "batch done: {} written, {} failed",
        report.written.len(),
        report.failures.len()
    );
    Ok(report)
}

/// Runs one job. Errors are flattened to text since a load failure is
/// shared by every job of its file.
fn run_job(
    job: &Job<'_>,
    config: &BatchConfig,
    stoplists: &[(NgramOrder, Stoplist)],
) -> std::result::Result<PathBuf, String> {
    let records = job.records.as_ref().map_err(Clone::clone)?;
    let path = config
        .output_dir
        .join(job.task.output_name(&job.stem, config.format));
    write_task(records, job.task, &path, config, stoplists).map_err(|e| e.to_string())?;
    Ok(path)
}

fn write_task(
    records: &[Record],
    task: Task,
    path: &Path,
    config: &BatchConfig,
    stoplists: &[(NgramOrder, Stoplist)],
) -> Result<()> {
    match task {
        Task::Ngrams {
            order,
            include_abstract,
        } => {
            let stoplist = stoplists
                .iter()
                .find(|(o, _)| *o == order)
                .map(|(_, s)| s)
                .ok_or_else(|| Error::InvalidArgument(format!("no stoplist for order {order}")))?;
            let table = ngram_histogram(records, order, include_abstract, config.window, stoplist);
            write_histogram(&table, HistogramKind::Ngram, path, config.format)
        }
        Task::Keywords => {
            let table = keyword_histogram(records);
            write_histogram(&table, HistogramKind::Keyword, path, config.format)
        }
    }
}
