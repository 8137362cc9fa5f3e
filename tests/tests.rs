//! Integration tests for `bibliostat`.
//
// This suite verifies:
// - Library behavior (loading, extraction, n-grams, keywords, decade bins, batch)
// - CLI behavior for every subcommand
//
// Notes:
// - CLI tests run the binary with a per-process working directory.
// - All outputs go to temp dirs passed explicitly, so no test touches the global CWD.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use assert_fs::prelude::*;
use predicates::prelude::*;
use regex::Regex;
use serde_json::{Value as Json, json};
use tempfile::tempdir;

use bibliostat::{
    BatchConfig, ExportFormat, HistogramKind, NgramOrder, REPORT_FILE, StopwordSource, Stoplist,
    Task, TextCleaningConfig, WindowMode, bin_by_decade, extract_text, keyword_histogram,
    load_file, ngram_histogram, read_histogram, run_all, write_histogram,
};

// --------------------- helpers ---------------------

/// Create a file with content in a temp dir.
fn write_file(dir: &assert_fs::TempDir, name: &str, content: &str) -> PathBuf {
    let f = dir.child(name);
    f.write_str(content).unwrap();
    f.path().to_path_buf()
}

/// Read a JSON file.
fn read_json<P: AsRef<Path>>(p: P) -> Json {
    serde_json::from_str(&fs::read_to_string(p).unwrap()).expect("valid json")
}

/// Sample record collection as JSON text.
fn sample_records() -> String {
    json!([
        {
            "title": "Gene Expression in Yeast",
            "abstract": "A study of gene regulation. © 2001 Elsevier Ltd. All rights reserved.",
            "keywords": ["*Gene Expression", "Yeast "],
            "year": "1999"
        },
        {
            "title": "RNA Analysis",
            "abstract": null,
            "keywords": "gene expression*",
            "year": 2014
        },
        {
            "abstract": "Untitled records are skipped.",
            "year": "abcd"
        }
    ])
    .to_string()
}

fn plain_config() -> TextCleaningConfig {
    TextCleaningConfig {
        language: StopwordSource::None,
        ..TextCleaningConfig::default()
    }
}

/// Run CLI successfully with a specific working directory.
fn run_cli_ok_in(dir: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = assert_cmd::Command::cargo_bin("bibliostat").unwrap();
    cmd.current_dir(dir);
    cmd.args(args).assert().success()
}

/// Run CLI expecting failure with a specific working directory.
fn run_cli_fail_in(dir: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = assert_cmd::Command::cargo_bin("bibliostat").unwrap();
    cmd.current_dir(dir);
    cmd.args(args).assert().failure()
}

// --------------------- library tests ---------------------

#[test]
fn lib_extract_tolerates_missing_abstract() {
    let td = assert_fs::TempDir::new().unwrap();
    let path = write_file(
        &td,
        "two.json",
        r#"[{"title": "Gene Expression", "abstract": "A study of DNA."},
            {"title": "RNA Analysis", "abstract": null}]"#,
    );
    let records = load_file(&path).unwrap();
    assert_eq!(
        extract_text(&records, true),
        "Gene Expression A study of DNA. RNA Analysis"
    );
}

#[test]
fn lib_ngrams_filter_publisher_noise() {
    let td = assert_fs::TempDir::new().unwrap();
    let path = write_file(&td, "refs.json", &sample_records());
    let records = load_file(&path).unwrap();
    let config = plain_config();

    let order = NgramOrder::new(1).unwrap();
    let words = ngram_histogram(
        &records,
        order,
        true,
        WindowMode::PerRecord,
        &config.stoplist(order),
    );
    assert_eq!(words.get("gene"), Some(2));
    assert!(words.get("elsevier").is_none());
    assert!(words.get("reserved").is_none());
    assert!(words.get("©").is_none());
    assert!(words.get("untitled").is_none(), "untitled record must be skipped");

    let order = NgramOrder::new(2).unwrap();
    let bigrams = ngram_histogram(
        &records,
        order,
        false,
        WindowMode::PerRecord,
        &config.stoplist(order),
    );
    assert_eq!(bigrams.get("gene expression"), Some(1));
    assert_eq!(bigrams.get("yeast rna"), None);
    assert!(bigrams.iter().all(|(k, _)| k.split(' ').count() == 2));
}

#[test]
fn lib_unigram_scenario() {
    let td = assert_fs::TempDir::new().unwrap();
    let path = write_file(&td, "cat.json", r#"[{"title": "the cat sat on the mat"}]"#);
    let records = load_file(&path).unwrap();
    let order = NgramOrder::new(1).unwrap();
    let table = ngram_histogram(
        &records,
        order,
        false,
        WindowMode::PerRecord,
        &Stoplist::from_words(["the", "on"]),
    );
    assert_eq!(table.len(), 3);
    for w in ["cat", "sat", "mat"] {
        assert_eq!(table.get(w), Some(1));
    }
}

#[test]
fn lib_keywords_and_round_trip() {
    let td = assert_fs::TempDir::new().unwrap();
    let path = write_file(&td, "refs.json", &sample_records());
    let records = load_file(&path).unwrap();

    let table = keyword_histogram(&records);
    assert_eq!(table.get("gene expression"), Some(2));
    assert_eq!(table.get("yeast"), Some(1));

    let out = td.path().join("kw.json");
    write_histogram(&table, HistogramKind::Keyword, &out, ExportFormat::Json).unwrap();
    let raw = read_json(&out);
    assert_eq!(raw[0], json!({"keyword": "gene expression", "occurrences": 2}));
    assert_eq!(read_histogram(&out, HistogramKind::Keyword).unwrap(), table);
}

#[test]
fn lib_decade_bins_partition() {
    let td = assert_fs::TempDir::new().unwrap();
    let path = write_file(&td, "refs.json", &sample_records());
    let records = load_file(&path).unwrap();
    let bins = bin_by_decade(&records);

    let mut seen = HashSet::new();
    for (_, members) in &bins {
        for r in members {
            assert!(seen.insert(r.index()), "record in two bins");
        }
    }
    assert_eq!(seen, HashSet::from([0, 1]));
    let names: Vec<_> = bins
        .iter()
        .filter(|(_, m)| !m.is_empty())
        .map(|(b, _)| b.name)
        .collect();
    assert_eq!(names, vec!["1992-2001", "2012-onward"]);
}

#[test]
fn lib_batch_writes_twelve_artifacts() {
    let td = assert_fs::TempDir::new().unwrap();
    let input = td.child("in");
    input.create_dir_all().unwrap();
    input.child("a.json").write_str(&sample_records()).unwrap();
    input
        .child("b.json")
        .write_str(r#"[{"title": "Protein folding dynamics"}]"#)
        .unwrap();
    input.child("notes.txt").write_str("ignored").unwrap();
    let out = td.path().join("out");

    let mut config = BatchConfig::new(input.path(), &out);
    config.cleaning = plain_config();
    let report = run_all(&config).unwrap();

    assert!(report.is_complete());
    assert_eq!(report.written.len(), 12);
    let names: HashSet<String> = report
        .written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 12);
    assert!(names.contains("a_1gram_with-abstract.json"));
    assert!(names.contains("b_3gram_title-only.json"));

    let b_words = read_histogram(&out.join("b_1gram_title-only.json"), HistogramKind::Ngram)
        .unwrap();
    assert_eq!(b_words.total(), 3);
    assert!(out.join(REPORT_FILE).exists());
}

#[test]
fn lib_batch_isolates_failures() {
    let td = assert_fs::TempDir::new().unwrap();
    let input = td.child("in");
    input.create_dir_all().unwrap();
    input.child("good.json").write_str(&sample_records()).unwrap();
    input.child("bad.json").write_str("{ not json").unwrap();
    let out = td.path().join("out");

    let mut config = BatchConfig::new(input.path(), &out);
    config.orders = vec![NgramOrder::new(2).unwrap()];
    config.keywords = true;
    config.parallel = true;
    let report = run_all(&config).unwrap();

    // good.json: two bigram tables and one keyword table
    assert_eq!(report.written.len(), 3);
    assert_eq!(report.failures.len(), 3);
    assert!(report.failures.iter().all(|f| f.file.ends_with("bad.json")));
    assert!(report.failures.iter().any(|f| f.task == Task::Keywords));

    let saved = read_json(out.join(REPORT_FILE));
    assert_eq!(saved["failures"].as_array().unwrap().len(), 3);
    assert_eq!(saved["failures"][0]["task"]["kind"], "ngrams");
}

// --------------------- CLI tests ---------------------

#[test]
fn cli_nonexistent_input_fails() {
    let td = tempdir().unwrap();
    run_cli_fail_in(
        td.path(),
        &["keywords", "does_not_exist.json", "-o", "kw.json"],
    )
    .stderr(predicate::str::contains("Error"));
}

#[test]
fn cli_rejects_bad_order() {
    let td = assert_fs::TempDir::new().unwrap();
    let _f = write_file(&td, "refs.json", &sample_records());
    run_cli_fail_in(
        td.path(),
        &["ngrams", "refs.json", "--n", "4", "-o", "out.json"],
    )
    .stderr(predicate::str::contains("n-gram order"));
}

#[test]
fn cli_ngrams_json_with_stopwords() {
    let td = assert_fs::TempDir::new().unwrap();
    let _f = write_file(&td, "refs.json", &sample_records());
    let _s = write_file(&td, "stop.txt", "yeast\n");

    run_cli_ok_in(
        td.path(),
        &[
            "ngrams",
            "refs.json",
            "--n",
            "1",
            "--include-abstract",
            "--stopwords",
            "stop.txt",
            "-o",
            "words.json",
        ],
    );

    let words = read_json(td.path().join("words.json"));
    let arr = words.as_array().expect("json array");
    assert!(!arr.is_empty());
    assert!(arr.iter().all(|e| e.get("n-gram").is_some() && e.get("occurrences").is_some()));
    assert!(arr.iter().all(|e| e["n-gram"] != "yeast"));
}

#[test]
fn cli_keywords_csv() {
    let td = assert_fs::TempDir::new().unwrap();
    let _f = write_file(&td, "refs.json", &sample_records());
    run_cli_ok_in(
        td.path(),
        &["keywords", "refs.json", "-o", "kw.csv", "--export-format", "csv"],
    );
    let text = fs::read_to_string(td.path().join("kw.csv")).unwrap();
    assert!(text.starts_with("keyword,occurrences\ngene expression,2\n"));
}

#[test]
fn cli_decades() {
    let td = assert_fs::TempDir::new().unwrap();
    let _f = write_file(&td, "refs.json", &sample_records());
    run_cli_ok_in(td.path(), &["decades", "refs.json", "bins"]);

    let re = Regex::new(r"^refs_(up-to-1981|\d{4}-\d{4}|2012-onward)\.json$").unwrap();
    let files: Vec<String> = fs::read_dir(td.path().join("bins"))
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(files.len(), 5);
    assert!(files.iter().all(|f| re.is_match(f)));

    let nineties = read_json(td.path().join("bins/refs_1992-2001.json"));
    assert_eq!(nineties.as_array().unwrap().len(), 1);
    assert_eq!(nineties[0]["title"], "Gene Expression in Yeast");
}

#[test]
fn cli_batch_reports_failures() {
    let td = assert_fs::TempDir::new().unwrap();
    let input = td.child("in");
    input.create_dir_all().unwrap();
    input.child("ok.json").write_str(&sample_records()).unwrap();
    input.child("broken.json").write_str("[1, 2]").unwrap();

    run_cli_fail_in(
        td.path(),
        &["batch", "in", "out", "--n", "2", "--titles-only"],
    )
    .stdout(predicate::str::contains("1 files written"))
    .stderr(predicate::str::contains("broken.json"));

    assert!(td.path().join("out/ok_2gram_title-only.json").exists());
}

#[test]
fn cli_transcode_then_decades() {
    let td = assert_fs::TempDir::new().unwrap();
    let _x = write_file(
        &td,
        "export.xml",
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Documents>
  <Document><title>Old paper</title><year>1975</year></Document>
  <Document><title>New paper</title><year>2020</year></Document>
</Documents>"#,
    );
    run_cli_ok_in(td.path(), &["transcode", "export.xml", "export.json"]);
    run_cli_ok_in(td.path(), &["decades", "export.json", "bins"]);

    let old = read_json(td.path().join("bins/export_up-to-1981.json"));
    assert_eq!(old, json!([{"title": "Old paper", "year": "1975"}]));
}
