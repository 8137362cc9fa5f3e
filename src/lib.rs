mod batch;
mod clean;
mod decade;
mod error;
mod export;
mod extract;
mod ngram;
mod record;
mod transcode;

pub use batch::{
    BatchConfig, BatchFailure, BatchReport, REPORT_FILE, Task, collect_files, run_all,
};
pub use clean::{StopwordSource, Stoplist, TextCleaningConfig, clean_keyword, tokenize_and_filter};
pub use decade::{DECADE_BINS, DecadeBin, bin_by_decade};
pub use error::{Error, Result};
pub use export::{
    ExportFormat, load_file, read_histogram, write_decade_bins, write_histogram, write_records,
};
pub use extract::{extract_text, extract_units};
pub use ngram::{
    FrequencyTable, HistogramKind, NgramOrder, WindowMode, aggregate, aggregate_units,
    keyword_histogram,
};
pub use record::{Record, load, parse_records};
pub use transcode::{transcode_file, xml_to_json};

///Full text pipeline for one corpus: extract per-record text, tokenize and filter each record,
///then count n-grams of the given order.
/// # Example
/// ```
/// use bibliostat::{NgramOrder, Stoplist, WindowMode, load, ngram_histogram};
/// let records = load(
///     serde_json::json!([{"title": "The cat sat on the mat"}]),
///     "inline",
/// )
/// .unwrap();
/// let stop = Stoplist::from_words(["the", "on"]);
/// let order = NgramOrder::new(1).unwrap();
/// let table = ngram_histogram(&records, order, false, WindowMode::PerRecord, &stop);
/// assert_eq!(table.len(), 3);
/// assert_eq!(table.get("cat"), Some(1));
/// ```
pub fn ngram_histogram(
    records: &[Record],
    order: NgramOrder,
    include_abstract: bool,
    window: WindowMode,
    stoplist: &Stoplist,
) -> FrequencyTable {
    let units: Vec<Vec<String>> = extract_units(records, include_abstract)
        .iter()
        .map(|text| tokenize_and_filter(text, stoplist))
        .collect();
    aggregate_units(&units, order, window)
}
