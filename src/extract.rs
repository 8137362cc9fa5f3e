//! Builds the text units that feed the tokenizer.

use log::warn;

use crate::record::Record;

/// Per-record text: the title, followed by a space and the abstract when
/// `include_abstract` is set and the record has one. Records without a
/// title are skipped with a warning.
pub fn extract_units(records: &[Record], include_abstract: bool) -> Vec<String> {
    let mut units = Vec::with_capacity(records.len());
    for record in records {
        let title = match record.title() {
            Ok(title) => title,
            Err(e) => {
                warn!("skipping record: {e}");
                continue;
            }
        };
        let unit = match record.abstract_text() {
            Some(abstract_text) if include_abstract => format!("{title} {abstract_text}"),
            _ => title,
        };
        units.push(unit);
    }
    units
}

/// All per-record texts joined by single spaces into one corpus string.
///
/// # Example
/// ```
/// use bibliostat::{extract_text, load};
/// let records = load(
///     serde_json::json!([
///         {"title": "Gene Expression", "abstract": "A study of DNA."},
///         {"title": "RNA Analysis", "abstract": null}
///     ]),
///     "inline",
/// )
/// .unwrap();
/// assert_eq!(
///     extract_text(&records, true),
///     "Gene Expression A study of DNA. RNA Analysis"
/// );
/// ```
pub fn extract_text(records: &[Record], include_abstract: bool) -> String {
    extract_units(records, include_abstract).join(" ")
}
