//! Partitions a corpus into fixed publication-year ranges.

use crate::record::Record;

/// A named year range, lower bound inclusive and upper bound exclusive.
/// `None` leaves that side open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecadeBin {
    pub name: &'static str,
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl DecadeBin {
    pub fn contains(&self, year: i64) -> bool {
        self.start.is_none_or(|s| year >= s) && self.end.is_none_or(|e| year < e)
    }
}

pub const DECADE_BINS: [DecadeBin; 5] = [
    DecadeBin {
        name: "up-to-1981",
        start: None,
        end: Some(1982),
    },
    DecadeBin {
        name: "1982-1991",
        start: Some(1982),
        end: Some(1992),
    },
    DecadeBin {
        name: "1992-2001",
        start: Some(1992),
        end: Some(2002),
    },
    DecadeBin {
        name: "2002-2011",
        start: Some(2002),
        end: Some(2012),
    },
    DecadeBin {
        name: "2012-onward",
        start: Some(2012),
        end: None,
    },
];

/// Groups records by [`DECADE_BINS`], in table order. Records whose year is
/// missing or not an integer end up in no bin.
pub fn bin_by_decade(records: &[Record]) -> Vec<(DecadeBin, Vec<Record>)> {
    let mut bins: Vec<(DecadeBin, Vec<Record>)> =
        DECADE_BINS.iter().map(|b| (*b, Vec::new())).collect();
    for record in records {
        let Some(year) = record.year() else {
            continue;
        };
        if let Some((_, members)) = bins.iter_mut().find(|(bin, _)| bin.contains(year)) {
            members.push(record.clone());
        }
    }
    bins
}
