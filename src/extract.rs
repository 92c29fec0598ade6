// src/extract.rs

use once_cell::sync::Lazy;
use regex::Regex;

use crate::parse::RawRecord;

/// Which board column a cell came from. Decides the label keyword looked for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Event,
    Heat,
}

impl Field {
    fn labelled(&self) -> &'static Regex {
        match self {
            Field::Event => &EVENT_LABELLED,
            Field::Heat => &HEAT_LABELLED,
        }
    }
}

// keyword, optional separator, then the digits we want
static EVENT_LABELLED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)event\s*[#:.\-]?\s*([0-9]+)").expect("event pattern"));
static HEAT_LABELLED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)heat\s*[#:.\-]?\s*([0-9]+)").expect("heat pattern"));
static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("digit pattern"));

/// One extracted board reading. `None` means the cell held no digits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reading {
    pub event: Option<String>,
    pub heat: Option<String>,
    /// Raw text of the Time cell, when non-empty.
    pub time: Option<String>,
}

impl Reading {
    pub fn is_empty(&self) -> bool {
        self.event.is_none() && self.heat.is_none()
    }
}

/// Pull the bare number out of one cell.
///
/// The digits following the last occurrence of the column's keyword win
/// ("Women's 50m Free Event 45" gives "45"). Without a labelled number the
/// first digit run anywhere in the cell is used ("44" gives "44").
pub fn extract_number(field: Field, text: &str) -> Option<String> {
    if let Some(caps) = field.labelled().captures_iter(text).last() {
        return caps.get(1).map(|m| m.as_str().to_string());
    }
    DIGIT_RUN.find(text).map(|m| m.as_str().to_string())
}

pub fn extract_reading(record: &RawRecord) -> Reading {
    Reading {
        event: extract_number(Field::Event, &record.event),
        heat: extract_number(Field::Heat, &record.heat),
        time: record
            .time
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string),
    }
}
