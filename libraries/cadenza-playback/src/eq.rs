//! Equalizer parameter text
//!
//! Presets are plain text, one record per line (`\r\n` or `\n`):
//!
//! ```text
//! filter 1 1000 0.7 3
//! filter 2 4000 1.0 -2
//! precut -1.5
//! ```
//!
//! A `filter` record carries band index, frequency, Q and peak gain. The band
//! index is not used; bands are loaded in record order. When the very last
//! record is `precut`, it sets a gain applied to every band. Anything else
//! is skipped.

use serde::{Deserialize, Serialize};

/// One parametric equalizer band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EqBand {
    /// Center frequency in Hz
    pub frequency: f64,

    /// Quality factor
    pub q: f64,

    /// Peak gain in dB
    pub peak_gain: f64,

    /// Global pre-cut gain in dB
    pub precut: f64,
}

/// Parse EQ parameter text into bands
///
/// Malformed records are skipped. An empty result means "keep the current
/// curve"; callers must not load it.
pub fn parse_eq_params(text: &str) -> Vec<EqBand> {
    let records: Vec<&str> = if text.contains("\r\n") {
        text.split("\r\n").collect()
    } else {
        text.split('\n').collect()
    };

    // Only the final record can carry the pre-cut, even when it is blank
    let precut = records
        .last()
        .and_then(|record| parse_precut(record))
        .unwrap_or(0.0);

    records
        .iter()
        .filter_map(|record| parse_filter(record, precut))
        .collect()
}

fn parse_precut(record: &str) -> Option<f64> {
    let mut tokens = record.split_whitespace();
    if tokens.next()? != "precut" {
        return None;
    }
    tokens.next()?.parse().ok()
}

fn parse_filter(record: &str, precut: f64) -> Option<EqBand> {
    let tokens: Vec<&str> = record.split_whitespace().collect();
    if tokens.len() != 5 || tokens[0] != "filter" {
        return None;
    }

    Some(EqBand {
        frequency: tokens[2].parse().ok()?,
        q: tokens[3].parse().ok()?,
        peak_gain: tokens[4].parse().ok()?,
        precut,
    })
}
