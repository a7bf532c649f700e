// crates/network/src/timing.rs
//! Word-timing table fetch and parsing
//!
//! The timing API returns, per audio file, a list of segments of the form
//! `[wordNumber, startMillis, endMillis]` with 1-based word numbers. We
//! convert to 0-based indices and seconds. A missing or empty payload is a
//! valid (empty) table, not an error: highlighting simply stays off.

use crate::client::Client;
use crate::error::NetworkResult;
use murattal_core::{timing_url, TimingTable, VerseRef, WordTiming};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TimingResponse {
    #[serde(default)]
    audio_files: Vec<TimingAudioFile>,
}

#[derive(Debug, Deserialize)]
struct TimingAudioFile {
    #[serde(default)]
    segments: Vec<Vec<i64>>,
}

/// Parses the raw timing API payload into a timing table.
///
/// Malformed segments (fewer than three fields) are skipped; the remote
/// data is advisory, not authoritative.
pub(crate) fn parse_timing_payload(payload: &str) -> Result<TimingTable, serde_json::Error> {
    let response: TimingResponse = serde_json::from_str(payload)?;
    let Some(first) = response.audio_files.into_iter().next() else {
        return Ok(Vec::new());
    };

    let table = first
        .segments
        .iter()
        .filter(|seg| seg.len() >= 3)
        .map(|seg| {
            let word_index = (seg[0].max(1) - 1) as usize;
            WordTiming::new(word_index, seg[1] as f64 / 1000.0, seg[2] as f64 / 1000.0)
        })
        .collect();
    Ok(table)
}

/// Fetches the word-timing table for one verse from the timing API.
pub async fn fetch_word_timings(
    client: &Client,
    recitation_id: u32,
    verse: VerseRef,
) -> NetworkResult<TimingTable> {
    let url = timing_url(recitation_id, verse);
    let payload = client.fetch_text(&url).await?;
    Ok(parse_timing_payload(&payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "audio_files": [{
            "url": "whatever.mp3",
            "segments": [[1, 0, 500], [2, 500, 1200], [3, 1200, 2040]]
        }]
    }"#;

    #[test]
    fn test_parse_converts_units_and_indices() {
        let table = parse_timing_payload(SAMPLE).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table[0], WordTiming::new(0, 0.0, 0.5));
        assert_eq!(table[1], WordTiming::new(1, 0.5, 1.2));
        assert_eq!(table[2], WordTiming::new(2, 1.2, 2.04));
    }

    #[test]
    fn test_parse_empty_payload() {
        let table = parse_timing_payload(r#"{"audio_files": []}"#).unwrap();
        assert!(table.is_empty());

        let table = parse_timing_payload("{}").unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_parse_skips_short_segments() {
        let payload = r#"{"audio_files": [{"segments": [[1, 0], [2, 500, 1200]]}]}"#;
        let table = parse_timing_payload(payload).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].word_index, 1);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timing_payload("not json").is_err());
    }

    #[test]
    fn test_parse_clamps_zero_word_number() {
        // Word numbers are 1-based upstream; a zero must not underflow
        let payload = r#"{"audio_files": [{"segments": [[0, 0, 100]]}]}"#;
        let table = parse_timing_payload(payload).unwrap();
        assert_eq!(table[0].word_index, 0);
    }
}
