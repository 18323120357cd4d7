use std::{collections::HashSet, io::Read};

use flate2::read::GzDecoder;
use jiff::civil::Date;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{
    error::{AppError, AppResult},
    models::TierGap,
};

/// One line of the daily id export. Adult entries never make it past
/// parsing, so downstream code can treat the list as already filtered.
#[derive(Clone, Debug, Deserialize)]
pub struct ExportEntry {
    pub id: i32,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub adult: bool,
}

/// The catalog publishes `movie_ids_MM_DD_YYYY.json.gz` once per day.
pub fn export_url(base: &str, day: Date) -> AppResult<String> {
    let stamp = jiff::fmt::strtime::format("%m_%d_%Y", day)?;
    Ok(format!("{}/movie_ids_{stamp}.json.gz", base.trim_end_matches('/')))
}

/// Decompresses and parses the export. Malformed lines are logged and
/// dropped rather than failing the whole file.
pub fn parse_export(bytes: &[u8]) -> AppResult<Vec<ExportEntry>> {
    let mut text = String::new();
    GzDecoder::new(bytes)
        .read_to_string(&mut text)
        .map_err(|e| AppError::SchemaMismatch(format!("export is not valid gzip: {e}")))?;

    let mut entries = Vec::new();
    let mut skipped_adult = 0usize;
    let mut skipped_malformed = 0usize;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<ExportEntry>(line) {
            Ok(entry) if entry.adult => skipped_adult += 1,
            Ok(entry) => entries.push(entry),
            Err(err) => {
                skipped_malformed += 1;
                if skipped_malformed <= 5 {
                    warn!(error = %err, "skipping malformed export line");
                }
            },
        }
    }

    if skipped_adult > 0 || skipped_malformed > 0 {
        debug!(
            parsed = entries.len(),
            adult = skipped_adult,
            malformed = skipped_malformed,
            "export parsed with skips"
        );
    }

    Ok(entries)
}

/// Most-popular-first view, dropping entries under the threshold.
pub fn by_popularity(mut entries: Vec<ExportEntry>, min_popularity: f64) -> Vec<ExportEntry> {
    entries.retain(|e| e.popularity >= min_popularity);
    entries.sort_by(|a, b| {
        b.popularity.partial_cmp(&a.popularity).unwrap_or(std::cmp::Ordering::Equal)
    });
    entries
}

pub fn popularity_tier(popularity: f64) -> &'static str {
    if popularity > 100.0 {
        "very_high (>100)"
    } else if popularity > 10.0 {
        "high (10-100)"
    } else if popularity > 1.0 {
        "medium (1-10)"
    } else if popularity > 0.1 {
        "low (0.1-1)"
    } else {
        "very_low (<0.1)"
    }
}

pub const POPULARITY_TIERS: [&str; 5] =
    ["very_high (>100)", "high (10-100)", "medium (1-10)", "low (0.1-1)", "very_low (<0.1)"];

/// Missing-id counts per popularity tier, with the tier totals so a report
/// can show "n of m".
pub fn tier_gaps(entries: &[ExportEntry], missing: &HashSet<i32>) -> Vec<TierGap> {
    let mut tiers: Vec<TierGap> =
        POPULARITY_TIERS.iter().map(|&label| TierGap { label, missing: 0, total: 0 }).collect();
    for entry in entries {
        let label = popularity_tier(entry.popularity);
        if let Some(tier) = tiers.iter_mut().find(|t| t.label == label) {
            tier.total += 1;
            if missing.contains(&entry.id) {
                tier.missing += 1;
            }
        }
    }
    tiers
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::{Compression, write::GzEncoder};

    use super::*;

    fn gzip_lines(lines: &[&str]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        for line in lines {
            writeln!(encoder, "{line}").unwrap();
        }
        encoder.finish().unwrap()
    }

    #[test]
    fn export_url_uses_the_catalog_date_format() {
        let day: Date = "2026-08-22".parse().unwrap();
        let url = export_url("http://files.tmdb.org/p/exports/", day).unwrap();
        assert_eq!(url, "http://files.tmdb.org/p/exports/movie_ids_08_22_2026.json.gz");
    }

    #[test]
    fn parse_skips_adult_and_malformed_lines() {
        let bytes = gzip_lines(&[
            r#"{"adult":false,"id":550,"original_title":"Fight Club","popularity":61.4,"video":false}"#,
            r#"{"adult":true,"id":666,"original_title":"Nope","popularity":1.0,"video":false}"#,
            "not json at all",
            r#"{"adult":false,"id":27205,"original_title":"Inception","popularity":90.2,"video":false}"#,
        ]);
        let entries = parse_export(&bytes).unwrap();
        let ids: Vec<i32> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![550, 27205]);
    }

    #[test]
    fn parse_rejects_non_gzip_payloads() {
        assert!(matches!(parse_export(b"plain text"), Err(AppError::SchemaMismatch(_))));
    }

    #[test]
    fn by_popularity_filters_then_sorts_descending() {
        let bytes = gzip_lines(&[
            r#"{"id":1,"original_title":"A","popularity":0.5}"#,
            r#"{"id":2,"original_title":"B","popularity":50.0}"#,
            r#"{"id":3,"original_title":"C","popularity":5.0}"#,
        ]);
        let entries = by_popularity(parse_export(&bytes).unwrap(), 1.0);
        let ids: Vec<i32> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn tiers_partition_the_popularity_scale() {
        assert_eq!(popularity_tier(250.0), "very_high (>100)");
        assert_eq!(popularity_tier(50.0), "high (10-100)");
        assert_eq!(popularity_tier(5.0), "medium (1-10)");
        assert_eq!(popularity_tier(0.5), "low (0.1-1)");
        assert_eq!(popularity_tier(0.05), "very_low (<0.1)");
    }

    #[test]
    fn tier_gaps_count_missing_against_totals() {
        let bytes = gzip_lines(&[
            r#"{"id":1,"original_title":"A","popularity":200.0}"#,
            r#"{"id":2,"original_title":"B","popularity":150.0}"#,
            r#"{"id":3,"original_title":"C","popularity":5.0}"#,
        ]);
        let entries = parse_export(&bytes).unwrap();
        let missing = HashSet::from([2, 3]);
        let tiers = tier_gaps(&entries, &missing);

        assert_eq!(tiers.len(), POPULARITY_TIERS.len());
        assert_eq!(tiers[0].label, "very_high (>100)");
        assert_eq!(tiers[0].total, 2);
        assert_eq!(tiers[0].missing, 1);
        assert_eq!(tiers[2].total, 1);
        assert_eq!(tiers[2].missing, 1);
        assert_eq!(tiers[4].total, 0);
    }
}
