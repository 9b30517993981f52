//! Data models for the movie dashboard.
//!
//! This module contains the typed movie table schema and the derived
//! summaries computed from it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Column headers every dataset source must provide.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "Title",
    "Genre",
    "Director",
    "Year",
    "Runtime (Minutes)",
    "Rating",
    "Votes",
];

/// Header of the optional revenue column.
pub const REVENUE_COLUMN: &str = "Revenue (Millions)";

/// One row of the movie table.
///
/// Field names on the wire are the source table's column headers, so the
/// same struct reads CSV rows and serializes `/api/movies` entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Rank", default)]
    pub rank: Option<u32>,
    #[serde(rename = "Title")]
    pub title: String,
    /// Comma-joined genre tags, e.g. `Action,Adventure,Sci-Fi`.
    #[serde(rename = "Genre")]
    pub genre: String,
    #[serde(rename = "Description", default)]
    pub description: Option<String>,
    #[serde(rename = "Director")]
    pub director: String,
    #[serde(rename = "Actors", default)]
    pub actors: Option<String>,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Runtime (Minutes)")]
    pub runtime_minutes: u32,
    #[serde(rename = "Rating")]
    pub rating: f64,
    #[serde(rename = "Votes")]
    pub votes: u64,
    #[serde(rename = "Revenue (Millions)", default)]
    pub revenue_millions: Option<f64>,
    #[serde(rename = "Metascore", default)]
    pub metascore: Option<f64>,
}

impl Record {
    /// Iterate over the genre tags exactly as written in the source.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.genre.split(',')
    }

    /// Whether `tag` is one of this record's genre tags.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().any(|t| t == tag)
    }
}

/// Where a dataset was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetOrigin {
    File(PathBuf),
    Url(String),
    /// The embedded five-row sample used when no source is usable.
    Sample,
}

impl fmt::Display for DatasetOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetOrigin::File(path) => write!(f, "{}", path.display()),
            DatasetOrigin::Url(url) => write!(f, "{}", url),
            DatasetOrigin::Sample => write!(f, "embedded sample"),
        }
    }
}

/// The movie table as loaded for a single request.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<Record>,
    pub origin: DatasetOrigin,
    /// Whether the source carried a revenue column at all.
    pub has_revenue: bool,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Scalar summary of a dataset, served by `/api/stats`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicStats {
    #[serde(rename = "total_movies")]
    pub count: usize,
    #[serde(rename = "avg_rating")]
    pub mean_rating: f64,
    #[serde(rename = "total_directors")]
    pub distinct_attribution_count: usize,
    #[serde(rename = "avg_runtime")]
    pub mean_duration: f64,
    pub total_votes: u64,
    #[serde(rename = "avg_revenue")]
    pub mean_revenue: f64,
}

/// Per-director aggregate, one row of the `/directors` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionSummary {
    pub director: String,
    pub movie_count: usize,
    pub mean_rating: f64,
    pub mean_runtime: f64,
    /// Absent when none of the director's movies report revenue.
    pub mean_revenue: Option<f64>,
}

/// One equal-width histogram bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// How a genre tag selects records when averaging ratings per genre.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum TagMatch {
    /// The tag must be one of the record's split genre tags.
    #[default]
    Exact,
    /// The genre field only has to contain the tag text. A tag that is a
    /// substring of another tag over-matches.
    Substring,
}

/// Field used to rank records for top-N tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankBy {
    #[default]
    Rating,
    Votes,
    Revenue,
    Metascore,
}

impl RankBy {
    /// The value a record is ranked by, if it has one.
    pub fn key(&self, record: &Record) -> Option<f64> {
        match self {
            RankBy::Rating => Some(record.rating),
            RankBy::Votes => Some(record.votes as f64),
            RankBy::Revenue => record.revenue_millions,
            RankBy::Metascore => record.metascore,
        }
    }
}

impl fmt::Display for RankBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankBy::Rating => write!(f, "Rating"),
            RankBy::Votes => write!(f, "Votes"),
            RankBy::Revenue => write!(f, "Revenue"),
            RankBy::Metascore => write!(f, "Metascore"),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a record with the fields the aggregator cares about.
    pub(crate) fn record(title: &str, genre: &str, director: &str, rating: f64) -> Record {
        Record {
            rank: None,
            title: title.to_string(),
            genre: genre.to_string(),
            description: None,
            director: director.to_string(),
            actors: None,
            year: 2016,
            runtime_minutes: 120,
            rating,
            votes: 1000,
            revenue_millions: None,
            metascore: None,
        }
    }

    #[test]
    fn test_record_tags() {
        let r = record("Prometheus", "Adventure,Mystery,Sci-Fi", "Ridley Scott", 7.0);
        let tags: Vec<_> = r.tags().collect();
        assert_eq!(tags, vec!["Adventure", "Mystery", "Sci-Fi"]);
        assert!(r.has_tag("Sci-Fi"));
        assert!(!r.has_tag("Fi"));
    }

    #[test]
    fn test_record_serializes_with_column_names() {
        let r = Record {
            revenue_millions: Some(333.13),
            ..record("Guardians of the Galaxy", "Action", "James Gunn", 8.1)
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["Title"], "Guardians of the Galaxy");
        assert_eq!(json["Runtime (Minutes)"], 120);
        assert_eq!(json["Revenue (Millions)"], 333.13);
        assert!(json["Metascore"].is_null());
    }

    #[test]
    fn test_basic_stats_json_keys() {
        let stats = BasicStats {
            count: 5,
            ..BasicStats::default()
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["total_movies"], 5);
        for key in ["avg_rating", "total_directors", "avg_runtime", "total_votes", "avg_revenue"] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn test_rank_by_key() {
        let r = record("Split", "Horror,Thriller", "M. Night Shyamalan", 7.3);
        assert_eq!(RankBy::Rating.key(&r), Some(7.3));
        assert_eq!(RankBy::Votes.key(&r), Some(1000.0));
        assert_eq!(RankBy::Revenue.key(&r), None);
    }

    #[test]
    fn test_origin_display() {
        assert_eq!(DatasetOrigin::Sample.to_string(), "embedded sample");
        assert_eq!(
            DatasetOrigin::Url("https://example.com/m.csv".into()).to_string(),
            "https://example.com/m.csv"
        );
    }
}
