//! Movie table aggregation and statistics.
//!
//! Every function here is a single pass (or a handful of passes) over the
//! loaded records: means, counts, sums and group-bys. Nothing is cached;
//! callers recompute per request.

use crate::models::{
    AttributionSummary, BasicStats, Dataset, HistogramBin, RankBy, Record, TagMatch,
};
use std::collections::{BTreeMap, HashSet};

/// Round to a fixed number of decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Compute the dashboard's headline numbers.
///
/// Means are rounded to one decimal. An empty dataset yields zeros, and the
/// revenue mean is zero when the source has no revenue column or no record
/// reports revenue.
pub fn basic_stats(dataset: &Dataset) -> BasicStats {
    let records = &dataset.records;

    let directors: HashSet<&str> = records.iter().map(|r| r.director.as_str()).collect();

    let mean_revenue = if dataset.has_revenue {
        mean(records.iter().filter_map(|r| r.revenue_millions)).unwrap_or(0.0)
    } else {
        0.0
    };

    BasicStats {
        count: records.len(),
        mean_rating: round_to(mean(records.iter().map(|r| r.rating)).unwrap_or(0.0), 1),
        distinct_attribution_count: directors.len(),
        mean_duration: round_to(
            mean(records.iter().map(|r| r.runtime_minutes as f64)).unwrap_or(0.0),
            1,
        ),
        total_votes: records.iter().map(|r| r.votes).sum(),
        mean_revenue: round_to(mean_revenue, 1),
    }
}

/// Count, for every distinct genre tag, the records carrying it.
///
/// Tags are taken verbatim from the comma split; no case or whitespace
/// normalization is applied.
pub fn tag_tally(records: &[Record]) -> BTreeMap<String, usize> {
    let mut tally: BTreeMap<String, usize> = BTreeMap::new();

    for record in records {
        // A tag repeated within one record still counts that record once
        let tags: HashSet<&str> = record.tags().collect();
        for tag in tags {
            *tally.entry(tag.to_string()).or_default() += 1;
        }
    }

    tally
}

/// Tally entries ordered by count, largest first. Ties keep tag order.
pub fn sorted_tally(tally: &BTreeMap<String, usize>) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> =
        tally.iter().map(|(tag, count)| (tag.clone(), *count)).collect();
    entries.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
    entries
}

/// Mean rating per tag, rounded to two decimals.
pub fn tag_mean_rating(
    records: &[Record],
    tally: &BTreeMap<String, usize>,
    matching: TagMatch,
) -> BTreeMap<String, f64> {
    let mut ratings = BTreeMap::new();

    for tag in tally.keys() {
        let matched = records.iter().filter(|r| match matching {
            TagMatch::Exact => r.has_tag(tag),
            TagMatch::Substring => r.genre.contains(tag.as_str()),
        });

        if let Some(avg) = mean(matched.map(|r| r.rating)) {
            ratings.insert(tag.clone(), round_to(avg, 2));
        }
    }

    ratings
}

/// Group records by director.
///
/// Sorted by movie count (descending), then director name. Means are rounded
/// to two decimals; the revenue mean only covers movies that report revenue.
pub fn attribution_summary(records: &[Record]) -> Vec<AttributionSummary> {
    let mut grouped: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();

    for record in records {
        grouped
            .entry(record.director.as_str())
            .or_default()
            .push(record);
    }

    let mut summaries: Vec<AttributionSummary> = grouped
        .into_iter()
        .map(|(director, movies)| AttributionSummary {
            director: director.to_string(),
            movie_count: movies.len(),
            mean_rating: round_to(mean(movies.iter().map(|r| r.rating)).unwrap_or(0.0), 2),
            mean_runtime: round_to(
                mean(movies.iter().map(|r| r.runtime_minutes as f64)).unwrap_or(0.0),
                2,
            ),
            mean_revenue: mean(movies.iter().filter_map(|r| r.revenue_millions))
                .map(|v| round_to(v, 2)),
        })
        .collect();

    // Stable sort keeps the name order among equal counts
    summaries.sort_by_key(|s| std::cmp::Reverse(s.movie_count));
    summaries
}

/// The `n` highest-ranked records, best first.
///
/// Records without a value for the ranking field come last; ties keep
/// dataset order.
pub fn top_n(records: &[Record], n: usize, by: RankBy) -> Vec<Record> {
    let mut ranked: Vec<&Record> = records.iter().collect();

    ranked.sort_by(|a, b| match (by.key(a), by.key(b)) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });

    ranked.into_iter().take(n).cloned().collect()
}

/// Case-insensitive literal search over title, director and genre.
///
/// An empty query returns the first `default_limit` records unfiltered.
pub fn search(records: &[Record], query: &str, default_limit: usize) -> Vec<Record> {
    if query.is_empty() {
        return records.iter().take(default_limit).cloned().collect();
    }

    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|r| {
            r.title.to_lowercase().contains(&needle)
                || r.director.to_lowercase().contains(&needle)
                || r.genre.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Mean rating per release year, in year order.
pub fn year_rating_trend(records: &[Record]) -> BTreeMap<i32, f64> {
    let mut by_year: BTreeMap<i32, (f64, usize)> = BTreeMap::new();

    for record in records {
        let entry = by_year.entry(record.year).or_insert((0.0, 0));
        entry.0 += record.rating;
        entry.1 += 1;
    }

    by_year
        .into_iter()
        .map(|(year, (sum, count))| (year, sum / count as f64))
        .collect()
}

/// Split `values` into `bins` equal-width buckets over their range.
///
/// The last bucket is closed on the right. A degenerate range is widened by
/// half a unit on each side.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let mut min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        min -= 0.5;
        max += 0.5;
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];

    for &value in values {
        let index = (((value - min) / width) as usize).min(bins - 1);
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bins {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count,
        })
        .collect()
}
