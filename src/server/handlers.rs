//! Route handlers.
//!
//! Each handler loads the dataset afresh, runs the aggregations it needs and
//! hands the results to the page generator or serializes them as JSON.

use super::AppState;
use crate::analysis::{
    attribution_summary, basic_stats, search, sorted_tally, tag_mean_rating, tag_tally, top_n,
};
use crate::charts::{render_dashboard, ChartInputs};
use crate::error::DashboardError;
use crate::models::{AttributionSummary, BasicStats, Record};
use crate::report::{render_directors, render_genres, render_index, render_search, PageContext};
use axum::extract::{Query, State};
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// The first `q` value of a query string, or `""` when absent.
///
/// Parameters are taken as raw pairs so repeated or unknown keys never
/// reject the request.
fn search_query(params: &[(String, String)]) -> &str {
    params
        .iter()
        .find(|(key, _)| key == "q")
        .map(|(_, value)| value.as_str())
        .unwrap_or_default()
}

/// Payload of `/api/genres`.
#[derive(Debug, Serialize, Deserialize)]
pub struct GenreReport {
    pub genre_stats: BTreeMap<String, usize>,
    pub genre_ratings: BTreeMap<String, f64>,
}

pub async fn index_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, DashboardError> {
    debug!("GET /");
    let dataset = state.loader.load().await;

    let stats = basic_stats(&dataset);
    let genre_counts = sorted_tally(&tag_tally(&dataset.records));
    let top_movies = top_n(
        &dataset.records,
        state.dashboard.top_n,
        state.dashboard.rank_by,
    );
    let inputs = ChartInputs::from_records(&dataset.records, state.charts.histogram_bins);
    let charts = render_dashboard(inputs, state.charts).await?;

    Ok(Html(render_index(
        &stats,
        &charts,
        &top_movies,
        state.dashboard.rank_by,
        &genre_counts,
        &PageContext::new(dataset.origin),
    )))
}

pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Html<String> {
    let query = search_query(&params);
    debug!("GET /search q={:?}", query);
    let dataset = state.loader.load().await;
    let movies = search(&dataset.records, query, state.dashboard.search_limit);

    Html(render_search(
        query,
        &movies,
        &PageContext::new(dataset.origin),
    ))
}

pub async fn directors_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    debug!("GET /directors");
    let dataset = state.loader.load().await;
    let summaries = attribution_summary(&dataset.records);

    Html(render_directors(
        &summaries,
        &PageContext::new(dataset.origin),
    ))
}

pub async fn genres_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    debug!("GET /genres");
    let dataset = state.loader.load().await;
    let report = genre_report(&dataset.records, &state);

    Html(render_genres(
        &sorted_tally(&report.genre_stats),
        &report.genre_ratings,
        &PageContext::new(dataset.origin),
    ))
}

fn genre_report(records: &[Record], state: &AppState) -> GenreReport {
    let genre_stats = tag_tally(records);
    let genre_ratings = tag_mean_rating(records, &genre_stats, state.dashboard.tag_match);
    GenreReport {
        genre_stats,
        genre_ratings,
    }
}

pub async fn api_stats_handler(State(state): State<Arc<AppState>>) -> Json<BasicStats> {
    debug!("GET /api/stats");
    let dataset = state.loader.load().await;
    Json(basic_stats(&dataset))
}

pub async fn api_movies_handler(State(state): State<Arc<AppState>>) -> Json<Vec<Record>> {
    debug!("GET /api/movies");
    let dataset = state.loader.load().await;
    Json(dataset.records)
}

pub async fn api_genres_handler(State(state): State<Arc<AppState>>) -> Json<GenreReport> {
    debug!("GET /api/genres");
    let dataset = state.loader.load().await;
    Json(genre_report(&dataset.records, &state))
}

pub async fn api_directors_handler(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<AttributionSummary>> {
    debug!("GET /api/directors");
    let dataset = state.loader.load().await;
    Json(attribution_summary(&dataset.records))
}
