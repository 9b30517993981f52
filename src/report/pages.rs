//! HTML page generation.
//!
//! Pages are assembled section by section from the computed statistics with
//! `maud`, which escapes every interpolated value.

use crate::charts::DashboardCharts;
use crate::models::{AttributionSummary, BasicStats, DatasetOrigin, RankBy, Record};
use chrono::{DateTime, Utc};
use maud::{html, Markup, PreEscaped, DOCTYPE};
use std::collections::BTreeMap;

fn format_optional(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_else(|| "-".to_string())
}

/// Context shared by every page footer.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub origin: DatasetOrigin,
    pub generated_at: DateTime<Utc>,
}

impl PageContext {
    pub fn new(origin: DatasetOrigin) -> Self {
        Self {
            origin,
            generated_at: Utc::now(),
        }
    }
}

/// Wrap a page body in the shared document layout.
fn layout(title: &str, body: Markup, ctx: &PageContext) -> String {
    let page = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                title { (title) " - MovieDash" }
                style { (PreEscaped(STYLE)) }
            }
            body {
                nav {
                    a href="/" { "Dashboard" }
                    a href="/search" { "Search" }
                    a href="/directors" { "Directors" }
                    a href="/genres" { "Genres" }
                    form action="/search" method="get" {
                        input type="text" name="q" placeholder="Title, director or genre";
                    }
                }
                main {
                    h1 { (title) }
                    (body)
                }
                footer {
                    "Data source: " (ctx.origin.to_string()) " · Generated "
                    (ctx.generated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                }
            }
        }
    };

    page.into_string()
}

const STYLE: &str = "
body { font-family: sans-serif; margin: 0; color: #222; }
nav { background: #24292e; padding: 0.6em 1em; display: flex; gap: 1em; align-items: center; }
nav a { color: #fff; text-decoration: none; }
nav form { margin-left: auto; }
main { padding: 1em 2em; }
.cards { display: flex; flex-wrap: wrap; gap: 1em; }
.card { border: 1px solid #ddd; border-radius: 6px; padding: 0.8em 1.2em; min-width: 10em; }
.card .value { font-size: 1.6em; font-weight: bold; }
.charts img { max-width: 100%; margin: 0.5em 0; }
table { border-collapse: collapse; margin: 1em 0; }
th, td { border: 1px solid #ddd; padding: 0.3em 0.8em; text-align: left; }
footer { color: #777; font-size: 0.85em; padding: 1em 2em; }
";

/// Generate the stats cards.
fn stats_section(stats: &BasicStats) -> Markup {
    let cards = [
        ("Movies", stats.count.to_string()),
        ("Average rating", format!("{:.1}", stats.mean_rating)),
        ("Directors", stats.distinct_attribution_count.to_string()),
        ("Average runtime", format!("{:.1} min", stats.mean_duration)),
        ("Total votes", stats.total_votes.to_string()),
        ("Average revenue", format!("${:.1}M", stats.mean_revenue)),
    ];

    html! {
        section.cards {
            @for (label, value) in &cards {
                div.card {
                    div.label { (label) }
                    div.value { (value) }
                }
            }
        }
    }
}

fn charts_section(charts: &DashboardCharts) -> Markup {
    let images = [
        ("Rating distribution", &charts.rating_distribution),
        ("Runtime distribution", &charts.runtime_distribution),
        ("Movies per genre", &charts.genre_distribution),
        ("Rating vs runtime", &charts.rating_runtime_scatter),
        ("Average rating by year", &charts.year_rating_trend),
    ];

    html! {
        section.charts {
            h2 { "Charts" }
            @for (alt, image) in images {
                img alt=(alt) src=(image.data_uri());
            }
        }
    }
}

fn top_movies_section(top_movies: &[Record], rank_by: RankBy) -> Markup {
    // The ranked value gets its own column unless it is the rating itself
    let extra_column = rank_by != RankBy::Rating;
    let precision = if rank_by == RankBy::Votes { 0 } else { 2 };

    html! {
        h2 { "Top " (top_movies.len()) " Movies by " (rank_by.to_string()) }
        table {
            tr {
                th { "#" } th { "Title" } th { "Rating" } th { "Director" } th { "Year" }
                @if extra_column { th { (rank_by.to_string()) } }
            }
            @for (i, movie) in top_movies.iter().enumerate() {
                tr {
                    td { (i + 1) }
                    td { (movie.title) }
                    td { (format!("{:.1}", movie.rating)) }
                    td { (movie.director) }
                    td { (movie.year) }
                    @if extra_column {
                        td { (format_optional(rank_by.key(movie), precision)) }
                    }
                }
            }
        }
    }
}

/// Generate the dashboard page: stats, charts, top movies and genre counts.
pub fn render_index(
    stats: &BasicStats,
    charts: &DashboardCharts,
    top_movies: &[Record],
    rank_by: RankBy,
    genre_counts: &[(String, usize)],
    ctx: &PageContext,
) -> String {
    let body = html! {
        (stats_section(stats))
        (charts_section(charts))
        (top_movies_section(top_movies, rank_by))
        @if !genre_counts.is_empty() {
            h2 { "Genres" }
            table {
                tr { th { "Genre" } th { "Movies" } }
                @for (genre, count) in genre_counts {
                    tr { td { (genre) } td { (count) } }
                }
            }
        }
    };

    layout("Movie Dashboard", body, ctx)
}

/// Generate the search results page.
pub fn render_search(query: &str, movies: &[Record], ctx: &PageContext) -> String {
    let body = html! {
        form action="/search" method="get" {
            input type="text" name="q" value=(query);
            " "
            button type="submit" { "Search" }
        }
        @if query.is_empty() {
            p { "Showing the first " (movies.len()) " movies." }
        } @else {
            p { (movies.len()) " result(s) for \u{201c}" (query) "\u{201d}." }
        }
        @if movies.is_empty() {
            p { "No movies matched." }
        } @else {
            table {
                tr {
                    th { "Title" } th { "Genre" } th { "Director" } th { "Year" }
                    th { "Runtime" } th { "Rating" } th { "Votes" } th { "Revenue (M)" }
                }
                @for movie in movies {
                    tr {
                        td { (movie.title) }
                        td { (movie.genre) }
                        td { (movie.director) }
                        td { (movie.year) }
                        td { (movie.runtime_minutes) }
                        td { (format!("{:.1}", movie.rating)) }
                        td { (movie.votes) }
                        td { (format_optional(movie.revenue_millions, 2)) }
                    }
                }
            }
        }
    };

    layout("Search", body, ctx)
}

/// Generate the director statistics page.
pub fn render_directors(summaries: &[AttributionSummary], ctx: &PageContext) -> String {
    let body = html! {
        p { (summaries.len()) " directors." }
        table {
            tr {
                th { "Director" } th { "Movies" } th { "Average rating" }
                th { "Average runtime" } th { "Average revenue (M)" }
            }
            @for s in summaries {
                tr {
                    td { (s.director) }
                    td { (s.movie_count) }
                    td { (format!("{:.2}", s.mean_rating)) }
                    td { (format!("{:.2}", s.mean_runtime)) }
                    td { (format_optional(s.mean_revenue, 2)) }
                }
            }
        }
    };

    layout("Directors", body, ctx)
}

/// Generate the genre statistics page.
pub fn render_genres(
    genre_counts: &[(String, usize)],
    genre_ratings: &BTreeMap<String, f64>,
    ctx: &PageContext,
) -> String {
    let body = html! {
        table {
            tr { th { "Genre" } th { "Movies" } th { "Average rating" } }
            @for (genre, count) in genre_counts {
                tr {
                    td { (genre) }
                    td { (count) }
                    td { (format_optional(genre_ratings.get(genre).copied(), 2)) }
                }
            }
        }
    };

    layout("Genres", body, ctx)
}
