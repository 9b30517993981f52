//! Page generation for the dashboard.

pub mod pages;

pub use pages::{render_directors, render_genres, render_index, render_search, PageContext};
