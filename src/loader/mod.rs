//! Dataset loading with source fallback.
//!
//! Candidate sources are tried in order; the first one that yields a table
//! matching the movie schema wins. When every source fails, the embedded
//! five-movie sample is returned instead. Loading never fails past this
//! module.

use crate::config::DataConfig;
use crate::error::{DashboardError, DashboardResult};
use crate::models::{Dataset, DatasetOrigin, Record, REQUIRED_COLUMNS, REVENUE_COLUMN};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A single place the movie table may be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// A CSV file on local disk.
    File(PathBuf),
    /// A CSV document fetched over HTTP(S).
    Url(String),
    /// A directory searched for a file with the given name.
    SearchDir {
        root: PathBuf,
        file_name: String,
        max_depth: usize,
    },
}

impl DataSource {
    /// Interpret a configured source string as a URL or a file path.
    pub fn parse(spec: &str) -> Self {
        let spec = spec.trim();
        if spec.starts_with("http://") || spec.starts_with("https://") {
            DataSource::Url(spec.to_string())
        } else {
            DataSource::File(PathBuf::from(spec))
        }
    }

    /// Name used in log lines and error messages.
    pub fn describe(&self) -> String {
        match self {
            DataSource::File(path) => path.display().to_string(),
            DataSource::Url(url) => url.clone(),
            DataSource::SearchDir {
                root, file_name, ..
            } => format!("{}/**/{}", root.display(), file_name),
        }
    }
}

/// Resolved loader settings.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Sources in the order they are tried.
    pub sources: Vec<DataSource>,
    /// Timeout applied to URL sources.
    pub fetch_timeout: Duration,
}

impl From<&DataConfig> for LoaderConfig {
    fn from(config: &DataConfig) -> Self {
        let mut sources: Vec<DataSource> = config
            .sources
            .iter()
            .map(|s| DataSource::parse(s))
            .collect();

        sources.extend(config.search_dirs.iter().map(|dir| DataSource::SearchDir {
            root: PathBuf::from(dir),
            file_name: config.file_name.clone(),
            max_depth: config.search_depth,
        }));

        Self {
            sources,
            fetch_timeout: Duration::from_secs(config.fetch_timeout_seconds),
        }
    }
}

/// Loads the movie table from the first usable source.
#[derive(Debug, Clone)]
pub struct DatasetLoader {
    config: LoaderConfig,
    client: reqwest::Client,
}

impl DatasetLoader {
    /// Create a new loader.
    pub fn new(config: LoaderConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.fetch_timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build HTTP client, using defaults: {}", e);
                reqwest::Client::new()
            });

        Self { config, client }
    }

    /// Load the dataset, falling back to the embedded sample.
    pub async fn load(&self) -> Dataset {
        for source in &self.config.sources {
            match self.try_load(source).await {
                Ok(dataset) => {
                    debug!(
                        "Loaded {} movies from {}",
                        dataset.len(),
                        dataset.origin
                    );
                    return dataset;
                }
                Err(e) => warn!("{}", e),
            }
        }

        warn!("No dataset source usable, serving the embedded sample data");
        sample_dataset()
    }

    /// Attempt a single source.
    pub async fn try_load(&self, source: &DataSource) -> DashboardResult<Dataset> {
        match source {
            DataSource::File(path) => load_file(path).await,
            DataSource::Url(url) => self.fetch_url(url).await,
            DataSource::SearchDir {
                root,
                file_name,
                max_depth,
            } => {
                let found = find_in_dir(root, file_name, *max_depth).ok_or_else(|| {
                    DashboardError::unavailable(source.describe(), "no matching file found")
                })?;
                info!("Found dataset at {}", found.display());
                load_file(&found).await
            }
        }
    }

    async fn fetch_url(&self, url: &str) -> DashboardResult<Dataset> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| DashboardError::unavailable(url, e))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| DashboardError::unavailable(url, e))?;

        parse_csv(body.as_ref(), DatasetOrigin::Url(url.to_string()))
    }
}

async fn load_file(path: &Path) -> DashboardResult<Dataset> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| DashboardError::unavailable(path.display().to_string(), e))?;

    parse_csv(bytes.as_slice(), DatasetOrigin::File(path.to_path_buf()))
}

/// Find the first file called `file_name` below `root`, in name order.
fn find_in_dir(root: &Path, file_name: &str, max_depth: usize) -> Option<PathBuf> {
    WalkDir::new(root)
        .max_depth(max_depth)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| entry.file_type().is_file() && entry.file_name() == file_name)
        .map(|entry| entry.into_path())
}

/// Parse a CSV movie table, checking the header once against the schema.
pub fn parse_csv<R: Read>(reader: R, origin: DatasetOrigin) -> DashboardResult<Dataset> {
    let name = origin.to_string();
    let mut rdr = csv::ReaderBuilder::new().from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| DashboardError::schema(&name, e.to_string()))?
        .clone();

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|column| !headers.iter().any(|h| h == *column))
        .collect();
    if !missing.is_empty() {
        return Err(DashboardError::schema(
            &name,
            format!("missing columns: {}", missing.join(", ")),
        ));
    }

    let has_revenue = headers.iter().any(|h| h == REVENUE_COLUMN);

    let mut records = Vec::new();
    for (index, row) in rdr.deserialize::<Record>().enumerate() {
        let record =
            row.map_err(|e| DashboardError::schema(&name, format!("record {}: {}", index + 1, e)))?;

        if record.genre.trim().is_empty() {
            return Err(DashboardError::schema(
                &name,
                format!("record {} ({}) has an empty Genre", index + 1, record.title),
            ));
        }

        let non_finite = [
            ("Rating", Some(record.rating)),
            (REVENUE_COLUMN, record.revenue_millions),
            ("Metascore", record.metascore),
        ]
        .into_iter()
        .find(|(_, value)| value.is_some_and(|v| !v.is_finite()));
        if let Some((column, _)) = non_finite {
            return Err(DashboardError::schema(
                &name,
                format!(
                    "record {} ({}) has a non-finite {}",
                    index + 1,
                    record.title,
                    column
                ),
            ));
        }

        records.push(record);
    }

    Ok(Dataset {
        records,
        origin,
        has_revenue,
    })
}

/// The embedded five-movie table served when no source is usable.
pub fn sample_dataset() -> Dataset {
    let rows: [(&str, &str, &str, i32, u32, f64, u64, f64, f64); 5] = [
        (
            "Guardians of the Galaxy",
            "Action,Adventure,Sci-Fi",
            "James Gunn",
            2014,
            121,
            8.1,
            757074,
            333.13,
            76.0,
        ),
        (
            "Prometheus",
            "Adventure,Mystery,Sci-Fi",
            "Ridley Scott",
            2012,
            124,
            7.0,
            485820,
            126.46,
            65.0,
        ),
        (
            "Split",
            "Horror,Thriller",
            "M. Night Shyamalan",
            2016,
            117,
            7.3,
            157606,
            138.12,
            62.0,
        ),
        (
            "Sing",
            "Animation,Comedy,Family",
            "Christophe Lourdelet",
            2016,
            108,
            7.2,
            60545,
            270.32,
            59.0,
        ),
        (
            "Suicide Squad",
            "Action,Adventure,Fantasy",
            "David Ayer",
            2016,
            123,
            6.2,
            393727,
            325.02,
            40.0,
        ),
    ];

    let records = rows
        .iter()
        .zip(1u32..)
        .map(
            |(&(title, genre, director, year, runtime, rating, votes, revenue, metascore), rank)| {
                Record {
                    rank: Some(rank),
                    title: title.to_string(),
                    genre: genre.to_string(),
                    description: None,
                    director: director.to_string(),
                    actors: None,
                    year,
                    runtime_minutes: runtime,
                    rating,
                    votes,
                    revenue_millions: Some(revenue),
                    metascore: Some(metascore),
                }
            },
        )
        .collect();

    Dataset {
        records,
        origin: DatasetOrigin::Sample,
        has_revenue: true,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn fixture_path() -> PathBuf {
        PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/movies.csv"))
    }

    fn loader_for(sources: Vec<DataSource>) -> DatasetLoader {
        DatasetLoader::new(LoaderConfig {
            sources,
            fetch_timeout: Duration::from_secs(2),
        })
    }

    #[test]
    fn test_parse_source_spec() {
        assert_eq!(
            DataSource::parse("https://example.com/movies.csv"),
            DataSource::Url("https://example.com/movies.csv".to_string())
        );
        assert_eq!(
            DataSource::parse(" data/movies.csv "),
            DataSource::File(PathBuf::from("data/movies.csv"))
        );
    }

    #[test]
    fn test_loader_config_from_data_config() {
        let data = DataConfig {
            sources: vec!["a.csv".into(), "http://host/b.csv".into()],
            search_dirs: vec!["datasets".into()],
            ..DataConfig::default()
        };
        let config = LoaderConfig::from(&data);
        assert_eq!(config.sources.len(), 3);
        assert!(matches!(config.sources[1], DataSource::Url(_)));
        assert_eq!(
            config.sources[2],
            DataSource::SearchDir {
                root: PathBuf::from("datasets"),
                file_name: "IMDB-Movie-Data.csv".to_string(),
                max_depth: 3,
            }
        );
    }

    #[test]
    fn test_all_sources_absent_yields_sample() {
        let dir = tempfile::tempdir().unwrap();
        let loader = loader_for(vec![
            DataSource::File(dir.path().join("missing.csv")),
            DataSource::SearchDir {
                root: dir.path().to_path_buf(),
                file_name: "IMDB-Movie-Data.csv".to_string(),
                max_depth: 2,
            },
        ]);

        let dataset = tokio_test::block_on(loader.load());
        assert_eq!(dataset.origin, DatasetOrigin::Sample);
        assert_eq!(dataset.len(), 5);
        assert_eq!(dataset.records[0].director, "James Gunn");
        assert_eq!(dataset.records[0].title, "Guardians of the Galaxy");
        assert!(dataset.has_revenue);
    }

    #[test]
    fn test_no_sources_yields_sample() {
        let dataset = tokio_test::block_on(loader_for(Vec::new()).load());
        assert_eq!(dataset.origin, DatasetOrigin::Sample);
        assert_eq!(dataset.records, sample_dataset().records);
    }

    #[test]
    fn test_first_usable_source_wins() {
        let loader = loader_for(vec![
            DataSource::File(PathBuf::from("/nonexistent/IMDB-Movie-Data.csv")),
            DataSource::File(fixture_path()),
        ]);

        let dataset = tokio_test::block_on(loader.load());
        assert_eq!(dataset.origin, DatasetOrigin::File(fixture_path()));
        assert_eq!(dataset.len(), 12);
        assert!(dataset.has_revenue);

        let mindhorn = &dataset.records[7];
        assert_eq!(mindhorn.title, "Mindhorn");
        assert_eq!(mindhorn.revenue_millions, None);
        assert_eq!(mindhorn.metascore, Some(71.0));
        assert!(mindhorn
            .description
            .as_deref()
            .unwrap_or_default()
            .contains("\"Mindhorn\""));
    }

    #[test]
    fn test_schema_mismatch_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.csv");
        std::fs::write(&bad, "Title,Genre,Director\nSplit,Horror,M. Night Shyamalan\n").unwrap();

        let loader = loader_for(vec![DataSource::File(bad.clone())]);
        let err = tokio_test::block_on(loader.try_load(&DataSource::File(bad))).unwrap_err();
        match err {
            DashboardError::SchemaMismatch { detail, .. } => {
                assert!(detail.contains("Year"));
                assert!(detail.contains("Rating"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let dataset = tokio_test::block_on(loader.load());
        assert_eq!(dataset.origin, DatasetOrigin::Sample);
    }

    #[test]
    fn test_optional_columns_may_be_absent() {
        let csv = "Title,Genre,Director,Year,Runtime (Minutes),Rating,Votes\n\
                   Split,\"Horror,Thriller\",M. Night Shyamalan,2016,117,7.3,157606\n";
        let dataset = parse_csv(csv.as_bytes(), DatasetOrigin::Sample).unwrap();
        assert_eq!(dataset.len(), 1);
        assert!(!dataset.has_revenue);
        assert_eq!(dataset.records[0].rank, None);
        assert_eq!(dataset.records[0].revenue_millions, None);
        assert_eq!(dataset.records[0].genre, "Horror,Thriller");
    }

    #[test]
    fn test_malformed_rows_are_rejected() {
        let header = "Title,Genre,Director,Year,Runtime (Minutes),Rating,Votes\n";

        let bad_number = format!("{header}Split,Horror,M. Night Shyamalan,2016,long,7.3,1\n");
        assert!(matches!(
            parse_csv(bad_number.as_bytes(), DatasetOrigin::Sample),
            Err(DashboardError::SchemaMismatch { .. })
        ));

        let empty_genre = format!("{header}Split,,M. Night Shyamalan,2016,117,7.3,1\n");
        let err = parse_csv(empty_genre.as_bytes(), DatasetOrigin::Sample).unwrap_err();
        assert!(err.to_string().contains("empty Genre"));
    }

    #[test]
    fn test_non_finite_numbers_are_rejected() {
        let header = "Title,Genre,Director,Year,Runtime (Minutes),Rating,Votes,Revenue (Millions),Metascore\n";

        let nan_rating = format!("{header}Split,Horror,M. Night Shyamalan,2016,117,NaN,1,,\n");
        let err = parse_csv(nan_rating.as_bytes(), DatasetOrigin::Sample).unwrap_err();
        assert!(matches!(err, DashboardError::SchemaMismatch { .. }));
        assert!(err.to_string().contains("non-finite Rating"));

        let inf_revenue = format!("{header}Split,Horror,M. Night Shyamalan,2016,117,7.3,1,inf,62\n");
        let err = parse_csv(inf_revenue.as_bytes(), DatasetOrigin::Sample).unwrap_err();
        assert!(err.to_string().contains("non-finite Revenue (Millions)"));

        let finite = format!("{header}Split,Horror,M. Night Shyamalan,2016,117,7.3,1,,62\n");
        let dataset = parse_csv(finite.as_bytes(), DatasetOrigin::Sample).unwrap();
        assert_eq!(dataset.records[0].metascore, Some(62.0));
    }

    #[test]
    fn test_nan_source_falls_back_to_next() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("nan.csv");
        std::fs::write(
            &bad,
            "Title,Genre,Director,Year,Runtime (Minutes),Rating,Votes\n\
             Split,Horror,M. Night Shyamalan,2016,117,NaN,157606\n",
        )
        .unwrap();

        let loader = loader_for(vec![DataSource::File(bad), DataSource::File(fixture_path())]);
        let dataset = tokio_test::block_on(loader.load());
        assert_eq!(dataset.origin, DatasetOrigin::File(fixture_path()));
        assert!(dataset.records.iter().all(|r| r.rating.is_finite()));
    }

    #[test]
    fn test_empty_document_is_schema_mismatch() {
        assert!(matches!(
            parse_csv("".as_bytes(), DatasetOrigin::Sample),
            Err(DashboardError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_search_dir_finds_nested_file() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("book").join("src");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::copy(fixture_path(), nested.join("IMDB-Movie-Data.csv")).unwrap();

        let source = DataSource::SearchDir {
            root: dir.path().to_path_buf(),
            file_name: "IMDB-Movie-Data.csv".to_string(),
            max_depth: 3,
        };
        let dataset = tokio_test::block_on(loader_for(vec![]).try_load(&source)).unwrap();
        assert_eq!(dataset.len(), 12);

        let shallow = DataSource::SearchDir {
            root: dir.path().to_path_buf(),
            file_name: "IMDB-Movie-Data.csv".to_string(),
            max_depth: 1,
        };
        assert!(matches!(
            tokio_test::block_on(loader_for(vec![]).try_load(&shallow)),
            Err(DashboardError::SourceUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_url_falls_back() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let loader = loader_for(vec![DataSource::Url(format!("http://{addr}/movies.csv"))]);
        let dataset = loader.load().await;
        assert_eq!(dataset.origin, DatasetOrigin::Sample);
    }
}
