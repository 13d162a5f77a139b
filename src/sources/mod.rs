//! Auction source adapters
//!
//! One adapter per auction house, all behind the [`AuctionSource`] trait.
//! The houses share a conceptual `lots` table but differ in column sets,
//! image storage (local directory vs. remote URL) and text-search
//! semantics, so each adapter owns its own SQL construction on top of the
//! shared helpers here.
//!
//! Degradation contract: a missing database, a malformed catalogue filter
//! or a failed query never reaches the caller. Every public operation falls
//! back to an empty result and logs instead.

pub mod adalex;
pub mod aurora;
pub mod redkie;

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use std::path::PathBuf;
use tokio::sync::OnceCell;

use crate::models::{FilterOptions, Lot, QuerySpec};
use crate::search::normalize_query;

pub use adalex::AdalexSource;
pub use aurora::AuroraSource;
pub use redkie::RedkieMonetySource;

/// Adapter-internal failure taxonomy. Absorbed before the trait boundary.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("backing store unavailable")]
    Unavailable,
    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
}

impl SourceError {
    /// Log at a level matching severity; unavailability was already
    /// reported when the store was first probed.
    pub(crate) fn log(&self, source: &str, operation: &str) {
        match self {
            SourceError::Unavailable => {
                tracing::debug!("{}: {} skipped, store unavailable", source, operation)
            }
            SourceError::Query(e) => {
                tracing::warn!("{}: {} failed: {}", source, operation, e)
            }
        }
    }
}

/// Common interface over heterogeneous auction-house schemas
#[async_trait]
pub trait AuctionSource: Send + Sync {
    /// Display name; also the tag the aggregator stamps on combined rows
    fn name(&self) -> &str;

    /// Whether the backing store responds
    async fn is_available(&self) -> bool;

    /// Matching lots. `spec.limit == None` returns every matching row,
    /// unpaginated, which the aggregator relies on for merged pagination.
    async fn filtered_data(&self, spec: &QuerySpec) -> Vec<Lot>;

    /// Scalar count over the identical predicate as [`filtered_data`],
    /// never paginated.
    ///
    /// [`filtered_data`]: AuctionSource::filtered_data
    async fn total_count(&self, spec: &QuerySpec) -> i64;

    /// Distinct non-null metals, years and categories, ascending
    async fn filter_options(&self) -> FilterOptions;

    /// Resolved image locations for one lot, in display order
    async fn lot_images(&self, lot: &Lot) -> Vec<String>;

    /// Distinct numbers for a catalogue type. Sources without catalogue
    /// columns contribute nothing.
    async fn catalogue_numbers(&self, _catalogue_type: &str) -> Vec<String> {
        Vec::new()
    }

    /// Close the backing connection pool
    async fn close(&self);
}

/// Lazily-opened read-only connection to one house database.
/// A missing file leaves the source permanently degraded.
pub(crate) struct SourceDb {
    name: &'static str,
    path: PathBuf,
    pool: OnceCell<Option<SqlitePool>>,
}

impl SourceDb {
    pub(crate) fn new(name: &'static str, path: impl Into<PathBuf>) -> Self {
        Self {
            name,
            path: path.into(),
            pool: OnceCell::new(),
        }
    }

    pub(crate) async fn pool(&self) -> Result<&SqlitePool, SourceError> {
        let slot = self
            .pool
            .get_or_init(|| async {
                if !self.path.is_file() {
                    tracing::warn!("{}: database not found at {:?}", self.name, self.path);
                    return None;
                }
                let url = format!("sqlite:{}?mode=ro", self.path.to_string_lossy());
                match SqlitePoolOptions::new().max_connections(2).connect(&url).await {
                    Ok(pool) => Some(pool),
                    Err(e) => {
                        tracing::warn!("{}: failed to open {:?}: {}", self.name, self.path, e);
                        None
                    }
                }
            })
            .await;
        slot.as_ref().ok_or(SourceError::Unavailable)
    }

    pub(crate) async fn close(&self) {
        if let Some(Some(pool)) = self.pool.get() {
            pool.close().await;
        }
    }
}

/// Bind parameter for dynamically assembled SQL
pub(crate) enum SqlParam {
    Int(i64),
    Text(String),
}

/// Per-source free-text matching semantics. The divergence between the
/// houses is deliberate and preserved; see DESIGN.md.
pub(crate) enum TextMode {
    /// Title and description are independent AND-sections: every token
    /// supplied for a field must be a substring of that field.
    Sections,
    /// Every token must be a substring of title OR description; tokens
    /// are still AND-ed together.
    EitherField,
}

/// Build WHERE conditions for year / metal / category / text filters.
///
/// Text matching relies on SQLite's LOWER, which folds ASCII only, so
/// non-Latin query text matches case-sensitively.
pub(crate) fn filter_conditions(spec: &QuerySpec, mode: TextMode) -> (Vec<String>, Vec<SqlParam>) {
    let mut conds = Vec::new();
    let mut params = Vec::new();

    if let Some(year) = spec.year {
        conds.push("year = ?".to_string());
        params.push(SqlParam::Int(year));
    }

    if !spec.metals.is_empty() {
        let placeholders = vec!["?"; spec.metals.len()].join(",");
        conds.push(format!("metal IN ({placeholders})"));
        params.extend(spec.metals.iter().cloned().map(SqlParam::Text));
    }

    if !spec.categories.is_empty() {
        let placeholders = vec!["?"; spec.categories.len()].join(",");
        conds.push(format!("category IN ({placeholders})"));
        params.extend(spec.categories.iter().cloned().map(SqlParam::Text));
    }

    match mode {
        TextMode::Sections => {
            push_section(&mut conds, &mut params, "title", spec.search_title.as_deref());
            push_section(
                &mut conds,
                &mut params,
                "description",
                spec.search_description.as_deref(),
            );
        }
        TextMode::EitherField => {
            let mut tokens = normalize_query(spec.search_title.as_deref().unwrap_or(""));
            for token in normalize_query(spec.search_description.as_deref().unwrap_or("")) {
                if !tokens.contains(&token) {
                    tokens.push(token);
                }
            }
            if !tokens.is_empty() {
                let group = vec![
                    "(LOWER(COALESCE(title, '')) LIKE ? OR LOWER(COALESCE(description, '')) LIKE ?)";
                    tokens.len()
                ];
                conds.push(format!("({})", group.join(" AND ")));
                for token in tokens {
                    let pattern = format!("%{token}%");
                    params.push(SqlParam::Text(pattern.clone()));
                    params.push(SqlParam::Text(pattern));
                }
            }
        }
    }

    (conds, params)
}

/// One AND-section of per-token substring matches against a single column.
/// No tokens means no condition, never "match nothing".
fn push_section(
    conds: &mut Vec<String>,
    params: &mut Vec<SqlParam>,
    column: &str,
    query: Option<&str>,
) {
    let tokens = normalize_query(query.unwrap_or(""));
    if tokens.is_empty() {
        return;
    }
    let group = vec![format!("LOWER(COALESCE({column}, '')) LIKE ?"); tokens.len()];
    conds.push(format!("({})", group.join(" AND ")));
    params.extend(
        tokens
            .into_iter()
            .map(|token| SqlParam::Text(format!("%{token}%"))),
    );
}

/// SELECT matching lots; pagination is appended only when a limit is given
pub(crate) async fn select_lots(
    pool: &SqlitePool,
    conds: &[String],
    params: &[SqlParam],
    limit: Option<i64>,
    offset: i64,
) -> Result<Vec<Lot>, SourceError> {
    let mut sql = String::from("SELECT * FROM lots");
    if !conds.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conds.join(" AND "));
    }
    if limit.is_some() {
        sql.push_str(" LIMIT ? OFFSET ?");
    }

    let mut query = sqlx::query(&sql);
    for param in params {
        query = match param {
            SqlParam::Int(v) => query.bind(*v),
            SqlParam::Text(s) => query.bind(s.as_str()),
        };
    }
    if let Some(limit) = limit {
        query = query.bind(limit).bind(offset);
    }

    let rows = query.fetch_all(pool).await?;
    Ok(rows.iter().map(Lot::from_row).collect())
}

/// COUNT(*) over the same predicate as [`select_lots`]
pub(crate) async fn count_lots(
    pool: &SqlitePool,
    conds: &[String],
    params: &[SqlParam],
) -> Result<i64, SourceError> {
    let mut sql = String::from("SELECT COUNT(*) FROM lots");
    if !conds.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conds.join(" AND "));
    }

    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for param in params {
        query = match param {
            SqlParam::Int(v) => query.bind(*v),
            SqlParam::Text(s) => query.bind(s.as_str()),
        };
    }

    Ok(query.fetch_one(pool).await?)
}

/// Distinct non-null filter values, each list ascending. A list whose
/// column is missing from the schema stays empty.
pub(crate) async fn load_filter_options(pool: &SqlitePool) -> FilterOptions {
    async fn texts(pool: &SqlitePool, sql: &str) -> Vec<String> {
        match sqlx::query_scalar::<_, String>(sql).fetch_all(pool).await {
            Ok(values) => values,
            Err(e) => {
                tracing::debug!("Filter option query failed: {}", e);
                Vec::new()
            }
        }
    }

    let metals = texts(
        pool,
        "SELECT DISTINCT metal FROM lots WHERE metal IS NOT NULL ORDER BY metal",
    )
    .await;
    let categories = texts(
        pool,
        "SELECT DISTINCT category FROM lots WHERE category IS NOT NULL ORDER BY category",
    )
    .await;
    let years = match sqlx::query_scalar::<_, i64>(
        "SELECT DISTINCT year FROM lots WHERE year IS NOT NULL ORDER BY year",
    )
    .fetch_all(pool)
    .await
    {
        Ok(values) => values,
        Err(e) => {
            tracing::debug!("Filter option query failed: {}", e);
            Vec::new()
        }
    };

    FilterOptions {
        metals,
        years,
        categories,
    }
}

/// Map a catalogue type to its column name. Only ascii alphanumerics and
/// underscores are accepted; the name is interpolated into SQL.
pub(crate) fn catalogue_column(catalogue_type: &str) -> Option<String> {
    let ty = catalogue_type.trim().to_lowercase();
    if ty.is_empty() || !ty.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return None;
    }
    Some(format!("catalogue_{ty}"))
}

/// Whether the lots table carries a column, via PRAGMA table_info
pub(crate) async fn column_exists(pool: &SqlitePool, column: &str) -> bool {
    let rows = match sqlx::query("PRAGMA table_info(lots)").fetch_all(pool).await {
        Ok(rows) => rows,
        Err(_) => return false,
    };
    rows.iter()
        .any(|row| row.get::<String, _>("name") == column)
}

/// Distinct values of one catalogue column, ascending; empty when the
/// column does not exist in this source.
pub(crate) async fn distinct_catalogue_numbers(
    pool: &SqlitePool,
    catalogue_type: &str,
) -> Vec<String> {
    let Some(column) = catalogue_column(catalogue_type) else {
        return Vec::new();
    };
    if !column_exists(pool, &column).await {
        return Vec::new();
    }
    let sql =
        format!("SELECT DISTINCT {column} FROM lots WHERE {column} IS NOT NULL ORDER BY {column}");
    sqlx::query_scalar::<_, String>(&sql)
        .fetch_all(pool)
        .await
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use sqlx::sqlite::SqlitePoolOptions;
    use std::path::Path;

    /// Adalex-style schema: image directory on disk, no catalogue columns
    pub(crate) const ADALEX_SCHEMA: &str = r#"
        CREATE TABLE lots (
            id INTEGER PRIMARY KEY,
            lot_number TEXT,
            title TEXT,
            description TEXT,
            year INTEGER,
            metal TEXT,
            category TEXT,
            close_date TEXT,
            start_price_rub REAL,
            start_price_usd REAL,
            start_price_eur REAL,
            final_price_rub REAL,
            final_price_usd REAL,
            final_price_eur REAL,
            image_dir TEXT,
            lot_url TEXT
        )
    "#;

    /// Aurora-style schema: remote image URL plus a catalogue column
    pub(crate) const AURORA_SCHEMA: &str = r#"
        CREATE TABLE lots (
            id INTEGER PRIMARY KEY,
            lot_number TEXT,
            title TEXT,
            description TEXT,
            year INTEGER,
            metal TEXT,
            category TEXT,
            close_date TEXT,
            start_price_rub REAL,
            start_price_usd REAL,
            start_price_eur REAL,
            final_price_rub REAL,
            final_price_usd REAL,
            final_price_eur REAL,
            image_url TEXT,
            catalogue_bitkin TEXT,
            lot_url TEXT
        )
    "#;

    /// Redkie Monety schema: remote image URL, no catalogue columns
    pub(crate) const REDKIE_SCHEMA: &str = r#"
        CREATE TABLE lots (
            id INTEGER PRIMARY KEY,
            title TEXT,
            description TEXT,
            year INTEGER,
            metal TEXT,
            category TEXT,
            close_date TEXT,
            final_price_rub REAL,
            final_price_usd REAL,
            final_price_eur REAL,
            image_url TEXT,
            lot_url TEXT
        )
    "#;

    /// Create a fixture database file and close it again; adapters reopen
    /// it read-only.
    pub(crate) async fn create_db(path: &Path, schema: &str, inserts: &[&str]) {
        let url = format!("sqlite:{}?mode=rwc", path.to_string_lossy());
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .expect("open fixture db");
        sqlx::query(schema).execute(&pool).await.expect("create schema");
        for stmt in inserts {
            sqlx::query(stmt).execute(&pool).await.expect("insert fixture row");
        }
        pool.close().await;
    }
}
