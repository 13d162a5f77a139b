//! Aurora auction house
//!
//! Lot photos are remote: each row stores a single `image_url`. The schema
//! carries `catalogue_<type>` columns; when a catalogue type/number pair is
//! supplied it becomes the only filter and suppresses everything else.
//! Text filters use the same independent AND-sections as Adalex.

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::path::PathBuf;

use super::{
    catalogue_column, column_exists, count_lots, distinct_catalogue_numbers, filter_conditions,
    load_filter_options, select_lots, AuctionSource, SourceDb, SourceError, SqlParam, TextMode,
};
use crate::models::{FilterOptions, Lot, QuerySpec};

pub const NAME: &str = "Aurora";

pub struct AuroraSource {
    db: SourceDb,
}

impl AuroraSource {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db: SourceDb::new(NAME, db_path),
        }
    }

    /// A valid catalogue pair maps to an equality condition on the
    /// catalogue column. A pair naming a column this source does not have
    /// is treated as "no catalogue filter".
    async fn catalogue_condition(
        &self,
        pool: &SqlitePool,
        spec: &QuerySpec,
    ) -> Option<(String, SqlParam)> {
        if !spec.has_catalogue_filter() {
            return None;
        }
        let ty = spec.catalogue_type.as_deref()?;
        let number = spec.catalogue_number.as_deref()?;

        let column = match catalogue_column(ty) {
            Some(column) => column,
            None => {
                tracing::warn!("{}: invalid catalogue type {:?}, ignoring", NAME, ty);
                return None;
            }
        };
        if !column_exists(pool, &column).await {
            tracing::warn!("{}: no column {}, ignoring catalogue filter", NAME, column);
            return None;
        }

        Some((format!("{column} = ?"), SqlParam::Text(number.to_string())))
    }

    /// Catalogue lookup takes absolute priority over every other filter
    async fn conditions(
        &self,
        pool: &SqlitePool,
        spec: &QuerySpec,
    ) -> (Vec<String>, Vec<SqlParam>) {
        match self.catalogue_condition(pool, spec).await {
            Some((cond, param)) => (vec![cond], vec![param]),
            None => filter_conditions(spec, TextMode::Sections),
        }
    }

    async fn try_filtered_data(&self, spec: &QuerySpec) -> Result<Vec<Lot>, SourceError> {
        let pool = self.db.pool().await?;
        let (conds, params) = self.conditions(pool, spec).await;
        select_lots(pool, &conds, &params, spec.limit, spec.offset).await
    }

    async fn try_total_count(&self, spec: &QuerySpec) -> Result<i64, SourceError> {
        let pool = self.db.pool().await?;
        let (conds, params) = self.conditions(pool, spec).await;
        count_lots(pool, &conds, &params).await
    }
}

#[async_trait]
impl AuctionSource for AuroraSource {
    fn name(&self) -> &str {
        NAME
    }

    async fn is_available(&self) -> bool {
        self.db.pool().await.is_ok()
    }

    async fn filtered_data(&self, spec: &QuerySpec) -> Vec<Lot> {
        self.try_filtered_data(spec).await.unwrap_or_else(|e| {
            e.log(NAME, "filtered_data");
            Vec::new()
        })
    }

    async fn total_count(&self, spec: &QuerySpec) -> i64 {
        self.try_total_count(spec).await.unwrap_or_else(|e| {
            e.log(NAME, "total_count");
            0
        })
    }

    async fn filter_options(&self) -> FilterOptions {
        match self.db.pool().await {
            Ok(pool) => load_filter_options(pool).await,
            Err(_) => FilterOptions::default(),
        }
    }

    async fn lot_images(&self, lot: &Lot) -> Vec<String> {
        match lot.image_url.as_deref() {
            Some(url) if !url.is_empty() => vec![url.to_string()],
            _ => Vec::new(),
        }
    }

    async fn catalogue_numbers(&self, catalogue_type: &str) -> Vec<String> {
        match self.db.pool().await {
            Ok(pool) => distinct_catalogue_numbers(pool, catalogue_type).await,
            Err(_) => Vec::new(),
        }
    }

    async fn close(&self) {
        self.db.close().await;
    }
}
