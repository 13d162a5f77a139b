//! Redkie Monety auction house
//!
//! Lot photos are remote (`image_url`). Text search diverges from the
//! other houses: every token must match title OR description, instead of
//! the per-field AND-sections. The divergence is preserved on purpose;
//! see DESIGN.md.

use async_trait::async_trait;
use std::path::PathBuf;

use super::{
    count_lots, filter_conditions, load_filter_options, select_lots, AuctionSource, SourceDb,
    SourceError, TextMode,
};
use crate::models::{FilterOptions, Lot, QuerySpec};

pub const NAME: &str = "Redkie Monety";

pub struct RedkieMonetySource {
    db: SourceDb,
}

impl RedkieMonetySource {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db: SourceDb::new(NAME, db_path),
        }
    }

    async fn try_filtered_data(&self, spec: &QuerySpec) -> Result<Vec<Lot>, SourceError> {
        let pool = self.db.pool().await?;
        let (conds, params) = filter_conditions(spec, TextMode::EitherField);
        select_lots(pool, &conds, &params, spec.limit, spec.offset).await
    }

    async fn try_total_count(&self, spec: &QuerySpec) -> Result<i64, SourceError> {
        let pool = self.db.pool().await?;
        let (conds, params) = filter_conditions(spec, TextMode::EitherField);
        count_lots(pool, &conds, &params).await
    }
}

#[async_trait]
impl AuctionSource for RedkieMonetySource {
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

    async fn close(&self) {
        self.db.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{create_db, REDKIE_SCHEMA};
    use super::*;

    const ROWS: &[&str] = &[
        "INSERT INTO lots (id, title, description, year, metal, close_date, final_price_rub, image_url) \
         VALUES (1, 'орел медный', 'хорошее состояние', 1766, 'copper', '2024-06-01', 1200, 'https://rm.example/1.jpg')",
        "INSERT INTO lots (id, title, description, year, metal, close_date, final_price_rub, image_url) \
         VALUES (2, 'рубль серебряный', 'орел на реверсе', 1766, 'silver', '2024-06-02', 5600, 'https://rm.example/2.jpg')",
        "INSERT INTO lots (id, title, description, year, metal, close_date, final_price_rub, image_url) \
         VALUES (3, 'жетон', 'бронза', 1900, 'bronze', '2024-06-03', 300, NULL)",
    ];

    async fn source_with_rows() -> (tempfile::TempDir, RedkieMonetySource) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("lots.db");
        create_db(&db_path, REDKIE_SCHEMA, ROWS).await;
        (dir, RedkieMonetySource::new(db_path))
    }

    #[tokio::test]
    async fn test_tokens_match_either_field() {
        let (_dir, source) = source_with_rows().await;

        // "орел" is in row 1's title and row 2's description; both match
        let spec = QuerySpec {
            search_title: Some("орел".to_string()),
            ..QuerySpec::default()
        };
        let lots = source.filtered_data(&spec).await;
        let ids: Vec<Option<i64>> = lots.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![Some(1), Some(2)]);
    }

    #[tokio::test]
    async fn test_tokens_still_conjoined() {
        let (_dir, source) = source_with_rows().await;

        // "орел" + "состояние" both present only for row 1 (one per field)
        let spec = QuerySpec {
            search_title: Some("орел состояние".to_string()),
            ..QuerySpec::default()
        };
        let lots = source.filtered_data(&spec).await;
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].id, Some(1));

        // tokens from both search fields are pooled
        let spec = QuerySpec {
            search_title: Some("орел".to_string()),
            search_description: Some("состояние".to_string()),
            ..QuerySpec::default()
        };
        let lots = source.filtered_data(&spec).await;
        assert_eq!(lots.len(), 1);
        assert_eq!(source.total_count(&spec).await, 1);
    }

    #[tokio::test]
    async fn test_count_matches_fetch_across_specs() {
        let (_dir, source) = source_with_rows().await;
        let specs = [
            QuerySpec::default(),
            QuerySpec {
                year: Some(1766),
                ..QuerySpec::default()
            },
            QuerySpec {
                metals: vec!["silver".to_string(), "bronze".to_string()],
                ..QuerySpec::default()
            },
            QuerySpec {
                search_description: Some("орел".to_string()),
                ..QuerySpec::default()
            },
        ];

        for spec in specs {
            let fetched = source.filtered_data(&spec.unpaginated()).await.len() as i64;
            assert_eq!(source.total_count(&spec).await, fetched, "spec {spec:?}");
        }
    }
}
