//! Adalex auction house
//!
//! Lot photos live on the local filesystem: each row's `image_dir` points
//! at a directory of JPEG files. Title and description text filters are
//! independent AND-sections. No catalogue columns.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{
    count_lots, filter_conditions, load_filter_options, select_lots, AuctionSource, SourceDb,
    SourceError, TextMode,
};
use crate::images;
use crate::models::{FilterOptions, Lot, QuerySpec};

pub const NAME: &str = "Adalex";

pub struct AdalexSource {
    db: SourceDb,
}

impl AdalexSource {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db: SourceDb::new(NAME, db_path),
        }
    }

    async fn try_filtered_data(&self, spec: &QuerySpec) -> Result<Vec<Lot>, SourceError> {
        let pool = self.db.pool().await?;
        let (conds, params) = filter_conditions(spec, TextMode::Sections);
        select_lots(pool, &conds, &params, spec.limit, spec.offset).await
    }

    async fn try_total_count(&self, spec: &QuerySpec) -> Result<i64, SourceError> {
        let pool = self.db.pool().await?;
        let (conds, params) = filter_conditions(spec, TextMode::Sections);
        count_lots(pool, &conds, &params).await
    }
}

#[async_trait]
impl AuctionSource for AdalexSource {
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
        match lot.image_dir.as_deref() {
            Some(dir) if !dir.is_empty() => images::list_local_images(Path::new(dir)).await,
            _ => Vec::new(),
        }
    }

    async fn close(&self) {
        self.db.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::{create_db, ADALEX_SCHEMA};
    use super::*;

    // Cyrillic fixture text is kept lowercase: SQLite's LOWER folds ASCII
    // only, so non-Latin text matches case-sensitively
    const ROWS: &[&str] = &[
        "INSERT INTO lots (id, title, description, year, metal, category, close_date, final_price_rub, final_price_usd, image_dir) \
         VALUES (1, 'рубль 1900 орел', 'серебро, хорошее состояние', 1900, 'silver', 'coin', '2024-03-01', 5000, 55, 'data/adalex/images/lot_1')",
        "INSERT INTO lots (id, title, description, year, metal, category, close_date, final_price_rub, final_price_usd, image_dir) \
         VALUES (2, 'полтина 1900 орел', 'потертости', 1900, 'silver', 'coin', '2024-02-01', 3000, 33, NULL)",
        "INSERT INTO lots (id, title, description, year, metal, category, close_date, final_price_rub, final_price_usd, image_dir) \
         VALUES (3, 'рубль 1900, орел на реверсе', NULL, 1900, 'silver', 'medal', '2024-01-01', 8000, 88, NULL)",
        "INSERT INTO lots (id, title, description, year, metal, category, close_date, final_price_rub, final_price_usd, image_dir) \
         VALUES (4, 'копейка 1812', 'медь', 1812, 'copper', 'coin', '2023-12-01', 100, 1, NULL)",
    ];

    async fn source_with_rows() -> (tempfile::TempDir, AdalexSource) {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("lots.db");
        create_db(&db_path, ADALEX_SCHEMA, ROWS).await;
        (dir, AdalexSource::new(db_path))
    }

    #[tokio::test]
    async fn test_missing_db_degrades_to_empty() {
        let source = AdalexSource::new("/no/such/dir/lots.db");
        assert!(!source.is_available().await);
        assert!(source.filtered_data(&QuerySpec::default()).await.is_empty());
        assert_eq!(source.total_count(&QuerySpec::default()).await, 0);
        assert_eq!(source.filter_options().await, FilterOptions::default());
    }

    #[tokio::test]
    async fn test_year_metal_and_text_filter() {
        let (_dir, source) = source_with_rows().await;
        let spec = QuerySpec {
            year: Some(1900),
            metals: vec!["silver".to_string()],
            search_title: Some("орел".to_string()),
            ..QuerySpec::default()
        };

        let lots = source.filtered_data(&spec).await;
        assert_eq!(lots.len(), 3);
        assert_eq!(source.total_count(&spec).await, lots.len() as i64);
    }

    #[tokio::test]
    async fn test_pagination_applied_only_with_limit() {
        let (_dir, source) = source_with_rows().await;
        let spec = QuerySpec {
            year: Some(1900),
            metals: vec!["silver".to_string()],
            search_title: Some("орел".to_string()),
            limit: Some(2),
            offset: 0,
            ..QuerySpec::default()
        };

        assert_eq!(source.filtered_data(&spec).await.len(), 2);

        let rest = QuerySpec {
            offset: 2,
            ..spec.clone()
        };
        assert_eq!(source.filtered_data(&rest).await.len(), 1);

        // count ignores pagination
        assert_eq!(source.total_count(&spec).await, 3);
    }

    #[tokio::test]
    async fn test_title_and_description_sections_are_independent() {
        let (_dir, source) = source_with_rows().await;

        // "орел" appears in titles only; as a description filter it must
        // not match those rows
        let spec = QuerySpec {
            search_description: Some("орел".to_string()),
            ..QuerySpec::default()
        };
        assert!(source.filtered_data(&spec).await.is_empty());

        // every token of a section must match that section
        let spec = QuerySpec {
            search_title: Some("рубль орел".to_string()),
            ..QuerySpec::default()
        };
        let lots = source.filtered_data(&spec).await;
        assert_eq!(lots.len(), 2);

        // both sections active: conjunction across sections
        let spec = QuerySpec {
            search_title: Some("рубль".to_string()),
            search_description: Some("серебро".to_string()),
            ..QuerySpec::default()
        };
        let lots = source.filtered_data(&spec).await;
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].id, Some(1));
    }

    #[tokio::test]
    async fn test_filter_options_distinct_sorted() {
        let (_dir, source) = source_with_rows().await;
        let options = source.filter_options().await;
        assert_eq!(options.metals, vec!["copper".to_string(), "silver".to_string()]);
        assert_eq!(options.years, vec![1812, 1900]);
        assert_eq!(options.categories, vec!["coin".to_string(), "medal".to_string()]);
    }

    #[tokio::test]
    async fn test_catalogue_pair_is_ignored_without_columns() {
        // Adalex has no catalogue columns; the pair must not poison the query
        let (_dir, source) = source_with_rows().await;
        let spec = QuerySpec {
            catalogue_type: Some("bitkin".to_string()),
            catalogue_number: Some("45".to_string()),
            year: Some(1812),
            ..QuerySpec::default()
        };
        let lots = source.filtered_data(&spec).await;
        assert_eq!(lots.len(), 1);
        assert_eq!(lots[0].id, Some(4));
    }

    #[tokio::test]
    async fn test_lot_images_from_directory() {
        let (_dir, source) = source_with_rows().await;

        let images_dir = tempfile::tempdir().unwrap();
        for name in ["02.jpg", "01.jpg"] {
            std::fs::write(images_dir.path().join(name), b"jpeg").unwrap();
        }

        let lot = Lot {
            image_dir: Some(images_dir.path().to_string_lossy().to_string()),
            ..Lot::default()
        };
        let images = source.lot_images(&lot).await;
        assert_eq!(images.len(), 2);
        assert!(images[0].ends_with("01.jpg"));
        assert!(images[1].ends_with("02.jpg"));

        // absent directory reference
        assert!(source.lot_images(&Lot::default()).await.is_empty());
    }
}
