use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// One auction lot row. Any attribute may be absent in a source's schema;
/// absence means "unknown", never zero or empty string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub id: Option<i64>,
    pub lot_number: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub year: Option<i64>,
    pub metal: Option<String>,
    pub category: Option<String>,
    pub close_date: Option<String>,
    pub start_price_rub: Option<f64>,
    pub start_price_usd: Option<f64>,
    pub start_price_eur: Option<f64>,
    pub final_price_rub: Option<f64>,
    pub final_price_usd: Option<f64>,
    pub final_price_eur: Option<f64>,
    pub image_dir: Option<String>,
    pub image_url: Option<String>,
    pub lot_url: Option<String>,
    /// Source tag stamped by the aggregator on combined result rows
    #[serde(default)]
    pub source: Option<String>,
}

impl Lot {
    /// Decode a row from any house schema. Columns a source does not have
    /// come back as `None`.
    pub fn from_row(row: &SqliteRow) -> Self {
        fn get<'r, T>(row: &'r SqliteRow, column: &str) -> Option<T>
        where
            T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
        {
            row.try_get::<Option<T>, _>(column).ok().flatten()
        }

        Self {
            id: get(row, "id"),
            lot_number: get(row, "lot_number"),
            title: get(row, "title"),
            description: get(row, "description"),
            year: get(row, "year"),
            metal: get(row, "metal"),
            category: get(row, "category"),
            close_date: get(row, "close_date"),
            start_price_rub: get(row, "start_price_rub"),
            start_price_usd: get(row, "start_price_usd"),
            start_price_eur: get(row, "start_price_eur"),
            final_price_rub: get(row, "final_price_rub"),
            final_price_usd: get(row, "final_price_usd"),
            final_price_eur: get(row, "final_price_eur"),
            image_dir: get(row, "image_dir"),
            image_url: get(row, "image_url"),
            // some houses store the lot page link as "url" instead
            lot_url: get::<String>(row, "lot_url").or_else(|| get(row, "url")),
            source: None,
        }
    }
}

/// Display/sort currency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Rub,
    Usd,
    Eur,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Rub => "RUB",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }

    pub fn start_price(&self, lot: &Lot) -> Option<f64> {
        match self {
            Currency::Rub => lot.start_price_rub,
            Currency::Usd => lot.start_price_usd,
            Currency::Eur => lot.start_price_eur,
        }
    }

    pub fn final_price(&self, lot: &Lot) -> Option<f64> {
        match self {
            Currency::Rub => lot.final_price_rub,
            Currency::Usd => lot.final_price_usd,
            Currency::Eur => lot.final_price_eur,
        }
    }
}

/// Sort key for combined results. An unrecognized wire value falls back
/// to the default order rather than failing the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    PriceHigh,
    PriceLow,
    DateOld,
    YearDesc,
    YearAsc,
    #[default]
    #[serde(other)]
    DateRecent,
}

/// Caller-supplied filter parameters, constructed per request.
/// Carries no session state; everything a query needs arrives explicitly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySpec {
    pub year: Option<i64>,
    pub metals: Vec<String>,
    pub categories: Vec<String>,
    pub search_title: Option<String>,
    pub search_description: Option<String>,
    pub catalogue_type: Option<String>,
    pub catalogue_number: Option<String>,
    pub currency: Currency,
    pub sort_by: SortKey,
    /// None means "every matching row, unpaginated"
    pub limit: Option<i64>,
    pub offset: i64,
}

impl QuerySpec {
    /// Copy of this spec with pagination stripped, for the aggregator's
    /// merge-then-paginate fetch.
    pub fn unpaginated(&self) -> QuerySpec {
        QuerySpec {
            limit: None,
            offset: 0,
            ..self.clone()
        }
    }

    /// Whether a complete catalogue type/number pair was supplied
    pub fn has_catalogue_filter(&self) -> bool {
        let has = |v: &Option<String>| v.as_deref().map_or(false, |s| !s.trim().is_empty());
        has(&self.catalogue_type) && has(&self.catalogue_number)
    }
}

/// Distinct filter values present in a source, for selection menus.
/// Recomputed per query, read-only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub metals: Vec<String>,
    pub years: Vec<i64>,
    pub categories: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_sort_keys_round_trip() {
        let spec: QuerySpec = serde_json::from_str(r#"{"sort_by": "year_desc"}"#).unwrap();
        assert_eq!(spec.sort_by, SortKey::YearDesc);
    }

    #[test]
    fn test_unknown_sort_key_falls_back_to_default() {
        let spec: QuerySpec = serde_json::from_str(r#"{"sort_by": "shiniest_first"}"#).unwrap();
        assert_eq!(spec.sort_by, SortKey::DateRecent);
    }
}
