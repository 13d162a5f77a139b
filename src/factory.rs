//! Multi-source aggregator
//!
//! Holds every auction-source adapter, probes availability once at
//! construction, and fans filter/count/data requests out across a
//! caller-selected subset. Combined data is fetched unpaginated from each
//! source, concatenated in selection order, globally re-sorted, then
//! re-paginated. Merged pagination is only correct when every matching
//! row of every source is present before the sort.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::models::{Currency, FilterOptions, Lot, QuerySpec, SortKey};
use crate::sources::{AdalexSource, AuctionSource, AuroraSource, RedkieMonetySource};

pub struct AuctionFactory {
    /// Registration order; combined results concatenate in this order
    sources: Vec<Arc<dyn AuctionSource>>,
    /// Probed once here; stale until the process restarts, by design
    available: Vec<String>,
}

impl AuctionFactory {
    /// Build the adapters named in the configuration
    pub async fn from_config(config: &AppConfig) -> Self {
        let mut sources: Vec<Arc<dyn AuctionSource>> = Vec::new();
        for entry in &config.sources {
            let db_path = config.source_db_path(entry);
            match entry.name.as_str() {
                crate::sources::adalex::NAME => {
                    sources.push(Arc::new(AdalexSource::new(db_path)))
                }
                crate::sources::aurora::NAME => {
                    sources.push(Arc::new(AuroraSource::new(db_path)))
                }
                crate::sources::redkie::NAME => {
                    sources.push(Arc::new(RedkieMonetySource::new(db_path)))
                }
                other => tracing::warn!("Unknown auction source in config: {}", other),
            }
        }
        Self::with_sources(sources).await
    }

    /// Probe each adapter's backing store and record the responders
    pub async fn with_sources(sources: Vec<Arc<dyn AuctionSource>>) -> Self {
        let mut available = Vec::new();
        for source in &sources {
            if source.is_available().await {
                available.push(source.name().to_string());
            }
        }
        Self { sources, available }
    }

    /// Sources whose backing store responded at construction time
    pub fn available_sources(&self) -> &[String] {
        &self.available
    }

    /// Look up one adapter by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn AuctionSource>> {
        self.sources.iter().find(|source| source.name() == name)
    }

    fn selected_available<'a>(
        &'a self,
        selected: &'a [String],
    ) -> impl Iterator<Item = &'a Arc<dyn AuctionSource>> {
        selected
            .iter()
            .filter(|name| self.available.contains(name))
            .filter_map(|name| self.get(name))
    }

    /// Set-union of the per-source option lists, each ascending
    pub async fn combined_filter_options(&self, selected: &[String]) -> FilterOptions {
        let mut metals = BTreeSet::new();
        let mut years = BTreeSet::new();
        let mut categories = BTreeSet::new();

        for source in self.selected_available(selected) {
            let options = source.filter_options().await;
            metals.extend(options.metals);
            years.extend(options.years);
            categories.extend(options.categories);
        }

        FilterOptions {
            metals: metals.into_iter().collect(),
            years: years.into_iter().collect(),
            categories: categories.into_iter().collect(),
        }
    }

    /// Fetch-all, tag, concatenate, globally sort, then slice the page
    pub async fn combined_data(&self, selected: &[String], spec: &QuerySpec) -> Vec<Lot> {
        let unpaged = spec.unpaginated();
        let mut lots = Vec::new();

        for source in self.selected_available(selected) {
            let mut batch = source.filtered_data(&unpaged).await;
            for lot in &mut batch {
                lot.source = Some(source.name().to_string());
            }
            lots.extend(batch);
        }

        sort_lots(&mut lots, spec.sort_by, spec.currency);

        let offset = spec.offset.max(0) as usize;
        match spec.limit {
            Some(limit) => lots
                .into_iter()
                .skip(offset)
                .take(limit.max(0) as usize)
                .collect(),
            None => lots.into_iter().skip(offset).collect(),
        }
    }

    /// Sum of the per-source counts; sources are disjoint, no dedup
    pub async fn combined_total_count(&self, selected: &[String], spec: &QuerySpec) -> i64 {
        let mut total = 0;
        for source in self.selected_available(selected) {
            total += source.total_count(spec).await;
        }
        total
    }

    /// Dispatch image resolution to the source the lot is tagged with.
    /// Missing or unknown tag resolves to no images.
    pub async fn lot_images(&self, lot: &Lot) -> Vec<String> {
        let Some(name) = lot.source.as_deref() else {
            return Vec::new();
        };
        match self.get(name) {
            Some(source) => source.lot_images(lot).await,
            None => Vec::new(),
        }
    }

    /// Union of catalogue numbers for one catalogue type, ascending
    pub async fn available_catalogue_numbers(
        &self,
        selected: &[String],
        catalogue_type: &str,
    ) -> Vec<String> {
        let mut numbers = BTreeSet::new();
        for source in self.selected_available(selected) {
            numbers.extend(source.catalogue_numbers(catalogue_type).await);
        }
        numbers.into_iter().collect()
    }

    /// Close every adapter's connection pool
    pub async fn close_all(&self) {
        for source in &self.sources {
            source.close().await;
        }
    }
}

/// Globally sort combined lots by the requested key.
///
/// Null policy (fixed): rows whose sort field is absent always sort after
/// rows with a value, in both directions. The sort is stable, so repeated
/// identical queries produce identical order.
pub fn sort_lots(lots: &mut [Lot], key: SortKey, currency: Currency) {
    match key {
        SortKey::PriceHigh => {
            lots.sort_by(|a, b| cmp_opt(&currency.final_price(a), &currency.final_price(b), true))
        }
        SortKey::PriceLow => {
            lots.sort_by(|a, b| cmp_opt(&currency.final_price(a), &currency.final_price(b), false))
        }
        SortKey::DateRecent => lots.sort_by(|a, b| cmp_opt(&a.close_date, &b.close_date, true)),
        SortKey::DateOld => lots.sort_by(|a, b| cmp_opt(&a.close_date, &b.close_date, false)),
        SortKey::YearDesc => lots.sort_by(|a, b| cmp_opt(&a.year, &b.year, true)),
        SortKey::YearAsc => lots.sort_by(|a, b| cmp_opt(&a.year, &b.year, false)),
    }
}

fn cmp_opt<T: PartialOrd>(a: &Option<T>, b: &Option<T>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            let ord = x.partial_cmp(y).unwrap_or(Ordering::Equal);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
