// ==========================================
// Framecraft catalog - stats aggregator
// ==========================================
// One linear pass over product records: category counts and wholesale
// price range. Runs either projected (over a validation report's valid
// rows, before commit) or actual (over the committed catalog).
// An empty catalog yields zero counts and no price range, not a 0
// sentinel.
// ==========================================

use crate::domain::product::ProductRecord;
use crate::domain::report::{CatalogStats, PriceRange};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

pub struct StatsAggregator;

impl StatsAggregator {
    /// Projected stats over not-yet-committed rows.
    pub fn project<'a, I>(&self, records: I) -> CatalogStats
    where
        I: IntoIterator<Item = &'a ProductRecord>,
    {
        self.aggregate(records, None)
    }

    /// Actual stats over the committed catalog.
    pub fn actual<'a, I>(&self, records: I, last_updated: Option<DateTime<Utc>>) -> CatalogStats
    where
        I: IntoIterator<Item = &'a ProductRecord>,
    {
        self.aggregate(records, last_updated)
    }

    fn aggregate<'a, I>(&self, records: I, last_updated: Option<DateTime<Utc>>) -> CatalogStats
    where
        I: IntoIterator<Item = &'a ProductRecord>,
    {
        let mut total: u64 = 0;
        let mut categories = BTreeMap::new();
        let mut price_range: Option<PriceRange> = None;

        for record in records {
            total += 1;
            *categories.entry(record.category).or_insert(0u64) += 1;

            let price = record.wholesale_price;
            price_range = Some(match price_range {
                None => PriceRange {
                    min: price,
                    max: price,
                },
                Some(range) => PriceRange {
                    min: range.min.min(price),
                    max: range.max.max(price),
                },
            });
        }

        CatalogStats {
            total_products: total,
            categories,
            price_range,
            last_updated,
        }
    }
}
