//! Time-bounded cache for "does this product need a color choice"
//!
//! A product needs a color choice when its photo set carries more than one
//! distinct color. The lookup walks the photo index, so answers are cached
//! per product with a TTL; a stale entry is replaced on the next access, no
//! background eviction runs.

use crate::photos::color_from_filename;
use crate::services::PhotoIndex;
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Per-product color-requirement cache over the photo index
pub struct ColorRequirementCache {
    index: Arc<dyn PhotoIndex>,
    entries: DashMap<String, (bool, Instant)>,
    ttl: Duration,
}

impl ColorRequirementCache {
    /// Create a cache with the given freshness window
    #[must_use]
    pub fn new(index: Arc<dyn PhotoIndex>, ttl: Duration) -> Self {
        Self {
            index,
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Whether the client must pick a color for this product.
    ///
    /// Empty product names and index failures both answer `false`; a wrong
    /// "no" only means the color question is skipped, which the order flow
    /// tolerates.
    pub async fn is_color_required(&self, product: &str) -> bool {
        let key = product.trim().to_lowercase();
        if key.is_empty() {
            return false;
        }
        if let Some(entry) = self.entries.get(&key) {
            let (value, stored_at) = *entry;
            if stored_at.elapsed() < self.ttl {
                return value;
            }
        }
        let required = match self.index.find_photos(product).await {
            Ok(photos) => {
                let colors: HashSet<&str> = photos
                    .iter()
                    .filter_map(|p| color_from_filename(&p.filename))
                    .collect();
                colors.len() > 1
            }
            Err(err) => {
                warn!(product, %err, "color requirement lookup failed");
                return false;
            }
        };
        debug!(product = %key, required, "cached color requirement");
        self.entries.insert(key, (required, Instant::now()));
        required
    }

    /// Number of cached products
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
