//! File-backed catalog serving retrieval, inventory and photo lookups
//!
//! The catalog is one JSON file listing products with their description,
//! photo links and stock rows. All three lookup contracts are answered from
//! it with fuzzy token matching, so a query like "шанель джумбо" finds
//! "Chanel Jumbo Classic Flap" photos and stock.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;
use vitrina_core::services::{Availability, Inventory, PhotoIndex, PhotoRef, Retrieval, RetrievedDoc};
use vitrina_core::tokenize::{tokenize, token_overlap};
use vitrina_core::Result;

/// Retrieval hits returned per query
const MAX_RETRIEVAL_HITS: usize = 4;

/// One photo entry of a catalog product
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogPhoto {
    /// Direct download URL
    pub url: String,
    /// File name carrying model and color words
    pub filename: String,
}

/// One stock row of a catalog product
#[derive(Debug, Clone, Deserialize)]
pub struct StockRow {
    /// Size, empty when not applicable
    #[serde(default)]
    pub size: String,
    /// Color, empty when the product has one color
    #[serde(default)]
    pub color: String,
    /// Units on hand
    pub quantity: u32,
    /// Display price
    #[serde(default)]
    pub price: String,
}

/// A catalog product
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogProduct {
    /// Display name
    pub name: String,
    /// Sales description fed to the completion prompt
    #[serde(default)]
    pub description: String,
    /// Photos of this product
    #[serde(default)]
    pub photos: Vec<CatalogPhoto>,
    /// Stock rows
    #[serde(default)]
    pub stock: Vec<StockRow>,
}

/// In-memory catalog index
pub struct CatalogIndex {
    products: Vec<CatalogProduct>,
}

impl CatalogIndex {
    /// Load the catalog from a JSON file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let products: Vec<CatalogProduct> = serde_json::from_str(&raw)?;
        info!(count = products.len(), path = %path.as_ref().display(), "catalog loaded");
        Ok(Self { products })
    }

    /// Build an index from already-parsed products
    #[must_use]
    pub fn from_products(products: Vec<CatalogProduct>) -> Self {
        Self { products }
    }

    fn match_tokens(product: &CatalogProduct) -> HashSet<String> {
        let mut tokens = tokenize(&product.name);
        for photo in &product.photos {
            tokens.extend(tokenize(&photo.filename));
        }
        tokens
    }

    fn best_match(&self, query: &str) -> Option<&CatalogProduct> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return None;
        }
        self.products
            .iter()
            .map(|p| {
                let product_tokens = Self::match_tokens(p);
                let common = query_tokens.intersection(&product_tokens).count();
                (common, p)
            })
            .filter(|(common, _)| *common > 0)
            .max_by_key(|(common, _)| *common)
            .map(|(_, p)| p)
    }
}

#[async_trait]
impl Retrieval for CatalogIndex {
    async fn search(&self, query: &str) -> Result<Vec<RetrievedDoc>> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Ok(Vec::new());
        }
        let mut scored: Vec<(f64, &CatalogProduct)> = self
            .products
            .iter()
            .map(|p| (token_overlap(&query_tokens, &Self::match_tokens(p)), p))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        Ok(scored
            .into_iter()
            .take(MAX_RETRIEVAL_HITS)
            .map(|(_, p)| RetrievedDoc {
                product_name: p.name.clone(),
                snippet: p.description.clone(),
            })
            .collect())
    }
}

#[async_trait]
impl Inventory for CatalogIndex {
    async fn check_availability(
        &self,
        product: &str,
        size: &str,
        color: &str,
    ) -> Result<Availability> {
        let Some(found) = self.best_match(product) else {
            return Ok(Availability::Unknown);
        };
        let size = size.trim().to_lowercase();
        let color = color.trim().to_lowercase();
        let matching: Vec<&StockRow> = found
            .stock
            .iter()
            .filter(|row| {
                let size_ok = size.is_empty()
                    || row.size.is_empty()
                    || row.size.trim().to_lowercase() == size;
                let row_color = row.color.trim().to_lowercase();
                let color_ok = color.is_empty()
                    || row_color.is_empty()
                    || row_color.contains(&color)
                    || color.contains(&row_color);
                size_ok && color_ok
            })
            .collect();
        let quantity: u32 = matching.iter().map(|row| row.quantity).sum();
        if quantity > 0 {
            let price = matching
                .iter()
                .find(|row| row.quantity > 0)
                .map(|row| row.price.clone())
                .unwrap_or_default();
            Ok(Availability::InStock { quantity, price })
        } else {
            Ok(Availability::OutOfStock)
        }
    }
}

#[async_trait]
impl PhotoIndex for CatalogIndex {
    async fn find_photos(&self, product: &str) -> Result<Vec<PhotoRef>> {
        let Some(found) = self.best_match(product) else {
            return Ok(Vec::new());
        };
        Ok(found
            .photos
            .iter()
            .map(|p| PhotoRef {
                url: p.url.clone(),
                filename: p.filename.clone(),
            })
            .collect())
    }
}
