//! Contracts for the external collaborators the pipeline consumes
//!
//! Every external call the orchestrator makes goes through one of these
//! traits, so tests drive the pipeline with mocks and the binary wires in
//! real adapters.

use crate::error::Result;
use crate::order::{ExtractedFields, OrderContext};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use vitrina_storage::StoredMessage;

/// One ranked hit from the retrieval service
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedDoc {
    /// Catalog product name this document describes
    pub product_name: String,
    /// Text fed into the completion prompt as product context
    pub snippet: String,
}

/// Stock answer for a concrete product/size/color combination
#[derive(Debug, Clone, PartialEq)]
pub enum Availability {
    /// In stock
    InStock {
        /// Units across all matching rows
        quantity: u32,
        /// Display price, empty when the sheet has none
        price: String,
    },
    /// Known product, zero units
    OutOfStock,
    /// Product not found in the inventory at all
    Unknown,
}

impl Availability {
    /// Whether the order can proceed
    #[must_use]
    pub fn is_available(&self) -> bool {
        matches!(self, Self::InStock { .. })
    }

    /// Client-facing stock message for this answer
    #[must_use]
    pub fn message(&self, product: &str) -> String {
        match self {
            Self::InStock { price, .. } if !price.is_empty() => {
                format!("Да, {product} есть в наличии! Цена: {price}.")
            }
            Self::InStock { .. } => format!("Да, {product} есть в наличии!"),
            Self::OutOfStock => format!(
                "К сожалению, {product} сейчас нет в наличии. Ожидаем поступление в ближайшее время."
            ),
            Self::Unknown => format!(
                "По модели {product} сейчас не вижу в наличии. Могу подобрать похожий вариант?"
            ),
        }
    }
}

/// A photo the index can serve
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRef {
    /// Download URL handed to the outbound channel
    pub url: String,
    /// Original file name; carries product and color words
    pub filename: String,
}

/// Structured field extraction from the latest client message
#[cfg_attr(test, automock)]
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    /// Extract order fields from `message` given the running conversation
    async fn extract(
        &self,
        history: &[StoredMessage],
        message: &str,
        current: &OrderContext,
    ) -> Result<ExtractedFields>;
}

/// Semantic product search over the catalog
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Retrieval: Send + Sync {
    /// Ranked catalog documents for a free-text query
    async fn search(&self, query: &str) -> Result<Vec<RetrievedDoc>>;
}

/// Stock lookups
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Inventory: Send + Sync {
    /// Check stock for a product, optionally narrowed by size and color
    async fn check_availability(
        &self,
        product: &str,
        size: &str,
        color: &str,
    ) -> Result<Availability>;
}

/// Product photo lookups
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PhotoIndex: Send + Sync {
    /// All photos whose file names match the product query
    async fn find_photos(&self, product: &str) -> Result<Vec<PhotoRef>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_availability_messages() {
        let in_stock = Availability::InStock {
            quantity: 2,
            price: "450 000 тг".to_string(),
        };
        assert!(in_stock.is_available());
        assert!(in_stock.message("Chanel Jumbo").contains("Цена: 450 000 тг"));

        let no_price = Availability::InStock {
            quantity: 1,
            price: String::new(),
        };
        assert!(!no_price.message("Opyum").contains("Цена"));

        assert!(!Availability::OutOfStock.is_available());
        assert!(Availability::Unknown
            .message("Azia 95")
            .contains("подобрать похожий"));
    }
}
