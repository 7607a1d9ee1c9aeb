//! OrderContext and the typed decode boundary for extractor output

use serde::{Deserialize, Serialize};

/// Broad product category; drives which fields the order needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    /// Footwear (requires a size)
    Shoes,
    /// Bags
    Bag,
    /// Accessories
    Accessory,
    /// Recognized but uncategorized
    Other,
    /// Not yet known
    #[default]
    Unknown,
}

impl ProductKind {
    /// Get the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shoes => "shoes",
            Self::Bag => "bag",
            Self::Accessory => "accessory",
            Self::Other => "other",
            Self::Unknown => "unknown",
        }
    }

    /// Whether orders of this kind need a size
    #[must_use]
    pub fn requires_size(&self) -> bool {
        matches!(self, Self::Shoes)
    }

    /// Normalize an extractor-provided tag; garbage maps to `Unknown`
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "shoes" | "shoe" | "обувь" => Self::Shoes,
            "bag" | "bags" | "сумка" | "сумки" => Self::Bag,
            "accessory" | "accessories" | "аксессуар" | "аксессуары" => Self::Accessory,
            "other" | "другое" => Self::Other,
            _ => Self::Unknown,
        }
    }

    /// Guess the kind from free text (product name or client message)
    #[must_use]
    pub fn infer(text: &str) -> Self {
        if text.contains('👠') || text.contains('👟') {
            return Self::Shoes;
        }
        if text.contains('👜') {
            return Self::Bag;
        }
        let t = text.to_lowercase();
        const SHOE_HINTS: &[&str] = &[
            "туф", "крос", "ботин", "лофер", "балетк", "обув", "каблук", "лодоч",
            "slingback", "джимми чу", "jimmy choo", "saeda", "azia", "opyum", "опиум",
            "sneaker", "кед",
        ];
        if SHOE_HINTS.iter().any(|h| t.contains(h)) {
            return Self::Shoes;
        }
        const BAG_HINTS: &[&str] = &[
            "сумк", "bag", "chanel 25", "arcadie", "pochette", "flap", "кошел",
            "wallet", "monogram", "jumbo",
        ];
        if BAG_HINTS.iter().any(|h| t.contains(h)) {
            return Self::Bag;
        }
        const ACCESSORY_HINTS: &[&str] = &["ремен", "ремн", "очки", "платок", "шарф", "брелок"];
        if ACCESSORY_HINTS.iter().any(|h| t.contains(h)) {
            return Self::Accessory;
        }
        Self::Unknown
    }
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coerce an arbitrary JSON scalar to trimmed text.
///
/// The extraction service is free to return numbers or booleans for any
/// field ("size": 38); everything downstream only ever sees strings.
/// Arrays, objects and null collapse to the empty string.
fn coerce_scalar(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Accumulated order facts for one conversation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OrderContext {
    /// Delivery city
    #[serde(default)]
    pub city: String,
    /// Product the client is ordering
    #[serde(default)]
    pub product: String,
    /// Product category
    #[serde(default)]
    pub product_type: ProductKind,
    /// Size (shoes only)
    #[serde(default)]
    pub size: String,
    /// Color variant
    #[serde(default)]
    pub color: String,
    /// Delivery address
    #[serde(default)]
    pub address: String,
    /// Client explicitly signalled readiness to order
    #[serde(default)]
    pub ready_to_order: bool,
}

impl OrderContext {
    /// Decode a persisted order-state blob, tolerating legacy or foreign shapes.
    #[must_use]
    pub fn from_state(state: &serde_json::Value) -> Self {
        let get = |key: &str| {
            state
                .get(key)
                .map(coerce_scalar)
                .unwrap_or_default()
        };
        Self {
            city: get("city"),
            product: get("product"),
            product_type: ProductKind::parse(&get("product_type")),
            size: get("size"),
            color: get("color"),
            address: get("address"),
            ready_to_order: state
                .get("ready_to_order")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false),
        }
    }

    /// Encode for persistence
    #[must_use]
    pub fn to_state(&self) -> serde_json::Value {
        serde_json::json!({
            "city": self.city,
            "product": self.product,
            "product_type": self.product_type.as_str(),
            "size": self.size,
            "color": self.color,
            "address": self.address,
            "ready_to_order": self.ready_to_order,
        })
    }

    /// Trim all text fields
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            city: self.city.trim().to_string(),
            product: self.product.trim().to_string(),
            product_type: self.product_type,
            size: self.size.trim().to_string(),
            color: self.color.trim().to_string(),
            address: self.address.trim().to_string(),
            ready_to_order: self.ready_to_order,
        }
    }
}

/// Fields extracted from a single message; consumed once by the merge step
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedFields {
    /// Delivery city
    pub city: String,
    /// Product mention
    pub product: String,
    /// Product category tag
    pub product_type: ProductKind,
    /// Size
    pub size: String,
    /// Color
    pub color: String,
    /// Delivery address
    pub address: String,
    /// Extractor judged the client ready to order
    pub ready_to_order: bool,
}

impl ExtractedFields {
    /// Decode the extraction service's JSON output.
    ///
    /// Every scalar is coerced to text at this boundary; a wrong-typed field
    /// is recovered, never surfaced as an error.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        let get = |key: &str| value.get(key).map(coerce_scalar).unwrap_or_default();
        Self {
            city: get("city"),
            product: get("product"),
            product_type: ProductKind::parse(&get("product_type")),
            size: get("size"),
            color: get("color"),
            address: get("address"),
            ready_to_order: value
                .get("ready_to_order")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false),
        }
    }

    /// Whether no field carries a value
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.city.is_empty()
            && self.product.is_empty()
            && self.size.is_empty()
            && self.color.is_empty()
            && self.address.is_empty()
            && self.product_type == ProductKind::Unknown
            && !self.ready_to_order
    }
}
