//! Missing-field resolution in the order the assistant should ask

use crate::order::context::{OrderContext, ProductKind};

/// A field still needed before the order can be placed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    /// Delivery city
    City,
    /// Product
    Product,
    /// Size (shoes)
    Size,
    /// Color, when the product comes in several
    Color,
    /// Delivery address
    Address,
}

impl MissingField {
    /// Stable identifier, used in logs and prompt context
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::City => "city",
            Self::Product => "product",
            Self::Size => "size",
            Self::Color => "color",
            Self::Address => "address",
        }
    }

    /// Question to put to the client for this field
    #[must_use]
    pub fn question(&self) -> &'static str {
        match self {
            Self::City => "Подскажите, пожалуйста, из какого вы города?",
            Self::Product => "Уточните, пожалуйста, какую модель оформляем?",
            Self::Size => "Подскажите, пожалуйста, какой размер вам нужен?",
            Self::Color => "Подскажите, пожалуйста, какой цвет выбираете?",
            Self::Address => "Напишите, пожалуйста, адрес доставки?",
        }
    }
}

impl std::fmt::Display for MissingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// List the fields still needed, in ask priority.
///
/// City first, then product, then size (shoes only), then color when the
/// product is known to come in several colors. The address is only asked for
/// once every other required field is in hand, so the client is never asked
/// where to ship an order that is not yet pinned down.
#[must_use]
pub fn missing_fields(ctx: &OrderContext, color_required: bool) -> Vec<MissingField> {
    let mut missing = Vec::new();
    if ctx.city.trim().is_empty() {
        missing.push(MissingField::City);
    }
    if ctx.product.trim().is_empty() {
        missing.push(MissingField::Product);
    }
    if ctx.product_type == ProductKind::Shoes && ctx.size.trim().is_empty() {
        missing.push(MissingField::Size);
    }
    if color_required && ctx.color.trim().is_empty() {
        missing.push(MissingField::Color);
    }
    if missing.is_empty() && ctx.address.trim().is_empty() {
        missing.push(MissingField::Address);
    }
    missing
}
