//! Order state - context, merge engine, missing fields, intent filters
//!
//! # Module Structure
//!
//! - `context`: OrderContext / ExtractedFields and the typed decode boundary
//! - `merge`: merge algorithm with product-switch detection
//! - `missing`: missing-field resolution in ask priority order
//! - `intent`: purchase-intent detection and reply-text filters

mod context;
mod intent;
mod merge;
mod missing;

#[cfg(test)]
mod tests;

pub use context::{ExtractedFields, OrderContext, ProductKind};
pub use intent::{
    already_requests_missing, contains_order_confirm, dedupe_reply_parts, format_order_guard,
    has_order_intent, has_question, split_reply_parts, strip_checkout_prompts,
    strip_duplicate_greeting, strip_order_confirm, text_contains_greeting, ORDER_CONFIRM_TEXT,
    REPLY_DELIMITER,
};
pub use merge::{merge_order_context, PRODUCT_SWITCH_THRESHOLD};
pub use missing::{missing_fields, MissingField};
