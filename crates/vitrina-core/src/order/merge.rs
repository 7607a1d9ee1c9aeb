//! Merge engine - fold extracted fields into the accumulated order context

use crate::order::context::{ExtractedFields, OrderContext, ProductKind};
use crate::tokenize::{token_overlap, tokenize};
use tracing::debug;

/// Token overlap below which a new product mention counts as a switch.
///
/// Exactly 0.5 is a refinement, not a switch.
pub const PRODUCT_SWITCH_THRESHOLD: f64 = 0.5;

fn is_product_switch(current: &str, incoming: &str) -> bool {
    let old_tokens = tokenize(current);
    let new_tokens = tokenize(incoming);
    if old_tokens.is_empty() || new_tokens.is_empty() {
        return false;
    }
    token_overlap(&old_tokens, &new_tokens) < PRODUCT_SWITCH_THRESHOLD
}

/// Compute the next order context from the current state and newly extracted
/// fields.
///
/// Switching to a different product invalidates the fields that depend on it
/// (size, color, address); refining the same product ("Jumbo" ->
/// "Chanel Jumbo Classic Flap") keeps them. City survives a switch. Empty
/// incoming values never erase accumulated ones; `ready_to_order` reflects
/// only the current message.
#[must_use]
pub fn merge_order_context(base: &OrderContext, incoming: &ExtractedFields) -> OrderContext {
    let mut merged = base.sanitized();

    if !merged.product.is_empty()
        && !incoming.product.trim().is_empty()
        && is_product_switch(&merged.product, incoming.product.trim())
    {
        debug!(
            from = %merged.product,
            to = %incoming.product.trim(),
            "product switch, clearing dependent fields"
        );
        merged.size.clear();
        merged.color.clear();
        merged.address.clear();
    }

    let apply = |target: &mut String, value: &str| {
        let value = value.trim();
        if !value.is_empty() {
            *target = value.to_string();
        }
    };
    apply(&mut merged.city, &incoming.city);
    apply(&mut merged.product, &incoming.product);
    apply(&mut merged.size, &incoming.size);
    apply(&mut merged.color, &incoming.color);
    apply(&mut merged.address, &incoming.address);

    if incoming.product_type != ProductKind::Unknown {
        merged.product_type = incoming.product_type;
    }
    if merged.product_type == ProductKind::Unknown {
        merged.product_type = ProductKind::infer(&merged.product);
    }

    merged.ready_to_order = incoming.ready_to_order;
    merged
}
