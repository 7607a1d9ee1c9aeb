//! Prompt assembly and small turn-level predicates

use crate::order::{text_contains_greeting, ExtractedFields, MissingField};
use crate::services::RetrievedDoc;
use vitrina_storage::{StoredMessage, StoredRole};

/// Catalog context block for the completion prompt
pub(crate) fn build_product_context(docs: &[RetrievedDoc]) -> String {
    if docs.is_empty() {
        return "нет данных".to_string();
    }
    docs.iter()
        .map(|doc| {
            if doc.snippet.is_empty() {
                doc.product_name.clone()
            } else {
                format!("{}\n{}", doc.product_name, doc.snippet)
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// History rendered for the prompt, oldest first
pub(crate) fn format_history(history: &[StoredMessage]) -> String {
    history
        .iter()
        .map(|m| {
            let speaker = match m.role {
                StoredRole::User => "Клиент",
                StoredRole::Assistant => "Алина",
            };
            format!("{speaker}: {}", m.content)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether any earlier assistant turn already greeted the client
pub(crate) fn assistant_already_greeted(history: &[StoredMessage]) -> bool {
    history
        .iter()
        .filter(|m| m.role == StoredRole::Assistant)
        .any(|m| text_contains_greeting(&m.content))
}

/// Most recent assistant reply, empty on a fresh conversation
pub(crate) fn last_assistant_reply(history: &[StoredMessage]) -> &str {
    history
        .iter()
        .rev()
        .find(|m| m.role == StoredRole::Assistant)
        .map_or("", |m| m.content.as_str())
}

/// Whether this turn supplies a field that was missing before the merge.
///
/// Evaluated against the pre-merge missing list: after the merge the field
/// is no longer missing, which is exactly why the pre-merge snapshot exists.
pub(crate) fn answering_missing_field(
    pre_merge_missing: &[MissingField],
    extracted: &ExtractedFields,
) -> bool {
    pre_merge_missing.iter().any(|field| {
        let value = match field {
            MissingField::City => &extracted.city,
            MissingField::Product => &extracted.product,
            MissingField::Size => &extracted.size,
            MissingField::Color => &extracted.color,
            MissingField::Address => &extracted.address,
        };
        !value.trim().is_empty()
    })
}

/// Up to `limit` distinct product names from retrieval, minus exclusions
pub(crate) fn similar_product_names(
    docs: &[RetrievedDoc],
    exclude: &[&str],
    limit: usize,
) -> Vec<String> {
    let excluded: Vec<String> = exclude
        .iter()
        .map(|n| n.trim().to_lowercase())
        .filter(|n| !n.is_empty())
        .collect();
    let mut seen = Vec::new();
    let mut names = Vec::new();
    for doc in docs {
        let name = doc.product_name.trim();
        if name.is_empty() {
            continue;
        }
        let low = name.to_lowercase();
        if excluded.contains(&low) || seen.contains(&low) {
            continue;
        }
        seen.push(low);
        names.push(name.to_string());
        if names.len() >= limit {
            break;
        }
    }
    names
}

/// Append an alternatives part to a reply
pub(crate) fn append_alternatives(base: &str, names: &[String]) -> String {
    if names.is_empty() {
        return base.to_string();
    }
    let variants = names.join("; ");
    format!("{base}|||Похожие варианты: {variants}. Какой вариант показать?")
}

/// Client-facing message when the requested color is not on file
pub(crate) fn color_unavailable_message(
    product: &str,
    requested_color: &str,
    available: &std::collections::BTreeSet<String>,
) -> String {
    let product = if product.is_empty() { "этой модели" } else { product };
    match available.len() {
        0 => format!(
            "По модели {product} цвет {requested_color} сейчас не вижу в наличии. \
             Подскажите, пожалуйста, какой цвет рассмотрим из доступных?"
        ),
        1 => {
            let only = available.iter().next().map_or("", String::as_str);
            format!(
                "По модели {product} цвета {requested_color} сейчас нет. \
                 Есть только {only}. Подойдет этот вариант?"
            )
        }
        _ => {
            let colors = available.iter().cloned().collect::<Vec<_>>().join(", ");
            format!(
                "По модели {product} цвета {requested_color} сейчас нет. \
                 Доступные цвета: {colors}. Какой цвет выбираете?"
            )
        }
    }
}
