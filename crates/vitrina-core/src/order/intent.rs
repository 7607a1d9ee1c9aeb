//! Purchase-intent detection and reply-text filters
//!
//! Generated replies arrive as multi-part text joined by [`REPLY_DELIMITER`];
//! each part is sent as a separate chat message. The filters here enforce the
//! checkout policy the prompt alone cannot guarantee: no checkout nudge before
//! the client signals intent, no "placing the order" phrase while fields are
//! still missing, no repeated greeting mid-conversation.

use crate::order::context::OrderContext;
use crate::order::missing::MissingField;
use regex::Regex;
use std::sync::LazyLock;

/// Separator between parts of a multi-part reply
pub const REPLY_DELIMITER: &str = "|||";

/// Canonical confirmation phrase, appended only when no fields are missing
pub const ORDER_CONFIRM_TEXT: &str = "Хорошо, оформляем заказ";

/// Substrings of explicit purchase intent in the client's own words.
///
/// "адрес доставки" is deliberately a compound phrase: a client asking for
/// the store's address ("какой у вас адрес?") is not placing an order.
const ORDER_INTENT_PATTERNS: &[&str] = &[
    "оформ",
    "заказ",
    "беру",
    "возьму",
    "покуп",
    "куплю",
    "зафикс",
    "адрес доставки",
];

/// Multi-word phrases marking a reply part as a checkout nudge
const CHECKOUT_HINTS: &[&str] = &[
    "зафикс",
    "оформить заказ",
    "оформляем заказ",
    "адрес доставки",
    "напишите, пожалуйста, адрес",
    "куда отправ",
];

/// A nudge part shorter than this carries no substantive content
const CHECKOUT_PART_MIN_KEEP: usize = 120;

const GREETING_WORDS: &[&str] = &[
    "здравствуйте",
    "привет",
    "добрый день",
    "добрый вечер",
    "доброе утро",
];

/// Split a multi-part reply into trimmed non-empty parts
#[must_use]
pub fn split_reply_parts(text: &str) -> Vec<String> {
    text.split(REPLY_DELIMITER)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether the client's message carries explicit purchase intent
#[must_use]
pub fn has_order_intent(text: &str) -> bool {
    let t = text.to_lowercase();
    ORDER_INTENT_PATTERNS.iter().any(|p| t.contains(p))
}

/// Whether the text contains a question
#[must_use]
pub fn has_question(text: &str) -> bool {
    text.contains('?')
}

/// Drop reply parts that are bare checkout nudges.
///
/// A part is dropped only when it both contains a checkout-hint phrase and is
/// shorter than 120 characters; long parts are presumed to carry product
/// content alongside the nudge and are kept verbatim. Returns empty text when
/// nothing survives.
#[must_use]
pub fn strip_checkout_prompts(text: &str) -> String {
    let kept: Vec<String> = split_reply_parts(text)
        .into_iter()
        .filter(|part| {
            let low = part.to_lowercase();
            let is_nudge = CHECKOUT_HINTS.iter().any(|h| low.contains(h));
            !(is_nudge && part.chars().count() < CHECKOUT_PART_MIN_KEEP)
        })
        .collect();
    kept.join(REPLY_DELIMITER)
}

/// Whether the reply claims the order is being placed
#[must_use]
pub fn contains_order_confirm(text: &str) -> bool {
    let t = text.to_lowercase();
    if t.contains("хорошо, оформляем заказ") || t.contains("хорошо оформляем заказ") {
        return true;
    }
    t.contains("оформ") && t.contains("заказ")
}

static CONFIRM_FULL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bхорошо,?\s*оформляем\s*заказ\b[.!]?").expect("valid confirm regex")
});
static CONFIRM_SHORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bоформ\w*\s+заказ\w*\b[.!]?").expect("valid confirm regex"));
static EMPTY_PART_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\|\|\|\s*\|\|\|").expect("valid delimiter regex"));
static MULTI_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid whitespace regex"));

/// Remove premature "placing the order" phrasing from a reply.
///
/// Used when fields are still missing but the model confirmed the order
/// anyway. Falls back to a neutral line when nothing else remains.
#[must_use]
pub fn strip_order_confirm(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let cleaned = CONFIRM_FULL_RE.replace_all(text, "");
    let cleaned = CONFIRM_SHORT_RE.replace_all(&cleaned, "");
    let cleaned = EMPTY_PART_RE.replace_all(&cleaned, REPLY_DELIMITER);
    let cleaned = MULTI_SPACE_RE.replace_all(&cleaned, " ");
    let cleaned = cleaned.trim_matches(|c: char| c == '|' || c.is_whitespace());
    if cleaned.is_empty() {
        "Сейчас уточню детали заказа.".to_string()
    } else {
        cleaned.to_string()
    }
}

fn field_hints(field: MissingField) -> &'static [&'static str] {
    match field {
        MissingField::City => &["город", "из какого", "откуда"],
        MissingField::Product => &["какую модель", "какой товар", "что оформляем"],
        MissingField::Size => &["размер"],
        MissingField::Color => &["цвет", "расцветк"],
        MissingField::Address => &["адрес", "улиц", "дом", "кварти"],
    }
}

/// Whether the reply already asks the client for one of the missing fields
#[must_use]
pub fn already_requests_missing(text: &str, missing: &[MissingField]) -> bool {
    let t = text.to_lowercase();
    missing
        .iter()
        .any(|field| field_hints(*field).iter().any(|h| t.contains(h)))
}

/// Drop repeated reply parts, comparing on normalized text
#[must_use]
pub fn dedupe_reply_parts(text: &str) -> String {
    let parts = split_reply_parts(text);
    if parts.is_empty() {
        return text.to_string();
    }
    let mut seen = std::collections::HashSet::new();
    let mut kept = Vec::new();
    for part in parts {
        let mut key = String::new();
        for c in part.to_lowercase().chars() {
            if c.is_alphanumeric() {
                key.push(c);
            } else if c.is_whitespace() && !key.ends_with(' ') {
                key.push(' ');
            }
        }
        if seen.insert(key.trim().to_string()) {
            kept.push(part);
        }
    }
    kept.join(REPLY_DELIMITER)
}

/// Drop a leading greeting part when the assistant has already greeted the
/// client earlier in the conversation.
///
/// Only a short standalone greeting (under 30 characters) is removed; a first
/// part that greets and then says something substantive stays.
#[must_use]
pub fn strip_duplicate_greeting(text: &str, already_greeted: bool) -> String {
    if !already_greeted {
        return text.to_string();
    }
    let mut parts = split_reply_parts(text);
    if parts.is_empty() {
        return text.to_string();
    }
    let first = parts[0].to_lowercase();
    if GREETING_WORDS.iter().any(|g| first.starts_with(g)) && first.chars().count() < 30 {
        parts.remove(0);
    }
    if parts.is_empty() {
        return text.to_string();
    }
    parts.join(REPLY_DELIMITER)
}

/// Whether any earlier assistant turn contained a greeting
#[must_use]
pub fn text_contains_greeting(text: &str) -> bool {
    let t = text.to_lowercase();
    GREETING_WORDS.iter().any(|g| t.contains(g))
}

/// Order-state block appended to the completion prompt.
///
/// Spells the accumulated context out for the model and states the one rule
/// the filters also enforce mechanically.
#[must_use]
pub fn format_order_guard(
    ctx: &OrderContext,
    missing: &[MissingField],
    color_required: bool,
) -> String {
    let dash = |s: &str| {
        if s.is_empty() {
            "-".to_string()
        } else {
            s.to_string()
        }
    };
    let missing_ru = if missing.is_empty() {
        "нет".to_string()
    } else {
        missing
            .iter()
            .map(|f| match f {
                MissingField::City => "город",
                MissingField::Product => "товар",
                MissingField::Size => "размер",
                MissingField::Color => "цвет",
                MissingField::Address => "адрес",
            })
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "КОНТЕКСТ ЗАКАЗА:\n\
         - город: {}\n\
         - товар: {}\n\
         - тип товара: {}\n\
         - размер: {}\n\
         - цвет: {}\n\
         - адрес: {}\n\
         - цвет обязателен: {}\n\
         - недостающие поля: {}\n\
         ПРАВИЛО: фразу '{}' можно писать только когда недостающих полей нет.",
        dash(&ctx.city),
        dash(&ctx.product),
        ctx.product_type,
        dash(&ctx.size),
        dash(&ctx.color),
        dash(&ctx.address),
        if color_required { "да" } else { "нет" },
        missing_ru,
        ORDER_CONFIRM_TEXT,
    )
}
