//! Color vocabulary shared by photo selection and the requirement cache
//!
//! Colors are normalized to the plural Russian form used in photo file names
//! ("черные", "бежевые"), so a color detected in a client message can be
//! matched against file names directly.

/// Substring prefixes mapped to the canonical color key
const COLOR_PREFIXES: &[(&str, &str)] = &[
    ("розов", "розовые"),
    ("pink", "розовые"),
    ("черн", "черные"),
    ("black", "черные"),
    ("беж", "бежевые"),
    ("beige", "бежевые"),
    ("бел", "белые"),
    ("white", "белые"),
    ("красн", "красные"),
    ("red", "красные"),
    ("синий", "синие"),
    ("синих", "синие"),
    ("синие", "синие"),
    ("золот", "золотые"),
    ("gold", "золотые"),
    ("серебр", "серебряные"),
    ("silver", "серебряные"),
    ("коричнев", "коричневые"),
    ("brown", "коричневые"),
    ("зелен", "зеленые"),
    ("green", "зеленые"),
];

/// Display order for variety mode; unlisted colors follow alphabetically
pub(crate) const COLOR_ORDER: &[&str] = &[
    "бежевые",
    "черные",
    "розовые",
    "белые",
    "красные",
    "синие",
    "золотые",
    "серебряные",
    "серые",
    "зеленые",
    "коричневые",
];

/// Color the client mentioned in free text, if any
#[must_use]
pub fn detect_color_in_text(text: &str) -> Option<&'static str> {
    let t = text.to_lowercase();
    COLOR_PREFIXES
        .iter()
        .find(|(prefix, _)| t.contains(prefix))
        .map(|(_, key)| *key)
}

/// Color encoded in a photo file name, if any
#[must_use]
pub fn color_from_filename(filename: &str) -> Option<&'static str> {
    let f = filename.to_lowercase();
    COLOR_PREFIXES
        .iter()
        .find(|(prefix, _)| f.contains(prefix))
        .map(|(_, key)| *key)
}

/// All prefixes that normalize to `color`, for matching against file names
pub(crate) fn prefixes_for(color: &str) -> Vec<&'static str> {
    COLOR_PREFIXES
        .iter()
        .filter(|(_, key)| *key == color)
        .map(|(prefix, _)| *prefix)
        .collect()
}
