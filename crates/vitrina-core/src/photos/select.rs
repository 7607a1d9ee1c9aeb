//! Photo selection and caption shaping

use crate::photos::color::{color_from_filename, COLOR_ORDER};
use crate::photos::ResolvedPhoto;
use crate::services::PhotoRef;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

static EXTENSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.\w+$").expect("valid extension regex"));
static CYRILLIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[а-яА-ЯёЁ]+").expect("valid cyrillic regex"));
static PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,.;:]").expect("valid punctuation regex"));
static TRAILING_INDEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\d{1,2}$").expect("valid index regex"));
static MULTI_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("valid whitespace regex"));

/// Derive a display caption from a photo file name.
///
/// File names carry Russian category and color words around the Latin model
/// name: "кроссовки черные Golden Goose Ball Star 1.jpg" captions as
/// "Golden Goose Ball Star".
#[must_use]
pub fn caption_from_filename(filename: &str) -> String {
    let name = EXTENSION_RE.replace(filename, "");
    let name = CYRILLIC_RE.replace_all(&name, "");
    let name = PUNCT_RE.replace_all(&name, " ");
    let name = name.trim_matches(|c: char| !c.is_alphanumeric());
    let name = TRAILING_INDEX_RE.replace(name.trim(), "");
    MULTI_SPACE_RE.replace_all(&name, " ").trim().to_string()
}

/// Drop repeated photos, comparing on URL falling back to file name
#[must_use]
pub fn dedupe_photos(photos: Vec<PhotoRef>) -> Vec<PhotoRef> {
    let mut seen = HashSet::new();
    photos
        .into_iter()
        .filter(|p| {
            let key = if p.url.is_empty() { &p.filename } else { &p.url };
            !key.is_empty() && seen.insert(key.clone())
        })
        .collect()
}

/// Pick up to `max_per_color` photos of each color, `max_total` overall.
///
/// Colors come out in a fixed display order; photos without a recognized
/// color fill any remaining slots at the end.
#[must_use]
pub fn select_with_color_variety(
    photos: &[PhotoRef],
    max_total: usize,
    max_per_color: usize,
) -> Vec<PhotoRef> {
    if photos.is_empty() || max_total == 0 {
        return Vec::new();
    }
    let mut by_color: BTreeMap<&str, Vec<&PhotoRef>> = BTreeMap::new();
    let mut uncolored: Vec<&PhotoRef> = Vec::new();
    for photo in photos {
        match color_from_filename(&photo.filename) {
            Some(color) => by_color.entry(color).or_default().push(photo),
            None => uncolored.push(photo),
        }
    }

    let ordered: Vec<&str> = COLOR_ORDER
        .iter()
        .filter(|c| by_color.contains_key(**c))
        .copied()
        .chain(by_color.keys().filter(|c| !COLOR_ORDER.contains(c)).copied())
        .collect();

    let mut result: Vec<PhotoRef> = Vec::new();
    for color in ordered {
        if result.len() >= max_total {
            break;
        }
        let group = &by_color[color];
        let take = max_per_color
            .min(max_total - result.len())
            .min(group.len());
        result.extend(group[..take].iter().map(|p| (*p).clone()));
    }
    if result.len() < max_total {
        let room = max_total - result.len();
        result.extend(uncolored.into_iter().take(room).cloned());
    }
    result
}

/// Shape found photos into outgoing attachments.
///
/// With a requested color, filter to that color only and never substitute
/// another; without one, take one photo per distinct color (variety mode).
#[must_use]
pub fn pick_photos(
    found: Vec<PhotoRef>,
    requested_color: Option<&str>,
    cap: usize,
) -> Vec<ResolvedPhoto> {
    let picked = match requested_color {
        Some(color) => {
            let prefixes = crate::photos::color::prefixes_for(color);
            let matching: Vec<PhotoRef> = found
                .into_iter()
                .filter(|p| {
                    let f = p.filename.to_lowercase();
                    prefixes.iter().any(|prefix| f.contains(prefix))
                })
                .collect();
            let mut deduped = dedupe_photos(matching);
            deduped.truncate(cap);
            deduped
        }
        None => {
            let deduped = dedupe_photos(found);
            select_with_color_variety(&deduped, cap, 1)
        }
    };
    picked
        .into_iter()
        .map(|p| ResolvedPhoto {
            caption: caption_from_filename(&p.filename),
            color: color_from_filename(&p.filename).map(str::to_string),
            url: p.url,
            filename: p.filename,
        })
        .collect()
}
