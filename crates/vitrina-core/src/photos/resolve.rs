//! Staged photo lookup
//!
//! Photos are resolved by trying increasingly indirect product sources in a
//! fixed order and stopping at the first stage that yields anything. An index
//! failure at one stage only skips that stage; photo delivery is always
//! best-effort and never fails the turn.

use crate::order::OrderContext;
use crate::photos::select::pick_photos;
use crate::photos::ResolvedPhoto;
use crate::services::{PhotoIndex, RetrievedDoc};
use crate::tokenize::tokenize;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::LazyLock;
use tracing::{debug, warn};

const PHOTO_REQUEST_PATTERNS: &[&str] = &[
    "фото",
    "фотку",
    "фотки",
    "фотографию",
    "снимок",
    "покажи",
    "покажите",
    "покажешь",
    "показать",
    "посмотреть",
    "скинь",
    "скиньте",
    "пришли",
    "пришлите",
    "кинь",
    "киньте",
    "отправь",
    "отправьте",
];

const SHOWCASE_PATTERNS: &[&str] = &[
    "все модели",
    "все вариант",
    "все цвета",
    "всё что есть",
    "все что есть",
    "весь ассортимент",
    "покажите все",
    "покажи все",
];

static LOOKS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"как\s+(он\s+)?выгляд").expect("valid looks regex"));

/// Latin brand names recognized when extracting a bounded product mention
const BRAND_NAMES: &[&str] = &[
    "yves saint laurent",
    "saint laurent",
    "jimmy choo",
    "miu miu",
    "louis vuitton",
    "golden goose",
    "dolce gabbana",
    "bottega veneta",
    "chanel",
    "ysl",
    "gucci",
    "dior",
    "prada",
    "balenciaga",
    "fendi",
    "versace",
    "celine",
    "loewe",
    "valentino",
    "burberry",
    "hermes",
];

static BRAND_MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Longest-first alternation so "saint laurent" wins over a bare "ysl"
    let alternation = BRAND_NAMES.join("|");
    Regex::new(&format!(
        r"(?i)\b({alternation})\b\s*([A-Za-z0-9\-]+(?:\s+[A-Za-z0-9\-]+){{0,2}})?"
    ))
    .expect("valid brand regex")
});

/// Whether the client is asking to see photos
#[must_use]
pub fn is_photo_request(text: &str) -> bool {
    let t = text.to_lowercase();
    PHOTO_REQUEST_PATTERNS.iter().any(|p| t.contains(p)) || LOOKS_RE.is_match(&t)
}

/// Whether the client asks to see everything available
#[must_use]
pub fn is_showcase_request(text: &str) -> bool {
    let t = text.to_lowercase();
    SHOWCASE_PATTERNS.iter().any(|p| t.contains(p))
}

/// Extract a short "brand plus up to two model words" span from generated
/// text, or nothing.
///
/// Feeding whole reply text into the photo index matches unrelated products,
/// so anything without a recognizable brand yields `None` and the caller
/// skips the stage.
#[must_use]
pub fn extract_product_mention(text: &str) -> Option<String> {
    let captures = BRAND_MENTION_RE.captures(text)?;
    let brand = captures.get(1)?.as_str().trim();
    match captures.get(2).map(|m| m.as_str().trim()) {
        Some(rest) if !rest.is_empty() => Some(format!("{brand} {rest}")),
        _ => Some(brand.to_string()),
    }
}

/// Stable key identifying the product a photo batch depicts.
///
/// Built from the first photo's file-name tokens, falling back to the
/// client's own words; used to record which products already got photos.
#[must_use]
pub fn product_key(photos: &[ResolvedPhoto], user_message: &str) -> String {
    let tokens = match photos.first() {
        Some(photo) => tokenize(&photo.filename),
        None => tokenize(user_message),
    };
    let sorted: BTreeSet<String> = tokens.into_iter().collect();
    sorted.into_iter().collect::<Vec<_>>().join("|")
}

/// One turn's worth of photo-resolution inputs
#[derive(Debug, Clone, Default)]
pub struct ResolveRequest<'a> {
    /// The client's message this turn
    pub user_message: &'a str,
    /// Order context after this turn's merge
    pub context: Option<&'a OrderContext>,
    /// Retrieval hits for this turn
    pub retrieved: &'a [RetrievedDoc],
    /// The reply generated for this turn
    pub draft_reply: &'a str,
    /// The previous assistant reply, if any
    pub previous_reply: &'a str,
    /// This turn answers a field the assistant just asked for
    pub answering_missing_field: bool,
}

/// Staged photo search over the photo index
pub struct PhotoResolver {
    index: Arc<dyn PhotoIndex>,
    max_per_message: usize,
    max_showcase: usize,
}

impl PhotoResolver {
    /// Create a resolver with the per-message and showcase caps
    #[must_use]
    pub fn new(index: Arc<dyn PhotoIndex>, max_per_message: usize, max_showcase: usize) -> Self {
        Self {
            index,
            max_per_message,
            max_showcase,
        }
    }

    /// Colors the index has on file for a product
    pub async fn available_colors(&self, product: &str) -> BTreeSet<String> {
        if product.trim().is_empty() {
            return BTreeSet::new();
        }
        match self.index.find_photos(product).await {
            Ok(photos) => photos
                .iter()
                .filter_map(|p| crate::photos::color::color_from_filename(&p.filename))
                .map(str::to_string)
                .collect(),
            Err(err) => {
                warn!(product, %err, "failed to list colors");
                BTreeSet::new()
            }
        }
    }

    async fn try_stage(
        &self,
        stage: &str,
        query: &str,
        requested_color: Option<&str>,
        cap: usize,
    ) -> Vec<ResolvedPhoto> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        match self.index.find_photos(query).await {
            Ok(found) if !found.is_empty() => {
                let picked = pick_photos(found, requested_color, cap);
                if !picked.is_empty() {
                    debug!(stage, query, count = picked.len(), "resolved photos");
                }
                picked
            }
            Ok(_) => Vec::new(),
            Err(err) => {
                warn!(stage, query, %err, "photo lookup failed, skipping stage");
                Vec::new()
            }
        }
    }

    /// Resolve photos for one turn.
    ///
    /// Stages, first hit wins: the client's own message, the merged order
    /// context, retrieval metadata, a bounded product mention in the draft
    /// reply, the same from the previous reply. A turn that merely answers a
    /// previously-asked field sends nothing.
    pub async fn resolve(&self, request: &ResolveRequest<'_>) -> Vec<ResolvedPhoto> {
        if request.answering_missing_field {
            debug!("turn answers a missing field, skipping photos");
            return Vec::new();
        }
        let requested_color = crate::photos::color::detect_color_in_text(request.user_message);
        let cap = if is_showcase_request(request.user_message) {
            self.max_showcase
        } else {
            self.max_per_message
        };

        let photos = self
            .try_stage("user_message", request.user_message, requested_color, cap)
            .await;
        if !photos.is_empty() {
            return photos;
        }

        if let Some(ctx) = request.context {
            let photos = self
                .try_stage("order_context", &ctx.product, requested_color, cap)
                .await;
            if !photos.is_empty() {
                return photos;
            }
        }

        for doc in request.retrieved {
            let photos = self
                .try_stage("retrieval", &doc.product_name, requested_color, cap)
                .await;
            if !photos.is_empty() {
                return photos;
            }
        }

        if let Some(mention) = extract_product_mention(request.draft_reply) {
            let photos = self
                .try_stage("draft_reply", &mention, requested_color, cap)
                .await;
            if !photos.is_empty() {
                return photos;
            }
        }

        if let Some(mention) = extract_product_mention(request.previous_reply) {
            let photos = self
                .try_stage("previous_reply", &mention, requested_color, cap)
                .await;
            if !photos.is_empty() {
                return photos;
            }
        }

        Vec::new()
    }
}
