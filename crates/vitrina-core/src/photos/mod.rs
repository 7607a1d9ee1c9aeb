//! Photo resolution - from a conversation turn to concrete attachments
//!
//! # Module Structure
//!
//! - `color`: color vocabulary, text and file-name detection
//! - `select`: variety/filter selection, dedupe, caption derivation
//! - `resolve`: the staged fallback search over the photo index

mod color;
mod resolve;
mod select;


pub use color::{color_from_filename, detect_color_in_text};
pub use resolve::{
    extract_product_mention, is_photo_request, is_showcase_request, product_key, PhotoResolver,
    ResolveRequest,
};
pub use select::{caption_from_filename, dedupe_photos, pick_photos, select_with_color_variety};

/// A photo ready to attach to an outgoing message
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPhoto {
    /// Download URL for the outbound channel
    pub url: String,
    /// Source file name
    pub filename: String,
    /// Caption shown under the photo
    pub caption: String,
    /// Color detected from the file name, if any
    pub color: Option<String>,
}
