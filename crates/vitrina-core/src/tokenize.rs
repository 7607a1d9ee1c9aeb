//! Tokenization for product-name matching
//!
//! Splits free text into significant lowercase tokens, dropping filler words
//! and transliterating Cyrillic brand spellings to the Latin forms used in
//! catalog entries and photo file names ("шанель" -> "chanel"). Both the
//! merge engine (product-switch detection) and the photo resolver share this.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Zа-яА-ЯёЁ0-9]+").expect("valid word regex"));

/// Filler words that never identify a product
const STOP_WORDS: &[&str] = &[
    "покажи",
    "покажите",
    "отправь",
    "отправьте",
    "скинь",
    "скиньте",
    "пришли",
    "пришлите",
    "хочу",
    "мне",
    "есть",
    "какие",
    "фото",
    "фотку",
    "фотки",
    "фотографию",
    "можно",
    "нужна",
    "нужно",
    "нужны",
    "что",
    "как",
    "где",
    "для",
    "или",
    "это",
    "все",
    "вас",
    "ваш",
    "ваши",
    "про",
    "пожалуйста",
    "посмотреть",
    "увидеть",
    "модели",
    "показать",
];

/// Cyrillic brand/model spellings mapped to the Latin tokens used in file names
const BRAND_MAP: &[(&str, &[&str])] = &[
    ("шанель", &["chanel"]),
    ("шанел", &["chanel"]),
    ("миу", &["miu"]),
    ("луи", &["louis"]),
    ("вуиттон", &["vuitton"]),
    ("гуччи", &["gucci"]),
    ("прада", &["prada"]),
    ("диор", &["dior"]),
    ("ив", &["yves"]),
    ("сен", &["saint"]),
    ("сан", &["saint"]),
    ("лоран", &["laurent"]),
    ("джимми", &["jimmy"]),
    ("джими", &["jimmy"]),
    ("чу", &["choo"]),
    ("чуу", &["choo"]),
    ("джиммичу", &["jimmy", "choo"]),
    ("джимичу", &["jimmy", "choo"]),
    ("голден", &["golden"]),
    ("гус", &["goose"]),
    ("аркади", &["arcadie"]),
    ("аркадие", &["arcadie"]),
    ("джамбо", &["jumbo"]),
    ("джумбо", &["jumbo"]),
    ("классик", &["classic"]),
    ("флэп", &["flap"]),
    ("флап", &["flap"]),
    ("слингбэки", &["slingbacks"]),
    ("слингбеки", &["slingbacks"]),
    ("суперстар", &["super", "star"]),
    ("монограм", &["monogram"]),
    ("монограмм", &["monogram"]),
    ("почетт", &["pochette"]),
    ("пошет", &["pochette"]),
    ("фелиси", &["felicie"]),
    ("опиум", &["opyum"]),
    ("азия", &["azia"]),
    ("азиа", &["azia"]),
    ("саеда", &["saeda"]),
    // Word-form normalization for product categories (as spelled in file names)
    ("сумки", &["сумка"]),
    ("сумку", &["сумка"]),
    ("сумок", &["сумка"]),
    ("сумочка", &["сумка"]),
    ("сумочку", &["сумка"]),
    ("кроссовок", &["кроссовки"]),
    ("кроссовку", &["кроссовки"]),
    ("туфель", &["туфли"]),
    ("туфлей", &["туфли"]),
    ("балеток", &["балетки"]),
    ("балетку", &["балетки"]),
];

fn brand_lookup(word: &str) -> Option<&'static [&'static str]> {
    BRAND_MAP
        .iter()
        .find(|(from, _)| *from == word)
        .map(|(_, to)| *to)
}

/// Latin brand tokens, used to detect an explicit brand mention
const BRAND_TOKENS: &[&str] = &[
    "chanel", "miu", "louis", "vuitton", "gucci", "prada", "dior", "yves", "saint", "laurent",
    "jimmy", "choo", "golden", "goose", "jumbo", "classic", "flap", "arcadie", "azia", "saeda",
    "opyum", "monogram", "pochette", "felicie", "slingbacks", "ysl",
];

/// Split text into significant lowercase tokens.
///
/// Brand-mapped words contribute both the mapped Latin tokens and the
/// original spelling, so "шанель джумбо" matches "Chanel Jumbo" photos.
#[must_use]
pub fn tokenize(text: &str) -> HashSet<String> {
    let lower = text.to_lowercase();
    let mut tokens = HashSet::new();
    for m in WORD_RE.find_iter(&lower) {
        let word = m.as_str();
        if STOP_WORDS.contains(&word) {
            continue;
        }
        if let Some(mapped) = brand_lookup(word) {
            tokens.extend(mapped.iter().map(|t| (*t).to_string()));
            tokens.insert(word.to_string());
        } else if word.chars().all(|c| c.is_ascii_digit()) {
            // Model numbers like "25" or "95"
            if word.len() >= 2 {
                tokens.insert(word.to_string());
            }
        } else if word.chars().count() > 2 {
            tokens.insert(word.to_string());
        }
    }
    tokens
}

/// Token-set similarity: `|intersection| / max(|a|, |b|)`.
///
/// Returns 0.0 when either side is empty.
#[must_use]
pub fn token_overlap(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / a.len().max(b.len()) as f64
}

/// Whether the text names a known brand or model token
#[must_use]
pub fn mentions_brand(text: &str) -> bool {
    tokenize(text)
        .iter()
        .any(|t| BRAND_TOKENS.contains(&t.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| (*w).to_string()).collect()
    }

    #[test]
    fn test_tokenize_drops_stop_words_and_short_words() {
        let tokens = tokenize("Покажите, пожалуйста, фото балетки Miu Miu");
        assert!(tokens.contains("балетки"));
        assert!(tokens.contains("miu"));
        assert!(!tokens.contains("фото"));
        assert!(!tokens.contains("пожалуйста"));
    }

    #[test]
    fn test_tokenize_transliterates_brands() {
        let tokens = tokenize("шанель джумбо классик");
        assert!(tokens.contains("chanel"));
        assert!(tokens.contains("jumbo"));
        assert!(tokens.contains("classic"));
        // Original spelling preserved for matching Cyrillic file names
        assert!(tokens.contains("шанель"));
    }

    #[test]
    fn test_tokenize_multi_token_mapping() {
        let tokens = tokenize("джиммичу саеда");
        assert!(tokens.contains("jimmy"));
        assert!(tokens.contains("choo"));
        assert!(tokens.contains("saeda"));
    }

    #[test]
    fn test_tokenize_keeps_model_numbers() {
        let tokens = tokenize("Chanel 25");
        assert!(tokens.contains("25"));
        assert!(!tokenize("размер 5").contains("5"));
    }

    #[test]
    fn test_token_overlap() {
        let a = set(&["chanel", "jumbo", "classic"]);
        let b = set(&["chanel", "jumbo", "flap"]);
        assert!((token_overlap(&a, &b) - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(token_overlap(&a, &set(&[])), 0.0);
    }

    #[test]
    fn test_mentions_brand() {
        assert!(mentions_brand("есть сумка от Шанель?"));
        assert!(!mentions_brand("с алматы, 38 размер"));
    }
}
