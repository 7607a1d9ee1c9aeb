use super::*;

fn ctx(city: &str, product: &str, kind: ProductKind, size: &str, color: &str, address: &str) -> OrderContext {
    OrderContext {
        city: city.to_string(),
        product: product.to_string(),
        product_type: kind,
        size: size.to_string(),
        color: color.to_string(),
        address: address.to_string(),
        ready_to_order: false,
    }
}

fn fields(product: &str) -> ExtractedFields {
    ExtractedFields {
        product: product.to_string(),
        ..ExtractedFields::default()
    }
}

#[test]
fn test_merge_empty_product_keeps_dependent_fields() {
    let base = ctx("Алматы", "Chanel Jumbo Classic Flap", ProductKind::Bag, "", "черный", "ул. Абая 10");
    let mut incoming = ExtractedFields::default();
    incoming.city = "Астана".to_string();

    let merged = merge_order_context(&base, &incoming);
    assert_eq!(merged.city, "Астана");
    assert_eq!(merged.product, "Chanel Jumbo Classic Flap");
    assert_eq!(merged.color, "черный");
    assert_eq!(merged.address, "ул. Абая 10");
}

#[test]
fn test_merge_refinement_keeps_dependent_fields() {
    let base = ctx("Алматы", "Chanel Jumbo", ProductKind::Bag, "", "черный", "ул. Абая 10");
    let merged = merge_order_context(&base, &fields("Chanel Jumbo Classic Flap"));
    assert_eq!(merged.product, "Chanel Jumbo Classic Flap");
    assert_eq!(merged.color, "черный");
    assert_eq!(merged.address, "ул. Абая 10");
}

#[test]
fn test_merge_switch_clears_dependent_fields_keeps_city() {
    let base = ctx("Алматы", "Jimmy Choo Saeda", ProductKind::Shoes, "38", "серебро", "ул. Абая 10");
    let merged = merge_order_context(&base, &fields("Miu Miu Arcadie"));
    assert_eq!(merged.product, "Miu Miu Arcadie");
    assert_eq!(merged.city, "Алматы");
    assert!(merged.size.is_empty());
    assert!(merged.color.is_empty());
    assert!(merged.address.is_empty());
}

#[test]
fn test_merge_switch_then_applies_incoming_values() {
    let base = ctx("Алматы", "Jimmy Choo Saeda", ProductKind::Shoes, "38", "серебро", "");
    let mut incoming = fields("Golden Goose Super-Star");
    incoming.size = "39".to_string();
    let merged = merge_order_context(&base, &incoming);
    assert_eq!(merged.size, "39");
    assert!(merged.color.is_empty());
}

#[test]
fn test_merge_exact_half_overlap_is_refinement() {
    // {chanel, jumbo} vs {chanel, arcadie}: 1/2 overlap, on the boundary
    let base = ctx("", "chanel jumbo", ProductKind::Bag, "", "черный", "");
    let merged = merge_order_context(&base, &fields("chanel arcadie"));
    assert_eq!(merged.color, "черный");
}

#[test]
fn test_merge_transliterated_mention_is_not_a_switch() {
    let base = ctx("", "Chanel Jumbo", ProductKind::Bag, "", "черный", "");
    let merged = merge_order_context(&base, &fields("шанель джумбо"));
    assert_eq!(merged.color, "черный");
}

#[test]
fn test_merge_empty_incoming_does_not_erase() {
    let base = ctx("Алматы", "Opyum", ProductKind::Shoes, "37", "", "");
    let merged = merge_order_context(&base, &ExtractedFields::default());
    assert_eq!(merged.city, "Алматы");
    assert_eq!(merged.size, "37");
    assert!(!merged.ready_to_order);
}

#[test]
fn test_merge_infers_type_from_merged_product() {
    let base = OrderContext::default();
    let merged = merge_order_context(&base, &fields("туфли Saint Laurent Opyum"));
    assert_eq!(merged.product_type, ProductKind::Shoes);
}

#[test]
fn test_merge_ready_to_order_reflects_current_message_only() {
    let mut base = OrderContext::default();
    base.ready_to_order = true;
    let merged = merge_order_context(&base, &ExtractedFields::default());
    assert!(!merged.ready_to_order);
}

#[test]
fn test_missing_fields_priority_order() {
    let empty = OrderContext {
        product_type: ProductKind::Shoes,
        ..OrderContext::default()
    };
    let missing = missing_fields(&empty, false);
    assert_eq!(&missing[..2], &[MissingField::City, MissingField::Product]);
    assert_eq!(missing[2], MissingField::Size);
    // Address only appears once everything else is in hand
    assert!(!missing.contains(&MissingField::Address));
}

#[test]
fn test_missing_fields_bag_never_needs_size() {
    let c = ctx("", "", ProductKind::Bag, "", "", "");
    assert!(!missing_fields(&c, false).contains(&MissingField::Size));
    let c = ctx("Алматы", "Chanel Jumbo", ProductKind::Bag, "", "", "");
    assert_eq!(missing_fields(&c, false), vec![MissingField::Address]);
}

#[test]
fn test_missing_fields_color_gate() {
    let c = ctx("Алматы", "Miu Miu Arcadie", ProductKind::Bag, "", "", "");
    assert_eq!(missing_fields(&c, true), vec![MissingField::Color]);
    let done = ctx("Алматы", "Miu Miu Arcadie", ProductKind::Bag, "", "беж", "ул. Абая 10");
    assert!(missing_fields(&done, true).is_empty());
}

#[test]
fn test_order_intent_round_trip() {
    assert!(!has_order_intent("какой у вас адрес?"));
    assert!(has_order_intent("адрес доставки: Алматы, ул. Абая 10"));
    assert!(has_order_intent("хочу оформить заказ"));
    assert!(has_order_intent("Беру!"));
    assert!(!has_order_intent("покажите фото туфель"));
}

#[test]
fn test_strip_checkout_prompts_drops_short_nudges() {
    assert_eq!(strip_checkout_prompts(""), "");
    assert_eq!(strip_checkout_prompts("Давайте оформим заказ?"), "");
    let mixed = "Эта модель из натуральной кожи.|||Напишите, пожалуйста, адрес доставки";
    assert_eq!(strip_checkout_prompts(mixed), "Эта модель из натуральной кожи.");
}

#[test]
fn test_strip_checkout_prompts_keeps_long_parts_verbatim() {
    let long = format!(
        "Chanel Jumbo Classic Flap сшита из мягкой икры, фурнитура под золото, \
         внутри два отделения и карман на молнии {}. Давайте оформим заказ!",
        "о".repeat(40)
    );
    assert!(long.chars().count() >= 120);
    assert_eq!(strip_checkout_prompts(&long), long);
}

#[test]
fn test_contains_and_strip_order_confirm() {
    assert!(contains_order_confirm("Хорошо, оформляем заказ!"));
    assert!(contains_order_confirm("отлично, оформим заказ завтра"));
    assert!(!contains_order_confirm("эта модель есть в наличии"));

    let stripped = strip_order_confirm("Хорошо, оформляем заказ!|||Какой размер вам нужен?");
    assert!(!contains_order_confirm(&stripped));
    assert!(stripped.contains("размер"));

    // Nothing but the confirmation left: fall back to a neutral line
    assert_eq!(strip_order_confirm("Хорошо, оформляем заказ."), "Сейчас уточню детали заказа.");
}

#[test]
fn test_already_requests_missing() {
    assert!(already_requests_missing(
        "Подскажите, из какого вы города?",
        &[MissingField::City, MissingField::Product]
    ));
    assert!(!already_requests_missing(
        "Эта модель есть в наличии.",
        &[MissingField::Size]
    ));
}

#[test]
fn test_dedupe_reply_parts() {
    let text = "Есть в наличии!|||Есть в наличии.|||Какой размер вам нужен?";
    let deduped = dedupe_reply_parts(text);
    assert_eq!(split_reply_parts(&deduped).len(), 2);
}

#[test]
fn test_strip_duplicate_greeting() {
    let reply = "Здравствуйте!|||Эта модель есть в наличии.";
    let stripped = strip_duplicate_greeting(reply, true);
    assert_eq!(stripped, "Эта модель есть в наличии.");
    // First contact keeps the greeting
    assert_eq!(strip_duplicate_greeting(reply, false), reply);
    // A substantive first part survives even after a prior greeting
    let merged = "Добрый день, эта модель есть в наличии и в вашем размере.";
    assert_eq!(strip_duplicate_greeting(merged, true), merged);
}

#[test]
fn test_format_order_guard_lists_missing_fields() {
    let c = ctx("Алматы", "", ProductKind::Unknown, "", "", "");
    let guard = format_order_guard(&c, &missing_fields(&c, false), false);
    assert!(guard.contains("товар"));
    assert!(guard.contains("Алматы"));
    assert!(guard.contains(ORDER_CONFIRM_TEXT));
}

#[test]
fn test_extracted_fields_coerces_scalars() {
    let raw = serde_json::json!({
        "city": "Алматы",
        "product": "Jimmy Choo Azia 95",
        "product_type": "shoes",
        "size": 38,
        "color": null,
        "ready_to_order": true,
    });
    let f = ExtractedFields::from_json(&raw);
    assert_eq!(f.size, "38");
    assert_eq!(f.color, "");
    assert_eq!(f.product_type, ProductKind::Shoes);
    assert!(f.ready_to_order);
}

#[test]
fn test_order_context_state_round_trip() {
    let c = ctx("Алматы", "Opyum", ProductKind::Shoes, "37", "черный", "");
    let restored = OrderContext::from_state(&c.to_state());
    assert_eq!(restored, c);
    // Foreign blobs decode without error
    let foreign = OrderContext::from_state(&serde_json::json!({"size": 38, "junk": [1, 2]}));
    assert_eq!(foreign.size, "38");
    assert_eq!(foreign.product_type, ProductKind::Unknown);
}
