use super::*;
use crate::config::CoreConfig;
use crate::error::Error;
use crate::notify::OrderNotifier;
use crate::order::{OrderContext, ProductKind, ORDER_CONFIRM_TEXT};
use crate::services::{
    Availability, MockFieldExtractor, MockInventory, MockPhotoIndex, MockRetrieval, PhotoRef,
    RetrievedDoc,
};
use crate::ExtractedFields;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use vitrina_channels::{ChannelAdapter, OutgoingPhoto};
use vitrina_llm::{CompletionProvider, CompletionRequest, CompletionResponse};
use vitrina_storage::{ConversationStore, MemoryStore, StoredRole};

#[derive(Default)]
struct RecordingChannel {
    texts: Mutex<Vec<(String, String)>>,
    photos: Mutex<Vec<(String, Vec<OutgoingPhoto>)>>,
}

impl RecordingChannel {
    async fn texts_for(&self, chat_id: &str) -> Vec<String> {
        self.texts
            .lock()
            .await
            .iter()
            .filter(|(id, _)| id == chat_id)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

#[async_trait]
impl ChannelAdapter for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send_text(&self, chat_id: &str, text: &str) -> vitrina_channels::Result<()> {
        self.texts
            .lock()
            .await
            .push((chat_id.to_string(), text.to_string()));
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: &str,
        photo: &OutgoingPhoto,
    ) -> vitrina_channels::Result<()> {
        self.photos
            .lock()
            .await
            .push((chat_id.to_string(), vec![photo.clone()]));
        Ok(())
    }

    async fn send_photos(
        &self,
        chat_id: &str,
        photos: &[OutgoingPhoto],
    ) -> vitrina_channels::Result<()> {
        self.photos
            .lock()
            .await
            .push((chat_id.to_string(), photos.to_vec()));
        Ok(())
    }
}

struct FixedProvider {
    content: String,
}

#[async_trait]
impl CompletionProvider for FixedProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    fn default_model(&self) -> &str {
        "fixed-model"
    }

    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> vitrina_llm::Result<CompletionResponse> {
        Ok(CompletionResponse {
            content: self.content.clone(),
            model: "fixed-model".to_string(),
        })
    }
}

struct HarnessSpec {
    extracted: ExtractedFields,
    docs: Vec<RetrievedDoc>,
    photos: Vec<PhotoRef>,
    availability: Availability,
    reply: &'static str,
    retrieval_fails: bool,
}

impl Default for HarnessSpec {
    fn default() -> Self {
        Self {
            extracted: ExtractedFields::default(),
            docs: Vec::new(),
            photos: Vec::new(),
            availability: Availability::OutOfStock,
            reply: "Эта модель есть в наличии.",
            retrieval_fails: false,
        }
    }
}

struct Harness {
    orchestrator: Orchestrator,
    channel: Arc<RecordingChannel>,
    store: Arc<MemoryStore>,
}

fn build(spec: HarnessSpec) -> Harness {
    let mut extractor = MockFieldExtractor::new();
    let extracted = spec.extracted;
    extractor
        .expect_extract()
        .returning(move |_, _, _| Ok(extracted.clone()));

    let mut retrieval = MockRetrieval::new();
    if spec.retrieval_fails {
        retrieval
            .expect_search()
            .returning(|_| Err(Error::Retrieval("timeout".to_string())));
    } else {
        let docs = spec.docs;
        retrieval
            .expect_search()
            .returning(move |_| Ok(docs.clone()));
    }

    let mut inventory = MockInventory::new();
    let availability = spec.availability;
    inventory
        .expect_check_availability()
        .returning(move |_, _, _| Ok(availability.clone()));

    let mut index = MockPhotoIndex::new();
    let photos = spec.photos;
    index
        .expect_find_photos()
        .returning(move |_| Ok(photos.clone()));

    let channel = Arc::new(RecordingChannel::default());
    let store = Arc::new(MemoryStore::new());
    let config = CoreConfig {
        manager_chat_ids: vec!["7000@c.us".to_string()],
        ..CoreConfig::default()
    };
    let orchestrator = Orchestrator::new(
        Arc::new(extractor),
        Arc::new(retrieval),
        Arc::new(inventory),
        Arc::new(index),
        Arc::new(FixedProvider {
            content: spec.reply.to_string(),
        }),
        store.clone(),
        channel.clone(),
        config,
    )
    .with_notifier(OrderNotifier::new(
        channel.clone(),
        Some("orders@g.us".to_string()),
    ));
    Harness {
        orchestrator,
        channel,
        store,
    }
}

fn bag_fields(product: &str) -> ExtractedFields {
    ExtractedFields {
        product: product.to_string(),
        product_type: ProductKind::Bag,
        ..ExtractedFields::default()
    }
}

async fn stored_context(store: &MemoryStore, chat_id: &str) -> OrderContext {
    let state = store.load_order_state(chat_id).await.unwrap();
    OrderContext::from_state(&state)
}

#[tokio::test]
async fn test_turn_replies_and_persists_state() {
    let harness = build(HarnessSpec {
        extracted: bag_fields("Chanel Jumbo"),
        photos: vec![PhotoRef {
            url: "https://drive.test/1".to_string(),
            filename: "сумка черные Chanel Jumbo 1.jpg".to_string(),
        }],
        ..HarnessSpec::default()
    });

    harness
        .orchestrator
        .handle_message("77001@c.us", "Аружан", "покажите шанель джумбо")
        .await;

    let texts = harness.channel.texts_for("77001@c.us").await;
    assert!(!texts.is_empty());
    assert_eq!(harness.channel.photos.lock().await.len(), 1);

    let ctx = stored_context(&harness.store, "77001@c.us").await;
    assert_eq!(ctx.product, "Chanel Jumbo");
    assert_eq!(ctx.product_type, ProductKind::Bag);
    // Turn saved both sides of the exchange
    assert_eq!(harness.store.message_count("77001@c.us").await, 2);
}

#[tokio::test]
async fn test_missing_field_question_is_forced() {
    let harness = build(HarnessSpec {
        extracted: bag_fields("Chanel Jumbo"),
        reply: "Отличный выбор.",
        ..HarnessSpec::default()
    });
    // Prior exchange so the client does not count as new
    let store: &dyn ConversationStore = harness.store.as_ref();
    store
        .save_message("77002@c.us", StoredRole::User, "привет", "Аружан")
        .await
        .unwrap();
    store
        .save_message("77002@c.us", StoredRole::Assistant, "Добрый день!", "")
        .await
        .unwrap();

    harness
        .orchestrator
        .handle_message("77002@c.us", "Аружан", "хочу шанель джумбо")
        .await;

    let texts = harness.channel.texts_for("77002@c.us").await;
    // The draft had no question, so the first missing field's question follows
    assert!(texts.iter().any(|t| t.contains("из какого вы города")));
}

#[tokio::test]
async fn test_checkout_nudge_stripped_without_intent() {
    let harness = build(HarnessSpec {
        reply: "Посмотрите эту модель.|||Давайте оформим заказ?",
        ..HarnessSpec::default()
    });

    harness
        .orchestrator
        .handle_message("77003@c.us", "Аружан", "просто смотрю")
        .await;

    let texts = harness.channel.texts_for("77003@c.us").await;
    assert!(texts.iter().any(|t| t.contains("Посмотрите эту модель")));
    assert!(!texts.iter().any(|t| t.contains("оформим заказ")));
}

#[tokio::test]
async fn test_complete_order_confirms_and_notifies() {
    let harness = build(HarnessSpec {
        extracted: ExtractedFields {
            address: "ул. Абая 10".to_string(),
            ready_to_order: true,
            ..ExtractedFields::default()
        },
        availability: Availability::InStock {
            quantity: 2,
            price: "450 000 тг".to_string(),
        },
        reply: "Записала адрес.",
        ..HarnessSpec::default()
    });
    let seed = OrderContext {
        city: "Алматы".to_string(),
        product: "Chanel Jumbo".to_string(),
        product_type: ProductKind::Bag,
        color: "черный".to_string(),
        ..OrderContext::default()
    };
    let store: &dyn ConversationStore = harness.store.as_ref();
    store
        .save_order_state("77004@c.us", &seed.to_state())
        .await
        .unwrap();

    harness
        .orchestrator
        .handle_message("77004@c.us", "Аружан", "адрес доставки: ул. Абая 10")
        .await;
    // Let the detached notification task run
    tokio::time::sleep(Duration::from_millis(20)).await;

    let client_texts = harness.channel.texts_for("77004@c.us").await;
    assert!(client_texts.iter().any(|t| t.contains(ORDER_CONFIRM_TEXT)));
    assert!(client_texts.iter().any(|t| t.contains("450 000 тг")));

    let group_texts = harness.channel.texts_for("orders@g.us").await;
    assert_eq!(group_texts.len(), 1);
    assert!(group_texts[0].contains("Новый заказ"));
    assert!(group_texts[0].contains("Chanel Jumbo"));
}

#[tokio::test]
async fn test_unavailable_product_blocks_confirmation() {
    let harness = build(HarnessSpec {
        extracted: ExtractedFields {
            address: "ул. Абая 10".to_string(),
            ready_to_order: true,
            ..ExtractedFields::default()
        },
        docs: vec![RetrievedDoc {
            product_name: "Miu Miu Arcadie".to_string(),
            snippet: String::new(),
        }],
        availability: Availability::OutOfStock,
        reply: "Записала адрес.",
        ..HarnessSpec::default()
    });
    let seed = OrderContext {
        city: "Алматы".to_string(),
        product: "Chanel Jumbo".to_string(),
        product_type: ProductKind::Bag,
        ..OrderContext::default()
    };
    let store: &dyn ConversationStore = harness.store.as_ref();
    store
        .save_order_state("77005@c.us", &seed.to_state())
        .await
        .unwrap();

    harness
        .orchestrator
        .handle_message("77005@c.us", "Аружан", "оформляем, адрес доставки: ул. Абая 10")
        .await;

    let texts = harness.channel.texts_for("77005@c.us").await;
    assert!(!texts.iter().any(|t| t.contains(ORDER_CONFIRM_TEXT)));
    assert!(texts.iter().any(|t| t.contains("нет в наличии")));
    assert!(texts.iter().any(|t| t.contains("Miu Miu Arcadie")));
}

#[tokio::test]
async fn test_handoff_saves_message_without_reply() {
    let harness = build(HarnessSpec::default());
    let store: &dyn ConversationStore = harness.store.as_ref();
    store.set_handoff("77006@c.us", true).await.unwrap();

    harness
        .orchestrator
        .handle_message("77006@c.us", "Аружан", "здравствуйте")
        .await;

    assert!(harness.channel.texts_for("77006@c.us").await.is_empty());
    assert_eq!(harness.store.message_count("77006@c.us").await, 1);
}

#[tokio::test]
async fn test_failure_sends_apology_and_keeps_state() {
    let harness = build(HarnessSpec {
        retrieval_fails: true,
        ..HarnessSpec::default()
    });
    let seed = OrderContext {
        city: "Алматы".to_string(),
        ..OrderContext::default()
    };
    let store: &dyn ConversationStore = harness.store.as_ref();
    store
        .save_order_state("77007@c.us", &seed.to_state())
        .await
        .unwrap();

    harness
        .orchestrator
        .handle_message("77007@c.us", "Аружан", "хочу джумбо")
        .await;

    let texts = harness.channel.texts_for("77007@c.us").await;
    assert_eq!(texts, vec![crate::error::apology_text().to_string()]);
    // No partial merge: the stored context is untouched
    let ctx = stored_context(&harness.store, "77007@c.us").await;
    assert_eq!(ctx, seed);
}

#[tokio::test]
async fn test_answering_missing_field_sends_no_photos() {
    let harness = build(HarnessSpec {
        extracted: ExtractedFields {
            city: "Алматы".to_string(),
            ..ExtractedFields::default()
        },
        photos: vec![PhotoRef {
            url: "https://drive.test/1".to_string(),
            filename: "сумка черные Chanel Jumbo 1.jpg".to_string(),
        }],
        ..HarnessSpec::default()
    });
    let seed = OrderContext {
        product: "Chanel Jumbo".to_string(),
        product_type: ProductKind::Bag,
        ..OrderContext::default()
    };
    let store: &dyn ConversationStore = harness.store.as_ref();
    store
        .save_order_state("77008@c.us", &seed.to_state())
        .await
        .unwrap();

    harness
        .orchestrator
        .handle_message("77008@c.us", "Аружан", "с алматы")
        .await;

    assert!(harness.channel.photos.lock().await.is_empty());
    let ctx = stored_context(&harness.store, "77008@c.us").await;
    assert_eq!(ctx.city, "Алматы");
}

#[tokio::test]
async fn test_repeated_showcase_is_suppressed() {
    let harness = build(HarnessSpec {
        extracted: bag_fields("Chanel Jumbo"),
        photos: vec![PhotoRef {
            url: "https://drive.test/1".to_string(),
            filename: "сумка черные Chanel Jumbo 1.jpg".to_string(),
        }],
        ..HarnessSpec::default()
    });

    harness
        .orchestrator
        .handle_message("77009@c.us", "Аружан", "есть шанель джумбо?")
        .await;
    harness
        .orchestrator
        .handle_message("77009@c.us", "Аружан", "шанель джумбо интересует")
        .await;

    // First turn sends the showcase; the repeat does not
    assert_eq!(harness.channel.photos.lock().await.len(), 1);
}

#[tokio::test]
async fn test_explicit_photo_request_bypasses_suppression() {
    let harness = build(HarnessSpec {
        extracted: bag_fields("Chanel Jumbo"),
        photos: vec![PhotoRef {
            url: "https://drive.test/1".to_string(),
            filename: "сумка черные Chanel Jumbo 1.jpg".to_string(),
        }],
        ..HarnessSpec::default()
    });

    harness
        .orchestrator
        .handle_message("77010@c.us", "Аружан", "есть шанель джумбо?")
        .await;
    harness
        .orchestrator
        .handle_message("77010@c.us", "Аружан", "скиньте фото шанель джумбо")
        .await;

    assert_eq!(harness.channel.photos.lock().await.len(), 2);
}

#[tokio::test]
async fn test_manager_handoff_command() {
    let harness = build(HarnessSpec::default());

    harness
        .orchestrator
        .handle_message("7000@c.us", "Менеджер", "/handoff on 77011")
        .await;

    let store: &dyn ConversationStore = harness.store.as_ref();
    assert!(store.is_handoff("77011@c.us").await.unwrap());
    let texts = harness.channel.texts_for("7000@c.us").await;
    assert!(texts[0].contains("включен для 77011@c.us"));

    harness
        .orchestrator
        .handle_message("7000@c.us", "Менеджер", "/bot on 77011")
        .await;
    assert!(!store.is_handoff("77011@c.us").await.unwrap());
}

#[tokio::test]
async fn test_non_manager_cannot_use_commands() {
    let harness = build(HarnessSpec::default());

    harness
        .orchestrator
        .handle_message("77012@c.us", "Аружан", "/handoff on 77013")
        .await;

    let store: &dyn ConversationStore = harness.store.as_ref();
    assert!(!store.is_handoff("77013@c.us").await.unwrap());
    // Treated as a normal message: the client still gets a reply
    assert!(!harness.channel.texts_for("77012@c.us").await.is_empty());
}
