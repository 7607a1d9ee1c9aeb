//! The per-message processing pass

use super::core::Orchestrator;
use super::helpers::{
    answering_missing_field, append_alternatives, assistant_already_greeted, build_product_context,
    color_unavailable_message, format_history, last_assistant_reply, similar_product_names,
};
use super::types::{TurnReply, EMPTY_REPLY_FALLBACK, SYSTEM_PROMPT};
use crate::error::{apology_text, Result};
use crate::notify::{spawn_detached, OrderSummary};
use crate::order::{
    already_requests_missing, contains_order_confirm, dedupe_reply_parts, format_order_guard,
    has_order_intent, has_question, merge_order_context, missing_fields, split_reply_parts,
    strip_checkout_prompts, strip_duplicate_greeting, strip_order_confirm, OrderContext,
    ProductKind, ORDER_CONFIRM_TEXT, REPLY_DELIMITER,
};
use crate::photos::{detect_color_in_text, is_photo_request, product_key, ResolveRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use vitrina_channels::OutgoingPhoto;
use vitrina_llm::{CompletionRequest, Message};
use vitrina_storage::StoredRole;

/// Pause between consecutive parts of a multi-part reply
const PART_SEND_GAP: Duration = Duration::from_millis(800);

fn is_manager_command(text: &str) -> bool {
    let t = text.trim().to_lowercase();
    t.starts_with("/handoff") || t.starts_with("/bot")
}

fn normalize_chat_id(raw: &str) -> String {
    if raw.contains('@') {
        raw.to_string()
    } else {
        format!("{raw}@c.us")
    }
}

impl Orchestrator {
    /// Process one aggregated client message end to end.
    ///
    /// Every message gets exactly one outcome: a reply, a deliberate handoff
    /// no-op, or a short apology. Failures never leave the conversation
    /// locked or half-merged.
    pub async fn handle_message(&self, chat_id: &str, sender_name: &str, text: &str) {
        if self.config.is_manager(chat_id) && is_manager_command(text) {
            if let Err(err) = self.handle_manager_command(chat_id, text).await {
                warn!(chat_id, %err, "manager command failed");
            }
            return;
        }

        let _guard = self.locks.acquire(chat_id).await;

        match self.store.is_handoff(chat_id).await {
            Ok(true) => {
                // A human has the conversation: record the message, stay quiet
                if let Err(err) = self
                    .store
                    .save_message(chat_id, StoredRole::User, text, sender_name)
                    .await
                {
                    warn!(chat_id, %err, "failed to save message during handoff");
                }
                info!(chat_id, "handoff active, no auto-reply");
                return;
            }
            Ok(false) => {}
            Err(err) => {
                error!(chat_id, %err, "handoff check failed");
                self.send_apology(chat_id).await;
                return;
            }
        }

        match self.process_turn(chat_id, sender_name, text).await {
            Ok(reply) => self.deliver(chat_id, reply).await,
            Err(err) => {
                error!(chat_id, %err, "turn failed");
                self.send_apology(chat_id).await;
            }
        }
        self.locks.evict_idle();
    }

    async fn send_apology(&self, chat_id: &str) {
        if let Err(err) = self.channel.send_text(chat_id, apology_text()).await {
            error!(chat_id, %err, "failed to send apology");
        }
    }

    /// The pipeline proper: extract, merge, generate, filter, resolve photos.
    ///
    /// State is only persisted after the completion call succeeds; a failure
    /// anywhere leaves the stored context exactly as it was before this
    /// message.
    async fn process_turn(
        &self,
        chat_id: &str,
        sender_name: &str,
        user_message: &str,
    ) -> Result<TurnReply> {
        self.store
            .save_message(chat_id, StoredRole::User, user_message, sender_name)
            .await?;
        self.store.reset_nudge_state(chat_id).await?;

        let state = self.store.load_order_state(chat_id).await?;
        let base_ctx = OrderContext::from_state(&state);
        let history = self
            .store
            .history(chat_id, self.config.history_limit)
            .await?;
        let is_new_client = history.len() <= 1;

        let docs = self.retrieval.search(user_message).await?;
        let rag_product = docs
            .first()
            .map(|d| d.product_name.clone())
            .unwrap_or_default();

        let mut extracted = self
            .extractor
            .extract(&history, user_message, &base_ctx)
            .await?;
        if extracted.product.trim().is_empty()
            && base_ctx.product.trim().is_empty()
            && !rag_product.is_empty()
        {
            // The conversation is about whatever retrieval surfaced
            extracted.product = rag_product.clone();
        }
        let llm_ready = extracted.ready_to_order;

        // Snapshot what was missing BEFORE the merge: it decides later
        // whether this turn merely answers a question we asked.
        let color_required_pre = self.requirement.is_color_required(&base_ctx.product).await;
        let pre_merge_missing = missing_fields(&base_ctx, color_required_pre);

        let mut merged = merge_order_context(&base_ctx, &extracted);
        if merged.product.is_empty() && !rag_product.is_empty() {
            merged.product = rag_product.clone();
        }
        if merged.product_type == ProductKind::Unknown {
            merged.product_type = ProductKind::infer(&merged.product);
        }

        let color_required = self.requirement.is_color_required(&merged.product).await;
        let missing = missing_fields(&merged, color_required);

        let system_text = format!(
            "{}\n\n{}",
            SYSTEM_PROMPT
                .replace("{product_context}", &build_product_context(&docs))
                .replace("{conversation_history}", &format_history(&history)),
            format_order_guard(&merged, &missing, color_required),
        );
        let completion = self
            .provider
            .complete(
                CompletionRequest::new(vec![
                    Message::system(system_text),
                    Message::user(user_message),
                ])
                .with_temperature(0.7)
                .with_max_tokens(700),
            )
            .await?;

        let mut draft =
            strip_duplicate_greeting(&completion.content, assistant_already_greeted(&history));

        let user_intent = has_order_intent(user_message);
        let address_just_collected = !extracted.address.trim().is_empty();
        if !user_intent {
            let stripped = strip_checkout_prompts(&draft);
            draft = if stripped.is_empty() {
                EMPTY_REPLY_FALLBACK.to_string()
            } else {
                stripped
            };
        }

        let mut order_placed = false;
        if !missing.is_empty() {
            // Fields outstanding: the order must not be confirmed yet
            if contains_order_confirm(&draft) {
                draft = strip_order_confirm(&draft);
            }
            let should_force = !is_new_client
                && (user_intent || address_just_collected || !merged.product.is_empty());
            if should_force && !already_requests_missing(&draft, &missing) && !has_question(&draft)
            {
                draft = format!("{draft}{REPLY_DELIMITER}{}", missing[0].question());
            }
        } else if (user_intent || address_just_collected || llm_ready)
            && !contains_order_confirm(&draft)
        {
            (draft, order_placed) = self.confirm_with_availability(&merged, &docs, draft).await;
        } else if contains_order_confirm(&draft) {
            order_placed = true;
        }

        draft = dedupe_reply_parts(&draft);

        let answering = answering_missing_field(&pre_merge_missing, &extracted);
        let previous_reply = last_assistant_reply(&history);
        let mut photos = self
            .resolver
            .resolve(&ResolveRequest {
                user_message,
                context: Some(&merged),
                retrieved: &docs,
                draft_reply: &draft,
                previous_reply,
                answering_missing_field: answering,
            })
            .await;

        // Asked-for color must not be silently swapped for another one
        if let Some(requested) = detect_color_in_text(user_message) {
            if photos.is_empty() && !merged.product.is_empty() {
                let available = self.resolver.available_colors(&merged.product).await;
                if available.contains(requested) {
                    draft = format!(
                        "По модели {} цвет {requested} есть, сейчас уточню и отправлю актуальные фото.",
                        merged.product
                    );
                } else {
                    let alternatives = similar_product_names(&docs, &[merged.product.as_str()], 3);
                    draft = append_alternatives(
                        &color_unavailable_message(&merged.product, requested, &available),
                        &alternatives,
                    );
                    if merged.color == requested {
                        merged.color.clear();
                    }
                }
            }
        }

        // A showcase the client did not ask for goes out once per product
        if !photos.is_empty() {
            let key = product_key(&photos, user_message);
            if !key.is_empty() {
                let already_sent = match self.store.has_sent_photos(chat_id, &key).await {
                    Ok(sent) => sent,
                    Err(err) => {
                        warn!(chat_id, %err, "sent-photos check failed");
                        false
                    }
                };
                if already_sent && !is_photo_request(user_message) {
                    debug!(chat_id, key, "photos already sent, suppressing");
                    photos.clear();
                } else if let Err(err) = self.store.mark_photos_sent(chat_id, &key).await {
                    warn!(chat_id, %err, "failed to mark photos as sent");
                }
            }
        }

        self.store
            .save_order_state(chat_id, &merged.to_state())
            .await?;
        let reply = TurnReply {
            parts: split_reply_parts(&draft),
            photos,
            order: order_placed.then(|| OrderSummary::from_context(&merged, chat_id)),
        };
        self.store
            .save_message(chat_id, StoredRole::Assistant, &reply.plain_text(), "")
            .await?;
        Ok(reply)
    }

    /// Check stock and either confirm the order or decline with alternatives.
    ///
    /// An inventory failure still confirms: losing a sale over a flaky stock
    /// sheet is worse than a manager double-checking one order.
    async fn confirm_with_availability(
        &self,
        merged: &OrderContext,
        docs: &[crate::services::RetrievedDoc],
        draft: String,
    ) -> (String, bool) {
        if merged.product.is_empty() {
            return (format!("{draft}{REPLY_DELIMITER}{ORDER_CONFIRM_TEXT}"), true);
        }
        match self
            .inventory
            .check_availability(&merged.product, &merged.size, &merged.color)
            .await
        {
            Ok(availability) if availability.is_available() => {
                info!(product = %merged.product, "product available, confirming order");
                (
                    format!(
                        "{}{REPLY_DELIMITER}{ORDER_CONFIRM_TEXT}",
                        availability.message(&merged.product)
                    ),
                    true,
                )
            }
            Ok(availability) => {
                info!(product = %merged.product, "product unavailable, order not confirmed");
                let alternatives = similar_product_names(docs, &[merged.product.as_str()], 3);
                (
                    append_alternatives(&availability.message(&merged.product), &alternatives),
                    false,
                )
            }
            Err(err) => {
                warn!(product = %merged.product, %err, "availability check failed, confirming anyway");
                (format!("{draft}{REPLY_DELIMITER}{ORDER_CONFIRM_TEXT}"), true)
            }
        }
    }

    /// Send the reply: text parts, then photos, then a trailing question.
    ///
    /// When photos go out, a final question part is held back and sent after
    /// them, so the client's screen ends on the question.
    async fn deliver(&self, chat_id: &str, reply: TurnReply) {
        let mut parts = reply.parts.clone();
        let mut follow_up = None;
        if !reply.photos.is_empty() {
            if let Some(last) = parts.last() {
                if has_question(last) {
                    follow_up = parts.pop();
                }
            }
        }

        let multi = parts.len() > 1;
        for part in &parts {
            if let Err(err) = self.channel.send_text(chat_id, part).await {
                warn!(chat_id, %err, "failed to send reply part");
            }
            if multi {
                tokio::time::sleep(PART_SEND_GAP).await;
            }
        }

        if !reply.photos.is_empty() {
            let outgoing: Vec<OutgoingPhoto> = reply
                .photos
                .iter()
                .map(|p| OutgoingPhoto {
                    file_id: p.url.clone(),
                    filename: p.filename.clone(),
                    caption: p.caption.clone(),
                })
                .collect();
            if let Err(err) = self.channel.send_photos(chat_id, &outgoing).await {
                warn!(chat_id, %err, "failed to send photos");
            }
            if let Some(question) = follow_up {
                tokio::time::sleep(PART_SEND_GAP).await;
                if let Err(err) = self.channel.send_text(chat_id, &question).await {
                    warn!(chat_id, %err, "failed to send follow-up question");
                }
            }
        }

        if let (Some(summary), Some(notifier)) = (reply.order, self.notifier.as_ref()) {
            let notifier = Arc::clone(notifier);
            spawn_detached("order_notification", async move {
                notifier.notify(&summary).await
            });
        }
    }

    async fn handle_manager_command(&self, chat_id: &str, text: &str) -> Result<()> {
        let parts: Vec<&str> = text.split_whitespace().collect();
        let command = parts.first().map(|c| c.to_lowercase()).unwrap_or_default();

        match command.as_str() {
            "/handoff" if parts.len() >= 3 => {
                let action = parts[1].to_lowercase();
                let target = normalize_chat_id(parts[2]);
                let confirmation = match action.as_str() {
                    "on" => {
                        self.store.set_handoff(&target, true).await?;
                        format!("Хэнд-офф включен для {target}")
                    }
                    "off" => {
                        self.store.set_handoff(&target, false).await?;
                        format!("Хэнд-офф выключен для {target}")
                    }
                    "status" => {
                        let enabled = self.store.is_handoff(&target).await?;
                        format!(
                            "Статус для {target}: {}",
                            if enabled { "ON" } else { "OFF" }
                        )
                    }
                    _ => return Ok(()),
                };
                self.channel.send_text(chat_id, &confirmation).await?;
            }
            "/handoff" => {
                self.channel
                    .send_text(
                        chat_id,
                        "Укажите номер клиента. Пример: /handoff on 77064071507",
                    )
                    .await?;
            }
            "/bot" if parts.len() >= 2 => {
                // `/bot off` is handoff on; the flag stores "bot muted"
                let action = parts[1].to_lowercase();
                let target = parts
                    .get(2)
                    .map_or_else(|| chat_id.to_string(), |t| normalize_chat_id(t));
                let confirmation = match action.as_str() {
                    "on" => {
                        self.store.set_handoff(&target, false).await?;
                        format!("Бот включен для {target}")
                    }
                    "off" => {
                        self.store.set_handoff(&target, true).await?;
                        format!("Бот выключен для {target}")
                    }
                    _ => return Ok(()),
                };
                self.channel.send_text(chat_id, &confirmation).await?;
            }
            _ => {}
        }
        Ok(())
    }
}
