//! LLM-backed order-field extraction

use crate::error::Result;
use crate::order::{ExtractedFields, OrderContext};
use crate::services::FieldExtractor;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;
use vitrina_llm::{CompletionProvider, CompletionRequest, Message};
use vitrina_storage::StoredMessage;

const EXTRACT_SYSTEM_PROMPT: &str = "Извлеки данные заказа из сообщения клиента. Верни только JSON.\n\
    Поля JSON: city, product, product_type, size, color, address, ready_to_order.\n\
    product_type только: shoes, bag, accessory, other, unknown.\n\
    Если поле неизвестно, возвращай пустую строку.\n\
    ready_to_order = true только если клиент явно готов оформить/купить.";

/// Turns of history given to the extractor for disambiguation
const EXTRACT_HISTORY_TURNS: usize = 8;

/// Field extractor backed by a completion provider in JSON mode
pub struct LlmFieldExtractor {
    provider: Arc<dyn CompletionProvider>,
}

impl LlmFieldExtractor {
    /// Create an extractor over the given provider
    #[must_use]
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    fn build_request(
        &self,
        history: &[StoredMessage],
        message: &str,
        current: &OrderContext,
    ) -> CompletionRequest {
        let history_text = history
            .iter()
            .rev()
            .take(EXTRACT_HISTORY_TURNS)
            .rev()
            .map(|m| format!("{}: {}", m.role.as_str(), m.content))
            .collect::<Vec<_>>()
            .join("\n");
        let current_json =
            serde_json::to_string(&current.to_state()).unwrap_or_else(|_| "{}".to_string());
        let user_text = format!(
            "Текущее сообщение: {message}\nКонтекст профиля: {current_json}\nИстория: {history_text}"
        );
        CompletionRequest::new(vec![
            Message::system(EXTRACT_SYSTEM_PROMPT),
            Message::user(user_text),
        ])
        .json()
        .with_temperature(0.0)
        .with_max_tokens(220)
    }
}

#[async_trait]
impl FieldExtractor for LlmFieldExtractor {
    /// Extract order fields from the latest message.
    ///
    /// Extraction is advisory: a provider failure or unparseable output
    /// yields empty fields rather than failing the turn, so the reply still
    /// goes out and the fields are picked up on a later message.
    async fn extract(
        &self,
        history: &[StoredMessage],
        message: &str,
        current: &OrderContext,
    ) -> Result<ExtractedFields> {
        let request = self.build_request(history, message, current);
        let response = match self.provider.complete(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(%err, "field extraction call failed");
                return Ok(ExtractedFields::default());
            }
        };
        match serde_json::from_str::<serde_json::Value>(&response.content) {
            Ok(value) => Ok(ExtractedFields::from_json(&value)),
            Err(err) => {
                warn!(%err, "field extraction returned invalid json");
                Ok(ExtractedFields::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::ProductKind;
    use vitrina_llm::{CompletionResponse, Error as LlmError};

    struct FixedProvider {
        content: std::result::Result<String, ()>,
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
            match &self.content {
                Ok(content) => Ok(CompletionResponse {
                    content: content.clone(),
                    model: "fixed-model".to_string(),
                }),
                Err(()) => Err(LlmError::Api("boom".to_string())),
            }
        }
    }

    fn extractor(content: std::result::Result<&str, ()>) -> LlmFieldExtractor {
        LlmFieldExtractor::new(Arc::new(FixedProvider {
            content: content.map(str::to_string),
        }))
    }

    #[tokio::test]
    async fn test_extracts_coerced_fields() {
        let raw = r#"{"city": "Алматы", "product": "Azia 95", "product_type": "shoes", "size": 38, "ready_to_order": true}"#;
        let fields = extractor(Ok(raw))
            .extract(&[], "беру 38 размер, я из Алматы", &OrderContext::default())
            .await
            .unwrap();
        assert_eq!(fields.size, "38");
        assert_eq!(fields.product_type, ProductKind::Shoes);
        assert!(fields.ready_to_order);
    }

    #[tokio::test]
    async fn test_provider_failure_yields_empty_fields() {
        let fields = extractor(Err(()))
            .extract(&[], "хочу сумку", &OrderContext::default())
            .await
            .unwrap();
        assert!(fields.is_empty());
    }

    #[tokio::test]
    async fn test_garbage_output_yields_empty_fields() {
        let fields = extractor(Ok("not json at all"))
            .extract(&[], "хочу сумку", &OrderContext::default())
            .await
            .unwrap();
        assert!(fields.is_empty());
    }
}
