//! Turn output types and the assistant prompt

use crate::notify::OrderSummary;
use crate::photos::ResolvedPhoto;

/// The assistant persona and reply rules fed to every completion call
pub(crate) const SYSTEM_PROMPT: &str = "\
Ты — Алина, консультант интернет-магазина брендовых сумок и обуви.
Отвечай дружелюбно, коротко и по делу, на русском языке.

ПРАВИЛА ОТВЕТА:
- Если ответ состоит из нескольких сообщений, разделяй их строкой |||
- Не выдумывай модели и цены: опирайся только на КОНТЕКСТ ТОВАРОВ ниже.
- Не обещай отправить фото: фото прикрепляет система автоматически.
- Задавай не больше одного вопроса за раз.

КОНТЕКСТ ТОВАРОВ:
{product_context}

ИСТОРИЯ ДИАЛОГА:
{conversation_history}";

/// Neutral line used when checkout stripping leaves nothing
pub(crate) const EMPTY_REPLY_FALLBACK: &str = "Сейчас уточню по модели и наличию.";

/// One processed turn: what goes back to the client
#[derive(Debug, Clone, Default)]
pub struct TurnReply {
    /// Reply parts, each sent as its own message
    pub parts: Vec<String>,
    /// Photos attached after the text
    pub photos: Vec<ResolvedPhoto>,
    /// Present when this turn confirmed the order
    pub order: Option<OrderSummary>,
}

impl TurnReply {
    /// Whether this turn confirmed the order
    #[must_use]
    pub fn order_placed(&self) -> bool {
        self.order.is_some()
    }

    /// Reply as one line, the form persisted to history
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.parts.join(" ")
    }
}
