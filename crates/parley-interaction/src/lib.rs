pub mod gateway;
pub mod reply;

pub use gateway::{ChatGateway, WebhookError, WebhookGateway, WebhookReply};
pub use reply::{FALLBACK_REPLY, ReplyShape, extract_reply};
