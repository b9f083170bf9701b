//! Provider implementations behind [`ChatProvider`](crate::chat::ChatProvider).

pub mod google;
pub mod openai;
