pub mod messages;
pub mod notifier;

pub use notifier::{Channel, ChatSender, Delivery, Notifier, NotifyError};
