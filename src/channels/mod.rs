//! Channel abstraction for message I/O.

pub mod callback;
pub mod channel;
pub mod keyboard;
pub mod telegram;

pub use callback::CallbackAction;
pub use channel::*;
pub use telegram::{OperatorChat, TelegramChannel};
