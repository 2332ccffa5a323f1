//! Panel messaging: the request/response protocol spoken with the webview,
//! its handler, and the transports that carry it.
//!
//! - [`protocol`] defines the messages (TypeScript bindings via ts-rs)
//! - [`MessageHandler`] answers each request with exactly one response
//! - [`MessageChannel`] processes requests strictly in arrival order
//! - [`stdio`] carries frames as newline-delimited JSON

mod channel;
mod handler;
pub mod protocol;
pub mod stdio;

pub use channel::{MessageChannel, CHANNEL_CAPACITY};
pub use handler::MessageHandler;
pub use protocol::{InboundMessage, OutboundMessage};
