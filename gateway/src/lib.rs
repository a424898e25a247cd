//! Chat gateway of the curation service.
//!
//! Raw [`Inbound`](curator_messages::Inbound) events are resolved once into an
//! [`Action`], interpreted against the user's conversation state and routed to
//! the engine. The [`Reply`] goes back to the chat gateway in the HTTP
//! response; asynchronous side effects leave through the [`WebhookVenue`].

pub mod action;
pub mod error;
pub mod handler;
pub mod links;
pub mod webhook;

pub use action::{main_menu, Action, CURATOR_CONFIRMATION};
pub use error::GatewayError;
pub use handler::{CallbackAnswer, Gateway, GatewaySettings, Reply};
pub use links::{decode_referral, encode_referral, LinkParser};
pub use webhook::WebhookVenue;
