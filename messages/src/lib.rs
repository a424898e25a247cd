//! Messaging gateway contract.
//!
//! The chat platform is reached through a gateway process. Events arrive as
//! [`Inbound`] values, replies leave as [`Outbound`] values, and group-level
//! side effects go through the [`Venue`] trait.

pub mod error;
pub mod inbound;
pub mod outbound;
pub mod venue;

pub use error::MessageError;
pub use inbound::{Inbound, Payload};
pub use outbound::{parse_vote_callback, Button, Markup, Outbound};
pub use venue::{SharedVenue, Venue};
