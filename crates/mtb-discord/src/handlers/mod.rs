//! Interaction handlers.
//!
//! Each handler answers exactly once through the responder. User-facing
//! failures are replies, not errors; an `Err` means the reply itself failed.

pub mod changelog;
pub mod faq;
pub mod help;
pub mod issue;
pub mod modal;
pub mod repo;

#[cfg(test)]
pub(crate) mod testing;

use mtb_core::{
    messaging::types::{Interaction, InteractionResponse, MessageReply},
    Result,
};

use crate::router::AppState;

pub(crate) async fn reply_ephemeral(
    state: &AppState,
    interaction: &Interaction,
    content: impl Into<String>,
) -> Result<()> {
    state
        .responder
        .respond(
            interaction,
            InteractionResponse::Message(MessageReply::ephemeral(content)),
        )
        .await
}

pub(crate) async fn reply_public(
    state: &AppState,
    interaction: &Interaction,
    content: impl Into<String>,
) -> Result<()> {
    state
        .responder
        .respond(
            interaction,
            InteractionResponse::Message(MessageReply::public(content)),
        )
        .await
}
