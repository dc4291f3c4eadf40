use async_trait::async_trait;

use crate::{
    messaging::types::{Interaction, InteractionResponse},
    Result,
};

/// Outbound side of an interaction.
///
/// Each interaction gets exactly one `respond`; a `Deferred` response may be
/// followed by any number of `edit_original` calls.
#[async_trait]
pub trait InteractionResponder: Send + Sync {
    async fn respond(&self, interaction: &Interaction, response: InteractionResponse)
        -> Result<()>;

    async fn edit_original(&self, interaction: &Interaction, content: &str) -> Result<()>;
}
