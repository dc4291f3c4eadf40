use mtb_core::{
    messaging::types::{Choice, Interaction, InteractionResponse},
    Result,
};

use crate::router::AppState;

use super::{reply_ephemeral, reply_public};

pub async fn handle_faq(state: &AppState, interaction: &Interaction) -> Result<()> {
    let Some(topic) = interaction.kind.first_option().map(|o| o.value.as_str()) else {
        return reply_ephemeral(
            state,
            interaction,
            "Please select a FAQ topic from the autocomplete options.",
        )
        .await;
    };

    let Some(faq) = &state.faq else {
        return reply_ephemeral(
            state,
            interaction,
            "FAQ data is not available. Please contact an administrator.",
        )
        .await;
    };

    match faq.find(topic) {
        Some(item) => {
            reply_public(state, interaction, format!("**{}**\n{}", item.name, item.url)).await
        }
        None => reply_ephemeral(state, interaction, format!("FAQ topic '{topic}' not found.")).await,
    }
}

pub async fn handle_faq_autocomplete(state: &AppState, interaction: &Interaction) -> Result<()> {
    let input = interaction
        .kind
        .first_option()
        .map(|o| o.value.as_str())
        .unwrap_or("");

    let choices = state
        .faq
        .as_ref()
        .map(|faq| {
            faq.autocomplete(input)
                .into_iter()
                .map(|item| Choice::same(&item.name))
                .collect()
        })
        .unwrap_or_default();

    state
        .responder
        .respond(interaction, InteractionResponse::Autocomplete(choices))
        .await
}
