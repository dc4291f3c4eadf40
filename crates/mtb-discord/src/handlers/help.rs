use mtb_core::{messaging::types::Interaction, Result};

use crate::router::AppState;

use super::reply_public;

pub const HELP_TEXT: &str = "**How to get help or make a suggestion:**\n\
`/bug`: To report a bug with the app.\n\
`/feature`: To request a new feature. \n\
`/faq`: Frequently Asked Questions.\n\
`/changelog`: View changes between two versions.\n\
`/repo`: Get the GitHub URL for a repository.\n";

pub async fn handle_tapsign(state: &AppState, interaction: &Interaction) -> Result<()> {
    reply_public(state, interaction, HELP_TEXT).await
}
