use tracing::warn;

use mtb_core::{
    domain::RepoRef,
    messaging::types::{Interaction, InteractionResponse},
    Result,
};

use crate::router::AppState;

/// `/repo [name]`: link a repository of the default owner.
pub async fn handle_repo(state: &AppState, interaction: &Interaction) -> Result<()> {
    let name = interaction
        .kind
        .option("name")
        .filter(|n| !n.is_empty())
        .unwrap_or(&state.default_repo.repo);
    let target = RepoRef::new(&state.default_repo.owner, name);

    state
        .responder
        .respond(interaction, InteractionResponse::Deferred)
        .await?;

    let content = match state.github.get_repository(&target).await {
        Ok(repository) => repository.html_url,
        Err(e) => {
            warn!(repo = %target, "error getting repository: {e}");
            format!("Repository `{target}` not found in the organization.")
        }
    };
    state.responder.edit_original(interaction, &content).await
}
