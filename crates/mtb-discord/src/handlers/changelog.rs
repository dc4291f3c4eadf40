use tracing::warn;

use mtb_core::{
    faq::MAX_AUTOCOMPLETE_CHOICES,
    messaging::types::{Choice, Interaction, InteractionResponse},
    ports::Comparison,
    Result,
};

use crate::router::AppState;

use super::reply_ephemeral;

pub const RELEASE_LIST_LIMIT: u32 = 100;
const MAX_LISTED_COMMITS: usize = 10;

/// Render a comparison as a Discord message.
pub fn format_changelog(base: &str, head: &str, comparison: &Comparison) -> String {
    let mut out = format!("## Changes from {base} to {head}\n");
    out.push_str(&format!("Total commits: {}\n\n", comparison.total_commits));

    let mut commits = comparison.commits.as_slice();
    if commits.len() > MAX_LISTED_COMMITS {
        out.push_str(&format!(
            "*Showing last {MAX_LISTED_COMMITS} of {} commits*\n\n",
            commits.len()
        ));
        commits = &commits[commits.len() - MAX_LISTED_COMMITS..];
    }

    for commit in commits {
        let first_line = commit.message.lines().next().unwrap_or("");
        let sha: String = commit.sha.chars().take(7).collect();
        let author = commit.author.as_deref().unwrap_or("Unknown");
        out.push_str(&format!(
            "- [`{sha}`](<{}>) {first_line} - *{author}*\n",
            commit.html_url
        ));
    }

    out.push_str(&format!("\n[View Full Comparison](<{}>)", comparison.html_url));
    out
}

pub async fn handle_changelog(state: &AppState, interaction: &Interaction) -> Result<()> {
    let base = interaction.kind.option("base").unwrap_or("");
    let head = interaction.kind.option("head").unwrap_or("");
    if base.is_empty() || head.is_empty() {
        return reply_ephemeral(state, interaction, "Please provide both base and head versions.")
            .await;
    }

    state
        .responder
        .respond(interaction, InteractionResponse::Deferred)
        .await?;

    let key = format!("{base}...{head}");
    let message = state
        .comparisons
        .get_or_fetch(&key, || async {
            let comparison = state.github.compare(&state.default_repo, base, head).await?;
            Ok(format_changelog(base, head, &comparison))
        })
        .await;

    match message {
        Ok(text) => state.responder.edit_original(interaction, &text).await,
        Err(e) => {
            warn!(base, head, "error getting changelog: {e}");
            state
                .responder
                .edit_original(
                    interaction,
                    &format!("Failed to compare versions: {base}...{head}"),
                )
                .await
        }
    }
}

/// Suggest release tags; a failed refresh falls back to whatever is cached.
pub async fn handle_changelog_autocomplete(
    state: &AppState,
    interaction: &Interaction,
) -> Result<()> {
    let releases = match state
        .releases
        .get_or_fetch(|| {
            state
                .github
                .list_releases(&state.default_repo, RELEASE_LIST_LIMIT)
        })
        .await
    {
        Ok(releases) => releases,
        Err(e) => {
            warn!("error updating release cache: {e}");
            state.releases.peek().await.unwrap_or_default()
        }
    };

    let input = interaction
        .kind
        .focused_option()
        .map(|o| o.value.to_lowercase())
        .unwrap_or_default();

    let choices = releases
        .iter()
        .filter(|r| input.is_empty() || r.tag_name.to_lowercase().contains(&input))
        .take(MAX_AUTOCOMPLETE_CHOICES)
        .map(|r| Choice::same(&r.tag_name))
        .collect();

    state
        .responder
        .respond(interaction, InteractionResponse::Autocomplete(choices))
        .await
}
