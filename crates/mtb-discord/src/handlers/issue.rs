use tracing::{info, warn};

use mtb_core::{
    domain::SessionKey,
    messaging::types::{Interaction, InteractionKind, InteractionResponse},
    modal::{chunker, CollectedValues, ModalSession},
    Result,
};

use crate::router::AppState;

use super::{modal::page_form, reply_ephemeral};

pub const LABEL_FROM_DISCORD: &str = "from-discord";

/// Issue labels for a form command.
pub fn labels_for(command: &str) -> Vec<String> {
    let mut labels = vec![LABEL_FROM_DISCORD.to_string()];
    match command {
        "bug" => labels.push("bug".to_string()),
        "feature" => labels.push("enhancement".to_string()),
        _ => {}
    }
    labels
}

fn command_noun(command: &str) -> &str {
    match command {
        "bug" => "bug report",
        "feature" => "feature request",
        other => other,
    }
}

/// `/bug` and `/feature`: show the first page of the configured form.
pub async fn handle_issue_command(state: &AppState, interaction: &Interaction) -> Result<()> {
    let InteractionKind::Command { name, .. } = &interaction.kind else {
        return Ok(());
    };
    let command = name.as_str();

    let modal = match state.modals.resolve(command, &interaction.channel).await {
        Ok(modal) => modal,
        Err(e) => {
            warn!(command, channel = %interaction.channel.0, "modal lookup failed: {e}");
            return reply_ephemeral(
                state,
                interaction,
                format!(
                    "Sorry, the {} command is not configured for this channel.",
                    command_noun(command)
                ),
            )
            .await;
        }
    };

    if chunker::needs_paging(modal.fields.len()) {
        let key = SessionKey::new(command, &interaction.channel, &interaction.member.id);
        let issue_title = interaction
            .kind
            .option("title")
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&modal.title)
            .to_string();
        info!(
            session = %key,
            fields = modal.fields.len(),
            pages = chunker::total_pages(modal.fields.len()),
            "starting multi-page form"
        );
        state
            .sessions
            .create(ModalSession {
                key,
                command: command.to_string(),
                title: modal.title.clone(),
                issue_title,
                fields: modal.fields.clone(),
                collected: CollectedValues::default(),
                labels: labels_for(command),
                target: modal.target.clone(),
            })
            .await;
    }

    let form = page_form(
        format!("modal_{command}_{}", interaction.channel.0),
        &modal.title,
        chunker::next_page(&modal.fields, 0),
    );
    state
        .responder
        .respond(interaction, InteractionResponse::Modal(form))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::testing::*;
    use crate::router::dispatch;
    use mtb_core::{domain::ChannelId, domain::UserId, messaging::types::MessageReply};

    fn key(command: &str) -> SessionKey {
        SessionKey::new(command, &ChannelId("chan".into()), &UserId("u1".into()))
    }

    #[tokio::test]
    async fn not_configured_channel_gets_friendly_reply() {
        let h = harness(FakeGithub::default(), Vec::new(), None);
        dispatch(h.state.clone(), command("feature", &[("title", "x")])).await;

        assert_eq!(
            h.responder.last(),
            Some(Sent::Response(InteractionResponse::Message(
                MessageReply::ephemeral(
                    "Sorry, the feature request command is not configured for this channel."
                )
            )))
        );
        assert!(h.state.sessions.is_empty().await);
    }

    #[tokio::test]
    async fn short_form_has_no_session() {
        let h = harness(
            FakeGithub::default(),
            vec![modal("bug", "Bug Report", fields(3))],
            None,
        );
        dispatch(h.state.clone(), command("bug", &[("title", "Crash")])).await;

        let Some(Sent::Response(InteractionResponse::Modal(form))) = h.responder.last() else {
            panic!("expected modal");
        };
        assert_eq!(form.custom_id, "modal_bug_chan");
        assert_eq!(form.fields.len(), 3);
        assert!(!h.state.sessions.contains(&key("bug")).await);
    }

    #[tokio::test]
    async fn long_form_starts_session_with_first_page() {
        let h = harness(
            FakeGithub::default(),
            vec![modal("feature", "Feature Request", fields(12))],
            None,
        );
        dispatch(h.state.clone(), command("feature", &[("title", "Mesh map")])).await;

        let Some(Sent::Response(InteractionResponse::Modal(form))) = h.responder.last() else {
            panic!("expected modal");
        };
        assert_eq!(form.title, "Feature Request");
        assert_eq!(form.fields.len(), 5);
        assert_eq!(form.fields[0].id, "f0");

        let session = h.state.sessions.get(&key("feature")).await.unwrap();
        assert_eq!(session.issue_title, "Mesh map");
        assert_eq!(session.labels, vec!["from-discord", "enhancement"]);
        assert!(session.collected.is_empty());
    }

    #[tokio::test]
    async fn restarting_a_command_resets_the_session() {
        let h = harness(
            FakeGithub::default(),
            vec![modal("bug", "Bug Report", fields(7))],
            None,
        );
        dispatch(h.state.clone(), command("bug", &[("title", "one")])).await;
        h.state
            .sessions
            .update(&key("bug"), |s| s.collected.insert("Field 0", "x"))
            .await
            .unwrap();
        dispatch(h.state.clone(), command("bug", &[])).await;

        let session = h.state.sessions.get(&key("bug")).await.unwrap();
        assert!(session.collected.is_empty());
        assert_eq!(session.issue_title, "Bug Report");
    }

    #[test]
    fn labels_per_command() {
        assert_eq!(labels_for("bug"), vec!["from-discord", "bug"]);
        assert_eq!(labels_for("feature"), vec!["from-discord", "enhancement"]);
        assert_eq!(labels_for("other"), vec!["from-discord"]);
    }
}
