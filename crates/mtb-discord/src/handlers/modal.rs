//! Modal submissions and the `Continue` button of multi-page forms.
//!
//! Identifier grammar:
//! - `modal_{command}_{channel}`: first page, or the only page of a short form
//! - `modal_continue_{session_key}`: a later page
//! - `continue_{session_key}`: button that opens the next page

use tracing::{debug, info, warn};

use mtb_core::{
    domain::{Member, SessionKey},
    errors::Error,
    messaging::types::{
        Button, Interaction, InteractionKind, InteractionResponse, MessageReply, ModalForm,
        SubmittedValue,
    },
    modal::{
        assembler::{self, label_for},
        chunker, CollectedValues, FieldSpec, ModalSession,
    },
    ports::NewIssue,
    Result,
};

use crate::router::AppState;

use super::{issue::labels_for, reply_ephemeral};

const CONTINUE_PREFIX: &str = "continue_";
const SESSION_EXPIRED: &str = "❌ Session expired. Please start over.";
const ISSUE_FAILED: &str = "❌ Failed to create issue. Please try again later.";
const MARKDOWN_NOTE: &str = "\n\n**Note:** You can use Markdown formatting in your descriptions. \
To add images or other attachments, please edit the issue directly on GitHub.";

/// Build a modal page; placeholders are cut to the display limit.
pub fn page_form(custom_id: String, title: &str, fields: &[FieldSpec]) -> ModalForm {
    ModalForm {
        custom_id,
        title: title.to_string(),
        fields: fields
            .iter()
            .map(|f| FieldSpec {
                placeholder: assembler::truncate_for_display(&f.placeholder),
                ..f.clone()
            })
            .collect(),
    }
}

enum SubmitRoute {
    Continuation(SessionKey),
    Command(String),
}

fn parse_submit_id(custom_id: &str) -> Option<SubmitRoute> {
    let parts: Vec<&str> = custom_id.split('_').collect();
    if parts.len() < 2 {
        return None;
    }
    if parts[1] == "continue" && parts.len() >= 3 {
        return Some(SubmitRoute::Continuation(SessionKey(parts[2..].join("_"))));
    }
    Some(SubmitRoute::Command(parts[1].to_string()))
}

pub async fn handle_modal_submit(state: &AppState, interaction: &Interaction) -> Result<()> {
    let InteractionKind::ModalSubmit { custom_id, values } = &interaction.kind else {
        return Ok(());
    };

    match parse_submit_id(custom_id) {
        None => {
            warn!(custom_id, "invalid modal custom id");
            Ok(())
        }
        Some(SubmitRoute::Continuation(key)) => {
            advance_session(state, interaction, &key, values).await
        }
        Some(SubmitRoute::Command(command)) => {
            let key = SessionKey::new(&command, &interaction.channel, &interaction.member.id);
            if state.sessions.contains(&key).await {
                advance_session(state, interaction, &key, values).await
            } else {
                submit_single_page(state, interaction, &command, values).await
            }
        }
    }
}

enum Step {
    Continue { current_page: usize, total_pages: usize },
    File(Box<ModalSession>),
}

/// Merge one page into the session, then either prompt for the next page or
/// file the issue.
async fn advance_session(
    state: &AppState,
    interaction: &Interaction,
    key: &SessionKey,
    values: &[SubmittedValue],
) -> Result<()> {
    let step = state
        .sessions
        .update(key, |session| {
            let collected = assembler::merge_submission(
                session,
                values
                    .iter()
                    .map(|v| (v.custom_id.as_str(), v.value.as_str())),
            );
            let progress = chunker::progress(session.fields.len(), collected);
            if progress.is_complete {
                Step::File(Box::new(session.clone()))
            } else {
                Step::Continue {
                    current_page: progress.current_page,
                    total_pages: progress.total_pages,
                }
            }
        })
        .await;
    let step = match step {
        Ok(step) => step,
        Err(e @ Error::SessionNotFound(_)) => {
            debug!("{e}");
            return reply_ephemeral(state, interaction, SESSION_EXPIRED).await;
        }
        Err(e) => return Err(e),
    };

    match step {
        Step::Continue {
            current_page,
            total_pages,
        } => {
            let reply = MessageReply::ephemeral(format!(
                "Part {current_page} of {total_pages} complete. Click 'Continue' to proceed."
            ))
            .with_button(Button {
                label: "Continue".to_string(),
                custom_id: format!("{CONTINUE_PREFIX}{key}"),
            });
            state
                .responder
                .respond(interaction, InteractionResponse::Message(reply))
                .await
        }
        Step::File(session) => {
            let body = assembler::render_body(&session.fields, &session.collected, &interaction.member);
            let issue = NewIssue {
                title: session.issue_title.clone(),
                body,
                labels: session.labels.clone(),
            };
            let result = state.github.create_issue(&session.target, &issue).await;
            state.sessions.delete(key).await;

            match result {
                Ok(created) => {
                    info!(session = %key, number = created.number, "issue created");
                    reply_ephemeral(
                        state,
                        interaction,
                        format!(
                            "✅ Issue #{} created successfully!\n{}{MARKDOWN_NOTE}",
                            created.number, created.html_url
                        ),
                    )
                    .await
                }
                Err(e) => {
                    warn!(session = %key, "failed to create GitHub issue: {e}");
                    reply_ephemeral(state, interaction, ISSUE_FAILED).await
                }
            }
        }
    }
}

/// Short forms: everything arrives in one submission, no session bookkeeping.
async fn submit_single_page(
    state: &AppState,
    interaction: &Interaction,
    command: &str,
    values: &[SubmittedValue],
) -> Result<()> {
    let modal = match state.modals.resolve(command, &interaction.channel).await {
        Ok(modal) => modal,
        Err(e) => {
            warn!(command, "modal lookup failed on submit: {e}");
            return reply_ephemeral(
                state,
                interaction,
                "❌ Failed to create issue. Configuration error.",
            )
            .await;
        }
    };

    let value_of = |id: &str| {
        values
            .iter()
            .find(|v| v.custom_id == id)
            .map(|v| v.value.as_str())
    };

    let title = value_of(&format!("{command}_title"))
        .filter(|t| !t.is_empty())
        .unwrap_or(&modal.title)
        .to_string();
    let body = match value_of(&format!("{command}_description")) {
        Some(description) => assembler::render_legacy_body(&interaction.member, description),
        None => render_submitted(&modal.fields, values, &interaction.member),
    };

    let issue = NewIssue {
        title,
        body,
        labels: labels_for(command),
    };
    match state.github.create_issue(&modal.target, &issue).await {
        Ok(created) => {
            info!(command, number = created.number, "issue created");
            reply_ephemeral(
                state,
                interaction,
                format!(
                    "✅ Issue #{} created successfully!\n{}",
                    created.number, created.html_url
                ),
            )
            .await
        }
        Err(e) => {
            warn!(command, "failed to create GitHub issue: {e}");
            reply_ephemeral(state, interaction, ISSUE_FAILED).await
        }
    }
}

fn render_submitted(fields: &[FieldSpec], values: &[SubmittedValue], member: &Member) -> String {
    let mut collected = CollectedValues::default();
    for v in values {
        collected.insert(label_for(fields, &v.custom_id), v.value.as_str());
    }
    assembler::render_body(fields, &collected, member)
}

/// `Continue` button: open the next page of the session's form.
pub async fn handle_button(state: &AppState, interaction: &Interaction) -> Result<()> {
    let InteractionKind::Button { custom_id } = &interaction.kind else {
        return Ok(());
    };
    let Some(raw_key) = custom_id.strip_prefix(CONTINUE_PREFIX) else {
        debug!(custom_id, "ignoring button");
        return Ok(());
    };
    let key = SessionKey(raw_key.to_string());

    let Some(session) = state.sessions.get(&key).await else {
        debug!(session = %key, "modal session not found");
        return reply_ephemeral(state, interaction, SESSION_EXPIRED).await;
    };

    let page = chunker::next_page(&session.fields, session.collected_count());
    if page.is_empty() {
        return reply_ephemeral(state, interaction, SESSION_EXPIRED).await;
    }

    let form = page_form(format!("modal_continue_{key}"), &session.title, page);
    state
        .responder
        .respond(interaction, InteractionResponse::Modal(form))
        .await
}
