use std::{sync::Arc, time::Duration};

use tracing::{debug, warn};

use mtb_core::{
    cache::{KeyedTtlCache, TtlCache},
    domain::RepoRef,
    faq::FaqData,
    messaging::{
        port::InteractionResponder,
        types::{Interaction, InteractionKind},
    },
    modal::store::ModalSessionStore,
    ports::{GithubApi, ModalProvider, Release},
};

use crate::handlers;

/// Shared state handed to every handler.
pub struct AppState {
    pub github: Arc<dyn GithubApi>,
    pub modals: Arc<dyn ModalProvider>,
    pub responder: Arc<dyn InteractionResponder>,
    pub sessions: ModalSessionStore,
    /// An empty listing is never served from cache.
    pub releases: TtlCache<Vec<Release>>,
    /// Formatted changelog text keyed by `{base}...{head}`.
    pub comparisons: KeyedTtlCache<String, String>,
    pub faq: Option<FaqData>,
    /// Repository used by `/changelog` and as the owner for `/repo`.
    pub default_repo: RepoRef,
}

impl AppState {
    pub fn new(
        github: Arc<dyn GithubApi>,
        modals: Arc<dyn ModalProvider>,
        responder: Arc<dyn InteractionResponder>,
        faq: Option<FaqData>,
        default_repo: RepoRef,
        release_ttl: Duration,
        comparison_ttl: Duration,
    ) -> Self {
        Self {
            github,
            modals,
            responder,
            sessions: ModalSessionStore::new(),
            releases: TtlCache::<Vec<Release>>::with_check(release_ttl, |releases| {
                !releases.is_empty()
            }),
            comparisons: KeyedTtlCache::new(comparison_ttl),
            faq,
            default_repo,
        }
    }
}

/// Route one interaction to its handler.
///
/// Unknown commands and malformed identifiers are dropped without a reply.
/// Handler errors are logged here and never propagate further.
pub async fn dispatch(state: Arc<AppState>, interaction: Interaction) {
    let result = match &interaction.kind {
        InteractionKind::Command { name, .. } => match name.as_str() {
            "tapsign" => handlers::help::handle_tapsign(&state, &interaction).await,
            "faq" => handlers::faq::handle_faq(&state, &interaction).await,
            "bug" | "feature" => handlers::issue::handle_issue_command(&state, &interaction).await,
            "changelog" => handlers::changelog::handle_changelog(&state, &interaction).await,
            "repo" => handlers::repo::handle_repo(&state, &interaction).await,
            other => {
                debug!(command = other, "ignoring unknown command");
                Ok(())
            }
        },
        InteractionKind::Autocomplete { name, .. } => match name.as_str() {
            "faq" => handlers::faq::handle_faq_autocomplete(&state, &interaction).await,
            "changelog" => {
                handlers::changelog::handle_changelog_autocomplete(&state, &interaction).await
            }
            other => {
                debug!(command = other, "ignoring autocomplete");
                Ok(())
            }
        },
        InteractionKind::ModalSubmit { .. } => {
            handlers::modal::handle_modal_submit(&state, &interaction).await
        }
        InteractionKind::Button { .. } => {
            handlers::modal::handle_button(&state, &interaction).await
        }
    };

    if let Err(e) = result {
        warn!(interaction = %interaction.id, "handler failed: {e}");
    }
}
