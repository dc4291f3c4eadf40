//! Port fakes shared by handler tests.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;

use mtb_core::{
    domain::{ChannelId, Member, RepoRef, UserId},
    errors::Error,
    faq::FaqData,
    messaging::{
        port::InteractionResponder,
        types::{CommandOption, Interaction, InteractionKind, InteractionResponse, SubmittedValue},
    },
    modal::{FieldSpec, InputStyle},
    ports::{
        Comparison, CreatedIssue, GithubApi, ModalProvider, NewIssue, Release, Repository,
        ResolvedModal,
    },
    Result,
};

use crate::router::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Response(InteractionResponse),
    Edit(String),
}

#[derive(Default)]
pub struct FakeResponder {
    pub sent: Mutex<Vec<Sent>>,
}

impl FakeResponder {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<Sent> {
        self.sent.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl InteractionResponder for FakeResponder {
    async fn respond(&self, _: &Interaction, response: InteractionResponse) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Response(response));
        Ok(())
    }

    async fn edit_original(&self, _: &Interaction, content: &str) -> Result<()> {
        self.sent.lock().unwrap().push(Sent::Edit(content.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeGithub {
    pub releases: Mutex<Vec<Release>>,
    pub comparison: Mutex<Option<Comparison>>,
    pub fail_issue: bool,
    pub fail_releases: Mutex<bool>,
    pub issues: Mutex<Vec<(RepoRef, NewIssue)>>,
    pub repositories: Vec<Repository>,
    pub release_calls: AtomicUsize,
    pub compare_calls: AtomicUsize,
}

impl FakeGithub {
    pub fn issues(&self) -> Vec<(RepoRef, NewIssue)> {
        self.issues.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
            + self.compare_calls.load(Ordering::SeqCst)
            + self.issues.lock().unwrap().len()
    }
}

#[async_trait]
impl GithubApi for FakeGithub {
    async fn list_releases(&self, _: &RepoRef, _: u32) -> Result<Vec<Release>> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        if *self.fail_releases.lock().unwrap() {
            return Err(Error::External("releases unavailable".into()));
        }
        Ok(self.releases.lock().unwrap().clone())
    }

    async fn compare(&self, _: &RepoRef, base: &str, head: &str) -> Result<Comparison> {
        self.compare_calls.fetch_add(1, Ordering::SeqCst);
        self.comparison
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| Error::External(format!("no comparison {base}...{head}")))
    }

    async fn create_issue(&self, repo: &RepoRef, issue: &NewIssue) -> Result<CreatedIssue> {
        self.issues
            .lock()
            .unwrap()
            .push((repo.clone(), issue.clone()));
        if self.fail_issue {
            return Err(Error::External("github down".into()));
        }
        Ok(CreatedIssue {
            number: 101,
            html_url: format!("https://github.com/{repo}/issues/101"),
        })
    }

    async fn get_repository(&self, repo: &RepoRef) -> Result<Repository> {
        self.repositories
            .iter()
            .find(|r| r.full_name == repo.to_string())
            .cloned()
            .ok_or_else(|| Error::External("404 Not Found".into()))
    }
}

/// Serves fixed forms for channel `chan`.
pub struct StaticModals {
    pub modals: Vec<ResolvedModal>,
}

#[async_trait]
impl ModalProvider for StaticModals {
    async fn resolve(&self, command: &str, channel: &ChannelId) -> Result<ResolvedModal> {
        self.modals
            .iter()
            .find(|m| m.command == command && channel.0 == "chan")
            .cloned()
            .ok_or_else(|| Error::NotConfigured {
                command: command.to_string(),
                channel: channel.0.clone(),
            })
    }

    fn default_repository(&self) -> Option<RepoRef> {
        Some(RepoRef::new("meshtastic", "firmware"))
    }
}

pub fn fields(n: usize) -> Vec<FieldSpec> {
    (0..n)
        .map(|i| FieldSpec {
            id: format!("f{i}"),
            label: format!("Field {i}"),
            style: InputStyle::Short,
            placeholder: String::new(),
            required: true,
            min_length: None,
            max_length: None,
        })
        .collect()
}

pub fn modal(command: &str, title: &str, fields: Vec<FieldSpec>) -> ResolvedModal {
    ResolvedModal {
        command: command.to_string(),
        title: title.to_string(),
        fields,
        target: RepoRef::new("meshtastic", "web"),
    }
}

pub struct Harness {
    pub state: Arc<AppState>,
    pub responder: Arc<FakeResponder>,
    pub github: Arc<FakeGithub>,
}

pub fn harness(github: FakeGithub, modals: Vec<ResolvedModal>, faq: Option<FaqData>) -> Harness {
    let responder = Arc::new(FakeResponder::default());
    let github = Arc::new(github);
    let state = Arc::new(AppState::new(
        github.clone(),
        Arc::new(StaticModals { modals }),
        responder.clone(),
        faq,
        RepoRef::new("meshtastic", "firmware"),
        Duration::from_secs(3600),
        Duration::from_secs(3600),
    ));
    Harness {
        state,
        responder,
        github,
    }
}

fn base(kind: InteractionKind) -> Interaction {
    Interaction {
        id: "i1".to_string(),
        token: "tok".to_string(),
        channel: ChannelId("chan".into()),
        member: Member {
            id: UserId("u1".into()),
            username: "alice".into(),
        },
        kind,
    }
}

pub fn command(name: &str, options: &[(&str, &str)]) -> Interaction {
    base(InteractionKind::Command {
        name: name.to_string(),
        options: options
            .iter()
            .map(|(n, v)| CommandOption::new(*n, *v))
            .collect(),
    })
}

pub fn autocomplete(name: &str, focused: (&str, &str)) -> Interaction {
    base(InteractionKind::Autocomplete {
        name: name.to_string(),
        options: vec![CommandOption {
            name: focused.0.to_string(),
            value: focused.1.to_string(),
            focused: true,
        }],
    })
}

pub fn submit(custom_id: &str, values: &[(&str, &str)]) -> Interaction {
    base(InteractionKind::ModalSubmit {
        custom_id: custom_id.to_string(),
        values: values
            .iter()
            .map(|(id, v)| SubmittedValue {
                custom_id: id.to_string(),
                value: v.to_string(),
            })
            .collect(),
    })
}

pub fn button(custom_id: &str) -> Interaction {
    base(InteractionKind::Button {
        custom_id: custom_id.to_string(),
    })
}
