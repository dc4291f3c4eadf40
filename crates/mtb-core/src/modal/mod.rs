//! Multi-page modal forms.
//!
//! Discord modals hold at most five text inputs. Commands whose configured
//! form is longer are split into pages; the answers collected so far live in a
//! [`ModalSession`] held by the [`store::ModalSessionStore`] until the issue is
//! filed or the flow fails.

pub mod assembler;
pub mod chunker;
pub mod config;
pub mod store;

use serde::{Deserialize, Serialize};

use crate::domain::{RepoRef, SessionKey};

/// How a text input is rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputStyle {
    Paragraph,
    #[default]
    #[serde(other)]
    Short,
}

/// One form field, either configured inline or converted from an issue template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "custom_id")]
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub style: InputStyle,
    #[serde(default)]
    pub placeholder: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub max_length: Option<u32>,
}

/// Values gathered so far, keyed by display label.
///
/// Keys are unique; writing an existing label replaces its value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectedValues {
    entries: Vec<(String, String)>,
}

impl CollectedValues {
    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let label = label.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((label, value)),
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), v.as_str()))
    }
}

/// State of one user's in-progress multi-page submission.
#[derive(Clone, Debug)]
pub struct ModalSession {
    pub key: SessionKey,
    pub command: String,
    /// Modal title shown on every page.
    pub title: String,
    /// Title of the issue that gets filed.
    pub issue_title: String,
    /// Page order; fixed for the session lifetime.
    pub fields: Vec<FieldSpec>,
    pub collected: CollectedValues,
    pub labels: Vec<String>,
    pub target: RepoRef,
}

impl ModalSession {
    /// Fields of this form that have an answer; values under labels the form
    /// does not list are not counted.
    pub fn collected_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| self.collected.get(&f.label).is_some())
            .count()
    }
}
