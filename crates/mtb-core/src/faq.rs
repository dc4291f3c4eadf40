use std::path::Path;

use serde::Deserialize;

use crate::{errors::Error, Result};

/// Discord caps autocomplete responses at 25 choices.
pub const MAX_AUTOCOMPLETE_CHOICES: usize = 25;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FaqItem {
    pub name: String,
    pub url: String,
}

/// FAQ links, grouped the way the YAML file groups them.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FaqData {
    #[serde(default)]
    pub faq: Vec<FaqItem>,
    #[serde(default)]
    pub software_modules: Vec<FaqItem>,
}

impl FaqData {
    pub fn from_yaml(text: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text).map_err(|source| Error::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// FAQ entries first, then software modules.
    pub fn all_items(&self) -> impl Iterator<Item = &FaqItem> {
        self.faq.iter().chain(self.software_modules.iter())
    }

    /// Exact, case-sensitive name match.
    pub fn find(&self, name: &str) -> Option<&FaqItem> {
        self.all_items().find(|item| item.name == name)
    }

    /// Names containing `input` (case-insensitive), at most 25.
    pub fn autocomplete(&self, input: &str) -> Vec<&FaqItem> {
        let needle = input.to_lowercase();
        self.all_items()
            .filter(|item| needle.is_empty() || item.name.to_lowercase().contains(&needle))
            .take(MAX_AUTOCOMPLETE_CHOICES)
            .collect()
    }
}
