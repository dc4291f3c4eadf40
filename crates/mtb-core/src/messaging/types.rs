use crate::{
    domain::{ChannelId, Member},
    modal::FieldSpec,
};

/// Cross-platform model of one incoming interaction.
///
/// Wire-specific fields (raw JSON, numeric type codes) stay in the adapter.
#[derive(Clone, Debug)]
pub struct Interaction {
    pub id: String,
    pub token: String,
    pub channel: ChannelId,
    pub member: Member,
    pub kind: InteractionKind,
}

#[derive(Clone, Debug)]
pub enum InteractionKind {
    Command {
        name: String,
        options: Vec<CommandOption>,
    },
    Autocomplete {
        name: String,
        options: Vec<CommandOption>,
    },
    ModalSubmit {
        custom_id: String,
        values: Vec<SubmittedValue>,
    },
    Button {
        custom_id: String,
    },
}

/// A string-valued slash command option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOption {
    pub name: String,
    pub value: String,
    /// Set on the option the user is typing into during autocomplete.
    pub focused: bool,
}

impl CommandOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            focused: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmittedValue {
    pub custom_id: String,
    pub value: String,
}

impl InteractionKind {
    /// Value of the named option, if present.
    pub fn option(&self, name: &str) -> Option<&str> {
        let options = match self {
            InteractionKind::Command { options, .. }
            | InteractionKind::Autocomplete { options, .. } => options,
            _ => return None,
        };
        options
            .iter()
            .find(|o| o.name == name)
            .map(|o| o.value.as_str())
    }

    pub fn first_option(&self) -> Option<&CommandOption> {
        match self {
            InteractionKind::Command { options, .. }
            | InteractionKind::Autocomplete { options, .. } => options.first(),
            _ => None,
        }
    }

    pub fn focused_option(&self) -> Option<&CommandOption> {
        match self {
            InteractionKind::Autocomplete { options, .. } => options.iter().find(|o| o.focused),
            _ => None,
        }
    }
}

/// The single initial response to an interaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractionResponse {
    Message(MessageReply),
    Modal(ModalForm),
    /// Acknowledge now; the content follows through `edit_original`.
    Deferred,
    Autocomplete(Vec<Choice>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageReply {
    pub content: String,
    pub ephemeral: bool,
    pub button: Option<Button>,
}

impl MessageReply {
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
            button: None,
        }
    }

    pub fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
            button: None,
        }
    }

    pub fn with_button(mut self, button: Button) -> Self {
        self.button = Some(button);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub custom_id: String,
}

/// A modal page to present to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModalForm {
    pub custom_id: String,
    pub title: String,
    pub fields: Vec<FieldSpec>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Choice {
    pub name: String,
    pub value: String,
}

impl Choice {
    pub fn same(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            name: value.clone(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_lookup_by_name_and_focus() {
        let kind = InteractionKind::Autocomplete {
            name: "changelog".into(),
            options: vec![
                CommandOption::new("base", "v2.5.0"),
                CommandOption {
                    name: "head".into(),
                    value: "v2.6".into(),
                    focused: true,
                },
            ],
        };
        assert_eq!(kind.option("base"), Some("v2.5.0"));
        assert_eq!(kind.option("missing"), None);
        assert_eq!(kind.focused_option().unwrap().name, "head");
        assert_eq!(kind.first_option().unwrap().name, "base");
    }

    #[test]
    fn buttons_have_no_options() {
        let kind = InteractionKind::Button {
            custom_id: "continue_x".into(),
        };
        assert!(kind.option("x").is_none());
        assert!(kind.first_option().is_none());
    }
}
