//! Discord interaction JSON: inbound payloads and outbound responses.

use serde::Deserialize;
use serde_json::{json, Value};

use mtb_core::{
    domain::{ChannelId, Member, UserId},
    errors::Error,
    messaging::types::{
        CommandOption, Interaction, InteractionKind, InteractionResponse, MessageReply,
        ModalForm, SubmittedValue,
    },
    modal::InputStyle,
    Result,
};

pub const INTERACTION_PING: u8 = 1;
pub const INTERACTION_COMMAND: u8 = 2;
pub const INTERACTION_COMPONENT: u8 = 3;
pub const INTERACTION_AUTOCOMPLETE: u8 = 4;
pub const INTERACTION_MODAL_SUBMIT: u8 = 5;

const RESPONSE_PONG: u8 = 1;
const RESPONSE_MESSAGE: u8 = 4;
const RESPONSE_DEFERRED: u8 = 5;
const RESPONSE_AUTOCOMPLETE: u8 = 8;
const RESPONSE_MODAL: u8 = 9;

const FLAG_EPHEMERAL: u64 = 1 << 6;

const COMPONENT_ACTION_ROW: u8 = 1;
const COMPONENT_BUTTON: u8 = 2;
const COMPONENT_TEXT_INPUT: u8 = 4;

const BUTTON_PRIMARY: u8 = 1;
const TEXT_INPUT_SHORT: u8 = 1;
const TEXT_INPUT_PARAGRAPH: u8 = 2;

#[derive(Debug, Deserialize)]
pub struct RawInteraction {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub member: Option<RawMember>,
    /// Set instead of `member` outside guilds.
    #[serde(default)]
    pub user: Option<RawUser>,
    #[serde(default)]
    pub data: Option<RawData>,
}

#[derive(Debug, Deserialize)]
pub struct RawMember {
    pub user: RawUser,
}

#[derive(Debug, Deserialize)]
pub struct RawUser {
    pub id: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub options: Vec<RawOption>,
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub components: Vec<RawComponent>,
}

#[derive(Debug, Deserialize)]
pub struct RawOption {
    pub name: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default)]
    pub focused: bool,
}

#[derive(Debug, Deserialize)]
pub struct RawComponent {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub custom_id: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub components: Vec<RawComponent>,
}

impl RawInteraction {
    pub fn is_ping(&self) -> bool {
        self.kind == INTERACTION_PING
    }

    /// Convert to the core model. `None` for kinds the bot does not handle.
    pub fn into_interaction(self) -> Result<Option<Interaction>> {
        let user = self
            .member
            .map(|m| m.user)
            .or(self.user)
            .ok_or_else(|| Error::External("interaction without a user".to_string()))?;
        let data = self.data.unwrap_or_default();

        let kind = match self.kind {
            INTERACTION_COMMAND => InteractionKind::Command {
                name: data.name.unwrap_or_default(),
                options: convert_options(data.options),
            },
            INTERACTION_AUTOCOMPLETE => InteractionKind::Autocomplete {
                name: data.name.unwrap_or_default(),
                options: convert_options(data.options),
            },
            INTERACTION_MODAL_SUBMIT => InteractionKind::ModalSubmit {
                custom_id: data.custom_id.unwrap_or_default(),
                values: text_inputs(&data.components),
            },
            INTERACTION_COMPONENT => InteractionKind::Button {
                custom_id: data.custom_id.unwrap_or_default(),
            },
            _ => return Ok(None),
        };

        Ok(Some(Interaction {
            id: self.id,
            token: self.token,
            channel: ChannelId(self.channel_id.unwrap_or_default()),
            member: Member {
                id: UserId(user.id),
                username: user.username,
            },
            kind,
        }))
    }
}

fn convert_options(options: Vec<RawOption>) -> Vec<CommandOption> {
    options
        .into_iter()
        .map(|o| CommandOption {
            value: match o.value {
                Value::String(s) => s,
                Value::Null => String::new(),
                other => other.to_string(),
            },
            name: o.name,
            focused: o.focused,
        })
        .collect()
}

/// Text inputs in submission order, flattened out of their action rows.
fn text_inputs(components: &[RawComponent]) -> Vec<SubmittedValue> {
    let mut out = Vec::new();
    for c in components {
        if c.kind == COMPONENT_TEXT_INPUT {
            if let Some(id) = &c.custom_id {
                out.push(SubmittedValue {
                    custom_id: id.clone(),
                    value: c.value.clone().unwrap_or_default(),
                });
            }
        }
        out.extend(text_inputs(&c.components));
    }
    out
}

pub fn pong() -> Value {
    json!({ "type": RESPONSE_PONG })
}

/// Encode a core response as the interaction callback body.
pub fn encode_response(response: &InteractionResponse) -> Value {
    match response {
        InteractionResponse::Message(reply) => json!({
            "type": RESPONSE_MESSAGE,
            "data": message_data(reply),
        }),
        InteractionResponse::Modal(form) => json!({
            "type": RESPONSE_MODAL,
            "data": modal_data(form),
        }),
        InteractionResponse::Deferred => json!({ "type": RESPONSE_DEFERRED }),
        InteractionResponse::Autocomplete(choices) => json!({
            "type": RESPONSE_AUTOCOMPLETE,
            "data": {
                "choices": choices
                    .iter()
                    .map(|c| json!({ "name": c.name, "value": c.value }))
                    .collect::<Vec<_>>(),
            },
        }),
    }
}

fn message_data(reply: &MessageReply) -> Value {
    let mut data = json!({ "content": reply.content });
    if reply.ephemeral {
        data["flags"] = json!(FLAG_EPHEMERAL);
    }
    if let Some(button) = &reply.button {
        data["components"] = json!([{
            "type": COMPONENT_ACTION_ROW,
            "components": [{
                "type": COMPONENT_BUTTON,
                "style": BUTTON_PRIMARY,
                "label": button.label,
                "custom_id": button.custom_id,
            }],
        }]);
    }
    data
}

fn modal_data(form: &ModalForm) -> Value {
    let rows: Vec<Value> = form
        .fields
        .iter()
        .map(|f| {
            let mut input = json!({
                "type": COMPONENT_TEXT_INPUT,
                "custom_id": f.id,
                "label": f.label,
                "style": match f.style {
                    InputStyle::Paragraph => TEXT_INPUT_PARAGRAPH,
                    InputStyle::Short => TEXT_INPUT_SHORT,
                },
                "required": f.required,
            });
            if !f.placeholder.is_empty() {
                input["placeholder"] = json!(f.placeholder);
            }
            if let Some(min) = f.min_length {
                input["min_length"] = json!(min);
            }
            if let Some(max) = f.max_length {
                input["max_length"] = json!(max);
            }
            json!({ "type": COMPONENT_ACTION_ROW, "components": [input] })
        })
        .collect();

    json!({
        "custom_id": form.custom_id,
        "title": form.title,
        "components": rows,
    })
}
