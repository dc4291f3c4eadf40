use crate::domain::Member;

use super::{CollectedValues, FieldSpec, ModalSession};

/// Placeholder limit imposed by Discord text inputs.
pub const PLACEHOLDER_MAX_CHARS: usize = 100;

/// Merge submitted `(custom_id, value)` pairs into the session.
///
/// Each id is mapped to its display label; an id the form does not list is
/// kept under the raw id but never counts toward completion. Returns the
/// number of answered form fields afterwards.
pub fn merge_submission<'a>(
    session: &mut ModalSession,
    submitted: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> usize {
    for (id, value) in submitted {
        let label = label_for(&session.fields, id).to_string();
        session.collected.insert(label, value);
    }
    session.collected_count()
}

/// Display label of field `id`, or `id` itself when the form has no such field.
pub fn label_for<'a>(fields: &'a [FieldSpec], id: &'a str) -> &'a str {
    fields
        .iter()
        .find(|f| f.id == id)
        .map(|f| f.label.as_str())
        .unwrap_or(id)
}

pub fn is_complete(session: &ModalSession) -> bool {
    session.collected_count() >= session.fields.len()
}

/// Render the issue body: one `### label` block per answer, then the footer.
///
/// Blocks follow the form's field order; labels the form does not list come
/// last, in the order they were collected.
pub fn render_body(fields: &[FieldSpec], collected: &CollectedValues, member: &Member) -> String {
    let mut body = String::new();
    let mut written: Vec<&str> = Vec::with_capacity(collected.len());

    for field in fields {
        if written.contains(&field.label.as_str()) {
            continue;
        }
        if let Some(value) = collected.get(&field.label) {
            push_block(&mut body, &field.label, value);
            written.push(&field.label);
        }
    }
    for (label, value) in collected.iter() {
        if !written.contains(&label) {
            push_block(&mut body, label, value);
        }
    }

    body.push_str(&format!(
        "\n---\nSubmitted via Discord by: {} ({})",
        member.username, member.id.0
    ));
    body
}

fn push_block(body: &mut String, label: &str, value: &str) {
    body.push_str(&format!("### {label}\n{value}\n\n"));
}

/// Body used by single-page forms that carry a free-form description.
pub fn render_legacy_body(member: &Member, description: &str) -> String {
    format!(
        "**Reported by:** {} (ID: {})\n\n{description}\n\n---\n*This issue was automatically created from Discord*",
        member.username, member.id.0
    )
}

/// Cut text to the placeholder limit: 97 characters plus `...`.
pub fn truncate_for_display(text: &str) -> String {
    if text.chars().count() > PLACEHOLDER_MAX_CHARS {
        let mut out: String = text.chars().take(PLACEHOLDER_MAX_CHARS - 3).collect();
        out.push_str("...");
        out
    } else {
        text.to_string()
    }
}
