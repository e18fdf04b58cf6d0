use serde::{Deserialize, Serialize};
use snafu::OptionExt;

use super::error::{FormatResult, InvalidRoleSnafu, UnknownPartTypeSnafu};
use super::format::{MessageFormat, format_registry};
use super::ids::MessageId;
use super::message::NewMessage;
use super::normalizer::{Normalized, Normalizer};
use super::part::Part;
use super::role::Role;

/// What to do with parts whose `type` is not a well-known kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartTypePolicy {
    #[default]
    PassThrough,
    RejectUnknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    /// Used when a message does not name its format.
    pub default_format: MessageFormat,
    pub part_types: PartTypePolicy,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            default_format: MessageFormat::None,
            part_types: PartTypePolicy::PassThrough,
        }
    }
}

/// Inbound message body as posted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageIn {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub role: String,
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<MessageId>,
}

/// Normalizes `(role, parts)` expressed in the format named by `identifier`.
pub fn normalize(identifier: &str, role: &str, parts: &[Part]) -> FormatResult<Normalized> {
    format_registry().lookup(identifier)?.normalize(role, parts)
}

/// Runs one inbound message through format resolution, the part-type policy
/// and normalization, and narrows the result to a canonical role.
pub fn prepare_message(input: &MessageIn, options: &IngestOptions) -> FormatResult<NewMessage> {
    prepare(input, options).inspect_err(|error| {
        tracing::warn!(
            format = input.format.as_deref().unwrap_or(options.default_format.as_str()),
            role = %input.role,
            stage = error.stage(),
            "rejected inbound message: {error}"
        );
    })
}

fn prepare(input: &MessageIn, options: &IngestOptions) -> FormatResult<NewMessage> {
    let registry = format_registry();
    let normalizer = match input.format.as_deref() {
        Some(identifier) => registry.lookup(identifier)?,
        None => registry.get(options.default_format),
    };

    if options.part_types == PartTypePolicy::RejectUnknown
        && let Some(part) = input.parts.iter().find(|part| part.kind().is_none())
    {
        return UnknownPartTypeSnafu {
            stage: "pipeline-part-type-policy",
            part_type: part.type_name(),
        }
        .fail();
    }

    let Normalized { role, parts } = normalizer.normalize(&input.role, &input.parts)?;
    let role = Role::parse(&role).context(InvalidRoleSnafu {
        stage: "pipeline-canonical-role",
        format: normalizer.format(),
        role: role.as_str(),
    })?;

    tracing::debug!(
        format = %normalizer.format(),
        role = %role,
        part_count = parts.len(),
        "normalized inbound message"
    );
    Ok(NewMessage::new(input.parent_id, role, parts))
}
