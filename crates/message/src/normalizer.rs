//! Per-format conversion of `(role, parts)` into canonical form.
//!
//! Normalizers only read their input. Anything they change is produced as a
//! new value, and the first error aborts the whole message.

use snafu::{OptionExt, ensure};

use super::error::{FormatResult, InvalidRoleSnafu, MissingFieldSnafu};
use super::format::MessageFormat;
use super::part::{Part, PartKind};
use super::remap::{ANTHROPIC_RULES, LANGCHAIN_RULES, OPENAI_RULES, apply_rules};
use super::role::Role;

/// Output of one normalization call.
///
/// The role stays a string because the no-op variant passes it through
/// untouched; [`crate::pipeline::prepare_message`] narrows it to [`Role`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub role: String,
    pub parts: Vec<Part>,
}

pub trait Normalizer: Send + Sync {
    fn format(&self) -> MessageFormat;

    fn normalize(&self, role: &str, parts: &[Part]) -> FormatResult<Normalized>;
}

pub struct NoOpNormalizer;

impl Normalizer for NoOpNormalizer {
    fn format(&self) -> MessageFormat {
        MessageFormat::None
    }

    fn normalize(&self, role: &str, parts: &[Part]) -> FormatResult<Normalized> {
        Ok(Normalized {
            role: role.to_string(),
            parts: parts.to_vec(),
        })
    }
}

/// OpenAI roles are already canonical; tool calls name their tool `name`.
pub struct OpenAiNormalizer;

impl Normalizer for OpenAiNormalizer {
    fn format(&self) -> MessageFormat {
        MessageFormat::OpenAi
    }

    fn normalize(&self, role: &str, parts: &[Part]) -> FormatResult<Normalized> {
        let role = Role::parse(role).context(InvalidRoleSnafu {
            stage: "openai-validate-role",
            format: MessageFormat::OpenAi,
            role,
        })?;

        Ok(Normalized {
            role: role.as_str().to_string(),
            parts: parts
                .iter()
                .map(|part| apply_rules(OPENAI_RULES, part))
                .collect(),
        })
    }
}

/// Anthropic only carries user and assistant turns; the system prompt travels
/// outside the message list.
pub struct AnthropicNormalizer;

impl AnthropicNormalizer {
    fn normalize_part(part: &Part) -> FormatResult<Part> {
        if let Some(kind @ (PartKind::ToolCall | PartKind::ToolResult)) = part.kind() {
            ensure!(
                part.has_meta(),
                MissingFieldSnafu {
                    stage: "anthropic-validate-part-meta",
                    format: MessageFormat::Anthropic,
                    part_type: kind.as_str(),
                    field: "meta",
                }
            );
        }
        Ok(apply_rules(ANTHROPIC_RULES, part))
    }
}

impl Normalizer for AnthropicNormalizer {
    fn format(&self) -> MessageFormat {
        MessageFormat::Anthropic
    }

    fn normalize(&self, role: &str, parts: &[Part]) -> FormatResult<Normalized> {
        let role = match Role::parse(role) {
            Some(role @ (Role::User | Role::Assistant)) => role,
            _ => {
                return InvalidRoleSnafu {
                    stage: "anthropic-validate-role",
                    format: MessageFormat::Anthropic,
                    role,
                }
                .fail();
            }
        };

        let parts = parts
            .iter()
            .map(Self::normalize_part)
            .collect::<FormatResult<Vec<_>>>()?;

        Ok(Normalized {
            role: role.as_str().to_string(),
            parts,
        })
    }
}

/// LangChain names the speakers `human` and `ai`.
pub struct LangChainNormalizer;

impl LangChainNormalizer {
    fn map_role(role: &str) -> Option<Role> {
        match role {
            "human" => Some(Role::User),
            "ai" => Some(Role::Assistant),
            canonical => Role::parse(canonical),
        }
    }
}

impl Normalizer for LangChainNormalizer {
    fn format(&self) -> MessageFormat {
        MessageFormat::LangChain
    }

    fn normalize(&self, role: &str, parts: &[Part]) -> FormatResult<Normalized> {
        let role = Self::map_role(role).context(InvalidRoleSnafu {
            stage: "langchain-map-role",
            format: MessageFormat::LangChain,
            role,
        })?;

        Ok(Normalized {
            role: role.as_str().to_string(),
            parts: parts
                .iter()
                .map(|part| apply_rules(LANGCHAIN_RULES, part))
                .collect(),
        })
    }
}
