use std::fmt;
use std::sync::OnceLock;

use snafu::OptionExt;

use super::error::{FormatResult, UnsupportedFormatSnafu};
use super::normalizer::{
    AnthropicNormalizer, LangChainNormalizer, NoOpNormalizer, Normalizer, OpenAiNormalizer,
};

/// Source conventions a message can arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageFormat {
    /// Already canonical.
    None,
    OpenAi,
    Anthropic,
    LangChain,
}

impl MessageFormat {
    pub const ALL: [MessageFormat; 4] = [
        MessageFormat::None,
        MessageFormat::OpenAi,
        MessageFormat::Anthropic,
        MessageFormat::LangChain,
    ];

    /// Parses a wire identifier. The empty string means "no conversion".
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "" | "none" => Some(Self::None),
            "openai" => Some(Self::OpenAi),
            "anthropic" => Some(Self::Anthropic),
            "langchain" => Some(Self::LangChain),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::LangChain => "langchain",
        }
    }

    fn index(self) -> usize {
        self as usize
    }

    fn normalizer(self) -> &'static dyn Normalizer {
        match self {
            Self::None => &NoOpNormalizer,
            Self::OpenAi => &OpenAiNormalizer,
            Self::Anthropic => &AnthropicNormalizer,
            Self::LangChain => &LangChainNormalizer,
        }
    }
}

impl fmt::Display for MessageFormat {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Read-only table from format to the normalizer that handles it.
pub struct FormatRegistry {
    normalizers: [&'static dyn Normalizer; MessageFormat::ALL.len()],
}

impl FormatRegistry {
    fn new() -> Self {
        Self {
            normalizers: MessageFormat::ALL.map(MessageFormat::normalizer),
        }
    }

    pub fn get(&self, format: MessageFormat) -> &'static dyn Normalizer {
        self.normalizers[format.index()]
    }

    pub fn lookup(&self, identifier: &str) -> FormatResult<&'static dyn Normalizer> {
        let format = MessageFormat::parse(identifier).context(UnsupportedFormatSnafu {
            stage: "registry-lookup",
            format: identifier,
        })?;
        Ok(self.get(format))
    }

    pub fn formats(&self) -> impl Iterator<Item = MessageFormat> + '_ {
        self.normalizers.iter().map(|normalizer| normalizer.format())
    }
}

static FORMAT_REGISTRY: OnceLock<FormatRegistry> = OnceLock::new();

pub fn format_registry() -> &'static FormatRegistry {
    FORMAT_REGISTRY.get_or_init(|| {
        tracing::debug!(
            formats = MessageFormat::ALL.len(),
            "initialized message format registry"
        );
        FormatRegistry::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormatError;

    #[test]
    fn every_format_maps_to_its_own_normalizer() {
        let registry = format_registry();
        for format in MessageFormat::ALL {
            assert_eq!(registry.get(format).format(), format);
            assert_eq!(
                registry.lookup(format.as_str()).unwrap().format(),
                format
            );
        }
        assert_eq!(
            registry.formats().collect::<Vec<_>>(),
            MessageFormat::ALL.to_vec()
        );
    }

    #[test]
    fn empty_identifier_resolves_to_noop() {
        let normalizer = format_registry().lookup("").unwrap();
        assert_eq!(normalizer.format(), MessageFormat::None);
    }

    #[test]
    fn unknown_identifier_is_named_in_the_error() {
        let Err(error) = format_registry().lookup("cohere") else {
            panic!("cohere must not resolve");
        };
        match &error {
            FormatError::UnsupportedFormat { format, .. } => assert_eq!(format, "cohere"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(error.to_string(), "unsupported input format: cohere");
    }

    #[test]
    fn identifiers_are_case_sensitive() {
        assert!(MessageFormat::parse("OpenAI").is_none());
        assert!(MessageFormat::parse(" openai").is_none());
    }
}
