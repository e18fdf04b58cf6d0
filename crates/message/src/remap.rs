//! Per-format meta renaming tables.
//!
//! Each rule copies a provider-specific key onto its canonical name. A rule
//! only fires when the source key holds a value of the accepted shape and the
//! canonical key is absent (missing or `null`), so caller-supplied canonical
//! values always win. Source keys are kept.

use std::borrow::Cow;

use serde_json::Value;

use super::part::{Meta, Part, PartKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    String,
    Any,
}

impl ValueShape {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Any => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemapRule {
    pub part: PartKind,
    pub source_key: &'static str,
    pub canonical_key: &'static str,
    pub shape: ValueShape,
}

impl RemapRule {
    pub const fn new(
        part: PartKind,
        source_key: &'static str,
        canonical_key: &'static str,
        shape: ValueShape,
    ) -> Self {
        Self {
            part,
            source_key,
            canonical_key,
            shape,
        }
    }

    fn derive(&self, meta: &Meta) -> Option<Value> {
        if meta.get(self.canonical_key).is_some_and(|value| !value.is_null()) {
            return None;
        }
        meta.get(self.source_key)
            .filter(|value| self.shape.accepts(value))
            .cloned()
    }
}

pub const OPENAI_RULES: &[RemapRule] = &[RemapRule::new(
    PartKind::ToolCall,
    "name",
    "tool_name",
    ValueShape::String,
)];

pub const ANTHROPIC_RULES: &[RemapRule] = &[
    RemapRule::new(PartKind::ToolCall, "name", "tool_name", ValueShape::String),
    RemapRule::new(PartKind::ToolCall, "input", "arguments", ValueShape::Any),
    RemapRule::new(
        PartKind::ToolResult,
        "tool_use_id",
        "tool_call_id",
        ValueShape::String,
    ),
];

pub const LANGCHAIN_RULES: &[RemapRule] = &[];

/// Applies every rule matching the part's kind and returns the resulting part.
///
/// The input is never written to: the meta map is cloned on the first derived
/// key, and a part with nothing to derive comes back as a plain clone.
pub fn apply_rules(rules: &[RemapRule], part: &Part) -> Part {
    let (Some(kind), Some(meta)) = (part.kind(), part.meta()) else {
        return part.clone();
    };

    let mut meta = Cow::Borrowed(meta);
    for rule in rules.iter().filter(|rule| rule.part == kind) {
        if let Some(value) = rule.derive(&meta) {
            meta.to_mut().insert(rule.canonical_key.to_string(), value);
        }
    }

    match meta {
        Cow::Borrowed(_) => part.clone(),
        Cow::Owned(meta) => part.with_meta(meta),
    }
}
