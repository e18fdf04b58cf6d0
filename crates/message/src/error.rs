use snafu::Snafu;

use super::format::MessageFormat;
use super::ids::MessageId;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FormatError {
    #[snafu(display("unsupported input format: {format}"))]
    UnsupportedFormat { stage: &'static str, format: String },
    #[snafu(display("invalid {format} role: {role}"))]
    InvalidRole {
        stage: &'static str,
        format: MessageFormat,
        role: String,
    },
    #[snafu(display("{part_type} part missing {field} for {format} input"))]
    MissingField {
        stage: &'static str,
        format: MessageFormat,
        part_type: &'static str,
        field: &'static str,
    },
    #[snafu(display("part type '{part_type}' is not accepted in strict mode"))]
    UnknownPartType {
        stage: &'static str,
        part_type: String,
    },
    #[snafu(display("id '{raw}' is invalid for {id_type}"))]
    InvalidId {
        stage: &'static str,
        id_type: &'static str,
        raw: String,
        source: uuid::Error,
    },
}

impl FormatError {
    pub fn stage(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { stage, .. }
            | Self::InvalidRole { stage, .. }
            | Self::MissingField { stage, .. }
            | Self::UnknownPartType { stage, .. }
            | Self::InvalidId { stage, .. } => stage,
        }
    }
}

pub type FormatResult<T> = Result<T, FormatError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConversationError {
    #[snafu(display("message '{id}' is not part of this conversation"))]
    UnknownMessage { stage: &'static str, id: MessageId },
    #[snafu(display("message '{id}' appears more than once in this conversation"))]
    DuplicateMessage { stage: &'static str, id: MessageId },
    #[snafu(display("message '{id}' points at parent '{parent_id}' outside this conversation"))]
    DanglingParent {
        stage: &'static str,
        id: MessageId,
        parent_id: MessageId,
    },
    #[snafu(display("parent chain of message '{id}' does not terminate after {hops} hops"))]
    ParentCycle {
        stage: &'static str,
        id: MessageId,
        hops: usize,
    },
    #[snafu(display("message '{id}' belongs to session '{found}', expected '{expected}'"))]
    SessionMismatch {
        stage: &'static str,
        id: MessageId,
        expected: super::ids::SessionId,
        found: super::ids::SessionId,
    },
}

pub type ConversationResult<T> = Result<T, ConversationError>;
