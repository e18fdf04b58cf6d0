//! Canonical conversation messages and the normalizers that produce them from
//! provider-specific shapes (OpenAI, Anthropic, LangChain).

pub mod conversation;
pub mod error;
pub mod format;
pub mod ids;
pub mod message;
pub mod normalizer;
pub mod part;
pub mod pipeline;
pub mod remap;
pub mod role;

pub use conversation::ConversationTree;
pub use error::{ConversationError, ConversationResult, FormatError, FormatResult};
pub use format::{FormatRegistry, MessageFormat, format_registry};
pub use ids::{AssetId, MessageId, SessionId};
pub use message::{Message, NewMessage, TaskProcessStatus};
pub use normalizer::{Normalized, Normalizer};
pub use part::{ExtensionPart, MediaPart, Meta, Part, PartKind, StructuredPart, TextPart};
pub use pipeline::{IngestOptions, MessageIn, PartTypePolicy, normalize, prepare_message};
pub use role::Role;
