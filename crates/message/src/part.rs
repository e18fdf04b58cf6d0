use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::ids::AssetId;

/// Open string-keyed payload attached to a part.
pub type Meta = Map<String, Value>;

/// Discriminant of the well-known part kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    Text,
    Image,
    Audio,
    Video,
    File,
    ToolCall,
    ToolResult,
    Data,
}

impl PartKind {
    pub const ALL: [PartKind; 8] = [
        PartKind::Text,
        PartKind::Image,
        PartKind::Audio,
        PartKind::Video,
        PartKind::File,
        PartKind::ToolCall,
        PartKind::ToolResult,
        PartKind::Data,
    ];

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "text" => Some(Self::Text),
            "image" => Some(Self::Image),
            "audio" => Some(Self::Audio),
            "video" => Some(Self::Video),
            "file" => Some(Self::File),
            "tool-call" => Some(Self::ToolCall),
            "tool-result" => Some(Self::ToolResult),
            "data" => Some(Self::Data),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::File => "file",
            Self::ToolCall => "tool-call",
            Self::ToolResult => "tool-result",
            Self::Data => "data",
        }
    }

    pub fn is_media(&self) -> bool {
        matches!(self, Self::Image | Self::Audio | Self::Video | Self::File)
    }
}

impl fmt::Display for PartKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextPart {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(
        default,
        deserialize_with = "deserialize_meta",
        skip_serializing_if = "Meta::is_empty"
    )]
    pub meta: Meta,
    /// Wire fields this kind does not model, written back unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TextPart {
    fn with_meta(&self, meta: Meta) -> Self {
        Self {
            text: self.text.clone(),
            meta,
            extra: self.extra.clone(),
        }
    }
}

/// Reference to a stored asset plus the descriptive fields shared by
/// image, audio, video and file parts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<AssetId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Signed on the wire; a negative size is carried as given.
    #[serde(
        rename = "size_bigint",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub size_bytes: Option<i64>,
    /// Text extracted from the asset, if any.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(
        default,
        deserialize_with = "deserialize_meta",
        skip_serializing_if = "Meta::is_empty"
    )]
    pub meta: Meta,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MediaPart {
    pub fn with_asset(asset_id: AssetId, mime: impl Into<String>) -> Self {
        Self {
            asset_id: Some(asset_id),
            mime: Some(mime.into()),
            ..Self::default()
        }
    }

    fn with_meta(&self, meta: Meta) -> Self {
        Self {
            asset_id: self.asset_id,
            mime: self.mime.clone(),
            filename: self.filename.clone(),
            size_bytes: self.size_bytes,
            text: self.text.clone(),
            meta,
            extra: self.extra.clone(),
        }
    }
}

/// Body of tool-call, tool-result and data parts. The structured payload
/// lives in `meta`; `text` holds plain output such as a tool's result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StructuredPart {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(
        default,
        deserialize_with = "deserialize_meta",
        skip_serializing_if = "Meta::is_empty"
    )]
    pub meta: Meta,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StructuredPart {
    fn from_meta(meta: Meta) -> Self {
        Self {
            meta,
            ..Self::default()
        }
    }

    fn with_meta(&self, meta: Meta) -> Self {
        Self {
            text: self.text.clone(),
            meta,
            extra: self.extra.clone(),
        }
    }
}

/// A part whose `type` is not one of the well-known kinds.
///
/// The full JSON body (minus `type`) is kept so the part can be written back
/// exactly as it arrived.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionPart {
    pub part_type: String,
    pub body: Map<String, Value>,
}

/// One unit of message content.
#[derive(Debug, Clone, PartialEq)]
pub enum Part {
    Text(TextPart),
    Image(MediaPart),
    Audio(MediaPart),
    Video(MediaPart),
    File(MediaPart),
    ToolCall(StructuredPart),
    ToolResult(StructuredPart),
    Data(StructuredPart),
    Extension(ExtensionPart),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextPart {
            text: text.into(),
            ..TextPart::default()
        })
    }

    pub fn image(media: MediaPart) -> Self {
        Self::Image(media)
    }

    pub fn audio(media: MediaPart) -> Self {
        Self::Audio(media)
    }

    pub fn video(media: MediaPart) -> Self {
        Self::Video(media)
    }

    pub fn file(media: MediaPart) -> Self {
        Self::File(media)
    }

    pub fn tool_call(meta: Meta) -> Self {
        Self::ToolCall(StructuredPart::from_meta(meta))
    }

    pub fn tool_result(meta: Meta) -> Self {
        Self::ToolResult(StructuredPart::from_meta(meta))
    }

    pub fn data(meta: Meta) -> Self {
        Self::Data(StructuredPart::from_meta(meta))
    }

    pub fn extension(part_type: impl Into<String>, mut body: Map<String, Value>) -> Self {
        body.remove("type");
        Self::Extension(ExtensionPart {
            part_type: part_type.into(),
            body,
        })
    }

    /// Well-known kind, or `None` for extension parts.
    pub fn kind(&self) -> Option<PartKind> {
        match self {
            Self::Text(_) => Some(PartKind::Text),
            Self::Image(_) => Some(PartKind::Image),
            Self::Audio(_) => Some(PartKind::Audio),
            Self::Video(_) => Some(PartKind::Video),
            Self::File(_) => Some(PartKind::File),
            Self::ToolCall(_) => Some(PartKind::ToolCall),
            Self::ToolResult(_) => Some(PartKind::ToolResult),
            Self::Data(_) => Some(PartKind::Data),
            Self::Extension(_) => None,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            Self::Extension(extension) => &extension.part_type,
            known => known.kind().map(|kind| kind.as_str()).unwrap_or_default(),
        }
    }

    pub fn meta(&self) -> Option<&Meta> {
        match self {
            Self::Text(part) => Some(&part.meta),
            Self::Image(part) | Self::Audio(part) | Self::Video(part) | Self::File(part) => {
                Some(&part.meta)
            }
            Self::ToolCall(part) | Self::ToolResult(part) | Self::Data(part) => Some(&part.meta),
            Self::Extension(part) => part.body.get("meta").and_then(Value::as_object),
        }
    }

    pub fn has_meta(&self) -> bool {
        self.meta().is_some_and(|meta| !meta.is_empty())
    }

    /// Copy of this part carrying `meta` in place of its current map.
    pub fn with_meta(&self, meta: Meta) -> Self {
        match self {
            Self::Text(part) => Self::Text(part.with_meta(meta)),
            Self::Image(part) => Self::Image(part.with_meta(meta)),
            Self::Audio(part) => Self::Audio(part.with_meta(meta)),
            Self::Video(part) => Self::Video(part.with_meta(meta)),
            Self::File(part) => Self::File(part.with_meta(meta)),
            Self::ToolCall(part) => Self::ToolCall(part.with_meta(meta)),
            Self::ToolResult(part) => Self::ToolResult(part.with_meta(meta)),
            Self::Data(part) => Self::Data(part.with_meta(meta)),
            Self::Extension(part) => {
                let mut body = part.body.clone();
                body.insert("meta".to_string(), Value::Object(meta));
                Self::Extension(ExtensionPart {
                    part_type: part.part_type.clone(),
                    body,
                })
            }
        }
    }

    pub fn media(&self) -> Option<&MediaPart> {
        match self {
            Self::Image(part) | Self::Audio(part) | Self::Video(part) | Self::File(part) => {
                Some(part)
            }
            _ => None,
        }
    }

    pub fn asset_id(&self) -> Option<AssetId> {
        self.media().and_then(|media| media.asset_id)
    }

    fn decode_known(kind: PartKind, body: Map<String, Value>) -> serde_json::Result<Self> {
        let body = Value::Object(body);
        let part = match kind {
            PartKind::Text => Self::Text(serde_json::from_value(body)?),
            PartKind::Image => Self::Image(serde_json::from_value(body)?),
            PartKind::Audio => Self::Audio(serde_json::from_value(body)?),
            PartKind::Video => Self::Video(serde_json::from_value(body)?),
            PartKind::File => Self::File(serde_json::from_value(body)?),
            PartKind::ToolCall => Self::ToolCall(serde_json::from_value(body)?),
            PartKind::ToolResult => Self::ToolResult(serde_json::from_value(body)?),
            PartKind::Data => Self::Data(serde_json::from_value(body)?),
        };
        Ok(part)
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
enum KnownPartRef<'a> {
    Text(&'a TextPart),
    Image(&'a MediaPart),
    Audio(&'a MediaPart),
    Video(&'a MediaPart),
    File(&'a MediaPart),
    ToolCall(&'a StructuredPart),
    ToolResult(&'a StructuredPart),
    Data(&'a StructuredPart),
}

impl Serialize for Part {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let known = match self {
            Self::Text(part) => KnownPartRef::Text(part),
            Self::Image(part) => KnownPartRef::Image(part),
            Self::Audio(part) => KnownPartRef::Audio(part),
            Self::Video(part) => KnownPartRef::Video(part),
            Self::File(part) => KnownPartRef::File(part),
            Self::ToolCall(part) => KnownPartRef::ToolCall(part),
            Self::ToolResult(part) => KnownPartRef::ToolResult(part),
            Self::Data(part) => KnownPartRef::Data(part),
            Self::Extension(extension) => {
                let mut map = serializer.serialize_map(Some(extension.body.len() + 1))?;
                map.serialize_entry("type", &extension.part_type)?;
                for (key, value) in &extension.body {
                    map.serialize_entry(key, value)?;
                }
                return map.end();
            }
        };
        known.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Part {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut body = Map::<String, Value>::deserialize(deserializer)?;
        let part_type = match body.remove("type") {
            Some(Value::String(part_type)) => part_type,
            Some(other) => {
                return Err(de::Error::custom(format!(
                    "part type must be a string, found {other}"
                )));
            }
            None => return Err(de::Error::missing_field("type")),
        };

        match PartKind::parse(&part_type) {
            Some(kind) => Part::decode_known(kind, body).map_err(de::Error::custom),
            None => Ok(Part::Extension(ExtensionPart { part_type, body })),
        }
    }
}

// A `null` meta on the wire means "no metadata".
fn deserialize_meta<'de, D>(deserializer: D) -> Result<Meta, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Meta>::deserialize(deserializer)?.unwrap_or_default())
}
