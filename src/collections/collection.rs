use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::models::{AboutInfo, Category, Folder, Note, Photo};

// =============================================================================
// Collection identity
// =============================================================================

/// One of the named JSON documents the site keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CollectionId {
    Photos,
    Notes,
    Categories,
    Folders,
    Profile,
}

/// The top-level JSON type a collection document must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    List,
    Object,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::List => write!(f, "array"),
            Shape::Object => write!(f, "object"),
        }
    }
}

impl CollectionId {
    pub const ALL: [CollectionId; 5] = [
        CollectionId::Photos,
        CollectionId::Notes,
        CollectionId::Categories,
        CollectionId::Folders,
        CollectionId::Profile,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CollectionId::Photos => "photos",
            CollectionId::Notes => "notes",
            CollectionId::Categories => "categories",
            CollectionId::Folders => "folders",
            CollectionId::Profile => "profile",
        }
    }

    /// Path of the document in the remote repository.
    pub fn remote_path(self) -> &'static str {
        match self {
            CollectionId::Photos => "data/photos.json",
            CollectionId::Notes => "data/notes.json",
            CollectionId::Categories => "data/categories.json",
            CollectionId::Folders => "data/folders.json",
            CollectionId::Profile => "data/about.json",
        }
    }

    /// Key of the document in the local mirror.
    pub fn local_key(self) -> &'static str {
        match self {
            CollectionId::Photos => "photographyPhotos",
            CollectionId::Notes => "photographyNotes",
            CollectionId::Categories => "customCategories",
            CollectionId::Folders => "photographyFolders",
            CollectionId::Profile => "aboutInfo",
        }
    }

    pub fn shape(self) -> Shape {
        match self {
            CollectionId::Profile => Shape::Object,
            _ => Shape::List,
        }
    }

    /// The compiled-in value used when neither remote nor local has one.
    pub fn default_value(self) -> Value {
        match self {
            CollectionId::Photos => default_json::<Photos>(),
            CollectionId::Notes => default_json::<Notes>(),
            CollectionId::Categories => default_json::<Categories>(),
            CollectionId::Folders => default_json::<Folders>(),
            CollectionId::Profile => default_json::<Profile>(),
        }
    }

    /// True for `[]` and `{}`.
    pub fn is_empty(self, value: &Value) -> bool {
        match value {
            Value::Array(items) => items.is_empty(),
            Value::Object(fields) => fields.is_empty(),
            _ => false,
        }
    }

    /// Parse a stored document and validate it.
    pub fn decode(self, raw: &str) -> Result<Value, CodecError> {
        let value = serde_json::from_str(raw).map_err(|source| CodecError::Json {
            collection: self,
            source,
        })?;
        self.validate(value)
    }

    /// Check that `value` has this collection's shape and schema.
    ///
    /// Returns the value normalized through the typed model; fields the
    /// model does not know survive unchanged.
    pub fn validate(self, value: Value) -> Result<Value, CodecError> {
        let shape_ok = match self.shape() {
            Shape::List => value.is_array(),
            Shape::Object => value.is_object(),
        };
        if !shape_ok {
            return Err(CodecError::Shape {
                collection: self,
                expected: self.shape(),
            });
        }
        match self {
            CollectionId::Photos => normalize::<Photos>(value),
            CollectionId::Notes => normalize::<Notes>(value),
            CollectionId::Categories => normalize::<Categories>(value),
            CollectionId::Folders => normalize::<Folders>(value),
            CollectionId::Profile => normalize::<Profile>(value),
        }
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CollectionId {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "photos" => Ok(CollectionId::Photos),
            "notes" => Ok(CollectionId::Notes),
            "categories" => Ok(CollectionId::Categories),
            "folders" => Ok(CollectionId::Folders),
            "profile" | "about" => Ok(CollectionId::Profile),
            other => Err(CodecError::UnknownCollection(other.to_string())),
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// A value that cannot be stored as, or read back as, a collection.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unknown collection '{0}'")]
    UnknownCollection(String),

    #[error("{collection}: invalid JSON: {source}")]
    Json {
        collection: CollectionId,
        #[source]
        source: serde_json::Error,
    },

    #[error("{collection}: expected a JSON {expected}")]
    Shape {
        collection: CollectionId,
        expected: Shape,
    },

    #[error("{collection}: {message}")]
    Schema {
        collection: CollectionId,
        message: String,
    },
}

// =============================================================================
// Typed collections
// =============================================================================

/// Static description of a collection and the Rust type it holds.
pub trait Collection: Send + Sync + 'static {
    const ID: CollectionId;
    type Value: Serialize + DeserializeOwned + Clone + Send + Sync + 'static;

    fn default_value() -> Self::Value;
}

pub struct Photos;
pub struct Notes;
pub struct Categories;
pub struct Folders;
pub struct Profile;

impl Collection for Photos {
    const ID: CollectionId = CollectionId::Photos;
    type Value = Vec<Photo>;

    fn default_value() -> Self::Value {
        Vec::new()
    }
}

impl Collection for Notes {
    const ID: CollectionId = CollectionId::Notes;
    type Value = Vec<Note>;

    fn default_value() -> Self::Value {
        Vec::new()
    }
}

impl Collection for Categories {
    const ID: CollectionId = CollectionId::Categories;
    type Value = Vec<Category>;

    fn default_value() -> Self::Value {
        Vec::new()
    }
}

impl Collection for Folders {
    const ID: CollectionId = CollectionId::Folders;
    type Value = Vec<Folder>;

    fn default_value() -> Self::Value {
        Vec::new()
    }
}

impl Collection for Profile {
    const ID: CollectionId = CollectionId::Profile;
    type Value = AboutInfo;

    fn default_value() -> Self::Value {
        AboutInfo::default()
    }
}

/// Serialize a typed collection value.
pub fn to_json<C: Collection>(value: &C::Value) -> Result<Value, CodecError> {
    serde_json::to_value(value).map_err(|e| CodecError::Schema {
        collection: C::ID,
        message: e.to_string(),
    })
}

/// Deserialize a collection value that has already passed [`CollectionId::validate`].
pub fn from_json<C: Collection>(value: Value) -> Result<C::Value, CodecError> {
    serde_json::from_value(value).map_err(|e| CodecError::Schema {
        collection: C::ID,
        message: e.to_string(),
    })
}

fn normalize<C: Collection>(value: Value) -> Result<Value, CodecError> {
    let typed = from_json::<C>(value)?;
    to_json::<C>(&typed)
}

fn default_json<C: Collection>() -> Value {
    // The defaults are plain structs and empty vectors.
    to_json::<C>(&C::default_value()).unwrap_or(Value::Null)
}

#[cfg(test)]
pub(crate) fn populated_sample(id: CollectionId) -> Value {
    use serde_json::json;

    match id {
        CollectionId::Photos => json!([
            {
                "id": "photo_1700000000000",
                "title": "海边日落",
                "description": "Golden hour, 35mm",
                "category": "custom_1700000000000",
                "originalUrl": "https://alice.github.io/site/images/n/f/original/1_0_a.jpg",
                "watermarkedUrl": "https://alice.github.io/site/images/n/f/watermarked/1_0_a.jpg",
                "uploadDate": "2024-05-01T10:00:00.000Z",
                "fileName": "a.jpg",
                "rating": 5
            },
            {
                "id": "photo_2",
                "title": "",
                "description": "",
                "category": "",
                "url": "data:image/jpeg;base64,/9j/4AAQ"
            }
        ]),
        CollectionId::Notes => json!([
            {
                "id": "note_1",
                "title": "Gear",
                "content": "<p>35mm f/1.4 \u{00b7} \"sharp\" at f/2</p>\nline two",
                "createdAt": "2024-05-01T10:00:00.000Z",
                "lastModified": "2024-05-02T08:30:00.000Z"
            }
        ]),
        CollectionId::Categories => json!([
            { "id": "custom_1", "name": "Street", "guestVisible": true },
            { "id": "custom_2", "name": "私人", "guestVisible": false, "color": "#333" }
        ]),
        CollectionId::Folders => json!([
            { "id": "folder_1", "name": "Kyoto 2024", "category": "custom_1" }
        ]),
        CollectionId::Profile => json!({
            "name": "Lin",
            "description": "<p>Street & travel.</p>",
            "contacts": { "wechat": "lin_photo", "email": "lin@example.com" },
            "theme": "dark"
        }),
    }
}
