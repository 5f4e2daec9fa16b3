//! The portfolio collections and their record types.

mod collection;
mod models;

pub use collection::{
    from_json, to_json, Categories, CodecError, Collection, CollectionId, Folders, Notes, Photos,
    Profile, Shape,
};
pub use models::{AboutInfo, Category, Contacts, Folder, Note, Photo};

#[cfg(test)]
pub(crate) use collection::populated_sample;
