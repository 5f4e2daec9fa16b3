//! The remote file store and its configuration.

mod content_encoding;
mod remote_config;
mod remote_file_store;

pub use content_encoding::{decode_content, encode_content, is_base64};
pub use remote_config::{RemoteConfig, DEFAULT_BRANCH, SETTINGS_KEY};
pub use remote_file_store::{
    RemoteFile, RemoteFileStore, Timeouts, DEFAULT_READ_TIMEOUT, DEFAULT_WRITE_TIMEOUT,
};
