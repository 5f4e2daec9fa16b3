//! Wire-level access to the hosted content API.

mod content_backend;
mod github_backend;
mod memory_backend;

pub use content_backend::{
    encode_path, ContentBackend, DeleteRequest, PutRequest, RemoteError, RemoteTarget,
    RepositoryInfo, Result, Revision, WireFile,
};
pub use github_backend::{GithubBackend, DEFAULT_API_BASE};
pub use memory_backend::MemoryBackend;
