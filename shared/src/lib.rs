// shared/src/lib.rs

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("not found")]
    NotFound,
    #[error("storage write failed: {0}")]
    StorageWrite(String),
    #[error("metadata write failed: {0}")]
    MetadataWrite(String),
    #[error("corrupt artifact: {0}")]
    CorruptArtifact(String),
    #[error("directory read failed: {0}")]
    DirectoryRead(String),
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod config;
