//! Error types for skillsync-blocks

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Block not found: {id}")]
    BlockNotFound { id: String },
}
