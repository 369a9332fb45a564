//! Error types for skillsync-profiles

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid profile id '{id}': {reason}")]
    InvalidProfileId { id: String, reason: String },

    #[error("Invalid {field} '{path}' for profile '{id}': {reason}")]
    InvalidProfilePath {
        id: String,
        field: &'static str,
        path: String,
        reason: String,
    },
}
