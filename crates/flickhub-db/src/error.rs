use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Coarse classification used by the HTTP layer to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Internal,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Adding to user and group same time is not allowed")]
    OwnerConflict,

    #[error("No user or group specified")]
    MissingOwner,

    #[error("Adding to series and movie same time is not allowed")]
    TargetConflict,

    #[error("Please add movie or series")]
    MissingTarget,

    #[error("Already in favourites")]
    DuplicateFavourite,

    #[error("No user or group found for scope `{0}`")]
    InvalidScope(String),

    #[error("Username or email already in use")]
    UserExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Missing groupId")]
    MissingGroupId,

    #[error("Missing comment")]
    MissingComment,

    #[error("No comments found for your group")]
    NoComments,

    #[error("Comment not found or you do not have permission to delete it")]
    CommentNotFound,

    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OwnerConflict
            | Self::MissingOwner
            | Self::TargetConflict
            | Self::MissingTarget
            | Self::InvalidScope(_)
            | Self::MissingGroupId
            | Self::MissingComment => ErrorKind::Validation,
            Self::DuplicateFavourite | Self::UserExists => ErrorKind::Conflict,
            Self::UserNotFound | Self::NoComments | Self::CommentNotFound => ErrorKind::NotFound,
            Self::Hash(_) | Self::Pool(_) | Self::Database(_) => ErrorKind::Internal,
        }
    }
}

/// True when `err` is a UNIQUE constraint (or unique index) violation.
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// True when `err` is a FOREIGN KEY violation, e.g. a row pointing at a
/// deleted user.
pub(crate) fn is_foreign_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY
    )
}
