//! Error types for recipe persistence.

use std::path::PathBuf;

use scroller_common::NbtError;
use thiserror::Error;

/// Errors that can occur while loading or saving recipes.
///
/// These never leave [`RecipeStore::read_from_disk`](crate::RecipeStore::read_from_disk)
/// or [`RecipeStore::write_to_disk`](crate::RecipeStore::write_to_disk); they are
/// logged there and the store keeps its state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Tag codec error.
    #[error("Tag codec error: {0}")]
    Nbt(#[from] NbtError),

    /// The storage directory could not be created.
    #[error("Failed to create the recipe storage directory '{}': {source}", .path.display())]
    DirectoryUnavailable {
        /// Directory that could not be created.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file has no recipe list.
    #[error("Recipe file has no recipe list")]
    MissingRecipes,
}

/// Result type for recipe persistence.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::DirectoryUnavailable {
            path: PathBuf::from("/tmp/recipes"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().contains("/tmp/recipes"));

        let err = StoreError::from(NbtError::UnknownTagType(99));
        assert!(err.to_string().contains("99"));
    }
}
