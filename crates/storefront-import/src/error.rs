use thiserror::Error;

/// Failure reading an import file as a whole. Problems with individual rows
/// are reported as [`crate::ValidationError`]s instead.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read import file: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("import file has no header row")]
    MissingHeader,
}

/// Failure reported by a [`crate::CatalogStore`] or [`crate::ImageStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Db(#[from] storefront_db::DbError),

    #[error(transparent)]
    Storage(#[from] storefront_storage::StorageError),

    #[error("{0}")]
    Rejected(String),
}
