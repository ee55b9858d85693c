//! Bulk CSV import of products and their variants.
//!
//! Pipeline: [`read_rows`] (reads and validates every row) →
//! [`group_rows`] (one [`ProductGroup`] per product name) →
//! [`BulkImporter`] (writes each group through a [`ProductWriter`] and
//! reports progress).

pub mod error;
pub mod expand;
pub mod group;
pub mod input;
pub mod numeric;
pub mod orchestrator;
pub mod store;
pub mod template;
pub mod tiers;
pub mod validate;
pub mod writer;

pub use error::{ImportError, StoreError};
pub use expand::{expand, VariantCombination};
pub use group::{group_rows, ProductGroup};
pub use input::{read_rows, read_rows_from_path, InputRow, ParsedRow};
pub use orchestrator::{
    BulkImporter, ImportFailure, ImportProgress, ImportReport, ImportSuccess, ProgressStatus,
};
pub use store::{CatalogStore, ImageStore};
pub use template::write_template;
pub use tiers::{build_tiers, VariantTier};
pub use validate::{validate, ValidationError};
pub use writer::{ImportWarning, ProductWriter, WarningStep, WriteError, WriteOutcome};
