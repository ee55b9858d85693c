//! Bulk Orchestrator: writes product groups one after another and reports
//! progress as it goes.

use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::group::ProductGroup;
use crate::store::{CatalogStore, ImageStore};
use crate::writer::{ImportWarning, ProductWriter};

const DEFAULT_DELAY_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Processing,
    Error,
    Completed,
}

/// Snapshot handed to the progress callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportProgress {
    /// 1-based position of the group being processed; equals `total` once
    /// completed.
    pub current: usize,
    pub total: usize,
    /// Empty once completed.
    pub current_product: String,
    pub status: ProgressStatus,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSuccess {
    pub product_id: i64,
    pub product_name: String,
    pub variant_count: usize,
    pub warnings: Vec<ImportWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportFailure {
    pub product_name: String,
    pub message: String,
}

/// Every group ends up in exactly one of the two lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub successes: Vec<ImportSuccess>,
    pub errors: Vec<ImportFailure>,
}

impl ImportReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.successes.len() + self.errors.len()
    }

    /// `true` when some product was written but not completely.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.successes.iter().any(|s| !s.warnings.is_empty())
    }

    #[must_use]
    pub fn warning_count(&self) -> usize {
        self.successes.iter().map(|s| s.warnings.len()).sum()
    }
}

/// Imports product groups for one owner, strictly one at a time.
pub struct BulkImporter<'a, C, I> {
    writer: ProductWriter<'a, C, I>,
    delay: Duration,
}

impl<'a, C: CatalogStore, I: ImageStore> BulkImporter<'a, C, I> {
    #[must_use]
    pub fn new(catalog: &'a C, images: &'a I) -> Self {
        Self {
            writer: ProductWriter::new(catalog, images),
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
        }
    }

    /// Pause between consecutive groups.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub async fn run(&self, groups: &[ProductGroup], owner_id: Uuid) -> ImportReport {
        self.run_with_progress(groups, owner_id, |_| {}).await
    }

    /// Like [`BulkImporter::run`], calling `on_progress` before each group,
    /// after each failed group, and once at the end.
    pub async fn run_with_progress<F>(
        &self,
        groups: &[ProductGroup],
        owner_id: Uuid,
        mut on_progress: F,
    ) -> ImportReport
    where
        F: FnMut(&ImportProgress),
    {
        let total = groups.len();
        let mut report = ImportReport::default();

        for (idx, group) in groups.iter().enumerate() {
            let current = idx + 1;
            on_progress(&ImportProgress {
                current,
                total,
                current_product: group.product_name.clone(),
                status: ProgressStatus::Processing,
                succeeded: report.successes.len(),
                failed: report.errors.len(),
            });

            match self.writer.write(group, owner_id).await {
                Ok(outcome) => report.successes.push(ImportSuccess {
                    product_id: outcome.product_id,
                    product_name: outcome.product_name,
                    variant_count: outcome.variant_count,
                    warnings: outcome.warnings,
                }),
                Err(e) => {
                    tracing::error!(
                        product = %group.product_name,
                        error = %e,
                        "product import failed"
                    );
                    report.errors.push(ImportFailure {
                        product_name: group.product_name.clone(),
                        message: e.to_string(),
                    });
                    on_progress(&ImportProgress {
                        current,
                        total,
                        current_product: group.product_name.clone(),
                        status: ProgressStatus::Error,
                        succeeded: report.successes.len(),
                        failed: report.errors.len(),
                    });
                }
            }

            if current < total && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        on_progress(&ImportProgress {
            current: total,
            total,
            current_product: String::new(),
            status: ProgressStatus::Completed,
            succeeded: report.successes.len(),
            failed: report.errors.len(),
        });

        tracing::info!(
            total,
            succeeded = report.successes.len(),
            failed = report.errors.len(),
            warnings = report.warning_count(),
            "bulk import finished"
        );
        report
    }
}
