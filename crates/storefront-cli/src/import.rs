//! `import`, `validate` and `template` command handlers.

use std::fs::File;
use std::io::{self, Write as _};
use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use storefront_db::ImportRunTotals;
use storefront_import::{
    group_rows, read_rows_from_path, BulkImporter, ImportReport, ParsedRow, ProductGroup,
    ProgressStatus,
};
use storefront_storage::StorageClient;
use uuid::Uuid;

fn load_rows(file: &Path) -> anyhow::Result<Vec<ParsedRow>> {
    read_rows_from_path(file).with_context(|| format!("failed to read {}", file.display()))
}

/// Prints every row error and returns how many rows had at least one.
fn print_row_errors(rows: &[ParsedRow]) -> usize {
    let mut invalid = 0;
    for row in rows.iter().filter(|r| !r.is_valid()) {
        invalid += 1;
        for error in &row.errors {
            println!("  {error}");
        }
    }
    invalid
}

fn print_groups(groups: &[ProductGroup]) {
    for group in groups {
        if group.has_variants {
            println!(
                "  {} ({} variants)",
                group.product_name,
                group.combinations().len()
            );
        } else {
            println!("  {}", group.product_name);
        }
    }
}

/// Import a CSV file for `owner`, recording the attempt as an import run.
///
/// Rows with validation errors are reported and skipped. A product that
/// cannot be written is logged and does not stop the others; the run is
/// marked failed only when no product could be written.
///
/// # Errors
///
/// Returns an error if the file cannot be read, contains no importable
/// product, the storage client cannot be built, the run cannot be recorded,
/// or every product fails.
pub(crate) async fn run_import(
    pool: &sqlx::PgPool,
    config: &storefront_core::AppConfig,
    file: &Path,
    owner: Uuid,
) -> anyhow::Result<()> {
    let rows = load_rows(file)?;
    let invalid = print_row_errors(&rows);
    if invalid > 0 {
        tracing::warn!(invalid_rows = invalid, "skipping rows with validation errors");
    }

    let groups = group_rows(&rows);
    if groups.is_empty() {
        anyhow::bail!("{} contains no importable products", file.display());
    }

    let storage = StorageClient::new(
        &config.storage_url,
        &config.storage_key,
        &config.image_bucket,
        config.http_timeout_secs,
        &config.http_user_agent,
    )
    .context("failed to build storage client")?
    .with_retry(config.http_max_retries, config.http_retry_backoff_base_secs);

    let total = i32::try_from(groups.len()).unwrap_or(i32::MAX);
    let run = storefront_db::create_import_run(pool, owner, &file.display().to_string()).await?;
    if let Err(e) = storefront_db::start_import_run(pool, run.id, total).await {
        fail_run_best_effort(pool, run.id, ImportRunTotals::default(), format!("{e:#}")).await;
        return Err(e.into());
    }

    let importer = BulkImporter::new(pool, &storage)
        .with_delay(Duration::from_millis(config.import_delay_ms));
    let report = importer
        .run_with_progress(&groups, owner, |progress| match progress.status {
            ProgressStatus::Processing => tracing::info!(
                run_id = run.id,
                current = progress.current,
                total = progress.total,
                product = %progress.current_product,
                "importing product"
            ),
            ProgressStatus::Error => tracing::warn!(
                run_id = run.id,
                product = %progress.current_product,
                failed = progress.failed,
                "product failed"
            ),
            ProgressStatus::Completed => tracing::info!(
                run_id = run.id,
                succeeded = progress.succeeded,
                failed = progress.failed,
                "import finished"
            ),
        })
        .await;

    print_report(&report);
    let totals = totals_of(&report);

    if report.successes.is_empty() {
        let message = format!("all {} products failed to import", report.errors.len());
        fail_run_best_effort(pool, run.id, totals, message.clone()).await;
        anyhow::bail!("{message}");
    }

    if let Err(err) = storefront_db::complete_import_run(pool, run.id, totals).await {
        fail_run_best_effort(pool, run.id, totals, format!("{err:#}")).await;
        return Err(err.into());
    }

    Ok(())
}

/// Read and group a file, printing what an import would create.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub(crate) fn run_import_dry_run(file: &Path) -> anyhow::Result<()> {
    let rows = load_rows(file)?;
    let invalid = print_row_errors(&rows);
    let groups = group_rows(&rows);

    println!(
        "dry-run: {} rows read, {invalid} skipped, {} products would be imported",
        rows.len(),
        groups.len()
    );
    print_groups(&groups);
    Ok(())
}

/// Check every row of a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or any row is invalid.
pub(crate) fn run_validate(file: &Path) -> anyhow::Result<()> {
    let rows = load_rows(file)?;
    let invalid = print_row_errors(&rows);
    if invalid > 0 {
        anyhow::bail!("{invalid} of {} rows have errors", rows.len());
    }
    println!(
        "{} rows ok, {} products",
        rows.len(),
        group_rows(&rows).len()
    );
    Ok(())
}

/// Write the example CSV to `output`, or to stdout.
///
/// # Errors
///
/// Returns an error if the output cannot be written.
pub(crate) fn run_template(output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            storefront_import::write_template(file)?;
            println!("wrote template to {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            storefront_import::write_template(&mut stdout)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn totals_of(report: &ImportReport) -> ImportRunTotals {
    let count = |n: usize| i32::try_from(n).unwrap_or(i32::MAX);
    ImportRunTotals {
        total: count(report.total()),
        succeeded: count(report.successes.len()),
        failed: count(report.errors.len()),
    }
}

fn print_report(report: &ImportReport) {
    println!(
        "imported {} of {} products ({} warnings)",
        report.successes.len(),
        report.total(),
        report.warning_count()
    );
    for success in report.successes.iter().filter(|s| !s.warnings.is_empty()) {
        println!("  {} (id {}):", success.product_name, success.product_id);
        for warning in &success.warnings {
            println!("    warning: {warning}");
        }
    }
    for failure in &report.errors {
        println!("  {}: {}", failure.product_name, failure.message);
    }
}

async fn fail_run_best_effort(
    pool: &sqlx::PgPool,
    run_id: i64,
    totals: ImportRunTotals,
    message: String,
) {
    if let Err(mark_err) = storefront_db::fail_import_run(pool, run_id, totals, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            original_error = %message,
            "failed to mark import run as failed"
        );
    }
}
