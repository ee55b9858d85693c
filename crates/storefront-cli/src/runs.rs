//! `runs` command handlers.

use uuid::Uuid;

/// Print the most recent import runs, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_runs_list(
    pool: &sqlx::PgPool,
    owner: Option<Uuid>,
    limit: i64,
) -> anyhow::Result<()> {
    let runs = storefront_db::list_import_runs(pool, owner, limit).await?;

    if runs.is_empty() {
        println!("no import runs found; run `storefront import` first");
        return Ok(());
    }

    println!(
        "{:<8}{:<11}{:<18}{:>7}{:>7}{:>7}  FILE",
        "ID", "STATUS", "CREATED", "TOTAL", "OK", "FAIL"
    );
    for run in &runs {
        println!(
            "{:<8}{:<11}{:<18}{:>7}{:>7}{:>7}  {}",
            run.id,
            run.status,
            run.created_at.format("%Y-%m-%d %H:%M"),
            run.total_products,
            run.succeeded_products,
            run.failed_products,
            run.source_file
        );
        if let Some(message) = &run.error_message {
            println!("        error: {message}");
        }
    }

    Ok(())
}
