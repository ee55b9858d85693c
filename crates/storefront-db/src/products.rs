//! Database operations for `products`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub public_id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    /// Always `0` when `has_variants` is set; stock then lives on the variants.
    pub stock: i32,
    pub is_digital: bool,
    pub weight: Option<Decimal>,
    /// `"active"`, `"inactive"` or `"draft"`.
    pub status: String,
    pub has_notes: bool,
    pub has_variants: bool,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inserts a product row and returns its internal `id`.
///
/// Price and weight are cast to fixed-scale `NUMERIC` columns, so values are
/// rounded to two decimal places at write time.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including check-constraint
/// violations such as a non-positive price).
pub async fn insert_product(
    pool: &PgPool,
    product: &storefront_core::NewProduct,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar::<_, i64>(
        "INSERT INTO products \
             (owner_id, name, description, price, stock, is_digital, weight, \
              status, has_notes, has_variants) \
         VALUES ($1, $2, $3, $4::numeric(14,2), $5, $6, $7::numeric(10,2), \
                 $8, $9, $10) \
         RETURNING id",
    )
    .bind(product.owner_id)
    .bind(&product.name)
    .bind(&product.description)
    .bind(product.price)
    .bind(product.stock)
    .bind(product.is_digital)
    .bind(product.weight)
    .bind(product.status.as_str())
    .bind(product.has_notes)
    .bind(product.has_variants)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Points a product at its uploaded image.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has the given `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn set_product_image(pool: &PgPool, id: i64, image_url: &str) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE products \
         SET image_url = $1, updated_at = NOW() \
         WHERE id = $2",
    )
    .bind(image_url)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Fetches a single product by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, id: i64) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT id, public_id, owner_id, name, description, price, stock, is_digital, \
                weight, status, has_notes, has_variants, image_url, created_at, updated_at \
         FROM products \
         WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;

    Ok(row)
}
