//! Database operations for `variant_options` and `product_variants`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use storefront_core::{NewVariant, NewVariantOption, StoredVariant, VariantKey, VariantPatch};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `variant_options` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariantOptionRow {
    pub id: i64,
    pub product_id: i64,
    pub tier_level: i16,
    pub tier_name: String,
    pub option_value: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

/// A row from the `product_variants` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VariantRow {
    pub id: i64,
    pub product_id: i64,
    pub tier1_value: Option<String>,
    pub tier2_value: Option<String>,
    pub tier3_value: Option<String>,
    pub full_name: String,
    pub price: Decimal,
    pub stock: i32,
    pub weight: Option<Decimal>,
    pub sku: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VariantRow {
    #[must_use]
    pub fn key(&self) -> VariantKey {
        VariantKey::from_raw(
            self.tier1_value.as_deref(),
            self.tier2_value.as_deref(),
            self.tier3_value.as_deref(),
        )
    }
}

#[derive(sqlx::FromRow)]
struct InsertedVariantRow {
    id: i64,
    tier1_value: Option<String>,
    tier2_value: Option<String>,
    tier3_value: Option<String>,
    full_name: String,
}

impl From<InsertedVariantRow> for StoredVariant {
    fn from(row: InsertedVariantRow) -> Self {
        Self {
            id: row.id,
            key: VariantKey::from_raw(
                row.tier1_value.as_deref(),
                row.tier2_value.as_deref(),
                row.tier3_value.as_deref(),
            ),
            full_name: row.full_name,
        }
    }
}

// ---------------------------------------------------------------------------
// variant_options operations
// ---------------------------------------------------------------------------

/// Inserts the option catalog for one or more products in a single statement.
///
/// Returns the number of rows inserted. An empty slice is a no-op.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including when the same
/// `(product_id, tier_level, option_value)` appears twice.
pub async fn insert_variant_options(
    pool: &PgPool,
    options: &[NewVariantOption],
) -> Result<u64, DbError> {
    if options.is_empty() {
        return Ok(0);
    }

    let product_ids: Vec<i64> = options.iter().map(|o| o.product_id).collect();
    let levels: Vec<i16> = options.iter().map(|o| o.tier_level).collect();
    let names: Vec<&str> = options.iter().map(|o| o.tier_name.as_str()).collect();
    let values: Vec<&str> = options.iter().map(|o| o.option_value.as_str()).collect();
    let sort_orders: Vec<i32> = options.iter().map(|o| o.sort_order).collect();

    let rows_affected = sqlx::query(
        "INSERT INTO variant_options \
             (product_id, tier_level, tier_name, option_value, sort_order) \
         SELECT * FROM UNNEST($1::int8[], $2::int2[], $3::text[], $4::text[], $5::int4[])",
    )
    .bind(&product_ids)
    .bind(&levels)
    .bind(&names)
    .bind(&values)
    .bind(&sort_orders)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(rows_affected)
}

/// Returns a product's option catalog ordered by tier level then `sort_order`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_variant_options(
    pool: &PgPool,
    product_id: i64,
) -> Result<Vec<VariantOptionRow>, DbError> {
    let rows = sqlx::query_as::<_, VariantOptionRow>(
        "SELECT id, product_id, tier_level, tier_name, option_value, sort_order, created_at \
         FROM variant_options \
         WHERE product_id = $1 \
         ORDER BY tier_level, sort_order, id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// product_variants operations
// ---------------------------------------------------------------------------

/// Bulk-inserts variant combinations and returns them with their new ids.
///
/// The returned rows are not guaranteed to follow the input order; callers
/// match them back by [`VariantKey`].
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_variants(
    pool: &PgPool,
    variants: &[NewVariant],
) -> Result<Vec<StoredVariant>, DbError> {
    if variants.is_empty() {
        return Ok(Vec::new());
    }

    let product_ids: Vec<i64> = variants.iter().map(|v| v.product_id).collect();
    let tier1: Vec<Option<&str>> = variants.iter().map(|v| v.key.tier1.as_deref()).collect();
    let tier2: Vec<Option<&str>> = variants.iter().map(|v| v.key.tier2.as_deref()).collect();
    let tier3: Vec<Option<&str>> = variants.iter().map(|v| v.key.tier3.as_deref()).collect();
    let full_names: Vec<&str> = variants.iter().map(|v| v.full_name.as_str()).collect();
    let prices: Vec<Decimal> = variants.iter().map(|v| v.price).collect();
    let stocks: Vec<i32> = variants.iter().map(|v| v.stock).collect();
    let weights: Vec<Option<Decimal>> = variants.iter().map(|v| v.weight).collect();
    let skus: Vec<Option<&str>> = variants.iter().map(|v| v.sku.as_deref()).collect();
    let active: Vec<bool> = variants.iter().map(|v| v.is_active).collect();

    let rows = sqlx::query_as::<_, InsertedVariantRow>(
        "INSERT INTO product_variants \
             (product_id, tier1_value, tier2_value, tier3_value, full_name, \
              price, stock, weight, sku, is_active) \
         SELECT v.product_id, v.t1, v.t2, v.t3, v.full_name, \
                v.price::numeric(14,2), v.stock, v.weight::numeric(10,2), v.sku, v.is_active \
         FROM UNNEST($1::int8[], $2::text[], $3::text[], $4::text[], $5::text[], \
                     $6::numeric[], $7::int4[], $8::numeric[], $9::text[], $10::bool[]) \
              AS v(product_id, t1, t2, t3, full_name, price, stock, weight, sku, is_active) \
         RETURNING id, tier1_value, tier2_value, tier3_value, full_name",
    )
    .bind(&product_ids)
    .bind(&tier1)
    .bind(&tier2)
    .bind(&tier3)
    .bind(&full_names)
    .bind(&prices)
    .bind(&stocks)
    .bind(&weights)
    .bind(&skus)
    .bind(&active)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(StoredVariant::from).collect())
}

/// Applies per-variant overrides. Fields left `None` in `patch` keep their
/// stored value.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no variant has the given `id`, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_variant(pool: &PgPool, id: i64, patch: &VariantPatch) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE product_variants SET \
             price       = COALESCE($2::numeric(14,2), price), \
             stock       = COALESCE($3, stock), \
             weight      = COALESCE($4::numeric(10,2), weight), \
             sku         = COALESCE($5, sku), \
             is_active   = COALESCE($6, is_active), \
             description = COALESCE($7, description), \
             image_url   = COALESCE($8, image_url), \
             updated_at  = NOW() \
         WHERE id = $1",
    )
    .bind(id)
    .bind(patch.price)
    .bind(patch.stock)
    .bind(patch.weight)
    .bind(&patch.sku)
    .bind(patch.is_active)
    .bind(&patch.description)
    .bind(&patch.image_url)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }

    Ok(())
}

/// Returns all variants of a product ordered by `id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_variants(pool: &PgPool, product_id: i64) -> Result<Vec<VariantRow>, DbError> {
    let rows = sqlx::query_as::<_, VariantRow>(
        "SELECT id, product_id, tier1_value, tier2_value, tier3_value, full_name, price, \
                stock, weight, sku, image_url, is_active, description, created_at, updated_at \
         FROM product_variants \
         WHERE product_id = $1 \
         ORDER BY id",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
