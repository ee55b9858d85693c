//! Capabilities the writer needs from the outside world.
//!
//! Production code passes a `PgPool` and a `StorageClient`; tests pass
//! in-memory fakes.

use std::future::Future;

use sqlx::PgPool;
use storefront_core::{NewProduct, NewVariant, NewVariantOption, StoredVariant, VariantPatch};
use storefront_storage::{RemoteImage, StorageClient};

use crate::error::StoreError;

/// Where products and their variants are persisted.
pub trait CatalogStore: Sync {
    /// Inserts a product and returns its id.
    fn insert_product(
        &self,
        product: &NewProduct,
    ) -> impl Future<Output = Result<i64, StoreError>> + Send;

    fn set_product_image(
        &self,
        product_id: i64,
        image_url: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Returns the number of options stored.
    fn insert_variant_options(
        &self,
        options: &[NewVariantOption],
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    /// Returns the stored variants in no particular order.
    fn insert_variants(
        &self,
        variants: &[NewVariant],
    ) -> impl Future<Output = Result<Vec<StoredVariant>, StoreError>> + Send;

    fn update_variant(
        &self,
        variant_id: i64,
        patch: &VariantPatch,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Where product images come from and go to.
pub trait ImageStore: Sync {
    fn fetch_remote(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<RemoteImage, StoreError>> + Send;

    /// Uploads `image` to `path` and returns its public URL.
    fn upload_image(
        &self,
        path: &str,
        image: &RemoteImage,
    ) -> impl Future<Output = Result<String, StoreError>> + Send;
}

impl CatalogStore for PgPool {
    async fn insert_product(&self, product: &NewProduct) -> Result<i64, StoreError> {
        Ok(storefront_db::insert_product(self, product).await?)
    }

    async fn set_product_image(
        &self,
        product_id: i64,
        image_url: &str,
    ) -> Result<(), StoreError> {
        Ok(storefront_db::set_product_image(self, product_id, image_url).await?)
    }

    async fn insert_variant_options(
        &self,
        options: &[NewVariantOption],
    ) -> Result<u64, StoreError> {
        Ok(storefront_db::insert_variant_options(self, options).await?)
    }

    async fn insert_variants(
        &self,
        variants: &[NewVariant],
    ) -> Result<Vec<StoredVariant>, StoreError> {
        Ok(storefront_db::insert_variants(self, variants).await?)
    }

    async fn update_variant(
        &self,
        variant_id: i64,
        patch: &VariantPatch,
    ) -> Result<(), StoreError> {
        Ok(storefront_db::update_variant(self, variant_id, patch).await?)
    }
}

impl ImageStore for StorageClient {
    async fn fetch_remote(&self, url: &str) -> Result<RemoteImage, StoreError> {
        Ok(StorageClient::fetch_remote(self, url).await?)
    }

    async fn upload_image(&self, path: &str, image: &RemoteImage) -> Result<String, StoreError> {
        Ok(self.upload(path, image).await?)
    }
}
