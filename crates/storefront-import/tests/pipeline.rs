//! End-to-end tests of the import pipeline against in-memory stores.

use std::collections::HashSet;
use std::io::Write as _;
use std::sync::Mutex;
use std::time::Duration;

use rust_decimal::Decimal;
use storefront_core::{
    NewProduct, NewVariant, NewVariantOption, StoredVariant, VariantKey, VariantPatch,
};
use storefront_import::{
    expand, group_rows, read_rows, read_rows_from_path, BulkImporter, CatalogStore, ImageStore,
    ImportProgress, InputRow, ParsedRow, ProductWriter, ProgressStatus, StoreError, WarningStep,
};
use storefront_storage::RemoteImage;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Recorded {
    products: Vec<(i64, NewProduct)>,
    product_images: Vec<(i64, String)>,
    options: Vec<NewVariantOption>,
    variants: Vec<(i64, NewVariant)>,
    patches: Vec<(i64, VariantPatch)>,
    next_id: i64,
}

impl Recorded {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Catalog that keeps everything in memory. Products are rejected by name,
/// variant updates by key, and the bulk option/variant inserts on request.
#[derive(Default)]
struct FakeCatalog {
    state: Mutex<Recorded>,
    reject_products: HashSet<String>,
    reject_updates: HashSet<VariantKey>,
    fail_options: bool,
    fail_variants: bool,
}

impl FakeCatalog {
    fn rejecting(name: &str) -> Self {
        Self {
            reject_products: HashSet::from([name.to_string()]),
            ..Self::default()
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.state.lock().unwrap()
    }
}

impl CatalogStore for FakeCatalog {
    async fn insert_product(&self, product: &NewProduct) -> Result<i64, StoreError> {
        if self.reject_products.contains(&product.name) {
            return Err(StoreError::Rejected(format!(
                "duplicate product name '{}'",
                product.name
            )));
        }
        let mut state = self.state();
        let id = state.next_id();
        state.products.push((id, product.clone()));
        Ok(id)
    }

    async fn set_product_image(
        &self,
        product_id: i64,
        image_url: &str,
    ) -> Result<(), StoreError> {
        self.state()
            .product_images
            .push((product_id, image_url.to_string()));
        Ok(())
    }

    async fn insert_variant_options(
        &self,
        options: &[NewVariantOption],
    ) -> Result<u64, StoreError> {
        if self.fail_options {
            return Err(StoreError::Rejected("option table locked".to_string()));
        }
        self.state().options.extend_from_slice(options);
        Ok(options.len() as u64)
    }

    async fn insert_variants(
        &self,
        variants: &[NewVariant],
    ) -> Result<Vec<StoredVariant>, StoreError> {
        if self.fail_variants {
            return Err(StoreError::Rejected("variant table locked".to_string()));
        }
        let mut state = self.state();
        let mut stored = Vec::new();
        for variant in variants {
            let id = state.next_id();
            state.variants.push((id, variant.clone()));
            stored.push(StoredVariant {
                id,
                key: variant.key.clone(),
                full_name: variant.full_name.clone(),
            });
        }
        // Returned order is not guaranteed by the real store either.
        stored.reverse();
        Ok(stored)
    }

    async fn update_variant(
        &self,
        variant_id: i64,
        patch: &VariantPatch,
    ) -> Result<(), StoreError> {
        let mut state = self.state();
        let rejected = state
            .variants
            .iter()
            .any(|(id, v)| *id == variant_id && self.reject_updates.contains(&v.key));
        if rejected {
            return Err(StoreError::Rejected("boom".to_string()));
        }
        state.patches.push((variant_id, patch.clone()));
        Ok(())
    }
}

/// Image store serving a PNG for every URL except the broken ones.
#[derive(Default)]
struct FakeImages {
    broken: HashSet<String>,
    uploads: Mutex<Vec<String>>,
}

impl ImageStore for FakeImages {
    async fn fetch_remote(&self, url: &str) -> Result<RemoteImage, StoreError> {
        if self.broken.contains(url) {
            return Err(StoreError::Rejected(format!("HTTP 404 for {url}")));
        }
        Ok(RemoteImage {
            bytes: vec![0x89, b'P', b'N', b'G'],
            content_type: Some("image/png".to_string()),
        })
    }

    async fn upload_image(&self, path: &str, _image: &RemoteImage) -> Result<String, StoreError> {
        self.uploads.lock().unwrap().push(path.to_string());
        Ok(format!("https://cdn.test/{path}"))
    }
}

fn owner() -> Uuid {
    Uuid::parse_str("7f8c7d5e-0000-4000-8000-000000000001").unwrap()
}

fn parse(csv: &str) -> Vec<ParsedRow> {
    read_rows(csv.as_bytes()).expect("csv should parse")
}

fn valid(row_index: usize, row: InputRow) -> ParsedRow {
    ParsedRow {
        row_index,
        row,
        errors: Vec::new(),
    }
}

fn text(s: &str) -> Option<String> {
    Some(s.to_string())
}

// ---------------------------------------------------------------------------
// Validation and grouping
// ---------------------------------------------------------------------------

#[test]
fn rows_with_zero_price_or_no_name_never_reach_a_group() {
    let rows = parse(
        "product_name,price\n\
         Mug,0\n\
         ,25\n\
         Cup,10\n",
    );
    assert_eq!(rows.len(), 3);
    assert!(rows[0].errors.iter().any(|e| e.field == "price"));
    assert!(rows[1].errors.iter().any(|e| e.field == "product_name"));
    assert!(rows[2].is_valid());

    let groups = group_rows(&rows);
    let names: Vec<_> = groups.iter().map(|g| g.product_name.as_str()).collect();
    assert_eq!(names, vec!["Cup"]);
}

#[test]
fn tier_value_without_name_flags_exactly_that_name_field() {
    let rows = parse(
        "product_name,price,tier1_name,tier1_value,tier3_value\n\
         Shirt,100,Color,Red,Cotton\n",
    );
    let fields: Vec<_> = rows[0].errors.iter().map(|e| e.field.as_str()).collect();
    assert_eq!(fields, vec!["tier3_name"]);
    assert_eq!(rows[0].errors[0].row_index, 2);
}

#[test]
fn first_plain_row_is_base_wherever_it_appears() {
    let rows = parse(
        "product_name,price,tier1_name,tier1_value\n\
         Shirt,100,Color,Red\n\
         Shirt,120,,\n\
         Shirt,100,Color,Blue\n\
         Shirt,130,,\n",
    );
    let groups = group_rows(&rows);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].base_row.price.as_deref(), Some("120"));
    assert_eq!(groups[0].variant_rows.len(), 2);
}

#[test]
fn shirt_rows_group_into_two_combinations() {
    // The second row carries neither price nor tier names, so read_rows would
    // reject it. Grouping is exercised on already-accepted rows here.
    let first = InputRow {
        product_name: text("Shirt"),
        price: text("150,000"),
        stock: None,
        tier1_name: text("Color"),
        tier1_value: text("Red"),
        tier2_name: text("Size"),
        tier2_value: text("L"),
        ..InputRow::default()
    };
    let second = InputRow {
        product_name: text("Shirt"),
        tier1_value: text("Blue"),
        tier2_value: text("L"),
        ..InputRow::default()
    };

    let groups = group_rows(&[valid(2, first), valid(3, second)]);
    assert_eq!(groups.len(), 1);
    let shirt = &groups[0];
    assert_eq!(shirt.product_name, "Shirt");
    assert!(shirt.has_variants);
    assert_eq!(shirt.variant_rows.len(), 2);

    let tiers = shirt.tiers();
    assert_eq!(tiers.len(), 2);
    assert_eq!(tiers[0].name, "Color");
    assert_eq!(tiers[0].options, vec!["Red", "Blue"]);
    assert_eq!(tiers[1].name, "Size");
    assert_eq!(tiers[1].options, vec!["L"]);

    let names: Vec<_> = shirt
        .combinations()
        .into_iter()
        .map(|c| c.full_name)
        .collect();
    assert_eq!(names, vec!["Shirt Red L", "Shirt Blue L"]);
}

#[test]
fn expand_without_tiers_is_the_product_itself() {
    let combos = expand("Mug", &[]);
    assert_eq!(combos.len(), 1);
    assert_eq!(combos[0].full_name, "Mug");
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

const TWO_BY_THREE: &str = "\
product_name,price,stock,tier1_name,tier1_value,tier2_name,tier2_value,variant_price
Shirt,\"100,000\",7,Color,Red,Size,S,
Shirt,\"100,000\",7,Color,Red,Size,M,
Shirt,\"100,000\",7,Color,Blue,Size,L,\"99,000\"
";

#[tokio::test]
async fn two_by_three_tiers_store_five_options_and_six_variants() {
    let groups = group_rows(&parse(TWO_BY_THREE));
    assert_eq!(groups.len(), 1);

    let catalog = FakeCatalog::default();
    let images = FakeImages::default();
    let outcome = ProductWriter::new(&catalog, &images)
        .write(&groups[0], owner())
        .await
        .expect("write should succeed");

    assert_eq!(outcome.variant_count, 6);
    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);

    let state = catalog.state();
    assert_eq!(state.options.len(), 5);
    assert_eq!(state.variants.len(), 6);

    let (_, product) = &state.products[0];
    assert!(product.has_variants);
    assert_eq!(product.stock, 0);
    assert_eq!(product.price, Decimal::new(100_000, 0));

    let sizes: Vec<_> = state
        .options
        .iter()
        .filter(|o| o.tier_level == 2)
        .map(|o| (o.option_value.as_str(), o.sort_order))
        .collect();
    assert_eq!(sizes, vec![("S", 0), ("M", 1), ("L", 2)]);

    for (_, variant) in &state.variants {
        assert_eq!(variant.price, Decimal::new(100_000, 0));
        assert_eq!(variant.stock, 7);
    }
}

#[tokio::test]
async fn variant_price_override_lands_on_the_matching_variant_only() {
    let groups = group_rows(&parse(TWO_BY_THREE));
    let catalog = FakeCatalog::default();
    let images = FakeImages::default();
    ProductWriter::new(&catalog, &images)
        .write(&groups[0], owner())
        .await
        .unwrap();

    let state = catalog.state();
    let blue_l = VariantKey::from_raw(Some("Blue"), Some("L"), None);
    let blue_l_id = state
        .variants
        .iter()
        .find(|(_, v)| v.key == blue_l)
        .map(|(id, _)| *id)
        .unwrap();

    let priced: Vec<_> = state
        .patches
        .iter()
        .filter(|(_, p)| p.price.is_some())
        .collect();
    assert_eq!(priced.len(), 1);
    assert_eq!(priced[0].0, blue_l_id);
    assert_eq!(priced[0].1.price, Some(Decimal::new(99_000, 0)));
}

#[tokio::test]
async fn broken_product_image_is_a_warning_not_a_failure() {
    let rows = parse(
        "product_name,price,image_url\n\
         Mug,10,https://img.test/missing.jpg\n",
    );
    let groups = group_rows(&rows);
    let catalog = FakeCatalog::default();
    let images = FakeImages {
        broken: HashSet::from(["https://img.test/missing.jpg".to_string()]),
        ..FakeImages::default()
    };

    let outcome = ProductWriter::new(&catalog, &images)
        .write(&groups[0], owner())
        .await
        .expect("image failure must not fail the product");

    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].step, WarningStep::ProductImage);
    assert!(outcome.warnings[0].message.contains("missing.jpg"));
    assert!(catalog.state().product_images.is_empty());
}

#[tokio::test]
async fn product_and_variant_images_are_stored_under_the_product() {
    let rows = parse(
        "product_name,price,image_url,tier1_name,tier1_value,variant_image_url\n\
         Mug,10,https://img.test/mug.jpg,Color,Red,https://img.test/red.jpg\n",
    );
    let groups = group_rows(&rows);
    let catalog = FakeCatalog::default();
    let images = FakeImages::default();

    let outcome = ProductWriter::new(&catalog, &images)
        .write(&groups[0], owner())
        .await
        .unwrap();
    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);

    let uploads = images.uploads.lock().unwrap().clone();
    assert_eq!(uploads.len(), 2);
    let product_dir = format!("{}/products/{}/", owner(), outcome.product_id);
    assert!(uploads[0].starts_with(&product_dir));
    assert!(uploads[0].ends_with(".png"));
    assert!(uploads[1].starts_with(&format!("{product_dir}variants/")));

    let state = catalog.state();
    assert_eq!(
        state.product_images,
        vec![(outcome.product_id, format!("https://cdn.test/{}", uploads[0]))]
    );
    assert_eq!(state.patches.len(), 1);
    assert_eq!(
        state.patches[0].1.image_url,
        Some(format!("https://cdn.test/{}", uploads[1]))
    );
}

#[tokio::test]
async fn rejected_product_is_a_write_error() {
    let groups = group_rows(&parse("product_name,price\nLamp,10\n"));
    let catalog = FakeCatalog::rejecting("Lamp");
    let images = FakeImages::default();

    let err = ProductWriter::new(&catalog, &images)
        .write(&groups[0], owner())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Lamp"), "{err}");
    assert!(catalog.state().products.is_empty());
}

#[tokio::test]
async fn stock_beyond_integer_range_is_rejected_before_writing() {
    let rows = parse(
        "product_name,price,stock,tier1_name,tier1_value,variant_stock\n\
         Mug,10,3000000000,,,\n\
         Cup,10,,Color,Red,3000000000\n\
         Bowl,10,2.5,,,\n",
    );
    assert_eq!(rows[0].errors[0].field, "stock");
    assert_eq!(rows[1].errors[0].field, "variant_stock");
    assert!(rows[2].is_valid());

    let groups = group_rows(&rows);
    assert_eq!(groups.len(), 1);

    let catalog = FakeCatalog::default();
    let images = FakeImages::default();
    ProductWriter::new(&catalog, &images)
        .write(&groups[0], owner())
        .await
        .unwrap();
    assert_eq!(catalog.state().products[0].1.stock, 2);
}

const OVERRIDES: &str = "\
product_name,price,tier1_name,tier1_value,tier2_name,tier2_value,variant_sku,variant_image_url
Shirt,100,Color,Red,Size,S,SH-RED-S,
Shirt,100,Color,Blue,Size,L,SH-BLUE-L,https://img.test/blue.jpg
";

fn variant_id(catalog: &FakeCatalog, key: &VariantKey) -> i64 {
    catalog
        .state()
        .variants
        .iter()
        .find(|(_, v)| &v.key == key)
        .map(|(id, _)| *id)
        .unwrap()
}

#[tokio::test]
async fn failed_variant_update_does_not_stop_the_others() {
    let groups = group_rows(&parse(OVERRIDES));
    let red_s = VariantKey::from_raw(Some("Red"), Some("S"), None);
    let blue_l = VariantKey::from_raw(Some("Blue"), Some("L"), None);
    let catalog = FakeCatalog {
        reject_updates: HashSet::from([red_s]),
        ..FakeCatalog::default()
    };
    let images = FakeImages::default();

    let outcome = ProductWriter::new(&catalog, &images)
        .write(&groups[0], owner())
        .await
        .unwrap();

    assert_eq!(outcome.variant_count, 4);
    assert_eq!(outcome.warnings.len(), 1, "{:?}", outcome.warnings);
    assert_eq!(outcome.warnings[0].step, WarningStep::VariantUpdate);
    assert_eq!(outcome.warnings[0].message, "Red / S: boom");

    let blue_l_id = variant_id(&catalog, &blue_l);
    let state = catalog.state();
    assert_eq!(state.patches.len(), 1);
    assert_eq!(state.patches[0].0, blue_l_id);
    assert_eq!(state.patches[0].1.sku.as_deref(), Some("SH-BLUE-L"));
    assert!(state.patches[0].1.image_url.is_some());
}

#[tokio::test]
async fn broken_variant_image_still_applies_the_rest_of_the_override() {
    let groups = group_rows(&parse(OVERRIDES));
    let catalog = FakeCatalog::default();
    let images = FakeImages {
        broken: HashSet::from(["https://img.test/blue.jpg".to_string()]),
        ..FakeImages::default()
    };

    let outcome = ProductWriter::new(&catalog, &images)
        .write(&groups[0], owner())
        .await
        .unwrap();

    assert_eq!(outcome.warnings.len(), 1, "{:?}", outcome.warnings);
    assert_eq!(outcome.warnings[0].step, WarningStep::VariantImage);
    assert!(outcome.warnings[0].message.contains("blue.jpg"));

    let blue_l = VariantKey::from_raw(Some("Blue"), Some("L"), None);
    let blue_l_id = variant_id(&catalog, &blue_l);
    let state = catalog.state();
    let blue_patch = state
        .patches
        .iter()
        .find(|(id, _)| *id == blue_l_id)
        .map(|(_, p)| p)
        .unwrap();
    assert_eq!(blue_patch.sku.as_deref(), Some("SH-BLUE-L"));
    assert!(blue_patch.image_url.is_none());
    assert_eq!(state.patches.len(), 2);
}

#[tokio::test]
async fn failed_variant_insert_keeps_the_product() {
    let groups = group_rows(&parse(OVERRIDES));
    let catalog = FakeCatalog {
        fail_variants: true,
        ..FakeCatalog::default()
    };
    let images = FakeImages::default();

    let outcome = ProductWriter::new(&catalog, &images)
        .write(&groups[0], owner())
        .await
        .unwrap();

    assert_eq!(outcome.variant_count, 0);
    assert_eq!(outcome.warnings.len(), 1, "{:?}", outcome.warnings);
    assert_eq!(outcome.warnings[0].step, WarningStep::Variants);
    let state = catalog.state();
    assert_eq!(state.products.len(), 1);
    assert!(state.patches.is_empty());
}

#[tokio::test]
async fn failed_option_insert_still_creates_variants() {
    let groups = group_rows(&parse(OVERRIDES));
    let catalog = FakeCatalog {
        fail_options: true,
        ..FakeCatalog::default()
    };
    let images = FakeImages::default();

    let outcome = ProductWriter::new(&catalog, &images)
        .write(&groups[0], owner())
        .await
        .unwrap();

    assert_eq!(outcome.variant_count, 4);
    assert_eq!(outcome.warnings.len(), 1, "{:?}", outcome.warnings);
    assert_eq!(outcome.warnings[0].step, WarningStep::VariantOptions);
    assert!(catalog.state().options.is_empty());
}

#[tokio::test]
async fn row_matching_no_combination_is_a_match_warning() {
    let groups = group_rows(&parse(
        "product_name,price,tier1_name,tier1_value,tier2_name,tier2_value,variant_sku\n\
         Shirt,100,Color,Red,Size,M,SH-RED-M\n\
         Shirt,100,Color,Red,,,SH-RED\n",
    ));
    let catalog = FakeCatalog::default();
    let images = FakeImages::default();

    let outcome = ProductWriter::new(&catalog, &images)
        .write(&groups[0], owner())
        .await
        .unwrap();

    assert_eq!(outcome.variant_count, 1);
    assert_eq!(outcome.warnings.len(), 1, "{:?}", outcome.warnings);
    assert_eq!(outcome.warnings[0].step, WarningStep::VariantMatch);
    assert!(outcome.warnings[0].message.contains("Red"));

    let state = catalog.state();
    assert_eq!(state.patches.len(), 1);
    assert_eq!(state.patches[0].1.sku.as_deref(), Some("SH-RED-M"));
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_middle_group_is_reported_and_the_rest_import() {
    let groups = group_rows(&parse(
        "product_name,price\n\
         Mug,10\n\
         Lamp,20\n\
         Cup,30\n",
    ));
    assert_eq!(groups.len(), 3);

    let catalog = FakeCatalog::rejecting("Lamp");
    let images = FakeImages::default();
    let importer = BulkImporter::new(&catalog, &images).with_delay(Duration::ZERO);

    let mut progress: Vec<ImportProgress> = Vec::new();
    let report = importer
        .run_with_progress(&groups, owner(), |p| progress.push(p.clone()))
        .await;

    let succeeded: Vec<_> = report
        .successes
        .iter()
        .map(|s| s.product_name.as_str())
        .collect();
    assert_eq!(succeeded, vec!["Mug", "Cup"]);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].product_name, "Lamp");
    assert!(report.errors[0].message.contains("duplicate product name"));

    let count = |status: ProgressStatus| progress.iter().filter(|p| p.status == status).count();
    assert_eq!(count(ProgressStatus::Processing), 3);
    assert_eq!(count(ProgressStatus::Error), 1);
    assert_eq!(count(ProgressStatus::Completed), 1);
    assert_eq!(progress.len(), 5);

    let error = progress
        .iter()
        .find(|p| p.status == ProgressStatus::Error)
        .unwrap();
    assert_eq!(error.current, 2);
    assert_eq!(error.current_product, "Lamp");
    assert_eq!((error.succeeded, error.failed), (1, 1));

    let last = progress.last().unwrap();
    assert_eq!(last.status, ProgressStatus::Completed);
    assert!(last.current_product.is_empty());
    assert_eq!((last.current, last.total), (3, 3));
    assert_eq!((last.succeeded, last.failed), (2, 1));
}

#[tokio::test]
async fn run_without_callback_returns_the_same_partition() {
    let groups = group_rows(&parse("product_name,price\nMug,10\nLamp,20\n"));
    let catalog = FakeCatalog::rejecting("Lamp");
    let images = FakeImages::default();

    let report = BulkImporter::new(&catalog, &images)
        .with_delay(Duration::ZERO)
        .run(&groups, owner())
        .await;
    assert_eq!(report.successes.len(), 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.total(), 2);
    assert!(!report.has_warnings());
}

#[tokio::test]
async fn empty_import_still_reports_completion() {
    let catalog = FakeCatalog::default();
    let images = FakeImages::default();
    let mut progress = Vec::new();
    let report = BulkImporter::new(&catalog, &images)
        .run_with_progress(&[], owner(), |p| progress.push(p.status))
        .await;
    assert_eq!(report.total(), 0);
    assert_eq!(progress, vec![ProgressStatus::Completed]);
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

#[test]
fn template_file_round_trips_through_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    storefront_import::write_template(&mut file).unwrap();
    file.flush().unwrap();

    let rows = read_rows_from_path(file.path()).unwrap();
    assert!(!rows.is_empty());
    assert!(rows.iter().all(ParsedRow::is_valid));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = read_rows_from_path(dir.path().join("nope.csv"));
    assert!(matches!(
        result,
        Err(storefront_import::ImportError::Io(_))
    ));
}
