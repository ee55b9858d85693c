//! Reading import files into [`ParsedRow`]s.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::LazyLock;

use csv::{ReaderBuilder, StringRecord, Trim};
use regex::Regex;
use serde::{Deserialize, Serialize};
use storefront_core::VariantKey;

use crate::error::ImportError;
use crate::numeric::present;
use crate::validate::{validate, ValidationError};

/// Every column the importer understands, in template order.
pub const COLUMNS: &[&str] = &[
    "product_name",
    "description",
    "price",
    "stock",
    "is_digital",
    "weight",
    "status",
    "has_notes",
    "image_url",
    "tier1_name",
    "tier1_value",
    "tier2_name",
    "tier2_value",
    "tier3_name",
    "tier3_value",
    "variant_price",
    "variant_stock",
    "variant_weight",
    "variant_sku",
    "variant_image_url",
    "variant_is_active",
    "variant_description",
];

static CAMEL_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid regex"));
static SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-]+").expect("valid regex"));
static TIER_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"tier_(\d)").expect("valid regex"));
static REPEATED_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_+").expect("valid regex"));

/// One data row of an import file, exactly as written.
///
/// Every field is the raw cell text; an empty cell is `None`. Interpreting
/// numbers, flags and statuses is left to [`validate`] and the writer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputRow {
    pub product_name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub stock: Option<String>,
    pub is_digital: Option<String>,
    pub weight: Option<String>,
    pub status: Option<String>,
    pub has_notes: Option<String>,
    pub image_url: Option<String>,
    pub tier1_name: Option<String>,
    pub tier1_value: Option<String>,
    pub tier2_name: Option<String>,
    pub tier2_value: Option<String>,
    pub tier3_name: Option<String>,
    pub tier3_value: Option<String>,
    pub variant_price: Option<String>,
    pub variant_stock: Option<String>,
    pub variant_weight: Option<String>,
    pub variant_sku: Option<String>,
    pub variant_image_url: Option<String>,
    pub variant_is_active: Option<String>,
    pub variant_description: Option<String>,
}

impl InputRow {
    /// Trimmed product name, or `""` when absent.
    #[must_use]
    pub fn name(&self) -> &str {
        present(self.product_name.as_ref()).unwrap_or_default()
    }

    /// `(name, value)` of each tier slot in level order.
    #[must_use]
    pub fn tier_slots(&self) -> [(Option<&str>, Option<&str>); 3] {
        [
            (
                present(self.tier1_name.as_ref()),
                present(self.tier1_value.as_ref()),
            ),
            (
                present(self.tier2_name.as_ref()),
                present(self.tier2_value.as_ref()),
            ),
            (
                present(self.tier3_name.as_ref()),
                present(self.tier3_value.as_ref()),
            ),
        ]
    }

    /// `true` when at least one tier value is filled in.
    #[must_use]
    pub fn has_variant_data(&self) -> bool {
        self.tier_slots().iter().any(|(_, value)| value.is_some())
    }

    /// The tier values of this row as a lookup key.
    #[must_use]
    pub fn variant_key(&self) -> VariantKey {
        let [(_, t1), (_, t2), (_, t3)] = self.tier_slots();
        VariantKey::from_raw(t1, t2, t3)
    }

    fn is_blank(&self) -> bool {
        *self == InputRow::default()
    }
}

/// An [`InputRow`] tagged with its spreadsheet row number and the problems
/// found in it. Rows with any error are never imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    /// 1-based spreadsheet row; the header is row 1.
    pub row_index: usize,
    pub row: InputRow,
    pub errors: Vec<ValidationError>,
}

impl ParsedRow {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Maps a header as users tend to write it (`Product Name`, `productName`,
/// `Tier 1 Value`) onto the column name it stands for.
#[must_use]
pub fn normalize_header(raw: &str) -> String {
    let name = raw.trim().trim_start_matches('\u{feff}');
    let name = CAMEL_BOUNDARY.replace_all(name, "${1}_${2}").to_lowercase();
    let name = SEPARATORS.replace_all(&name, "_");
    let name = TIER_NUMBER.replace_all(&name, "tier${1}");
    let name = REPEATED_UNDERSCORE.replace_all(&name, "_");
    name.trim_matches('_').to_string()
}

/// Reads an import file and validates every data row.
///
/// Records the decoder cannot make sense of come back as a [`ParsedRow`]
/// carrying a single `row` error, so one bad line does not hide the rest.
/// Completely empty records are skipped.
///
/// # Errors
///
/// Returns [`ImportError::MissingHeader`] for an empty file and
/// [`ImportError::Csv`] / [`ImportError::Io`] when the input cannot be read.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<ParsedRow>, ImportError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let raw_headers = rdr.headers()?.clone();
    if raw_headers.iter().all(str::is_empty) {
        return Err(ImportError::MissingHeader);
    }
    let headers: StringRecord = raw_headers.iter().map(normalize_header).collect();
    rdr.set_headers(headers.clone());

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let row_index = idx + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(ImportError::Csv(e)),
            Err(e) => {
                rows.push(unreadable(row_index, &e.to_string()));
                continue;
            }
        };

        match record.deserialize::<InputRow>(Some(&headers)) {
            Ok(row) if row.is_blank() => {}
            Ok(row) => {
                let errors = validate(&row, row_index);
                rows.push(ParsedRow {
                    row_index,
                    row,
                    errors,
                });
            }
            Err(e) => rows.push(unreadable(row_index, &e.to_string())),
        }
    }

    Ok(rows)
}

/// Opens `path` and hands it to [`read_rows`].
///
/// # Errors
///
/// See [`read_rows`]; a missing or unreadable file is [`ImportError::Io`].
pub fn read_rows_from_path(path: impl AsRef<Path>) -> Result<Vec<ParsedRow>, ImportError> {
    let file = File::open(path.as_ref())?;
    read_rows(file)
}

fn unreadable(row_index: usize, message: &str) -> ParsedRow {
    ParsedRow {
        row_index,
        row: InputRow::default(),
        errors: vec![ValidationError::new(
            row_index,
            "row",
            format!("could not read row: {message}"),
        )],
    }
}
