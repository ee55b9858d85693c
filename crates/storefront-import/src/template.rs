//! Example import file for users to start from.

use std::io::Write;

use crate::error::ImportError;
use crate::input::InputRow;

fn text(s: &str) -> Option<String> {
    Some(s.to_string())
}

fn shirt(color: &str, size: &str) -> InputRow {
    InputRow {
        product_name: text("Basic T-Shirt"),
        description: text("100% cotton crew neck"),
        price: text("150,000"),
        weight: text("0.2"),
        status: text("active"),
        image_url: text("https://example.com/images/tshirt.jpg"),
        tier1_name: text("Color"),
        tier1_value: text(color),
        tier2_name: text("Size"),
        tier2_value: text(size),
        variant_stock: text("10"),
        ..InputRow::default()
    }
}

fn example_rows() -> Vec<InputRow> {
    let mug = InputRow {
        product_name: text("Ceramic Mug"),
        description: text("350 ml glazed mug"),
        price: text("45,000"),
        stock: text("20"),
        is_digital: text("false"),
        weight: text("0.35"),
        status: text("active"),
        has_notes: text("false"),
        image_url: text("https://example.com/images/mug.jpg"),
        ..InputRow::default()
    };
    let big_blue = InputRow {
        variant_price: text("160,000"),
        variant_sku: text("TS-BLUE-XL"),
        variant_description: text("Extended size"),
        ..shirt("Blue", "XL")
    };

    vec![
        mug,
        shirt("Red", "M"),
        shirt("Red", "XL"),
        shirt("Blue", "M"),
        big_blue,
    ]
}

/// Writes a header row naming every recognised column followed by example
/// rows: a plain product and a product with Color and Size tiers.
///
/// # Errors
///
/// Returns [`ImportError`] if writing to `writer` fails.
pub fn write_template<W: Write>(writer: W) -> Result<(), ImportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in example_rows() {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
