//! Builders for domain primitives used across the test suites.

use rust_decimal_macros::dec;

use crate::domain::{CartLine, LineId, NewLine, ProductId, RemoteLineId, VariantId};

/// A [`NewLine`] for the given identity tuple with sensible fixed pricing.
#[must_use]
pub fn new_line(product: u64, color: &str, size: &str, quantity: u32) -> NewLine {
    NewLine {
        product_id: ProductId::new(product),
        variant_id: Some(VariantId::new(product * 10)),
        name: format!("product-{product}"),
        unit_price: dec!(10.00),
        original_unit_price: dec!(12.00),
        quantity,
        color: color.into(),
        size: size.into(),
        image_url: format!("/img/{product}.jpg"),
    }
}

/// A [`NewLine`] without a variant id, as an anonymous pre-auth line.
#[must_use]
pub fn new_line_without_variant(product: u64, color: &str, size: &str, quantity: u32) -> NewLine {
    let mut line = new_line(product, color, size, quantity);
    line.variant_id = None;
    line
}

/// A [`CartLine`] for the given identity tuple.
#[must_use]
pub fn line(product: u64, color: &str, size: &str, quantity: u32) -> CartLine {
    CartLine::from(new_line(product, color, size, quantity))
}

/// A [`CartLine`] already known to the server under the given remote id.
#[must_use]
pub fn remote_line(id: u64, product: u64, color: &str, size: &str, quantity: u32) -> CartLine {
    CartLine {
        line_id: LineId::generate(),
        remote_line_id: Some(RemoteLineId::new(id)),
        ..line(product, color, size, quantity)
    }
}
