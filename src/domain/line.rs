//! Cart line types: one distinct purchasable product-variant combination.

use std::fmt;

use rust_decimal::Decimal;

use super::ids::{LineId, ProductId, RemoteLineId, VariantId};

/// Identity key of a cart line.
///
/// Two additions with the same `(product_id, color, size)` tuple merge into
/// one line; any difference produces a separate line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub product_id: ProductId,
    pub color: String,
    pub size: String,
}

impl LineKey {
    /// Create a new identity key.
    pub fn new(product_id: ProductId, color: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            product_id,
            color: color.into(),
            size: size.into(),
        }
    }
}

impl fmt::Display for LineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.product_id, self.color, self.size)
    }
}

/// One distinct purchasable combination in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    /// Opaque client-side id, stable across re-renders.
    pub line_id: LineId,
    pub product_id: ProductId,
    /// Variant id on the server; required for authenticated persistence.
    pub variant_id: Option<VariantId>,
    pub name: String,
    pub unit_price: Decimal,
    pub original_unit_price: Decimal,
    /// Always >= 1; a mutation driving it to 0 removes the line instead.
    pub quantity: u32,
    pub color: String,
    pub size: String,
    pub image_url: String,
    /// Server-assigned line id, present once the line is persisted remotely.
    pub remote_line_id: Option<RemoteLineId>,
}

impl CartLine {
    /// The line's identity key.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product_id,
            color: self.color.clone(),
            size: self.size.clone(),
        }
    }

    /// Whether this line matches the given identity key.
    #[must_use]
    pub fn matches(&self, key: &LineKey) -> bool {
        self.product_id == key.product_id && self.color == key.color && self.size == key.size
    }

    /// This line's contribution to the cart total.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Input for adding a line to the cart: everything a [`CartLine`] carries
/// except the ids the system assigns itself.
#[derive(Debug, Clone)]
pub struct NewLine {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub name: String,
    pub unit_price: Decimal,
    pub original_unit_price: Decimal,
    pub quantity: u32,
    pub color: String,
    pub size: String,
    pub image_url: String,
}

impl NewLine {
    /// The identity key this addition will merge under.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey {
            product_id: self.product_id,
            color: self.color.clone(),
            size: self.size.clone(),
        }
    }
}

impl From<NewLine> for CartLine {
    fn from(new: NewLine) -> Self {
        Self {
            line_id: LineId::generate(),
            product_id: new.product_id,
            variant_id: new.variant_id,
            name: new.name,
            unit_price: new.unit_price,
            original_unit_price: new.original_unit_price,
            quantity: new.quantity,
            color: new.color,
            size: new.size,
            image_url: new.image_url,
            remote_line_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(product: u64, color: &str, size: &str, quantity: u32) -> CartLine {
        CartLine {
            line_id: LineId::generate(),
            product_id: ProductId::new(product),
            variant_id: None,
            name: format!("product-{product}"),
            unit_price: dec!(19.99),
            original_unit_price: dec!(24.99),
            quantity,
            color: color.into(),
            size: size.into(),
            image_url: String::new(),
            remote_line_id: None,
        }
    }

    #[test]
    fn key_matches_same_tuple() {
        let line = line(1, "black", "M", 2);
        assert!(line.matches(&LineKey::new(ProductId::new(1), "black", "M")));
    }

    #[test]
    fn key_rejects_different_size() {
        let line = line(1, "black", "M", 2);
        assert!(!line.matches(&LineKey::new(ProductId::new(1), "black", "L")));
    }

    #[test]
    fn key_rejects_different_product() {
        let line = line(1, "black", "M", 2);
        assert!(!line.matches(&LineKey::new(ProductId::new(2), "black", "M")));
    }

    #[test]
    fn line_total_is_quantity_times_unit_price() {
        let line = line(1, "black", "M", 3);
        assert_eq!(line.line_total(), dec!(59.97));
    }

    #[test]
    fn new_line_conversion_assigns_fresh_ids() {
        let new = NewLine {
            product_id: ProductId::new(9),
            variant_id: Some(VariantId::new(90)),
            name: "tee".into(),
            unit_price: dec!(10),
            original_unit_price: dec!(10),
            quantity: 1,
            color: "red".into(),
            size: "S".into(),
            image_url: "/img/tee.jpg".into(),
        };

        let key = new.key();
        let line = CartLine::from(new);
        assert_eq!(line.key(), key);
        assert!(line.remote_line_id.is_none());
        assert_eq!(line.variant_id, Some(VariantId::new(90)));
    }
}
