//! Anonymous cart persistence over a cookie-style slot.
//!
//! Stores the cart as a JSON array under a fixed key with a bounded lifetime
//! and strict same-site scope. The convenience operations mirror the cart
//! store's identity-key matching on purpose: this adapter is also used before
//! the store exists (first paint) and must be independently correct.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::AnonymousConfig;
use crate::domain::{CartLine, LineId, LineKey, ProductId, VariantId};
use crate::error::Result;
use crate::port::{CookieJar, SameSite};

/// Persisted wire format of one anonymous cart line.
///
/// Identifiers are accepted loosely (number or string) because earlier
/// writers of this cookie were not consistent about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredLine {
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(deserialize_with = "u64_lenient")]
    product_id: u64,
    #[serde(
        default,
        deserialize_with = "opt_u64_lenient",
        skip_serializing_if = "Option::is_none"
    )]
    product_detail_id: Option<u64>,
    name: String,
    price: Decimal,
    original_price: Decimal,
    quantity: u32,
    color: String,
    size: String,
    image: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrStr {
    Num(u64),
    Str(String),
}

fn u64_lenient<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u64, D::Error> {
    match NumOrStr::deserialize(deserializer)? {
        NumOrStr::Num(n) => Ok(n),
        NumOrStr::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

fn opt_u64_lenient<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<u64>, D::Error> {
    match Option::<NumOrStr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumOrStr::Num(n)) => Ok(Some(n)),
        Some(NumOrStr::Str(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

impl From<&CartLine> for StoredLine {
    fn from(line: &CartLine) -> Self {
        Self {
            id: Some(*line.line_id.as_uuid()),
            product_id: line.product_id.value(),
            product_detail_id: line.variant_id.map(VariantId::value),
            name: line.name.clone(),
            price: line.unit_price,
            original_price: line.original_unit_price,
            quantity: line.quantity,
            color: line.color.clone(),
            size: line.size.clone(),
            image: line.image_url.clone(),
        }
    }
}

impl From<StoredLine> for CartLine {
    fn from(stored: StoredLine) -> Self {
        Self {
            line_id: stored
                .id
                .map_or_else(LineId::generate, LineId::from_uuid),
            product_id: ProductId::new(stored.product_id),
            variant_id: stored.product_detail_id.map(VariantId::new),
            name: stored.name,
            unit_price: stored.price,
            original_unit_price: stored.original_price,
            quantity: stored.quantity,
            color: stored.color,
            size: stored.size,
            image_url: stored.image,
            remote_line_id: None,
        }
    }
}

/// Anonymous persistence adapter: a [`CartLine`] list in a [`CookieJar`].
#[derive(Clone)]
pub struct AnonymousCartStore {
    jar: Arc<dyn CookieJar>,
    storage_key: String,
    ttl: Duration,
}

impl AnonymousCartStore {
    pub fn new(jar: Arc<dyn CookieJar>, config: &AnonymousConfig) -> Self {
        Self {
            jar,
            storage_key: config.storage_key.clone(),
            ttl: Duration::from_secs(u64::from(config.ttl_days) * 24 * 3600),
        }
    }

    /// The stored line list. Absent, expired, or unparsable data degrades to
    /// an empty list; this path never fails.
    pub async fn read(&self) -> Vec<CartLine> {
        let raw = match self.jar.get(&self.storage_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, "Anonymous cart read failed, treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<StoredLine>>(&raw) {
            Ok(stored) => stored.into_iter().map(CartLine::from).collect(),
            Err(err) => {
                warn!(error = %err, "Unparsable anonymous cart, treating as empty");
                Vec::new()
            }
        }
    }

    /// Serialize and store the list with the configured expiry window.
    pub async fn write(&self, lines: &[CartLine]) -> Result<()> {
        let stored: Vec<StoredLine> = lines.iter().map(StoredLine::from).collect();
        let raw = serde_json::to_string(&stored)?;
        self.jar
            .set(&self.storage_key, &raw, self.ttl, SameSite::Strict)
            .await?;
        debug!(lines = lines.len(), "Anonymous cart written");
        Ok(())
    }

    /// Remove the stored value outright.
    pub async fn clear(&self) -> Result<()> {
        self.jar.remove(&self.storage_key).await
    }

    /// Add a line, merging quantities into an existing line with the same
    /// identity key.
    pub async fn merge_add(&self, line: &CartLine) -> Result<()> {
        let mut lines = self.read().await;
        match lines.iter_mut().find(|l| l.matches(&line.key())) {
            Some(existing) => existing.quantity += line.quantity,
            None => lines.push(line.clone()),
        }
        self.write(&lines).await
    }

    /// Filter out the line matching the identity key.
    pub async fn remove(&self, key: &LineKey) -> Result<()> {
        let mut lines = self.read().await;
        lines.retain(|l| !l.matches(key));
        self.write(&lines).await
    }

    /// Replace the matching line's quantity; 0 removes the line.
    pub async fn set_quantity(&self, key: &LineKey, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return self.remove(key).await;
        }
        let mut lines = self.read().await;
        if let Some(line) = lines.iter_mut().find(|l| l.matches(key)) {
            line.quantity = quantity;
        }
        self.write(&lines).await
    }
}
