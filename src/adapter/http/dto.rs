//! Wire types for the cart REST endpoints.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{CartLine, LineId, ProductId, RemoteLineId, VariantId};
use crate::port::{NewRemoteItem, RemoteCartView};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCartResponse {
    #[serde(default)]
    pub items: Vec<RemoteLineDto>,
    #[serde(default)]
    pub total_items: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteLineDto {
    pub id: u64,
    pub product_id: u64,
    #[serde(default)]
    pub product_detail_id: Option<u64>,
    #[serde(default)]
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub original_price: Option<Decimal>,
    pub quantity: u32,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub image: String,
}

impl From<RemoteLineDto> for CartLine {
    fn from(dto: RemoteLineDto) -> Self {
        Self {
            line_id: LineId::generate(),
            product_id: ProductId::new(dto.product_id),
            variant_id: dto.product_detail_id.map(VariantId::new),
            name: dto.name,
            unit_price: dto.price,
            original_unit_price: dto.original_price.unwrap_or(dto.price),
            quantity: dto.quantity,
            color: dto.color,
            size: dto.size,
            image_url: dto.image,
            remote_line_id: Some(RemoteLineId::new(dto.id)),
        }
    }
}

impl From<RemoteCartResponse> for RemoteCartView {
    fn from(response: RemoteCartResponse) -> Self {
        let lines: Vec<CartLine> = response.items.into_iter().map(CartLine::from).collect();
        let total_items = response
            .total_items
            .unwrap_or_else(|| lines.iter().map(|l| u64::from(l.quantity)).sum());
        Self { lines, total_items }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: u64,
    pub product_detail_id: u64,
    pub color: String,
    pub size: String,
    pub quantity: u32,
}

impl From<&NewRemoteItem> for AddItemRequest {
    fn from(item: &NewRemoteItem) -> Self {
        Self {
            product_id: item.product_id.value(),
            product_detail_id: item.variant_id.value(),
            color: item.color.clone(),
            size: item.size.clone(),
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

/// Some deployments return the created line, some an empty body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreatedLineResponse {
    #[serde(default)]
    pub id: Option<u64>,
}
