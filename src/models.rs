use crate::error::{Result, WarehouseError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// ShipStation timestamps carry no offset and up to seven fractional digits
const SHIPSTATION_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Order status as defined by ShipStation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    AwaitingPayment,
    AwaitingShipment,
    PendingFulfillment,
    Shipped,
    OnHold,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::AwaitingPayment => "awaiting_payment",
            OrderStatus::AwaitingShipment => "awaiting_shipment",
            OrderStatus::PendingFulfillment => "pending_fulfillment",
            OrderStatus::Shipped => "shipped",
            OrderStatus::OnHold => "on_hold",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "awaiting_payment" => Ok(OrderStatus::AwaitingPayment),
            "awaiting_shipment" => Ok(OrderStatus::AwaitingShipment),
            "pending_fulfillment" => Ok(OrderStatus::PendingFulfillment),
            "shipped" => Ok(OrderStatus::Shipped),
            "on_hold" => Ok(OrderStatus::OnHold),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(format!("Invalid order status: {s}")),
        }
    }
}

/// A tag defined in the ShipStation account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(alias = "tagId")]
    pub tag_id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A line item on an order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
}

/// An order as this tool sees it, parsed from ShipStation's order record
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub order_id: i64,
    pub order_number: String,
    pub order_key: Option<String>,
    pub status: OrderStatus,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub order_date: Option<NaiveDateTime>,
    pub ship_date: Option<NaiveDateTime>,
    pub order_total: f64,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub tag_ids: Vec<i64>,
    pub items: Vec<OrderItem>,
    pub internal_notes: Option<String>,
    /// Full upstream record, needed to resubmit the order on update
    #[serde(skip)]
    payload: Value,
}

// ShipStation wire shapes. `tagIds` shows up as null, a list of ids,
// or a list of {tagId, name} objects depending on the endpoint.

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOrder {
    order_id: i64,
    order_number: String,
    #[serde(default)]
    order_key: Option<String>,
    order_status: OrderStatus,
    #[serde(default)]
    customer_email: Option<String>,
    #[serde(default)]
    order_date: Option<String>,
    #[serde(default)]
    ship_date: Option<String>,
    #[serde(default)]
    ship_to: Option<RawShipTo>,
    #[serde(default)]
    order_total: Option<f64>,
    #[serde(default)]
    items: Option<Vec<OrderItem>>,
    #[serde(default)]
    tag_ids: Option<Vec<RawTagRef>>,
    #[serde(default)]
    shipments: Option<Vec<RawShipment>>,
    #[serde(default)]
    internal_notes: Option<String>,
}

#[derive(Deserialize)]
struct RawShipTo {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawShipment {
    #[serde(default)]
    tracking_number: Option<String>,
    #[serde(default)]
    carrier_code: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTagRef {
    Id(i64),
    Tag {
        #[serde(rename = "tagId")]
        tag_id: i64,
    },
}

impl RawTagRef {
    fn id(&self) -> i64 {
        match self {
            RawTagRef::Id(id) => *id,
            RawTagRef::Tag { tag_id } => *tag_id,
        }
    }
}

/// One page of `GET /orders`
#[derive(Debug, Deserialize)]
pub struct OrderPage {
    pub orders: Vec<Value>,
    #[serde(default)]
    pub total: Option<i64>,
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub pages: Option<i64>,
}

/// Body returned by `POST /orders/addtag`
#[derive(Debug, Deserialize)]
pub struct WriteAck {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

fn parse_date(field: &str, raw: Option<String>) -> Result<Option<NaiveDateTime>> {
    match raw {
        None => Ok(None),
        Some(s) => NaiveDateTime::parse_from_str(&s, SHIPSTATION_DATE_FORMAT)
            .map(Some)
            .map_err(|e| WarehouseError::MalformedResponse(format!("{field} '{s}': {e}"))),
    }
}

impl Order {
    /// Parse one upstream order record, rejecting anything that does not
    /// match the expected shape
    pub fn from_value(payload: Value) -> Result<Self> {
        let raw: RawOrder = serde_json::from_value(payload.clone())?;

        let mut tag_ids: Vec<i64> = Vec::new();
        for tag in raw.tag_ids.unwrap_or_default() {
            let id = tag.id();
            if !tag_ids.contains(&id) {
                tag_ids.push(id);
            }
        }

        let first_shipment = raw.shipments.unwrap_or_default().into_iter().next();
        let (tracking_number, carrier) = match first_shipment {
            Some(s) => (s.tracking_number, s.carrier_code),
            None => (None, None),
        };

        Ok(Order {
            order_id: raw.order_id,
            order_number: raw.order_number,
            order_key: raw.order_key,
            status: raw.order_status,
            customer_name: raw.ship_to.and_then(|s| s.name),
            customer_email: raw.customer_email,
            order_date: parse_date("orderDate", raw.order_date)?,
            ship_date: parse_date("shipDate", raw.ship_date)?,
            order_total: raw.order_total.unwrap_or(0.0),
            tracking_number,
            carrier,
            tag_ids,
            items: raw.items.unwrap_or_default(),
            internal_notes: raw.internal_notes.filter(|n| !n.is_empty()),
            payload,
        })
    }

    pub fn has_tag(&self, tag_id: i64) -> bool {
        self.tag_ids.contains(&tag_id)
    }

    /// The order as it looks once `tag_id` is attached
    pub fn with_tag(mut self, tag_id: i64) -> Self {
        if !self.has_tag(tag_id) {
            self.tag_ids.push(tag_id);
            if let Some(obj) = self.payload.as_object_mut() {
                obj.insert("tagIds".to_string(), Value::from(self.tag_ids.clone()));
            }
        }
        self
    }

    /// The order with `note` appended to its internal notes
    pub fn with_note(mut self, note: &str) -> Self {
        let combined = match self.internal_notes.as_deref() {
            Some(existing) => format!("{existing}, {note}"),
            None => note.to_string(),
        };
        if let Some(obj) = self.payload.as_object_mut() {
            obj.insert("internalNotes".to_string(), Value::from(combined.clone()));
        }
        self.internal_notes = Some(combined);
        self
    }

    /// The upstream record, including any local edits
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Names of this order's tags, falling back to the id when the tag is
    /// not in `catalog`
    pub fn tag_names(&self, catalog: &[Tag]) -> Vec<String> {
        self.tag_ids
            .iter()
            .map(|id| {
                catalog
                    .iter()
                    .find(|t| t.tag_id == *id)
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| format!("#{id}"))
            })
            .collect()
    }

    /// Case-insensitive substring match on SKU or item name
    pub fn contains_product(&self, needle: &str) -> bool {
        let needle = needle.to_uppercase();
        self.items.iter().any(|item| {
            let sku = item.sku.as_deref().unwrap_or_default().to_uppercase();
            let name = item.name.as_deref().unwrap_or_default().to_uppercase();
            sku.contains(&needle) || name.contains(&needle)
        })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::order_json;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_order_with_id_list_tags() {
        let order = Order::from_value(order_json(1, "9999", "Test Customer", json!([173102, 143376])))
            .unwrap();
        assert_eq!(order.order_number, "9999");
        assert_eq!(order.status, OrderStatus::AwaitingShipment);
        assert_eq!(order.customer_name.as_deref(), Some("Test Customer"));
        assert_eq!(order.tag_ids, vec![173102, 143376]);
        assert_eq!(order.items.len(), 2);
        assert!(order.order_date.is_some());
        assert!(order.ship_date.is_none());
    }

    #[test]
    fn test_parse_order_with_object_tags() {
        let order = Order::from_value(order_json(
            2,
            "9998",
            "Tagged",
            json!([{ "tagId": 173102, "name": "RUSH" }]),
        ))
        .unwrap();
        assert!(order.has_tag(173102));
        assert!(!order.has_tag(999999));
    }

    #[test]
    fn test_parse_order_with_null_tags() {
        let order = Order::from_value(order_json(3, "9997", "Nobody", Value::Null)).unwrap();
        assert!(order.tag_ids.is_empty());
    }

    #[test]
    fn test_shipment_fields_come_from_first_shipment() {
        let mut raw = order_json(4, "9996", "Shipped Customer", json!([]));
        raw["orderStatus"] = json!("shipped");
        raw["shipDate"] = json!("2025-10-08T14:00:00.0000000");
        raw["shipments"] = json!([
            { "trackingNumber": "1Z999AA10123456784", "carrierCode": "ups" },
            { "trackingNumber": "second", "carrierCode": "usps" }
        ]);
        let order = Order::from_value(raw).unwrap();
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.tracking_number.as_deref(), Some("1Z999AA10123456784"));
        assert_eq!(order.carrier.as_deref(), Some("ups"));
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let mut raw = order_json(5, "1", "X", json!([]));
        raw["orderStatus"] = json!("teleported");
        let err = Order::from_value(raw).unwrap_err();
        assert!(matches!(err, WarehouseError::MalformedResponse(_)));
    }

    #[test]
    fn test_missing_order_id_is_rejected() {
        let err = Order::from_value(json!({ "orderNumber": "1" })).unwrap_err();
        assert!(matches!(err, WarehouseError::MalformedResponse(_)));
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let mut raw = order_json(6, "1", "X", json!([]));
        raw["orderDate"] = json!("yesterday");
        assert!(Order::from_value(raw).is_err());
    }

    #[test]
    fn test_with_tag_does_not_duplicate() {
        let order = Order::from_value(order_json(7, "1", "X", json!([143376]))).unwrap();
        let order = order.with_tag(173102).with_tag(173102);
        assert_eq!(order.tag_ids, vec![143376, 173102]);
        assert_eq!(order.payload()["tagIds"], json!([143376, 173102]));
    }

    #[test]
    fn test_with_note_appends_with_comma() {
        let order = Order::from_value(order_json(8, "1", "X", json!([]))).unwrap();
        let order = order.with_note("check battery");
        assert_eq!(order.internal_notes.as_deref(), Some("check battery"));
        let order = order.with_note("no memory");
        assert_eq!(order.internal_notes.as_deref(), Some("check battery, no memory"));
        assert_eq!(order.payload()["internalNotes"], json!("check battery, no memory"));
    }

    #[test]
    fn test_tag_names_fall_back_to_id() {
        let order = Order::from_value(order_json(9, "1", "X", json!([173102, 42]))).unwrap();
        let catalog = vec![Tag {
            tag_id: 173102,
            name: "RUSH".to_string(),
            color: None,
        }];
        assert_eq!(order.tag_names(&catalog), vec!["RUSH", "#42"]);
    }

    #[test]
    fn test_contains_product_matches_sku_and_name() {
        let order = Order::from_value(order_json(10, "1", "X", json!([]))).unwrap();
        assert!(order.contains_product("dc2"));
        assert!(order.contains_product("battery"));
        assert!(!order.contains_product("DC0"));
    }

    #[test]
    fn test_status_round_trips_through_str() {
        assert_eq!("on_hold".parse::<OrderStatus>().unwrap(), OrderStatus::OnHold);
        assert!("bogus".parse::<OrderStatus>().is_err());
    }
}
