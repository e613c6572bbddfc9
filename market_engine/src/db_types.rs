use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use mkt_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------      Product       ----------------------------------------------------------
/// A catalog record. `stock` is the sole authoritative inventory counter and is only ever mutated through the
/// guarded [`crate::traits::CatalogManagement::adjust_stock`] path, never by direct field writes.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub seller_id: i64,
    pub name: String,
    /// Display unit for the product, e.g. "kg" or "ea".
    pub unit: String,
    pub price: Money,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub seller_id: i64,
    pub name: String,
    pub unit: String,
    pub price: Money,
    pub stock: i64,
}

impl NewProduct {
    pub fn new<S: Into<String>>(seller_id: i64, name: S, price: Money, stock: i64) -> Self {
        Self { seller_id, name: name.into(), unit: "ea".to_string(), price, stock }
    }

    pub fn with_unit<S: Into<String>>(mut self, unit: S) -> Self {
        self.unit = unit.into();
        self
    }
}

//--------------------------------------     ContactInfo    ----------------------------------------------------------
/// Contact details supplied with a guest order in place of a buyer account reference. Persisted as a JSON document
/// and schema-checked through this struct at the storage boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl ContactInfo {
    pub fn new<S1: Into<String>, S2: Into<String>>(name: S1, phone: S2) -> Self {
        Self { name: name.into(), phone: phone.into(), address: None }
    }

    pub fn with_address<S: Into<String>>(mut self, address: S) -> Self {
        self.address = Some(address.into());
        self
    }
}

//--------------------------------------       BuyerId      ----------------------------------------------------------
/// The identity attached to an order. Guest orders carry inline contact info instead of an account reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuyerId {
    Registered(i64),
    Guest(ContactInfo),
}

impl BuyerId {
    pub fn registered_id(&self) -> Option<i64> {
        match self {
            BuyerId::Registered(id) => Some(*id),
            BuyerId::Guest(_) => None,
        }
    }

    pub fn contact(&self) -> Option<&ContactInfo> {
        match self {
            BuyerId::Registered(_) => None,
            BuyerId::Guest(info) => Some(info),
        }
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, BuyerId::Guest(_))
    }
}

impl Display for BuyerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuyerId::Registered(id) => write!(f, "buyer #{id}"),
            BuyerId::Guest(info) => write!(f, "guest ({})", info.name),
        }
    }
}

//--------------------------------------   OrderStatusType  ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been created and is awaiting a seller decision.
    Pending,
    /// A seller (or admin) has approved the order.
    Confirmed,
    /// The order has been handed to the courier. Set by the fulfilment collaborator.
    Shipped,
    /// The order has arrived. Set by the fulfilment collaborator.
    Delivered,
    /// The order has been rejected or cancelled. Terminal. Stock has been restored.
    Cancelled,
}

impl OrderStatusType {
    /// `Cancelled` orders accept no further transitions of any kind.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Cancelled)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Confirmed => write!(f, "Confirmed"),
            OrderStatusType::Shipped => write!(f, "Shipped"),
            OrderStatusType::Delivered => write!(f, "Delivered"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Confirmed" => Ok(Self::Confirmed),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//-------------------------------------- PaymentStatusType  ----------------------------------------------------------
/// Settlement state of an order. This lifecycle is independent of [`OrderStatusType`] and is only updated by the
/// payment collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentStatusType {
    Unpaid,
    Paid,
    Refunded,
}

impl Display for PaymentStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatusType::Unpaid => write!(f, "Unpaid"),
            PaymentStatusType::Paid => write!(f, "Paid"),
            PaymentStatusType::Refunded => write!(f, "Refunded"),
        }
    }
}

impl FromStr for PaymentStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unpaid" => Ok(Self::Unpaid),
            "Paid" => Ok(Self::Paid),
            "Refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------     OrderAction    ----------------------------------------------------------
/// A semantic order transition verb, as opposed to a raw target status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderAction {
    Approve,
    Reject,
    Cancel,
}

impl Display for OrderAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderAction::Approve => write!(f, "approve"),
            OrderAction::Reject => write!(f, "reject"),
            OrderAction::Cancel => write!(f, "cancel"),
        }
    }
}

impl FromStr for OrderAction {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "cancel" => Ok(Self::Cancel),
            s => Err(ConversionError(format!("Invalid order action: {s}"))),
        }
    }
}

//--------------------------------------        Role        ----------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Seller,
    Buyer,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Seller => write!(f, "seller"),
            Role::Buyer => write!(f, "buyer"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "seller" => Ok(Self::Seller),
            "buyer" => Ok(Self::Buyer),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------        Order       ----------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    /// `None` for guest orders, which carry [`Order::buyer_contact`] instead.
    pub buyer_id: Option<i64>,
    pub buyer_contact: Option<ContactInfo>,
    /// Frozen at creation: the sum over line items of `quantity × unit_price`. Never recomputed from live prices.
    pub total_amount: Money,
    pub status: OrderStatusType,
    pub payment_status: PaymentStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn buyer(&self) -> BuyerId {
        match (self.buyer_id, &self.buyer_contact) {
            (Some(id), _) => BuyerId::Registered(id),
            (None, Some(info)) => BuyerId::Guest(info.clone()),
            (None, None) => {
                error!("Order #{} has neither a buyer id nor contact info. Treating as anonymous guest.", self.id);
                BuyerId::Guest(ContactInfo::new("", ""))
            },
        }
    }
}

#[cfg(feature = "sqlite")]
impl FromRow<'_, sqlx::sqlite::SqliteRow> for Order {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        use sqlx::Row;
        let contact_json = row.try_get::<Option<String>, _>("buyer_contact")?;
        let buyer_contact = contact_json
            .map(|json| {
                serde_json::from_str::<ContactInfo>(&json).map_err(|e| sqlx::Error::ColumnDecode {
                    index: "buyer_contact".to_string(),
                    source: Box::new(e),
                })
            })
            .transpose()?;
        Ok(Self {
            id: row.try_get("id")?,
            buyer_id: row.try_get("buyer_id")?,
            buyer_contact,
            total_amount: row.try_get("total_amount")?,
            status: row.try_get("status")?,
            payment_status: row.try_get("payment_status")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

//--------------------------------------      OrderItem     ----------------------------------------------------------
/// One line of an order. `unit_price` and `product_name` are frozen copies taken at validation time; the live
/// product record may change afterwards without affecting the order.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub seller_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl OrderItem {
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub seller_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl NewOrderItem {
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

//--------------------------------------      NewOrder      ----------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub buyer: BuyerId,
    pub items: Vec<NewOrderItem>,
    /// The frozen order total, computed from the items at construction.
    pub total_amount: Money,
}

impl NewOrder {
    pub fn new(buyer: BuyerId, items: Vec<NewOrderItem>) -> Self {
        let total_amount = items.iter().map(NewOrderItem::line_total).sum();
        Self { buyer, items, total_amount }
    }
}

//--------------------------------------      Message       ----------------------------------------------------------
/// One entry in the notification channel. Immutable except for `is_read`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    /// `None` for guest- or system-originated messages.
    pub sender_id: Option<i64>,
    pub receiver_id: i64,
    pub product_id: Option<i64>,
    pub order_id: Option<i64>,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: Option<i64>,
    pub receiver_id: i64,
    pub product_id: Option<i64>,
    pub order_id: Option<i64>,
    pub content: String,
}

impl NewMessage {
    pub fn new<S: Into<String>>(sender_id: Option<i64>, receiver_id: i64, content: S) -> Self {
        Self { sender_id, receiver_id, product_id: None, order_id: None, content: content.into() }
    }

    pub fn with_product(mut self, product_id: i64) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn with_order(mut self, order_id: i64) -> Self {
        self.order_id = Some(order_id);
        self
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_round_trip() {
        for status in [
            OrderStatusType::Pending,
            OrderStatusType::Confirmed,
            OrderStatusType::Shipped,
            OrderStatusType::Delivered,
            OrderStatusType::Cancelled,
        ] {
            assert_eq!(status.to_string().parse::<OrderStatusType>().unwrap(), status);
        }
        assert!("Unknown".parse::<OrderStatusType>().is_err());
    }

    #[test]
    fn action_parsing_is_case_insensitive() {
        assert_eq!("Approve".parse::<OrderAction>().unwrap(), OrderAction::Approve);
        assert_eq!("REJECT".parse::<OrderAction>().unwrap(), OrderAction::Reject);
        assert_eq!("cancel".parse::<OrderAction>().unwrap(), OrderAction::Cancel);
        assert!("ship".parse::<OrderAction>().is_err());
    }

    #[test]
    fn new_order_total_is_sum_of_line_totals() {
        let items = vec![
            NewOrderItem {
                product_id: 1,
                seller_id: 10,
                product_name: "Apples".into(),
                quantity: 3,
                unit_price: Money::from(1500),
            },
            NewOrderItem {
                product_id: 2,
                seller_id: 11,
                product_name: "Pears".into(),
                quantity: 2,
                unit_price: Money::from(800),
            },
        ];
        let order = NewOrder::new(BuyerId::Registered(7), items);
        assert_eq!(order.total_amount, Money::from(6100));
    }

    #[test]
    fn guest_contact_json_round_trip() {
        let info = ContactInfo::new("Kim", "010-1234-5678").with_address("1 Market St");
        let json = serde_json::to_string(&info).unwrap();
        let back: ContactInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);
    }
}
