//! Order Model
//!
//! Status values, payment enums, and the persisted order shape.
//! Money is stored in integer minor units (paise).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order lifecycle status
///
/// `pending → confirmed → shipped → delivered`, with `cancelled`
/// reachable from every non-terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        Self::Pending,
        Self::Confirmed,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Capitalized form used as the tracking entry label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// The single forward step from this status, if any
    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            Self::Pending => Some(Self::Confirmed),
            Self::Confirmed => Some(Self::Shipped),
            Self::Shipped => Some(Self::Delivered),
            Self::Delivered | Self::Cancelled => None,
        }
    }

    /// Whether `self → to` is in the transition table
    pub fn can_transition_to(&self, to: OrderStatus) -> bool {
        if to == Self::Cancelled {
            return !self.is_terminal();
        }
        self.next() == Some(to)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a status string is not one of the known values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOrderStatus(pub String);

impl fmt::Display for UnknownOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown order status: {}", self.0)
    }
}

impl std::error::Error for UnknownOrderStatus {}

impl FromStr for OrderStatus {
    type Err = UnknownOrderStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownOrderStatus(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum PaymentMethod {
    Online,
    Cod,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

/// Wallet or card rail used for an online payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentChannel {
    Gpay,
    Phonepe,
    Paytm,
    Upi,
    Card,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub method: PaymentChannel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

/// Order line with name and price frozen at purchase time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub product_id: i64,
    pub name: String,
    pub quantity: i64,
    /// Unit price in paise
    pub unit_price: i64,
}

impl OrderItem {
    pub fn subtotal(&self) -> i64 {
        self.quantity * self.unit_price
    }
}

/// Sum of line subtotals
pub fn order_total(items: &[OrderItem]) -> i64 {
    items.iter().map(OrderItem::subtotal).sum()
}

/// One entry of the append-only tracking history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TrackingEntry {
    /// Position in the history, starting at 1
    pub seq: i64,
    pub status: String,
    pub location: String,
    pub description: String,
    pub timestamp: i64,
}

/// Order entity
///
/// OTP material lives in the same row but is never loaded into this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub total: i64,
    pub status: OrderStatus,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    /// Stored as JSON text, `null` when absent
    #[cfg_attr(feature = "db", sqlx(json))]
    pub payment_details: Option<PaymentDetails>,
    pub otp_verified: bool,
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub tracking: Vec<TrackingEntry>,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,
    /// Expected delivery date set by an admin, unix millis
    pub estimated_delivery: Option<i64>,
    pub actual_delivery: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Paginated order listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

/// Requested order line; name and price are filled in from the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineCreate {
    pub product_id: i64,
    pub quantity: i64,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub items: Vec<OrderLineCreate>,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_details: Option<PaymentDetails>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// OTP confirmation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpVerify {
    pub order_id: i64,
    pub otp: String,
}

/// Returned when a fresh OTP has been issued
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpIssued {
    pub order_id: i64,
    pub expires_at: i64,
}

/// Customer cancellation payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderCancel {
    #[serde(default)]
    pub reason: Option<String>,
}

/// Admin status update payload
///
/// `status` stays a string so unknown values surface as a validation error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Unix millis; ignored when cancelling
    #[serde(default)]
    pub estimated_delivery: Option<i64>,
}
