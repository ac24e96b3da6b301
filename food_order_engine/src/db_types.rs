use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
pub use fos_common::Money;
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

/// Generates `Display`, `FromStr` and the infallible `From<String>` used when reading enum columns.
macro_rules! string_enum {
    ($type:ident, $default:ident, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $text),)+
                }
            }
        }

        impl FromStr for $type {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    s => Err(ConversionError(format!("{s} is not a valid {}", stringify!($type)))),
                }
            }
        }

        impl From<String> for $type {
            fn from(value: String) -> Self {
                value.parse().unwrap_or_else(|_| {
                    error!(
                        "Invalid {}: {value}. But this conversion cannot fail. Defaulting to {}",
                        stringify!($type),
                        Self::$default
                    );
                    Self::$default
                })
            }
        }
    };
}

//--------------------------------------        Role         ---------------------------------------------------------
/// The actor roles recognised by the engine. Roles are asserted by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Restaurant,
    Courier,
}

string_enum!(Role, Customer, {
    Customer => "customer",
    Restaurant => "restaurant",
    Courier => "courier",
});

/// An authenticated actor, identified by their *profile* id (not the identity provider's user id).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Customer(i64),
    Restaurant(i64),
    Courier(i64),
}

impl Actor {
    pub fn role(&self) -> Role {
        match self {
            Actor::Customer(_) => Role::Customer,
            Actor::Restaurant(_) => Role::Restaurant,
            Actor::Courier(_) => Role::Courier,
        }
    }

    pub fn profile_id(&self) -> i64 {
        match self {
            Actor::Customer(id) | Actor::Restaurant(id) | Actor::Courier(id) => *id,
        }
    }
}

impl Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} #{}", self.role(), self.profile_id())
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// Newly placed. The restaurant has not accepted it yet.
    Pending,
    /// Accepted by the restaurant.
    Confirmed,
    /// Being prepared, and available for a courier to pick up.
    Preparing,
    /// A courier has picked the order up.
    OutForDelivery,
    Delivered,
    Cancelled,
}

string_enum!(OrderStatusType, Pending, {
    Pending => "PENDING",
    Confirmed => "CONFIRMED",
    Preparing => "PREPARING",
    OutForDelivery => "OUT_FOR_DELIVERY",
    Delivered => "DELIVERED",
    Cancelled => "CANCELLED",
});

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

//--------------------------------------  OrderPaymentStatus   ---------------------------------------------------------
/// The payment state of an order, as seen from the order. Only the payment flow changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderPaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

string_enum!(OrderPaymentStatus, Pending, {
    Pending => "PENDING",
    Paid => "PAID",
    Failed => "FAILED",
    Refunded => "REFUNDED",
});

//--------------------------------------    PaymentStatus      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Created, and possibly opened on the gateway, but not yet proven.
    Pending,
    Success,
    /// The last verification attempt failed. The payment can be retried.
    Failed,
    Refunded,
}

string_enum!(PaymentStatus, Pending, {
    Pending => "PENDING",
    Success => "SUCCESS",
    Failed => "FAILED",
    Refunded => "REFUNDED",
});

impl PaymentStatus {
    /// Settled payments can no longer be opened or verified.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Success | Self::Refunded)
    }
}

//--------------------------------------    PaymentMethod      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Card,
    Upi,
    NetBanking,
    Wallet,
}

string_enum!(PaymentMethod, Card, {
    Card => "CARD",
    Upi => "UPI",
    NetBanking => "NET_BANKING",
    Wallet => "WALLET",
});

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub restaurant_id: i64,
    pub courier_id: Option<i64>,
    pub address_id: i64,
    pub status: OrderStatusType,
    pub payment_status: OrderPaymentStatus,
    /// The sum of `price * quantity` over the order lines, fixed when the order is placed.
    pub total_amount: Money,
    pub order_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      OrderLine        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub menu_item_id: i64,
    pub quantity: i64,
    /// Unit price, pinned when the item was added to the cart.
    pub price: Money,
}

//--------------------------------------       Payment         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub amount: Money,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    /// The gateway order reference while pending, the gateway payment id once settled, and the refund id after a
    /// refund.
    pub transaction_id: Option<String>,
    pub payment_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      Cart             ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Cart {
    pub id: i64,
    pub customer_id: i64,
    pub restaurant_id: Option<i64>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CartLine {
    pub id: i64,
    pub cart_id: i64,
    pub menu_item_id: i64,
    pub quantity: i64,
    pub price: Money,
}

/// A point-in-time, read-only view of a customer's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub cart: Cart,
    pub lines: Vec<CartLine>,
}

impl CartSnapshot {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The sum of `price * quantity` over the cart lines. `None` if the total does not fit in a `Money`.
    pub fn total(&self) -> Option<Money> {
        self.lines
            .iter()
            .try_fold(Money::default(), |acc, l| l.price.checked_mul(l.quantity).and_then(|t| acc.checked_add(t)))
    }
}

//--------------------------------------      NewOrder         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub menu_item_id: i64,
    pub quantity: i64,
    pub price: Money,
}

/// An order that is about to be created from a cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: i64,
    pub restaurant_id: i64,
    pub address_id: i64,
    pub total_amount: Money,
    pub lines: Vec<NewOrderLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("The cart is empty")]
    EmptyCart,
    #[error("The cart is not bound to a restaurant")]
    NoRestaurant,
    #[error("Cart line {0} has an invalid quantity or price")]
    InvalidLine(i64),
    #[error("The cart total is too large")]
    TotalOverflow,
}

impl NewOrder {
    /// Builds the order for a cart snapshot, preserving the order of the cart lines.
    pub fn from_cart(snapshot: &CartSnapshot, address_id: i64) -> Result<Self, CheckoutError> {
        if snapshot.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let restaurant_id = snapshot.cart.restaurant_id.ok_or(CheckoutError::NoRestaurant)?;
        if let Some(bad) = snapshot.lines.iter().find(|l| l.quantity < 1 || l.price.is_negative()) {
            return Err(CheckoutError::InvalidLine(bad.id));
        }
        let total_amount = snapshot.total().ok_or(CheckoutError::TotalOverflow)?;
        let lines = snapshot
            .lines
            .iter()
            .map(|l| NewOrderLine { menu_item_id: l.menu_item_id, quantity: l.quantity, price: l.price })
            .collect();
        Ok(Self {
            customer_id: snapshot.cart.customer_id,
            restaurant_id,
            address_id,
            total_amount,
            lines,
        })
    }
}
