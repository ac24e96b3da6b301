use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{
    consistency,
    db_types::{Order, OrderLine, OrderStatusType, Role},
    traits::OrderFlowError,
};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// An order together with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullOrder {
    #[serde(flatten)]
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

impl FullOrder {
    pub fn new(order: Order, lines: Vec<OrderLine>) -> Self {
        Self { order, lines }
    }
}

/// The five legal status transitions of an order.
///
/// | Transition       | Actor                | From               | To                 |
/// |------------------|----------------------|--------------------|--------------------|
/// | `Cancel`         | owning customer      | `PENDING`          | `CANCELLED`        |
/// | `Confirm`        | owning restaurant    | `PENDING`          | `CONFIRMED`        |
/// | `MarkReady`      | owning restaurant    | `CONFIRMED`        | `PREPARING`        |
/// | `AcceptDelivery` | any courier          | `PREPARING`        | `OUT_FOR_DELIVERY` |
/// | `MarkDelivered`  | assigned courier     | `OUT_FOR_DELIVERY` | `DELIVERED`        |
///
/// `AcceptDelivery` additionally requires that no courier has been assigned yet, and assigns the acting courier.
/// `Cancel` is refused for orders that have been paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderTransition {
    Cancel,
    Confirm,
    MarkReady,
    AcceptDelivery,
    MarkDelivered,
}

impl Display for OrderTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Cancel => "cancel",
            Self::Confirm => "confirm",
            Self::MarkReady => "mark ready",
            Self::AcceptDelivery => "accept delivery",
            Self::MarkDelivered => "mark delivered",
        };
        f.write_str(s)
    }
}

impl OrderTransition {
    pub fn actor_role(&self) -> Role {
        match self {
            Self::Cancel => Role::Customer,
            Self::Confirm | Self::MarkReady => Role::Restaurant,
            Self::AcceptDelivery | Self::MarkDelivered => Role::Courier,
        }
    }

    pub fn required_status(&self) -> OrderStatusType {
        match self {
            Self::Cancel | Self::Confirm => OrderStatusType::Pending,
            Self::MarkReady => OrderStatusType::Confirmed,
            Self::AcceptDelivery => OrderStatusType::Preparing,
            Self::MarkDelivered => OrderStatusType::OutForDelivery,
        }
    }

    pub fn target_status(&self) -> OrderStatusType {
        match self {
            Self::Cancel => OrderStatusType::Cancelled,
            Self::Confirm => OrderStatusType::Confirmed,
            Self::MarkReady => OrderStatusType::Preparing,
            Self::AcceptDelivery => OrderStatusType::OutForDelivery,
            Self::MarkDelivered => OrderStatusType::Delivered,
        }
    }

    /// Checks `order` against the preconditions of this transition for the given actor.
    ///
    /// Checks are made in a fixed order: ownership or assignment, then the status, then any extra conditions. The
    /// backends apply the same conditions atomically; this is used to explain why a conditional update did not
    /// match.
    pub fn check(&self, order: &Order, actor_id: i64) -> Result<(), OrderFlowError> {
        let owner_ok = match self {
            Self::Cancel => order.customer_id == actor_id,
            Self::Confirm | Self::MarkReady => order.restaurant_id == actor_id,
            Self::AcceptDelivery => true,
            Self::MarkDelivered => order.courier_id == Some(actor_id),
        };
        if !owner_ok {
            return Err(OrderFlowError::Forbidden(format!(
                "Order #{} is not assigned to {} #{actor_id}",
                order.id,
                self.actor_role()
            )));
        }
        let required = self.required_status();
        if order.status != required {
            return Err(OrderFlowError::InvalidStatus { current: order.status, required });
        }
        match self {
            Self::Cancel => consistency::check_can_cancel(order),
            Self::AcceptDelivery if order.courier_id.is_some() => {
                Err(OrderFlowError::InvalidState(format!("Order #{} already has a courier", order.id)))
            },
            _ => Ok(()),
        }
    }
}

/// Filters for order listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub customer_id: Option<i64>,
    pub restaurant_id: Option<i64>,
    pub courier_id: Option<i64>,
    pub status: Option<OrderStatusType>,
    /// Only orders without an assigned courier
    #[serde(default)]
    pub unassigned: bool,
    /// Zero-based page index
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl OrderQueryFilter {
    pub fn with_customer_id(mut self, customer_id: i64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_restaurant_id(mut self, restaurant_id: i64) -> Self {
        self.restaurant_id = Some(restaurant_id);
        self
    }

    pub fn with_courier_id(mut self, courier_id: i64) -> Self {
        self.courier_id = Some(courier_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = Some(status);
        self
    }

    pub fn unassigned(mut self) -> Self {
        self.unassigned = true;
        self
    }

    pub fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = Some(page);
        self.page_size = Some(page_size);
        self
    }

    /// `(limit, offset)` for the requested page. Page sizes are clamped to `1..=MAX_PAGE_SIZE`.
    pub fn limit_offset(&self) -> (i64, i64) {
        let size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let page = self.page.unwrap_or(0);
        (i64::from(size), i64::from(page) * i64::from(size))
    }

    pub fn is_empty(&self) -> bool {
        self.customer_id.is_none() &&
            self.restaurant_id.is_none() &&
            self.courier_id.is_none() &&
            self.status.is_none() &&
            !self.unassigned
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters. ")?;
        }
        if let Some(id) = self.customer_id {
            write!(f, "customer: #{id}. ")?;
        }
        if let Some(id) = self.restaurant_id {
            write!(f, "restaurant: #{id}. ")?;
        }
        if let Some(id) = self.courier_id {
            write!(f, "courier: #{id}. ")?;
        }
        if let Some(status) = self.status {
            write!(f, "status: {status}. ")?;
        }
        if self.unassigned {
            write!(f, "unassigned only. ")?;
        }
        let (limit, offset) = self.limit_offset();
        write!(f, "limit {limit} offset {offset}")
    }
}
