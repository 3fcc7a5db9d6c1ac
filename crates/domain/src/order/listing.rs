//! Order listing with a status filter and revenue summary.

use common::{Money, Order, OrderStatus, ParseChoiceError};
use serde::{Serialize, Serializer};

/// Which orders the listing shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    /// Returns the status to filter by, if any.
    pub fn status(&self) -> Option<OrderStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Only(status) => Some(*status),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "ALL",
            StatusFilter::Only(status) => status.as_str(),
        }
    }
}

impl std::fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StatusFilter {
    type Err = ParseChoiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "ALL" => Ok(StatusFilter::All),
            other => other.parse().map(StatusFilter::Only),
        }
    }
}

impl Serialize for StatusFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Orders matching a filter, newest first, with their count and revenue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderListing {
    pub filter: StatusFilter,
    pub orders: Vec<Order>,
    pub count: usize,
    pub revenue: Money,
}

impl OrderListing {
    /// Builds a listing from orders already restricted to the filter.
    pub fn new(filter: StatusFilter, orders: Vec<Order>) -> Self {
        let revenue = orders.iter().map(Order::total).sum();
        Self {
            filter,
            count: orders.len(),
            orders,
            revenue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::{LineItem, LineItemId, OrderId, OrderType, ProductId};

    fn order(id: i64, cents: i64) -> Order {
        Order {
            id: OrderId::new(id),
            created_at: Utc::now(),
            order_type: OrderType::InStore,
            status: OrderStatus::Cancelled,
            table_number: None,
            customer_name: None,
            items: vec![LineItem {
                id: LineItemId::new(id),
                order_id: OrderId::new(id),
                product_id: ProductId::new(1),
                product_name: "Soup".to_string(),
                quantity: 1,
                unit_price: Money::from_cents(cents),
            }],
        }
    }

    #[test]
    fn parses_filter() {
        assert_eq!("".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!("ALL".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "CANCELLED".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(OrderStatus::Cancelled)
        );
        assert!("cancelled".parse::<StatusFilter>().is_err());
    }

    #[test]
    fn sums_revenue() {
        let listing = OrderListing::new(
            StatusFilter::Only(OrderStatus::Cancelled),
            vec![order(1, 1000), order(2, 250)],
        );
        assert_eq!(listing.count, 2);
        assert_eq!(listing.revenue, Money::from_cents(1250));
        assert_eq!(
            serde_json::to_value(&listing).unwrap()["filter"],
            "CANCELLED"
        );
    }

    #[test]
    fn empty_listing_has_zero_revenue() {
        let listing = OrderListing::new(StatusFilter::All, Vec::new());
        assert_eq!(listing.count, 0);
        assert!(listing.revenue.is_zero());
    }
}
