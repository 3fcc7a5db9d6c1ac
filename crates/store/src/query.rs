use common::{CategoryId, OrderStatus};

/// Filter for listing orders.
///
/// Orders always come back newest first (`created_at` descending, then id
/// descending for orders created in the same instant).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQuery {
    /// Only orders in this status. `None` means all statuses.
    pub status: Option<OrderStatus>,

    /// Maximum number of orders to return.
    pub limit: Option<usize>,

    /// Number of orders to skip.
    pub offset: Option<usize>,
}

impl OrderQuery {
    /// Creates a query matching every order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for orders in one status.
    pub fn for_status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Filters by status.
    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Limits the number of results.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skips the first `offset` results.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Filter for listing products. Products come back ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    /// Only active (or only inactive) products.
    pub active: Option<bool>,

    /// Only products in this category.
    pub category_id: Option<CategoryId>,
}

impl ProductQuery {
    /// Creates a query matching every product.
    pub fn new() -> Self {
        Self::default()
    }

    /// Products offered in the new-order picker.
    pub fn active_only() -> Self {
        Self {
            active: Some(true),
            ..Default::default()
        }
    }

    /// Filters by category.
    pub fn category(mut self, category_id: CategoryId) -> Self {
        self.category_id = Some(category_id);
        self
    }

    /// Filters by active flag.
    pub fn active(mut self, active: bool) -> Self {
        self.active = Some(active);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_query_builder() {
        let query = OrderQuery::new()
            .status(OrderStatus::Cancelled)
            .limit(10)
            .offset(5);
        assert_eq!(query.status, Some(OrderStatus::Cancelled));
        assert_eq!(query.limit, Some(10));
        assert_eq!(query.offset, Some(5));
        assert_eq!(
            OrderQuery::for_status(OrderStatus::Cancelled).status,
            query.status
        );
    }

    #[test]
    fn product_query_builder() {
        let query = ProductQuery::active_only().category(CategoryId::new(2));
        assert_eq!(query.active, Some(true));
        assert_eq!(query.category_id, Some(CategoryId::new(2)));
        assert_eq!(ProductQuery::new().active, None);
    }
}
