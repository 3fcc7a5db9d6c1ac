use serde::{Deserialize, Serialize};

/// Declares a database-assigned integer identifier.
///
/// Each identifier wraps the row's `BIGSERIAL` key so that a product id can
/// never be passed where an order id is expected.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw key.
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw key.
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

define_id!(
    /// Identifier of a product category.
    CategoryId
);

define_id!(
    /// Identifier of a catalog product.
    ProductId
);

define_id!(
    /// Identifier of a customer order.
    OrderId
);

define_id!(
    /// Identifier of a single order line item.
    LineItemId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_preserves_raw_value() {
        let id = OrderId::new(42);
        assert_eq!(id.as_i64(), 42);
        assert_eq!(i64::from(id), 42);
        assert_eq!(id.to_string(), "42");
    }

    #[test]
    fn id_parses_from_path_segment() {
        let id: ProductId = " 7 ".parse().unwrap();
        assert_eq!(id, ProductId::new(7));
        assert!("seven".parse::<ProductId>().is_err());
    }

    #[test]
    fn id_serializes_as_plain_number() {
        let json = serde_json::to_string(&CategoryId::new(3)).unwrap();
        assert_eq!(json, "3");
        let back: LineItemId = serde_json::from_str("9").unwrap();
        assert_eq!(back, LineItemId::new(9));
    }
}
