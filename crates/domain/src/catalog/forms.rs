use common::{Category, CategoryDraft, CategoryId, Money, Product, ProductDraft};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::validation::{FieldErrors, check_amount, check_max_length, clean_text};

const CATEGORY_NAME_MAX: usize = 100;
const PRODUCT_NAME_MAX: usize = 150;
const REQUIRED: &str = "this field is required";

pub(super) fn unknown_category(id: impl std::fmt::Display) -> String {
    format!("category {id} is not one of the available choices")
}

/// Category input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl From<&Category> for CategoryForm {
    fn from(category: &Category) -> Self {
        Self {
            name: Some(category.name.clone()),
            description: category.description.clone(),
        }
    }
}

/// Product input. `active` defaults to true when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub category: Option<CategoryId>,

    #[serde(default)]
    pub price: Option<Decimal>,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Default for ProductForm {
    fn default() -> Self {
        Self {
            name: None,
            category: None,
            price: None,
            active: default_active(),
        }
    }
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            name: Some(product.name.clone()),
            category: Some(product.category_id),
            price: Some(product.price.amount()),
            active: product.active,
        }
    }
}

/// Validates a category form. Name uniqueness is checked by the service.
pub fn validate_category(form: &CategoryForm) -> Result<CategoryDraft, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = clean_text(form.name.as_deref());
    match &name {
        None => errors.add("name", REQUIRED),
        Some(name) => check_max_length(&mut errors, "name", Some(name), CATEGORY_NAME_MAX),
    }

    match name {
        Some(name) if errors.is_empty() => Ok(CategoryDraft {
            name,
            description: clean_text(form.description.as_deref()),
        }),
        _ => Err(errors),
    }
}

/// Validates a product form against the category it names.
pub fn validate_product(
    form: &ProductForm,
    category: Option<&Category>,
) -> Result<ProductDraft, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = clean_text(form.name.as_deref());
    match &name {
        None => errors.add("name", REQUIRED),
        Some(name) => check_max_length(&mut errors, "name", Some(name), PRODUCT_NAME_MAX),
    }

    let category_id = match (form.category, category) {
        (None, _) => {
            errors.add("category", REQUIRED);
            None
        }
        (Some(id), Some(category)) if category.id == id => Some(id),
        (Some(id), _) => {
            errors.add("category", unknown_category(id));
            None
        }
    };

    match form.price {
        None => errors.add("price", REQUIRED),
        Some(price) => check_amount(&mut errors, "price", price),
    }

    match (name, category_id, form.price) {
        (Some(name), Some(category_id), Some(price)) if errors.is_empty() => Ok(ProductDraft {
            name,
            category_id,
            price: Money::from_decimal(price),
            active: form.active,
        }),
        _ => Err(errors),
    }
}
