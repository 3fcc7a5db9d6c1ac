use common::{Category, CategoryId, Product, ProductId};
use serde::Serialize;
use store::{ProductQuery, Store, StoreError};

use super::forms::{
    CategoryForm, ProductForm, unknown_category, validate_category, validate_product,
};
use super::CatalogError;
use crate::error::DomainError;
use crate::validation::FieldErrors;

const DUPLICATE_CATEGORY: &str = "category with this name already exists";

/// What deleting a product would affect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDeletion {
    pub product: Product,

    /// Line items referencing the product. Deletion is refused while non-zero.
    pub line_item_count: u64,
}

impl ProductDeletion {
    pub fn can_delete(&self) -> bool {
        self.line_item_count == 0
    }
}

/// Service for maintaining categories and products.
#[derive(Debug, Clone)]
pub struct CatalogService<S: Store> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, DomainError> {
        Ok(self.store.list_categories().await?)
    }

    pub async fn get_category(&self, id: CategoryId) -> Result<Category, DomainError> {
        self.store
            .get_category(id)
            .await?
            .ok_or_else(|| CatalogError::CategoryNotFound(id).into())
    }

    /// Creates a category. Names are unique.
    #[tracing::instrument(skip(self, form))]
    pub async fn create_category(&self, form: &CategoryForm) -> Result<Category, DomainError> {
        let draft = validate_category(form).map_err(CatalogError::Invalid)?;
        self.ensure_unique_name(&draft.name, None).await?;

        let category = self
            .store
            .insert_category(draft)
            .await
            .map_err(duplicate_as_field_error)?;
        tracing::info!(category_id = %category.id, name = %category.name, "category created");
        Ok(category)
    }

    #[tracing::instrument(skip(self, form))]
    pub async fn update_category(
        &self,
        id: CategoryId,
        form: &CategoryForm,
    ) -> Result<Category, DomainError> {
        self.get_category(id).await?;
        let draft = validate_category(form).map_err(CatalogError::Invalid)?;
        self.ensure_unique_name(&draft.name, Some(id)).await?;

        Ok(self
            .store
            .update_category(id, draft)
            .await
            .map_err(duplicate_as_field_error)?)
    }

    /// Deletes a category that no product belongs to.
    #[tracing::instrument(skip(self))]
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), DomainError> {
        match self.store.delete_category(id).await {
            Ok(()) => {
                tracing::info!(category_id = %id, "category deleted");
                Ok(())
            }
            Err(StoreError::NotFound { .. }) => Err(CatalogError::CategoryNotFound(id).into()),
            Err(StoreError::Referenced { .. }) => Err(CatalogError::CategoryInUse(id).into()),
            Err(e) => Err(e.into()),
        }
    }

    async fn ensure_unique_name(
        &self,
        name: &str,
        current: Option<CategoryId>,
    ) -> Result<(), DomainError> {
        match self.store.find_category_by_name(name).await? {
            Some(existing) if Some(existing.id) != current => {
                let mut errors = FieldErrors::new();
                errors.add("name", DUPLICATE_CATEGORY);
                Err(CatalogError::Invalid(errors).into())
            }
            _ => Ok(()),
        }
    }

    /// Lists products by name; `active_only` restricts to the order picker.
    pub async fn list_products(&self, active_only: bool) -> Result<Vec<Product>, DomainError> {
        let query = if active_only {
            ProductQuery::active_only()
        } else {
            ProductQuery::new()
        };
        Ok(self.store.list_products(query).await?)
    }

    pub async fn get_product(&self, id: ProductId) -> Result<Product, DomainError> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| CatalogError::ProductNotFound(id).into())
    }

    #[tracing::instrument(skip(self, form))]
    pub async fn create_product(&self, form: &ProductForm) -> Result<Product, DomainError> {
        let draft = self.validate_product_form(form).await?;
        let product = self
            .store
            .insert_product(draft)
            .await
            .map_err(|e| product_write_error(e, None))?;
        tracing::info!(product_id = %product.id, name = %product.name, "product created");
        Ok(product)
    }

    #[tracing::instrument(skip(self, form))]
    pub async fn update_product(
        &self,
        id: ProductId,
        form: &ProductForm,
    ) -> Result<Product, DomainError> {
        self.get_product(id).await?;
        let draft = self.validate_product_form(form).await?;
        Ok(self
            .store
            .update_product(id, draft)
            .await
            .map_err(|e| product_write_error(e, Some(id)))?)
    }

    async fn validate_product_form(
        &self,
        form: &ProductForm,
    ) -> Result<common::ProductDraft, DomainError> {
        let category = match form.category {
            Some(id) => self.store.get_category(id).await?,
            None => None,
        };
        Ok(validate_product(form, category.as_ref()).map_err(CatalogError::Invalid)?)
    }

    /// The confirmation step before deleting a product.
    pub async fn delete_confirmation(&self, id: ProductId) -> Result<ProductDeletion, DomainError> {
        let product = self.get_product(id).await?;
        let line_item_count = self.store.count_line_items_for_product(id).await?;
        Ok(ProductDeletion {
            product,
            line_item_count,
        })
    }

    /// Deletes a product that no order line item references.
    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, id: ProductId) -> Result<(), DomainError> {
        match self.store.delete_product(id).await {
            Ok(()) => {
                tracing::info!(product_id = %id, "product deleted");
                Ok(())
            }
            Err(StoreError::NotFound { .. }) => Err(CatalogError::ProductNotFound(id).into()),
            Err(StoreError::Referenced { .. }) => {
                let line_items = self.store.count_line_items_for_product(id).await?;
                Err(CatalogError::ProductInUse { id, line_items }.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn duplicate_as_field_error(err: StoreError) -> DomainError {
    match err {
        StoreError::DuplicateName(_) => {
            let mut errors = FieldErrors::new();
            errors.add("name", DUPLICATE_CATEGORY);
            CatalogError::Invalid(errors).into()
        }
        other => other.into(),
    }
}

/// A category removed between validation and the write is reported on the
/// form like any other unknown category.
fn product_write_error(err: StoreError, product: Option<ProductId>) -> DomainError {
    match (err, product) {
        (StoreError::NotFound { entity: "category", id }, _) => {
            let mut errors = FieldErrors::new();
            errors.add("category", unknown_category(id));
            CatalogError::Invalid(errors).into()
        }
        (StoreError::NotFound { entity: "product", .. }, Some(id)) => {
            CatalogError::ProductNotFound(id).into()
        }
        (other, _) => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{LineItemDraft, Money, OrderHeader};
    use rust_decimal_macros::dec;
    use store::{InMemoryStore, OrderWrite};

    fn category_form(name: &str) -> CategoryForm {
        CategoryForm {
            name: Some(name.to_string()),
            description: None,
        }
    }

    fn product_form(name: &str, category: CategoryId) -> ProductForm {
        ProductForm {
            name: Some(name.to_string()),
            category: Some(category),
            price: Some(dec!(15.50)),
            active: true,
        }
    }

    #[tokio::test]
    async fn duplicate_category_is_a_field_error() {
        let service = CatalogService::new(InMemoryStore::new());
        service.create_category(&category_form("Soups")).await.unwrap();

        let err = service
            .create_category(&category_form(" Soups "))
            .await
            .unwrap_err();
        let DomainError::Catalog(CatalogError::Invalid(errors)) = err else {
            panic!("expected a field error");
        };
        assert_eq!(errors.get("name"), [DUPLICATE_CATEGORY]);
    }

    #[tokio::test]
    async fn renaming_a_category_to_itself_is_allowed() {
        let service = CatalogService::new(InMemoryStore::new());
        let soups = service.create_category(&category_form("Soups")).await.unwrap();

        let form = CategoryForm {
            name: Some("Soups".to_string()),
            description: Some("Hot".to_string()),
        };
        let updated = service.update_category(soups.id, &form).await.unwrap();
        assert_eq!(updated.description.as_deref(), Some("Hot"));
    }

    #[tokio::test]
    async fn product_needs_existing_category() {
        let service = CatalogService::new(InMemoryStore::new());
        let err = service
            .create_product(&product_form("Soup", CategoryId::new(5)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Catalog(CatalogError::Invalid(ref errors)) if errors.get("category").len() == 1
        ));
    }

    #[test]
    fn category_vanishing_before_write_is_a_field_error() {
        let missing = StoreError::NotFound {
            entity: "category",
            id: 5,
        };
        let DomainError::Catalog(CatalogError::Invalid(errors)) =
            product_write_error(missing, None)
        else {
            panic!("expected a field error");
        };
        assert_eq!(
            errors.get("category"),
            ["category 5 is not one of the available choices"]
        );

        let gone = StoreError::NotFound {
            entity: "product",
            id: 3,
        };
        assert!(matches!(
            product_write_error(gone, Some(ProductId::new(3))),
            DomainError::Catalog(CatalogError::ProductNotFound(_))
        ));
        assert!(matches!(
            product_write_error(StoreError::Unavailable("down".into()), None),
            DomainError::Store(StoreError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn referenced_product_cannot_be_deleted() {
        let store = InMemoryStore::new();
        let service = CatalogService::new(store.clone());
        let soups = service.create_category(&category_form("Soups")).await.unwrap();
        let soup = service
            .create_product(&product_form("Soup", soups.id))
            .await
            .unwrap();
        store
            .write_order(OrderWrite::create(
                OrderHeader::default(),
                vec![LineItemDraft {
                    id: None,
                    product_id: soup.id,
                    quantity: 1,
                    unit_price: Money::from_cents(1550),
                }],
            ))
            .await
            .unwrap();

        let confirmation = service.delete_confirmation(soup.id).await.unwrap();
        assert_eq!(confirmation.line_item_count, 1);
        assert!(!confirmation.can_delete());

        assert!(matches!(
            service.delete_product(soup.id).await,
            Err(DomainError::Catalog(CatalogError::ProductInUse { line_items: 1, .. }))
        ));
        assert!(matches!(
            service.delete_category(soups.id).await,
            Err(DomainError::Catalog(CatalogError::CategoryInUse(_)))
        ));
    }

    #[tokio::test]
    async fn unused_product_and_category_are_deleted() {
        let service = CatalogService::new(InMemoryStore::new());
        let soups = service.create_category(&category_form("Soups")).await.unwrap();
        let soup = service
            .create_product(&product_form("Soup", soups.id))
            .await
            .unwrap();

        service.delete_product(soup.id).await.unwrap();
        service.delete_category(soups.id).await.unwrap();
        assert!(service.list_categories().await.unwrap().is_empty());
        assert!(matches!(
            service.get_product(soup.id).await,
            Err(DomainError::Catalog(CatalogError::ProductNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn active_filter() {
        let service = CatalogService::new(InMemoryStore::new());
        let soups = service.create_category(&category_form("Soups")).await.unwrap();
        service
            .create_product(&product_form("Soup", soups.id))
            .await
            .unwrap();
        let mut retired = product_form("Stew", soups.id);
        retired.active = false;
        service.create_product(&retired).await.unwrap();

        assert_eq!(service.list_products(false).await.unwrap().len(), 2);
        assert_eq!(service.list_products(true).await.unwrap().len(), 1);
    }
}
