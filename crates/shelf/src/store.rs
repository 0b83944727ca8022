//! Shelf collection storage.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};

use thiserror::Error;

use pim_core::{Aggregate, AggregateRoot, DomainError, ExpectedVersion, ShelfProductId};

use crate::product::{ShelfCommand, ShelfProduct};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShelfError {
    /// Internal lock poisoning; the batch was not appended.
    #[error("shelf lock poisoned")]
    Poisoned,

    /// The batch reuses an id already on the shelf (or twice within itself).
    #[error("duplicate shelf product id: {0}")]
    DuplicateId(ShelfProductId),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// The product shelf.
///
/// `append` is all-or-nothing: either every product in the batch is added, or
/// the shelf is left untouched. Existing products are never replaced by an
/// append.
pub trait ShelfCollection: Send + Sync {
    fn append(&self, products: Vec<ShelfProduct>) -> Result<(), ShelfError>;
    /// Products in insertion order.
    fn list(&self) -> Vec<ShelfProduct>;
    fn get(&self, id: &ShelfProductId) -> Option<ShelfProduct>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S> ShelfCollection for Arc<S>
where
    S: ShelfCollection + ?Sized,
{
    fn append(&self, products: Vec<ShelfProduct>) -> Result<(), ShelfError> {
        (**self).append(products)
    }

    fn list(&self) -> Vec<ShelfProduct> {
        (**self).list()
    }

    fn get(&self, id: &ShelfProductId) -> Option<ShelfProduct> {
        (**self).get(id)
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

/// In-memory shelf.
#[derive(Debug, Default)]
pub struct InMemoryShelf {
    inner: RwLock<Vec<ShelfProduct>>,
}

impl InMemoryShelf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_products(products: Vec<ShelfProduct>) -> Self {
        Self {
            inner: RwLock::new(products),
        }
    }

    /// Run a lifecycle command against one stored product.
    ///
    /// The product is replaced only if the command succeeds.
    pub fn execute(
        &self,
        expected: ExpectedVersion,
        command: &ShelfCommand,
    ) -> Result<ShelfProduct, ShelfError> {
        let mut products = self.inner.write().map_err(|_| ShelfError::Poisoned)?;
        let id = command.product_id();
        let slot = products
            .iter_mut()
            .find(|p| p.id_typed() == id)
            .ok_or(DomainError::NotFound)?;

        expected.check(slot.version())?;
        let events = slot.handle(command)?;

        let mut updated = slot.clone();
        for event in &events {
            updated.apply(event);
        }
        *slot = updated.clone();

        tracing::debug!(
            product_id = %id,
            version = updated.version(),
            status = %updated.status(),
            "shelf product updated"
        );
        Ok(updated)
    }
}

impl ShelfCollection for InMemoryShelf {
    fn append(&self, products: Vec<ShelfProduct>) -> Result<(), ShelfError> {
        let mut shelf = self.inner.write().map_err(|_| ShelfError::Poisoned)?;

        let mut seen: HashSet<ShelfProductId> = shelf.iter().map(|p| p.id_typed()).collect();
        for product in &products {
            if !seen.insert(product.id_typed()) {
                return Err(ShelfError::DuplicateId(product.id_typed()));
            }
        }

        let added = products.len();
        shelf.extend(products);
        tracing::debug!(added, total = shelf.len(), "shelf batch appended");
        Ok(())
    }

    fn list(&self) -> Vec<ShelfProduct> {
        match self.inner.read() {
            Ok(products) => products.clone(),
            Err(_) => vec![],
        }
    }

    fn get(&self, id: &ShelfProductId) -> Option<ShelfProduct> {
        let products = self.inner.read().ok()?;
        products.iter().find(|p| p.id_typed() == *id).cloned()
    }

    fn len(&self) -> usize {
        self.inner.read().map(|p| p.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::{ProductAttribute, ProductDraft, ShelfStatus};
    use chrono::{NaiveDate, Utc};
    use std::collections::BTreeMap;

    fn product(code: u32) -> ShelfProduct {
        let effective = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        ShelfProduct::draft(ProductDraft {
            id: ShelfProductId::new(),
            name: format!("Product {code}"),
            description: String::new(),
            description_code: format!("GEN{code:03}"),
            product_code: format!("T2G{code:02}"),
            effective_date: effective,
            expiry_date: effective + chrono::Duration::days(365),
            category: "MORTGAGE".to_string(),
            product_type: "MORTGAGE".to_string(),
            attributes: vec![ProductAttribute::new("Region", "QC")],
            optional_fields: BTreeMap::new(),
            product_attributes: BTreeMap::new(),
        })
    }

    #[test]
    fn append_preserves_order_and_existing_products() {
        let shelf = InMemoryShelf::with_products(vec![product(1)]);
        let first = shelf.list()[0].clone();
        shelf.append(vec![product(2), product(3)]).unwrap();

        let listed = shelf.list();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0], first);
        assert_eq!(listed[2].description_code(), "GEN003");
        assert_eq!(shelf.get(&first.id_typed()), Some(first));
    }

    #[test]
    fn append_with_duplicate_id_appends_nothing() {
        let shelf = InMemoryShelf::new();
        let p = product(1);
        let dup = p.clone();
        let err = shelf.append(vec![product(2), p, dup]).unwrap_err();
        assert!(matches!(err, ShelfError::DuplicateId(_)));
        assert!(shelf.is_empty());
    }

    #[test]
    fn append_rejects_ids_already_on_shelf() {
        let existing = product(1);
        let shelf = InMemoryShelf::with_products(vec![existing.clone()]);
        assert!(shelf.append(vec![product(2), existing]).is_err());
        assert_eq!(shelf.len(), 1);
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let shelf = InMemoryShelf::new();
        shelf.append(Vec::new()).unwrap();
        assert_eq!(shelf.len(), 0);
    }

    #[test]
    fn execute_updates_stored_product() {
        let p = product(1);
        let id = p.id_typed();
        let shelf = Arc::new(InMemoryShelf::with_products(vec![p]));
        let updated = shelf
            .execute(
                ExpectedVersion::Exact(0),
                &ShelfCommand::Activate {
                    product_id: id,
                    occurred_at: Utc::now(),
                },
            )
            .unwrap();
        assert_eq!(updated.status(), ShelfStatus::Active);
        assert_eq!(shelf.get(&id).unwrap().version(), 1);
    }

    #[test]
    fn execute_with_stale_version_is_a_conflict() {
        let p = product(1);
        let id = p.id_typed();
        let shelf = InMemoryShelf::with_products(vec![p]);
        let err = shelf
            .execute(
                ExpectedVersion::Exact(5),
                &ShelfCommand::Activate {
                    product_id: id,
                    occurred_at: Utc::now(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, ShelfError::Domain(DomainError::Conflict(_))));
        assert_eq!(shelf.get(&id).unwrap().status(), ShelfStatus::Draft);
    }

    #[test]
    fn execute_unknown_product_is_not_found() {
        let shelf = InMemoryShelf::new();
        let err = shelf
            .execute(
                ExpectedVersion::Any,
                &ShelfCommand::Expire {
                    product_id: ShelfProductId::new(),
                    occurred_at: Utc::now(),
                },
            )
            .unwrap_err();
        assert_eq!(err, ShelfError::Domain(DomainError::NotFound));
    }
}
