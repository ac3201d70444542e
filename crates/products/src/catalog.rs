use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use dulceria_core::{DomainResult, ProductId};

use crate::product::{Product, ProductKind};

/// Read/registration seam over the product catalog.
///
/// The real catalog lives with the master-data collaborator; the ledger core
/// only ever looks products up or registers one it first hears about through
/// a purchase.
pub trait ProductCatalog: Send + Sync {
    fn get(&self, product_id: ProductId) -> Option<Product>;
    fn find_by_name(&self, name: &str) -> Option<Product>;
    fn upsert(&self, product: Product);
    fn list(&self) -> Vec<Product>;
}

impl<C> ProductCatalog for Arc<C>
where
    C: ProductCatalog + ?Sized,
{
    fn get(&self, product_id: ProductId) -> Option<Product> {
        (**self).get(product_id)
    }

    fn find_by_name(&self, name: &str) -> Option<Product> {
        (**self).find_by_name(name)
    }

    fn upsert(&self, product: Product) {
        (**self).upsert(product)
    }

    fn list(&self) -> Vec<Product> {
        (**self).list()
    }
}

/// In-memory catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryProductCatalog {
    inner: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create-if-missing registration: returns the existing product when the
    /// name is already taken, otherwise inserts a fresh one.
    pub fn register(&self, name: &str, kind: ProductKind) -> DomainResult<Product> {
        if let Some(existing) = self.find_by_name(name) {
            return Ok(existing);
        }
        let product = Product::new(name, kind)?;
        self.upsert(product.clone());
        Ok(product)
    }
}

impl ProductCatalog for InMemoryProductCatalog {
    fn get(&self, product_id: ProductId) -> Option<Product> {
        let map = self.inner.read().ok()?;
        map.get(&product_id).cloned()
    }

    fn find_by_name(&self, name: &str) -> Option<Product> {
        let map = self.inner.read().ok()?;
        map.values().find(|p| p.name == name).cloned()
    }

    fn upsert(&self, product: Product) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(product.id, product);
        }
    }

    fn list(&self) -> Vec<Product> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        map.values().cloned().collect()
    }
}
