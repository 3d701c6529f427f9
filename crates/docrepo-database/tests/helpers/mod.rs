//! Shared fixtures for the repository integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use docrepo_core::config::DatabaseConfig;
use docrepo_core::traits::entity::{Entity, Timestamps};
use docrepo_core::traits::naming::NamingResolver;
use docrepo_core::traits::repository::Repository;
use docrepo_database::store::memory::{MemoryClient, MemoryDatabase};
use docrepo_database::{DefaultNamingResolver, DocumentRepository, RepositoryHelper};

docrepo_core::define_id!(
    /// Identifier of a test product.
    ProductId
);

/// Logical database every test writes to.
pub const SHOP: &str = "Shop";

/// A catalogue entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    pub category: String,
    pub price_cents: i64,
    pub stock: i32,
    #[serde(flatten)]
    pub timestamps: Timestamps,
}

impl Product {
    pub fn new(name: &str, category: &str, price_cents: i64) -> Self {
        Self {
            id: ProductId::new(),
            name: name.to_string(),
            category: category.to_string(),
            price_cents,
            stock: 0,
            timestamps: Timestamps::new(),
        }
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &ProductId {
        &self.id
    }

    fn timestamps(&self) -> &Timestamps {
        &self.timestamps
    }
}

pub type ProductRepository = DocumentRepository<Product, MemoryDatabase>;

/// An in-memory store plus a helper resolving names with suffix `Test`.
pub struct TestStore {
    pub client: MemoryClient,
    pub helper: RepositoryHelper<MemoryClient>,
}

impl TestStore {
    pub fn new() -> Self {
        Self::with_naming(Arc::new(DefaultNamingResolver::new()))
    }

    pub fn with_naming(naming: Arc<dyn NamingResolver>) -> Self {
        let client = MemoryClient::new();
        let config = DatabaseConfig::new("memory://localhost").with_environment_suffix("Test");
        let helper = RepositoryHelper::new(client.clone(), config, naming);
        Self { client, helper }
    }

    pub fn products(&self) -> ProductRepository {
        self.helper.repository::<Product>(SHOP, None)
    }

    /// Insert `count` products named `p00`, `p01`, ... priced 100, 200, ...
    pub async fn seed_products(&self, repo: &ProductRepository, count: usize) -> Vec<Product> {
        let products: Vec<Product> = (0..count)
            .map(|i| {
                let category = if i % 2 == 0 { "even" } else { "odd" };
                Product::new(&format!("p{i:02}"), category, (i as i64 + 1) * 100)
            })
            .collect();
        repo.insert_many(&products, None)
            .await
            .expect("Failed to seed products");
        products
    }
}
