//! Integration tests for name resolution through the repository helper.

mod helpers;

use std::sync::Arc;

use docrepo_core::config::DatabaseConfig;
use docrepo_core::traits::naming::NamingResolver;
use docrepo_core::traits::repository::Repository;
use docrepo_core::traits::store::{StoreClient, StoreDatabase};
use docrepo_database::DefaultNamingResolver;

use helpers::{Product, SHOP, TestStore};

/// Marks every collection as test data, otherwise follows the defaults.
#[derive(Debug)]
struct TestMarkerResolver {
    inner: DefaultNamingResolver,
}

impl NamingResolver for TestMarkerResolver {
    fn database_name(&self, config: &DatabaseConfig, logical_name: &str) -> String {
        self.inner.database_name(config, logical_name)
    }

    fn collection_name(&self, logical_name: &str) -> String {
        format!("{}_test", self.inner.collection_name(logical_name))
    }
}

#[test]
fn test_default_resolver_examples() {
    let resolver = DefaultNamingResolver::new();
    let config = DatabaseConfig::new("mongodb://localhost").with_environment_suffix("Test");
    assert_eq!(resolver.collection_name("User"), "users");
    assert_eq!(resolver.database_name(&config, "Shop"), "ShopTest");
    assert_eq!(resolver.collection_name_for::<Product>(), "products");
}

#[tokio::test]
async fn test_default_resolver_places_repository() {
    let store = TestStore::new();
    let repo = store.products();
    assert_eq!(repo.database().name(), "ShopTest");
    assert_eq!(repo.collection_name(), "products");

    store.seed_products(&repo, 2).await;
    let db = store.client.database("ShopTest");
    assert_eq!(db.collection_names(), vec!["products".to_string()]);
}

#[tokio::test]
async fn test_explicit_collection_name_is_still_resolved() {
    let store = TestStore::new();
    let repo = store.helper.repository::<Product>(SHOP, Some("ArchivedProduct"));
    assert_eq!(repo.collection_name(), "archivedproducts");
}

#[tokio::test]
async fn test_override_resolver_is_substitutable() {
    let store = TestStore::with_naming(Arc::new(TestMarkerResolver {
        inner: DefaultNamingResolver::new(),
    }));
    let repo = store.products();
    assert_eq!(repo.collection_name(), "products_test");

    let product = Product::new("globe", "office", 5_000);
    repo.add(product.clone(), None).await.unwrap();
    assert_eq!(repo.get_by_id(&product.id, None).await.unwrap(), Some(product));
    assert_eq!(repo.count(None, None).await.unwrap(), 1);

    let default_repo = docrepo_database::DocumentRepository::<Product, _>::new(
        store.client.database("ShopTest"),
        "products",
    );
    assert_eq!(default_repo.count(None, None).await.unwrap(), 0);
}
