//! Engine assembly
//!
//! [`ShopEngine`] wires the repositories, ledgers, and services over one
//! store and one event broadcast channel. Embedding applications construct
//! it once and hand out references to the component services.

use crate::checkout::CheckoutManager;
use crate::config::Config;
use crate::inventory::InventoryLedger;
use crate::money;
use crate::ratings::RatingService;
use crate::store::{
    CartRepository, EntityKind, OrderRepository, ProductRepository, RatingRepository,
    SequenceAllocator, StorageError, StorageResult, StoreDb, with_retry,
};
use shared::checkout::ShopEvent;
use shared::models::{Product, ProductCreate, ProductUpdate};
use thiserror::Error;
use tokio::sync::broadcast;

/// Event broadcast channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Catalog errors (product management surface)
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Product not found: {0}")]
    ProductNotFound(u64),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// The assembled engine
pub struct ShopEngine {
    products: ProductRepository,
    carts: CartRepository,
    orders: OrderRepository,
    sequences: SequenceAllocator,
    inventory: InventoryLedger,
    checkout: CheckoutManager,
    ratings: RatingService,
    event_tx: broadcast::Sender<ShopEvent>,
}

impl ShopEngine {
    /// Open (or create) the durable engine under the configured work dir
    pub fn open(config: &Config) -> StorageResult<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let db = StoreDb::open(config.db_path())?;
        tracing::info!(path = %config.db_path().display(), "Shop engine store opened");
        Ok(Self::with_store(db))
    }

    /// Fully in-memory engine (tests and ephemeral deployments)
    pub fn in_memory() -> StorageResult<Self> {
        Ok(Self::with_store(StoreDb::open_in_memory()?))
    }

    /// Assemble all components over an existing store
    pub fn with_store(db: StoreDb) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let products = ProductRepository::new(db.clone());
        let carts = CartRepository::new(db.clone());
        let orders = OrderRepository::new(db.clone());
        let sequences = SequenceAllocator::new(db.clone());
        let inventory = InventoryLedger::new(products.clone(), event_tx.clone());
        let checkout = CheckoutManager::new(
            products.clone(),
            carts.clone(),
            orders.clone(),
            sequences.clone(),
            inventory.clone(),
            event_tx.clone(),
        );
        let ratings = RatingService::new(RatingRepository::new(db), event_tx.clone());
        Self {
            products,
            carts,
            orders,
            sequences,
            inventory,
            checkout,
            ratings,
            event_tx,
        }
    }

    // ========== Component access ==========

    pub fn checkout(&self) -> &CheckoutManager {
        &self.checkout
    }

    pub fn inventory(&self) -> &InventoryLedger {
        &self.inventory
    }

    pub fn ratings(&self) -> &RatingService {
        &self.ratings
    }

    pub fn products(&self) -> &ProductRepository {
        &self.products
    }

    pub fn carts(&self) -> &CartRepository {
        &self.carts
    }

    pub fn orders(&self) -> &OrderRepository {
        &self.orders
    }

    pub fn sequences(&self) -> &SequenceAllocator {
        &self.sequences
    }

    /// Subscribe to engine event broadcasts
    pub fn subscribe(&self) -> broadcast::Receiver<ShopEvent> {
        self.event_tx.subscribe()
    }

    // ========== Catalog management ==========

    /// Create a product under a freshly allocated id
    pub fn create_product(&self, data: ProductCreate) -> CatalogResult<Product> {
        money::validate_price(data.price).map_err(CatalogError::Validation)?;
        let id = with_retry("catalog.product_id", || {
            self.sequences.next(EntityKind::Product)
        })?;
        let product = self.products.create(id, data)?;
        tracing::info!(product_id = product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Patch a product's catalog fields
    pub fn update_product(&self, id: u64, data: ProductUpdate) -> CatalogResult<Product> {
        if let Some(price) = data.price {
            money::validate_price(price).map_err(CatalogError::Validation)?;
        }
        self.products
            .update(id, data)?
            .ok_or(CatalogError::ProductNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_product_allocates_sequential_ids() {
        let engine = ShopEngine::in_memory().unwrap();
        let a = engine
            .create_product(ProductCreate {
                name: "A".into(),
                description: None,
                image: None,
                category: None,
                price: 1.0,
                stock: Some(1),
            })
            .unwrap();
        let b = engine
            .create_product(ProductCreate {
                name: "B".into(),
                description: None,
                image: None,
                category: None,
                price: 2.0,
                stock: None,
            })
            .unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(b.stock, 0);
    }

    #[test]
    fn create_product_rejects_bad_price() {
        let engine = ShopEngine::in_memory().unwrap();
        let result = engine.create_product(ProductCreate {
            name: "A".into(),
            description: None,
            image: None,
            category: None,
            price: -1.0,
            stock: None,
        });
        assert!(matches!(result, Err(CatalogError::Validation(_))));
    }

    #[test]
    fn update_product_checks_existence_and_price() {
        let engine = ShopEngine::in_memory().unwrap();
        assert!(matches!(
            engine.update_product(1, ProductUpdate::default()),
            Err(CatalogError::ProductNotFound(1))
        ));
        let product = engine
            .create_product(ProductCreate {
                name: "A".into(),
                description: None,
                image: None,
                category: None,
                price: 1.0,
                stock: None,
            })
            .unwrap();
        assert!(matches!(
            engine.update_product(
                product.id,
                ProductUpdate {
                    price: Some(f64::NAN),
                    ..Default::default()
                }
            ),
            Err(CatalogError::Validation(_))
        ));
    }
}
