//! Shop Engine - 购物车结算与共享账本核心
//!
//! Turns a mutable cart into an immutable, priced order while keeping three
//! concurrently-mutated ledgers consistent: per-product stock, per-entity
//! monotonic identifiers, and per-product rating aggregates.
//!
//! # 模块结构
//!
//! ```text
//! shop-engine/src/
//! ├── config.rs      # 配置 (环境变量)
//! ├── store/         # redb 存储层: 表、仓储、序列分配器
//! ├── inventory.rs   # 库存账本 (原子预留/释放)
//! ├── checkout/      # 订单装配: 状态机、补偿回滚、幂等
//! ├── ratings/       # 评分聚合维护
//! ├── money.rs       # 金额计算 (rust_decimal)
//! ├── engine.rs      # 组件装配
//! └── utils/         # 日志等工具
//! ```
//!
//! All cross-request shared state lives in the redb store; every mutation is
//! a single serialized write transaction, which is what makes stock
//! reservation, id allocation, and aggregate updates atomic conditional
//! operations under concurrent callers.

pub mod checkout;
pub mod config;
pub mod engine;
pub mod inventory;
pub mod money;
pub mod ratings;
pub mod store;
pub mod utils;

// Re-export 公共类型
pub use checkout::{CheckoutError, CheckoutManager, CheckoutResult};
pub use config::Config;
pub use engine::{CatalogError, CatalogResult, ShopEngine};
pub use inventory::{InventoryError, InventoryLedger, InventoryResult};
pub use ratings::{RatingError, RatingResult, RatingService};
pub use store::{
    CartRepository, EntityKind, OrderRepository, ProductRepository, RatingRepository,
    ReserveOutcome, SequenceAllocator, StorageError, StorageResult, StoreDb, TransitionOutcome,
};

// Re-export logger functions
pub use utils::{init_logger, init_logger_with_file};
