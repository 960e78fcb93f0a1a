//! Infrastructure wiring: stores, relay, gateway, subscriber.
//!
//! Two wirings, selected by `USE_PERSISTENT_STORES`:
//! - in-memory stores + in-memory relay (dev/test)
//! - Postgres stores + Redis relay (`persistent` feature)

use std::sync::Arc;

use stocksync_catalog::{Catalog, InMemoryCatalog, Product};
use stocksync_core::{Barcode, WarehouseId};
use stocksync_gateway::{ScanError, ScanGateway, ScanReceipt, ScanRequest};
use stocksync_relay::InMemoryRelay;
use stocksync_replication::{ChangePublisher, ChangeSubscriber, ShutdownToken, SubscriberState};
use stocksync_store::{AuditEntry, AuditLog, InMemoryAuditLog, InMemoryInventoryStore, InventoryRecord, InventoryStore};

use crate::app::config::AppConfig;

#[cfg(feature = "persistent")]
use sqlx::PgPool;
#[cfg(feature = "persistent")]
use stocksync_infra::relay::RedisRelay;
#[cfg(feature = "persistent")]
use stocksync_infra::store::{PostgresAuditLog, PostgresInventoryStore};

type InMemorySubscriber =
    ChangeSubscriber<InMemoryRelay, Arc<InMemoryInventoryStore>, Arc<InMemoryAuditLog>>;

#[cfg(feature = "persistent")]
type PersistentSubscriber =
    ChangeSubscriber<RedisRelay, Arc<PostgresInventoryStore>, Arc<PostgresAuditLog>>;

pub enum AppServices {
    InMemory {
        gateway: ScanGateway<Arc<InMemoryCatalog>, Arc<InMemoryInventoryStore>, InMemoryRelay>,
        catalog: Arc<InMemoryCatalog>,
        store: Arc<InMemoryInventoryStore>,
        replica: Arc<InMemoryInventoryStore>,
        audit: Arc<InMemoryAuditLog>,
        subscriber: Arc<InMemorySubscriber>,
        peer_warehouse_id: WarehouseId,
        shutdown: ShutdownToken,
    },
    #[cfg(feature = "persistent")]
    Persistent {
        gateway: ScanGateway<Arc<InMemoryCatalog>, Arc<PostgresInventoryStore>, RedisRelay>,
        catalog: Arc<InMemoryCatalog>,
        /// One warehouse-keyed table backs both the authoritative records
        /// and the replica records.
        store: Arc<PostgresInventoryStore>,
        audit: Arc<PostgresAuditLog>,
        subscriber: Arc<PersistentSubscriber>,
        peer_warehouse_id: WarehouseId,
        shutdown: ShutdownToken,
    },
}

pub async fn build_services(config: AppConfig, relay: InMemoryRelay) -> AppServices {
    if config.use_persistent_stores {
        #[cfg(feature = "persistent")]
        {
            return build_persistent_services(config).await;
        }
        #[cfg(not(feature = "persistent"))]
        {
            tracing::warn!(
                "USE_PERSISTENT_STORES=true but the persistent feature is not compiled in; falling back to in-memory"
            );
        }
    }

    build_in_memory_services(config, relay)
}

fn build_in_memory_services(config: AppConfig, relay: InMemoryRelay) -> AppServices {
    let catalog = Arc::new(InMemoryCatalog::with_products(config.catalog));
    let store = Arc::new(InMemoryInventoryStore::new());
    let replica = Arc::new(InMemoryInventoryStore::new());
    let audit = Arc::new(InMemoryAuditLog::new());
    let shutdown = ShutdownToken::new();

    let publisher = ChangePublisher::new(relay.clone(), config.warehouse_id.clone());
    let gateway = ScanGateway::new(catalog.clone(), store.clone(), publisher, config.warehouse_id);

    let subscriber = Arc::new(ChangeSubscriber::new(
        relay,
        replica.clone(),
        audit.clone(),
        config.peer_warehouse_id.clone(),
        shutdown.clone(),
    ));
    spawn_subscriber(subscriber.clone());

    AppServices::InMemory {
        gateway,
        catalog,
        store,
        replica,
        audit,
        subscriber,
        peer_warehouse_id: config.peer_warehouse_id,
        shutdown,
    }
}

#[cfg(feature = "persistent")]
async fn build_persistent_services(config: AppConfig) -> AppServices {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");
    let redis_url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());

    let pool = PgPool::connect(&database_url)
        .await
        .expect("failed to connect to Postgres");

    let relay = RedisRelay::new(&redis_url).expect("failed to create Redis relay");

    let catalog = Arc::new(InMemoryCatalog::with_products(config.catalog));
    let store = Arc::new(PostgresInventoryStore::new(pool.clone()));
    let audit = Arc::new(PostgresAuditLog::new(pool));
    let shutdown = ShutdownToken::new();

    let publisher = ChangePublisher::new(relay.clone(), config.warehouse_id.clone());
    let gateway = ScanGateway::new(catalog.clone(), store.clone(), publisher, config.warehouse_id);

    let subscriber = Arc::new(ChangeSubscriber::new(
        relay,
        store.clone(),
        audit.clone(),
        config.peer_warehouse_id.clone(),
        shutdown.clone(),
    ));
    spawn_subscriber(subscriber.clone());

    AppServices::Persistent {
        gateway,
        catalog,
        store,
        audit,
        subscriber,
        peer_warehouse_id: config.peer_warehouse_id,
        shutdown,
    }
}

/// Run a subscriber on a blocking thread until its token is cancelled.
///
/// `spawn_blocking` rather than a raw thread: the Postgres-backed stores
/// bridge into the runtime via `Handle::block_on`, which needs a runtime
/// context that is not a worker thread.
fn spawn_subscriber<R, S, A>(subscriber: Arc<ChangeSubscriber<R, S, A>>)
where
    R: stocksync_relay::Relay + Send + Sync + 'static,
    S: InventoryStore + 'static,
    A: AuditLog + 'static,
{
    tokio::task::spawn_blocking(move || subscriber.run());
}

impl AppServices {
    /// Apply one scan. Blocking (store + relay IO); handlers call this
    /// through `spawn_blocking`.
    pub fn scan(&self, request: ScanRequest) -> Result<ScanReceipt, ScanError> {
        match self {
            AppServices::InMemory { gateway, .. } => gateway.handle(request),
            #[cfg(feature = "persistent")]
            AppServices::Persistent { gateway, .. } => gateway.handle(request),
        }
    }

    pub fn warehouse_id(&self) -> &WarehouseId {
        match self {
            AppServices::InMemory { gateway, .. } => gateway.warehouse_id(),
            #[cfg(feature = "persistent")]
            AppServices::Persistent { gateway, .. } => gateway.warehouse_id(),
        }
    }

    pub fn peer_warehouse_id(&self) -> &WarehouseId {
        match self {
            AppServices::InMemory { peer_warehouse_id, .. } => peer_warehouse_id,
            #[cfg(feature = "persistent")]
            AppServices::Persistent { peer_warehouse_id, .. } => peer_warehouse_id,
        }
    }

    pub fn catalog_resolve(&self, barcode: &Barcode) -> Option<Product> {
        match self {
            AppServices::InMemory { catalog, .. } => catalog.resolve(barcode),
            #[cfg(feature = "persistent")]
            AppServices::Persistent { catalog, .. } => catalog.resolve(barcode),
        }
    }

    pub fn inventory_get(&self, barcode: &Barcode) -> InventoryRecord {
        let warehouse = self.warehouse_id().clone();
        match self {
            AppServices::InMemory { store, .. } => store.get(&warehouse, barcode),
            #[cfg(feature = "persistent")]
            AppServices::Persistent { store, .. } => store.get(&warehouse, barcode),
        }
    }

    pub fn inventory_list(&self) -> Vec<InventoryRecord> {
        let warehouse = self.warehouse_id().clone();
        match self {
            AppServices::InMemory { store, .. } => store.list(&warehouse),
            #[cfg(feature = "persistent")]
            AppServices::Persistent { store, .. } => store.list(&warehouse),
        }
    }

    /// Replica record for a remote warehouse; never authoritative.
    pub fn replica_get(&self, origin: &WarehouseId, barcode: &Barcode) -> InventoryRecord {
        match self {
            AppServices::InMemory { replica, .. } => replica.get(origin, barcode),
            #[cfg(feature = "persistent")]
            AppServices::Persistent { store, .. } => store.get(origin, barcode),
        }
    }

    pub fn audit_entries(&self, origin: &WarehouseId) -> Vec<AuditEntry> {
        match self {
            AppServices::InMemory { audit, .. } => audit.entries(origin),
            #[cfg(feature = "persistent")]
            AppServices::Persistent { audit, .. } => audit.entries(origin),
        }
    }

    pub fn replication_state(&self) -> SubscriberState {
        match self {
            AppServices::InMemory { subscriber, .. } => subscriber.state(),
            #[cfg(feature = "persistent")]
            AppServices::Persistent { subscriber, .. } => subscriber.state(),
        }
    }

    /// Cancel the background subscriber.
    pub fn shutdown(&self) {
        match self {
            AppServices::InMemory { shutdown, .. } => shutdown.cancel(),
            #[cfg(feature = "persistent")]
            AppServices::Persistent { shutdown, .. } => shutdown.cancel(),
        }
    }
}
