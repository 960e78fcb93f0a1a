//! Postgres-backed inventory ledger and audit log.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE inventory_records (
//!     warehouse_id TEXT        NOT NULL,
//!     barcode      TEXT        NOT NULL,
//!     quantity     BIGINT      NOT NULL DEFAULT 0 CHECK (quantity >= 0),
//!     updated_at   TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (warehouse_id, barcode)
//! );
//!
//! CREATE TABLE audit_log (
//!     id               BIGSERIAL   PRIMARY KEY,
//!     origin_warehouse TEXT        NOT NULL,
//!     barcode          TEXT        NOT NULL,
//!     product_name     TEXT        NOT NULL,
//!     quantity         BIGINT      NOT NULL,
//!     action           TEXT        NOT NULL,
//!     received_at      TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! The traits are synchronous; queries run via
//! `Handle::try_current().block_on`, so callers must sit on a blocking
//! thread (`spawn_blocking`), never on a runtime worker.

use std::str::FromStr;
use std::sync::Arc;

use sqlx::{PgPool, Row};

use stocksync_core::{Barcode, ScanAction, WarehouseId};
use stocksync_store::{AuditEntry, AuditLog, InventoryRecord, InventoryStore, StoreError};

/// Postgres-backed ledger.
///
/// Atomicity of `apply` is the database's: the row is row-locked by the
/// guarded UPDATE, so concurrent appliers on one (warehouse, barcode)
/// serialize and the quantity check cannot race the write.
pub struct PostgresInventoryStore {
    pool: Arc<PgPool>,
}

impl PostgresInventoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

impl InventoryStore for PostgresInventoryStore {
    fn get(&self, warehouse_id: &WarehouseId, barcode: &Barcode) -> InventoryRecord {
        let zero = InventoryRecord::zero(warehouse_id.clone(), barcode.clone());

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(h) => h,
            Err(_) => return zero,
        };

        let pool = self.pool.clone();
        let warehouse = warehouse_id.as_str().to_string();
        let code = barcode.as_str().to_string();

        handle.block_on(async {
            match sqlx::query(
                r#"
                SELECT quantity
                FROM inventory_records
                WHERE warehouse_id = $1 AND barcode = $2
                "#,
            )
            .bind(&warehouse)
            .bind(&code)
            .fetch_optional(&*pool)
            .await
            {
                Ok(Some(row)) => match row.try_get::<i64, _>("quantity") {
                    Ok(quantity) => InventoryRecord {
                        barcode: zero.barcode.clone(),
                        warehouse_id: zero.warehouse_id.clone(),
                        quantity,
                    },
                    Err(_) => zero,
                },
                Ok(None) => zero,
                Err(_) => zero,
            }
        })
    }

    fn apply(
        &self,
        warehouse_id: &WarehouseId,
        barcode: &Barcode,
        action: ScanAction,
        quantity: i64,
    ) -> Result<InventoryRecord, StoreError> {
        let delta = action.signed_delta(quantity);

        let handle = tokio::runtime::Handle::try_current()
            .map_err(|_| StoreError::Backend("no tokio runtime".to_string()))?;

        let pool = self.pool.clone();
        let warehouse = warehouse_id.as_str().to_string();
        let code = barcode.as_str().to_string();

        let applied: Result<Option<i64>, sqlx::Error> = handle.block_on(async {
            let mut tx = pool.begin().await?;

            // Ensure the row exists at quantity 0, then update behind the
            // non-negativity guard. The UPDATE row-locks, serializing
            // same-key appliers.
            sqlx::query(
                r#"
                INSERT INTO inventory_records (warehouse_id, barcode, quantity)
                VALUES ($1, $2, 0)
                ON CONFLICT (warehouse_id, barcode) DO NOTHING
                "#,
            )
            .bind(&warehouse)
            .bind(&code)
            .execute(&mut *tx)
            .await?;

            let row = sqlx::query(
                r#"
                UPDATE inventory_records
                SET quantity = quantity + $3, updated_at = NOW()
                WHERE warehouse_id = $1 AND barcode = $2 AND quantity + $3 >= 0
                RETURNING quantity
                "#,
            )
            .bind(&warehouse)
            .bind(&code)
            .bind(delta)
            .fetch_optional(&mut *tx)
            .await?;

            match row {
                Some(row) => {
                    let quantity: i64 = row.try_get("quantity")?;
                    tx.commit().await?;
                    Ok(Some(quantity))
                }
                None => {
                    tx.rollback().await?;
                    Ok(None)
                }
            }
        });

        match applied {
            Ok(Some(new_quantity)) => Ok(InventoryRecord {
                barcode: barcode.clone(),
                warehouse_id: warehouse_id.clone(),
                quantity: new_quantity,
            }),
            Ok(None) => {
                let available = self.get(warehouse_id, barcode).quantity;
                Err(StoreError::InsufficientStock {
                    barcode: barcode.clone(),
                    warehouse_id: warehouse_id.clone(),
                    available,
                    requested: -delta,
                })
            }
            Err(e) => Err(StoreError::Backend(e.to_string())),
        }
    }

    fn list(&self, warehouse_id: &WarehouseId) -> Vec<InventoryRecord> {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(h) => h,
            Err(_) => return vec![],
        };

        let pool = self.pool.clone();
        let warehouse = warehouse_id.as_str().to_string();
        let warehouse_id = warehouse_id.clone();

        handle.block_on(async {
            match sqlx::query(
                r#"
                SELECT barcode, quantity
                FROM inventory_records
                WHERE warehouse_id = $1
                ORDER BY updated_at DESC
                "#,
            )
            .bind(&warehouse)
            .fetch_all(&*pool)
            .await
            {
                Ok(rows) => rows
                    .into_iter()
                    .filter_map(|row| {
                        let code: String = row.try_get("barcode").ok()?;
                        let quantity: i64 = row.try_get("quantity").ok()?;
                        Some(InventoryRecord {
                            barcode: Barcode::new(code).ok()?,
                            warehouse_id: warehouse_id.clone(),
                            quantity,
                        })
                    })
                    .collect(),
                Err(_) => vec![],
            }
        })
    }
}

/// Postgres-backed audit log. Receipt order is the serial `id`.
pub struct PostgresAuditLog {
    pool: Arc<PgPool>,
}

impl PostgresAuditLog {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

impl AuditLog for PostgresAuditLog {
    fn append(&self, origin: &WarehouseId, entry: AuditEntry) {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(h) => h,
            Err(_) => return,
        };

        let pool = self.pool.clone();
        let origin = origin.as_str().to_string();

        let _ = handle.block_on(async {
            sqlx::query(
                r#"
                INSERT INTO audit_log (
                    origin_warehouse,
                    barcode,
                    product_name,
                    quantity,
                    action,
                    received_at
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(&origin)
            .bind(entry.barcode.as_str())
            .bind(&entry.product_name)
            .bind(entry.quantity)
            .bind(entry.action.as_str())
            .bind(entry.received_at)
            .execute(&*pool)
            .await
        });
    }

    fn entries(&self, origin: &WarehouseId) -> Vec<AuditEntry> {
        let handle = match tokio::runtime::Handle::try_current() {
            Ok(h) => h,
            Err(_) => return vec![],
        };

        let pool = self.pool.clone();
        let origin = origin.as_str().to_string();

        handle.block_on(async {
            match sqlx::query(
                r#"
                SELECT barcode, product_name, quantity, action, received_at
                FROM audit_log
                WHERE origin_warehouse = $1
                ORDER BY id
                "#,
            )
            .bind(&origin)
            .fetch_all(&*pool)
            .await
            {
                Ok(rows) => rows
                    .into_iter()
                    .filter_map(|row| {
                        let code: String = row.try_get("barcode").ok()?;
                        let action: String = row.try_get("action").ok()?;
                        Some(AuditEntry {
                            barcode: Barcode::new(code).ok()?,
                            product_name: row.try_get("product_name").ok()?,
                            quantity: row.try_get("quantity").ok()?,
                            action: ScanAction::from_str(&action).ok()?,
                            received_at: row.try_get("received_at").ok()?,
                        })
                    })
                    .collect(),
                Err(_) => vec![],
            }
        })
    }
}
