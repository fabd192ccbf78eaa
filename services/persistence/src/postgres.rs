//! Postgres store
//!
//! Runtime-checked `sqlx` queries over two relations, `orders` and
//! `trades`. Order rows are upserted on every transition keyed by
//! `order_id`; trade rows are inserted once and updated only by the
//! settlement transition. Timestamps are stored as `timestamptz` and
//! converted to Unix nanoseconds at this boundary.

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};
use std::time::Duration;

use crate::store::{OrderFilter, Page, PageResult, Store};
use types::ids::{OrderId, OwnerId, TradeId};
use types::time::{from_datetime, to_datetime};
use types::{EngineError, Order, OrderStatus, Price, Side, Trade};

const ORDER_COLUMNS: &str = "order_id, side, quantity, price_cents, remaining_quantity, \
     traded_quantity, traded_value_cents, status, is_active, owner_id, created_at, updated_at";

const TRADE_COLUMNS: &str =
    "trade_id, price_cents, quantity, bid_order_id, ask_order_id, executed_at, is_settled, settled_at";

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS orders (
        order_id UUID PRIMARY KEY,
        side SMALLINT NOT NULL,
        quantity BIGINT NOT NULL,
        price_cents BIGINT NOT NULL,
        remaining_quantity BIGINT NOT NULL,
        traded_quantity BIGINT NOT NULL,
        traded_value_cents NUMERIC NOT NULL,
        status TEXT NOT NULL,
        is_active BOOLEAN NOT NULL,
        owner_id UUID,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_orders_status ON orders (status)",
    "CREATE INDEX IF NOT EXISTS idx_orders_owner ON orders (owner_id)",
    "CREATE TABLE IF NOT EXISTS trades (
        trade_id UUID PRIMARY KEY,
        price_cents BIGINT NOT NULL,
        quantity BIGINT NOT NULL,
        bid_order_id UUID NOT NULL,
        ask_order_id UUID NOT NULL,
        executed_at TIMESTAMPTZ NOT NULL,
        is_settled BOOLEAN NOT NULL DEFAULT FALSE,
        settled_at TIMESTAMPTZ
    )",
    "CREATE INDEX IF NOT EXISTS idx_trades_executed_at ON trades (executed_at DESC)",
];

/// Postgres-backed [`Store`].
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and ensure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, EngineError> {
        let pool = PgPoolOptions::new()
            .max_connections(16)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await
            .map_err(storage_err)?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Idempotent schema bootstrap.
    pub async fn init_schema(&self) -> Result<(), EngineError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(storage_err)?;
        }
        Ok(())
    }
}

fn storage_err(err: sqlx::Error) -> EngineError {
    EngineError::Storage(err.to_string())
}

fn corrupt_row(what: &str) -> EngineError {
    EngineError::Storage(format!("corrupt row: {what}"))
}

fn row_to_order(row: &PgRow) -> Result<Order, EngineError> {
    let side_code: i16 = row.get("side");
    let status_text: String = row.get("status");
    let traded_value: Decimal = row.get("traded_value_cents");
    let owner: Option<uuid::Uuid> = row.get("owner_id");

    Ok(Order {
        order_id: OrderId::from_uuid(row.get("order_id")),
        side: Side::from_code(side_code).ok_or_else(|| corrupt_row("side"))?,
        quantity: row.get::<i64, _>("quantity") as u64,
        price: Price::try_from_cents(row.get("price_cents"))
            .map_err(|_| corrupt_row("price_cents"))?,
        remaining_quantity: row.get::<i64, _>("remaining_quantity") as u64,
        traded_quantity: row.get::<i64, _>("traded_quantity") as u64,
        traded_value_cents: traded_value
            .to_u128()
            .ok_or_else(|| corrupt_row("traded_value_cents"))?,
        status: OrderStatus::parse(&status_text).ok_or_else(|| corrupt_row("status"))?,
        is_active: row.get("is_active"),
        owner_id: owner.map(OwnerId::from_uuid),
        created_at: from_datetime(row.get("created_at")),
        updated_at: from_datetime(row.get("updated_at")),
    })
}

fn row_to_trade(row: &PgRow) -> Result<Trade, EngineError> {
    let settled_at: Option<chrono::DateTime<chrono::Utc>> = row.get("settled_at");

    Ok(Trade {
        trade_id: TradeId::from_uuid(row.get("trade_id")),
        price: Price::try_from_cents(row.get("price_cents"))
            .map_err(|_| corrupt_row("price_cents"))?,
        quantity: row.get::<i64, _>("quantity") as u64,
        bid_order_id: OrderId::from_uuid(row.get("bid_order_id")),
        ask_order_id: OrderId::from_uuid(row.get("ask_order_id")),
        executed_at: from_datetime(row.get("executed_at")),
        is_settled: row.get("is_settled"),
        settled_at: settled_at.map(from_datetime),
    })
}

fn push_order_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter) {
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(side) = filter.side {
        qb.push(" AND side = ").push_bind(side.as_code());
    }
    if let Some(owner) = filter.owner_id {
        qb.push(" AND owner_id = ").push_bind(*owner.as_uuid());
    }
}

#[async_trait]
impl Store for PgStore {
    async fn upsert_order(&self, order: &Order) -> Result<(), EngineError> {
        sqlx::query(
            "INSERT INTO orders (order_id, side, quantity, price_cents, remaining_quantity, \
             traded_quantity, traded_value_cents, status, is_active, owner_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             ON CONFLICT (order_id) DO UPDATE SET \
             price_cents = EXCLUDED.price_cents, \
             remaining_quantity = EXCLUDED.remaining_quantity, \
             traded_quantity = EXCLUDED.traded_quantity, \
             traded_value_cents = EXCLUDED.traded_value_cents, \
             status = EXCLUDED.status, \
             is_active = EXCLUDED.is_active, \
             updated_at = EXCLUDED.updated_at",
        )
        .bind(order.order_id.as_uuid())
        .bind(order.side.as_code())
        .bind(order.quantity as i64)
        .bind(order.price.as_cents())
        .bind(order.remaining_quantity as i64)
        .bind(order.traded_quantity as i64)
        .bind(Decimal::from_i128_with_scale(
            order.traded_value_cents as i128,
            0,
        ))
        .bind(order.status.as_str())
        .bind(order.is_active)
        .bind(order.owner_id.map(|o| *o.as_uuid()))
        .bind(to_datetime(order.created_at))
        .bind(to_datetime(order.updated_at))
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn insert_trade(&self, trade: &Trade) -> Result<(), EngineError> {
        sqlx::query(
            "INSERT INTO trades (trade_id, price_cents, quantity, bid_order_id, ask_order_id, \
             executed_at, is_settled, settled_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (trade_id) DO NOTHING",
        )
        .bind(trade.trade_id.as_uuid())
        .bind(trade.price.as_cents())
        .bind(trade.quantity as i64)
        .bind(trade.bid_order_id.as_uuid())
        .bind(trade.ask_order_id.as_uuid())
        .bind(to_datetime(trade.executed_at))
        .bind(trade.is_settled)
        .bind(trade.settled_at.map(to_datetime))
        .execute(&self.pool)
        .await
        .map_err(storage_err)?;
        Ok(())
    }

    async fn get_order(&self, order_id: OrderId) -> Result<Option<Order>, EngineError> {
        let row = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1"
        ))
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;
        row.as_ref().map(row_to_order).transpose()
    }

    async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: Page,
    ) -> Result<PageResult<Order>, EngineError> {
        let mut count_query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM orders WHERE TRUE");
        push_order_filters(&mut count_query, filter);
        let total_count: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;

        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE TRUE"
        ));
        push_order_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC, order_id DESC LIMIT ")
            .push_bind(i64::from(page.page_size))
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(storage_err)?;
        let items = rows
            .iter()
            .map(row_to_order)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageResult {
            items,
            page: page.page,
            page_size: page.page_size,
            total_count: total_count as u64,
        })
    }

    async fn get_trade(&self, trade_id: TradeId) -> Result<Option<Trade>, EngineError> {
        let row = sqlx::query(&format!(
            "SELECT {TRADE_COLUMNS} FROM trades WHERE trade_id = $1"
        ))
        .bind(trade_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;
        row.as_ref().map(row_to_trade).transpose()
    }

    async fn list_trades(&self, page: Page) -> Result<PageResult<Trade>, EngineError> {
        let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM trades")
            .fetch_one(&self.pool)
            .await
            .map_err(storage_err)?;

        let rows = sqlx::query(&format!(
            "SELECT {TRADE_COLUMNS} FROM trades \
             ORDER BY executed_at DESC, trade_id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(page.page_size))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;
        let items = rows
            .iter()
            .map(row_to_trade)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageResult {
            items,
            page: page.page,
            page_size: page.page_size,
            total_count: total_count as u64,
        })
    }

    async fn settle_trade(&self, trade_id: TradeId, timestamp: i64) -> Result<Trade, EngineError> {
        let row = sqlx::query(&format!(
            "UPDATE trades SET is_settled = TRUE, settled_at = $2 \
             WHERE trade_id = $1 AND is_settled = FALSE \
             RETURNING {TRADE_COLUMNS}"
        ))
        .bind(trade_id.as_uuid())
        .bind(to_datetime(timestamp))
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_err)?;

        match row {
            Some(row) => row_to_trade(&row),
            None => {
                // Either already settled or unknown; look again to tell apart
                let existing = self.get_trade(trade_id).await?;
                match existing {
                    Some(_) => Err(EngineError::StateConflict(format!(
                        "trade {trade_id} already settled"
                    ))),
                    None => Err(EngineError::TradeNotFound(trade_id.to_string())),
                }
            }
        }
    }

    async fn open_orders(&self) -> Result<Vec<Order>, EngineError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE status IN ('ACTIVE', 'PARTIALLY_FILLED') \
             ORDER BY created_at ASC, order_id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(storage_err)?;
        rows.iter().map(row_to_order).collect()
    }
}
