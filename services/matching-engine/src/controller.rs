//! Book controller — the serialized mutation lane
//!
//! All intake, modification, and cancellation flows through one tokio task
//! that owns the book outright. Requests arrive on an mpsc channel and are
//! applied strictly in acceptance order, so the effective execution order
//! is the channel order and snapshots taken between commands are always a
//! prefix of the operation log. The kernel itself never blocks; the only
//! suspension points are lane ingress and the write-through to storage.
//!
//! Persistence policy: every touched record is written through with
//! bounded-backoff retry. Failures on non-terminal records are absorbed —
//! the in-memory book stays authoritative — while failures on terminal
//! records (fills, cancels, trades) surface to the caller. A kernel panic
//! kills the lane; on restart the book is rebuilt from persisted open
//! orders.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::book::{Book, DepthSnapshot};
use crate::matching::kernel::{self, MatchOutcome};
use persistence::retry::with_backoff;
use persistence::Store;
use types::order::MAX_QUANTITY;
use types::time::now_nanos;
use types::{EngineError, Order, OrderId, OwnerId, Price, Side, Trade};

const COMMAND_BUFFER: usize = 256;
const TRADE_RETENTION: usize = 4096;
const PERSIST_ATTEMPTS: u32 = 3;
const PERSIST_BASE_DELAY: Duration = Duration::from_millis(25);

/// Validated-at-the-edge order placement request.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub side: Side,
    pub quantity: u64,
    pub price: Price,
    pub owner_id: Option<OwnerId>,
}

enum Command {
    Place {
        request: PlaceOrder,
        reply: oneshot::Sender<Result<Order, EngineError>>,
    },
    Modify {
        order_id: OrderId,
        new_price: Price,
        reply: oneshot::Sender<Result<Order, EngineError>>,
    },
    Cancel {
        order_id: OrderId,
        reply: oneshot::Sender<Result<Order, EngineError>>,
    },
    Depth {
        depth: usize,
        reply: oneshot::Sender<DepthSnapshot>,
    },
    TradesSince {
        cursor: u64,
        reply: oneshot::Sender<(u64, Vec<Trade>)>,
    },
}

/// Cloneable handle for submitting commands to the lane.
#[derive(Clone)]
pub struct BookHandle {
    tx: mpsc::Sender<Command>,
}

impl BookHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, EngineError> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| EngineError::Unavailable("book lane is not running".into()))?;
        response
            .await
            .map_err(|_| EngineError::Unavailable("book lane dropped the request".into()))
    }

    /// Place a new order; the reply carries the post-match record.
    pub async fn place(&self, request: PlaceOrder) -> Result<Order, EngineError> {
        self.request(|reply| Command::Place { request, reply })
            .await?
    }

    /// Change the price of an active order, forfeiting its queue priority.
    pub async fn modify(
        &self,
        order_id: OrderId,
        new_price: Price,
    ) -> Result<Order, EngineError> {
        self.request(|reply| Command::Modify {
            order_id,
            new_price,
            reply,
        })
        .await?
    }

    /// Cancel an active order, freezing its quantities.
    pub async fn cancel(&self, order_id: OrderId) -> Result<Order, EngineError> {
        self.request(|reply| Command::Cancel { order_id, reply })
            .await?
    }

    /// Lane-consistent aggregated depth snapshot.
    pub async fn depth(&self, depth: usize) -> Result<DepthSnapshot, EngineError> {
        self.request(|reply| Command::Depth { depth, reply }).await
    }

    /// Trades recorded after `cursor`, plus the new cursor value.
    pub async fn trades_since(&self, cursor: u64) -> Result<(u64, Vec<Trade>), EngineError> {
        self.request(|reply| Command::TradesSince { cursor, reply })
            .await
    }
}

/// Start the lane: rebuild the book from persisted open orders, then spawn
/// the command loop.
pub async fn spawn(store: Arc<dyn Store>) -> Result<BookHandle, EngineError> {
    let open_orders = store.open_orders().await?;
    let controller = BookController::new(store, open_orders);
    let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
    tokio::spawn(controller.run(rx));
    Ok(BookHandle { tx })
}

struct BookController {
    book: Book,
    store: Arc<dyn Store>,
    /// Bounded suffix of recent trades for the streaming feed
    recent_trades: VecDeque<Trade>,
    /// Total trades recorded since start; doubles as the feed cursor
    trade_count: u64,
    /// Last issued timestamp; the lane clock never repeats or runs backward
    last_timestamp: i64,
}

impl BookController {
    fn new(store: Arc<dyn Store>, open_orders: Vec<Order>) -> Self {
        let mut book = Book::new();
        let mut last_timestamp = 0;
        let restored = open_orders.len();
        for order in open_orders {
            last_timestamp = last_timestamp.max(order.updated_at);
            book.insert(order);
        }
        if restored > 0 {
            tracing::info!(restored, "rebuilt book from persisted open orders");
        }
        Self {
            book,
            store,
            recent_trades: VecDeque::new(),
            trade_count: 0,
            last_timestamp,
        }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        tracing::info!(resting = self.book.len(), "book lane started");
        while let Some(command) = rx.recv().await {
            match command {
                Command::Place { request, reply } => {
                    let _ = reply.send(self.handle_place(request).await);
                }
                Command::Modify {
                    order_id,
                    new_price,
                    reply,
                } => {
                    let _ = reply.send(self.handle_modify(order_id, new_price).await);
                }
                Command::Cancel { order_id, reply } => {
                    let _ = reply.send(self.handle_cancel(order_id).await);
                }
                Command::Depth { depth, reply } => {
                    let _ = reply.send(self.book.depth(depth));
                }
                Command::TradesSince { cursor, reply } => {
                    let _ = reply.send(self.trades_since(cursor));
                }
            }
        }
        tracing::info!("book lane stopped");
    }

    /// Monotonic lane clock in Unix nanoseconds.
    fn next_timestamp(&mut self) -> i64 {
        self.last_timestamp = now_nanos().max(self.last_timestamp + 1);
        self.last_timestamp
    }

    async fn handle_place(&mut self, request: PlaceOrder) -> Result<Order, EngineError> {
        let timestamp = self.next_timestamp();
        let mut order = Order::new(
            request.side,
            request.quantity,
            request.price,
            request.owner_id,
            timestamp,
        );

        if let Err(reason) = validate_place(&request) {
            order.reject(timestamp);
            if let Err(err) = self.store.upsert_order(&order).await {
                tracing::warn!(order_id = %order.order_id, error = %err, "failed to persist rejected order");
            }
            tracing::info!(order_id = %order.order_id, %reason, "order rejected");
            return Err(reason);
        }

        order.activate(timestamp);
        let order_id = order.order_id;
        let outcome = kernel::match_order(&mut self.book, order, timestamp);
        tracing::info!(
            %order_id,
            trades = outcome.trades.len(),
            status = outcome.taker.status.as_str(),
            "order placed"
        );

        self.record_trades(&outcome.trades);
        self.persist_outcome(&outcome).await?;
        Ok(outcome.taker)
    }

    async fn handle_modify(
        &mut self,
        order_id: OrderId,
        new_price: Price,
    ) -> Result<Order, EngineError> {
        let Some(mut order) = self.book.remove(&order_id) else {
            return Err(self.missing_order(order_id).await);
        };

        let timestamp = self.next_timestamp();
        order.price = new_price;
        order.updated_at = timestamp;

        // Re-admission with the remaining quantity goes to the tail of the
        // new level and may immediately cross
        let outcome = kernel::match_order(&mut self.book, order, timestamp);
        tracing::info!(
            %order_id,
            new_price = %new_price,
            trades = outcome.trades.len(),
            "order modified"
        );

        self.record_trades(&outcome.trades);
        self.persist_outcome(&outcome).await?;
        Ok(outcome.taker)
    }

    async fn handle_cancel(&mut self, order_id: OrderId) -> Result<Order, EngineError> {
        let Some(mut order) = self.book.remove(&order_id) else {
            return Err(self.missing_order(order_id).await);
        };

        let timestamp = self.next_timestamp();
        order.cancel(timestamp);
        tracing::info!(%order_id, remaining = order.remaining_quantity, "order cancelled");

        self.persist_order(&order).await?;
        Ok(order)
    }

    /// Classify a modify/cancel miss: known but not resting is a state
    /// conflict, otherwise not found.
    async fn missing_order(&self, order_id: OrderId) -> EngineError {
        match self.store.get_order(order_id).await {
            Ok(Some(_)) => {
                EngineError::StateConflict(format!("order {order_id} is not active"))
            }
            Ok(None) => EngineError::OrderNotFound(order_id.to_string()),
            Err(err) => err,
        }
    }

    fn record_trades(&mut self, trades: &[Trade]) {
        for trade in trades {
            self.recent_trades.push_back(trade.clone());
            self.trade_count += 1;
        }
        while self.recent_trades.len() > TRADE_RETENTION {
            self.recent_trades.pop_front();
        }
    }

    fn trades_since(&self, cursor: u64) -> (u64, Vec<Trade>) {
        let first_retained = self.trade_count - self.recent_trades.len() as u64;
        let start = cursor.clamp(first_retained, self.trade_count);
        let skip = (start - first_retained) as usize;
        let trades = self.recent_trades.iter().skip(skip).cloned().collect();
        (self.trade_count, trades)
    }

    async fn persist_outcome(&self, outcome: &MatchOutcome) -> Result<(), EngineError> {
        // Order rows first so trade rows never reference unknown orders
        self.persist_order(&outcome.taker).await?;
        for maker in &outcome.maker_updates {
            self.persist_order(maker).await?;
        }
        for trade in &outcome.trades {
            self.persist_trade(trade).await?;
        }
        Ok(())
    }

    /// Write an order through with retry. Exhaustion on a terminal record
    /// is surfaced; otherwise the book stays authoritative and the write is
    /// dropped with a warning.
    async fn persist_order(&self, order: &Order) -> Result<(), EngineError> {
        let result = with_backoff(PERSIST_ATTEMPTS, PERSIST_BASE_DELAY, || {
            self.store.upsert_order(order)
        })
        .await;

        match result {
            Ok(()) => Ok(()),
            Err(err) if order.status.is_terminal() => {
                tracing::error!(order_id = %order.order_id, error = %err, "terminal order write failed");
                Err(err)
            }
            Err(err) => {
                tracing::warn!(
                    order_id = %order.order_id,
                    error = %err,
                    "order write dropped; in-memory book remains authoritative"
                );
                Ok(())
            }
        }
    }

    async fn persist_trade(&self, trade: &Trade) -> Result<(), EngineError> {
        with_backoff(PERSIST_ATTEMPTS, PERSIST_BASE_DELAY, || {
            self.store.insert_trade(trade)
        })
        .await
        .map_err(|err| {
            tracing::error!(trade_id = %trade.trade_id, error = %err, "trade write failed");
            err
        })
    }
}

fn validate_place(request: &PlaceOrder) -> Result<(), EngineError> {
    if request.quantity == 0 {
        return Err(EngineError::Validation(
            "quantity must be a positive integer".into(),
        ));
    }
    if request.quantity > MAX_QUANTITY {
        return Err(EngineError::Validation(format!(
            "quantity exceeds maximum of {MAX_QUANTITY}"
        )));
    }
    // Price bounds and tick size are enforced by the Price type itself
    Ok(())
}
