//! Engine-owned trade store with per-trade lifecycle locks

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, RwLock};

use super::{Trade, TradeStatus};
use crate::shared::errors::TradeError;

/// One stored trade.
///
/// `lifecycle` serialises execute and cancel; `trade` is only write-locked
/// for short in-memory updates, never across adapter calls.
pub(crate) struct TradeSlot {
    lifecycle: Mutex<()>,
    trade: RwLock<Trade>,
}

impl TradeSlot {
    fn new(trade: Trade) -> Self {
        Self {
            lifecycle: Mutex::new(()),
            trade: RwLock::new(trade),
        }
    }

    pub async fn lock_lifecycle(&self) -> MutexGuard<'_, ()> {
        self.lifecycle.lock().await
    }

    pub async fn snapshot(&self) -> Trade {
        self.trade.read().await.clone()
    }

    pub async fn update<R>(&self, apply: impl FnOnce(&mut Trade) -> R) -> R {
        let mut trade = self.trade.write().await;
        apply(&mut trade)
    }
}

#[derive(Default)]
pub(crate) struct TradeStore {
    trades: RwLock<HashMap<String, Arc<TradeSlot>>>,
}

impl TradeStore {
    pub async fn insert(&self, trade: Trade) {
        let id = trade.id.clone();
        self.trades.write().await.insert(id, Arc::new(TradeSlot::new(trade)));
    }

    pub async fn slot(&self, trade_id: &str) -> Result<Arc<TradeSlot>, TradeError> {
        self.trades
            .read()
            .await
            .get(trade_id)
            .cloned()
            .ok_or_else(|| TradeError::TradeNotFound(trade_id.to_string()))
    }

    pub async fn get(&self, trade_id: &str) -> Result<Trade, TradeError> {
        Ok(self.slot(trade_id).await?.snapshot().await)
    }

    /// Every trade, oldest first
    pub async fn list(&self) -> Vec<Trade> {
        let slots: Vec<Arc<TradeSlot>> = self.trades.read().await.values().cloned().collect();
        let mut trades = Vec::with_capacity(slots.len());
        for slot in slots {
            trades.push(slot.snapshot().await);
        }
        trades.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        trades
    }

    pub async fn list_where(&self, keep: impl Fn(&TradeStatus) -> bool) -> Vec<Trade> {
        self.list().await.into_iter().filter(|trade| keep(&trade.status)).collect()
    }
}
