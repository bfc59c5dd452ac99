//! 固定間隔的訂單狀態輪詢。
//!
//! 儀表板與直購流程共用同一個迴圈，只有間隔不同。每個 tick 依序
//! 等待完成後才會排下一個 tick，因此同一個目標不會有重疊的刷新。
//! 到達終止狀態或收到取消訊號就停止；單次失敗只記錄，下一個 tick 繼續。

use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// 儀表板批次刷新間隔
pub const DASHBOARD_POLL_INTERVAL: Duration = Duration::from_secs(10);
/// 直購單一訂單檢查間隔
pub const DIRECT_POLL_INTERVAL: Duration = Duration::from_secs(5);

#[async_trait]
pub trait PollTarget: Send {
    /// 已無需再輪詢（所有訂單皆為 received / cancelled）
    fn is_settled(&self) -> bool;

    /// 一次刷新；錯誤由迴圈記錄後吞掉
    async fn poll_once(&mut self) -> Result<()>;

    fn label(&self) -> &str {
        "order"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollExit {
    Settled,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PollStats {
    pub ticks: u32,
    pub failures: u32,
}

/// 擁有者持有，丟棄或呼叫 `cancel` 都會停止輪詢
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

pub fn cancellation() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// 等到取消或 handle 被丟棄
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// 以 `period` 為間隔輪詢，第一次請求在一個間隔之後
pub async fn poll_until_settled<T: PollTarget + ?Sized>(
    target: &mut T,
    period: Duration,
    mut cancel: CancelSignal,
) -> (PollExit, PollStats) {
    let mut stats = PollStats::default();
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        if target.is_settled() {
            tracing::debug!("{} polling settled after {} ticks", target.label(), stats.ticks);
            return (PollExit::Settled, stats);
        }
        if cancel.is_cancelled() {
            return (PollExit::Cancelled, stats);
        }

        tokio::select! {
            _ = ticker.tick() => {
                stats.ticks += 1;
                if let Err(e) = target.poll_once().await {
                    stats.failures += 1;
                    tracing::warn!("{} status check failed: {}", target.label(), e);
                }
            }
            _ = cancel.cancelled() => {
                tracing::debug!("{} polling cancelled after {} ticks", target.label(), stats.ticks);
                return (PollExit::Cancelled, stats);
            }
        }
    }
}
