//! Last-value 邮箱与 ingress 消费循环
//!
//! 每条入口通道对应一个 [`Slot`]：写端是该通道的消费线程，读端是控制线程。
//! 写入是整体 `ArcSwap` 交换（带时间戳），读取是 wait-free 的快照加载，
//! 多字段读取不会在并发写入时撕裂。
//!
//! # Last-value 语义
//!
//! 消费线程在每次唤醒时把通道里积压的消息全部排空，只保留最新一条。
//! 两个 tick 之间到达的多条更新会被合并；比 tick 率更快的更新会被丢弃。
//! 这是 at-most-once、latest-wins 的消费模型，不是队列。
//!
//! # 入口错误
//!
//! 入口变换（`map`）失败的消息被记录并丢弃，槽位保留上一个有效值，
//! 错误永远不会传播进控制循环。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use loco_msgs::MsgError;
use tracing::{debug, trace, warn};

use crate::state::DriverMetrics;

/// 消费线程空转时的轮询周期（用于检查停机标志）
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// 带时间戳的槽位内容
///
/// `at == None` 表示该槽位从未被写入过（仍是上电默认值）。
#[derive(Debug, Clone)]
pub struct Stamped<T> {
    pub value: T,
    pub at: Option<Instant>,
}

/// Last-value 状态槽
///
/// 单写单读：写端是 ingress 线程，读端是控制线程。
pub struct Slot<T> {
    inner: ArcSwap<Stamped<T>>,
}

impl<T: Clone> Slot<T> {
    /// 用上电默认值初始化（时间戳为空）
    pub fn new(initial: T) -> Self {
        Self {
            inner: ArcSwap::from_pointee(Stamped {
                value: initial,
                at: None,
            }),
        }
    }

    /// 整体交换新值并盖上当前时间戳
    pub fn store(&self, value: T) {
        self.inner.store(Arc::new(Stamped {
            value,
            at: Some(Instant::now()),
        }));
    }

    /// 加载当前快照（wait-free）
    pub fn load(&self) -> Arc<Stamped<T>> {
        self.inner.load_full()
    }

    /// 当前值的副本
    pub fn value(&self) -> T {
        self.inner.load().value.clone()
    }

    /// 距上次写入的时长；从未写入过则返回 `None`
    pub fn age(&self) -> Option<Duration> {
        self.inner.load().at.map(|at| at.elapsed())
    }
}

/// Ingress 消费循环
///
/// 阻塞运行直到 `running` 置 false 或发送端全部断开。
/// 每次唤醒排空通道，只对最新一条消息执行入口变换 `map` 并写入槽位。
pub fn ingress_loop<M, T, F>(
    name: &'static str,
    rx: Receiver<M>,
    slot: Arc<Slot<T>>,
    map: F,
    running: Arc<AtomicBool>,
    metrics: Arc<DriverMetrics>,
) where
    M: Send,
    T: Clone,
    F: Fn(M) -> Result<T, MsgError>,
{
    while running.load(Ordering::Relaxed) {
        let mut newest = match rx.recv_timeout(POLL_INTERVAL) {
            Ok(msg) => msg,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                debug!("Ingress `{}`: all senders disconnected, exiting", name);
                return;
            },
        };
        metrics.rx_messages_total.fetch_add(1, Ordering::Relaxed);

        // 排空积压：latest-wins，被覆盖的消息计入 coalesced
        while let Ok(msg) = rx.try_recv() {
            metrics.rx_messages_total.fetch_add(1, Ordering::Relaxed);
            metrics.rx_coalesced_dropped.fetch_add(1, Ordering::Relaxed);
            newest = msg;
        }

        match map(newest) {
            Ok(value) => {
                slot.store(value);
                trace!("Ingress `{}`: slot updated", name);
            },
            Err(e) => {
                // 保留上一个有效值，错误不进入控制循环
                metrics.ingest_rejected.fetch_add(1, Ordering::Relaxed);
                warn!("Ingress `{}`: sample rejected: {}. Keeping last value.", name, e);
            },
        }
    }
    debug!("Ingress `{}`: shutdown flag observed, exiting", name);
}
