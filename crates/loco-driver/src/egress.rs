//! 出口发布通道
//!
//! 控制线程每个完成的 tick 发布一次结果。发布端绝不阻塞：
//! 通道满时丢弃**最旧**的一条再写入，慢速订阅者只会看到跳帧，
//! 不会拖慢 600Hz 控制循环。

use std::sync::Arc;
use std::sync::atomic::Ordering;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use tracing::trace;

use crate::state::DriverMetrics;

/// Latest-wins 发布器
///
/// 发布端同时持有收端句柄，用于在通道满时弹出最旧值（drop-oldest）。
/// 订阅者通过 [`LatestPublisher::subscribe`] 克隆收端。
pub struct LatestPublisher<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
    metrics: Arc<DriverMetrics>,
}

impl<T> LatestPublisher<T> {
    /// 创建容量为 `capacity` 的发布通道
    ///
    /// 容量必须大于 0；控制循环一般用小容量（默认 8）。
    pub fn new(capacity: usize, metrics: Arc<DriverMetrics>) -> Self {
        let (tx, rx) = bounded(capacity);
        Self { tx, rx, metrics }
    }

    /// 非阻塞发布
    ///
    /// 通道满时弹出最旧的一条为新值腾位。第二次 `try_send` 仍失败
    /// 只可能是并发订阅者抢先填满，此时丢弃新值并计数。
    pub fn publish(&self, value: T) {
        match self.tx.try_send(value) {
            Ok(()) => {},
            Err(TrySendError::Full(value)) => {
                let _ = self.rx.try_recv();
                self.metrics.egress_dropped_oldest.fetch_add(1, Ordering::Relaxed);
                if self.tx.try_send(value).is_err() {
                    trace!("Egress still full after drop-oldest, result discarded");
                }
            },
            Err(TrySendError::Disconnected(_)) => {
                // 发布器自身持有收端，通道不可能断开；保守起见静默忽略
            },
        }
    }

    /// 订阅出口通道
    pub fn subscribe(&self) -> Receiver<T> {
        self.rx.clone()
    }
}
