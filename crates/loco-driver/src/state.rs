//! 共享状态上下文与驱动层指标

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use loco_msgs::{Command, ContactState, ImuSample, TrimInput};

use crate::mailbox::Slot;

/// 驱动层共享状态上下文
///
/// 四个 last-value 槽位各自由一条 ingress 线程写入，控制线程按 tick 读取。
/// 控制线程独占的状态（步态参数、滤波缓冲、归一化统计）**不在**这里：
/// 那些状态只属于控制线程，不需要同步。
pub struct LocoContext {
    /// 最近一次操作者指令
    pub command: Arc<Slot<Command>>,
    /// 最近一次微调输入
    pub trim: Arc<Slot<TrimInput>>,
    /// 最近一次 IMU 采样（已做入口变换）
    pub imu: Arc<Slot<ImuSample>>,
    /// 最近一次足端接触状态
    pub contacts: Arc<Slot<ContactState>>,
}

impl Default for LocoContext {
    fn default() -> Self {
        Self {
            command: Arc::new(Slot::new(Command::default())),
            trim: Arc::new(Slot::new(TrimInput::default())),
            imu: Arc::new(Slot::new(ImuSample::default())),
            contacts: Arc::new(Slot::new(ContactState::default())),
        }
    }
}

/// 驱动层实时指标
///
/// 全部为原子计数器，任意线程可安全读取，无锁竞争。
#[derive(Debug, Default)]
pub struct DriverMetrics {
    /// 入口收到的消息总数（含被合并丢弃的）
    pub rx_messages_total: AtomicU64,

    /// latest-wins 合并时被覆盖丢弃的消息数
    ///
    /// 这个值增长是正常现象：说明上游发布频率高于消费节奏。
    pub rx_coalesced_dropped: AtomicU64,

    /// 入口变换拒绝的消息数（非法采样）
    pub ingest_rejected: AtomicU64,

    /// 成功发布的关节角结果数
    pub joint_sets_published: AtomicU64,

    /// 出口通道满时丢弃的最旧结果数
    pub egress_dropped_oldest: AtomicU64,
}

impl DriverMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取一致性较弱但足够监控用的快照
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            rx_messages_total: self.rx_messages_total.load(Ordering::Relaxed),
            rx_coalesced_dropped: self.rx_coalesced_dropped.load(Ordering::Relaxed),
            ingest_rejected: self.ingest_rejected.load(Ordering::Relaxed),
            joint_sets_published: self.joint_sets_published.load(Ordering::Relaxed),
            egress_dropped_oldest: self.egress_dropped_oldest.load(Ordering::Relaxed),
        }
    }
}

/// [`DriverMetrics`] 的普通数值快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub rx_messages_total: u64,
    pub rx_coalesced_dropped: u64,
    pub ingest_rejected: u64,
    pub joint_sets_published: u64,
    pub egress_dropped_oldest: u64,
}
