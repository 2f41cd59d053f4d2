//! Builder 模式实现
//!
//! 链式构造 [`LocoDriver`]：创建共享状态上下文、出口通道，
//! 并为四条入口通道各启动一个消费线程。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, bounded};
use loco_msgs::{Command, ContactState, ImuSample, JointAngleSet, MsgError, RawImu, TrimInput};
use tracing::{debug, info};

use crate::egress::LatestPublisher;
use crate::error::DriverError;
use crate::mailbox::{Slot, ingress_loop};
use crate::observer::Observer;
use crate::state::{DriverMetrics, LocoContext, MetricsSnapshot};

/// 入口通道发送端集合
///
/// 交给外部传输层（遥操作桥、传感器桥）持有；全部发送端被 drop 后
/// 对应的消费线程自行退出。
pub struct IngressSenders {
    pub command: Sender<Command>,
    pub trim: Sender<TrimInput>,
    /// IMU 通道携带**原始**采样，入口变换（度→弧度、重力补偿）在消费线程完成
    pub imu: Sender<RawImu>,
    pub contacts: Sender<ContactState>,
}

/// LocoDriver Builder（链式构造）
///
/// # Example
///
/// ```
/// use loco_driver::LocoDriverBuilder;
///
/// let (driver, senders) = LocoDriverBuilder::new()
///     .ingress_capacity(8)
///     .egress_capacity(8)
///     .build()
///     .unwrap();
/// # drop(senders);
/// # drop(driver);
/// ```
pub struct LocoDriverBuilder {
    ingress_capacity: usize,
    egress_capacity: usize,
}

impl Default for LocoDriverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LocoDriverBuilder {
    pub fn new() -> Self {
        Self {
            ingress_capacity: 8,
            egress_capacity: 8,
        }
    }

    /// 入口通道容量（每条通道独立）
    pub fn ingress_capacity(mut self, capacity: usize) -> Self {
        self.ingress_capacity = capacity;
        self
    }

    /// 出口通道容量
    pub fn egress_capacity(mut self, capacity: usize) -> Self {
        self.egress_capacity = capacity;
        self
    }

    /// 构建驱动并启动 ingress 线程
    pub fn build(self) -> Result<(LocoDriver, IngressSenders), DriverError> {
        if self.ingress_capacity == 0 {
            return Err(DriverError::InvalidConfig(
                "ingress_capacity must be > 0".to_string(),
            ));
        }
        if self.egress_capacity == 0 {
            return Err(DriverError::InvalidConfig(
                "egress_capacity must be > 0".to_string(),
            ));
        }

        let ctx = Arc::new(LocoContext::default());
        let metrics = Arc::new(DriverMetrics::new());
        let running = Arc::new(AtomicBool::new(true));

        let (cmd_tx, cmd_rx) = bounded(self.ingress_capacity);
        let (trim_tx, trim_rx) = bounded(self.ingress_capacity);
        let (imu_tx, imu_rx) = bounded(self.ingress_capacity);
        let (cnt_tx, cnt_rx) = bounded(self.ingress_capacity);

        let threads = vec![
            spawn_ingress(
                "command",
                cmd_rx,
                Arc::clone(&ctx.command),
                |cmd: Command| Ok(cmd),
                &running,
                &metrics,
            )?,
            spawn_ingress(
                "trim",
                trim_rx,
                Arc::clone(&ctx.trim),
                |trim: TrimInput| Ok(trim),
                &running,
                &metrics,
            )?,
            spawn_ingress("imu", imu_rx, Arc::clone(&ctx.imu), ImuSample::ingest, &running, &metrics)?,
            spawn_ingress(
                "contacts",
                cnt_rx,
                Arc::clone(&ctx.contacts),
                |cnt: ContactState| Ok(cnt),
                &running,
                &metrics,
            )?,
        ];

        let joints = LatestPublisher::new(self.egress_capacity, Arc::clone(&metrics));
        let actions = LatestPublisher::new(self.egress_capacity, Arc::clone(&metrics));

        info!(
            "LocoDriver started: 4 ingress threads, egress capacity {}",
            self.egress_capacity
        );

        let driver = LocoDriver {
            ctx,
            metrics,
            running,
            threads,
            joints,
            actions,
        };
        let senders = IngressSenders {
            command: cmd_tx,
            trim: trim_tx,
            imu: imu_tx,
            contacts: cnt_tx,
        };
        Ok((driver, senders))
    }
}

/// 四足机器人驱动（对外 API）
///
/// 持有共享状态上下文、ingress 线程句柄与出口发布通道。
/// Drop 时置停机标志并 join 所有 ingress 线程。
pub struct LocoDriver {
    ctx: Arc<LocoContext>,
    metrics: Arc<DriverMetrics>,
    running: Arc<AtomicBool>,
    threads: Vec<JoinHandle<()>>,
    joints: LatestPublisher<JointAngleSet>,
    actions: LatestPublisher<[f64; 14]>,
}

impl LocoDriver {
    /// 获取只读状态观察器
    pub fn observer(&self) -> Observer {
        Observer::new(Arc::clone(&self.ctx))
    }

    /// 驱动层指标快照
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// 停机标志（控制循环在 tick 之间检查）
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// 发布一条关节角结果
    pub fn publish_joints(&self, set: JointAngleSet) {
        self.joints.publish(set);
        self.metrics.joint_sets_published.fetch_add(1, Ordering::Relaxed);
    }

    /// 订阅关节角输出
    pub fn subscribe_joints(&self) -> Receiver<JointAngleSet> {
        self.joints.subscribe()
    }

    /// 发布一条 agent 动作诊断（滤波后的原始动作向量）
    pub fn publish_actions(&self, actions: [f64; 14]) {
        self.actions.publish(actions);
    }

    /// 订阅 agent 动作诊断通道
    pub fn subscribe_actions(&self) -> Receiver<[f64; 14]> {
        self.actions.subscribe()
    }

    /// 请求停机（幂等）
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

impl Drop for LocoDriver {
    fn drop(&mut self) {
        self.shutdown();
        for handle in self.threads.drain(..) {
            if handle.join().is_err() {
                debug!("Ingress thread panicked during shutdown");
            }
        }
    }
}

fn spawn_ingress<M, T, F>(
    name: &'static str,
    rx: Receiver<M>,
    slot: Arc<Slot<T>>,
    map: F,
    running: &Arc<AtomicBool>,
    metrics: &Arc<DriverMetrics>,
) -> Result<JoinHandle<()>, DriverError>
where
    M: Send + 'static,
    T: Clone + Send + Sync + 'static,
    F: Fn(M) -> Result<T, MsgError> + Send + 'static,
{
    let running = Arc::clone(running);
    let metrics = Arc::clone(metrics);
    std::thread::Builder::new()
        .name(format!("loco-ingress-{name}"))
        .spawn(move || ingress_loop(name, rx, slot, map, running, metrics))
        .map_err(|e| DriverError::InvalidConfig(format!("failed to spawn ingress thread: {e}")))
}
