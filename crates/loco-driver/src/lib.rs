//! 驱动层模块
//!
//! 本模块负责控制核心与外界之间的全部数据搬运：
//! - 入口（ingress）：指令 / 微调 / IMU / 接触四条异步通道，
//!   每条通道由独立线程消费，last-value 语义（只保留最新值）
//! - 状态同步：`ArcSwap` 整体快照交换，控制线程读取时绝不发生字段撕裂
//! - 出口（egress）：关节角与 agent 动作诊断的发布通道，
//!   满时丢弃最旧值，慢速订阅者永远不会阻塞控制线程
//!
//! 控制循环本身在 [`loco-control`](https://docs.rs/loco-control) 中，
//! 它只通过 [`Observer`] 读取本模块维护的状态。

mod builder;
mod egress;
mod error;
pub mod mailbox;
mod observer;
mod state;

pub use builder::{IngressSenders, LocoDriver, LocoDriverBuilder};
pub use egress::LatestPublisher;
pub use error::DriverError;
pub use mailbox::{Slot, Stamped};
pub use observer::{InputSnapshot, Observer};
pub use state::{DriverMetrics, LocoContext, MetricsSnapshot};
