//! Observer - 状态观察器（View 模式）
//!
//! 控制线程的只读句柄，直接加载 `ArcSwap` 快照，零拷贝、无锁竞争。
//! 每个 tick 开头调用一次 [`Observer::snapshot`]，整个 tick 使用同一份
//! 输入快照，保证逻辑一致性。

use std::sync::Arc;
use std::time::Duration;

use loco_msgs::{Command, ContactState, ImuSample, TrimInput};

use crate::state::LocoContext;

/// 一个 tick 的完整输入快照
///
/// 四个槽位在尽可能短的窗口内连续读取；`imu_age` 供陈旧性检测使用。
#[derive(Debug, Clone, Copy)]
pub struct InputSnapshot {
    pub command: Command,
    pub trim: TrimInput,
    pub imu: ImuSample,
    pub contacts: ContactState,
    /// IMU 距上次更新的时长；从未收到过采样则为 `None`
    pub imu_age: Option<Duration>,
}

/// 状态观察器（只读）
///
/// Clone 开销是一次 `Arc` 指针拷贝，可跨线程分发给监控端。
#[derive(Clone)]
pub struct Observer {
    ctx: Arc<LocoContext>,
}

impl Observer {
    pub(crate) fn new(ctx: Arc<LocoContext>) -> Self {
        Self { ctx }
    }

    /// 读取本 tick 的输入快照
    pub fn snapshot(&self) -> InputSnapshot {
        let imu = self.ctx.imu.load();
        InputSnapshot {
            command: self.ctx.command.value(),
            trim: self.ctx.trim.value(),
            imu: imu.value,
            contacts: self.ctx.contacts.value(),
            imu_age: imu.at.map(|at| at.elapsed()),
        }
    }

    /// 最近一次操作者指令
    pub fn command(&self) -> Command {
        self.ctx.command.value()
    }

    /// 最近一次 IMU 采样
    pub fn imu(&self) -> ImuSample {
        self.ctx.imu.value()
    }

    /// 最近一次接触状态
    pub fn contacts(&self) -> ContactState {
        self.ctx.contacts.value()
    }

    /// 最近一次微调输入
    pub fn trim(&self) -> TrimInput {
        self.ctx.trim.value()
    }

    /// IMU 距上次更新的时长
    pub fn imu_age(&self) -> Option<Duration> {
        self.ctx.imu.age()
    }
}
