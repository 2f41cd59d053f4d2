//! 操作者指令消息
//!
//! [`Command`] 由遥操作端整体发布、整体替换（last-value 语义），
//! 控制循环每个 tick 读取一次最新快照，不存在字段级局部更新。

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 运动开关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Motion {
    /// 停止：所有派生步态参数清零并复位到基准值
    #[default]
    Stop,
    /// 运动：按 `Movement` 细分为踏步或姿态模式
    Move,
}

/// 运动模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Movement {
    /// 踏步模式：速度指令驱动步态，禁止高度调制
    #[default]
    Stepping,
    /// 姿态模式：原地调整机身姿态，步态参数清零
    Viewing,
}

/// 操作者指令
///
/// 速度/角速度分量为归一化输入（[-1, 1]），由控制器按比例系数缩放。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Command {
    /// 前向速度指令
    pub x_velocity: f64,
    /// 侧向速度指令
    pub y_velocity: f64,
    /// 偏航角速度指令
    pub rate: f64,
    /// 机身滚转指令（姿态模式）
    pub roll: f64,
    /// 机身俯仰指令（姿态模式）
    pub pitch: f64,
    /// 机身偏航指令（姿态模式）
    pub yaw: f64,
    /// 机身高度指令（踏步模式下被强制清零）
    pub z: f64,
    /// 摆动周期加速修饰（按住减小摆动周期）
    pub faster: f64,
    /// 摆动周期减速修饰（按住增大摆动周期）
    pub slower: f64,
    /// 运动开关
    pub motion: Motion,
    /// 运动模式
    pub movement: Movement,
}

impl Default for Command {
    /// 上电默认：静止、踏步模式、全部指令为零
    fn default() -> Self {
        Self {
            x_velocity: 0.0,
            y_velocity: 0.0,
            rate: 0.0,
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            z: 0.0,
            faster: 0.0,
            slower: 0.0,
            motion: Motion::Stop,
            movement: Movement::Stepping,
        }
    }
}

impl Command {
    /// 是否处于停止状态
    pub fn is_stopped(&self) -> bool {
        self.motion == Motion::Stop
    }

    /// `step_or_view` 输出标志（镜像 `movement`，随关节角一起发布）
    pub fn step_or_view(&self) -> bool {
        self.movement == Movement::Viewing
    }
}

/// 辅助微调输入
///
/// `up_down` / `left_right` 是每个 tick 应用一次的增量；
/// 任一 bumper 置位则触发步态参数整体复位（覆盖当 tick 的增量累积）。
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrimInput {
    /// 抬脚高度增量方向（上下键）
    pub up_down: f64,
    /// 触地深度增量方向（左右键）
    pub left_right: f64,
    /// 左 bumper：手动复位
    pub left_bump: bool,
    /// 右 bumper：手动复位
    pub right_bump: bool,
}

impl TrimInput {
    /// 任一 bumper 置位即请求手动复位
    pub fn reset_requested(&self) -> bool {
        self.left_bump || self.right_bump
    }
}
