//! 外部协作者接口
//!
//! 轨迹生成、逆运动学与策略评估都是进程内同步调用，数学实现不在
//! 本仓库范围内；这里只定义融合循环依赖的最小接口。

use nalgebra::Vector3;

use loco_msgs::{ContactState, FootPoseSet};

use crate::error::ControlError;
use crate::gait::GaitParameters;

/// 轨迹发生器的一次调用输入
///
/// 字段较多，打包成结构体避免超长参数列表。
pub struct TrajectoryInput<'a> {
    pub gait: GaitParameters,
    /// 参考站立位姿（基线，发生器不修改）
    pub reference: &'a FootPoseSet,
    /// 上一个 tick 的输出（必须原样传回）
    pub previous: &'a FootPoseSet,
    pub contacts: &'a ContactState,
    /// 实测 tick 间隔（秒）
    pub dt: f64,
}

/// 名义轨迹发生器
///
/// **有状态**：每次 `generate` 调用把内部步态相位推进 `dt`。
/// 每个 tick 必须恰好调用一次，失败后绝不重试（重试会重复推进相位）。
pub trait TrajectoryGenerator: Send {
    /// 生成本 tick 的名义足端位姿集合
    fn generate(&mut self, input: TrajectoryInput<'_>) -> Result<FootPoseSet, ControlError>;

    /// 当前每条腿的步态相位，按 FL, FR, BL, BR 排列
    fn phases(&self) -> [f64; 4];

    /// 更新摆动周期（在 `generate` 之前、每 tick 调用）
    fn set_swing_period(&mut self, swing_period: f64);
}

/// 逆运动学求解器
///
/// 纯函数：给定机身姿态、机身位置与足端位姿，返回每条腿三个关节角
/// （弧度，按 FL, FR, BL, BR 排列）。
pub trait IkSolver: Send {
    fn solve(
        &self,
        orientation: Vector3<f64>,
        position: Vector3<f64>,
        feet: &FootPoseSet,
    ) -> Result<[[f64; 3]; 4], ControlError>;
}
