//! 融合-稳定控制核心
//!
//! 本模块实现四足机器人移动控制器的指令融合循环：每个 tick 把
//! 操作者指令、IMU/接触传感读数与残差策略输出融合为一组每腿目标
//! 位姿，交给外部 IK 求解器得到关节角。
//!
//! 组成（自底向上）：
//! - [`GaitParameterController`] — 步态参数派生、微调累积与安全钳位
//! - [`PolicyBridge`] — 观测组装、在线归一化、动作滤波与残差切分
//! - [`compose`] — 名义位姿与残差的纯合成
//! - [`FusionCycle`] — 按固定顺序编排一个 tick
//! - [`run_fusion_loop`] — 600Hz 绝对锚点周期循环
//!
//! 外部协作者（轨迹发生器、IK、策略网络）通过 [`TrajectoryGenerator`]
//! / [`IkSolver`] / [`Policy`] 接口注入；其数学实现不在本仓库范围内。

mod collab;
mod compose;
mod config;
mod cycle;
mod error;
mod gait;
mod policy;
mod runner;

pub use collab::{IkSolver, TrajectoryGenerator, TrajectoryInput};
pub use compose::compose;
pub use config::{ACTION_DIM, AgentScales, CommandScales, ControllerConfig, GaitDefaults};
pub use cycle::{CycleMode, FusionCycle, TickOutput};
pub use error::ControlError;
pub use gait::{BodyPoseTarget, GaitParameterController, GaitParameters, TickDerivation};
pub use policy::{Normalizer, Policy, PolicyBridge, ResidualAction};
pub use runner::{FusionStats, run_fusion_loop};
