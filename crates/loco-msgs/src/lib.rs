//! 消息类型层
//!
//! 本模块定义 loco 四足机器人控制器在各线程之间交换的全部消息类型：
//! - 操作者指令（[`Command`]）与辅助微调输入（[`TrimInput`]）
//! - 传感器采样（[`ImuSample`]、[`ContactState`]）及入口变换
//! - 足端位姿集合（[`FootPoseSet`]）与关节角输出（[`JointAngleSet`]）
//!
//! 所有类型都是纯数据（无 IO、无状态机），入口校验在本层完成：
//! 非法采样在边界处被拒绝，不会进入控制循环。

mod command;
mod error;
mod joints;
mod pose;
mod sensor;

pub use command::{Command, Motion, Movement, TrimInput};
pub use error::MsgError;
pub use joints::JointAngleSet;
pub use pose::{FootPose, FootPoseSet, LegId};
pub use sensor::{ContactState, ImuSample, RawImu, GRAVITY};
