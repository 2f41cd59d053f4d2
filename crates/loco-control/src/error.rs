//! 控制层错误类型定义

use thiserror::Error;

/// 控制层错误类型
///
/// 外部协作者（轨迹发生器 / IK / 策略）的失败不会被掩盖：
/// 当 tick 内任一步骤出错，本 tick 放弃发布，循环继续下一个 tick。
/// tick 内**不做**协作者调用的自动重试：错过一个 tick 比把过期计算
/// 重试一遍更便宜、也更安全。
#[derive(Error, Debug)]
pub enum ControlError {
    /// 配置非法（启动前校验，致命）
    #[error("Invalid controller config: {0}")]
    InvalidConfig(String),

    /// 轨迹发生器调用失败
    #[error("Trajectory generator failed: {0}")]
    Trajectory(String),

    /// IK 求解失败
    #[error("IK solver failed: {0}")]
    Ik(String),

    /// 策略评估失败
    #[error("Policy evaluation failed: {0}")]
    Policy(String),
}
