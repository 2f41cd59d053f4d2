//! 控制器配置
//!
//! 所有比例系数、基准值与钳位区间集中在这里，`Default` 即实机标定值。
//! 支持从 TOML 反序列化（字段全部带默认值，配置文件可以只写差异项）。

use serde::Deserialize;

use crate::error::ControlError;

/// 策略动作向量固定长度
pub const ACTION_DIM: usize = 14;

/// 指令缩放系数
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CommandScales {
    /// 步长缩放（归一化速度 → 米）
    pub step_length: f64,
    /// 机身高度指令缩放
    pub z_ctrl: f64,
    /// 姿态指令缩放（≈ π/4，弧度）
    pub rpy: f64,
    /// 摆动周期修饰缩放（faster/slower 按键）
    pub swing_modifier: f64,
    /// 微调增量缩放（抬脚高度 / 触地深度共用）
    pub trim: f64,
    /// 偏航角速度缩放
    pub yaw: f64,
}

impl Default for CommandScales {
    fn default() -> Self {
        Self {
            step_length: 0.05,
            z_ctrl: 0.15,
            rpy: 0.785,
            swing_modifier: 0.05,
            trim: 0.0005,
            yaw: 1.25,
        }
    }
}

/// 策略残差缩放系数
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgentScales {
    /// 动作 0 → 抬脚高度增量
    pub clearance_delta: f64,
    /// 动作 1 绝对值 → 机身高度偏移
    pub body_height: f64,
    /// 动作 2–13 → 足端位置残差
    pub residual: f64,
}

impl Default for AgentScales {
    fn default() -> Self {
        Self {
            clearance_delta: 0.05,
            body_height: 0.035,
            residual: 0.015,
        }
    }
}

/// 步态基准值与钳位区间
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct GaitDefaults {
    /// 基准步速
    pub base_step_velocity: f64,
    /// 基准摆动周期（秒）
    pub base_swing_period: f64,
    /// 摆动周期钳位区间 [min, max]
    pub swing_period_limits: [f64; 2],
    /// 基准抬脚高度（米）
    pub base_clearance_height: f64,
    /// 抬脚高度钳位区间 [min, max]
    pub clearance_limits: [f64; 2],
    /// 基准触地深度（米）
    pub base_penetration_depth: f64,
    /// 触地深度钳位区间 [min, max]
    pub penetration_limits: [f64; 2],
    /// 机身 x 方向固定偏移
    pub x_offset: f64,
    /// 机身 z 方向固定偏移
    pub z_offset: f64,
}

impl Default for GaitDefaults {
    fn default() -> Self {
        Self {
            base_step_velocity: 0.001,
            base_swing_period: 0.2,
            swing_period_limits: [0.1, 0.3],
            base_clearance_height: 0.035,
            clearance_limits: [0.0, 0.04],
            base_penetration_depth: 0.003,
            penetration_limits: [0.0, 0.02],
            x_offset: 0.0,
            z_offset: 0.0,
        }
    }
}

/// 控制器配置
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// 控制频率（Hz），标称周期 ≈ 1.67ms @ 600Hz
    pub rate_hz: f64,

    /// 是否启用残差策略
    pub agent_enabled: bool,

    /// 观测向量是否附带接触反馈（12 维 → 16 维）
    pub contact_feedback: bool,

    /// 动作向量前 K 项做指数平滑（默认全部 14 项）
    pub actions_to_filter: usize,

    /// 指数平滑常数 α（接近 1 表示慢适应）
    pub filter_alpha: f64,

    /// IMU 陈旧性超时（秒）；0 关闭检测
    ///
    /// 超时后 ACTIVE 状态下的 tick 以 Stop 指令替代（safe-stop 回退）。
    pub imu_staleness_timeout_s: f64,

    pub scales: CommandScales,
    pub agent_scales: AgentScales,
    pub gait: GaitDefaults,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            rate_hz: 600.0,
            agent_enabled: false,
            contact_feedback: false,
            actions_to_filter: ACTION_DIM,
            filter_alpha: 0.7,
            imu_staleness_timeout_s: 0.5,
            scales: CommandScales::default(),
            agent_scales: AgentScales::default(),
            gait: GaitDefaults::default(),
        }
    }
}

impl ControllerConfig {
    /// 观测向量长度（12 或 16）
    pub fn observation_dim(&self) -> usize {
        if self.contact_feedback { 16 } else { 12 }
    }

    /// 启动前校验；失败即致命，循环不会开始
    pub fn validate(&self) -> Result<(), ControlError> {
        if !(self.rate_hz > 0.0) {
            return Err(ControlError::InvalidConfig(format!(
                "rate_hz must be > 0, got {}",
                self.rate_hz
            )));
        }
        if !(0.0..1.0).contains(&self.filter_alpha) {
            return Err(ControlError::InvalidConfig(format!(
                "filter_alpha must be in [0, 1), got {}",
                self.filter_alpha
            )));
        }
        if self.actions_to_filter > ACTION_DIM {
            return Err(ControlError::InvalidConfig(format!(
                "actions_to_filter must be <= {}, got {}",
                ACTION_DIM, self.actions_to_filter
            )));
        }
        if self.imu_staleness_timeout_s < 0.0 {
            return Err(ControlError::InvalidConfig(
                "imu_staleness_timeout_s must be >= 0".to_string(),
            ));
        }
        for (name, limits) in [
            ("swing_period_limits", self.gait.swing_period_limits),
            ("clearance_limits", self.gait.clearance_limits),
            ("penetration_limits", self.gait.penetration_limits),
        ] {
            if limits[0] > limits[1] || !limits[0].is_finite() || !limits[1].is_finite() {
                return Err(ControlError::InvalidConfig(format!(
                    "{name} must be a closed interval, got {limits:?}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ControllerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rate_hz, 600.0);
        assert_eq!(config.observation_dim(), 12);
        assert_eq!(config.actions_to_filter, 14);
    }

    #[test]
    fn test_contact_feedback_extends_observation() {
        let config = ControllerConfig {
            contact_feedback: true,
            ..ControllerConfig::default()
        };
        assert_eq!(config.observation_dim(), 16);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ControllerConfig {
            rate_hz: 0.0,
            ..ControllerConfig::default()
        };
        assert!(config.validate().is_err());

        config.rate_hz = 600.0;
        config.filter_alpha = 1.0;
        assert!(config.validate().is_err());

        config.filter_alpha = 0.7;
        config.gait.clearance_limits = [0.04, 0.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_overrides_defaults() {
        let config: ControllerConfig = toml::from_str(
            r#"
            agent_enabled = true

            [gait]
            base_clearance_height = 0.03
            "#,
        )
        .unwrap();
        assert!(config.agent_enabled);
        assert_eq!(config.gait.base_clearance_height, 0.03);
        // 其余字段保持默认
        assert_eq!(config.rate_hz, 600.0);
        assert_eq!(config.scales.step_length, 0.05);
    }
}
