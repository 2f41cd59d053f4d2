//! 步态参数控制器
//!
//! 每个 tick 根据指令与微调输入派生步态参数。四个带状态的量
//! （步速、摆动周期、抬脚高度、触地深度）跨 tick 持有，在
//! 停止 / 手动复位事件时回到基准值；其余量（步长、侧向分数、
//! 偏航角速度、机身位姿目标）每个 tick 重新计算，无跨 tick 身份。
//!
//! 抬脚高度 / 触地深度的最终钳位是数值进入轨迹发生器前的最后一道
//! 安全门，在策略增量（若有）叠加之后执行。

use nalgebra::Vector3;

use loco_msgs::{Command, Motion, Movement, TrimInput};

use crate::config::ControllerConfig;

/// 一个 tick 的完整步态参数（钳位之后的终值）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaitParameters {
    pub step_length: f64,
    pub lateral_fraction: f64,
    pub yaw_rate: f64,
    pub step_velocity: f64,
    pub swing_period: f64,
    pub clearance_height: f64,
    pub penetration_depth: f64,
}

/// 机身位姿目标（IK 的参考系）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyPoseTarget {
    pub position: Vector3<f64>,
    /// (roll, pitch, yaw)，弧度
    pub orientation: Vector3<f64>,
}

/// 每 tick 派生量（无跨 tick 状态）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickDerivation {
    pub step_length: f64,
    pub lateral_fraction: f64,
    pub yaw_rate: f64,
    pub body: BodyPoseTarget,
}

/// 步态参数控制器
///
/// 持有四个跨 tick 的参数及其基准值/钳位区间。
/// 调用顺序固定：`derive` → （可选）`add_clearance_delta` → `clamp` → `parameters`。
pub struct GaitParameterController {
    config: ControllerConfig,

    // 跨 tick 状态，停止/手动复位时回基准值
    step_velocity: f64,
    swing_period: f64,
    clearance_height: f64,
    penetration_depth: f64,
}

impl GaitParameterController {
    pub fn new(config: ControllerConfig) -> Self {
        let gait = config.gait;
        Self {
            step_velocity: gait.base_step_velocity,
            swing_period: gait.base_swing_period,
            clearance_height: gait.base_clearance_height,
            penetration_depth: gait.base_penetration_depth,
            config,
        }
    }

    /// 全部跨 tick 参数回基准值
    pub fn reset_to_base(&mut self) {
        let gait = self.config.gait;
        self.step_velocity = gait.base_step_velocity;
        self.swing_period = gait.base_swing_period;
        self.clearance_height = gait.base_clearance_height;
        self.penetration_depth = gait.base_penetration_depth;
    }

    /// 从指令与微调派生本 tick 的步态参数（**未**做最终钳位）
    pub fn derive(&mut self, cmd: &Command, trim: &TrimInput) -> TickDerivation {
        let gait = self.config.gait;
        let scales = self.config.scales;

        let derivation = match cmd.motion {
            Motion::Stop => {
                // 停止：派生量全零，四个状态量全部回基准值
                self.reset_to_base();
                TickDerivation {
                    step_length: 0.0,
                    lateral_fraction: 0.0,
                    yaw_rate: 0.0,
                    body: BodyPoseTarget {
                        position: Vector3::new(gait.x_offset, 0.0, gait.z_offset),
                        orientation: Vector3::zeros(),
                    },
                }
            },
            Motion::Move => {
                self.step_velocity = gait.base_step_velocity;
                self.swing_period = clip(
                    gait.base_swing_period
                        + (-cmd.faster + -cmd.slower) * scales.swing_modifier,
                    gait.swing_period_limits[0],
                    gait.swing_period_limits[1],
                );

                if cmd.movement == Movement::Stepping {
                    let step_length = clip(
                        cmd.x_velocity + (cmd.y_velocity * 0.66).abs(),
                        -1.0,
                        1.0,
                    ) * scales.step_length;
                    // 踏步中禁止高度调制：z 强制清零（安全不变量）
                    let z = 0.0;
                    TickDerivation {
                        step_length,
                        lateral_fraction: cmd.y_velocity * std::f64::consts::FRAC_PI_2,
                        yaw_rate: cmd.rate * scales.yaw,
                        body: BodyPoseTarget {
                            position: Vector3::new(
                                gait.x_offset,
                                0.0,
                                z * scales.z_ctrl + gait.z_offset,
                            ),
                            orientation: Vector3::zeros(),
                        },
                    }
                } else {
                    // 姿态模式：步态量清零，抬脚/触地/步速回基准
                    self.clearance_height = gait.base_clearance_height;
                    self.penetration_depth = gait.base_penetration_depth;
                    self.step_velocity = gait.base_step_velocity;
                    TickDerivation {
                        step_length: 0.0,
                        lateral_fraction: 0.0,
                        yaw_rate: 0.0,
                        body: BodyPoseTarget {
                            position: Vector3::new(
                                gait.x_offset,
                                0.0,
                                cmd.z * scales.z_ctrl + gait.z_offset,
                            ),
                            orientation: Vector3::new(cmd.roll, cmd.pitch, cmd.yaw)
                                * scales.rpy,
                        },
                    }
                }
            },
        };

        // 微调增量：无论运动状态，每 tick 应用一次
        self.clearance_height += trim.up_down * scales.trim;
        self.penetration_depth += trim.left_right * scales.trim;

        // 手动复位覆盖本 tick 的增量累积
        if trim.reset_requested() {
            self.reset_to_base();
        }

        derivation
    }

    /// 叠加策略的抬脚高度增量（在最终钳位之前调用）
    pub fn add_clearance_delta(&mut self, delta: f64) {
        self.clearance_height += delta;
    }

    /// 最终钳位：抬脚高度 / 触地深度进入配置的闭区间
    ///
    /// tick 内最后一次修改这两个值的地方，之后它们被轨迹发生器消费。
    pub fn clamp(&mut self) {
        let gait = self.config.gait;
        self.clearance_height = clip(
            self.clearance_height,
            gait.clearance_limits[0],
            gait.clearance_limits[1],
        );
        self.penetration_depth = clip(
            self.penetration_depth,
            gait.penetration_limits[0],
            gait.penetration_limits[1],
        );
    }

    /// 汇总本 tick 的终值
    pub fn parameters(&self, derivation: &TickDerivation) -> GaitParameters {
        GaitParameters {
            step_length: derivation.step_length,
            lateral_fraction: derivation.lateral_fraction,
            yaw_rate: derivation.yaw_rate,
            step_velocity: self.step_velocity,
            swing_period: self.swing_period,
            clearance_height: self.clearance_height,
            penetration_depth: self.penetration_depth,
        }
    }

    pub fn clearance_height(&self) -> f64 {
        self.clearance_height
    }

    pub fn penetration_depth(&self) -> f64 {
        self.penetration_depth
    }

    pub fn swing_period(&self) -> f64 {
        self.swing_period
    }

    pub fn step_velocity(&self) -> f64 {
        self.step_velocity
    }
}

fn clip(value: f64, min: f64, max: f64) -> f64 {
    value.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> GaitParameterController {
        GaitParameterController::new(ControllerConfig::default())
    }

    fn stepping(x: f64, y: f64, rate: f64) -> Command {
        Command {
            x_velocity: x,
            y_velocity: y,
            rate,
            motion: Motion::Move,
            movement: Movement::Stepping,
            ..Command::default()
        }
    }

    #[test]
    fn test_stop_zeroes_and_resets() {
        let mut ctrl = controller();
        // 先走起来并累积一点微调
        ctrl.derive(
            &stepping(1.0, 0.0, 0.0),
            &TrimInput {
                up_down: 1.0,
                ..TrimInput::default()
            },
        );
        assert!(ctrl.clearance_height() > 0.035);

        let d = ctrl.derive(
            &Command {
                motion: Motion::Stop,
                ..Command::default()
            },
            &TrimInput::default(),
        );
        assert_eq!(d.step_length, 0.0);
        assert_eq!(d.lateral_fraction, 0.0);
        assert_eq!(d.yaw_rate, 0.0);
        assert_eq!(d.body.position, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(d.body.orientation, Vector3::zeros());
        assert_eq!(ctrl.clearance_height(), 0.035);
        assert_eq!(ctrl.penetration_depth(), 0.003);
        assert_eq!(ctrl.swing_period(), 0.2);
        assert_eq!(ctrl.step_velocity(), 0.001);
    }

    #[test]
    fn test_stepping_forward_scenario() {
        // 端到端场景：x=1.0 → step_length = clip(1.0) * 0.05 = 0.05
        let mut ctrl = controller();
        let d = ctrl.derive(&stepping(1.0, 0.0, 0.0), &TrimInput::default());
        assert!((d.step_length - 0.05).abs() < 1e-12);
        assert_eq!(d.lateral_fraction, 0.0);
        assert_eq!(d.yaw_rate, 0.0);
        // 踏步中 z 强制为 0 → 机身高度只剩 z_offset
        assert_eq!(d.body.position.z, 0.0);
    }

    #[test]
    fn test_stepping_lateral_and_yaw() {
        let mut ctrl = controller();
        let d = ctrl.derive(&stepping(0.0, 1.0, 0.8), &TrimInput::default());
        // step_length = clip(0 + |0.66|) * 0.05
        assert!((d.step_length - 0.66 * 0.05).abs() < 1e-12);
        assert!((d.lateral_fraction - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
        assert!((d.yaw_rate - 1.0).abs() < 1e-12); // 0.8 * 1.25
    }

    #[test]
    fn test_step_length_saturates() {
        let mut ctrl = controller();
        let d = ctrl.derive(&stepping(1.0, 1.0, 0.0), &TrimInput::default());
        // 1.0 + 0.66 钳位到 1.0
        assert!((d.step_length - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_viewing_pose_scaling() {
        let mut ctrl = controller();
        let cmd = Command {
            roll: 1.0,
            pitch: -0.5,
            yaw: 0.2,
            z: 1.0,
            motion: Motion::Move,
            movement: Movement::Viewing,
            ..Command::default()
        };
        let d = ctrl.derive(&cmd, &TrimInput::default());
        assert_eq!(d.step_length, 0.0);
        assert!((d.body.orientation.x - 0.785).abs() < 1e-12);
        assert!((d.body.orientation.y + 0.3925).abs() < 1e-12);
        assert!((d.body.position.z - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_swing_period_modifier_clipped() {
        let mut ctrl = controller();
        let cmd = Command {
            faster: 3.0, // base 0.2 - 0.15 = 0.05 → 钳位到 0.1
            motion: Motion::Move,
            movement: Movement::Stepping,
            ..Command::default()
        };
        ctrl.derive(&cmd, &TrimInput::default());
        assert!((ctrl.swing_period() - 0.1).abs() < 1e-12);

        let cmd = Command {
            slower: 3.0,
            motion: Motion::Move,
            movement: Movement::Stepping,
            ..Command::default()
        };
        ctrl.derive(&cmd, &TrimInput::default());
        assert!((ctrl.swing_period() - 0.1).abs() < 1e-12); // -3 同样减小周期

        let cmd = Command {
            faster: -3.0,
            motion: Motion::Move,
            movement: Movement::Stepping,
            ..Command::default()
        };
        ctrl.derive(&cmd, &TrimInput::default());
        assert!((ctrl.swing_period() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_trim_accumulates_and_clamps() {
        // 端到端场景：up_down=1，CHPD_SCALE=0.0005，基准 0.035 → 0.0355
        let mut ctrl = controller();
        let trim = TrimInput {
            up_down: 1.0,
            ..TrimInput::default()
        };
        ctrl.derive(&stepping(0.5, 0.0, 0.0), &trim);
        assert!((ctrl.clearance_height() - 0.0355).abs() < 1e-12);
        ctrl.clamp();
        assert!((ctrl.clearance_height() - 0.0355).abs() < 1e-12); // 区间内不变

        // 反复累积直到越界，钳位到上限 0.04
        for _ in 0..100 {
            ctrl.derive(&stepping(0.5, 0.0, 0.0), &trim);
        }
        ctrl.clamp();
        assert_eq!(ctrl.clearance_height(), 0.04);
    }

    #[test]
    fn test_bumper_reset_overrides_trim() {
        let mut ctrl = controller();
        let trim = TrimInput {
            up_down: 5.0,
            left_right: -3.0,
            right_bump: true,
            ..TrimInput::default()
        };
        ctrl.derive(&stepping(0.5, 0.0, 0.0), &trim);
        // bumper 复位覆盖同 tick 的增量
        assert_eq!(ctrl.clearance_height(), 0.035);
        assert_eq!(ctrl.penetration_depth(), 0.003);
        assert_eq!(ctrl.swing_period(), 0.2);
        assert_eq!(ctrl.step_velocity(), 0.001);
    }

    #[test]
    fn test_policy_delta_folds_before_clamp() {
        let mut ctrl = controller();
        ctrl.derive(&stepping(0.5, 0.0, 0.0), &TrimInput::default());
        ctrl.add_clearance_delta(1.0); // 远超上限
        ctrl.clamp();
        assert_eq!(ctrl.clearance_height(), 0.04);

        ctrl.derive(&stepping(0.5, 0.0, 0.0), &TrimInput::default());
        ctrl.add_clearance_delta(-1.0);
        ctrl.clamp();
        assert_eq!(ctrl.clearance_height(), 0.0);
    }
}
