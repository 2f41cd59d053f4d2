//! FusionCycle - 融合循环编排器
//!
//! 每个 tick 按固定顺序执行一次（顺序不可调整，步步依赖）：
//! 1. 计算距上个 tick 的实测时间增量（由循环运行器传入）
//! 2. 从指令/微调派生步态参数（未钳位）
//! 3. agent 活动时推理残差，抬脚高度增量并入步骤 2 的结果
//! 4. 最终钳位抬脚高度 / 触地深度
//! 5. 调用外部轨迹发生器取得名义足端位姿（发生器自己推进相位）
//! 6. agent 活动时合成残差，否则位姿原样透传
//! 7. 调用外部 IK 求解器得到关节角
//! 8. 打包关节角结果与踏步/姿态标志
//!
//! 任一步骤失败即放弃本 tick 的发布，循环带着上一个有效状态进入
//! 下一个 tick；不存在部分/垃圾输出。
//!
//! 状态机只有 STOPPED / ACTIVE 两态，进入 STOPPED 强制全参数复位；
//! 进程退出不持久化任何状态。

use std::time::Duration;

use tracing::{debug, warn};

use loco_driver::InputSnapshot;
use loco_msgs::{Command, FootPoseSet, JointAngleSet, Motion};

use crate::collab::{IkSolver, TrajectoryGenerator, TrajectoryInput};
use crate::compose::compose;
use crate::config::{ControllerConfig, ACTION_DIM};
use crate::error::ControlError;
use crate::gait::{GaitParameterController, GaitParameters};
use crate::policy::{Policy, PolicyBridge, ResidualAction};

/// 融合循环状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleMode {
    Stopped,
    Active,
}

/// 一个完成 tick 的输出
#[derive(Debug, Clone, Copy)]
pub struct TickOutput {
    pub joints: JointAngleSet,
    /// agent 活动时滤波后的动作向量（诊断通道用）
    pub actions: Option<[f64; ACTION_DIM]>,
}

/// 融合循环编排器
///
/// 集中持有全部控制线程独占状态（步态参数、滤波缓冲、归一化统计、
/// 上一 tick 的足端位姿），tick 函数对给定上下文是确定性的，
/// 可以脱离真实时钟单独测试。
pub struct FusionCycle {
    config: ControllerConfig,
    gait: GaitParameterController,
    bridge: Option<PolicyBridge>,
    trajectory: Box<dyn TrajectoryGenerator>,
    ik: Box<dyn IkSolver>,
    mode: CycleMode,
    /// 参考站立位姿（基线，循环内绝不修改）
    reference_poses: FootPoseSet,
    /// 上一个 tick 的名义位姿，必须原样传回发生器
    previous_poses: FootPoseSet,
    /// 当前陈旧 episode 是否已告警（每个 episode 只告警一次）
    stale_warned: bool,
    last_parameters: Option<GaitParameters>,
}

impl core::fmt::Debug for FusionCycle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FusionCycle").finish_non_exhaustive()
    }
}

impl FusionCycle {
    /// 创建融合循环
    ///
    /// `agent_enabled` 为 true 时必须提供策略，否则视为配置错误
    /// （启动前致命，循环不会开始）。
    pub fn new(
        config: ControllerConfig,
        trajectory: Box<dyn TrajectoryGenerator>,
        ik: Box<dyn IkSolver>,
        policy: Option<Box<dyn Policy>>,
        reference_poses: FootPoseSet,
    ) -> Result<Self, ControlError> {
        config.validate()?;
        let bridge = if config.agent_enabled {
            match policy {
                Some(policy) => Some(PolicyBridge::new(policy, &config)),
                None => {
                    return Err(ControlError::InvalidConfig(
                        "agent_enabled is set but no policy was provided".to_string(),
                    ));
                },
            }
        } else {
            None
        };
        Ok(Self {
            gait: GaitParameterController::new(config.clone()),
            bridge,
            trajectory,
            ik,
            mode: CycleMode::Stopped,
            reference_poses,
            previous_poses: reference_poses,
            stale_warned: false,
            last_parameters: None,
            config,
        })
    }

    /// 执行一个 tick
    ///
    /// `dt` 是运行器用单调时钟实测的 tick 间隔，原样喂给轨迹发生器，
    /// 负载下步态相位仍与墙钟一致。
    pub fn tick(
        &mut self,
        input: &InputSnapshot,
        dt: Duration,
    ) -> Result<TickOutput, ControlError> {
        // 陈旧性回退：IMU 静默超时则本 tick 以 Stop 指令替代
        let command = self.effective_command(input);
        let stopped = command.motion == Motion::Stop;

        match (self.mode, stopped) {
            (CycleMode::Active, true) => {
                debug!("Fusion cycle: ACTIVE -> STOPPED");
                self.mode = CycleMode::Stopped;
            },
            (CycleMode::Stopped, false) => {
                debug!("Fusion cycle: STOPPED -> ACTIVE");
                self.mode = CycleMode::Active;
            },
            _ => {},
        }

        // 2. 派生步态参数（未钳位）
        let derivation = self.gait.derive(&command, &input.trim);

        // 3. agent 活动时推理残差；滤波缓冲在非活动期保持不动
        let (residual, actions) = match (&mut self.bridge, stopped) {
            (Some(bridge), false) => {
                let phases = self.trajectory.phases();
                let (residual, action) = bridge.infer(&input.imu, phases, &input.contacts)?;
                self.gait.add_clearance_delta(residual.clearance_delta);
                (residual, Some(action))
            },
            _ => (ResidualAction::zero(), None),
        };

        // 4. 最后一道安全门：钳位进入配置区间
        self.gait.clamp();
        let parameters = self.gait.parameters(&derivation);

        // 5. 名义轨迹：发生器有状态，本调用推进其内部相位，绝不重试
        self.trajectory.set_swing_period(parameters.swing_period);
        let nominal = self.trajectory.generate(TrajectoryInput {
            gait: parameters,
            reference: &self.reference_poses,
            previous: &self.previous_poses,
            contacts: &input.contacts,
            dt: dt.as_secs_f64(),
        })?;
        self.previous_poses = nominal;

        // 6. 残差合成（agent 不活动时位姿原样透传）
        let (feet, body_position) = if actions.is_some() {
            compose(&nominal, &residual, derivation.body.position)
        } else {
            (nominal, derivation.body.position)
        };

        // 7–8. IK 求解并打包（弧度 → 度）
        let angles = self.ik.solve(derivation.body.orientation, body_position, &feet)?;
        let joints = JointAngleSet::from_radians(angles, command.step_or_view());

        self.last_parameters = Some(parameters);
        Ok(TickOutput { joints, actions })
    }

    /// 应用陈旧性回退后的有效指令
    fn effective_command(&mut self, input: &InputSnapshot) -> Command {
        let timeout = self.config.imu_staleness_timeout_s;
        if timeout <= 0.0 || input.command.motion == Motion::Stop {
            self.stale_warned = false;
            return input.command;
        }
        let stale = match input.imu_age {
            Some(age) => age.as_secs_f64() > timeout,
            // 从未收到过 IMU 采样：视为陈旧
            None => true,
        };
        if stale {
            if !self.stale_warned {
                warn!(
                    "IMU feed stale (age {:?}, timeout {}s), substituting Stop command",
                    input.imu_age, timeout
                );
                self.stale_warned = true;
            }
            Command {
                motion: Motion::Stop,
                ..input.command
            }
        } else {
            self.stale_warned = false;
            input.command
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn mode(&self) -> CycleMode {
        self.mode
    }

    /// 上一个完成 tick 的钳位后参数
    pub fn last_parameters(&self) -> Option<GaitParameters> {
        self.last_parameters
    }

    /// 被拒绝的非有限动作计数（agent 未启用时为 0）
    pub fn rejected_actions(&self) -> u64 {
        self.bridge.as_ref().map_or(0, |b| b.rejected_non_finite())
    }
}
