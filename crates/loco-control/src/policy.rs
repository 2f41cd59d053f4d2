//! 策略桥接层
//!
//! 把学习到的残差修正策略接入融合循环：
//! 1. 组装观测向量（IMU 8 + 步态相位 4 + 可选接触 4，顺序固定）
//! 2. 在线归一化（running mean/variance；接触项**不**参与归一化，
//!    它们本来就是有界指示值）
//! 3. 策略评估 → tanh 饱和 → 前 K 项指数平滑
//! 4. 按约定切分：动作 0 → 抬脚高度增量，动作 1 → 机身高度偏移，
//!    动作 2–13 → 四条腿的 XYZ 位置残差
//!
//! agent 未启用或处于停止状态时，残差恒为零，且滤波缓冲**保持不动**
//! （不在非活动期污染滤波状态）。

use nalgebra::Vector3;
use tracing::warn;

use loco_msgs::{ContactState, ImuSample};

use crate::config::{ACTION_DIM, AgentScales, ControllerConfig};
use crate::error::ControlError;

/// 残差修正策略
///
/// 实现方接收（已归一化的）观测向量，返回长度 [`ACTION_DIM`] 的原始
/// 动作向量。网络结构与训练不在本仓库范围内。
pub trait Policy: Send {
    fn evaluate(&mut self, observation: &[f64]) -> Result<Vec<f64>, ControlError>;
}

/// 在线归一化器（running mean/variance）
///
/// 每个观测向量先 `observe`（更新统计）再 `normalize`。
/// 方差下限 1e-2，避免早期样本过少时除以近零值。
pub struct Normalizer {
    n: f64,
    mean: Vec<f64>,
    mean_diff: Vec<f64>,
}

impl Normalizer {
    pub fn new(dim: usize) -> Self {
        Self {
            n: 0.0,
            mean: vec![0.0; dim],
            mean_diff: vec![0.0; dim],
        }
    }

    /// 纳入一个观测样本（Welford 在线更新）
    pub fn observe(&mut self, x: &[f64]) {
        debug_assert_eq!(x.len(), self.mean.len());
        self.n += 1.0;
        for i in 0..self.mean.len() {
            let last_mean = self.mean[i];
            self.mean[i] += (x[i] - last_mean) / self.n;
            self.mean_diff[i] += (x[i] - last_mean) * (x[i] - self.mean[i]);
        }
    }

    /// 用当前统计归一化一个向量
    pub fn normalize(&self, x: &[f64]) -> Vec<f64> {
        debug_assert_eq!(x.len(), self.mean.len());
        x.iter()
            .enumerate()
            .map(|(i, &v)| {
                let var = (self.mean_diff[i] / self.n.max(1.0)).max(1e-2);
                (v - self.mean[i]) / var.sqrt()
            })
            .collect()
    }

    pub fn count(&self) -> f64 {
        self.n
    }
}

/// 切分好的残差修正量（已按比例缩放，可直接叠加）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResidualAction {
    /// 抬脚高度增量（最终钳位之前叠加进步态参数）
    pub clearance_delta: f64,
    /// 机身高度偏移（机身位姿组装后叠加到垂直分量）
    pub body_height_delta: f64,
    /// 四条腿的位置残差，按 FL, FR, BL, BR 排列
    pub leg_deltas: [Vector3<f64>; 4],
}

impl ResidualAction {
    pub fn zero() -> Self {
        Self {
            clearance_delta: 0.0,
            body_height_delta: 0.0,
            leg_deltas: [Vector3::zeros(); 4],
        }
    }
}

/// 策略桥接器
///
/// 持有在线归一化统计与跨 tick 的滤波缓冲，二者都只属于控制线程。
pub struct PolicyBridge {
    policy: Box<dyn Policy>,
    normalizer: Normalizer,
    /// 上一 tick 滤波后的前 K 项（指数平滑的 "previous" 状态）
    old_act: [f64; ACTION_DIM],
    alpha: f64,
    actions_to_filter: usize,
    contact_feedback: bool,
    scales: AgentScales,
    /// 因非有限值被整体拒绝的动作向量计数
    rejected_non_finite: u64,
}

impl PolicyBridge {
    pub fn new(policy: Box<dyn Policy>, config: &ControllerConfig) -> Self {
        Self {
            policy,
            normalizer: Normalizer::new(config.observation_dim()),
            old_act: [0.0; ACTION_DIM],
            alpha: config.filter_alpha,
            actions_to_filter: config.actions_to_filter,
            contact_feedback: config.contact_feedback,
            scales: config.agent_scales,
            rejected_non_finite: 0,
        }
    }

    /// 组装观测向量，固定顺序：IMU(8) ++ 相位(4) ++ 接触(4, 可选)
    fn assemble_observation(
        &self,
        imu: &ImuSample,
        phases: [f64; 4],
        contacts: &ContactState,
    ) -> Vec<f64> {
        let mut obs = Vec::with_capacity(if self.contact_feedback { 16 } else { 12 });
        obs.extend_from_slice(&imu.as_observation());
        obs.extend_from_slice(&phases);
        if self.contact_feedback {
            obs.extend_from_slice(&contacts.as_observation());
        }
        obs
    }

    /// 推理一次，返回（残差修正量, 滤波后的完整动作向量）
    ///
    /// 动作向量中任一项非有限时整体拒绝：返回零残差、滤波状态不动、
    /// 记录一次告警。
    pub fn infer(
        &mut self,
        imu: &ImuSample,
        phases: [f64; 4],
        contacts: &ContactState,
    ) -> Result<(ResidualAction, [f64; ACTION_DIM]), ControlError> {
        let mut obs = self.assemble_observation(imu, phases, contacts);

        self.normalizer.observe(&obs);
        let normalized = self.normalizer.normalize(&obs);
        if self.contact_feedback {
            // 接触项不归一化：归一化结果只覆盖前 12 项
            obs[..12].copy_from_slice(&normalized[..12]);
        } else {
            obs.copy_from_slice(&normalized);
        }

        let raw = self.policy.evaluate(&obs)?;
        if raw.len() != ACTION_DIM {
            return Err(ControlError::Policy(format!(
                "Action vector length mismatch: expected {}, got {}",
                ACTION_DIM,
                raw.len()
            )));
        }

        // 饱和非线性：逐项 tanh，限制到 [-1, 1]
        let mut action = [0.0; ACTION_DIM];
        for (a, &r) in action.iter_mut().zip(raw.iter()) {
            *a = r.tanh();
        }

        // 非有限值防护：整条动作拒绝，滤波状态不动
        if action.iter().any(|a| !a.is_finite()) {
            self.rejected_non_finite += 1;
            warn!(
                "Non-finite policy action rejected (total {}), residual zeroed for this tick",
                self.rejected_non_finite
            );
            return Ok((ResidualAction::zero(), [0.0; ACTION_DIM]));
        }

        // 前 K 项指数平滑：filtered = α·old + (1-α)·raw，其余透传
        for i in 0..self.actions_to_filter {
            action[i] = self.alpha * self.old_act[i] + (1.0 - self.alpha) * action[i];
        }
        self.old_act[..self.actions_to_filter]
            .copy_from_slice(&action[..self.actions_to_filter]);

        Ok((self.split(&action), action))
    }

    /// 按约定切分并缩放动作向量
    fn split(&self, action: &[f64; ACTION_DIM]) -> ResidualAction {
        let mut leg_deltas = [Vector3::zeros(); 4];
        for (leg, delta) in leg_deltas.iter_mut().enumerate() {
            let base = 2 + leg * 3;
            *delta = Vector3::new(action[base], action[base + 1], action[base + 2])
                * self.scales.residual;
        }
        ResidualAction {
            clearance_delta: action[0] * self.scales.clearance_delta,
            body_height_delta: action[1].abs() * self.scales.body_height,
            leg_deltas,
        }
    }

    /// 被拒绝的非有限动作计数（诊断用）
    pub fn rejected_non_finite(&self) -> u64 {
        self.rejected_non_finite
    }

    #[cfg(test)]
    pub(crate) fn old_act(&self) -> &[f64; ACTION_DIM] {
        &self.old_act
    }
}
