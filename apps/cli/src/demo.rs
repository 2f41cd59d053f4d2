//! 演示用协作者
//!
//! 真实部署中轨迹发生器、IK 与策略由外部库注入；这里提供一套自洽的
//! 简化实现，让 CLI 能在无硬件环境下跑通整条控制链路：
//! - [`DemoTrajectory`] — 对角小跑相位 + 正弦摆动的足端轨迹
//! - [`DemoIk`] — 三关节腿的平面几何逆解
//! - [`ZeroPolicy`] — 恒零残差（验证 agent 路径的管线开销）
//! - [`spawn_demo_feeder`] — 合成指令 / IMU / 接触输入流

use std::f64::consts::TAU;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use nalgebra::Vector3;

use loco_control::{
    ACTION_DIM, ControlError, IkSolver, Policy, TrajectoryGenerator, TrajectoryInput,
};
use loco_driver::IngressSenders;
use loco_msgs::{
    Command, ContactState, FootPose, FootPoseSet, GRAVITY, LegId, Motion, Movement, RawImu,
};

/// 髋部侧摆连杆长度（m）
const L_HIP: f64 = 0.04;
/// 大腿连杆长度（m）
const L_THIGH: f64 = 0.10;
/// 小腿连杆长度（m）
const L_SHANK: f64 = 0.10;

/// 演示用参考站立位姿
pub fn reference_stance() -> FootPoseSet {
    FootPoseSet::uniform(FootPose::from_position(Vector3::new(0.0, L_HIP, -0.16)))
}

/// 对角小跑轨迹发生器
///
/// FL/BR 与 FR/BL 两组相位相差半个周期；摆动相抬脚为正弦包络，
/// 支撑相按触地深度下压。只做演示，不含足端滑移补偿。
pub struct DemoTrajectory {
    /// 主相位，[0, 1) 循环
    phase: f64,
    swing_period: f64,
}

/// 每条腿相对主相位的偏移（FL, FR, BL, BR）
const PHASE_OFFSETS: [f64; 4] = [0.0, 0.5, 0.5, 0.0];

impl DemoTrajectory {
    pub fn new() -> Self {
        Self {
            phase: 0.0,
            swing_period: 0.2,
        }
    }

    fn leg_phase(&self, leg: usize) -> f64 {
        (self.phase + PHASE_OFFSETS[leg]).fract()
    }
}

impl Default for DemoTrajectory {
    fn default() -> Self {
        Self::new()
    }
}

impl TrajectoryGenerator for DemoTrajectory {
    fn generate(&mut self, input: TrajectoryInput<'_>) -> Result<FootPoseSet, ControlError> {
        // 一个完整步态周期 = 摆动 + 支撑 = 2 × 摆动周期
        let cycle = 2.0 * self.swing_period;
        if cycle <= 0.0 {
            return Err(ControlError::Trajectory(
                "swing period must be positive".to_string(),
            ));
        }
        self.phase = (self.phase + input.dt / cycle).fract();

        let gait = input.gait;
        let mut feet = *input.reference;
        for (i, leg) in LegId::ALL.iter().enumerate() {
            let p = self.leg_phase(i);
            let reference = input.reference[*leg].position;
            let pose = &mut feet[*leg];
            if p < 0.5 {
                // 摆动相：足端沿步长方向前移，正弦包络抬脚
                let s = p * 2.0;
                let lift = gait.clearance_height * (s * std::f64::consts::PI).sin();
                let along = gait.step_length * (s - 0.5);
                pose.position = Vector3::new(
                    reference.x + along * gait.lateral_fraction.cos(),
                    reference.y + along * gait.lateral_fraction.sin(),
                    reference.z + lift,
                );
            } else {
                // 支撑相：反向推回，触地深度下压
                let s = (p - 0.5) * 2.0;
                let along = gait.step_length * (0.5 - s);
                pose.position = Vector3::new(
                    reference.x + along * gait.lateral_fraction.cos(),
                    reference.y + along * gait.lateral_fraction.sin(),
                    reference.z - gait.penetration_depth,
                );
            }
        }
        Ok(feet)
    }

    fn phases(&self) -> [f64; 4] {
        let mut phases = [0.0; 4];
        for (i, p) in phases.iter_mut().enumerate() {
            *p = (self.leg_phase(i) * TAU).sin();
        }
        phases
    }

    fn set_swing_period(&mut self, swing_period: f64) {
        self.swing_period = swing_period;
    }
}

/// 三关节腿的平面几何 IK
///
/// 足端超出工作空间时返回错误（该 tick 被上层跳过）。
/// 机身姿态的小角度在演示中忽略。
#[derive(Debug, Default)]
pub struct DemoIk;

impl IkSolver for DemoIk {
    fn solve(
        &self,
        _orientation: Vector3<f64>,
        position: Vector3<f64>,
        feet: &FootPoseSet,
    ) -> Result<[[f64; 3]; 4], ControlError> {
        let mut angles = [[0.0; 3]; 4];
        for (leg, pose) in feet.iter() {
            // 髋坐标系下的足端位置（机身高度偏移并入 z）
            let p = pose.position - position;

            // 髋侧摆：绕 x 轴，把足端转进腿平面
            let yz = (p.y * p.y + p.z * p.z).sqrt();
            if yz < L_HIP {
                return Err(ControlError::Ik(format!(
                    "Foot {} inside hip link radius",
                    leg.name()
                )));
            }
            let hip = p.y.atan2(-p.z) - (L_HIP / yz).asin() + std::f64::consts::FRAC_PI_2;

            // 腿平面内的两连杆解
            let plane_z = -(yz * yz - L_HIP * L_HIP).sqrt();
            let r2 = p.x * p.x + plane_z * plane_z;
            let r = r2.sqrt();
            if r > L_THIGH + L_SHANK || r < (L_THIGH - L_SHANK).abs() {
                return Err(ControlError::Ik(format!(
                    "Foot {} out of reach: r = {:.4} m",
                    leg.name(),
                    r
                )));
            }
            let cos_knee = (L_THIGH * L_THIGH + L_SHANK * L_SHANK - r2)
                / (2.0 * L_THIGH * L_SHANK);
            let knee = std::f64::consts::PI - cos_knee.clamp(-1.0, 1.0).acos();
            let cos_alpha =
                (L_THIGH * L_THIGH + r2 - L_SHANK * L_SHANK) / (2.0 * L_THIGH * r);
            let thigh = p.x.atan2(-plane_z) - cos_alpha.clamp(-1.0, 1.0).acos();

            angles[leg.index()] = [hip, thigh, knee];
        }
        Ok(angles)
    }
}

/// 恒零残差策略
pub struct ZeroPolicy;

impl Policy for ZeroPolicy {
    fn evaluate(&mut self, _observation: &[f64]) -> Result<Vec<f64>, ControlError> {
        Ok(vec![0.0; ACTION_DIM])
    }
}

/// 启动合成输入线程：前进步行指令 + 静止 IMU + 四脚触地
///
/// 50Hz 发送，通道满时丢弃本次发送（last-value 语义下无害）。
pub fn spawn_demo_feeder(
    senders: IngressSenders,
    running: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("loco-demo-feeder".to_string())
        .spawn(move || {
            let command = Command {
                x_velocity: 0.5,
                motion: Motion::Move,
                movement: Movement::Stepping,
                ..Command::default()
            };
            let imu = RawImu {
                acc_z: GRAVITY,
                ..RawImu::default()
            };
            let contacts = ContactState::new(true, true, true, true);
            while running.load(Ordering::Relaxed) {
                let _ = senders.command.try_send(command);
                let _ = senders.imu.try_send(imu);
                let _ = senders.contacts.try_send(contacts);
                std::thread::sleep(Duration::from_millis(20));
            }
        })
}
