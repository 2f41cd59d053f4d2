//! 集成测试共用的 Mock 协作者

use std::sync::{Arc, Mutex};
use std::time::Duration;

use nalgebra::Vector3;

use loco_control::{
    ControlError, ControllerConfig, FusionCycle, GaitParameters, IkSolver, Policy,
    TrajectoryGenerator, TrajectoryInput,
};
use loco_driver::InputSnapshot;
use loco_msgs::{Command, ContactState, FootPose, FootPoseSet, ImuSample, TrimInput};

/// 一次 `generate` 调用的记录
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub gait: GaitParameters,
    pub dt: f64,
    pub previous: FootPoseSet,
}

/// Mock 轨迹发生器：记录每次调用，返回固定位姿
pub struct MockTrajectory {
    pub output: FootPoseSet,
    pub phases: [f64; 4],
    pub swing_period: Arc<Mutex<f64>>,
    pub calls: Arc<Mutex<Vec<RecordedCall>>>,
    pub fail: Arc<Mutex<bool>>,
}

impl MockTrajectory {
    pub fn new(output: FootPoseSet) -> Self {
        Self {
            output,
            phases: [0.0, 0.25, 0.5, 0.75],
            swing_period: Arc::new(Mutex::new(0.2)),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail: Arc::new(Mutex::new(false)),
        }
    }
}

impl TrajectoryGenerator for MockTrajectory {
    fn generate(&mut self, input: TrajectoryInput<'_>) -> Result<FootPoseSet, ControlError> {
        if *self.fail.lock().unwrap() {
            return Err(ControlError::Trajectory("mock failure".to_string()));
        }
        self.calls.lock().unwrap().push(RecordedCall {
            gait: input.gait,
            dt: input.dt,
            previous: *input.previous,
        });
        Ok(self.output)
    }

    fn phases(&self) -> [f64; 4] {
        self.phases
    }

    fn set_swing_period(&mut self, swing_period: f64) {
        *self.swing_period.lock().unwrap() = swing_period;
    }
}

/// 一次 `solve` 调用的记录
#[derive(Debug, Clone)]
pub struct RecordedSolve {
    pub orientation: Vector3<f64>,
    pub position: Vector3<f64>,
    pub feet: FootPoseSet,
}

/// Mock IK 求解器：记录输入，返回全零关节角
pub struct MockIk {
    pub solves: Arc<Mutex<Vec<RecordedSolve>>>,
    pub fail: Arc<Mutex<bool>>,
}

impl MockIk {
    pub fn new() -> Self {
        Self {
            solves: Arc::new(Mutex::new(Vec::new())),
            fail: Arc::new(Mutex::new(false)),
        }
    }
}

impl IkSolver for MockIk {
    fn solve(
        &self,
        orientation: Vector3<f64>,
        position: Vector3<f64>,
        feet: &FootPoseSet,
    ) -> Result<[[f64; 3]; 4], ControlError> {
        if *self.fail.lock().unwrap() {
            return Err(ControlError::Ik("mock failure".to_string()));
        }
        self.solves.lock().unwrap().push(RecordedSolve {
            orientation,
            position,
            feet: *feet,
        });
        Ok([[0.0; 3]; 4])
    }
}

/// Mock 策略：固定原始动作向量
pub struct ConstPolicy(pub Vec<f64>);

impl Policy for ConstPolicy {
    fn evaluate(&mut self, _observation: &[f64]) -> Result<Vec<f64>, ControlError> {
        Ok(self.0.clone())
    }
}

/// mock 协作者的外部观察/控制句柄
pub struct Handles {
    pub calls: Arc<Mutex<Vec<RecordedCall>>>,
    pub solves: Arc<Mutex<Vec<RecordedSolve>>>,
    pub swing_period: Arc<Mutex<f64>>,
    pub traj_fail: Arc<Mutex<bool>>,
    pub ik_fail: Arc<Mutex<bool>>,
}

/// 默认参考站立位姿（四脚同高）
pub fn reference_poses() -> FootPoseSet {
    FootPoseSet::uniform(FootPose::from_position(Vector3::new(0.0, 0.0, nominal_foot_z())))
}

/// 构造一份输入快照（IMU 新鲜）
pub fn snapshot(command: Command) -> InputSnapshot {
    InputSnapshot {
        command,
        trim: TrimInput::default(),
        imu: ImuSample::default(),
        contacts: ContactState::default(),
        imu_age: Some(Duration::from_millis(1)),
    }
}

/// 用 mock 协作者组一个 FusionCycle，同时返回记录句柄
pub fn build_cycle(
    config: ControllerConfig,
    policy: Option<Box<dyn Policy>>,
) -> (FusionCycle, Handles) {
    let trajectory = MockTrajectory::new(reference_poses());
    let ik = MockIk::new();
    let handles = Handles {
        calls: Arc::clone(&trajectory.calls),
        solves: Arc::clone(&ik.solves),
        swing_period: Arc::clone(&trajectory.swing_period),
        traj_fail: Arc::clone(&trajectory.fail),
        ik_fail: Arc::clone(&ik.fail),
    };
    let cycle = FusionCycle::new(
        config,
        Box::new(trajectory),
        Box::new(ik),
        policy,
        reference_poses(),
    )
    .unwrap();
    (cycle, handles)
}

/// 参考位姿的足端 z 高度（与 [`reference_poses`] 一致）
pub fn nominal_foot_z() -> f64 {
    -0.2
}
