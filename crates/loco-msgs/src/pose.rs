//! 足端位姿集合
//!
//! [`FootPoseSet`] 表示四条腿的目标足端位姿（机身坐标系）。
//! 名义位姿由外部轨迹发生器产生；融合循环只在**副本**上叠加残差，
//! 绝不改写发生器自己持有的基线状态。

use nalgebra::{UnitQuaternion, Vector3};

/// 腿标识，顺序固定为 FL, FR, BL, BR
///
/// 该顺序贯穿所有按腿排列的数组：接触向量、步态相位、残差分组、关节角输出。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegId {
    /// 左前
    FL,
    /// 右前
    FR,
    /// 左后
    BL,
    /// 右后
    BR,
}

impl LegId {
    /// 全部腿，按约定顺序
    pub const ALL: [LegId; 4] = [LegId::FL, LegId::FR, LegId::BL, LegId::BR];

    /// 在按腿排列的数组中的下标
    pub fn index(&self) -> usize {
        match self {
            LegId::FL => 0,
            LegId::FR => 1,
            LegId::BL => 2,
            LegId::BR => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LegId::FL => "FL",
            LegId::FR => "FR",
            LegId::BL => "BL",
            LegId::BR => "BR",
        }
    }
}

/// 单条腿的足端位姿（机身坐标系）
///
/// 残差修正只作用于 `position`；`orientation` 从轨迹发生器原样透传。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FootPose {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl Default for FootPose {
    fn default() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
        }
    }
}

impl FootPose {
    pub fn from_position(position: Vector3<f64>) -> Self {
        Self {
            position,
            orientation: UnitQuaternion::identity(),
        }
    }
}

/// 四条腿的足端位姿集合
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FootPoseSet {
    poses: [FootPose; 4],
}

impl FootPoseSet {
    /// 按 FL, FR, BL, BR 顺序构造
    pub fn new(poses: [FootPose; 4]) -> Self {
        Self { poses }
    }

    /// 四条腿使用同一位姿（常用于参考站立姿态）
    pub fn uniform(pose: FootPose) -> Self {
        Self { poses: [pose; 4] }
    }

    pub fn get(&self, leg: LegId) -> &FootPose {
        &self.poses[leg.index()]
    }

    pub fn get_mut(&mut self, leg: LegId) -> &mut FootPose {
        &mut self.poses[leg.index()]
    }

    /// 按约定顺序迭代 (腿, 位姿)
    pub fn iter(&self) -> impl Iterator<Item = (LegId, &FootPose)> {
        LegId::ALL.iter().copied().zip(self.poses.iter())
    }
}

impl std::ops::Index<LegId> for FootPoseSet {
    type Output = FootPose;

    fn index(&self, leg: LegId) -> &FootPose {
        &self.poses[leg.index()]
    }
}

impl std::ops::IndexMut<LegId> for FootPoseSet {
    fn index_mut(&mut self, leg: LegId) -> &mut FootPose {
        &mut self.poses[leg.index()]
    }
}
