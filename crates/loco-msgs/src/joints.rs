//! 关节角输出消息

use crate::pose::LegId;

/// 关节角输出（IK 结果）
///
/// 每条腿三个关节（肩/肘/腕），单位为**度**；IK 求解器输出弧度，
/// 由 [`JointAngleSet::from_radians`] 在打包时统一转换。
/// `step_or_view` 镜像指令中的运动模式，供下游执行器区分步态/姿态。
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct JointAngleSet {
    /// 按 FL, FR, BL, BR 排列，每条腿 [肩, 肘, 腕]（度）
    pub angles: [[f64; 3]; 4],
    /// false = 踏步模式，true = 姿态模式
    pub step_or_view: bool,
}

impl JointAngleSet {
    /// 从弧度制 IK 输出打包
    pub fn from_radians(radians: [[f64; 3]; 4], step_or_view: bool) -> Self {
        let mut angles = [[0.0; 3]; 4];
        for (leg, joints) in radians.iter().enumerate() {
            for (j, &angle) in joints.iter().enumerate() {
                angles[leg][j] = angle.to_degrees();
            }
        }
        Self {
            angles,
            step_or_view,
        }
    }

    /// 某条腿的 [肩, 肘, 腕] 角度（度）
    pub fn leg(&self, leg: LegId) -> [f64; 3] {
        self.angles[leg.index()]
    }
}
