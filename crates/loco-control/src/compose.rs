//! 位姿合成
//!
//! 把名义足端位姿（来自外部轨迹发生器）与策略残差合成为最终目标。
//! 合成是纯函数：在入口处取走名义位姿的独立副本，绝不回写发生器的
//! 基线状态；残差只叠加到位置分量，姿态分量原样透传。
//!
//! 固定操作顺序：名义轨迹生成 → 副本 → 残差叠加 → IK 调用。

use nalgebra::Vector3;

use loco_msgs::{FootPoseSet, LegId};

use crate::policy::ResidualAction;

/// 合成名义位姿与残差
///
/// 返回（修正后的足端位姿集合, 修正后的机身位置）。
/// 残差为零向量时输出与输入逐位相等（幂等）。
pub fn compose(
    nominal: &FootPoseSet,
    residual: &ResidualAction,
    body_position: Vector3<f64>,
) -> (FootPoseSet, Vector3<f64>) {
    let mut adjusted = *nominal;
    for leg in LegId::ALL {
        adjusted[leg].position += residual.leg_deltas[leg.index()];
    }
    let mut body = body_position;
    body.z += residual.body_height_delta;
    (adjusted, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loco_msgs::FootPose;
    use nalgebra::UnitQuaternion;

    fn nominal() -> FootPoseSet {
        let mut set = FootPoseSet::default();
        set[LegId::FL].position = Vector3::new(0.1, 0.05, -0.2);
        set[LegId::BR].position = Vector3::new(-0.1, -0.05, -0.2);
        set[LegId::FR] = FootPose {
            position: Vector3::new(0.1, -0.05, -0.18),
            orientation: UnitQuaternion::from_euler_angles(0.1, 0.0, 0.0),
        };
        set
    }

    #[test]
    fn test_zero_residual_is_identity() {
        let set = nominal();
        let body = Vector3::new(0.0, 0.0, 0.02);
        let (out, out_body) = compose(&set, &ResidualAction::zero(), body);
        assert_eq!(out, set);
        assert_eq!(out_body, body);
    }

    #[test]
    fn test_residual_moves_positions_only() {
        let set = nominal();
        let mut residual = ResidualAction::zero();
        residual.leg_deltas[LegId::FR.index()] = Vector3::new(0.01, -0.02, 0.03);
        residual.body_height_delta = 0.005;

        let (out, out_body) = compose(&set, &residual, Vector3::zeros());
        assert_eq!(
            out[LegId::FR].position,
            set[LegId::FR].position + Vector3::new(0.01, -0.02, 0.03)
        );
        // 姿态透传
        assert_eq!(out[LegId::FR].orientation, set[LegId::FR].orientation);
        // 其他腿不动
        assert_eq!(out[LegId::FL], set[LegId::FL]);
        assert_eq!(out_body.z, 0.005);
    }

    #[test]
    fn test_nominal_input_not_mutated() {
        let set = nominal();
        let snapshot = set;
        let mut residual = ResidualAction::zero();
        residual.leg_deltas = [Vector3::new(1.0, 1.0, 1.0); 4];
        let _ = compose(&set, &residual, Vector3::zeros());
        assert_eq!(set, snapshot);
    }
}
