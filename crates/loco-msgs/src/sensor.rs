//! 传感器采样消息与入口变换
//!
//! 两条传感器通道（IMU、足端接触）都是 last-value 语义：无队列、无时间戳，
//! 最新值覆盖旧值。入口变换在本层完成：
//! - 陀螺仪角速度 度 → 弧度
//! - 垂直加速度减去重力偏置（9.81 m/s²）
//!
//! 变换后的 [`ImuSample`] 直接按观测向量约定排序
//! `(roll, pitch, gx, gy, gz, ax, ay, az)`。

use nalgebra::Vector3;

use crate::error::{check_finite, MsgError};
use crate::pose::LegId;

/// 重力加速度（m/s²），入口处从 `acc_z` 中扣除
pub const GRAVITY: f64 = 9.81;

/// 未变换的 IMU 原始读数（陀螺仪单位：度/秒）
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawImu {
    pub roll: f64,
    pub pitch: f64,
    /// 角速度（度/秒）
    pub gyro_x: f64,
    pub gyro_y: f64,
    pub gyro_z: f64,
    /// 加速度（m/s²，未做重力补偿）
    pub acc_x: f64,
    pub acc_y: f64,
    pub acc_z: f64,
}

/// 入口变换后的 IMU 采样
///
/// 陀螺仪已转换为弧度/秒，`acc.z` 已扣除重力。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuSample {
    /// 滚转角（弧度）
    pub roll: f64,
    /// 俯仰角（弧度）
    pub pitch: f64,
    /// 角速度（弧度/秒）
    pub gyro: Vector3<f64>,
    /// 重力补偿后的加速度（m/s²）
    pub acc: Vector3<f64>,
}

impl Default for ImuSample {
    fn default() -> Self {
        Self {
            roll: 0.0,
            pitch: 0.0,
            gyro: Vector3::zeros(),
            acc: Vector3::zeros(),
        }
    }
}

impl ImuSample {
    /// 入口变换：校验有限性、陀螺仪度→弧度、重力补偿
    ///
    /// 任一字段非有限则整条采样被拒绝，调用方应保留上一个有效值。
    pub fn ingest(raw: RawImu) -> Result<Self, MsgError> {
        Ok(Self {
            roll: check_finite("roll", raw.roll)?,
            pitch: check_finite("pitch", raw.pitch)?,
            gyro: Vector3::new(
                check_finite("gyro_x", raw.gyro_x)?.to_radians(),
                check_finite("gyro_y", raw.gyro_y)?.to_radians(),
                check_finite("gyro_z", raw.gyro_z)?.to_radians(),
            ),
            acc: Vector3::new(
                check_finite("acc_x", raw.acc_x)?,
                check_finite("acc_y", raw.acc_y)?,
                check_finite("acc_z", raw.acc_z)? - GRAVITY,
            ),
        })
    }

    /// 观测向量片段，固定顺序 `(r, p, gx, gy, gz, ax, ay, az)`
    pub fn as_observation(&self) -> [f64; 8] {
        [
            self.roll,
            self.pitch,
            self.gyro.x,
            self.gyro.y,
            self.gyro.z,
            self.acc.x,
            self.acc.y,
            self.acc.z,
        ]
    }
}

/// 足端接触状态，顺序固定为 FL, FR, BL, BR
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContactState {
    pub legs: [bool; 4],
}

impl ContactState {
    pub fn new(fl: bool, fr: bool, bl: bool, br: bool) -> Self {
        Self {
            legs: [fl, fr, bl, br],
        }
    }

    /// 某条腿是否触地
    pub fn is_down(&self, leg: LegId) -> bool {
        self.legs[leg.index()]
    }

    /// 观测向量片段（0.0 / 1.0 指示值，不参与归一化）
    pub fn as_observation(&self) -> [f64; 4] {
        let mut out = [0.0; 4];
        for (o, &c) in out.iter_mut().zip(self.legs.iter()) {
            *o = if c { 1.0 } else { 0.0 };
        }
        out
    }
}
