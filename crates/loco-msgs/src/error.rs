//! 消息层错误类型定义

use thiserror::Error;

/// 消息层错误类型
///
/// 入口校验失败时返回，调用方（ingress 线程）应记录日志并保留上一个有效值。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MsgError {
    /// 采样中包含非有限值（NaN / Inf）
    #[error("Non-finite value in field `{field}`: {value}")]
    NonFinite { field: &'static str, value: f64 },
}

/// 校验单个标量是否有限
pub(crate) fn check_finite(field: &'static str, value: f64) -> Result<f64, MsgError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MsgError::NonFinite { field, value })
    }
}
