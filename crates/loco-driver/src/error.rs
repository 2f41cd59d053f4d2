//! 驱动层错误类型定义

use thiserror::Error;

/// 驱动层错误类型
///
/// 运行期的数据面错误（非法采样、慢速订阅者）不走这里：
/// 它们被就地记录、计数并吸收，不会中断任何线程。
#[derive(Error, Debug)]
pub enum DriverError {
    /// 配置非法（构建期，致命）
    #[error("Invalid driver config: {0}")]
    InvalidConfig(String),
}
