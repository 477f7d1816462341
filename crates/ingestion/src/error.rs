//! Ingestion 错误类型

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 输入源打开失败
    #[error("failed to open source '{source_name}': {error}")]
    OpenFailed {
        /// 输入源名称
        source_name: String,
        /// 底层错误
        #[source]
        error: std::io::Error,
    },

    /// 读取失败
    #[error("read error on source '{source_name}': {error}")]
    ReadFailed {
        /// 输入源名称
        source_name: String,
        /// 底层错误
        #[source]
        error: std::io::Error,
    },
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
