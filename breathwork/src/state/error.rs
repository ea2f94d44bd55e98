use thiserror::Error;

/// 配置相关错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 反序列化错误
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 无效的速度值
    #[error("Invalid speed '{0}', expected one of: slow, medium, fast")]
    InvalidSpeed(String),

    /// 无效的阶段集合
    #[error("Invalid phase set '{0}', expected one of: breath-only, minimal, rounds, extended")]
    InvalidPhaseSet(String),
}

/// 配置模块的结果类型
pub type ConfigResult<T> = Result<T, ConfigError>;
