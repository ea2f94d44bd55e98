use thiserror::Error;

/// 引擎相关错误
#[derive(Error, Debug)]
pub enum EngineError {
    /// 引擎任务已退出，无法再接收命令
    #[error("Breathing engine is not running")]
    Closed,

    /// 引擎任务异常退出
    #[error("Breathing engine task failed: {0}")]
    TaskFailed(String),
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(e: tokio::task::JoinError) -> Self {
        EngineError::TaskFailed(e.to_string())
    }
}

/// 引擎结果类型
pub type EngineResult<T> = Result<T, EngineError>;
