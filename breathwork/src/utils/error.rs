//! 全局错误处理模块
//!
//! 提供统一的应用错误类型和用户友好的错误消息
//!
//! # 功能
//!
//! - 统一的 `AppError` 类型，聚合所有模块错误
//! - 用户友好的错误消息
//! - 可序列化的错误代码
//! - 错误恢复建议
//!
//! # 使用示例
//!
//! ```
//! use breathwork_lib::state::PresetLoader;
//! use breathwork_lib::utils::error::{AppError, AppResult};
//!
//! fn load() -> AppResult<()> {
//!     let _settings = PresetLoader::parse("{\"breath_count\": 10}")?;
//!     Ok(())
//! }
//!
//! assert!(load().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::error::AudioError;
use crate::engine::error::EngineError;
use crate::state::ConfigError;

/// 应用错误类型
///
/// 聚合所有模块的错误类型，提供统一的错误处理接口
#[derive(Error, Debug)]
pub enum AppError {
    /// 音频错误
    #[error("Audio error: {0}")]
    Audio(#[from] AudioError),

    /// 配置错误
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// 引擎错误
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),
}

/// 错误代码
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // 音频错误
    /// 找不到输出设备
    AudioDeviceNotFound,
    /// 音频流错误
    AudioStreamError,
    /// 提示音解码失败
    AudioDecodeFailed,
    /// 重采样失败
    AudioResampleFailed,

    // 配置错误
    /// 预设加载失败
    ConfigLoadFailed,
    /// 配置无效
    ConfigInvalid,

    // 引擎错误
    /// 引擎未运行
    EngineNotRunning,
}

/// 错误上下文信息
///
/// 提供用户友好的错误信息和恢复建议
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// 错误代码
    pub code: ErrorCode,
    /// 用户友好的错误消息
    pub message: String,
    /// 详细错误信息（用于日志）
    pub detail: Option<String>,
    /// 恢复建议
    pub recovery_hint: Option<String>,
    /// 是否可恢复
    pub recoverable: bool,
}

impl ErrorContext {
    /// 创建新的错误上下文
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: None,
            recovery_hint: None,
            recoverable: true,
        }
    }

    /// 设置详细信息
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// 设置恢复建议
    pub fn with_recovery_hint(mut self, hint: impl Into<String>) -> Self {
        self.recovery_hint = Some(hint.into());
        self
    }

    /// 标记为不可恢复
    pub fn not_recoverable(mut self) -> Self {
        self.recoverable = false;
        self
    }
}

impl AppError {
    /// 获取错误代码
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Audio(AudioError::DeviceNotFound) => ErrorCode::AudioDeviceNotFound,
            AppError::Audio(AudioError::Decode(_))
            | AppError::Audio(AudioError::NoAudioTrack(_))
            | AppError::Audio(AudioError::Io(_)) => ErrorCode::AudioDecodeFailed,
            AppError::Audio(AudioError::ResampleFailed(_)) => ErrorCode::AudioResampleFailed,
            AppError::Audio(_) => ErrorCode::AudioStreamError,

            AppError::Config(ConfigError::Io(_)) => ErrorCode::ConfigLoadFailed,
            AppError::Config(_) => ErrorCode::ConfigInvalid,

            AppError::Engine(_) => ErrorCode::EngineNotRunning,
        }
    }

    /// 获取用户友好的错误消息
    pub fn user_message(&self) -> String {
        match self {
            AppError::Audio(AudioError::DeviceNotFound) => {
                "No audio output device was found".to_string()
            }
            AppError::Audio(AudioError::Decode(_)) | AppError::Audio(AudioError::NoAudioTrack(_)) => {
                "A breathing cue could not be decoded".to_string()
            }
            AppError::Audio(AudioError::Io(_)) => "A breathing cue could not be read".to_string(),
            AppError::Audio(AudioError::UnsupportedSampleFormat(_)) => {
                "The output device uses an unsupported sample format".to_string()
            }
            AppError::Audio(_) => "Audio playback failed".to_string(),

            AppError::Config(ConfigError::Io(_)) => "The preset file could not be read".to_string(),
            AppError::Config(ConfigError::Json(_)) => "The preset file is not valid JSON".to_string(),
            AppError::Config(ConfigError::InvalidSpeed(value)) => {
                format!("Unknown speed '{}'", value)
            }
            AppError::Config(ConfigError::InvalidPhaseSet(value)) => {
                format!("Unknown phase set '{}'", value)
            }

            AppError::Engine(_) => "The breathing engine is not running".to_string(),
        }
    }

    /// 获取完整的错误上下文
    pub fn context(&self) -> ErrorContext {
        let mut ctx = ErrorContext::new(self.code(), self.user_message()).with_detail(self.to_string());

        ctx.recovery_hint = self.recovery_hint();

        if !self.is_recoverable() {
            ctx = ctx.not_recoverable();
        }

        ctx
    }

    /// 获取恢复建议
    pub fn recovery_hint(&self) -> Option<String> {
        match self {
            AppError::Audio(AudioError::DeviceNotFound) => Some(
                "Connect an output device, pick one with --device, or run with --mute".to_string(),
            ),
            AppError::Audio(AudioError::Io(_)) | AppError::Audio(AudioError::NoAudioTrack(_)) => {
                Some("Check that --sounds points at breath-in.mp3 and breath-out.mp3".to_string())
            }
            AppError::Config(ConfigError::Json(_)) => {
                Some("Fix the preset file or start without --preset".to_string())
            }
            AppError::Config(ConfigError::InvalidSpeed(_)) => {
                Some("Use one of: slow, medium, fast".to_string())
            }
            AppError::Config(ConfigError::InvalidPhaseSet(_)) => {
                Some("Use one of: breath-only, minimal, rounds, extended".to_string())
            }
            _ => None,
        }
    }

    /// 检查错误是否可恢复
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AppError::Engine(_))
    }
}

/// 应用结果类型
pub type AppResult<T> = Result<T, AppError>;
