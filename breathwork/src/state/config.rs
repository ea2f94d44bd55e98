//! 练习配置模块
//!
//! 提供呼吸练习参数的定义、预设加载和运行时共享
//!
//! # 配置来源
//!
//! - 命令行参数（优先级最高）
//! - 只读 JSON 预设文件（可选）
//! - 内置默认值
//!
//! 配置从不写回磁盘。
//!
//! # 使用示例
//!
//! ```
//! use breathwork_lib::state::{BreathSettings, SettingsHolder, Speed};
//!
//! let holder = SettingsHolder::new(BreathSettings::default());
//! holder.set_speed(Speed::Slow);
//! assert_eq!(holder.get().target_cycle_ms(), 4000);
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};

/// 呼吸次数的建议范围（UI 提示，不强制）
pub const BREATH_COUNT_RANGE: (u32, u32) = (1, 20);

/// 轮数的建议范围（UI 提示，不强制）
pub const ROUND_COUNT_RANGE: (u32, u32) = (1, 10);

/// 呼吸速度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    Slow,
    Medium,
    Fast,
}

impl Speed {
    /// 所有速度选项
    pub const ALL: [Speed; 3] = [Speed::Slow, Speed::Medium, Speed::Fast];

    /// 目标半周期时长（毫秒）
    pub fn target_cycle_ms(self) -> u64 {
        match self {
            Speed::Slow => 4000,
            Speed::Medium => 2500,
            Speed::Fast => 1500,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Speed::Slow => "slow",
            Speed::Medium => "medium",
            Speed::Fast => "fast",
        }
    }
}

impl Default for Speed {
    fn default() -> Self {
        Speed::Medium
    }
}

impl fmt::Display for Speed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Speed {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slow" => Ok(Speed::Slow),
            "medium" => Ok(Speed::Medium),
            "fast" => Ok(Speed::Fast),
            other => Err(ConfigError::InvalidSpeed(other.to_string())),
        }
    }
}

/// 阶段集合
///
/// 选择状态机启用的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseSet {
    /// 仅呼吸，不跟踪轮次
    BreathOnly,
    /// 单轮呼吸，完成后直接结束
    Minimal,
    /// 多轮呼吸，轮与轮之间不停顿
    Rounds,
    /// 多轮呼吸，每轮后包含屏息、恢复和休息
    Extended,
}

impl PhaseSet {
    pub const ALL: [PhaseSet; 4] = [
        PhaseSet::BreathOnly,
        PhaseSet::Minimal,
        PhaseSet::Rounds,
        PhaseSet::Extended,
    ];

    /// 是否跟踪多轮
    pub fn tracks_rounds(self) -> bool {
        matches!(self, PhaseSet::Rounds | PhaseSet::Extended)
    }

    /// 是否在进度中显示轮次
    pub fn shows_rounds(self) -> bool {
        !matches!(self, PhaseSet::BreathOnly)
    }

    /// 实际生效的轮数
    pub fn effective_rounds(self, round_count: u32) -> u32 {
        if self.tracks_rounds() { round_count } else { 1 }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PhaseSet::BreathOnly => "breath-only",
            PhaseSet::Minimal => "minimal",
            PhaseSet::Rounds => "rounds",
            PhaseSet::Extended => "extended",
        }
    }
}

impl Default for PhaseSet {
    fn default() -> Self {
        PhaseSet::Extended
    }
}

impl fmt::Display for PhaseSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhaseSet {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "breath-only" => Ok(PhaseSet::BreathOnly),
            "minimal" => Ok(PhaseSet::Minimal),
            "rounds" => Ok(PhaseSet::Rounds),
            "extended" => Ok(PhaseSet::Extended),
            other => Err(ConfigError::InvalidPhaseSet(other.to_string())),
        }
    }
}

/// 呼吸练习配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreathSettings {
    /// 每轮呼吸次数（一吸一呼为一次）
    pub breath_count: u32,
    /// 轮数
    pub round_count: u32,
    /// 速度
    pub speed: Speed,
    /// 阶段集合
    pub phase_set: PhaseSet,
    /// 最后一轮结束后是否仍然休息
    pub rest_after_final_round: bool,
}

impl Default for BreathSettings {
    fn default() -> Self {
        Self {
            breath_count: 5,
            round_count: 3,
            speed: Speed::Medium,
            phase_set: PhaseSet::Extended,
            rest_after_final_round: false,
        }
    }
}

impl BreathSettings {
    /// 目标半周期时长（毫秒）
    pub fn target_cycle_ms(&self) -> u64 {
        self.speed.target_cycle_ms()
    }

    /// 每轮的半周期数
    pub fn cycles_per_round(&self) -> u32 {
        self.breath_count.saturating_mul(2)
    }

    /// 实际生效的轮数
    pub fn effective_rounds(&self) -> u32 {
        self.phase_set.effective_rounds(self.round_count)
    }

    /// 检查超出建议范围的数值
    ///
    /// 超出范围的值仍会被接受，这里只返回提示信息
    pub fn range_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        let (min, max) = BREATH_COUNT_RANGE;
        if !(min..=max).contains(&self.breath_count) {
            warnings.push(format!(
                "breath count {} is outside the suggested range {}-{}",
                self.breath_count, min, max
            ));
        }

        let (min, max) = ROUND_COUNT_RANGE;
        if self.phase_set.tracks_rounds() && !(min..=max).contains(&self.round_count) {
            warnings.push(format!(
                "round count {} is outside the suggested range {}-{}",
                self.round_count, min, max
            ));
        }

        warnings
    }
}

/// 预设加载器
///
/// 只读取，不写入
pub struct PresetLoader;

impl PresetLoader {
    /// 从 JSON 文件加载预设
    ///
    /// 缺失字段使用默认值
    pub fn load(path: &Path) -> ConfigResult<BreathSettings> {
        tracing::debug!(path = %path.display(), "Loading preset");

        let content = std::fs::read_to_string(path)?;
        let settings = Self::parse(&content)?;

        tracing::info!(path = %path.display(), "Preset loaded successfully");
        Ok(settings)
    }

    /// 从 JSON 字符串解析预设
    pub fn parse(content: &str) -> ConfigResult<BreathSettings> {
        Ok(serde_json::from_str(content)?)
    }
}

/// 共享配置
///
/// 使用 ArcSwap 实现无锁读取，引擎在每次调度时读取最新值
pub struct SettingsHolder {
    settings: ArcSwap<BreathSettings>,
}

impl SettingsHolder {
    pub fn new(settings: BreathSettings) -> Self {
        Self {
            settings: ArcSwap::new(Arc::new(settings)),
        }
    }

    /// 获取当前配置快照
    pub fn get(&self) -> Arc<BreathSettings> {
        self.settings.load_full()
    }

    /// 整体替换配置
    pub fn update(&self, settings: BreathSettings) {
        self.settings.store(Arc::new(settings));
    }

    pub fn breath_count(&self) -> u32 {
        self.settings.load().breath_count
    }

    pub fn set_breath_count(&self, breath_count: u32) {
        self.modify(|s| s.breath_count = breath_count);
    }

    pub fn round_count(&self) -> u32 {
        self.settings.load().round_count
    }

    pub fn set_round_count(&self, round_count: u32) {
        self.modify(|s| s.round_count = round_count);
    }

    pub fn speed(&self) -> Speed {
        self.settings.load().speed
    }

    pub fn set_speed(&self, speed: Speed) {
        self.modify(|s| s.speed = speed);
    }

    pub fn phase_set(&self) -> PhaseSet {
        self.settings.load().phase_set
    }

    pub fn set_phase_set(&self, phase_set: PhaseSet) {
        self.modify(|s| s.phase_set = phase_set);
    }

    pub fn rest_after_final_round(&self) -> bool {
        self.settings.load().rest_after_final_round
    }

    pub fn set_rest_after_final_round(&self, enabled: bool) {
        self.modify(|s| s.rest_after_final_round = enabled);
    }

    fn modify(&self, f: impl Fn(&mut BreathSettings)) {
        self.settings.rcu(|current| {
            let mut next = BreathSettings::clone(current);
            f(&mut next);
            next
        });
    }
}

impl Default for SettingsHolder {
    fn default() -> Self {
        Self::new(BreathSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default() {
        let settings = BreathSettings::default();

        assert_eq!(settings.breath_count, 5);
        assert_eq!(settings.round_count, 3);
        assert_eq!(settings.speed, Speed::Medium);
        assert_eq!(settings.phase_set, PhaseSet::Extended);
        assert!(!settings.rest_after_final_round);
    }

    #[test]
    fn test_speed_table() {
        assert_eq!(Speed::Slow.target_cycle_ms(), 4000);
        assert_eq!(Speed::Medium.target_cycle_ms(), 2500);
        assert_eq!(Speed::Fast.target_cycle_ms(), 1500);
    }

    #[test]
    fn test_speed_from_str() {
        assert_eq!("slow".parse::<Speed>().unwrap(), Speed::Slow);
        assert_eq!(" FAST ".parse::<Speed>().unwrap(), Speed::Fast);
        assert!(matches!(
            "brisk".parse::<Speed>(),
            Err(ConfigError::InvalidSpeed(s)) if s == "brisk"
        ));
    }

    #[test]
    fn test_phase_set_from_str() {
        assert_eq!("breath-only".parse::<PhaseSet>().unwrap(), PhaseSet::BreathOnly);
        assert_eq!("breath_only".parse::<PhaseSet>().unwrap(), PhaseSet::BreathOnly);
        assert_eq!("Extended".parse::<PhaseSet>().unwrap(), PhaseSet::Extended);
        assert!("wim-hof".parse::<PhaseSet>().is_err());
    }

    #[test]
    fn test_effective_rounds() {
        assert_eq!(PhaseSet::Extended.effective_rounds(4), 4);
        assert_eq!(PhaseSet::Rounds.effective_rounds(4), 4);
        assert_eq!(PhaseSet::Minimal.effective_rounds(4), 1);
        assert_eq!(PhaseSet::BreathOnly.effective_rounds(4), 1);
    }

    #[test]
    fn test_range_warnings_are_permissive() {
        let settings = BreathSettings {
            breath_count: 42,
            round_count: 0,
            ..Default::default()
        };

        let warnings = settings.range_warnings();
        assert_eq!(warnings.len(), 2);
        // 值保持原样
        assert_eq!(settings.breath_count, 42);
        assert_eq!(settings.round_count, 0);

        let minimal = BreathSettings {
            round_count: 0,
            phase_set: PhaseSet::Minimal,
            ..Default::default()
        };
        assert!(minimal.range_warnings().is_empty());
    }

    #[test]
    fn test_preset_partial_json() {
        let json = r#"{ "breath_count": 8, "speed": "fast" }"#;
        let settings = PresetLoader::parse(json).unwrap();

        assert_eq!(settings.breath_count, 8);
        assert_eq!(settings.speed, Speed::Fast);
        assert_eq!(settings.round_count, 3); // 默认值
        assert_eq!(settings.phase_set, PhaseSet::Extended); // 默认值
    }

    #[test]
    fn test_preset_phase_set_kebab_case() {
        let json = r#"{ "phase_set": "breath-only" }"#;
        let settings = PresetLoader::parse(json).unwrap();
        assert_eq!(settings.phase_set, PhaseSet::BreathOnly);
    }

    #[test]
    fn test_preset_invalid_json() {
        let err = PresetLoader::parse("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_holder_setters() {
        let holder = SettingsHolder::default();

        holder.set_breath_count(12);
        holder.set_round_count(2);
        holder.set_speed(Speed::Fast);
        holder.set_phase_set(PhaseSet::Minimal);
        holder.set_rest_after_final_round(true);

        let settings = holder.get();
        assert_eq!(settings.breath_count, 12);
        assert_eq!(settings.round_count, 2);
        assert_eq!(settings.speed, Speed::Fast);
        assert_eq!(settings.phase_set, PhaseSet::Minimal);
        assert!(settings.rest_after_final_round);
    }

    #[test]
    fn test_holder_snapshot_is_stable() {
        let holder = SettingsHolder::default();
        let snapshot = holder.get();

        holder.set_breath_count(9);

        assert_eq!(snapshot.breath_count, 5);
        assert_eq!(holder.breath_count(), 9);
    }
}
