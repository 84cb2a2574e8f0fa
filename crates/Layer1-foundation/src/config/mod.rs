//! Config - 통합 설정 관리
//!
//! 디스패처, 라이프사이클 추적기, 에러 싱크 설정을 하나의 TOML 파일로 관리합니다.
//!
//! ```toml
//! [dispatcher]
//! debugMode = true
//!
//! [lifecycle]
//! warnOnUnannouncedTerminal = true
//!
//! [errorSink]
//! target = "my-map"
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 기본 에러 싱크 라벨
pub const DEFAULT_ERROR_SINK_TARGET: &str = "carta::error";

// ============================================================================
// CartaConfig (통합)
// ============================================================================

/// Carta 통합 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CartaConfig {
    /// 디스패처 설정
    pub dispatcher: DispatcherConfig,

    /// 라이프사이클 추적기 설정
    pub lifecycle: LifecycleConfig,

    /// 에러 싱크 설정
    pub error_sink: ErrorSinkConfig,
}

impl CartaConfig {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Load
    // ========================================================================

    /// TOML 문자열에서 로드
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 로드
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Toml(inner) => Error::Config(format!("{}: {}", path.display(), inner)),
            other => other,
        })
    }

    /// 파일이 없으면 기본값
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load_from(path)
        } else {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.error_sink.target.trim().is_empty() {
            return Err(Error::Config("errorSink.target must not be empty".into()));
        }
        Ok(())
    }
}

// ============================================================================
// 세부 설정
// ============================================================================

/// 디스패처 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DispatcherConfig {
    /// 디버그 모드 (모든 전달을 trace 로깅)
    pub debug_mode: bool,
}

/// 라이프사이클 추적기 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LifecycleConfig {
    /// loading 없이 도착한 종료 이벤트를 경고로 기록
    pub warn_on_unannounced_terminal: bool,
}

/// 에러 싱크 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ErrorSinkConfig {
    /// 출력 라인에 붙는 라벨
    pub target: String,
}

impl Default for ErrorSinkConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_ERROR_SINK_TARGET.to_string(),
        }
    }
}
