//! Error types for Carta
//!
//! 모든 에러를 중앙에서 관리

use std::fmt;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Carta 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 이벤트 계약 관련
    // ========================================================================
    /// 이벤트 분류 체계에 없는 이름
    #[error("Unknown event kind: {0}")]
    UnknownEventKind(String),

    /// payload 구조 불변식 위반 (전달되지 않음)
    #[error("Validation error: {0}")]
    Validation(String),

    /// 좌표 투영 실패
    #[error("Projection error: {0}")]
    Projection(String),

    /// 한 번의 fire 동안 실패한 리스너 모음
    #[error("{0}")]
    Listeners(ListenerErrors),

    // ========================================================================
    // 설정 관련
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Validation 에러 생성 헬퍼
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    /// 투영 capability 실패를 변환
    pub fn projection(err: &anyhow::Error) -> Self {
        Error::Projection(format!("{err:#}"))
    }

    /// 호출자 코드의 버그로 인한 에러인지 확인 (시스템이 복구할 수 없음)
    pub fn is_programmer_error(&self) -> bool {
        matches!(self, Error::UnknownEventKind(_) | Error::Validation(_))
    }

    /// 리스너 실패 목록 (Listeners 변형일 때만)
    pub fn listener_failures(&self) -> Option<&[ListenerFailure]> {
        match self {
            Error::Listeners(errors) => Some(&errors.failures),
            _ => None,
        }
    }
}

// ============================================================================
// 리스너 실패 집계
// ============================================================================

/// 개별 리스너 실패 정보
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFailure {
    /// 실패한 리스너의 구독 ID
    pub listener_id: u64,
    /// 실패 메시지 (Err 또는 panic 내용)
    pub message: String,
}

/// 한 이벤트 전달 중 발생한 모든 리스너 실패
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerErrors {
    /// 전달 중이던 이벤트 이름
    pub kind: String,
    /// 등록 순서대로 정렬된 실패 목록
    pub failures: Vec<ListenerFailure>,
}

impl fmt::Display for ListenerErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} listener(s) failed while handling '{}'",
            self.failures.len(),
            self.kind
        )?;
        for failure in &self.failures {
            write!(f, "; listener-{}: {}", failure.listener_id, failure.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_errors_display() {
        let err = Error::Listeners(ListenerErrors {
            kind: "click".to_string(),
            failures: vec![
                ListenerFailure {
                    listener_id: 3,
                    message: "boom".to_string(),
                },
                ListenerFailure {
                    listener_id: 7,
                    message: "bad state".to_string(),
                },
            ],
        });

        let rendered = err.to_string();
        assert!(rendered.starts_with("2 listener(s) failed while handling 'click'"));
        assert!(rendered.contains("listener-3: boom"));
        assert!(rendered.contains("listener-7: bad state"));
        assert_eq!(err.listener_failures().map(|f| f.len()), Some(2));
    }

    #[test]
    fn test_programmer_errors() {
        assert!(Error::UnknownEventKind("tap".into()).is_programmer_error());
        assert!(Error::validation("empty touch").is_programmer_error());
        assert!(!Error::Projection("off globe".into()).is_programmer_error());
        assert!(Error::Config("x".into()).listener_failures().is_none());
    }

    #[test]
    fn test_projection_keeps_context() {
        let source = anyhow::anyhow!("matrix not invertible").context("unproject failed");
        let err = Error::projection(&source);
        assert_eq!(
            err.to_string(),
            "Projection error: unproject failed: matrix not invertible"
        );
    }
}
