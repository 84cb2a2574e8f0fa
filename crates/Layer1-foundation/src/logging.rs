//! Logging - tracing subscriber 초기화
//!
//! 라이브러리 자체는 `tracing` 매크로만 사용합니다. 호스트 애플리케이션이나
//! 테스트 하네스는 이 함수로 fmt subscriber를 설치할 수 있습니다.

use crate::{Error, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 전역 tracing subscriber 설치
///
/// `RUST_LOG`가 설정되어 있으면 우선하고, 아니면 `default_level`을 사용합니다.
/// 이미 subscriber가 설치된 경우 에러를 반환합니다.
pub fn init_tracing(default_level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .try_init()
        .map_err(|e| Error::Config(format!("failed to install tracing subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        // 다른 테스트가 먼저 설치했을 수 있으므로 첫 결과는 무시
        let _ = init_tracing("debug");
        assert!(matches!(init_tracing("debug"), Err(Error::Config(_))));
    }
}
