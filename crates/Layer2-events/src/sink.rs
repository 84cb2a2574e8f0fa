//! Error Sink - 구독자 없는 `error` 이벤트의 대체 출력
//!
//! `error` 이벤트에 리스너가 하나도 없으면 디스패처가 이벤트를 버리지 않고
//! 여기에 넘깁니다. 구현체는 절대 panic하거나 실패를 전파하면 안 됩니다.

use crate::payload::{ErrorEvent, MapEvent};
use carta_foundation::ErrorSinkConfig;
use tracing::error;

/// 처리되지 않은 에러 이벤트 출력 trait
pub trait ErrorSink: Send + Sync {
    fn report(&self, event: &MapEvent, error: &ErrorEvent);
}

/// 사람이 읽을 수 있는 한 줄 표현
pub fn render_error(target: &str, event: &MapEvent, error: &ErrorEvent) -> String {
    format!(
        "[{}] {} at {}: {}",
        target,
        event.owner(),
        event.timestamp().to_rfc3339(),
        error
    )
}

/// tracing으로 출력하는 기본 에러 싱크
#[derive(Debug, Clone, Default)]
pub struct TracingErrorSink {
    config: ErrorSinkConfig,
}

impl TracingErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ErrorSinkConfig) -> Self {
        Self { config }
    }
}

impl ErrorSink for TracingErrorSink {
    fn report(&self, event: &MapEvent, err: &ErrorEvent) {
        error!(
            owner = %event.owner(),
            resource = ?err.key,
            "{}",
            render_error(&self.config.target, event, err)
        );
    }
}
