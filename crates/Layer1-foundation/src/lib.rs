//! # carta-foundation
//!
//! Foundation layer for Carta:
//! - Error: 에러 분류 (UnknownEventKind, Validation, Projection, Listeners)
//! - Geo: 화면/지리/타일 좌표와 Unproject capability
//! - Config: 통합 설정 (CartaConfig, TOML 로드)
//! - Logging: tracing subscriber 초기화
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Layer2-events                                          │
//! │  ├── EventKind / payload / PayloadBuilder               │
//! │  ├── Dispatcher (on, once, off, fire)                   │
//! │  └── DataLifecycleTracker / ErrorSink / MapEvents       │
//! ├─────────────────────────────────────────────────────────┤
//! │  Layer1-foundation (이 레이어)                          │
//! │  ├── Error, Result                                      │
//! │  ├── ScreenPoint, LngLat, TileCoord, Unproject          │
//! │  └── CartaConfig, init_tracing                          │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod geo;
pub mod logging;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, ListenerErrors, ListenerFailure, Result};

// ============================================================================
// Geo
// ============================================================================
pub use geo::{LngLat, ScreenPoint, TileCoord, Unproject};

// ============================================================================
// Config
// ============================================================================
pub use config::{CartaConfig, DispatcherConfig, ErrorSinkConfig, LifecycleConfig};

// ============================================================================
// Logging
// ============================================================================
pub use logging::init_tracing;
