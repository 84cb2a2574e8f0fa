//! carta-events: 지도 상호작용 이벤트 계약
//!
//! Layer2 - 지도 표면이 발행하는 이벤트의 종류, payload, 전달 순서를 정의합니다.
//!
//! # 주요 모듈
//!
//! - `kind`: 이벤트 분류 체계 (EventKind, payload 형태 표)
//! - `payload`: 종류별 payload와 MapEvent 봉투
//! - `builder`: 원시 입력 + 투영 capability → payload
//! - `dispatcher`: 지도별 리스너 레지스트리 (on, once, off, fire)
//! - `lifecycle`: 리소스 로딩 상태 추적 (Idle, Loading, Settled)
//! - `sink`: 구독자 없는 error 이벤트 출력
//! - `map`: 위 구성 요소를 묶는 지도별 owner
//!
//! # 사용 예시
//!
//! ```ignore
//! use carta_events::{DataExtras, DataType, EventKind, MapEvents};
//!
//! let map = MapEvents::new();
//!
//! map.once(EventKind::Load, |_| {
//!     println!("map loaded");
//!     Ok(())
//! });
//!
//! let loading = map.source_data(EventKind::DataLoading, DataExtras::new("r1"))?;
//! map.emit(&loading)?;
//! assert!(map.is_outstanding(DataType::Source, "r1", None));
//!
//! let done = map.source_data(EventKind::Data, DataExtras::new("r1"))?;
//! map.emit(&done)?;
//! assert!(!map.is_outstanding(DataType::Source, "r1", None));
//! ```

pub mod builder;
pub mod dispatcher;
pub mod kind;
pub mod lifecycle;
pub mod map;
pub mod payload;
pub mod sink;

// Re-exports: Taxonomy
pub use kind::{payload_shape_for, EventCategory, EventKind, PayloadShape};

// Re-exports: Payload
pub use payload::{
    DataEvent, DataType, ErrorEvent, EventPayload, MapEvent, MapId, MotionSource, OriginalEvent,
    PointerEvent, SourceData, SourceDataType, StyleData, TileRef, TileState, TouchEvent,
};

// Re-exports: Builder
pub use builder::{DataExtras, PayloadBuilder};

// Re-exports: Dispatcher
pub use dispatcher::{Dispatcher, EventListener, ListenerId, Subscription};

// Re-exports: Lifecycle
pub use lifecycle::{DataLifecycleTracker, LifecycleKey, LifecycleState, Transition};

// Re-exports: Sink
pub use sink::{render_error, ErrorSink, TracingErrorSink};

// Re-exports: Map
pub use map::MapEvents;

// Re-exports: Foundation
pub use carta_foundation::{
    CartaConfig, Error, LngLat, Result, ScreenPoint, TileCoord, Unproject,
};
