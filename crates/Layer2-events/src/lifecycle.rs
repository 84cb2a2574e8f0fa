//! Data Lifecycle Tracker - 리소스 로딩 순서 추적
//!
//! `(dataType, resourceId, tile?)` 키마다 상태 머신을 유지합니다.
//!
//! ```text
//!            *loading                data / styledata / sourcedata / error
//!   Idle ─────────────▶ Loading ─────────────────────────────────▶ Settled
//!     │                   ▲  │ (*loading 중복: no-op)                 │
//!     │                   │  └──┘                                     │
//!     │                   └───────────────── *loading ────────────────┘
//!     └──────────────── 종료 이벤트 (loading 없이) ──────────────────▶ Settled
//! ```
//!
//! 같은 키의 이벤트는 협력자가 발행한 순서대로 관찰된다고 가정하며,
//! 재정렬이나 버퍼링은 하지 않습니다.
//!
//! 타일 키는 종료되는 즉시 상태 맵에서 제거합니다 (Settled와 Idle은
//! 조회 결과가 같음). 리소스 단위 키는 지도 제거(`clear`) 때까지 남습니다.

use crate::kind::EventKind;
use crate::payload::{DataType, EventPayload, MapEvent};
use carta_foundation::{LifecycleConfig, TileCoord};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace, warn};

// ============================================================================
// LifecycleKey
// ============================================================================

/// 추적 가능한 로드 하나를 식별하는 키
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleKey {
    pub data_type: DataType,
    pub resource_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tile: Option<TileCoord>,
}

impl LifecycleKey {
    pub fn new(data_type: DataType, resource_id: impl Into<String>) -> Self {
        Self {
            data_type,
            resource_id: resource_id.into(),
            tile: None,
        }
    }

    pub fn source(source_id: impl Into<String>) -> Self {
        Self::new(DataType::Source, source_id)
    }

    pub fn style(resource_id: impl Into<String>) -> Self {
        Self::new(DataType::Style, resource_id)
    }

    pub fn with_tile(mut self, tile: TileCoord) -> Self {
        self.tile = Some(tile);
        self
    }
}

impl fmt::Display for LifecycleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.data_type, self.resource_id)?;
        if let Some(tile) = self.tile {
            write!(f, "@{tile}")?;
        }
        Ok(())
    }
}

// ============================================================================
// LifecycleState / Transition
// ============================================================================

/// 키별 로딩 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LifecycleState {
    #[default]
    Idle,
    Loading,
    Settled,
}

/// 이벤트 하나를 관찰한 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Idle/Settled → Loading
    Started { from: LifecycleState },
    /// 이미 Loading인 키에 *loading (상태 변화 없음)
    DuplicateLoading,
    /// → Settled
    Settled { from: LifecycleState },
}

// ============================================================================
// DataLifecycleTracker
// ============================================================================

/// 데이터 라이프사이클 추적기
///
/// 지도 인스턴스 하나에 속하며 상태 맵은 외부에서 변경할 수 없습니다.
#[derive(Debug, Default)]
pub struct DataLifecycleTracker {
    config: LifecycleConfig,
    states: Mutex<HashMap<LifecycleKey, LifecycleState>>,
}

impl DataLifecycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LifecycleConfig) -> Self {
        Self {
            config,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// 이벤트를 관찰하고 상태를 갱신
    ///
    /// 로딩 계열 이벤트나 키가 달린 `error`가 아니면 None.
    pub fn observe(&self, event: &MapEvent) -> Option<Transition> {
        let kind = event.kind();
        let (key, loading) = match event.payload() {
            EventPayload::Data(data) if kind.is_loading() => (data.lifecycle_key(), true),
            EventPayload::Data(data) if kind.is_data_terminal() => (data.lifecycle_key(), false),
            EventPayload::Error(error) if kind == EventKind::Error => (error.key.clone()?, false),
            _ => return None,
        };

        let mut states = self.states.lock();
        let state = states.entry(key.clone()).or_default();
        let from = *state;

        let transition = if loading {
            if from == LifecycleState::Loading {
                trace!(key = %key, kind = %kind, "Duplicate loading signal");
                Transition::DuplicateLoading
            } else {
                *state = LifecycleState::Loading;
                Transition::Started { from }
            }
        } else {
            if from == LifecycleState::Idle {
                if self.config.warn_on_unannounced_terminal {
                    warn!(key = %key, kind = %kind, "Terminal event without preceding loading");
                } else {
                    trace!(key = %key, kind = %kind, "Terminal event without preceding loading");
                }
            }
            if key.tile.is_some() {
                states.remove(&key);
            } else {
                *state = LifecycleState::Settled;
            }
            Transition::Settled { from }
        };

        debug!(key = %key, kind = %kind, ?transition, "Lifecycle transition");
        Some(transition)
    }

    /// 키의 로드가 진행 중인지 (상태 == Loading)
    pub fn is_outstanding(&self, key: &LifecycleKey) -> bool {
        self.state(key) == LifecycleState::Loading
    }

    /// 소스의 어떤 키(타일 포함)도 Loading이 아니면 true
    pub(crate) fn is_source_loaded(&self, source_id: &str) -> bool {
        !self.states.lock().iter().any(|(key, state)| {
            key.data_type == DataType::Source
                && key.resource_id == source_id
                && *state == LifecycleState::Loading
        })
    }

    /// `settling` 키가 종료된다고 가정했을 때 소스 전체가 로드 완료인지
    pub(crate) fn is_source_loaded_after(&self, settling: &LifecycleKey) -> bool {
        !self.states.lock().iter().any(|(key, state)| {
            key.data_type == DataType::Source
                && key.resource_id == settling.resource_id
                && key != settling
                && *state == LifecycleState::Loading
        })
    }

    /// 키의 현재 상태 (관찰된 적 없으면 Idle)
    pub fn state(&self, key: &LifecycleKey) -> LifecycleState {
        self.states.lock().get(key).copied().unwrap_or_default()
    }

    /// 모든 상태 제거 (지도 제거 시)
    pub(crate) fn clear(&self) {
        let mut states = self.states.lock();
        debug!(tracked = states.len(), "Clearing lifecycle state");
        states.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{DataEvent, ErrorEvent, MapId, SourceData, StyleData};

    fn source_event(kind: EventKind, id: &str, tile: Option<TileCoord>) -> MapEvent {
        let data = DataEvent::Source(SourceData {
            source_id: id.to_string(),
            is_source_loaded: false,
            source_data_type: None,
            source: None,
            tile: None,
            coord: tile,
        });
        MapEvent::new(kind, MapId::new(), EventPayload::Data(data)).unwrap()
    }

    fn style_event(kind: EventKind) -> MapEvent {
        let data = DataEvent::Style(StyleData {
            resource_id: "basemap".to_string(),
            style: None,
        });
        MapEvent::new(kind, MapId::new(), EventPayload::Data(data)).unwrap()
    }

    #[test]
    fn test_terminal_without_loading_settles() {
        let tracker = DataLifecycleTracker::new();
        let key = LifecycleKey::source("r1");

        let t = tracker.observe(&source_event(EventKind::SourceData, "r1", None));
        assert_eq!(t, Some(Transition::Settled { from: LifecycleState::Idle }));
        assert_eq!(tracker.state(&key), LifecycleState::Settled);
        assert!(!tracker.is_outstanding(&key));
    }

    #[test]
    fn test_loading_then_terminal() {
        let tracker = DataLifecycleTracker::new();
        let key = LifecycleKey::source("r1");

        tracker.observe(&source_event(EventKind::SourceDataLoading, "r1", None));
        assert!(tracker.is_outstanding(&key));

        tracker.observe(&source_event(EventKind::SourceData, "r1", None));
        assert!(!tracker.is_outstanding(&key));
    }

    #[test]
    fn test_duplicate_loading_is_noop() {
        let tracker = DataLifecycleTracker::new();
        let loading = style_event(EventKind::StyleDataLoading);

        assert_eq!(
            tracker.observe(&loading),
            Some(Transition::Started { from: LifecycleState::Idle })
        );
        assert_eq!(tracker.observe(&loading), Some(Transition::DuplicateLoading));
        assert!(tracker.is_outstanding(&LifecycleKey::style("basemap")));
    }

    #[test]
    fn test_reload_after_settled() {
        let tracker = DataLifecycleTracker::new();
        tracker.observe(&style_event(EventKind::StyleDataLoading));
        tracker.observe(&style_event(EventKind::StyleData));

        let t = tracker.observe(&style_event(EventKind::DataLoading));
        assert_eq!(t, Some(Transition::Started { from: LifecycleState::Settled }));
        assert!(tracker.is_outstanding(&LifecycleKey::style("basemap")));
    }

    #[test]
    fn test_correlated_error_settles() {
        let tracker = DataLifecycleTracker::new();
        let key = LifecycleKey::source("r1");
        tracker.observe(&source_event(EventKind::SourceDataLoading, "r1", None));

        let error = ErrorEvent::new("404 Not Found").with_key(key.clone());
        let event = MapEvent::new(EventKind::Error, MapId::new(), EventPayload::Error(error)).unwrap();
        assert!(tracker.observe(&event).is_some());
        assert!(!tracker.is_outstanding(&key));
    }

    #[test]
    fn test_uncorrelated_events_ignored() {
        let tracker = DataLifecycleTracker::new();
        let error = MapEvent::new(
            EventKind::Error,
            MapId::new(),
            EventPayload::Error(ErrorEvent::new("webgl context lost")),
        )
        .unwrap();
        let zoom = MapEvent::new(EventKind::Zoom, MapId::new(), EventPayload::Empty).unwrap();

        assert_eq!(tracker.observe(&error), None);
        assert_eq!(tracker.observe(&zoom), None);
    }

    #[test]
    fn test_tiles_are_tracked_independently() {
        let tracker = DataLifecycleTracker::new();
        let a = TileCoord::new(2, 0, 0).unwrap();
        let b = TileCoord::new(2, 1, 0).unwrap();

        tracker.observe(&source_event(EventKind::SourceDataLoading, "roads", Some(a)));
        tracker.observe(&source_event(EventKind::SourceDataLoading, "roads", Some(b)));
        tracker.observe(&source_event(EventKind::SourceData, "roads", Some(a)));

        assert!(!tracker.is_outstanding(&LifecycleKey::source("roads").with_tile(a)));
        assert!(tracker.is_outstanding(&LifecycleKey::source("roads").with_tile(b)));
        assert!(!tracker.is_source_loaded("roads"));
        assert!(tracker.is_source_loaded("water"));

        let key_b = LifecycleKey::source("roads").with_tile(b);
        assert!(tracker.is_source_loaded_after(&key_b));
        assert!(!tracker.is_source_loaded_after(&LifecycleKey::source("roads")));

        tracker.observe(&source_event(EventKind::SourceData, "roads", Some(b)));
        assert!(tracker.is_source_loaded("roads"));
    }

    #[test]
    fn test_settled_tile_keys_are_pruned() {
        let tracker = DataLifecycleTracker::new();
        let coord = TileCoord::new(3, 2, 1).unwrap();
        let key = LifecycleKey::source("roads").with_tile(coord);

        tracker.observe(&source_event(EventKind::SourceDataLoading, "roads", Some(coord)));
        tracker.observe(&source_event(EventKind::SourceDataLoading, "roads", None));
        assert_eq!(tracker.states.lock().len(), 2);

        let t = tracker.observe(&source_event(EventKind::SourceData, "roads", Some(coord)));
        assert_eq!(t, Some(Transition::Settled { from: LifecycleState::Loading }));
        assert_eq!(tracker.states.lock().len(), 1);
        assert!(!tracker.is_outstanding(&key));
        assert_eq!(tracker.state(&key), LifecycleState::Idle);

        // 타일 재로딩은 Idle에서 다시 시작
        let t = tracker.observe(&source_event(EventKind::SourceDataLoading, "roads", Some(coord)));
        assert_eq!(t, Some(Transition::Started { from: LifecycleState::Idle }));
    }

    #[test]
    fn test_clear() {
        let tracker = DataLifecycleTracker::with_config(LifecycleConfig {
            warn_on_unannounced_terminal: true,
        });
        tracker.observe(&source_event(EventKind::DataLoading, "r1", None));
        tracker.clear();
        assert_eq!(tracker.state(&LifecycleKey::source("r1")), LifecycleState::Idle);
    }
}
