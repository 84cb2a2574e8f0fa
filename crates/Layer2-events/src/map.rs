//! MapEvents - 지도 인스턴스 하나의 이벤트 계층
//!
//! 디스패처, 라이프사이클 추적기, payload 빌더를 함께 소유하고
//! 발행 순서(추적기 관찰 → 리스너 전달)를 고정합니다. 지도마다 별도
//! 인스턴스를 만들며 리스너 상태를 공유하지 않습니다.
//!
//! ```ignore
//! let map = MapEvents::with_config(CartaConfig::load_or_default("carta.toml")?);
//!
//! map.on(EventKind::SourceData, |event| {
//!     println!("{:?}", event.as_data());
//!     Ok(())
//! });
//!
//! let loading = map.source_data(EventKind::SourceDataLoading, DataExtras::new("roads"))?;
//! map.emit(&loading)?;
//! assert!(map.is_outstanding(DataType::Source, "roads", None));
//! ```

use crate::builder::{DataExtras, PayloadBuilder};
use crate::dispatcher::{Dispatcher, Subscription};
use crate::kind::EventKind;
use crate::lifecycle::{DataLifecycleTracker, LifecycleKey};
use crate::payload::{DataType, MapEvent, MapId};
use crate::sink::{ErrorSink, TracingErrorSink};
use carta_foundation::{CartaConfig, Result, TileCoord};
use std::sync::Arc;
use tracing::info;

/// 지도 인스턴스별 이벤트 owner
#[derive(Debug)]
pub struct MapEvents {
    id: MapId,
    dispatcher: Arc<Dispatcher>,
    tracker: DataLifecycleTracker,
    builder: PayloadBuilder,
}

impl MapEvents {
    pub fn new() -> Self {
        Self::with_config(CartaConfig::default())
    }

    pub fn with_config(config: CartaConfig) -> Self {
        let sink = Arc::new(TracingErrorSink::with_config(config.error_sink.clone()));
        Self::with_error_sink(config, sink)
    }

    /// 사용자 정의 에러 싱크로 생성
    pub fn with_error_sink(config: CartaConfig, error_sink: Arc<dyn ErrorSink>) -> Self {
        let id = MapId::new();
        info!(map = %id, debug_mode = config.dispatcher.debug_mode, "Creating map event layer");

        Self {
            id,
            dispatcher: Arc::new(Dispatcher::with_config(id, config.dispatcher, error_sink)),
            tracker: DataLifecycleTracker::with_config(config.lifecycle),
            builder: PayloadBuilder::new(id),
        }
    }

    pub fn id(&self) -> MapId {
        self.id
    }

    /// 리스너 안에서 재진입 호출할 때 clone해서 넘깁니다.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn builder(&self) -> &PayloadBuilder {
        &self.builder
    }

    pub fn tracker(&self) -> &DataLifecycleTracker {
        &self.tracker
    }

    // ========================================================================
    // Listener API
    // ========================================================================

    pub fn on<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&MapEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.dispatcher.on(kind, listener)
    }

    pub fn once<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&MapEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.dispatcher.once(kind, listener)
    }

    pub fn off(&self, subscription: Subscription) -> bool {
        self.dispatcher.off(subscription)
    }

    // ========================================================================
    // Emit
    // ========================================================================

    /// 이벤트 발행
    ///
    /// 추적기가 먼저 관찰하므로 리스너 안에서 `is_outstanding`을 물으면
    /// 이 이벤트가 반영된 상태를 봅니다. 다른 지도의 이벤트는 추적기
    /// 상태를 바꾸기 전에 거부합니다.
    pub fn emit(&self, event: &MapEvent) -> Result<()> {
        self.dispatcher.check_owner(event)?;
        self.tracker.observe(event);
        self.dispatcher.fire(event)
    }

    /// 소스 데이터 이벤트 생성
    ///
    /// `is_source_loaded`가 비어 있으면 추적기 상태로 채웁니다. loading
    /// 이벤트는 항상 false, 종료 이벤트는 이 이벤트가 가리키는 키를 제외한
    /// 같은 소스의 로드가 모두 끝났을 때 true입니다.
    pub fn source_data(&self, kind: EventKind, mut extras: DataExtras) -> Result<MapEvent> {
        if extras.is_source_loaded.is_none() {
            let mut key = LifecycleKey::source(extras.resource_id.clone());
            if let Some(coord) = extras.coord.or_else(|| extras.tile.map(|t| t.coord)) {
                key = key.with_tile(coord);
            }
            let loaded = !kind.is_loading() && self.tracker.is_source_loaded_after(&key);
            extras.is_source_loaded = Some(loaded);
        }
        self.builder.data(kind, DataType::Source, extras)
    }

    // ========================================================================
    // Query
    // ========================================================================

    /// 리소스(또는 타일) 로드가 진행 중인지
    pub fn is_outstanding(
        &self,
        data_type: DataType,
        resource_id: &str,
        tile: Option<TileCoord>,
    ) -> bool {
        let mut key = LifecycleKey::new(data_type, resource_id);
        key.tile = tile;
        self.tracker.is_outstanding(&key)
    }

    /// 소스의 어떤 로드도 진행 중이 아닌지
    pub fn is_source_loaded(&self, source_id: &str) -> bool {
        self.tracker.is_source_loaded(source_id)
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// 지도 제거
    ///
    /// `remove`를 발행한 뒤 모든 리스너와 라이프사이클 상태를 정리합니다.
    /// 리스너 실패가 있어도 정리는 수행하고 집계 에러를 반환합니다.
    pub fn remove(&self) -> Result<()> {
        let event = self.builder.plain(EventKind::Remove)?;
        let result = self.emit(&event);

        self.dispatcher.clear();
        self.tracker.clear();
        info!(map = %self.id, "Map event layer removed");

        result
    }
}

impl Default for MapEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::LifecycleState;
    use crate::payload::{DataEvent, TileRef, TileState};
    use parking_lot::Mutex;

    #[test]
    fn test_emit_observes_before_dispatch() {
        let map = Arc::new(MapEvents::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let (m, s) = (Arc::clone(&map), Arc::clone(&seen));
        map.on(EventKind::SourceDataLoading, move |_| {
            s.lock().push(m.is_outstanding(DataType::Source, "roads", None));
            Ok(())
        });

        let loading = map
            .source_data(EventKind::SourceDataLoading, DataExtras::new("roads"))
            .unwrap();
        map.emit(&loading).unwrap();
        assert_eq!(*seen.lock(), vec![true]);
    }

    #[test]
    fn test_source_data_fills_is_source_loaded() {
        let map = MapEvents::new();
        let a = TileCoord::new(1, 0, 0).unwrap();
        let b = TileCoord::new(1, 1, 0).unwrap();

        for coord in [a, b] {
            let loading = map
                .source_data(EventKind::SourceDataLoading, DataExtras::new("roads").with_coord(coord))
                .unwrap();
            assert!(!loading.as_data().and_then(DataEvent::as_source).unwrap().is_source_loaded);
            map.emit(&loading).unwrap();
        }

        let first = map
            .source_data(
                EventKind::SourceData,
                DataExtras::new("roads").with_tile(TileRef::new(a, TileState::Loaded)),
            )
            .unwrap();
        assert!(!first.as_data().and_then(DataEvent::as_source).unwrap().is_source_loaded);
        map.emit(&first).unwrap();

        let second = map
            .source_data(EventKind::SourceData, DataExtras::new("roads").with_coord(b))
            .unwrap();
        assert!(second.as_data().and_then(DataEvent::as_source).unwrap().is_source_loaded);
        map.emit(&second).unwrap();
        assert!(map.is_source_loaded("roads"));

        let explicit = map
            .source_data(EventKind::SourceData, DataExtras::new("water").with_source_loaded(false))
            .unwrap();
        assert!(!explicit.as_data().and_then(DataEvent::as_source).unwrap().is_source_loaded);
    }

    #[test]
    fn test_remove_clears_state() {
        let map = MapEvents::new();
        let removed = Arc::new(Mutex::new(0));

        let r = Arc::clone(&removed);
        map.on(EventKind::Remove, move |_| {
            *r.lock() += 1;
            Ok(())
        });
        let loading = map
            .builder()
            .data(EventKind::StyleDataLoading, DataType::Style, DataExtras::new("basemap"))
            .unwrap();
        map.emit(&loading).unwrap();
        assert!(map.is_outstanding(DataType::Style, "basemap", None));

        map.remove().unwrap();
        assert_eq!(*removed.lock(), 1);
        assert!(!map.dispatcher().listens(EventKind::Remove));
        assert_eq!(
            map.tracker().state(&LifecycleKey::style("basemap")),
            LifecycleState::Idle
        );
    }

    #[test]
    fn test_remove_cleans_up_even_when_listener_fails() {
        let map = MapEvents::new();
        map.on(EventKind::Remove, |_| anyhow::bail!("teardown hook failed"));

        let err = map.remove().unwrap_err();
        assert_eq!(err.listener_failures().map(<[_]>::len), Some(1));
        assert!(!map.dispatcher().listens(EventKind::Remove));
    }
}
