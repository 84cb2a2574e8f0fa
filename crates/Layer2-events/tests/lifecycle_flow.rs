//! 지도 이벤트 계층 통합 테스트
//!
//! `cargo test -p carta-events --test lifecycle_flow`

use carta_events::{
    CartaConfig, DataExtras, DataType, ErrorEvent, ErrorSink, EventKind, LifecycleKey, LngLat,
    MapEvent, MapEvents, OriginalEvent, ScreenPoint,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct CollectingSink {
    lines: Mutex<Vec<String>>,
}

impl ErrorSink for CollectingSink {
    fn report(&self, event: &MapEvent, error: &ErrorEvent) {
        self.lines
            .lock()
            .push(carta_events::render_error("test", event, error));
    }
}

fn project(p: ScreenPoint) -> anyhow::Result<LngLat> {
    Ok(LngLat::new(p.x - 180.0, 90.0 - p.y)?)
}

#[test]
fn test_data_loading_round_trip() {
    let map = Arc::new(MapEvents::new());
    let log = Arc::new(Mutex::new(Vec::new()));

    // 리스너마다 (이벤트, 당시 outstanding 여부) 기록
    for kind in [EventKind::DataLoading, EventKind::Data] {
        let (m, l) = (Arc::clone(&map), Arc::clone(&log));
        map.on(kind, move |event| {
            let outstanding = m.is_outstanding(DataType::Source, "r1", None);
            l.lock().push((event.kind(), outstanding));
            Ok(())
        });
    }

    assert!(!map.is_outstanding(DataType::Source, "r1", None));

    let loading = map
        .source_data(EventKind::DataLoading, DataExtras::new("r1"))
        .unwrap();
    map.emit(&loading).unwrap();
    assert!(map.is_outstanding(DataType::Source, "r1", None));

    let done = map.source_data(EventKind::Data, DataExtras::new("r1")).unwrap();
    map.emit(&done).unwrap();
    assert!(!map.is_outstanding(DataType::Source, "r1", None));

    assert_eq!(
        *log.lock(),
        vec![(EventKind::DataLoading, true), (EventKind::Data, false)]
    );
}

#[test]
fn test_maps_do_not_share_listeners() {
    let first = MapEvents::new();
    let second = MapEvents::new();
    let hits = Arc::new(Mutex::new(Vec::new()));

    let h = Arc::clone(&hits);
    first.on(EventKind::Load, move |event| {
        h.lock().push(event.owner());
        Ok(())
    });

    second.emit(&second.builder().plain(EventKind::Load).unwrap()).unwrap();
    assert!(hits.lock().is_empty());

    first.emit(&first.builder().plain(EventKind::Load).unwrap()).unwrap();
    assert_eq!(*hits.lock(), vec![first.id()]);

    // 다른 지도의 이벤트는 거부
    let foreign = second.builder().plain(EventKind::Load).unwrap();
    assert!(first.emit(&foreign).is_err());

    // 거부된 이벤트는 라이프사이클 상태도 바꾸지 않음
    let foreign_loading = second
        .source_data(EventKind::SourceDataLoading, DataExtras::new("r1"))
        .unwrap();
    assert!(matches!(
        first.emit(&foreign_loading),
        Err(carta_events::Error::Validation(_))
    ));
    assert!(!first.is_outstanding(DataType::Source, "r1", None));
    assert!(!second.is_outstanding(DataType::Source, "r1", None));
}

#[test]
fn test_unhandled_error_reaches_sink_once() {
    let sink = Arc::new(CollectingSink::default());
    let map = MapEvents::with_error_sink(CartaConfig::default(), sink.clone());

    let loading = map
        .source_data(EventKind::SourceDataLoading, DataExtras::new("satellite"))
        .unwrap();
    map.emit(&loading).unwrap();

    let failure = map
        .builder()
        .error("tile 404", Some(LifecycleKey::source("satellite")))
        .unwrap();
    map.emit(&failure).unwrap();

    assert!(!map.is_outstanding(DataType::Source, "satellite", None));
    let lines = sink.lines.lock();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("tile 404 (source:satellite)"));
}

#[test]
fn test_config_from_toml() {
    // 다른 테스트가 이미 설치했으면 실패해도 무방
    let _ = carta_foundation::init_tracing("trace");

    let config = CartaConfig::from_toml_str(
        r#"
        [dispatcher]
        debugMode = true

        [lifecycle]
        warnOnUnannouncedTerminal = true
        "#,
    )
    .unwrap();
    assert!(config.dispatcher.debug_mode);

    let map = MapEvents::with_config(config);
    let clicks = Arc::new(Mutex::new(Vec::new()));
    let c = Arc::clone(&clicks);
    map.on(EventKind::Click, move |event| {
        c.lock().push(event.as_pointer().map(|p| p.lng_lat()));
        Ok(())
    });

    let click = map
        .builder()
        .pointer(
            EventKind::Click,
            OriginalEvent::new("left"),
            ScreenPoint::new(190.0, 40.0),
            &project,
        )
        .unwrap();
    map.emit(&click).unwrap();

    assert_eq!(*clicks.lock(), vec![Some(LngLat::new(10.0, 50.0).unwrap())]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_fire_does_not_await_spawned_work() {
    let map = MapEvents::new();
    let finished = Arc::new(AtomicBool::new(false));
    let handle = Arc::new(Mutex::new(None));

    let (f, h) = (Arc::clone(&finished), Arc::clone(&handle));
    map.on(EventKind::MoveEnd, move |_| {
        let f = Arc::clone(&f);
        *h.lock() = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            f.store(true, Ordering::SeqCst);
        }));
        Ok(())
    });

    let moveend = map
        .builder()
        .motion(EventKind::MoveEnd, carta_events::MotionSource::Programmatic)
        .unwrap();
    map.emit(&moveend).unwrap();
    assert!(!finished.load(Ordering::SeqCst));

    let spawned = handle.lock().take().expect("listener should have spawned a task");
    spawned.await.unwrap();
    assert!(finished.load(Ordering::SeqCst));
}
