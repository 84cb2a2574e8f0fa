//! Dispatcher - 지도 인스턴스별 이벤트 리스너 레지스트리
//!
//! 이벤트 종류마다 등록 순서대로 리스너를 보관하고, `fire` 호출 시
//! 호출자 스레드에서 동기적으로 전달합니다.
//!
//! ## 전달 규칙
//!
//! - 전달 시작 시점의 리스너 목록 스냅샷을 사용합니다. 전달 중 추가된
//!   리스너는 이번 이벤트를 받지 않고, 전달 중 제거된 리스너도 스냅샷에
//!   있었다면 이번 이벤트는 받습니다.
//! - 리스너 실패(Err 또는 panic)는 나머지 리스너 전달을 막지 않습니다.
//!   모든 리스너가 실행된 뒤 `Error::Listeners`로 모아서 반환합니다.
//! - 구독자가 없는 `error` 이벤트는 [`ErrorSink`]로 보냅니다.
//! - 레지스트리 락은 리스너 실행 중에 잡혀 있지 않으므로, 리스너 안에서
//!   `on`/`off`/`fire`를 다시 호출할 수 있습니다.
//!
//! ## 사용법
//!
//! ```ignore
//! let dispatcher = Dispatcher::new(MapId::new());
//!
//! let sub = dispatcher.on(EventKind::Click, |event| {
//!     println!("clicked at {:?}", event.as_pointer().map(|p| p.lng_lat()));
//!     Ok(())
//! });
//!
//! dispatcher.fire(&event)?;
//! dispatcher.off(sub);
//! ```

use crate::kind::EventKind;
use crate::payload::{EventPayload, MapEvent, MapId};
use crate::sink::{ErrorSink, TracingErrorSink};
use carta_foundation::{DispatcherConfig, Error, ListenerErrors, ListenerFailure, Result};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

// ============================================================================
// EventListener Trait
// ============================================================================

/// 리스너 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// 구독 핸들 (`off`에 넘김)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    kind: EventKind,
    id: ListenerId,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }
}

/// 이벤트 리스너 trait
///
/// 클로저는 [`Dispatcher::on`]으로 바로 등록하고, 상태를 가진 리스너는
/// 이 trait을 구현해 [`Dispatcher::subscribe`]로 등록합니다.
pub trait EventListener: Send + Sync {
    /// 리스너 이름 (디버깅용)
    fn name(&self) -> &str;

    /// 이벤트 처리. Err는 집계되어 `fire` 호출자에게 전달됩니다.
    fn on_event(&self, event: &MapEvent) -> anyhow::Result<()>;
}

struct FnListener<F> {
    f: F,
}

impl<F> EventListener for FnListener<F>
where
    F: Fn(&MapEvent) -> anyhow::Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        "closure"
    }

    fn on_event(&self, event: &MapEvent) -> anyhow::Result<()> {
        (self.f)(event)
    }
}

/// 등록된 리스너 정보
#[derive(Clone)]
struct Registration {
    id: ListenerId,
    listener: Arc<dyn EventListener>,
    once: bool,
    /// once 리스너가 이미 호출되었는지 (재진입 fire에서 중복 호출 방지)
    fired: Arc<AtomicBool>,
}

// ============================================================================
// Dispatcher
// ============================================================================

/// 이벤트 디스패처
///
/// 지도 인스턴스 하나가 소유합니다. 프로세스 전역 인스턴스는 없습니다.
pub struct Dispatcher {
    /// owner 지도
    owner: MapId,

    /// 설정
    config: DispatcherConfig,

    /// 이벤트 종류별 리스너 (등록 순서)
    listeners: Mutex<HashMap<EventKind, Vec<Registration>>>,

    /// 리스너 ID 카운터
    listener_counter: AtomicU64,

    /// 구독자 없는 error 이벤트 출력
    error_sink: Arc<dyn ErrorSink>,
}

impl Dispatcher {
    /// 기본 설정과 tracing 에러 싱크로 생성
    pub fn new(owner: MapId) -> Self {
        Self::with_config(owner, DispatcherConfig::default(), Arc::new(TracingErrorSink::new()))
    }

    pub fn with_config(
        owner: MapId,
        config: DispatcherConfig,
        error_sink: Arc<dyn ErrorSink>,
    ) -> Self {
        Self {
            owner,
            config,
            listeners: Mutex::new(HashMap::new()),
            listener_counter: AtomicU64::new(0),
            error_sink,
        }
    }

    pub fn owner(&self) -> MapId {
        self.owner
    }

    // ========================================================================
    // Subscribe / Unsubscribe
    // ========================================================================

    /// 클로저 리스너 등록
    pub fn on<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&MapEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(kind, Arc::new(FnListener { f: listener }), false)
    }

    /// 첫 호출 직후 자동 해제되는 클로저 리스너 등록
    pub fn once<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&MapEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.register(kind, Arc::new(FnListener { f: listener }), true)
    }

    /// 이름으로 등록. 분류 체계에 없는 이름이면 `UnknownEventKind`
    pub fn on_named<F>(&self, name: &str, listener: F) -> Result<Subscription>
    where
        F: Fn(&MapEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let kind = name.parse::<EventKind>()?;
        Ok(self.on(kind, listener))
    }

    /// 이름으로 once 등록
    pub fn once_named<F>(&self, name: &str, listener: F) -> Result<Subscription>
    where
        F: Fn(&MapEvent) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let kind = name.parse::<EventKind>()?;
        Ok(self.once(kind, listener))
    }

    /// trait 리스너 등록
    pub fn subscribe(&self, kind: EventKind, listener: Arc<dyn EventListener>) -> Subscription {
        self.register(kind, listener, false)
    }

    fn register(
        &self,
        kind: EventKind,
        listener: Arc<dyn EventListener>,
        once: bool,
    ) -> Subscription {
        let id = ListenerId(self.listener_counter.fetch_add(1, Ordering::SeqCst));

        debug!(
            owner = %self.owner,
            listener_name = listener.name(),
            listener_id = %id,
            kind = %kind,
            once,
            "Registering event listener"
        );

        self.listeners.lock().entry(kind).or_default().push(Registration {
            id,
            listener,
            once,
            fired: Arc::new(AtomicBool::new(false)),
        });

        Subscription { kind, id }
    }

    /// 리스너 해제
    ///
    /// 이미 해제된 핸들이면 아무 일도 하지 않고 false를 반환합니다.
    pub fn off(&self, subscription: Subscription) -> bool {
        let removed = self.remove(subscription.kind, subscription.id);
        if removed {
            debug!(
                owner = %self.owner,
                listener_id = %subscription.id,
                kind = %subscription.kind,
                "Unregistered event listener"
            );
        }
        removed
    }

    fn remove(&self, kind: EventKind, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let Some(registrations) = listeners.get_mut(&kind) else {
            return false;
        };

        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        let removed = registrations.len() != before;

        if registrations.is_empty() {
            listeners.remove(&kind);
        }
        removed
    }

    // ========================================================================
    // Fire
    // ========================================================================

    /// 이 디스패처의 지도에서 만든 이벤트인지 확인
    pub fn check_owner(&self, event: &MapEvent) -> Result<()> {
        if event.owner() != self.owner {
            return Err(Error::validation(format!(
                "event owned by {} fired on dispatcher of {}",
                event.owner(),
                self.owner
            )));
        }
        Ok(())
    }

    /// 이벤트 발행
    ///
    /// 스냅샷의 모든 리스너를 등록 순서대로 호출한 뒤 반환합니다.
    /// 하나 이상 실패하면 `Error::Listeners`로 모아서 반환합니다.
    pub fn fire(&self, event: &MapEvent) -> Result<()> {
        self.check_owner(event)?;

        let kind = event.kind();
        let snapshot: Vec<Registration> = self
            .listeners
            .lock()
            .get(&kind)
            .cloned()
            .unwrap_or_default();

        if snapshot.is_empty() {
            if let EventPayload::Error(error) = event.payload() {
                debug!(owner = %self.owner, "No error listeners, routing to error sink");
                let reported =
                    panic::catch_unwind(AssertUnwindSafe(|| self.error_sink.report(event, error)));
                if let Err(payload) = reported {
                    warn!(
                        owner = %self.owner,
                        panic = %panic_message(payload.as_ref()),
                        "Error sink panicked while reporting"
                    );
                }
            }
            return Ok(());
        }

        let mut failures = Vec::new();

        for registration in &snapshot {
            if registration.once && registration.fired.swap(true, Ordering::SeqCst) {
                continue;
            }

            if self.config.debug_mode {
                trace!(
                    owner = %self.owner,
                    listener_id = %registration.id,
                    listener_name = registration.listener.name(),
                    kind = %kind,
                    "Delivering event to listener"
                );
            }

            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| registration.listener.on_event(event)));

            if registration.once {
                self.remove(kind, registration.id);
            }

            let message = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => format!("{err:#}"),
                Err(payload) => format!("listener panicked: {}", panic_message(payload.as_ref())),
            };

            warn!(
                owner = %self.owner,
                listener_id = %registration.id,
                kind = %kind,
                error = %message,
                "Event listener failed"
            );
            failures.push(ListenerFailure {
                listener_id: registration.id.as_u64(),
                message,
            });
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::Listeners(ListenerErrors {
                kind: kind.to_string(),
                failures,
            }))
        }
    }

    /// 이름으로 발행. 이름이 이벤트 종류와 다르면 `Validation`
    pub fn fire_named(&self, name: &str, event: &MapEvent) -> Result<()> {
        let kind = name.parse::<EventKind>()?;
        if kind != event.kind() {
            return Err(Error::validation(format!(
                "fired as '{kind}' but the payload was built for '{}'",
                event.kind()
            )));
        }
        self.fire(event)
    }

    // ========================================================================
    // Query / Teardown
    // ========================================================================

    /// 해당 종류에 리스너가 있는지
    pub fn listens(&self, kind: EventKind) -> bool {
        self.listener_count(kind) > 0
    }

    /// 해당 종류의 리스너 수
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.lock().get(&kind).map_or(0, Vec::len)
    }

    /// 모든 리스너 해제 (지도 제거 시)
    pub fn clear(&self) {
        let mut listeners = self.listeners.lock();
        let total: usize = listeners.values().map(Vec::len).sum();
        listeners.clear();
        debug!(owner = %self.owner, removed = total, "Cleared all event listeners");
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.lock();
        f.debug_struct("Dispatcher")
            .field("owner", &self.owner)
            .field("config", &self.config)
            .field("kinds", &listeners.len())
            .field("listeners", &listeners.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// ============================================================================
// 테스트
// ============================================================================
