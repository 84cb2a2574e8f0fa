//! Event Payloads - 이벤트 종류별 payload 타입
//!
//! payload는 형태별 discriminated union으로 표현합니다. 데이터 이벤트는
//! `dataType`에 따라 `Style`/`Source` 변형으로 나뉘므로, 소스 전용 필드
//! (`sourceDataType`, `tile`, `coord`)는 스타일 이벤트에 존재할 수 없습니다.
//!
//! 모든 이벤트는 [`MapEvent`] 봉투에 담기며, 생성 시점에 종류별 형태를
//! 검증합니다. 검증에 실패한 이벤트는 만들어지지 않으므로 전달되지도 않습니다.

use crate::kind::{EventKind, PayloadShape};
use crate::lifecycle::LifecycleKey;
use carta_foundation::{Error, LngLat, Result, ScreenPoint, TileCoord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// MapId - 이벤트 owner
// ============================================================================

/// 지도 인스턴스 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapId(Uuid);

impl MapId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MapId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "map-{}", self.0)
    }
}

// ============================================================================
// OriginalEvent
// ============================================================================

/// 입력 인식기가 넘겨준 원본 입력 (불투명 참조)
#[derive(Clone)]
pub struct OriginalEvent(Arc<dyn Any + Send + Sync>);

impl OriginalEvent {
    pub fn new<T: Any + Send + Sync>(raw: T) -> Self {
        Self(Arc::new(raw))
    }

    /// 원본 타입으로 접근
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for OriginalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OriginalEvent(..)")
    }
}

// ============================================================================
// Pointer / Touch
// ============================================================================

/// 포인터 이벤트 payload
///
/// `lng_lat`은 항상 발행 시점의 `point` 투영 결과입니다.
#[derive(Debug, Clone)]
pub struct PointerEvent {
    original_event: OriginalEvent,
    point: ScreenPoint,
    lng_lat: LngLat,
}

impl PointerEvent {
    pub(crate) fn new(original_event: OriginalEvent, point: ScreenPoint, lng_lat: LngLat) -> Self {
        Self {
            original_event,
            point,
            lng_lat,
        }
    }

    pub fn original_event(&self) -> &OriginalEvent {
        &self.original_event
    }

    pub fn point(&self) -> ScreenPoint {
        self.point
    }

    pub fn lng_lat(&self) -> LngLat {
        self.lng_lat
    }
}

/// 터치 이벤트 payload
///
/// `points[i]`와 `lng_lats[i]`는 같은 접점이며, 순서는 입력 인식기가 넘긴
/// 그대로입니다. `point`/`lng_lat`은 모든 접점의 중심점입니다.
#[derive(Debug, Clone)]
pub struct TouchEvent {
    original_event: OriginalEvent,
    points: Vec<ScreenPoint>,
    lng_lats: Vec<LngLat>,
    point: ScreenPoint,
    lng_lat: LngLat,
}

impl TouchEvent {
    pub(crate) fn new(
        original_event: OriginalEvent,
        points: Vec<ScreenPoint>,
        lng_lats: Vec<LngLat>,
        point: ScreenPoint,
        lng_lat: LngLat,
    ) -> Self {
        debug_assert_eq!(points.len(), lng_lats.len());
        Self {
            original_event,
            points,
            lng_lats,
            point,
            lng_lat,
        }
    }

    pub fn original_event(&self) -> &OriginalEvent {
        &self.original_event
    }

    pub fn points(&self) -> &[ScreenPoint] {
        &self.points
    }

    pub fn lng_lats(&self) -> &[LngLat] {
        &self.lng_lats
    }

    /// 접점 중심점
    pub fn point(&self) -> ScreenPoint {
        self.point
    }

    /// 접점 중심점의 지리 좌표
    pub fn lng_lat(&self) -> LngLat {
        self.lng_lat
    }
}

/// movestart/move/moveend를 일으킨 입력
#[derive(Debug, Clone)]
pub enum MotionSource {
    Pointer(PointerEvent),
    Touch(TouchEvent),
    /// 좌표 없이 원본 입력만 (휠, 키보드 등)
    Input(OriginalEvent),
    /// 코드에서 카메라를 움직인 경우 (원본 입력 없음)
    Programmatic,
}

impl MotionSource {
    pub fn original_event(&self) -> Option<&OriginalEvent> {
        match self {
            Self::Pointer(e) => Some(e.original_event()),
            Self::Touch(e) => Some(e.original_event()),
            Self::Input(e) => Some(e),
            Self::Programmatic => None,
        }
    }
}

// ============================================================================
// Error
// ============================================================================

/// `error` 이벤트 payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,

    /// 실패한 리소스 로드 (있으면 라이프사이클 추적기가 종료 처리)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<LifecycleKey>,
}

impl ErrorEvent {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            key: None,
        }
    }

    pub fn with_key(mut self, key: LifecycleKey) -> Self {
        self.key = Some(key);
        self
    }
}

impl fmt::Display for ErrorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{} ({})", self.message, key),
            None => f.write_str(&self.message),
        }
    }
}

// ============================================================================
// Data
// ============================================================================

/// 데이터 이벤트 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// 데이터 소스 (타일 외 콘텐츠 포함)
    Source,
    /// 지도 스타일 정의
    Style,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Style => "style",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 소스 데이터 이벤트 세부 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceDataType {
    /// 소스 설명이 바뀜
    Metadata,
    /// 타일/피처 콘텐츠가 바뀜
    Content,
}

/// 타일 로딩 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileState {
    Loading,
    Loaded,
    Reloading,
    Unloaded,
    Errored,
    Expired,
}

/// 이벤트가 가리키는 타일
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRef {
    pub coord: TileCoord,
    pub state: TileState,
}

impl TileRef {
    pub fn new(coord: TileCoord, state: TileState) -> Self {
        Self { coord, state }
    }
}

/// 스타일 데이터 payload
///
/// 소스 전용 필드가 섞인 입력은 역직렬화에서도 거부합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StyleData {
    /// 스타일 리소스 ID
    pub resource_id: String,

    /// 스타일 설명 (불투명)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Value>,
}

/// 소스 데이터 payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceData {
    pub source_id: String,

    /// 소스에 진행 중인 로드가 없는지
    pub is_source_loaded: bool,

    /// sourcedata / sourcedataloading 에서만 존재
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_data_type: Option<SourceDataType>,

    /// 소스 설명 (불투명)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tile: Option<TileRef>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub coord: Option<TileCoord>,
}

impl SourceData {
    /// 이 이벤트가 가리키는 타일 좌표
    pub fn tile_coord(&self) -> Option<TileCoord> {
        self.coord.or_else(|| self.tile.map(|t| t.coord))
    }
}

/// 데이터 라이프사이클 이벤트 payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dataType", rename_all = "lowercase")]
pub enum DataEvent {
    Style(StyleData),
    Source(SourceData),
}

impl DataEvent {
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Style(_) => DataType::Style,
            Self::Source(_) => DataType::Source,
        }
    }

    /// 라이프사이클 추적 키
    pub fn lifecycle_key(&self) -> LifecycleKey {
        match self {
            Self::Style(style) => LifecycleKey::style(style.resource_id.clone()),
            Self::Source(source) => {
                let key = LifecycleKey::source(source.source_id.clone());
                match source.tile_coord() {
                    Some(coord) => key.with_tile(coord),
                    None => key,
                }
            }
        }
    }

    pub fn as_source(&self) -> Option<&SourceData> {
        match self {
            Self::Source(source) => Some(source),
            Self::Style(_) => None,
        }
    }

    /// 이벤트 종류와의 정합성 검사
    fn check_kind(&self, kind: EventKind) -> Result<()> {
        let data_type = self.data_type();
        let allowed = match kind {
            EventKind::Data | EventKind::DataLoading => true,
            EventKind::StyleData | EventKind::StyleDataLoading => data_type == DataType::Style,
            EventKind::SourceData | EventKind::SourceDataLoading => {
                data_type == DataType::Source
            }
            _ => false,
        };
        if !allowed {
            return Err(Error::validation(format!(
                "'{kind}' cannot carry dataType '{data_type}'"
            )));
        }

        if let Self::Source(source) = self {
            if source.source_id.is_empty() {
                return Err(Error::validation("source data event requires a sourceId"));
            }
            if source.source_data_type.is_some()
                && !matches!(kind, EventKind::SourceData | EventKind::SourceDataLoading)
            {
                return Err(Error::validation(format!(
                    "sourceDataType is only allowed on sourcedata/sourcedataloading, not '{kind}'"
                )));
            }
            if let (Some(coord), Some(tile)) = (source.coord, source.tile) {
                if coord != tile.coord {
                    return Err(Error::validation(format!(
                        "coord {coord} does not match tile {}",
                        tile.coord
                    )));
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// EventPayload / MapEvent
// ============================================================================

/// 형태별 payload
#[derive(Debug, Clone)]
pub enum EventPayload {
    Pointer(PointerEvent),
    Touch(TouchEvent),
    Motion(MotionSource),
    /// owner 외 필드 없음
    Empty,
    Error(ErrorEvent),
    Data(DataEvent),
}

impl EventPayload {
    pub fn shape(&self) -> PayloadShape {
        match self {
            Self::Pointer(_) => PayloadShape::Pointer,
            Self::Touch(_) => PayloadShape::Touch,
            Self::Motion(_) => PayloadShape::Motion,
            Self::Empty => PayloadShape::Empty,
            Self::Error(_) => PayloadShape::Error,
            Self::Data(_) => PayloadShape::Data,
        }
    }
}

/// 지도 이벤트 봉투
///
/// 생성자가 payload 형태를 검증하므로, 존재하는 `MapEvent`는 항상
/// 종류별 계약을 만족합니다.
#[derive(Debug, Clone)]
pub struct MapEvent {
    kind: EventKind,
    owner: MapId,
    timestamp: DateTime<Utc>,
    payload: EventPayload,
}

impl MapEvent {
    /// 새 이벤트 생성 (형태 검증)
    pub fn new(kind: EventKind, owner: MapId, payload: EventPayload) -> Result<Self> {
        let expected = kind.payload_shape();
        if payload.shape() != expected {
            return Err(Error::validation(format!(
                "'{kind}' expects a {expected:?} payload, got {:?}",
                payload.shape()
            )));
        }
        if let EventPayload::Data(data) = &payload {
            data.check_kind(kind)?;
        }

        Ok(Self {
            kind,
            owner,
            timestamp: Utc::now(),
            payload,
        })
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn owner(&self) -> MapId {
        self.owner
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    pub fn as_pointer(&self) -> Option<&PointerEvent> {
        match &self.payload {
            EventPayload::Pointer(e) | EventPayload::Motion(MotionSource::Pointer(e)) => Some(e),
            _ => None,
        }
    }

    pub fn as_touch(&self) -> Option<&TouchEvent> {
        match &self.payload {
            EventPayload::Touch(e) | EventPayload::Motion(MotionSource::Touch(e)) => Some(e),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&ErrorEvent> {
        match &self.payload {
            EventPayload::Error(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&DataEvent> {
        match &self.payload {
            EventPayload::Data(d) => Some(d),
            _ => None,
        }
    }
}
