//! Payload Builder - 원시 입력에서 이벤트 payload 생성
//!
//! 포인터/터치 payload는 호출자가 넘긴 투영 capability([`Unproject`])로
//! 지리 좌표를 채웁니다. 데이터 payload는 리소스/타일 설명에서 만들며,
//! `dataType`과 맞지 않는 필드가 있으면 거부합니다.
//!
//! 빌더는 공유 가변 상태가 없는 순수 생성기입니다.

use crate::kind::{EventKind, PayloadShape};
use crate::lifecycle::LifecycleKey;
use crate::payload::{
    DataEvent, DataType, ErrorEvent, EventPayload, MapEvent, MapId, MotionSource, OriginalEvent,
    PointerEvent, SourceData, SourceDataType, StyleData, TileRef, TouchEvent,
};
use carta_foundation::{Error, LngLat, Result, ScreenPoint, TileCoord, Unproject};
use serde_json::Value;

// ============================================================================
// DataExtras
// ============================================================================

/// 데이터 이벤트의 선택 필드
///
/// 소스 전용 필드(`is_source_loaded`, `source_data_type`, `tile`, `coord`)는
/// `dataType`이 `source`일 때만 허용됩니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataExtras {
    /// 스타일 리소스 ID 또는 sourceId
    pub resource_id: String,
    pub is_source_loaded: Option<bool>,
    pub source_data_type: Option<SourceDataType>,
    /// 스타일/소스 설명 (불투명)
    pub resource: Option<Value>,
    pub tile: Option<TileRef>,
    pub coord: Option<TileCoord>,
}

impl DataExtras {
    pub fn new(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            ..Default::default()
        }
    }

    pub fn with_source_loaded(mut self, loaded: bool) -> Self {
        self.is_source_loaded = Some(loaded);
        self
    }

    pub fn with_source_data_type(mut self, source_data_type: SourceDataType) -> Self {
        self.source_data_type = Some(source_data_type);
        self
    }

    pub fn with_resource(mut self, resource: Value) -> Self {
        self.resource = Some(resource);
        self
    }

    pub fn with_tile(mut self, tile: TileRef) -> Self {
        self.tile = Some(tile);
        self
    }

    pub fn with_coord(mut self, coord: TileCoord) -> Self {
        self.coord = Some(coord);
        self
    }

    /// 스타일 payload에 없어야 하는 필드 이름
    fn source_only_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.is_source_loaded.is_some() {
            fields.push("isSourceLoaded");
        }
        if self.source_data_type.is_some() {
            fields.push("sourceDataType");
        }
        if self.tile.is_some() {
            fields.push("tile");
        }
        if self.coord.is_some() {
            fields.push("coord");
        }
        fields
    }
}

// ============================================================================
// PayloadBuilder
// ============================================================================

/// 지도 인스턴스 하나에 묶인 payload 빌더
#[derive(Debug, Clone, Copy)]
pub struct PayloadBuilder {
    owner: MapId,
}

impl PayloadBuilder {
    pub fn new(owner: MapId) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> MapId {
        self.owner
    }

    /// 포인터 이벤트 생성
    ///
    /// `kind`는 포인터 형태이거나 motion 종류(movestart/move/moveend)여야 합니다.
    /// 투영 실패는 재시도 없이 `Error::Projection`으로 반환합니다.
    pub fn pointer<P>(
        &self,
        kind: EventKind,
        original: OriginalEvent,
        point: ScreenPoint,
        project: &P,
    ) -> Result<MapEvent>
    where
        P: Unproject + ?Sized,
    {
        let shape = kind.payload_shape();
        if !matches!(shape, PayloadShape::Pointer | PayloadShape::Motion) {
            return Err(Error::validation(format!(
                "'{kind}' does not carry a pointer payload"
            )));
        }

        let lng_lat = project.unproject(point).map_err(|e| Error::projection(&e))?;
        let pointer = PointerEvent::new(original, point, lng_lat);

        let payload = match shape {
            PayloadShape::Motion => EventPayload::Motion(MotionSource::Pointer(pointer)),
            _ => EventPayload::Pointer(pointer),
        };
        MapEvent::new(kind, self.owner, payload)
    }

    /// 터치 이벤트 생성
    ///
    /// 접점마다 투영하며 순서를 유지합니다. 대표 위치는 접점 중심점입니다.
    pub fn touch<P>(
        &self,
        kind: EventKind,
        original: OriginalEvent,
        points: Vec<ScreenPoint>,
        project: &P,
    ) -> Result<MapEvent>
    where
        P: Unproject + ?Sized,
    {
        let shape = kind.payload_shape();
        if !matches!(shape, PayloadShape::Touch | PayloadShape::Motion) {
            return Err(Error::validation(format!(
                "'{kind}' does not carry a touch payload"
            )));
        }

        let Some(center) = ScreenPoint::centroid(&points) else {
            return Err(Error::validation(format!(
                "'{kind}' requires at least one touch point"
            )));
        };

        let lng_lats = points
            .iter()
            .map(|p| project.unproject(*p))
            .collect::<anyhow::Result<Vec<LngLat>>>()
            .map_err(|e| Error::projection(&e))?;
        let center_lng_lat = project.unproject(center).map_err(|e| Error::projection(&e))?;

        let touch = TouchEvent::new(original, points, lng_lats, center, center_lng_lat);
        let payload = match shape {
            PayloadShape::Motion => EventPayload::Motion(MotionSource::Touch(touch)),
            _ => EventPayload::Touch(touch),
        };
        MapEvent::new(kind, self.owner, payload)
    }

    /// 데이터 라이프사이클 이벤트 생성
    pub fn data(&self, kind: EventKind, data_type: DataType, extras: DataExtras) -> Result<MapEvent> {
        let data = match data_type {
            DataType::Style => {
                let fields = extras.source_only_fields();
                if !fields.is_empty() {
                    return Err(Error::validation(format!(
                        "style data event cannot carry {}",
                        fields.join(", ")
                    )));
                }
                DataEvent::Style(StyleData {
                    resource_id: extras.resource_id,
                    style: extras.resource,
                })
            }
            DataType::Source => DataEvent::Source(SourceData {
                source_id: extras.resource_id,
                is_source_loaded: extras.is_source_loaded.unwrap_or(false),
                source_data_type: extras.source_data_type,
                source: extras.resource,
                tile: extras.tile,
                coord: extras.coord,
            }),
        };
        MapEvent::new(kind, self.owner, EventPayload::Data(data))
    }

    /// `error` 이벤트 생성. `key`가 있으면 해당 로드를 종료시킵니다.
    pub fn error(&self, message: impl Into<String>, key: Option<LifecycleKey>) -> Result<MapEvent> {
        let error = ErrorEvent {
            message: message.into(),
            key,
        };
        MapEvent::new(EventKind::Error, self.owner, EventPayload::Error(error))
    }

    /// 필드 없는 이벤트 (zoom, rotate, pitch, resize, load, remove, style.load)
    pub fn plain(&self, kind: EventKind) -> Result<MapEvent> {
        MapEvent::new(kind, self.owner, EventPayload::Empty)
    }

    /// movestart/move/moveend 생성
    pub fn motion(&self, kind: EventKind, source: MotionSource) -> Result<MapEvent> {
        MapEvent::new(kind, self.owner, EventPayload::Motion(source))
    }
}
