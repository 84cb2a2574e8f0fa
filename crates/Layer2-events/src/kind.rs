//! Event Kinds - 지도 이벤트 분류 체계
//!
//! 지도 표면이 발행할 수 있는 모든 이벤트의 닫힌 집합과, 각 이벤트가
//! 요구하는 payload 형태를 정의합니다. 다른 컴포넌트는 payload 검증 시
//! 항상 여기를 참조합니다.

use carta_foundation::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// EventCategory
// ============================================================================

/// 이벤트 카테고리
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    /// 마우스 포인터 이벤트
    Pointer,
    /// 터치 이벤트
    Touch,
    /// 카메라 이동/크기 변경 이벤트
    Motion,
    /// 지도 라이프사이클 이벤트 (load, remove, error)
    Lifecycle,
    /// 스타일/소스 데이터 이벤트
    Data,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pointer => "pointer",
            Self::Touch => "touch",
            Self::Motion => "motion",
            Self::Lifecycle => "lifecycle",
            Self::Data => "data",
        }
    }
}

// ============================================================================
// PayloadShape
// ============================================================================

/// 이벤트 종류별로 요구되는 payload 형태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadShape {
    /// 포인터 위치 + 지리 좌표
    Pointer,
    /// 접점 목록 + 지리 좌표 목록
    Touch,
    /// 포인터, 터치, 원본 입력만, 또는 없음
    Motion,
    /// owner 외 필수 필드 없음
    Empty,
    /// `{error: {message}}`
    Error,
    /// dataType으로 구분되는 데이터 라이프사이클 payload
    Data,
}

// ============================================================================
// EventKind
// ============================================================================

/// 지도 이벤트 종류 (닫힌 열거형)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    // Pointer
    #[serde(rename = "mousedown")]
    MouseDown,
    #[serde(rename = "mouseup")]
    MouseUp,
    #[serde(rename = "click")]
    Click,
    #[serde(rename = "dblclick")]
    DblClick,
    #[serde(rename = "mousemove")]
    MouseMove,
    #[serde(rename = "mouseenter")]
    MouseEnter,
    #[serde(rename = "mouseleave")]
    MouseLeave,
    #[serde(rename = "mouseover")]
    MouseOver,
    #[serde(rename = "mouseout")]
    MouseOut,
    #[serde(rename = "contextmenu")]
    ContextMenu,

    // Touch
    #[serde(rename = "touchstart")]
    TouchStart,
    #[serde(rename = "touchend")]
    TouchEnd,
    #[serde(rename = "touchcancel")]
    TouchCancel,

    // Motion
    #[serde(rename = "movestart")]
    MoveStart,
    #[serde(rename = "move")]
    Move,
    #[serde(rename = "moveend")]
    MoveEnd,
    #[serde(rename = "zoom")]
    Zoom,
    #[serde(rename = "rotate")]
    Rotate,
    #[serde(rename = "pitch")]
    Pitch,
    #[serde(rename = "resize")]
    Resize,

    // Lifecycle
    #[serde(rename = "load")]
    Load,
    #[serde(rename = "remove")]
    Remove,
    #[serde(rename = "error")]
    Error,

    // Data
    #[serde(rename = "data")]
    Data,
    #[serde(rename = "styledata")]
    StyleData,
    #[serde(rename = "sourcedata")]
    SourceData,
    #[serde(rename = "dataloading")]
    DataLoading,
    #[serde(rename = "styledataloading")]
    StyleDataLoading,
    #[serde(rename = "sourcedataloading")]
    SourceDataLoading,
    #[serde(rename = "style.load")]
    StyleLoad,
}

impl EventKind {
    /// 전체 이벤트 종류
    pub const ALL: [EventKind; 30] = [
        Self::MouseDown,
        Self::MouseUp,
        Self::Click,
        Self::DblClick,
        Self::MouseMove,
        Self::MouseEnter,
        Self::MouseLeave,
        Self::MouseOver,
        Self::MouseOut,
        Self::ContextMenu,
        Self::TouchStart,
        Self::TouchEnd,
        Self::TouchCancel,
        Self::MoveStart,
        Self::Move,
        Self::MoveEnd,
        Self::Zoom,
        Self::Rotate,
        Self::Pitch,
        Self::Resize,
        Self::Load,
        Self::Remove,
        Self::Error,
        Self::Data,
        Self::StyleData,
        Self::SourceData,
        Self::DataLoading,
        Self::StyleDataLoading,
        Self::SourceDataLoading,
        Self::StyleLoad,
    ];

    /// 이벤트 이름 (리스너 등록에 쓰이는 문자열)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MouseDown => "mousedown",
            Self::MouseUp => "mouseup",
            Self::Click => "click",
            Self::DblClick => "dblclick",
            Self::MouseMove => "mousemove",
            Self::MouseEnter => "mouseenter",
            Self::MouseLeave => "mouseleave",
            Self::MouseOver => "mouseover",
            Self::MouseOut => "mouseout",
            Self::ContextMenu => "contextmenu",
            Self::TouchStart => "touchstart",
            Self::TouchEnd => "touchend",
            Self::TouchCancel => "touchcancel",
            Self::MoveStart => "movestart",
            Self::Move => "move",
            Self::MoveEnd => "moveend",
            Self::Zoom => "zoom",
            Self::Rotate => "rotate",
            Self::Pitch => "pitch",
            Self::Resize => "resize",
            Self::Load => "load",
            Self::Remove => "remove",
            Self::Error => "error",
            Self::Data => "data",
            Self::StyleData => "styledata",
            Self::SourceData => "sourcedata",
            Self::DataLoading => "dataloading",
            Self::StyleDataLoading => "styledataloading",
            Self::SourceDataLoading => "sourcedataloading",
            Self::StyleLoad => "style.load",
        }
    }

    pub fn category(&self) -> EventCategory {
        match self {
            Self::MouseDown
            | Self::MouseUp
            | Self::Click
            | Self::DblClick
            | Self::MouseMove
            | Self::MouseEnter
            | Self::MouseLeave
            | Self::MouseOver
            | Self::MouseOut
            | Self::ContextMenu => EventCategory::Pointer,
            Self::TouchStart | Self::TouchEnd | Self::TouchCancel => EventCategory::Touch,
            Self::MoveStart
            | Self::Move
            | Self::MoveEnd
            | Self::Zoom
            | Self::Rotate
            | Self::Pitch
            | Self::Resize => EventCategory::Motion,
            Self::Load | Self::Remove | Self::Error => EventCategory::Lifecycle,
            Self::Data
            | Self::StyleData
            | Self::SourceData
            | Self::DataLoading
            | Self::StyleDataLoading
            | Self::SourceDataLoading
            | Self::StyleLoad => EventCategory::Data,
        }
    }

    /// 이 이벤트가 요구하는 payload 형태
    pub fn payload_shape(&self) -> PayloadShape {
        match self {
            Self::MoveStart | Self::Move | Self::MoveEnd => PayloadShape::Motion,
            Self::Zoom | Self::Rotate | Self::Pitch | Self::Resize => PayloadShape::Empty,
            Self::Load | Self::Remove | Self::StyleLoad => PayloadShape::Empty,
            Self::Error => PayloadShape::Error,
            _ => match self.category() {
                EventCategory::Pointer => PayloadShape::Pointer,
                EventCategory::Touch => PayloadShape::Touch,
                _ => PayloadShape::Data,
            },
        }
    }

    /// `*loading` 이벤트 여부
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            Self::DataLoading | Self::StyleDataLoading | Self::SourceDataLoading
        )
    }

    /// 로딩을 종료시키는 데이터 이벤트 여부 (data, styledata, sourcedata)
    pub fn is_data_terminal(&self) -> bool {
        matches!(self, Self::Data | Self::StyleData | Self::SourceData)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnknownEventKind(s.to_string()))
    }
}

/// 이름으로 payload 형태 조회
pub fn payload_shape_for(name: &str) -> Result<PayloadShape> {
    Ok(name.parse::<EventKind>()?.payload_shape())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_round_trip_through_from_str() {
        let names: HashSet<&str> = EventKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names.len(), EventKind::ALL.len());

        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind() {
        for name in ["tap", "sourceloading", "Click", "", "style_load"] {
            assert!(matches!(
                payload_shape_for(name),
                Err(Error::UnknownEventKind(ref n)) if n == name
            ));
        }
    }

    #[test]
    fn test_shape_table() {
        assert_eq!(payload_shape_for("contextmenu").unwrap(), PayloadShape::Pointer);
        assert_eq!(payload_shape_for("touchcancel").unwrap(), PayloadShape::Touch);
        assert_eq!(payload_shape_for("moveend").unwrap(), PayloadShape::Motion);
        assert_eq!(payload_shape_for("pitch").unwrap(), PayloadShape::Empty);
        assert_eq!(payload_shape_for("remove").unwrap(), PayloadShape::Empty);
        assert_eq!(payload_shape_for("error").unwrap(), PayloadShape::Error);
        assert_eq!(payload_shape_for("sourcedataloading").unwrap(), PayloadShape::Data);
        assert_eq!(payload_shape_for("style.load").unwrap(), PayloadShape::Empty);
    }

    #[test]
    fn test_loading_and_terminal_flags() {
        let loading: Vec<_> = EventKind::ALL.iter().filter(|k| k.is_loading()).collect();
        let terminal: Vec<_> = EventKind::ALL.iter().filter(|k| k.is_data_terminal()).collect();
        assert_eq!(loading.len(), 3);
        assert_eq!(terminal.len(), 3);
        assert!(!EventKind::StyleLoad.is_data_terminal());
    }

    #[test]
    fn test_serde_uses_event_names() {
        let json = serde_json::to_string(&EventKind::StyleLoad).unwrap();
        assert_eq!(json, "\"style.load\"");
        let kind: EventKind = serde_json::from_str("\"dblclick\"").unwrap();
        assert_eq!(kind, EventKind::DblClick);
    }
}
