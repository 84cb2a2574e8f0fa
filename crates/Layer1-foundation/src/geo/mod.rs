//! Geo - 화면 좌표, 지리 좌표, 타일 좌표
//!
//! 이벤트 payload가 공유하는 기하 타입과, 외부 투영 시스템이 구현하는
//! `Unproject` capability를 정의합니다.
//!
//! ```text
//! ScreenPoint (px, 좌상단 원점) ──Unproject──▶ LngLat (경도/위도)
//! TileCoord (z/x/y)  ── 타일 단위 리소스 식별
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 위도 최소값
pub const MIN_LAT: f64 = -90.0;
/// 위도 최대값
pub const MAX_LAT: f64 = 90.0;
/// 지원하는 최대 타일 줌 레벨
pub const MAX_TILE_ZOOM: u8 = 25;

// ============================================================================
// ScreenPoint
// ============================================================================

/// 지도 화면 공간의 2D 픽셀 좌표 (좌상단 원점)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// 여러 접점의 중심점. 비어 있으면 None
    pub fn centroid(points: &[ScreenPoint]) -> Option<ScreenPoint> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let (sx, sy) = points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(ScreenPoint::new(sx / n, sy / n))
    }
}

impl fmt::Display for ScreenPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ============================================================================
// LngLat
// ============================================================================

/// 경도/위도 지리 좌표 (도 단위)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    /// 위도 범위를 검증하여 생성
    pub fn new(lng: f64, lat: f64) -> Result<Self> {
        if !lng.is_finite() {
            return Err(Error::validation(format!("invalid longitude: {lng}")));
        }
        if !(MIN_LAT..=MAX_LAT).contains(&lat) {
            return Err(Error::validation(format!(
                "invalid latitude: {lat} (must be between {MIN_LAT} and {MAX_LAT})"
            )));
        }
        Ok(Self { lng, lat })
    }

    /// 경도를 [-180, 180) 범위로 감싼 좌표
    pub fn wrap(&self) -> Self {
        let lng = (self.lng + 180.0).rem_euclid(360.0) - 180.0;
        Self { lng, lat: self.lat }
    }
}

impl fmt::Display for LngLat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LngLat({}, {})", self.lng, self.lat)
    }
}

// ============================================================================
// TileCoord
// ============================================================================

/// 타일 좌표 (z/x/y)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    /// 줌 레벨 내 범위를 검증하여 생성
    pub fn new(z: u8, x: u32, y: u32) -> Result<Self> {
        if z > MAX_TILE_ZOOM {
            return Err(Error::validation(format!(
                "invalid tile zoom: {z} (max {MAX_TILE_ZOOM})"
            )));
        }
        let dim = 1u64 << z;
        if u64::from(x) >= dim || u64::from(y) >= dim {
            return Err(Error::validation(format!(
                "tile {z}/{x}/{y} is outside the {dim}x{dim} grid"
            )));
        }
        Ok(Self { z, x, y })
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

// ============================================================================
// Unproject capability
// ============================================================================

/// 픽셀 좌표를 지리 좌표로 변환하는 capability
///
/// 투영 시스템(외부 협력자)이 구현합니다. 클로저도 그대로 사용할 수 있습니다.
///
/// ```ignore
/// let project = |p: ScreenPoint| LngLat::new(p.x / 10.0, p.y / 10.0).map_err(Into::into);
/// let lng_lat = project.unproject(ScreenPoint::new(10.0, 20.0))?;
/// ```
pub trait Unproject {
    fn unproject(&self, point: ScreenPoint) -> anyhow::Result<LngLat>;
}

impl<F> Unproject for F
where
    F: Fn(ScreenPoint) -> anyhow::Result<LngLat>,
{
    fn unproject(&self, point: ScreenPoint) -> anyhow::Result<LngLat> {
        self(point)
    }
}
