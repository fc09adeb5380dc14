//! 아날로그 시뮬레이션 백엔드 경계
//!
//! 변환 엔진은 아날로그 유닛이 어떻게 계산하는지 알지 못한다.
//! 적격 노드마다 `AnalogBackend::construct_analog_node`를 한 번 호출할 뿐이다.

pub mod tiled;


pub use tiled::TiledBackend;

use crate::core::error::BackendError;
use crate::core::graph::Node;
use crate::core::profile::HardwareProfile;
use crate::core::tensors::Tensor;
use std::collections::BTreeMap;
use std::sync::Arc;

/// 노드의 파라미터 상태 (이름 → 텐서 복사본)
pub type WeightState = BTreeMap<String, Tensor>;

/// 아날로그 노드 생성 팩토리
pub trait AnalogBackend {
    /// 디지털 타입 태그와 가중치 복사본, 프로파일로 아날로그 등가 노드를 만든다
    fn construct_analog_node(
        &self,
        kind: &str,
        weights: WeightState,
        profile: &Arc<HardwareProfile>,
    ) -> Result<Node, BackendError>;
}

/// 아날로그 등가 노드에 붙는 메타데이터
#[derive(Debug, Clone, PartialEq)]
pub struct AnalogUnit {
    /// 변환 전 디지털 타입 태그
    pub source_kind: String,
    /// 생성에 쓰인 프로파일 (같은 호출의 노드들이 공유)
    pub profile: Arc<HardwareProfile>,
    /// 원래 가중치 텐서 형상
    pub weight_shape: Vec<usize>,
    /// (행 타일 수, 열 타일 수)
    pub tile_grid: (usize, usize),
}

impl AnalogUnit {
    pub fn num_tiles(&self) -> usize {
        self.tile_grid.0 * self.tile_grid.1
    }
}
