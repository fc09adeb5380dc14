//! 타일 분할 참조 백엔드
//!
//! 가중치 행렬을 프로파일의 타일 크기 제한에 맞춰 격자로 나눠 저장한다.
//! 값은 그대로 복사되며 (양자화/노이즈 없음) `reassemble_weight`로 원본을 복원할 수 있다.

use super::{AnalogBackend, AnalogUnit, WeightState};
use crate::core::error::BackendError;
use crate::core::graph::Node;
use crate::core::profile::HardwareProfile;
use crate::core::tensors::{flatten_to_matrix, matrix_dims, Tensor};
use ndarray::{s, Array2, IxDyn};
use std::sync::Arc;

/// 타일 파라미터 이름 접두사
pub const TILE_PREFIX: &str = "analog_tiles";

/// `analog_tiles.{row}_{col}.weight`
pub fn tile_param_name(row: usize, col: usize) -> String {
    format!("{}.{}_{}.weight", TILE_PREFIX, row, col)
}

/// 아날로그 바이어스 파라미터 이름 (digital_bias = false 일 때)
pub fn analog_bias_name() -> String {
    format!("{}.bias", TILE_PREFIX)
}

/// 변환된 노드 타입 태그의 접두사
pub const ANALOG_PREFIX: &str = "Analog";

/// 변환된 노드의 타입 태그
pub fn analog_kind(kind: &str) -> String {
    format!("{}{}", ANALOG_PREFIX, kind)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TiledBackend;

impl TiledBackend {
    pub fn new() -> Self {
        Self
    }

    /// 타일에서 원래 가중치 텐서를 복원
    pub fn reassemble_weight(node: &Node) -> Result<Tensor, BackendError> {
        let unit = node
            .analog()
            .ok_or_else(|| BackendError::Other(format!("'{}'는 아날로그 노드가 아닙니다", node.kind)))?;
        let (rows, cols) = matrix_dims(&unit.weight_shape).ok_or_else(|| {
            BackendError::WeightShape(format!("복원할 수 없는 형상 {:?}", unit.weight_shape))
        })?;

        let profile = &unit.profile;
        let mut matrix = Array2::<f32>::zeros((rows, cols));
        let (grid_rows, grid_cols) = unit.tile_grid;
        for r in 0..grid_rows {
            for c in 0..grid_cols {
                let name = tile_param_name(r, c);
                let tile = node
                    .param(&name)
                    .ok_or(BackendError::MissingParameter(name))?;
                let row_start = r * profile.tile.max_output_size;
                let col_start = c * profile.tile.max_input_size;
                let row_end = (row_start + profile.tile.max_output_size).min(rows);
                let col_end = (col_start + profile.tile.max_input_size).min(cols);
                let tile = tile
                    .view()
                    .into_dimensionality::<ndarray::Ix2>()
                    .map_err(|e| BackendError::WeightShape(e.to_string()))?;
                matrix
                    .slice_mut(s![row_start..row_end, col_start..col_end])
                    .assign(&tile);
            }
        }

        matrix
            .into_shape(IxDyn(&unit.weight_shape))
            .map_err(|e| BackendError::WeightShape(e.to_string()))
    }

    /// 바이어스 위치(디지털/아날로그)에 상관없이 바이어스를 찾는다
    pub fn bias(node: &Node) -> Option<&Tensor> {
        node.param("bias").or_else(|| node.param(&analog_bias_name()))
    }
}

impl AnalogBackend for TiledBackend {
    fn construct_analog_node(
        &self,
        kind: &str,
        mut weights: WeightState,
        profile: &Arc<HardwareProfile>,
    ) -> Result<Node, BackendError> {
        let weight = weights
            .remove("weight")
            .ok_or_else(|| BackendError::MissingParameter("weight".to_string()))?;
        let weight_shape = weight.shape().to_vec();
        let matrix = flatten_to_matrix(&weight).ok_or_else(|| {
            BackendError::WeightShape(format!(
                "{} 가중치는 2차원 이상이어야 합니다: {:?}",
                kind, weight_shape
            ))
        })?;

        let (rows, cols) = matrix.dim();
        let tile_rows = profile.tile.max_output_size;
        let tile_cols = profile.tile.max_input_size;
        let grid = (
            rows.div_ceil(tile_rows).max(1),
            cols.div_ceil(tile_cols).max(1),
        );

        let mut node = Node::new(analog_kind(kind));
        for r in 0..grid.0 {
            for c in 0..grid.1 {
                let row_end = ((r + 1) * tile_rows).min(rows);
                let col_end = ((c + 1) * tile_cols).min(cols);
                let tile = matrix
                    .slice(s![r * tile_rows..row_end, c * tile_cols..col_end])
                    .to_owned()
                    .into_dyn();
                node.params.insert(tile_param_name(r, c), tile);
            }
        }

        if let Some(bias) = weights.remove("bias") {
            let name = if profile.digital_bias {
                "bias".to_string()
            } else {
                analog_bias_name()
            };
            node.params.insert(name, bias);
        }
        // 그 밖의 파라미터는 디지털로 유지
        node.params.append(&mut weights);

        Ok(node.with_analog(AnalogUnit {
            source_kind: kind.to_string(),
            profile: Arc::clone(profile),
            weight_shape,
            tile_grid: grid,
        }))
    }
}
