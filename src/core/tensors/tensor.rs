//! 파라미터 텐서
//!
//! 가중치 상태는 소유권을 가진 dense `f32` 다차원 배열로 표현한다.
//! `Tensor::clone()`은 항상 데이터를 깊은 복사하므로 변환 후 원본과 별칭이 생기지 않는다.

use ndarray::{Array2, ArrayD, IxDyn, ShapeError};
use serde::{Deserialize, Serialize};

/// 파라미터 텐서
pub type Tensor = ArrayD<f32>;

/// 그래프 기술 파일에서 쓰는 텐서 직렬화 형식
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorSpec {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl TensorSpec {
    /// 형상과 데이터 길이가 일치할 때만 텐서로 변환
    pub fn to_tensor(&self) -> Result<Tensor, ShapeError> {
        ArrayD::from_shape_vec(IxDyn(&self.shape), self.data.clone())
    }

    pub fn from_tensor(tensor: &Tensor) -> Self {
        Self {
            shape: tensor.shape().to_vec(),
            data: tensor.iter().copied().collect(),
        }
    }
}

/// 텐서가 차지하는 바이트 수 (f32 = 4 bytes)
pub fn byte_size(tensor: &Tensor) -> usize {
    tensor.len() * std::mem::size_of::<f32>()
}

/// 첫 번째 축을 행, 나머지 축을 열로 펼친 2차원 크기
///
/// conv 커널 `[out, in, k...]`은 `[out, in * k...]`가 된다.
pub fn matrix_dims(shape: &[usize]) -> Option<(usize, usize)> {
    let (&rows, rest) = shape.split_first()?;
    if rest.is_empty() {
        return None;
    }
    Some((rows, rest.iter().product()))
}

/// 텐서를 2차원 행렬로 펼친다 (논리적 원소 순서 유지)
pub fn flatten_to_matrix(tensor: &Tensor) -> Option<Array2<f32>> {
    let (rows, cols) = matrix_dims(tensor.shape())?;
    Array2::from_shape_vec((rows, cols), tensor.iter().copied().collect()).ok()
}

/// little-endian f32 바이트열
pub fn to_le_bytes(tensor: &Tensor) -> Vec<u8> {
    tensor.iter().flat_map(|x| x.to_le_bytes()).collect()
}

/// little-endian f32 바이트열에서 텐서 복원
pub fn from_le_bytes(shape: &[usize], bytes: &[u8]) -> Result<Tensor, ShapeError> {
    let values: Vec<f32> = bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    ArrayD::from_shape_vec(IxDyn(shape), values)
}
