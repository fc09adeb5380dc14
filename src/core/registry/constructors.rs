//! 기본 레이어 생성자

use super::AnalogConstructor;
use crate::core::backend::AnalogBackend;
use crate::core::error::BackendError;
use crate::core::graph::Node;
use crate::core::profile::HardwareProfile;
use std::sync::Arc;

/// 변환 가능한 레이어 계열
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerFamily {
    /// weight: [out, in]
    Linear,
    /// weight: [out, in / groups, k_1, ..., k_dims]
    Conv { dims: usize },
}

impl LayerFamily {
    pub fn weight_rank(&self) -> usize {
        match self {
            LayerFamily::Linear => 2,
            LayerFamily::Conv { dims } => dims + 2,
        }
    }
}

/// 가중치 형상을 확인한 뒤 파라미터를 복사해 백엔드에 넘기는 생성자
#[derive(Debug, Clone, Copy)]
pub struct LayerConstructor {
    pub family: LayerFamily,
}

impl LayerConstructor {
    pub fn new(family: LayerFamily) -> Self {
        Self { family }
    }
}

impl AnalogConstructor for LayerConstructor {
    fn construct(
        &self,
        node: &Node,
        profile: &Arc<HardwareProfile>,
        backend: &dyn AnalogBackend,
    ) -> Result<Node, BackendError> {
        let weight = node
            .param("weight")
            .ok_or_else(|| BackendError::MissingParameter("weight".to_string()))?;
        if weight.ndim() != self.family.weight_rank() {
            return Err(BackendError::WeightShape(format!(
                "{:?}는 {}차원 가중치가 필요하지만 {:?}가 주어졌습니다",
                self.family,
                self.family.weight_rank(),
                weight.shape()
            )));
        }
        if let Some(bias) = node.param("bias") {
            let out_features = weight.shape()[0];
            if bias.shape() != [out_features].as_slice() {
                return Err(BackendError::WeightShape(format!(
                    "바이어스 형상 {:?}가 출력 크기 {}와 맞지 않습니다",
                    bias.shape(),
                    out_features
                )));
            }
        }

        // 원본과 별칭이 생기지 않도록 항상 복사본을 넘긴다
        backend.construct_analog_node(&node.kind, node.params.clone(), profile)
    }
}
