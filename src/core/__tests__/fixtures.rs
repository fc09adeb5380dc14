//! 테스트용 그래프 픽스처

use crate::core::graph::{ModuleGraph, Node};
use crate::core::tensors::Tensor;
use ndarray::{ArrayD, IxDyn};

/// `start`부터 0.01씩 증가하는 결정적 텐서
pub fn ramp(shape: &[usize], start: f32) -> Tensor {
    let len: usize = shape.iter().product();
    let data = (0..len).map(|i| start + i as f32 * 0.01).collect();
    ArrayD::from_shape_vec(IxDyn(shape), data).expect("픽스처 텐서 형상 오류")
}

pub fn linear(in_features: usize, out_features: usize, start: f32) -> Node {
    Node::new("Linear")
        .with_param("weight", ramp(&[out_features, in_features], start))
        .with_param("bias", ramp(&[out_features], -start))
}

pub fn conv2d(in_channels: usize, out_channels: usize, kernel: usize, start: f32) -> Node {
    Node::new("Conv2d")
        .with_param("weight", ramp(&[out_channels, in_channels, kernel, kernel], start))
        .with_param("bias", ramp(&[out_channels], start))
}

/// Sequential(fc1: Linear(4→8), act: ReLU, fc2: Linear(8→2))
pub fn mlp() -> ModuleGraph {
    ModuleGraph::new(
        Node::new("Sequential")
            .with_child("fc1", linear(4, 8, 0.1))
            .with_child("act", Node::new("ReLU"))
            .with_child("fc2", linear(8, 2, 0.5)),
    )
}

/// 변환 대상이 하나도 없는 그래프
pub fn digital_only() -> ModuleGraph {
    ModuleGraph::new(
        Node::new("Sequential")
            .with_child("norm", Node::new("LayerNorm").with_param("weight", ramp(&[4], 1.0)))
            .with_child("act", Node::new("GELU"))
            .with_child(
                "inner",
                Node::new("Sequential").with_child("drop", Node::new("Dropout")),
            ),
    )
}

/// 컨테이너 안에 변환 가능한 레이어가 중첩된 CNN
pub fn small_cnn() -> ModuleGraph {
    ModuleGraph::new(
        Node::new("Net")
            .with_child(
                "features",
                Node::new("Sequential")
                    .with_child("conv", conv2d(3, 4, 3, 0.2))
                    .with_child("act", Node::new("ReLU"))
                    .with_child("pool", Node::new("MaxPool2d")),
            )
            .with_child("flatten", Node::new("Flatten"))
            .with_child("head", linear(16, 10, -0.3)),
    )
}
