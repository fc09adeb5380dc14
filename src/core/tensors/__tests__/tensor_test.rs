use crate::core::tensors::*;
use ndarray::{ArrayD, IxDyn};

#[test]
fn 텐서_스펙_변환_테스트() {
    let spec = TensorSpec {
        shape: vec![2, 3],
        data: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
    };
    let tensor = spec.to_tensor().unwrap();
    assert_eq!(tensor.shape(), &[2, 3]);
    assert_eq!(tensor[[1, 2]], 6.0);
    assert_eq!(TensorSpec::from_tensor(&tensor), spec);
}

#[test]
fn 텐서_스펙_길이_불일치_테스트() {
    let spec = TensorSpec {
        shape: vec![2, 2],
        data: vec![1.0, 2.0, 3.0],
    };
    assert!(spec.to_tensor().is_err());
}

#[test]
fn 행렬_차원_계산_테스트() {
    assert_eq!(matrix_dims(&[4, 3]), Some((4, 3)));
    // conv2d 커널 [out, in, kh, kw]
    assert_eq!(matrix_dims(&[8, 3, 3, 3]), Some((8, 27)));
    assert_eq!(matrix_dims(&[5]), None);
    assert_eq!(matrix_dims(&[]), None);
}

#[test]
fn 행렬_펼치기_순서_테스트() {
    let data: Vec<f32> = (0..12).map(|x| x as f32).collect();
    let tensor = ArrayD::from_shape_vec(IxDyn(&[2, 2, 3]), data).unwrap();
    let matrix = flatten_to_matrix(&tensor).unwrap();
    assert_eq!(matrix.dim(), (2, 6));
    assert_eq!(matrix[[1, 0]], 6.0);
    assert_eq!(matrix[[1, 5]], 11.0);
}

#[test]
fn 바이트_변환_테스트() {
    let tensor = ArrayD::from_shape_vec(IxDyn(&[3]), vec![0.5f32, -1.25, 3.0]).unwrap();
    let bytes = to_le_bytes(&tensor);
    assert_eq!(bytes.len(), byte_size(&tensor));
    let restored = from_le_bytes(&[3], &bytes).unwrap();
    assert_eq!(restored, tensor);
}
