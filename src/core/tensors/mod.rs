//! 텐서 모듈 - 파라미터 텐서와 직렬화 형식

pub mod tensor;

// 테스트 모듈
#[cfg(test)]
mod __tests__;

pub use tensor::*;
