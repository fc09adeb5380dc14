//! # 변환 엔진 핵심 모듈
//!
//! 모듈 그래프, 하드웨어 프로파일, 적격성 분류기, 그래프 재작성기, 결과 저장기

pub mod error;
pub mod tensors;
pub mod graph;
pub mod profile;
pub mod registry;
pub mod backend;
pub mod convert;
pub mod persist;

// 주요 타입들 재수출
pub use error::*;
pub use tensors::*;
pub use graph::*;
pub use profile::*;
pub use registry::*;
pub use backend::*;
pub use convert::*;
pub use persist::*;

// 모듈 간 공용 테스트 픽스처
#[cfg(test)]
pub(crate) mod __tests__;
