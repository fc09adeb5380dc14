//! 아날로그 변환 라이브러리
//!
//! 디지털 신경망 모듈 그래프에서 변환 가능한 레이어를 찾아
//! 아날로그 하드웨어 등가 유닛으로 교체하고, 결과를 저장한다.

pub mod core;
pub mod pipeline;

// 핵심 모듈들 재수출
pub use core::{
    // 그래프 및 텐서
    Child, GraphDescription, ModuleGraph, Node, SharedNode, Tensor, TensorSpec,
    // 하드웨어 프로파일
    DeviceClass, HardwareProfile, Precision, ProfileKind, TileGeometry,
    // 변환 엔진
    AnalogBackend, AnalogConstructor, AnalogConverter, AnalogUnit, ConversionRegistry,
    ConversionReport, ConverterOptions, Eligibility, TiledBackend, UnknownNodePolicy,
    // 저장
    PersistStatus,
    // 에러
    BackendError, ConversionError, PersistenceError,
};
pub use pipeline::{convert_model_to_analog, ConversionOutcome, ConvertedModel};
