//! 그래프 재작성기

pub mod rewriter;
pub mod report;

// 테스트 모듈
#[cfg(test)]
mod __tests__;

pub use rewriter::{AnalogConverter, ConverterOptions, UnknownNodePolicy};
pub use report::{ConversionReport, ConvertedNode};
