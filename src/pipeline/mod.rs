//! 변환 파이프라인
//!
//! 그래프 재작성과 결과 저장을 한 번의 호출로 묶는다.

pub mod convert_to_analog;


pub use convert_to_analog::*;
