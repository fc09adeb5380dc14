//! 변환 엔진 에러 타입

use std::path::PathBuf;
use thiserror::Error;

/// 그래프 구조 및 변환 단계 에러
///
/// 이 에러가 발생하면 호출 전체가 중단되며 부분 변환된 그래프는 남지 않는다.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("잘못된 그래프 구조 ({path}): {reason}")]
    InvalidGraph { path: String, reason: String },

    #[error("지원하지 않는 노드 타입 '{kind}' ({path})")]
    UnsupportedNode { path: String, kind: String },

    #[error("잘못된 하드웨어 프로파일: {0}")]
    InvalidProfile(String),

    #[error("아날로그 노드 생성 실패 ({path}): {source}")]
    Backend {
        path: String,
        #[source]
        source: BackendError,
    },
}

impl ConversionError {
    pub(crate) fn invalid(path: &str, reason: impl Into<String>) -> Self {
        Self::InvalidGraph {
            path: display_path(path).to_string(),
            reason: reason.into(),
        }
    }
}

/// 아날로그 시뮬레이션 백엔드 에러
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("필수 파라미터 '{0}'가 없습니다")]
    MissingParameter(String),

    #[error("가중치 형상 오류: {0}")]
    WeightShape(String),

    #[error("{0}")]
    Other(String),
}

/// 결과 저장 에러
///
/// 변환 결과 자체는 유효하며, 저장 실패만 별도로 보고된다.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("디렉토리 생성 실패 {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("파일 쓰기 실패 {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("파일 읽기 실패 {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SafeTensors 오류: {0}")]
    SafeTensors(#[from] safetensors::SafeTensorError),

    #[error("메타데이터 인코딩 실패: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("텐서 형상 오류: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("지원하지 않는 데이터 타입 '{name}': {dtype}")]
    UnsupportedDtype { name: String, dtype: String },
}

/// 루트 경로는 빈 문자열이므로 출력용 이름으로 바꾼다
pub fn display_path(path: &str) -> &str {
    if path.is_empty() {
        "(root)"
    } else {
        path
    }
}
