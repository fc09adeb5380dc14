//! 결과 저장기
//!
//! 변환된 그래프의 파라미터 상태를 SafeTensors 파일로 저장한다.
//! 외부 부작용(디렉토리 생성, 파일 쓰기)이 있는 유일한 구성 요소다.


use crate::core::error::PersistenceError;
use crate::core::graph::{ModuleGraph, StateDict};
use crate::core::tensors::{from_le_bytes, to_le_bytes};
use log::info;
use safetensors::tensor::TensorView;
use safetensors::{Dtype, SafeTensors};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// 메타데이터에 기록하는 형식 이름
pub const FORMAT_NAME: &str = "analog_conv";

/// `__metadata__`의 유일한 키. 값은 정렬된 JSON 객체다.
pub const METADATA_KEY: &str = "analog_conv";

/// 저장 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistStatus {
    /// 저장 경로가 주어지지 않음
    NotPersisted,
    /// 저장 완료 (정규화된 경로)
    Saved(PathBuf),
}

impl PersistStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, PersistStatus::Saved(_))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            PersistStatus::Saved(path) => Some(path),
            PersistStatus::NotPersisted => None,
        }
    }
}

/// 그래프의 state dict를 `target`에 저장
///
/// 없는 상위 디렉토리는 모두 만든다. 이미 있으면 에러가 아니다.
pub fn persist(
    graph: &ModuleGraph,
    target: Option<&Path>,
) -> Result<PersistStatus, PersistenceError> {
    let Some(target) = target else {
        return Ok(PersistStatus::NotPersisted);
    };

    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| PersistenceError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let bytes = serialize_state(&graph.state_dict(), &analog_metadata(graph)?)?;
    // fs::write는 성공/실패와 관계없이 파일 핸들을 닫는다
    fs::write(target, &bytes).map_err(|source| PersistenceError::Write {
        path: target.to_path_buf(),
        source,
    })?;

    let resolved = fs::canonicalize(target).map_err(|source| PersistenceError::Read {
        path: target.to_path_buf(),
        source,
    })?;
    info!(
        "아날로그 모델 저장 완료: {} ({:.1} KB)",
        resolved.display(),
        bytes.len() as f64 / 1024.0
    );
    Ok(PersistStatus::Saved(resolved))
}

/// state dict를 SafeTensors 바이트열로 직렬화
pub fn serialize_state(
    state: &StateDict,
    metadata: &BTreeMap<String, String>,
) -> Result<Vec<u8>, PersistenceError> {
    let buffers: BTreeMap<&str, Vec<u8>> = state
        .iter()
        .map(|(name, tensor)| (name.as_str(), to_le_bytes(tensor)))
        .collect();

    let mut views = Vec::with_capacity(state.len());
    for (name, tensor) in state {
        let data = buffers[name.as_str()].as_slice();
        views.push((
            name.as_str(),
            TensorView::new(Dtype::F32, tensor.shape().to_vec(), data)?,
        ));
    }

    let mut info = metadata.clone();
    info.insert("format".to_string(), FORMAT_NAME.to_string());
    // 헤더 키가 둘 이상이면 HashMap 순서에 따라 저장 바이트가 달라진다
    let header = HashMap::from([(METADATA_KEY.to_string(), serde_json::to_string(&info)?)]);
    Ok(safetensors::serialize(views, &Some(header))?)
}

/// 저장된 state dict 로드
pub fn load_state(path: impl AsRef<Path>) -> Result<StateDict, PersistenceError> {
    let path = path.as_ref();
    let buffer = fs::read(path).map_err(|source| PersistenceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let tensors = SafeTensors::deserialize(&buffer)?;

    let mut state = StateDict::new();
    for (name, view) in tensors.tensors() {
        if view.dtype() != Dtype::F32 {
            return Err(PersistenceError::UnsupportedDtype {
                name,
                dtype: format!("{:?}", view.dtype()),
            });
        }
        let tensor = from_le_bytes(view.shape(), view.data())?;
        state.insert(name, tensor);
    }
    Ok(state)
}

/// 저장된 파일의 메타데이터 로드 (`format`, `analog_nodes`)
///
/// 이 형식으로 저장되지 않은 파일이면 빈 맵을 반환한다.
pub fn load_metadata(path: impl AsRef<Path>) -> Result<BTreeMap<String, String>, PersistenceError> {
    let path = path.as_ref();
    let buffer = fs::read(path).map_err(|source| PersistenceError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let (_, metadata) = SafeTensors::read_metadata(&buffer)?;
    match metadata.metadata().as_ref().and_then(|header| header.get(METADATA_KEY)) {
        Some(json) => Ok(serde_json::from_str(json)?),
        None => Ok(BTreeMap::new()),
    }
}

/// 아날로그 노드별 (원래 타입, 프로파일, 타일 격자)를 JSON 한 줄로 기록
fn analog_metadata(graph: &ModuleGraph) -> Result<BTreeMap<String, String>, PersistenceError> {
    let mut nodes = serde_json::Map::new();
    let mut failure = None;
    graph.walk(|path, node| {
        let Some(unit) = node.analog() else {
            return;
        };
        match serde_json::to_value(unit.profile.as_ref()) {
            Ok(profile) => {
                nodes.insert(
                    path.to_string(),
                    serde_json::json!({
                        "source_kind": unit.source_kind,
                        "analog_kind": node.kind,
                        "weight_shape": unit.weight_shape,
                        "tile_grid": [unit.tile_grid.0, unit.tile_grid.1],
                        "profile": profile,
                    }),
                );
            }
            Err(e) => failure = Some(e),
        }
    });
    if let Some(e) = failure {
        return Err(e.into());
    }

    let mut metadata = BTreeMap::new();
    metadata.insert(
        "analog_nodes".to_string(),
        serde_json::to_string(&serde_json::Value::Object(nodes))?,
    );
    Ok(metadata)
}
