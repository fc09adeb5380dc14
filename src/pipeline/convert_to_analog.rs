//! `convert_model_to_analog`

use crate::core::backend::AnalogBackend;
use crate::core::convert::{AnalogConverter, ConversionReport};
use crate::core::error::{ConversionError, PersistenceError};
use crate::core::graph::ModuleGraph;
use crate::core::persist::{persist, PersistStatus};
use crate::core::profile::HardwareProfile;
use log::{info, warn};
use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::Arc;

/// 변환된 모델
///
/// in-place 변환이면 호출자의 그래프 자체를 가리키고, 아니면 새 그래프를 소유한다.
#[derive(Debug)]
pub enum ConvertedModel<'a> {
    InPlace(&'a mut ModuleGraph),
    Copied(ModuleGraph),
}

impl ConvertedModel<'_> {
    pub fn is_in_place(&self) -> bool {
        matches!(self, ConvertedModel::InPlace(_))
    }

    /// 복사 변환 결과만 소유권을 넘겨받을 수 있다
    pub fn into_owned(self) -> Option<ModuleGraph> {
        match self {
            ConvertedModel::Copied(graph) => Some(graph),
            ConvertedModel::InPlace(_) => None,
        }
    }
}

impl Deref for ConvertedModel<'_> {
    type Target = ModuleGraph;

    fn deref(&self) -> &ModuleGraph {
        match self {
            ConvertedModel::InPlace(graph) => graph,
            ConvertedModel::Copied(graph) => graph,
        }
    }
}

impl DerefMut for ConvertedModel<'_> {
    fn deref_mut(&mut self) -> &mut ModuleGraph {
        match self {
            ConvertedModel::InPlace(graph) => graph,
            ConvertedModel::Copied(graph) => graph,
        }
    }
}

/// 변환 호출 결과
///
/// 저장 실패는 `persisted`에만 기록되며 변환된 모델은 그대로 유효하다.
#[derive(Debug)]
pub struct ConversionOutcome<'a> {
    pub model: ConvertedModel<'a>,
    pub report: ConversionReport,
    /// 이번 호출의 모든 아날로그 노드가 공유하는 프로파일
    pub profile: Arc<HardwareProfile>,
    pub persisted: Result<PersistStatus, PersistenceError>,
}

impl ConversionOutcome<'_> {
    /// 변환과 저장이 모두 성공했는지
    pub fn is_saved(&self) -> bool {
        matches!(&self.persisted, Ok(PersistStatus::Saved(_)))
    }
}

/// 기본 레지스트리와 타일 백엔드로 모델을 아날로그 등가 모델로 변환
///
/// * `config` - 없으면 기본 프로파일을 한 번 만들어 모든 노드에 공유
/// * `inplace` - true면 `model`을 직접 수정, false면 깊은 복사본을 변환
/// * `save_path` - 주어지면 변환된 state dict를 저장
pub fn convert_model_to_analog<'a>(
    model: &'a mut ModuleGraph,
    config: Option<Arc<HardwareProfile>>,
    inplace: bool,
    save_path: Option<&Path>,
) -> Result<ConversionOutcome<'a>, ConversionError> {
    convert_with(&AnalogConverter::default(), model, config, inplace, save_path)
}

/// 사용자 변환기(레지스트리/백엔드/옵션)로 변환
pub fn convert_with<'a, B: AnalogBackend>(
    converter: &AnalogConverter<B>,
    model: &'a mut ModuleGraph,
    config: Option<Arc<HardwareProfile>>,
    inplace: bool,
    save_path: Option<&Path>,
) -> Result<ConversionOutcome<'a>, ConversionError> {
    let profile = match config {
        Some(profile) => profile,
        None => HardwareProfile::default().into_shared()?,
    };

    let (model, report) = if inplace {
        let report = converter.convert_in_place(model, &profile)?;
        (ConvertedModel::InPlace(model), report)
    } else {
        let (copy, report) = converter.convert(model, &profile)?;
        (ConvertedModel::Copied(copy), report)
    };

    let persisted = persist(&model, save_path);
    match &persisted {
        Ok(PersistStatus::Saved(path)) => info!("변환 모델 저장: {}", path.display()),
        Ok(PersistStatus::NotPersisted) => {}
        Err(e) => warn!("변환은 완료되었지만 저장에 실패했습니다: {}", e),
    }

    Ok(ConversionOutcome {
        model,
        report,
        profile,
        persisted,
    })
}
