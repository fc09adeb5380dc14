//! 하드웨어 설정 프로파일
//!
//! 아날로그 유닛의 시뮬레이션 특성(소자 노이즈 계열, 타일 크기, 정밀도)을 기술하는
//! 불변 값. 한 번 생성되면 `Arc`로 공유되며 변환 중에 수정되지 않는다.

use crate::core::error::ConversionError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;


/// 설정 계열
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    /// 단일 소자 학습용 설정
    Single,
    /// 추론 전용 설정 (가중치 프로그래밍 후 고정)
    Inference,
}

/// 소자 노이즈 계열
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Ideal,
    ConstantStep,
    SoftBounds,
    PcmLike,
    ReRamLike,
}

/// 크로스바 타일 크기 제한
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TileGeometry {
    /// 타일 하나가 받는 최대 입력 수 (열)
    pub max_input_size: usize,
    /// 타일 하나가 내는 최대 출력 수 (행)
    pub max_output_size: usize,
}

impl Default for TileGeometry {
    fn default() -> Self {
        Self {
            max_input_size: 512,
            max_output_size: 512,
        }
    }
}

/// 가중치/입출력 변환기 정밀도 (bit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Precision {
    pub weight_bits: u8,
    /// 입력 DAC
    pub dac_bits: u8,
    /// 출력 ADC
    pub adc_bits: u8,
}

impl Default for Precision {
    fn default() -> Self {
        Self {
            weight_bits: 8,
            dac_bits: 7,
            adc_bits: 9,
        }
    }
}

/// 하드웨어 설정 프로파일
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareProfile {
    pub kind: ProfileKind,
    pub device: DeviceClass,
    pub tile: TileGeometry,
    pub precision: Precision,
    /// 바이어스를 디지털로 유지할지 여부
    pub digital_bias: bool,
}

impl Default for HardwareProfile {
    /// 기본(baseline) 단일 소자 프로파일
    fn default() -> Self {
        Self {
            kind: ProfileKind::Single,
            device: DeviceClass::ConstantStep,
            tile: TileGeometry::default(),
            precision: Precision::default(),
            digital_bias: true,
        }
    }
}

impl HardwareProfile {
    /// 추론용 프로파일 (PCM 계열 소자)
    pub fn inference() -> Self {
        Self {
            kind: ProfileKind::Inference,
            device: DeviceClass::PcmLike,
            ..Default::default()
        }
    }

    pub fn with_tile(mut self, max_input_size: usize, max_output_size: usize) -> Self {
        self.tile = TileGeometry {
            max_input_size,
            max_output_size,
        };
        self
    }

    pub fn with_digital_bias(mut self, digital_bias: bool) -> Self {
        self.digital_bias = digital_bias;
        self
    }

    /// 모든 값이 지정되어 있는지 검사
    pub fn validate(&self) -> Result<(), ConversionError> {
        if self.tile.max_input_size == 0 || self.tile.max_output_size == 0 {
            return Err(ConversionError::InvalidProfile(format!(
                "타일 크기는 0보다 커야 합니다: {}x{}",
                self.tile.max_output_size, self.tile.max_input_size
            )));
        }
        let Precision {
            weight_bits,
            dac_bits,
            adc_bits,
        } = self.precision;
        if weight_bits == 0 || dac_bits == 0 || adc_bits == 0 {
            return Err(ConversionError::InvalidProfile(format!(
                "비트 폭은 0보다 커야 합니다: weight={}, dac={}, adc={}",
                weight_bits, dac_bits, adc_bits
            )));
        }
        Ok(())
    }

    /// 검증 후 공유 가능한 형태로 고정
    pub fn into_shared(self) -> Result<Arc<Self>, ConversionError> {
        self.validate()?;
        Ok(Arc::new(self))
    }

    /// JSON 문자열에서 로드 (빠진 필드는 기본값)
    pub fn from_json_str(json: &str) -> Result<Self, ConversionError> {
        let profile: Self = serde_json::from_str(json)
            .map_err(|e| ConversionError::InvalidProfile(format!("JSON 파싱 실패: {}", e)))?;
        profile.validate()?;
        Ok(profile)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConversionError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ConversionError::InvalidProfile(format!("프로파일 파일 읽기 실패 {:?}: {}", path, e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
