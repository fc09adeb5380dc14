//! 적격성 분류기
//!
//! 디지털 타입 태그 → 아날로그 생성자 레지스트리.
//! 런타임 타입 검사 대신 명시적 표를 조회하며, 조회 자체는 부작용이 없다.

pub mod constructors;


pub use constructors::{LayerConstructor, LayerFamily};

use crate::core::backend::tiled::ANALOG_PREFIX;
use crate::core::backend::AnalogBackend;
use crate::core::error::BackendError;
use crate::core::graph::Node;
use crate::core::profile::HardwareProfile;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

/// 적격 노드를 아날로그 등가 노드로 바꾸는 생성자
pub trait AnalogConstructor: Send + Sync {
    fn construct(
        &self,
        node: &Node,
        profile: &Arc<HardwareProfile>,
        backend: &dyn AnalogBackend,
    ) -> Result<Node, BackendError>;
}

impl<F> AnalogConstructor for F
where
    F: Fn(&Node, &Arc<HardwareProfile>, &dyn AnalogBackend) -> Result<Node, BackendError>
        + Send
        + Sync,
{
    fn construct(
        &self,
        node: &Node,
        profile: &Arc<HardwareProfile>,
        backend: &dyn AnalogBackend,
    ) -> Result<Node, BackendError> {
        self(node, profile, backend)
    }
}

/// 분류 결과
pub enum Eligibility<'a> {
    /// 등록된 아날로그 생성자가 있음
    Eligible(&'a dyn AnalogConstructor),
    /// 알려진 디지털 타입 (변환 대상 아님)
    PassThrough,
    /// 등록된 타입의 아날로그 태그 (`Analog<kind>`)
    Converted,
    /// 레지스트리에 없는 타입
    Unknown,
}

impl Eligibility<'_> {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Eligibility::Eligible(_))
    }
}

impl fmt::Debug for Eligibility<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Eligibility::Eligible(_) => write!(f, "Eligible"),
            Eligibility::PassThrough => write!(f, "PassThrough"),
            Eligibility::Converted => write!(f, "Converted"),
            Eligibility::Unknown => write!(f, "Unknown"),
        }
    }
}

/// 변환 레지스트리
#[derive(Clone)]
pub struct ConversionRegistry {
    constructors: HashMap<String, Arc<dyn AnalogConstructor>>,
    passthrough: BTreeSet<String>,
}

/// 기본적으로 변환하지 않는 디지털 타입들
const DEFAULT_PASSTHROUGH: &[&str] = &[
    "Sequential",
    "ModuleList",
    "ModuleDict",
    "ReLU",
    "GELU",
    "Tanh",
    "Sigmoid",
    "Softmax",
    "Dropout",
    "Flatten",
    "Identity",
    "LayerNorm",
    "BatchNorm1d",
    "BatchNorm2d",
    "MaxPool2d",
    "AvgPool2d",
    "Embedding",
];

impl ConversionRegistry {
    /// 아무것도 등록되지 않은 레지스트리
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
            passthrough: BTreeSet::new(),
        }
    }

    /// 생성자 등록 (같은 태그가 있으면 교체)
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        constructor: impl AnalogConstructor + 'static,
    ) -> &mut Self {
        let kind = kind.into();
        self.passthrough.remove(&kind);
        self.constructors.insert(kind, Arc::new(constructor));
        self
    }

    /// 변환하지 않는 알려진 디지털 타입 등록
    pub fn register_passthrough(&mut self, kind: impl Into<String>) -> &mut Self {
        let kind = kind.into();
        self.constructors.remove(&kind);
        self.passthrough.insert(kind);
        self
    }

    pub fn unregister(&mut self, kind: &str) -> bool {
        self.constructors.remove(kind).is_some()
    }

    /// 타입 태그 조회
    pub fn classify(&self, kind: &str) -> Eligibility<'_> {
        if let Some(constructor) = self.constructors.get(kind) {
            Eligibility::Eligible(constructor.as_ref())
        } else if self.passthrough.contains(kind) {
            Eligibility::PassThrough
        } else if kind
            .strip_prefix(ANALOG_PREFIX)
            .is_some_and(|source| self.constructors.contains_key(source))
        {
            Eligibility::Converted
        } else {
            Eligibility::Unknown
        }
    }

    pub fn is_eligible(&self, kind: &str) -> bool {
        self.constructors.contains_key(kind)
    }

    /// 등록된 변환 가능 타입 (정렬됨)
    pub fn eligible_kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }
}

impl Default for ConversionRegistry {
    /// Linear / Conv1d / Conv2d / Conv3d를 변환하고 일반 컨테이너와 활성화 함수는 통과
    fn default() -> Self {
        let mut registry = Self::empty();
        for kind in DEFAULT_PASSTHROUGH {
            registry.register_passthrough(*kind);
        }
        registry
            .register("Linear", LayerConstructor::new(LayerFamily::Linear))
            .register("Conv1d", LayerConstructor::new(LayerFamily::Conv { dims: 1 }))
            .register("Conv2d", LayerConstructor::new(LayerFamily::Conv { dims: 2 }))
            .register("Conv3d", LayerConstructor::new(LayerFamily::Conv { dims: 3 }));
        registry
    }
}

impl fmt::Debug for ConversionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionRegistry")
            .field("eligible", &self.eligible_kinds())
            .field("passthrough", &self.passthrough)
            .finish()
    }
}
