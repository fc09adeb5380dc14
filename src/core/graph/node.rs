//! 그래프 노드

use crate::core::backend::AnalogUnit;
use crate::core::tensors::Tensor;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// 명시적으로 공유 소유권을 선언한 서브모듈
pub type SharedNode = Rc<RefCell<Node>>;

/// 부모가 자식을 가리키는 방식
///
/// 같은 서브모듈을 여러 부모가 참조할 때는 반드시 `Shared`를 사용한다.
/// 평범한 복제로 공유를 흉내내지 않는다.
#[derive(Debug)]
pub enum Child {
    Owned(Node),
    Shared(SharedNode),
}

impl Child {
    pub fn is_shared(&self) -> bool {
        matches!(self, Child::Shared(_))
    }

    /// 자식 노드를 빌려서 클로저 실행
    pub fn with<R>(&self, f: impl FnOnce(&Node) -> R) -> R {
        match self {
            Child::Owned(node) => f(node),
            Child::Shared(shared) => f(&shared.borrow()),
        }
    }

    pub fn kind(&self) -> String {
        self.with(|node| node.kind.clone())
    }
}

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Child::Owned(node)
    }
}

impl From<SharedNode> for Child {
    fn from(shared: SharedNode) -> Self {
        Child::Shared(shared)
    }
}

/// 모듈 그래프의 노드
///
/// `kind`는 계산 종류를 나타내는 타입 태그 (`Linear`, `Conv2d`, `Sequential` ...),
/// `params`는 파라미터 이름 → 텐서, `children`은 순서가 보존되는 (이름, 자식) 목록이다.
#[derive(Debug)]
pub struct Node {
    pub kind: String,
    pub params: BTreeMap<String, Tensor>,
    pub children: Vec<(String, Child)>,
    /// 아날로그 등가 노드일 때만 채워진다
    pub analog: Option<AnalogUnit>,
}

impl Node {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: BTreeMap::new(),
            children: Vec::new(),
            analog: None,
        }
    }

    pub fn with_param(mut self, name: impl Into<String>, tensor: Tensor) -> Self {
        self.params.insert(name.into(), tensor);
        self
    }

    pub fn with_child(mut self, name: impl Into<String>, child: impl Into<Child>) -> Self {
        self.children.push((name.into(), child.into()));
        self
    }

    /// 공유 서브모듈을 참조하는 자식 추가 (참조 카운트만 증가)
    pub fn with_shared(mut self, name: impl Into<String>, shared: &SharedNode) -> Self {
        self.children.push((name.into(), Child::Shared(Rc::clone(shared))));
        self
    }

    pub fn with_analog(mut self, unit: AnalogUnit) -> Self {
        self.analog = Some(unit);
        self
    }

    pub fn push_child(&mut self, name: impl Into<String>, child: impl Into<Child>) {
        self.children.push((name.into(), child.into()));
    }

    pub fn into_shared(self) -> SharedNode {
        Rc::new(RefCell::new(self))
    }

    pub fn param(&self, name: &str) -> Option<&Tensor> {
        self.params.get(name)
    }

    /// 이름으로 직계 자식 찾기 (속성 접근 방식)
    pub fn child(&self, name: &str) -> Option<&Child> {
        self.children
            .iter()
            .find(|(child_name, _)| child_name == name)
            .map(|(_, child)| child)
    }

    pub fn child_names(&self) -> impl Iterator<Item = &str> {
        self.children.iter().map(|(name, _)| name.as_str())
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_analog(&self) -> bool {
        self.analog.is_some()
    }

    pub fn analog(&self) -> Option<&AnalogUnit> {
        self.analog.as_ref()
    }

    /// 이 노드가 직접 가진 파라미터 원소 수
    pub fn num_parameters(&self) -> usize {
        self.params.values().map(|t| t.len()).sum()
    }
}
