//! 루트가 있는 순서 트리 형태의 모듈 그래프

use super::node::{Child, Node, SharedNode};
use crate::core::error::ConversionError;
use crate::core::tensors::Tensor;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::convert::Infallible;
use std::rc::Rc;

/// 정규화된 파라미터 이름 (`encoder.0.weight`) → 텐서
pub type StateDict = BTreeMap<String, Tensor>;

type SharedKey = *const RefCell<Node>;

/// 부모 경로와 자식 이름을 점으로 연결
pub fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

/// 모듈 그래프
///
/// 모든 순회는 루트부터 전위(pre-order) 깊이 우선이며, 공유 노드는
/// 처음 만난 경로에서 한 번만 방문한다.
#[derive(Debug)]
pub struct ModuleGraph {
    pub root: Node,
}

impl ModuleGraph {
    pub fn new(root: Node) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    /// 전위 순회 (방문자가 에러를 반환하면 즉시 중단)
    pub fn try_walk<E>(
        &self,
        visit: &mut dyn FnMut(&str, &Node) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut seen = HashSet::new();
        walk_node(&self.root, "", &mut seen, visit)
    }

    /// 가변 전위 순회
    ///
    /// 방문자가 노드를 교체하면 교체된 노드의 자식들로 순회가 이어진다.
    pub fn try_walk_mut<E>(
        &mut self,
        visit: &mut dyn FnMut(&str, &mut Node) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut seen = HashSet::new();
        walk_node_mut(&mut self.root, "", &mut seen, visit)
    }

    pub fn walk(&self, mut visit: impl FnMut(&str, &Node)) {
        let result = self.try_walk::<Infallible>(&mut |path, node| {
            visit(path, node);
            Ok(())
        });
        if let Err(never) = result {
            match never {}
        }
    }

    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.walk(|_, _| count += 1);
        count
    }

    /// (경로, 타입 태그) 목록 - 구조 비교용
    pub fn structure(&self) -> Vec<(String, String)> {
        let mut entries = Vec::new();
        self.walk(|path, node| entries.push((path.to_string(), node.kind.clone())));
        entries
    }

    pub fn num_parameters(&self) -> usize {
        let mut total = 0;
        self.walk(|_, node| total += node.num_parameters());
        total
    }

    /// 점으로 구분된 경로의 노드를 빌려서 클로저 실행
    pub fn with_node<R>(&self, path: &str, f: impl FnOnce(&Node) -> R) -> Option<R> {
        fn descend<R>(
            node: &Node,
            mut segments: std::str::Split<'_, char>,
            f: impl FnOnce(&Node) -> R,
        ) -> Option<R> {
            match segments.next() {
                None => Some(f(node)),
                Some(segment) => match node.child(segment)? {
                    Child::Owned(child) => descend(child, segments, f),
                    Child::Shared(shared) => descend(&shared.borrow(), segments, f),
                },
            }
        }

        if path.is_empty() {
            return Some(f(&self.root));
        }
        descend(&self.root, path.split('.'), f)
    }

    pub fn kind_at(&self, path: &str) -> Option<String> {
        self.with_node(path, |node| node.kind.clone())
    }

    /// 구조 검증
    ///
    /// - 타입 태그가 비어 있지 않을 것
    /// - 자식 이름이 비어 있지 않고 `.`을 포함하지 않으며 부모 안에서 유일할 것
    /// - 파라미터 이름과 자식 이름이 겹치지 않을 것
    /// - 공유 노드를 통한 순환 참조가 없을 것
    pub fn validate(&self) -> Result<(), ConversionError> {
        let mut on_path = HashSet::new();
        let mut done = HashSet::new();
        validate_node(&self.root, "", &mut on_path, &mut done)
    }

    /// 그래프 전체를 깊은 복사
    ///
    /// 공유 노드는 한 번만 복사되고, 복사본 안에서도 공유 관계가 유지된다.
    pub fn deep_copy(&self) -> Result<ModuleGraph, ConversionError> {
        self.validate()?;
        let mut copies = HashMap::new();
        Ok(ModuleGraph::new(copy_node(&self.root, &mut copies)))
    }

    /// 정규화된 이름 → 텐서 복사본
    pub fn state_dict(&self) -> StateDict {
        let mut state = StateDict::new();
        self.walk(|path, node| {
            for (name, tensor) in &node.params {
                state.insert(join_path(path, name), tensor.clone());
            }
        });
        state
    }

    /// state dict의 값을 그래프 파라미터에 기록
    ///
    /// 모든 검사가 통과한 뒤에만 값을 쓰므로 실패 시 그래프는 변경되지 않는다.
    /// `strict`이면 누락 키와 예상치 못한 키 모두 에러다. 기록한 텐서 개수를 반환한다.
    pub fn load_state_dict(
        &mut self,
        state: &StateDict,
        strict: bool,
    ) -> Result<usize, ConversionError> {
        self.validate()?;

        let mut expected = HashSet::new();
        self.try_walk(&mut |path, node| {
            for (name, tensor) in &node.params {
                let key = join_path(path, name);
                match state.get(&key) {
                    Some(source) if source.shape() != tensor.shape() => {
                        return Err(ConversionError::invalid(
                            &key,
                            format!(
                                "형상 불일치: 그래프 {:?}, state dict {:?}",
                                tensor.shape(),
                                source.shape()
                            ),
                        ));
                    }
                    None if strict => {
                        return Err(ConversionError::invalid(&key, "state dict에 키가 없습니다"));
                    }
                    _ => {}
                }
                expected.insert(key);
            }
            Ok(())
        })?;

        if strict {
            if let Some(unexpected) = state.keys().find(|key| !expected.contains(*key)) {
                return Err(ConversionError::invalid(unexpected, "그래프에 없는 키입니다"));
            }
        }

        let mut loaded = 0;
        self.try_walk_mut::<Infallible>(&mut |path, node| {
            for (name, tensor) in node.params.iter_mut() {
                if let Some(source) = state.get(&join_path(path, name)) {
                    tensor.assign(source);
                    loaded += 1;
                }
            }
            Ok(())
        })
        .unwrap_or_else(|never| match never {});
        Ok(loaded)
    }
}

impl From<Node> for ModuleGraph {
    fn from(root: Node) -> Self {
        ModuleGraph::new(root)
    }
}

fn walk_node<E>(
    node: &Node,
    path: &str,
    seen: &mut HashSet<SharedKey>,
    visit: &mut dyn FnMut(&str, &Node) -> Result<(), E>,
) -> Result<(), E> {
    visit(path, node)?;
    for (name, child) in &node.children {
        let child_path = join_path(path, name);
        match child {
            Child::Owned(owned) => walk_node(owned, &child_path, seen, visit)?,
            Child::Shared(shared) => {
                if seen.insert(Rc::as_ptr(shared)) {
                    walk_node(&shared.borrow(), &child_path, seen, visit)?;
                }
            }
        }
    }
    Ok(())
}

fn walk_node_mut<E>(
    node: &mut Node,
    path: &str,
    seen: &mut HashSet<SharedKey>,
    visit: &mut dyn FnMut(&str, &mut Node) -> Result<(), E>,
) -> Result<(), E> {
    visit(path, node)?;
    for (name, child) in node.children.iter_mut() {
        let child_path = join_path(path, name);
        match child {
            Child::Owned(owned) => walk_node_mut(owned, &child_path, seen, visit)?,
            Child::Shared(shared) => {
                // 방문 표시를 먼저 하므로 순환이 있어도 이중 대여가 일어나지 않는다
                if seen.insert(Rc::as_ptr(shared)) {
                    walk_node_mut(&mut shared.borrow_mut(), &child_path, seen, visit)?;
                }
            }
        }
    }
    Ok(())
}

fn validate_node(
    node: &Node,
    path: &str,
    on_path: &mut HashSet<SharedKey>,
    done: &mut HashSet<SharedKey>,
) -> Result<(), ConversionError> {
    if node.kind.trim().is_empty() {
        return Err(ConversionError::invalid(path, "타입 태그가 비어 있습니다"));
    }
    if let Some(name) = node.params.keys().find(|name| name.is_empty()) {
        return Err(ConversionError::invalid(
            path,
            format!("파라미터 이름이 비어 있습니다: {:?}", name),
        ));
    }

    let mut names = HashSet::new();
    for (name, child) in &node.children {
        if name.is_empty() || name.contains('.') {
            return Err(ConversionError::invalid(
                path,
                format!("잘못된 자식 이름: {:?}", name),
            ));
        }
        if !names.insert(name.as_str()) {
            return Err(ConversionError::invalid(
                path,
                format!("자식 이름 중복: {}", name),
            ));
        }
        if node.params.contains_key(name) {
            return Err(ConversionError::invalid(
                path,
                format!("파라미터와 자식 이름 충돌: {}", name),
            ));
        }

        let child_path = join_path(path, name);
        match child {
            Child::Owned(owned) => validate_node(owned, &child_path, on_path, done)?,
            Child::Shared(shared) => {
                let key = Rc::as_ptr(shared);
                if on_path.contains(&key) {
                    return Err(ConversionError::invalid(
                        &child_path,
                        "공유 모듈 순환 참조",
                    ));
                }
                if done.contains(&key) {
                    continue;
                }
                let inner = shared.try_borrow().map_err(|_| {
                    ConversionError::invalid(&child_path, "공유 모듈이 이미 가변 대여 중입니다")
                })?;
                on_path.insert(key);
                validate_node(&inner, &child_path, on_path, done)?;
                on_path.remove(&key);
                done.insert(key);
            }
        }
    }
    Ok(())
}

fn copy_node(node: &Node, copies: &mut HashMap<SharedKey, SharedNode>) -> Node {
    let children = node
        .children
        .iter()
        .map(|(name, child)| {
            let copied = match child {
                Child::Owned(owned) => Child::Owned(copy_node(owned, copies)),
                Child::Shared(shared) => {
                    let key = Rc::as_ptr(shared);
                    match copies.get(&key) {
                        Some(existing) => Child::Shared(Rc::clone(existing)),
                        None => {
                            let fresh = copy_node(&shared.borrow(), copies).into_shared();
                            copies.insert(key, Rc::clone(&fresh));
                            Child::Shared(fresh)
                        }
                    }
                }
            };
            (name.clone(), copied)
        })
        .collect();

    Node {
        kind: node.kind.clone(),
        params: node.params.clone(),
        children,
        analog: node.analog.clone(),
    }
}
