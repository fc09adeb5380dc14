//! 그래프 기술 파일 (JSON)
//!
//! 노드를 id로 나열하고 자식을 id로 참조하는 평평한 표 형식이다.
//! 외부에서 읽어 들인 그래프이므로 끊어진 참조와 순환을 여기서 걸러낸다.

use super::module_graph::{join_path, ModuleGraph};
use super::node::{Child, Node, SharedNode};
use crate::core::error::ConversionError;
use crate::core::tensors::TensorSpec;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDescription {
    pub root: String,
    pub nodes: BTreeMap<String, NodeDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescription {
    pub kind: String,
    #[serde(default)]
    pub params: BTreeMap<String, TensorSpec>,
    #[serde(default)]
    pub children: Vec<ChildDescription>,
    /// 여러 부모가 참조하려면 반드시 true
    #[serde(default)]
    pub shared: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildDescription {
    pub name: String,
    pub node: String,
}

impl GraphDescription {
    pub fn from_json_str(json: &str) -> Result<Self, ConversionError> {
        serde_json::from_str(json)
            .map_err(|e| ConversionError::invalid("", format!("그래프 기술 파싱 실패: {}", e)))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConversionError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ConversionError::invalid("", format!("그래프 기술 파일 읽기 실패 {:?}: {}", path, e))
        })?;
        Self::from_json_str(&json)
    }

    /// 기존 그래프를 기술 형식으로 내보낸다 (노드 id는 정규화된 경로)
    pub fn from_graph(graph: &ModuleGraph) -> Self {
        let mut nodes = BTreeMap::new();
        let mut shared_ids: HashMap<*const std::cell::RefCell<Node>, String> = HashMap::new();
        describe_node(graph.root(), "", &mut nodes, &mut shared_ids);
        Self {
            root: node_id(""),
            nodes,
        }
    }

    /// 기술 내용을 모듈 그래프로 조립
    pub fn build(&self) -> Result<ModuleGraph, ConversionError> {
        if !self.nodes.contains_key(&self.root) {
            return Err(ConversionError::invalid(
                "",
                format!("루트 노드 '{}'가 없습니다", self.root),
            ));
        }

        // 참조 횟수 검사: 공유 표시 없이 여러 번 참조되면 암묵적 복제가 되므로 거부
        let mut references: HashMap<&str, usize> = HashMap::new();
        for (id, node) in &self.nodes {
            for child in &node.children {
                if !self.nodes.contains_key(&child.node) {
                    return Err(ConversionError::invalid(
                        id,
                        format!("자식 '{}'가 존재하지 않는 노드 '{}'를 참조합니다", child.name, child.node),
                    ));
                }
                *references.entry(child.node.as_str()).or_default() += 1;
            }
        }
        if references.contains_key(self.root.as_str()) {
            return Err(ConversionError::invalid("", "루트 노드를 자식으로 참조하는 순환이 있습니다"));
        }
        if let Some((id, count)) = references
            .iter()
            .find(|(id, count)| **count > 1 && !self.nodes[**id].shared)
        {
            return Err(ConversionError::invalid(
                "",
                format!("노드 '{}'가 {}번 참조되지만 shared로 표시되지 않았습니다", id, count),
            ));
        }

        let mut builder = Builder {
            description: self,
            on_path: HashSet::new(),
            shared: HashMap::new(),
            reached: HashSet::new(),
        };
        let root = builder.build_node(&self.root, "")?;

        let unreachable = self
            .nodes
            .keys()
            .filter(|id| *id != &self.root && !builder.reached.contains(id.as_str()))
            .count();
        if unreachable > 0 {
            warn!("루트에서 도달할 수 없는 노드 {}개는 무시됩니다", unreachable);
        }

        let graph = ModuleGraph::new(root);
        graph.validate()?;
        Ok(graph)
    }
}

struct Builder<'a> {
    description: &'a GraphDescription,
    on_path: HashSet<&'a str>,
    shared: HashMap<&'a str, SharedNode>,
    reached: HashSet<&'a str>,
}

impl<'a> Builder<'a> {
    fn build_node(&mut self, id: &'a str, path: &str) -> Result<Node, ConversionError> {
        let all: &'a GraphDescription = self.description;
        let nodes = &all.nodes;
        let description = &nodes[id];
        if !self.on_path.insert(id) {
            return Err(ConversionError::invalid(path, format!("노드 '{}'에서 순환 참조", id)));
        }
        self.reached.insert(id);

        let mut node = Node::new(description.kind.clone());
        for (name, spec) in &description.params {
            let tensor = spec.to_tensor().map_err(|e| {
                ConversionError::invalid(&join_path(path, name), format!("텐서 형상 오류: {}", e))
            })?;
            node.params.insert(name.clone(), tensor);
        }

        for child in &description.children {
            let child_id = child.node.as_str();
            let child_path = join_path(path, &child.name);
            let built = if nodes[child_id].shared {
                match self.shared.get(child_id) {
                    Some(existing) => Child::Shared(Rc::clone(existing)),
                    None => {
                        if self.on_path.contains(child_id) {
                            return Err(ConversionError::invalid(
                                &child_path,
                                format!("공유 노드 '{}'에서 순환 참조", child_id),
                            ));
                        }
                        let shared = self.build_node(child_id, &child_path)?.into_shared();
                        self.shared.insert(child_id, Rc::clone(&shared));
                        Child::Shared(shared)
                    }
                }
            } else {
                Child::Owned(self.build_node(child_id, &child_path)?)
            };
            node.push_child(child.name.clone(), built);
        }

        self.on_path.remove(id);
        Ok(node)
    }
}

fn node_id(path: &str) -> String {
    if path.is_empty() {
        "root".to_string()
    } else {
        format!("root.{}", path)
    }
}

fn describe_node(
    node: &Node,
    path: &str,
    nodes: &mut BTreeMap<String, NodeDescription>,
    shared_ids: &mut HashMap<*const std::cell::RefCell<Node>, String>,
) -> String {
    let id = node_id(path);
    let mut children = Vec::new();
    for (name, child) in &node.children {
        let child_path = join_path(path, name);
        let child_id = match child {
            Child::Owned(owned) => describe_node(owned, &child_path, nodes, shared_ids),
            Child::Shared(shared) => {
                let key = Rc::as_ptr(shared);
                match shared_ids.get(&key) {
                    Some(existing) => existing.clone(),
                    None => {
                        let child_id = node_id(&child_path);
                        shared_ids.insert(key, child_id.clone());
                        describe_node(&shared.borrow(), &child_path, nodes, shared_ids);
                        if let Some(entry) = nodes.get_mut(&child_id) {
                            entry.shared = true;
                        }
                        child_id
                    }
                }
            }
        };
        children.push(ChildDescription {
            name: name.clone(),
            node: child_id,
        });
    }

    nodes.insert(
        id.clone(),
        NodeDescription {
            kind: node.kind.clone(),
            params: node
                .params
                .iter()
                .map(|(name, tensor)| (name.clone(), TensorSpec::from_tensor(tensor)))
                .collect(),
            children,
            shared: false,
        },
    );
    id
}
