//! 모듈 그래프 - 노드 트리, 공유 서브모듈, 그래프 기술 파일

pub mod node;
pub mod module_graph;
pub mod description;


pub use node::{Child, Node, SharedNode};
pub use module_graph::{join_path, ModuleGraph, StateDict};
pub use description::{ChildDescription, GraphDescription, NodeDescription};
