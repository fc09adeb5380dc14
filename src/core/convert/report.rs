//! 변환 결과 리포트

use crate::core::error::display_path;
use std::fmt;

/// 교체된 노드 한 개
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedNode {
    pub path: String,
    pub from: String,
    pub to: String,
}

/// 변환 통계
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionReport {
    /// 교체된 노드 (방문 순서)
    pub converted: Vec<ConvertedNode>,
    /// 변환 대상이 아니어서 그대로 둔 노드 수
    pub passed_through: usize,
    /// 이미 아날로그였던 노드 수
    pub already_analog: usize,
    /// 방문한 전체 노드 수 (공유 노드는 한 번)
    pub visited: usize,
}

impl ConversionReport {
    pub fn converted_count(&self) -> usize {
        self.converted.len()
    }

    pub fn is_noop(&self) -> bool {
        self.converted.is_empty()
    }

    pub fn converted_paths(&self) -> Vec<&str> {
        self.converted.iter().map(|c| c.path.as_str()).collect()
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== 아날로그 변환 결과 ===")?;
        writeln!(f, "방문 노드: {}", self.visited)?;
        writeln!(f, "변환된 노드: {}", self.converted.len())?;
        writeln!(f, "통과한 노드: {}", self.passed_through)?;
        if self.already_analog > 0 {
            writeln!(f, "이미 아날로그: {}", self.already_analog)?;
        }
        for node in &self.converted {
            writeln!(f, "  {}: {} -> {}", display_path(&node.path), node.from, node.to)?;
        }
        Ok(())
    }
}
