//! 아날로그 변환기
//!
//! 루트부터 깊이 우선으로 순회하며 적격 노드를 아날로그 등가 노드로 교체한다.
//! 교체는 두 단계로 이루어진다.
//!
//! 1. 계획: 그래프를 읽기 전용으로 순회하며 모든 교체 노드를 미리 만든다.
//!    구조 에러, 엄격 모드 거부, 백엔드 에러는 모두 이 단계에서 발생한다.
//! 2. 적용: 같은 순서로 가변 순회하며 미리 만든 노드로 바꿔 끼운다. 이 단계는 실패하지 않는다.
//!
//! 따라서 에러가 나면 그래프는 한 노드도 바뀌지 않는다.

use super::report::{ConversionReport, ConvertedNode};
use crate::core::backend::{AnalogBackend, TiledBackend};
use crate::core::error::ConversionError;
use crate::core::graph::{ModuleGraph, Node};
use crate::core::profile::HardwareProfile;
use crate::core::registry::{ConversionRegistry, Eligibility};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

/// 레지스트리에 없는 타입을 만났을 때의 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownNodePolicy {
    /// 그대로 두고 자식으로 계속 내려감
    #[default]
    PassThrough,
    /// 엄격 모드: `UnsupportedNode` 에러
    Reject,
}

/// 변환기 설정
#[derive(Debug, Clone, Default)]
pub struct ConverterOptions {
    pub unknown_policy: UnknownNodePolicy,
    /// 노드 단위 진행률 바 표시
    pub show_progress: bool,
}

/// 그래프 재작성기
pub struct AnalogConverter<B: AnalogBackend = TiledBackend> {
    pub registry: ConversionRegistry,
    pub backend: B,
    pub options: ConverterOptions,
}

impl Default for AnalogConverter<TiledBackend> {
    fn default() -> Self {
        Self::new(ConversionRegistry::default(), TiledBackend::new())
    }
}

impl<B: AnalogBackend> AnalogConverter<B> {
    pub fn new(registry: ConversionRegistry, backend: B) -> Self {
        Self {
            registry,
            backend,
            options: ConverterOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ConverterOptions) -> Self {
        self.options = options;
        self
    }

    pub fn strict(mut self) -> Self {
        self.options.unknown_policy = UnknownNodePolicy::Reject;
        self
    }

    /// 원본은 그대로 두고 깊은 복사본을 변환해 반환
    pub fn convert(
        &self,
        graph: &ModuleGraph,
        profile: &Arc<HardwareProfile>,
    ) -> Result<(ModuleGraph, ConversionReport), ConversionError> {
        let mut copy = graph.deep_copy()?;
        let report = self.convert_in_place(&mut copy, profile)?;
        Ok((copy, report))
    }

    /// 호출자의 그래프를 직접 변환
    pub fn convert_in_place(
        &self,
        graph: &mut ModuleGraph,
        profile: &Arc<HardwareProfile>,
    ) -> Result<ConversionReport, ConversionError> {
        profile.validate()?;
        graph.validate()?;

        let (mut replacements, report) = self.plan(graph, profile)?;

        graph
            .try_walk_mut::<Infallible>(&mut |path, node| {
                if let Some(mut replacement) = replacements.remove(path) {
                    // 교체 노드는 원래 노드의 자식 배치를 그대로 이어받는다
                    replacement.children = std::mem::take(&mut node.children);
                    *node = replacement;
                }
                Ok(())
            })
            .unwrap_or_else(|never| match never {});

        info!(
            "아날로그 변환 완료: 방문 {}개, 변환 {}개, 통과 {}개",
            report.visited,
            report.converted.len(),
            report.passed_through
        );
        Ok(report)
    }

    /// 읽기 전용 순회로 교체 노드를 모두 만든다
    fn plan(
        &self,
        graph: &ModuleGraph,
        profile: &Arc<HardwareProfile>,
    ) -> Result<(HashMap<String, Node>, ConversionReport), ConversionError> {
        let progress = self.progress_bar(graph.node_count());
        let mut replacements = HashMap::new();
        let mut report = ConversionReport::default();

        graph.try_walk(&mut |path, node| {
            report.visited += 1;
            progress.inc(1);

            if node.is_analog() {
                report.already_analog += 1;
                return Ok(());
            }

            match self.registry.classify(&node.kind) {
                Eligibility::Eligible(constructor) => {
                    let analog = constructor
                        .construct(node, profile, &self.backend)
                        .map_err(|source| ConversionError::Backend {
                            path: path.to_string(),
                            source,
                        })?;
                    debug!("{} 변환: {} -> {}", path, node.kind, analog.kind);
                    progress.set_message(path.to_string());
                    report.converted.push(ConvertedNode {
                        path: path.to_string(),
                        from: node.kind.clone(),
                        to: analog.kind.clone(),
                    });
                    replacements.insert(path.to_string(), analog);
                }
                Eligibility::PassThrough => report.passed_through += 1,
                Eligibility::Converted => {
                    debug!("{}: '{}'는 이미 변환된 타입입니다", path, node.kind);
                    report.already_analog += 1;
                }
                Eligibility::Unknown => match self.options.unknown_policy {
                    UnknownNodePolicy::PassThrough => {
                        debug!("{}: 알 수 없는 타입 '{}'는 그대로 둡니다", path, node.kind);
                        report.passed_through += 1;
                    }
                    UnknownNodePolicy::Reject => {
                        return Err(ConversionError::UnsupportedNode {
                            path: path.to_string(),
                            kind: node.kind.clone(),
                        });
                    }
                },
            }
            Ok(())
        })?;

        progress.finish_and_clear();
        Ok((replacements, report))
    }

    fn progress_bar(&self, total: usize) -> ProgressBar {
        if !self.options.show_progress {
            return ProgressBar::hidden();
        }
        let progress = ProgressBar::new(total as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("🔌 [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>4}/{len:4} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▉▊▋▌▍▎▏ "),
        );
        progress
    }
}
