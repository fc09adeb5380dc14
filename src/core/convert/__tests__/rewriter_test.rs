use crate::core::__tests__::fixtures::*;
use crate::core::backend::{AnalogBackend, TiledBackend, WeightState};
use crate::core::convert::*;
use crate::core::error::{BackendError, ConversionError};
use crate::core::graph::{Child, GraphDescription, ModuleGraph, Node};
use crate::core::profile::HardwareProfile;
use crate::core::registry::{ConversionRegistry, LayerConstructor, LayerFamily};
use std::rc::Rc;
use std::sync::Arc;

fn 기본_프로파일() -> Arc<HardwareProfile> {
    HardwareProfile::default().into_shared().unwrap()
}

fn 분석용_레지스트리() -> ConversionRegistry {
    let mut registry = ConversionRegistry::empty();
    registry.register("LinearLeaf", LayerConstructor::new(LayerFamily::Linear));
    registry
}

fn 컨테이너_그래프() -> ModuleGraph {
    ModuleGraph::new(
        Node::new("Container")
            .with_child(
                "lin",
                Node::new("LinearLeaf")
                    .with_param("weight", ramp(&[3, 2], 0.5))
                    .with_param("bias", ramp(&[3], 0.0)),
            )
            .with_child("act", Node::new("ActivationLeaf")),
    )
}

/// 실패만 반환하는 백엔드
struct FailingBackend;

impl AnalogBackend for FailingBackend {
    fn construct_analog_node(
        &self,
        kind: &str,
        _weights: WeightState,
        _profile: &Arc<HardwareProfile>,
    ) -> Result<Node, BackendError> {
        Err(BackendError::Other(format!("{} 생성 불가", kind)))
    }
}

#[test]
fn 컨테이너_리프_교체_시나리오_테스트() {
    let graph = 컨테이너_그래프();
    let converter = AnalogConverter::new(분석용_레지스트리(), TiledBackend::new());
    let (converted, report) = converter.convert(&graph, &기본_프로파일()).unwrap();

    assert_eq!(converted.root().kind, "Container");
    let names: Vec<&str> = converted.root().child_names().collect();
    assert_eq!(names, vec!["lin", "act"]);
    assert_eq!(converted.kind_at("lin"), Some("AnalogLinearLeaf".to_string()));
    assert_eq!(converted.kind_at("act"), Some("ActivationLeaf".to_string()));

    let restored = converted
        .with_node("lin", |node| TiledBackend::reassemble_weight(node).unwrap())
        .unwrap();
    assert_eq!(restored, ramp(&[3, 2], 0.5));

    assert_eq!(report.converted_count(), 1);
    assert_eq!(report.converted[0].path, "lin");
    assert_eq!(report.visited, 3);
    assert_eq!(report.passed_through, 2);
}

#[test]
fn 구조_보존_테스트() {
    let graph = small_cnn();
    let (converted, _) = AnalogConverter::default()
        .convert(&graph, &기본_프로파일())
        .unwrap();

    assert_eq!(converted.node_count(), graph.node_count());
    let before = graph.structure();
    let after = converted.structure();
    for ((path_a, kind_a), (path_b, kind_b)) in before.iter().zip(after.iter()) {
        assert_eq!(path_a, path_b);
        if kind_a == "Conv2d" || kind_a == "Linear" {
            assert_eq!(kind_b, &format!("Analog{}", kind_a));
        } else {
            assert_eq!(kind_a, kind_b);
        }
    }
}

#[test]
fn 복사_변환_원본_불변_테스트() {
    let graph = mlp();
    let before = graph.state_dict();
    let before_structure = graph.structure();

    let (converted, _) = AnalogConverter::default()
        .convert(&graph, &기본_프로파일())
        .unwrap();

    assert_eq!(graph.state_dict(), before);
    assert_eq!(graph.structure(), before_structure);
    assert!(!graph.root().child("fc1").unwrap().with(|n| n.is_analog()));
    assert!(converted.root().child("fc1").unwrap().with(|n| n.is_analog()));
}

#[test]
fn 제자리_변환_테스트() {
    let mut graph = mlp();
    let report = AnalogConverter::default()
        .convert_in_place(&mut graph, &기본_프로파일())
        .unwrap();

    assert_eq!(report.converted_paths(), vec!["fc1", "fc2"]);
    assert_eq!(graph.kind_at("fc1"), Some("AnalogLinear".to_string()));
    assert_eq!(graph.kind_at("act"), Some("ReLU".to_string()));
    assert_eq!(graph.kind_at("fc2"), Some("AnalogLinear".to_string()));
}

#[test]
fn 변환_대상_없음_테스트() {
    let graph = digital_only();
    let (converted, report) = AnalogConverter::default()
        .convert(&graph, &기본_프로파일())
        .unwrap();
    assert!(report.is_noop());
    assert_eq!(converted.structure(), graph.structure());
    assert_eq!(converted.state_dict(), graph.state_dict());
}

#[test]
fn 프로파일_공유_테스트() {
    let profile = 기본_프로파일();
    let (converted, _) = AnalogConverter::default().convert(&small_cnn(), &profile).unwrap();

    let mut analog_nodes = 0;
    converted.walk(|_, node| {
        if let Some(unit) = node.analog() {
            assert!(Arc::ptr_eq(&unit.profile, &profile));
            analog_nodes += 1;
        }
    });
    assert_eq!(analog_nodes, 2);
}

#[test]
fn 공유_노드_한번만_변환_테스트() {
    let shared = linear(4, 4, 0.1).into_shared();
    let mut graph = ModuleGraph::new(
        Node::new("Sequential")
            .with_shared("encoder", &shared)
            .with_child("act", Node::new("ReLU"))
            .with_shared("decoder", &shared),
    );

    let report = AnalogConverter::default()
        .convert_in_place(&mut graph, &기본_프로파일())
        .unwrap();
    assert_eq!(report.converted_paths(), vec!["encoder"]);

    // 외부에서 들고 있던 참조도 변환된 노드를 본다
    assert_eq!(shared.borrow().kind, "AnalogLinear");
    assert_eq!(graph.kind_at("decoder"), Some("AnalogLinear".to_string()));
    match graph.root().child("decoder") {
        Some(Child::Shared(decoder)) => assert!(Rc::ptr_eq(decoder, &shared)),
        _ => panic!("공유 참조가 유지되지 않았습니다"),
    }
}

#[test]
fn 복사_변환시_공유_노드_분리_테스트() {
    let shared = linear(4, 4, 0.1).into_shared();
    let graph = ModuleGraph::new(
        Node::new("Sequential")
            .with_shared("a", &shared)
            .with_shared("b", &shared),
    );

    let (converted, _) = AnalogConverter::default()
        .convert(&graph, &기본_프로파일())
        .unwrap();
    assert_eq!(shared.borrow().kind, "Linear");
    match (converted.root().child("a"), converted.root().child("b")) {
        (Some(Child::Shared(a)), Some(Child::Shared(b))) => {
            assert!(Rc::ptr_eq(a, b));
            assert!(!Rc::ptr_eq(a, &shared));
            assert_eq!(a.borrow().kind, "AnalogLinear");
        }
        _ => panic!("복사본의 공유 참조가 유지되지 않았습니다"),
    }
}

#[test]
fn 엄격_모드_거부시_무변경_테스트() {
    let mut graph = ModuleGraph::new(
        Node::new("Sequential")
            .with_child("fc", linear(2, 2, 0.0))
            .with_child("mystery", Node::new("MysteryLayer")),
    );
    let converter = AnalogConverter::default().strict();

    match converter.convert_in_place(&mut graph, &기본_프로파일()) {
        Err(ConversionError::UnsupportedNode { path, kind }) => {
            assert_eq!(path, "mystery");
            assert_eq!(kind, "MysteryLayer");
        }
        other => panic!("엄격 모드 에러가 아닙니다: {:?}", other),
    }
    // fc가 먼저 방문되었지만 교체되지 않아야 함
    assert_eq!(graph.kind_at("fc"), Some("Linear".to_string()));
}

#[test]
fn 기본_정책은_알수없는_타입_통과_테스트() {
    let graph = ModuleGraph::new(
        Node::new("MysteryContainer").with_child("fc", linear(2, 2, 0.0)),
    );
    let (converted, report) = AnalogConverter::default()
        .convert(&graph, &기본_프로파일())
        .unwrap();
    assert_eq!(converted.kind_at(""), Some("MysteryContainer".to_string()));
    assert_eq!(converted.kind_at("fc"), Some("AnalogLinear".to_string()));
    assert_eq!(report.passed_through, 1);
}

#[test]
fn 백엔드_실패시_무변경_테스트() {
    let mut graph = mlp();
    let before = graph.structure();
    let converter = AnalogConverter::new(ConversionRegistry::default(), FailingBackend);

    match converter.convert_in_place(&mut graph, &기본_프로파일()) {
        Err(ConversionError::Backend { path, .. }) => assert_eq!(path, "fc1"),
        other => panic!("백엔드 에러가 아닙니다: {:?}", other),
    }
    assert_eq!(graph.structure(), before);
}

#[test]
fn 잘못된_그래프_중단_테스트() {
    let mut graph = ModuleGraph::new(
        Node::new("Sequential")
            .with_child("fc", linear(2, 2, 0.0))
            .with_child("fc", linear(2, 2, 0.0)),
    );
    let result = AnalogConverter::default().convert_in_place(&mut graph, &기본_프로파일());
    assert!(matches!(result, Err(ConversionError::InvalidGraph { .. })));
    assert_eq!(graph.kind_at("fc"), Some("Linear".to_string()));
}

#[test]
fn 잘못된_프로파일_거부_테스트() {
    let profile = Arc::new(HardwareProfile::default().with_tile(0, 0));
    let result = AnalogConverter::default().convert(&mlp(), &profile);
    assert!(matches!(result, Err(ConversionError::InvalidProfile(_))));
}

#[test]
fn 재변환_멱등성_테스트() {
    let profile = 기본_프로파일();
    let converter = AnalogConverter::default();
    let (once, _) = converter.convert(&mlp(), &profile).unwrap();
    let (twice, report) = converter.convert(&once, &profile).unwrap();

    assert!(report.is_noop());
    assert_eq!(report.already_analog, 2);
    assert_eq!(twice.structure(), once.structure());
    assert_eq!(twice.state_dict(), once.state_dict());
}

#[test]
fn 기술_파일로_다시_읽은_변환_결과_엄격_모드_테스트() {
    let profile = 기본_프로파일();
    let (converted, _) = AnalogConverter::default().convert(&mlp(), &profile).unwrap();

    // JSON으로 내보내면 아날로그 메타데이터는 빠지고 타입 태그만 남는다
    let json = serde_json::to_string(&GraphDescription::from_graph(&converted)).unwrap();
    let reloaded = GraphDescription::from_json_str(&json).unwrap().build().unwrap();
    assert!(!reloaded.with_node("fc1", |node| node.is_analog()).unwrap());

    let (again, report) = AnalogConverter::default()
        .strict()
        .convert(&reloaded, &profile)
        .unwrap();
    assert!(report.is_noop());
    assert_eq!(report.already_analog, 2);
    assert_eq!(again.state_dict(), converted.state_dict());
}

#[test]
fn 적격_노드의_자식_유지_테스트() {
    // 변환 대상 노드가 자식을 가진 경우에도 자식 배치가 유지되고 계속 순회됨
    let graph = ModuleGraph::new(
        Node::new("Sequential").with_child(
            "proj",
            linear(2, 2, 0.0).with_child("inner", linear(2, 2, 0.3)),
        ),
    );
    let (converted, report) = AnalogConverter::default()
        .convert(&graph, &기본_프로파일())
        .unwrap();
    assert_eq!(report.converted_paths(), vec!["proj", "proj.inner"]);
    assert_eq!(converted.kind_at("proj.inner"), Some("AnalogLinear".to_string()));
}

#[test]
fn 리포트_출력_테스트() {
    let (_, report) = AnalogConverter::default()
        .convert(&mlp(), &기본_프로파일())
        .unwrap();
    let text = report.to_string();
    assert!(text.contains("변환된 노드: 2"));
    assert!(text.contains("fc1: Linear -> AnalogLinear"));
}
