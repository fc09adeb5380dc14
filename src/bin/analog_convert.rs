use analog_conv::core::persist::{load_metadata, load_state};
use analog_conv::pipeline::convert_with;
use analog_conv::{
    AnalogConverter, ConverterOptions, GraphDescription, HardwareProfile, PersistStatus,
    UnknownNodePolicy,
};
use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::process;

fn main() {
    env_logger::init();

    let matches = Command::new("analog_convert")
        .version("0.1.0")
        .about("디지털 모듈 그래프를 아날로그 하드웨어 등가 그래프로 변환")
        .subcommand(
            Command::new("convert")
                .about("그래프 기술 파일(JSON) 변환")
                .arg(
                    Arg::new("graph")
                        .required(true)
                        .help("그래프 기술 파일 경로")
                )
                .arg(
                    Arg::new("profile")
                        .long("profile")
                        .short('p')
                        .value_name("FILE")
                        .help("하드웨어 프로파일 JSON (없으면 기본 프로파일)")
                )
                .arg(
                    Arg::new("inference")
                        .long("inference")
                        .action(ArgAction::SetTrue)
                        .help("기본 프로파일 대신 추론용 프로파일 사용")
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_name("FILE")
                        .help("변환된 state dict 저장 경로 (.safetensors)")
                )
                .arg(
                    Arg::new("inplace")
                        .long("inplace")
                        .action(ArgAction::SetTrue)
                        .help("복사 없이 로드한 그래프를 직접 변환")
                )
                .arg(
                    Arg::new("strict")
                        .long("strict")
                        .action(ArgAction::SetTrue)
                        .help("알 수 없는 노드 타입을 에러로 처리")
                )
                .arg(
                    Arg::new("progress")
                        .long("progress")
                        .action(ArgAction::SetTrue)
                        .help("진행률 바 표시")
                )
        )
        .subcommand(
            Command::new("info")
                .about("저장된 아날로그 모델 정보 확인")
                .arg(
                    Arg::new("model-path")
                        .required(true)
                        .help("저장된 .safetensors 파일 경로")
                )
        )
        .get_matches();

    let result = match matches.subcommand() {
        Some(("convert", sub_matches)) => handle_convert(sub_matches),
        Some(("info", sub_matches)) => handle_info(sub_matches),
        _ => {
            println!("❌ 명령을 지정해주세요. --help를 참조하세요.");
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("❌ 오류: {:#}", e);
        process::exit(1);
    }
}

fn handle_convert(matches: &ArgMatches) -> Result<()> {
    let graph_path = PathBuf::from(
        matches
            .get_one::<String>("graph")
            .context("그래프 경로가 필요합니다")?,
    );
    let output = matches.get_one::<String>("output").map(PathBuf::from);

    let profile = match matches.get_one::<String>("profile") {
        Some(path) => HardwareProfile::from_json_file(path)
            .with_context(|| format!("프로파일 로드 실패: {}", path))?,
        None if matches.get_flag("inference") => HardwareProfile::inference(),
        None => HardwareProfile::default(),
    };

    let mut graph = GraphDescription::from_json_file(&graph_path)
        .and_then(|description| description.build())
        .with_context(|| format!("그래프 로드 실패: {:?}", graph_path))?;

    println!("🔌 아날로그 변환 시작:");
    println!("   입력: {:?}", graph_path);
    println!("   노드 수: {}", graph.node_count());
    println!("   파라미터 수: {}", graph.num_parameters());
    println!("   프로파일: {:?} / {:?}", profile.kind, profile.device);

    let converter = AnalogConverter::default().with_options(ConverterOptions {
        unknown_policy: if matches.get_flag("strict") {
            UnknownNodePolicy::Reject
        } else {
            UnknownNodePolicy::PassThrough
        },
        show_progress: matches.get_flag("progress"),
    });

    let outcome = convert_with(
        &converter,
        &mut graph,
        Some(profile.into_shared()?),
        matches.get_flag("inplace"),
        output.as_deref(),
    )?;

    println!("\n{}", outcome.report);
    match &outcome.persisted {
        Ok(PersistStatus::Saved(path)) => println!("✅ 저장 완료: {}", path.display()),
        Ok(PersistStatus::NotPersisted) => println!("ℹ️  저장 경로가 없어 저장하지 않았습니다"),
        Err(e) => eprintln!("⚠️  변환은 완료되었지만 저장에 실패했습니다: {}", e),
    }
    Ok(())
}

fn handle_info(matches: &ArgMatches) -> Result<()> {
    let model_path = PathBuf::from(
        matches
            .get_one::<String>("model-path")
            .context("모델 경로가 필요합니다")?,
    );

    let state = load_state(&model_path)
        .with_context(|| format!("모델 로드 실패: {:?}", model_path))?;
    let metadata = load_metadata(&model_path)?;

    println!("📦 모델 정보: {:?}", model_path);
    println!("   형식: {}", metadata.get("format").map(String::as_str).unwrap_or("unknown"));
    println!("   텐서 수: {}", state.len());
    for (name, tensor) in &state {
        println!("   - {}: {:?}", name, tensor.shape());
    }
    if let Some(nodes) = metadata.get("analog_nodes") {
        let nodes: serde_json::Value = serde_json::from_str(nodes)?;
        if let Some(map) = nodes.as_object() {
            println!("   아날로그 노드: {}", map.len());
            for (path, info) in map {
                println!(
                    "   - {}: {} (tiles {})",
                    path, info["analog_kind"], info["tile_grid"]
                );
            }
        }
    }
    Ok(())
}
