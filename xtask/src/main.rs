use std::path::Path;
use std::process::{Command, ExitCode};

use clap::{Parser, Subcommand};

/// XDP 프로그램 크레이트 경로 (workspace 루트 기준)
const EBPF_DIR: &str = "crates/filter-engine/ebpf";
const EBPF_TARGET: &str = "bpfel-unknown-none";
const EBPF_PACKAGE: &str = "flowgate-ebpf";
/// 레이트 리미터가 `fetch_add` 반환값을 쓰므로 atomic fetch 명령이 있는 v3 이상
const EBPF_CPU: &str = "v3";

/// flowgate 빌드 태스크
#[derive(Parser)]
#[command(name = "xtask")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// XDP 커널 프로그램 빌드 (nightly + build-std 필요)
    BuildEbpf {
        /// 릴리스 모드로 빌드
        #[arg(long)]
        release: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::BuildEbpf { release } => build_ebpf(release),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("xtask: {e}");
            ExitCode::FAILURE
        }
    }
}

fn build_ebpf(release: bool) -> Result<(), String> {
    let mut cmd = Command::new("cargo");
    cmd.current_dir(EBPF_DIR);
    cmd.args([
        "+nightly",
        "build",
        &format!("--target={EBPF_TARGET}"),
        "-Z",
        "build-std=core",
    ]);
    if release {
        cmd.arg("--release");
    }
    cmd.env("CARGO_ENCODED_RUSTFLAGS", ebpf_rustflags());

    let status = cmd
        .status()
        .map_err(|e| format!("failed to run cargo in {EBPF_DIR}: {e}"))?;
    if !status.success() {
        return Err(format!("XDP program build failed ({status})"));
    }

    let profile = if release { "release" } else { "debug" };
    let object = Path::new(EBPF_DIR)
        .join("target")
        .join(EBPF_TARGET)
        .join(profile)
        .join(EBPF_PACKAGE);
    println!("XDP object built: {}", object.display());
    if !release {
        println!("set [filter] program_path to this path to load the debug build");
    }
    Ok(())
}

/// XDP 빌드용 rustflags (`CARGO_ENCODED_RUSTFLAGS` 형식, 0x1f 구분)
///
/// rustc가 `target-cpu`를 bpf-linker의 `--cpu`로 넘깁니다.
fn ebpf_rustflags() -> String {
    const SEPARATOR: &str = "\x1f";
    [format!("-Ctarget-cpu={EBPF_CPU}"), "-Cdebuginfo=0".to_owned()].join(SEPARATOR)
}
