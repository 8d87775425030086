use std::fs;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};

use clap::{Parser, Subcommand, ValueEnum};
use zip::result::ZipResult;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_PACKAGE: &str = "ui_deploy_lambda";
const LAMBDA_BINARY: &str = "deploy_lambda";
/// Name the `provided.al2023` runtime executes inside the function zip.
const BOOTSTRAP_ENTRY: &str = "bootstrap";

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the UI deploy workspace"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks
    Ci {
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build deploy_lambda and wrap it as a Lambda function zip
    Package {
        /// Lambda instruction set architecture
        #[arg(value_enum, long, default_value_t = LambdaArch::X86_64)]
        arch: LambdaArch,
        /// Build without --release
        #[arg(long)]
        debug: bool,
        /// Directory the function zip is written to
        #[arg(long, default_value = "infra/ui_deploy/dist")]
        out_dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CiJob {
    /// fmt --check and clippy
    Lint,
    /// Lint, then test every workspace crate
    Check,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LambdaArch {
    #[value(name = "x86_64")]
    X86_64,
    Arm64,
}

impl LambdaArch {
    fn target_triple(self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64-unknown-linux-gnu",
            Self::Arm64 => "aarch64-unknown-linux-gnu",
        }
    }
}

fn cargo(args: &[&str]) -> Result<(), String> {
    eprintln!("+ cargo {}", args.join(" "));
    let status = Command::new("cargo")
        .args(args)
        .status()
        .map_err(|error| format!("failed to spawn cargo: {error}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("`cargo {}` exited with {status}", args.join(" ")))
    }
}

fn package(arch: LambdaArch, debug: bool, out_dir: &Path) -> Result<PathBuf, String> {
    let target = arch.target_triple();
    let mut args = vec![
        "build",
        "-p",
        LAMBDA_PACKAGE,
        "--bin",
        LAMBDA_BINARY,
        "--target",
        target,
    ];
    if !debug {
        args.push("--release");
    }
    cargo(&args)?;

    let profile_dir = if debug { "debug" } else { "release" };
    let binary_path = Path::new("target")
        .join(target)
        .join(profile_dir)
        .join(LAMBDA_BINARY);
    let binary = fs::read(&binary_path)
        .map_err(|error| format!("failed to read {}: {error}", binary_path.display()))?;

    fs::create_dir_all(out_dir)
        .map_err(|error| format!("failed to create {}: {error}", out_dir.display()))?;
    let zip_path = out_dir.join(format!("{LAMBDA_BINARY}.zip"));
    let file = fs::File::create(&zip_path)
        .map_err(|error| format!("failed to create {}: {error}", zip_path.display()))?;
    write_bootstrap_zip(&binary, file)
        .map_err(|error| format!("failed to write {}: {error}", zip_path.display()))?;

    Ok(zip_path)
}

fn write_bootstrap_zip<W: Write + Seek>(binary: &[u8], writer: W) -> ZipResult<W> {
    let mut zip = ZipWriter::new(writer);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file(BOOTSTRAP_ENTRY, options)?;
    zip.write_all(binary)?;
    zip.finish()
}

fn ci(job: CiJob) -> Result<(), String> {
    cargo(&["fmt", "--all", "--", "--check"])?;
    cargo(&["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])?;
    if let CiJob::Check = job {
        cargo(&["test", "--workspace"])?;
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ci { job } => ci(job),
        Commands::Package {
            arch,
            debug,
            out_dir,
        } => package(arch, debug, &out_dir).map(|zip_path| {
            eprintln!("packaged {}", zip_path.display());
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use clap::CommandFactory;
    use zip::ZipArchive;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn arch_maps_to_lambda_target_triples() {
        assert_eq!(LambdaArch::X86_64.target_triple(), "x86_64-unknown-linux-gnu");
        assert_eq!(LambdaArch::Arm64.target_triple(), "aarch64-unknown-linux-gnu");
    }

    #[test]
    fn package_defaults_to_x86_release() {
        let cli = Cli::try_parse_from(["xtask", "package"]).expect("package should parse");
        match cli.command {
            Commands::Package { arch, debug, .. } => {
                assert_eq!(arch, LambdaArch::X86_64);
                assert!(!debug);
            }
            Commands::Ci { .. } => panic!("expected package command"),
        }
    }

    #[test]
    fn bootstrap_zip_holds_one_executable_entry() {
        let bytes = write_bootstrap_zip(b"\x7fELF", Cursor::new(Vec::new()))
            .expect("zip should be written")
            .into_inner();

        let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("zip should open");
        assert_eq!(archive.len(), 1);
        let mut entry = archive.by_index(0).expect("entry should exist");
        assert_eq!(entry.name(), "bootstrap");
        assert_eq!(entry.unix_mode().map(|mode| mode & 0o777), Some(0o755));

        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).expect("entry should read");
        assert_eq!(contents, b"\x7fELF");
    }
}
