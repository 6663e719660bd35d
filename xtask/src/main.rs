use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{exit, Command};

use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_PACKAGE: &str = "label_assessment_lambda";
const LAMBDA_BINARY: &str = "assessment_lambda";
const ARTIFACT_NAME: &str = "assessment.zip";

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the image label assessment workspace"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI checks (fmt, clippy, tests)
    Ci,
    /// Build and package the assessment Lambda as a deployable zip
    ServerlessPackage {
        /// Compilation target triple for the Lambda binary
        #[arg(long, default_value = "x86_64-unknown-linux-gnu")]
        target: String,
        /// Build profile used for the binary
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
        /// Directory the zip artifact is written to
        #[arg(long, default_value = "dist")]
        dist_dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

impl BuildProfile {
    fn dir_name(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    fn as_cargo_flag(self) -> Option<&'static str> {
        match self {
            Self::Debug => None,
            Self::Release => Some("--release"),
        }
    }
}

fn announce(label: &str) {
    eprintln!("\n[xtask] {label}");
}

fn cargo(args: &[&str]) -> Result<(), String> {
    eprintln!("+ cargo {}", args.join(" "));
    let status = Command::new("cargo")
        .args(args)
        .status()
        .map_err(|error| format!("could not start cargo: {error}"))?;
    if status.success() {
        Ok(())
    } else {
        Err(format!("`cargo {}` exited with {status}", args.join(" ")))
    }
}

fn ci() -> Result<(), String> {
    announce("rustfmt");
    cargo(&["fmt", "--all", "--", "--check"])?;

    announce("clippy");
    cargo(&[
        "clippy",
        "--workspace",
        "--all-targets",
        "--",
        "-D",
        "warnings",
    ])?;

    announce("unit tests");
    cargo(&["test", "-p", "label_assessment_core", "-p", LAMBDA_PACKAGE, "-p", "xtask"])
}

fn serverless_package(target: &str, profile: BuildProfile, dist_dir: &Path) -> Result<(), String> {
    check_target_installed(target)?;

    announce(&format!("building {LAMBDA_BINARY} for {target}"));
    let mut build_args = vec![
        "build",
        "-p",
        LAMBDA_PACKAGE,
        "--bin",
        LAMBDA_BINARY,
        "--target",
        target,
    ];
    build_args.extend(profile.as_cargo_flag());
    cargo(&build_args)?;

    let executable = if target.contains("windows") {
        format!("{LAMBDA_BINARY}.exe")
    } else {
        LAMBDA_BINARY.to_string()
    };
    let binary_path = Path::new("target")
        .join(target)
        .join(profile.dir_name())
        .join(executable);

    fs::create_dir_all(dist_dir)
        .map_err(|error| format!("could not create {}: {error}", dist_dir.display()))?;
    let artifact = dist_dir.join(ARTIFACT_NAME);
    write_bootstrap_zip(&binary_path, &artifact)?;

    announce(&format!("wrote {}", artifact.display()));
    Ok(())
}

// A missing rustup is tolerated so toolchains installed without it still work.
fn check_target_installed(target: &str) -> Result<(), String> {
    let output = match Command::new("rustup")
        .args(["target", "list", "--installed"])
        .output()
    {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            return Err(format!(
                "`rustup target list --installed` failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        Err(error) => {
            eprintln!("warning: skipping target check, rustup unavailable ({error})");
            return Ok(());
        }
    };

    let installed = String::from_utf8_lossy(&output.stdout);
    if installed.lines().any(|line| line.trim() == target) {
        Ok(())
    } else {
        Err(format!(
            "target `{target}` is missing; add it with `rustup target add {target}` before packaging the assessment lambda"
        ))
    }
}

// The provided.al2023 runtime executes an entry named `bootstrap`.
fn write_bootstrap_zip(binary_path: &Path, artifact: &Path) -> Result<(), String> {
    let binary = fs::read(binary_path).map_err(|error| {
        format!(
            "could not read lambda binary {}: {error}",
            binary_path.display()
        )
    })?;

    let file = fs::File::create(artifact)
        .map_err(|error| format!("could not create {}: {error}", artifact.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)
        .map_err(|error| format!("could not add bootstrap entry: {error}"))?;
    zip.write_all(&binary)
        .map_err(|error| format!("could not write bootstrap entry: {error}"))?;
    zip.finish()
        .map_err(|error| format!("could not finalize {}: {error}", artifact.display()))?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ci => ci(),
        Commands::ServerlessPackage {
            target,
            profile,
            dist_dir,
        } => serverless_package(&target, profile, &dist_dir),
    };

    if let Err(message) = result {
        eprintln!("error: {message}");
        exit(1);
    }
}
