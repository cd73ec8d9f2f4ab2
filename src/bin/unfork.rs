//! unfork - recover a kustomize overlay from a forked copy of upstream manifests.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::LevelFilter;

use unfork::{create_overlay, write_overlay, MeaningfulnessRule, Options};

#[derive(Debug, Parser)]
#[command(name = "unfork", version, about = "Recover a kustomize overlay from a fork of upstream manifests")]
struct Cli {
    /// Directory holding the upstream manifests
    #[arg(long)]
    upstream: PathBuf,

    /// Directory holding the forked manifests
    #[arg(long)]
    forked: PathBuf,

    /// Directory the overlay is written to
    #[arg(short, long)]
    output: PathBuf,

    /// Registry file with extra merge strategy types and resources
    #[arg(short, long)]
    schema: Option<PathBuf>,

    /// Which patches are kept as customizations
    #[arg(long, value_enum, default_value_t = MeaningfulnessRule::TopLevel)]
    meaningfulness: MeaningfulnessRule,

    /// Diff kinds without a registered merge strategy anyway
    #[arg(long)]
    deduce_unknown_types: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).parse_default_env().init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let options = Options {
        meaningfulness: cli.meaningfulness,
        schema: cli.schema,
        deduce_unknown_types: cli.deduce_unknown_types,
    };

    let overlay = create_overlay(&cli.upstream, &cli.forked, &options)?;

    fs::create_dir_all(&cli.output).map_err(|e| format!("Failed to create {}: {}", cli.output.display(), e))?;
    let base = base_path(&cli.upstream, &cli.output);
    let kustomization = write_overlay(&overlay, &cli.output, &[base])?;

    println!(
        "{} resources, {} patches, {} renames written to {}",
        kustomization.resources.len(),
        kustomization.patches_strategic_merge.len(),
        kustomization.patches_json6902.len(),
        cli.output.display()
    );
    Ok(())
}

/// The upstream directory as seen from the output directory, falling back to
/// the path as given when either cannot be resolved.
fn base_path(upstream: &Path, output: &Path) -> String {
    match (upstream.canonicalize(), output.canonicalize()) {
        (Ok(upstream), Ok(output)) => relative_path(&upstream, &output),
        _ => upstream.to_string_lossy().into_owned(),
    }
}

fn relative_path(target: &Path, from: &Path) -> String {
    let target: Vec<Component> = target.components().collect();
    let from: Vec<Component> = from.components().collect();
    let common = target.iter().zip(&from).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<String> = vec!["..".to_string(); from.len() - common];
    parts.extend(target[common..].iter().map(|c| c.as_os_str().to_string_lossy().into_owned()));
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path() {
        assert_eq!(relative_path(Path::new("/work/upstream"), Path::new("/work/overlay")), "../upstream");
        assert_eq!(relative_path(Path::new("/work/a/b"), Path::new("/work")), "a/b");
        assert_eq!(relative_path(Path::new("/work"), Path::new("/work")), ".");
    }

    #[test]
    fn test_cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "unfork",
            "--upstream",
            "up",
            "--forked",
            "fork",
            "-o",
            "out",
            "--meaningfulness",
            "include-metadata",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.meaningfulness, MeaningfulnessRule::IncludeMetadata);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.deduce_unknown_types);
    }
}
