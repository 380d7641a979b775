//! Command-line interface for reflectgen.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Context;
use clang::Clang;
use clap::{Args, Parser, Subcommand};
use colored::*;

use crate::reflect::{self, CompileOptions};
use crate::script::ScriptHost;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_USAGE: i32 = -1;

/// Annotation-driven C++ reflection and code generation.
///
/// reflectgen parses annotated C++ sources through libclang, reflects every
/// marked declaration into a structured model, and hands the model to a
/// Luau process script that emits one output artifact per source plus a
/// single aggregated glue artifact.
#[derive(Parser)]
#[command(name = "reflectgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reflect sources and run the process script over them
    #[command(visible_alias = "gen")]
    Generate(GenerateArgs),
    /// Reflect a single source and print the model as JSON
    Dump(DumpArgs),
}

/// Arguments for the generate command.
#[derive(Args)]
pub struct GenerateArgs {
    /// Directory that receives the generated artifacts
    pub binary_dir: PathBuf,

    /// Luau process script exposing SourceProcess and GlueProcess
    pub script: PathBuf,

    /// Source files to reflect
    #[arg(required = true)]
    pub sources: Vec<PathBuf>,

    /// Include directories (semicolon-separated)
    #[arg(long = "include", value_name = "LIST", value_delimiter = ';')]
    pub includes: Vec<String>,

    /// Preprocessor defines (semicolon-separated)
    #[arg(long = "define", value_name = "LIST", value_delimiter = ';')]
    pub defines: Vec<String>,

    /// System include directories (semicolon-separated)
    #[arg(long = "system-include", value_name = "LIST", value_delimiter = ';')]
    pub system_includes: Vec<String>,

    /// Extension appended to per-source outputs (e.g. ".gen.cpp")
    #[arg(long, value_name = "EXT", default_value = "")]
    pub out_extension: String,

    /// Extension appended to the glue output
    #[arg(long, value_name = "EXT", default_value = "")]
    pub glue_extension: String,
}

/// Arguments for the dump command.
#[derive(Args)]
pub struct DumpArgs {
    /// Source file to reflect
    pub source: PathBuf,

    /// Include directories (semicolon-separated)
    #[arg(long = "include", value_name = "LIST", value_delimiter = ';')]
    pub includes: Vec<String>,

    /// Preprocessor defines (semicolon-separated)
    #[arg(long = "define", value_name = "LIST", value_delimiter = ';')]
    pub defines: Vec<String>,

    /// System include directories (semicolon-separated)
    #[arg(long = "system-include", value_name = "LIST", value_delimiter = ';')]
    pub system_includes: Vec<String>,
}

/// A canonicalized input path plus the forward-slash UTF-8 form handed to
/// scripts.
struct SourcePath {
    path: PathBuf,
    utf8: String,
}

fn canonical_source(path: &Path) -> anyhow::Result<SourcePath> {
    let path = path
        .canonicalize()
        .with_context(|| format!("file {:?} doesn't exist", path))?;
    let utf8 = path.to_string_lossy().replace('\\', "/");
    Ok(SourcePath { path, utf8 })
}

/// Derive a per-source output directory name.
///
/// Absolute paths are flattened by replacing separators and drive colons
/// with underscores so the result always nests under the binary dir.
fn clean_output_name(path: &Path) -> PathBuf {
    if !path.has_root() {
        return path.to_path_buf();
    }
    let cleaned: String = path
        .to_string_lossy()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect();
    PathBuf::from(cleaned)
}

fn modified(path: &Path) -> anyhow::Result<SystemTime> {
    let metadata =
        fs::metadata(path).with_context(|| format!("cannot access {}", path.display()))?;
    Ok(metadata.modified()?)
}

/// True when the output is missing or any input is newer than it.
fn is_stale(output: &Path, inputs: &[&Path]) -> anyhow::Result<bool> {
    if !output.exists() {
        return Ok(true);
    }
    let output_time = modified(output)?;
    for input in inputs {
        if modified(input)? > output_time {
            return Ok(true);
        }
    }
    Ok(false)
}

struct SourceJob {
    source: SourcePath,
    out_path: PathBuf,
    rebuild: bool,
}

/// Run the generate command.
pub fn run_generate(args: &GenerateArgs) -> anyhow::Result<i32> {
    let clang = Clang::new().map_err(anyhow::Error::msg)?;

    eprintln!(
        "{} {} ({})",
        "reflectgen".bold(),
        env!("CARGO_PKG_VERSION"),
        clang::get_version()
    );

    fs::create_dir_all(&args.binary_dir)
        .with_context(|| format!("cannot create {}", args.binary_dir.display()))?;

    let script = canonical_source(&args.script)?;
    let script_source = fs::read_to_string(&script.path)
        .with_context(|| format!("cannot read script {}", script.path.display()))?;

    // The glue has no single source input; its staleness is tied to the
    // script alone.
    let glue_path = args.binary_dir.join(format!("glue{}", args.glue_extension));
    let rebuild_glue = is_stale(&glue_path, &[&script.path])?;

    let mut jobs = Vec::new();
    for source in &args.sources {
        let source = canonical_source(source)?;

        let out_dir = args.binary_dir.join(clean_output_name(&source.path));
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("cannot create {}", out_dir.display()))?;

        let out_path = out_dir.join(format!("out{}", args.out_extension));
        let rebuild = is_stale(&out_path, &[&source.path, &script.path])?;

        jobs.push(SourceJob {
            source,
            out_path,
            rebuild,
        });
    }

    let host = ScriptHost::load(&script_source)?;

    let options = CompileOptions {
        includes: args.includes.clone(),
        defines: args.defines.clone(),
        system_includes: args.system_includes.clone(),
    };

    for job in &jobs {
        let short_name = job
            .source
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| job.source.utf8.clone());

        if !job.rebuild {
            eprintln!("  {} {} up to date", "-".dimmed(), short_name);
            continue;
        }
        eprintln!("  {} generating {}", "✓".green(), short_name);

        let registries = reflect::reflect_file(&clang, &job.source.path, &options)?;
        let output = host.source_process(&job.source.utf8, &registries)?;
        fs::write(&job.out_path, output)
            .with_context(|| format!("failed to write output {}", job.out_path.display()))?;
    }

    if rebuild_glue {
        eprintln!("  {} generating glue", "✓".green());

        let mut pairs = Vec::new();
        for job in &jobs {
            let out = canonical_source(&job.out_path)?;
            pairs.push((job.source.utf8.clone(), out.utf8));
        }

        let output = host.glue_process(&pairs)?;
        fs::write(&glue_path, output)
            .with_context(|| format!("failed to write output {}", glue_path.display()))?;
    } else {
        eprintln!("  {} glue up to date", "-".dimmed());
    }

    Ok(EXIT_SUCCESS)
}

/// Run the dump command.
pub fn run_dump(args: &DumpArgs) -> anyhow::Result<i32> {
    let clang = Clang::new().map_err(anyhow::Error::msg)?;

    let source = canonical_source(&args.source)?;
    let options = CompileOptions {
        includes: args.includes.clone(),
        defines: args.defines.clone(),
        system_includes: args.system_includes.clone(),
    };

    let registries = reflect::reflect_file(&clang, &source.path, &options)?;
    println!("{}", serde_json::to_string_pretty(&registries)?);

    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_output_name_relative_passthrough() {
        assert_eq!(
            clean_output_name(Path::new("src/component.h")),
            PathBuf::from("src/component.h")
        );
    }

    #[test]
    fn test_clean_output_name_flattens_absolute() {
        assert_eq!(
            clean_output_name(Path::new("/home/user/component.h")),
            PathBuf::from("_home_user_component.h")
        );
    }
}
