//! Folio CLI: multi-module documentation generation.
//!
//! `folio generate` runs every step of the workspace graph, `folio manifest`
//! prints the parameter manifest a unit would hand to the engine,
//! `folio package` runs only the packaging steps, and `folio clean` removes
//! generated output.

#![warn(missing_docs)]

mod clean;
mod fingerprint;
mod generate;
mod host;
mod layout;
mod logging;
mod manifest;
mod package;
mod pipeline;
mod plan;
mod steps;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Folio: orchestrates documentation generation across build units.
#[derive(Parser, Debug)]
#[command(name = "folio", version, about = "Multi-module documentation orchestrator")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// How diagnostics are printed.
    #[arg(long, global = true, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    /// Path to the workspace `folio.toml` (or its directory).
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate documentation for the whole workspace graph.
    Generate(GenerateArgs),
    /// Print the parameter manifest a unit would produce.
    Manifest(ManifestArgs),
    /// Package module outputs into component bundles.
    Package(PackageArgs),
    /// Remove generated output and the step cache.
    Clean,
}

/// Arguments for `folio generate`.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Only generate this format.
    #[arg(short, long)]
    pub format: Option<String>,

    /// Only generate this unit (and the units it aggregates).
    #[arg(short, long)]
    pub unit: Option<String>,

    /// Maximum number of concurrently running steps.
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

/// Arguments for `folio manifest`.
#[derive(Parser, Debug)]
pub struct ManifestArgs {
    /// Format to build the manifest for (defaults to the unit's first format).
    #[arg(short, long)]
    pub format: Option<String>,

    /// The unit directory (defaults to the current directory's unit).
    #[arg(short, long)]
    pub unit: Option<String>,

    /// Generation mode (defaults to how `generate` would run the unit).
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,
}

/// Arguments for `folio package`.
#[derive(Parser, Debug)]
pub struct PackageArgs {
    /// Only package this format.
    #[arg(short, long)]
    pub format: Option<String>,

    /// Only package this unit.
    #[arg(short, long)]
    pub unit: Option<String>,
}

/// Generation mode selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Intermediate module output.
    Module,
    /// Final publication.
    Publication,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Diagnostic output style.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    /// Terminal-friendly text.
    Human,
    /// One JSON object per line.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// How diagnostics are printed.
    pub message_format: MessageFormat,
    /// Optional path to the workspace config.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::env::var_os("TERM").is_some() && std::env::var_os("NO_COLOR").is_none(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        color,
        message_format: cli.message_format,
        config: cli.config,
    };
    logging::init(&global);

    let result = match cli.command {
        Command::Generate(ref args) => generate::run(args, &global),
        Command::Manifest(ref args) => manifest::run(args, &global),
        Command::Package(ref args) => package::run(args, &global),
        Command::Clean => clean::run(&global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_generate_default() {
        let cli = Cli::parse_from(["folio", "generate"]);
        match cli.command {
            Command::Generate(ref args) => {
                assert!(args.format.is_none());
                assert!(args.unit.is_none());
                assert!(args.jobs.is_none());
            }
            _ => panic!("expected Generate command"),
        }
    }

    #[test]
    fn parse_generate_with_args() {
        let cli = Cli::parse_from([
            "folio", "generate", "--format", "html", "--unit", "docs", "--jobs", "4",
        ]);
        match cli.command {
            Command::Generate(ref args) => {
                assert_eq!(args.format.as_deref(), Some("html"));
                assert_eq!(args.unit.as_deref(), Some("docs"));
                assert_eq!(args.jobs, Some(4));
            }
            _ => panic!("expected Generate command"),
        }
    }

    #[test]
    fn parse_manifest_mode() {
        let cli = Cli::parse_from(["folio", "manifest", "--mode", "module", "-u", "hello"]);
        match cli.command {
            Command::Manifest(ref args) => {
                assert_eq!(args.mode, Some(ModeArg::Module));
                assert_eq!(args.unit.as_deref(), Some("hello"));
            }
            _ => panic!("expected Manifest command"),
        }
    }

    #[test]
    fn parse_package_and_clean() {
        let cli = Cli::parse_from(["folio", "package", "-f", "javadoc"]);
        assert!(matches!(cli.command, Command::Package(ref a) if a.format.as_deref() == Some("javadoc")));
        let cli = Cli::parse_from(["folio", "clean"]);
        assert!(matches!(cli.command, Command::Clean));
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from(["folio", "--quiet", "--color", "never", "generate"]);
        assert!(cli.quiet);
        assert!(!cli.verbose);
        assert_eq!(cli.color, ColorChoice::Never);
    }

    #[test]
    fn parse_message_format() {
        let cli = Cli::parse_from(["folio", "generate", "--message-format", "json"]);
        assert_eq!(cli.message_format, MessageFormat::Json);
        let cli = Cli::parse_from(["folio", "clean"]);
        assert_eq!(cli.message_format, MessageFormat::Human);
    }

    #[test]
    fn parse_config_path() {
        let cli = Cli::parse_from(["folio", "--config", "/w/folio.toml", "clean"]);
        assert_eq!(cli.config.as_deref(), Some("/w/folio.toml"));
    }

    #[test]
    fn parse_verbose_after_subcommand() {
        let cli = Cli::parse_from(["folio", "generate", "--verbose"]);
        assert!(cli.verbose);
    }
}
