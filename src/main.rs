//! asmspy CLI binary entry point.
//! Resolves settings, runs the analysis, and prints results.

use asmspy::analyse::{run_analysis, Analysis};
use asmspy::cli::Cli;
use asmspy::reader::CliMetadataReader;
use asmspy::{config, output, utils};
use clap::Parser;

fn main() {
    let cli = Cli::parse();
    if !cli.directory.is_dir() {
        eprintln!(
            "{} Directory: '{}' does not exist.",
            utils::error_prefix(),
            cli.directory.to_string_lossy()
        );
        std::process::exit(2);
    }

    let eff = config::resolve_effective(&cli.directory, cli.all(), cli.nonsystem());
    for w in &eff.warnings {
        eprintln!("{} {}", utils::warn_prefix(), w);
    }
    if let Some(path) = eff.config_file.as_ref() {
        if eff.output != "json" {
            eprintln!(
                "{} Using config {}",
                utils::info_prefix(),
                path.to_string_lossy()
            );
        }
    }

    match run_analysis(
        &eff.directory,
        &eff.extensions,
        &eff.policy,
        &CliMetadataReader,
    ) {
        Analysis::Report(report) => {
            output::print_skipped(&report.skipped, &eff.output);
            output::print_report(&report, &eff.output);
        }
        Analysis::NothingFound {
            directory,
            candidates,
            skipped,
        } => {
            output::print_skipped(&skipped, &eff.output);
            output::print_nothing_found(&directory, candidates, &skipped, &eff.output);
            std::process::exit(1);
        }
    }
}
