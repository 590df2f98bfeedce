//! CLI argument parsing via `clap`.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "asmspy",
    version,
    about = "Report assemblies referenced with conflicting versions",
    long_about = "asmspy — scan a build output folder and list references that different assemblies request with different versions.\n\nConfiguration precedence: CLI keywords > asmspy.toml > defaults.",
    after_help = "Keywords:\n  all         list every reference, not only conflicting ones\n  nonsystem   hide System*, mscorlib and netstandard references\n\nExamples:\n  asmspy ./bin/Debug\n  asmspy ./bin/Debug all\n  asmspy ./bin/Debug all nonsystem",
    arg_required_else_help = true
)]
/// Positional arguments: a directory and up to two mode keywords.
pub struct Cli {
    #[arg(help = "Directory to load assemblies from")]
    pub directory: PathBuf,
    #[arg(
        num_args = 0..=2,
        value_name = "KEYWORD",
        help = "Optional keywords: all, nonsystem (other words are ignored)"
    )]
    pub keywords: Vec<String>,
}

impl Cli {
    /// `all`: report every reference instead of conflicts only.
    pub fn all(&self) -> bool {
        self.keywords.iter().any(|k| k == "all")
    }

    /// `nonsystem`: hide references to platform runtime modules.
    pub fn nonsystem(&self) -> bool {
        self.keywords.iter().any(|k| k == "nonsystem")
    }
}
