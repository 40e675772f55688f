use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::LazyLock;
use tagver::package::PackageError;
use tagver::{Resolver, config, normalize, output};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

fn version_string() -> &'static str {
    static VERSION: LazyLock<String> = LazyLock::new(|| {
        let describe = env!("TAGVER_GIT_DESCRIBE");
        if describe.is_empty() {
            env!("CARGO_PKG_VERSION").to_string()
        } else {
            normalize::pep440_compliant(describe)
        }
    });
    VERSION.as_str()
}

#[derive(Parser)]
#[command(name = "tagver")]
#[command(about = "Derive PEP 440 package versions from git tags")]
#[command(long_about = "\
Derive PEP 440 package versions from git tags

If the project root contains .git, `git describe --tags` supplies the raw
descriptor and it is written to the cache file whenever it changes. Without
.git, the cached descriptor is used. The raw value is then normalized:

  1.2.3              → 1.2.3
  v1.2.3-5-gabc1234  → 1.2.3.post5+gabc1234
  anything-else      → anything-else (unchanged)

Project layout:

  project/
  ├── .git/            # Optional; enables git describe
  ├── tagver.toml      # Optional config (see gen-config)
  └── _version.py      # Cache: __version__ = \"v1.2.3-5-gabc1234\"

A cache file that exists but has no __version__ line is an error.

Run 'tagver gen-config' to generate a documented tagver.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Project root directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Config file (default: <root>/tagver.toml, optional)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Show debug diagnostics
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print results and warnings
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct ResolveArgs {
    /// Print only the raw descriptor instead of the summary
    #[arg(long)]
    raw: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve and print the project version
    Resolve(ResolveArgs),
    /// Normalize a descriptor without touching the filesystem
    Normalize {
        /// Raw descriptor, e.g. v1.2.3-5-gabc1234
        raw: String,
    },
    /// Print the package descriptor as JSON, with the resolved version
    Metadata,
    /// Print a stock tagver.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    // JSON goes to stdout, so keep diagnostics off it
    init_logging(&cli, matches!(cli.command, Command::Metadata));

    match &cli.command {
        Command::Resolve(args) => {
            let config = load_config(&cli)?;
            let resolution = Resolver::new(&cli.root, &config).resolve()?;
            let display = output::ResolveDisplay::from_flags(args.raw, cli.quiet);
            output::print_resolve(&resolution, &cli.root, display);
        }
        Command::Normalize { raw } => {
            println!("{}", normalize::pep440_compliant(raw));
        }
        Command::Metadata => {
            let config = load_config(&cli)?;
            let package = config.package.as_ref().ok_or(PackageError::Missing)?;
            let version = tagver::resolve_version(&cli.root, &config)?;
            println!("{}", package.with_version(version).to_json_pretty()?);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<config::ResolverConfig, config::ConfigError> {
    match &cli.config {
        Some(path) => config::load_config_file(path),
        None => config::load_config(&cli.root),
    }
}

/// Install the global tracing subscriber.
///
/// Diagnostics go to stdout unless `to_stderr` is set.
fn init_logging(cli: &Cli, to_stderr: bool) {
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else if cli.quiet {
        tracing::Level::WARN
    } else {
        tracing::Level::INFO
    };
    let writer = if to_stderr {
        BoxMakeWriter::new(std::io::stderr)
    } else {
        BoxMakeWriter::new(std::io::stdout)
    };
    tracing_subscriber::fmt()
        .compact()
        .with_target(false)
        .with_max_level(level)
        .with_writer(writer)
        .init();
}
