use clap::{Parser, Subcommand};
use simple_press::{config, output, pipeline};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "simple-press")]
#[command(about = "Static site generator for markdown blogs")]
#[command(long_about = "\
Static site generator for markdown blogs

Posts are markdown files with a frontmatter block. The first blockquote of
each post is its summary and is required.

Site structure:

  site/
  ├── config.toml                 # Site config; only site.domain is required
  ├── posts/                      # build.content = \"posts/*.md\"
  │   ├── hello-world.md
  │   └── playgrounds.md
  └── assets/                     # build.assets, copied to the output root
      ├── styles.css
      └── images/                 # Feed enclosures are measured from here

Frontmatter:

  ---
  title: Hello World
  description: Meta description
  published: 2024-01-05T09:00:00Z
  updated: 2024-01-05T09:00:00Z
  tags: rust, web
  ---

Paths in config.toml are relative to the config file's directory.

Run 'simple-press gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Site config file
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Output directory (overrides build.output)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: ingest → assemble → assets → generate
    Build,
    /// Validate posts and config without writing anything
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Build => {
            let (site_config, root) = load(&cli.config, cli.output.as_deref())?;
            init_thread_pool(&site_config.processing);
            println!("==> Building {}", site_config.build.content);
            let outcome = pipeline::run(&site_config)?;
            output::print_scan_output(&outcome.corpus, Some(&root));
            output::print_generate_output(&outcome.report);
            println!("==> Build complete: {}", site_config.build.output);
        }
        Command::Check => {
            let (site_config, root) = load(&cli.config, cli.output.as_deref())?;
            init_thread_pool(&site_config.processing);
            println!("==> Checking {}", site_config.build.content);
            let corpus = pipeline::check(&site_config)?;
            output::print_scan_output(&corpus, Some(&root));
            println!("==> Content is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config and resolve its paths against the config file's directory.
/// A CLI `--output` is taken as given, relative to the working directory.
fn load(
    path: &Path,
    output_override: Option<&Path>,
) -> Result<(config::SiteConfig, PathBuf), config::ConfigError> {
    let mut site_config = config::load_config(path)?;
    let root = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    site_config.build.rebase(&root);
    if let Some(out) = output_override {
        site_config.build.output = out.to_string_lossy().into_owned();
    }
    Ok((site_config, root))
}

/// Log to stderr so stdout stays the build report.
fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Size the global rayon pool from `[processing]`, capped at the core count.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
