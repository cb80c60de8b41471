use clap::{Parser, Subcommand};
use simple_press::render::HtmlRenderer;
use simple_press::{config, generate, output, scan, serve};
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "simple-press")]
#[command(about = "Static site generator for posts, pages, and paginated archives")]
#[command(long_about = "\
Static site generator for posts, pages, and paginated archives

Every engine in config.toml turns one directory of markdown files into
pages. Each file starts with a header block of `field: value` lines between
`---` delimiters. Engines can group their units into packs: paginated
archive pages, optionally split by a field such as tags or month.

Project structure:

  project/
  ├── config.toml                  # [site] settings and one [engines.NAME] per engine
  ├── assets/                      # Copied verbatim to the output root
  └── contents/
      ├── blog/                    # engines.blog
      │   └── hello.md
      └── pages/                   # engines.pages
          └── about.md

Unit header:

  ---
  title: Hello World
  time: 2009/10/04 08:00
  tags: rust, web
  ---

Run 'simple-press gen-config' to generate a documented config.toml, and
'simple-press serve' to preview a build at http://localhost:8000/.")]
#[command(version)]
struct Cli {
    /// Project directory (holds config.toml)
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "site", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (scan manifest)
    #[arg(long, default_value = ".simple-press-temp", global = true)]
    temp_dir: PathBuf,

    /// Log debug events (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse all content into a manifest
    Scan,
    /// Run the full pipeline: scan → generate
    Build,
    /// Validate content, permalinks, and packs without writing
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
    /// Serve the output directory on localhost
    Serve {
        /// Port to listen on
        #[arg(long, short, default_value_t = serve::DEFAULT_PORT)]
        port: u16,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Scan => {
            let manifest = scan::scan(&cli.source)?;
            write_manifest(&manifest, &cli.temp_dir)?;
            output::print_scan_output(&manifest, &cli.source);
        }
        Command::Build => {
            println!("==> Stage 1: Scanning {}", cli.source.display());
            let manifest = scan::scan(&cli.source)?;
            write_manifest(&manifest, &cli.temp_dir)?;
            output::print_scan_output(&manifest, &cli.source);

            println!("==> Stage 2: Generating HTML → {}", cli.output.display());
            let report = generate::generate(&manifest, &cli.source, &cli.output, &HtmlRenderer)?;
            output::print_generate_output(&report);

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let manifest = scan::scan(&cli.source)?;
            let engines = generate::check(&manifest)?;
            output::print_check_output(&engines);
            println!("==> Content is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Serve { port } => {
            serve::serve(&cli.output, port)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "simple_press=debug"
    } else {
        "simple_press=warn,simple_press::serve=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn write_manifest(manifest: &scan::Manifest, temp_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(temp_dir)?;
    let json = serde_json::to_string_pretty(manifest)?;
    std::fs::write(temp_dir.join("manifest.json"), json)?;
    Ok(())
}
