use clap::{Parser, Subcommand};
use embed_gallery::catalog::{self, FsCatalog};
use embed_gallery::simulate::{Outcome, Script, Simulation, SimulationOptions};
use embed_gallery::{config, output, page};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "embed-gallery")]
#[command(about = "Lazy-loading carousel of embedded social posts")]
#[command(long_about = "\
Lazy-loading carousel of embedded social posts

A JSON catalog lists the posts. Each becomes a card that shows its preview
image until it scrolls into view, then loads the embed behind it. Failed
embeds are retried, and cards that run out of attempts show a static
fallback with a link to the post.

Site structure:

  site/
  ├── config.toml          # Timing, watcher and fallback text (optional)
  ├── posts.json           # [{\"title\", \"image\", \"url\"}, ...]
  └── images/
      ├── hero-01.jpg      # Hero slideshow, hero-01 .. hero-10
      └── posts/           # Card preview images

Run 'embed-gallery gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Site directory containing the catalog
    #[arg(long, default_value = "site", global = true)]
    site: PathBuf,

    /// Config file (defaults to config.toml in the site directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log loader decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate the catalog and config without rendering
    Check,
    /// Render index.html with an empty carousel and copy the catalog beside it
    Render {
        /// Output directory
        #[arg(long, default_value = "dist")]
        output: PathBuf,
    },
    /// Run the loader against scripted frame outcomes and print each card's timeline
    Simulate {
        /// Per-card outcomes, e.g. `2:readable,denied` (cards are 1-based)
        #[arg(long = "outcome", value_name = "CARD:OUTCOMES")]
        outcomes: Vec<String>,

        /// Outcome for cards without a script: denied, readable, blank, error, silent
        #[arg(long, default_value = "denied")]
        default: String,

        /// Milliseconds between a frame being attached and its signal
        #[arg(long, default_value_t = 250)]
        latency_ms: u64,

        /// Behave as if the browser has no intersection observer
        #[arg(long)]
        no_observer: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Command::Check => {
            let config = load_site_config(&cli.site, cli.config.as_deref())?;
            println!("==> Checking {}", cli.site.display());
            let source = FsCatalog::new(&cli.site);
            let posts = catalog::fetch_catalog(&source, &config.catalog.location, false)?;
            output::print_catalog(&posts);
            println!("==> Catalog is valid");
        }
        Command::Render { output: out_dir } => {
            let config = load_site_config(&cli.site, cli.config.as_deref())?;
            println!("==> Rendering {} \u{2192} {}", cli.site.display(), out_dir.display());
            let rendered = page::render_site(&cli.site, &out_dir, &config)?;
            output::print_render_output(&rendered, &out_dir);
        }
        Command::Simulate {
            outcomes,
            default,
            latency_ms,
            no_observer,
        } => {
            let config = load_site_config(&cli.site, cli.config.as_deref())?;
            let mut script = Script::new(default.parse::<Outcome>()?);
            for entry in &outcomes {
                script.parse_card(entry)?;
            }
            let source = FsCatalog::new(&cli.site);
            let options = SimulationOptions {
                latency: Duration::from_millis(latency_ms),
                intersection_observer: !no_observer,
            };
            let report = Simulation::new(&config, script, options).run(
                &source,
                &config.catalog.location,
                config.catalog.cache_bust,
            );
            output::print_simulation(&report);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Logs go to stderr so command output stays clean on stdout.
fn init_logging(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn load_site_config(
    site: &Path,
    explicit: Option<&Path>,
) -> Result<config::GalleryConfig, config::ConfigError> {
    let path = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| site.join("config.toml"));
    debug!(path = %path.display(), "loading config");
    config::load_config(&path)
}
