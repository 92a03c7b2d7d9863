use clap::{Parser, Subcommand};
use respimg::config::{self, ResponsiveConfig};
use respimg::responsive::Responsive;
use respimg::store::Library;
use respimg::{batch, output};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "respimg")]
#[command(about = "Add srcset and sizes to <img> tags of uploaded images")]
#[command(long_about = "\
Add srcset and sizes to <img> tags of uploaded images

The media library is a JSON file describing every uploaded image and the
renditions already generated for it:

  {
    \"base_url\": \"http://example.org/wp-content/uploads\",
    \"attachments\": {
      \"42\": {
        \"width\": 1600, \"height\": 1200, \"file\": \"2015/06/photo.png\",
        \"sizes\": {
          \"medium\": { \"width\": 300, \"height\": 225, \"file\": \"photo-300x225.png\" },
          \"large\":  { \"width\": 1024, \"height\": 768, \"file\": \"photo-1024x768.png\" }
        }
      }
    }
  }

Images are matched by their wp-image-<id> / size-<name> classes, or else by
filename. Only renditions with the same aspect ratio are offered.

Set RUST_LOG=debug to see why a tag was skipped.
Run 'respimg gen-config' to generate a documented respimg.toml.")]
#[command(version)]
struct Cli {
    /// Media library JSON file
    #[arg(long, default_value = "library.json", global = true)]
    library: PathBuf,

    /// Configuration file (stock defaults if absent)
    #[arg(long, default_value = "respimg.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Add srcset/sizes to images in HTML files (directories are searched for .html)
    Rewrite {
        /// Files or directories to rewrite
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Report what would change without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the srcset and sizes attributes for one attachment
    Srcset {
        /// Attachment id
        id: u64,
        /// Size name (defaults to `default_size` from the config)
        #[arg(long)]
        size: Option<String>,
    },
    /// Print a stock respimg.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Rewrite { paths, dry_run } => {
            let (config, responsive) = load_responsive(&cli.config, &cli.library)?;
            init_thread_pool(&config.processing);
            let documents = batch::collect_documents(&paths);
            let outcomes = batch::rewrite_documents(&responsive, &documents, dry_run);
            output::print_rewrite_output(&outcomes, dry_run);
        }
        Command::Srcset { id, size } => {
            let (_, responsive) = load_responsive(&cli.config, &cli.library)?;
            let size = size.unwrap_or_else(|| responsive.default_size().to_string());
            let srcset = responsive.get_srcset_string(id, &size)?;
            let sizes = match srcset {
                Some(_) => responsive.get_sizes_string(id, &size, None),
                None => None,
            };
            output::print_srcset_output(id, &size, srcset.as_deref(), sizes.as_deref());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn load_responsive(
    config_path: &Path,
    library_path: &Path,
) -> Result<(ResponsiveConfig, Responsive<Library>), Box<dyn std::error::Error>> {
    let config = config::load_config(config_path)?;
    let library = Library::load(library_path)?;
    let responsive = Responsive::from_config(library, &config);
    Ok((config, responsive))
}

/// Log to stderr, filtered by `RUST_LOG` (warnings only by default).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
