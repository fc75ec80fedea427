use clap::{Parser, Subcommand};
use darkroom::catalogue::{Catalogue, ImageHandle};
use darkroom::config::{self, Config};
use darkroom::export::{self, ExportOptions};
use darkroom::imaging::RustBackend;
use darkroom::output;
use darkroom::session::Session;
use std::io;
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("DARKROOM_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("DARKROOM_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "darkroom")]
#[command(about = "Cull and touch up folders of photos")]
#[command(long_about = "\
Cull and touch up folders of photos

Every regular file in the given folders is loaded in order. For each image
you get a one-letter command prompt:

  b  brightness delta          h  hue/saturation/light deltas
  m  brighten a rectangle      r  inpaint a rectangle away
  g  overlay text              d  denoise
  i  write <file>.meta stats   s  save deltas as preset
  l  load and apply preset     c  cull and move on
  n  next image                q  stop

When the walk ends, every edited image that was not culled is written as
edited_0.jpg, edited_1.jpg, ... in the export directory.

Run 'darkroom gen-config' to generate a documented darkroom.toml.")]
#[command(version = version_string())]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Folders to catalogue, in order
    folders: Vec<PathBuf>,
    /// Config file (default: ./darkroom.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Export directory, overriding export.directory
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    /// Use the slider preview window instead of the text prompt
    #[arg(long)]
    gui: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print a stock darkroom.toml with all options documented
    GenConfig,
    /// Edit a single image and write it as output.jpg
    Edit {
        /// Image to edit
        image: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Some(Command::GenConfig) => {
            print!("{}", config::stock_config_toml());
            return Ok(());
        }
        None if cli.folders.is_empty() => {
            println!("{}", output::format_usage(env!("CARGO_PKG_NAME")));
            return Ok(());
        }
        _ => {}
    }

    let mut config = config::load_config(cli.config.as_deref(), Path::new("."))?;
    if let Some(dir) = cli.output_dir {
        config.export.directory = dir;
    }
    let backend = config.backend();

    match cli.command {
        Some(Command::Edit { image }) => edit_single(&backend, &config, &image)?,
        Some(Command::GenConfig) => {}
        None => {
            let mut catalogue = Catalogue::new();
            let report = catalogue.load(&backend, &cli.folders);
            output::print_load_report(&report);

            if cli.gui {
                return run_gui(backend, config, catalogue);
            }

            let total = catalogue.len();
            let mut session = Session::new(&backend, &config);
            let summary = session.run(&mut catalogue, io::stdin().lock(), io::stdout())?;
            println!();
            println!("{}", output::format_session_summary(&summary, total));

            let report = export::export(&backend, &catalogue, &ExportOptions::from_config(&config))?;
            output::print_export_report(&report);
        }
    }

    Ok(())
}

/// Run the session on one file and write it to `export.single`.
fn edit_single(
    backend: &RustBackend,
    config: &Config,
    image: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut catalogue = Catalogue::new();
    catalogue.push(ImageHandle::open(backend, image));

    let mut session = Session::new(backend, config);
    session.run(&mut catalogue, io::stdin().lock(), io::stdout())?;
    println!();

    let output = config.export.directory.join(&config.export.single);
    if let Some(handle) = catalogue.get(0) {
        if export::export_single(backend, handle, &output, config.quality())? {
            println!("{} → {}", handle.path().display(), output.display());
        } else {
            println!("Nothing to write");
        }
    }
    Ok(())
}

#[cfg(feature = "gui")]
fn run_gui(
    backend: RustBackend,
    config: Config,
    catalogue: Catalogue,
) -> Result<(), Box<dyn std::error::Error>> {
    let browser = darkroom::preview::Browser::new(backend, config, catalogue);
    darkroom::gui::run(browser)?;
    Ok(())
}

#[cfg(not(feature = "gui"))]
fn run_gui(
    _backend: RustBackend,
    _config: Config,
    _catalogue: Catalogue,
) -> Result<(), Box<dyn std::error::Error>> {
    Err("darkroom was built without the `gui` feature".into())
}
