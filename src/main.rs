use clap::{Args, Parser, Subcommand};
use mdsite::{config, output, site};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mdsite", version)]
#[command(about = "Static site generator for markdown documentation")]
#[command(long_about = "\
Static site generator for markdown documentation

Your filesystem is the data source. Directories become navigation sections,
markdown files become pages, and every page gets a menu of the whole site.

Content structure:

  content/
  ├── index.md                 # → index.html
  ├── legacy.htm               # → legacy.htm (with passthrough=true)
  ├── About/
  │   └── team.md              # single page: shown as one \"About\" link
  └── Guide/
      ├── install.md           # → Guide/install.html
      └── usage.md             # → Guide/usage.html

Run 'mdsite gen-config' to generate a documented config file.")]
struct Cli {
    /// Log debug details to stderr (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Config file plus the settings that may be overridden on the command line.
#[derive(Args, Clone)]
struct ConfigArgs {
    /// Site config file (`key=value`, or TOML when it ends in .toml)
    #[arg(long, short)]
    config: PathBuf,

    /// Content directory (overrides `content`)
    #[arg(long)]
    source: Option<PathBuf>,
}

impl ConfigArgs {
    fn load(&self) -> Result<config::SiteConfig, config::ConfigError> {
        let mut config = config::load_config(&self.config)?;
        if let Some(source) = &self.source {
            config.content_root = Some(source.clone());
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Command {
    /// Generate the site
    Build {
        #[command(flatten)]
        args: ConfigArgs,

        /// Output directory (overrides `output`)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Maximum pages rendered in parallel (overrides `jobs`)
        #[arg(long, short)]
        jobs: Option<usize>,
    },
    /// Validate the config and list the content without building
    Check {
        #[command(flatten)]
        args: ConfigArgs,

        /// Print the content tree as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config file with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --verbose enables DEBUG level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Build {
            args,
            output: output_dir,
            jobs,
        } => {
            let mut site_config = args.load()?;
            if let Some(dir) = output_dir {
                site_config.output_dir = dir;
            }
            if jobs.is_some() {
                site_config.jobs = jobs;
            }

            println!("==> Building {}", site_config.output_dir.display());
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_render_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = site::build(&site_config, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let report = result?;

            println!();
            output::print_build_summary(&report);
            println!("==> Build complete: {}", report.output_dir.display());
        }
        Command::Check { args, json } => {
            let site_config = args.load()?;
            let scanned = site::scan(&site_config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&scanned.tree)?);
            } else {
                output::print_check_output(
                    &config::describe(&site_config),
                    &scanned.tree,
                    &site_config.extension_map(),
                    &scanned.collisions,
                );
                println!();
                println!("==> Content is valid");
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config());
        }
    }

    Ok(())
}
