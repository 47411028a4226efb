//! Point d'entrée CLI pour mapstyle

use anyhow::Result;
use clap::Parser;
use tracing::{debug, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Styles QGIS, expressions de couleur et reprojection GeoJSON
#[derive(Parser)]
#[command(name = "mapstyle")]
#[command(author, version)]
#[command(about = "Convertir des styles QGIS et préparer des couches GeoJSON pour un moteur de rendu")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Preset de configuration (default/mercator) ou chemin vers un JSON
    #[arg(long, default_value = "default", global = true)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    let config = cli::resolve_config(&cli.config)?;
    debug!(config = %cli.config, target_crs = %config.target_crs, "Configuration chargée");

    match cli.command {
        Commands::Style {
            path,
            source,
            output,
        } => cli::cmd_style(config, &path, source.as_deref(), output.as_deref())?,
        Commands::Reproject {
            path,
            from,
            to,
            output,
        } => cli::cmd_reproject(config, &path, from, to, output.as_deref())?,
        Commands::Paint {
            rules,
            data,
            output,
        } => cli::cmd_paint(config, rules.as_deref(), data.as_deref(), output.as_deref())?,
        Commands::Inspect { path } => cli::cmd_inspect(&path)?,
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // Les sorties JSON vont sur stdout: logs sur stderr
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
