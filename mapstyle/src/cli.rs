//! Définition et implémentation des commandes CLI
//!
//! - `style`: style QGIS (.qml) → couches du moteur de rendu
//! - `reproject`: GeoJSON → GeoJSON dans un autre CRS
//! - `paint`: règles utilisateur → propriétés `paint`
//! - `inspect`: CRS, emprise et champs d'un GeoJSON

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Subcommand;
use geojson::GeoJson;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use mapstyle::config::Config;
use mapstyle::crs::{self, CrsId};
use mapstyle::paint::{LayerPaint, LayerStyle};
use mapstyle::pipeline::MapPipeline;
use mapstyle::reproject_lite::{lookup, ReprojectorLite};
use mapstyle::{document, reproject};

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a QGIS style (.qml) into renderer layers
    Style {
        /// Path to the .qml file
        #[arg(short, long)]
        path: PathBuf,

        /// Source id used in layer ids (default: file stem)
        #[arg(short, long)]
        source: Option<String>,

        /// Output JSON file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Reproject a GeoJSON document
    Reproject {
        /// Path to the GeoJSON file
        #[arg(short, long)]
        path: PathBuf,

        /// Source CRS (default: detected from the document)
        #[arg(long)]
        from: Option<CrsId>,

        /// Target CRS (default: target_crs of the configuration)
        #[arg(long)]
        to: Option<CrsId>,

        /// Output GeoJSON file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build the paint properties of a layer from user rules
    Paint {
        /// Layer style JSON (booleanStyles, textCategories, rules)
        #[arg(short, long)]
        rules: Option<PathBuf>,

        /// GeoJSON data: seeds default rules and reports colors per feature
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Output JSON file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show CRS, bounds and fields of a GeoJSON document
    Inspect {
        /// Path to the GeoJSON file
        #[arg(short, long)]
        path: PathBuf,
    },
}

/// Résout `--config`: nom de preset ou chemin vers un JSON
pub fn resolve_config(preset_or_path: &str) -> Result<Config> {
    let mut config = match preset_or_path {
        "default" | "mercator" => Config::from_preset(preset_or_path)?,
        path => Config::load(Path::new(path))?,
    };
    config.apply_env()?;
    Ok(config)
}

/// Écrit `value` en JSON dans `output`, ou sur stdout
fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
            info!(output = %path.display(), "Fichier écrit");
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, value)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

fn read_document(path: &Path) -> Result<GeoJson> {
    let data = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    document::load_bytes(&data).with_context(|| format!("Invalid GeoJSON: {}", path.display()))
}

/// Exécute la commande style
pub fn cmd_style(
    config: Config,
    path: &Path,
    source: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let source_id = match source {
        Some(id) => id.to_string(),
        None => path
            .file_stem()
            .and_then(|s| s.to_str())
            .context("Cannot derive a source id from the file name, use --source")?
            .to_string(),
    };

    let pipeline = MapPipeline::new(config);
    let loaded = pipeline.load_style_file(path, &source_id);

    for warning in &loaded.warnings {
        warn!(%warning, "Règle ignorée");
    }
    if let Some(error) = &loaded.fallback {
        warn!(%error, "Symbologie par défaut utilisée");
    }

    let warnings: Vec<String> = loaded.warnings.iter().map(ToString::to_string).collect();
    let report = json!({
        "source": loaded.definition.source_id,
        "fallback": loaded.fallback.as_ref().map(ToString::to_string),
        "warnings": warnings,
        "layers": loaded.definition.layers,
    });

    write_json(&report, output)
}

/// Exécute la commande reproject
pub fn cmd_reproject(
    config: Config,
    path: &Path,
    from: Option<CrsId>,
    to: Option<CrsId>,
    output: Option<&Path>,
) -> Result<()> {
    let doc = read_document(path)?;

    let from = from.unwrap_or_else(|| crs::detect(&doc));
    let to = to.unwrap_or(config.target_crs);

    if from != to && !ReprojectorLite::is_supported(&from, &to) {
        bail!(
            "Unsupported reprojection {} → {} (registered: {})",
            from,
            to,
            mapstyle::reproject_lite::REGISTRY
                .iter()
                .map(|def| format!("EPSG:{}", def.code))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    info!(from = %from, to = %to, "Reprojection");
    let reprojected = reproject::reproject(&doc, &from, &to);
    write_json(&*reprojected, output)
}

/// Exécute la commande paint
pub fn cmd_paint(
    config: Config,
    rules: Option<&Path>,
    data: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let doc = data.map(read_document).transpose()?;

    let style = match (rules, &doc) {
        (Some(path), _) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str::<LayerStyle>(&content)
                .with_context(|| format!("Invalid layer style: {}", path.display()))?
        }
        (None, Some(doc)) => LayerStyle::for_document(doc, &config),
        (None, None) => LayerStyle::from_config(&config),
    };

    let paint = LayerPaint::from_style(&style);

    if let Some(GeoJson::FeatureCollection(fc)) = &doc {
        let expression = style.fill_color();
        let empty = geojson::JsonObject::new();
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for feature in &fc.features {
            let properties = feature.properties.as_ref().unwrap_or(&empty);
            *counts.entry(expression.evaluate(properties)).or_default() += 1;
        }
        for (color, count) in &counts {
            info!(color, count, "Features par couleur");
        }
    }

    write_json(&paint, output)
}

/// Exécute la commande inspect
pub fn cmd_inspect(path: &Path) -> Result<()> {
    let doc = read_document(path)?;

    let detected = crs::detect(&doc);
    let fields = document::discover_fields(&doc);
    let bounds = document::bounds(&doc).map(|rect| {
        json!([rect.min().x, rect.min().y, rect.max().x, rect.max().y])
    });
    let features = match &doc {
        GeoJson::FeatureCollection(fc) => fc.features.len(),
        GeoJson::Feature(_) => 1,
        GeoJson::Geometry(_) => 0,
    };

    let report = json!({
        "crs": detected.to_string(),
        "crs_title": lookup(&detected).map(|def| def.title),
        "supported": lookup(&detected).is_some(),
        "features": features,
        "bounds": bounds,
        "fields": fields.fields,
        "boolean_fields": fields.boolean_fields,
        "text_fields": fields.text_fields,
    });

    write_json(&report, None)
}
