//! Packcraft command-line entry point.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use packcraft_core::{DielineSpec, EditorConfig, PriceRequest, SceneGraph, generate, quote};
use packcraft_export::{ExportRequest, export, render_dieline_svg};
use std::fs;
use std::path::{Path, PathBuf};

/// Packaging design exports, dielines and price quotes
#[derive(Debug, PartialEq, Parser)]
#[command(name = "packcraft")]
#[command(about = "Packcraft packaging design tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Editor config JSON (pricing rules, snapping)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, PartialEq, Subcommand)]
enum Commands {
    /// Export a design as vector, raster or print output
    Export {
        /// Scene graph JSON
        design: PathBuf,

        /// Export request JSON
        request: PathBuf,

        /// Output file
        out: PathBuf,

        /// Dieline spec JSON to overlay as a guide layer
        #[arg(long)]
        dieline: Option<PathBuf>,
    },

    /// Generate a dieline net as SVG
    Dieline {
        /// Dieline spec JSON
        spec: PathBuf,

        /// Output file; stdout when omitted
        out: Option<PathBuf>,
    },

    /// Price a request with the configured pricing rules
    Quote {
        /// Price request JSON
        request: PathBuf,
    },
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn load_dieline(path: &Path) -> Result<packcraft_core::DielineNet> {
    let spec: DielineSpec =
        serde_json::from_str(&read(path)?).with_context(|| format!("Invalid dieline spec {}", path.display()))?;
    Ok(generate(&spec)?)
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => EditorConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EditorConfig::default(),
    };

    match cli.command {
        Commands::Export {
            design,
            request,
            out,
            dieline,
        } => {
            let graph = SceneGraph::from_json(&read(&design)?)
                .with_context(|| format!("Invalid design {}", design.display()))?;
            let request = ExportRequest::from_json(&read(&request)?)?;
            let net = dieline.as_deref().map(load_dieline).transpose()?;

            let artifact = export(&graph, &request, net.as_ref())?;
            fs::write(&out, artifact.as_bytes()).with_context(|| format!("Failed to write {}", out.display()))?;
            log::info!("Wrote {} ({} bytes)", out.display(), artifact.as_bytes().len());
        }
        Commands::Dieline { spec, out } => {
            let net = load_dieline(&spec)?;
            log::info!(
                "{} net: {:.2} x {:.2}, cut {:.2}, fold {:.2}",
                net.shape,
                net.bounds.width(),
                net.bounds.height(),
                net.cut_length(),
                net.fold_length()
            );
            let svg = render_dieline_svg(&net);
            match out {
                Some(path) => fs::write(&path, svg).with_context(|| format!("Failed to write {}", path.display()))?,
                None => print!("{svg}"),
            }
        }
        Commands::Quote { request } => {
            let request: PriceRequest = serde_json::from_str(&read(&request)?)
                .with_context(|| format!("Invalid price request {}", request.display()))?;
            let quote = quote(&request, &config.pricing)?;
            println!("{}", serde_json::to_string_pretty(&quote)?);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    log::info!("Starting Packcraft");

    run(Cli::parse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(list: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("packcraft").chain(list.iter().copied()))
    }

    #[test]
    fn test_parse_export_with_dieline() {
        let cli = parse(&["export", "d.json", "r.json", "out.pdf", "--dieline", "box.json"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Export {
                design: "d.json".into(),
                request: "r.json".into(),
                out: "out.pdf".into(),
                dieline: Some("box.json".into()),
            }
        );
        assert_eq!(cli.config, None);
    }

    #[test]
    fn test_parse_quote_with_config() {
        let cli = parse(&["--config", "c.json", "quote", "q.json"]).unwrap();
        assert_eq!(cli.config, Some("c.json".into()));
        assert_eq!(cli.command, Commands::Quote { request: "q.json".into() });

        // The config flag is global and may follow the subcommand.
        let cli = parse(&["quote", "q.json", "--config", "c.json"]).unwrap();
        assert_eq!(cli.config, Some("c.json".into()));
    }

    #[test]
    fn test_parse_dieline_optional_output() {
        let cli = parse(&["dieline", "s.json"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Dieline {
                spec: "s.json".into(),
                out: None,
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_usage() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["export", "d.json"]).is_err());
        assert!(parse(&["quote", "q.json", "--verbose"]).is_err());
        assert!(parse(&["quote", "q.json", "--dieline", "x.json"]).is_err());
        assert!(parse(&["dieline", "s.json", "--config"]).is_err());
    }

    #[test]
    fn test_run_dieline_to_file() {
        let dir = tempdir().unwrap();
        let spec = dir.path().join("spec.json");
        let out = dir.path().join("net.svg");
        fs::write(&spec, r#"{"shape": "cylinder", "width": 100, "height": 50}"#).unwrap();

        run(Cli {
            config: None,
            command: Commands::Dieline {
                spec,
                out: Some(out.clone()),
            },
        })
        .unwrap();
        assert!(fs::read_to_string(out).unwrap().contains("class=\"cut\""));
    }

    #[test]
    fn test_run_export_vector() {
        let dir = tempdir().unwrap();
        let design = dir.path().join("design.json");
        let request = dir.path().join("request.json");
        let out = dir.path().join("out.svg");
        fs::write(&design, SceneGraph::new(120.0, 80.0).to_json().unwrap()).unwrap();
        fs::write(&request, r#"{"format": "vector", "bleed": 3}"#).unwrap();

        run(Cli {
            config: None,
            command: Commands::Export {
                design,
                request,
                out: out.clone(),
                dieline: None,
            },
        })
        .unwrap();
        assert!(fs::read_to_string(out).unwrap().contains(r#"viewBox="-3 -3 126 86""#));
    }

    #[test]
    fn test_run_export_with_dieline_overlay() {
        let dir = tempdir().unwrap();
        let design = dir.path().join("design.json");
        let request = dir.path().join("request.json");
        let spec = dir.path().join("box.json");
        let out = dir.path().join("out.svg");
        fs::write(&design, SceneGraph::new(120.0, 80.0).to_json().unwrap()).unwrap();
        fs::write(&request, r#"{"format": "vector"}"#).unwrap();
        fs::write(&spec, r#"{"shape": "box", "width": 100, "height": 80, "depth": 30}"#).unwrap();

        run(Cli {
            config: None,
            command: Commands::Export {
                design,
                request,
                out: out.clone(),
                dieline: Some(spec),
            },
        })
        .unwrap();
        let svg = fs::read_to_string(out).unwrap();
        assert!(svg.contains("class=\"dieline\""));
        // The 160 x 140 net is scaled down onto the 120 x 80 canvas.
        assert!(!svg.contains("130.000"));
    }

    #[test]
    fn test_run_reports_invalid_dieline() {
        let dir = tempdir().unwrap();
        let spec = dir.path().join("spec.json");
        fs::write(&spec, r#"{"shape": "box", "width": 100, "height": 80, "depth": 0}"#).unwrap();

        let result = run(Cli {
            config: None,
            command: Commands::Dieline { spec, out: None },
        });
        assert!(result.is_err());
    }
}
