use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use glam::DVec3;
use raster_snap::{projection_scale, CachedSnapper, CameraState, SceneConfig, SnapBasis};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(about = "Evaluate camera raster snapping for a scene description", version)]
struct Args {
    /// Scene JSON describing the camera, tolerances and positions to snap
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    scene: PathBuf,

    /// Additional world position to snap, formatted "X,Y,Z" (repeatable)
    #[arg(long = "position", value_parser = parse_position, allow_hyphen_values = true)]
    positions: Vec<[f64; 3]>,

    /// Path to write the snapping report as JSON
    #[arg(long)]
    json_out: Option<PathBuf>,

    /// Print the camera axes alongside the basis
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Serialize)]
struct ProbeReport {
    camera: CameraSummary,
    basis: BasisReport,
    snapped: Vec<SnappedPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sprite_scale: Option<[f64; 3]>,
}

#[derive(Debug, Serialize)]
struct CameraSummary {
    position: [f64; 3],
    forward: [f64; 3],
    projection_angle_degrees: f64,
}

impl CameraSummary {
    fn from_camera(camera: &CameraState) -> Self {
        Self {
            position: camera.position.to_array(),
            forward: camera.forward().to_array(),
            projection_angle_degrees: camera.projection_angle_degrees(),
        }
    }
}

#[derive(Debug, Serialize)]
struct BasisReport {
    right: [f64; 2],
    up: [f64; 2],
    right_magnitude: f64,
    up_magnitude: f64,
}

impl From<&SnapBasis> for BasisReport {
    fn from(basis: &SnapBasis) -> Self {
        Self {
            right: basis.right.to_array(),
            up: basis.up.to_array(),
            right_magnitude: basis.right_magnitude,
            up_magnitude: basis.up_magnitude,
        }
    }
}

#[derive(Debug, Serialize)]
struct SnappedPosition {
    input: [f64; 3],
    snapped: [f64; 3],
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::init();

    run(&args)
}

fn run(args: &Args) -> Result<()> {
    let scene = SceneConfig::load(&args.scene)
        .with_context(|| format!("loading scene {}", args.scene.display()))?;
    let camera = scene
        .camera
        .to_camera_state()
        .context("building camera state")?;

    let mut snapper = CachedSnapper::new(scene.tolerances);
    snapper
        .update(&camera)
        .with_context(|| format!("computing snap basis for {}", args.scene.display()))?;
    let basis = snapper
        .basis()
        .ok_or_else(|| anyhow!("snap basis missing after successful update"))?;

    let summary = CameraSummary::from_camera(&camera);
    println!(
        "Camera at ({:.3}, {:.3}, {:.3}) pitched {:.2} degrees, viewport {}x{}",
        summary.position[0],
        summary.position[1],
        summary.position[2],
        summary.projection_angle_degrees,
        camera.viewport.width,
        camera.viewport.height
    );
    if args.verbose {
        println!("  forward {}", camera.forward());
        println!("  right   {}", camera.right());
        println!("  up      {}", camera.up());
    }
    println!(
        "Snap basis: right {} x {:e}, up {} x {:e}",
        basis.right, basis.right_magnitude, basis.up, basis.up_magnitude
    );

    let positions: Vec<DVec3> = scene
        .positions()
        .chain(args.positions.iter().copied().map(DVec3::from_array))
        .collect();
    if positions.is_empty() {
        log::info!("scene {} lists no positions to snap", args.scene.display());
    }

    let mut snapped = Vec::with_capacity(positions.len());
    for position in positions {
        let result = snapper.snap(position);
        println!("  {position} -> {result}");
        snapped.push(SnappedPosition {
            input: position.to_array(),
            snapped: result.to_array(),
        });
    }

    let sprite_scale = match scene.sprite_axis {
        Some(axis) => {
            let scale = projection_scale(axis, summary.projection_angle_degrees)
                .with_context(|| format!("scaling {axis:?} sprites"))?;
            println!("Sprite scale ({axis:?}): {scale}");
            Some(scale.to_array())
        }
        None => None,
    };

    if let Some(path) = args.json_out.as_ref() {
        let report = ProbeReport {
            camera: summary,
            basis: BasisReport::from(basis),
            snapped,
            sprite_scale,
        };
        let json = serde_json::to_string_pretty(&report).context("serializing probe report")?;
        fs::write(path, json)
            .with_context(|| format!("writing probe report to {}", path.display()))?;
        println!("Probe report written to {}", path.display());
    }

    Ok(())
}

fn parse_position(value: &str) -> Result<[f64; 3], String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let [x, y, z] = parts[..] else {
        return Err(format!("expected X,Y,Z but got {value:?}"));
    };
    let parse = |component: &str| {
        component
            .parse::<f64>()
            .map_err(|err| format!("invalid coordinate {component:?}: {err}"))
    };
    Ok([parse(x)?, parse(y)?, parse(z)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_position_accepts_signed_components() {
        assert_eq!(parse_position("1.5,-2, 3e-1"), Ok([1.5, -2.0, 0.3]));
    }

    #[test]
    fn parse_position_rejects_wrong_arity() {
        assert!(parse_position("1,2").is_err());
        assert!(parse_position("1,2,3,4").is_err());
        assert!(parse_position("a,b,c").is_err());
    }

    #[test]
    fn args_collect_repeated_positions() {
        let args = Args::try_parse_from([
            "raster_probe",
            "--scene",
            "scene.json",
            "--position",
            "0,1,2",
            "--position",
            "-3,4,-5",
        ])
        .expect("arguments parse");
        assert_eq!(args.positions, vec![[0.0, 1.0, 2.0], [-3.0, 4.0, -5.0]]);
        assert!(args.json_out.is_none());
    }
}
