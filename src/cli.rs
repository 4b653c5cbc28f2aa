use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glam::Vec3;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::MorphConfig;
use crate::engine::MorphEngine;
use crate::focal::FocalTransform;
use crate::morph::MorphState;
use crate::perf_profiling;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the engine headless and emit one JSON line per frame
    Simulate {
        /// Config JSON file. Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of frames to run
        #[arg(long, default_value_t = 600)]
        frames: u32,

        /// Frames per second
        #[arg(long, default_value_t = 60.0)]
        fps: f32,

        /// Toggle the morph state before this frame (repeatable)
        #[arg(long = "toggle-at")]
        toggle_at: Vec<u32>,

        /// Dataset seed (overrides the config)
        #[arg(long)]
        seed: Option<u64>,

        /// Write frame lines here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,

        /// Write the final buffers as raw f32 files into this directory
        #[arg(long)]
        dump_dir: Option<PathBuf>,

        /// Log frame timings and periodic stats
        #[arg(long)]
        profile: bool,
    },
    /// Print the default configuration as JSON
    Config,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            config,
            frames,
            fps,
            toggle_at,
            seed,
            out,
            dump_dir,
            profile,
        } => {
            let mut config = match config {
                Some(path) => MorphConfig::from_file(&path)?,
                None => MorphConfig::default(),
            };
            if seed.is_some() {
                config.seed = seed;
            }
            perf_profiling::set_profiling_enabled(profile);

            let sink: Box<dyn Write> = match &out {
                Some(path) => Box::new(std::io::BufWriter::new(
                    std::fs::File::create(path)
                        .with_context(|| format!("Failed to create {:?}", path))?,
                )),
                None => Box::new(std::io::stdout().lock()),
            };

            let engine = simulate(config, frames, fps, &toggle_at, sink)?;

            if let Some(dir) = dump_dir {
                dump_buffers(&engine, &dir)?;
            }
        }
        Commands::Config => {
            let json = serde_json::to_string_pretty(&MorphConfig::default())?;
            println!("{}", json);
        }
    }
    Ok(())
}

/// One line of simulation output.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameRecord {
    pub frame: u32,
    pub time: f32,
    pub state: MorphState,
    pub progress: f32,
    pub eased: f32,
    pub focal: FocalTransform,
    /// Mean instance position per class, plus dust.
    pub centroids: Vec<ClassCentroid>,
}

#[derive(Debug, Serialize)]
pub struct ClassCentroid {
    pub class: &'static str,
    pub centroid: [f32; 3],
}

/// Summarize the engine's current buffers.
pub fn frame_record(engine: &MorphEngine, frame: u32) -> FrameRecord {
    let mut centroids: Vec<ClassCentroid> = engine
        .instance_buffers()
        .iter()
        .map(|buffer| ClassCentroid {
            class: buffer.class().name(),
            centroid: mean(buffer.instances().iter().map(|i| i.translation())).to_array(),
        })
        .collect();

    let dust = engine
        .dust_positions()
        .chunks_exact(3)
        .map(Vec3::from_slice);
    centroids.push(ClassCentroid {
        class: "dust",
        centroid: mean(dust).to_array(),
    });

    FrameRecord {
        frame,
        time: engine.elapsed(),
        state: engine.state(),
        progress: engine.progress(),
        eased: engine.eased_progress(),
        focal: engine.focal_transform(),
        centroids,
    }
}

fn mean(points: impl Iterator<Item = Vec3>) -> Vec3 {
    let (sum, n) = points.fold((Vec3::ZERO, 0usize), |(sum, n), p| (sum + p, n + 1));
    if n == 0 {
        Vec3::ZERO
    } else {
        sum / n as f32
    }
}

/// Run `frames` frames, toggling before each frame listed in `toggle_at`.
pub fn simulate(
    config: MorphConfig,
    frames: u32,
    fps: f32,
    toggle_at: &[u32],
    mut sink: impl Write,
) -> Result<MorphEngine> {
    anyhow::ensure!(
        fps.is_finite() && fps > 0.0,
        "FPS must be a positive finite number, got {}",
        fps
    );
    let mut engine = MorphEngine::new(config).context("Failed to initialize engine")?;
    let dt = 1.0 / fps;

    log::info!("Simulating {} frames at {} fps", frames, fps);

    for frame in 0..frames {
        for _ in toggle_at.iter().filter(|&&f| f == frame) {
            engine.toggle();
        }

        engine.frame(frame as f32 * dt);

        let line = serde_json::to_string(&frame_record(&engine, frame))?;
        writeln!(sink, "{}", line)?;
    }
    sink.flush()?;

    Ok(engine)
}

/// Write every instance buffer and the dust buffer as raw little-endian f32.
pub fn dump_buffers(engine: &MorphEngine, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;

    for buffer in engine.instance_buffers() {
        let path = dir.join(format!("{}.bin", buffer.class().name()));
        std::fs::write(&path, buffer.as_bytes())
            .with_context(|| format!("Failed to write {:?}", path))?;
    }

    let path = dir.join("dust.bin");
    std::fs::write(&path, bytemuck::cast_slice::<f32, u8>(engine.dust_positions()))
        .with_context(|| format!("Failed to write {:?}", path))?;

    log::info!("Wrote buffers to {:?}", dir);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParticleCounts;

    fn config() -> MorphConfig {
        MorphConfig {
            counts: ParticleCounts {
                needle: 20,
                ornament: 3,
                cube: 6,
                spark: 9,
                dust: 12,
            },
            seed: Some(1),
            ..MorphConfig::default()
        }
    }

    #[test]
    fn test_simulate_writes_one_line_per_frame() {
        let mut out = Vec::new();
        let engine = simulate(config(), 10, 60.0, &[0], &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 10);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["state"], "treeShape");
        assert_eq!(first["centroids"].as_array().unwrap().len(), 5);
        assert_eq!(engine.frame_count(), 10);
    }

    #[test]
    fn test_simulate_rejects_bad_config() {
        let mut bad = config();
        bad.counts.spark = 0;
        assert!(simulate(bad, 1, 60.0, &[], std::io::sink()).is_err());
    }

    #[test]
    fn test_simulate_rejects_bad_fps() {
        for fps in [0.0, -30.0, f32::NAN, f32::INFINITY] {
            let mut out = Vec::new();
            assert!(simulate(config(), 2, fps, &[], &mut out).is_err(), "fps {}", fps);
            assert!(out.is_empty());
        }
    }

    #[test]
    fn test_focal_fields_are_camel_case() {
        let mut out = Vec::new();
        simulate(config(), 1, 60.0, &[], &mut out).unwrap();
        let line: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert!(line["focal"]["rotationY"].is_number());
        assert!(line["focal"].get("rotation_y").is_none());
    }

    #[test]
    fn test_mean_of_empty_is_zero() {
        assert_eq!(mean(std::iter::empty()), Vec3::ZERO);
    }
}
