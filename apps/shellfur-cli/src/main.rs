use clap::{Parser, Subcommand, ValueEnum};
use glam::Vec3;
use shellfur_assets::{Material, Mesh, SHELL_SHADER};
use shellfur_common::Transform;
use shellfur_input::InputSample;
use shellfur_render::{DebugTextRenderer, RenderView, Renderer};
use shellfur_shell::{FurConfig, ParameterField, ShellFur, Stage};
use shellfur_tools::FurInspector;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shellfur-cli", about = "Headless tools for shell-textured fur")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum BaseMesh {
    Plane,
    Sphere,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version, parameter ranges and defaults
    Info,
    /// Load a fur config and print it after clamping
    Params {
        /// YAML or JSON fur config; defaults when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Run a headless frame loop and print the resulting surfaces
    Simulate {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of frames to run
        #[arg(short, long, default_value = "60")]
        frames: u32,
        /// Seconds per frame
        #[arg(long, default_value = "0.016666668")]
        dt: f32,
        /// Held input as "x,y,z", each -1, 0 or 1
        #[arg(short, long, default_value = "0,0,0", value_parser = parse_axes)]
        input: InputSample,
        #[arg(long, value_enum, default_value = "sphere")]
        mesh: BaseMesh,
        /// List every shell after the run
        #[arg(long)]
        shells: bool,
    },
}

fn parse_axes(s: &str) -> Result<InputSample, String> {
    let parts: Vec<i32> = s
        .split(',')
        .map(|p| p.trim().parse::<i32>().map_err(|e| format!("{p:?}: {e}")))
        .collect::<Result<_, _>>()?;
    match parts.as_slice() {
        [x, y, z] => Ok(InputSample::from_axes(*x, *y, *z)),
        _ => Err(format!("expected three comma separated axes, got {s:?}")),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<FurConfig> {
    Ok(match path {
        Some(path) => FurConfig::load(path)?,
        None => FurConfig::default(),
    })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("shellfur-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("shader: {SHELL_SHADER}");
            println!("decay rate: {}", shellfur_shell::DEFAULT_DECAY_RATE);
            let defaults = FurConfig::default().params;
            for field in ParameterField::ALL {
                let (min, max) = field.range();
                println!(
                    "{:<28} {:>8} in [{min}, {max}]",
                    field.key(),
                    field.get(&defaults)
                );
            }
        }
        Commands::Params { config } => {
            let config = load_config(config.as_deref())?;
            print!("{}", config.to_yaml()?);
        }
        Commands::Simulate {
            config,
            frames,
            dt,
            input,
            mesh,
            shells,
        } => {
            let config = load_config(config.as_deref())?;
            let mut stage = Stage::new();
            let owner = stage.scene.spawn(Transform::default());
            let mesh = stage.assets.register_mesh(match mesh {
                BaseMesh::Plane => Mesh::plane(2.0, 8),
                BaseMesh::Sphere => Mesh::uv_sphere(1.0, 32, 16),
            });
            let material = stage
                .assets
                .register_material(Material::from_shader(SHELL_SHADER));

            let mut fur = ShellFur::from_config(owner, &config, Some(mesh), Some(material));
            fur.on_activate(&mut stage)?;
            tracing::info!(shells = fur.instances().len(), "fur active");
            println!(
                "Simulating {frames} frames at dt={dt} with input {:?}",
                input.axes().to_array()
            );

            for _ in 0..frames {
                fur.update(&mut stage, &input, dt);
                stage.scene.step(dt);
                stage.drain_events();
            }

            let body = stage
                .scene
                .world_transform(owner)
                .map(|t| t.position)
                .unwrap_or(Vec3::ZERO);
            let view = RenderView {
                eye: body + Vec3::new(0.0, 1.5, 3.0),
                target: body,
                ..RenderView::default()
            };
            print!(
                "{}",
                DebugTextRenderer::new().render(&stage.scene, &stage.surfaces, &view)
            );
            println!("{}", FurInspector::summary(&fur, &stage));
            if shells {
                for info in FurInspector::list_shells(&fur, &stage) {
                    println!("{info}");
                }
            }

            fur.on_deactivate(&mut stage);
            println!(
                "After deactivate: nodes={} tagged={}",
                stage.scene.node_count(),
                stage.surfaces.instance_tags().len()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_axes_accepts_three_values() {
        let sample = parse_axes("1, 0,-1").unwrap();
        assert_eq!(sample.axes().to_array(), [1, 0, -1]);
        assert_eq!(parse_axes("5,0,0").unwrap().axes().to_array(), [1, 0, 0]);
    }

    #[test]
    fn parse_axes_rejects_bad_input() {
        assert!(parse_axes("1,0").is_err());
        assert!(parse_axes("a,b,c").is_err());
    }
}
