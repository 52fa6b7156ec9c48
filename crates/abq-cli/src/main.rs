use std::path::{Path, PathBuf};
use std::process::ExitCode;

use abq_mesh::{ElementRegistry, MeshReader, Topology, create_surface_elements};
use abq_model::ModelReader;
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "abq", version, about = "Read ABAQUS .inp decks")]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print JSON instead of a text summary.
    #[arg(long, global = true)]
    json: bool,

    /// Extra element code, e.g. `USER8:8:Hex8`. Repeatable.
    #[arg(
        long = "register",
        value_name = "CODE:NODES:TOPOLOGY",
        global = true,
        value_parser = parse_registration
    )]
    register: Vec<Registration>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Nodes, elements, sets and surfaces only.
    Mesh {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Mesh plus materials, sections, loads and steps.
    Model {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Face elements of one surface.
    Surface { file: PathBuf, name: String },
}

#[derive(Debug, Clone)]
struct Registration {
    code: String,
    node_count: usize,
    topology: Topology,
}

fn parse_registration(raw: &str) -> Result<Registration, String> {
    let mut fields = raw.split(':');
    let (Some(code), Some(count), Some(topology), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(format!("expected CODE:NODES:TOPOLOGY, got `{raw}`"));
    };
    let node_count = count
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("invalid node count `{count}`"))?;
    let topology = topology.parse::<Topology>()?;
    Ok(Registration {
        code: code.trim().to_string(),
        node_count,
        topology,
    })
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "abq=debug" } else { "abq=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn registry(registrations: &[Registration]) -> ElementRegistry {
    let mut registry = ElementRegistry::builtin();
    for r in registrations {
        if r.node_count != r.topology.num_nodes() {
            tracing::warn!(
                code = %r.code,
                node_count = r.node_count,
                topology = %r.topology,
                "node count differs from topology"
            );
        }
        registry.register(&r.code, r.node_count, r.topology);
    }
    registry
}

/// Parses every file in parallel, then reports in argument order.
/// Returns the number of files that failed.
fn run_each<T, E, F, P>(files: &[PathBuf], json: bool, parse: F, print: P) -> usize
where
    T: serde::Serialize + Send,
    E: std::fmt::Display + Send,
    F: Fn(&Path) -> Result<T, E> + Sync,
    P: Fn(&T),
{
    let results: Vec<Result<T, E>> = files.par_iter().map(|path| parse(path.as_path())).collect();
    let mut failed = 0;
    for (path, result) in files.iter().zip(results) {
        match result {
            Ok(value) if json => match serde_json::to_string_pretty(&value) {
                Ok(text) => println!("{text}"),
                Err(err) => {
                    eprintln!("{}: serialization error: {err}", path.display());
                    failed += 1;
                }
            },
            Ok(value) => {
                if files.len() > 1 {
                    println!("== {} ==", path.display());
                }
                print(&value);
            }
            Err(err) => {
                eprintln!("{}: parse error: {err}", path.display());
                failed += 1;
            }
        }
    }
    failed
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let registry = registry(&cli.register);

    let failed = match &cli.command {
        Command::Mesh { files } => {
            let reader = MeshReader::new(registry);
            run_each(files, cli.json, |p| reader.read_file(p), |mesh| {
                println!("{}", mesh.summary())
            })
        }
        Command::Model { files } => {
            let reader = ModelReader::new(registry);
            run_each(files, cli.json, |p| reader.read_file(p), |model| {
                println!("{}", model.summary())
            })
        }
        Command::Surface { file, name } => {
            let reader = MeshReader::new(registry);
            let faces = reader
                .read_file(file)
                .and_then(|mesh| create_surface_elements(&mesh, name));
            match faces {
                Ok(faces) if cli.json => match serde_json::to_string_pretty(&faces) {
                    Ok(text) => {
                        println!("{text}");
                        0
                    }
                    Err(err) => {
                        eprintln!("serialization error: {err}");
                        1
                    }
                },
                Ok(faces) => {
                    for (topology, connectivity) in &faces {
                        let nodes: Vec<String> =
                            connectivity.iter().map(i32::to_string).collect();
                        println!("{topology}: {}", nodes.join(" "));
                    }
                    0
                }
                Err(err) => {
                    eprintln!("{}: {err}", file.display());
                    1
                }
            }
        }
    };

    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_registration_triplets() {
        let r = parse_registration("USER8:8:hex8").expect("registration");
        assert_eq!(r.code, "USER8");
        assert_eq!(r.node_count, 8);
        assert_eq!(r.topology, Topology::Hex8);
    }

    #[test]
    fn rejects_malformed_registrations() {
        assert!(parse_registration("USER8:8").is_err());
        assert!(parse_registration("USER8:x:Hex8").is_err());
        assert!(parse_registration("USER8:8:Blob").is_err());
    }

    #[test]
    fn cli_accepts_subcommands() {
        let cli = Cli::try_parse_from(["abq", "--json", "mesh", "a.inp", "b.inp"]).expect("args");
        assert!(cli.json);
        assert!(matches!(cli.command, Command::Mesh { ref files } if files.len() == 2));

        let cli = Cli::try_parse_from(["abq", "surface", "a.inp", "TOP", "--register", "X:3:Tri3"])
            .expect("args");
        assert_eq!(cli.register.len(), 1);
        assert!(Cli::try_parse_from(["abq", "model"]).is_err());
    }
}
