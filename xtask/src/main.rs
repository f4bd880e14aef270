use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for arbor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Format check, clippy and tests
    Check,
    /// Run all tests
    Test,
    /// Run the traversal benchmark in release mode
    Bench,
    /// Render the demo scene and print the backend transcript
    Demo {
        /// Number of meshes in the demo row
        #[arg(long, default_value = "8")]
        meshes: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            cargo("fmt check", &["fmt", "--all", "--", "--check"])?;
            cargo("clippy", &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"])?;
            cargo("tests", &["test", "--workspace"])?;
        }
        Commands::Test => cargo("tests", &["test", "--workspace"])?,
        Commands::Bench => cargo(
            "traversal bench",
            &["bench", "-p", "arbor-scene", "--bench", "bench_traversal"],
        )?,
        Commands::Demo { meshes } => {
            let meshes = meshes.to_string();
            cargo(
                "demo",
                &["run", "-p", "arbor-cli", "--", "demo", "--transcript", "--meshes", &meshes],
            )?;
        }
    }

    Ok(())
}

fn cargo(label: &str, args: &[&str]) -> Result<()> {
    println!("==> Running {label}: cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{label} failed");
    }
    Ok(())
}
