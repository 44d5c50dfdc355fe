use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for the shape viewer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, deny, doc, smoke
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Run cargo deny check
    Deny,
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
    /// Lay out sample shapes headless and print the draw transcript
    Smoke,
    /// Regenerate the quarter fragment JSON files
    Fragments {
        /// Output directory
        #[arg(default_value = "assets/quarters")]
        dir: String,
    },
}

const SMOKE_SHAPES: [&str; 3] = ["CuCuCuCu", "RrRr--Rr:cwcwcwcw", "SgSgSgSg:P-P-P-P-"];

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            fmt()?;
            clippy()?;
            test()?;
            deny()?;
            doc()?;
            smoke()?;
        }
        Commands::Fmt => fmt()?,
        Commands::Clippy => clippy()?,
        Commands::Test => test()?,
        Commands::Deny => deny()?,
        Commands::Doc => doc()?,
        Commands::Build => cargo("build", &["build", "--workspace"])?,
        Commands::Smoke => smoke()?,
        Commands::Fragments { dir } => cli_tool("fragment export", &["export-fragments", &dir])?,
    }

    Ok(())
}

/// Run cargo with `args`, failing with `what` in the message.
fn cargo(what: &str, args: &[&str]) -> Result<()> {
    println!("==> cargo {}", args.join(" "));
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("{what} failed ({status})");
    }
    Ok(())
}

/// Run `shapez-cli` through cargo.
fn cli_tool(what: &str, args: &[&str]) -> Result<()> {
    let mut full = vec!["run", "--quiet", "-p", "shapez-cli", "--"];
    full.extend_from_slice(args);
    cargo(what, &full)
}

fn fmt() -> Result<()> {
    cargo("fmt check", &["fmt", "--all", "--", "--check"])
}

fn clippy() -> Result<()> {
    cargo(
        "clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
}

fn test() -> Result<()> {
    cargo("tests", &["test", "--workspace"])
}

fn deny() -> Result<()> {
    cargo("deny", &["deny", "check", "licenses", "bans", "sources"])
}

fn doc() -> Result<()> {
    cargo("doc", &["doc", "--workspace", "--no-deps"])
}

fn smoke() -> Result<()> {
    let mut args = vec!["layout", "--frames", "2"];
    for shape in SMOKE_SHAPES {
        args.extend_from_slice(&["--shape", shape]);
    }
    cli_tool("layout smoke test", &args)
}
