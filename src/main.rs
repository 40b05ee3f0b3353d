use anyhow::Result;
use clap::Parser;
use relcat::commands::{self, BuildOptions};
use std::path::PathBuf;

/// relcat - release catalog generator
///
/// Sort the releases of a repository into a configurable category tree and
/// publish them as a static page.
///
/// If the GITHUB_TOKEN environment variable is set, it will be used for authentication.
/// This is useful for accessing private repositories or avoiding rate limits.
///
/// Examples:
///   relcat fetch owner/repo --output releases.json
///   relcat build relcat.yaml --releases releases.json
///   relcat check relcat.yaml
#[derive(Parser, Debug)]
#[command(author, version = env!("RELCAT_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    pub api_url: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Classify releases and write the site
    Build(BuildArgs),

    /// Fetch all releases of a repository into a cache file
    Fetch(FetchArgs),

    /// Validate a configuration file and print its category outline
    Check(CheckArgs),
}

#[derive(clap::Args, Debug)]
pub struct BuildArgs {
    /// Site configuration file (YAML)
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,

    /// Read releases from a cache file written by `relcat fetch`
    #[arg(long, value_name = "FILE")]
    pub releases: Option<PathBuf>,

    /// Repository to fetch releases from, overriding `repo` in the configuration
    #[arg(long, value_name = "OWNER/REPO")]
    pub repo: Option<String>,

    /// Output directory
    #[arg(long, short = 'o', value_name = "DIR", default_value = "site")]
    pub output: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct FetchArgs {
    /// The GitHub repository in the format "owner/repo"
    #[arg(value_name = "OWNER/REPO")]
    pub repo: String,

    /// Cache file to write
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Site configuration file (YAML)
    #[arg(value_name = "CONFIG")]
    pub config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = relcat::runtime::RealRuntime;

    match cli.command {
        Commands::Build(args) => {
            let options = BuildOptions {
                config_path: args.config,
                releases: args.releases,
                repo: args.repo,
                output: args.output,
            };
            commands::build(runtime, options, cli.api_url).await?
        }
        Commands::Fetch(args) => {
            commands::fetch(runtime, &args.repo, &args.output, cli.api_url).await?
        }
        Commands::Check(args) => commands::check(&runtime, &args.config)?,
    }
    Ok(())
}
