use clap::{Parser, Subcommand};
use tabpipe_engine::PipelineSpec;
use tabpipe_sdk::ComponentRegistry;

#[derive(Parser)]
#[command(name = "tabpipe")]
#[command(about = "Runs record pipelines: reader, filters, writer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build and execute a pipeline description.
    Run {
        #[arg(short, long)]
        config: String,
    },
    /// Build a pipeline description without executing it, surfacing
    /// configuration and composition errors.
    Validate {
        #[arg(short, long)]
        config: String,
    },
}

fn load_spec(path: &str) -> anyhow::Result<PipelineSpec> {
    Ok(serde_yaml::from_str(&std::fs::read_to_string(path)?)?)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::new().filter_or("TABPIPE_LOGLEVEL", "warn"),
    )
    .init();
    let cli = Cli::parse();

    // Engine backends register their components here; the stock binary
    // resolves pipeline descriptions against an empty registry.
    let registry = ComponentRegistry::new();

    match cli.command {
        Command::Run { config } => {
            let spec = load_spec(&config)?;
            tabpipe_engine::run_pipeline(&spec, &registry, None)?;
            println!("pipeline completed");
        }
        Command::Validate { config } => {
            let spec = load_spec(&config)?;
            tabpipe_engine::build_pipeline(&spec, &registry)?;
            println!("pipeline is valid");
        }
    }
    Ok(())
}
