use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use sfi_inp::format_value;
use sfi_io::{AssemblyModel, ConfigError, FileRuleLoader, IoError, RuleLoader, RunConfig, variant_file_name};
use sfi_model::{ScaleRange, assign_stresses, characterize};
use tracing::error;
use tracing_subscriber::EnvFilter;

const START_BANNER: &str = "=== STRESS INPUT START ===";
const FINISH_BANNER: &str = "=== STRESS INPUT FINISHED ===";

#[derive(Parser)]
#[command(name = "sfi-cli", version, about = "Generate initial-stress input decks for a scale sweep")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Categorize the mesh and write one deck per scale factor
    Generate(GenerateArgs),
    /// Print the categories and stresses a rule script produces, as JSON
    Inspect {
        deck: PathBuf,
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// Print the scale factors of a sweep
    Scales {
        #[arg(long, default_value_t = 1)]
        count: usize,
        #[arg(long, default_value_t = 1.0)]
        min: f64,
        #[arg(long, default_value_t = 1.0)]
        max: f64,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// JSON run configuration; flags override its fields
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    deck: Option<PathBuf>,
    #[arg(long)]
    rules: Option<PathBuf>,
    #[arg(long)]
    job: Option<String>,
    #[arg(long)]
    count: Option<usize>,
    #[arg(long)]
    min: Option<f64>,
    #[arg(long)]
    max: Option<f64>,
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Write the merged configuration here before running
    #[arg(long)]
    save_config: Option<PathBuf>,
}

impl GenerateArgs {
    fn into_config(self) -> Result<(RunConfig, Option<PathBuf>), IoError> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };
        if let Some(deck) = self.deck {
            config.deck = deck;
        }
        if let Some(rules) = self.rules {
            config.rules = Some(rules);
        }
        if let Some(job) = self.job {
            config.job_name = job;
        }
        if let Some(count) = self.count {
            config.scale_count = count;
        }
        if let Some(min) = self.min {
            config.scale_min = min;
        }
        if let Some(max) = self.max {
            config.scale_max = max;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        Ok((config, self.save_config))
    }
}

fn generate(args: GenerateArgs) -> Result<(), IoError> {
    let (config, save_to) = args.into_config()?;
    if let Some(path) = save_to {
        config.save(&path)?;
    }
    let loader = config.rule_loader()?;

    let outcome = sfi_io::run(&config, &loader)?;
    for variant in &outcome.variants {
        println!("{}\t{}\t{}", variant.job_name, format_value(variant.scale), variant.path.display());
    }
    if !outcome.stress.defaulted.is_empty() {
        println!("zero stress: {}", outcome.stress.defaulted.join(", "));
    }
    println!("manifest: {}", outcome.manifest_path.display());
    Ok(())
}

fn inspect(deck: &Path, rules: Option<&Path>) -> Result<(), IoError> {
    let model = AssemblyModel::read_file(deck)?;
    let instances = model.instance_meshes()?;
    let script = rules.map(|path| FileRuleLoader::new(path).load()).transpose()?;

    let classifier = script.as_deref().and_then(|script| script.classifier());
    let mut mesh = characterize(&instances, classifier).map_err(|err| IoError::NoMeshData(err.to_string()))?;
    if let Some(stress) = script.as_deref().and_then(|script| script.stress_function()) {
        assign_stresses(&mut mesh, Some(stress));
    }

    println!("{}", serde_json::to_string_pretty(&mesh.summary())?);
    Ok(())
}

fn scales(count: usize, min: f64, max: f64) -> Result<(), IoError> {
    let range = ScaleRange::new(count, min, max).map_err(ConfigError::from)?;
    for (i, scale) in range.factors().into_iter().enumerate() {
        println!("{}\t{}\t{}", i + 1, format_value(scale), variant_file_name(scale));
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Generate(args) => {
            println!("{START_BANNER}");
            let result = generate(args);
            if let Err(err) = &result {
                error!("{err}");
            }
            println!("{FINISH_BANNER}");
            return exit_code(&result);
        }
        Command::Inspect { deck, rules } => inspect(&deck, rules.as_deref()),
        Command::Scales { count, min, max } => scales(count, min, max),
    };

    if let Err(err) = &result {
        eprintln!("error: {err}");
    }
    exit_code(&result)
}

fn exit_code(result: &Result<(), IoError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(IoError::Config(_)) => ExitCode::from(2),
        Err(_) => ExitCode::from(1),
    }
}
