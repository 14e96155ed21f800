//! Antennae CLI — runs the genetic placement search over a population dataset

use anyhow::{Context, Result};
use antennae::report::{summarize, RunSummary};
use antennae::{GaConfig, GeneticEngine, GeoGrid};
use clap::{Args, Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser)]
#[command(name = "antennae", version, about = "Genetic antenna placement over population grids")]
struct Cli {
    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(long, short, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the genetic search
    Run(RunArgs),
    /// Summarize a dataset without running the search
    Inspect {
        /// Population CSV (columns N, E, populations, countries)
        #[arg(long)]
        data: PathBuf,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Population CSV (columns N, E, populations, countries)
    #[arg(long)]
    data: PathBuf,

    /// YAML configuration; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    seed: Option<u64>,

    /// Individuals per generation
    #[arg(long)]
    population: Option<usize>,

    /// Antennae per individual
    #[arg(long)]
    antennae: Option<usize>,

    #[arg(long)]
    generations: Option<usize>,

    /// Nearest weighted points served by each antenna
    #[arg(long)]
    k_neighbors: Option<usize>,

    #[arg(long)]
    p_crossover: Option<f64>,

    #[arg(long)]
    p_mutation: Option<f64>,

    #[arg(long)]
    mutation_std: Option<f64>,

    /// Number of evenly spaced generations whose best layout is reported
    #[arg(long, default_value_t = 5)]
    snapshots: usize,
}

impl RunArgs {
    fn config(&self) -> Result<GaConfig> {
        let mut config = match &self.config {
            Some(path) => GaConfig::from_yaml_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => GaConfig::default(),
        };
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(v) = self.population {
            config.population_size = v;
        }
        if let Some(v) = self.antennae {
            config.n_antennae = v;
        }
        if let Some(v) = self.generations {
            config.n_generations = v;
        }
        if let Some(v) = self.k_neighbors {
            config.k_neighbors = v;
        }
        if let Some(v) = self.p_crossover {
            config.p_crossover = v;
        }
        if let Some(v) = self.p_mutation {
            config.p_mutation = v;
        }
        if let Some(v) = self.mutation_std {
            config.mutation_std = v;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Run(args) => run(args, &cli.format),
        Commands::Inspect { data } => inspect(data),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(args: &RunArgs, format: &OutputFormat) -> Result<()> {
    let config = args.config()?;
    let grid = GeoGrid::from_csv_path(&args.data)
        .with_context(|| format!("loading dataset {}", args.data.display()))?;
    let index = Arc::new(grid.build_index()?);

    info!(
        "Running {} individuals of {} antennae each for {} generations",
        config.population_size, config.n_antennae, config.n_generations
    );

    let mut engine = GeneticEngine::from_config(config, index)?;
    engine.run()?;
    let summary = summarize(&engine, args.snapshots)?;

    match format {
        OutputFormat::Json => println!("{}", summary.to_json()?),
        OutputFormat::Csv => print_csv(&summary),
        OutputFormat::Table => print_table(&summary),
    }
    Ok(())
}

fn inspect(data: &Path) -> Result<()> {
    let grid = GeoGrid::from_csv_path(data)
        .with_context(|| format!("loading dataset {}", data.display()))?;
    let index = grid.build_index()?;
    let domestic = grid.records().iter().filter(|r| r.is_domestic()).count();
    let domestic_weight: f64 = grid
        .records()
        .iter()
        .zip(index.weights())
        .filter(|(r, _)| r.is_domestic())
        .map(|(_, w)| w)
        .sum();

    println!("Records:          {}", grid.len());
    println!("Domestic records: {}", domestic);
    println!("Foreign records:  {}", grid.len() - domestic);
    println!("Domestic weight:  {:.4}", domestic_weight);
    let domain = index.domain();
    println!("Domain:           {:.4} x {:.4}", domain.x_max, domain.y_max);
    Ok(())
}

fn print_csv(summary: &RunSummary) {
    println!("generation,max_fitness,mean_fitness,std_fitness,crossover_count");
    for r in &summary.generations {
        println!(
            "{},{},{},{},{}",
            r.generation, r.max_fitness, r.mean_fitness, r.std_fitness, r.crossover_count
        );
    }
}

fn print_table(summary: &RunSummary) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Generation", "Max", "Mean", "Std", "Crossovers"]);
    for r in &summary.generations {
        table.add_row(vec![
            r.generation.to_string(),
            format!("{:.4}", r.max_fitness),
            format!("{:.4}", r.mean_fitness),
            format!("{:.4}", r.std_fitness),
            r.crossover_count.to_string(),
        ]);
    }
    println!("{}", table);

    for layout in &summary.snapshots {
        println!(
            "Generation {}: best individual #{} covers {:.4}",
            layout.generation.unwrap_or_default(),
            layout.individual,
            layout.fitness
        );
    }

    let best = &summary.final_best;
    println!("\nFinal population: best individual #{} covers {:.4}", best.individual, best.fitness);
    for (i, [x, y]) in best.antennae.iter().enumerate() {
        println!("  antenna {:>3}: ({:.4}, {:.4})", i, x, y);
    }
}
