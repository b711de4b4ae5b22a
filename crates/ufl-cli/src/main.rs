use clap::{Args, Parser, Subcommand};
use log::warn;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use ufl_gomory::{ClusterSpec, CutMode, EngineConfig, Instance, RunReport};

#[derive(Parser)]
#[command(name = "ufl-gomory")]
#[command(about = "Gomory cutting planes for uncapacitated facility location", long_about = None)]
struct Cli {
    /// Log progress (repeat for per-cut detail); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the cutting-plane loop on one instance
    Solve {
        /// Instance file in OR-Library UFL format
        file: PathBuf,
        /// Known optimal cost; enumerated when omitted
        #[arg(short, long)]
        reference: Option<f64>,
        #[command(flatten)]
        engine: EngineArgs,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Solve every .txt instance under a directory and summarize
    Batch {
        dir: PathBuf,
        #[command(flatten)]
        engine: EngineArgs,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Check an instance file for errors
    Check {
        /// The file to check
        file: PathBuf,
    },
    /// Generate random instance clusters
    Generate {
        /// JSON file with one cluster spec or a list of them
        #[arg(short, long)]
        config: PathBuf,
        /// Directory the cluster directories are written to
        #[arg(short, long)]
        out: PathBuf,
        #[arg(short, long, default_value_t = 0)]
        seed: u64,
    },
}

#[derive(Args)]
struct EngineArgs {
    /// JSON engine configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    max_iterations: Option<usize>,
    #[arg(long)]
    time_limit_ms: Option<u64>,
    /// Relative gap at which to stop
    #[arg(long)]
    gap: Option<f64>,
    /// Cut family (gfc, gmi, both)
    #[arg(long)]
    mode: Option<CutMode>,
    #[arg(long)]
    max_cuts: Option<usize>,
    /// Cut only the most fractional row each round
    #[arg(long)]
    single_cut: bool,
    #[arg(long)]
    tolerance: Option<f64>,
}

impl EngineArgs {
    fn to_config(&self) -> Result<EngineConfig, String> {
        let mut config = match &self.config {
            Some(path) => {
                let text = read_file(path)?;
                serde_json::from_str(&text).map_err(|e| format!("Invalid config {}: {}", path.display(), e))?
            }
            None => EngineConfig::default(),
        };
        if let Some(n) = self.max_iterations {
            config = config.with_max_iterations(n);
        }
        if let Some(ms) = self.time_limit_ms {
            config = config.with_time_limit(Duration::from_millis(ms));
        }
        if let Some(gap) = self.gap {
            config = config.with_threshold_gap(gap);
        }
        if let Some(mode) = self.mode {
            config = config.with_cut_mode(mode);
        }
        if let Some(n) = self.max_cuts {
            config = config.with_max_cuts_per_iteration(n);
        }
        if self.single_cut {
            config = config.with_batch(false);
        }
        if let Some(tol) = self.tolerance {
            config = config.with_tolerance(tol);
        }
        Ok(config)
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let result = match cli.command {
        Commands::Solve {
            file,
            reference,
            engine,
            format,
        } => solve(&file, reference, &engine, &format),
        Commands::Batch { dir, engine, format } => batch(&dir, &engine, &format),
        Commands::Check { file } => check(&file),
        Commands::Generate { config, out, seed } => generate(&config, &out, seed),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn read_file(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("Error reading {}: {}", path.display(), e))
}

fn load(path: &Path) -> Result<Instance, String> {
    Instance::from_file(path).map_err(|e| format!("{}: {}", path.display(), e))
}

fn reference_cost(instance: &Instance, given: Option<f64>) -> Result<f64, String> {
    match given {
        Some(cost) => Ok(cost),
        None => ufl_gomory::enumerate_optimum(instance)
            .map(|best| best.cost)
            .map_err(|e| format!("{}; pass --reference", e)),
    }
}

fn run(instance: &Instance, reference: f64, config: EngineConfig) -> Result<RunReport, String> {
    ufl_gomory::solve_with_cutting_planes(instance, reference, config).map_err(|e| e.to_string())
}

fn solve(file: &Path, reference: Option<f64>, engine: &EngineArgs, format: &str) -> Result<(), String> {
    let config = engine.to_config()?;
    let instance = load(file)?;
    let reference = reference_cost(&instance, reference)?;
    let report = run(&instance, reference, config)?;

    if format == "json" {
        let output = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{}", output);
        return Ok(());
    }

    println!("{}", instance);
    println!("Reference optimum: {:.4}", reference);
    println!();
    println!(
        "{:>5} {:>14} {:>12} {:>6} {:>6} {:>6} {:>9}",
        "iter", "objective", "rel. gap", "cuts", "total", "rows", "time(ms)"
    );
    for r in &report.records {
        println!(
            "{:>5} {:>14.6} {:>12.3e} {:>6} {:>6} {:>6} {:>9}",
            r.iteration, r.objective, r.relative_gap, r.cuts_added, r.total_cuts, r.num_constraints, r.elapsed_ms
        );
    }
    println!();
    println!("Status: {}", report.state.as_str().to_uppercase());
    if let Some(closure) = report.gap_closure() {
        println!("Gap closed: {:.2}%", closure * 100.0);
    }
    Ok(())
}

fn collect_instances(dir: &Path, found: &mut Vec<PathBuf>) -> Result<(), String> {
    let entries = std::fs::read_dir(dir).map_err(|e| format!("Error reading {}: {}", dir.display(), e))?;
    for entry in entries {
        let path = entry.map_err(|e| e.to_string())?.path();
        if path.is_dir() {
            collect_instances(&path, found)?;
        } else if path.extension().is_some_and(|ext| ext == "txt") {
            found.push(path);
        }
    }
    Ok(())
}

fn batch(dir: &Path, engine: &EngineArgs, format: &str) -> Result<(), String> {
    let config = engine.to_config()?;
    let mut files = Vec::new();
    collect_instances(dir, &mut files)?;
    files.sort();

    let mut rows = Vec::with_capacity(files.len());
    for file in &files {
        let outcome = load(file).and_then(|instance| {
            let reference = reference_cost(&instance, None)?;
            run(&instance, reference, config.clone())
        });
        match outcome {
            Ok(report) => rows.push((file, report)),
            Err(e) => warn!("Skipping {}", e),
        }
    }

    if format == "json" {
        let summary: Vec<_> = rows
            .iter()
            .map(|(file, report)| {
                json!({
                    "instance": file.display().to_string(),
                    "reference_optimum": report.reference_optimum,
                    "initial_gap": report.initial_gap(),
                    "final_gap": report.final_gap(),
                    "gap_closure": report.gap_closure(),
                    "total_cuts": report.total_cuts(),
                    "iterations": report.iterations(),
                    "elapsed_ms": report.elapsed_ms(),
                    "status": report.state,
                })
            })
            .collect();
        let output = serde_json::to_string_pretty(&summary).map_err(|e| e.to_string())?;
        println!("{}", output);
        return Ok(());
    }

    println!(
        "{:30} {:>11} {:>11} {:>8} {:>6} {:>6} {:>9}  status",
        "instance", "init. gap", "final gap", "closed", "cuts", "iters", "time(ms)"
    );
    for (file, report) in &rows {
        let name = file.file_name().map_or_else(|| file.display().to_string(), |n| n.to_string_lossy().into_owned());
        println!(
            "{:30} {:>11.3e} {:>11.3e} {:>7.1}% {:>6} {:>6} {:>9}  {}",
            name,
            report.initial_gap().unwrap_or(f64::NAN),
            report.final_gap().unwrap_or(f64::NAN),
            report.gap_closure().unwrap_or(0.0) * 100.0,
            report.total_cuts(),
            report.iterations(),
            report.elapsed_ms(),
            report.state
        );
    }
    println!();
    println!("{} of {} instances solved", rows.len(), files.len());
    Ok(())
}

fn check(file: &Path) -> Result<(), String> {
    match Instance::from_file(file) {
        Ok(instance) => {
            println!("✓ {} is valid", file.display());
            println!("  {} facilities", instance.num_facilities());
            println!("  {} customers", instance.num_customers());
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ {} has errors:", file.display());
            eprintln!("  {}", e);
            std::process::exit(1);
        }
    }
}

fn generate(config: &Path, out: &Path, seed: u64) -> Result<(), String> {
    let text = read_file(config)?;
    let specs: Vec<ClusterSpec> = match serde_json::from_str(&text) {
        Ok(specs) => specs,
        Err(_) => vec![serde_json::from_str(&text).map_err(|e| format!("Invalid cluster spec {}: {}", config.display(), e))?],
    };

    for (k, spec) in specs.iter().enumerate() {
        let written = ufl_gomory::write_cluster(spec, out, seed.wrapping_add(k as u64)).map_err(|e| e.to_string())?;
        println!("{}: {} instances written to {}", spec.name, written.len(), out.join(&spec.name).display());
    }
    Ok(())
}
