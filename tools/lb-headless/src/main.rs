use std::error::Error;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use log::info;

use dslab_lb::config::SimulationConfig;
use dslab_lb::dispatch_log::DispatchLog;
use dslab_lb::policy::PolicyKind;
use dslab_lb::simulation::{LoadBalancingSimulation, RunStats};

fn init_logger() {
    use env_logger::Builder;
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Runs cloudlet load balancing simulation without GUI
struct Args {
    /// Load balancing policy, e.g. MinMin, MaxMin[mode=busy] or Pheromone[alpha=1.5] (overrides config)
    #[arg(short, long)]
    policy: Option<String>,

    /// Path to YAML file with simulation configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run all available policies one after another
    #[arg(long, default_value_t = false)]
    all: bool,

    /// Seed of random generator (overrides config)
    #[arg(long)]
    seed: Option<u64>,

    /// Simulation length in milliseconds (overrides config)
    #[arg(long)]
    length: Option<f64>,

    /// Path to produced CSV file with dispatching decisions
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Print run statistics as JSON instead of the text summary
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Path to produced JSON file with run statistics
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn run_policy(config: &SimulationConfig, policy: &str, trace: Option<&PathBuf>) -> Result<RunStats, Box<dyn Error>> {
    info!("{}", "-".repeat(50));
    info!("Testing algorithm: {}", policy);
    info!("{}", "-".repeat(50));

    let config = SimulationConfig {
        policy: policy.to_string(),
        ..config.clone()
    };
    let dispatch_log = if trace.is_some() {
        DispatchLog::new()
    } else {
        DispatchLog::disabled()
    };
    let mut sim = LoadBalancingSimulation::new(config)?.with_dispatch_log(dispatch_log);
    let stats = sim.run()?;

    if let Some(path) = trace {
        let path = path.with_file_name(format!(
            "{}-{}.csv",
            path.file_stem().and_then(|s| s.to_str()).unwrap_or("trace"),
            policy
        ));
        sim.controller().dispatch_log().save(&path.to_string_lossy())?;
        info!("Dispatch trace saved to {}", path.display());
    }
    Ok(stats)
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logger();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_file(&path.to_string_lossy())?,
        None => SimulationConfig::new(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(length) = args.length {
        config.simulation_length = length;
    }
    if let Some(policy) = &args.policy {
        config.policy = policy.clone();
    }

    let policies: Vec<String> = if args.all {
        PolicyKind::all().iter().map(|kind| kind.to_string()).collect()
    } else {
        vec![config.policy.clone()]
    };

    info!("Starting headless simulation...");
    let mut results = Vec::with_capacity(policies.len());
    for policy in &policies {
        let stats = run_policy(&config, policy, args.trace.as_ref())?;
        if !args.json {
            println!(
                "{:<30} cloudlets: {:>6}  imbalance: {:>6.3}  per VM: {:?}",
                stats.policy, stats.cloudlets, stats.imbalance, stats.vm_cloudlets
            );
        }
        results.push(stats);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    if let Some(path) = args.output {
        File::create(path)?.write_all(serde_json::to_string_pretty(&results)?.as_bytes())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Args;

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from(["lb-headless", "--policy", "Pheromone[alpha=2]", "--json", "--seed", "7"]).unwrap();
        assert_eq!(args.policy.as_deref(), Some("Pheromone[alpha=2]"));
        assert!(args.json);
        assert_eq!(args.seed, Some(7));
        assert!(!args.all);

        let args = Args::try_parse_from(["lb-headless", "-p", "MaxMin", "-o", "stats.json"]).unwrap();
        assert_eq!(args.policy.as_deref(), Some("MaxMin"));
        assert!(!args.json);
        assert!(args.output.is_some());

        assert!(Args::try_parse_from(["lb-headless", "Pheromone"]).is_err());
    }
}
