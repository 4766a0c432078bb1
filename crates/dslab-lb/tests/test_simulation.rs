mod common;
use common::init_logger;

use dslab_lb::config::SimulationConfig;
use dslab_lb::dispatch_log::DispatchLog;
use dslab_lb::error::LbError;
use dslab_lb::policy::PolicyKind;
use dslab_lb::simulation::LoadBalancingSimulation;

fn name_wrapper(file_name: &str) -> String {
    format!("test-configs/{}", file_name)
}

#[test]
fn test_config_from_file() {
    let config = SimulationConfig::from_file(&name_wrapper("basic.yaml")).unwrap();
    assert_eq!(config.seed, 42);
    assert_eq!(config.simulation_length, 10000.);
    assert_eq!(config.cloudlet_interval, 50.);
    assert_eq!(config.evaporation_period, 500.);
    assert_eq!(config.policy, "Pheromone[evaporation=0.4]");
    assert_eq!(config.number_of_vms(), 3);

    let vms = config.vm_specs();
    assert_eq!(vms.iter().map(|vm| vm.id).collect::<Vec<_>>(), vec![0, 1, 2]);
    assert_eq!(vms[1].cores, 4);
    assert_eq!(vms[1].bandwidth, 10000);
    assert_eq!(vms[2].cores, 1);
    assert_eq!(vms[2].bandwidth, 0);
}

#[test]
fn test_config_defaults() {
    let config = SimulationConfig::from_file(&name_wrapper("partial.yaml")).unwrap();
    let default = SimulationConfig::default();
    assert_eq!(config.seed, default.seed);
    assert_eq!(config.simulation_length, default.simulation_length);
    assert_eq!(config.policy, "LeastAllocation");
    assert_eq!(config.number_of_vms(), 4);
}

#[test]
fn test_config_errors() {
    assert!(matches!(
        SimulationConfig::from_file(&name_wrapper("invalid.yaml")),
        Err(LbError::InvalidOption { .. })
    ));
    assert!(matches!(
        SimulationConfig::from_file(&name_wrapper("missing.yaml")),
        Err(LbError::Io(_))
    ));
    assert!(matches!(
        SimulationConfig::from_yaml("vms: 5"),
        Err(LbError::Yaml(_))
    ));
}

#[test]
fn test_config_rejects_endless_runs() {
    for yaml in [
        "simulation_length: .inf",
        "simulation_length: .nan",
        "cloudlet_interval: 1.0e-320",
        "cloudlet_interval: .inf",
        "cloudlet_interval: 0.0001\nsimulation_length: 1.0e+12",
        "evaporation_period: 1.0e-300",
        "evaporation_period: .inf",
    ] {
        assert!(
            matches!(SimulationConfig::from_yaml(yaml), Err(LbError::InvalidOption { .. })),
            "{}",
            yaml
        );
    }

    let config = SimulationConfig {
        simulation_length: f64::INFINITY,
        ..SimulationConfig::default()
    };
    assert!(matches!(
        LoadBalancingSimulation::new(config).err(),
        Some(LbError::InvalidOption { .. })
    ));
}

#[test]
fn test_all_policies_run() {
    init_logger();
    for kind in PolicyKind::all() {
        let config = SimulationConfig {
            policy: kind.to_string(),
            ..SimulationConfig::default()
        };
        let mut sim = LoadBalancingSimulation::new(config).unwrap();
        let stats = sim.run().unwrap();
        assert_eq!(stats.policy, kind.to_string());
        assert!(stats.cloudlets > 0);
        assert_eq!(stats.vm_cloudlets.len(), 5);
        assert_eq!(stats.vm_cloudlets.iter().sum::<u64>(), stats.cloudlets);
        assert_eq!(stats.evaporations, 60);
        assert!(stats.imbalance >= 1.);
        assert_eq!(sim.controller().policy().tracker().total(), stats.cloudlets);
    }
}

#[test]
fn test_run_reproducible_with_seed() {
    let config = SimulationConfig::from_file(&name_wrapper("basic.yaml")).unwrap();
    let traced = |config: SimulationConfig| {
        LoadBalancingSimulation::new(config)
            .unwrap()
            .with_dispatch_log(DispatchLog::new())
    };
    let mut first = traced(config.clone());
    let mut second = traced(config.clone());
    assert_eq!(first.run().unwrap(), second.run().unwrap());
    assert_eq!(
        first.controller().dispatch_log().entries(),
        second.controller().dispatch_log().entries()
    );

    let mut third = traced(SimulationConfig { seed: 43, ..config });
    third.run().unwrap();
    let first_arrival = first.controller().dispatch_log().entries()[0].timestamp;
    let third_arrival = third.controller().dispatch_log().entries()[0].timestamp;
    assert_ne!(first_arrival, third_arrival);
}

#[test]
fn test_dispatch_log_off_unless_requested() {
    let mut sim = LoadBalancingSimulation::new(SimulationConfig::default()).unwrap();
    let stats = sim.run().unwrap();
    assert!(stats.cloudlets > 0);
    assert!(!sim.controller().dispatch_log().is_enabled());
    assert!(sim.controller().dispatch_log().entries().is_empty());
}

#[test]
fn test_run_only_once() {
    let mut sim = LoadBalancingSimulation::new(SimulationConfig::default()).unwrap();
    assert!(!sim.is_finished());
    let stats = sim.run().unwrap();
    assert!(sim.is_finished());
    assert!(matches!(sim.run(), Err(LbError::RunFinished)));
    assert_eq!(sim.controller().vm_cloudlets(), stats.vm_cloudlets.as_slice());
    assert_eq!(sim.controller().policy().tracker().total(), stats.cloudlets);
}

#[test]
fn test_least_allocation_balances_evenly() {
    let config = SimulationConfig {
        policy: "LeastAllocation".to_string(),
        ..SimulationConfig::default()
    };
    let stats = LoadBalancingSimulation::new(config).unwrap().run().unwrap();
    let max = *stats.vm_cloudlets.iter().max().unwrap();
    let min = *stats.vm_cloudlets.iter().min().unwrap();
    assert!(max - min <= 1);
}

#[test]
fn test_no_evaporation() {
    let config = SimulationConfig {
        policy: "Pheromone".to_string(),
        evaporation_period: 0.,
        ..SimulationConfig::default()
    };
    let stats = LoadBalancingSimulation::new(config).unwrap().run().unwrap();
    assert_eq!(stats.evaporations, 0);
}

#[test]
fn test_empty_datacenter() {
    let config = SimulationConfig {
        vms: Vec::new(),
        ..SimulationConfig::default()
    };
    assert!(matches!(
        LoadBalancingSimulation::new(config).err(),
        Some(LbError::NoVmAvailable)
    ));
}

#[test]
fn test_dispatch_log_saved() {
    let config = SimulationConfig {
        simulation_length: 2000.,
        ..SimulationConfig::default()
    };
    let mut sim = LoadBalancingSimulation::new(config).unwrap().with_dispatch_log(DispatchLog::new());
    let stats = sim.run().unwrap();

    let path = std::env::temp_dir().join("dslab-lb-dispatch-log-test.csv");
    let path = path.to_str().unwrap();
    sim.controller().dispatch_log().save(path).unwrap();
    let content = std::fs::read_to_string(path).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("timestamp,cloudlet_id,vm,policy"));
    assert_eq!(lines.count() as u64, stats.cloudlets);
    std::fs::remove_file(path).unwrap();
}
