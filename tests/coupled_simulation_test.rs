//! Integration tests for the coupled driver.
//!
//! A tidal channel is driven from its western end with level, waves,
//! temperature and sediment; the run is configured from a TOML file and
//! written through the binary snapshot writer.

use std::io::Write;
use std::sync::Arc;

use approx::assert_relative_eq;
use coastal_fem::boundary::{Constant, PhysicsKey, shared};
use coastal_fem::io::read_snapshot;
use coastal_fem::{
    BinarySnapshotWriter, BoundaryConditionTable, CoupledSimulation, MemorySink, ModelConfig,
    Snapshot, TriMesh,
};

const CONFIG: &str = r#"
[current]
watt = 0.05
friction_law = "strickler"
strickler_kst = 40.0

[heat]
equilibrium_temperature = 15.0

[waves]
breaker_index = 0.73

[simulation]
sediment = true
heat = true
waves = true
groundwater = true
output_interval = 30.0
"#;

fn channel() -> Arc<TriMesh> {
    Arc::new(
        TriMesh::uniform_rectangle(0.0, 1000.0, 0.0, 200.0, 10, 2).with_bathymetry(|_, _| -5.0),
    )
}

fn western_boundary(mesh: &TriMesh) -> BoundaryConditionTable {
    let mut table = BoundaryConditionTable::new();
    for i in 0..mesh.n_nodes() {
        if mesh.node(i).x == 0.0 {
            table.push(i, PhysicsKey::WaterLevel, shared(Constant(0.1)));
            table.push(i, PhysicsKey::Temperature, shared(Constant(20.0)));
            table.push(i, PhysicsKey::Concentration, shared(Constant(0.05)));
            table.push(i, PhysicsKey::WaveHeight, shared(Constant(0.5)));
            table.push(i, PhysicsKey::WavePeriod, shared(Constant(6.0)));
            table.push(i, PhysicsKey::WaveDirection, shared(Constant(0.0)));
        }
    }
    table
}

fn load_config() -> ModelConfig {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();
    ModelConfig::from_file(file.path()).unwrap()
}

fn read_all(bytes: &[u8]) -> Vec<Snapshot> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        let (snapshot, used) = read_snapshot(&bytes[pos..]).expect("valid snapshot");
        out.push(snapshot);
        pos += used;
    }
    out
}

#[test]
fn test_config_file_selects_models() {
    let config = load_config();
    assert_eq!(config.current.watt, 0.05);
    assert!(config.simulation.waves && !config.simulation.fluid_mud);

    let mesh = channel();
    let mut table = western_boundary(&mesh);
    let sim = CoupledSimulation::new(mesh, &config, &mut table).unwrap();
    assert!(table.is_empty(), "every entry has a consumer");
    assert_eq!(
        sim.model_names(),
        vec!["waves", "current", "sediment", "heat", "groundwater"]
    );
}

#[test]
fn test_unclaimed_entries_stay_pending() {
    let mesh = channel();
    let mut table = western_boundary(&mesh);
    let sim = CoupledSimulation::new(mesh, &ModelConfig::default(), &mut table).unwrap();
    assert_eq!(sim.model_names(), vec!["current"]);
    assert!(!table.is_empty());
}

#[test]
fn test_coupled_run_exchanges_fields() {
    let config = load_config();
    let mesh = channel();
    let mut table = western_boundary(&mesh);
    let mut sim = CoupledSimulation::new(mesh.clone(), &config, &mut table).unwrap();
    sim.initial_solution(0.0).unwrap();

    let mut sink = MemorySink::new();
    let result = sim.run_until(120.0, 2.0, &mut sink).unwrap();
    assert_eq!(result.n_steps, 60);
    assert_eq!(result.n_outputs, 5);
    assert_relative_eq!(result.final_time, 120.0, epsilon = 1e-9);
    assert!(result.min_stable_dt.is_finite() && result.min_stable_dt > 0.0);

    let west = mesh.nearest_node(0.0, 100.0);
    let inner = mesh.nearest_node(100.0, 100.0);

    // Waves reach the current model
    assert_relative_eq!(sim.current().node(west).waves.height, 0.5, epsilon = 1e-9);
    // Warm, turbid water enters the channel
    let heat = sim.heat().unwrap();
    assert_relative_eq!(heat.node(west).temperature(), 20.0);
    assert!(heat.node(inner).temperature() > 15.0);
    assert_relative_eq!(sim.current().node(west).temperature, 20.0);
    let sediment = sim.sediment().unwrap();
    assert!(sediment.node(inner).concentration() > 0.0);
    // Every model uses the same clock
    assert_relative_eq!(sediment.time(), sim.time());
    assert_relative_eq!(sim.groundwater().unwrap().time(), sim.time());

    let temperatures: Vec<&Snapshot> = sink.for_model("heat").collect();
    assert_eq!(temperatures.len(), 5);
    assert_eq!(temperatures[0].time, 0.0);
    assert_eq!(temperatures[4].time, 120.0);
}

#[test]
fn test_binary_output_round_trip() {
    let config = load_config();
    let mesh = channel();
    let mut table = western_boundary(&mesh);
    let mut sim = CoupledSimulation::new(mesh.clone(), &config, &mut table).unwrap();
    sim.initial_solution(0.0).unwrap();

    let file = tempfile::tempfile().unwrap();
    let mut writer = BinarySnapshotWriter::new(file);
    sim.run_until(60.0, 2.0, &mut writer).unwrap();
    // Three output times, five models each
    assert_eq!(writer.written(), 15);
    let file = writer.into_inner().unwrap();
    drop(file);

    let path = tempfile::NamedTempFile::new().unwrap();
    let mut writer = BinarySnapshotWriter::new(std::fs::File::create(path.path()).unwrap());
    sim.write_output(&mut writer).unwrap();
    writer.into_inner().unwrap();

    let bytes = std::fs::read(path.path()).unwrap();
    let snapshots = read_all(&bytes);
    assert_eq!(snapshots.len(), 5);
    let current = snapshots.iter().find(|s| s.model == "current").unwrap();
    assert_eq!(current.variables, vec!["eta", "u", "v"]);
    assert_eq!(current.n_nodes, mesh.n_nodes());
    assert_relative_eq!(current.time, 60.0, epsilon = 1e-9);
    let eta = current.column("eta").unwrap();
    let expected: Vec<f64> = sim.current().nodes().iter().map(|n| n.eta()).collect();
    assert_eq!(eta, expected);
}
