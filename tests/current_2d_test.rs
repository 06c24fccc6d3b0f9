//! Integration tests for the current model.
//!
//! These tests verify:
//! - Still water is a fixed point of the scheme
//! - Element classification around a single wet node
//! - Velocity decay in drying areas
//! - Divergence is fatal
//! - The boundary operator is idempotent

use std::sync::Arc;

use approx::assert_relative_eq;
use coastal_fem::boundary::{Constant, Harmonic, PhysicsKey, TidalConstituent, shared};
use coastal_fem::config::CurrentConfig;
use coastal_fem::{BoundaryConditionTable, CurrentModel, FemError, FemModel, NodeIndex, TriMesh};

const WATT: f64 = 0.1;

fn current(mesh: TriMesh, table: &mut BoundaryConditionTable) -> CurrentModel {
    let config = CurrentConfig {
        watt: WATT,
        ..CurrentConfig::default()
    };
    FemModel::current(&config, Arc::new(mesh), table).unwrap()
}

fn assert_still(m: &CurrentModel, eta0: &[f64]) {
    for (i, n) in m.nodes().iter().enumerate() {
        assert!((n.eta() - eta0[i]).abs() < 1e-12, "eta drifted at node {i}: {}", n.eta());
        assert!(n.u().abs() < 1e-12, "u at node {i}: {}", n.u());
        assert!(n.v().abs() < 1e-12, "v at node {i}: {}", n.v());
    }
}

/// Flat bottom, constant level, no forcing.
#[test]
fn test_flat_bottom_still_water() {
    let mesh = TriMesh::uniform_rectangle(0.0, 1000.0, 0.0, 500.0, 10, 5)
        .with_bathymetry(|_, _| -4.0);
    let mut m = current(mesh, &mut BoundaryConditionTable::new());
    m.initial_solution(0.0);
    let eta0: Vec<f64> = m.nodes().iter().map(|n| n.eta()).collect();

    for _ in 0..50 {
        let report = m.time_step(5.0).unwrap();
        assert_eq!(report.dry_elements, 0);
    }
    assert_still(&m, &eta0);
    assert_relative_eq!(m.time(), 250.0, epsilon = 1e-9);
}

/// A sloping but fully wet bottom keeps still water at rest as well.
#[test]
fn test_sloping_bottom_still_water() {
    let mesh = TriMesh::uniform_rectangle(0.0, 1000.0, 0.0, 500.0, 10, 5)
        .with_bathymetry(|x, y| -6.0 + 0.004 * x + 0.002 * y);
    let mut m = current(mesh, &mut BoundaryConditionTable::new());
    m.initial_solution(0.0);
    let eta0: Vec<f64> = m.nodes().iter().map(|n| n.eta()).collect();

    for _ in 0..50 {
        m.time_step(5.0).unwrap();
    }
    assert_still(&m, &eta0);
}

/// One wet node surrounded by dry land.
#[test]
fn test_single_wetting_node_classification() {
    let depth = 1.05 * WATT;
    let mesh = TriMesh::uniform_rectangle(0.0, 40.0, 0.0, 40.0, 4, 4)
        .with_bathymetry(|x, y| if x == 20.0 && y == 20.0 { -depth } else { 0.5 });
    let center = mesh.nearest_node(20.0, 20.0);
    let incident: Vec<usize> = mesh.node(center).incident.iter().map(|inc| inc.element).collect();
    let mut m = current(mesh, &mut BoundaryConditionTable::new());
    m.initial_solution(0.0);

    assert_relative_eq!(m.node(center).depth, depth, epsilon = 1e-12);
    assert_eq!(m.node(center).dof.wlambda, 1.0);

    let (_, dry) = m.assemble();
    assert_eq!(dry, m.mesh().n_elements() - incident.len());
    for &e in &incident {
        assert_eq!(m.elements()[e].iwatt, 2, "element {e}");
        assert!(!m.contributions()[e].dry);
    }
}

/// Velocities inside a dry area relax towards zero.
#[test]
fn test_velocity_decays_in_dry_area() {
    let mesh = TriMesh::uniform_rectangle(0.0, 40.0, 0.0, 40.0, 4, 4).with_bathymetry(|_, _| 1.0);
    let center = mesh.nearest_node(20.0, 20.0);
    let mut m = current(mesh, &mut BoundaryConditionTable::new());
    m.initial_solution(0.0);
    m.node_mut(center).dof.q[1] = 1.0;
    m.node_mut(center).dof.q[2] = -0.5;

    let scale = CurrentConfig::default().drying_time_scale;
    let report = m.time_step(10.0).unwrap();
    assert_eq!(report.dry_elements, m.mesh().n_elements());
    assert!(report.min_stable_dt.is_infinite());
    // Forward Euler on du/dt = -u/T
    assert_relative_eq!(m.node(center).u(), 1.0 - 10.0 / scale, epsilon = 1e-12);
    assert_relative_eq!(m.node(center).v(), -0.5 * (1.0 - 10.0 / scale), epsilon = 1e-12);

    let mut previous = m.node(center).u();
    for _ in 0..10 {
        m.time_step(10.0).unwrap();
        let u = m.node(center).u();
        assert!(u < previous && u > 0.0);
        previous = u;
    }
    // Levels do not move on dry land
    assert!(m.nodes().iter().all(|n| n.eta() == 1.0));
}

#[test]
fn test_nan_is_fatal() {
    let mesh = TriMesh::uniform_rectangle(0.0, 100.0, 0.0, 100.0, 4, 4)
        .with_bathymetry(|_, _| -3.0);
    let mut m = current(mesh, &mut BoundaryConditionTable::new());
    m.initial_solution(0.0);
    m.time_step(1.0).unwrap();

    m.node_mut(0).dof.q[0] = f64::NAN;
    match m.time_step(1.0) {
        Err(FemError::Divergence {
            model,
            node,
            variable,
            time,
        }) => {
            assert_eq!(model, "current");
            assert_eq!(node, NodeIndex::new(0));
            assert_eq!(variable, "eta");
            assert_relative_eq!(time, 2.0);
        }
        other => panic!("expected divergence, got {other:?}"),
    }
    assert!(m.is_diverged());
    // Time does not advance past the failed step
    assert_relative_eq!(m.time(), 1.0);
    assert!(matches!(m.time_step(1.0), Err(FemError::Diverged { .. })));
}

#[test]
fn test_infinity_is_fatal() {
    let mesh = TriMesh::uniform_rectangle(0.0, 100.0, 0.0, 100.0, 4, 4)
        .with_bathymetry(|_, _| -3.0);
    let mut m = current(mesh, &mut BoundaryConditionTable::new());
    m.initial_solution(0.0);
    let i = m.mesh().nearest_node(50.0, 50.0);
    m.node_mut(i).dof.q[1] = f64::INFINITY;
    let err = m.time_step(1.0).unwrap_err();
    assert!(err.is_divergence());
    assert!(m.is_diverged());
}

#[test]
fn test_boundary_operator_is_idempotent() {
    let mesh = TriMesh::uniform_rectangle(0.0, 200.0, 0.0, 100.0, 4, 2)
        .with_bathymetry(|x, _| -2.0 + 0.015 * x);
    let mut table = BoundaryConditionTable::new();
    for i in 0..mesh.n_nodes() {
        let node = mesh.node(i);
        if node.x == 0.0 {
            table.push(
                i,
                PhysicsKey::WaterLevel,
                shared(Harmonic::new(0.0, vec![TidalConstituent::m2(0.5, 0.0)])),
            );
        }
        table.push(i, PhysicsKey::WindU, shared(Constant(8.0)));
    }
    let mut m = current(mesh, &mut table);
    assert!(table.is_empty());
    m.initial_solution(0.0);
    m.time_step(30.0).unwrap();
    m.time_step(30.0).unwrap();

    m.apply_boundary_conditions();
    let first: Vec<_> = m.nodes().to_vec();
    m.apply_boundary_conditions();
    for (i, (a, b)) in first.iter().zip(m.nodes()).enumerate() {
        assert_eq!(a.dof, b.dof, "node {i}");
        assert_eq!(a.cf, b.cf);
        assert_eq!(a.rho, b.rho);
        assert_eq!(a.wind_stress, b.wind_stress);
        assert_eq!(a.bottom_shear, b.bottom_shear);
    }
}

#[test]
fn test_tide_enters_basin() {
    let mesh = TriMesh::uniform_rectangle(0.0, 2000.0, 0.0, 400.0, 10, 2)
        .with_bathymetry(|_, _| -5.0);
    let mut table = BoundaryConditionTable::new();
    for i in 0..mesh.n_nodes() {
        if mesh.node(i).x == 0.0 {
            table.push(i, PhysicsKey::WaterLevel, shared(Constant(0.2)));
        }
    }
    let mut m = current(mesh, &mut table);
    m.initial_solution(0.0);
    let volume0 = m.water_volume();
    for _ in 0..60 {
        m.time_step(5.0).unwrap();
    }
    assert!(m.water_volume() > volume0);
    let inner = m.mesh().nearest_node(200.0, 200.0);
    assert!(m.node(inner).eta() > 0.0, "tide should have reached x = 200 m");
}
