//! End-to-end acceptance rates on the statevector simulator.
//!
//! Clifford unitaries conjugate every Weyl operator to another Weyl
//! operator, so each tester circuit's outcome distribution is a point mass
//! and the measured acceptance rate is exactly 1.0, not just close to it.
//! Non-Clifford gates land near their closed-form expectation.

use clifftest_adapter_sim::SimulatorBackend;
use clifftest_core::aggregate::{summarise_batched, summarise_paired};
use clifftest_core::expected::acceptance_probability;
use clifftest_core::{run_batched, run_paired, standard_unitary};
use clifftest_hal::identity_transpile;

#[tokio::test]
async fn test_clifford_batched_acceptance_is_exactly_one() {
    let backend = SimulatorBackend::new();
    let transpile = identity_transpile();

    for gate in ["identity", "hadamard", "s_gate", "cnot"] {
        let u = standard_unitary(gate).unwrap();
        let n = u.num_qubits();
        let raw = run_batched(&u, n, 200, &backend, &transpile, None, None)
            .await
            .unwrap();
        assert_eq!(raw.len(), 1 << (2 * n));
        assert_eq!(summarise_batched(&raw), 1.0, "gate {gate}");
    }
}

#[tokio::test]
async fn test_clifford_paired_acceptance_is_exactly_one() {
    let backend = SimulatorBackend::new();
    let transpile = identity_transpile();

    let u = standard_unitary("hadamard").unwrap();
    let raw = run_paired(&u, 1, 50, &backend, &transpile, None, None)
        .await
        .unwrap();
    assert_eq!(raw.len(), 50);
    assert_eq!(summarise_paired(&raw), 1.0);
}

#[tokio::test]
async fn test_t_gate_batched_acceptance_near_expected() {
    let backend = SimulatorBackend::new();
    let transpile = identity_transpile();

    let u = standard_unitary("t_gate").unwrap();
    let expected = acceptance_probability(&u).unwrap();
    assert!((expected - 0.75).abs() < 1e-9);

    let raw = run_batched(&u, 1, 2000, &backend, &transpile, None, None)
        .await
        .unwrap();
    let rate = summarise_batched(&raw);
    assert!(
        (rate - expected).abs() < 0.05,
        "rate {rate} vs expected {expected}"
    );
}

#[tokio::test]
async fn test_t_gate_paired_acceptance_near_expected() {
    let backend = SimulatorBackend::new();
    let transpile = identity_transpile();

    let u = standard_unitary("t_gate").unwrap();
    let raw = run_paired(&u, 1, 2000, &backend, &transpile, None, None)
        .await
        .unwrap();
    assert_eq!(raw.len(), 2000);
    let rate = summarise_paired(&raw);
    assert!((rate - 0.75).abs() < 0.05, "rate {rate}");
}

#[tokio::test]
async fn test_toffoli_batched_acceptance_near_expected() {
    let backend = SimulatorBackend::new();
    let transpile = identity_transpile();

    let u = standard_unitary("toffoli").unwrap();
    let expected = acceptance_probability(&u).unwrap();
    assert!((expected - 11.0 / 32.0).abs() < 1e-9);

    // 64 keys on 6 qubits; modest shots keep this test quick.
    let raw = run_batched(&u, 3, 500, &backend, &transpile, None, None)
        .await
        .unwrap();
    let rate = summarise_batched(&raw);
    assert!(
        (rate - expected).abs() < 0.05,
        "rate {rate} vs expected {expected}"
    );
}
