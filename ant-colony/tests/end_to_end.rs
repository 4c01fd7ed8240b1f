//! Full coordinator/worker runs over every transport binding, on loopback.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use ant_colony::prelude::*;
use ant_colony_core::config::ColonyConfig;
use ant_colony_net::{PortPlan, TransportKind};

const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

fn small_config() -> ColonyConfig {
    ColonyConfig {
        num_workers: 2,
        max_ants: 6,
        max_iterations: 4,
        count_subjects: 40,
        capacity: 300,
        ..ColonyConfig::default()
    }
}

/// Spawn a coordinator, give it time to bind, then run both workers and
/// check the converged run shape on both sides of the protocol.
async fn run_colony(kind: TransportKind, ports: PortPlan) {
    let config = small_config();
    let productive_rounds = config.max_iterations - 1;

    let coordinator = tokio::spawn(async move {
        Coordinator::with_progress(config, Box::new(NullSink))
            .run(kind, LOOPBACK, ports)
            .await
    });
    tokio::time::sleep(Duration::from_millis(200)).await;

    let workers: Vec<_> = (0..2)
        .map(|index| tokio::spawn(run_worker(kind, LOOPBACK, ports, index)))
        .collect();

    let outcome = coordinator.await.unwrap().unwrap();
    assert!(outcome.best_value > 0);
    assert!(!outcome.best_items.is_empty());

    for worker in workers {
        let report = worker.await.unwrap().unwrap();
        assert_eq!(report.rounds_completed, productive_rounds);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stream_transport_full_run() {
    run_colony(
        TransportKind::Stream { dual_port: false },
        PortPlan::single(18100),
    )
    .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn dual_stream_transport_full_run() {
    run_colony(
        TransportKind::Stream { dual_port: true },
        PortPlan::dual(18200, 18300),
    )
    .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn datagram_transport_full_run() {
    run_colony(TransportKind::Datagram, PortPlan::single(18400)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn framed_transport_full_run() {
    run_colony(TransportKind::FramedUpgrade, PortPlan::single(18500)).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn round_deadline_survives_a_silent_worker() {
    let config = ColonyConfig {
        round_timeout: Some(Duration::from_millis(300)),
        ..small_config()
    };
    let ports = PortPlan::single(18600);
    let kind = TransportKind::Stream { dual_port: false };

    let coordinator = tokio::spawn({
        let config = config.clone();
        async move {
            Coordinator::with_progress(config, Box::new(NullSink))
                .run(kind, LOOPBACK, ports)
                .await
        }
    });
    tokio::time::sleep(Duration::from_millis(200)).await;

    let live = tokio::spawn(run_worker(kind, LOOPBACK, ports, 0));

    // The second worker handshakes and then goes silent for the whole run.
    let silent = tokio::spawn(async move {
        use ant_colony_net::protocol::READY;
        let mut session = ant_colony_net::connect_worker(kind, LOOPBACK, ports, 1)
            .await
            .unwrap();
        session.send(READY).await.unwrap();
        let _problem = session.recv().await.unwrap();
        session.send(READY).await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let outcome = coordinator.await.unwrap().unwrap();
    assert!(outcome.best_value > 0);

    let report = live.await.unwrap().unwrap();
    assert_eq!(report.rounds_completed, config.max_iterations - 1);
    silent.abort();
}
