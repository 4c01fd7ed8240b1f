//! Worker runtime
//!
//! A worker owns exactly one session toward the coordinator. After the
//! two-step `READY` handshake it loops on broadcasts: each pheromone
//! vector triggers the construction of this worker's ant share, folded
//! into one round result and sent back; the `end` sentinel closes the
//! session.

use std::net::IpAddr;

use ant_colony_core::ant;
use ant_colony_core::outcome::RoundResult;
use ant_colony_net::protocol::{self, Broadcast, ProblemMessage, WireError, READY};
use ant_colony_net::{connect_worker, NetError, PortPlan, Session, TransportKind};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::Result;

/// What a worker observed over its session, returned after `end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    /// Productive rounds served
    pub rounds_completed: usize,
    /// Best value of the final round's batch
    pub last_best: u32,
}

/// One worker's half of a run, over any session.
pub struct WorkerSession {
    session: Box<dyn Session>,
    rng: ChaCha8Rng,
}

impl WorkerSession {
    /// Worker with a fresh entropy-seeded rng.
    pub fn new(session: Box<dyn Session>) -> Self {
        Self::with_rng(session, ChaCha8Rng::from_entropy())
    }

    /// Worker with a caller-chosen rng, for reproducible batches.
    pub fn with_rng(session: Box<dyn Session>, rng: ChaCha8Rng) -> Self {
        Self { session, rng }
    }

    /// Serve rounds until the coordinator sends `end`.
    pub async fn run(mut self) -> Result<WorkerReport> {
        self.session.send(READY).await?;
        let text = self.session.recv().await?;
        let problem = protocol::decode_problem(&text).map_err(NetError::from)?;
        problem.catalogue.validate()?;
        info!(
            items = problem.catalogue.values.len(),
            ants = problem.ants_for_worker,
            "problem received"
        );
        self.session.send(READY).await?;

        let mut report = WorkerReport {
            rounds_completed: 0,
            last_best: 0,
        };
        loop {
            let text = self.session.recv().await?;
            match protocol::decode_broadcast(&text).map_err(NetError::from)? {
                Broadcast::End => {
                    self.session.close().await?;
                    info!(rounds = report.rounds_completed, "session ended");
                    return Ok(report);
                }
                Broadcast::Pheromone(pheromone) => {
                    // Construction indexes the vector by item, so a length
                    // mismatch is a protocol error, not a panic.
                    if pheromone.len() != problem.catalogue.len() {
                        return Err(NetError::from(WireError::LengthMismatch {
                            expected: problem.catalogue.len(),
                            got: pheromone.len(),
                        })
                        .into());
                    }
                    let result = self.serve_round(&problem, &pheromone);
                    report.rounds_completed += 1;
                    report.last_best = result.best_value;
                    self.session
                        .send(&protocol::encode_round_result(&result))
                        .await?;
                }
            }
        }
    }

    fn serve_round(&mut self, problem: &ProblemMessage, pheromone: &[f64]) -> RoundResult {
        let batch = (0..problem.ants_for_worker)
            .map(|_| {
                ant::construct(
                    &problem.catalogue,
                    pheromone,
                    problem.alpha,
                    problem.beta,
                    &mut self.rng,
                )
            })
            .collect();
        let result = RoundResult::from_batch(batch);
        debug!(best = result.best_value, "round served");
        result
    }
}

/// Connect session `worker_index` and serve it to completion.
pub async fn run_worker(
    kind: TransportKind,
    coordinator: IpAddr,
    ports: PortPlan,
    worker_index: usize,
) -> Result<WorkerReport> {
    let session = connect_worker(kind, coordinator, ports, worker_index).await?;
    WorkerSession::new(session).run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedSession;
    use ant_colony_net::protocol::END;

    const PROBLEM: &str = "40,50,30;60,100,120;60;1;5;3";

    fn seeded(session: ScriptedSession) -> WorkerSession {
        WorkerSession::with_rng(Box::new(session), ChaCha8Rng::seed_from_u64(7))
    }

    #[tokio::test]
    async fn end_before_any_round_constructs_nothing() {
        let (session, sent) = ScriptedSession::new(&[PROBLEM, END]);
        let report = seeded(session).run().await.unwrap();

        assert_eq!(report.rounds_completed, 0);
        assert_eq!(report.last_best, 0);
        // Both handshake literals, nothing else.
        assert_eq!(*sent.lock().unwrap(), vec![READY, READY]);
    }

    #[tokio::test]
    async fn one_round_produces_one_result() {
        let (session, sent) = ScriptedSession::new(&[PROBLEM, "1,1,1", END]);
        let report = seeded(session).run().await.unwrap();

        assert_eq!(report.rounds_completed, 1);

        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 3);
        let result = protocol::decode_round_result(&sent[2]).unwrap();
        assert_eq!(result.all_values.len(), 3);
        assert_eq!(result.best_value, report.last_best);
        // Every ant respects the capacity of 60.
        let weights = [40u32, 50, 30];
        for set in &result.all_item_sets {
            let load: u32 = set.iter().map(|&i| weights[i]).sum();
            assert!(load <= 60);
        }
    }

    #[tokio::test]
    async fn wrong_length_pheromone_vector_is_an_error() {
        // Two entries against a three-item catalogue must surface as a
        // protocol error before any ant is constructed.
        let (session, sent) = ScriptedSession::new(&[PROBLEM, "1,1", END]);
        let err = seeded(session).run().await.unwrap_err();
        assert!(matches!(
            err,
            crate::RunError::Net(NetError::Wire(WireError::LengthMismatch {
                expected: 3,
                got: 2,
            }))
        ));
        // Only the two handshake literals went out, never a round result.
        assert_eq!(*sent.lock().unwrap(), vec![READY, READY]);
    }

    #[tokio::test]
    async fn malformed_problem_is_an_error() {
        let (session, _) = ScriptedSession::new(&["garbage", END]);
        assert!(seeded(session).run().await.is_err());
    }
}
