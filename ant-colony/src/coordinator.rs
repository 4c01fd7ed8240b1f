//! Round-synchronous coordinator
//!
//! The coordinator owns the run: it generates the item catalogue, opens
//! one session per worker, pushes the problem during the two-step `READY`
//! handshake, then drives the round loop. Every round it broadcasts the
//! current pheromone vector to all workers, collects one result per worker
//! in session-index order (a strict barrier), folds the batch into the
//! run-wide best and applies the pheromone update. The loop performs
//! `max_iterations - 1` productive rounds; the final broadcast slot is the
//! `end` sentinel that releases the workers.

use std::net::IpAddr;
use std::time::Instant;

use ant_colony_core::config::ColonyConfig;
use ant_colony_core::outcome::RunOutcome;
use ant_colony_core::partition::ants_per_worker;
use ant_colony_core::pheromone;
use ant_colony_core::problem::{initial_pheromone, ItemCatalogue};
use ant_colony_net::protocol::{self, ProblemMessage, END, READY};
use ant_colony_net::{open_coordinator, PortPlan, Session, TransportKind};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::progress::{ProgressSink, TracingSink};
use crate::{Result, RunError};

/// Drives one optimization run over a set of worker sessions.
pub struct Coordinator {
    config: ColonyConfig,
    progress: Box<dyn ProgressSink>,
}

impl Coordinator {
    /// Coordinator reporting progress through the tracing pipeline.
    pub fn new(config: ColonyConfig) -> Self {
        Self::with_progress(config, Box::new(TracingSink))
    }

    /// Coordinator with a caller-chosen progress sink.
    pub fn with_progress(config: ColonyConfig, progress: Box<dyn ProgressSink>) -> Self {
        Self { config, progress }
    }

    /// Run to completion: open the transport, handshake every worker,
    /// drive the round loop and release the workers.
    pub async fn run(
        &self,
        kind: TransportKind,
        ip: IpAddr,
        ports: PortPlan,
    ) -> Result<RunOutcome> {
        self.config.validate()?;
        let catalogue = ItemCatalogue::generate(
            self.config.count_subjects,
            self.config.capacity,
            self.config.generation_seed,
        );
        catalogue.validate()?;
        info!(
            transport = %kind,
            workers = self.config.num_workers,
            items = self.config.count_subjects,
            "starting run"
        );

        let start = Instant::now();
        let sessions = open_coordinator(kind, ip, ports, self.config.num_workers).await?;
        self.drive(catalogue, sessions, start).await
    }

    /// The run proper, once the transport is open.
    async fn drive(
        &self,
        catalogue: ItemCatalogue,
        sessions: Vec<Box<dyn Session>>,
        start: Instant,
    ) -> Result<RunOutcome> {
        let shares = ants_per_worker(self.config.max_ants, self.config.num_workers);
        let mut sessions = handshake_workers(
            sessions,
            &catalogue,
            self.config.alpha,
            self.config.beta,
            &shares,
        )
        .await?;
        let startup_time = start.elapsed();
        info!(workers = sessions.len(), ?startup_time, "all workers ready");

        let round_start = Instant::now();
        let mut pheromone = initial_pheromone(catalogue.values.len());
        let mut best_value = 0u32;
        let mut best_items: Vec<usize> = Vec::new();

        for iteration in 1..self.config.max_iterations {
            let broadcast = protocol::encode_pheromone(&pheromone);
            for session in sessions.iter_mut() {
                session.send(&broadcast).await?;
            }

            // Strict barrier: one result per worker, in session-index
            // order. A malformed or overdue contribution is skipped; the
            // round (and run) continue without it.
            let mut round_values = Vec::new();
            let mut round_sets = Vec::new();
            let mut round_best = 0u32;
            for (index, session) in sessions.iter_mut().enumerate() {
                let text = match self.recv_result(session.as_mut()).await? {
                    Some(text) => text,
                    None => {
                        warn!(worker = index, iteration, "no result before the round deadline");
                        continue;
                    }
                };
                let result = match protocol::decode_round_result(&text) {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(
                            worker = index,
                            iteration,
                            error = %e,
                            "discarding malformed round result"
                        );
                        continue;
                    }
                };
                // Grammar-valid text can still name items the catalogue
                // does not have; such a result is as malformed as a parse
                // failure and must never reach the pheromone update.
                if let Some(&bad) = result
                    .best_items
                    .iter()
                    .chain(result.all_item_sets.iter().flatten())
                    .find(|&&item| item >= catalogue.len())
                {
                    warn!(
                        worker = index,
                        iteration,
                        item = bad,
                        items = catalogue.len(),
                        "discarding round result with out-of-range item index"
                    );
                    continue;
                }
                if result.best_value > round_best {
                    round_best = result.best_value;
                }
                if result.best_value > best_value {
                    best_value = result.best_value;
                    best_items = result.best_items;
                }
                round_values.extend(result.all_values);
                round_sets.extend(result.all_item_sets);
            }

            pheromone::update(
                &mut pheromone,
                self.config.rho,
                self.config.q,
                &round_values,
                &round_sets,
            );
            self.progress.emit(&format!(
                "iteration {iteration}: round best {round_best}, overall best {best_value}"
            ));
        }

        for session in sessions.iter_mut() {
            session.send(END).await?;
            session.close().await?;
        }

        let round_time = round_start.elapsed();
        info!(best_value, ?round_time, "run complete");
        Ok(RunOutcome {
            best_items,
            best_value,
            startup_time,
            round_time,
        })
    }

    /// One worker's collect step, bounded by `round_timeout` when set.
    ///
    /// The wire format carries no round identifier, so a slow-but-alive
    /// worker whose deadline fires stays one round behind for the rest of
    /// the run: each later collect consumes its previous round's reply.
    /// Its results still describe real constructions against a recent
    /// pheromone vector, and the skew ends with the run. Distinguishing
    /// stale replies would take a round tag on the wire.
    async fn recv_result(&self, session: &mut dyn Session) -> Result<Option<String>> {
        match self.config.round_timeout {
            None => Ok(Some(session.recv().await?)),
            Some(deadline) => match tokio::time::timeout(deadline, session.recv()).await {
                Ok(text) => Ok(Some(text?)),
                Err(_) => Ok(None),
            },
        }
    }
}

/// Handshake every session concurrently, preserving session-index order.
///
/// Per worker: expect `READY`, push the problem message with that worker's
/// ant share, expect the second `READY`.
async fn handshake_workers(
    sessions: Vec<Box<dyn Session>>,
    catalogue: &ItemCatalogue,
    alpha: f64,
    beta: f64,
    shares: &[usize],
) -> Result<Vec<Box<dyn Session>>> {
    let mut set = JoinSet::new();
    for (index, mut session) in sessions.into_iter().enumerate() {
        let share = shares[index];
        let message = protocol::encode_problem(&ProblemMessage {
            catalogue: catalogue.clone(),
            alpha,
            beta,
            ants_for_worker: share,
        });
        set.spawn(async move {
            let greeting = session.recv().await?;
            if greeting != READY {
                return Err(RunError::Handshake {
                    worker: index,
                    got: greeting,
                });
            }
            session.send(&message).await?;
            let ack = session.recv().await?;
            if ack != READY {
                return Err(RunError::Handshake {
                    worker: index,
                    got: ack,
                });
            }
            debug!(worker = index, ants = share, "handshake complete");
            Ok((index, session))
        });
    }

    let mut handshaked = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next().await {
        handshaked.push(joined??);
    }
    handshaked.sort_by_key(|(index, _)| *index);
    Ok(handshaked.into_iter().map(|(_, session)| session).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemorySink;
    use crate::test_support::ScriptedSession;
    use std::sync::Arc;

    fn tiny_catalogue() -> ItemCatalogue {
        ItemCatalogue {
            weights: vec![40, 50, 30],
            values: vec![60, 100, 120],
            capacity: 60,
        }
    }

    fn config(max_iterations: usize, num_workers: usize) -> ColonyConfig {
        ColonyConfig {
            max_iterations,
            num_workers,
            max_ants: 4,
            count_subjects: 3,
            capacity: 60,
            ..ColonyConfig::default()
        }
    }

    struct SinkHandle(Arc<MemorySink>);

    impl ProgressSink for SinkHandle {
        fn emit(&self, line: &str) {
            self.0.emit(line);
        }
    }

    #[tokio::test]
    async fn single_round_run_over_scripted_sessions() {
        let (worker, sent) = ScriptedSession::new(&[READY, READY, "120;2;120 0;2,"]);
        let sink = Arc::new(MemorySink::default());
        let coordinator = Coordinator::with_progress(
            config(2, 1),
            Box::new(SinkHandle(Arc::clone(&sink))),
        );

        let outcome = coordinator
            .drive(tiny_catalogue(), vec![Box::new(worker)], Instant::now())
            .await
            .unwrap();

        assert_eq!(outcome.best_value, 120);
        assert_eq!(outcome.best_items, vec![2]);

        let sent = sent.lock().unwrap();
        // Problem with the full ant share, one pheromone broadcast, end.
        assert_eq!(sent[0], "40,50,30;60,100,120;60;1;5;4");
        assert_eq!(sent[1], "1,1,1");
        assert_eq!(sent[2], END);

        assert_eq!(
            sink.take(),
            vec!["iteration 1: round best 120, overall best 120"]
        );
    }

    #[tokio::test]
    async fn malformed_result_is_skipped_not_fatal() {
        let (good, _) = ScriptedSession::new(&[READY, READY, "100;1;100;1"]);
        let (bad, _) = ScriptedSession::new(&[READY, READY, "not;a;result"]);
        let coordinator =
            Coordinator::with_progress(config(2, 2), Box::new(crate::progress::NullSink));

        let outcome = coordinator
            .drive(
                tiny_catalogue(),
                vec![Box::new(good), Box::new(bad)],
                Instant::now(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.best_value, 100);
        assert_eq!(outcome.best_items, vec![1]);
    }

    #[tokio::test]
    async fn out_of_range_item_index_is_skipped_not_fatal() {
        // Parses cleanly but names item 999 on a 3-item catalogue; the
        // contribution must be dropped before the pheromone update sees it.
        let (good, _) = ScriptedSession::new(&[READY, READY, "100;1;100;1"]);
        let (bad, _) = ScriptedSession::new(&[READY, READY, "100;1;100;0 999"]);
        let coordinator =
            Coordinator::with_progress(config(2, 2), Box::new(crate::progress::NullSink));

        let outcome = coordinator
            .drive(
                tiny_catalogue(),
                vec![Box::new(good), Box::new(bad)],
                Instant::now(),
            )
            .await
            .unwrap();

        assert_eq!(outcome.best_value, 100);
        assert_eq!(outcome.best_items, vec![1]);
    }

    #[tokio::test]
    async fn broken_handshake_is_an_error() {
        let (worker, _) = ScriptedSession::new(&["HELLO"]);
        let coordinator = Coordinator::new(config(2, 1));

        let err = coordinator
            .drive(tiny_catalogue(), vec![Box::new(worker)], Instant::now())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RunError::Handshake { worker: 0, got } if got == "HELLO"
        ));
    }

    #[tokio::test]
    async fn closed_session_mid_round_is_fatal() {
        // The script ends after the handshake, so the first round recv
        // reports a closed session; without a deadline configured that is
        // a hard transport error, not a skippable contribution.
        let (worker, _) = ScriptedSession::new(&[READY, READY]);
        let coordinator = Coordinator::new(config(2, 1));
        assert!(coordinator
            .drive(tiny_catalogue(), vec![Box::new(worker)], Instant::now())
            .await
            .is_err());
    }
}
