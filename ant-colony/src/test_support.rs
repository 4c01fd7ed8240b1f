//! Scripted in-memory sessions for runtime tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use ant_colony_net::{NetError, Session};

/// A session that replays a fixed incoming script and records every send.
pub struct ScriptedSession {
    incoming: VecDeque<String>,
    sent: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSession {
    /// Session plus a shared handle onto everything it is sent.
    pub fn new(script: &[&str]) -> (Self, Arc<Mutex<Vec<String>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let session = Self {
            incoming: script.iter().map(|s| (*s).to_owned()).collect(),
            sent: Arc::clone(&sent),
        };
        (session, sent)
    }
}

#[async_trait::async_trait]
impl Session for ScriptedSession {
    async fn send(&mut self, text: &str) -> ant_colony_net::Result<()> {
        self.sent.lock().unwrap().push(text.to_owned());
        Ok(())
    }

    async fn recv(&mut self) -> ant_colony_net::Result<String> {
        self.incoming.pop_front().ok_or(NetError::Closed)
    }

    async fn close(&mut self) -> ant_colony_net::Result<()> {
        Ok(())
    }
}
