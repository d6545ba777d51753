//! Launch N keyed tasks, collect N keyed outcomes.
//!
//! Each task owns a clone of the fan-in sender; the channel closes once the
//! group's own sender is dropped and every task has finished, which is the
//! join barrier. Tasks are never cancelled once spawned.

use std::collections::BTreeSet;
use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::warn;

/// Group of concurrently running tasks, each tagged with a key.
pub struct TaskGroup<K, T> {
    tx: mpsc::UnboundedSender<(K, T)>,
    rx: mpsc::UnboundedReceiver<(K, T)>,
    tasks: JoinSet<()>,
    launched: Vec<K>,
}

/// Everything a [`TaskGroup`] produced.
#[derive(Debug)]
pub struct GroupResults<K, T> {
    /// Outcomes in completion order.
    pub arrivals: Vec<(K, T)>,
    /// Keys whose task ended without reporting (panicked).
    pub missing: Vec<K>,
}

impl<K, T> Default for TaskGroup<K, T>
where
    K: Ord + Clone + Send + 'static,
    T: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> TaskGroup<K, T>
where
    K: Ord + Clone + Send + 'static,
    T: Send + 'static,
{
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            tasks: JoinSet::new(),
            launched: Vec::new(),
        }
    }

    /// Spawns `fut` on the runtime; its output is reported under `key`.
    pub fn spawn<F>(&mut self, key: K, fut: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let tx = self.tx.clone();
        self.launched.push(key.clone());
        self.tasks.spawn(async move {
            let out = fut.await;
            let _ = tx.send((key, out));
        });
    }

    /// Waits for every launched task and returns their outcomes.
    pub async fn join(self) -> GroupResults<K, T> {
        let TaskGroup {
            tx,
            mut rx,
            mut tasks,
            launched,
        } = self;
        drop(tx);

        let mut arrivals = Vec::with_capacity(launched.len());
        while let Some(outcome) = rx.recv().await {
            arrivals.push(outcome);
        }

        while let Some(res) = tasks.join_next().await {
            if let Err(e) = res {
                warn!(error = %e, "task ended without reporting");
            }
        }

        let reported: BTreeSet<&K> = arrivals.iter().map(|(k, _)| k).collect();
        let missing = launched
            .iter()
            .filter(|k| !reported.contains(k))
            .cloned()
            .collect();

        GroupResults { arrivals, missing }
    }
}
