//! Per-screen state aggregation.
//!
//! An [`Aggregator`] keeps the latest value of each of its sources in the
//! screen's `Inputs` record, folds that record with the screen's draft into a
//! snapshot, and republishes the snapshot whenever any one input changes.
//! Sources that follow the same revision channel are re-read together and
//! published once, so one write never shows up half applied.
//!
//! ## Lifecycle
//!
//! ```text
//! subscribe (0 -> 1)      : spawn pump, query every source, publish
//! last Subscription drops : schedule teardown after `stop_timeout`
//! subscribe within window : teardown cancelled, pump keeps running
//! teardown fires          : pump aborted, source watchers dropped
//! ```
//!
//! All recomputation for one screen happens on its pump task, so snapshots
//! are produced by a single writer and the latest combination always wins.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, warn};

use super::query::Query;
use crate::error::StoreResult;

/// Grace period before an unobserved screen drops its sources.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_millis(5000);

/// Shape of one screen's state.
pub trait Screen: Send + Sync + 'static {
    /// In-progress user edits. Never persisted by the aggregator.
    type Draft: Clone + Default + Send + Sync + 'static;
    /// Latest value of every source, one field per source.
    type Inputs: Default + Send + Sync + 'static;
    /// What the screen renders.
    type Snapshot: Clone + Send + Sync + 'static;

    /// Pure fold of the current draft and inputs.
    fn combine(draft: &Self::Draft, inputs: &Self::Inputs) -> Self::Snapshot;
}

type Apply<I> = Box<dyn FnOnce(&mut I) + Send>;
type Load<I> = Arc<dyn Fn() -> StoreResult<Apply<I>> + Send + Sync>;

/// One upstream query feeding one field of a screen's inputs.
pub struct Source<I> {
    label: &'static str,
    changes: watch::Receiver<u64>,
    load: Load<I>,
}

impl<I: 'static> Source<I> {
    pub fn new<T: Send + 'static>(
        label: &'static str,
        query: Query<T>,
        assign: fn(&mut I, T),
    ) -> Self {
        let changes = query.changes();
        let load: Load<I> = Arc::new(move || {
            let value = query.fetch()?;
            Ok(Box::new(move |inputs: &mut I| assign(inputs, value)) as Apply<I>)
        });
        Self {
            label,
            changes,
            load,
        }
    }
}

struct Lifecycle {
    subscribers: usize,
    /// Bumped on every subscribe so a pending teardown can tell it is stale.
    generation: u64,
    pump: Option<JoinHandle<()>>,
    activations: u64,
}

struct Shared<S: Screen> {
    label: &'static str,
    sources: Vec<Source<S::Inputs>>,
    draft: watch::Sender<S::Draft>,
    snapshot: watch::Sender<S::Snapshot>,
    stop_timeout: Duration,
    lifecycle: Mutex<Lifecycle>,
}

impl<S: Screen> Shared<S> {
    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn release(self: &Arc<Self>) {
        let generation = {
            let mut lc = self.lifecycle();
            lc.subscribers = lc.subscribers.saturating_sub(1);
            if lc.subscribers > 0 {
                return;
            }
            lc.generation
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let shared = Arc::clone(self);
                handle.spawn(async move {
                    tokio::time::sleep(shared.stop_timeout).await;
                    shared.teardown_if_idle(generation);
                });
            }
            // No runtime left to wait on; stop now.
            Err(_) => self.teardown_if_idle(generation),
        }
    }

    fn teardown_if_idle(&self, generation: u64) {
        let mut lc = self.lifecycle();
        if lc.subscribers == 0 && lc.generation == generation {
            if let Some(pump) = lc.pump.take() {
                pump.abort();
                debug!(screen = self.label, "screen sources torn down");
            }
        }
    }
}

/// Combines a screen's sources and draft into published snapshots.
pub struct Aggregator<S: Screen> {
    shared: Arc<Shared<S>>,
}

impl<S: Screen> Clone for Aggregator<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: Screen> Aggregator<S> {
    pub fn new(label: &'static str, sources: Vec<Source<S::Inputs>>, stop_timeout: Duration) -> Self {
        let draft = S::Draft::default();
        let initial = S::combine(&draft, &S::Inputs::default());
        let (draft_tx, _) = watch::channel(draft);
        let (snapshot_tx, _) = watch::channel(initial);
        Self {
            shared: Arc::new(Shared {
                label,
                sources,
                draft: draft_tx,
                snapshot: snapshot_tx,
                stop_timeout,
                lifecycle: Mutex::new(Lifecycle {
                    subscribers: 0,
                    generation: 0,
                    pump: None,
                    activations: 0,
                }),
            }),
        }
    }

    /// Start observing. Activates the sources if nobody else is observing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe(&self) -> Subscription<S> {
        // Subscribe before the pump exists so its first publish is never missed.
        let rx = self.shared.snapshot.subscribe();
        let mut lc = self.shared.lifecycle();
        lc.subscribers += 1;
        lc.generation += 1;
        let running = lc.pump.as_ref().is_some_and(|p| !p.is_finished());
        if !running {
            lc.activations += 1;
            debug!(
                screen = self.shared.label,
                activation = lc.activations,
                "screen sources activated"
            );
            lc.pump = Some(tokio::spawn(pump(Arc::clone(&self.shared))));
        }
        drop(lc);
        Subscription {
            rx,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Last published snapshot.
    pub fn snapshot(&self) -> S::Snapshot {
        self.shared.snapshot.borrow().clone()
    }

    pub fn draft(&self) -> S::Draft {
        self.shared.draft.borrow().clone()
    }

    /// Edit the draft in place. Observers see the change on the next fold.
    pub fn update_draft(&self, edit: impl FnOnce(&mut S::Draft)) {
        self.shared.draft.send_modify(edit);
    }

    pub fn is_active(&self) -> bool {
        self.shared
            .lifecycle()
            .pump
            .as_ref()
            .is_some_and(|p| !p.is_finished())
    }

    /// How many times the sources have been (re)activated.
    pub fn activations(&self) -> u64 {
        self.shared.lifecycle().activations
    }
}

/// A live view of a screen's snapshots. Dropping it releases the screen.
pub struct Subscription<S: Screen> {
    rx: watch::Receiver<S::Snapshot>,
    shared: Arc<Shared<S>>,
}

impl<S: Screen> Subscription<S> {
    pub fn current(&self) -> S::Snapshot {
        self.rx.borrow().clone()
    }

    /// Wait for the next snapshot. `None` once the aggregator is gone.
    pub async fn changed(&mut self) -> Option<S::Snapshot> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Wait until a snapshot satisfies `predicate`, starting with the current one.
    pub async fn wait_for(
        &mut self,
        predicate: impl FnMut(&S::Snapshot) -> bool,
    ) -> Option<S::Snapshot> {
        self.rx.wait_for(predicate).await.ok().map(|s| s.clone())
    }
}

impl<S: Screen> Drop for Subscription<S> {
    fn drop(&mut self) {
        self.shared.release();
    }
}

async fn pump<S: Screen>(shared: Arc<Shared<S>>) {
    let mut draft_rx = shared.draft.subscribe();
    let groups = revision_groups(&shared.sources);

    // Arm the watchers before the first read so no write slips in between.
    let (notify_tx, mut notify_rx) = mpsc::channel::<usize>(groups.len().max(1));
    let mut watchers = JoinSet::new();
    for (index, group) in groups.iter().enumerate() {
        let mut changes = shared.sources[group[0]].changes.clone();
        changes.mark_unchanged();
        let tx = notify_tx.clone();
        watchers.spawn(async move {
            while changes.changed().await.is_ok() {
                if tx.send(index).await.is_err() {
                    break;
                }
            }
        });
    }
    drop(notify_tx);

    let mut inputs = S::Inputs::default();
    for group in &groups {
        refresh(shared.label, &shared.sources, group, &mut inputs).await;
    }
    publish(&shared, &mut draft_rx, &inputs);

    loop {
        tokio::select! {
            changed = draft_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            Some(index) = notify_rx.recv() => {
                refresh(shared.label, &shared.sources, &groups[index], &mut inputs).await;
            }
            else => break,
        }
        publish(&shared, &mut draft_rx, &inputs);
    }
}

/// Fold the current draft and inputs and publish the result.
fn publish<S: Screen>(
    shared: &Shared<S>,
    draft_rx: &mut watch::Receiver<S::Draft>,
    inputs: &S::Inputs,
) {
    shared
        .snapshot
        .send_replace(S::combine(&draft_rx.borrow_and_update(), inputs));
}

/// Indices of the sources, grouped by the revision channel they follow.
fn revision_groups<I>(sources: &[Source<I>]) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    for (index, source) in sources.iter().enumerate() {
        match groups
            .iter_mut()
            .find(|group| sources[group[0]].changes.same_channel(&source.changes))
        {
            Some(group) => group.push(index),
            None => groups.push(vec![index]),
        }
    }
    groups
}

/// Re-read every source of one group and apply the results together.
async fn refresh<I: 'static>(
    screen: &'static str,
    sources: &[Source<I>],
    group: &[usize],
    inputs: &mut I,
) {
    let changes = sources[group[0]].changes.clone();
    let loads: Vec<(&'static str, Load<I>)> = group
        .iter()
        .map(|&index| (sources[index].label, Arc::clone(&sources[index].load)))
        .collect();

    match tokio::task::spawn_blocking(move || read_at_one_revision(&changes, &loads)).await {
        Ok(Some(results)) => {
            for (source, result) in results {
                match result {
                    Ok(apply) => apply(inputs),
                    Err(err) => {
                        warn!(screen, source, error = %err, "source refresh failed; keeping last value");
                    }
                }
            }
        }
        Ok(None) => {
            debug!(screen, "revision kept moving during refresh; waiting for the next change");
        }
        Err(err) => {
            warn!(screen, error = %err, "source refresh task failed");
        }
    }
}

const MAX_READ_ATTEMPTS: usize = 4;

/// Run every load against one unchanged revision.
///
/// Stores bump a revision before releasing the write, so an unchanged
/// revision means every load saw the same table state. `None` when writes
/// kept landing mid-read; each of those writes has already queued another
/// change notification for the group.
fn read_at_one_revision<I>(
    changes: &watch::Receiver<u64>,
    loads: &[(&'static str, Load<I>)],
) -> Option<Vec<(&'static str, StoreResult<Apply<I>>)>> {
    for _ in 0..MAX_READ_ATTEMPTS {
        let before = *changes.borrow();
        let results: Vec<_> = loads.iter().map(|(label, load)| (*label, load())).collect();
        if *changes.borrow() == before {
            return Some(results);
        }
    }
    None
}
