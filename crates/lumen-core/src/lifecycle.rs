#![forbid(unsafe_code)]

//! Appear/disappear bookkeeping and view-bound background tasks.
//!
//! Lifecycle tokens are view identities. A view touches its token during a
//! pass by asking [`Lifecycle::has_appeared`], recording an appearance,
//! registering a disappear callback, or starting a task. When the pass under
//! a root ends, every token beneath that root that was known but not touched
//! is treated as gone: its disappear callback runs and its task is
//! cancelled. Appear actions queued during the pass run at the same point,
//! after the disappear callbacks. Neither kind runs while the tree is being
//! evaluated, so both are free to write state.
//!
//! Tasks run on their own threads. They never see the view tree; they get a
//! [`TaskContext`] with a cancellation token and a [`StateWriter`] for
//! publishing results into state storage.

use std::fmt;
use std::thread::JoinHandle;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::cancellation::{CancellationSource, CancellationToken};
use crate::identity::Identity;
use crate::state::StateWriter;

/// Scheduling hint for a view task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub enum TaskPriority {
    /// Work the user is not waiting on.
    Background,
    /// Default.
    #[default]
    Normal,
    /// Work that drives what is on screen right now (animations, input echo).
    UserInitiated,
}

impl TaskPriority {
    fn as_str(self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Normal => "normal",
            Self::UserInitiated => "user",
        }
    }
}

/// What a running task gets to work with.
pub struct TaskContext {
    token: Identity,
    priority: TaskPriority,
    cancel: CancellationToken,
    writer: StateWriter,
}

impl TaskContext {
    /// Identity of the view that started the task.
    pub fn token(&self) -> &Identity {
        &self.token
    }

    /// Priority the task was started with.
    pub fn priority(&self) -> TaskPriority {
        self.priority
    }

    /// Cancellation handle; fires when the view disappears.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Shorthand for `cancellation().is_cancelled()`.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Storage writer that requests a frame after each write.
    pub fn writer(&self) -> &StateWriter {
        &self.writer
    }
}

struct RunningTask {
    source: CancellationSource,
    handle: Option<JoinHandle<()>>,
}

type DisappearFn = Box<dyn FnOnce() + Send>;
type AppearFn = Box<dyn FnOnce() + Send>;

/// Lifecycle state for all views across passes.
pub struct Lifecycle {
    writer: StateWriter,
    appeared: FxHashSet<Identity>,
    touched: FxHashSet<Identity>,
    on_disappear: FxHashMap<Identity, DisappearFn>,
    pending_appear: Vec<AppearFn>,
    tasks: FxHashMap<Identity, RunningTask>,
}

impl Lifecycle {
    /// Create an empty lifecycle whose tasks write through `writer`.
    pub fn new(writer: StateWriter) -> Self {
        Self {
            writer,
            appeared: FxHashSet::default(),
            touched: FxHashSet::default(),
            on_disappear: FxHashMap::default(),
            pending_appear: Vec::new(),
            tasks: FxHashMap::default(),
        }
    }

    /// Start a pass over the tree under `root`.
    pub fn begin_render_pass(&mut self, root: &Identity) {
        self.touched.retain(|token| !token.is_within(root));
    }

    fn touch(&mut self, token: &Identity) {
        if !self.touched.contains(token) {
            self.touched.insert(token.clone());
        }
    }

    /// Whether `token` has appeared before. Touches the token.
    pub fn has_appeared(&mut self, token: &Identity) -> bool {
        self.touch(token);
        self.appeared.contains(token)
    }

    /// Record that `token` appeared. Returns `true` the first time.
    pub fn record_appear(&mut self, token: &Identity) -> bool {
        self.touch(token);
        self.appeared.insert(token.clone())
    }

    /// Run `action` when the current pass ends.
    pub fn queue_appear<F>(&mut self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pending_appear.push(Box::new(action));
    }

    /// Run `callback` when `token` disappears. Replaces an earlier callback.
    pub fn register_disappear<F>(&mut self, token: &Identity, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.touch(token);
        self.on_disappear.insert(token.clone(), Box::new(callback));
    }

    /// Start `work` on its own thread, bound to `token`.
    ///
    /// A token runs at most one task until it disappears or the task is
    /// cancelled; further calls only touch the token and return `false`.
    pub fn start_task<F>(&mut self, token: &Identity, priority: TaskPriority, work: F) -> bool
    where
        F: FnOnce(TaskContext) + Send + 'static,
    {
        self.touch(token);
        if self.tasks.contains_key(token) {
            return false;
        }

        let source = CancellationSource::new();
        let context = TaskContext {
            token: token.clone(),
            priority,
            cancel: source.token(),
            writer: self.writer.clone(),
        };
        let spawned = std::thread::Builder::new()
            .name(format!("lumen-task-{}", priority.as_str()))
            .spawn(move || work(context));

        match spawned {
            Ok(handle) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(token = %token, ?priority, "view task started");
                self.tasks.insert(
                    token.clone(),
                    RunningTask {
                        source,
                        handle: Some(handle),
                    },
                );
                true
            }
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(token = %token, error = %_err, "failed to spawn view task");
                false
            }
        }
    }

    /// Cancel the task bound to `token`. Returns whether one existed.
    pub fn cancel_task(&mut self, token: &Identity) -> bool {
        match self.tasks.remove(token) {
            Some(task) => {
                task.source.cancel();
                #[cfg(feature = "tracing")]
                tracing::debug!(token = %token, "view task cancelled");
                true
            }
            None => false,
        }
    }

    /// Whether a task is bound to `token` and has not finished.
    pub fn is_task_running(&self, token: &Identity) -> bool {
        self.tasks
            .get(token)
            .and_then(|task| task.handle.as_ref())
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Number of tasks bound to live tokens.
    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Finish the pass under `root`: every known token beneath it that was
    /// not touched disappears. Then queued appear actions run. Returns the
    /// tokens that disappeared.
    pub fn end_render_pass(&mut self, root: &Identity) -> Vec<Identity> {
        let unique: FxHashSet<&Identity> = self
            .appeared
            .iter()
            .chain(self.on_disappear.keys())
            .chain(self.tasks.keys())
            .filter(|token| token.is_within(root) && !self.touched.contains(*token))
            .collect();
        let mut gone: Vec<Identity> = unique.into_iter().cloned().collect();
        gone.sort_by_cached_key(|token| token.to_string());

        for token in &gone {
            self.appeared.remove(token);
            self.cancel_task(token);
            if let Some(callback) = self.on_disappear.remove(token) {
                callback();
            }
        }
        for action in std::mem::take(&mut self.pending_appear) {
            action();
        }
        gone
    }

    /// Cancel every task. Threads are not joined.
    pub fn shutdown(&mut self) {
        self.pending_appear.clear();
        for (_, task) in self.tasks.drain() {
            task.source.cancel();
        }
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lifecycle")
            .field("appeared", &self.appeared.len())
            .field("disappear_callbacks", &self.on_disappear.len())
            .field("pending_appear", &self.pending_appear.len())
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_signal;
    use crate::state::{SharedStateStorage, StateKey};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, mpsc};
    use web_time::Duration;

    fn lifecycle() -> (Lifecycle, SharedStateStorage, render_signal::RenderRequests) {
        let storage = SharedStateStorage::new();
        let (requester, requests) = render_signal::channel();
        (Lifecycle::new(storage.writer(requester)), storage, requests)
    }

    #[test]
    fn appear_is_recorded_once() {
        let (mut lc, _, _) = lifecycle();
        let root = Identity::root("App");
        let token = root.child("Banner", 0);

        lc.begin_render_pass(&root);
        assert!(!lc.has_appeared(&token));
        assert!(lc.record_appear(&token));
        assert!(!lc.record_appear(&token));
        assert!(lc.end_render_pass(&root).is_empty());

        lc.begin_render_pass(&root);
        assert!(lc.has_appeared(&token));
        assert!(lc.end_render_pass(&root).is_empty());
    }

    #[test]
    fn untouched_tokens_disappear() {
        let (mut lc, _, _) = lifecycle();
        let root = Identity::root("App");
        let token = root.child("Banner", 0);
        let fired = Arc::new(AtomicUsize::new(0));

        lc.begin_render_pass(&root);
        lc.record_appear(&token);
        let counter = Arc::clone(&fired);
        lc.register_disappear(&token, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        lc.end_render_pass(&root);

        lc.begin_render_pass(&root);
        let gone = lc.end_render_pass(&root);
        assert_eq!(gone, vec![token.clone()]);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!lc.has_appeared(&token));
    }

    #[test]
    fn appear_actions_wait_for_pass_end() {
        let (mut lc, storage, _requests) = lifecycle();
        let root = Identity::root("App");
        let token = root.child("Banner", 0);
        let key = StateKey::new(token.clone(), 0);
        storage.lock().insert(key.clone(), 0_u32);
        let (requester, _) = render_signal::channel();
        let writer = storage.writer(requester);

        lc.begin_render_pass(&root);
        let guard = storage.lock();
        assert!(lc.record_appear(&token));
        let target = key.clone();
        lc.queue_appear(move || {
            writer.update::<u32, _>(&target, |n| *n += 1);
        });
        assert_eq!(guard.get::<u32>(&key), Some(&0));
        drop(guard);

        lc.end_render_pass(&root);
        assert_eq!(storage.lock().get::<u32>(&key), Some(&1));

        lc.begin_render_pass(&root);
        lc.has_appeared(&token);
        lc.end_render_pass(&root);
        assert_eq!(storage.lock().get::<u32>(&key), Some(&1));
    }

    #[test]
    fn other_roots_are_untouched_by_pass() {
        let (mut lc, _, _) = lifecycle();
        let main = Identity::root("Main");
        let status = Identity::root("StatusBar");
        let clock = status.child("Clock", 0);

        lc.begin_render_pass(&status);
        lc.record_appear(&clock);
        lc.end_render_pass(&status);

        lc.begin_render_pass(&main);
        assert!(lc.end_render_pass(&main).is_empty());
        assert!(lc.has_appeared(&clock));
    }

    #[test]
    fn task_writes_state_and_is_cancelled_on_disappear() {
        let (mut lc, storage, requests) = lifecycle();
        let root = Identity::root("App");
        let token = root.child("Spinner", 0);
        let key = StateKey::new(token.clone(), 0);
        storage.lock().insert(key.clone(), 0_u32);

        let (done_tx, done_rx) = mpsc::channel();
        lc.begin_render_pass(&root);
        let task_key = key.clone();
        assert!(lc.start_task(&token, TaskPriority::UserInitiated, move |ctx| {
            ctx.writer().update::<u32, _>(&task_key, |v| *v = 1);
            while !ctx.cancellation().wait_timeout(Duration::from_millis(5)) {}
            done_tx.send(()).unwrap();
        }));
        assert!(!lc.start_task(&token, TaskPriority::Normal, |_| {}));
        lc.end_render_pass(&root);

        assert!(requests.wait_timeout(Duration::from_secs(5)));
        assert_eq!(storage.lock().get::<u32>(&key), Some(&1));
        assert_eq!(lc.task_count(), 1);

        lc.begin_render_pass(&root);
        assert_eq!(lc.end_render_pass(&root), vec![token]);
        assert_eq!(lc.task_count(), 0);
        assert!(done_rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn cancel_task_explicitly() {
        let (mut lc, _, _) = lifecycle();
        let token = Identity::root("App").child("Loader", 0);
        let (tx, rx) = mpsc::channel();
        lc.start_task(&token, TaskPriority::Background, move |ctx| {
            let cancelled = ctx.cancellation().wait_timeout(Duration::from_secs(30));
            tx.send(cancelled).unwrap();
        });
        assert!(lc.cancel_task(&token));
        assert!(!lc.cancel_task(&token));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(true));
    }
}
