//! Editor session: a store, its viewport and storage, with debounced autosave.

use crate::canvas::{Canvas, Viewport};
use crate::config::SandboxConfig;
use crate::shortcuts::{KeyEvent, ShortcutAction, handle_key};
use crate::storage::StorageBackend;
use crate::store::{Commit, CommitHook, SandboxStore};
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Commit hook that raises a flag the scheduler picks up on its next tick.
#[derive(Debug, Clone, Default)]
pub struct CommitSignal(Rc<Cell<bool>>);

impl CommitSignal {
    /// Clears and returns the flag.
    pub fn take(&self) -> bool {
        self.0.replace(false)
    }
}

impl CommitHook for CommitSignal {
    fn on_commit(&mut self, _commit: &Commit) {
        self.0.set(true);
    }
}

/// Debounce timer: each commit restarts the quiet period.
#[derive(Debug)]
pub struct AutosaveScheduler {
    debounce: Duration,
    signal: CommitSignal,
    deadline: Option<Instant>,
}

impl AutosaveScheduler {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            signal: CommitSignal::default(),
            deadline: None,
        }
    }

    /// Hook to register on the store.
    pub fn hook(&self) -> CommitSignal {
        self.signal.clone()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns `true` when a save is due at `now`.
    ///
    /// A commit seen by this tick is treated as having happened at `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.signal.take() {
            self.deadline = Some(now + self.debounce);
        }
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.signal.take();
        self.deadline = None;
    }
}

/// One open editor: store, viewport, storage backend and autosave.
pub struct EditorSession<S: StorageBackend> {
    store: SandboxStore,
    viewport: Viewport,
    storage: S,
    autosave: AutosaveScheduler,
}

impl<S: StorageBackend> EditorSession<S> {
    /// Creates a session and restores whatever the storage holds.
    pub fn open(config: SandboxConfig, storage: S) -> Self {
        let debounce = Duration::from_millis(config.autosave_debounce_ms);
        let mut store = SandboxStore::new(config);
        store.load_from_storage(&storage);
        let autosave = AutosaveScheduler::new(debounce);
        store.add_commit_hook(autosave.hook());
        Self {
            store,
            viewport: Viewport::default(),
            storage,
            autosave,
        }
    }

    pub fn store(&self) -> &SandboxStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SandboxStore {
        &mut self.store
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn autosave(&self) -> &AutosaveScheduler {
        &self.autosave
    }

    pub fn canvas(&mut self) -> Canvas<'_> {
        Canvas::new(&mut self.store, &mut self.viewport)
    }

    pub fn handle_key(&mut self, event: KeyEvent) -> Option<ShortcutAction> {
        let mut canvas = Canvas::new(&mut self.store, &mut self.viewport);
        handle_key(&mut canvas, &mut self.storage, event)
    }

    /// Drives autosave; returns `true` when it saved.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.autosave.poll(now) || !self.store.needs_save() {
            return false;
        }
        tracing::debug!("autosave");
        self.store.save_to_storage(&mut self.storage)
    }

    /// Saves immediately and drops any pending autosave.
    pub fn save_now(&mut self) -> bool {
        self.autosave.cancel();
        self.store.save_to_storage(&mut self.storage)
    }

    pub fn into_parts(self) -> (SandboxStore, S) {
        (self.store, self.storage)
    }
}
