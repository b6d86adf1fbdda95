//! Snapshot-based undo/redo.
//!
//! Each snapshot is a deep copy of the document plus one registry retain per
//! shape handle it references, so a shape stays alive for as long as any
//! snapshot or the live document can reach it. Snapshots release their
//! retains exactly once, when they are evicted, discarded or cleared.
//!
//! Undo and redo hand references over instead of recounting them: the
//! snapshot being restored donates its retains to the live document, and the
//! document being replaced donates its references to the snapshot that
//! records it.

use std::collections::VecDeque;

use tracing::{debug, error, info, instrument};

use crate::config::HistoryConfig;
use crate::document::Document;
use crate::error::{ResourceError, Result};
use crate::kernel::GeometryKernel;
use crate::registry::{ShapeHandle, ShapeRegistry};

/// Which way the history moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreKind {
    Undo,
    Redo,
}

/// Fired after an undo or redo installs a new live document.
///
/// Listeners should cancel in-flight interactive edits and rebuild their
/// views from the restored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreEvent {
    pub kind: RestoreKind,
    pub undo_depth: usize,
    pub redo_depth: usize,
}

/// Identifies a restore listener for [`History::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&RestoreEvent)>;

/// A retained copy of the document at one instant.
#[derive(Debug, Clone)]
struct Snapshot {
    document: Document,
    handles: Vec<ShapeHandle>,
}

/// Bounded undo and redo stacks of document snapshots.
pub struct History {
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
    config: HistoryConfig,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for History {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("History")
            .field("undo_depth", &self.undo.len())
            .field("redo_depth", &self.redo.len())
            .field("config", &self.config)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl History {
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            config,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    /// Every handle retained by a snapshot, once per retain.
    pub fn retained_handles(&self) -> impl Iterator<Item = ShapeHandle> + '_ {
        self.undo
            .iter()
            .chain(&self.redo)
            .flat_map(|s| s.handles.iter().copied())
    }

    /// Records `document` on the undo stack ahead of a mutation.
    ///
    /// Discards the redo stack and evicts the oldest snapshot beyond the
    /// configured depth. Call this before mutating the live document.
    ///
    /// # Errors
    ///
    /// Returns a resource error if the document references an unknown handle.
    /// The history is then unchanged and no retain is left behind.
    #[instrument(skip_all, fields(bodies = document.bodies.len()))]
    pub fn push_snapshot<K: GeometryKernel + ?Sized>(
        &mut self,
        document: &Document,
        registry: &mut ShapeRegistry,
        kernel: &mut K,
    ) -> Result<()> {
        let snapshot = self.capture(document, registry, kernel)?;
        self.clear_redo(registry, kernel);
        self.push_undo(snapshot, registry, kernel);
        debug!(undo_depth = self.undo.len(), "pushed snapshot");
        Ok(())
    }

    /// Restores the most recent snapshot into `live`.
    ///
    /// Returns `false` without doing anything if there is nothing to undo.
    ///
    /// # Errors
    ///
    /// Returns a resource error if the live document references an unknown
    /// handle; nothing changes in that case.
    #[instrument(skip_all)]
    pub fn undo<K: GeometryKernel + ?Sized>(
        &mut self,
        live: &mut Document,
        registry: &mut ShapeRegistry,
        kernel: &mut K,
    ) -> Result<bool> {
        if self.undo.is_empty() {
            return Ok(false);
        }
        let current = self.capture(live, registry, kernel)?;
        let Some(restored) = self.undo.pop_back() else {
            return Ok(false);
        };
        self.redo.push(current);
        self.install(restored, live, registry, kernel);
        info!(undo_depth = self.undo.len(), redo_depth = self.redo.len(), "undo");
        self.notify(RestoreKind::Undo);
        Ok(true)
    }

    /// Re-applies the most recently undone snapshot into `live`.
    ///
    /// Returns `false` without doing anything if there is nothing to redo.
    ///
    /// # Errors
    ///
    /// Returns a resource error if the live document references an unknown
    /// handle; nothing changes in that case.
    #[instrument(skip_all)]
    pub fn redo<K: GeometryKernel + ?Sized>(
        &mut self,
        live: &mut Document,
        registry: &mut ShapeRegistry,
        kernel: &mut K,
    ) -> Result<bool> {
        if self.redo.is_empty() {
            return Ok(false);
        }
        let current = self.capture(live, registry, kernel)?;
        let Some(restored) = self.redo.pop() else {
            return Ok(false);
        };
        self.push_undo(current, registry, kernel);
        self.install(restored, live, registry, kernel);
        info!(undo_depth = self.undo.len(), redo_depth = self.redo.len(), "redo");
        self.notify(RestoreKind::Redo);
        Ok(true)
    }

    /// Drops every snapshot, releasing their retains.
    pub fn clear<K: GeometryKernel + ?Sized>(
        &mut self,
        registry: &mut ShapeRegistry,
        kernel: &mut K,
    ) {
        self.clear_redo(registry, kernel);
        while let Some(snapshot) = self.undo.pop_front() {
            self.release_all(&snapshot.handles, registry, kernel);
        }
    }

    /// Registers a restore listener.
    pub fn subscribe(&mut self, listener: impl FnMut(&RestoreEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a restore listener, returning whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(other, _)| *other != id);
        self.listeners.len() != before
    }

    /// Clones `document` and retains every handle it references.
    ///
    /// On failure the retains taken so far are rolled back.
    fn capture<K: GeometryKernel + ?Sized>(
        &self,
        document: &Document,
        registry: &mut ShapeRegistry,
        kernel: &mut K,
    ) -> Result<Snapshot> {
        let handles = document.shape_handles();
        for (i, &handle) in handles.iter().enumerate() {
            if let Err(err) = registry.retain(handle) {
                self.release_all(&handles[..i], registry, kernel);
                return Err(err.into());
            }
        }
        Ok(Snapshot {
            document: document.clone(),
            handles,
        })
    }

    /// Makes `snapshot` the live document. Its retains become the live
    /// references; the replaced document's references are released.
    fn install<K: GeometryKernel + ?Sized>(
        &self,
        snapshot: Snapshot,
        live: &mut Document,
        registry: &mut ShapeRegistry,
        kernel: &mut K,
    ) {
        let replaced = std::mem::replace(live, snapshot.document);
        self.release_all(&replaced.shape_handles(), registry, kernel);
    }

    fn push_undo<K: GeometryKernel + ?Sized>(
        &mut self,
        snapshot: Snapshot,
        registry: &mut ShapeRegistry,
        kernel: &mut K,
    ) {
        self.undo.push_back(snapshot);
        while self.undo.len() > self.config.max_depth {
            if let Some(evicted) = self.undo.pop_front() {
                debug!(handles = evicted.handles.len(), "evicted oldest snapshot");
                self.release_all(&evicted.handles, registry, kernel);
            }
        }
    }

    fn clear_redo<K: GeometryKernel + ?Sized>(
        &mut self,
        registry: &mut ShapeRegistry,
        kernel: &mut K,
    ) {
        for snapshot in std::mem::take(&mut self.redo) {
            self.release_all(&snapshot.handles, registry, kernel);
        }
    }

    fn release_all<K: GeometryKernel + ?Sized>(
        &self,
        handles: &[ShapeHandle],
        registry: &mut ShapeRegistry,
        kernel: &mut K,
    ) {
        for &handle in handles {
            if let Err(err) = registry.release(kernel, handle) {
                self.invariant_violation(err);
            }
        }
    }

    fn invariant_violation(&self, err: ResourceError) {
        error!(%err, "history reference count invariant violated");
        assert!(
            !self.config.strict_invariants,
            "history reference count invariant violated: {err}"
        );
    }

    fn notify(&mut self, kind: RestoreKind) {
        let event = RestoreEvent {
            kind,
            undo_depth: self.undo.len(),
            redo_depth: self.redo.len(),
        };
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }
}
