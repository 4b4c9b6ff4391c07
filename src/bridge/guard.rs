//! Scoped selection restore.

use crate::core::SelectionSnapshot;
use crate::host::Host;
use std::ops::{Deref, DerefMut};

/// Captures the host selection and mode, and restores them when dropped.
///
/// The host stays reachable through the guard, so an operation can
/// change selection and mode freely and still hand back the state it
/// found, including on early `?` returns.
///
/// # Examples
///
/// ```
/// use rizom_bridge::bridge::SelectionGuard;
/// use rizom_bridge::core::{InteractionMode, Mesh};
/// use rizom_bridge::host::{Host, SceneDocument, SceneFile};
///
/// let mut doc = SceneDocument::default();
/// let body = doc.add_mesh("Body", Mesh::default());
/// doc.select(&[body.clone()], Some(&body));
/// doc.mode = InteractionMode::Edit;
/// let mut host = SceneFile::unsaved(doc);
///
/// {
///     let mut guard = SelectionGuard::new(&mut host);
///     guard.set_mode(InteractionMode::Object);
///     guard.select_only(&[], None);
/// }
/// assert_eq!(host.selection().mode, InteractionMode::Edit);
/// assert_eq!(host.selection().selected, vec![body]);
/// ```
pub struct SelectionGuard<'a, H: Host> {
    host: &'a mut H,
    snapshot: SelectionSnapshot,
}

impl<'a, H: Host> SelectionGuard<'a, H> {
    /// Takes a snapshot of `host`.
    pub fn new(host: &'a mut H) -> Self {
        let snapshot = host.selection();
        Self { host, snapshot }
    }

    /// The state that will be restored.
    #[must_use]
    pub const fn snapshot(&self) -> &SelectionSnapshot {
        &self.snapshot
    }
}

impl<H: Host> Deref for SelectionGuard<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        &*self.host
    }
}

impl<H: Host> DerefMut for SelectionGuard<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        &mut *self.host
    }
}

impl<H: Host> Drop for SelectionGuard<'_, H> {
    fn drop(&mut self) {
        self.host.restore_selection(&self.snapshot);
    }
}
