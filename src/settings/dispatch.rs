//! Diffing and hook dispatch.
//!
//! A commit compares the fields captured when the accessor opened against the
//! fields at release. Intermediate edits inside the scope are invisible: only
//! entry state versus exit state counts.

use crate::settings::fields::{FieldDescriptor, Fields, FIELDS};
use crate::settings::hooks::ApplyHooks;

/// Fields whose values differ between two snapshots, in schema order.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    changed: Vec<&'static FieldDescriptor>,
}

impl ChangeSet {
    pub fn diff(old: &Fields, new: &Fields) -> Self {
        Self {
            changed: FIELDS.iter().filter(|d| d.differs(old, new)).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changed.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.changed.iter().any(|d| d.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.changed.iter().map(|d| d.name)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &'static FieldDescriptor> + '_ {
        self.changed.iter().copied()
    }

    /// Emit one debug event per changed field.
    pub fn log(&self, old: &Fields, new: &Fields) {
        for desc in &self.changed {
            if desc.deprecated {
                tracing::debug!(field = desc.name, "Deprecated field changed");
            } else {
                tracing::debug!(
                    field = desc.name,
                    old = %desc.display_value(old),
                    new = %desc.display_value(new),
                    "Field changed"
                );
            }
        }
    }
}

/// Run the hook of every changed, live field, in schema order.
pub fn dispatch_changes(hooks: &dyn ApplyHooks, old: &Fields, new: &Fields, changes: &ChangeSet) {
    for hook in changes.descriptors().filter_map(FieldDescriptor::active_hook) {
        hook(hooks, old, new);
    }
}

/// Run every live hook with (value, value).
pub fn dispatch_all(hooks: &dyn ApplyHooks, fields: &Fields) {
    for hook in FIELDS.iter().filter_map(FieldDescriptor::active_hook) {
        hook(hooks, fields, fields);
    }
}
