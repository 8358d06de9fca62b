// Rust
use core::fmt;

// 3rd-party
use hashbrown::HashMap;

// Streams
use lets::id::{Identifier, Permissioned};

/// Mapping of every known publisher, with its [`Permissioned`] [`Identifier`], to the sequence
/// number of its last message
#[derive(Default, Clone, PartialEq, Eq)]
pub(crate) struct CursorStore(HashMap<Permissioned<Identifier>, usize>);

impl CursorStore {
    pub(crate) fn new() -> Self {
        Default::default()
    }

    /// Remove the cursor of the given identifier, returning true if the cursor was found and
    /// removed.
    pub(crate) fn remove(&mut self, id: &Identifier) -> bool {
        let permission = self.get_permission(id).cloned();
        permission.map_or(false, |perm| self.0.remove(&perm).is_some())
    }

    /// Given an [`Identifier`], return its [`Permissioned`] [`Identifier`] if it exists
    pub(crate) fn get_permission(&self, id: &Identifier) -> Option<&Permissioned<Identifier>> {
        self.0.keys().find(|perm| perm.identifier() == id)
    }

    /// Given an [`Identifier`], return its cursor if it exists
    pub(crate) fn get_cursor(&self, id: &Identifier) -> Option<usize> {
        self.0
            .iter()
            .find(|(perm, _)| perm.identifier() == id)
            .map(|(_, cursor)| *cursor)
    }

    /// Returns an iterator over all the cursors
    pub(crate) fn cursors(&self) -> impl Iterator<Item = (&Permissioned<Identifier>, usize)> + Clone + '_ {
        self.0.iter().map(|(perm, cursor)| (perm, *cursor))
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    /// If the [`Identifier`] is already in the map with a different permission, the old
    /// permission is replaced and the old cursor kept. Otherwise, insert the new permission and
    /// cursor.
    ///
    /// Returns:
    /// The old cursor value, if any.
    pub(crate) fn insert_cursor(&mut self, id: Permissioned<Identifier>, cursor: usize) -> Option<usize> {
        let cursor = match self.get_permission(id.identifier()) {
            Some(perm) if perm != &id => {
                let old = perm.clone();
                return self.0.remove(&old).map(|old_cursor| {
                    self.0.insert(id, old_cursor);
                    old_cursor
                });
            }
            _ => cursor,
        };
        self.0.insert(id, cursor)
    }

    /// Moves the cursor of a known publisher forward. Cursors never go back, so that reading an
    /// old message again does not make the publisher's next messages be read twice.
    ///
    /// Returns:
    /// Whether the publisher is known.
    pub(crate) fn advance_cursor(&mut self, id: &Identifier, cursor: usize) -> bool {
        match self.0.iter_mut().find(|(perm, _)| perm.identifier() == id) {
            Some((_, current)) => {
                if cursor > *current {
                    *current = cursor;
                }
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for CursorStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "* cursors:")?;
        for (id, cursor) in self.0.iter() {
            writeln!(f, "\t{:?} => {}", id, cursor)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::CursorStore;
    use lets::id::{Ed25519, Identity, Permissioned};

    #[test]
    fn changing_permission_keeps_the_cursor() {
        let mut cursor_store = CursorStore::new();
        let identifier = Identity::from(Ed25519::from_seed("identifier 1")).identifier().clone();

        cursor_store.insert_cursor(Permissioned::Read(identifier.clone()), 10);
        cursor_store.insert_cursor(Permissioned::ReadWrite(identifier.clone()), 0);

        assert_eq!(cursor_store.get_cursor(&identifier), Some(10));
        assert_eq!(
            cursor_store.get_permission(&identifier),
            Some(&Permissioned::ReadWrite(identifier.clone()))
        );
        assert_eq!(cursor_store.len(), 1);
    }

    #[test]
    fn cursors_only_move_forward() {
        let mut cursor_store = CursorStore::new();
        let identifier = Identity::from(Ed25519::from_seed("identifier 1")).identifier().clone();
        let stranger = Identity::from(Ed25519::from_seed("identifier 2")).identifier().clone();

        cursor_store.insert_cursor(Permissioned::ReadWrite(identifier.clone()), 3);
        assert!(cursor_store.advance_cursor(&identifier, 2));
        assert_eq!(cursor_store.get_cursor(&identifier), Some(3));
        assert!(cursor_store.advance_cursor(&identifier, 5));
        assert_eq!(cursor_store.get_cursor(&identifier), Some(5));
        assert!(!cursor_store.advance_cursor(&stranger, 1));
    }

    #[test]
    fn removed_cursor_is_gone() {
        let mut cursor_store = CursorStore::new();
        let identifier = Identity::from(Ed25519::from_seed("identifier 1")).identifier().clone();
        cursor_store.insert_cursor(Permissioned::Read(identifier.clone()), 1);
        assert!(cursor_store.remove(&identifier));
        assert!(!cursor_store.remove(&identifier));
        assert_eq!(cursor_store.get_cursor(&identifier), None);
    }
}
