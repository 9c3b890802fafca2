//! Ordered in-memory pin collection.

use crate::pin::{Pin, PinId, Tag};

/// Field changes applied by [`PinStore::update`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PinEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tag: Option<Tag>,
}

#[derive(Debug, Default)]
pub struct PinStore {
    pins: Vec<Pin>,
    next_id: u64,
}

impl PinStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> PinId {
        self.next_id += 1;
        PinId(self.next_id)
    }

    /// Creates an empty pin with a fresh id. The draft is not stored.
    pub fn draft(&mut self, x: f32, y: f32) -> Pin {
        Pin {
            id: self.next_id(),
            x,
            y,
            title: String::new(),
            description: String::new(),
            tag: Tag::Default,
        }
    }

    /// Appends `pin` unless a pin with the same id is already present.
    /// Returns `true` when the pin was inserted.
    pub fn add(&mut self, pin: Pin) -> bool {
        if self.contains(pin.id) {
            return false;
        }
        self.next_id = self.next_id.max(pin.id.0);
        self.pins.push(pin);
        true
    }

    pub fn remove(&mut self, id: PinId) -> Option<Pin> {
        let index = self.pins.iter().position(|p| p.id == id)?;
        Some(self.pins.remove(index))
    }

    pub fn update(&mut self, id: PinId, edit: PinEdit) -> bool {
        let Some(pin) = self.pins.iter_mut().find(|p| p.id == id) else {
            return false;
        };
        if let Some(title) = edit.title {
            pin.title = title;
        }
        if let Some(description) = edit.description {
            pin.description = description;
        }
        if let Some(tag) = edit.tag {
            pin.tag = tag;
        }
        true
    }

    pub fn get(&self, id: PinId) -> Option<&Pin> {
        self.pins.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PinId) -> bool {
        self.get(id).is_some()
    }

    pub fn all(&self) -> &[Pin] {
        &self.pins
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    pub fn clear(&mut self) {
        self.pins.clear();
    }

    /// Replaces the whole collection.
    pub fn replace(&mut self, pins: Vec<Pin>) {
        self.pins.clear();
        for pin in pins {
            self.add(pin);
        }
    }

    /// Groups pins by tag. Groups appear in first-seen tag order, pins keep
    /// insertion order within a group.
    pub fn group_by_tag(&self) -> Vec<(Tag, Vec<&Pin>)> {
        let mut groups: Vec<(Tag, Vec<&Pin>)> = Vec::new();
        for pin in &self.pins {
            match groups.iter_mut().find(|(tag, _)| *tag == pin.tag) {
                Some((_, members)) => members.push(pin),
                None => groups.push((pin.tag, vec![pin])),
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titled(store: &mut PinStore, title: &str, tag: Tag) -> Pin {
        let mut pin = store.draft(0.0, 0.0);
        pin.title = title.to_string();
        pin.tag = tag;
        pin
    }

    #[test]
    fn group_single_warning_pin() {
        let mut store = PinStore::new();
        let mut pin = store.draft(50.0, 50.0);
        pin.title = "A".into();
        pin.tag = Tag::Warning;
        store.add(pin.clone());

        let groups = store.group_by_tag();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].0, Tag::Warning);
        assert_eq!(groups[0].1, vec![&pin]);
    }

    #[test]
    fn groups_follow_first_seen_order() {
        let mut store = PinStore::new();
        for (title, tag) in [
            ("a", Tag::Info),
            ("b", Tag::Important),
            ("c", Tag::Info),
            ("d", Tag::Default),
            ("e", Tag::Important),
        ] {
            let pin = titled(&mut store, title, tag);
            store.add(pin);
        }

        let groups: Vec<(Tag, Vec<&str>)> = store
            .group_by_tag()
            .into_iter()
            .map(|(tag, pins)| (tag, pins.iter().map(|p| p.title.as_str()).collect()))
            .collect();
        assert_eq!(
            groups,
            vec![
                (Tag::Info, vec!["a", "c"]),
                (Tag::Important, vec!["b", "e"]),
                (Tag::Default, vec!["d"]),
            ]
        );
    }

    #[test]
    fn add_is_idempotent_per_id() {
        let mut store = PinStore::new();
        let pin = titled(&mut store, "same", Tag::Default);
        assert!(store.add(pin.clone()));
        assert!(!store.add(pin.clone()));
        assert_eq!(store.len(), 1);

        // Equal content with a different id is a different pin.
        let mut twin = pin.clone();
        twin.id = store.next_id();
        assert!(store.add(twin));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn remove_by_id_only_removes_that_pin() {
        let mut store = PinStore::new();
        let a = titled(&mut store, "dup", Tag::Default);
        let mut b = a.clone();
        b.id = store.next_id();
        store.add(a.clone());
        store.add(b.clone());

        assert_eq!(store.remove(a.id).map(|p| p.id), Some(a.id));
        assert_eq!(store.all(), &[b]);
        assert!(store.remove(a.id).is_none());
    }

    #[test]
    fn update_changes_only_given_fields() {
        let mut store = PinStore::new();
        let pin = titled(&mut store, "old", Tag::Info);
        store.add(pin.clone());

        let changed = store.update(
            pin.id,
            PinEdit {
                description: Some("details".into()),
                ..Default::default()
            },
        );
        assert!(changed);
        let stored = store.get(pin.id).unwrap();
        assert_eq!(stored.title, "old");
        assert_eq!(stored.description, "details");
        assert_eq!(stored.tag, Tag::Info);

        assert!(!store.update(PinId(999), PinEdit::default()));
    }

    #[test]
    fn drafts_get_fresh_ids_after_replace() {
        let mut store = PinStore::new();
        store.replace(vec![Pin {
            id: PinId(40),
            x: 1.0,
            y: 2.0,
            title: "loaded".into(),
            description: String::new(),
            tag: Tag::Default,
        }]);
        let draft = store.draft(0.0, 0.0);
        assert!(draft.id > PinId(40));
        assert!(!store.contains(draft.id));
    }

    #[test]
    fn replace_discards_previous_pins() {
        let mut store = PinStore::new();
        let old = titled(&mut store, "old", Tag::Default);
        store.add(old);
        let new = titled(&mut store, "new", Tag::Info);
        store.replace(vec![new.clone()]);
        assert_eq!(store.all(), &[new]);
    }

    #[test]
    fn len_tracks_add_remove_and_clear() {
        let mut store = PinStore::new();
        assert!(store.is_empty());
        let pin = titled(&mut store, "one", Tag::Default);
        store.add(pin.clone());
        assert_eq!(store.len(), 1);
        assert!(!store.is_empty());
        store.remove(pin.id);
        assert!(store.is_empty());
        store.add(pin);
        store.clear();
        assert_eq!(store.len(), 0);
    }
}
