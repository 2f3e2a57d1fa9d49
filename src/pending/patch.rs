use crate::core::{FieldMap, FieldValue, SubItemId};
use crate::path::FieldLocation;
use std::collections::BTreeMap;

/// Staged, unconfirmed edits for one record.
///
/// `version` is assigned by the owning store on every change, so a patch
/// captured before a submission can be compared with the current one after
/// it resolves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    top_level: FieldMap,
    sub_object: FieldMap,
    sub_items: BTreeMap<SubItemId, FieldMap>,
    version: u64,
}

impl Patch {
    pub(crate) fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn top_level(&self) -> &FieldMap {
        &self.top_level
    }

    pub fn sub_object(&self) -> &FieldMap {
        &self.sub_object
    }

    pub fn sub_items(&self) -> &BTreeMap<SubItemId, FieldMap> {
        &self.sub_items
    }

    pub fn sub_item(&self, sub_item_id: &str) -> Option<&FieldMap> {
        self.sub_items.get(sub_item_id)
    }

    pub fn is_empty(&self) -> bool {
        self.top_level.is_empty()
            && self.sub_object.is_empty()
            && self.sub_items.values().all(FieldMap::is_empty)
    }

    pub fn field_count(&self) -> usize {
        self.top_level.len()
            + self.sub_object.len()
            + self.sub_items.values().map(FieldMap::len).sum::<usize>()
    }

    pub fn get(&self, location: &FieldLocation) -> Option<&FieldValue> {
        match location {
            FieldLocation::Top { field } => self.top_level.get(field),
            FieldLocation::SubObject { field } => self.sub_object.get(field),
            FieldLocation::SubItem { sub_item_id, field } => self
                .sub_items
                .get(sub_item_id)
                .and_then(|fields| fields.get(field)),
        }
    }

    pub fn contains(&self, location: &FieldLocation) -> bool {
        self.get(location).is_some()
    }

    pub(crate) fn set(&mut self, location: FieldLocation, value: FieldValue) {
        match location {
            FieldLocation::Top { field } => {
                self.top_level.insert(field, value);
            }
            FieldLocation::SubObject { field } => {
                self.sub_object.insert(field, value);
            }
            FieldLocation::SubItem { sub_item_id, field } => {
                self.sub_items
                    .entry(sub_item_id)
                    .or_default()
                    .insert(field, value);
            }
        }
    }

    pub(crate) fn remove(&mut self, location: &FieldLocation) -> Option<FieldValue> {
        match location {
            FieldLocation::Top { field } => self.top_level.remove(field),
            FieldLocation::SubObject { field } => self.sub_object.remove(field),
            FieldLocation::SubItem { sub_item_id, field } => {
                let fields = self.sub_items.get_mut(sub_item_id)?;
                let removed = fields.remove(field);
                if fields.is_empty() {
                    self.sub_items.remove(sub_item_id);
                }
                removed
            }
        }
    }

    /// Every staged field with its location, in scope order.
    pub fn entries(&self) -> Vec<(FieldLocation, &FieldValue)> {
        let mut entries = Vec::with_capacity(self.field_count());
        for (field, value) in &self.top_level {
            entries.push((FieldLocation::top(field.clone()), value));
        }
        for (field, value) in &self.sub_object {
            entries.push((FieldLocation::sub_object(field.clone()), value));
        }
        for (sub_item_id, fields) in &self.sub_items {
            for (field, value) in fields {
                entries.push((FieldLocation::sub_item(sub_item_id.clone(), field.clone()), value));
            }
        }
        entries
    }

    /// The part of this patch that goes out on the wire.
    pub fn outgoing(&self, include_sub_items: bool) -> Patch {
        Patch {
            top_level: self.top_level.clone(),
            sub_object: self.sub_object.clone(),
            sub_items: if include_sub_items {
                self.sub_items
                    .iter()
                    .filter(|(_, fields)| !fields.is_empty())
                    .map(|(id, fields)| (id.clone(), fields.clone()))
                    .collect()
            } else {
                BTreeMap::new()
            },
            version: self.version,
        }
    }

    /// Drops every location present in `other`, whatever its value.
    pub fn without_locations(&self, other: &Patch) -> Patch {
        let mut narrowed = self.clone();
        for (location, _) in other.entries() {
            narrowed.remove(&location);
        }
        narrowed
    }

    /// Drops every entry the server confirmed with the exact value it was
    /// sent. Entries staged again with a different value stay pending.
    pub fn without_confirmed(&self, confirmed: &Patch) -> Patch {
        let mut narrowed = self.clone();
        for (location, sent) in confirmed.entries() {
            if narrowed.get(&location) == Some(sent) {
                narrowed.remove(&location);
            }
        }
        narrowed
    }
}
