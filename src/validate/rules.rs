use crate::core::{FieldValue, Record, SubItemId};
use crate::path::{FieldLocation, Scope};
use crate::pending::Patch;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Field-path key → message.
pub type Violations = BTreeMap<String, String>;

/// Whether required-ness is enforced. Creation flows require every
/// required field to end up present; edits only check what was staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    Create,
    #[default]
    Edit,
}

/// Cross-cutting facts a rule cannot derive from the patch alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationContext<'a> {
    /// Last known canonical record, if the caller has one.
    pub record: Option<&'a Record>,
    pub mode: ValidationMode,
}

impl<'a> ValidationContext<'a> {
    pub fn new(record: Option<&'a Record>, mode: ValidationMode) -> Self {
        Self { record, mode }
    }

    fn canonical(&self, location: &FieldLocation) -> Option<&'a FieldValue> {
        let record = self.record?;
        match location {
            FieldLocation::Top { field } => record.field(field),
            FieldLocation::SubObject { field } => record.sub_object_field(field),
            FieldLocation::SubItem { sub_item_id, field } => record
                .sub_item(sub_item_id)
                .and_then(|item| item.fields.get(field)),
        }
    }
}

/// Which field a rule applies to. A sub-item selector applies to that field
/// on every sub-item of the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelector {
    scope: Scope,
    field: String,
}

impl FieldSelector {
    pub fn top(field: impl Into<String>) -> Self {
        Self {
            scope: Scope::Top,
            field: field.into(),
        }
    }

    pub fn sub_object(field: impl Into<String>) -> Self {
        Self {
            scope: Scope::SubObject,
            field: field.into(),
        }
    }

    pub fn sub_item(field: impl Into<String>) -> Self {
        Self {
            scope: Scope::SubItem,
            field: field.into(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    fn staged<'p>(&self, patch: &'p Patch) -> Vec<(FieldLocation, &'p FieldValue)> {
        match self.scope {
            Scope::Top => patch
                .top_level()
                .get(&self.field)
                .map(|value| (FieldLocation::top(self.field.clone()), value))
                .into_iter()
                .collect(),
            Scope::SubObject => patch
                .sub_object()
                .get(&self.field)
                .map(|value| (FieldLocation::sub_object(self.field.clone()), value))
                .into_iter()
                .collect(),
            Scope::SubItem => patch
                .sub_items()
                .iter()
                .filter_map(|(id, fields)| {
                    fields.get(&self.field).map(|value| {
                        (FieldLocation::sub_item(id.clone(), self.field.clone()), value)
                    })
                })
                .collect(),
        }
    }

    /// Every location this selector could address on the record, staged or not.
    fn all_locations(&self, patch: &Patch, ctx: &ValidationContext<'_>) -> Vec<FieldLocation> {
        match self.scope {
            Scope::Top => vec![FieldLocation::top(self.field.clone())],
            Scope::SubObject => vec![FieldLocation::sub_object(self.field.clone())],
            Scope::SubItem => sub_item_order(patch, ctx)
                .into_iter()
                .map(|id| FieldLocation::sub_item(id, self.field.clone()))
                .collect(),
        }
    }
}

/// Canonical sub-item order, then ids that only exist in the patch.
fn sub_item_order(patch: &Patch, ctx: &ValidationContext<'_>) -> Vec<SubItemId> {
    let mut order: Vec<SubItemId> = ctx
        .record
        .and_then(|record| record.sub_items.as_deref())
        .map(|items| items.iter().map(|item| item.id.clone()).collect())
        .unwrap_or_default();
    for id in patch.sub_items().keys() {
        if !order.contains(id) {
            order.push(id.clone());
        }
    }
    order
}

fn record_violation(violations: &mut Violations, location: &FieldLocation, message: String) {
    violations.entry(location.to_key()).or_insert(message);
}

/// A single business invariant checked against a staged patch.
pub trait ValidationRule: Send + Sync {
    fn check(&self, patch: &Patch, ctx: &ValidationContext<'_>, violations: &mut Violations);
}

/// Rejects staged values longer than `max` characters.
#[derive(Debug, Clone)]
pub struct MaxLengthRule {
    pub target: FieldSelector,
    pub max: usize,
}

impl ValidationRule for MaxLengthRule {
    fn check(&self, patch: &Patch, _ctx: &ValidationContext<'_>, violations: &mut Violations) {
        for (location, value) in self.target.staged(patch) {
            if value.char_len() > self.max {
                record_violation(
                    violations,
                    &location,
                    format!("must be at most {} characters", self.max),
                );
            }
        }
    }
}

/// Inclusive numeric bounds. Blank staged values are left to
/// [`RequiredRule`].
#[derive(Debug, Clone)]
pub struct RangeRule {
    pub target: FieldSelector,
    pub min: f64,
    pub max: f64,
}

impl ValidationRule for RangeRule {
    fn check(&self, patch: &Patch, _ctx: &ValidationContext<'_>, violations: &mut Violations) {
        for (location, value) in self.target.staged(patch) {
            if value.is_blank() {
                continue;
            }
            match value.as_f64() {
                None => record_violation(violations, &location, "must be a number".to_string()),
                Some(number) if number < self.min || number > self.max => record_violation(
                    violations,
                    &location,
                    format!("must be between {} and {}", self.min, self.max),
                ),
                Some(_) => {}
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct RequiredRule {
    pub target: FieldSelector,
}

impl ValidationRule for RequiredRule {
    fn check(&self, patch: &Patch, ctx: &ValidationContext<'_>, violations: &mut Violations) {
        if ctx.mode != ValidationMode::Create {
            return;
        }
        for location in self.target.all_locations(patch, ctx) {
            let effective = patch.get(&location).or_else(|| ctx.canonical(&location));
            if effective.is_none_or(FieldValue::is_blank) {
                record_violation(violations, &location, "is required".to_string());
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct AllowedValuesRule {
    pub target: FieldSelector,
    pub allowed: BTreeSet<String>,
}

impl ValidationRule for AllowedValuesRule {
    fn check(&self, patch: &Patch, _ctx: &ValidationContext<'_>, violations: &mut Violations) {
        for (location, value) in self.target.staged(patch) {
            if value.is_blank() || self.allowed.contains(&value.to_string()) {
                continue;
            }
            let allowed: Vec<&str> = self.allowed.iter().map(String::as_str).collect();
            record_violation(
                violations,
                &location,
                format!("must be one of: {}", allowed.join(", ")),
            );
        }
    }
}

/// The natural-key field must be unique among a record's sub-items.
///
/// Effective values are compared: staged when present, otherwise last known.
/// Unstaged siblings are seeded first; staged items are then evaluated in
/// sub-item order, so the second of two colliding staged items is the one
/// reported.
#[derive(Debug, Clone)]
pub struct UniqueSubItemKeyRule {
    pub field: String,
}

impl ValidationRule for UniqueSubItemKeyRule {
    fn check(&self, patch: &Patch, ctx: &ValidationContext<'_>, violations: &mut Violations) {
        let order = sub_item_order(patch, ctx);
        let mut seen: HashSet<String> = HashSet::new();
        let mut staged: Vec<FieldLocation> = Vec::new();

        for id in order {
            let location = FieldLocation::sub_item(id, self.field.clone());
            if patch.contains(&location) {
                staged.push(location);
            } else if let Some(value) = ctx.canonical(&location).filter(|v| !v.is_blank()) {
                seen.insert(value.to_string());
            }
        }

        for location in staged {
            let Some(value) = patch.get(&location).filter(|v| !v.is_blank()) else {
                continue;
            };
            let key = value.to_string();
            if seen.contains(&key) {
                record_violation(violations, &location, format!("duplicate value '{key}'"));
            } else {
                seen.insert(key);
            }
        }
    }
}
