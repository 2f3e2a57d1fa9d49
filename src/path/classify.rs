use super::field_path::{ErrorKey, FieldGroup, FieldLocation};
use std::collections::BTreeSet;

/// Server-reported failure keys sorted into group sentinels and specific
/// fields. Keys that do not parse are kept verbatim in `unrecognized`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureClassification {
    pub group_failures: BTreeSet<FieldGroup>,
    pub specific_failures: BTreeSet<FieldLocation>,
    pub unrecognized: Vec<String>,
}

impl FailureClassification {
    /// Whether a staged field at `location` is considered rejected.
    pub fn fails(&self, location: &FieldLocation) -> bool {
        self.group_failures.iter().any(|group| group.covers(location))
            || self.specific_failures.contains(location)
    }

    pub fn is_empty(&self) -> bool {
        self.group_failures.is_empty()
            && self.specific_failures.is_empty()
            && self.unrecognized.is_empty()
    }

    pub fn has_unrecognized(&self) -> bool {
        !self.unrecognized.is_empty()
    }
}

pub fn classify<'a, I>(keys: I) -> FailureClassification
where
    I: IntoIterator<Item = &'a str>,
{
    let mut classification = FailureClassification::default();
    for key in keys {
        match ErrorKey::parse(key) {
            Ok(ErrorKey::Group(group)) => {
                classification.group_failures.insert(group);
            }
            Ok(ErrorKey::Field(location)) => {
                classification.specific_failures.insert(location);
            }
            Err(_) => classification.unrecognized.push(key.to_string()),
        }
    }
    classification
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_groups_and_fields() {
        let classification = classify(["record", "subobject.mass", "subitems.4", "oops"]);
        assert!(classification.group_failures.contains(&FieldGroup::Record));
        assert!(
            classification
                .group_failures
                .contains(&FieldGroup::SubItem("4".into()))
        );
        assert!(
            classification
                .specific_failures
                .contains(&FieldLocation::sub_object("mass"))
        );
        assert_eq!(classification.unrecognized, vec!["oops".to_string()]);
    }

    #[test]
    fn group_sentinel_fails_every_field_in_scope() {
        let classification = classify(["record"]);
        assert!(classification.fails(&FieldLocation::top("bmk")));
        assert!(classification.fails(&FieldLocation::top("description")));
        assert!(!classification.fails(&FieldLocation::sub_object("bmk")));
    }

    #[test]
    fn sub_object_sentinel_fails_only_sub_object_fields() {
        let classification = classify(["subobject"]);
        assert!(classification.fails(&FieldLocation::sub_object("mass")));
        assert!(classification.fails(&FieldLocation::sub_object("notes")));
        assert!(!classification.fails(&FieldLocation::top("mass")));
        assert!(!classification.fails(&FieldLocation::sub_item("s1", "mass")));
    }

    #[test]
    fn specific_failure_fails_only_that_field() {
        let classification = classify(["record.description"]);
        assert!(classification.fails(&FieldLocation::top("description")));
        assert!(!classification.fails(&FieldLocation::top("bmk")));
    }

    #[test]
    fn sub_items_are_independent() {
        let classification = classify(["subitems.a", "subitems.b.key"]);
        assert!(classification.fails(&FieldLocation::sub_item("a", "key")));
        assert!(classification.fails(&FieldLocation::sub_item("a", "label")));
        assert!(classification.fails(&FieldLocation::sub_item("b", "key")));
        assert!(!classification.fails(&FieldLocation::sub_item("b", "label")));
        assert!(!classification.fails(&FieldLocation::sub_item("c", "key")));
    }

    #[test]
    fn empty_input() {
        assert!(classify(std::iter::empty()).is_empty());
    }
}
