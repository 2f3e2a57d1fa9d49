use super::rules::{
    AllowedValuesRule, FieldSelector, MaxLengthRule, RangeRule, RequiredRule,
    UniqueSubItemKeyRule, ValidationContext, ValidationRule, Violations,
};
use crate::path::ErrorInfo;
use crate::pending::Patch;
use tracing::debug;

/// Runs every configured rule against a staged patch before it is sent.
#[derive(Default)]
pub struct LocalValidator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl LocalValidator {
    /// Validator with no rules; every patch passes.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<Box<dyn ValidationRule>>) -> Self {
        Self { rules }
    }

    pub fn rule(mut self, rule: impl ValidationRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn max_length(self, target: FieldSelector, max: usize) -> Self {
        self.rule(MaxLengthRule { target, max })
    }

    pub fn range(self, target: FieldSelector, min: f64, max: f64) -> Self {
        self.rule(RangeRule { target, min, max })
    }

    pub fn required(self, target: FieldSelector) -> Self {
        self.rule(RequiredRule { target })
    }

    pub fn one_of<I, S>(self, target: FieldSelector, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rule(AllowedValuesRule {
            target,
            allowed: allowed.into_iter().map(Into::into).collect(),
        })
    }

    pub fn unique_sub_item_key(self, field: impl Into<String>) -> Self {
        self.rule(UniqueSubItemKeyRule {
            field: field.into(),
        })
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// `None` when the patch passes every rule, otherwise the violations keyed
    /// the same way the server keys its field errors.
    pub fn validate(
        &self,
        record_id: &str,
        patch: &Patch,
        ctx: &ValidationContext<'_>,
    ) -> Option<ErrorInfo> {
        let mut violations = Violations::new();
        for rule in &self.rules {
            rule.check(patch, ctx, &mut violations);
        }

        if violations.is_empty() {
            return None;
        }

        debug!(
            record_id,
            violations = violations.len(),
            "staged edits failed local validation"
        );
        Some(ErrorInfo::from_field_errors(None, violations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Record, SubItem};
    use crate::path::FieldLocation;
    use crate::validate::ValidationMode;

    fn staged(entries: &[(FieldLocation, &str)]) -> Patch {
        let mut patch = Patch::default();
        for (location, value) in entries {
            patch.set(location.clone(), (*value).into());
        }
        patch
    }

    fn edit_ctx(record: Option<&Record>) -> ValidationContext<'_> {
        ValidationContext::new(record, ValidationMode::Edit)
    }

    #[test]
    fn length_ceiling() {
        let validator = LocalValidator::new().max_length(FieldSelector::top("bmk"), 10);

        let too_long = staged(&[(FieldLocation::top("bmk"), "12345678901")]);
        let info = validator.validate("r1", &too_long, &edit_ctx(None)).unwrap();
        assert_eq!(
            info.field_error("bmk"),
            Some("must be at most 10 characters")
        );

        let fits = staged(&[(FieldLocation::top("bmk"), "1234567890")]);
        assert!(validator.validate("r1", &fits, &edit_ctx(None)).is_none());
    }

    #[test]
    fn range_only_checks_staged_values() {
        let validator = LocalValidator::new().range(FieldSelector::sub_object("mass"), 0.0, 100.0);
        let record = Record::new("r1").with_sub_object_field("mass", 500i64);

        let untouched = staged(&[(FieldLocation::top("bmk"), "A")]);
        assert!(validator.validate("r1", &untouched, &edit_ctx(Some(&record))).is_none());

        let out_of_range = staged(&[(FieldLocation::sub_object("mass"), "101")]);
        let info = validator
            .validate("r1", &out_of_range, &edit_ctx(Some(&record)))
            .unwrap();
        assert_eq!(
            info.fields.get("subobject.mass").map(String::as_str),
            Some("must be between 0 and 100")
        );

        let boundary = staged(&[(FieldLocation::sub_object("mass"), "100")]);
        assert!(validator.validate("r1", &boundary, &edit_ctx(Some(&record))).is_none());

        let not_a_number = staged(&[(FieldLocation::sub_object("mass"), "heavy")]);
        let info = validator
            .validate("r1", &not_a_number, &edit_ctx(Some(&record)))
            .unwrap();
        assert_eq!(info.field_error("mass"), Some("must be a number"));
    }

    #[test]
    fn required_only_in_create_mode() {
        let validator = LocalValidator::new().required(FieldSelector::top("name"));
        let blank = staged(&[(FieldLocation::top("name"), " ")]);

        assert!(validator.validate("r1", &blank, &edit_ctx(None)).is_none());

        let create = ValidationContext::new(None, ValidationMode::Create);
        let info = validator.validate("r1", &blank, &create).unwrap();
        assert_eq!(info.field_error("name"), Some("is required"));

        let record = Record::new("r1").with_field("name", "Existing");
        let untouched = staged(&[(FieldLocation::top("other"), "x")]);
        let create_with_record = ValidationContext::new(Some(&record), ValidationMode::Create);
        assert!(validator.validate("r1", &untouched, &create_with_record).is_none());
    }

    #[test]
    fn enum_membership() {
        let validator =
            LocalValidator::new().one_of(FieldSelector::top("status"), ["active", "retired"]);
        let bad = staged(&[(FieldLocation::top("status"), "broken")]);
        let info = validator.validate("r1", &bad, &edit_ctx(None)).unwrap();
        assert_eq!(info.field_error("status"), Some("must be one of: active, retired"));

        let good = staged(&[(FieldLocation::top("status"), "active")]);
        assert!(validator.validate("r1", &good, &edit_ctx(None)).is_none());
    }

    #[test]
    fn sub_item_key_uniqueness_flags_second_duplicate_only() {
        let validator = LocalValidator::new().unique_sub_item_key("key");
        let record = Record::new("r1")
            .with_sub_item(SubItem::new("s1").with_field("key", "A"))
            .with_sub_item(SubItem::new("s2").with_field("key", "B"))
            .with_sub_item(SubItem::new("s3").with_field("key", "C"));

        let patch = staged(&[
            (FieldLocation::sub_item("s1", "key"), "K"),
            (FieldLocation::sub_item("s2", "key"), "K"),
            (FieldLocation::sub_item("s3", "key"), "Z"),
        ]);
        let info = validator
            .validate("r1", &patch, &edit_ctx(Some(&record)))
            .unwrap();

        assert_eq!(info.fields.len(), 1);
        assert!(info.fields.contains_key("subitems.s2.key"));
        assert_eq!(info.sub_item_field_error("s2", "key"), Some("duplicate value 'K'"));
        assert!(info.sub_item_field_error("s1", "key").is_none());
        assert!(info.sub_item_field_error("s3", "key").is_none());
    }

    #[test]
    fn sub_item_key_collides_with_unstaged_sibling() {
        let validator = LocalValidator::new().unique_sub_item_key("key");
        let record = Record::new("r1")
            .with_sub_item(SubItem::new("s1").with_field("key", "A"))
            .with_sub_item(SubItem::new("s2").with_field("key", "B"));

        let patch = staged(&[(FieldLocation::sub_item("s2", "key"), "A")]);
        let info = validator
            .validate("r1", &patch, &edit_ctx(Some(&record)))
            .unwrap();
        assert!(info.fields.contains_key("subitems.s2.key"));

        let swap_free = staged(&[
            (FieldLocation::sub_item("s1", "key"), "B2"),
            (FieldLocation::sub_item("s2", "key"), "A"),
        ]);
        assert!(validator.validate("r1", &swap_free, &edit_ctx(Some(&record))).is_none());
    }

    #[test]
    fn first_violation_per_field_wins() {
        let validator = LocalValidator::new()
            .max_length(FieldSelector::top("code"), 2)
            .one_of(FieldSelector::top("code"), ["a"]);
        let patch = staged(&[(FieldLocation::top("code"), "abc")]);
        let info = validator.validate("r1", &patch, &edit_ctx(None)).unwrap();
        assert_eq!(info.field_error("code"), Some("must be at most 2 characters"));
        assert_eq!(validator.rule_count(), 2);
    }
}
