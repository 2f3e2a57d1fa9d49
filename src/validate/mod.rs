//! Local validation of staged patches, run before anything reaches the
//! network. Rules form a chain; every rule sees every patch and records its
//! violations under the same field-path keys the server uses.

mod rules;
mod validator;

pub use rules::{
    AllowedValuesRule, FieldSelector, MaxLengthRule, RangeRule, RequiredRule,
    UniqueSubItemKeyRule, ValidationContext, ValidationMode, ValidationRule, Violations,
};
pub use validator::LocalValidator;
