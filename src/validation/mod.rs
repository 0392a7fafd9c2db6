//! Field-level validation: declarative rules, named validators, field
//! adapters for composite widgets, and touched/invalid bookkeeping.

mod adapters;
mod engine;
mod rules;
mod touch;
mod validators;

pub use adapters::{CompositeAdapter, DefaultAdapter, FieldAdapter};
pub use engine::FieldValidator;
pub use rules::{parse_rules, Rule};
pub use touch::TouchState;
pub use validators::{builtin_validators, Validator, ValidatorCx};
