// Schema-driven dialogue core.
// The engine walks one repeating record a field at a time; the controllers own
// every read-modify-write of list-valued columns.

pub mod array_field;
pub mod catalog;
pub mod engine;
pub mod flat_list;
pub mod lookup;
pub mod schema;
pub mod validators;

pub use array_field::{ArrayFields, ArrayOp};
pub use engine::{Advance, WizardOp, WizardState};
pub use flat_list::{FlatLists, ListOp};
