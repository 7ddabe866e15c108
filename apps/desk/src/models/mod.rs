pub mod applicant;
pub mod nested;

pub use applicant::{Applicant, ApplicantSummary, LookupField, LookupKey};
pub use nested::{NestedRecord, RecordType};
