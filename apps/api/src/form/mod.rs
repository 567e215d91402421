pub mod fields;
pub mod models;
pub mod validation;

pub use fields::{form_schema, FormField, FormSchema, ValidationProfile};
pub use models::{FieldErrors, RawStudentForm, StudentProfile};
pub use validation::validate_form;
