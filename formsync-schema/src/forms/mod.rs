//! Google Forms API v1 object model (subset used for form creation).
//!
//! Layout:
//! - `form.rs`: `Form`, `Info`, `Item` and the question union
//! - `batch.rs`: `forms.batchUpdate` request/response envelopes
//! - `error.rs`: Google API error payload

mod batch;
mod error;
mod form;

pub use batch::{
    BatchUpdateFormRequest, BatchUpdateFormResponse, CreateItemRequest, Location, Request,
    UpdateFormInfoRequest,
};
pub use error::{FormsApiErrorBody, FormsApiErrorObject};
pub use form::{
    ChoiceOption, ChoiceQuestion, ChoiceType, DateQuestion, Form, Info, Item, Question,
    QuestionItem, QuestionKind, TextQuestion, TimeQuestion,
};
