pub mod abstract_schema;
pub mod forms;

pub use abstract_schema::{AbstractField, AbstractSchema, FieldType};
pub use forms::{
    BatchUpdateFormRequest, BatchUpdateFormResponse, ChoiceOption, ChoiceQuestion, ChoiceType,
    CreateItemRequest, DateQuestion, Form, FormsApiErrorBody, FormsApiErrorObject, Info, Item,
    Location, Question, QuestionItem, QuestionKind, Request, TextQuestion, TimeQuestion,
    UpdateFormInfoRequest,
};
