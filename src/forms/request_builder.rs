//! Pure translation from an [`AbstractSchema`] to a `forms.batchUpdate` request list.
//!
//! Output order: the optional description update first, then one `createItem` per field in
//! input order with dense indices `0..N`. The description update does not take an index slot.

use crate::error::FormsyncError;
use formsync_schema::{
    AbstractField, AbstractSchema, ChoiceOption, ChoiceQuestion, ChoiceType, CreateItemRequest,
    DateQuestion, FieldType, Item, Location, Question, QuestionItem, QuestionKind, Request,
    TextQuestion, TimeQuestion, UpdateFormInfoRequest,
};

/// Option used when a choice field arrives without any options.
pub const FALLBACK_OPTION: &str = "Option 1";

/// Parse a request body into a schema, reporting shape problems as validation errors.
pub fn schema_from_json(body: &[u8]) -> Result<AbstractSchema, FormsyncError> {
    let schema: AbstractSchema = serde_json::from_slice(body)
        .map_err(|e| FormsyncError::Validation(e.to_string()))?;
    validate_schema(&schema)?;
    Ok(schema)
}

pub fn validate_schema(schema: &AbstractSchema) -> Result<(), FormsyncError> {
    if schema.title.trim().is_empty() {
        return Err(FormsyncError::Validation("title must not be empty".to_string()));
    }
    if let Some(pos) = schema.fields.iter().position(|f| f.label.trim().is_empty()) {
        return Err(FormsyncError::Validation(format!(
            "fields[{pos}].label must not be empty"
        )));
    }
    if u32::try_from(schema.fields.len()).is_err() {
        return Err(FormsyncError::Validation("too many fields".to_string()));
    }
    Ok(())
}

fn question_kind(field: &AbstractField) -> QuestionKind {
    match field.field_type {
        FieldType::Text => QuestionKind::TextQuestion(TextQuestion { paragraph: false }),
        FieldType::Textarea => QuestionKind::TextQuestion(TextQuestion { paragraph: true }),
        FieldType::Select | FieldType::Radio => {
            QuestionKind::ChoiceQuestion(choice_question(ChoiceType::Radio, &field.options))
        }
        FieldType::Checkbox => {
            QuestionKind::ChoiceQuestion(choice_question(ChoiceType::Checkbox, &field.options))
        }
        FieldType::Date => QuestionKind::DateQuestion(DateQuestion::default()),
        FieldType::Time => QuestionKind::TimeQuestion(TimeQuestion::default()),
    }
}

fn choice_question(choice_type: ChoiceType, options: &[String]) -> ChoiceQuestion {
    let options = if options.is_empty() {
        vec![ChoiceOption {
            value: FALLBACK_OPTION.to_string(),
        }]
    } else {
        options
            .iter()
            .map(|value| ChoiceOption {
                value: value.clone(),
            })
            .collect()
    };
    ChoiceQuestion {
        choice_type,
        options,
        shuffle: None,
    }
}

/// One `createItem` request for `field` at `index`. Total over every field type.
pub fn build_item_request(field: &AbstractField, index: u32) -> CreateItemRequest {
    CreateItemRequest {
        item: Item {
            title: Some(field.label.clone()),
            question_item: Some(QuestionItem {
                question: Question {
                    question_id: None,
                    required: field.required,
                    kind: question_kind(field),
                },
            }),
            ..Default::default()
        },
        location: Location { index },
    }
}

pub fn build_requests(schema: &AbstractSchema) -> Vec<Request> {
    let description = schema
        .non_empty_description()
        .map(|text| Request::UpdateFormInfo(UpdateFormInfoRequest::description(text)));

    description
        .into_iter()
        .chain(
            (0u32..)
                .zip(&schema.fields)
                .map(|(index, field)| Request::CreateItem(build_item_request(field, index))),
        )
        .collect()
}
