use super::form::{Form, Info, Item};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /v1/forms/{formId}:batchUpdate`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateFormRequest {
    pub requests: Vec<Request>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub include_form_in_response: bool,
}

impl BatchUpdateFormRequest {
    pub fn new(requests: Vec<Request>) -> Self {
        Self {
            requests,
            include_form_in_response: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateFormResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form: Option<Form>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_control: Option<Value>,
}

/// One entry of a batch update. Only the kinds the form creator emits are modelled.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    UpdateFormInfo(UpdateFormInfoRequest),
    CreateItem(CreateItemRequest),
}

impl Request {
    pub fn as_create_item(&self) -> Option<&CreateItemRequest> {
        match self {
            Self::CreateItem(req) => Some(req),
            Self::UpdateFormInfo(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFormInfoRequest {
    pub info: Info,

    /// Comma-separated field mask, e.g. `description`.
    pub update_mask: String,
}

impl UpdateFormInfoRequest {
    pub fn description(description: impl Into<String>) -> Self {
        Self {
            info: Info {
                description: Some(description.into()),
                ..Default::default()
            },
            update_mask: "description".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CreateItemRequest {
    pub item: Item,
    pub location: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Location {
    pub index: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn description_update_uses_field_mask() {
        let req = Request::UpdateFormInfo(UpdateFormInfoRequest::description("Join us"));
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "updateFormInfo": {
                    "info": { "description": "Join us" },
                    "updateMask": "description"
                }
            })
        );
    }

    #[test]
    fn batch_body_omits_include_form_flag_by_default() {
        let body = BatchUpdateFormRequest::new(vec![]);
        assert_eq!(serde_json::to_value(&body).unwrap(), json!({ "requests": [] }));
    }
}
