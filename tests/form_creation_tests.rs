use axum::{
    Json, Router,
    extract::{Request, State},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use formsync::config::{GoogleConfig, REQUIRED_SCOPES};
use formsync::credentials::CredentialRecord;
use formsync::{FormsyncError, Services};
use formsync_schema::AbstractSchema;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use url::Url;

const FORM_ID: &str = "1FAIpQLSd-form";

#[derive(Clone, Copy, Default)]
struct ProviderBehavior {
    fail_batch: bool,
    omit_responder_uri: bool,
    stall_create: bool,
    stall_batch: bool,
}

impl ProviderBehavior {
    fn stalls(self) -> bool {
        self.stall_create || self.stall_batch
    }
}

// Longer than the 1s request timeout the stalling harness configures.
const STALL: StdDuration = StdDuration::from_secs(3);

#[derive(Debug, Clone)]
struct Captured {
    method: Method,
    path: String,
    authorization: Option<String>,
    body: Value,
}

#[derive(Clone)]
struct ProviderState {
    behavior: ProviderBehavior,
    reqs: Arc<Mutex<Vec<Captured>>>,
}

async fn provider_handler(State(state): State<ProviderState>, req: Request) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = axum::body::to_bytes(req.into_body(), usize::MAX)
        .await
        .expect("read body");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    state.reqs.lock().unwrap().push(Captured {
        method: method.clone(),
        path: path.clone(),
        authorization,
        body: body.clone(),
    });

    if method != Method::POST {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    if path == "/v1/forms" {
        if state.behavior.stall_create {
            tokio::time::sleep(STALL).await;
        }
        let mut form = json!({
            "formId": FORM_ID,
            "info": body["info"].clone(),
            "revisionId": "00000002",
            "settings": {}
        });
        if !state.behavior.omit_responder_uri {
            form["responderUri"] = json!(format!(
                "https://docs.google.com/forms/d/e/{FORM_ID}/viewform"
            ));
        }
        return Json(form).into_response();
    }

    if path == format!("/v1/forms/{FORM_ID}:batchUpdate") {
        if state.behavior.stall_batch {
            tokio::time::sleep(STALL).await;
        }
        if state.behavior.fail_batch {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": {
                        "code": 400,
                        "message": "Invalid requests[0].createItem: empty option value",
                        "status": "INVALID_ARGUMENT"
                    }
                })),
            )
                .into_response();
        }
        let replies: Vec<Value> = body["requests"]
            .as_array()
            .map(|reqs| reqs.iter().map(|_| json!({})).collect())
            .unwrap_or_default();
        return Json(json!({ "replies": replies, "writeControl": { "requiredRevisionId": "00000003" } }))
            .into_response();
    }

    StatusCode::NOT_FOUND.into_response()
}

async fn spawn_test_server(app: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    let base = Url::parse(&format!("http://{addr}")).expect("valid base url");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server run");
    });

    base
}

struct Harness {
    _dir: TempDir,
    services: Services,
    reqs: Arc<Mutex<Vec<Captured>>>,
}

async fn harness(behavior: ProviderBehavior, authenticated: bool) -> Harness {
    let reqs = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .fallback(provider_handler)
        .with_state(ProviderState {
            behavior,
            reqs: reqs.clone(),
        });
    let base = spawn_test_server(app).await;

    let dir = tempfile::tempdir().expect("tempdir");
    let mut google = GoogleConfig::default();
    google.client_secret_path = dir.path().join("credentials.json");
    google.token_path = dir.path().join("token.json");
    google.forms_api_url = base;
    if behavior.stalls() {
        google.request_timeout_secs = 1;
    }

    let services = Services::build(&google.resolve()).expect("services");
    if authenticated {
        services
            .credentials
            .store()
            .save(&CredentialRecord {
                access_token: "forms-access".to_string(),
                token_type: "Bearer".to_string(),
                refresh_token: Some("refresh".to_string()),
                expiry: Utc::now() + Duration::hours(1),
                scopes: REQUIRED_SCOPES.iter().map(ToString::to_string).collect(),
            })
            .await
            .unwrap();
    }

    Harness {
        _dir: dir,
        services,
        reqs,
    }
}

fn schema(value: Value) -> AbstractSchema {
    serde_json::from_value(value).expect("valid schema")
}

#[tokio::test]
async fn creates_form_then_applies_items_in_one_batch() {
    let h = harness(ProviderBehavior::default(), true).await;
    let rsvp = schema(json!({
        "title": "RSVP",
        "fields": [{ "label": "Name", "type": "text", "required": true }]
    }));

    let result = h.services.create_provider_form(&rsvp).await.unwrap();

    assert_eq!(result.form_id, FORM_ID);
    assert!(!result.responder_uri.is_empty());
    assert_eq!(
        result.edit_uri,
        format!("https://docs.google.com/forms/d/{FORM_ID}/edit")
    );

    let reqs = h.reqs.lock().unwrap();
    assert_eq!(reqs.len(), 2);

    assert_eq!(reqs[0].path, "/v1/forms");
    assert_eq!(reqs[0].authorization.as_deref(), Some("Bearer forms-access"));
    assert_eq!(
        reqs[0].body,
        json!({ "info": { "title": "RSVP", "documentTitle": "RSVP" } })
    );

    assert_eq!(reqs[1].path, format!("/v1/forms/{FORM_ID}:batchUpdate"));
    assert_eq!(
        reqs[1].body,
        json!({
            "requests": [{
                "createItem": {
                    "item": {
                        "title": "Name",
                        "questionItem": {
                            "question": { "required": true, "textQuestion": {} }
                        }
                    },
                    "location": { "index": 0 }
                }
            }]
        })
    );
}

#[tokio::test]
async fn checkbox_without_options_gets_fallback_option_in_batch() {
    let h = harness(ProviderBehavior::default(), true).await;
    let survey = schema(json!({
        "title": "Survey",
        "description": "Quick poll",
        "fields": [
            { "label": "Why", "type": "textarea" },
            { "label": "Pick any", "type": "checkbox", "options": [] }
        ]
    }));

    h.services.create_provider_form(&survey).await.unwrap();

    let reqs = h.reqs.lock().unwrap();
    let requests = reqs[1].body["requests"].as_array().unwrap();
    assert_eq!(requests.len(), 3);

    assert_eq!(
        requests[0],
        json!({
            "updateFormInfo": {
                "info": { "description": "Quick poll" },
                "updateMask": "description"
            }
        })
    );
    assert_eq!(requests[1]["createItem"]["location"]["index"], 0);
    assert_eq!(
        requests[1]["createItem"]["item"]["questionItem"]["question"]["textQuestion"]["paragraph"],
        true
    );
    assert_eq!(requests[2]["createItem"]["location"]["index"], 1);
    assert_eq!(
        requests[2]["createItem"]["item"]["questionItem"]["question"]["choiceQuestion"],
        json!({ "type": "CHECKBOX", "options": [{ "value": "Option 1" }] })
    );
}

#[tokio::test]
async fn unauthenticated_run_fails_before_any_network_call() {
    let h = harness(ProviderBehavior::default(), false).await;
    let rsvp = schema(json!({ "title": "RSVP", "fields": [{ "label": "Name" }] }));

    let err = h.services.create_provider_form(&rsvp).await.unwrap_err();

    assert!(matches!(err, FormsyncError::NotAuthenticated));
    assert!(h.reqs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_batch_reports_orphaned_form_without_cleanup() {
    let h = harness(
        ProviderBehavior {
            fail_batch: true,
            ..Default::default()
        },
        true,
    )
    .await;
    let rsvp = schema(json!({ "title": "RSVP", "fields": [{ "label": "Name" }] }));

    let err = h.services.create_provider_form(&rsvp).await.unwrap_err();

    match err {
        FormsyncError::ProviderRequest {
            status,
            message,
            form_id,
        } => {
            assert_eq!(status, Some(StatusCode::BAD_REQUEST));
            assert!(message.contains("empty option value"), "message: {message}");
            assert_eq!(form_id.as_deref(), Some(FORM_ID));
        }
        other => panic!("expected ProviderRequest, got {other:?}"),
    }

    let reqs = h.reqs.lock().unwrap();
    assert_eq!(reqs.len(), 2);
    assert!(reqs.iter().all(|r| r.method == Method::POST));
}

#[tokio::test]
async fn empty_schema_skips_the_batch_call() {
    let h = harness(ProviderBehavior::default(), true).await;
    let empty = schema(json!({ "title": "Blank", "description": "   ", "fields": [] }));

    h.services.create_provider_form(&empty).await.unwrap();

    let reqs = h.reqs.lock().unwrap();
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].path, "/v1/forms");
}

#[tokio::test]
async fn missing_responder_uri_falls_back_to_viewform_link() {
    let h = harness(
        ProviderBehavior {
            omit_responder_uri: true,
            ..Default::default()
        },
        true,
    )
    .await;
    let rsvp = schema(json!({ "title": "RSVP", "fields": [{ "label": "Name" }] }));

    let result = h.services.create_provider_form(&rsvp).await.unwrap();
    assert_eq!(
        result.responder_uri,
        format!("https://docs.google.com/forms/d/{FORM_ID}/viewform")
    );
}

#[tokio::test]
async fn blank_label_is_rejected_before_authentication() {
    let h = harness(ProviderBehavior::default(), false).await;
    let bad = schema(json!({ "title": "RSVP", "fields": [{ "label": "" }] }));

    let err = h.services.create_provider_form(&bad).await.unwrap_err();

    assert!(matches!(err, FormsyncError::Validation(_)));
    assert!(h.reqs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn forms_create_timeout_is_provider_unavailable() {
    let h = harness(
        ProviderBehavior {
            stall_create: true,
            ..Default::default()
        },
        true,
    )
    .await;
    let rsvp = schema(json!({ "title": "RSVP", "fields": [{ "label": "Name" }] }));

    let err = h.services.create_provider_form(&rsvp).await.unwrap_err();

    assert!(
        matches!(err, FormsyncError::ProviderUnavailable { form_id: None, .. }),
        "unexpected error: {err:?}"
    );
    let reqs = h.reqs.lock().unwrap();
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].path, "/v1/forms");
}

#[tokio::test]
async fn batch_timeout_still_names_the_orphaned_form() {
    let h = harness(
        ProviderBehavior {
            stall_batch: true,
            ..Default::default()
        },
        true,
    )
    .await;
    let rsvp = schema(json!({ "title": "RSVP", "fields": [{ "label": "Name" }] }));

    let err = h.services.create_provider_form(&rsvp).await.unwrap_err();

    match err {
        FormsyncError::ProviderUnavailable { form_id, .. } => {
            assert_eq!(form_id.as_deref(), Some(FORM_ID));
        }
        other => panic!("expected ProviderUnavailable, got {other:?}"),
    }

    let reqs = h.reqs.lock().unwrap();
    assert_eq!(reqs.len(), 2);
    assert!(reqs.iter().all(|r| r.method == Method::POST));
}
