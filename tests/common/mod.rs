//! Shared test utilities
//!
//! [`FakeBackend`] serves the recruiting API in-process so client code runs
//! against real HTTP.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use serde_json::{Value, json};
use tokio::task::JoinHandle;

/// Mutable state behind the fake backend
#[derive(Default)]
pub struct Backend {
    /// Every request as `"METHOD /path"`, in arrival order
    pub calls: Vec<String>,
    /// Questions for new text interviews
    pub questions: Vec<String>,
    /// The open text interview session
    pub session: Option<Value>,
    /// Body of the last complete-voice submission
    pub completed_voice: Option<Value>,
    /// `(chunkIndex, isFinal)` of every recording upload
    pub recording_chunks: Vec<(u32, bool)>,
    /// Saved analyses
    pub history: Vec<Value>,
    /// Profile documents received, with the route they came in on
    pub profiles: Vec<(String, Value)>,
    /// Reject the SDP offer
    pub fail_sdp: bool,
    /// Reject voice submissions
    pub fail_complete_voice: bool,
    /// Reject practice completion
    pub fail_practice_complete: bool,
    /// WebSocket endpoint handed out for avatar sessions
    pub avatar_endpoint: String,
    /// Canned reply for `/api/interview/respond` instead of the session logic
    pub respond_reply: Option<Value>,
    /// JSON bodies of requests whose shape tests inspect, keyed by path
    pub bodies: Vec<(String, Value)>,
    /// Reject job-interview analysis
    pub fail_job_analyze: bool,
}

pub type Shared = Arc<Mutex<Backend>>;

/// In-process fake of the recruiting backend
pub struct FakeBackend {
    pub url: String,
    pub state: Shared,
    handle: JoinHandle<()>,
}

impl FakeBackend {
    /// Start serving on an ephemeral local port
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(Backend {
            questions: vec![
                "Tell me about yourself.".to_string(),
                "Why do you want this role?".to_string(),
            ],
            history: vec![
                json!({
                    "id": "h1",
                    "source": "document",
                    "fileName": "resume.pdf",
                    "suggestions": { "paragraphs": ["Lead with impact."] },
                    "createdAt": "2026-01-02T03:04:05Z"
                }),
                json!({
                    "id": "h2",
                    "source": "profile",
                    "suggestions": { "paragraphs": ["Consider platform roles."] },
                    "createdAt": "2026-02-03T04:05:06Z"
                }),
            ],
            // nothing listens on port 9 (discard), so connections are refused
            avatar_endpoint: "ws://127.0.0.1:9/avatar".to_string(),
            ..Backend::default()
        }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind fake backend");
        let addr = listener.local_addr().expect("no local addr");
        let app = router(Arc::clone(&state));

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake backend failed");
        });

        Self {
            url: format!("http://{addr}"),
            state,
            handle,
        }
    }

    /// Client pointed at this backend
    pub fn client(&self) -> hireflow::ApiClient {
        hireflow::ApiClient::new(&self.url)
    }

    /// Requests received so far
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Whether a request matching `"METHOD /path"` was received
    pub fn called(&self, call: &str) -> bool {
        self.calls().iter().any(|c| c == call)
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Backend) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn record(state: &Shared, call: impl Into<String>) {
    state.lock().unwrap().calls.push(call.into());
}

fn capture(state: &Shared, path: &str, body: Value) {
    let mut backend = state.lock().unwrap();
    backend.calls.push(format!("POST {path}"));
    backend.bodies.push((path.to_string(), body));
}

impl FakeBackend {
    /// Last JSON body received on `path`
    pub fn body(&self, path: &str) -> Option<Value> {
        self.with(|b| {
            b.bodies
                .iter()
                .rev()
                .find(|(p, _)| p == path)
                .map(|(_, body)| body.clone())
        })
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/career-insights/upload", post(upload_document))
        .route("/api/career-insights/analyze-document", post(analyze_document))
        .route("/api/career-suggestions", get(career_suggestions))
        .route("/api/career-insights/history", get(history))
        .route(
            "/api/career-insights/history/{id}",
            get(history_entry).delete(delete_history_entry),
        )
        .route("/api/comprehensive-profile", post(save_profile))
        .route("/api/comprehensive-profile/autosave", post(autosave_profile))
        .route(
            "/api/interview/session",
            get(get_interview_session).post(start_interview_session),
        )
        .route("/api/interview/respond", post(respond))
        .route("/api/interview/complete-voice", post(complete_voice))
        .route("/api/interview/upload-recording", post(upload_recording))
        .route("/api/interview/recording/{session_id}", get(recording))
        .route("/api/practice-interview/start", post(practice_start))
        .route("/api/practice-interview/complete", post(practice_complete))
        .route("/api/job-interview/session", post(realtime_credential))
        .route("/api/job-interview/generate-questions", post(generate_questions))
        .route("/api/job-interview/analyze", post(analyze_interview))
        .route("/api/job-interview/submit", post(submit_interview))
        .route("/api/interview/parse-transcription", post(parse_transcription))
        .route("/api/realtime/session/{key}", post(exchange_sdp))
        .route("/api/heygen/create-session", post(avatar_create))
        .route("/api/heygen/start-session", post(avatar_ack))
        .route("/api/heygen/send-task", post(avatar_send_task))
        .route("/api/heygen/stop-session", post(avatar_ack))
        .route("/api/heygen/status", get(avatar_status))
        .with_state(state)
}

/// Value of a text field in a raw multipart body
pub fn multipart_field(body: &[u8], name: &str) -> Option<String> {
    let text = String::from_utf8_lossy(body);
    let marker = format!("name=\"{name}\"");
    let start = text.find(&marker)? + marker.len();
    let rest = &text[start..];
    let value_start = rest.find("\r\n\r\n")? + 4;
    let value = &rest[value_start..];
    let end = value.find("\r\n")?;
    Some(value[..end].to_string())
}

async fn upload_document(State(state): State<Shared>, body: Bytes) -> Json<Value> {
    record(&state, "POST /api/career-insights/upload");
    Json(json!({
        "filePath": "/uploads/doc-1",
        "fileName": "resume.txt",
        "fileSize": body.len(),
        "mimeType": "text/plain"
    }))
}

async fn analyze_document(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    record(&state, "POST /api/career-insights/analyze-document");
    let saved = body["saveToHistory"].as_bool().unwrap_or(false);
    if saved {
        state.lock().unwrap().history.push(json!({
            "id": "h3",
            "source": "document",
            "fileName": body["fileName"],
            "suggestions": { "paragraphs": ["Quantify your results."] }
        }));
    }
    Json(json!({
        "success": true,
        "suggestions": { "paragraphs": ["Quantify your results.", "Highlight leadership."] },
        "generatedAt": "2026-03-04T05:06:07Z",
        "analysisId": if saved { json!("h3") } else { Value::Null }
    }))
}

async fn career_suggestions(State(state): State<Shared>) -> Json<Value> {
    record(&state, "GET /api/career-suggestions");
    Json(json!({
        "suggestions": { "paragraphs": ["Consider platform roles."] },
        "generatedAt": "2026-03-04T05:06:07Z"
    }))
}

async fn history(State(state): State<Shared>) -> Json<Value> {
    record(&state, "GET /api/career-insights/history");
    let history = state.lock().unwrap().history.clone();
    Json(json!({ "history": history }))
}

async fn history_entry(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    record(&state, format!("GET /api/career-insights/history/{id}"));
    let entry = state
        .lock()
        .unwrap()
        .history
        .iter()
        .find(|e| e["id"] == id.as_str())
        .cloned();
    match entry {
        Some(entry) => Json(json!({ "entry": entry })).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "analysis not found" })))
            .into_response(),
    }
}

async fn delete_history_entry(State(state): State<Shared>, Path(id): Path<String>) -> StatusCode {
    record(&state, format!("DELETE /api/career-insights/history/{id}"));
    let mut backend = state.lock().unwrap();
    let before = backend.history.len();
    backend.history.retain(|e| e["id"] != id.as_str());
    if backend.history.len() < before {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn save_profile(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    record(&state, "POST /api/comprehensive-profile");
    let completion = body["completionPercentage"].clone();
    state
        .lock()
        .unwrap()
        .profiles
        .push(("save".to_string(), body));
    Json(json!({ "success": true, "completionPercentage": completion }))
}

async fn autosave_profile(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    record(&state, "POST /api/comprehensive-profile/autosave");
    state
        .lock()
        .unwrap()
        .profiles
        .push(("autosave".to_string(), body));
    Json(json!({ "success": true }))
}

async fn get_interview_session(State(state): State<Shared>) -> Response {
    record(&state, "GET /api/interview/session");
    match state.lock().unwrap().session.clone() {
        Some(session) => Json(json!({ "session": session })).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "message": "no active session" })))
            .into_response(),
    }
}

async fn start_interview_session(State(state): State<Shared>) -> Json<Value> {
    record(&state, "POST /api/interview/session");
    let mut backend = state.lock().unwrap();
    let questions: Vec<Value> = backend
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| json!({ "id": format!("q{i}"), "question": q }))
        .collect();
    let session = json!({
        "sessionId": "text-1",
        "questions": questions,
        "responses": [],
        "currentQuestionIndex": 0,
        "isComplete": false
    });
    backend.session = Some(session.clone());
    Json(session)
}

async fn respond(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    record(&state, "POST /api/interview/respond");
    let mut backend = state.lock().unwrap();
    if let Some(reply) = backend.respond_reply.clone() {
        return Json(reply).into_response();
    }
    let Some(session) = backend.session.as_mut() else {
        return (StatusCode::NOT_FOUND, Json(json!({ "message": "no active session" })))
            .into_response();
    };

    let index = usize::try_from(body["questionIndex"].as_u64().unwrap_or(0)).unwrap();
    let question = session["questions"][index]["question"].clone();
    session["responses"]
        .as_array_mut()
        .unwrap()
        .push(json!({ "question": question, "answer": body["answer"] }));
    session["currentQuestionIndex"] = json!(index + 1);
    let total = session["questions"].as_array().unwrap().len();
    let complete = index + 1 >= total;
    session["isComplete"] = json!(complete);

    Json(json!({
        "isComplete": complete,
        "session": session.clone()
    }))
    .into_response()
}

async fn complete_voice(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    record(&state, "POST /api/interview/complete-voice");
    let mut backend = state.lock().unwrap();
    backend.completed_voice = Some(body);
    if backend.fail_complete_voice {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "analysis unavailable" })),
        )
            .into_response();
    }
    Json(json!({ "success": true, "analysisId": "va-1", "score": 82.0, "summary": "Clear answers." }))
        .into_response()
}

async fn upload_recording(State(state): State<Shared>, body: Bytes) -> Json<Value> {
    record(&state, "POST /api/interview/upload-recording");
    let index = multipart_field(&body, "chunkIndex")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    let is_final = multipart_field(&body, "isFinal").as_deref() == Some("true");
    let session_id = multipart_field(&body, "sessionId").unwrap_or_default();
    state
        .lock()
        .unwrap()
        .recording_chunks
        .push((index, is_final));

    if is_final {
        Json(json!({
            "success": true,
            "playlistUrl": format!("/recordings/{session_id}/playlist.m3u8")
        }))
    } else {
        Json(json!({ "success": true }))
    }
}

async fn recording(State(state): State<Shared>, Path(session_id): Path<String>) -> Json<Value> {
    record(&state, format!("GET /api/interview/recording/{session_id}"));
    Json(json!({
        "sessionId": session_id,
        "playlistUrl": format!("/recordings/{session_id}/playlist.m3u8")
    }))
}

async fn practice_start(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    record(&state, "POST /api/practice-interview/start");
    let role = body["role"].as_str().unwrap_or("engineer").to_string();
    Json(json!({
        "sessionId": "practice-1",
        "questions": [
            { "question": format!("What drew you to {role} work?") },
            { "question": "Describe a hard problem you solved." }
        ]
    }))
}

async fn practice_complete(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    record(&state, "POST /api/practice-interview/complete");
    if state.lock().unwrap().fail_practice_complete {
        return (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "message": "analysis backend down" })),
        )
            .into_response();
    }
    let answered = body["responses"].as_array().map_or(0, Vec::len);
    Json(json!({
        "feedback": {
            "score": 75.0,
            "summary": format!("You answered {answered} questions."),
            "strengths": ["Structured answers"],
            "improvements": ["Add metrics"]
        }
    }))
    .into_response()
}

async fn realtime_credential(State(state): State<Shared>) -> Json<Value> {
    record(&state, "POST /api/job-interview/session");
    Json(json!({
        "client_secret": { "value": "ek_test_123", "expires_at": 1_900_000_000 }
    }))
}

async fn exchange_sdp(
    State(state): State<Shared>,
    Path(key): Path<String>,
    offer: String,
) -> Response {
    record(&state, format!("POST /api/realtime/session/{key}"));
    if state.lock().unwrap().fail_sdp || !offer.starts_with("v=0") {
        return (StatusCode::BAD_GATEWAY, "relay rejected offer").into_response();
    }
    (StatusCode::OK, "v=0\r\no=answer\r\n").into_response()
}

async fn avatar_create(State(state): State<Shared>) -> Json<Value> {
    record(&state, "POST /api/heygen/create-session");
    let endpoint = state.lock().unwrap().avatar_endpoint.clone();
    Json(json!({
        "sessionId": "avatar-1",
        "realtimeEndpoint": endpoint,
        "accessToken": "avatar-token",
        "url": "wss://media.example/room"
    }))
}

async fn avatar_ack(State(state): State<Shared>, uri: axum::http::Uri) -> Json<Value> {
    record(&state, format!("POST {}", uri.path()));
    Json(json!({ "success": true }))
}

async fn avatar_status(State(state): State<Shared>) -> Json<Value> {
    record(&state, "GET /api/heygen/status");
    Json(json!({ "available": true, "message": "ok" }))
}

async fn generate_questions(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let count = body["count"].as_u64().unwrap_or(2);
    let title = body["jobTitle"].as_str().unwrap_or("this role").to_string();
    capture(&state, "/api/job-interview/generate-questions", body);
    let questions: Vec<Value> = (1..=count)
        .map(|i| json!({ "id": format!("g{i}"), "question": format!("{title} question {i}") }))
        .collect();
    Json(json!({ "questions": questions }))
}

async fn analyze_interview(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let answered = body["responses"].as_array().map_or(0, Vec::len);
    capture(&state, "/api/job-interview/analyze", body);
    if state.lock().unwrap().fail_job_analyze {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "model overloaded" })),
        )
            .into_response();
    }
    Json(json!({
        "score": 68.0,
        "summary": format!("{answered} answers reviewed."),
        "strengths": ["Concise"],
        "improvements": ["Give examples"]
    }))
    .into_response()
}

async fn submit_interview(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    capture(&state, "/api/job-interview/submit", body);
    Json(json!({ "success": true, "id": "ji-1" }))
}

async fn parse_transcription(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    // pair each assistant line with the user line after it
    let messages = body["conversation"].as_array().cloned().unwrap_or_default();
    capture(&state, "/api/interview/parse-transcription", body);
    let mut responses = Vec::new();
    let mut question: Option<Value> = None;
    for message in messages {
        match message["role"].as_str() {
            Some("assistant") => question = Some(message["content"].clone()),
            Some("user") => {
                if let Some(q) = question.take() {
                    responses.push(json!({ "question": q, "answer": message["content"] }));
                }
            }
            _ => {}
        }
    }
    Json(json!({ "responses": responses }))
}

async fn avatar_send_task(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let rejected = body["text"].as_str().is_some_and(str::is_empty);
    capture(&state, "/api/heygen/send-task", body);
    if rejected {
        Json(json!({ "success": false, "message": "empty task" }))
    } else {
        Json(json!({ "success": true }))
    }
}
