//! In-process mock of the tracker backend
//!
//! Serves the REST routes under `/api/v1` and the notification socket from a
//! shared in-memory state that tests seed and inspect.

#![allow(dead_code)]

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Multipart, Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::net::TcpListener;

use issuedesk::ApiClient;

pub type Shared = Arc<Mutex<MockState>>;

#[derive(Default)]
pub struct MockState {
    pub projects: Vec<Value>,
    pub tickets: Vec<Value>,
    pub comments: Vec<Value>,
    pub solutions: Vec<Value>,
    pub members: HashMap<i64, Vec<Value>>,
    pub staff: Vec<Value>,
    pub logs: Vec<Value>,
    /// Pushed to every notification socket, then the socket is closed
    pub notifications: Vec<Value>,

    pub project_forms: Vec<HashMap<String, String>>,
    pub logo_uploads: Vec<(String, usize)>,
    pub status_updates: Vec<(i64, String)>,
    pub tag_queries: Vec<String>,
    pub log_queries: Vec<HashMap<String, String>>,
    pub socket_queries: Vec<HashMap<String, String>>,
    pub authorization: Vec<Option<String>>,
    pub request_ids: Vec<String>,
    pub logouts: usize,
    pub sockets_closed: usize,

    pub fail_status_updates: bool,
    pub fail_on_tag: Option<String>,
    /// Keep notification sockets open until the client goes away
    pub hold_sockets_open: bool,
    /// Ids handed out by create routes start above 1000
    pub next_id: i64,
}

impl MockState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        1000 + self.next_id
    }
}

pub struct MockBackend {
    pub base_url: String,
    state: Shared,
}

impl MockBackend {
    pub async fn start() -> Self {
        Self::with_state(MockState::default()).await
    }

    pub async fn with_state(state: MockState) -> Self {
        let state = Arc::new(Mutex::new(state));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url)
    }

    pub fn ws_url(&self) -> String {
        format!(
            "{}/ws/notifications",
            self.base_url.replacen("http://", "ws://", 1)
        )
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }
}

pub fn user(id: i64, firstname: &str, lastname: &str, role: &str) -> Value {
    json!({
        "id": id,
        "firstname": firstname,
        "lastname": lastname,
        "email": format!("{}@acme.test", firstname.to_lowercase()),
        "role": role,
        "tenantId": "acme",
    })
}

pub fn project(id: i64, name: &str, tag: &str, project_type: &str, parent: Option<i64>) -> Value {
    json!({
        "id": id,
        "name": name,
        "projectTag": tag,
        "projectType": project_type,
        "parentProject": parent.map(|p| json!({ "id": p })),
        "technologies": [],
    })
}

pub fn ticket(id: i64, project_id: i64, status: &str, assignee: Option<i64>) -> Value {
    json!({
        "id": id,
        "title": format!("ticket {}", id),
        "status": status,
        "priority": "HIGH",
        "projectId": project_id,
        "assignedToUserId": assignee,
    })
}

pub fn comment(id: i64, ticket_id: i64, parent: Option<i64>) -> Value {
    json!({
        "id": id,
        "ticketId": ticket_id,
        "content": format!("comment {}", id),
        "authorUserId": 1,
        "parentCommentId": parent,
        "createdAt": "2025-04-01T09:30:00",
    })
}

fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/projects", get(list_projects).post(create_project))
        .route("/projects/tag-exists", get(tag_exists))
        .route("/projects/{id}", get(get_project).delete(delete_project))
        .route("/projects/{id}/sub-projects", get(sub_projects))
        .route("/projects/{id}/members", get(members))
        .route("/projects/{id}/members/{user_id}/exists", get(member_exists))
        .route("/tickets", get(list_tickets))
        .route("/tickets/{id}", get(get_ticket))
        .route("/tickets/{id}/status", put(update_status))
        .route("/tickets/{id}/assign", put(assign))
        .route("/comments", post(create_comment))
        .route("/comments/ticket/{id}", get(ticket_comments))
        .route("/solutions", post(create_solution))
        .route("/solutions/ticket/{id}", get(ticket_solution))
        .route("/solutions/recommendations", post(recommend))
        .route("/logs", get(list_logs))
        .route("/logs/{id}/handled", put(mark_handled))
        .route("/employees", get(list_staff))
        .route("/statistics/dashboard", get(dashboard))
        .route("/fail/{code}", get(fail))
        .layer(middleware::from_fn_with_state(state.clone(), record_headers));

    Router::new()
        .nest("/api/v1", api)
        .route("/ws/notifications", get(notifications))
        .with_state(state)
}

async fn record_headers(State(state): State<Shared>, request: Request, next: Next) -> Response {
    {
        let mut s = state.lock().unwrap();
        let header = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let authorization = header("authorization");
        let request_id = header("x-request-id");
        s.authorization.push(authorization);
        if let Some(id) = request_id {
            s.request_ids.push(id);
        }
    }
    next.run(request).await
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn find(items: &[Value], id: i64) -> Option<Value> {
    items.iter().find(|v| v["id"] == id).cloned()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] != "secret" {
        return error(StatusCode::UNAUTHORIZED, "Bad credentials");
    }
    let email = body["email"].as_str().unwrap_or_default();
    let mut profile = user(7, "Dana", "Reed", "MANAGER");
    profile["id"] = json!("7");
    profile["email"] = json!(email);
    Json(json!({ "token": "tok-7", "user": profile })).into_response()
}

async fn logout(State(state): State<Shared>) -> StatusCode {
    state.lock().unwrap().logouts += 1;
    StatusCode::NO_CONTENT
}

async fn list_projects(State(state): State<Shared>) -> Json<Vec<Value>> {
    Json(state.lock().unwrap().projects.clone())
}

async fn create_project(State(state): State<Shared>, mut multipart: Multipart) -> Response {
    let mut form = HashMap::new();
    let mut logo = None;
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        if name == "logo" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.unwrap();
            logo = Some((file_name, bytes.len()));
        } else {
            form.insert(name, field.text().await.unwrap());
        }
    }

    let mut s = state.lock().unwrap();
    let tag = form.get("projectTag").cloned().unwrap_or_default();
    if s.fail_on_tag.as_deref() == Some(tag.as_str()) {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "disk full");
    }

    let mut technologies: Vec<(usize, String)> = form
        .iter()
        .filter_map(|(k, v)| {
            let index = k.strip_prefix("technologiesArray[")?.strip_suffix(']')?;
            Some((index.parse().ok()?, v.clone()))
        })
        .collect();
    technologies.sort();

    let id = s.next_id();
    let parent = form.get("parentProject.id").and_then(|v| v.parse::<i64>().ok());
    let created = json!({
        "id": id,
        "name": form.get("name"),
        "projectTag": tag,
        "projectType": form.get("projectType"),
        "description": form.get("description"),
        "parentProject": parent.map(|p| json!({ "id": p })),
        "technologies": technologies.into_iter().map(|(_, t)| t).collect::<Vec<_>>(),
    });

    s.projects.push(created.clone());
    s.project_forms.push(form);
    if let Some(upload) = logo {
        s.logo_uploads.push(upload);
    }
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn tag_exists(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<bool> {
    let mut s = state.lock().unwrap();
    let tag = query.get("projectTag").cloned().unwrap_or_default();
    s.tag_queries.push(tag.clone());
    let taken = s.projects.iter().any(|p| {
        p["projectTag"]
            .as_str()
            .is_some_and(|t| t.eq_ignore_ascii_case(&tag))
    });
    Json(taken)
}

async fn get_project(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    match find(&state.lock().unwrap().projects, id) {
        Some(p) => Json(p).into_response(),
        None => error(StatusCode::NOT_FOUND, "Project not found"),
    }
}

async fn delete_project(State(state): State<Shared>, Path(id): Path<i64>) -> StatusCode {
    state.lock().unwrap().projects.retain(|p| p["id"] != id);
    StatusCode::NO_CONTENT
}

async fn sub_projects(State(state): State<Shared>, Path(id): Path<i64>) -> Json<Vec<Value>> {
    let s = state.lock().unwrap();
    Json(
        s.projects
            .iter()
            .filter(|p| p["parentProject"]["id"] == id)
            .cloned()
            .collect(),
    )
}

async fn members(State(state): State<Shared>, Path(id): Path<i64>) -> Json<Vec<Value>> {
    Json(state.lock().unwrap().members.get(&id).cloned().unwrap_or_default())
}

async fn member_exists(
    State(state): State<Shared>,
    Path((id, user_id)): Path<(i64, i64)>,
) -> Json<bool> {
    let s = state.lock().unwrap();
    let exists = s
        .members
        .get(&id)
        .is_some_and(|users| users.iter().any(|u| u["id"] == user_id));
    Json(exists)
}

async fn list_tickets(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Vec<Value>> {
    let s = state.lock().unwrap();
    let project = query.get("projectId").and_then(|v| v.parse::<i64>().ok());
    Json(
        s.tickets
            .iter()
            .filter(|t| project.is_none_or(|p| t["projectId"] == p))
            .cloned()
            .collect(),
    )
}

async fn get_ticket(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    match find(&state.lock().unwrap().tickets, id) {
        Some(t) => Json(t).into_response(),
        None => error(StatusCode::NOT_FOUND, "Ticket not found"),
    }
}

async fn update_status(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut s = state.lock().unwrap();
    let status = body["status"].as_str().unwrap_or_default().to_string();
    s.status_updates.push((id, status.clone()));
    if s.fail_status_updates {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "database unavailable");
    }
    match s.tickets.iter_mut().find(|t| t["id"] == id) {
        Some(ticket) => {
            ticket["status"] = json!(status);
            Json(ticket.clone()).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Ticket not found"),
    }
}

async fn assign(
    State(state): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut s = state.lock().unwrap();
    match s.tickets.iter_mut().find(|t| t["id"] == id) {
        Some(ticket) => {
            ticket["assignedToUserId"] = body["userId"].clone();
            Json(ticket.clone()).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Ticket not found"),
    }
}

async fn create_comment(State(state): State<Shared>, Json(mut body): Json<Value>) -> Response {
    let mut s = state.lock().unwrap();
    body["id"] = json!(s.next_id());
    s.comments.push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn ticket_comments(State(state): State<Shared>, Path(id): Path<i64>) -> Json<Vec<Value>> {
    let s = state.lock().unwrap();
    Json(
        s.comments
            .iter()
            .filter(|c| c["ticketId"] == id)
            .cloned()
            .collect(),
    )
}

async fn create_solution(State(state): State<Shared>, Json(mut body): Json<Value>) -> Response {
    let mut s = state.lock().unwrap();
    body["id"] = json!(s.next_id());
    s.solutions.push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn ticket_solution(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let s = state.lock().unwrap();
    match s.solutions.iter().find(|v| v["ticketId"] == id) {
        Some(solution) => Json(solution.clone()).into_response(),
        None => error(StatusCode::NOT_FOUND, "No solution for ticket"),
    }
}

async fn recommend(Json(body): Json<Value>) -> Json<Value> {
    Json(json!({
        "title": format!("Fix for ticket {}", body["ticketId"]),
        "content": "Guard the null branch and add a regression test.",
        "complexity": "HIGH",
    }))
}

async fn list_logs(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Vec<Value>> {
    let mut s = state.lock().unwrap();
    let logs = s
        .logs
        .iter()
        .filter(|l| {
            query
                .get("handled")
                .is_none_or(|h| l["handled"].as_bool().unwrap_or(false).to_string() == *h)
        })
        .filter(|l| query.get("severity").is_none_or(|sev| l["severity"] == sev.as_str()))
        .cloned()
        .collect();
    s.log_queries.push(query);
    Json(logs)
}

async fn mark_handled(State(state): State<Shared>, Path(id): Path<i64>) -> Response {
    let mut s = state.lock().unwrap();
    match s.logs.iter_mut().find(|l| l["id"] == id) {
        Some(log) => {
            log["handled"] = json!(true);
            StatusCode::OK.into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Log not found"),
    }
}

async fn list_staff(State(state): State<Shared>) -> Json<Vec<Value>> {
    Json(state.lock().unwrap().staff.clone())
}

async fn dashboard(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    let scoped = query.contains_key("projectId");
    Json(json!({
        "totalProjects": if scoped { 1 } else { 4 },
        "totalTickets": 12,
        "openTickets": 5,
        "ticketsByStatus": { "TO_DO": 3, "DONE": 7, "IN_PROGRESS": 2 },
    }))
}

async fn fail(Path(code): Path<u16>) -> Response {
    let status = StatusCode::from_u16(code).unwrap();
    match code {
        418 => (status, Json(json!({ "error": "No coffee here" }))).into_response(),
        502 => (status, "<html>bad gateway</html>").into_response(),
        _ => error(status, &format!("failed with {}", code)),
    }
}

async fn notifications(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    let (pending, hold_open) = {
        let mut s = state.lock().unwrap();
        s.socket_queries.push(query);
        (s.notifications.clone(), s.hold_sockets_open)
    };
    ws.on_upgrade(move |socket| push_notifications(socket, pending, hold_open, state))
}

async fn push_notifications(mut socket: WebSocket, pending: Vec<Value>, hold_open: bool, state: Shared) {
    for notification in pending {
        if socket
            .send(Message::Text(notification.to_string().into()))
            .await
            .is_err()
        {
            return;
        }
    }
    if hold_open {
        while let Some(Ok(_)) = socket.recv().await {}
        state.lock().unwrap().sockets_closed += 1;
    } else {
        let _ = socket.send(Message::Close(None)).await;
    }
}
