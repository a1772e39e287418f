use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use notes_core::{NoteId, NoteServiceResult, NoteStore};
use notes_web::{router, AppState, DELETED_MESSAGE};
use serde_json::{json, Value};
use tower::ServiceExt;

struct Reply {
    status: StatusCode,
    content_type: String,
    body: Vec<u8>,
}

impl Reply {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    fn text(&self) -> String {
        String::from_utf8(self.body.clone()).unwrap()
    }
}

fn app() -> Router {
    let store = NoteStore::open_in_memory().unwrap();
    router(AppState::new(store).unwrap())
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|value| value.to_str().unwrap().to_string())
        .unwrap_or_default();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();

    Reply {
        status,
        content_type,
        body: body.to_vec(),
    }
}

async fn create(app: &Router, title: &str, body: &str) -> Value {
    let reply = send(
        app,
        Method::POST,
        "/note",
        Some(json!({ "title": title, "body": body })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    reply.json()
}

fn id_of(note: &Value) -> &str {
    note["id"].as_str().unwrap()
}

#[tokio::test]
async fn list_returns_array_of_created_notes() {
    let app = app();
    let created = create(&app, "Title", "Body").await;

    let reply = send(&app, Method::GET, "/note", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    let listed = reply.json();
    let items = listed.as_array().unwrap();
    assert!(!items.is_empty());
    assert!(items.contains(&created));
}

#[tokio::test]
async fn list_on_empty_store_is_empty_array() {
    let app = app();
    let reply = send(&app, Method::GET, "/note", None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json(), json!([]));
}

#[tokio::test]
async fn create_echoes_title_and_body() {
    let app = app();
    let created = create(&app, "Title1", "Body1").await;

    assert_eq!(created["title"], "Title1");
    assert_eq!(created["body"], "Body1");
    assert_eq!(created["todo"], json!([]));
    assert!(NoteId::parse_str(id_of(&created)).is_ok());
}

#[tokio::test]
async fn create_accepts_missing_fields_and_bodies() {
    let app = app();

    let partial = send(&app, Method::POST, "/note", Some(json!({ "title": "only" }))).await;
    assert_eq!(partial.status, StatusCode::OK);
    assert_eq!(partial.json()["body"], "");

    let empty = send(&app, Method::POST, "/note", None).await;
    assert_eq!(empty.status, StatusCode::OK);
    assert_eq!(empty.json()["title"], "");
}

#[tokio::test]
async fn create_keeps_valid_fields_next_to_wrong_typed_ones() {
    let app = app();

    for body in [json!(null), json!(5)] {
        let reply = send(
            &app,
            Method::POST,
            "/note",
            Some(json!({ "title": "x", "body": body })),
        )
        .await;
        assert_eq!(reply.status, StatusCode::OK);
        let created = reply.json();
        assert_eq!(created["title"], "x");
        assert_eq!(created["body"], "");
    }
}

#[tokio::test]
async fn json_detail_deep_equals_create_response() {
    let app = app();
    let note = create(&app, "Title2", "Body2").await;

    let show = send(&app, Method::GET, &format!("/note/{}/json", id_of(&note)), None).await;
    assert_eq!(show.status, StatusCode::OK);
    assert_eq!(show.json(), note);
}

#[tokio::test]
async fn delete_confirms_in_plain_text_and_is_terminal() {
    let app = app();
    let note = create(&app, "Title3", "Body3").await;
    let path = format!("/note/{}", id_of(&note));

    let del = send(&app, Method::DELETE, &path, None).await;
    assert_eq!(del.status, StatusCode::OK);
    assert_eq!(del.text(), DELETED_MESSAGE);
    assert_eq!(del.text(), "Note Deleted!");
    assert!(del.content_type.starts_with("text/plain"));

    let show = send(&app, Method::GET, &format!("{path}/json"), None).await;
    assert_eq!(show.status, StatusCode::NOT_FOUND);

    let again = send(&app, Method::DELETE, &path, None).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);

    let view = send(&app, Method::GET, &path, None).await;
    assert_eq!(view.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn attach_todo_appends_snapshots_in_order() {
    let app = app();
    let note = create(&app, "Title4", "Body4").await;
    let first = create(&app, "Title5", "Body5").await;
    let second = create(&app, "Title6", "Body6").await;
    let todo_path = format!("/note/{}/todo", id_of(&note));

    let attached = send(
        &app,
        Method::POST,
        &todo_path,
        Some(json!({ "todoId": id_of(&first) })),
    )
    .await;
    assert_eq!(attached.status, StatusCode::OK);
    assert_eq!(attached.json()["todo"][0], first);

    send(
        &app,
        Method::POST,
        &todo_path,
        Some(json!({ "todoId": id_of(&second) })),
    )
    .await;

    let updated = send(&app, Method::GET, &format!("/note/{}/json", id_of(&note)), None)
        .await
        .json();
    assert_eq!(updated["todo"][0], first);
    assert_eq!(updated["todo"][1], second);
    assert_eq!(updated["title"], "Title4");
}

#[tokio::test]
async fn attach_todo_with_missing_notes_is_not_found() {
    let app = app();
    let note = create(&app, "parent", "").await;
    let unknown = NoteId::new_v4().to_string();

    let missing_todo = send(
        &app,
        Method::POST,
        &format!("/note/{}/todo", id_of(&note)),
        Some(json!({ "todoId": unknown })),
    )
    .await;
    assert_eq!(missing_todo.status, StatusCode::NOT_FOUND);

    let missing_parent = send(
        &app,
        Method::POST,
        &format!("/note/{unknown}/todo"),
        Some(json!({ "todoId": id_of(&note) })),
    )
    .await;
    assert_eq!(missing_parent.status, StatusCode::NOT_FOUND);

    let no_todo_id = send(
        &app,
        Method::POST,
        &format!("/note/{}/todo", id_of(&note)),
        Some(json!({})),
    )
    .await;
    assert_eq!(no_todo_id.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn notes_alias_lists_and_creates() {
    let app = app();

    let created = send(
        &app,
        Method::POST,
        "/note/notes",
        Some(json!({ "title": "Title9", "body": "Body9" })),
    )
    .await;
    assert_eq!(created.status, StatusCode::OK);
    let created = created.json();
    assert_eq!(created["title"], "Title9");

    let show = send(&app, Method::GET, "/note/notes", None).await;
    assert_eq!(show.status, StatusCode::OK);
    assert_eq!(show.json(), json!([created]));
}

#[tokio::test]
async fn notes_segment_is_reserved_not_an_id() {
    let app = app();
    let reply = send(&app, Method::DELETE, "/note/notes", None).await;
    assert_eq!(reply.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn html_detail_renders_the_same_note() {
    let app = app();
    let note = create(&app, "Title10", "Body10").await;

    let show = send(&app, Method::GET, &format!("/note/{}", id_of(&note)), None).await;
    assert_eq!(show.status, StatusCode::OK);
    assert!(show.content_type.starts_with("text/html"));
    let html = show.text();
    assert!(html.contains("Title10"));
    assert!(html.contains("Body10"));
    assert!(html.contains(id_of(&note)));
}

#[tokio::test]
async fn malformed_ids_are_not_found() {
    let app = app();
    for path in ["/note/not-a-uuid", "/note/not-a-uuid/json"] {
        let reply = send(&app, Method::GET, path, None).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND, "GET {path}");
    }
    let reply = send(&app, Method::DELETE, "/note/42", None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn index_renders_regardless_of_collection_state() {
    let app = app();
    let empty = send(&app, Method::GET, "/", None).await;
    assert_eq!(empty.status, StatusCode::OK);
    assert!(empty.content_type.starts_with("text/html"));

    create(&app, "one", "").await;
    let populated = send(&app, Method::GET, "/", None).await;
    assert_eq!(populated.status, StatusCode::OK);
}

#[tokio::test]
async fn store_failures_answer_server_error() {
    let store = NoteStore::open_in_memory().unwrap();
    let app = router(AppState::new(store.clone()).unwrap());
    let note = create(&app, "kept", "").await;

    // A writer that panics while holding the connection leaves it unusable.
    let _ = std::thread::spawn(move || {
        let _ = store.with_notes(|_| -> NoteServiceResult<()> { panic!("writer crashed") });
    })
    .join();

    for (method, path) in [
        (Method::GET, "/note".to_string()),
        (Method::GET, format!("/note/{}/json", id_of(&note))),
        (Method::DELETE, format!("/note/{}", id_of(&note))),
    ] {
        let reply = send(&app, method.clone(), &path, None).await;
        assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR, "{method} {path}");
        assert!(reply.content_type.starts_with("application/json"));
        assert!(reply.json()["error"].as_str().unwrap().contains("unavailable"));
    }

    let index = send(&app, Method::GET, "/", None).await;
    assert_eq!(index.status, StatusCode::OK);
}
