#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` and the resource clients using wiremock.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;
use wiremock::matchers::{bearer_token, body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use campus_api::{
    ApiClient, AssignmentInput, AuthLayer, EntityId, Error, ListQuery, NewTeacher,
    StaticCredential, StudentPatch,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup_with(auth: AuthLayer) -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = ApiClient::with_client(reqwest::Client::new(), base_url, auth);
    (server, client)
}

/// An auth stage holding `token`, plus a counter of unauthorized
/// notifications.
fn counting_layer(token: &str) -> (AuthLayer, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let auth = AuthLayer::new(
        Arc::new(StaticCredential(SecretString::from(token.to_owned()))),
        Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }),
    );
    (auth, hits)
}

async fn setup_authed(token: &str) -> (MockServer, ApiClient, Arc<AtomicUsize>) {
    let (auth, hits) = counting_layer(token);
    let (server, client) = setup_with(auth).await;
    (server, client, hits)
}

// ── Authentication endpoints ────────────────────────────────────────

#[tokio::test]
async fn test_login_returns_token_and_user() {
    let (server, client) = setup_with(AuthLayer::anonymous()).await;

    Mock::given(method("POST"))
        .and(path("/authentication/login"))
        .and(body_json(json!({"email": "admin@school.test", "password": "hunter2"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Login successful",
            "token": "aaa.bbb.ccc",
            "user": {"id": 1, "name": "Admin", "email": "admin@school.test"}
        })))
        .mount(&server)
        .await;

    let secret = SecretString::from("hunter2".to_owned());
    let resp = client.login("admin@school.test", &secret).await.unwrap();

    assert_eq!(resp.token.expose_secret(), "aaa.bbb.ccc");
    assert_eq!(resp.message, "Login successful");
    let user = resp.user.unwrap();
    assert_eq!(user.id, EntityId::from("1"));
    assert_eq!(user.name, "Admin");
}

#[tokio::test]
async fn test_register_posts_name() {
    let (server, client) = setup_with(AuthLayer::anonymous()).await;

    Mock::given(method("POST"))
        .and(path("/authentication/register"))
        .and(body_json(json!({"name": "Lea", "email": "lea@school.test", "password": "pw"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"message": "created", "token": "t"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let secret = SecretString::from("pw".to_owned());
    let resp = client.register("Lea", "lea@school.test", &secret).await.unwrap();
    assert!(resp.user.is_none());
}

#[tokio::test]
async fn test_login_bad_credentials_is_unauthorized() {
    let (server, client, hits) = setup_authed("stale").await;

    Mock::given(method("POST"))
        .and(path("/authentication/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})),
        )
        .mount(&server)
        .await;

    let secret = SecretString::from("nope".to_owned());
    let err = client.login("x@y.z", &secret).await.unwrap_err();

    assert!(err.is_unauthorized(), "got: {err:?}");
    assert_eq!(err.to_string(), "Unauthorized: Invalid credentials");
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

// ── Auth layer ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_bearer_attached_to_every_request() {
    let (server, client, _) = setup_authed("tok-123").await;

    Mock::given(method("GET"))
        .and(path("/subject/subjects"))
        .and(bearer_token("tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"subjects": []})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/subject/subjects/4"))
        .and(bearer_token("tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "deleted"})))
        .expect(1)
        .mount(&server)
        .await;

    client.subjects().list(&ListQuery::default()).await.unwrap();
    client.subjects().delete(&EntityId::from("4")).await.unwrap();
}

#[tokio::test]
async fn test_anonymous_requests_carry_no_authorization() {
    let (server, client) = setup_with(AuthLayer::anonymous()).await;

    Mock::given(method("GET"))
        .and(path("/section/sections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"sections": []})))
        .mount(&server)
        .await;

    client.sections().list(&ListQuery::default()).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn test_unauthorized_fires_hook_for_any_resource() {
    let (server, client, hits) = setup_authed("expired").await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "jwt expired"})))
        .mount(&server)
        .await;

    let query = ListQuery::default();
    assert!(client.students().list(&query).await.unwrap_err().is_unauthorized());
    assert!(client.teachers().list(&query).await.unwrap_err().is_unauthorized());
    assert!(
        client
            .sections()
            .get(&EntityId::from("1"))
            .await
            .unwrap_err()
            .is_unauthorized()
    );

    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_unauthorized_with_truncated_body_fires_hook() {
    // wiremock always sends complete bodies; a bare socket lets the
    // connection drop mid-body.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0_u8; 4096];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(
                b"HTTP/1.1 401 Unauthorized\r\n\
                  content-type: application/json\r\n\
                  content-length: 64\r\n\r\n{\"mess",
            )
            .await
            .unwrap();
    });

    let (auth, hits) = counting_layer("expired");
    let base_url = Url::parse(&format!("http://{addr}")).unwrap();
    let client = ApiClient::with_client(reqwest::Client::new(), base_url, auth);

    let err = client.students().list(&ListQuery::default()).await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_other_failures_do_not_fire_hook() {
    let (server, client, hits) = setup_authed("tok").await;

    Mock::given(method("GET"))
        .and(path("/student/students/99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Student not found"})))
        .mount(&server)
        .await;

    let err = client.students().get(&EntityId::from("99")).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

// ── Resource CRUD ───────────────────────────────────────────────────

#[tokio::test]
async fn test_list_students_with_pagination_and_filters() {
    let (server, client, _) = setup_authed("tok").await;

    Mock::given(method("GET"))
        .and(path("/student/students"))
        .and(query_param("page", "2"))
        .and(query_param("schoolYear", "2024-2025"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "ok",
            "students": [
                {"id": "b", "firstName": "Ben", "lastName": "Uy", "grade": 8},
                {"id": "a", "firstname": "Ana", "lastname": "Cruz", "grade": "7"}
            ],
            "pagination": {"total": 12, "page": 2, "limit": 10, "totalPages": 2}
        })))
        .mount(&server)
        .await;

    let query = ListQuery {
        page: Some(2),
        school_year: Some("2024-2025".into()),
        ..ListQuery::default()
    };
    let listing = client.students().list(&query).await.unwrap();

    let ids: Vec<&str> = listing.items.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert_eq!(listing.items[0].grade.as_deref(), Some("8"));
    let page = listing.pagination.unwrap();
    assert_eq!((page.total, page.page, page.total_pages), (12, 2, 2));
}

#[tokio::test]
async fn test_list_accepts_bare_array() {
    let (server, client, _) = setup_authed("tok").await;

    Mock::given(method("GET"))
        .and(path("/subject/subjects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "Math", "code": "M7"}
        ])))
        .mount(&server)
        .await;

    let listing = client.subjects().list(&ListQuery::default()).await.unwrap();
    assert_eq!(listing.items.len(), 1);
    assert!(listing.pagination.is_none());
}

#[tokio::test]
async fn test_create_teacher_unwraps_envelope() {
    let (server, client, _) = setup_authed("tok").await;

    Mock::given(method("POST"))
        .and(path("/teacher/teachers"))
        .and(body_json(json!({
            "firstName": "Lea",
            "lastName": "Santos",
            "email": "lea@school.test",
            "department": "Math"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "message": "Teacher created",
            "teacher": {"id": 42, "firstName": "Lea", "lastName": "Santos", "email": "lea@school.test", "department": "Math"}
        })))
        .mount(&server)
        .await;

    let input = NewTeacher {
        first_name: "Lea".into(),
        last_name: "Santos".into(),
        email: "lea@school.test".into(),
        department: Some("Math".into()),
        ..NewTeacher::default()
    };
    let teacher = client.teachers().create(&input).await.unwrap();
    assert_eq!(teacher.id.as_str(), "42");
}

#[tokio::test]
async fn test_update_validation_failure_carries_fields() {
    let (server, client, _) = setup_authed("tok").await;

    Mock::given(method("PUT"))
        .and(path("/student/students/s1"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Validation failed",
            "errors": {"age": "must be a positive number"}
        })))
        .mount(&server)
        .await;

    let patch = StudentPatch {
        age: Some(0),
        ..StudentPatch::default()
    };
    let err = client
        .students()
        .update(&EntityId::from("s1"), &patch)
        .await
        .unwrap_err();

    match err {
        Error::Validation {
            status,
            message,
            fields,
        } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Validation failed");
            assert_eq!(fields[0].field, "age");
        }
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_payload_key_is_reported() {
    let (server, client, _) = setup_authed("tok").await;

    Mock::given(method("GET"))
        .and(path("/teacher/teachers/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .mount(&server)
        .await;

    let err = client.teachers().get(&EntityId::from("1")).await.unwrap_err();
    assert!(matches!(err, Error::MissingPayload { key: "teacher" }));
}

// ── Relationship endpoints ──────────────────────────────────────────

fn section_body() -> serde_json::Value {
    json!({
        "message": "updated",
        "section": {
            "id": 5,
            "name": "Rizal",
            "gradeLevel": "7",
            "subjects": [{
                "id": 1,
                "subject": {"id": 2, "name": "Math", "code": "M7"},
                "teacher": {"id": 9, "firstName": "Lea", "lastName": "Santos"},
                "schedule": "MWF 8:00",
                "room": "101"
            }],
            "students": [{
                "id": 3,
                "student": {"id": 11, "firstName": "Ana", "lastName": "Cruz"},
                "status": "active",
                "enrollmentDate": "2024-06-03"
            }]
        }
    })
}

#[tokio::test]
async fn test_assign_subjects_replaces_whole_set() {
    let (server, client, _) = setup_authed("tok").await;

    Mock::given(method("POST"))
        .and(path("/section/sections/5/subjects"))
        .and(body_json(json!({
            "subjects": [{"subjectId": "2", "teacherId": "9", "schedule": "MWF 8:00", "room": "101"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(section_body()))
        .expect(1)
        .mount(&server)
        .await;

    let assignments = [AssignmentInput {
        subject_id: EntityId::from("2"),
        teacher_id: EntityId::from("9"),
        schedule: "MWF 8:00".into(),
        room: "101".into(),
    }];
    let section = client
        .sections()
        .assign_subjects(&EntityId::from("5"), &assignments)
        .await
        .unwrap();
    assert_eq!(section.subjects.len(), 1);
    assert_eq!(section.subjects[0].room, "101");
}

#[tokio::test]
async fn test_enroll_students_posts_ids() {
    let (server, client, _) = setup_authed("tok").await;

    Mock::given(method("POST"))
        .and(path("/section/sections/5/students"))
        .and(body_json(json!({"studentIds": ["11"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(section_body()))
        .expect(1)
        .mount(&server)
        .await;

    let section = client
        .sections()
        .enroll_students(&EntityId::from("5"), &[EntityId::from("11")])
        .await
        .unwrap();
    assert_eq!(section.students[0].student.first_name, "Ana");
}

#[tokio::test]
async fn test_teacher_subjects_round_trip() {
    let (server, client, _) = setup_authed("tok").await;

    Mock::given(method("POST"))
        .and(path("/teacher/teachers/9/subjects"))
        .and(body_json(json!({"subjectIds": ["2", "3"], "schoolYear": "2024-2025"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "teacher": {"id": 9, "firstName": "Lea", "lastName": "Santos",
                        "subjects": [{"id": 2, "name": "Math", "code": "M7"}, {"id": 3, "name": "Art", "code": "A7"}]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/teacher/teachers/9/subjects"))
        .and(query_param("schoolYear", "2024-2025"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subjects": [{"id": 2, "name": "Math", "code": "M7"}]
        })))
        .mount(&server)
        .await;

    let id = EntityId::from("9");
    let teacher = client
        .teachers()
        .assign_subjects(&id, &[EntityId::from("2"), EntityId::from("3")], "2024-2025")
        .await
        .unwrap();
    assert_eq!(teacher.subjects.len(), 2);

    let subjects = client.teachers().subjects(&id, Some("2024-2025")).await.unwrap();
    assert_eq!(subjects[0].name, "Math");
}
