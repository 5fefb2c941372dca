//! Integration tests for the `campus` CLI binary.
//!
//! Argument parsing, help output and completions run without a server;
//! API-bound commands run against a `wiremock` server with the credential
//! kept in a throwaway token file.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use assert_cmd::cargo::cargo_bin_cmd;
use jsonwebtoken::{EncodingKey, Header};
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// A sandbox: private HOME/XDG dirs and a file-backed token store.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn token_path(&self) -> PathBuf {
        self.dir.path().join("token")
    }

    fn write_token(&self, token: &str) {
        std::fs::write(self.token_path(), token).unwrap();
    }

    fn stored_token(&self) -> Option<String> {
        std::fs::read_to_string(self.token_path()).ok()
    }

    /// A `campus` command isolated from the user's real configuration.
    fn cmd(&self, api_url: &str) -> assert_cmd::Command {
        let root: &Path = self.dir.path();
        let mut cmd = cargo_bin_cmd!("campus");
        cmd.env("HOME", root)
            .env("XDG_CONFIG_HOME", root.join("config"))
            .env("XDG_DATA_HOME", root.join("data"))
            .env_remove("CAMPUS_PROFILE")
            .env_remove("CAMPUS_API_URL")
            .env_remove("CAMPUS_OUTPUT")
            .env_remove("CAMPUS_INSECURE")
            .env_remove("CAMPUS_TIMEOUT")
            .env_remove("CAMPUS_PASSWORD")
            .env("CAMPUS_PROFILES__DEFAULT__API_URL", api_url)
            .env("CAMPUS_PROFILES__DEFAULT__TOKEN_STORE", "file")
            .env("CAMPUS_PROFILES__DEFAULT__TOKEN_PATH", self.token_path())
            .env("NO_COLOR", "1");
        cmd
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

/// A signed credential for user `u1` expiring `ttl_secs` from now.
fn credential(ttl_secs: i64) -> String {
    let exp = i64::try_from(unix_now()).unwrap() + ttl_secs;
    jsonwebtoken::encode(
        &Header::default(),
        &json!({ "id": "u1", "name": "Ada Admin", "email": "ada@school.test", "exp": exp }),
        &EncodingKey::from_secret(b"server-side-secret"),
    )
    .unwrap()
}

/// Run `cmd` off the async runtime so the mock server keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> assert_cmd::assert::Assert {
    tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap()
}

const UNUSED_URL: &str = "http://127.0.0.1:9";

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_help() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd(UNUSED_URL)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn help_lists_resource_commands() {
    let sandbox = Sandbox::new();
    sandbox.cmd(UNUSED_URL).arg("--help").assert().success().stdout(
        predicate::str::contains("students")
            .and(predicate::str::contains("teachers"))
            .and(predicate::str::contains("subjects"))
            .and(predicate::str::contains("sections"))
            .and(predicate::str::contains("login")),
    );
}

#[test]
fn version_flag() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd(UNUSED_URL)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("campus"));
}

#[test]
fn completions_zsh() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd(UNUSED_URL)
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn completions_bash() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd(UNUSED_URL)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn invalid_subcommand_is_usage_error() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd(UNUSED_URL)
        .arg("grades")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("grades"));
}

#[test]
fn config_path_prints_location() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd(UNUSED_URL)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

// ── Authentication ──────────────────────────────────────────────────

#[test]
fn list_without_login_exits_with_auth_code() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd(UNUSED_URL)
        .args(["students", "list"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn expired_credential_is_discarded() {
    let sandbox = Sandbox::new();
    sandbox.write_token(&credential(-10));

    sandbox
        .cmd(UNUSED_URL)
        .arg("whoami")
        .assert()
        .code(3);
    assert!(sandbox.stored_token().is_none());
}

#[test]
fn whoami_prints_decoded_session() {
    let sandbox = Sandbox::new();
    sandbox.write_token(&credential(3600));

    sandbox
        .cmd(UNUSED_URL)
        .args(["whoami", "--output", "json"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("\"subject_id\": \"u1\"")
                .and(predicate::str::contains("ada@school.test")),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn login_stores_the_credential() {
    let server = MockServer::start().await;
    let token = credential(3600);
    Mock::given(method("POST"))
        .and(path("/authentication/login"))
        .and(body_json(json!({ "email": "ada@school.test", "password": "hunter2" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "message": "ok", "token": token })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let sandbox = Sandbox::new();
    let mut cmd = sandbox.cmd(&server.uri());
    cmd.args(["login", "--email", "ada@school.test"])
        .env("CAMPUS_PASSWORD", "hunter2");
    run(cmd)
        .await
        .success()
        .stderr(predicate::str::contains("Logged in as Ada Admin"));

    assert_eq!(sandbox.stored_token().as_deref(), Some(token.as_str()));
}

#[tokio::test(flavor = "multi_thread")]
async fn rejected_login_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/authentication/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })),
        )
        .mount(&server)
        .await;

    let sandbox = Sandbox::new();
    let mut cmd = sandbox.cmd(&server.uri());
    cmd.args(["login", "--email", "ada@school.test", "--password", "wrong"]);
    run(cmd)
        .await
        .code(3)
        .stderr(predicate::str::contains("Invalid credentials"));
    assert!(sandbox.stored_token().is_none());
}

#[test]
fn logout_removes_the_credential() {
    let sandbox = Sandbox::new();
    sandbox.write_token(&credential(3600));

    sandbox.cmd(UNUSED_URL).arg("logout").assert().success();
    assert!(sandbox.stored_token().is_none());
}

// ── Resources ───────────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn students_list_sends_bearer_and_renders_json() {
    let server = MockServer::start().await;
    let token = credential(3600);
    Mock::given(method("GET"))
        .and(path("/student/students"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "ok",
            "students": [
                { "id": 1, "firstName": "Ana", "lastName": "Reyes", "grade": "7" },
                { "id": 2, "firstName": "Ben", "lastName": "Cruz", "grade": "8" }
            ],
            "pagination": { "total": 2, "page": 1, "limit": 25, "totalPages": 1 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sandbox = Sandbox::new();
    sandbox.write_token(&token);
    let mut cmd = sandbox.cmd(&server.uri());
    cmd.args(["students", "list", "-o", "plain"]);
    run(cmd).await.success().stdout("1\n2\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn dashboard_counts_every_kind() {
    let server = MockServer::start().await;
    let token = credential(3600);
    let collections = [
        (
            "/student/students",
            json!({
                "students": [{ "id": 1, "firstName": "Ana", "lastName": "Reyes" }],
                "pagination": { "total": 31, "page": 1, "limit": 1, "totalPages": 31 }
            }),
        ),
        (
            "/teacher/teachers",
            json!({ "teachers": [
                { "id": 1, "firstName": "Lea", "lastName": "Santos", "email": "l@s.test" },
                { "id": 2, "firstName": "Rey", "lastName": "Lim", "email": "r@s.test" }
            ]}),
        ),
        ("/subject/subjects", json!({ "subjects": [{ "id": 1, "name": "Math", "code": "M7" }] })),
        ("/section/sections", json!({ "sections": [] })),
    ];
    for (route, body) in collections {
        Mock::given(method("GET"))
            .and(path(route))
            .and(header("authorization", format!("Bearer {token}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(&server)
            .await;
    }

    let sandbox = Sandbox::new();
    sandbox.write_token(&token);
    let mut cmd = sandbox.cmd(&server.uri());
    cmd.args(["dashboard", "-o", "json-compact"]);
    run(cmd)
        .await
        .success()
        .stdout(predicate::str::contains(
            r#"{"students":31,"teachers":2,"subjects":1,"sections":0}"#,
        ));
}

#[tokio::test(flavor = "multi_thread")]
async fn server_401_logs_out_and_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/teacher/teachers"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Token revoked" })),
        )
        .mount(&server)
        .await;

    let sandbox = Sandbox::new();
    sandbox.write_token(&credential(3600));
    let mut cmd = sandbox.cmd(&server.uri());
    cmd.args(["teachers", "list"]);
    run(cmd).await.code(3);

    assert!(sandbox.stored_token().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn conflict_on_create_exits_with_conflict_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/teacher/teachers"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({ "message": "Email already exists" })),
        )
        .mount(&server)
        .await;

    let sandbox = Sandbox::new();
    sandbox.write_token(&credential(3600));
    let mut cmd = sandbox.cmd(&server.uri());
    cmd.args([
        "teachers",
        "create",
        "--first-name",
        "Rosa",
        "--last-name",
        "Lim",
        "--email",
        "rosa@school.test",
    ]);
    run(cmd)
        .await
        .code(6)
        .stderr(predicate::str::contains("Email already exists"));
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_resource_exits_with_not_found_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/section/sections/99"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Section not found" })),
        )
        .mount(&server)
        .await;

    let sandbox = Sandbox::new();
    sandbox.write_token(&credential(3600));
    let mut cmd = sandbox.cmd(&server.uri());
    cmd.args(["sections", "get", "99"]);
    run(cmd).await.code(4);
}

#[tokio::test(flavor = "multi_thread")]
async fn enroll_posts_student_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/section/sections/5/students"))
        .and(body_json(json!({ "studentIds": ["1", "2"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Students enrolled",
            "section": { "id": 5, "name": "Sampaguita", "gradeLevel": "7", "studentCount": 2 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let sandbox = Sandbox::new();
    sandbox.write_token(&credential(3600));
    let mut cmd = sandbox.cmd(&server.uri());
    cmd.args(["sections", "enroll", "5", "--student", "1,2"]);
    run(cmd)
        .await
        .success()
        .stderr(predicate::str::contains("Sampaguita now has 2 student(s)"));
}

#[test]
fn create_without_required_flags_is_usage_error() {
    let sandbox = Sandbox::new();
    sandbox.write_token(&credential(3600));
    sandbox
        .cmd(UNUSED_URL)
        .args(["students", "create", "--first-name", "Ana"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("last-name"));
}

#[test]
fn delete_without_yes_refuses_in_scripts() {
    let sandbox = Sandbox::new();
    sandbox.write_token(&credential(3600));
    sandbox
        .cmd(UNUSED_URL)
        .args(["subjects", "delete", "3"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--yes"));
}

#[test]
fn unreachable_server_exits_with_connection_code() {
    let sandbox = Sandbox::new();
    sandbox.write_token(&credential(3600));
    sandbox
        .cmd(UNUSED_URL)
        .args(["subjects", "list"])
        .assert()
        .code(7);
}
