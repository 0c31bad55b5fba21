use serde_json::Value;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "pdam-notify-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, content).expect("write test file");
}

fn run_pdam_notify(args: &[&str], home: &Path) -> (bool, Vec<u8>, Vec<u8>) {
    let bin = std::env::var("CARGO_BIN_EXE_pdam-notify").unwrap_or_else(|_| {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("target");
        path.push("debug");
        if cfg!(windows) {
            path.push("pdam-notify.exe");
        } else {
            path.push("pdam-notify");
        }
        path.to_string_lossy().into_owned()
    });
    let mut cmd = Command::new(bin);
    cmd.args(args);
    cmd.env("HOME", home);
    cmd.env("XDG_CONFIG_HOME", home.join(".config"));
    cmd.env("PDAM_NOTIFY_SESSION", home.join("session.json"));
    cmd.env_remove("RUST_LOG");
    let output = cmd.output().expect("run pdam-notify");
    (output.status.success(), output.stdout, output.stderr)
}

fn write_session(home: &Path) {
    write_file(
        &home.join("session.json"),
        r#"{"token":"tok-123","user_data":"{\"npp\":\"10023\",\"nama\":\"Budi\"}"}"#,
    );
}

const STREAM_BATCH: &str = r#"{"data":[{"id":1,"judul":"A","pesan":"msg","status":"unread","created_at":"2024-01-02"},{"id":2,"judul":"B","pesan":"msg2","status":"read","created_at":"2024-01-01"}],"unread_count":1}"#;

const BACKLOG: &str = r#"{"data":[{"id":7,"judul":"Pengajuan disetujui","pesan":"PGJ-7 approved","status":"unread","created_at":"2024-01-03T08:00:00Z","id_pengajuan":"PGJ-7"},{"id":1,"judul":"A","pesan":"msg","status":"unread","created_at":"2024-01-02"},{"id":2,"judul":"B","pesan":"msg2","status":"read","created_at":"2024-01-01"}]}"#;

/// One request seen by the mock dashboard
#[derive(Debug, Clone)]
struct Seen {
    method: String,
    target: String,
    authorization: Option<String>,
}

/// Minimal dashboard stand-in: serves the stream, the backlog, and the PUTs
struct MockDashboard {
    base_url: String,
    seen: Arc<Mutex<Vec<Seen>>>,
}

impl MockDashboard {
    fn start(put_status: u16) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let base_url = format!("http://{}", listener.local_addr().expect("addr"));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                handle_connection(stream, put_status, &log);
            }
        });
        MockDashboard { base_url, seen }
    }

    fn seen(&self) -> Vec<Seen> {
        self.seen.lock().expect("lock").clone()
    }

    fn targets(&self, method: &str) -> Vec<String> {
        self.seen()
            .into_iter()
            .filter(|s| s.method == method)
            .map(|s| s.target)
            .collect()
    }
}

fn handle_connection(stream: TcpStream, put_status: u16, log: &Mutex<Vec<Seen>>) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();

    let mut authorization = None;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).unwrap_or(0) == 0 {
            break;
        }
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':')
            && name.eq_ignore_ascii_case("authorization")
        {
            authorization = Some(value.trim().to_string());
        }
    }
    log.lock().expect("lock").push(Seen {
        method: method.clone(),
        target: target.clone(),
        authorization,
    });

    let mut stream = stream;
    let response = if target.starts_with("/api/notifications/stream") {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\ndata: {{\"connected\":true}}\n\ndata: {STREAM_BATCH}\n\n"
        )
    } else if method == "GET" && target.starts_with("/api/notifications/all/") {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{BACKLOG}",
            BACKLOG.len()
        )
    } else if method == "PUT" {
        let body = r#"{"success":true}"#;
        format!(
            "HTTP/1.1 {put_status} Status\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    } else {
        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n".to_string()
    };
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

#[test]
fn login_writes_session_file() {
    let home = unique_temp_dir("login");
    let (ok, stdout, stderr) = run_pdam_notify(
        &["login", "--token", "tok-123", "--npp", "10023", "--name", "Budi"],
        &home,
    );
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));
    assert!(String::from_utf8_lossy(&stdout).contains("Logged in as NPP 10023."));

    let content = fs::read_to_string(home.join("session.json")).expect("session file");
    let json: Value = serde_json::from_str(&content).expect("json");
    assert_eq!(json["token"].as_str(), Some("tok-123"));
    let profile: Value =
        serde_json::from_str(json["user_data"].as_str().expect("user_data")).expect("profile");
    assert_eq!(profile["npp"].as_str(), Some("10023"));
    assert_eq!(profile["nama"].as_str(), Some("Budi"));
}

#[test]
fn logout_removes_session_file() {
    let home = unique_temp_dir("logout");
    write_session(&home);

    let (ok, stdout, _) = run_pdam_notify(&["logout"], &home);
    assert!(ok);
    assert!(String::from_utf8_lossy(&stdout).contains("Logged out."));
    assert!(!home.join("session.json").exists());

    let (ok, stdout, _) = run_pdam_notify(&["logout"], &home);
    assert!(ok);
    assert!(String::from_utf8_lossy(&stdout).contains("No session to remove."));
}

#[test]
fn malformed_config_warns_and_falls_back() {
    let home = unique_temp_dir("bad-config");
    write_file(
        &home.join(".config").join("pdam-notify").join("config.toml"),
        "merge = \"sideways\"\n",
    );

    let (ok, stdout, stderr) = run_pdam_notify(&["logout"], &home);
    assert!(ok);
    assert!(String::from_utf8_lossy(&stdout).contains("No session to remove."));
    let stderr = String::from_utf8_lossy(&stderr);
    assert!(stderr.contains("config file ignored"), "stderr: {stderr}");
    assert!(stderr.contains("config.toml"), "stderr: {stderr}");
}

#[test]
fn missing_session_makes_no_requests() {
    let home = unique_temp_dir("no-session");
    let server = MockDashboard::start(200);

    let (ok, stdout, stderr) =
        run_pdam_notify(&["list", "--all", "--base-url", &server.base_url], &home);
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));
    assert!(String::from_utf8_lossy(&stdout).contains("Not logged in"));
    assert!(server.seen().is_empty());
}

#[test]
fn list_all_json_reads_backlog_newest_first() {
    let home = unique_temp_dir("list-all");
    write_session(&home);
    let server = MockDashboard::start(200);

    let (ok, stdout, stderr) = run_pdam_notify(
        &["list", "--all", "-j", "--base-url", &server.base_url],
        &home,
    );
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));

    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["view"].as_str(), Some("all"));
    assert_eq!(json["total_count"].as_u64(), Some(3));
    let list = json["notifications"].as_array().expect("array");
    let ids: Vec<i64> = list.iter().filter_map(|n| n["id"].as_i64()).collect();
    assert_eq!(ids, vec![7, 1, 2]);
    assert_eq!(list[0]["linked_request_id"].as_str(), Some("PGJ-7"));

    let seen = server.seen();
    assert_eq!(seen[0].target, "/api/notifications/all/10023");
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer tok-123"));
}

#[test]
fn list_unread_filters_read_items() {
    let home = unique_temp_dir("list-unread");
    write_session(&home);
    let server = MockDashboard::start(200);

    let (ok, stdout, stderr) = run_pdam_notify(
        &["list", "--all", "--unread", "-j", "--base-url", &server.base_url],
        &home,
    );
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));
    let json: Value = serde_json::from_slice(&stdout).expect("json");
    let list = json["notifications"].as_array().expect("array");
    assert_eq!(list.len(), 2);
    assert!(list.iter().all(|n| n["read"] == Value::Bool(false)));
}

#[test]
fn watch_once_prints_first_stream_batch() {
    let home = unique_temp_dir("watch-once");
    write_session(&home);
    let server = MockDashboard::start(200);

    let (ok, stdout, stderr) = run_pdam_notify(
        &["watch", "--once", "-j", "--no-popup", "--base-url", &server.base_url],
        &home,
    );
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));

    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["view"].as_str(), Some("recent"));
    assert_eq!(json["unread_count"].as_u64(), Some(1));
    let list = json["notifications"].as_array().expect("array");
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["title"].as_str(), Some("A"));

    // Backlog is prefetched before the stream opens; stream auth rides in the query
    let gets = server.targets("GET");
    assert!(gets.contains(&"/api/notifications/all/10023".to_string()));
    let stream = gets
        .iter()
        .find(|t| t.starts_with("/api/notifications/stream"))
        .expect("stream request");
    assert!(stream.contains("npp=10023"));
    assert!(stream.contains("token=tok-123"));
}

#[test]
fn read_sends_put_with_bearer_token() {
    let home = unique_temp_dir("read-one");
    write_session(&home);
    let server = MockDashboard::start(200);

    let (ok, stdout, stderr) =
        run_pdam_notify(&["read", "7", "--base-url", &server.base_url], &home);
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));
    assert!(String::from_utf8_lossy(&stdout).contains("Notification 7 marked as read."));

    let puts: Vec<Seen> = server
        .seen()
        .into_iter()
        .filter(|s| s.method == "PUT")
        .collect();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].target, "/api/notifications/update/7");
    assert_eq!(puts[0].authorization.as_deref(), Some("Bearer tok-123"));
}

#[test]
fn read_rejects_non_numeric_id() {
    let home = unique_temp_dir("read-bad-id");
    write_session(&home);
    let server = MockDashboard::start(200);

    let (ok, _, stderr) = run_pdam_notify(&["read", "abc", "--base-url", &server.base_url], &home);
    assert!(!ok);
    assert!(String::from_utf8_lossy(&stderr).contains("Invalid notification id \"abc\""));
    assert!(server.seen().is_empty());
}

#[test]
fn read_all_global_calls_global_endpoint() {
    let home = unique_temp_dir("read-all-global");
    write_session(&home);
    let server = MockDashboard::start(200);

    let (ok, stdout, stderr) = run_pdam_notify(
        &["read-all", "--global", "-j", "--base-url", &server.base_url],
        &home,
    );
    assert!(ok, "stderr: {}", String::from_utf8_lossy(&stderr));

    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["action"].as_str(), Some("read-all-global"));
    assert_eq!(json["applied"], Value::Bool(true));
    assert_eq!(json["unread_count"].as_u64(), Some(0));
    assert_eq!(json["toast"]["kind"].as_str(), Some("success"));
    assert_eq!(
        json["toast"]["text"].as_str(),
        Some("All notifications marked as read")
    );
    assert_eq!(
        server.targets("PUT"),
        vec!["/api/notifications/update/all/10023".to_string()]
    );
}

#[test]
fn read_all_failure_exits_with_error() {
    let home = unique_temp_dir("read-all-fail");
    write_session(&home);
    let server = MockDashboard::start(500);

    let (ok, stdout, _) = run_pdam_notify(
        &["read-all", "--all", "-j", "--base-url", &server.base_url],
        &home,
    );
    assert!(!ok);

    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["applied"], Value::Bool(false));
    assert_eq!(json["toast"]["kind"].as_str(), Some("error"));
    assert_eq!(
        server.targets("PUT"),
        vec!["/api/notifications/update/10023".to_string()]
    );
}
