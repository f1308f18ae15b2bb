use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

fn reserve_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("reserve port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}

fn service_command(workdir: &Path, artifact_dir: &Path, port: u16) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_score-predict"));
    command
        .current_dir(workdir)
        .env("PORT", port.to_string())
        .env("SCORE_PREDICT__SERVER__HOST", "127.0.0.1")
        .env("SCORE_PREDICT__ARTIFACTS__DIR", artifact_dir)
        .env("SCORE_PREDICT__METRICS__REPORT_INTERVAL_SECS", "0")
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    command
}

fn spawn_service(workdir: &Path, artifact_dir: &Path, port: u16) -> Child {
    service_command(workdir, artifact_dir, port)
        .env("SCORE_PREDICT__ARTIFACTS__MODEL_FILE", "model.json")
        .spawn()
        .expect("spawn score-predict")
}

fn write_artifacts(dir: &Path) {
    fs::write(
        dir.join("scaler.json"),
        r#"{"kind": "standard", "mean": [66.0, 69.0, 68.0], "scale": [15.0, 14.5, 15.0]}"#,
    )
    .expect("write scaler");
    fs::write(
        dir.join("label_encoder.json"),
        r#"{"classes": ["group A", "group B", "group C"]}"#,
    )
    .expect("write encoder");
    fs::write(
        dir.join("model.json"),
        r#"{"coef": [[-1.0, 1.0, 0.0], [0.0, 0.0, 0.0], [1.0, -1.0, 0.0]], "intercept": [0.0, 0.0, 0.0]}"#,
    )
    .expect("write model");
}

fn wait_for_http(port: u16) {
    for _ in 0..200 {
        if TcpStream::connect(("127.0.0.1", port)).is_ok() {
            return;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    panic!("http server not ready on port {port}");
}

fn send_http(port: u16, method: &str, path: &str, body: &str) -> String {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).expect("connect http");
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: 127.0.0.1:{port}\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(request.as_bytes()).expect("write request");
    stream.flush().expect("flush");
    let mut buf = String::new();
    stream.read_to_string(&mut buf).expect("read response");
    buf
}

#[test]
fn missing_artifacts_abort_before_listening() {
    let workdir = tempfile::tempdir().expect("workdir");
    let artifact_dir = tempfile::tempdir().expect("artifact dir");
    let port = reserve_port();

    let mut child = spawn_service(workdir.path(), artifact_dir.path(), port);

    let mut status = None;
    for _ in 0..200 {
        if let Some(exit) = child.try_wait().expect("poll child") {
            status = Some(exit);
            break;
        }
        std::thread::sleep(Duration::from_millis(25));
    }

    let Some(status) = status else {
        let _ = child.kill();
        panic!("service kept running without artifacts");
    };

    assert!(!status.success());
    assert!(TcpStream::connect(("127.0.0.1", port)).is_err());
}

#[test]
fn form_submission_returns_prediction() {
    let workdir = tempfile::tempdir().expect("workdir");
    let artifact_dir = tempfile::tempdir().expect("artifact dir");
    write_artifacts(artifact_dir.path());
    let port = reserve_port();

    let mut child = spawn_service(workdir.path(), artifact_dir.path(), port);
    wait_for_http(port);

    let index = send_http(port, "GET", "/", "");
    let predicted = send_http(port, "POST", "/predict", "math=90&reading=60&writing=70");
    let invalid = send_http(port, "POST", "/predict", "math=abc&reading=60&writing=70");
    let defaulted = send_http(port, "POST", "/predict", "reading=95");

    let _ = child.kill();
    let _ = child.wait();

    assert!(index.starts_with("HTTP/1.1 200"));
    assert!(index.contains("<form"));

    assert!(predicted.starts_with("HTTP/1.1 200"));
    assert!(predicted.contains("Predicted race/ethnicity: group C"));

    assert!(invalid.starts_with("HTTP/1.1 200"));
    assert!(invalid.contains("Invalid input: please enter numeric scores."));

    assert!(defaulted.contains("Predicted race/ethnicity: group A"));
}

#[test]
fn sample_artifacts_serve_with_shipped_config() {
    // Both binaries run from the crate root, so they read config/config.toml
    let workdir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let artifact_dir = tempfile::tempdir().expect("artifact dir");

    let status = Command::new(env!("CARGO_BIN_EXE_sample-artifacts"))
        .current_dir(workdir)
        .env("SCORE_PREDICT__ARTIFACTS__DIR", artifact_dir.path())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .expect("run sample-artifacts");
    assert!(status.success());

    let port = reserve_port();
    let mut child = service_command(workdir, artifact_dir.path(), port)
        .spawn()
        .expect("spawn score-predict");
    wait_for_http(port);

    let predicted = send_http(port, "POST", "/predict", "math=90&reading=60&writing=70");

    let _ = child.kill();
    let _ = child.wait();

    assert!(predicted.starts_with("HTTP/1.1 200"));
    assert!(predicted.contains("Predicted race/ethnicity: group "));
}
