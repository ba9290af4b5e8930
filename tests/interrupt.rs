#![cfg(unix)]

use std::process::Stdio;
use std::time::{Duration, Instant};

use tempfile::TempDir;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sigint_stops_a_batch_with_an_error_exit() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/clustalo/run"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("clustalo-R20240101-000000-0001-p1m")
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let tmp = TempDir::new().unwrap();
    let fasta: String = (1..=8).map(|n| format!(">seq{n}\nMKVLLAGG\n")).collect();
    let input = tmp.path().join("batch.fasta");
    std::fs::write(&input, fasta).unwrap();

    let started = Instant::now();
    let mut child = Command::new(env!("CARGO_BIN_EXE_ebi-jobs"))
        .current_dir(tmp.path())
        .env("EBI_JOBS_CONFIG", tmp.path().join("absent.toml"))
        .env_remove("EBI_JOBS_EMAIL")
        .env_remove("RUST_LOG")
        .args(["clustalo", "--email", "me@example.org", "--async", "--multifasta", "--quiet"])
        .arg("--endpoint")
        .arg(format!("{}/clustalo", server.uri()))
        .arg(&input)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    tokio::time::sleep(Duration::from_millis(1200)).await;
    let pid = child.id().unwrap();
    let sent = std::process::Command::new("kill")
        .args(["-INT", &pid.to_string()])
        .status()
        .unwrap();
    assert!(sent.success());

    let status = tokio::time::timeout(Duration::from_secs(10), child.wait())
        .await
        .unwrap()
        .unwrap();
    let mut stdout = String::new();
    child
        .stdout
        .take()
        .unwrap()
        .read_to_string(&mut stdout)
        .await
        .unwrap();

    assert_eq!(status.code(), Some(3));
    assert!(started.elapsed() < Duration::from_millis(3500));
    assert!(stdout.lines().count() < 8, "{stdout}");
    let submitted = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "POST")
        .count();
    assert!(submitted < 8, "{submitted} jobs submitted");
}
