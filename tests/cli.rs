//! 命令行测试

#![cfg(feature = "cli")]

use std::fs;

use assert_cmd::Command;

const PAGE: &str = "<html><head><title>Shop</title></head>\
<body><h1>Fresh bread every morning</h1><p>Order online today.</p></body></html>";

fn command(dir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("page-translator").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("PAGE_TRANSLATOR_API_URL")
        .env_remove("PAGE_TRANSLATOR_API_KEY")
        .env_remove("PAGE_TRANSLATOR_NATIVE_LANG")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_native_language_writes_document_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("page.html");
    fs::write(&input, PAGE).unwrap();

    let output = command(&dir)
        .args(["--lang", "en", "page.html"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let html = String::from_utf8(output.stdout).unwrap();
    assert!(html.contains("<h1>Fresh bread every morning</h1>"));
    assert!(String::from_utf8_lossy(&output.stderr).contains("units scanned: 0"));
}

#[test]
fn test_unreachable_service_keeps_original_text() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("page.html"), PAGE).unwrap();

    // 先绑定再释放，得到一个没有监听者的端口
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    command(&dir)
        .env("PAGE_TRANSLATOR_API_URL", format!("http://{}/v1/chat/completions", addr))
        .args(["--lang", "fr", "--output", "out.html", "page.html"])
        .assert()
        .success();

    let html = fs::read_to_string(dir.path().join("out.html")).unwrap();
    assert!(html.contains("Fresh bread every morning"));
    assert!(html.contains("Order online today."));
}

#[test]
fn test_generate_config() {
    let dir = tempfile::tempdir().unwrap();

    command(&dir)
        .args(["--generate-config", "example.toml"])
        .assert()
        .success();

    let content = fs::read_to_string(dir.path().join("example.toml")).unwrap();
    assert!(content.contains("batch_size = 5"));
    assert!(!content.contains("api_key"));
}

#[test]
fn test_missing_input_fails() {
    let dir = tempfile::tempdir().unwrap();

    command(&dir).args(["--lang", "fr"]).assert().failure();
    command(&dir)
        .args(["--lang", "fr", "missing.html"])
        .assert()
        .failure();
}
