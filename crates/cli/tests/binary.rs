use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn scan_with_unreadable_root_fails_and_reports_once() {
    let temp = tempdir().unwrap();
    let config = temp.path().join("dashboard.toml");
    fs::write(
        &config,
        format!(
            "[workspace]\nroot = {:?}\noutput = {:?}\n",
            temp.path().join("missing").to_string_lossy(),
            temp.path().join("out.json").to_string_lossy()
        ),
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_workspace-dashboard"))
        .current_dir(temp.path())
        .env("RUST_LOG", "info")
        .arg("--config")
        .arg(&config)
        .arg("scan")
        .output()
        .unwrap();

    assert!(!output.status.success());
    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(combined.matches("is not readable").count(), 1, "{combined}");
    assert!(!temp.path().join("out.json").exists());
}

#[test]
fn render_prints_html_fragment() {
    let temp = tempdir().unwrap();
    let file = temp.path().join("notes.md");
    fs::write(&file, "# Notes\n**done**").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_workspace-dashboard"))
        .current_dir(temp.path())
        .arg("render")
        .arg(&file)
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim_end(),
        "<h1>Notes</h1><br><b>done</b>"
    );
}
