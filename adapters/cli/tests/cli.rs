use std::{
    path::PathBuf,
    process::{Command, Stdio},
};

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name)
}

#[test]
fn bot_race_runs_to_a_summary() {
    let output = Command::new(env!("CARGO_BIN_EXE_vector-race"))
        .arg(demo("sprint.toml"))
        .args(["--turn-limit", "200", "--snapshot"])
        .stdin(Stdio::null())
        .output()
        .expect("failed to run the vector-race binary");

    assert!(
        output.status.success(),
        "vector-race failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(" turns"), "missing summary in {stdout}");
    assert!(stdout.contains("\"turns_resolved\""), "missing snapshot in {stdout}");
}

#[test]
fn missing_race_file_fails_with_context() {
    let output = Command::new(env!("CARGO_BIN_EXE_vector-race"))
        .arg(demo("does-not-exist.toml"))
        .stdin(Stdio::null())
        .output()
        .expect("failed to run the vector-race binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read race file"), "{stderr}");
}

#[test]
fn human_input_is_read_from_stdin() {
    let output = Command::new(env!("CARGO_BIN_EXE_vector-race"))
        .arg(demo("duel.toml"))
        .args(["--turn-limit", "4"])
        .stdin(Stdio::null())
        .output()
        .expect("failed to run the vector-race binary");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("You at ("), "missing prompt in {stdout}");
    assert!(stdout.contains("after 4 turns"), "{stdout}");
}
