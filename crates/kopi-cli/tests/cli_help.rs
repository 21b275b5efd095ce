use assert_cmd::Command;

#[test]
fn help_lists_commands() {
    let mut cmd = Command::new(assert_cmd::cargo_bin!("kopi"));
    let output = cmd
        .arg("--help")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8_lossy(&output);
    for name in ["analyze", "calibrate", "render", "validate-config"] {
        assert!(text.contains(name), "missing command {name}");
    }
}

#[test]
fn invalid_log_level_is_usage_error() {
    let mut cmd = Command::new(assert_cmd::cargo_bin!("kopi"));
    cmd.args(["--log-level", "loud", "validate-config"]);
    cmd.assert().failure().code(2);
}
