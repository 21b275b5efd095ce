use assert_cmd::Command;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn write_day(dir: &Path, date: &str, fears: usize, optimism: usize) {
    let quote = |score: i64, intensity: &str| json!({"comment_score": score, "intensity": intensity});
    let report = json!({
        "date_id": date,
        "all_quotes": {
            "fears": (0..fears).map(|i| quote(3 + i as i64, "strong")).collect::<Vec<_>>(),
            "frustrations": [quote(4, "mild")],
            "optimism": (0..optimism).map(|i| quote(10 + i as i64, "moderate")).collect::<Vec<_>>(),
        },
        "thematic_clusters": [
            {"entities": ["HDB"], "engagement_score": 12, "dominant_emotion": "fears"}
        ]
    });
    fs::write(dir.join(format!("{date}.json")), report.to_string()).unwrap();
}

fn write_days(dir: &Path) {
    for (i, date) in ["2024-04-01", "2024-04-02", "2024-04-03", "2024-04-04"]
        .iter()
        .enumerate()
    {
        write_day(dir, date, 1 + i % 2, 1 + i);
    }
}

#[test]
fn analyze_writes_analytics_json() {
    let temp = tempdir().unwrap();
    write_days(temp.path());

    let mut cmd = Command::new(assert_cmd::cargo_bin!("kopi"));
    cmd.arg("analyze").arg("--data-dir").arg(temp.path());
    cmd.assert().success();

    let text = fs::read_to_string(temp.path().join("analytics.json")).unwrap();
    let report: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(report["schema_version"], "analytics_v1");
    assert_eq!(report["periods_analyzed"], 4);
    assert_eq!(report["data_range_end"], "2024-04-04");
    assert_eq!(report["velocity"]["metrics"].as_array().unwrap().len(), 4);
}

#[test]
fn analyze_refuses_overwrite_without_flag() {
    let temp = tempdir().unwrap();
    write_days(temp.path());
    let out = temp.path().join("analytics.json");
    fs::write(&out, "sentinel").unwrap();

    let mut cmd = Command::new(assert_cmd::cargo_bin!("kopi"));
    cmd.arg("analyze").arg("--data-dir").arg(temp.path());
    cmd.assert().failure().code(2);
    assert_eq!(fs::read_to_string(&out).unwrap(), "sentinel");

    let mut cmd = Command::new(assert_cmd::cargo_bin!("kopi"));
    cmd.arg("analyze")
        .arg("--data-dir")
        .arg(temp.path())
        .arg("--overwrite");
    cmd.assert().success();
    assert_ne!(fs::read_to_string(&out).unwrap(), "sentinel");
}

#[test]
fn analyze_with_too_few_days_exits_with_data_error() {
    let temp = tempdir().unwrap();
    write_day(temp.path(), "2024-04-01", 1, 1);
    write_day(temp.path(), "2024-04-02", 1, 1);

    let mut cmd = Command::new(assert_cmd::cargo_bin!("kopi"));
    cmd.arg("analyze").arg("--data-dir").arg(temp.path());
    let output = cmd.assert().failure().code(4).get_output().stderr.clone();
    let text = String::from_utf8_lossy(&output);
    assert!(text.contains("found 2"));
    assert!(!temp.path().join("analytics.json").exists());
}

#[test]
fn render_writes_markdown_next_to_report() {
    let temp = tempdir().unwrap();
    write_days(temp.path());
    let report = temp.path().join("out").join("analytics.json");
    fs::create_dir_all(report.parent().unwrap()).unwrap();

    let mut cmd = Command::new(assert_cmd::cargo_bin!("kopi"));
    cmd.arg("analyze")
        .arg("--data-dir")
        .arg(temp.path())
        .arg("--out")
        .arg(&report);
    cmd.assert().success();

    let mut cmd = Command::new(assert_cmd::cargo_bin!("kopi"));
    cmd.arg("render").arg(&report);
    cmd.assert().success();

    let markdown = fs::read_to_string(report.with_extension("md")).unwrap();
    assert!(markdown.starts_with("# FFO Sentiment Analytics"));
    assert!(markdown.contains("## Velocity Alerts"));
}

#[test]
fn unknown_mode_is_usage_error() {
    let temp = tempdir().unwrap();
    let mut cmd = Command::new(assert_cmd::cargo_bin!("kopi"));
    cmd.args(["analyze", "--mode", "hourly", "--data-dir"])
        .arg(temp.path());
    cmd.assert().failure().code(2);
}
