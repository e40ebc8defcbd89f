use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn smca_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("smca");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();

    fs::write(
        data_dir.join("hashtags_data.json"),
        r##"{"technology": {"software": ["#coding", "#devlife"]}, "general": {"team": ["#teamwork"]}}"##,
    )
    .unwrap();

    let files_dir = root.join("files");
    fs::create_dir_all(&files_dir).unwrap();
    fs::write(files_dir.join("post.txt"), "Great job team!!!").unwrap();
    fs::write(files_dir.join("blank.txt"), "   \n  ").unwrap();
    fs::write(
        files_dir.join("launch.md"),
        "Our new software app ships today.\n\nThe cloud data tools help every developer write better code.",
    )
    .unwrap();

    let config_content = format!(
        r#"[uploads]
dir = "{root}/uploads"

[pipeline]
keyword_limit = 5

[hashtags]
cache_path = "{root}/data/hashtags_cache.json"
data_path = "{root}/data/hashtags_data.json"
scrape = false
"#,
        root = root.display()
    );

    let config_path = config_dir.join("smca.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_smca(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = smca_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run smca binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

fn files(config_path: &Path) -> PathBuf {
    config_path.parent().unwrap().parent().unwrap().join("files")
}

#[test]
fn test_analyze_prints_report() {
    let (_tmp, config) = setup_test_env();
    let file = files(&config).join("post.txt");

    let (stdout, stderr, success) =
        run_smca(&config, &["analyze", file.to_str().unwrap(), "--progress", "off"]);
    assert!(success, "analyze failed: {}", stderr);

    let report: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(report["extracted_text"], "Great job team!!!");
    assert_eq!(report["sentiment_analysis"]["sentiment"], "positive");
    assert!(report["sentiment_analysis"]["confidence"].as_f64().unwrap() > 0.5);
    let engagement = report["engagement_score"].as_f64().unwrap();
    assert!((0.0..=100.0).contains(&engagement));
    assert_eq!(report["metadata"]["pipeline_version"], "1.0");

    // The user's file is left in place.
    assert!(file.exists());
}

#[test]
fn test_analyze_json_progress_on_stderr() {
    let (_tmp, config) = setup_test_env();
    let file = files(&config).join("launch.md");

    let (stdout, stderr, success) =
        run_smca(&config, &["analyze", file.to_str().unwrap(), "--progress", "json"]);
    assert!(success, "analyze failed: {}", stderr);

    let progress: Vec<u64> = stderr
        .lines()
        .filter_map(|l| serde_json::from_str::<serde_json::Value>(l).ok())
        .filter(|v| v["event"] == "progress")
        .map(|v| v["progress"].as_u64().unwrap())
        .collect();
    assert_eq!(progress.first(), Some(&30));
    assert_eq!(progress.last(), Some(&100));
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));

    let report: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert!(report["extracted_keywords"].as_array().unwrap().len() <= 5);
    assert_eq!(report["category"][0], "Technology");
    assert_eq!(
        report["hashtag_suggestions"],
        serde_json::json!(["#coding", "#devlife"])
    );
}

#[test]
fn test_analyze_blank_file_fails() {
    let (_tmp, config) = setup_test_env();
    let file = files(&config).join("blank.txt");

    let (stdout, stderr, success) =
        run_smca(&config, &["analyze", file.to_str().unwrap(), "--progress", "off"]);
    assert!(!success);
    assert!(stdout.trim().is_empty());
    assert!(stderr.contains("No usable text found"), "stderr: {}", stderr);
}

#[test]
fn test_analyze_unsupported_file_fails() {
    let (_tmp, config) = setup_test_env();
    let file = files(&config).join("sheet.xlsx");
    fs::write(&file, "not really a spreadsheet").unwrap();

    let (_, stderr, success) =
        run_smca(&config, &["analyze", file.to_str().unwrap(), "--progress", "off"]);
    assert!(!success);
    assert!(stderr.contains("Extraction failed"), "stderr: {}", stderr);
}

#[test]
fn test_analyze_missing_file_fails() {
    let (_tmp, config) = setup_test_env();
    let (_, stderr, success) = run_smca(&config, &["analyze", "/nonexistent/post.txt"]);
    assert!(!success);
    assert!(stderr.contains("File not found"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let (_tmp, config) = setup_test_env();
    fs::write(&config, "[analyzers]\nbackend = \"gpt\"\n").unwrap();
    let file = files(&config).join("post.txt");

    let (_, stderr, success) = run_smca(&config, &["analyze", file.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("Unknown analyzer backend"));
}

#[test]
fn test_completions() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, success) = run_smca(&config, &["completions", "bash"]);
    assert!(success);
    assert!(stdout.contains("smca"));
}
