use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn aliaszip_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("aliaszip");
    path
}

const MANIFEST: &str = r#"{
  "Senbonzakura": { "path": "songs/senbonzakura", "alias": ["千本桜"] },
  "Doremi": { "path": "songs/doremi", "alias": ["どれみ", "do re mi"] },
  "夜に駆ける": { "path": "songs/yoru", "alias": ["Racing into the Night"] },
  "ロキ": { "path": "songs/roki", "alias": [] }
}"#;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(root.join("alias.json"), MANIFEST).unwrap();

    let config_content = format!(
        r#"[manifest]
path = "{root}/alias.json"

[output]
dir = "{root}/downloads"
"#,
        root = root.display()
    );

    let config_path = config_dir.join("aliaszip.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_aliaszip(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = aliaszip_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .arg("--status")
        .arg("off")
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run aliaszip binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn test_search_case_and_punctuation_insensitive() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, ok) = run_aliaszip(&config, &["search", "DO-RE"]);
    assert!(ok);
    assert!(stdout.contains("Doremi"));
    assert!(!stdout.contains("Senbonzakura"));
}

#[test]
fn test_search_pinyin_matches_chinese_alias() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, ok) = run_aliaszip(&config, &["search", "qianben"]);
    assert!(ok);
    assert!(stdout.contains("Senbonzakura"));
}

#[test]
fn test_search_romaji_matches_katakana_key() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, ok) = run_aliaszip(&config, &["search", "roki"]);
    assert!(ok);
    assert!(stdout.contains("ロキ"));
}

#[test]
fn test_search_hiragana_matches_katakana_key() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, ok) = run_aliaszip(&config, &["search", "ろき"]);
    assert!(ok);
    assert!(stdout.contains("ロキ"));
}

#[test]
fn test_search_no_results() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, ok) = run_aliaszip(&config, &["search", "zzzzqqq"]);
    assert!(ok);
    assert!(stdout.contains("No results."));
}

#[test]
fn test_search_json_output() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, ok) = run_aliaszip(&config, &["search", "doremi", "--json"]);
    assert!(ok);
    let hits: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(hits[0]["key"], "Doremi");
    assert_eq!(hits[0]["path"], "songs/doremi");
}

#[test]
fn test_download_without_endpoints_fails() {
    let (tmp, config) = setup_test_env();
    let (_, stderr, ok) = run_aliaszip(&config, &["download", "Doremi"]);
    assert!(!ok);
    assert!(stderr.contains("no endpoint configured"));
    assert!(!tmp.path().join("downloads").join("Doremi.zip").exists());
}

#[test]
fn test_missing_manifest_is_fatal() {
    let (tmp, config) = setup_test_env();
    fs::remove_file(tmp.path().join("alias.json")).unwrap();
    let (_, stderr, ok) = run_aliaszip(&config, &["search", "doremi"]);
    assert!(!ok);
    assert!(stderr.contains("failed to read manifest"));
}

#[test]
fn test_malformed_manifest_is_fatal() {
    let (tmp, config) = setup_test_env();
    fs::write(tmp.path().join("alias.json"), "{ broken").unwrap();
    let (_, stderr, ok) = run_aliaszip(&config, &["search", "doremi"]);
    assert!(!ok);
    assert!(stderr.contains("failed to parse manifest"));
}

#[test]
fn test_missing_config_fails() {
    let tmp = TempDir::new().unwrap();
    let (_, stderr, ok) = run_aliaszip(&tmp.path().join("nope.toml"), &["search", "x"]);
    assert!(!ok);
    assert!(stderr.contains("Failed to read config file"));
}

#[test]
fn test_endpoints_add_list_remove() {
    let (_tmp, config) = setup_test_env();

    let (stdout, _, ok) = run_aliaszip(&config, &["endpoints", "list"]);
    assert!(ok);
    assert!(stdout.contains("No endpoints configured"));

    let (stdout, stderr, ok) = run_aliaszip(
        &config,
        &[
            "endpoints",
            "add",
            "--name",
            "main",
            "--host",
            "git.example.org",
            "--owner",
            "someone",
            "--repo",
            "charts",
            "--no-proxy",
        ],
    );
    assert!(ok, "add failed: {}", stderr);
    let id: String = stdout
        .trim()
        .trim_start_matches("Added endpoint ")
        .trim_end_matches('.')
        .to_string();
    assert!(id.parse::<i64>().is_ok(), "unexpected output: {}", stdout);

    let (stdout, _, ok) = run_aliaszip(&config, &["endpoints", "list"]);
    assert!(ok);
    assert!(stdout.contains("main"));
    assert!(stdout.contains("git.example.org/someone/charts"));
    assert!(stdout.contains("off"));

    let saved = fs::read_to_string(&config).unwrap();
    assert!(saved.contains("[[endpoints]]"));
    assert!(saved.contains("use_proxy = false"));

    let (_, _, ok) = run_aliaszip(&config, &["endpoints", "edit", &id, "--name", "mirror"]);
    assert!(ok);
    let (stdout, _, _) = run_aliaszip(&config, &["endpoints", "list"]);
    assert!(stdout.contains("mirror"));

    let (_, _, ok) = run_aliaszip(&config, &["endpoints", "remove", &id]);
    assert!(ok);
    let (stdout, _, _) = run_aliaszip(&config, &["endpoints", "list"]);
    assert!(stdout.contains("No endpoints configured"));
}

#[test]
fn test_endpoints_add_rejects_blank_field() {
    let (_tmp, config) = setup_test_env();
    let (_, stderr, ok) = run_aliaszip(
        &config,
        &[
            "endpoints", "add", "--name", "x", "--host", " ", "--owner", "o", "--repo", "r",
        ],
    );
    assert!(!ok);
    assert!(stderr.contains("host"));
}

#[test]
fn test_legacy_api_migrated_on_load() {
    let (tmp, config) = setup_test_env();
    let mut content = fs::read_to_string(&config).unwrap();
    content.push_str("\n[api]\nhost = \"old.example.org\"\nowner = \"o\"\nrepo = \"r\"\n");
    fs::write(&config, content).unwrap();

    let (stdout, _, ok) = run_aliaszip(&config, &["endpoints", "list"]);
    assert!(ok);
    assert!(stdout.contains("migrated"));
    assert!(stdout.contains("old.example.org/o/r"));

    let saved = fs::read_to_string(tmp.path().join("config").join("aliaszip.toml")).unwrap();
    assert!(!saved.contains("[api]"));
    assert!(saved.contains("[[endpoints]]"));
}

#[test]
fn test_manifest_update_migrate_only() {
    let (tmp, config) = setup_test_env();
    let (stdout, stderr, ok) = run_aliaszip(&config, &["manifest", "update", "--migrate-only"]);
    assert!(ok, "update failed: {}", stderr);
    assert!(stdout.contains("total items: 4"));

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(tmp.path().join("alias.json")).unwrap()).unwrap();
    assert_eq!(written["version"], 3);
    let ids: Vec<&str> = written["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|it| it["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["senbonzakura", "doremi", "item", "item-2"]);

    // The migrated file still loads and searches the same way.
    let (stdout, _, ok) = run_aliaszip(&config, &["search", "qianben"]);
    assert!(ok);
    assert!(stdout.contains("Senbonzakura"));

    let (stdout, _, ok) = run_aliaszip(&config, &["manifest", "update", "--migrate-only"]);
    assert!(ok);
    assert!(stdout.contains("no action"));
}

#[test]
fn test_manifest_update_without_endpoints_only_migrates() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, ok) = run_aliaszip(&config, &["manifest", "update"]);
    assert!(ok);
    assert!(stderr.contains("only migrating ids"));
    assert!(stdout.contains("Migrated manifest"));
}

#[test]
fn test_completions() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, ok) = run_aliaszip(&config, &["completions", "bash"]);
    assert!(ok);
    assert!(stdout.contains("aliaszip"));
}
