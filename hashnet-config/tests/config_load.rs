use hashnet_config::{CooccurrenceDirection, HashnetConfigLoader};
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

const FILE_YAML: &str = r##"
version: "1"
twitter:
  bearer_token: "${HASHNET_TEST_BEARER}"
storage:
  database_url: "sqlite://from-file.db"
collection:
  hashtags: ["#rustlang", "#opensource"]
  max_results_per_query: 200
  min_reposts: 2
  min_likes: 10
  pause_ms: 0
analysis:
  min_nodes: 50
  top_n: 5
  output_dir: "out"
  cooccurrence: symmetric
logging:
  format: json
  emit_stderr: false
"##;

#[test]
#[serial]
fn loads_file_and_expands_secrets() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "hashnet.yaml", FILE_YAML);

    temp_env::with_var("HASHNET_TEST_BEARER", Some("secret-token"), || {
        let config = HashnetConfigLoader::new()
            .with_file(&p)
            .load()
            .expect("load config");

        assert_eq!(config.version.as_deref(), Some("1"));
        assert_eq!(config.twitter.bearer_token, "secret-token");
        assert_eq!(config.twitter.base_url, "https://api.twitter.com");
        assert_eq!(config.collection.hashtags, vec!["#rustlang", "#opensource"]);
        assert_eq!(config.collection.min_reposts, 2);
        assert_eq!(config.collection.min_likes, 10);
        assert_eq!(config.analysis.min_nodes, 50);
        assert_eq!(config.analysis.output_dir, PathBuf::from("out"));
        assert_eq!(config.analysis.cooccurrence, CooccurrenceDirection::Symmetric);
        assert!(!config.logging.emit_stderr);
        assert!(config.missing_credentials().is_empty());
    });
}

#[test]
#[serial]
fn environment_overrides_file() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "hashnet.yaml", FILE_YAML);

    temp_env::with_vars(
        [
            ("HASHNET_TEST_BEARER", Some("t")),
            ("HASHNET_STORAGE__DATABASE_URL", Some("sqlite://from-env.db")),
        ],
        || {
            let config = HashnetConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load config");
            assert_eq!(config.storage.database_url, "sqlite://from-env.db");
        },
    );
}

#[test]
#[serial]
fn missing_optional_file_falls_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let config = HashnetConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("defaults");

    assert_eq!(config.storage.database_url, "sqlite://hashnet.db");
    assert_eq!(config.analysis.top_n, 10);
    assert_eq!(config.missing_credentials(), vec!["TWITTER_BEARER_TOKEN"]);
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let res = HashnetConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(res.is_err());
}

#[test]
#[serial]
fn environment_replaces_hashtag_list() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "hashnet.yaml", FILE_YAML);

    temp_env::with_vars(
        [
            ("HASHNET_TEST_BEARER", Some("t")),
            ("HASHNET_COLLECTION__HASHTAGS", Some("#python,#datascience,#ml")),
        ],
        || {
            let config = HashnetConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load config");
            assert_eq!(
                config.collection.hashtags,
                vec!["#python", "#datascience", "#ml"]
            );
            assert!(config.validate().is_ok());
        },
    );
}

#[test]
#[serial]
fn inline_yaml_keeps_hash_prefixed_tags() {
    let config = HashnetConfigLoader::new()
        .with_yaml_str(
            r##"
collection:
  hashtags: ["#rust", "#wasm"]
  min_likes: 5
analysis:
  cooccurrence: symmetric
"##,
        )
        .load()
        .expect("inline yaml");

    assert_eq!(config.collection.hashtags, vec!["#rust", "#wasm"]);
    assert_eq!(config.collection.min_likes, 5);
    assert_eq!(config.collection.lang, "en");
    assert_eq!(config.analysis.cooccurrence, CooccurrenceDirection::Symmetric);
}
