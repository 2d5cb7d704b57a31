//! Write-then-read roundtrip tests for the metadata store.
//!
//! Each `#[case]` gets its own temp home, no shared state.

use std::path::PathBuf;

use chrono::Utc;
use playground_core::{
    AppId, ContainerPlayground, MetadataStore, PlaygroundId, PlaygroundRecord, RepoPlayground,
};
use rstest::rstest;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn repo(id: &str) -> PlaygroundRecord {
    PlaygroundRecord::Repo(RepoPlayground {
        id: PlaygroundId::from(id),
        repo_url: "https://example.com/org/widget.git".to_string(),
        path: PathBuf::from(format!("/home/u/.playgrounds/github/{id}")),
        created_at: Utc::now(),
        run_command: None,
        port: None,
        app_store_id: None,
    })
}

fn full_repo() -> PlaygroundRecord {
    PlaygroundRecord::Repo(RepoPlayground {
        id: PlaygroundId::from("blog-2026-10-19T08-15-02-113Z"),
        repo_url: "git@github.com:org/blog.git".to_string(),
        path: PathBuf::from("/home/u/.playgrounds/github/blog-2026-10-19T08-15-02-113Z"),
        created_at: Utc::now(),
        run_command: Some("npm install && npm run dev".to_string()),
        port: Some(5173),
        app_store_id: Some(AppId::from("blog")),
    })
}

fn container(id: &str) -> PlaygroundRecord {
    PlaygroundRecord::Container(ContainerPlayground {
        id: PlaygroundId::from(id),
        image: "nginx:latest".to_string(),
        container_id: "0123456789ab".to_string(),
        port: Some(8080),
        created_at: Utc::now(),
    })
}

fn unicode_repo() -> PlaygroundRecord {
    PlaygroundRecord::Repo(RepoPlayground {
        id: PlaygroundId::from("проект-2026-10-19T08-15-02-113Z"),
        repo_url: "https://example.com/org/проект.git".to_string(),
        path: PathBuf::from("/home/u/.playgrounds/github/проект"),
        created_at: Utc::now(),
        run_command: Some("echo '日本語' && echo \"quoted\"".to_string()),
        port: None,
        app_store_id: None,
    })
}

// ---------------------------------------------------------------------------
// Parameterised roundtrip
// ---------------------------------------------------------------------------

#[rstest]
#[case("empty", vec![])]
#[case("single_repo", vec![repo("widget-1")])]
#[case("all_fields", vec![full_repo()])]
#[case("mixed_types", vec![container("docker-nginx-1"), repo("widget-2"), full_repo()])]
#[case("unicode_strings", vec![unicode_repo()])]
fn write_then_read_is_identity(#[case] label: &str, #[case] list: Vec<PlaygroundRecord>) {
    let home = TempDir::new().expect("tempdir");
    let store = MetadataStore::at(home.path());
    store
        .write_all(&list)
        .unwrap_or_else(|e| panic!("[{label}] write failed: {e}"));
    let back = store
        .read_all()
        .unwrap_or_else(|e| panic!("[{label}] read failed: {e}"));
    assert_eq!(back, list, "[{label}] roundtrip");
}

#[test]
fn written_file_is_pretty_with_trailing_newline() {
    let home = TempDir::new().expect("tempdir");
    let store = MetadataStore::at(home.path());
    store.write_all(&[repo("widget-1")]).expect("write");

    let raw = std::fs::read_to_string(store.meta_path()).expect("read raw");
    assert!(raw.ends_with("]\n"), "trailing newline expected, got: {raw:?}");
    assert!(raw.contains("\n  {\n    \"type\": \"github\""), "two-space indent: {raw}");
}
