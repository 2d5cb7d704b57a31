//! Dev-command resolution for clone-backed playgrounds.
//!
//! Sources in order, each consulted only if the previous yielded nothing:
//! explicit argument, catalog `defaultRunCommand`, stored `runCommand`,
//! manifest heuristic.

use playground_core::{Catalog, PlaygroundError, RepoPlayground};
use playground_detector::detect_dev_command;

/// Where a resolved command came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSource {
    Explicit,
    Catalog,
    Stored,
    Manifest(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub command: String,
    pub source: CommandSource,
}

pub fn resolve_command(
    record: &RepoPlayground,
    explicit: Option<&str>,
    catalog: &Catalog,
) -> Result<ResolvedCommand, PlaygroundError> {
    let mut attempted = Vec::new();

    match non_blank(explicit) {
        Some(command) => return Ok(resolved(command, CommandSource::Explicit)),
        None => attempted.push("no explicit command".to_string()),
    }

    match &record.app_store_id {
        Some(app_id) => match catalog.get(app_id) {
            Some(app) => match non_blank(app.default_run_command.as_deref()) {
                Some(command) => return Ok(resolved(command, CommandSource::Catalog)),
                None => attempted.push(format!("catalog app {app_id} has no defaultRunCommand")),
            },
            None => attempted.push(format!("catalog app {app_id} not found")),
        },
        None => attempted.push("not installed from the catalog".to_string()),
    }

    match non_blank(record.run_command.as_deref()) {
        Some(command) => return Ok(resolved(command, CommandSource::Stored)),
        None => attempted.push("no runCommand in metadata".to_string()),
    }

    match detect_dev_command(&record.path) {
        Ok(detected) => Ok(resolved(
            &detected.command,
            CommandSource::Manifest(detected.manifest),
        )),
        Err(err) => {
            attempted.push(err.to_string());
            Err(PlaygroundError::NoDevCommand {
                id: record.id.to_string(),
                attempted,
            })
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn resolved(command: &str, source: CommandSource) -> ResolvedCommand {
    ResolvedCommand {
        command: command.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use playground_core::{AppId, CatalogApp, PlaygroundId};
    use tempfile::TempDir;

    fn record(dir: &TempDir) -> RepoPlayground {
        RepoPlayground {
            id: PlaygroundId::from("widget-1"),
            repo_url: "https://example.com/widget.git".into(),
            path: dir.path().to_path_buf(),
            created_at: Utc::now(),
            run_command: None,
            port: None,
            app_store_id: None,
        }
    }

    fn catalog(run: Option<&str>) -> Catalog {
        Catalog::from_apps(vec![CatalogApp {
            id: AppId::from("blog"),
            name: "Blog".into(),
            description: "d".into(),
            repo_url: "https://example.com/blog.git".into(),
            default_run_command: run.map(str::to_string),
            default_port: None,
            delete_command: None,
        }])
    }

    #[test]
    fn explicit_wins_and_blank_is_absent() {
        let dir = TempDir::new().unwrap();
        let mut rec = record(&dir);
        rec.run_command = Some("make stored".into());
        let r = resolve_command(&rec, Some("make explicit"), &Catalog::default()).unwrap();
        assert_eq!(r.command, "make explicit");
        assert_eq!(r.source, CommandSource::Explicit);

        let r = resolve_command(&rec, Some("   "), &Catalog::default()).unwrap();
        assert_eq!(r.source, CommandSource::Stored);
    }

    #[test]
    fn catalog_beats_stored_and_is_trimmed() {
        let dir = TempDir::new().unwrap();
        let mut rec = record(&dir);
        rec.app_store_id = Some(AppId::from("blog"));
        rec.run_command = Some("make stored".into());
        let r = resolve_command(&rec, None, &catalog(Some("  hugo server  "))).unwrap();
        assert_eq!(r.command, "hugo server");
        assert_eq!(r.source, CommandSource::Catalog);
    }

    #[test]
    fn empty_catalog_command_falls_through_to_stored() {
        let dir = TempDir::new().unwrap();
        let mut rec = record(&dir);
        rec.app_store_id = Some(AppId::from("blog"));
        rec.run_command = Some(" make stored ".into());
        let r = resolve_command(&rec, None, &catalog(Some("   "))).unwrap();
        assert_eq!(r.command, "make stored");
    }

    #[test]
    fn manifest_is_last_resort() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        let r = resolve_command(&record(&dir), None, &Catalog::default()).unwrap();
        assert_eq!(r.command, "npm install && npm run dev");
        assert_eq!(r.source, CommandSource::Manifest("package.json"));
    }

    #[test]
    fn nothing_resolves_lists_every_source() {
        let dir = TempDir::new().unwrap();
        let mut rec = record(&dir);
        rec.app_store_id = Some(AppId::from("gone"));
        let err = resolve_command(&rec, None, &Catalog::default()).unwrap_err();
        match err {
            PlaygroundError::NoDevCommand { id, attempted } => {
                assert_eq!(id, "widget-1");
                assert_eq!(attempted.len(), 4);
                assert!(attempted[1].contains("gone"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
