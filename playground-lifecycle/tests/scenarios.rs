//! End-to-end flows across lifecycle and supervision.

#![cfg(unix)]

mod common;

use std::time::Duration;

use common::harness;
use playground_core::{PlaygroundError, PlaygroundId};
use playground_lifecycle::{NewRepo, StepOutcome};
use playground_supervisor::DevEvent;
use tokio::sync::broadcast;

async fn exits_for(
    rx: &mut broadcast::Receiver<DevEvent>,
    id: &PlaygroundId,
    window: Duration,
) -> usize {
    let mut count = 0;
    let deadline = tokio::time::Instant::now() + window;
    while let Ok(Ok(event)) = tokio::time::timeout_at(deadline, rx.recv()).await {
        if event.is_exit() && event.id() == id {
            count += 1;
        }
    }
    count
}

async fn first_exit(rx: &mut broadcast::Receiver<DevEvent>, id: &PlaygroundId) -> Option<i32> {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            if let Ok(DevEvent::Exit { id: got, code, .. }) = rx.recv().await {
                if &got == id {
                    return code;
                }
            }
        }
    })
    .await
    .expect("exit event within timeout")
}

#[tokio::test]
async fn create_from_url_yields_clone_backed_record() {
    let h = harness(&[]);
    let url = "https://example.com/org/widget.git";
    let record = h.playgrounds.create_repo(NewRepo::url(url)).expect("create");

    assert!(record.id.as_str().starts_with("widget-"));
    assert_eq!(record.repo_url, url);
    assert!(record.path.is_dir());
    let views = h.playgrounds.list().expect("list");
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].status, None);
}

#[tokio::test]
async fn start_without_any_command_source_names_the_playground() {
    let h = harness(&[]);
    let record = h
        .playgrounds
        .create_repo(NewRepo::url("https://example.com/org/bare.git"))
        .expect("create");

    let err = h
        .playgrounds
        .supervisor()
        .start(&record.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, PlaygroundError::NoDevCommand { .. }), "got: {err}");
    assert!(err.to_string().contains(record.id.as_str()));
    assert!(!h.playgrounds.supervisor().is_running(&record.id));
}

#[tokio::test]
async fn manifest_in_clone_resolves_install_then_run() {
    let h = harness(&[]);
    let record = h
        .playgrounds
        .create_repo(NewRepo::url("https://example.com/org/node-app.git"))
        .expect("create");
    assert!(record.path.join("package.json").is_file());

    let supervisor = h.playgrounds.supervisor();
    let mut rx = supervisor.subscribe();
    let outcome = supervisor.start(&record.id, None).await.expect("start");
    assert_eq!(outcome.command, "npm install && npm run dev");
    assert!(supervisor
        .get_log(&record.id)
        .log
        .starts_with("$ npm install && npm run dev\n"));

    supervisor.stop(&record.id);
    first_exit(&mut rx, &record.id).await;
    assert!(!supervisor.is_running(&record.id));
}

#[tokio::test]
async fn second_delete_is_not_found() {
    let h = harness(&[]);
    let record = h
        .playgrounds
        .create_repo(NewRepo::url("https://example.com/org/widget.git"))
        .expect("create");

    h.playgrounds.delete(&record.id).expect("first delete");
    let err = h.playgrounds.delete(&record.id).unwrap_err();
    assert!(matches!(err, PlaygroundError::PlaygroundNotFound { .. }));
}

#[tokio::test]
async fn stop_racing_natural_exit_publishes_one_exit() {
    let h = harness(&[]);
    let record = h
        .playgrounds
        .create_repo(NewRepo {
            repo_url: "https://example.com/org/quick.git".into(),
            run_command: Some("sleep 0.2".into()),
            ..NewRepo::default()
        })
        .expect("create");

    let supervisor = h.playgrounds.supervisor();
    let mut rx = supervisor.subscribe();
    supervisor.start(&record.id, None).await.expect("start");
    tokio::time::sleep(Duration::from_millis(190)).await;
    supervisor.stop(&record.id);

    assert_eq!(exits_for(&mut rx, &record.id, Duration::from_secs(3)).await, 1);
    assert!(!supervisor.is_running(&record.id));
}

#[tokio::test]
async fn delete_stops_running_dev_command() {
    let h = harness(&[]);
    let record = h
        .playgrounds
        .create_repo(NewRepo {
            repo_url: "https://example.com/org/server.git".into(),
            run_command: Some("sleep 30".into()),
            ..NewRepo::default()
        })
        .expect("create");

    let supervisor = h.playgrounds.supervisor();
    let mut rx = supervisor.subscribe();
    supervisor.start(&record.id, None).await.expect("start");
    assert!(supervisor.is_running(&record.id));

    let report = h.playgrounds.delete(&record.id).expect("delete");
    assert_eq!(report.outcome_of("stop_dev_command"), Some(&StepOutcome::Done));
    assert!(!record.path.exists());

    first_exit(&mut rx, &record.id).await;
    assert!(supervisor.running().is_empty());
}
