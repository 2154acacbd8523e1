#![cfg(test)]

use std::sync::Arc;

use super::common::*;
use crate::kernel::bootstrap::{Application, LifecycleState};
use crate::kernel::constants::{EXIT_FAILURE, EXIT_HELP, EXIT_SUCCESS};
use crate::kernel::error::Error;
use crate::kernel::tool::{CommandTool, ServerTool};
use crate::unit_system::UnitDescriptor;

#[tokio::test]
async fn test_server_tool_serves_then_closes() {
    let journal = journal();
    let registry = registry_with(
        &journal,
        vec![recording("storage", &["logger"], &journal), test_server(&journal, false)],
    );
    let mut tool = ServerTool::new(Application::new("app", registry), ["storage"]);

    let status = tool.run(["app"]).await;

    assert_eq!(status, EXIT_SUCCESS);
    assert_eq!(tool.application().state(), LifecycleState::Closed);
    assert_eq!(
        entries(&journal),
        vec![
            "construct:logger",
            "construct:storage",
            "construct:server",
            "serve",
            "close:server",
            "close:storage",
            "close:logger",
        ]
    );
}

#[tokio::test]
async fn test_server_tool_reports_serve_failure() {
    let journal = journal();
    let registry = registry_with(&journal, vec![test_server(&journal, true)]);
    let mut tool = ServerTool::new(Application::new("app", registry), Vec::<String>::new());

    assert_eq!(tool.run(["app"]).await, EXIT_FAILURE);
    assert_eq!(entries_for(&journal, "close"), vec!["server", "logger"]);
}

#[tokio::test]
async fn test_server_tool_requires_server_capability() {
    let journal = journal();
    // A `server` unit that is not a Server
    let registry = registry_with(&journal, vec![recording("server", &[], &journal)]);
    let mut tool = ServerTool::new(Application::new("app", registry), ["server"]);

    assert_eq!(tool.run(["app"]).await, EXIT_FAILURE);
    assert!(!entries(&journal).contains(&"serve".to_string()));
    assert_eq!(entries_for(&journal, "close"), vec!["server", "logger"]);
}

#[tokio::test]
async fn test_server_tool_help_constructs_nothing() {
    let journal = journal();
    let registry = registry_with(&journal, vec![test_server(&journal, false)]);
    let mut tool = ServerTool::new(Application::new("app", registry), Vec::<String>::new());

    assert_eq!(tool.run(["app", "--help"]).await, EXIT_HELP);
    assert!(entries_for(&journal, "construct").is_empty());
}

#[test]
fn test_command_tool_runs_main_between_start_and_close() {
    let journal = journal();
    let registry = registry_with(&journal, vec![recording("cache", &[], &journal)]);
    let mut tool = CommandTool::new(Application::new("app", registry), ["cache"]);

    let seen = Arc::clone(&journal);
    let status = tool.run(["app"], |app| {
        record(&seen, format!("main:{}", app.instances().len()));
        Ok(())
    });

    assert_eq!(status, EXIT_SUCCESS);
    assert_eq!(
        entries(&journal),
        vec!["construct:logger", "construct:cache", "main:2", "close:cache", "close:logger"]
    );
}

#[test]
fn test_command_tool_main_failure_still_closes() {
    let journal = journal();
    let registry = registry_with(&journal, vec![recording("cache", &[], &journal)]);
    let mut tool = CommandTool::new(Application::new("app", registry), ["cache"]);

    let status = tool.run(["app"], |_app| Err(Error::from("bad input")));

    assert_eq!(status, EXIT_FAILURE);
    assert_eq!(entries_for(&journal, "close"), vec!["cache", "logger"]);
}

#[test]
fn test_command_tool_close_failure_fails_successful_run() {
    let journal = journal();
    let registry = registry_with(&journal, vec![failing_close("cache", &[], &journal)]);
    let mut tool = CommandTool::new(Application::new("app", registry), ["cache"]);

    assert_eq!(tool.run(["app"], |_app| Ok(())), EXIT_FAILURE);
}

#[test]
fn test_command_tool_closes_partial_construction() {
    let journal = journal();
    let registry = registry_with(
        &journal,
        vec![
            recording("cache", &[], &journal),
            failing_construct("storage", &["cache"], &journal),
            UnitDescriptor::new("api")
                .depends_on(["storage"])
                .on_construct(|_ctx| panic!("api must not be constructed")),
        ],
    );
    let mut tool = CommandTool::new(Application::new("app", registry), ["api"]);

    let status = tool.run(["app"], |_app| panic!("main must not run"));

    assert_eq!(status, EXIT_FAILURE);
    assert_eq!(tool.application().state(), LifecycleState::Closed);
    assert_eq!(entries_for(&journal, "close"), vec!["cache", "logger"]);
}
