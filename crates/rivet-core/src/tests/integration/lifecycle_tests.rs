#![cfg(test)]

use std::sync::Arc;

use super::common::*;
use crate::flags::FlagDefaults;
use crate::kernel::bootstrap::{Application, LifecycleState};
use crate::kernel::constants::{EXIT_FAILURE, EXIT_HELP, EXIT_SUCCESS, EXIT_VERSION};
use crate::kernel::error::Error;
use crate::unit_system::{Logger, Unit, UnitDescriptor};

#[test]
fn test_full_lifecycle_constructs_dependencies_first_and_closes_in_reverse() {
    let journal = journal();
    let registry = registry_with(
        &journal,
        vec![
            recording("storage", &["logger"], &journal),
            recording("server", &["storage", "logger"], &journal),
        ],
    );
    let mut app = Application::new("app", registry);

    app.init(&["server"]).expect("init failed");
    assert_eq!(app.plan().names(), vec!["logger", "storage", "server"]);
    assert_eq!(app.state(), LifecycleState::Configured);

    app.start(["app"]).expect("start failed");
    assert_eq!(app.state(), LifecycleState::Running);
    assert_eq!(entries_for(&journal, "construct"), vec!["logger", "storage", "server"]);

    app.close().expect("close failed");
    assert_eq!(app.state(), LifecycleState::Closed);
    assert_eq!(entries_for(&journal, "close"), vec!["server", "storage", "logger"]);
    assert!(app.instances().is_empty());
}

#[test]
fn test_failed_construction_stops_dependents_and_keeps_built_instances() {
    let journal = journal();
    let registry = registry_with(
        &journal,
        vec![
            failing_construct("storage", &["logger"], &journal),
            recording("server", &["storage", "logger"], &journal),
        ],
    );
    let mut app = Application::new("app", registry);
    app.init(&["server"]).unwrap();

    let err = app.start(["app"]).unwrap_err();
    match &err {
        Error::ConstructionFailed { unit, source } => {
            assert_eq!(unit, "storage");
            assert!(source.to_string().contains("disk unavailable"));
        }
        other => panic!("Expected ConstructionFailed, got {:?}", other),
    }
    assert_eq!(app.state(), LifecycleState::Failed);
    assert_eq!(entries_for(&journal, "construct"), vec!["logger", "storage"]);

    // Cleanup is left to the caller
    assert!(app.instances().has_name("logger"));
    assert!(entries_for(&journal, "close").is_empty());

    app.close().unwrap();
    assert_eq!(entries_for(&journal, "close"), vec!["logger"]);
}

#[test]
fn test_close_attempts_every_instance_and_collects_failures() {
    let journal = journal();
    let registry = registry_with(
        &journal,
        vec![
            recording("u1", &[], &journal),
            failing_close("u2", &[], &journal),
            recording("u3", &[], &journal),
            failing_close("u4", &[], &journal),
            recording("u5", &[], &journal),
        ],
    );
    let mut app = Application::new("app", registry);
    app.init(&["u1", "u2", "u3", "u4", "u5"]).unwrap();
    app.start(["app"]).unwrap();

    let err = app.close().unwrap_err();
    assert_eq!(entries_for(&journal, "close"), vec!["u5", "u4", "u3", "u2", "u1", "logger"]);
    match err {
        Error::Compound(compound) => {
            assert_eq!(compound.len(), 2);
            let failed: Vec<&str> = compound.errors().iter().filter_map(|e| e.unit_name()).collect();
            assert_eq!(failed, vec!["u4", "u2"]);
            assert!(compound.errors().iter().all(|e| matches!(e, Error::CloseFailed { .. })));
        }
        other => panic!("Expected Compound error, got {:?}", other),
    }
    assert_eq!(app.state(), LifecycleState::Closed);
}

#[test]
fn test_close_is_idempotent() {
    let journal = journal();
    let registry = registry_with(&journal, vec![recording("cache", &[], &journal)]);
    let mut app = Application::new("app", registry);
    app.init(&["cache"]).unwrap();
    app.start(["app"]).unwrap();

    app.close().unwrap();
    app.close().unwrap();
    assert_eq!(entries_for(&journal, "close"), vec!["cache", "logger"]);
}

#[test]
fn test_construct_hooks_see_dependencies_and_flags() {
    let journal = journal();
    let seen = journal.clone();
    let worker = UnitDescriptor::new("worker")
        .depends_on(["logger"])
        .on_configure(|flags| {
            flags.flag_uint("workers", 2, "Number of worker threads")?;
            Ok(())
        })
        .on_construct(move |ctx| {
            let logger = ctx.capability::<dyn Logger>("logger")?;
            let workers = ctx.flags().get_uint("workers")?;
            logger.info(&format!("starting {} workers", workers));
            record(&seen, format!("workers:{}", workers));
            Ok(None)
        });
    let registry = registry_with(&journal, vec![worker]);
    let mut app = Application::new("app", registry);
    app.init(&["worker"]).unwrap();
    app.start(["app", "--workers", "8"]).unwrap();

    assert_eq!(entries_for(&journal, "workers"), vec!["8"]);
    // Hook returned no instance
    assert!(!app.instances().has_name("worker"));

    let handle = app.instances().lookup("logger").unwrap();
    let logger = handle.instance().as_logger().expect("logger capability");
    assert!(!logger.is_debug());
    assert!(app.logger().is_ok());
    app.close().unwrap();
}

#[test]
fn test_defaults_override_registered_flags() {
    let journal = journal();
    let seen = journal.clone();
    let web = UnitDescriptor::new("web")
        .on_configure(|flags| {
            flags.flag_uint("port", 80, "Listen port")?;
            flags.flag_string("host", "localhost", "Listen host")?;
            Ok(())
        })
        .on_construct(move |ctx| {
            record(
                &seen,
                format!("bind:{}:{}", ctx.flags().get_string("host")?, ctx.flags().get_uint("port")?),
            );
            Ok(None)
        });
    let registry = registry_with(&journal, vec![web]);

    let mut defaults = FlagDefaults::new();
    defaults.insert("port", 8080);
    defaults.insert("host", "0.0.0.0");
    let mut app = Application::new("app", registry).with_defaults(defaults);
    app.init(&["web"]).unwrap();
    app.start(["app", "--host", "127.0.0.1"]).unwrap();

    assert_eq!(entries_for(&journal, "bind"), vec!["127.0.0.1:8080"]);
}

#[test]
fn test_configure_failure_stops_before_construction() {
    let journal = journal();
    let broken = UnitDescriptor::new("broken")
        .on_configure(|flags| {
            // Collides with the first registration
            flags.flag_bool("dry-run", false, "Do nothing")?;
            flags.flag_bool("dry-run", false, "Do nothing again")?;
            Ok(())
        })
        .on_construct(|_ctx| Ok(None));
    let registry = registry_with(&journal, vec![broken]);
    let mut app = Application::new("app", registry);

    let err = app.init(&["broken"]).unwrap_err();
    assert!(matches!(&err, Error::ConfigurationFailed { unit, .. } if unit == "broken"));
    assert_eq!(app.state(), LifecycleState::Failed);
    assert!(entries(&journal).is_empty());
}

#[test]
fn test_run_maps_outcomes_to_exit_statuses() {
    let cases: [(&[&str], i32); 4] = [
        (&["app"], EXIT_SUCCESS),
        (&["app", "--help"], EXIT_HELP),
        (&["app", "--version"], EXIT_VERSION),
        (&["app", "--no-such-flag"], EXIT_FAILURE),
    ];
    for (args, expected) in cases {
        let journal = journal();
        let registry = registry_with(&journal, vec![recording("cache", &[], &journal)]);
        let mut app = Application::new("app", registry);
        app.init(&["cache"]).unwrap();

        assert_eq!(app.run(args.iter().copied()), expected, "args: {:?}", args);
        if expected == EXIT_SUCCESS {
            assert_eq!(app.state(), LifecycleState::Running);
        } else {
            assert_eq!(app.state(), LifecycleState::Failed);
            assert!(entries_for(&journal, "construct").is_empty(), "args: {:?}", args);
        }
        app.close().unwrap();
    }
}

#[test]
fn test_unit_without_instance_is_not_closed() {
    let journal = journal();
    let registry = registry_with(&journal, vec![UnitDescriptor::new("flags-only").depends_on(["logger"])]);
    let mut app = Application::new("app", registry);
    app.init(&["flags-only"]).unwrap();
    app.start(["app"]).unwrap();

    assert_eq!(app.instances().len(), 1);
    app.close().unwrap();
    assert_eq!(entries_for(&journal, "close"), vec!["logger"]);
}

#[test]
fn test_handles_outlive_close() {
    let journal = journal();
    let registry = registry_with(&journal, vec![recording("cache", &[], &journal)]);
    let mut app = Application::new("app", registry);
    app.init(&["cache"]).unwrap();
    app.start(["app"]).unwrap();

    let handle = app.instances().lookup("cache").unwrap();
    app.close().unwrap();

    assert_eq!(handle.name(), "cache");
    assert_eq!(Arc::strong_count(handle.instance()), 1);
    assert!(handle.instance().as_server().is_none());
}
