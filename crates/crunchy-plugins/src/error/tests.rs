//! Unit tests for error rendering.

use std::error::Error as _;

use rstest::rstest;

use super::*;

#[test]
fn cycle_renders_as_arrow_chain() {
    let error = CapabilityError::CyclicDependency {
        cycle: vec!["a".into(), "b".into(), "a".into()],
    };
    assert_eq!(error.to_string(), "cyclic plugin dependency: a -> b -> a");
}

#[test]
fn unsatisfied_requirement_names_plugin_and_capability() {
    let error = CapabilityError::UnsatisfiedRequirement {
        plugin: "editor".into(),
        capability: "io_widget".into(),
    };
    let message = error.to_string();
    assert!(message.contains("editor"));
    assert!(message.contains("io_widget"));
}

#[test]
fn registration_failure_exposes_callback_error_as_source() {
    let error = CapabilityError::RegistrationFailed {
        plugin: "tooltip".into(),
        source: anyhow::anyhow!("boom"),
    };
    assert!(error.to_string().contains("tooltip"));
    let source = error.source().expect("source should be present");
    assert_eq!(source.to_string(), "boom");
}

#[rstest]
#[case::duplicate(RegistryError::duplicate("service", "insert_editor"), "already registered")]
#[case::missing(RegistryError::not_found("service", "insert_editor"), "not registered")]
fn registry_errors_render_kind_and_key(#[case] error: RegistryError, #[case] fragment: &str) {
    let message = error.to_string();
    assert!(message.starts_with("service 'insert_editor'"), "{message}");
    assert!(message.contains(fragment), "{message}");
}

#[test]
fn host_error_prefixes_plugin_name() {
    let error = RegistrationError::Route {
        plugin: "tooltip".into(),
        source: RouteError::Conflict {
            path: "/dir".into(),
        },
    };
    assert_eq!(
        error.to_string(),
        "plugin 'tooltip': route '/dir' is already registered"
    );
}
