//! BDD step definitions for the rename workflow.

use std::time::Duration;

use rename_pvc::test_support::{bound_claim, pod_mounting, volume_bound_to};
use rstest_bdd_macros::{given, then, when};

use super::test_helpers::{
    FAST_POLL, RenameContext, RenameRun, SLOW_POLL, build_request, error_label, execute_rename,
    lock,
};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn with_run<T>(
    context: &RenameContext,
    check: impl FnOnce(&RenameRun) -> Result<T, StepError>,
) -> Result<T, StepError> {
    let guard = lock(&context.last_run);
    let run = guard
        .as_ref()
        .ok_or_else(|| StepError::Assertion(String::from("no rename was run")))?;
    check(run)
}

#[given("a cluster with claim \"{claim}\" in namespace \"{namespace}\" bound to volume \"{volume}\"")]
fn cluster_with_bound_claim(
    rename_context: RenameContext,
    claim: String,
    namespace: String,
    volume: String,
) -> RenameContext {
    rename_context
        .cluster
        .insert_claim(bound_claim(&namespace, &claim, &volume));
    rename_context
        .cluster
        .insert_volume(volume_bound_to(&volume, &namespace, &claim));
    rename_context
}

#[given("claim \"{claim}\" already exists in namespace \"{namespace}\"")]
fn existing_claim(rename_context: RenameContext, claim: String, namespace: String) -> RenameContext {
    rename_context
        .cluster
        .insert_claim(bound_claim(&namespace, &claim, "pv-other"));
    rename_context
}

#[given("pod \"{pod}\" in namespace \"{namespace}\" mounts claim \"{claim}\"")]
fn pod_mounts_claim(
    rename_context: RenameContext,
    pod: String,
    namespace: String,
    claim: String,
) -> RenameContext {
    rename_context
        .cluster
        .insert_pod(pod_mounting(&namespace, &pod, &claim));
    rename_context
}

#[given("the volume binding controller is stopped")]
fn binding_controller_stopped(rename_context: RenameContext) -> RenameContext {
    rename_context.cluster.disable_binding_controller();
    rename_context
}

#[given("the operator answers \"{answer}\"")]
fn operator_answers(rename_context: RenameContext, answer: String) -> RenameContext {
    *lock(&rename_context.answer) = Some(answer);
    rename_context
}

#[when("I rename claim \"{source}\" in namespace \"{namespace}\" to \"{target}\"")]
fn rename_within_namespace(
    rename_context: RenameContext,
    source: String,
    namespace: String,
    target: String,
) -> RenameContext {
    let request = build_request(
        &rename_context,
        (&source, &namespace),
        (&target, &namespace),
    );
    execute_rename(&rename_context, request, FAST_POLL, None);
    rename_context
}

#[when(
    "I move claim \"{source}\" from namespace \"{source_namespace}\" to claim \"{target}\" in namespace \"{target_namespace}\""
)]
fn rename_across_namespaces(
    rename_context: RenameContext,
    source: String,
    source_namespace: String,
    target: String,
    target_namespace: String,
) -> RenameContext {
    let request = build_request(
        &rename_context,
        (&source, &source_namespace),
        (&target, &target_namespace),
    );
    execute_rename(&rename_context, request, FAST_POLL, None);
    rename_context
}

#[when("I cancel while renaming claim \"{source}\" in namespace \"{namespace}\" to \"{target}\"")]
fn rename_then_cancel(
    rename_context: RenameContext,
    source: String,
    namespace: String,
    target: String,
) -> RenameContext {
    let request = build_request(
        &rename_context,
        (&source, &namespace),
        (&target, &namespace),
    );
    execute_rename(
        &rename_context,
        request,
        SLOW_POLL,
        Some(Duration::from_millis(20)),
    );
    rename_context
}

#[then("the rename succeeds")]
fn rename_succeeds(rename_context: &RenameContext) -> Result<(), StepError> {
    with_run(rename_context, |run| match run.result {
        Ok(_) => Ok(()),
        Err(ref failure) => Err(StepError::Assertion(format!(
            "expected success, got failure: {failure}"
        ))),
    })
}

#[then("the rename fails with \"{label}\"")]
fn rename_fails_with(rename_context: &RenameContext, label: String) -> Result<(), StepError> {
    with_run(rename_context, |run| {
        let Err(ref failure) = run.result else {
            return Err(StepError::Assertion(String::from(
                "expected failure, got success",
            )));
        };
        let actual = error_label(&failure.error);
        if actual == label {
            Ok(())
        } else {
            Err(StepError::Assertion(format!(
                "expected '{label}', got '{actual}': {failure}"
            )))
        }
    })
}

#[then("claim \"{claim}\" exists in namespace \"{namespace}\"")]
fn claim_exists(
    rename_context: &RenameContext,
    claim: String,
    namespace: String,
) -> Result<(), StepError> {
    if rename_context.cluster.claim(&namespace, &claim).is_some() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "claim {namespace}/{claim} should exist"
        )))
    }
}

#[then("claim \"{claim}\" does not exist in namespace \"{namespace}\"")]
fn claim_absent(
    rename_context: &RenameContext,
    claim: String,
    namespace: String,
) -> Result<(), StepError> {
    if rename_context.cluster.claim(&namespace, &claim).is_none() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "claim {namespace}/{claim} should not exist"
        )))
    }
}

#[then("the replacement keeps the source claim's spec")]
fn replacement_keeps_spec(rename_context: &RenameContext) -> Result<(), StepError> {
    with_run(rename_context, |run| {
        let replacement = rename_context
            .cluster
            .claim(&run.request.target_namespace, &run.request.target_name)
            .ok_or_else(|| StepError::Assertion(String::from("replacement is missing")))?;
        if replacement.spec == run.source_spec {
            Ok(())
        } else {
            Err(StepError::Assertion(format!(
                "spec differs: expected {:?}, got {:?}",
                run.source_spec, replacement.spec
            )))
        }
    })
}

#[then("volume \"{volume}\" references claim \"{claim}\" in namespace \"{namespace}\"")]
fn volume_references(
    rename_context: &RenameContext,
    volume: String,
    claim: String,
    namespace: String,
) -> Result<(), StepError> {
    let reference = rename_context
        .cluster
        .volume_claim_ref(&volume)
        .ok_or_else(|| StepError::Assertion(format!("volume {volume} has no claimRef")))?;
    if reference.name.as_deref() == Some(claim.as_str())
        && reference.namespace.as_deref() == Some(namespace.as_str())
    {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected claimRef {namespace}/{claim}, got {reference:?}"
        )))
    }
}

#[then("the output lists every progress step in order")]
fn progress_in_order(rename_context: &RenameContext) -> Result<(), StepError> {
    with_run(rename_context, |run| {
        let request = &run.request;
        let volume = run
            .result
            .as_ref()
            .map(|outcome| outcome.volume.clone())
            .map_err(|failure| StepError::Assertion(failure.to_string()))?;
        let expected = vec![
            format!("New PVC with name '{}' created", request.target_name),
            format!(
                "ClaimRef of PV '{volume}' is updated to new PVC '{}'",
                request.target_name
            ),
            format!("New PVC '{}' is bound to PV '{volume}'", request.target_name),
            format!("Old PVC '{}' is deleted", request.source_name),
        ];
        let actual: Vec<String> = run.output.lines().map(str::to_owned).collect();
        if actual == expected {
            Ok(())
        } else {
            Err(StepError::Assertion(format!(
                "expected {expected:?}, got {actual:?}"
            )))
        }
    })
}

#[then("the output shows {count:u32} progress lines")]
fn progress_line_count(rename_context: &RenameContext, count: u32) -> Result<(), StepError> {
    with_run(rename_context, |run| {
        let lines = run
            .output
            .lines()
            .filter(|line| !line.starts_with("Rename PVC from"))
            .count();
        if lines == count as usize {
            Ok(())
        } else {
            Err(StepError::Assertion(format!(
                "expected {count} progress lines, got {lines}: {:?}",
                run.output
            )))
        }
    })
}

#[then("no cluster call was made")]
fn no_cluster_call(rename_context: &RenameContext) -> Result<(), StepError> {
    let operations = rename_context.cluster.operations();
    if operations.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no cluster calls, got {operations:?}"
        )))
    }
}
