//! BDD scenarios for the rename workflow.

use rstest_bdd_macros::scenario;

use super::test_helpers::{RenameContext, rename_context};

#[scenario(
    path = "tests/features/rename.feature",
    name = "Rename a bound claim within its namespace"
)]
fn scenario_rename_in_namespace(rename_context: RenameContext) {
    let _ = rename_context;
}

#[scenario(
    path = "tests/features/rename.feature",
    name = "Move a claim into another namespace"
)]
fn scenario_rename_across_namespaces(rename_context: RenameContext) {
    let _ = rename_context;
}

#[scenario(
    path = "tests/features/rename.feature",
    name = "Refuse to rename onto an existing claim"
)]
fn scenario_existing_target(rename_context: RenameContext) {
    let _ = rename_context;
}

#[scenario(
    path = "tests/features/rename.feature",
    name = "Keep the source claim when the replacement never binds"
)]
fn scenario_bind_timeout(rename_context: RenameContext) {
    let _ = rename_context;
}

#[scenario(
    path = "tests/features/rename.feature",
    name = "Running the same rename twice reports the missing source"
)]
fn scenario_rerun_after_success(rename_context: RenameContext) {
    let _ = rename_context;
}

#[scenario(
    path = "tests/features/rename.feature",
    name = "Refuse to rename a mounted claim"
)]
fn scenario_mounted_claim(rename_context: RenameContext) {
    let _ = rename_context;
}

#[scenario(
    path = "tests/features/rename.feature",
    name = "A declined confirmation changes nothing"
)]
fn scenario_declined_confirmation(rename_context: RenameContext) {
    let _ = rename_context;
}

#[scenario(
    path = "tests/features/rename.feature",
    name = "Cancelling during the bind wait keeps the source claim"
)]
fn scenario_cancel_during_wait(rename_context: RenameContext) {
    let _ = rename_context;
}
