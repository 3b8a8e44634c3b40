//! Shared fixtures and helpers for rename BDD scenarios.

use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use k8s_openapi::api::core::v1::PersistentVolumeClaimSpec;
use rename_pvc::test_support::InMemoryCluster;
use rename_pvc::{
    PollSettings, RenameError, RenameFailure, RenameOrchestrator, RenameOutcome, RenameRequest,
};
use rstest::fixture;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

/// Bind wait used by scenarios that expect the replacement to bind.
pub const FAST_POLL: PollSettings = PollSettings {
    interval: Duration::from_millis(1),
    attempts: 3,
};

/// Bind wait long enough that only cancellation can end it.
pub const SLOW_POLL: PollSettings = PollSettings {
    interval: Duration::from_secs(1),
    attempts: 60,
};

#[derive(Debug)]
pub struct RenameRun {
    pub request: RenameRequest,
    pub source_spec: Option<PersistentVolumeClaimSpec>,
    pub result: Result<RenameOutcome, RenameFailure>,
    pub output: String,
}

#[derive(Clone, Debug)]
pub struct RenameContext {
    pub cluster: InMemoryCluster,
    pub answer: Arc<Mutex<Option<String>>>,
    pub last_run: Arc<Mutex<Option<RenameRun>>>,
}

#[fixture]
pub fn rename_context() -> RenameContext {
    RenameContext {
        cluster: InMemoryCluster::new(),
        answer: Arc::new(Mutex::new(None)),
        last_run: Arc::new(Mutex::new(None)),
    }
}

pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|err| panic!("scenario state lock poisoned: {err}"))
}

/// Builds the request; confirmation is skipped unless an answer was scripted.
pub fn build_request(
    context: &RenameContext,
    source: (&str, &str),
    target: (&str, &str),
) -> RenameRequest {
    let scripted = lock(&context.answer).is_some();
    RenameRequest::builder()
        .source(source.0, source.1)
        .target_name(target.0)
        .target_namespace(Some(target.1.to_owned()))
        .skip_confirmation(!scripted)
        .build()
        .unwrap_or_else(|err| panic!("scenario request should be valid: {err}"))
}

/// Runs the rename and records the result in the context.
pub fn execute_rename(
    context: &RenameContext,
    request: RenameRequest,
    settings: PollSettings,
    cancel_after: Option<Duration>,
) {
    let runtime = Runtime::new().unwrap_or_else(|err| panic!("runtime should start: {err}"));
    let answer = lock(&context.answer).clone().unwrap_or_default();
    let source_spec = context
        .cluster
        .claim(&request.source_namespace, &request.source_name)
        .and_then(|claim| claim.spec);

    let orchestrator =
        RenameOrchestrator::new(context.cluster.clone()).with_poll_settings(settings);
    let cancel = CancellationToken::new();
    let mut input = Cursor::new(format!("{answer}\n").into_bytes());
    let mut output = Vec::new();

    let result = runtime.block_on(async {
        if let Some(delay) = cancel_after {
            let trigger = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                trigger.cancel();
            });
        }
        orchestrator
            .execute(&request, &mut input, &mut output, &cancel)
            .await
    });

    *lock(&context.last_run) = Some(RenameRun {
        request,
        source_spec,
        result,
        output: String::from_utf8_lossy(&output).into_owned(),
    });
}

/// Short label for a rename error, as used in feature files.
pub const fn error_label(error: &RenameError) -> &'static str {
    match error {
        RenameError::ConfirmationDeclined => "confirmation declined",
        RenameError::ConfirmationUnrecognized { .. } => "confirmation unrecognized",
        RenameError::Prompt(_) => "prompt",
        RenameError::ClaimInUse { .. } => "claim in use",
        RenameError::ClaimNotFound { .. } => "claim not found",
        RenameError::ClaimNotBound { .. } => "claim not bound",
        RenameError::ClaimAlreadyExists { .. } => "claim already exists",
        RenameError::VolumeNotFound { .. } => "volume not found",
        RenameError::BindTimeout { .. } => "bind timeout",
        RenameError::Cancelled => "cancelled",
        RenameError::Cluster(_) => "cluster",
    }
}
