use flex_types::{DiscoveryManifest, RejectReason, Task, TaskOutcome, TaskType};
use tracing::{debug, warn};

use super::DISPATCH_TARGET;
use crate::modules::Modules;
use crate::registry::{Auth, Data, Functions};

/// Version stamped on every task the service handles.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Registries plus the checks applied before dispatch.
///
/// Populate the registries, then share the service behind an `Arc`; from
/// then on it is only read.
#[derive(Debug, Default)]
pub struct FlexService {
    /// Service objects and their data operations.
    pub data: Data,
    /// Business-logic handlers.
    pub functions: Functions,
    /// Authentication handlers.
    pub auth: Auth,
    shared_secret: Option<String>,
}

impl FlexService {
    /// Creates a service with empty registries and no shared secret.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `secret` in the `authKey` of data, functions and auth tasks.
    ///
    /// An empty secret disables the check.
    #[must_use]
    pub fn with_shared_secret(mut self, secret: Option<String>) -> Self {
        self.shared_secret = secret.filter(|value| !value.is_empty());
        self
    }

    /// Lists what is registered, for discovery probes and route building.
    #[must_use]
    pub fn discovery_manifest(&self) -> DiscoveryManifest {
        DiscoveryManifest::new(
            self.data.service_object_names(),
            self.functions.handler_names(),
            self.auth.handler_names(),
        )
    }

    /// Processes one task.
    ///
    /// Tasks with a wrong `authKey` or an unknown type are rejected without
    /// reaching a handler.
    #[must_use]
    pub fn on_task_received(&self, mut task: Task) -> TaskOutcome {
        task.sdk_version = SDK_VERSION.to_owned();

        if let Some(secret) = self.shared_secret.as_deref()
            && !task.task_type.skips_secret_check()
            && task.auth_key != secret
        {
            warn!(
                target: DISPATCH_TARGET,
                task_type = %task.task_type,
                request_id = %task.request_id,
                "rejecting task with mismatched shared secret"
            );
            return TaskOutcome::rejected(task, RejectReason::SharedSecretMismatch);
        }

        if !task.task_type.is_dispatchable() {
            warn!(
                target: DISPATCH_TARGET,
                task_type = %task.task_type,
                "rejecting task of unknown type"
            );
            let task_type = task.task_type.to_string();
            return TaskOutcome::rejected(task, RejectReason::UnknownTaskType { task_type });
        }

        match task.task_type {
            TaskType::ServiceDiscovery => {
                debug!(target: DISPATCH_TARGET, "answering discovery probe");
                task.discovery_objects = Some(self.discovery_manifest());
                TaskOutcome::Completed(task)
            }
            TaskType::Data => {
                let modules = Modules::for_task(&task);
                self.data.process(task, &modules)
            }
            TaskType::Functions => {
                let modules = Modules::for_task(&task);
                self.functions.process(task, &modules)
            }
            TaskType::Auth => {
                let modules = Modules::for_task(&task);
                self.auth.process(task, &modules)
            }
            TaskType::Logger | TaskType::ModuleGenerator | TaskType::Other(_) => {
                let task_type = task.task_type.to_string();
                TaskOutcome::rejected(task, RejectReason::UnknownTaskType { task_type })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use flex_types::Request;
    use rstest::{fixture, rstest};

    use super::*;
    use crate::completion::CompletionHandler;

    struct Counted {
        service: FlexService,
        calls: Arc<AtomicUsize>,
    }

    #[fixture]
    fn counted() -> Counted {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut service = FlexService::new().with_shared_secret(Some("s3cret".to_owned()));
        let seen = Arc::clone(&calls);
        service.functions.register(
            "count",
            move |_: &Request, complete: CompletionHandler, _: &Modules| {
                seen.fetch_add(1, Ordering::SeqCst);
                complete.ok().done()
            },
        );
        service.data.service_object("widgets");
        Counted { service, calls }
    }

    fn task(task_type: &str, auth_key: &str) -> Task {
        Task {
            task_type: TaskType::from(task_type),
            task_name: "count".to_owned(),
            auth_key: auth_key.to_owned(),
            ..Task::default()
        }
    }

    #[rstest]
    fn matching_secret_reaches_the_handler(counted: Counted) {
        let outcome = counted.service.on_task_received(task("functions", "s3cret"));
        assert!(!outcome.is_rejected());
        assert_eq!(counted.calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcome.task().sdk_version, SDK_VERSION);
    }

    #[rstest]
    #[case("functions")]
    #[case("data")]
    #[case("auth")]
    fn mismatched_secret_is_rejected_before_dispatch(counted: Counted, #[case] task_type: &str) {
        let outcome = counted.service.on_task_received(task(task_type, "wrong"));
        assert!(matches!(
            outcome,
            TaskOutcome::Rejected {
                reason: RejectReason::SharedSecretMismatch,
                ..
            }
        ));
        assert_eq!(counted.calls.load(Ordering::SeqCst), 0);
    }

    #[rstest]
    fn discovery_skips_the_secret_check(counted: Counted) {
        let outcome = counted.service.on_task_received(task("serviceDiscovery", ""));
        let manifest = outcome
            .into_completed()
            .and_then(|task| task.discovery_objects)
            .expect("discovery attaches a manifest");
        assert_eq!(manifest.data_link.service_objects, vec!["widgets".to_owned()]);
        assert_eq!(manifest.business_logic.handlers, vec!["count".to_owned()]);
        assert!(manifest.auth.handlers.is_empty());
    }

    #[rstest]
    #[case("logger")]
    #[case("moduleGenerator")]
    #[case("telemetry")]
    fn non_dispatchable_types_are_rejected(counted: Counted, #[case] task_type: &str) {
        let outcome = counted.service.on_task_received(task(task_type, "s3cret"));
        assert!(matches!(
            outcome,
            TaskOutcome::Rejected {
                reason: RejectReason::UnknownTaskType { .. },
                ..
            }
        ));
    }

    #[rstest]
    fn unknown_type_with_wrong_secret_fails_the_secret_check_first(counted: Counted) {
        let outcome = counted.service.on_task_received(task("telemetry", "wrong"));
        assert!(matches!(
            outcome,
            TaskOutcome::Rejected {
                reason: RejectReason::SharedSecretMismatch,
                ..
            }
        ));
    }

    #[rstest]
    fn without_a_secret_any_key_is_accepted() {
        let service = FlexService::new().with_shared_secret(Some(String::new()));
        let outcome = service.on_task_received(task("functions", "anything"));
        assert!(!outcome.is_rejected());
    }
}
