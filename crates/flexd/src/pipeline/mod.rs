//! Normalisation of inbound transport requests into tasks.
//!
//! The HTTP receiver picks a [`Pipeline`] per route. Each pipeline is an
//! ordered list of [`PipelineStep`]s run against a shared build context; the
//! first failing step aborts the request with a [`PipelineError`].

mod context;
mod errors;
mod query;
mod steps;

use flex_types::Task;
use tracing::debug;

pub use self::context::InboundRequest;
pub use self::errors::PipelineError;
pub use self::steps::PipelineStep;

use self::context::BuildContext;

/// Tracing target for pipeline operations.
pub(crate) const PIPELINE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::pipeline");

/// Ordered list of normalisation steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    steps: Vec<PipelineStep>,
}

impl Pipeline {
    /// Creates a pipeline running `steps` in order.
    #[must_use]
    pub fn new(steps: impl Into<Vec<PipelineStep>>) -> Self {
        Self {
            steps: steps.into(),
        }
    }

    /// Route chain for `/_flexFunctions/{name}`.
    #[must_use]
    pub fn functions() -> Self {
        Self::handler_chain(PipelineStep::AddFunctionsTaskAttributes)
    }

    /// Route chain for `/_auth/{name}`.
    #[must_use]
    pub fn auth() -> Self {
        Self::handler_chain(PipelineStep::AddAuthTaskAttributes)
    }

    /// Route chain for `/_command/discover`.
    #[must_use]
    pub fn discover() -> Self {
        Self::new([PipelineStep::BuildDiscoverTask])
    }

    /// Route chain for a data request, chosen from the method and path.
    ///
    /// A GET on `/{object}/_count` counts; any other GET with an identifier
    /// reads by id.
    #[must_use]
    pub fn data(method: &str, path: &str) -> Self {
        use PipelineStep::{
            AddDataTaskAttributes, AppendBody, AppendCount, AppendId, AppendQuery,
            GenerateBaseTask,
        };

        let segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();
        let with_id = segments.len() > 2;
        let mut steps = vec![GenerateBaseTask, AddDataTaskAttributes];
        match (method.to_ascii_uppercase().as_str(), with_id) {
            ("POST", _) => steps.push(AppendBody),
            ("PUT", _) => steps.extend([AppendId, AppendBody]),
            ("DELETE", true) => steps.extend([AppendId, AppendQuery]),
            ("GET", true) if segments.get(2) == Some(&flex_types::wire::COUNT_ENDPOINT) => {
                steps.extend([AppendQuery, AppendCount]);
            }
            ("GET", true) => steps.extend([AppendQuery, AppendId]),
            _ => steps.push(AppendQuery),
        }
        Self::new(steps)
    }

    fn handler_chain(attributes: PipelineStep) -> Self {
        Self::new([
            PipelineStep::MapPostToElements,
            PipelineStep::GenerateBaseTask,
            attributes,
            PipelineStep::AppendQuery,
            PipelineStep::AppendId,
            PipelineStep::AppendBody,
        ])
    }

    /// Returns the steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[PipelineStep] {
        &self.steps
    }

    /// Builds a task from `inbound`.
    ///
    /// # Errors
    ///
    /// Returns the first step failure; later steps are not run.
    pub fn run(&self, inbound: InboundRequest) -> Result<Task, PipelineError> {
        let mut context = BuildContext::new(inbound);
        for step in &self.steps {
            step.apply(&mut context).inspect_err(|error| {
                debug!(
                    target: PIPELINE_TARGET,
                    step = step.name(),
                    kind = error.kind(),
                    %error,
                    "normalisation step failed"
                );
            })?;
        }
        Ok(context.task)
    }
}
