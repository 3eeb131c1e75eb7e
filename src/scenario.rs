use std::{future::Future, marker::PhantomData, sync::Arc};

use typed_builder::TypedBuilder;

use crate::{
    aggregate::Aggregate,
    plan::{RequestDescriptor, WorkSource},
};

/// What an [`crate::Executor`] runs: a planned work source and the action applied to
/// each descriptor in it.
///
/// The action is cloned into every worker, so anything expensive (an HTTP client,
/// a connection pool) should be created once outside of it and captured by clone.
///
/// ```rust
/// use std::{sync::Arc, time::Duration};
/// use volley::{
///     Scenario, aggregate::Outcomes, metric::RequestOutcome,
///     plan::{RequestDescriptor, WorkSource},
/// };
///
/// let scenario = Scenario::<Outcomes, _, _>::builder()
///     .name("noop")
///     .work(WorkSource::new(Vec::new()))
///     .action(|_: Arc<RequestDescriptor>| async {
///         RequestOutcome::new(Duration::ZERO, 200, 0)
///     })
///     .build();
/// assert!(scenario.work.is_empty());
/// ```
#[derive(Clone, TypedBuilder)]
pub struct Scenario<A, F, Fut>
where
    A: Aggregate,
    F: Fn(Arc<RequestDescriptor>) -> Fut + Send + Sync + Clone + 'static,
    Fut: Future<Output = A::Metric> + Send + 'static,
{
    #[builder(setter(into))]
    pub name: String,
    pub work: WorkSource,
    pub action: F,
    #[builder(default, setter(skip))]
    aggregate: PhantomData<fn() -> (A, Fut)>,
}
