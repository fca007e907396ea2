//! Spawn coordinator — turns a placement request into a reachable endpoint.
//!
//! A spawn is a strictly sequential pipeline:
//!
//! 1. refresh the topology (falling back to the previous snapshot)
//! 2. create and start the container
//! 3. resolve the container's node and address, retrying while the
//!    engine has not yet listed the container
//!
//! Every step is raced against the caller's cancel signal and the total
//! spawn deadline, except placement: once a create request is in flight it
//! runs to completion (bounded by the engine client's per-request timeout)
//! so the container id is always known. From then on every failure carries
//! that id.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use swarmspawn_core::config::{DEFAULT_STOP_GRACE, DEFAULT_TOTAL_TIMEOUT};
use swarmspawn_core::{PlacementRequest, ResolvedEndpoint, SessionStatus, SpawnerConfig, UnitError};
use swarmspawn_engine::EngineApi;
use swarmspawn_placement::{AddressResolver, PlacementClient, PlacementDefaults, ResolveError};
use swarmspawn_topology::{ClusterTopologyCache, TopologySnapshot};

use crate::backoff::RetryPolicy;
use crate::error::{SpawnError, SpawnFailure};
use crate::phase::{SpawnAttempt, SpawnPhase};
use crate::spawner::{Spawner, SpawnerFuture};

/// Timing knobs for spawns and stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnSettings {
    pub retry: RetryPolicy,
    /// Bound on the whole spawn, not on each step.
    pub total_timeout: Duration,
    /// Grace period given to a session before it is killed on stop.
    pub stop_grace: Duration,
}

impl Default for SpawnSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            total_timeout: DEFAULT_TOTAL_TIMEOUT,
            stop_grace: DEFAULT_STOP_GRACE,
        }
    }
}

impl SpawnSettings {
    pub fn from_config(config: &SpawnerConfig) -> Result<Self, UnitError> {
        Ok(Self {
            retry: RetryPolicy::from_config(config)?,
            total_timeout: config.total_timeout()?,
            stop_grace: config.stop_grace()?,
        })
    }
}

/// Composes topology, placement, and resolution into session lifecycle
/// operations. Safe to share; concurrent spawns only share the topology
/// cache.
pub struct SpawnCoordinator {
    engine: Arc<dyn EngineApi>,
    topology: Arc<ClusterTopologyCache>,
    placement: PlacementClient,
    resolver: AddressResolver,
    settings: SpawnSettings,
}

impl SpawnCoordinator {
    pub fn new(
        engine: Arc<dyn EngineApi>,
        topology: Arc<ClusterTopologyCache>,
        defaults: PlacementDefaults,
        settings: SpawnSettings,
    ) -> Self {
        Self {
            placement: PlacementClient::new(engine.clone(), defaults),
            resolver: AddressResolver::new(engine.clone()),
            engine,
            topology,
            settings,
        }
    }

    pub fn topology(&self) -> &ClusterTopologyCache {
        &self.topology
    }

    pub fn settings(&self) -> &SpawnSettings {
        &self.settings
    }

    /// Start a session with no external cancellation.
    pub async fn start(&self, request: &PlacementRequest) -> Result<ResolvedEndpoint, SpawnFailure> {
        let (_cancel_tx, cancel) = watch::channel(false);
        self.start_with_cancel(request, cancel).await
    }

    /// Start a session; flipping `cancel` to `true` abandons the spawn at
    /// the next suspension point.
    pub async fn start_with_cancel(
        &self,
        request: &PlacementRequest,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<ResolvedEndpoint, SpawnFailure> {
        let budget = SpawnBudget::new(self.settings.total_timeout);
        let mut attempt = SpawnAttempt::new(&request.session_name);
        info!(session = %request.session_name, image = %request.image, "spawn starting");

        let snapshot = match budget
            .run(attempt.phase(), &mut cancel, self.refresh_topology())
            .await
        {
            Ok(snapshot) => snapshot,
            Err(e) => return Err(fail(&mut attempt, e)),
        };
        advance(&mut attempt, SpawnPhase::TopologyRefreshed)?;

        if let Err(e) = budget.check(attempt.phase(), &cancel) {
            return Err(fail(&mut attempt, e));
        }
        let placed = match self.placement.create(request).await {
            Ok(placed) => placed,
            Err(e) => {
                if let Some(id) = e.container_id() {
                    attempt.record_orphan(id.to_string());
                }
                return Err(fail(&mut attempt, e.into()));
            }
        };
        if let Err(e) = attempt.placed(placed.container_id.clone()) {
            return Err(fail(&mut attempt, e));
        }
        if let Err(e) = budget.check(attempt.phase(), &cancel) {
            return Err(fail(&mut attempt, e));
        }

        let port = request
            .container_port
            .unwrap_or(self.placement.defaults().container_port);
        let endpoint = match budget
            .run(
                attempt.phase(),
                &mut cancel,
                self.resolve_with_retry(&placed.container_id, snapshot, port),
            )
            .await
        {
            Ok(endpoint) => endpoint,
            Err(e) => return Err(fail(&mut attempt, e)),
        };
        advance(&mut attempt, SpawnPhase::AddressResolved)?;

        if let Some(hint) = placed
            .assigned_node_id
            .as_deref()
            .filter(|hint| *hint != endpoint.node_id)
        {
            warn!(
                container_id = %placed.container_id,
                create_hint = hint,
                resolved = %endpoint.node_id,
                "engine create response disagrees with listing; using listing"
            );
        }

        advance(&mut attempt, SpawnPhase::Ready)?;
        info!(
            session = %request.session_name,
            container_id = %placed.container_id,
            node_id = %endpoint.node_id,
            address = %endpoint.address(),
            elapsed_ms = attempt.started_at().elapsed().as_millis() as u64,
            "session ready"
        );
        Ok(endpoint)
    }

    /// Stop then remove a session container. A container the engine does
    /// not know is treated as already gone.
    pub async fn stop(&self, container_id: &str) -> Result<(), SpawnError> {
        match self
            .engine
            .stop_container(container_id, self.settings.stop_grace)
            .await
        {
            Ok(()) => debug!(container_id, "container stopped"),
            Err(e) if e.is_not_found() => {
                info!(container_id, "container already gone");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        match self.engine.remove_container(container_id).await {
            Ok(()) => info!(container_id, "container removed"),
            Err(e) if e.is_not_found() => debug!(container_id, "container removed concurrently"),
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }

    pub async fn poll(&self, container_id: &str) -> Result<SessionStatus, SpawnError> {
        Ok(self.resolver.status(container_id).await?)
    }

    /// Refresh the topology, falling back to the previous non-empty
    /// snapshot when the engine cannot be queried.
    async fn refresh_topology(&self) -> Result<Arc<TopologySnapshot>, SpawnError> {
        match self.topology.refresh().await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                let previous = self.topology.snapshot();
                if previous.version() > 0 && !previous.is_empty() {
                    warn!(
                        error = %e,
                        version = previous.version(),
                        "topology refresh failed; continuing with previous snapshot"
                    );
                    Ok(previous)
                } else {
                    Err(SpawnError::TopologyUnavailable(e.to_string()))
                }
            }
        }
    }

    async fn resolve_with_retry(
        &self,
        container_id: &str,
        mut snapshot: Arc<TopologySnapshot>,
        port: u16,
    ) -> Result<ResolvedEndpoint, SpawnError> {
        let policy = self.settings.retry;
        let mut backoff = policy.backoff();
        let mut attempts = 0u32;
        let mut refreshed_for_unknown = false;

        loop {
            attempts += 1;
            match self.resolver.resolve(container_id, &snapshot, port).await {
                Ok(endpoint) => return Ok(endpoint),
                Err(ResolveError::PlacementNotYetVisible { container_id }) => {
                    if attempts >= policy.max_attempts {
                        return Err(SpawnError::NotYetVisible {
                            container_id,
                            attempts,
                        });
                    }
                    let delay = backoff.next_delay();
                    debug!(%container_id, attempts, delay_ms = delay.as_millis() as u64, "placement not yet visible");
                    tokio::time::sleep(delay).await;
                }
                Err(ResolveError::UnknownNode { node_id }) if !refreshed_for_unknown => {
                    refreshed_for_unknown = true;
                    warn!(%node_id, version = snapshot.version(), "container on unknown node; refreshing topology");
                    snapshot = self
                        .topology
                        .refresh()
                        .await
                        .map_err(|e| SpawnError::TopologyUnavailable(e.to_string()))?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Spawner for SpawnCoordinator {
    fn start<'a>(
        &'a self,
        request: &'a PlacementRequest,
    ) -> SpawnerFuture<'a, ResolvedEndpoint, SpawnFailure> {
        Box::pin(SpawnCoordinator::start(self, request))
    }

    fn stop<'a>(&'a self, container_id: &'a str) -> SpawnerFuture<'a, (), SpawnError> {
        Box::pin(SpawnCoordinator::stop(self, container_id))
    }

    fn poll<'a>(&'a self, container_id: &'a str) -> SpawnerFuture<'a, SessionStatus, SpawnError> {
        Box::pin(SpawnCoordinator::poll(self, container_id))
    }
}

/// Stand-in deadline for budgets too large to represent as an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Deadline shared by all steps of one spawn.
struct SpawnBudget {
    deadline: Instant,
    total: Duration,
}

impl SpawnBudget {
    fn new(total: Duration) -> Self {
        let now = Instant::now();
        Self {
            deadline: now.checked_add(total).unwrap_or(now + FAR_FUTURE),
            total,
        }
    }

    /// Fail now if cancelled or out of time.
    fn check(&self, phase: SpawnPhase, cancel: &watch::Receiver<bool>) -> Result<(), SpawnError> {
        if *cancel.borrow() {
            return Err(SpawnError::Cancelled { phase });
        }
        if Instant::now() >= self.deadline {
            return Err(SpawnError::TimedOut {
                phase,
                after: self.total,
            });
        }
        Ok(())
    }

    /// Run `work` until it finishes, the deadline passes, or `cancel` fires.
    async fn run<T, F>(
        &self,
        phase: SpawnPhase,
        cancel: &mut watch::Receiver<bool>,
        work: F,
    ) -> Result<T, SpawnError>
    where
        F: Future<Output = Result<T, SpawnError>>,
    {
        tokio::select! {
            biased;
            _ = cancelled(cancel) => Err(SpawnError::Cancelled { phase }),
            outcome = tokio::time::timeout_at(self.deadline, work) => match outcome {
                Ok(result) => result,
                Err(_) => Err(SpawnError::TimedOut { phase, after: self.total }),
            },
        }
    }
}

/// Resolves once `cancel` is `true`. A dropped sender never cancels.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn advance(attempt: &mut SpawnAttempt, next: SpawnPhase) -> Result<(), SpawnFailure> {
    attempt.advance(next).map_err(|e| fail(attempt, e))
}

fn fail(attempt: &mut SpawnAttempt, error: SpawnError) -> SpawnFailure {
    let failure = attempt.fail(error);
    error!(
        session = %failure.session,
        phase = %failure.phase,
        container_id = ?failure.container_id,
        error = %failure.error,
        "spawn failed"
    );
    failure
}
