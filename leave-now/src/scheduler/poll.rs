//! The periodic poll loop.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local, Utc};
use tokio::sync::{Semaphore, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, error, info, warn};

use crate::domain::{LiveArrival, PositionFix, RegisteredRoute};
use crate::engine::{AlertRule, ArrivalMatch, Decision, FireLedger, delta, match_arrival};
use crate::feed::{FeedError, TransitFeed};
use crate::notify::{Notification, NotificationSink};
use crate::position::PositionSource;
use crate::registry::RouteStore;
use crate::suppression::{Category, SuppressionGate, SuppressionStore};
use crate::walking::WalkingEstimator;

use super::config::SchedulerConfig;
use super::outcome::{CycleReport, CycleSkip, OutcomeReason, PollOutcome};

type ReportSender = watch::Sender<Option<Arc<CycleReport>>>;

/// Drives the per-route alert pipeline on a fixed interval.
///
/// Every cycle takes one snapshot of the active routes and one position fix,
/// then runs each route through fetch, match, estimate, decide and notify
/// in its own task. A failure in one route only affects that route's
/// outcome.
pub struct PollingScheduler<F, R, P, N, S> {
    inner: Arc<Inner<F, R, P, N, S>>,
}

struct Inner<F, R, P, N, S> {
    feed: F,
    routes: R,
    position: P,
    sink: N,
    gate: Arc<SuppressionGate<S>>,
    walking: WalkingEstimator,
    rule: AlertRule,
    ledger: Mutex<FireLedger>,
    limiter: Semaphore,
    config: SchedulerConfig,
    reports: ReportSender,
}

impl<F, R, P, N, S> PollingScheduler<F, R, P, N, S>
where
    F: TransitFeed + 'static,
    R: RouteStore + 'static,
    P: PositionSource + 'static,
    N: NotificationSink + 'static,
    S: SuppressionStore + 'static,
{
    pub fn new(
        feed: F,
        routes: R,
        position: P,
        sink: N,
        gate: Arc<SuppressionGate<S>>,
        config: SchedulerConfig,
    ) -> Self {
        let (reports, _) = watch::channel(None);
        let inner = Inner {
            feed,
            routes,
            position,
            sink,
            gate,
            walking: WalkingEstimator::new(config.walking.clone()),
            rule: AlertRule::new(config.fire_buffer_mins),
            ledger: Mutex::new(FireLedger::new(config.refire_interval())),
            limiter: Semaphore::new(config.max_concurrent_routes.max(1)),
            config,
            reports,
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// Receiver that sees every finished or skipped cycle.
    pub fn subscribe_reports(&self) -> watch::Receiver<Option<Arc<CycleReport>>> {
        self.inner.reports.subscribe()
    }

    /// The most recent cycle report.
    pub fn latest_report(&self) -> Option<Arc<CycleReport>> {
        self.inner.reports.borrow().clone()
    }

    /// Run one cycle over all active routes as of `now`.
    ///
    /// Each route runs in its own task, at most `max_concurrent_routes` at
    /// a time, with every feed fetch bounded by `fetch_timeout`. Outcomes
    /// come back in route-list order. Dropping the returned future aborts
    /// the cycle's outstanding tasks.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> CycleReport {
        let routes = match self.inner.routes.list_active().await {
            Ok(routes) => routes,
            Err(e) => {
                warn!(error = %e, "Failed to list routes, skipping cycle");
                let skip = CycleSkip::RouteListFailed {
                    message: e.to_string(),
                };
                return self.publish(CycleReport::skipped(now, skip));
            }
        };

        let position = self.inner.position.latest();
        let mut tasks = JoinSet::new();

        for (idx, route) in routes.iter().cloned().enumerate() {
            let inner = Arc::clone(&self.inner);
            tasks.spawn(async move {
                let _permit = inner.limiter.acquire().await.ok();
                (idx, inner.poll_route(&route, position, now).await)
            });
        }

        let mut slots: Vec<Option<PollOutcome>> = vec![None; routes.len()];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, outcome)) => {
                    if let Some(slot) = slots.get_mut(idx) {
                        *slot = Some(outcome);
                    }
                }
                Err(e) => error!(error = %e, "Route task failed"),
            }
        }

        self.inner
            .lock_ledger()
            .retain(|key| routes.iter().any(|r| r.id == *key));

        let report = CycleReport {
            started_at: now,
            outcomes: slots.into_iter().flatten().collect(),
            skipped: None,
        };

        debug!(
            routes = routes.len(),
            fired = report.fired_count(),
            has_position = position.is_some(),
            "Cycle complete"
        );

        self.publish(report)
    }

    /// Poll until `shutdown` flips or its sender goes away.
    ///
    /// The first cycle starts immediately. A cycle that overruns the interval
    /// delays the next one instead of stacking up.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let config = &self.inner.config;
        let mut ticker = interval(config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = config.poll_interval.as_secs(),
            fire_buffer_mins = config.fire_buffer_mins,
            active_until = ?config.active_until,
            "Scheduler started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }

            let now = Utc::now();
            if config.is_after_cutoff(now.with_timezone(&Local).time()) {
                info!("Past daily cut-off, skipping cycle");
                self.publish(CycleReport::skipped(now, CycleSkip::AfterCutoff));
                continue;
            }

            tokio::select! {
                _ = self.run_cycle(now) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!("Scheduler stopped");
    }

    /// Start the loop on the runtime.
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown, rx) = watch::channel(false);
        let task = tokio::spawn(async move { self.run(rx).await });
        SchedulerHandle { shutdown, task }
    }

    fn publish(&self, report: CycleReport) -> CycleReport {
        self.inner
            .reports
            .send_replace(Some(Arc::new(report.clone())));
        report
    }
}

impl<F, R, P, N, S> Inner<F, R, P, N, S>
where
    F: TransitFeed,
    R: RouteStore,
    P: PositionSource,
    N: NotificationSink,
    S: SuppressionStore,
{
    async fn poll_route(
        &self,
        route: &RegisteredRoute,
        position: Option<PositionFix>,
        now: DateTime<Utc>,
    ) -> PollOutcome {
        let Some(fix) = position else {
            return self.skip(route, OutcomeReason::NoPosition);
        };
        let Some(stop) = route.stop_location else {
            return self.skip(route, OutcomeReason::UnknownStopLocation);
        };

        let fetch = self.feed.fetch_arrivals(&route.stop_id, route.city_code);
        let arrivals = timeout(self.config.fetch_timeout, fetch)
            .await
            .unwrap_or_else(|_| Err(FeedError::Timeout(self.config.fetch_timeout)));

        let arrivals = match arrivals {
            Ok(arrivals) => arrivals,
            Err(e) => {
                warn!(
                    route = %route.id,
                    stop = %route.stop_id,
                    error = %e,
                    "Arrival fetch failed"
                );
                return self.skip(route, OutcomeReason::FetchFailed);
            }
        };

        let arrival = match match_arrival(route, &arrivals) {
            ArrivalMatch::Found(arrival) => arrival.clone(),
            ArrivalMatch::NoMatch => return self.skip(route, OutcomeReason::NoMatch),
            ArrivalMatch::NoFeedData => return self.skip(route, OutcomeReason::NoFeedData),
        };

        let walking = self.walking.estimate(&fix.coord, &stop);
        let decision = self.rule.decide(arrival.minutes_to_arrival, walking);

        let reason = match decision {
            Decision::TooEarly => OutcomeReason::MatchedButEarly,
            Decision::TooLate => OutcomeReason::MatchedButLate,
            Decision::Fire if self.gate.is_suppressed(Category::Bus, now) => {
                OutcomeReason::Suppressed
            }
            Decision::Fire => self.fire(route, &arrival, walking, now),
        };

        let outcome = PollOutcome::new(route.id, &route.route_number, reason)
            .with_estimate(arrival, walking, decision);
        self.finish(route, outcome)
    }

    /// Emit the alert unless this route already alerted recently.
    fn fire(
        &self,
        route: &RegisteredRoute,
        arrival: &LiveArrival,
        walking: u32,
        now: DateTime<Utc>,
    ) -> OutcomeReason {
        {
            let mut ledger = self.lock_ledger();
            if !ledger.is_armed(route.id, now) {
                return OutcomeReason::AlreadyNotified;
            }
            ledger.record_fire(route.id, now);
        }

        let notification = Notification::leave_now(route, arrival.minutes_to_arrival, walking);
        self.sink.emit(&notification);

        info!(
            route = %route.id,
            number = %route.route_number,
            arrival_mins = arrival.minutes_to_arrival,
            walking_mins = walking,
            key = notification.key,
            "Leave-now alert emitted"
        );

        OutcomeReason::MatchedAndFired
    }

    /// Outcome for a route that stopped before the firing rule.
    fn skip(&self, route: &RegisteredRoute, reason: OutcomeReason) -> PollOutcome {
        self.finish(route, PollOutcome::new(route.id, &route.route_number, reason))
    }

    fn finish(&self, route: &RegisteredRoute, outcome: PollOutcome) -> PollOutcome {
        if outcome.reason.rearms() {
            self.lock_ledger().rearm(route.id);
        }

        debug!(
            route = %route.id,
            number = %route.route_number,
            reason = %outcome.reason,
            arrival_mins = ?outcome.arrival.as_ref().map(|a| a.minutes_to_arrival),
            walking_mins = ?outcome.walking_mins,
            delta = ?outcome
                .arrival
                .as_ref()
                .zip(outcome.walking_mins)
                .map(|(a, w)| delta(a.minutes_to_arrival, w)),
            "Route polled"
        );

        outcome
    }
}

impl<F, R, P, N, S> Inner<F, R, P, N, S> {
    fn lock_ledger(&self) -> MutexGuard<'_, FireLedger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to a spawned scheduler.
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Signal shutdown and wait for the loop to exit.
    ///
    /// A cycle in progress is abandoned and its route tasks aborted.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Scheduler task ended abnormally");
        }
    }
}
