use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use super::hub::BroadcastHub;
use super::registry::ConnectionRegistry;
use crate::models::Envelope;

const MINUTE: Duration = Duration::from_secs(60);

/// Answer to `/close` without arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownStatus {
    Unscheduled,
    Pending { remaining_minutes: u64 },
}

struct ShutdownPlan {
    total_minutes: u32,
    started_at: Instant,
    generation: u64,
    timers: Vec<JoinHandle<()>>,
}

struct PlanSlot {
    generation: u64,
    plan: Option<ShutdownPlan>,
}

struct Inner {
    slot: Mutex<PlanSlot>,
    hub: BroadcastHub,
    registry: Arc<ConnectionRegistry>,
    terminate: Arc<Notify>,
    grace: Duration,
    completed: AtomicBool,
}

/// Owner of the single process-wide shutdown plan.
///
/// Every timer task captures the generation of the plan that armed it and
/// re-checks it under the plan lock before acting, so timers belonging to a
/// superseded plan never publish even if abort loses the race.
#[derive(Clone)]
pub struct ShutdownScheduler {
    inner: Arc<Inner>,
}

impl ShutdownScheduler {
    pub fn new(
        hub: BroadcastHub,
        registry: Arc<ConnectionRegistry>,
        terminate: Arc<Notify>,
        grace: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                slot: Mutex::new(PlanSlot { generation: 0, plan: None }),
                hub,
                registry,
                terminate,
                grace,
                completed: AtomicBool::new(false),
            }),
        }
    }

    /// Replace any pending plan with one that ends the process in `minutes`.
    pub async fn schedule(&self, minutes: u32) {
        let mut slot = self.inner.slot.lock().await;
        slot.generation += 1;
        let generation = slot.generation;

        if let Some(old) = slot.plan.take() {
            info!(target: "audit", "Shutdown plan of {} minutes superseded", old.total_minutes);
            for timer in old.timers {
                timer.abort();
            }
        }

        let mut timers = Vec::with_capacity(2);
        if minutes > 5 {
            timers.push(self.spawn_reminders(generation, vec![(minutes - 5, 5), (4, 1)]));
        } else if minutes > 1 {
            timers.push(self.spawn_reminders(generation, vec![(minutes - 1, 1)]));
        }
        timers.push(self.spawn_terminal(generation, minutes));

        slot.plan = Some(ShutdownPlan {
            total_minutes: minutes,
            started_at: Instant::now(),
            generation,
            timers,
        });
        info!(target: "audit", "Shutdown scheduled in {} minutes (plan {})", minutes, generation);

        self.inner
            .hub
            .publish(Envelope::system(format!(
                "[notice] The server will shut down in {} minute{}",
                minutes,
                plural(minutes)
            )))
            .await;
    }

    pub async fn status(&self) -> ShutdownStatus {
        match &self.inner.slot.lock().await.plan {
            Some(plan) => {
                let elapsed = plan.started_at.elapsed().as_secs() / MINUTE.as_secs();
                ShutdownStatus::Pending {
                    remaining_minutes: u64::from(plan.total_minutes).saturating_sub(elapsed),
                }
            }
            None => ShutdownStatus::Unscheduled,
        }
    }

    /// True once a plan has run to completion and the room was torn down.
    pub fn has_completed(&self) -> bool {
        self.inner.completed.load(Ordering::SeqCst)
    }

    /// Sleep through each `(delay, remaining)` step, announcing `remaining`
    /// minutes after every delay while the plan is still current.
    fn spawn_reminders(&self, generation: u64, steps: Vec<(u32, u32)>) -> JoinHandle<()> {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            for (delay, remaining) in steps {
                sleep(MINUTE * delay).await;
                let slot = inner.slot.lock().await;
                if !is_current(&slot, generation) {
                    return;
                }
                inner
                    .hub
                    .publish(Envelope::system(format!(
                        "[notice] The server will shut down in {} minute{}, please get ready!",
                        remaining,
                        plural(remaining)
                    )))
                    .await;
            }
        })
    }

    fn spawn_terminal(&self, generation: u64, minutes: u32) -> JoinHandle<()> {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            sleep(MINUTE * minutes).await;
            // Held to the end: once the final notice is out, no new plan may
            // interleave with the teardown.
            let slot = inner.slot.lock().await;
            if !is_current(&slot, generation) {
                return;
            }
            inner
                .hub
                .publish(Envelope::system("[notice] The server has shut down, thanks for chatting!"))
                .await;
            sleep(inner.grace).await;

            let connections = inner.registry.snapshot().await;
            warn!(target: "audit", "Shutdown plan {} complete, closing {} connections", generation, connections.len());
            for (handle, _) in connections {
                handle.close().await;
            }
            inner.completed.store(true, Ordering::SeqCst);
            inner.terminate.notify_one();
        })
    }
}

fn plural(n: u32) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn is_current(slot: &PlanSlot, generation: u64) -> bool {
    slot.plan.as_ref().map(|p| p.generation) == Some(generation)
}
