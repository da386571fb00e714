use crate::domain::config::WidgetConfig;
use crate::domain::plan::DayPlan;
use crate::domain::votes::{VoteLedger, VoteTally, VoteUpdate};
use crate::error::GenerationError;
use crate::notify::{Inbound, Outbound, VoteRequest};
use crate::pipeline::Generator;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

const OUTBOUND_CAPACITY: usize = 64;

/// Last plan handed to the display layer.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveredPlan {
    pub run_id: Uuid,
    pub delivered_at: DateTime<Utc>,
    pub degraded: bool,
    pub plans: Vec<DayPlan>,
}

/// Dispatches display-layer notifications to the pipeline and the ledger.
///
/// Generation runs are independent tasks; whichever finishes last is the
/// latest plan. Votes never wait on a run.
#[derive(Clone)]
pub struct DinnerService {
    inner: Arc<Inner>,
}

struct Inner {
    generator: Generator,
    ledger: Mutex<VoteLedger>,
    latest: RwLock<Option<DeliveredPlan>>,
    outbound: broadcast::Sender<Outbound>,
}

impl DinnerService {
    pub fn new(generator: Generator, ledger: VoteLedger) -> Self {
        let (outbound, _) = broadcast::channel(OUTBOUND_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                generator,
                ledger: Mutex::new(ledger),
                latest: RwLock::new(None),
                outbound,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Outbound> {
        self.inner.outbound.subscribe()
    }

    pub async fn handle(&self, inbound: Inbound) {
        match inbound {
            Inbound::FetchWhatsForDinner(config) => {
                self.spawn_generation(config);
            }
            Inbound::RegisterVote(req) => {
                self.register_vote(req).await;
            }
        }
    }

    pub fn spawn_generation(&self, config: WidgetConfig) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            // Errors are logged inside; the display keeps its last plan.
            let _ = service.generate(&config).await;
        })
    }

    /// Runs one generation and delivers the plan on success.
    pub async fn generate(&self, config: &WidgetConfig) -> Result<(), GenerationError> {
        match self.inner.generator.run(config).await {
            Ok(run) => {
                let mut latest = self.inner.latest.write().await;
                let delivered = DeliveredPlan {
                    run_id: run.run_id,
                    delivered_at: Utc::now(),
                    degraded: run.degraded,
                    plans: run.plans,
                };
                self.broadcast(Outbound::WhatsForDinnerResult(delivered.plans.clone()));
                *latest = Some(delivered);
                Ok(())
            }
            Err(err) => {
                if err.is_preflight() {
                    tracing::error!(kind = ?err.kind, error = %err, "forecast run not started");
                } else {
                    tracing::error!(kind = ?err.kind, error = %err, "forecast run failed");
                }
                Err(err)
            }
        }
    }

    pub async fn register_vote(&self, req: VoteRequest) -> VoteUpdate {
        let update = {
            let mut ledger = self.inner.ledger.lock().await;
            ledger.register_vote(&req.date, &req.meal_name, &req.vote_type)
        };
        tracing::info!(date = %req.date, meal = %req.meal_name, vote_type = %req.vote_type, "vote registered");
        self.broadcast(Outbound::VoteUpdate(update.clone()));
        update
    }

    pub async fn latest_plan(&self) -> Option<DeliveredPlan> {
        self.inner.latest.read().await.clone()
    }

    pub async fn tally(&self, date: &str) -> VoteTally {
        self.inner.ledger.lock().await.tally(date)
    }

    fn broadcast(&self, notification: Outbound) {
        let name = notification.name();
        if self.inner.outbound.send(notification).is_err() {
            tracing::debug!(notification = name, "no display subscribers");
        }
    }
}

/// Fetches immediately, then once per `config.refresh_interval()`.
pub fn spawn_refresh_loop(service: DinnerService, config: WidgetConfig) -> JoinHandle<()> {
    let period = config.refresh_interval();
    tokio::spawn(async move {
        tracing::info!(period_secs = period.as_secs(), "refresh loop started");
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            service
                .handle(Inbound::FetchWhatsForDinner(config.clone()))
                .await;
        }
    })
}
