use std::str::FromStr;
use std::sync::Arc;

use pulse_core::{Direction, Token, TokenChanges, TokenDelta, TokenMetric};
use rand::Rng;
use rand::seq::SliceRandom;
use time::OffsetDateTime;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};
use tracing::{debug, info};

use crate::session::{SharedSession, lock};

pub const DEFAULT_INTERVAL_MS: u64 = 3_000;
pub const DEFAULT_VARIANCE_MS: u64 = 2_000;
pub const DEFAULT_BATCH_SIZE: usize = 3;
pub const MIN_DELAY_MS: u64 = 1_200;

const METRIC_SWING: f64 = 6.0;
const CHANGE_LIMIT: f64 = 99.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorConfig {
    pub interval: Duration,
    pub interval_variance: Duration,
    pub batch_size: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(env_or("PULSE_SIM_INTERVAL_MS", DEFAULT_INTERVAL_MS)),
            interval_variance: Duration::from_millis(env_or(
                "PULSE_SIM_VARIANCE_MS",
                DEFAULT_VARIANCE_MS,
            )),
            batch_size: env_or("PULSE_SIM_BATCH_SIZE", DEFAULT_BATCH_SIZE),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone)]
pub enum LiveEvent {
    Connected,
    Batch {
        applied: usize,
        deltas: Vec<TokenDelta>,
    },
    Disconnected,
}

/// Random price-movement generator. Holds no reference to the store; callers
/// hand it the current pool on every tick.
pub struct DeltaSimulator<R> {
    config: SimulatorConfig,
    rng: R,
}

impl<R: Rng> DeltaSimulator<R> {
    pub fn new(config: SimulatorConfig, rng: R) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn next_delay(&mut self) -> Duration {
        let variance = self.rng.r#gen::<f64>() * self.config.interval_variance.as_millis() as f64;
        let sign = if self.rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        let delay = self.config.interval.as_millis() as f64 + variance * sign;
        Duration::from_millis(delay.max(MIN_DELAY_MS as f64) as u64)
    }

    /// One batch of deltas over `min(batch_size, pool.len())` distinct tokens.
    pub fn tick(&mut self, pool: &[&Token], now: OffsetDateTime) -> Vec<TokenDelta> {
        let now_ms = (now.unix_timestamp_nanos() / 1_000_000) as f64;
        let take = self.config.batch_size.min(pool.len());
        let picked: Vec<&Token> = pool.choose_multiple(&mut self.rng, take).copied().collect();

        picked
            .into_iter()
            .map(|token| {
                let pct = self.rng.gen_range(0.5..=5.0) / 100.0;
                let direction = if self.rng.gen_bool(0.5) {
                    Direction::Up
                } else {
                    Direction::Down
                };
                simulate_token(token, pct, direction, now_ms)
            })
            .collect()
    }
}

/// Moves `token` by the fraction `pct` in `direction`. Quantities never go
/// negative, the 24h change stays within ±99 and metrics within 0..=100.
pub fn simulate_token(token: &Token, pct: f64, direction: Direction, now_ms: f64) -> TokenDelta {
    let deviation = direction.sign() * pct;
    let scaled = |value: f64, weight: f64| round2((value * (1.0 + deviation * weight)).max(0.0));
    let counted =
        |count: u64, weight: f64| (count as f64 * (1.0 + deviation * weight)).round().max(0.0) as u64;

    let metrics = token
        .metrics
        .iter()
        .enumerate()
        .map(|(i, metric)| {
            let wave = ((now_ms / 2_000.0 + i as f64).sin() + 1.0) / 2.0;
            let value = (metric.value + direction.sign() * METRIC_SWING * wave)
                .clamp(0.0, 100.0)
                .round();
            TokenMetric {
                label: metric.label.clone(),
                value,
                direction,
            }
        })
        .collect();

    let changes = TokenChanges {
        market_cap: Some(scaled(token.market_cap, 1.0)),
        market_cap_change_24h: Some(round2(
            (token.market_cap_change_24h + deviation * 100.0).clamp(-CHANGE_LIMIT, CHANGE_LIMIT),
        )),
        liquidity: Some(scaled(token.liquidity, 0.6)),
        volume_24h: Some(scaled(token.volume_24h, 1.2)),
        transaction_count: Some(counted(token.transaction_count, 1.1)),
        buy_count: Some(counted(token.buy_count, 1.15)),
        sell_count: Some(counted(token.sell_count, 0.95)),
        metrics: Some(metrics),
    };

    TokenDelta::new(token.id.clone(), changes).with_price(round2(pct * 100.0), direction)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Background task feeding simulated deltas into a [`SharedSession`]. While
/// the session holds no tokens the task idles disconnected and resumes once a
/// fetch lands. The task is aborted when the feed is stopped or dropped.
pub struct LiveFeed {
    handle: Option<JoinHandle<()>>,
    connection: Arc<watch::Sender<ConnectionState>>,
}

impl LiveFeed {
    /// Must be called from within a tokio runtime. A session with tokens is
    /// reported connected before this returns.
    pub fn start<R>(
        session: SharedSession,
        config: SimulatorConfig,
        rng: R,
        events: Option<UnboundedSender<LiveEvent>>,
    ) -> Self
    where
        R: Rng + Send + 'static,
    {
        let (tx, _) = watch::channel(ConnectionState::Disconnected);
        let connection = Arc::new(tx);

        info!(
            interval_ms = config.interval.as_millis() as u64,
            variance_ms = config.interval_variance.as_millis() as u64,
            batch = config.batch_size,
            "live feed starting"
        );
        let (has_tokens, tokens_loaded) = {
            let guard = lock(&session);
            (guard.token_count() > 0, guard.tokens_loaded())
        };
        if has_tokens {
            publish(&connection, &events, ConnectionState::Connected);
        }

        let simulator = DeltaSimulator::new(config, rng);
        let handle = tokio::spawn(run_feed(
            session,
            simulator,
            connection.clone(),
            events,
            tokens_loaded,
        ));
        Self {
            handle: Some(handle),
            connection,
        }
    }

    pub fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        *self.connection.borrow() == ConnectionState::Connected
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("live feed stopped");
        }
        self.connection.send_replace(ConnectionState::Disconnected);
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Returns whether the state changed. Events are only sent on a change.
fn publish(
    connection: &watch::Sender<ConnectionState>,
    events: &Option<UnboundedSender<LiveEvent>>,
    state: ConnectionState,
) -> bool {
    let current = *connection.borrow();
    if current == state {
        return false;
    }
    connection.send_replace(state);
    if let Some(tx) = events {
        let event = match state {
            ConnectionState::Connected => LiveEvent::Connected,
            ConnectionState::Disconnected => LiveEvent::Disconnected,
        };
        let _ = tx.send(event);
    }
    true
}

async fn run_feed<R: Rng>(
    session: SharedSession,
    mut simulator: DeltaSimulator<R>,
    connection: Arc<watch::Sender<ConnectionState>>,
    events: Option<UnboundedSender<LiveEvent>>,
    tokens_loaded: Arc<Notify>,
) {
    loop {
        let empty = lock(&session).token_count() == 0;
        if empty {
            if publish(&connection, &events, ConnectionState::Disconnected) {
                info!("token pool empty, live feed disconnected");
            }
            tokens_loaded.notified().await;
            continue;
        }
        if publish(&connection, &events, ConnectionState::Connected) {
            info!("tokens loaded, live feed reconnected");
        }

        sleep(simulator.next_delay()).await;

        let batch = {
            let mut guard = lock(&session);
            let deltas = {
                let view = guard.view();
                let pool = view.all_tokens();
                (!pool.is_empty()).then(|| simulator.tick(&pool, OffsetDateTime::now_utc()))
            };
            deltas.map(|deltas| (guard.apply_deltas(deltas.clone()), deltas))
        };
        let Some((applied, deltas)) = batch else {
            continue;
        };

        debug!(applied, batch = deltas.len(), "applied simulated deltas");
        if let Some(tx) = &events {
            let _ = tx.send(LiveEvent::Batch { applied, deltas });
        }
    }
}

#[cfg(test)]
mod tests {
    use pulse_core::TokenStore;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use time::macros::datetime;
    use tokio::sync::mpsc;

    use super::*;
    use crate::fixtures::{MockSpec, generate_mock_tokens};
    use crate::session::Session;

    fn config(batch_size: usize) -> SimulatorConfig {
        SimulatorConfig {
            interval: Duration::from_millis(DEFAULT_INTERVAL_MS),
            interval_variance: Duration::from_millis(DEFAULT_VARIANCE_MS),
            batch_size,
        }
    }

    fn loaded_session(count: usize) -> SharedSession {
        let mut session = Session::new();
        let id = session.begin_fetch(&crate::TokenQuery::all());
        session.finish_fetch(
            &crate::TokenQuery::all(),
            id,
            Ok(crate::TokenPage {
                tokens: generate_mock_tokens(MockSpec { count, seed: 11 }),
                last_updated_at: OffsetDateTime::now_utc(),
            }),
        );
        session.into_shared()
    }

    #[test]
    fn delay_stays_within_bounds() {
        let mut sim = DeltaSimulator::new(config(3), StdRng::seed_from_u64(1));
        for _ in 0..500 {
            let delay = sim.next_delay();
            assert!(delay >= Duration::from_millis(MIN_DELAY_MS), "{delay:?}");
            assert!(delay <= Duration::from_millis(5_000), "{delay:?}");
        }
    }

    #[test]
    fn short_interval_is_floored() {
        let config = SimulatorConfig {
            interval: Duration::from_millis(100),
            interval_variance: Duration::ZERO,
            batch_size: 1,
        };
        let mut sim = DeltaSimulator::new(config, StdRng::seed_from_u64(4));
        for _ in 0..20 {
            assert_eq!(sim.next_delay(), Duration::from_millis(MIN_DELAY_MS));
        }
    }

    #[test]
    fn jitter_goes_both_ways() {
        let mut sim = DeltaSimulator::new(config(3), StdRng::seed_from_u64(6));
        let interval = Duration::from_millis(DEFAULT_INTERVAL_MS);
        let delays: Vec<Duration> = (0..200).map(|_| sim.next_delay()).collect();

        assert!(delays.iter().any(|d| *d < interval));
        assert!(delays.iter().any(|d| *d > interval));
    }

    #[test]
    fn tick_picks_distinct_tokens() {
        let tokens = generate_mock_tokens(MockSpec { count: 8, seed: 3 });
        let pool: Vec<&Token> = tokens.iter().collect();
        let mut sim = DeltaSimulator::new(config(5), StdRng::seed_from_u64(2));

        let deltas = sim.tick(&pool, datetime!(2026-03-01 12:00:00 UTC));
        let mut ids: Vec<&str> = deltas.iter().map(|d| d.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 5);

        let small = &pool[..2];
        assert_eq!(sim.tick(small, datetime!(2026-03-01 12:00:00 UTC)).len(), 2);
        assert!(sim.tick(&[], datetime!(2026-03-01 12:00:00 UTC)).is_empty());
    }

    #[test]
    fn repeated_ticks_respect_bounds() {
        let mut store = TokenStore::new();
        store.ingest(generate_mock_tokens(MockSpec { count: 6, seed: 21 }), true);
        let mut sim = DeltaSimulator::new(config(3), StdRng::seed_from_u64(7));
        let mut now = datetime!(2026-03-01 12:00:00 UTC);

        for _ in 0..400 {
            let deltas = {
                let pool: Vec<&Token> = store.ids().iter().filter_map(|id| store.get(id)).collect();
                sim.tick(&pool, now)
            };
            for delta in &deltas {
                let pct = delta.price_delta_pct.unwrap();
                assert!((0.5..=5.0).contains(&pct), "{pct}");
            }
            store.apply_deltas(deltas);
            now += time::Duration::milliseconds(1_700);
        }

        for id in store.ids() {
            let token = store.get(id).unwrap();
            assert!(token.market_cap >= 0.0);
            assert!(token.liquidity >= 0.0);
            assert!(token.volume_24h >= 0.0);
            assert!((-99.0..=99.0).contains(&token.market_cap_change_24h));
            assert!(token.metrics.iter().all(|m| (0.0..=100.0).contains(&m.value)));
        }
    }

    #[test]
    fn upward_move_scales_fields() {
        let mut token = generate_mock_tokens(MockSpec { count: 1, seed: 4 }).remove(0);
        token.market_cap = 1_000.0;
        token.liquidity = 100.0;
        token.volume_24h = 200.0;
        token.buy_count = 100;
        token.market_cap_change_24h = 97.0;

        let delta = simulate_token(&token, 0.05, Direction::Up, 0.0);
        let changes = &delta.changes;
        assert_eq!(changes.market_cap, Some(1_050.0));
        assert_eq!(changes.liquidity, Some(103.0));
        assert_eq!(changes.volume_24h, Some(212.0));
        assert_eq!(changes.buy_count, Some(106));
        assert_eq!(changes.market_cap_change_24h, Some(99.0));
        assert_eq!(delta.price_delta_pct, Some(5.0));
        assert_eq!(delta.price_direction, Some(Direction::Up));
        assert!(
            changes
                .metrics
                .as_ref()
                .unwrap()
                .iter()
                .all(|m| m.direction == Direction::Up)
        );
    }

    #[test]
    fn downward_move_floors_metrics_at_zero() {
        let mut token = generate_mock_tokens(MockSpec { count: 1, seed: 4 }).remove(0);
        for metric in &mut token.metrics {
            metric.value = 0.0;
        }
        token.market_cap_change_24h = -98.0;

        let delta = simulate_token(&token, 0.03, Direction::Down, 1_000.0);
        assert_eq!(delta.changes.market_cap_change_24h, Some(-99.0));
        assert!(delta.changes.metrics.unwrap().iter().all(|m| m.value == 0.0));
    }

    #[tokio::test(start_paused = true)]
    async fn feed_applies_batches() {
        let session = loaded_session(12);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let feed = LiveFeed::start(session.clone(), config(3), StdRng::seed_from_u64(9), Some(tx));
        assert!(feed.is_connected());

        assert!(matches!(rx.recv().await, Some(LiveEvent::Connected)));
        match rx.recv().await {
            Some(LiveEvent::Batch { applied, deltas }) => {
                assert_eq!(applied, 3);
                assert_eq!(deltas.len(), 3);
            }
            other => panic!("expected batch, got {other:?}"),
        }
        assert_eq!(lock(&session).store().realtime_len(), 3);
    }

    fn reload(session: &SharedSession, count: usize) {
        let query = crate::TokenQuery::all();
        let mut guard = lock(session);
        let id = guard.begin_fetch(&query);
        guard.finish_fetch(
            &query,
            id,
            Ok(crate::TokenPage {
                tokens: generate_mock_tokens(MockSpec { count, seed: 17 }),
                last_updated_at: OffsetDateTime::now_utc(),
            }),
        );
    }

    #[tokio::test(start_paused = true)]
    async fn empty_session_waits_for_tokens() {
        let session = Session::new().into_shared();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let feed = LiveFeed::start(session.clone(), config(3), StdRng::seed_from_u64(1), Some(tx));

        sleep(Duration::from_secs(30)).await;
        assert!(!feed.is_connected());
        assert!(rx.try_recv().is_err());

        reload(&session, 4);
        assert!(matches!(rx.recv().await, Some(LiveEvent::Connected)));
        assert!(matches!(rx.recv().await, Some(LiveEvent::Batch { applied: 3, .. })));
        assert!(feed.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn feed_resumes_after_reset_and_reload() {
        let session = loaded_session(4);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let feed = LiveFeed::start(session.clone(), config(2), StdRng::seed_from_u64(8), Some(tx));
        assert!(matches!(rx.recv().await, Some(LiveEvent::Connected)));

        lock(&session).reset();
        sleep(Duration::from_secs(6)).await;
        assert!(!feed.is_connected());

        reload(&session, 4);
        sleep(Duration::from_secs(10)).await;
        assert!(feed.is_connected(), "feed stayed disconnected after tokens reloaded");

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        let disconnected = events
            .iter()
            .position(|e| matches!(e, LiveEvent::Disconnected))
            .expect("disconnect reported");
        let reconnected = events
            .iter()
            .position(|e| matches!(e, LiveEvent::Connected))
            .expect("reconnect reported");
        assert!(disconnected < reconnected);
        assert!(
            events[reconnected..]
                .iter()
                .any(|e| matches!(e, LiveEvent::Batch { applied: 2, .. }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn emptied_pool_disconnects() {
        let session = loaded_session(4);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let feed = LiveFeed::start(session.clone(), config(2), StdRng::seed_from_u64(5), Some(tx));
        let mut connection = feed.connection();

        lock(&session).reset();

        assert!(matches!(rx.recv().await, Some(LiveEvent::Connected)));
        assert!(matches!(rx.recv().await, Some(LiveEvent::Disconnected)));
        connection.changed().await.unwrap();
        assert_eq!(*connection.borrow(), ConnectionState::Disconnected);
        assert!(!feed.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_feed_cancels_pending_tick() {
        let session = loaded_session(5);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let feed = LiveFeed::start(session.clone(), config(3), StdRng::seed_from_u64(3), Some(tx));
        let revision = lock(&session).store().revision();

        drop(feed);
        sleep(Duration::from_secs(60)).await;

        assert!(matches!(rx.recv().await, Some(LiveEvent::Connected)));
        assert!(rx.recv().await.is_none());
        let guard = lock(&session);
        assert_eq!(guard.store().revision(), revision);
        assert_eq!(guard.store().realtime_len(), 0);
    }
}
