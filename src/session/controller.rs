use std::{sync::Arc, time::Duration};

use log::info;
use tokio::{
    sync::{watch, Mutex, Notify},
    task::JoinHandle,
    time,
};
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::persistence::{KeyValueStore, PersistenceMirror};
use crate::utils::Clock;

use super::{Change, Session, SessionEvent, ViewState};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// Upper bound on how long the ticker sleeps with no deadline pending.
const IDLE_WAIT: Duration = Duration::from_secs(3600);

enum StoreWrite {
    Save(String),
    Clear,
}

struct Ticker {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Owns the live session, mirrors durable changes to the store, and runs the
/// single ticker task that fires popup, flash and inactivity deadlines.
///
/// Events and timer callbacks serialize on one lock, so every mutation is
/// applied atomically with respect to the others. Store writes happen on the
/// blocking pool after that lock is released, in the order the changes were
/// made.
pub struct SessionController<S: KeyValueStore + 'static> {
    session: Arc<Mutex<Session>>,
    mirror: Arc<PersistenceMirror<S>>,
    store_order: Arc<Mutex<()>>,
    clock: Arc<dyn Clock>,
    view_tx: Arc<watch::Sender<ViewState>>,
    wake: Arc<Notify>,
    ticker: Arc<Mutex<Option<Ticker>>>,
}

impl<S: KeyValueStore + 'static> Clone for SessionController<S> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            mirror: self.mirror.clone(),
            store_order: self.store_order.clone(),
            clock: self.clock.clone(),
            view_tx: self.view_tx.clone(),
            wake: self.wake.clone(),
            ticker: self.ticker.clone(),
        }
    }
}

impl<S: KeyValueStore + 'static> SessionController<S> {
    /// Loads the saved snapshot (or defaults) from `store`.
    pub fn new(config: EngineConfig, store: S, clock: Arc<dyn Clock>) -> Self {
        let mirror = PersistenceMirror::new(store, config.storage_key.clone());
        let now = clock.now_ms();
        let session = Session::from_snapshot(config, mirror.load(), now);
        let (view_tx, _) = watch::channel(session.view(now));

        Self {
            session: Arc::new(Mutex::new(session)),
            mirror: Arc::new(mirror),
            store_order: Arc::new(Mutex::new(())),
            clock,
            view_tx: Arc::new(view_tx),
            wake: Arc::new(Notify::new()),
            ticker: Arc::new(Mutex::new(None)),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.view_tx.subscribe()
    }

    pub async fn view(&self) -> ViewState {
        let guard = self.session.lock().await;
        guard.view(self.clock.now_ms())
    }

    /// Applies one inbound event and returns the resulting view once any
    /// store write it caused has finished.
    pub async fn dispatch(&self, event: SessionEvent) -> ViewState {
        let mut guard = self.session.lock().await;
        let now = self.clock.now_ms();
        let change = guard.dispatch(event, now);

        let write = match change {
            Change::None | Change::View => None,
            Change::Durable => {
                PersistenceMirror::<S>::encode(&guard.snapshot()).map(StoreWrite::Save)
            }
            Change::Reset => Some(StoreWrite::Clear),
        };
        // Queue for the store before releasing the session so writes land in
        // the same order as the changes that produced them.
        let store_turn = if write.is_some() {
            Some(self.store_order.clone().lock_owned().await)
        } else {
            None
        };

        let view = guard.view(now);
        if change != Change::None {
            self.view_tx.send_replace(view.clone());
        }
        drop(guard);

        // Deadlines may have moved; let the ticker recompute its sleep.
        self.wake.notify_one();

        if let Some(write) = write {
            let mirror = self.mirror.clone();
            let written = tokio::task::spawn_blocking(move || match write {
                StoreWrite::Save(document) => mirror.write(&document),
                StoreWrite::Clear => mirror.clear(),
            })
            .await;
            if let Err(err) = written {
                log_warn!("State write task failed: {err}");
            }
        }
        drop(store_turn);
        view
    }

    /// Spawns the ticker, replacing any previous one.
    pub async fn start(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(previous) = ticker_guard.take() {
            previous.cancel_token.cancel();
            previous.handle.abort();
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(ticker_loop(
            self.session.clone(),
            self.clock.clone(),
            self.view_tx.clone(),
            self.wake.clone(),
            cancel_token.clone(),
        ));

        *ticker_guard = Some(Ticker {
            handle,
            cancel_token,
        });
        info!("Session ticker started");
    }

    /// Stops the ticker and waits for it to exit. Safe to call repeatedly.
    pub async fn shutdown(&self) {
        let Some(ticker) = self.ticker.lock().await.take() else {
            return;
        };
        ticker.cancel_token.cancel();
        if let Err(err) = ticker.handle.await {
            log_warn!("Session ticker failed to join: {err}");
        }
        info!("Session ticker stopped");
    }

    pub async fn is_running(&self) -> bool {
        self.ticker.lock().await.is_some()
    }
}

async fn ticker_loop(
    session: Arc<Mutex<Session>>,
    clock: Arc<dyn Clock>,
    view_tx: Arc<watch::Sender<ViewState>>,
    wake: Arc<Notify>,
    cancel_token: CancellationToken,
) {
    loop {
        let deadline = session.lock().await.next_deadline();
        let wait = match deadline {
            Some(at) => Duration::from_millis(at.saturating_sub(clock.now_ms()).max(0) as u64),
            None => IDLE_WAIT,
        };

        tokio::select! {
            _ = cancel_token.cancelled() => {
                log_debug!("ticker shutting down");
                break;
            }
            _ = wake.notified() => {}
            _ = time::sleep(wait) => {
                let mut guard = session.lock().await;
                let now = clock.now_ms();
                if guard.tick(now) {
                    view_tx.send_replace(guard.view(now));
                }
            }
        }
    }
}
