//! Live reload: re-run the load whenever the backing file changes.
//!
//! A session watches the config file's parent directory (non-recursively) with
//! `notify`, forwards events into a tokio channel, and reacts to creates and
//! modifications of the file itself. After a quiet period the full load runs
//! again. A successful load replaces the [`LiveConfig`] snapshot in one atomic
//! swap; a failed one leaves the previous snapshot in place.
//!
//! Each outcome is reported on the [`ReloadEvents`] channel returned when the
//! session is armed, so the application decides what a failed reload means.

use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use confique::Config;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::builder::{Loader, Settings};
use crate::env::DotEnvKeys;
use crate::error::LayerfigError;
use crate::file;
use crate::resolve;

/// A config value that live reload can replace while readers hold it.
///
/// Cloning is cheap and every clone sees the same snapshots.
pub struct LiveConfig<C> {
    inner: Arc<ArcSwap<C>>,
}

impl<C> Clone for LiveConfig<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C> LiveConfig<C> {
    pub fn new(config: C) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    /// The current snapshot. It never changes underneath the caller; a later
    /// reload only affects later calls.
    pub fn get(&self) -> Arc<C> {
        self.inner.load_full()
    }

    pub fn store(&self, config: C) {
        self.inner.store(Arc::new(config));
    }
}

impl<C: std::fmt::Debug> std::fmt::Debug for LiveConfig<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("LiveConfig").field(&*self.get()).finish()
    }
}

/// Outcome of one reload attempt.
#[derive(Debug)]
pub enum ReloadEvent {
    /// The snapshot was replaced.
    Reloaded,
    /// The load failed; the previous snapshot is still in place.
    Failed(LayerfigError),
}

/// Receiving end for reload outcomes. Dropping it does not stop the session.
pub type ReloadEvents = mpsc::UnboundedReceiver<ReloadEvent>;

/// A running watch loop and the token that stops it.
pub(crate) struct WatchSession {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl WatchSession {
    fn is_active(&self) -> bool {
        !self.token.is_cancelled() && !self.task.is_finished()
    }
}

impl<C> Loader<C>
where
    C: Config + Send + Sync + 'static,
    C::Layer: for<'de> Deserialize<'de>,
{
    /// Start reloading `target` whenever the config file changes.
    ///
    /// Must be called from within a tokio runtime. The session ends when
    /// `cancel` fires or [`stop_live_reload`](Self::stop_live_reload) is
    /// called. Arming a loader that already has an active session is an
    /// error; arming again after it stopped is fine.
    ///
    /// The watcher is subscribed before this returns, so no change made after
    /// the call is missed.
    pub fn enable_live_reload(
        &self,
        target: &LiveConfig<C>,
        cancel: CancellationToken,
    ) -> Result<ReloadEvents, LayerfigError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| LayerfigError::NoRuntime)?;

        let mut session = self.watch_session();
        if session.as_ref().is_some_and(WatchSession::is_active) {
            return Err(LayerfigError::AlreadyWatching);
        }

        let (path, _) = file::locate(&self.settings).map_err(LayerfigError::NothingToWatch)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let (fs_tx, fs_rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // Only fails once the loop is gone.
            let _ = fs_tx.send(res);
        })?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        let token = cancel.child_token();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let watch_loop = WatchLoop {
            _watcher: watcher,
            fs_events: fs_rx,
            file_name,
            settings: self.settings.clone(),
            dotenv_keys: self.dotenv_keys.clone(),
            target: target.clone(),
            token: token.clone(),
            events: events_tx,
        };
        let task = runtime.spawn(watch_loop.run());

        info!(path = %path.display(), "live reload armed");
        *session = Some(WatchSession { token, task });
        Ok(events_rx)
    }

    /// Stop the active session. Returns `false` if there was none.
    pub fn stop_live_reload(&self) -> bool {
        match self.watch_session().take() {
            Some(session) if session.is_active() => {
                session.token.cancel();
                true
            }
            _ => false,
        }
    }

    pub fn is_live_reloading(&self) -> bool {
        self.watch_session()
            .as_ref()
            .is_some_and(WatchSession::is_active)
    }
}

struct WatchLoop<C> {
    // Dropping the watcher unsubscribes from the OS.
    _watcher: RecommendedWatcher,
    fs_events: mpsc::UnboundedReceiver<notify::Result<Event>>,
    file_name: OsString,
    settings: Settings,
    dotenv_keys: DotEnvKeys,
    target: LiveConfig<C>,
    token: CancellationToken,
    events: mpsc::UnboundedSender<ReloadEvent>,
}

impl<C> WatchLoop<C>
where
    C: Config + Send + Sync + 'static,
    C::Layer: for<'de> Deserialize<'de>,
{
    async fn run(mut self) {
        loop {
            let event = tokio::select! {
                _ = self.token.cancelled() => break,
                event = self.fs_events.recv() => event,
            };

            match event {
                None => break,
                Some(Err(e)) => warn!(error = %e, "file watcher error"),
                Some(Ok(event)) if self.is_relevant(&event) => {
                    debug!(kind = ?event.kind, "config file changed");
                    if !self.settle(self.settings.reload_debounce).await {
                        break;
                    }
                    self.reload().await;
                }
                Some(Ok(_)) => {}
            }
        }
        info!("live reload stopped");
    }

    fn is_relevant(&self, event: &Event) -> bool {
        matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
            && event
                .paths
                .iter()
                .any(|p| p.file_name() == Some(self.file_name.as_os_str()))
    }

    /// Wait out the debounce period, then drop the events it collected.
    /// Returns `false` if the session was cancelled meanwhile.
    async fn settle(&mut self, debounce: Duration) -> bool {
        tokio::select! {
            _ = self.token.cancelled() => return false,
            _ = tokio::time::sleep(debounce) => {}
        }
        while self.fs_events.try_recv().is_ok() {}
        true
    }

    /// Run the load on the blocking pool; it reads files and the environment.
    async fn reload(&mut self) {
        let settings = self.settings.clone();
        let dotenv_keys = self.dotenv_keys.clone();
        let result =
            tokio::task::spawn_blocking(move || resolve::resolve::<C>(&settings, &dotenv_keys))
                .await;

        let outcome = match result {
            Err(e) => {
                warn!(error = %e, "config reload task did not complete");
                return;
            }
            Ok(Ok((config, _))) => {
                self.target.store(config);
                info!("config reloaded");
                ReloadEvent::Reloaded
            }
            Ok(Err(e)) => {
                warn!(error = %e, "config reload failed, keeping previous values");
                ReloadEvent::Failed(e)
            }
        };
        // Nobody listening is fine.
        let _ = self.events.send(outcome);
    }
}
