//! The coordinator loop.
//!
//! A single task owns the [`RequestRegistry`]. Public calls and fetch
//! completions reach it as [`Command`]s over an unbounded channel, so the
//! registry is never touched from I/O tasks and `request`/`cancel` never wait.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tokio_util::task::TaskTracker;
use tracing::{debug, info, trace, warn};

use super::resolve::Resolver;
use crate::coord::TilePos;
use crate::http::{self, FetchError, HttpFetcher};
use crate::registry::{RegistryError, RequestId, RequestRegistry};
use crate::source::TileUrlSource;

/// Messages handled by the loop.
pub(crate) enum Command {
    Request(TilePos),
    Cancel(TilePos),
    /// A fetch finished; sent from the fetch task.
    Complete {
        pos: TilePos,
        id: RequestId,
        url: String,
        result: Result<Bytes, FetchError>,
    },
    /// Reply with the number of pending requests.
    InFlight(oneshot::Sender<usize>),
    Shutdown,
}

pub(crate) struct FetchDaemon {
    registry: RequestRegistry,
    next_id: RequestId,
    commands: mpsc::UnboundedReceiver<Command>,
    /// Handed to fetch completions; weak so the loop ends once every
    /// public handle is gone.
    completions: mpsc::WeakUnboundedSender<Command>,
    source: Arc<dyn TileUrlSource>,
    fetcher: Arc<dyn HttpFetcher>,
    resolver: Arc<Resolver>,
    tracker: TaskTracker,
}

impl FetchDaemon {
    /// Creates the loop and the sender that feeds it.
    pub(crate) fn new(
        source: Arc<dyn TileUrlSource>,
        fetcher: Arc<dyn HttpFetcher>,
        resolver: Arc<Resolver>,
        tracker: TaskTracker,
    ) -> (Self, mpsc::UnboundedSender<Command>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let daemon = Self {
            registry: RequestRegistry::new(),
            next_id: RequestId::new(1),
            commands: rx,
            completions: tx.downgrade(),
            source,
            fetcher,
            resolver,
            tracker,
        };
        (daemon, tx)
    }

    /// Runs until shutdown is requested or every sender is dropped.
    ///
    /// Pending fetches are aborted on exit. Resolutions already handed to the
    /// tracker keep running.
    pub(crate) async fn run(mut self) {
        info!(source = self.source.name(), "Tile fetch loop starting");

        while let Some(command) = self.commands.recv().await {
            match command {
                Command::Request(pos) => self.handle_request(pos),
                Command::Cancel(pos) => self.handle_cancel(pos),
                Command::Complete {
                    pos,
                    id,
                    url,
                    result,
                } => self.handle_complete(pos, id, url, result),
                Command::InFlight(reply) => {
                    let _ = reply.send(self.registry.len());
                }
                Command::Shutdown => break,
            }
        }

        let aborted = self.registry.remove_all();
        info!(
            source = self.source.name(),
            aborted, "Tile fetch loop stopped"
        );
    }

    fn handle_request(&mut self, pos: TilePos) {
        if self.registry.contains(pos) {
            trace!(tile = %pos, "Tile already pending, ignoring request");
            return;
        }

        let url = self.source.url_for(pos);
        let id = self.next_id;
        self.next_id = id.next();

        let completions = self.completions.clone();
        let completion_url = url.clone();
        let handle = http::fetch(self.fetcher.as_ref(), &url, move |result| {
            if let Some(tx) = completions.upgrade() {
                let _ = tx.send(Command::Complete {
                    pos,
                    id,
                    url: completion_url,
                    result,
                });
            }
        });

        match self.registry.insert(pos, id, handle) {
            Ok(()) => debug!(
                zoom = pos.zoom(),
                x = pos.x(),
                y = pos.y(),
                url = %url,
                request = %id,
                "Tile requested"
            ),
            Err(RegistryError::AlreadyPending { pos, .. }) => {
                warn!(tile = %pos, "Tile became pending twice; new fetch aborted")
            }
        }
    }

    fn handle_cancel(&mut self, pos: TilePos) {
        if self.registry.remove(pos) {
            debug!(zoom = pos.zoom(), x = pos.x(), y = pos.y(), "Tile request cancelled");
        } else {
            trace!(tile = %pos, "Cancel for tile with no pending request");
        }
    }

    fn handle_complete(
        &mut self,
        pos: TilePos,
        id: RequestId,
        url: String,
        result: Result<Bytes, FetchError>,
    ) {
        // Removed before anything else, so a later cancel finds nothing.
        if !self.registry.complete(pos, id) {
            trace!(tile = %pos, request = %id, "Dropping stale completion");
            return;
        }

        if let Err(e) = &result {
            if e.is_cancelled() {
                trace!(tile = %pos, request = %id, "Tile fetch cancelled");
                return;
            }
        }

        let resolver = Arc::clone(&self.resolver);
        self.tracker
            .spawn(async move { resolver.resolve(pos, url, result).await });
    }
}
