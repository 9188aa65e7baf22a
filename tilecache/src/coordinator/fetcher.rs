//! Public handle to the coordinator.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use super::daemon::{Command, FetchDaemon};
use super::resolve::Resolver;
use crate::config::FetcherConfig;
use crate::coord::TilePos;
use crate::http::{FetchError, HttpFetcher, ReqwestFetcher};
use crate::placeholder::placeholder_image;
use crate::source::{RasterDecoder, TileDecoder, TileUrlSource};
use crate::store::TileStore;
use crate::tile::TileSink;

/// Fetches tiles for one tile source and delivers them to a sink.
///
/// `request` and `cancel` return immediately and never fail. Every accepted
/// request ends in exactly one delivery, or none if it was cancelled before
/// its fetch completed. Once a completion has been taken off the loop the
/// delivery is committed; a `cancel` arriving after that point is a no-op.
///
/// Dropping the fetcher stops the loop and aborts pending fetches; use
/// [`shutdown`](Self::shutdown) to also wait for deliveries and store writes
/// that are already under way.
pub struct TileFetcher {
    commands: mpsc::UnboundedSender<Command>,
    daemon: JoinHandle<()>,
    tracker: TaskTracker,
    source_name: String,
}

impl TileFetcher {
    /// Start building a fetcher for `source` that delivers to `sink`.
    pub fn builder<S, K>(source: S, sink: K) -> TileFetcherBuilder
    where
        S: TileUrlSource + 'static,
        K: TileSink + 'static,
    {
        TileFetcherBuilder::new(source, sink)
    }

    /// Begin fetching `pos`. A request for a tile that is already pending is
    /// ignored.
    pub fn request(&self, pos: TilePos) {
        self.send(Command::Request(pos));
    }

    /// Abort the pending request for `pos`, if any. No delivery follows.
    pub fn cancel(&self, pos: TilePos) {
        self.send(Command::Cancel(pos));
    }

    /// Number of requests whose fetch has not completed yet.
    pub async fn in_flight(&self) -> usize {
        let (tx, rx) = oneshot::channel();
        self.send(Command::InFlight(tx));
        rx.await.unwrap_or(0)
    }

    /// Name of the tile source.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Abort every pending request, stop the loop and wait for outstanding
    /// deliveries and store writes.
    pub async fn shutdown(self) {
        self.send(Command::Shutdown);
        if let Err(e) = self.daemon.await {
            debug!(error = %e, "Tile fetch loop ended abnormally");
        }

        self.tracker.close();
        self.tracker.wait().await;
        info!(source = %self.source_name, "Tile fetcher shut down");
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!(source = %self.source_name, "Tile fetch loop stopped, dropping command");
        }
    }
}

/// Builder for [`TileFetcher`].
///
/// Collaborators that are not supplied are built from the
/// [`FetcherConfig`]: a [`ReqwestFetcher`], a SQLite store named after the
/// tile source, and the [`RasterDecoder`].
pub struct TileFetcherBuilder {
    source: Arc<dyn TileUrlSource>,
    sink: Arc<dyn TileSink>,
    config: FetcherConfig,
    http: Option<Arc<dyn HttpFetcher>>,
    store: Option<Arc<dyn TileStore>>,
    decoder: Arc<dyn TileDecoder>,
}

impl TileFetcherBuilder {
    pub fn new<S, K>(source: S, sink: K) -> Self
    where
        S: TileUrlSource + 'static,
        K: TileSink + 'static,
    {
        let config = FetcherConfig::new(source.name());
        Self {
            source: Arc::new(source),
            sink: Arc::new(sink),
            config,
            http: None,
            store: None,
            decoder: Arc::new(RasterDecoder),
        }
    }

    /// Replace the default settings.
    pub fn with_config(mut self, config: FetcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_http_fetcher(mut self, http: Arc<dyn HttpFetcher>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn TileStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn TileDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Start the coordinator loop on the current Tokio runtime.
    ///
    /// Fails only if the default HTTP client cannot be built.
    pub fn spawn(self) -> Result<TileFetcher, FetchError> {
        let http: Arc<dyn HttpFetcher> = match self.http {
            Some(http) => http,
            None => Arc::new(ReqwestFetcher::new(&self.config.http)?),
        };
        let store: Arc<dyn TileStore> = match self.store {
            Some(store) => store,
            None => Arc::new(self.config.tile_store()),
        };

        let tracker = TaskTracker::new();
        let resolver = Arc::new(Resolver::new(
            store,
            self.decoder,
            self.sink,
            placeholder_image(),
            tracker.clone(),
        ));

        let source_name = self.source.name().to_string();
        let (daemon, commands) = FetchDaemon::new(self.source, http, resolver, tracker.clone());
        let daemon = tokio::spawn(daemon.run());

        Ok(TileFetcher {
            commands,
            daemon,
            tracker,
            source_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{MockHttpFetcher, MockResponse};
    use crate::placeholder::PLACEHOLDER_SIZE;
    use crate::source::{DecodeError, XyzTemplate};
    use crate::store::StoreError;
    use crate::tile::{Tile, TileOrigin};
    use bytes::Bytes;
    use image::{Rgba, RgbaImage};
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use std::collections::{HashMap, HashSet};
    use std::time::Duration;

    const TEMPLATE: &str = "http://tiles.test/{z}/{x}/{y}.png";

    fn url(pos: TilePos) -> String {
        format!("http://tiles.test/{}/{}/{}.png", pos.zoom(), pos.x(), pos.y())
    }

    fn pos(zoom: u8, x: u32, y: u32) -> TilePos {
        TilePos::new(zoom, x, y).unwrap()
    }

    /// Accepts any non-empty body.
    struct AnyBytesDecoder;

    impl TileDecoder for AnyBytesDecoder {
        fn decode(&self, bytes: &[u8]) -> Result<RgbaImage, DecodeError> {
            match bytes.first() {
                Some(first) => Ok(RgbaImage::from_pixel(1, 1, Rgba([*first, 0, 0, 255]))),
                None => Err(DecodeError("empty body".into())),
            }
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        rows: Mutex<HashMap<TilePos, Vec<u8>>>,
        broken: bool,
        puts: Mutex<usize>,
    }

    impl MemoryStore {
        fn broken() -> Self {
            Self {
                broken: true,
                ..Self::default()
            }
        }

        fn with_row(pos: TilePos, body: &[u8]) -> Self {
            let store = Self::default();
            store.rows.lock().insert(pos, body.to_vec());
            store
        }

        fn row(&self, pos: TilePos) -> Option<Vec<u8>> {
            self.rows.lock().get(&pos).cloned()
        }
    }

    impl TileStore for MemoryStore {
        fn put(&self, pos: TilePos, body: &[u8]) -> Result<(), StoreError> {
            *self.puts.lock() += 1;
            if self.broken {
                return Err(StoreError::WriteFailed("disk full".into()));
            }
            self.rows.lock().entry(pos).or_insert_with(|| body.to_vec());
            Ok(())
        }

        fn get(&self, pos: TilePos) -> Result<Option<Vec<u8>>, StoreError> {
            if self.broken {
                return Err(StoreError::Unavailable("cannot open".into()));
            }
            Ok(self.row(pos))
        }
    }

    struct Harness {
        fetcher: TileFetcher,
        http: MockHttpFetcher,
        store: Arc<MemoryStore>,
        tiles: mpsc::UnboundedReceiver<(TilePos, Tile)>,
    }

    impl Harness {
        fn new() -> Self {
            Self::with_store(MemoryStore::default())
        }

        fn with_store(store: MemoryStore) -> Self {
            let http = MockHttpFetcher::new();
            let store = Arc::new(store);
            let (tx, tiles) = mpsc::unbounded_channel();

            let fetcher = TileFetcher::builder(XyzTemplate::new("test", TEMPLATE).unwrap(), tx)
                .with_http_fetcher(Arc::new(http.clone()))
                .with_store(store.clone())
                .with_decoder(Arc::new(AnyBytesDecoder))
                .spawn()
                .unwrap();

            Self {
                fetcher,
                http,
                store,
                tiles,
            }
        }

        fn reply(&self, pos: TilePos, result: Result<Bytes, FetchError>) {
            self.http.respond(&url(pos), MockResponse::Reply(result));
        }

        async fn next_tile(&mut self) -> (TilePos, Tile) {
            tokio::time::timeout(Duration::from_secs(5), self.tiles.recv())
                .await
                .expect("timed out waiting for a delivery")
                .expect("sink closed")
        }

        /// Shut down and return every delivery not yet received.
        async fn finish(self) -> (Vec<(TilePos, Tile)>, MockHttpFetcher, Arc<MemoryStore>) {
            let Self {
                fetcher,
                http,
                store,
                mut tiles,
            } = self;
            fetcher.shutdown().await;

            let mut rest = Vec::new();
            while let Ok(delivery) = tiles.try_recv() {
                rest.push(delivery);
            }
            (rest, http, store)
        }
    }

    async fn eventually(condition: impl Fn() -> bool) {
        for _ in 0..500 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached");
    }

    fn status(code: u16, pos: TilePos) -> FetchError {
        FetchError::Status {
            status: code,
            url: url(pos),
        }
    }

    #[tokio::test]
    async fn test_network_success_is_delivered_and_stored() {
        let mut h = Harness::new();
        let p = pos(3, 2, 4);
        h.reply(p, Ok(Bytes::from_static(&[0x01, 0x02, 0x03])));

        h.fetcher.request(p);
        let (delivered, tile) = h.next_tile().await;

        assert_eq!(delivered, p);
        assert_eq!(tile.origin(), TileOrigin::Network);
        assert_eq!(tile.body().map(|b| b.to_vec()), Some(vec![0x01, 0x02, 0x03]));
        assert_eq!(tile.geometry(), p.geo_rect());
        assert_eq!(
            tile.debug_label(),
            Some("http://tiles.test/3/2/4.png\ntile(3,2,4)")
        );

        let (rest, _, store) = h.finish().await;
        assert!(rest.is_empty());
        assert_eq!(store.row(p), Some(vec![0x01, 0x02, 0x03]));
    }

    #[tokio::test]
    async fn test_server_error_falls_back_to_cache() {
        let p = pos(3, 2, 4);
        let mut h = Harness::with_store(MemoryStore::with_row(p, &[0xAA]));
        h.reply(p, Err(status(500, p)));

        h.fetcher.request(p);
        let (_, tile) = h.next_tile().await;

        assert_eq!(tile.origin(), TileOrigin::Cache);
        assert_eq!(tile.body().map(|b| b.to_vec()), Some(vec![0xAA]));
        assert!(tile.debug_label().is_none());

        let (rest, _, store) = h.finish().await;
        assert!(rest.is_empty());
        assert_eq!(*store.puts.lock(), 0);
        assert_eq!(store.row(p), Some(vec![0xAA]));
    }

    #[tokio::test]
    async fn test_refused_connection_with_empty_store_gives_placeholder() {
        let mut h = Harness::new();
        let p = pos(0, 0, 0);

        h.fetcher.request(p);
        let (delivered, tile) = h.next_tile().await;

        assert_eq!(delivered, p);
        assert_eq!(tile.origin(), TileOrigin::Placeholder);
        assert!(tile.body().is_none());
        assert_eq!(tile.image().width(), PLACEHOLDER_SIZE);
        assert_eq!(tile.image().height(), PLACEHOLDER_SIZE);
        assert!(Arc::ptr_eq(tile.image(), &placeholder_image()));
        assert_eq!(*tile.image().get_pixel(0, 0), Rgba([255, 0, 0, 255]));

        let (rest, _, store) = h.finish().await;
        assert!(rest.is_empty());
        assert_eq!(store.row(p), None);
    }

    #[tokio::test]
    async fn test_cancel_of_hanging_fetch_aborts_without_delivery() {
        let h = Harness::new();
        let p = pos(5, 10, 12);
        h.http.respond(&url(p), MockResponse::Hang);

        h.fetcher.request(p);
        h.fetcher.cancel(p);
        assert_eq!(h.fetcher.in_flight().await, 0);

        let http = h.http.clone();
        eventually(|| http.aborted() == 1).await;

        let (rest, http, _) = h.finish().await;
        assert!(rest.is_empty());
        assert_eq!(http.requested(), vec![url(p)]);
    }

    #[tokio::test]
    async fn test_large_body_is_delivered_intact() {
        let mut h = Harness::new();
        let p = pos(12, 2048, 1361);
        let body: Vec<u8> = (0..1024 * 1024).map(|i| (i % 251) as u8).collect();
        h.reply(p, Ok(Bytes::from(body.clone())));

        h.fetcher.request(p);
        let (_, tile) = h.next_tile().await;
        assert_eq!(tile.body().map(|b| b.len()), Some(body.len()));
        assert!(tile.body().is_some_and(|b| b[..] == body[..]));

        let (_, _, store) = h.finish().await;
        assert_eq!(store.row(p), Some(body));
    }

    #[tokio::test]
    async fn test_concurrent_requests_all_delivered() {
        let mut h = Harness::new();
        let positions: Vec<TilePos> = (0..10).map(|x| pos(4, x, 7)).collect();
        for p in &positions {
            h.reply(*p, Ok(Bytes::from(vec![p.x() as u8 + 1])));
        }

        for p in &positions {
            h.fetcher.request(*p);
        }

        let mut seen = HashSet::new();
        for _ in 0..positions.len() {
            let (p, tile) = h.next_tile().await;
            assert_eq!(tile.origin(), TileOrigin::Network);
            assert!(seen.insert(p), "tile {} delivered twice", p);
        }
        assert_eq!(h.fetcher.in_flight().await, 0);

        let (rest, _, store) = h.finish().await;
        assert!(rest.is_empty());
        assert_eq!(store.rows.lock().len(), 10);
    }

    #[tokio::test]
    async fn test_undecodable_body_is_not_stored() {
        let p = pos(2, 1, 1);
        let mut h = Harness::with_store(MemoryStore::with_row(p, &[0x42]));
        h.reply(p, Ok(Bytes::new()));

        h.fetcher.request(p);
        let (_, tile) = h.next_tile().await;
        assert_eq!(tile.origin(), TileOrigin::Cache);

        let (_, _, store) = h.finish().await;
        assert_eq!(*store.puts.lock(), 0);
    }

    #[tokio::test]
    async fn test_undecodable_cached_body_gives_placeholder() {
        let p = pos(2, 1, 1);
        let mut h = Harness::with_store(MemoryStore::with_row(p, &[]));

        h.fetcher.request(p);
        let (_, tile) = h.next_tile().await;
        assert_eq!(tile.origin(), TileOrigin::Placeholder);
    }

    #[tokio::test]
    async fn test_store_failures_never_block_delivery() {
        let mut h = Harness::with_store(MemoryStore::broken());
        let ok = pos(1, 0, 0);
        let failing = pos(1, 1, 0);
        h.reply(ok, Ok(Bytes::from_static(&[9])));
        h.reply(failing, Err(status(503, failing)));

        h.fetcher.request(ok);
        h.fetcher.request(failing);

        let mut origins = HashMap::new();
        for _ in 0..2 {
            let (p, tile) = h.next_tile().await;
            origins.insert(p, tile.origin());
        }
        assert_eq!(origins[&ok], TileOrigin::Network);
        assert_eq!(origins[&failing], TileOrigin::Placeholder);

        let (rest, _, store) = h.finish().await;
        assert!(rest.is_empty());
        assert_eq!(*store.puts.lock(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_request_fetches_once() {
        let mut h = Harness::new();
        let p = pos(6, 30, 20);
        h.http.gate(&url(p));

        h.fetcher.request(p);
        h.fetcher.request(p);
        assert_eq!(h.fetcher.in_flight().await, 1);

        h.http.release(&url(p), Ok(Bytes::from_static(&[1])));
        h.next_tile().await;

        let (rest, http, _) = h.finish().await;
        assert!(rest.is_empty());
        assert_eq!(http.requested().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_then_request_again_delivers_once() {
        let mut h = Harness::new();
        let p = pos(6, 30, 20);
        h.http.gate(&url(p));

        h.fetcher.request(p);
        h.fetcher.cancel(p);
        h.reply(p, Ok(Bytes::from_static(&[2])));
        h.fetcher.request(p);

        let (_, tile) = h.next_tile().await;
        assert_eq!(tile.body().map(|b| b.to_vec()), Some(vec![2]));

        h.http.release(&url(p), Ok(Bytes::from_static(&[1])));
        let (rest, http, _) = h.finish().await;
        assert!(rest.is_empty());
        assert_eq!(http.requested().len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_after_delivery_is_noop() {
        let mut h = Harness::new();
        let p = pos(1, 1, 1);
        h.reply(p, Ok(Bytes::from_static(&[3])));

        h.fetcher.request(p);
        h.next_tile().await;
        h.fetcher.cancel(p);
        h.fetcher.cancel(pos(1, 0, 1));

        assert_eq!(h.fetcher.in_flight().await, 0);
        let (rest, _, _) = h.finish().await;
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_aborts_pending_fetches() {
        let h = Harness::new();
        for x in 0..3 {
            let p = pos(2, x, 0);
            h.http.respond(&url(p), MockResponse::Hang);
            h.fetcher.request(p);
        }
        assert_eq!(h.fetcher.in_flight().await, 3);

        let (rest, http, _) = h.finish().await;
        assert!(rest.is_empty());
        eventually(|| http.aborted() == 3).await;
    }

    #[tokio::test]
    async fn test_dropping_fetcher_aborts_pending_fetches() {
        let h = Harness::new();
        let p = pos(2, 3, 3);
        h.http.respond(&url(p), MockResponse::Hang);
        h.fetcher.request(p);
        assert_eq!(h.fetcher.in_flight().await, 1);

        let http = h.http.clone();
        drop(h);
        eventually(|| http.aborted() == 1).await;
    }

    #[tokio::test]
    async fn test_source_name() {
        let h = Harness::new();
        assert_eq!(h.fetcher.source_name(), "test");
    }

    #[derive(Debug, Clone)]
    enum Op {
        Request(u32),
        Cancel(u32),
        Complete(u32),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u32..4).prop_map(Op::Request),
            (0u32..4).prop_map(Op::Cancel),
            (0u32..4).prop_map(Op::Complete),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        /// Completed requests deliver once, cancelled ones never, and
        /// nothing stays pending.
        #[test]
        fn prop_delivery_contract(ops in prop::collection::vec(op_strategy(), 1..40)) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async move {
                let mut h = Harness::new();
                let mut pending: HashSet<u32> = HashSet::new();
                let mut delivered = 0usize;

                for op in ops {
                    match op {
                        Op::Request(x) => {
                            let p = pos(2, x, 0);
                            if !pending.contains(&x) {
                                h.http.gate(&url(p));
                                pending.insert(x);
                            }
                            h.fetcher.request(p);
                            // Round trip through the loop so the gated
                            // fetch has started before the next gate is set.
                            h.fetcher.in_flight().await;
                        }
                        Op::Cancel(x) => {
                            h.fetcher.cancel(pos(2, x, 0));
                            pending.remove(&x);
                        }
                        Op::Complete(x) => {
                            let p = pos(2, x, 0);
                            h.http.release(&url(p), Ok(Bytes::from(vec![x as u8 + 1])));
                            if pending.remove(&x) {
                                let (got, tile) = h.next_tile().await;
                                prop_assert_eq!(got, p);
                                prop_assert_eq!(tile.origin(), TileOrigin::Network);
                                delivered += 1;
                            }
                        }
                    }
                }

                prop_assert_eq!(h.fetcher.in_flight().await, pending.len());

                let (rest, _, store) = h.finish().await;
                prop_assert!(rest.is_empty(), "unexpected deliveries: {}", rest.len());
                prop_assert!(store.rows.lock().len() <= delivered);
                Ok::<(), TestCaseError>(())
            })?;
        }
    }
}
