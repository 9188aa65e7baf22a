//! Fetch coordinator.
//!
//! The only part of the crate a map view talks to. A [`TileFetcher`] turns
//! tile requests into HTTP fetches, keeps them in the request registry while
//! they are in flight, and resolves each completion into a delivered tile:
//!
//! ```text
//!  request(pos) ──► loop ──► registry.insert ──► HTTP GET
//!                                                   │
//!  cancel(pos) ──► loop ──► registry.remove         │ completion
//!                           (aborts the GET)        ▼
//!                               loop: registry.complete(pos, id)
//!                                                   │
//!                  ┌────────────────────────────────┼──────────────────┐
//!                  ▼                                ▼                  ▼
//!              cancelled                         success             error
//!             (no delivery)               decode, deliver,      store hit? deliver
//!                                          write to store        cached : placeholder
//! ```
//!
//! The loop is one task that owns the registry; commands reach it over an
//! unbounded channel. Decoding and store access run on the blocking pool.
//!
//! # Example
//!
//! ```no_run
//! use tilecache::coord::TilePos;
//! use tilecache::coordinator::TileFetcher;
//! use tilecache::source::XyzTemplate;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let source = XyzTemplate::new("osm", "https://tile.openstreetmap.org/{z}/{x}/{y}.png")?;
//! let (tx, mut tiles) = tokio::sync::mpsc::unbounded_channel();
//! let fetcher = TileFetcher::builder(source, tx).spawn()?;
//!
//! fetcher.request(TilePos::new(3, 2, 4)?);
//! if let Some((pos, tile)) = tiles.recv().await {
//!     println!("{} served from {}", pos, tile.origin());
//! }
//! fetcher.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod daemon;
mod fetcher;
mod resolve;

pub use fetcher::{TileFetcher, TileFetcherBuilder};
