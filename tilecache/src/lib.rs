//! tilecache - online map tiles with an offline fallback
//!
//! Fetches raster map tiles over HTTP for a map view, keeps every fresh tile
//! in a per-source SQLite store, and, when the network fails, serves the
//! stored copy or a red "NO DATA" placeholder so the view is never left
//! waiting.
//!
//! # Components
//!
//! - [`store`]: persistent, first-write-wins tile store
//! - [`http`]: cancellable single-GET fetcher
//! - [`registry`]: in-flight requests keyed by tile
//! - [`coordinator`]: [`TileFetcher`](coordinator::TileFetcher), which ties
//!   them together and delivers tiles
//!
//! Supporting modules: [`coord`] (tile addressing), [`source`] (URL templates
//! and image decoding), [`tile`] (delivered tiles and sinks), [`placeholder`],
//! [`config`] and [`logging`].

pub mod config;
pub mod coord;
pub mod coordinator;
pub mod http;
pub mod logging;
pub mod placeholder;
pub mod registry;
pub mod source;
pub mod store;
pub mod tile;
