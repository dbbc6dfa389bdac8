//! Client-app support: route table, build descriptor, shell rendering.
//!
//! ARCHITECTURE
//! ============
//! The browser client is a single-page app; everything the server needs to
//! know about it lives here as plain data and pure functions. `router` is
//! the client route table (used for the history-API fallback), `bundle` is
//! the resolved build plan the external bundler is driven by, and `shell`
//! turns bundle metadata into the HTML page that boots the app. None of
//! these modules touch the database or the HTTP layer.

pub mod bundle;
pub mod router;
pub mod shell;
