//! The gateway translates REST-style requests into command messages on
//! a partitioned log (the write side) and into filtered queries against
//! a document-store materialized view (the read side). The URL path for
//! an aggregate has the form `[/context]/app/type[/id]`: with an id one
//! instance is addressed, without it the whole collection. Live updates
//! are arranged through a redirect handshake with an external fanout
//! service on the `/sse` and `/sse-setup` endpoints.

pub mod audit;
pub mod command;
pub mod config;
pub mod errors;
pub mod fanout;
pub mod query;
pub mod server;
pub mod prelude;
