//! Single `/ws` socket per client, multiplexing any number of session feeds.

pub mod mux;
pub mod types;
