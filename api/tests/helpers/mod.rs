#![allow(dead_code)]

pub mod app;
pub mod ws;

pub use app::{create_session, make_test_app, send_json, send_raw};
pub use ws::{connect_ws, next_json, spawn_server};
