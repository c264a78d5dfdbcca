//! Gallery Timeless - server-rendered photo gallery
//!
//! A small session-backed web application: visitors register or log in,
//! and the gallery page is only served to an authenticated session.
//!
//! ## Services
//!
//! - **Server**: hyper HTTP front end with the route table
//! - **Auth**: argon2id credential store over MongoDB
//! - **Session**: signed-cookie sessions persisted in MongoDB with a TTL index
//! - **Views**: server-rendered HTML pages

pub mod auth;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod session;
pub mod types;
pub mod validation;
pub mod views;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{AppError, Result};
