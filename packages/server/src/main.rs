#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the incident dashboard.
//!
//! Configured through `BIND_ADDR`, `PORT`, `GTD_DATA_PATH`, and
//! `GTD_CONFIG`. Pass `--interactive` to be prompted instead.

#[actix_web::main]
async fn main() -> Result<(), gtd_server::ServerError> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let result = if std::env::args().any(|arg| arg == "--interactive") {
        gtd_server::interactive::run().await
    } else {
        gtd_server::run_server().await
    };

    if let Err(e) = &result {
        log::error!("Server failed: {e}");
    }

    result
}
