//! Interactive mode for the server.
//!
//! Prompts for the dataset file, bind address, and port before starting
//! the server. Values from the environment are offered as defaults.

use std::path::PathBuf;

use dialoguer::{Confirm, Input};

use crate::{ServerConfig, ServerError};

/// Runs the server in interactive mode, prompting for configuration.
///
/// # Errors
///
/// Returns [`ServerError`] if the dataset cannot be loaded or the server
/// fails to start.
#[allow(clippy::future_not_send)]
pub async fn run() -> Result<(), ServerError> {
    println!("Incident Dashboard Server");
    println!();

    let mut config = ServerConfig::from_env();
    let definition = config.dataset_definition()?;

    let data_path: String = Input::new()
        .with_prompt("Incident file")
        .default(definition.path.display().to_string())
        .interact_text()
        .unwrap_or_else(|_| definition.path.display().to_string());

    config.bind_addr = Input::new()
        .with_prompt("Bind address")
        .default(config.bind_addr.clone())
        .interact_text()
        .unwrap_or(config.bind_addr);

    config.port = Input::new()
        .with_prompt("Port")
        .default(config.port)
        .interact_text()
        .unwrap_or(config.port);

    config.data_path = Some(PathBuf::from(data_path));

    if !Confirm::new()
        .with_prompt(format!(
            "Start server on {}:{}?",
            config.bind_addr, config.port
        ))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_with(config).await
}
