//! Interactive mode for the server.
//!
//! Prompts for the bind address, port and data directory before starting
//! the server.

use dialoguer::{Confirm, Input};

/// Runs the server in interactive mode, prompting for configuration.
///
/// Asks the user for a bind address, port and data directory, sets the
/// corresponding environment variables (`BIND_ADDR`, `PORT`,
/// `BASURANT_DATA_DIR`), and delegates to [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the underlying server fails to
/// start.
#[allow(clippy::future_not_send)]
pub async fn run() -> std::io::Result<()> {
    println!("BasuRANT Report Server");
    println!();

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default("127.0.0.1".to_string())
        .interact_text()
        .unwrap_or_else(|_| "127.0.0.1".to_string());

    let port_str: String = Input::new()
        .with_prompt("Port")
        .default("3000".to_string())
        .interact_text()
        .unwrap_or_else(|_| "3000".to_string());

    let data_dir: String = Input::new()
        .with_prompt("Data directory")
        .default(basurant_store::paths::data_dir().display().to_string())
        .interact_text()
        .unwrap_or_else(|_| "data".to_string());

    // SAFETY: We are single-threaded at this point (before server starts) and
    // these variables are only read once during server initialisation.
    unsafe {
        std::env::set_var("BIND_ADDR", &bind_addr);
        std::env::set_var("PORT", &port_str);
        std::env::set_var(basurant_store::paths::DATA_DIR_ENV, &data_dir);
    }

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port_str}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server().await
}
