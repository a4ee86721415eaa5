//! One-shot message command.

use std::io::Read;

use crate::config::Settings;
use crate::messaging::{parse_request, Dispatcher};

use crate::cli::helpers::build_scraper;

/// Answer one JSON request and print the JSON response.
pub async fn cmd_message(settings: &Settings, request: &str) -> anyhow::Result<()> {
    let raw = if request == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        request.to_string()
    };

    let response = match parse_request(&raw) {
        Ok(request) => Dispatcher::new(build_scraper(settings)?).request(request).await,
        Err(response) => response,
    };
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
