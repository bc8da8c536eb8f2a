//! Write the gateway OpenAPI document as JSON
//!
//!   cargo run --bin export_openapi                      # stdout
//!   cargo run --bin export_openapi -- --output api.json # file

use anyhow::Context;
use outbox_payment_service::gateway::openapi::ApiDoc;
use utoipa::OpenApi;

fn main() -> anyhow::Result<()> {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .context("serialize OpenAPI document")?;

    let args: Vec<String> = std::env::args().collect();
    match args.iter().position(|a| a == "--output") {
        Some(i) => {
            let path = args.get(i + 1).context("--output requires a path")?;
            std::fs::write(path, &json).with_context(|| format!("write {}", path))?;
            eprintln!("OpenAPI document written to {}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
