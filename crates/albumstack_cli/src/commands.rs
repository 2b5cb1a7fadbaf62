//! Subcommand definitions and handlers.

use albumstack_core::db::{open_db, open_db_in_memory};
use albumstack_core::{
    Gateway, GatewayRequest, GatewayResponse, SqliteTableStore, StackConfig, StackManifest,
};
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use log::info;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print core linkage information.
    Ping,
    /// Print the declared resource graph as JSON.
    Synth(ConfigArgs),
    /// Check the declared resource graph and print a summary.
    Validate(ConfigArgs),
    /// Send one request through the local gateway emulator.
    Invoke(InvokeArgs),
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// RON config file; `ALBUMSTACK_*` variables override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct InvokeArgs {
    /// HTTP method, e.g. GET, POST, DELETE.
    pub method: String,
    /// Request path, e.g. `/delete-album/Pink%20Floyd/Animals`.
    pub path: String,
    /// JSON request body.
    #[arg(long)]
    pub body: Option<String>,
    /// Emulator database file; an in-memory table is used when omitted.
    #[arg(long, env = "ALBUMSTACK_DB")]
    pub db: Option<PathBuf>,
    #[command(flatten)]
    pub config: ConfigArgs,
}

fn load_manifest(args: &ConfigArgs) -> Result<StackManifest> {
    let config = StackConfig::load(args.config.as_deref()).context("loading stack config")?;
    Ok(StackManifest::declare(&config))
}

pub fn ping() -> Result<()> {
    println!("albumstack_core ping={}", albumstack_core::ping());
    println!("albumstack_core version={}", albumstack_core::core_version());
    Ok(())
}

pub fn synth(args: &ConfigArgs) -> Result<()> {
    let manifest = load_manifest(args)?;
    manifest.validate().context("manifest validation")?;
    println!("{}", manifest.synthesize()?);
    Ok(())
}

pub fn validate(args: &ConfigArgs) -> Result<()> {
    let manifest = load_manifest(args)?;
    manifest.validate().context("manifest validation")?;
    println!("manifest ok");
    for (kind, count) in manifest.resource_summary() {
        println!("  {kind}: {count}");
    }
    for route in &manifest.api.routes {
        println!("  route {} -> {:?}", route.route_key(), route.action);
    }
    Ok(())
}

pub fn invoke(args: &InvokeArgs) -> Result<()> {
    let response = send(args)?;

    println!("status: {}", response.status);
    for (name, value) in &response.headers {
        println!("{name}: {value}");
    }
    if let Some(body) = &response.body {
        println!();
        println!("{}", serde_json::to_string_pretty(body)?);
    }
    Ok(())
}

/// Runs one request through a gateway whose telemetry goes to the log sinks.
fn send(args: &InvokeArgs) -> Result<GatewayResponse> {
    let manifest = load_manifest(&args.config)?;
    let conn = match &args.db {
        Some(path) => open_db(path)
            .with_context(|| format!("opening emulator database `{}`", path.display()))?,
        None => open_db_in_memory().context("opening in-memory emulator database")?,
    };
    let store = SqliteTableStore::new(&conn, manifest.table.key_schema());
    let gateway = Gateway::new(manifest, store).context("manifest validation")?;

    let mut request = GatewayRequest::new(args.method.as_str(), args.path.as_str());
    if let Some(body) = &args.body {
        request = request.with_body(body.as_str());
    }
    let response = gateway.handle(&request);
    info!(
        "event=cli_invoke module=cli status={} method={} path={}",
        response.status, args.method, args.path
    );
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::{send, ConfigArgs, InvokeArgs};
    use std::path::Path;

    fn invoke_args(method: &str, path: &str, body: Option<&str>, db: &Path) -> InvokeArgs {
        InvokeArgs {
            method: method.to_string(),
            path: path.to_string(),
            body: body.map(str::to_string),
            db: Some(db.to_path_buf()),
            config: ConfigArgs { config: None },
        }
    }

    #[test]
    fn invoke_persists_items_across_runs_in_the_same_database() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let db = dir.path().join("emulator.db");

        let created = send(&invoke_args(
            "POST",
            "/create-album",
            Some(r#"{"artist": "Pink Floyd", "album": "Animals"}"#),
            &db,
        ))
        .expect("create should run");
        assert_eq!(created.status, 204);
        assert!(created.body.is_none());

        let listed = send(&invoke_args("GET", "/", None, &db)).expect("list should run");
        assert_eq!(listed.status, 200);
        assert_eq!(
            listed.body,
            Some(serde_json::json!([
                {"artist": "Pink Floyd", "album": "Animals", "tracks": []}
            ]))
        );

        let deleted = send(&invoke_args(
            "DELETE",
            "/delete-album/Pink%20Floyd/Animals",
            None,
            &db,
        ))
        .expect("delete should run");
        assert_eq!(deleted.status, 200);
    }

    #[test]
    fn invoke_reports_unknown_routes_and_missing_albums() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let db = dir.path().join("emulator.db");

        let unknown =
            send(&invoke_args("GET", "/albums", None, &db)).expect("request should run");
        assert_eq!(unknown.status, 403);

        let missing = send(&invoke_args("DELETE", "/delete-album/Nobody/Nothing", None, &db))
            .expect("request should run");
        assert_eq!(missing.status, 404);
    }

    #[test]
    fn invoke_fails_on_unreadable_config() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let mut args = invoke_args("GET", "/", None, &dir.path().join("emulator.db"));
        args.config.config = Some(dir.path().join("missing.ron"));

        let err = send(&args).expect_err("missing config should fail");
        assert!(err.to_string().contains("loading stack config"));
    }
}
