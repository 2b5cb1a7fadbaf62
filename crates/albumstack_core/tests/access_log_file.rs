use albumstack_core::db::open_db_in_memory;
use albumstack_core::gateway::REQUEST_ID_HEADER;
use albumstack_core::logging::access_log_target;
use albumstack_core::{
    flush_logging, init_logging, Gateway, GatewayRequest, SqliteTableStore, StackConfig,
    StackManifest,
};
use serde_json::Value;
use std::fs;
use std::path::Path;

fn read_logs(dir: &Path, access: bool) -> String {
    let mut contents = String::new();
    for entry in fs::read_dir(dir).expect("log dir should be readable") {
        let path = entry.expect("dir entry should be readable").path();
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();
        if name.ends_with(".log") && name.contains("_access") == access {
            contents.push_str(&fs::read_to_string(&path).expect("log file should be readable"));
        }
    }
    contents
}

// Starts the global logger, so it is the only test in this binary.
#[test]
fn file_logging_writes_access_records_and_trace_segments() {
    let dir = tempfile::tempdir().expect("temp dir should be created");
    let log_dir = dir
        .path()
        .to_str()
        .expect("temp dir should be valid UTF-8")
        .to_string();
    init_logging("info", &log_dir).expect("file logging should start");
    assert_eq!(access_log_target(), "{access}");

    let conn = open_db_in_memory().expect("in-memory db should open");
    let manifest = StackManifest::declare(&StackConfig::default());
    let declared: Vec<String> = manifest.api.stage.access_log.format.keys().cloned().collect();
    let store = SqliteTableStore::new(&conn, manifest.table.key_schema());
    let gateway = Gateway::new(manifest, store).expect("declared manifest should be valid");

    let listed = gateway.handle(&GatewayRequest::new("GET", "/"));
    let rejected = gateway.handle(&GatewayRequest::new("GET", "/albums"));
    flush_logging();

    let access = read_logs(dir.path(), true);
    let records: Vec<Value> = access
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).expect("access line should be one JSON record"))
        .collect();
    assert_eq!(records.len(), 2);

    let mut emitted: Vec<String> = records[0]
        .as_object()
        .expect("access record should be an object")
        .keys()
        .cloned()
        .collect();
    emitted.sort();
    assert_eq!(emitted, declared);
    assert_eq!(
        records[0]["requestId"].as_str(),
        listed.header(REQUEST_ID_HEADER)
    );
    assert_eq!(records[0]["status"], 200);
    assert_eq!(
        records[1]["requestId"].as_str(),
        rejected.header(REQUEST_ID_HEADER)
    );
    assert_eq!(records[1]["status"], 403);

    let diagnostics = read_logs(dir.path(), false);
    assert_eq!(diagnostics.matches("\"trace_id\"").count(), 2);
    assert!(diagnostics.contains("event=gateway_request"));
    assert!(!diagnostics.contains("\"requestId\""));
}
