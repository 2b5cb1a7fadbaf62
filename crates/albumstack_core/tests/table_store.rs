use albumstack_core::db::open_db_in_memory;
use albumstack_core::native::{
    AttributeValue, DeleteItemRequest, NativeItem, NativeRequest, PutItemRequest, ReturnValues,
    ScanRequest,
};
use albumstack_core::{SqliteTableStore, StoreError, TableKeySchema, TableStore};
use rusqlite::Connection;

fn schema() -> TableKeySchema {
    TableKeySchema::new("AlbumTable", "artist", "album")
}

fn item(artist: &str, album: &str) -> NativeItem {
    let mut item = NativeItem::new();
    item.insert("artist".to_string(), AttributeValue::s(artist));
    item.insert("album".to_string(), AttributeValue::s(album));
    item
}

fn put(artist: &str, album: &str) -> PutItemRequest {
    PutItemRequest {
        table_name: "AlbumTable".to_string(),
        item: item(artist, album),
    }
}

fn delete(artist: &str, album: &str, return_values: ReturnValues) -> DeleteItemRequest {
    DeleteItemRequest {
        table_name: "AlbumTable".to_string(),
        key: item(artist, album),
        return_values,
    }
}

fn scan() -> ScanRequest {
    ScanRequest {
        table_name: "AlbumTable".to_string(),
    }
}

fn store(conn: &Connection) -> SqliteTableStore<'_> {
    SqliteTableStore::new(conn, schema())
}

#[test]
fn put_then_scan_returns_items_in_key_order() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let store = store(&conn);

    store.put_item(&put("Pink Floyd", "The Wall")).expect("put should succeed");
    store.put_item(&put("Led Zeppelin", "IV")).expect("put should succeed");
    store.put_item(&put("Pink Floyd", "Animals")).expect("put should succeed");

    let output = store.scan(&scan()).expect("scan should succeed");
    assert_eq!(output.count, 3);
    let keys: Vec<(&str, &str)> = output
        .items
        .iter()
        .map(|item| {
            (
                item["artist"].as_s().expect("attribute should be S"),
                item["album"].as_s().expect("attribute should be S"),
            )
        })
        .collect();
    assert_eq!(
        keys,
        vec![
            ("Led Zeppelin", "IV"),
            ("Pink Floyd", "Animals"),
            ("Pink Floyd", "The Wall"),
        ]
    );
}

#[test]
fn put_replaces_item_with_same_key() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let store = store(&conn);

    store.put_item(&put("Pink Floyd", "Animals")).expect("put should succeed");
    let mut replacement = put("Pink Floyd", "Animals");
    replacement
        .item
        .insert("tracks".to_string(), AttributeValue::L(Vec::new()));
    store.put_item(&replacement).expect("put should succeed");

    assert_eq!(store.item_count().expect("item count should be readable"), 1);
    let output = store.scan(&scan()).expect("scan should succeed");
    assert!(output.items[0].contains_key("tracks"));
}

#[test]
fn delete_returns_prior_item_only_when_asked() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let store = store(&conn);
    store.put_item(&put("Pink Floyd", "Animals")).expect("put should succeed");
    store.put_item(&put("Pink Floyd", "Meddle")).expect("put should succeed");

    let output = store
        .delete_item(&delete("Pink Floyd", "Animals", ReturnValues::AllOld))
        .expect("delete should succeed");
    assert_eq!(output.attributes, Some(item("Pink Floyd", "Animals")));

    let output = store
        .delete_item(&delete("Pink Floyd", "Meddle", ReturnValues::None))
        .expect("delete should succeed");
    assert_eq!(output.attributes, None);
    assert_eq!(store.item_count().expect("item count should be readable"), 0);
}

#[test]
fn delete_of_missing_key_returns_no_attributes() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let store = store(&conn);

    let output = store
        .delete_item(&delete("Nobody", "Nothing", ReturnValues::AllOld))
        .expect("delete should succeed");
    assert!(output.attributes.is_none());
}

#[test]
fn rejects_unknown_table_and_bad_keys() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let store = store(&conn);

    let mut wrong_table = put("a", "b");
    wrong_table.table_name = "Other".to_string();
    assert!(matches!(
        store.put_item(&wrong_table),
        Err(StoreError::ResourceNotFound(table)) if table == "Other"
    ));

    let mut missing_sort_key = put("a", "b");
    missing_sort_key.item.remove("album");
    assert!(matches!(
        store.put_item(&missing_sort_key),
        Err(StoreError::Validation(_))
    ));
}

#[test]
fn tables_are_isolated_within_one_database() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let albums = store(&conn);
    let other = SqliteTableStore::new(&conn, TableKeySchema::new("OtherTable", "artist", "album"));

    albums.put_item(&put("Pink Floyd", "Animals")).expect("put should succeed");
    assert_eq!(albums.item_count().expect("item count should be readable"), 1);
    assert_eq!(other.item_count().expect("item count should be readable"), 0);
}

#[test]
fn execute_folds_outcomes_into_native_status() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    let store = store(&conn);

    let ok = store.execute(&NativeRequest::PutItem(put("Pink Floyd", "Animals")));
    assert_eq!(ok.status, 200);
    assert_eq!(ok.body, serde_json::json!({}));

    let mut bad = put("Pink Floyd", "Animals");
    bad.item
        .insert("artist".to_string(), AttributeValue::N("1".to_string()));
    let rejected = store.execute(&NativeRequest::PutItem(bad));
    assert_eq!(rejected.status, 400);
    assert!(rejected.body["__type"]
        .as_str()
        .expect("value should be a string")
        .ends_with("ValidationException"));

    let scanned = store.execute(&NativeRequest::Scan(scan()));
    assert_eq!(scanned.body["Count"], 1);
}

#[test]
fn corrupted_rows_surface_as_server_errors() {
    let conn = open_db_in_memory().expect("in-memory db should open");
    conn.execute(
        "INSERT INTO table_items (table_name, pk, sk, item_json) VALUES ('AlbumTable', 'a', 'b', 'not json');",
        [],
    )
    .expect("statement should execute");
    let store = store(&conn);

    let response = store.execute(&NativeRequest::Scan(scan()));
    assert_eq!(response.status, 500);
}
