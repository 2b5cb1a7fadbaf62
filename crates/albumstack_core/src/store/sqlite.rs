//! SQLite-backed table emulator.

use super::{StoreError, StoreResult, TableKeySchema, TableStore};
use crate::native::{
    DeleteItemOutput, DeleteItemRequest, NativeItem, PutItemOutput, PutItemRequest,
    ReturnValues, ScanOutput, ScanRequest,
};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};

/// Emulates one keyed table on top of an opened emulator database.
///
/// Items are stored whole as native JSON. Scan order is `(pk, sk)` ascending.
pub struct SqliteTableStore<'conn> {
    conn: &'conn Connection,
    schema: TableKeySchema,
}

impl<'conn> SqliteTableStore<'conn> {
    /// `conn` must come from `db::open_db*` so the schema is migrated.
    pub fn new(conn: &'conn Connection, schema: TableKeySchema) -> Self {
        Self { conn, schema }
    }

    pub fn schema(&self) -> &TableKeySchema {
        &self.schema
    }

    /// Number of items currently stored in this table.
    pub fn item_count(&self) -> StoreResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM table_items WHERE table_name = ?1;",
            [self.schema.table_name.as_str()],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

impl TableStore for SqliteTableStore<'_> {
    fn put_item(&self, request: &PutItemRequest) -> StoreResult<PutItemOutput> {
        self.schema.check_table(&request.table_name)?;
        let (pk, sk) = self.schema.extract_key(&request.item, false)?;
        let item_json = serde_json::to_string(&request.item)
            .map_err(|err| StoreError::InvalidData(err.to_string()))?;

        self.conn.execute(
            "INSERT INTO table_items (table_name, pk, sk, item_json)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (table_name, pk, sk) DO UPDATE SET
                item_json = excluded.item_json,
                written_at = (strftime('%s', 'now') * 1000);",
            params![self.schema.table_name, pk, sk, item_json],
        )?;
        debug!("event=put_item module=store status=ok table={}", self.schema.table_name);

        Ok(PutItemOutput::default())
    }

    fn scan(&self, request: &ScanRequest) -> StoreResult<ScanOutput> {
        self.schema.check_table(&request.table_name)?;

        let mut stmt = self.conn.prepare(
            "SELECT item_json
             FROM table_items
             WHERE table_name = ?1
             ORDER BY pk ASC, sk ASC;",
        )?;
        let mut rows = stmt.query([self.schema.table_name.as_str()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            let item_json: String = row.get(0)?;
            items.push(parse_item(&item_json)?);
        }
        debug!(
            "event=scan module=store status=ok table={} count={}",
            self.schema.table_name,
            items.len()
        );

        Ok(ScanOutput::from_items(items))
    }

    fn delete_item(&self, request: &DeleteItemRequest) -> StoreResult<DeleteItemOutput> {
        self.schema.check_table(&request.table_name)?;
        let (pk, sk) = self.schema.extract_key(&request.key, true)?;

        let previous: Option<String> = self
            .conn
            .query_row(
                "DELETE FROM table_items
                 WHERE table_name = ?1 AND pk = ?2 AND sk = ?3
                 RETURNING item_json;",
                params![self.schema.table_name, pk, sk],
                |row| row.get(0),
            )
            .optional()?;
        debug!(
            "event=delete_item module=store status=ok table={} existed={}",
            self.schema.table_name,
            previous.is_some()
        );

        let attributes = match (request.return_values, previous) {
            (ReturnValues::AllOld, Some(item_json)) => Some(parse_item(&item_json)?),
            _ => None,
        };
        Ok(DeleteItemOutput { attributes })
    }
}

fn parse_item(item_json: &str) -> StoreResult<NativeItem> {
    serde_json::from_str(item_json).map_err(|err| StoreError::InvalidData(err.to_string()))
}
