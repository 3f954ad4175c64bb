#![allow(dead_code)]

use fluent_sql::prelude::*;
use r2d2_sqlite::rusqlite;
use tempfile::{TempDir, tempdir};

pub const COSAS_SCHEMA: &str = "CREATE TABLE cosas (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    nombre TEXT NOT NULL UNIQUE,
    precio REAL NOT NULL DEFAULT 0,
    activo INTEGER NOT NULL DEFAULT 1,
    categoria TEXT
);";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Cosa {
    pub id: i64,
    pub nombre: String,
    pub precio: f64,
    pub activo: bool,
}

impl_record!(Cosa {
    id: i64,
    nombre: String,
    precio: f64,
    activo: bool,
});

/// A fresh on-disk database with `schema` applied. Keep the `TempDir` alive for the test.
pub fn sqlite_db(schema: &str) -> (TempDir, Db) {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("fluent.db");
    let conn = rusqlite::Connection::open(&path).expect("open sqlite file");
    conn.execute_batch(schema).expect("apply schema");
    drop(conn);

    let db = Db::sqlite_builder(path.to_string_lossy())
        .max_size(4)
        .build()
        .expect("open pool");
    (dir, db)
}

pub fn seed(db: &Db, rows: &[(&str, f64)]) {
    for (nombre, precio) in rows {
        db.insert("seed_cosa")
            .table("cosas")
            .columns(["nombre", "precio"])
            .values(params![*nombre, *precio])
            .execute()
            .expect("seed row");
    }
}

pub fn count(db: &Db) -> i64 {
    let rs = db
        .select("count_cosas")
        .table("cosas")
        .columns(["count(*) as n"])
        .fetch()
        .expect("count");
    *rs.results[0].get("n").and_then(RowValues::as_int).expect("integer count")
}
