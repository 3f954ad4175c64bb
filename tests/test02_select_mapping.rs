#![cfg(feature = "sqlite")]

mod common;

use common::{COSAS_SCHEMA, Cosa, seed, sqlite_db};
use fluent_sql::prelude::*;

#[derive(Debug, Default)]
struct Resumen {
    categoria: String,
    total: u32,
    maximo: f64,
}

impl_record!(Resumen {
    categoria: String,
    total: u32 => "cuantos",
    maximo: f64,
});

#[derive(Debug, Default)]
struct SoloNombre {
    nombre: String,
    notas: Vec<String>,
}

impl_record!(SoloNombre {
    nombre: String,
    notas: Vec<String> => skip,
});

fn categorize(db: &Db) -> Result<(), DbError> {
    for (nombre, categoria) in [("a", "x"), ("b", "x"), ("c", "y"), ("d", "z")] {
        db.update("categorizar")
            .table("cosas")
            .columns(["categoria"])
            .values(params![categoria])
            .condition("nombre = ?", params![nombre])
            .execute()?;
    }
    Ok(())
}

#[test]
fn rows_map_into_records_in_order() -> Result<(), DbError> {
    let (_dir, db) = sqlite_db(COSAS_SCHEMA);
    seed(&db, &[("a", 1.5), ("b", 2.5), ("c", 3.5)]);

    let mut cosas: Vec<Cosa> = Vec::new();
    let n = db
        .select("caras")
        .table("cosas")
        .columns(["id", "nombre", "precio", "activo"])
        .condition("precio > ?", params![2.0])
        .order_by(["precio desc"])
        .execute(&mut cosas)?;

    assert_eq!(n, 2);
    let nombres: Vec<_> = cosas.iter().map(|c| c.nombre.as_str()).collect();
    assert_eq!(nombres, ["c", "b"]);
    assert!(cosas.iter().all(|c| c.activo));
    Ok(())
}

#[test]
fn grouped_select_with_having_and_named_columns() -> Result<(), DbError> {
    let (_dir, db) = sqlite_db(COSAS_SCHEMA);
    seed(&db, &[("a", 1.0), ("b", 4.0), ("c", 2.0), ("d", 8.0)]);
    categorize(&db)?;

    let mut resumen: Vec<Resumen> = Vec::new();
    db.select("por_categoria")
        .table("cosas")
        .columns(["categoria", "count(*) as cuantos", "max(precio) as maximo"])
        .condition("activo = ?", params![true])
        .group_by(["categoria"])
        .having("count(*) >= ?", params![2])
        .order_by(["categoria"])
        .execute(&mut resumen)?;

    assert_eq!(resumen.len(), 1);
    assert_eq!(resumen[0].categoria, "x");
    assert_eq!(resumen[0].total, 2);
    assert!((resumen[0].maximo - 4.0).abs() < f64::EPSILON);
    Ok(())
}

#[test]
fn offset_without_limit_pages_through_the_rest() -> Result<(), DbError> {
    let (_dir, db) = sqlite_db(COSAS_SCHEMA);
    seed(&db, &[("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)]);

    let select = db
        .select("")
        .table("cosas")
        .columns(["nombre"])
        .order_by(["id"])
        .offset(1);
    assert_eq!(
        select.sql()?,
        "select nombre from cosas order by id limit 2100000000 offset 1;"
    );
    let mut rest: Vec<SoloNombre> = Vec::new();
    select.execute(&mut rest)?;
    assert_eq!(rest.len(), 3);
    assert_eq!(rest[0].nombre, "b");

    let mut page: Vec<SoloNombre> = Vec::new();
    db.select("")
        .table("cosas")
        .columns(["nombre"])
        .order_by(["id"])
        .limit(2)
        .offset(2)
        .execute(&mut page)?;
    let nombres: Vec<_> = page.iter().map(|c| c.nombre.as_str()).collect();
    assert_eq!(nombres, ["c", "d"]);
    Ok(())
}

#[test]
fn unmatched_columns_are_all_reported() {
    let (_dir, db) = sqlite_db(COSAS_SCHEMA);
    seed(&db, &[("a", 1.0)]);

    let mut out: Vec<SoloNombre> = Vec::new();
    let err = db
        .select("")
        .table("cosas")
        .columns(["nombre", "precio", "categoria"])
        .execute(&mut out)
        .unwrap_err();
    assert!(err.is_missing_columns());
    assert_eq!(err.missing_columns(), ["precio", "categoria"]);
    assert!(out.is_empty());
}

#[test]
fn text_column_cannot_fill_a_number() {
    let (_dir, db) = sqlite_db(COSAS_SCHEMA);
    seed(&db, &[("a", 1.0)]);
    db.update("")
        .table("cosas")
        .columns(["categoria"])
        .values(params!["caja"])
        .condition("nombre = ?", params!["a"])
        .execute()
        .expect("categorize");

    #[derive(Debug, Default)]
    struct Categoria {
        id: i64,
        categoria: i64,
    }
    impl_record!(Categoria { id: i64, categoria: i64 });

    let mut out: Vec<Categoria> = Vec::new();
    let err = db
        .select("")
        .table("cosas")
        .columns(["id", "categoria"])
        .execute(&mut out)
        .unwrap_err();
    assert!(err.is_field_assignment_failed());
    assert_eq!(err.failed_column(), Some("categoria"));
}

#[test]
fn destination_must_start_empty() {
    let (_dir, db) = sqlite_db(COSAS_SCHEMA);
    let mut out = vec![Cosa::default()];
    let err = db
        .select("")
        .table("cosas")
        .columns(["id"])
        .execute(&mut out)
        .unwrap_err();
    assert!(err.is_destination_not_sequence());
}

#[test]
fn fetch_returns_raw_rows() -> Result<(), DbError> {
    let (_dir, db) = sqlite_db(COSAS_SCHEMA);
    seed(&db, &[("a", 1.0), ("b", 2.0)]);

    let rs = db
        .select("")
        .table("cosas")
        .columns(["nombre", "precio"])
        .order_by(["nombre desc"])
        .fetch()?;
    assert_eq!(rs.column_names(), ["nombre", "precio"]);
    assert_eq!(rs.len(), 2);
    assert_eq!(rs.results[0].get("nombre"), Some(&RowValues::Text("b".into())));
    assert_eq!(rs.results[1].get("precio"), Some(&RowValues::Float(1.0)));
    Ok(())
}

#[test]
fn select_from_missing_table_is_translated() {
    let (_dir, db) = sqlite_db(COSAS_SCHEMA);
    let err = db
        .select("")
        .table("fantasma")
        .columns(["id"])
        .fetch()
        .unwrap_err();
    assert!(err.is_table_missing());
}
