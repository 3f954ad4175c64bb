//! Vendor error translation.
//!
//! Maps a raw engine error onto one [`Reason`]. Unmapped errors become [`Reason::Uncaught`];
//! the engine error is always kept as the origin of the resulting [`DbError`].

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{DbError, DriverError, Reason};

/// Maps an engine error to a reason flag. Pluggable per target engine.
pub trait ErrorTranslator: Send + Sync {
    /// The reason for `err`, or `None` when the error is not recognised.
    fn reason_for(&self, err: &DriverError) -> Option<Reason>;
}

impl<F> ErrorTranslator for F
where
    F: Fn(&DriverError) -> Option<Reason> + Send + Sync,
{
    fn reason_for(&self, err: &DriverError) -> Option<Reason> {
        self(err)
    }
}

/// Fixed table from integer engine codes to reasons.
#[derive(Debug, Clone, Default)]
pub struct CodeTable {
    codes: HashMap<i64, Reason>,
}

impl CodeTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, code: i64, reason: Reason) -> Self {
        self.codes.insert(code, reason);
        self
    }

    /// `MySQL` / `MariaDB` server error numbers.
    #[must_use]
    pub fn mysql() -> Self {
        Self::new()
            .with(1146, Reason::TableMissing) // ER_NO_SUCH_TABLE
            .with(1054, Reason::ColumnMissing) // ER_BAD_FIELD_ERROR
            .with(1062, Reason::DuplicateKey) // ER_DUP_ENTRY
            .with(1264, Reason::ValueOutOfRange) // ER_WARN_DATA_OUT_OF_RANGE
            .with(1366, Reason::WrongScalarType) // ER_TRUNCATED_WRONG_VALUE_FOR_FIELD
            .with(3140, Reason::WrongJsonType) // ER_INVALID_JSON_TEXT
    }

    #[must_use]
    pub fn get(&self, code: i64) -> Option<Reason> {
        self.codes.get(&code).copied()
    }
}

impl ErrorTranslator for CodeTable {
    fn reason_for(&self, err: &DriverError) -> Option<Reason> {
        err.code.and_then(|code| self.get(code))
    }
}

const SQLITE_ERROR: i64 = 1;

static SQLITE_MESSAGES: LazyLock<Vec<(Regex, Reason)>> = LazyLock::new(|| {
    [
        (r"no such table", Reason::TableMissing),
        (r"no such column|has no column named", Reason::ColumnMissing),
        (r"malformed JSON|JSON cannot hold", Reason::WrongJsonType),
    ]
    .into_iter()
    .filter_map(|(pattern, reason)| Regex::new(pattern).ok().map(|re| (re, reason)))
    .collect()
});

/// `SQLite` translation: extended result codes first, then the message of generic
/// `SQLITE_ERROR` failures (missing tables and columns share that code).
#[derive(Debug, Clone)]
pub struct SqliteErrorTranslator {
    extended: CodeTable,
}

impl Default for SqliteErrorTranslator {
    fn default() -> Self {
        Self {
            extended: CodeTable::new()
                .with(2067, Reason::DuplicateKey) // SQLITE_CONSTRAINT_UNIQUE
                .with(1555, Reason::DuplicateKey) // SQLITE_CONSTRAINT_PRIMARYKEY
                .with(20, Reason::WrongScalarType) // SQLITE_MISMATCH
                .with(3091, Reason::WrongScalarType) // SQLITE_CONSTRAINT_DATATYPE
                .with(18, Reason::ValueOutOfRange), // SQLITE_TOOBIG
        }
    }
}

impl ErrorTranslator for SqliteErrorTranslator {
    fn reason_for(&self, err: &DriverError) -> Option<Reason> {
        let code = err.code?;
        if let Some(reason) = self.extended.get(code) {
            return Some(reason);
        }
        if code & 0xff != SQLITE_ERROR {
            return None;
        }
        SQLITE_MESSAGES
            .iter()
            .find(|(re, _)| re.is_match(&err.message))
            .map(|(_, reason)| *reason)
    }
}

/// Wrap a driver failure of an execute/query into a [`DbError`].
pub(crate) fn translate(translator: &dyn ErrorTranslator, err: DriverError) -> DbError {
    let reason = translator.reason_for(&err).unwrap_or(Reason::Uncaught);
    DbError::from_reason(reason).with_origin(err)
}

/// Wrap a driver failure that happened in a specific phase (prepare, begin, commit, ...).
///
/// The phase reason is always set; a recognised vendor reason is added alongside it.
pub(crate) fn translate_in(
    translator: &dyn ErrorTranslator,
    phase: Reason,
    err: DriverError,
) -> DbError {
    let mut out = DbError::from_reason(phase);
    if let Some(reason) = translator.reason_for(&err) {
        out.push(reason);
    }
    out.with_origin(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mysql_codes_map_to_reasons() {
        let table = CodeTable::mysql();
        let cases = [
            (1146, Reason::TableMissing),
            (1054, Reason::ColumnMissing),
            (1062, Reason::DuplicateKey),
            (1264, Reason::ValueOutOfRange),
            (1366, Reason::WrongScalarType),
            (3140, Reason::WrongJsonType),
        ];
        for (code, reason) in cases {
            let err = DriverError::new("mysql").with_code(code);
            assert_eq!(table.reason_for(&err), Some(reason), "code {code}");
        }
    }

    #[test]
    fn unmapped_code_is_uncaught_and_keeps_origin() {
        let err = translate(&CodeTable::mysql(), DriverError::new("gone away").with_code(2006));
        assert!(err.is_uncaught());
        assert_eq!(err.origin().unwrap().to_string(), "gone away");
    }

    #[test]
    fn sqlite_messages_resolve_generic_errors() {
        let t = SqliteErrorTranslator::default();
        let missing_table = DriverError::new("no such table: cosas").with_code(1);
        let missing_col = DriverError::new("table cosas has no column named x").with_code(1);
        let unique = DriverError::new("UNIQUE constraint failed: cosas.nombre").with_code(2067);
        let syntax = DriverError::new("near \"selec\": syntax error").with_code(1);
        assert_eq!(t.reason_for(&missing_table), Some(Reason::TableMissing));
        assert_eq!(t.reason_for(&missing_col), Some(Reason::ColumnMissing));
        assert_eq!(t.reason_for(&unique), Some(Reason::DuplicateKey));
        assert_eq!(t.reason_for(&syntax), None);
    }

    #[test]
    fn phase_reason_is_kept_next_to_vendor_reason() {
        let err = translate_in(
            &CodeTable::mysql(),
            Reason::PreparedCreateFailed,
            DriverError::new("no table").with_code(1146),
        );
        assert!(err.is_prepared_create_failed());
        assert!(err.is_table_missing());
        assert!(!err.is_uncaught());
    }

    #[test]
    fn closures_are_translators() {
        let t = |e: &DriverError| (e.code == Some(7)).then_some(Reason::DuplicateKey);
        assert!(translate(&t, DriverError::new("x").with_code(7)).is_duplicate_key());
    }
}
