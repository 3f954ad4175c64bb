use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};

use chrono::NaiveDateTime;

/// Closed set of field kinds a record may declare.
///
/// `Record` and `Unsupported` exist so a description can name a field the mapper must refuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Bool,
    Text,
    DateTime,
    /// A nested record. Never mapped.
    Record,
    /// Any other Rust type. Never mapped.
    Unsupported,
}

/// A coerced value, tagged with its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Bool(bool),
    Text(String),
    DateTime(NaiveDateTime),
}

/// Scalar Rust types a record field may have.
pub trait ColumnValue: Sized {
    const KIND: FieldKind;

    /// Unwrap a value of this type's kind; `None` for any other kind.
    fn from_field_value(value: FieldValue) -> Option<Self>;
}

macro_rules! column_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl ColumnValue for $ty {
                const KIND: FieldKind = FieldKind::$variant;

                fn from_field_value(value: FieldValue) -> Option<Self> {
                    match value {
                        FieldValue::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

column_value! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    bool => Bool,
    String => Text,
    NaiveDateTime => DateTime,
}

/// How a field is bound to a result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnBinding {
    /// Bound to the lowercased field identifier.
    Default,
    /// Bound to an explicitly named column.
    Named(&'static str),
    /// Never bound.
    Skip,
}

/// Assigns a coerced value to one field; hands the value back if its kind does not fit.
pub type FieldSetter<T> = fn(&mut T, FieldValue) -> Result<(), FieldValue>;

/// Description of one record field: identifier, column binding, kind and setter.
pub struct FieldSpec<T> {
    pub ident: &'static str,
    pub binding: ColumnBinding,
    pub kind: FieldKind,
    pub setter: FieldSetter<T>,
}

impl<T> FieldSpec<T> {
    #[must_use]
    pub fn new(
        ident: &'static str,
        binding: ColumnBinding,
        kind: FieldKind,
        setter: FieldSetter<T>,
    ) -> Self {
        Self {
            ident,
            binding,
            kind,
            setter,
        }
    }

    /// A field excluded from mapping.
    #[must_use]
    pub fn skipped(ident: &'static str) -> Self {
        Self::new(ident, ColumnBinding::Skip, FieldKind::Unsupported, |_, v| Err(v))
    }

    /// Result column this field binds to, or `None` when skipped.
    #[must_use]
    pub fn column_name(&self) -> Option<String> {
        match self.binding {
            ColumnBinding::Default => Some(self.ident.to_lowercase()),
            ColumnBinding::Named(name) => Some(name.trim().to_string()),
            ColumnBinding::Skip => None,
        }
    }
}

impl<T> Clone for FieldSpec<T> {
    fn clone(&self) -> Self {
        Self {
            ident: self.ident,
            binding: self.binding,
            kind: self.kind,
            setter: self.setter,
        }
    }
}

impl<T> std::fmt::Debug for FieldSpec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldSpec")
            .field("ident", &self.ident)
            .field("binding", &self.binding)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// A record type the mapper can fill from result rows.
///
/// Usually implemented with [`impl_record!`](crate::impl_record).
pub trait Record: Default + 'static {
    fn fields() -> Vec<FieldSpec<Self>>;
}

type DescriptionMap = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

static DESCRIPTIONS: LazyLock<Mutex<DescriptionMap>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Field descriptions of `T`, computed once per type.
pub(crate) fn describe<T: Record>() -> Arc<Vec<FieldSpec<T>>> {
    let mut map = match DESCRIPTIONS.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    let entry = map
        .entry(TypeId::of::<T>())
        .or_insert_with(|| Arc::new(T::fields()) as Arc<dyn Any + Send + Sync>);
    match Arc::clone(entry).downcast::<Vec<FieldSpec<T>>>() {
        Ok(specs) => specs,
        // keyed by TypeId, so the stored value is always a Vec<FieldSpec<T>>
        Err(_) => Arc::new(T::fields()),
    }
}

/// Implement [`Record`] for a struct by listing its fields.
///
/// Each field is `name: Type`, optionally followed by `=> "column"` to bind it to a named
/// column or `=> skip` to exclude it. Unannotated fields bind to their lowercased name.
/// ```rust
/// use fluent_sql::impl_record;
///
/// #[derive(Debug, Default)]
/// struct Thing {
///     id: i64,
///     name: String,
///     active: bool,
///     scratch: Vec<u8>,
/// }
///
/// impl_record!(Thing {
///     id: i64,
///     name: String => "nombre",
///     active: bool => "es_activo",
///     scratch: Vec<u8> => skip,
/// });
/// ```
#[macro_export]
macro_rules! impl_record {
    (@spec $ty:ty, $field:ident, $fty:ty, skip) => {
        $crate::mapper::FieldSpec::<$ty>::skipped(stringify!($field))
    };
    (@spec $ty:ty, $field:ident, $fty:ty, $col:literal) => {
        $crate::impl_record!(@setter $ty, $field, $fty, $crate::mapper::ColumnBinding::Named($col))
    };
    (@spec $ty:ty, $field:ident, $fty:ty) => {
        $crate::impl_record!(@setter $ty, $field, $fty, $crate::mapper::ColumnBinding::Default)
    };
    (@setter $ty:ty, $field:ident, $fty:ty, $binding:expr) => {
        $crate::mapper::FieldSpec::<$ty>::new(
            stringify!($field),
            $binding,
            <$fty as $crate::mapper::ColumnValue>::KIND,
            |record: &mut $ty, value: $crate::mapper::FieldValue| {
                record.$field =
                    <$fty as $crate::mapper::ColumnValue>::from_field_value(value.clone())
                        .ok_or(value)?;
                Ok(())
            },
        )
    };
    ($ty:ty { $($field:ident : $fty:ty $(=> $col:tt)?),* $(,)? }) => {
        impl $crate::mapper::Record for $ty {
            fn fields() -> ::std::vec::Vec<$crate::mapper::FieldSpec<Self>> {
                ::std::vec![
                    $($crate::impl_record!(@spec $ty, $field, $fty $(, $col)?)),*
                ]
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Thing {
        id: i64,
        nombre: String,
        es_activo: bool,
        notes: Vec<u8>,
    }

    crate::impl_record!(Thing {
        id: i64,
        nombre: String => "name",
        es_activo: bool => " active ",
        notes: Vec<u8> => skip,
    });

    #[test]
    fn bindings_follow_annotations() {
        let specs = describe::<Thing>();
        let columns: Vec<_> = specs.iter().map(FieldSpec::column_name).collect();
        assert_eq!(
            columns,
            vec![
                Some("id".to_string()),
                Some("name".to_string()),
                Some("active".to_string()),
                None
            ]
        );
        assert_eq!(specs[0].kind, FieldKind::I64);
        assert_eq!(specs[2].kind, FieldKind::Bool);
    }

    #[test]
    fn setters_assign_matching_kinds_only() {
        let specs = describe::<Thing>();
        let mut thing = Thing::default();
        (specs[0].setter)(&mut thing, FieldValue::I64(7)).unwrap();
        (specs[1].setter)(&mut thing, FieldValue::Text("x".into())).unwrap();
        assert_eq!(thing.id, 7);
        assert_eq!(thing.nombre, "x");
        assert!((specs[2].setter)(&mut thing, FieldValue::I64(1)).is_err());
    }

    #[test]
    fn description_is_shared_between_calls() {
        let a = describe::<Thing>();
        let b = describe::<Thing>();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
