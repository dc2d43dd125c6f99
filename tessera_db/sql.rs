//! Translation of [`Specification`]s into Postgres queries.
//!
//! Every value is bound as a parameter; only column and table names, which
//! come from static descriptor tables, are written into the SQL text.
//! Null handling follows the in-memory evaluator: `= NULL` and `<> NULL`
//! become `IS [NOT] NULL`, any other comparison against null is unknown.
//! Ascending order puts nulls first and descending order puts them last,
//! the same as the evaluator's sort.

use sqlx::{Postgres, QueryBuilder};

use tessera_app::specification::{CompareOp, FieldPath, FieldValue, Predicate, Specification};
use tessera_core::{AppError, ApplicationError, DbError};

use crate::repository::PgEntity;

/// Storage column behind `path`. Nested and computed fields can't be
/// translated.
pub fn column_of<T: PgEntity>(path: &FieldPath) -> Result<&'static str, ApplicationError> {
    let chain = path.resolve(T::fields()).ok_or_else(|| {
        ApplicationError::from(AppError::UnknownField {
            entity: T::NAME,
            path: path.to_string(),
        })
    })?;

    match chain.as_slice() {
        [descriptor] => descriptor.column.ok_or_else(|| unsupported::<T>(path)),
        _ => Err(unsupported::<T>(path)),
    }
}

fn unsupported<T: PgEntity>(path: &FieldPath) -> ApplicationError {
    DbError::UnsupportedField {
        entity: T::NAME,
        path: path.to_string(),
    }
    .into()
}

pub fn id_column<T: PgEntity>() -> Result<&'static str, ApplicationError> {
    column_of::<T>(&FieldPath::from(T::ID_FIELD))
}

/// Binds `value`; nulls are written as a literal so they take the type of
/// whatever they're compared with or inserted into.
pub fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: &FieldValue) {
    match value {
        FieldValue::Null => builder.push("NULL"),
        FieldValue::Bool(v) => builder.push_bind(*v),
        FieldValue::Int(v) => builder.push_bind(*v),
        FieldValue::Float(v) => builder.push_bind(*v),
        FieldValue::Text(v) => builder.push_bind(v.clone()),
        FieldValue::Uuid(v) => builder.push_bind(*v),
        FieldValue::Timestamp(v) => builder.push_bind(*v),
    };
}

/// Escapes `LIKE` wildcards so `needle` matches literally.
pub fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

pub fn push_predicate<T: PgEntity>(
    builder: &mut QueryBuilder<'_, Postgres>,
    predicate: &Predicate,
) -> Result<(), ApplicationError> {
    match predicate {
        Predicate::Compare { field, op, value } => {
            let column = column_of::<T>(field)?;
            builder.push(column);
            match (op, value.is_null()) {
                (CompareOp::Eq, true) => {
                    builder.push(" IS NULL");
                }
                (CompareOp::Ne, true) => {
                    builder.push(" IS NOT NULL");
                }
                _ => {
                    builder.push(" ").push(op.as_sql()).push(" ");
                    push_value(builder, value);
                }
            }
        }
        Predicate::Contains { field, needle } => {
            let column = column_of::<T>(field)?;
            builder
                .push(column)
                .push(" ILIKE ")
                .push_bind(format!("%{}%", escape_like(needle)))
                .push(" ESCAPE '\\'");
        }
        Predicate::IsNull(field) => {
            let column = column_of::<T>(field)?;
            builder.push(column).push(" IS NULL");
        }
        Predicate::And(parts) => push_group::<T>(builder, parts, " AND ", "TRUE")?,
        Predicate::Or(parts) => push_group::<T>(builder, parts, " OR ", "FALSE")?,
        Predicate::Not(inner) => {
            builder.push("NOT (");
            push_predicate::<T>(builder, inner)?;
            builder.push(")");
        }
    }
    Ok(())
}

fn push_group<T: PgEntity>(
    builder: &mut QueryBuilder<'_, Postgres>,
    parts: &[Predicate],
    separator: &str,
    empty: &str,
) -> Result<(), ApplicationError> {
    if parts.is_empty() {
        builder.push(empty);
        return Ok(());
    }

    builder.push("(");
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            builder.push(separator);
        }
        push_predicate::<T>(builder, part)?;
    }
    builder.push(")");
    Ok(())
}

fn push_where<T: PgEntity>(
    builder: &mut QueryBuilder<'_, Postgres>,
    spec: &Specification<T>,
) -> Result<(), ApplicationError> {
    for (i, predicate) in spec.filters().iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        push_predicate::<T>(builder, predicate)?;
    }
    Ok(())
}

fn push_order<T: PgEntity>(
    builder: &mut QueryBuilder<'_, Postgres>,
    spec: &Specification<T>,
) -> Result<(), ApplicationError> {
    for (i, clause) in spec.order().iter().enumerate() {
        let column = column_of::<T>(&clause.field)?;
        builder
            .push(if i == 0 { " ORDER BY " } else { ", " })
            .push(column)
            .push(if clause.direction.is_descending() {
                " DESC NULLS LAST"
            } else {
                " ASC NULLS FIRST"
            });
    }
    Ok(())
}

/// `SELECT` of the entity's columns with filters, order and paging.
/// Includes need no join: every mapped entity is read from a single table.
pub fn select_query<T: PgEntity>(
    spec: &Specification<T>,
) -> Result<QueryBuilder<'static, Postgres>, ApplicationError> {
    let mut builder = QueryBuilder::new("SELECT ");
    builder
        .push(T::COLUMNS.join(", "))
        .push(" FROM ")
        .push(T::TABLE);

    push_where(&mut builder, spec)?;
    push_order(&mut builder, spec)?;

    if let Some(paging) = spec.paging() {
        builder
            .push(" LIMIT ")
            .push_bind(to_i64(paging.take))
            .push(" OFFSET ")
            .push_bind(to_i64(paging.skip));
    }

    Ok(builder)
}

/// `COUNT(*)` over the specification's filters; order and paging are ignored.
pub fn count_query<T: PgEntity>(
    spec: &Specification<T>,
) -> Result<QueryBuilder<'static, Postgres>, ApplicationError> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM ");
    builder.push(T::TABLE);
    push_where(&mut builder, spec)?;
    Ok(builder)
}

pub fn exists_query<T: PgEntity>(
    spec: &Specification<T>,
) -> Result<QueryBuilder<'static, Postgres>, ApplicationError> {
    let mut builder = QueryBuilder::new("SELECT EXISTS (SELECT 1 FROM ");
    builder.push(T::TABLE);
    push_where(&mut builder, spec)?;
    builder.push(")");
    Ok(builder)
}

/// Postgres rejects statements with more bind parameters than this.
pub const MAX_BIND_PARAMS: usize = 65_535;
/// Rows per `INSERT` when the column count allows it.
pub const BATCH_SIZE: usize = 1_000;

/// Rows that fit in one `INSERT` of `T`, even with every column bound.
pub fn insert_batch_size<T: PgEntity>() -> usize {
    BATCH_SIZE.min(MAX_BIND_PARAMS / T::COLUMNS.len().max(1)).max(1)
}

/// Multi-row `INSERT` of `entities`, all of the same shape. `entities` must
/// not be empty; see [`insert_queries`] for batches of any size.
pub fn insert_query<T: PgEntity>(entities: &[T]) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("INSERT INTO ");
    builder
        .push(T::TABLE)
        .push(" (")
        .push(T::COLUMNS.join(", "))
        .push(") ");

    builder.push_values(entities.iter().map(T::to_columns), |mut row, columns| {
        for (_, value) in columns {
            match value {
                FieldValue::Null => row.push("NULL"),
                FieldValue::Bool(v) => row.push_bind(v),
                FieldValue::Int(v) => row.push_bind(v),
                FieldValue::Float(v) => row.push_bind(v),
                FieldValue::Text(v) => row.push_bind(v),
                FieldValue::Uuid(v) => row.push_bind(v),
                FieldValue::Timestamp(v) => row.push_bind(v),
            };
        }
    });

    builder
}

/// One `INSERT` per [`insert_batch_size`] rows.
pub fn insert_queries<T: PgEntity>(entities: &[T]) -> Vec<QueryBuilder<'static, Postgres>> {
    entities
        .chunks(insert_batch_size::<T>())
        .map(insert_query)
        .collect()
}

pub fn update_query<T: PgEntity>(
    entity: &T,
) -> Result<QueryBuilder<'static, Postgres>, ApplicationError> {
    let id_column = id_column::<T>()?;
    let mut builder = QueryBuilder::new("UPDATE ");
    builder.push(T::TABLE).push(" SET ");

    let assignments = entity
        .to_columns()
        .into_iter()
        .filter(|(name, _)| *name != id_column);
    for (i, (name, value)) in assignments.enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(name).push(" = ");
        push_value(&mut builder, &value);
    }

    builder.push(" WHERE ").push(id_column).push(" = ");
    push_value(&mut builder, &entity.id().clone().into());
    Ok(builder)
}

pub fn delete_query<T: PgEntity>(
    entities: &[T],
) -> Result<QueryBuilder<'static, Postgres>, ApplicationError> {
    let id_column = id_column::<T>()?;
    let mut builder = QueryBuilder::new("DELETE FROM ");
    builder.push(T::TABLE).push(" WHERE ").push(id_column).push(" IN (");
    for (i, entity) in entities.iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        push_value(&mut builder, &entity.id().clone().into());
    }
    builder.push(")");
    Ok(builder)
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
