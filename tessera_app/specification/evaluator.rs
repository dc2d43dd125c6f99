use std::cmp::Ordering;

use tessera_core::{AppError, ApplicationError};

use crate::specification::{Fields, Specification};

fn check_fields<T: Fields>(
    spec: &Specification<T>,
    entity: &'static str,
) -> Result<(), ApplicationError> {
    let unknown = spec
        .filters()
        .iter()
        .find_map(|p| p.unresolved_field::<T>())
        .or_else(|| {
            spec.order()
                .iter()
                .map(|o| &o.field)
                .find(|f| f.resolve(T::fields()).is_none())
        });

    match unknown {
        Some(path) => Err(AppError::UnknownField {
            entity,
            path: path.to_string(),
        }
        .into()),
        None => Ok(()),
    }
}

/// Runs a specification over in-memory items: filter, stable sort, then
/// skip/take. Unknown filter or order fields are an error.
pub fn evaluate<T, I>(
    spec: &Specification<T>,
    items: I,
    entity: &'static str,
) -> Result<Vec<T>, ApplicationError>
where
    T: Fields,
    I: IntoIterator<Item = T>,
{
    check_fields(spec, entity)?;

    let mut matched: Vec<T> = items
        .into_iter()
        .filter(|item| spec.filters().iter().all(|p| p.matches(item)))
        .collect();

    if !spec.order().is_empty() {
        matched.sort_by(|a, b| {
            spec.order()
                .iter()
                .map(|clause| {
                    let left = clause.field.read(a).unwrap_or_default();
                    let right = clause.field.read(b).unwrap_or_default();
                    let ordering = left.sort_cmp(&right);
                    if clause.direction.is_descending() {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                })
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
    }

    Ok(match spec.paging() {
        Some(paging) => matched
            .into_iter()
            .skip(usize::try_from(paging.skip).unwrap_or(usize::MAX))
            .take(usize::try_from(paging.take).unwrap_or(usize::MAX))
            .collect(),
        None => matched,
    })
}

/// Number of items matching the filters, ignoring order and paging.
pub fn count_matching<'a, T, I>(
    spec: &Specification<T>,
    items: I,
    entity: &'static str,
) -> Result<u64, ApplicationError>
where
    T: Fields + 'a,
    I: IntoIterator<Item = &'a T>,
{
    check_fields(spec, entity)?;
    Ok(items
        .into_iter()
        .filter(|item| spec.filters().iter().all(|p| p.matches(*item)))
        .count() as u64)
}
