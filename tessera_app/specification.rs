//! Query specifications: an immutable bundle of filters, includes, ordering
//! and paging that repositories turn into an actual query.
//!
//! Every builder method consumes the specification and returns a new one,
//! carrying over whatever was already there.

mod evaluator;
mod fields;
mod predicate;

pub use evaluator::*;
pub use fields::*;
pub use predicate::*;

use std::{fmt, marker::PhantomData};

use tessera_types::grid::{PageRequest, PagedAndSortedRequest, SortDirection};

use crate::repository::Entity;

#[derive(Debug, Clone, PartialEq)]
pub struct OrderClause {
    pub field: FieldPath,
    pub direction: SortDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub skip: u64,
    pub take: u64,
}

/// Entities that support free-text search build their own filter.
pub trait Searchable {
    fn search_predicate(term: &str) -> Predicate;
}

pub struct Specification<T> {
    filters: Vec<Predicate>,
    includes: Vec<String>,
    order: Vec<OrderClause>,
    paging: Option<Paging>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Specification<T> {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
            includes: Vec::new(),
            order: Vec::new(),
            paging: None,
            _entity: PhantomData,
        }
    }

    /// Adds a conjunctive filter.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    /// Eager-loads a related path. Duplicates are ignored.
    pub fn include(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        if !self.includes.contains(&path) {
            self.includes.push(path);
        }
        self
    }

    pub fn order_by(self, field: &str) -> Self {
        self.then_order(field.into(), SortDirection::Ascending)
    }

    pub fn order_by_descending(self, field: &str) -> Self {
        self.then_order(field.into(), SortDirection::Descending)
    }

    fn then_order(mut self, field: FieldPath, direction: SortDirection) -> Self {
        self.order.push(OrderClause { field, direction });
        self
    }

    /// Replaces any previous skip/take.
    pub fn skip_take(mut self, skip: u64, take: u64) -> Self {
        self.paging = Some(Paging { skip, take });
        self
    }

    pub fn paged(self, page: PageRequest) -> Self {
        self.skip_take(page.skip(), page.take())
    }

    /// Filters and includes only: what is left to count or re-page.
    pub fn criteria(&self) -> Self {
        Self {
            filters: self.filters.clone(),
            includes: self.includes.clone(),
            order: Vec::new(),
            paging: None,
            _entity: PhantomData,
        }
    }

    pub fn filters(&self) -> &[Predicate] {
        &self.filters
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn order(&self) -> &[OrderClause] {
        &self.order
    }

    pub fn paging(&self) -> Option<Paging> {
        self.paging
    }

    pub fn skip(&self) -> Option<u64> {
        self.paging.map(|p| p.skip)
    }

    pub fn take(&self) -> Option<u64> {
        self.paging.map(|p| p.take)
    }
}

impl<T: Fields> Specification<T> {
    /// Appends an ordering from user input. The dotted path is resolved
    /// against `T`'s fields; when it doesn't resolve the sort is dropped.
    pub fn sorted_by(self, sort_by: Option<&str>, direction: SortDirection) -> Self {
        let Some(raw) = sort_by.map(str::trim).filter(|s| !s.is_empty()) else {
            return self;
        };

        match FieldPath::from(raw).canonical::<T>() {
            Some(field) => self.then_order(field, direction),
            None => {
                tracing::debug!(sort_by = raw, "Ignoring unknown sort key");
                self
            }
        }
    }

    /// Like [`Self::sorted_by`], but only keys listed in `allowed`
    /// (`(public key, field path)`, case-insensitive) are honored.
    pub fn sorted_by_map(
        self,
        sort_by: Option<&str>,
        direction: SortDirection,
        allowed: &[(&str, &str)],
    ) -> Self {
        let mapped = sort_by.and_then(|key| {
            allowed
                .iter()
                .find(|(public, _)| public.eq_ignore_ascii_case(key.trim()))
                .map(|(_, path)| *path)
        });

        match mapped {
            Some(path) => self.sorted_by(Some(path), direction),
            None => self,
        }
    }

    pub fn with_paged_sorting(self, request: &PagedAndSortedRequest) -> Self {
        self.sorted_by(request.sort_by(), request.sort_direction())
            .paged(request.page())
    }
}

impl<T: Fields + Searchable> Specification<T> {
    /// Adds the entity's search filter for a non-blank term.
    pub fn searched_by(self, term: Option<&str>) -> Self {
        match term.map(str::trim).filter(|t| !t.is_empty()) {
            Some(term) => self.filter(T::search_predicate(term)),
            None => self,
        }
    }

    /// Overlays search, then sorting, then paging on top of this specification.
    pub fn compose(self, request: &PagedAndSortedRequest, search: Option<&str>) -> Self {
        self.searched_by(search).with_paged_sorting(request)
    }
}

impl<T: Entity> Specification<T> {
    pub fn by_id(id: T::Id) -> Self {
        Self::new().filter(Predicate::eq(T::ID_FIELD, id))
    }
}

impl<T> Default for Specification<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Specification<T> {
    fn clone(&self) -> Self {
        Self {
            filters: self.filters.clone(),
            includes: self.includes.clone(),
            order: self.order.clone(),
            paging: self.paging,
            _entity: PhantomData,
        }
    }
}

impl<T> PartialEq for Specification<T> {
    fn eq(&self, other: &Self) -> bool {
        self.filters == other.filters
            && self.includes == other.includes
            && self.order == other.order
            && self.paging == other.paging
    }
}

impl<T> fmt::Debug for Specification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specification")
            .field("entity", &std::any::type_name::<T>())
            .field("filters", &self.filters)
            .field("includes", &self.includes)
            .field("order", &self.order)
            .field("paging", &self.paging)
            .finish()
    }
}
