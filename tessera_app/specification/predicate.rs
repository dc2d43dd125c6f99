use std::{cmp::Ordering, ops::Not};

use crate::specification::{FieldPath, FieldValue, Fields};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }

    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }
}

/// A filter over entity fields.
///
/// Evaluation follows SQL's three-valued logic so the in-memory result is
/// the same as the translated query: comparing against a null is unknown,
/// and unknown never matches.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        field: FieldPath,
        op: CompareOp,
        value: FieldValue,
    },
    /// Case-insensitive substring match on a text field.
    Contains { field: FieldPath, needle: String },
    IsNull(FieldPath),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn compare(field: &str, op: CompareOp, value: impl Into<FieldValue>) -> Self {
        Predicate::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(field: &str, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    pub fn ne(field: &str, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    pub fn lt(field: &str, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    pub fn le(field: &str, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, CompareOp::Le, value)
    }

    pub fn gt(field: &str, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    pub fn ge(field: &str, value: impl Into<FieldValue>) -> Self {
        Self::compare(field, CompareOp::Ge, value)
    }

    pub fn contains(field: &str, needle: impl Into<String>) -> Self {
        Predicate::Contains {
            field: field.into(),
            needle: needle.into(),
        }
    }

    pub fn is_null(field: &str) -> Self {
        Predicate::IsNull(field.into())
    }

    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::And(mut all) => {
                all.push(other);
                Predicate::And(all)
            }
            first => Predicate::And(vec![first, other]),
        }
    }

    pub fn or(self, other: Predicate) -> Self {
        match self {
            Predicate::Or(mut any) => {
                any.push(other);
                Predicate::Or(any)
            }
            first => Predicate::Or(vec![first, other]),
        }
    }

    pub fn any(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::Or(predicates.into_iter().collect())
    }

    pub fn all(predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Predicate::And(predicates.into_iter().collect())
    }

    /// Every field path this predicate reads.
    pub fn fields(&self) -> Vec<&FieldPath> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a FieldPath>) {
        match self {
            Predicate::Compare { field, .. }
            | Predicate::Contains { field, .. }
            | Predicate::IsNull(field) => out.push(field),
            Predicate::And(ps) | Predicate::Or(ps) => {
                ps.iter().for_each(|p| p.collect_fields(out));
            }
            Predicate::Not(p) => p.collect_fields(out),
        }
    }

    /// First field path that doesn't exist on `T`.
    pub fn unresolved_field<T: Fields>(&self) -> Option<&FieldPath> {
        self.fields()
            .into_iter()
            .find(|f| f.resolve(T::fields()).is_none())
    }

    pub fn matches<T: Fields>(&self, entity: &T) -> bool {
        self.eval(entity) == Some(true)
    }

    fn eval<T: Fields>(&self, entity: &T) -> Option<bool> {
        match self {
            Predicate::Compare { field, op, value } => {
                let actual = field.read(entity).unwrap_or(FieldValue::Null);
                match (actual.is_null(), value.is_null(), op) {
                    (a, true, CompareOp::Eq) => Some(a),
                    (a, true, CompareOp::Ne) => Some(!a),
                    (true, _, _) | (_, true, _) => None,
                    _ => actual.partial_compare(value).map(|o| op.accepts(o)),
                }
            }
            Predicate::Contains { field, needle } => match field.read(entity)? {
                FieldValue::Text(text) => {
                    Some(text.to_lowercase().contains(&needle.to_lowercase()))
                }
                FieldValue::Null => None,
                _ => Some(false),
            },
            Predicate::IsNull(field) => Some(
                field
                    .read(entity)
                    .is_none_or(|value| value.is_null()),
            ),
            Predicate::And(ps) => {
                let mut unknown = false;
                for p in ps {
                    match p.eval(entity) {
                        Some(false) => return Some(false),
                        None => unknown = true,
                        Some(true) => {}
                    }
                }
                if unknown { None } else { Some(true) }
            }
            Predicate::Or(ps) => {
                let mut unknown = false;
                for p in ps {
                    match p.eval(entity) {
                        Some(true) => return Some(true),
                        None => unknown = true,
                        Some(false) => {}
                    }
                }
                if unknown { None } else { Some(false) }
            }
            Predicate::Not(p) => p.eval(entity).map(|v| !v),
        }
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Self::Output {
        match self {
            Predicate::Not(inner) => *inner,
            other => Predicate::Not(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::tests::{Widget, WidgetFactory};
    use rstest::rstest;

    #[rstest]
    #[case(Predicate::eq("name", "gear"), true)]
    #[case(Predicate::ne("name", "gear"), false)]
    #[case(Predicate::gt("price", 10), true)]
    #[case(Predicate::le("price", 12.5), true)]
    #[case(Predicate::lt("price", 12), false)]
    #[case(Predicate::contains("owner.email", "EXAMPLE"), true)]
    #[case(Predicate::contains("name", "xyz"), false)]
    #[case(Predicate::is_null("description"), true)]
    #[case(Predicate::eq("description", None::<String>), true)]
    #[case(Predicate::ne("description", None::<String>), false)]
    #[case(Predicate::eq("name", "gear").and(Predicate::gt("price", 100)), false)]
    #[case(Predicate::eq("name", "cog").or(Predicate::gt("price", 1)), true)]
    #[case(!Predicate::eq("name", "gear"), false)]
    fn evaluates_against_widget(#[case] predicate: Predicate, #[case] expected: bool) {
        let widget = WidgetFactory::new()
            .name("gear")
            .price(12.5)
            .owner("ada", "ada@example.com")
            .build();
        assert_eq!(predicate.matches(&widget), expected);
    }

    #[test]
    fn comparisons_with_null_fields_are_unknown() {
        let widget = WidgetFactory::new().build();
        // description is null: neither the comparison nor its negation matches
        assert!(!Predicate::eq("description", "x").matches(&widget));
        assert!(!(!Predicate::eq("description", "x")).matches(&widget));
        let same_name = Predicate::eq("name", widget.name.as_str());
        assert!(
            Predicate::eq("description", "x")
                .or(same_name.clone())
                .matches(&widget)
        );
        assert!(
            !Predicate::eq("description", "x")
                .and(same_name)
                .matches(&widget)
        );
    }

    #[test]
    fn reports_unknown_fields() {
        let p = Predicate::eq("name", "a").and(Predicate::is_null("owner.phone"));
        assert_eq!(
            p.unresolved_field::<Widget>(),
            Some(&FieldPath::from("owner.phone"))
        );
        assert_eq!(p.fields().len(), 2);
    }

    #[test]
    fn double_negation_unwraps() {
        let p = Predicate::eq("name", "a");
        assert_eq!(!!p.clone(), p);
    }
}
