use serde::Serialize;

use crate::cqrs::Reply;

/// Whether a request mutates state. Commands go through audit and
/// transaction handling, queries skip both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Command,
    Query,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Command => "command",
            RequestKind::Query => "query",
        }
    }
}

/// An immutable intent handed to the [`crate::Dispatcher`].
///
/// `Serialize` is required so commands can be written to the audit trail.
pub trait Request: Serialize + Send + Sync + 'static {
    type Response: Reply;

    const KIND: RequestKind;

    /// Short name used in logs and audit records (`CreateWidget`).
    fn name() -> &'static str {
        short_type_name::<Self>()
    }

    /// Entity type recorded by the audit trail. Defaults to the request name.
    fn entity_type() -> &'static str {
        Self::name()
    }

    /// Identifier of the entity a command targets, when there is one.
    fn entity_id(&self) -> Option<String> {
        None
    }
}

/// Last path segment of a type name, without generic arguments.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;
    struct Generic<T>(T);

    #[test]
    fn short_names_drop_module_path_and_generics() {
        assert_eq!(short_type_name::<Plain>(), "Plain");
        assert_eq!(short_type_name::<Generic<Plain>>(), "Generic");
        assert_eq!(short_type_name::<u32>(), "u32");
    }
}
