use std::fmt;

use flex_types::wire::COUNT_ENDPOINT;

/// One of the ten operations a service object can implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataOperation {
    /// Create an entity.
    Insert,
    /// Replace an entity.
    Update,
    /// Read every entity.
    GetAll,
    /// Read one entity.
    GetById,
    /// Read entities matching a query.
    GetByQuery,
    /// Count every entity.
    GetCount,
    /// Count entities matching a query.
    GetCountByQuery,
    /// Delete every entity.
    DeleteAll,
    /// Delete one entity.
    DeleteById,
    /// Delete entities matching a query.
    DeleteByQuery,
}

impl DataOperation {
    /// Every operation, in registration-key order.
    pub const ALL: [Self; 10] = [
        Self::Insert,
        Self::Update,
        Self::GetAll,
        Self::GetById,
        Self::GetByQuery,
        Self::GetCount,
        Self::GetCountByQuery,
        Self::DeleteAll,
        Self::DeleteById,
        Self::DeleteByQuery,
    ];

    /// Returns the registration key, e.g. `onGetByID`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "onInsert",
            Self::Update => "onUpdate",
            Self::GetAll => "onGetAll",
            Self::GetById => "onGetByID",
            Self::GetByQuery => "onGetByQuery",
            Self::GetCount => "onGetCount",
            Self::GetCountByQuery => "onGetCountByQuery",
            Self::DeleteAll => "onDeleteAll",
            Self::DeleteById => "onDeleteByID",
            Self::DeleteByQuery => "onDeleteByQuery",
        }
    }

    /// Parses a registration key.
    #[must_use]
    pub fn parse(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|operation| operation.as_str() == key)
    }

    /// Derives the operation a data task asks for.
    ///
    /// `method` is matched case-sensitively against the upper-case HTTP
    /// verbs. Returns `None` for any other method.
    #[must_use]
    pub fn route(method: &str, endpoint: &str, has_entity_id: bool, has_query: bool) -> Option<Self> {
        let counting = endpoint == COUNT_ENDPOINT;
        let operation = match method {
            "POST" => Self::Insert,
            "PUT" => Self::Update,
            "GET" if counting && has_query => Self::GetCountByQuery,
            "GET" if counting => Self::GetCount,
            "GET" if has_entity_id => Self::GetById,
            "GET" if has_query => Self::GetByQuery,
            "GET" => Self::GetAll,
            "DELETE" if has_entity_id => Self::DeleteById,
            "DELETE" if has_query => Self::DeleteByQuery,
            "DELETE" => Self::DeleteAll,
            _ => return None,
        };
        Some(operation)
    }
}

impl fmt::Display for DataOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
