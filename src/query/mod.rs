//! Issue query language.
//!
//! Compiles the compact text queries typed into the issue list into a
//! [`QueryPlan`]: an ordered list of predicates, an ordered list of sort
//! keys, and a page window.
//!
//! Queries are space-delimited `key:value` tokens:
//!
//! | key                     | value                                       |
//! |-------------------------|---------------------------------------------|
//! | `sort`                  | `<field>[-asc\|-desc]`, see [`SORTABLE_FIELDS`] |
//! | `is`                    | `active`, `open`, `invalid`, `resolved`, `starred` |
//! | `author`, `from`        | `@me`, `no`, or a numeric user id           |
//! | `assigned`, `assignee`  | `@me`, `no`, or a numeric user id           |
//!
//! The compiler is lenient: malformed tokens, unknown keys, unknown sort
//! fields and non-numeric ids are dropped (and logged at debug), never
//! reported to the caller.

mod tokenize;

pub use tokenize::tokenize;

use crate::model::IssueType;
use crate::util::id::Id;
use serde::Serialize;
use tracing::{debug, trace};

/// Issues per page.
pub const PAGE_SIZE: usize = 25;

/// Filterable and sortable issue columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Starred,
    Type,
    Occurrences,
    AssigneeId,
    Error,
    Function,
    Checkpoint,
    LastModified,
    CreatedAt,
    CommentCount,
    CreatedById,
}

impl Field {
    /// Column name, identical to the name used in queries.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Starred => "starred",
            Self::Type => "type",
            Self::Occurrences => "occurrences",
            Self::AssigneeId => "assignee_id",
            Self::Error => "error",
            Self::Function => "function",
            Self::Checkpoint => "checkpoint",
            Self::LastModified => "last_modified",
            Self::CreatedAt => "created_at",
            Self::CommentCount => "comment_count",
            Self::CreatedById => "created_by_id",
        }
    }

    /// Look up a field accepted by `sort:`.
    #[must_use]
    pub fn sortable(name: &str) -> Option<Self> {
        SORTABLE_FIELDS
            .iter()
            .copied()
            .find(|field| field.column() == name)
    }
}

/// Fields accepted by `sort:`. Anything else is ignored.
pub const SORTABLE_FIELDS: [Field; 10] = [
    Field::Starred,
    Field::Type,
    Field::Occurrences,
    Field::AssigneeId,
    Field::Error,
    Field::Function,
    Field::Checkpoint,
    Field::LastModified,
    Field::CreatedAt,
    Field::CommentCount,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One ordering key, applied in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SortKey {
    pub field: Field,
    pub direction: Direction,
}

impl SortKey {
    #[must_use]
    pub const fn new(field: Field, direction: Direction) -> Self {
        Self { field, direction }
    }
}

/// Starred issues cluster first unless explicit keys already decide order.
pub const BASELINE_SORT: SortKey = SortKey::new(Field::Starred, Direction::Desc);

/// A comparison operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Type(IssueType),
}

/// A single filter condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// `field = value`
    Equals { field: Field, value: Value },
    /// `field IS NULL`
    IsNull { field: Field },
    /// Any of the inner predicates holds.
    AnyOf(Vec<Predicate>),
}

impl Predicate {
    #[must_use]
    pub const fn equals(field: Field, value: Value) -> Self {
        Self::Equals { field, value }
    }

    /// `field = 0 OR field IS NULL`: the column holds no id.
    #[must_use]
    pub fn no_id(field: Field) -> Self {
        Self::AnyOf(vec![
            Self::equals(field, Value::Int(0)),
            Self::IsNull { field },
        ])
    }
}

/// Structured form of a query, produced fresh for every search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryPlan {
    /// All must hold.
    pub predicates: Vec<Predicate>,
    /// Starts with [`BASELINE_SORT`]; explicit keys follow in query order.
    pub sort: Vec<SortKey>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for QueryPlan {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
            sort: vec![BASELINE_SORT],
            limit: PAGE_SIZE,
            offset: 0,
        }
    }
}

impl QueryPlan {
    /// Window the plan to a zero-based page. Negative pages read page 0.
    #[must_use]
    pub fn with_page(mut self, page: i64) -> Self {
        let page_size = i64::try_from(PAGE_SIZE).unwrap_or(i64::MAX);
        let offset = page_size.saturating_mul(page).max(0);
        self.limit = PAGE_SIZE;
        self.offset = usize::try_from(offset).unwrap_or(usize::MAX);
        self
    }

    /// Explicit sort keys, without the baseline.
    #[must_use]
    pub fn explicit_sort(&self) -> &[SortKey] {
        self.sort.get(1..).unwrap_or(&[])
    }
}

/// Applies one token's value to the plan; `false` means the value was dropped.
type TokenHandler = fn(&str, Id, &mut QueryPlan) -> bool;

const HANDLERS: &[(&str, TokenHandler)] = &[
    ("sort", apply_sort),
    ("is", apply_is),
    ("author", apply_author),
    ("from", apply_author),
    ("assigned", apply_assignee),
    ("assignee", apply_assignee),
];

/// Compile a query for `caller` (`Id::NONE` when anonymous).
///
/// Never fails; see the module docs for what gets dropped.
#[must_use]
pub fn compile(query: &str, caller: Id) -> QueryPlan {
    let mut plan = QueryPlan::default();

    for token in tokenize(query) {
        let Some((key, value)) = token.split_once(':') else {
            debug!(token = %token, "Dropped query token without key");
            continue;
        };
        let key = key.to_lowercase();
        let value = value.to_lowercase();

        match HANDLERS.iter().find(|(name, _)| *name == key) {
            Some((_, handler)) => {
                if !handler(&value, caller, &mut plan) {
                    debug!(key = %key, value = %value, "Dropped query token with bad value");
                }
            }
            None => debug!(key = %key, "Ignored unknown query key"),
        }
    }

    trace!(?plan, "Compiled issue query");
    plan
}

fn apply_sort(value: &str, _caller: Id, plan: &mut QueryPlan) -> bool {
    let mut parts = value.split('-');
    let Some(field) = parts.next().and_then(Field::sortable) else {
        return false;
    };
    let direction = match parts.next() {
        None | Some("desc") => Direction::Desc,
        Some(_) => Direction::Asc,
    };
    plan.sort.push(SortKey::new(field, direction));
    true
}

fn apply_is(value: &str, _caller: Id, plan: &mut QueryPlan) -> bool {
    let predicate = match value {
        // Active issues persist with a NULL type
        "active" => Predicate::IsNull { field: Field::Type },
        "open" => Predicate::equals(Field::Type, Value::Type(IssueType::Open)),
        "invalid" => Predicate::equals(Field::Type, Value::Type(IssueType::Invalid)),
        "resolved" => Predicate::equals(Field::Type, Value::Type(IssueType::Resolved)),
        "starred" => Predicate::equals(Field::Starred, Value::Bool(true)),
        _ => return false,
    };
    plan.predicates.push(predicate);
    true
}

fn apply_author(value: &str, caller: Id, plan: &mut QueryPlan) -> bool {
    apply_user_filter(Field::CreatedById, value, caller, plan)
}

fn apply_assignee(value: &str, caller: Id, plan: &mut QueryPlan) -> bool {
    apply_user_filter(Field::AssigneeId, value, caller, plan)
}

fn apply_user_filter(field: Field, value: &str, caller: Id, plan: &mut QueryPlan) -> bool {
    match value {
        "@me" => {
            // Anonymous callers never get a filter from @me
            if !caller.is_none() {
                plan.predicates
                    .push(Predicate::equals(field, Value::Int(caller.get())));
            }
            true
        }
        "no" => {
            plan.predicates.push(Predicate::no_id(field));
            true
        }
        other => match other.parse::<i64>() {
            Ok(id) => {
                plan.predicates
                    .push(Predicate::equals(field, Value::Int(id)));
                true
            }
            Err(_) => false,
        },
    }
}
