/// Typed AQL statements
///
/// One of four shapes per statement. A statement is built in full or not at
/// all; every field here has already passed validation.

use crate::aql::literal::Literal;
use crate::types::{Bins, Key, Value, PK_BIN};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// Bin name carrying the primary key (exact match, checked first)
pub const PK_COLUMN: &str = "Pk";

/// Alternate primary key column (exact match for key lookup, any case for exclusion)
pub const KEY_COLUMN: &str = "KEY";

/// Command keyword that selects the statement shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Select,
    Insert,
    Delete,
    Update,
}

impl Command {
    /// Classify a statement by its first whitespace-delimited token.
    pub fn classify(text: &str) -> Result<Command> {
        let first = text
            .split_whitespace()
            .next()
            .ok_or(Error::EmptyQuery)?
            .to_uppercase();

        match first.as_str() {
            "SELECT" => Ok(Command::Select),
            "INSERT" => Ok(Command::Insert),
            "DELETE" => Ok(Command::Delete),
            "UPDATE" => Ok(Command::Update),
            _ => Err(Error::UnsupportedCommand(first)),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Command::Select => "SELECT",
            Command::Insert => "INSERT",
            Command::Delete => "DELETE",
            Command::Update => "UPDATE",
        };
        f.write_str(name)
    }
}

/// Top-level statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Select(SelectStatement),
    Insert(InsertStatement),
    Delete(DeleteStatement),
    Update(UpdateStatement),
}

impl Statement {
    pub fn command(&self) -> Command {
        match self {
            Statement::Select(_) => Command::Select,
            Statement::Insert(_) => Command::Insert,
            Statement::Delete(_) => Command::Delete,
            Statement::Update(_) => Command::Update,
        }
    }
}

/// `bin = value`
#[derive(Debug, Clone, PartialEq)]
pub struct Equality {
    pub bin: String,
    pub value: Literal,
}

impl Equality {
    pub fn new(bin: impl Into<String>, value: Literal) -> Self {
        Self {
            bin: bin.into(),
            value,
        }
    }
}

/// SELECT projection
#[derive(Debug, Clone, PartialEq)]
pub enum BinSelection {
    /// SELECT *
    AllBins,
    /// SELECT a, b, ...
    Named(Vec<String>),
}

/// SELECT statement
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub namespace: String,
    pub set: String,
    pub bins: BinSelection,
    pub predicate: Option<Equality>,
}

/// INSERT statement. Columns and values always have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub namespace: String,
    pub set: String,
    pub columns: Vec<String>,
    pub values: Vec<Literal>,
}

/// Key and bins an INSERT writes
#[derive(Debug, Clone, PartialEq)]
pub struct InsertWrite {
    pub key: Key,
    pub bins: Bins,
}

impl InsertStatement {
    /// Column/value pairs in statement order
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &Literal)> {
        self.columns.iter().map(String::as_str).zip(self.values.iter())
    }

    /// Explicit user key. A `Pk` column shadows `KEY` whenever it is present,
    /// even when its value is empty; an empty winner means no explicit key.
    pub fn explicit_key(&self) -> Option<String> {
        let lookup = |name: &str| {
            self.pairs()
                .find(|(col, _)| *col == name)
                .map(|(_, lit)| lit.text())
        };
        lookup(PK_COLUMN)
            .or_else(|| lookup(KEY_COLUMN))
            .filter(|text| !text.is_empty())
    }

    /// Resolve the record key and write set, generating a UUID v4 when no
    /// explicit key is given.
    pub fn resolve_write(&self) -> InsertWrite {
        self.resolve_write_with(|| uuid::Uuid::new_v4().to_string())
    }

    /// Same as [`resolve_write`](Self::resolve_write) with a caller-supplied key generator.
    pub fn resolve_write_with(&self, generate: impl FnOnce() -> String) -> InsertWrite {
        let user_key = self.explicit_key().unwrap_or_else(generate);

        let mut bins = Bins::new();
        for (col, lit) in self.pairs() {
            if col.eq_ignore_ascii_case(KEY_COLUMN) {
                continue;
            }
            bins.insert(col.to_string(), lit.to_value());
        }
        bins.insert(PK_BIN.to_string(), Value::Str(user_key.clone()));

        InsertWrite {
            key: Key::new(&self.namespace, &self.set, user_key),
            bins,
        }
    }
}

/// DELETE statement. The predicate value is always a string literal.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub namespace: String,
    pub set: String,
    pub predicate: Equality,
}

/// Right-hand side of one `bin = value` pair in a SET clause
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub value: Literal,
    /// Value as written: quotes removed, otherwise untouched. Re-read when
    /// the bin already holds a typed value, so `007` stays `007`.
    pub text: String,
}

impl Assignment {
    pub fn from_raw(raw: &str) -> Self {
        let raw = raw.trim();
        let value = Literal::coerce(raw);
        let text = match &value {
            Literal::Str(s) => s.clone(),
            _ => raw.to_string(),
        };
        Self { value, text }
    }
}

/// UPDATE statement. The predicate value is the record's user key.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub namespace: String,
    pub set: String,
    /// Never empty, never contains a `KEY` bin
    pub assignments: BTreeMap<String, Assignment>,
    pub predicate: Equality,
}

impl UpdateStatement {
    pub fn key(&self) -> Key {
        Key::new(&self.namespace, &self.set, self.predicate.value.text())
    }

    pub fn bin_names(&self) -> Vec<String> {
        self.assignments.keys().cloned().collect()
    }
}
