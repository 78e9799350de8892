/// Statement builder: AQL text to a typed statement
///
/// Structural checks run in a fixed order per command and the first failing
/// check decides the diagnostic, so the same malformed input always reports
/// the same message.

use crate::aql::ast::*;
use crate::aql::lexer::{Segment, TokenKind, TokenStream};
use crate::aql::literal::Literal;
use crate::{Error, Result};
use std::collections::BTreeMap;

/// AQL statement builder
pub struct StatementBuilder;

impl StatementBuilder {
    /// Build a statement from operator input.
    ///
    /// Surrounding whitespace and one trailing `;` are ignored.
    pub fn build(text: &str) -> Result<Statement> {
        let text = normalize(text);
        let command = Command::classify(text)?;

        let stream = TokenStream::new(text);
        let seg = stream.segment();

        match command {
            Command::Select => Self::build_select(seg).map(Statement::Select),
            Command::Insert => Self::build_insert(seg).map(Statement::Insert),
            Command::Delete => Self::build_delete(seg).map(Statement::Delete),
            Command::Update => Self::build_update(seg).map(Statement::Update),
        }
    }

    fn build_select(seg: Segment<'_>) -> Result<SelectStatement> {
        let invalid = || Error::parse("Invalid SELECT query format.");

        let from = match seg.keyword_positions("FROM").as_slice() {
            [idx] => *idx,
            _ => return Err(invalid()),
        };

        let bins = Self::parse_projection(seg.slice(1, from)).ok_or_else(invalid)?;

        let rest = seg.tail(from + 1);
        let (target, where_clause) = match rest.keyword_positions("WHERE").as_slice() {
            [] => (rest, None),
            [idx] => (rest.slice(0, *idx), Some(rest.tail(idx + 1))),
            _ => return Err(Error::parse("Invalid WHERE clause format.")),
        };

        let (namespace, set) = target
            .single_word()
            .and_then(parse_namespace_set)
            .ok_or_else(|| Error::parse("Invalid FROM clause format (namespace.set expected)."))?;

        let predicate = match where_clause {
            Some(clause) => Some(
                parse_equality(clause).ok_or_else(|| Error::parse("Invalid WHERE clause format."))?,
            ),
            None => None,
        };

        Ok(SelectStatement {
            namespace,
            set,
            bins,
            predicate,
        })
    }

    fn parse_projection(seg: Segment<'_>) -> Option<BinSelection> {
        if seg.single_word() == Some("*") {
            return Some(BinSelection::AllBins);
        }
        if seg.is_empty() {
            return None;
        }

        let mut names = Vec::new();
        for piece in seg.split_on(TokenKind::Comma) {
            let name = piece.text();
            if name.is_empty() || name == "*" {
                return None;
            }
            names.push(name.to_string());
        }
        Some(BinSelection::Named(names))
    }

    fn build_insert(seg: Segment<'_>) -> Result<InsertStatement> {
        if !seg.is_keyword_at(1, "INTO") {
            return Err(Error::parse("Unsupported INSERT syntax."));
        }
        let invalid = || Error::parse("Invalid INSERT INTO syntax.");

        let target = word_at(seg, 2).filter(|t| t.contains('.')).ok_or_else(invalid)?;
        let (namespace, set) = parse_namespace_set(target)
            .ok_or_else(|| Error::parse("Invalid namespace.set format in INSERT."))?;

        let (column_list, after_columns) = seg.paren_group(3).ok_or_else(invalid)?;
        if !seg.is_keyword_at(after_columns, "VALUES") {
            return Err(invalid());
        }
        let (value_list, end) = seg.paren_group(after_columns + 1).ok_or_else(invalid)?;
        if end != seg.len() {
            return Err(invalid());
        }

        let mut columns = Vec::new();
        for piece in column_list.split_on(TokenKind::Comma) {
            let name = piece.text();
            if name.is_empty() {
                return Err(invalid());
            }
            columns.push(name.to_string());
        }

        let raw_values = value_list.split_on(TokenKind::Comma);
        if raw_values.len() != columns.len() {
            return Err(Error::parse(
                "Number of bin names does not match number of values.",
            ));
        }

        let mut values = Vec::with_capacity(raw_values.len());
        for piece in raw_values {
            let raw = piece.text();
            if raw.is_empty() {
                return Err(Error::parse(format!("Error parsing value: {}", raw)));
            }
            values.push(Literal::coerce(raw));
        }

        Ok(InsertStatement {
            namespace,
            set,
            columns,
            values,
        })
    }

    fn build_delete(seg: Segment<'_>) -> Result<DeleteStatement> {
        if !seg.is_keyword_at(1, "FROM") {
            return Err(Error::parse("Unsupported DELETE syntax."));
        }

        let target = word_at(seg, 2)
            .filter(|t| t.contains('.'))
            .ok_or_else(|| Error::parse("Invalid DELETE FROM syntax."))?;
        let (namespace, set) = parse_namespace_set(target)
            .ok_or_else(|| Error::parse("Invalid namespace.set format in DELETE."))?;

        let where_idx = seg.find_keyword("WHERE").ok_or_else(|| {
            Error::parse("DELETE requires a WHERE clause in this basic implementation.")
        })?;
        if where_idx != 3 {
            return Err(Error::parse("Invalid DELETE FROM syntax."));
        }

        let invalid_where = || Error::parse("Invalid WHERE clause in DELETE.");
        if seg.keyword_positions("WHERE").len() > 1 {
            return Err(invalid_where());
        }
        let predicate = parse_equality(seg.tail(where_idx + 1)).ok_or_else(invalid_where)?;
        if !predicate.value.is_string() {
            return Err(Error::parse(
                "DELETE WHERE value must be a string for this basic implementation.",
            ));
        }

        Ok(DeleteStatement {
            namespace,
            set,
            predicate,
        })
    }

    fn build_update(seg: Segment<'_>) -> Result<UpdateStatement> {
        let target = word_at(seg, 1)
            .filter(|t| t.contains('.'))
            .ok_or_else(|| Error::parse("Unsupported UPDATE syntax."))?;
        let (namespace, set) = parse_namespace_set(target)
            .ok_or_else(|| Error::parse("Invalid UPDATE namespace.set format."))?;

        let missing = || Error::parse("Invalid UPDATE syntax (missing SET or WHERE).");
        let set_idx = seg.find_keyword("SET").ok_or_else(missing)?;
        let where_idx = seg.find_keyword("WHERE").ok_or_else(missing)?;
        if set_idx != 2 || where_idx <= set_idx {
            return Err(missing());
        }

        let set_clause = seg.slice(set_idx + 1, where_idx);
        let mut assignments = BTreeMap::new();
        if !set_clause.is_empty() {
            for assignment in set_clause.split_on(TokenKind::Comma) {
                let (bin, value) = parse_assignment(assignment)?;
                // Later assignments to the same bin replace earlier ones
                assignments.insert(bin, value);
            }
        }

        let invalid_where = || Error::parse("Invalid WHERE clause in UPDATE.");
        if seg.keyword_positions("WHERE").len() > 1 {
            return Err(invalid_where());
        }
        let predicate = parse_equality(seg.tail(where_idx + 1)).ok_or_else(invalid_where)?;
        if !predicate.value.is_string() {
            return Err(Error::parse(
                "Key value in WHERE clause must be a string for this basic implementation.",
            ));
        }

        assignments.retain(|bin: &String, _| !bin.eq_ignore_ascii_case(KEY_COLUMN));
        if assignments.is_empty() {
            return Err(Error::parse("No bins to update."));
        }

        Ok(UpdateStatement {
            namespace,
            set,
            assignments,
            predicate,
        })
    }
}

fn normalize(text: &str) -> &str {
    let text = text.trim();
    text.strip_suffix(';').map(str::trim_end).unwrap_or(text)
}

fn word_at<'a>(seg: Segment<'a>, idx: usize) -> Option<&'a str> {
    seg.token(idx)
        .filter(|t| t.kind == TokenKind::Word)
        .and_then(|_| seg.text_at(idx))
}

/// Split `namespace.set` into exactly two non-empty parts.
pub fn parse_namespace_set(text: &str) -> Option<(String, String)> {
    let mut parts = text.split('.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(ns), Some(set), None) if !ns.is_empty() && !set.is_empty() => {
            Some((ns.to_string(), set.to_string()))
        }
        _ => None,
    }
}

/// `<bin> = <value>` with a single top-level `=`
fn parse_equality(seg: Segment<'_>) -> Option<Equality> {
    match seg.split_on(TokenKind::Equals).as_slice() {
        [bin, value] if !bin.is_empty() && !value.is_empty() => {
            Some(Equality::new(bin.text(), Literal::coerce(value.text())))
        }
        _ => None,
    }
}

fn parse_assignment(seg: Segment<'_>) -> Result<(String, Assignment)> {
    match seg.split_on(TokenKind::Equals).as_slice() {
        [bin, value] if !bin.is_empty() => {
            if value.is_empty() {
                return Err(Error::parse(format!(
                    "Error parsing value in SET clause: {}",
                    seg.text()
                )));
            }
            Ok((bin.text().to_string(), Assignment::from_raw(value.text())))
        }
        _ => Err(Error::parse(format!(
            "Invalid bin=value pair in SET clause: {}",
            seg.text()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_err(aql: &str) -> String {
        match StatementBuilder::build(aql) {
            Err(e) => e.to_string(),
            Ok(stmt) => panic!("Expected error for {:?}, got {:?}", aql, stmt),
        }
    }

    fn select(aql: &str) -> SelectStatement {
        match StatementBuilder::build(aql).unwrap() {
            Statement::Select(s) => s,
            other => panic!("Expected SELECT, got {:?}", other),
        }
    }

    fn update(aql: &str) -> UpdateStatement {
        match StatementBuilder::build(aql).unwrap() {
            Statement::Update(s) => s,
            other => panic!("Expected UPDATE, got {:?}", other),
        }
    }

    #[test]
    fn test_select_all() {
        let stmt = select("SELECT * FROM test.users");
        assert_eq!(stmt.namespace, "test");
        assert_eq!(stmt.set, "users");
        assert_eq!(stmt.bins, BinSelection::AllBins);
        assert!(stmt.predicate.is_none());
    }

    #[test]
    fn test_select_named_with_where() {
        let stmt = select("SELECT name,age FROM test.users WHERE age = 30");
        assert_eq!(
            stmt.bins,
            BinSelection::Named(vec!["name".into(), "age".into()])
        );
        assert_eq!(stmt.predicate, Some(Equality::new("age", Literal::Int(30))));
    }

    #[test]
    fn test_select_case_insensitive_keywords() {
        let stmt = select("select name from test.users where name = 'x';");
        assert_eq!(
            stmt.predicate,
            Some(Equality::new("name", Literal::Str("x".into())))
        );
    }

    #[test]
    fn test_select_unquoted_multiword_value() {
        let stmt = select("SELECT * FROM test.users WHERE name = John Doe");
        assert_eq!(
            stmt.predicate,
            Some(Equality::new("name", Literal::Str("John Doe".into())))
        );
    }

    #[test]
    fn test_select_quoted_value_with_keyword() {
        let stmt = select("SELECT * FROM test.users WHERE note = 'a = b FROM c WHERE d'");
        assert_eq!(
            stmt.predicate,
            Some(Equality::new("note", Literal::Str("a = b FROM c WHERE d".into())))
        );
    }

    #[test]
    fn test_select_errors() {
        assert_eq!(parse_err("SELECT * test.users"), "Invalid SELECT query format.");
        assert_eq!(parse_err("SELECT FROM test.users"), "Invalid SELECT query format.");
        assert_eq!(parse_err("SELECT a,,b FROM test.users"), "Invalid SELECT query format.");
        assert_eq!(
            parse_err("SELECT * FROM users"),
            "Invalid FROM clause format (namespace.set expected)."
        );
        assert_eq!(
            parse_err("SELECT * FROM a.b.c"),
            "Invalid FROM clause format (namespace.set expected)."
        );
        assert_eq!(
            parse_err("SELECT * FROM test.users WHERE age > 30"),
            "Invalid WHERE clause format."
        );
        assert_eq!(
            parse_err("SELECT * FROM test.users WHERE"),
            "Invalid WHERE clause format."
        );
        assert_eq!(
            parse_err("SELECT * FROM test.users WHERE a = 1 = 2"),
            "Invalid WHERE clause format."
        );
    }

    #[test]
    fn test_dispatch_errors() {
        assert_eq!(parse_err(""), "Empty AQL query.");
        assert_eq!(parse_err("   ;"), "Empty AQL query.");
        assert_eq!(parse_err("drop index x"), "Unsupported AQL command: DROP");
    }

    #[test]
    fn test_insert() {
        let stmt = match StatementBuilder::build(
            "INSERT INTO test.users (name, age) VALUES ('John Doe', 30)",
        )
        .unwrap()
        {
            Statement::Insert(s) => s,
            other => panic!("Expected INSERT, got {:?}", other),
        };
        assert_eq!(stmt.namespace, "test");
        assert_eq!(stmt.columns, vec!["name", "age"]);
        assert_eq!(
            stmt.values,
            vec![Literal::Str("John Doe".into()), Literal::Int(30)]
        );
    }

    #[test]
    fn test_insert_quoted_comma() {
        let stmt = match StatementBuilder::build(
            "insert into test.users (Pk, city) values ('u1', 'Paris, France')",
        )
        .unwrap()
        {
            Statement::Insert(s) => s,
            other => panic!("Expected INSERT, got {:?}", other),
        };
        assert_eq!(stmt.values[1], Literal::Str("Paris, France".into()));
    }

    #[test]
    fn test_insert_errors() {
        assert_eq!(parse_err("INSERT test.users (a) VALUES (1)"), "Unsupported INSERT syntax.");
        assert_eq!(parse_err("INSERT INTO users (a) VALUES (1)"), "Invalid INSERT INTO syntax.");
        assert_eq!(
            parse_err("INSERT INTO a.b.c (a) VALUES (1)"),
            "Invalid namespace.set format in INSERT."
        );
        assert_eq!(parse_err("INSERT INTO test.users a VALUES (1)"), "Invalid INSERT INTO syntax.");
        assert_eq!(parse_err("INSERT INTO test.users (a) (1)"), "Invalid INSERT INTO syntax.");
        assert_eq!(parse_err("INSERT INTO test.users (a) VALUES (1"), "Invalid INSERT INTO syntax.");
        assert_eq!(
            parse_err("INSERT INTO test.users (a) VALUES (1) extra"),
            "Invalid INSERT INTO syntax."
        );
        assert_eq!(
            parse_err("INSERT INTO test.users (a, b) VALUES (1)"),
            "Number of bin names does not match number of values."
        );
        assert_eq!(
            parse_err("INSERT INTO test.users (a, b) VALUES (1, )"),
            "Error parsing value: "
        );
    }

    #[test]
    fn test_delete() {
        let stmt = match StatementBuilder::build("DELETE FROM test.users WHERE city = 'Paris'")
            .unwrap()
        {
            Statement::Delete(s) => s,
            other => panic!("Expected DELETE, got {:?}", other),
        };
        assert_eq!(stmt.predicate, Equality::new("city", Literal::Str("Paris".into())));
    }

    #[test]
    fn test_delete_errors() {
        assert_eq!(parse_err("DELETE test.users WHERE a = 'x'"), "Unsupported DELETE syntax.");
        assert_eq!(parse_err("DELETE FROM users WHERE a = 'x'"), "Invalid DELETE FROM syntax.");
        assert_eq!(
            parse_err("DELETE FROM .users WHERE a = 'x'"),
            "Invalid namespace.set format in DELETE."
        );
        assert_eq!(
            parse_err("DELETE FROM test.users"),
            "DELETE requires a WHERE clause in this basic implementation."
        );
        assert_eq!(
            parse_err("DELETE FROM test.users WHERE a"),
            "Invalid WHERE clause in DELETE."
        );
        assert_eq!(
            parse_err("DELETE FROM test.users WHERE age = 30"),
            "DELETE WHERE value must be a string for this basic implementation."
        );
        assert_eq!(
            parse_err("DELETE FROM test.users WHERE age = 3.5"),
            "DELETE WHERE value must be a string for this basic implementation."
        );
    }

    #[test]
    fn test_update() {
        let stmt = update("UPDATE test.users SET age = 31, name = 'Bob' WHERE pk = 'u1'");
        assert_eq!(stmt.assignments.len(), 2);
        assert_eq!(stmt.assignments["age"].value, Literal::Int(31));
        assert_eq!(stmt.assignments["name"].value, Literal::Str("Bob".into()));
        assert_eq!(stmt.assignments["name"].text, "Bob");
        assert_eq!(stmt.predicate.value, Literal::Str("u1".into()));
    }

    #[test]
    fn test_update_last_duplicate_wins() {
        let stmt = update("UPDATE test.users SET age = 1, age = 2 WHERE pk = 'u1'");
        assert_eq!(stmt.assignments.len(), 1);
        assert_eq!(stmt.assignments["age"].value, Literal::Int(2));
    }

    #[test]
    fn test_update_drops_key_bin() {
        let stmt = update("UPDATE test.users SET key = 'x', age = 2 WHERE pk = 'u1'");
        assert!(!stmt.assignments.contains_key("key"));
        assert_eq!(
            parse_err("UPDATE test.users SET KEY = 'x' WHERE pk = 'u1'"),
            "No bins to update."
        );
    }

    #[test]
    fn test_update_quoted_set_value() {
        let stmt = update("UPDATE test.users SET note = 'a, b = c WHERE d' WHERE pk = 'u1'");
        assert_eq!(stmt.assignments["note"].value, Literal::Str("a, b = c WHERE d".into()));
    }

    #[test]
    fn test_update_set_value_keeps_written_text() {
        let stmt = update("UPDATE test.users SET name = 007, age = 3.50 WHERE pk = 'u1'");
        assert_eq!(stmt.assignments["name"].value, Literal::Int(7));
        assert_eq!(stmt.assignments["name"].text, "007");
        assert_eq!(stmt.assignments["age"].value, Literal::Float(3.5));
        assert_eq!(stmt.assignments["age"].text, "3.50");
    }

    #[test]
    fn test_repeated_where_rejected() {
        assert_eq!(
            parse_err("DELETE FROM test.users WHERE city = x WHERE y"),
            "Invalid WHERE clause in DELETE."
        );
        assert_eq!(
            parse_err("DELETE FROM test.users WHERE city = 'x' WHERE city = 'y'"),
            "Invalid WHERE clause in DELETE."
        );
        assert_eq!(
            parse_err("UPDATE test.users SET a = 1 WHERE pk = u1 WHERE z"),
            "Invalid WHERE clause in UPDATE."
        );

        // Inside quotes the word is data
        let stmt = update("UPDATE test.users SET a = 1 WHERE pk = 'u1 WHERE z'");
        assert_eq!(stmt.key().user_key, "u1 WHERE z");
    }

    #[test]
    fn test_update_errors() {
        assert_eq!(parse_err("UPDATE users SET a = 1 WHERE pk = 'u'"), "Unsupported UPDATE syntax.");
        assert_eq!(
            parse_err("UPDATE a.b.c SET a = 1 WHERE pk = 'u'"),
            "Invalid UPDATE namespace.set format."
        );
        assert_eq!(
            parse_err("UPDATE test.users a = 1 WHERE pk = 'u'"),
            "Invalid UPDATE syntax (missing SET or WHERE)."
        );
        assert_eq!(
            parse_err("UPDATE test.users WHERE pk = 'u' SET a = 1"),
            "Invalid UPDATE syntax (missing SET or WHERE)."
        );
        assert_eq!(
            parse_err("UPDATE test.users SET a WHERE pk = 'u'"),
            "Invalid bin=value pair in SET clause: a"
        );
        assert_eq!(
            parse_err("UPDATE test.users SET a = WHERE pk = 'u'"),
            "Error parsing value in SET clause: a ="
        );
        assert_eq!(
            parse_err("UPDATE test.users SET a = 1 WHERE pk"),
            "Invalid WHERE clause in UPDATE."
        );
        assert_eq!(
            parse_err("UPDATE test.users SET a = 1 WHERE pk = 5"),
            "Key value in WHERE clause must be a string for this basic implementation."
        );
        assert_eq!(
            parse_err("UPDATE test.users SET WHERE pk = 'u'"),
            "No bins to update."
        );
    }

    #[test]
    fn test_parse_namespace_set() {
        assert_eq!(
            parse_namespace_set("test.users"),
            Some(("test".to_string(), "users".to_string()))
        );
        assert_eq!(parse_namespace_set("test."), None);
        assert_eq!(parse_namespace_set("test"), None);
        assert_eq!(parse_namespace_set("a.b.c"), None);
    }
}
