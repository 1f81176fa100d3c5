//! Prerequisite expressions: a boolean AND/OR combination of references to
//! other learning units, attached to a leaf node.
//!
//! The canonical textual form uses the French operators `ET` and `OU`:
//! `LDROI1001 ET (LPSP1002 OU LPSP1003)`. Group operators are always the
//! complement of the main operator (AND of OR-groups, or OR of AND-groups).

use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::node::NodeId;

const ACRONYM_PATTERN: &str = r"^[A-Z]{2,5}[0-9]{4}[A-Z0-9]{0,2}$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    And,
    Or,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::And => "ET",
            Operator::Or => "OU",
        }
    }

    pub fn complement(&self) -> Operator {
        match self {
            Operator::And => Operator::Or,
            Operator::Or => Operator::And,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a learning unit by (code, year).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerequisiteItem {
    pub code: String,
    pub year: i32,
}

impl PrerequisiteItem {
    pub fn new(code: impl Into<String>, year: i32) -> Self {
        Self {
            code: code.into(),
            year,
        }
    }

    pub fn node_id(&self) -> NodeId {
        NodeId::new(self.code.clone(), self.year)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrerequisiteItemGroup {
    pub operator: Operator,
    pub items: Vec<PrerequisiteItem>,
}

impl PrerequisiteItemGroup {
    pub fn new(operator: Operator) -> Self {
        Self {
            operator,
            items: Vec::new(),
        }
    }

    pub fn add_prerequisite_item(&mut self, code: impl Into<String>, year: i32) {
        self.items.push(PrerequisiteItem::new(code, year));
    }

    pub fn is_satisfied(&self, acquired: &BTreeSet<NodeId>) -> bool {
        match self.operator {
            Operator::And => self.items.iter().all(|i| acquired.contains(&i.node_id())),
            Operator::Or => self.items.iter().any(|i| acquired.contains(&i.node_id())),
        }
    }
}

impl fmt::Display for PrerequisiteItemGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .items
            .iter()
            .map(|i| i.code.as_str())
            .join(&format!(" {} ", self.operator));
        if self.items.len() > 1 {
            write!(f, "({})", joined)
        } else {
            f.write_str(&joined)
        }
    }
}

/// The full expression: groups combined by `main_operator`.
///
/// Two prerequisites are equal iff their canonical string forms match,
/// which is what postponement conflict detection relies on.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Prerequisite {
    pub main_operator: Operator,
    pub groups: Vec<PrerequisiteItemGroup>,
}

impl PartialEq for Prerequisite {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}

impl Prerequisite {
    pub fn new(main_operator: Operator) -> Self {
        Self {
            main_operator,
            groups: Vec::new(),
        }
    }

    /// Append a group. A single-item group carries no observable operator
    /// of its own, so it is normalized to the complement of the main
    /// operator; equality then agrees with the canonical string form.
    pub fn add_prerequisite_item_group(&mut self, mut group: PrerequisiteItemGroup) {
        if group.items.len() == 1 {
            group.operator = self.main_operator.complement();
        }
        self.groups.push(group);
    }

    pub fn is_empty(&self) -> bool {
        self.groups.iter().all(|g| g.items.is_empty())
    }

    pub fn items(&self) -> impl Iterator<Item = &PrerequisiteItem> {
        self.groups.iter().flat_map(|g| g.items.iter())
    }

    /// Evaluate against a set of acquired learning units.
    pub fn is_satisfied(&self, acquired: &BTreeSet<NodeId>) -> bool {
        match self.main_operator {
            Operator::And => self.groups.iter().all(|g| g.is_satisfied(acquired)),
            Operator::Or => self.groups.iter().any(|g| g.is_satisfied(acquired)),
        }
    }

    /// Parse the canonical form. All referenced units get `year`.
    ///
    /// The main operator must be uniform at the top level, and every
    /// parenthesized group must use its complement.
    pub fn parse(expression: &str, year: i32) -> DomainResult<Self> {
        Parser::new(expression)?.parse(year)
    }
}

impl fmt::Display for Prerequisite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .groups
            .iter()
            .map(|g| g.to_string())
            .join(&format!(" {} ", self.main_operator));
        f.write_str(&joined)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Op(Operator),
    Code(String),
}

struct Parser {
    tokens: Vec<Token>,
    source: String,
}

impl Parser {
    fn new(expression: &str) -> DomainResult<Self> {
        let source = expression.trim().to_string();
        if source.is_empty() {
            return Err(DomainError::InvalidExpression("empty expression".into()));
        }
        let acronym = Regex::new(ACRONYM_PATTERN).unwrap();
        let mut tokens = Vec::new();
        for raw in source
            .replace('(', " ( ")
            .replace(')', " ) ")
            .split_whitespace()
        {
            let token = match raw {
                "(" => Token::Open,
                ")" => Token::Close,
                "ET" => Token::Op(Operator::And),
                "OU" => Token::Op(Operator::Or),
                code if acronym.is_match(code) => Token::Code(code.to_string()),
                other => {
                    return Err(DomainError::InvalidExpression(format!(
                        "unexpected token '{}' in '{}'",
                        other, source
                    )))
                }
            };
            tokens.push(token);
        }
        Ok(Self { tokens, source })
    }

    fn invalid(&self, reason: &str) -> DomainError {
        DomainError::InvalidExpression(format!("{}: '{}'", reason, self.source))
    }

    fn parse(&self, year: i32) -> DomainResult<Prerequisite> {
        let mut main_operator: Option<Operator> = None;
        let mut groups: Vec<PrerequisiteItemGroup> = Vec::new();
        let mut expect_term = true;
        let mut pos = 0;

        while pos < self.tokens.len() {
            match (&self.tokens[pos], expect_term) {
                (Token::Code(code), true) => {
                    // A bare code is a single-item group; its operator is
                    // fixed once the main operator is known.
                    let mut group = PrerequisiteItemGroup::new(
                        main_operator.map(|op| op.complement()).unwrap_or(Operator::And),
                    );
                    group.add_prerequisite_item(code.clone(), year);
                    groups.push(group);
                    expect_term = false;
                    pos += 1;
                }
                (Token::Open, true) => {
                    let (group, consumed) = self.parse_group(pos + 1, year)?;
                    if let Some(main) = main_operator {
                        if group.operator == main {
                            return Err(
                                self.invalid("group operator must differ from main operator")
                            );
                        }
                    }
                    groups.push(group);
                    expect_term = false;
                    pos = consumed;
                }
                (Token::Op(op), false) => {
                    match main_operator {
                        None => {
                            main_operator = Some(*op);
                            // Retrofit single-item groups created before the
                            // main operator was known.
                            for group in groups.iter_mut().filter(|g| g.items.len() == 1) {
                                group.operator = op.complement();
                            }
                        }
                        Some(main) if main != *op => {
                            return Err(self.invalid("mixed operators at top level"))
                        }
                        Some(_) => {}
                    }
                    expect_term = true;
                    pos += 1;
                }
                _ => return Err(self.invalid("malformed expression")),
            }
        }

        if expect_term {
            return Err(self.invalid("expression ends with an operator"));
        }
        // Single-group expressions default to the complement of the group.
        let main_operator = main_operator.unwrap_or_else(|| {
            groups
                .first()
                .map(|g| g.operator.complement())
                .unwrap_or(Operator::And)
        });
        // Single bare codes: group operator is the complement of main.
        let mut prerequisite = Prerequisite::new(main_operator);
        for mut group in groups {
            if group.items.len() == 1 {
                group.operator = main_operator.complement();
            }
            prerequisite.add_prerequisite_item_group(group);
        }
        Ok(prerequisite)
    }

    /// Parse a parenthesized group starting after its `(`.
    /// Returns the group and the index just past its `)`.
    fn parse_group(&self, start: usize, year: i32) -> DomainResult<(PrerequisiteItemGroup, usize)> {
        let mut operator: Option<Operator> = None;
        let mut items: Vec<PrerequisiteItem> = Vec::new();
        let mut expect_term = true;
        let mut pos = start;

        loop {
            match self.tokens.get(pos) {
                Some(Token::Code(code)) if expect_term => {
                    items.push(PrerequisiteItem::new(code.clone(), year));
                    expect_term = false;
                    pos += 1;
                }
                Some(Token::Op(op)) if !expect_term => {
                    match operator {
                        None => operator = Some(*op),
                        Some(existing) if existing != *op => {
                            return Err(self.invalid("mixed operators inside a group"))
                        }
                        Some(_) => {}
                    }
                    expect_term = true;
                    pos += 1;
                }
                Some(Token::Close) if !expect_term => {
                    let operator = operator.ok_or_else(|| {
                        self.invalid("parenthesized group needs at least two items")
                    })?;
                    let mut group = PrerequisiteItemGroup::new(operator);
                    group.items = items;
                    return Ok((group, pos + 1));
                }
                _ => return Err(self.invalid("unbalanced or malformed group")),
            }
        }
    }
}
