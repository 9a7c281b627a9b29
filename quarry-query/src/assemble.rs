//! Reassembling flat driver rows into nested records.
//!
//! Each column is attributed to an alias: a label of the form
//! `Alias__column` names its alias directly, otherwise the table the driver
//! reported is used. Reported names are mapped back to query aliases through
//! an [`AliasMap`]. The primary table's columns (and columns with no alias at
//! all, such as computed ones) land at the top level; every other alias gets
//! a nested record.
//!
//! Rows from drivers without column metadata come back flat. That is never
//! an error.

use indexmap::IndexMap;
use tracing::debug;

use crate::query::Query;
use crate::row::{ALIAS_SEPARATOR, RawRow, Record};
use crate::value::Value;

/// Table-to-alias lookups for one query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AliasMap {
    primary: String,
    by_table: IndexMap<String, String>,
    by_lower_alias: IndexMap<String, String>,
}

impl AliasMap {
    /// Build the map from a query's table and its joins.
    pub fn from_query(query: &Query) -> Self {
        let mut map = Self {
            primary: query.alias_name().to_string(),
            ..Self::default()
        };
        map.add(query.table(), query.alias_name());
        for join in query.joins() {
            map.add(join.table(), join.alias_name());
        }
        map
    }

    /// Record a table and the alias it is addressed by.
    pub fn add(&mut self, table: &str, alias: &str) {
        self.by_table.insert(table.to_string(), alias.to_string());
        self.by_lower_alias.insert(alias.to_lowercase(), alias.to_string());
    }

    /// The primary table's alias.
    pub fn primary(&self) -> &str {
        &self.primary
    }

    /// Resolve a reported name: exact table name, then case-insensitive
    /// alias, then the name itself.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        if let Some(alias) = self.by_table.get(name) {
            return alias;
        }
        if let Some(alias) = self.by_lower_alias.get(&name.to_lowercase()) {
            return alias;
        }
        name
    }
}

/// Turns raw rows into records for one query.
#[derive(Debug, Clone)]
pub struct Assembler {
    aliases: AliasMap,
}

impl Assembler {
    /// Create an assembler for a query.
    pub fn new(query: &Query) -> Self {
        Self::with_aliases(AliasMap::from_query(query))
    }

    /// Create an assembler from a prepared alias map.
    pub fn with_aliases(aliases: AliasMap) -> Self {
        Self { aliases }
    }

    /// The alias map in use.
    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    /// Assemble one row.
    pub fn assemble_row(&self, row: RawRow) -> Record {
        match row {
            RawRow::Undescribed(pairs) => {
                let mut record = Record::new();
                for (name, value) in pairs {
                    record.insert(name, value);
                }
                record
            }
            RawRow::Described(columns) => {
                let mut groups: IndexMap<String, Vec<(String, Value)>> = IndexMap::new();
                for column in columns {
                    let split = column
                        .label
                        .split_once(ALIAS_SEPARATOR)
                        .map(|(alias, name)| (self.aliases.resolve(alias).to_string(), name.to_string()));
                    let (alias, name) = match split {
                        Some(pair) => pair,
                        None => {
                            let alias = match column.table.as_deref() {
                                Some(table) if !table.is_empty() => self.aliases.resolve(table).to_string(),
                                _ => String::new(),
                            };
                            (alias, column.label)
                        }
                    };
                    groups.entry(alias).or_default().push((name, column.value));
                }

                let mut record = Record::new();
                for (alias, fields) in groups {
                    let target = if alias.is_empty() || alias == self.aliases.primary() {
                        &mut record
                    } else {
                        record.related_mut(&alias)
                    };
                    for (name, value) in fields {
                        target.insert(name, value);
                    }
                }
                record
            }
        }
    }

    /// Assemble rows lazily.
    pub fn iter<I>(&self, rows: I) -> Records<'_, I::IntoIter>
    where
        I: IntoIterator<Item = RawRow>,
    {
        Records {
            assembler: self,
            rows: rows.into_iter(),
            reported_degraded: false,
        }
    }
}

/// Lazy iterator of assembled records.
#[derive(Debug)]
pub struct Records<'a, I> {
    assembler: &'a Assembler,
    rows: I,
    reported_degraded: bool,
}

impl<I: Iterator<Item = RawRow>> Iterator for Records<'_, I> {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        let row = self.rows.next()?;
        if matches!(row, RawRow::Undescribed(_)) && !self.reported_degraded {
            self.reported_degraded = true;
            debug!(
                primary = %self.assembler.aliases.primary(),
                "Driver reported no column metadata; returning flat records"
            );
        }
        Some(self.assembler.assemble_row(row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

/// Assemble every row of a result for the query that produced it.
pub fn assemble(rows: impl IntoIterator<Item = RawRow>, query: &Query) -> Vec<Record> {
    Assembler::new(query).iter(rows).collect()
}
