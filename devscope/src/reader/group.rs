//! Indexed table reads.
//!
//! A [`GroupReader`] holds a tree of labelled OID columns. Reading it walks
//! (or GETs) every column and merges the cells into rows keyed by the OID
//! index:
//!
//! ```text
//!  ifDescr  1.3.6.1.2.1.2.2.1.2   .1 = "ether1"   .2 = "ether2"
//!  ifMtu    1.3.6.1.2.1.2.2.1.4   .1 = 1500       .2 = 9000
//!  radio/
//!    level_in  ...                .2 = -40
//!                    │
//!                    ▼
//!  row "1": { ifDescr: ether1, ifMtu: 1500 }
//!  row "2": { ifDescr: ether2, ifMtu: 9000, radio: { level_in: -40 } }
//! ```

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use indexmap::IndexMap;
use indexmap::map::Entry;
use log::{debug, trace};
use regex::Regex;

use super::{PropertyFilter, split_path};
use crate::context::OperationContext;
use crate::error::{Error, Result, ValueError};
use crate::oid::{Oid, cmp_index};
use crate::operator::OperatorPipeline;
use crate::value::Value;

/// A cell of a row: a value or a nested record.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyNode {
    Value(Value),
    Map(Row),
}

/// Labelled cells of one row.
pub type Row = IndexMap<String, PropertyNode>;

/// One table row.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRow {
    pub index: String,
    pub values: Row,
}

/// One OID column.
#[derive(Debug, Clone)]
pub struct LeafReader {
    pub oid: Oid,
    pub use_raw_result: bool,
    pub operators: OperatorPipeline,
    /// Column whose index is the row index and whose value is the index of
    /// this column's entries.
    pub indices_mapping: Option<Box<LeafReader>>,
}

impl LeafReader {
    pub fn new(oid: Oid) -> Self {
        Self {
            oid,
            use_raw_result: false,
            operators: OperatorPipeline::default(),
            indices_mapping: None,
        }
    }

    /// Read the column as `index → value`.
    ///
    /// With `indices`, only those rows are fetched by GET; otherwise the
    /// column is walked.
    fn read<'a>(
        &'a self,
        ctx: &'a OperationContext,
        indices: Option<&'a [String]>,
        skip_empty: bool,
    ) -> BoxFuture<'a, Result<IndexMap<String, Value>>> {
        async move {
            let responses = match indices {
                Some(indices) if self.indices_mapping.is_none() => {
                    let oids = indices
                        .iter()
                        .map(|i| self.oid.append_index(i))
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    ctx.snmp_get_many(&oids).await?
                }
                _ => match ctx.snmp_walk(&self.oid).await {
                    Ok(responses) => responses,
                    Err(e) if e.is_not_found() => Vec::new(),
                    Err(e) => return Err(e),
                },
            };

            let mut column = IndexMap::new();
            for response in responses.iter().filter(|r| r.is_successful()) {
                let Some(index) = response.oid.index_after(&self.oid) else {
                    continue;
                };
                let raw = response.to_value(self.use_raw_result);
                match self.operators.apply(ctx, raw).await {
                    Ok(value) if skip_empty && value.is_empty() => {}
                    Ok(value) => {
                        column.insert(index.to_string(), value);
                    }
                    Err(e) if e.is_unavailable() || matches!(e, Error::Value(_)) => {
                        trace!("dropping {}: {e}", response.oid);
                    }
                    Err(e) => return Err(e),
                }
            }

            let Some(mapping) = &self.indices_mapping else {
                return Ok(column);
            };
            let targets = mapping.read(ctx, None, true).await?;
            let mut related_to_target: IndexMap<String, String> = IndexMap::new();
            for (target, related) in targets {
                match related_to_target.entry(related.to_string()) {
                    Entry::Occupied(e) => {
                        return Err(ValueError::DuplicateIndex(e.key().clone()).into());
                    }
                    Entry::Vacant(e) => {
                        e.insert(target);
                    }
                }
            }

            let mut rekeyed = IndexMap::new();
            for (related, value) in column {
                let Some(target) = related_to_target.get(&related) else {
                    trace!("no mapped index for {}.{related}", self.oid);
                    continue;
                };
                if indices.is_some_and(|wanted| !wanted.contains(target)) {
                    continue;
                }
                rekeyed.insert(target.clone(), value);
            }
            Ok(rekeyed)
        }
        .boxed()
    }
}

/// A node of the column tree.
#[derive(Debug, Clone)]
pub enum OidReader {
    Leaf(LeafReader),
    Map(IndexMap<String, OidReader>),
}

/// Reads an indexed table into rows.
#[derive(Debug, Clone, Default)]
pub struct GroupReader {
    index: Option<Oid>,
    values: IndexMap<String, OidReader>,
    skip_empty: bool,
}

impl GroupReader {
    pub fn new(values: IndexMap<String, OidReader>) -> Self {
        Self {
            index: None,
            values,
            skip_empty: false,
        }
    }

    /// Column enumerating the row indices.
    pub fn with_index(mut self, index: Oid) -> Self {
        self.index = Some(index);
        self
    }

    /// Drop cells whose final value is empty.
    pub fn skip_empty(mut self, enabled: bool) -> Self {
        self.skip_empty = enabled;
        self
    }

    pub fn values(&self) -> &IndexMap<String, OidReader> {
        &self.values
    }

    /// Read all rows, ordered by index.
    pub async fn read(
        &self,
        ctx: &OperationContext,
        filters: &[PropertyFilter],
    ) -> Result<Vec<GroupRow>> {
        ctx.ensure_active()?;

        let mut tree = self.values.clone();
        for filter in filters {
            match filter {
                PropertyFilter::Value { path } => remove_path(&mut tree, &split_path(path)),
                PropertyFilter::ExclusiveValue { paths } => {
                    let paths: Vec<Vec<&str>> = paths.iter().map(|p| split_path(p)).collect();
                    retain_paths(&mut tree, &paths);
                }
                PropertyFilter::Group { .. } => {}
            }
        }

        let group_filters: Vec<(&str, &Regex)> = filters
            .iter()
            .filter_map(|f| match f {
                PropertyFilter::Group { key, regex } => Some((key.as_str(), regex)),
                _ => None,
            })
            .collect();

        let wanted = if ctx.gets_instead_of_walk() || !group_filters.is_empty() {
            self.wanted_indices(ctx, &group_filters).await?
        } else {
            None
        };
        if let Some(wanted) = &wanted {
            debug!("reading {} selected rows", wanted.len());
            if wanted.is_empty() {
                return Ok(Vec::new());
            }
        }

        let mut rows = read_tree(ctx, &tree, wanted.as_deref(), self.skip_empty).await?;
        rows.sort_by(|a, _, b, _| cmp_index(a, b));
        Ok(rows
            .into_iter()
            .map(|(index, values)| GroupRow { index, values })
            .collect())
    }

    /// Indices to GET, or `None` to walk every column.
    async fn wanted_indices(
        &self,
        ctx: &OperationContext,
        group_filters: &[(&str, &Regex)],
    ) -> Result<Option<Vec<String>>> {
        let mut wanted: Option<Vec<String>> = None;

        for (key, regex) in group_filters {
            let leaf = find_leaf(&self.values, &split_path(key))
                .ok_or_else(|| Error::InvalidFilter(format!("no column '{key}' to filter on")))?;
            let column = leaf.read(ctx, wanted.as_deref(), false).await?;
            let kept: Vec<String> = column
                .into_iter()
                .filter(|(_, value)| !regex.is_match(&value.as_str()))
                .map(|(index, _)| index)
                .collect();
            trace!("filter on '{key}' keeps {} rows", kept.len());
            wanted = Some(kept);
        }

        if wanted.is_none() {
            if let Some(index) = &self.index {
                let column = LeafReader::new(index.clone()).read(ctx, None, false).await?;
                wanted = Some(column.into_keys().collect());
            }
        }
        Ok(wanted)
    }
}

fn read_tree<'a>(
    ctx: &'a OperationContext,
    tree: &'a IndexMap<String, OidReader>,
    wanted: Option<&'a [String]>,
    skip_empty: bool,
) -> BoxFuture<'a, Result<IndexMap<String, Row>>> {
    async move {
        let mut rows: IndexMap<String, Row> = IndexMap::new();
        for (label, reader) in tree {
            match reader {
                OidReader::Leaf(leaf) => {
                    for (index, value) in leaf.read(ctx, wanted, skip_empty).await? {
                        rows.entry(index)
                            .or_default()
                            .insert(label.clone(), PropertyNode::Value(value));
                    }
                }
                OidReader::Map(children) => {
                    for (index, row) in read_tree(ctx, children, wanted, skip_empty).await? {
                        rows.entry(index)
                            .or_default()
                            .insert(label.clone(), PropertyNode::Map(row));
                    }
                }
            }
        }
        Ok(rows)
    }
    .boxed()
}

fn find_leaf<'a>(tree: &'a IndexMap<String, OidReader>, path: &[&str]) -> Option<&'a LeafReader> {
    match (path.split_first()?, tree) {
        ((first, []), tree) => match tree.get(*first)? {
            OidReader::Leaf(leaf) => Some(leaf),
            OidReader::Map(_) => None,
        },
        ((first, rest), tree) => match tree.get(*first)? {
            OidReader::Map(children) => find_leaf(children, rest),
            OidReader::Leaf(_) => None,
        },
    }
}

fn remove_path(tree: &mut IndexMap<String, OidReader>, path: &[&str]) {
    match path {
        [] => {}
        [last] => {
            tree.shift_remove(*last);
        }
        [first, rest @ ..] => {
            if let Some(OidReader::Map(children)) = tree.get_mut(*first) {
                remove_path(children, rest);
            }
        }
    }
}

fn retain_paths(tree: &mut IndexMap<String, OidReader>, paths: &[Vec<&str>]) {
    tree.retain(|label, reader| {
        let below: Vec<Vec<&str>> = paths
            .iter()
            .filter(|p| p.first() == Some(&label.as_str()))
            .map(|p| p[1..].to_vec())
            .collect();
        if below.is_empty() {
            return false;
        }
        if !below.iter().any(Vec::is_empty) {
            if let OidReader::Map(children) = reader {
                retain_paths(children, &below);
            }
        }
        true
    });
}
