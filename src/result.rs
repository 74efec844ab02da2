//! The result-set API surface (spec §6 "ResultSet API"): column metadata,
//! buffered and streaming row access, and the typed-conversion accessors
//! from spec §4.4.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::error::{Error, ErrorKind};
use crate::protocol::{ColumnDefinition, TypeId};
use crate::value::{binary_value_to_text, text_to_bool, text_to_f64, text_to_i64, MySqlDateTime};

/// How a column's binary value converts to a language scalar, per the
/// "MySQL column type" mapping table in spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnKind {
    Boolean,
    Integer,
    Float,
    DateTime,
    String,
}

fn column_kind(type_id: TypeId, max_size: u32) -> ColumnKind {
    match type_id {
        TypeId::TINY_INT if max_size == 1 => ColumnKind::Boolean,
        TypeId::TINY_INT
        | TypeId::SMALL_INT
        | TypeId::INT
        | TypeId::INT24
        | TypeId::BIG_INT
        | TypeId::YEAR => ColumnKind::Integer,
        TypeId::FLOAT | TypeId::DOUBLE => ColumnKind::Float,
        TypeId::DATE | TypeId::DATETIME | TypeId::TIMESTAMP => ColumnKind::DateTime,
        _ => ColumnKind::String,
    }
}

/// Publicly visible metadata for one result-set column.
#[derive(Debug, Clone)]
pub struct ColumnInfo {
    name: Option<String>,
}

impl ColumnInfo {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Shared, immutable per-result-set column metadata: every row in a
/// result set (or stream) holds an `Arc` to the same instance.
pub(crate) struct RowColumns {
    infos: Vec<ColumnInfo>,
    kinds: Vec<ColumnKind>,
    type_ids: Vec<TypeId>,
    is_binary: bool,
    by_lower_name: HashMap<String, usize>,
}

impl RowColumns {
    pub(crate) fn new(defs: &[ColumnDefinition], is_binary: bool) -> Self {
        let mut infos = Vec::with_capacity(defs.len());
        let mut kinds = Vec::with_capacity(defs.len());
        let mut type_ids = Vec::with_capacity(defs.len());
        let mut by_lower_name = HashMap::with_capacity(defs.len());

        for (i, def) in defs.iter().enumerate() {
            let name = def.name().map(|s| s.to_owned());
            if let Some(name) = &name {
                by_lower_name.insert(name.to_ascii_lowercase(), i);
            }
            infos.push(ColumnInfo { name });
            kinds.push(column_kind(def.type_id, def.max_size));
            type_ids.push(def.type_id);
        }

        Self {
            infos,
            kinds,
            type_ids,
            is_binary,
            by_lower_name,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.infos.len()
    }
}

fn index_err(i: usize, len: usize) -> Error {
    Error::client(
        ErrorKind::InvalidArgument,
        format!("column index {i} out of range (result set has {len} columns)"),
    )
}

fn name_err(name: &str) -> Error {
    Error::client(
        ErrorKind::InvalidArgument,
        format!("no column named {name:?} in this result set"),
    )
}

/// One row of a result set, text or binary protocol (spec §6 "ResultSetRow").
///
/// Raw column bytes are retained alongside their decoded text so that a
/// caller handling a `BLOB` that isn't valid UTF-8 can still get at the
/// bytes (spec §9 open question: "a binary-safe row accessor is
/// recommended but not required").
pub struct ResultSetRow {
    columns: Arc<RowColumns>,
    raw: Vec<Option<Box<[u8]>>>,
}

impl ResultSetRow {
    pub(crate) fn new(columns: Arc<RowColumns>, raw: Vec<Option<Box<[u8]>>>) -> Self {
        Self { columns, raw }
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// The raw bytes backing a column, exactly as received on the wire
    /// (the type-specific binary encoding for the binary protocol, or the
    /// raw text bytes for the text protocol). `None` if the column is
    /// `NULL` or out of range.
    pub fn col_bytes_at(&self, index: usize) -> Option<&[u8]> {
        self.raw.get(index).and_then(|o| o.as_deref())
    }

    fn text_at(&self, index: usize) -> Result<Option<String>, Error> {
        let bytes = match self.raw.get(index) {
            Some(Some(b)) => b,
            Some(None) => return Ok(None),
            None => return Err(index_err(index, self.raw.len())),
        };

        if self.columns.is_binary {
            Ok(Some(binary_value_to_text(bytes, self.columns.type_ids[index])?))
        } else {
            let s = std::str::from_utf8(bytes).map_err(|_| {
                Error::client(
                    ErrorKind::UnexpectedPayload,
                    "column value is not valid utf-8 text",
                )
            })?;
            Ok(Some(s.to_owned()))
        }
    }

    fn index_of(&self, name: &str) -> Result<usize, Error> {
        self.columns
            .by_lower_name
            .get(&name.to_ascii_lowercase())
            .copied()
            .ok_or_else(|| name_err(name))
    }

    /// Canonical textual form of column `index` (spec §4.4).
    pub fn col_at(&self, index: usize) -> Result<Option<String>, Error> {
        if index >= self.raw.len() {
            return Err(index_err(index, self.raw.len()));
        }
        self.text_at(index)
    }

    /// Case-insensitive name lookup (spec §6).
    pub fn col_by_name(&self, name: &str) -> Result<Option<String>, Error> {
        self.text_at(self.index_of(name)?)
    }

    /// All columns as a name → text map.
    pub fn assoc(&self) -> Result<HashMap<String, Option<String>>, Error> {
        let mut out = HashMap::with_capacity(self.raw.len());
        for (i, info) in self.columns.infos.iter().enumerate() {
            if let Some(name) = &info.name {
                out.insert(name.clone(), self.text_at(i)?);
            }
        }
        Ok(out)
    }

    /// Strict boolean conversion: only from a `TINY(1)` column (spec §4.4).
    pub fn bool_at(&self, index: usize) -> Result<Option<bool>, Error> {
        if index >= self.raw.len() {
            return Err(index_err(index, self.raw.len()));
        }
        if self.columns.kinds[index] != ColumnKind::Boolean {
            return Err(Error::client(
                ErrorKind::UnexpectedPayload,
                "column is not a boolean (TINY(1)) column",
            ));
        }
        match self.text_at(index)? {
            None => Ok(None),
            Some(text) => Ok(Some(text_to_bool(&text)?)),
        }
    }

    /// Strict integer conversion: only from an integer-typed column.
    pub fn int_at(&self, index: usize) -> Result<Option<i64>, Error> {
        if index >= self.raw.len() {
            return Err(index_err(index, self.raw.len()));
        }
        if !matches!(
            self.columns.kinds[index],
            ColumnKind::Integer | ColumnKind::Boolean
        ) {
            return Err(Error::client(
                ErrorKind::UnexpectedPayload,
                "column is not an integer column",
            ));
        }
        match self.text_at(index)? {
            None => Ok(None),
            Some(text) => Ok(Some(text_to_i64(&text)?)),
        }
    }

    /// Floating-point conversion: from integer, `FLOAT`, or `DOUBLE` columns.
    pub fn float_at(&self, index: usize) -> Result<Option<f64>, Error> {
        if index >= self.raw.len() {
            return Err(index_err(index, self.raw.len()));
        }
        if !matches!(
            self.columns.kinds[index],
            ColumnKind::Integer | ColumnKind::Float | ColumnKind::Boolean
        ) {
            return Err(Error::client(
                ErrorKind::UnexpectedPayload,
                "column is not a numeric column",
            ));
        }
        match self.text_at(index)? {
            None => Ok(None),
            Some(text) => Ok(Some(text_to_f64(&text)?)),
        }
    }

    /// Date-time conversion: only from `DATE`/`DATETIME`/`TIMESTAMP` columns.
    pub fn date_time_at(&self, index: usize) -> Result<Option<MySqlDateTime>, Error> {
        if index >= self.raw.len() {
            return Err(index_err(index, self.raw.len()));
        }
        if self.columns.kinds[index] != ColumnKind::DateTime {
            return Err(Error::client(
                ErrorKind::UnexpectedPayload,
                "column is not a date/time column",
            ));
        }
        let bytes = match self.raw[index].as_deref() {
            None => return Ok(None),
            Some(b) => b,
        };

        if !self.columns.is_binary {
            return Err(Error::client(
                ErrorKind::Unsupported,
                "typed date-time access is only available for binary-protocol result sets",
            ));
        }

        crate::value::decode_date_time(bytes).map(Some)
    }
}

/// Buffered vs streaming row delivery (spec §4.7).
pub(crate) enum ResultSetBody {
    Buffered(Vec<ResultSetRow>),
    Streaming(RowStream),
}

/// A stream of rows for a result set executed with `iterable = true`.
/// Single-pass: once exhausted it yields `None` forever after.
pub struct RowStream {
    inner: Pin<Box<dyn Stream<Item = Result<ResultSetRow, Error>> + Send>>,
}

impl RowStream {
    pub(crate) fn new(
        inner: Pin<Box<dyn Stream<Item = Result<ResultSetRow, Error>> + Send>>,
    ) -> Self {
        Self { inner }
    }
}

impl Stream for RowStream {
    type Item = Result<ResultSetRow, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

/// A query or prepared-statement result (spec §6 "ResultSet API").
///
/// Multiple result sets (e.g. from a multi-statement query) are chained
/// through [`ResultSet::next`]; this link is only ever populated in
/// buffered mode.
pub struct ResultSet {
    columns: Arc<RowColumns>,
    affected_rows: u64,
    last_insert_id: u64,
    body: ResultSetBody,
    next: Option<Box<ResultSet>>,
}

impl ResultSet {
    pub(crate) fn new(
        columns: Arc<RowColumns>,
        affected_rows: u64,
        last_insert_id: u64,
        body: ResultSetBody,
    ) -> Self {
        Self {
            columns,
            affected_rows,
            last_insert_id,
            body,
            next: None,
        }
    }

    pub(crate) fn set_next(&mut self, next: ResultSet) {
        self.next = Some(Box::new(next));
    }

    pub fn num_of_columns(&self) -> usize {
        self.columns.len()
    }

    /// Defined only for buffered result sets; fails fast for streaming
    /// ones (spec §9 open question).
    pub fn num_of_rows(&self) -> Result<usize, Error> {
        match &self.body {
            ResultSetBody::Buffered(rows) => Ok(rows.len()),
            ResultSetBody::Streaming(_) => Err(Error::client(
                ErrorKind::Unsupported,
                "numOfRows is undefined for a streaming result set",
            )),
        }
    }

    pub fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    pub fn last_insert_id(&self) -> u64 {
        self.last_insert_id
    }

    pub fn cols(&self) -> &[ColumnInfo] {
        &self.columns.infos
    }

    pub fn rows(&self) -> Result<&[ResultSetRow], Error> {
        match &self.body {
            ResultSetBody::Buffered(rows) => Ok(rows),
            ResultSetBody::Streaming(_) => Err(Error::client(
                ErrorKind::UnexpectedState,
                "this result set is streaming; use rows_stream() instead",
            )),
        }
    }

    pub fn rows_stream(self) -> Result<RowStream, Error> {
        match self.body {
            ResultSetBody::Streaming(stream) => Ok(stream),
            ResultSetBody::Buffered(_) => Err(Error::client(
                ErrorKind::UnexpectedState,
                "this result set is buffered; use rows() instead",
            )),
        }
    }

    /// Take the next chained result set, if any (multi-result queries).
    pub fn next(&mut self) -> Option<ResultSet> {
        self.next.take().map(|b| *b)
    }
}
