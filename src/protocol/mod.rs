//! The wire-level packet types: decoders for everything the server sends,
//! encoders for everything the client sends. Nothing in this module talks
//! to a socket; see `crate::connection::stream` for the framer.
#![allow(dead_code)]

mod encode;

pub(crate) use encode::Encode;

mod auth_plugin;
mod capabilities;
mod field;
mod status;
mod type_id;

pub(crate) use auth_plugin::AuthPlugin;
pub(crate) use capabilities::Capabilities;
pub(crate) use field::FieldFlags;
pub(crate) use status::Status;
pub(crate) use type_id::TypeId;

mod com_init_db;
mod com_ping;
mod com_query;
mod com_quit;
mod com_stmt_close;
mod com_stmt_execute;
mod com_stmt_prepare;
mod handshake;

pub(crate) use com_init_db::ComInitDb;
pub(crate) use com_ping::ComPing;
pub(crate) use com_query::ComQuery;
pub(crate) use com_quit::ComQuit;
pub(crate) use com_stmt_close::ComStmtClose;
pub(crate) use com_stmt_execute::{ComStmtExecute, Cursor};
pub(crate) use com_stmt_prepare::ComStmtPrepare;
pub(crate) use handshake::Handshake;

mod auth_switch;
mod column_count;
mod column_def;
mod com_stmt_prepare_ok;
mod eof;
mod err;
mod handshake_response;
mod ok;
mod row;
mod ssl_request;

pub(crate) use auth_switch::AuthSwitch;
pub(crate) use column_count::ColumnCount;
pub(crate) use column_def::ColumnDefinition;
pub(crate) use com_stmt_prepare_ok::ComStmtPrepareOk;
pub(crate) use eof::EofPacket;
pub(crate) use err::ErrPacket;
pub(crate) use handshake_response::HandshakeResponse;
pub(crate) use ok::OkPacket;
pub(crate) use row::Row;
pub(crate) use ssl_request::SslRequest;
