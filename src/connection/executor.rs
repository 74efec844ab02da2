//! Drives a `COM_QUERY` or `COM_STMT_EXECUTE` exchange to completion and
//! assembles the result-set chain (spec §4.7's 5-state consumer:
//! `Initial, HaveColumnCount, HaveDefs, BetweenDefsAndRows, Done`).
//!
//! Grounded on `sqlx-core`'s `mysql/connection/executor.rs::run`, adapted
//! from its `try_stream!`-based loop to plain recursion/iteration since
//! `futures-async-stream` is not part of the retained dependency set; the
//! streaming path instead uses `futures_util::stream::unfold`, which keeps
//! row production pull-based (a slow consumer simply delays the next
//! socket read, giving the back-pressure spec §9 asks for without an
//! explicit channel).

use std::sync::Arc;

use futures_core::Stream;
use futures_util::stream;

use crate::connection::stream::MySqlStream;
use crate::connection::OperationLock;
use crate::error::Error;
use crate::protocol::{Capabilities, ColumnCount, ColumnDefinition, EofPacket, OkPacket, Row, Status, TypeId};
use crate::result::{ResultSet, ResultSetBody, ResultSetRow, RowColumns, RowStream};

/// One column-count-led result set's metadata, read once and shared by
/// every row decoded from it.
struct ResultMetadata {
    columns: Arc<RowColumns>,
    type_ids: Vec<TypeId>,
}

async fn read_metadata(
    stream: &mut MySqlStream,
    column_count: usize,
    is_binary: bool,
) -> Result<ResultMetadata, Error> {
    let mut defs = Vec::with_capacity(column_count);
    for _ in 0..column_count {
        let packet = stream.receive().await?;
        defs.push(ColumnDefinition::read(packet)?);
    }
    stream.maybe_receive_eof().await?;

    let type_ids = defs.iter().map(|d| d.type_id).collect();
    let columns = Arc::new(RowColumns::new(&defs, is_binary));

    Ok(ResultMetadata { columns, type_ids })
}

fn row_to_result_row(columns: &Arc<RowColumns>, row: Row) -> ResultSetRow {
    let raw = (0..row.len())
        .map(|i| row.get(i).map(|bytes| bytes.to_vec().into_boxed_slice()))
        .collect();

    ResultSetRow::new(Arc::clone(columns), raw)
}

/// Decode the status out of the frame that terminates a row sequence,
/// which is an `EofPacket` under the legacy protocol or an `OkPacket`
/// once `CLIENT_DEPRECATE_EOF` is negotiated (spec §3).
fn terminal_status(capabilities: Capabilities, packet: &[u8]) -> Result<Status, Error> {
    if capabilities.contains(Capabilities::DEPRECATE_EOF) {
        Ok(OkPacket::read(packet)?.status)
    } else {
        Ok(EofPacket::decode(packet)?.status)
    }
}

/// A terminator packet for a row sequence is header `0xFE` with a body
/// short enough that it cannot be a length-encoded column value (the
/// `0xFE` lenenc prefix alone commits to at least 8 more bytes); this
/// heuristic is exactly what `sqlx-core`'s executor uses.
fn is_row_terminator(packet: &[u8]) -> bool {
    packet.first() == Some(&0xFE) && packet.len() < 9
}

/// Run a command to completion, buffering every row of every chained
/// result set in memory.
pub(crate) async fn run_buffered(stream: &mut MySqlStream, is_binary: bool) -> Result<ResultSet, Error> {
    let mut result_sets = Vec::new();

    loop {
        let packet = stream.receive().await?;

        match packet.first().copied() {
            Some(0xFF) => return stream.handle_err(),

            Some(0xFB) => {
                return Err(Error::client(
                    crate::error::ErrorKind::Unsupported,
                    "LOCAL INFILE requests are not implemented",
                ))
            }

            Some(0x00) => {
                let ok = stream.handle_ok()?;
                let more = ok.status.contains(Status::SERVER_MORE_RESULTS_EXISTS);
                let columns = Arc::new(RowColumns::new(&[], is_binary));
                result_sets.push(ResultSet::new(
                    columns,
                    ok.affected_rows,
                    ok.last_insert_id,
                    ResultSetBody::Buffered(Vec::new()),
                ));
                if !more {
                    break;
                }
            }

            _ => {
                let column_count = ColumnCount::decode(packet)?.columns as usize;
                let metadata = read_metadata(stream, column_count, is_binary).await?;

                let mut rows = Vec::new();
                let more;
                loop {
                    let packet = stream.receive().await?;
                    if is_row_terminator(packet) {
                        let status = terminal_status(stream.capabilities, packet)?;
                        more = status.contains(Status::SERVER_MORE_RESULTS_EXISTS);
                        break;
                    }

                    let row = if is_binary {
                        Row::decode_binary(packet, &metadata.type_ids)?
                    } else {
                        Row::decode_text(packet, column_count)?
                    };
                    rows.push(row_to_result_row(&metadata.columns, row));
                }

                result_sets.push(ResultSet::new(metadata.columns, 0, 0, ResultSetBody::Buffered(rows)));
                if !more {
                    break;
                }
            }
        }
    }

    let mut iter = result_sets.into_iter().rev();
    let mut chain = iter.next().expect("at least one result set is always produced");
    for mut rs in iter {
        rs.set_next(chain);
        chain = rs;
    }
    Ok(chain)
}

/// Run a command, returning only the first result set with its rows
/// delivered lazily through a [`RowStream`] (spec §4.7's streaming mode).
/// Multi-result-set chaining is not meaningful in streaming mode (there is
/// no point at which a second result set's rows could be produced without
/// first driving the stream to completion), so only the first result set
/// is returned; subsequent ones are drained and discarded once the stream
/// finishes.
///
/// `io` is the connection's shared stream handle and `lock` is the
/// already-acquired operation lock (owned, or a reentrant marker when
/// called from inside a transaction body); both are carried inside the
/// returned stream's state so the lock is only released once the stream
/// is exhausted or dropped, matching spec §4.6's "held for the whole
/// request-through-final-response interval".
pub(crate) async fn run_streaming(
    io: Arc<tokio::sync::Mutex<MySqlStream>>,
    lock: OperationLock,
    is_binary: bool,
) -> Result<ResultSet, Error> {
    let mut guard = io.lock().await;
    let packet = guard.receive().await?;

    match packet.first().copied() {
        Some(0xFF) => return guard.handle_err(),

        Some(0xFB) => {
            return Err(Error::client(
                crate::error::ErrorKind::Unsupported,
                "LOCAL INFILE requests are not implemented",
            ))
        }

        Some(0x00) => {
            let ok = guard.handle_ok()?;
            let columns = Arc::new(RowColumns::new(&[], is_binary));
            return Ok(ResultSet::new(
                columns,
                ok.affected_rows,
                ok.last_insert_id,
                ResultSetBody::Buffered(Vec::new()),
            ));
        }

        _ => {
            let column_count = ColumnCount::decode(packet)?.columns as usize;
            let metadata = read_metadata(&mut guard, column_count, is_binary).await?;
            let columns = Arc::clone(&metadata.columns);
            drop(guard);

            let state = Some((io, Arc::new(metadata), lock, is_binary, column_count));

            let row_stream = stream::unfold(state, move |state| async move {
                let (io, metadata, lock, is_binary, column_count) = state?;

                let mut guard = io.lock().await;
                let item = async {
                    let packet = guard.receive().await?;
                    if is_row_terminator(packet) {
                        // Drain any further chained result sets; their rows are
                        // unreachable once a streaming caller has moved on.
                        let status = terminal_status(guard.capabilities, packet)?;
                        if status.contains(Status::SERVER_MORE_RESULTS_EXISTS) {
                            drain_remaining_result_sets(&mut guard).await?;
                        }
                        Ok(None)
                    } else {
                        let row = if is_binary {
                            Row::decode_binary(packet, &metadata.type_ids)?
                        } else {
                            Row::decode_text(packet, column_count)?
                        };
                        Ok(Some(row_to_result_row(&metadata.columns, row)))
                    }
                }
                .await;
                drop(guard);

                match item {
                    Ok(Some(row)) => Some((
                        Ok(row),
                        Some((io, metadata, lock, is_binary, column_count)),
                    )),
                    Ok(None) => None,
                    Err(e) => Some((Err(e), None)),
                }
            });

            let boxed: std::pin::Pin<Box<dyn Stream<Item = Result<ResultSetRow, Error>> + Send>> =
                Box::pin(row_stream);

            Ok(ResultSet::new(
                columns,
                0,
                0,
                ResultSetBody::Streaming(RowStream::new(boxed)),
            ))
        }
    }
}

/// Read and discard every remaining chained result set after a streaming
/// consumer has finished with the first one.
async fn drain_remaining_result_sets(stream: &mut MySqlStream) -> Result<(), Error> {
    loop {
        let packet = stream.receive().await?;

        match packet.first().copied() {
            Some(0xFF) => return stream.handle_err(),
            Some(0x00) => {
                let ok = stream.handle_ok()?;
                if !ok.status.contains(Status::SERVER_MORE_RESULTS_EXISTS) {
                    return Ok(());
                }
            }
            _ => {
                let column_count = ColumnCount::decode(packet)?.columns as usize;
                for _ in 0..column_count {
                    stream.receive().await?;
                }
                stream.maybe_receive_eof().await?;

                loop {
                    let packet = stream.receive().await?;
                    if is_row_terminator(packet) {
                        let status = terminal_status(stream.capabilities, packet)?;
                        if !status.contains(Status::SERVER_MORE_RESULTS_EXISTS) {
                            return Ok(());
                        }
                        break;
                    }
                }
            }
        }
    }
}
