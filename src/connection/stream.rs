//! The packet framer and send/receive primitives sitting directly on top
//! of [`crate::net::MaybeTlsStream`]. Nothing above this module ever reads
//! or writes a raw socket.

use byteorder::LittleEndian;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::error::{protocol_err, Error, ErrorKind};
use crate::io::Buf;
use crate::net::MaybeTlsStream;
use crate::protocol::{Capabilities, Encode, EofPacket, ErrPacket, OkPacket};

/// Defensive cap on an unframed accumulator buffer (spec §4.6).
const MAX_ACCUMULATOR_SIZE: usize = 16 * 1024 * 1024;

/// This client never splits an outbound packet across a continuation
/// sequence; anything larger than this is rejected outright (spec §3).
const MAX_OUTBOUND_PAYLOAD: usize = 50 * 1024 * 1024;

/// Packet send/receive over a (possibly TLS) socket, with MySQL's
/// length-prefixed framing and per-command sequence-id bookkeeping.
pub(crate) struct MySqlStream {
    socket: MaybeTlsStream,

    /// Negotiated capability flags, set once during the handshake and
    /// read by every packet encoder/decoder afterwards.
    pub(crate) capabilities: Capabilities,

    /// Sequence id to stamp on the next outbound packet, and the id we
    /// expect on the next inbound one (spec §3's per-command invariant).
    seq_no: u8,

    /// Bytes read from the socket that have not yet formed a full frame.
    accumulator: Vec<u8>,

    /// The most recently received packet's payload.
    packet_buf: Vec<u8>,

    /// Outbound packet staging buffer, reused across sends.
    write_buf: Vec<u8>,
}

impl MySqlStream {
    pub(crate) fn new(socket: MaybeTlsStream, capabilities: Capabilities) -> Self {
        Self {
            socket,
            capabilities,
            seq_no: 0,
            accumulator: Vec::new(),
            packet_buf: Vec::new(),
            write_buf: Vec::new(),
        }
    }

    pub(crate) fn into_socket(self) -> MaybeTlsStream {
        self.socket
    }

    pub(crate) fn socket_mut(&mut self) -> &mut MaybeTlsStream {
        &mut self.socket
    }

    pub(crate) fn is_tls(&self) -> bool {
        self.socket.is_tls()
    }

    /// Override the next outbound sequence id. Used only when a fresh
    /// `MySqlStream` is created mid-handshake after the TLS upgrade, so the
    /// handshake response continues the sequence the plaintext stream left
    /// off at instead of restarting at 0.
    pub(crate) fn set_seq_no(&mut self, seq: u8) {
        self.seq_no = seq;
    }

    /// Send a packet, restarting the sequence-id at 0 first when this is
    /// the first packet of a new command (spec §3).
    pub(crate) async fn send<T: Encode>(&mut self, packet: T, initial: bool) -> Result<(), Error> {
        if initial {
            self.seq_no = 0;
        }

        self.write_buf.clear();

        // Header placeholder, patched once the payload length is known.
        self.write_buf.extend_from_slice(&[0; 4]);
        packet.encode(&mut self.write_buf, self.capabilities);

        let payload_len = self.write_buf.len() - 4;
        if payload_len > MAX_OUTBOUND_PAYLOAD {
            return Err(Error::client(
                ErrorKind::Unsupported,
                "outbound payload exceeds the 50 MiB cap; packet continuation is not implemented",
            ));
        }

        let len_bytes = (payload_len as u32).to_le_bytes();
        self.write_buf[0..3].copy_from_slice(&len_bytes[0..3]);
        self.write_buf[3] = self.seq_no;
        self.seq_no = self.seq_no.wrapping_add(1);

        tracing::trace!(seq = self.write_buf.get(3).copied().unwrap_or(0), len = payload_len, "write packet");
        self.socket.write_all(&self.write_buf).await?;
        self.socket.flush().await?;

        Ok(())
    }

    /// Receive one fully-framed packet, blocking on socket reads as
    /// needed. Returns the packet payload.
    pub(crate) async fn receive(&mut self) -> Result<&[u8], Error> {
        loop {
            if let Some((header_len, payload_len)) = self.try_parse_header() {
                if self.accumulator.len() >= header_len + payload_len {
                    let seq = self.accumulator[3];
                    self.seq_no = seq.wrapping_add(1);

                    self.packet_buf.clear();
                    self.packet_buf.extend_from_slice(
                        &self.accumulator[header_len..header_len + payload_len],
                    );
                    self.accumulator.drain(..header_len + payload_len);

                    tracing::trace!(seq, len = payload_len, "read packet");
                    return Ok(&self.packet_buf);
                }
            }

            if self.accumulator.len() > MAX_ACCUMULATOR_SIZE {
                return Err(Error::client(
                    ErrorKind::UnexpectedPacket,
                    "incomplete packet accumulator exceeded 16 MiB",
                ));
            }

            let mut chunk = [0u8; 8192];
            let n = self.socket.read(&mut chunk).await?;
            if n == 0 {
                return Err(Error::client(
                    ErrorKind::BrokenConnection,
                    "server closed the connection while a packet was expected",
                ));
            }
            self.accumulator.extend_from_slice(&chunk[..n]);
        }
    }

    fn try_parse_header(&self) -> Option<(usize, usize)> {
        if self.accumulator.len() < 4 {
            return None;
        }
        let mut header = &self.accumulator[..3];
        let len = header.get_u24::<LittleEndian>().ok()? as usize;
        Some((4, len))
    }

    pub(crate) fn packet(&self) -> &[u8] {
        &self.packet_buf
    }
}

impl MySqlStream {
    /// Consume the trailing EOF packet that older (pre-`DEPRECATE_EOF`)
    /// servers emit after a column-definition or row sequence.
    pub(crate) async fn maybe_receive_eof(&mut self) -> Result<(), Error> {
        if !self.capabilities.contains(Capabilities::DEPRECATE_EOF) {
            let packet = self.receive().await?;
            EofPacket::decode(packet)?;
        }

        Ok(())
    }

    pub(crate) fn handle_err<T>(&self) -> Result<T, Error> {
        let err = ErrPacket::decode(self.packet())?;
        Err(err.into_database_error().into())
    }

    pub(crate) fn handle_ok(&self) -> Result<OkPacket, Error> {
        OkPacket::read(self.packet())
    }

    pub(crate) fn unexpected_packet<T>(&self) -> Result<T, Error> {
        Err(protocol_err!(
            "unexpected packet identifier 0x{:02X}",
            self.packet().first().copied().unwrap_or(0)
        ))
    }
}
