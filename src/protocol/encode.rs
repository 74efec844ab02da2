use super::capabilities::Capabilities;
use crate::io::BufMut;

/// Implemented by packets the client sends to the server.
pub(crate) trait Encode {
    fn encode(&self, buf: &mut Vec<u8>, capabilities: Capabilities);
}

/// Raw bytes sent as-is, with no command byte: used for
/// `AuthSwitchResponse` and the `caching_sha2_password` full-auth reply.
impl Encode for &[u8] {
    fn encode(&self, buf: &mut Vec<u8>, _: Capabilities) {
        buf.put_bytes(self);
    }
}
