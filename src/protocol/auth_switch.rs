use crate::error::{protocol_err, Error};
use crate::io::Buf;
use crate::protocol::AuthPlugin;

// https://dev.mysql.com/doc/dev/mysql-server/8.0.12/page_protocol_connection_phase_packets_protocol_auth_switch_request.html
#[derive(Debug)]
pub(crate) struct AuthSwitch {
    pub(crate) auth_plugin: AuthPlugin,
    pub(crate) auth_plugin_data: Box<[u8]>,
}

impl AuthSwitch {
    pub(crate) fn decode(mut buf: &[u8]) -> Result<Self, Error> {
        let header = buf.get_u8()?;
        if header != 0xFE {
            return Err(protocol_err!(
                "expected AuthSwitchRequest (0xFE); received 0x{:X}",
                header
            ));
        }

        let auth_plugin = AuthPlugin::from_opt_str(Some(buf.get_str_nul()?))?;
        let len = buf.len();
        let auth_plugin_data = buf.get_bytes(len)?.to_owned().into_boxed_slice();

        Ok(Self {
            auth_plugin,
            auth_plugin_data,
        })
    }
}
