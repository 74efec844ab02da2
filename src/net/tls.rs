use std::sync::Arc;

use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{ClientConfig, DigitallySignedStruct, Error as TlsError, SignatureScheme};
use tokio_rustls::TlsConnector;

use crate::error::Error;
use crate::net::{MaybeTlsStream, Socket};

/// A verifier that accepts any certificate chain and any signature,
/// matching spec §4.3's "untrusted certificates are accepted (the client
/// is a library; callers configure trust via the transport if they need
/// verification)". Grounded on the teacher's own `DummyTlsVerifier`
/// (`sqlx-core/src/net/tls/tls_rustls.rs`), installed unconditionally here
/// since this crate has no `accept_invalid_certs` toggle to gate it.
#[derive(Debug)]
struct AcceptAnyServerCert;

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, TlsError> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        // Every TLS 1.2/1.3 scheme rustls knows of; since this verifier
        // never inspects the signature, it accepts whichever the server
        // picks rather than narrowing the handshake's scheme negotiation.
        vec![
            SignatureScheme::RSA_PKCS1_SHA1,
            SignatureScheme::ECDSA_SHA1_Legacy,
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::RSA_PKCS1_SHA384,
            SignatureScheme::ECDSA_NISTP384_SHA384,
            SignatureScheme::RSA_PKCS1_SHA512,
            SignatureScheme::ECDSA_NISTP521_SHA512,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::RSA_PSS_SHA384,
            SignatureScheme::RSA_PSS_SHA512,
            SignatureScheme::ED25519,
            SignatureScheme::ED448,
        ]
    }
}

/// Upgrade a plain [`MaybeTlsStream`] to TLS in place. The caller is
/// responsible for having already paused the packet reader (spec Design
/// Notes: "the reader must be paused before the transport is swapped").
pub(crate) async fn upgrade(stream: MaybeTlsStream, host: &str) -> Result<MaybeTlsStream, Error> {
    let plain = match stream {
        MaybeTlsStream::Plain(s) => s,
        already @ MaybeTlsStream::Tls(_) => return Ok(already),
    };

    let config = ClientConfig::builder()
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert))
        .with_no_client_auth();

    let connector = TlsConnector::from(Arc::new(config));

    let server_name = ServerName::try_from(host.to_owned())
        .map_err(|_| Error::protocol(format!("invalid server hostname for tls: {host}")))?;

    let tls_stream = connector
        .connect(server_name, plain)
        .await
        .map_err(|e| Error::Tls(Box::new(e)))?;

    Ok(MaybeTlsStream::Tls(Box::new(tls_stream)))
}

#[allow(dead_code)]
fn assert_socket<T: Socket>() {}
