use digest::Digest;
use generic_array::GenericArray;
use memchr::memchr;
use sha1::Sha1;
use sha2::Sha256;

use crate::error::{protocol_err, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthPlugin {
    MySqlNativePassword,
    CachingSha2Password,
}

impl AuthPlugin {
    pub(crate) fn from_opt_str(s: Option<&str>) -> Result<AuthPlugin, Error> {
        match s {
            Some("mysql_native_password") | None => Ok(AuthPlugin::MySqlNativePassword),
            Some("caching_sha2_password") => Ok(AuthPlugin::CachingSha2Password),
            Some(s) => Err(protocol_err!(
                "server requested unsupported authentication plugin: {}",
                s
            )),
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        match self {
            AuthPlugin::MySqlNativePassword => "mysql_native_password",
            AuthPlugin::CachingSha2Password => "caching_sha2_password",
        }
    }

    /// Compute the scrambled auth-response bytes for `password` given the
    /// server's challenge (`auth-plugin-data`, 20 bytes once any trailing
    /// NUL has been stripped for `mysql_native_password`).
    pub(crate) fn scramble(&self, password: &str, nonce: &[u8]) -> Vec<u8> {
        match self {
            AuthPlugin::MySqlNativePassword => {
                // The nonce for mysql_native_password is (optionally) nul terminated.
                let end = memchr(b'\0', nonce).unwrap_or(nonce.len());
                scramble_sha1(password, &nonce[..end]).to_vec()
            }
            AuthPlugin::CachingSha2Password => scramble_sha256(password, nonce).to_vec(),
        }
    }
}

fn xor_eq(a: &mut [u8], b: &[u8]) {
    for (x, y) in a.iter_mut().zip(b) {
        *x ^= y;
    }
}

// SHA1( password ) ^ SHA1( seed + SHA1( SHA1( password ) ) )
// https://mariadb.com/kb/en/connection/#mysql_native_password-plugin
fn scramble_sha1(password: &str, seed: &[u8]) -> GenericArray<u8, <Sha1 as Digest>::OutputSize> {
    let mut ctx = Sha1::new();

    ctx.update(password);
    let mut pw_hash = ctx.finalize_reset();

    ctx.update(pw_hash);
    let pw_hash_hash = ctx.finalize_reset();

    ctx.update(seed);
    ctx.update(pw_hash_hash);
    let pw_seed_hash_hash = ctx.finalize();

    xor_eq(&mut pw_hash, &pw_seed_hash_hash);

    pw_hash
}

// XOR( SHA256(password), SHA256(seed, SHA256(SHA256(password))) )
// https://mariadb.com/kb/en/caching_sha2_password-authentication-plugin/#sha-2-encrypted-password
fn scramble_sha256(
    password: &str,
    seed: &[u8],
) -> GenericArray<u8, <Sha256 as Digest>::OutputSize> {
    let mut ctx = Sha256::new();

    ctx.update(password);
    let mut pw_hash = ctx.finalize_reset();

    ctx.update(pw_hash);
    let pw_hash_hash = ctx.finalize_reset();

    ctx.update(seed);
    ctx.update(pw_hash_hash);
    let pw_seed_hash_hash = ctx.finalize();

    xor_eq(&mut pw_hash, &pw_seed_hash_hash);

    pw_hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_password_scramble_is_20_bytes() {
        let out = AuthPlugin::MySqlNativePassword.scramble("hunter2", &[1u8; 20]);
        assert_eq!(out.len(), 20);
    }

    #[test]
    fn caching_sha2_scramble_is_32_bytes() {
        let out = AuthPlugin::CachingSha2Password.scramble("hunter2", &[1u8; 20]);
        assert_eq!(out.len(), 32);
    }

    #[test]
    fn empty_password_scrambles_deterministically() {
        let a = AuthPlugin::MySqlNativePassword.scramble("", &[9u8; 20]);
        let b = AuthPlugin::MySqlNativePassword.scramble("", &[9u8; 20]);
        assert_eq!(a, b);
    }
}
