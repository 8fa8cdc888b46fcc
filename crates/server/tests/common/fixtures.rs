//! Test fixtures for credentials and archives.

use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};
use std::io::{Cursor, Write};
use time::OffsetDateTime;
use zip::CompressionMethod;
use zip::write::{FileOptions, ZipWriter};

/// Secret used by `AuthConfig::for_testing()`.
pub const TEST_SECRET: &str = "test-secret-do-not-use";

fn expires_in(secs: i64) -> i64 {
    OffsetDateTime::now_utc().unix_timestamp() + secs
}

/// Sign arbitrary claims with the test secret.
#[allow(dead_code)]
pub fn sign_claims(claims: Value) -> String {
    sign_with(Algorithm::HS256, TEST_SECRET, claims)
}

/// Sign arbitrary claims with a chosen algorithm and secret.
#[allow(dead_code)]
pub fn sign_with(alg: Algorithm, secret: &str, claims: Value) -> String {
    encode(
        &Header::new(alg),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to sign token")
}

/// A valid credential for `user_id`.
#[allow(dead_code)]
pub fn token_for(user_id: i64, username: &str) -> String {
    sign_claims(json!({
        "user_id": user_id,
        "username": username,
        "exp": expires_in(3600),
    }))
}

/// A credential whose `exp` lies in the past.
#[allow(dead_code)]
pub fn expired_token(user_id: i64) -> String {
    sign_claims(json!({
        "user_id": user_id,
        "username": "expired",
        "exp": expires_in(-3600),
    }))
}

/// A valid credential with its signature segment altered.
#[allow(dead_code)]
pub fn garbled_token(user_id: i64) -> String {
    let token = token_for(user_id, "garbled");
    let (head, signature) = token.rsplit_once('.').expect("token has three segments");
    let flipped: String = signature
        .chars()
        .rev()
        .map(|c| if c == 'A' { 'B' } else { 'A' })
        .collect();
    format!("{head}.{flipped}")
}

/// Build a zip archive with stored (uncompressed) entries. Names ending in
/// `/` become directory entries.
#[allow(dead_code)]
pub fn build_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    archive_with(CompressionMethod::Stored, entries)
}

/// Build a zip archive with deflated entries.
#[allow(dead_code)]
pub fn build_deflated_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    archive_with(CompressionMethod::Deflated, entries)
}

fn archive_with(method: CompressionMethod, entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(method);
    for (name, content) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

/// Flip the first byte of `marker` inside an archive so the entry holding it
/// fails its checksum when read.
#[allow(dead_code)]
pub fn corrupt_entry(archive: &mut [u8], marker: &str) {
    let marker = marker.as_bytes();
    let at = archive
        .windows(marker.len())
        .position(|w| w == marker)
        .expect("marker present in archive");
    archive[at] ^= 0xFF;
}
