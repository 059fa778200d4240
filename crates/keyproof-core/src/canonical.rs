//! Canonical CBOR encoding of statements.
//!
//! The header is a CBOR map with small integer keys written in ascending
//! order, integers in their shortest form, definite lengths only and no
//! floats (timestamps are i64 milliseconds). The same statement always
//! produces the same bytes, which are both signed and hashed into the next
//! statement's `prev` link.

use ciborium::value::Value;

use crate::crypto::{Blake3Hash, Ed25519Signature};
use crate::error::CoreError;
use crate::statement::{Statement, StatementHeader, StatementKind};
use crate::types::{Kid, StatementHash};

/// Header field keys. Keys 0-23 encode as single bytes.
mod keys {
    pub const VERSION: u64 = 0;
    pub const KID: u64 = 1;
    pub const SEQ: u64 = 2;
    pub const PREV: u64 = 3;
    pub const TIMESTAMP: u64 = 4;
    pub const KIND: u64 = 5;
    pub const REVOKE: u64 = 6;
    pub const PAYLOAD_HASH: u64 = 7;

    pub const COUNT: u64 = 8;
}

const SIGNATURE_LEN: usize = 64;

/// Encode a statement header to canonical CBOR bytes.
pub fn canonical_header_bytes(header: &StatementHeader) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128);
    encode_uint(&mut buf, 5, keys::COUNT);

    encode_uint(&mut buf, 0, keys::VERSION);
    encode_uint(&mut buf, 0, header.version as u64);

    encode_uint(&mut buf, 0, keys::KID);
    encode_bytes(&mut buf, header.kid.as_bytes());

    encode_uint(&mut buf, 0, keys::SEQ);
    encode_uint(&mut buf, 0, header.seq);

    encode_uint(&mut buf, 0, keys::PREV);
    match &header.prev {
        Some(prev) => encode_bytes(&mut buf, prev.as_bytes()),
        None => buf.push(0xf6),
    }

    encode_uint(&mut buf, 0, keys::TIMESTAMP);
    encode_int(&mut buf, header.timestamp);

    encode_uint(&mut buf, 0, keys::KIND);
    encode_uint(&mut buf, 0, header.kind.to_u16() as u64);

    encode_uint(&mut buf, 0, keys::REVOKE);
    match header.revoke {
        Some(seq) => encode_uint(&mut buf, 0, seq),
        None => buf.push(0xf6),
    }

    encode_uint(&mut buf, 0, keys::PAYLOAD_HASH);
    encode_bytes(&mut buf, header.payload_hash.as_bytes());

    buf
}

/// Encode an entire statement: canonical_header || payload || signature.
pub fn canonical_bytes(statement: &Statement) -> Vec<u8> {
    let mut buf = signed_message(&statement.header, &statement.payload);
    buf.extend_from_slice(statement.signature.as_bytes());
    buf
}

/// The bytes covered by a statement signature: canonical_header || payload.
pub fn signed_message(header: &StatementHeader, payload: &[u8]) -> Vec<u8> {
    let mut buf = canonical_header_bytes(header);
    buf.extend_from_slice(payload);
    buf
}

/// Encode a signed integer (major types 0 and 1).
fn encode_int(buf: &mut Vec<u8>, n: i64) {
    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, 1, (-1 - n) as u64);
    }
}

/// Encode an unsigned integer with the given major type, shortest form.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Encode a byte string (major type 2).
fn encode_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    encode_uint(buf, 2, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

/// Decode a statement from its canonical bytes.
pub fn decode_statement(bytes: &[u8]) -> Result<Statement, CoreError> {
    if bytes.len() < SIGNATURE_LEN {
        return Err(CoreError::MalformedStatement("too short".into()));
    }

    let value: Value =
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;
    let header = value_to_header(&value)?;

    // The header is canonical, so re-encoding yields its exact length.
    let header_len = canonical_header_bytes(&header).len();
    if bytes.len() < header_len + SIGNATURE_LEN {
        return Err(CoreError::MalformedStatement(
            "insufficient bytes for signature".into(),
        ));
    }
    let rest = &bytes[header_len..];
    let payload_len = rest.len() - SIGNATURE_LEN;
    let signature: [u8; 64] = rest[payload_len..]
        .try_into()
        .map_err(|_| CoreError::MalformedStatement("invalid signature length".into()))?;

    let statement = Statement {
        header,
        payload: rest[..payload_len].to_vec().into(),
        signature: Ed25519Signature(signature),
    };

    if canonical_bytes(&statement) != bytes {
        return Err(CoreError::MalformedStatement("non-canonical encoding".into()));
    }
    Ok(statement)
}

fn int_value(value: &Value) -> Option<i128> {
    match value {
        Value::Integer(i) => Some(i128::from(*i)),
        _ => None,
    }
}

fn bytes32(value: &Value, field: &str) -> Result<[u8; 32], CoreError> {
    match value {
        Value::Bytes(b) => b
            .as_slice()
            .try_into()
            .map_err(|_| CoreError::MalformedStatement(format!("invalid {}", field))),
        _ => Err(CoreError::MalformedStatement(format!("invalid {}", field))),
    }
}

fn value_to_header(value: &Value) -> Result<StatementHeader, CoreError> {
    let map = match value {
        Value::Map(m) => m,
        _ => return Err(CoreError::MalformedStatement("expected map".into())),
    };

    let get = |key: u64| -> Result<&Value, CoreError> {
        map.iter()
            .find(|(k, _)| int_value(k) == Some(key as i128))
            .map(|(_, v)| v)
            .ok_or_else(|| CoreError::MalformedStatement(format!("missing key {}", key)))
    };
    let uint = |key: u64, field: &str| -> Result<u64, CoreError> {
        int_value(get(key)?)
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| CoreError::MalformedStatement(format!("invalid {}", field)))
    };

    let version = u8::try_from(uint(keys::VERSION, "version")?)
        .map_err(|_| CoreError::MalformedStatement("invalid version".into()))?;
    let kid = Kid(bytes32(get(keys::KID)?, "kid")?);
    let seq = uint(keys::SEQ, "seq")?;

    let prev = match get(keys::PREV)? {
        Value::Null => None,
        other => Some(StatementHash(bytes32(other, "prev")?)),
    };

    let timestamp = int_value(get(keys::TIMESTAMP)?)
        .and_then(|n| i64::try_from(n).ok())
        .ok_or_else(|| CoreError::MalformedStatement("invalid timestamp".into()))?;

    let kind_raw = uint(keys::KIND, "kind")?;
    let kind = u16::try_from(kind_raw)
        .ok()
        .and_then(StatementKind::from_u16)
        .ok_or_else(|| CoreError::MalformedStatement(format!("invalid kind: {}", kind_raw)))?;

    let revoke = match get(keys::REVOKE)? {
        Value::Null => None,
        _ => Some(uint(keys::REVOKE, "revoke")?),
    };

    let payload_hash = Blake3Hash(bytes32(get(keys::PAYLOAD_HASH)?, "payload_hash")?);

    Ok(StatementHeader {
        version,
        kid,
        seq,
        prev,
        timestamp,
        kind,
        revoke,
        payload_hash,
    })
}
