//! Golden statement vectors.
//!
//! Fixed seeds, timestamps and payloads must always produce the same:
//! - canonical header bytes
//! - signed message
//! - signature (deterministic Ed25519)
//! - statement bytes and hash
//! - armored proof

use keyproof::core::{
    canonical_bytes, canonical_header_bytes, decode_statement, ChainError, StatementBuilder,
    StatementKind,
};
use keyproof::{Keypair, ProofMessage, Service, Sigchain, Statement, User};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct GoldenVector {
    pub name: String,
    pub description: String,

    // Inputs
    pub seed: String,
    pub kid: String,
    pub seq: u64,
    pub kind: u16,
    pub timestamp: i64,
    pub payload: String,

    // Derived outputs, hex
    pub header_bytes: String,
    pub signed_message: String,
    pub signature: String,
    pub statement_bytes: String,
    pub statement_hash: String,
    pub armor: String,
}

fn vector(name: &str, description: &str, statement: &Statement, seed: [u8; 32]) -> GoldenVector {
    GoldenVector {
        name: name.to_string(),
        description: description.to_string(),
        seed: hex::encode(seed),
        kid: statement.kid().to_string(),
        seq: statement.seq(),
        kind: statement.kind().to_u16(),
        timestamp: statement.timestamp(),
        payload: hex::encode(&statement.payload),
        header_bytes: hex::encode(canonical_header_bytes(&statement.header)),
        signed_message: hex::encode(statement.signed_bytes()),
        signature: statement.signature.to_hex(),
        statement_bytes: hex::encode(canonical_bytes(statement)),
        statement_hash: statement.compute_hash().to_hex(),
        armor: ProofMessage::from_statement(statement).armor(),
    }
}

fn user(keypair: &Keypair, service: Service, name: &str, seq: u64) -> User {
    let url = match service {
        Service::Github => format!("https://gist.github.com/{}/1", name),
        Service::Twitter => format!("https://twitter.com/{}/status/1", name),
    };
    User::new(keypair.kid(), service, name, &url, seq).unwrap()
}

/// A three statement chain: two claims and a revoke of the first.
fn golden_chain(seed: [u8; 32]) -> Vec<Statement> {
    let keypair = Keypair::from_seed(&seed);
    let mut chain = Sigchain::new(keypair.public_key());

    let s1 = StatementBuilder::new(keypair.kid(), 1)
        .timestamp(1_234_567_890_001)
        .kind(StatementKind::UserLink)
        .payload(user(&keypair, Service::Github, "alice", 1).to_bytes().unwrap())
        .sign(&keypair);
    chain.add(s1).unwrap();

    let s2 = StatementBuilder::new(keypair.kid(), 2)
        .timestamp(1_234_567_890_002)
        .kind(StatementKind::UserLink)
        .prev(chain.last_hash().unwrap())
        .payload(user(&keypair, Service::Twitter, "alice", 2).to_bytes().unwrap())
        .sign(&keypair);
    chain.add(s2).unwrap();

    let s3 = StatementBuilder::new(keypair.kid(), 3)
        .timestamp(1_234_567_890_003)
        .kind(StatementKind::Revoke)
        .prev(chain.last_hash().unwrap())
        .revoke(1)
        .sign(&keypair);
    chain.add(s3).unwrap();

    chain.statements().to_vec()
}

pub fn generate_all_vectors() -> Vec<GoldenVector> {
    let seed = [0x01; 32];
    let chain = golden_chain(seed);
    vec![
        vector("first_link", "First claim: no prev", &chain[0], seed),
        vector("second_link", "Second claim linked to the first", &chain[1], seed),
        vector("revoke", "Revoke of seq 1, empty payload", &chain[2], seed),
    ]
}

#[test]
fn test_vectors_deterministic() {
    let v1 = generate_all_vectors();
    let v2 = generate_all_vectors();

    for (a, b) in v1.iter().zip(v2.iter()) {
        assert_eq!(a.header_bytes, b.header_bytes, "header mismatch for {}", a.name);
        assert_eq!(a.signature, b.signature, "signature mismatch for {}", a.name);
        assert_eq!(a.statement_bytes, b.statement_bytes, "bytes mismatch for {}", a.name);
        assert_eq!(a.statement_hash, b.statement_hash, "hash mismatch for {}", a.name);
        assert_eq!(a.armor, b.armor, "armor mismatch for {}", a.name);
    }
}

#[test]
fn test_vectors_decode_and_verify() {
    let keypair = Keypair::from_seed(&[0x01; 32]);
    let vectors = generate_all_vectors();

    let mut statements = Vec::new();
    for v in &vectors {
        let bytes = hex::decode(&v.statement_bytes).unwrap();
        let statement = decode_statement(&bytes).unwrap();
        assert!(statement.verify(&keypair.public_key()), "verify failed for {}", v.name);
        assert_eq!(statement.compute_hash().to_hex(), v.statement_hash, "{}", v.name);
        assert_eq!(hex::encode(statement.signed_bytes()), v.signed_message, "{}", v.name);
        assert!(v.signed_message.starts_with(&v.header_bytes), "{}", v.name);
        statements.push(statement);
    }

    let chain = Sigchain::from_statements(keypair.public_key(), statements).unwrap();
    assert_eq!(chain.last_seq(), 3);
    assert!(chain.is_revoked(1));
    assert_eq!(chain.active_users().len(), 1);
}

#[test]
fn test_armor_round_trips_through_both_rules() {
    let chain = golden_chain([0x01; 32]);
    let armor = ProofMessage::from_statement(&chain[1]).armor();

    let gist = format!("Verifying my key.\n\n{}\n", armor);
    let found = ProofMessage::find_in(&gist, Service::Github.content_rule()).unwrap();
    assert!(found.matches(&chain[1]));

    // Tweets lose line breaks.
    let tweet = armor.replace('\n', " ");
    let found = ProofMessage::find_in(&tweet, Service::Twitter.content_rule()).unwrap();
    assert!(found.matches(&chain[1]));
    assert!(ProofMessage::find_in(&tweet, Service::Github.content_rule()).is_none());
}

#[test]
fn print_golden_vectors_json() {
    #[derive(Serialize)]
    struct VectorFile {
        version: u8,
        description: String,
        vectors: Vec<GoldenVector>,
    }

    let file = VectorFile {
        version: keyproof::core::STATEMENT_VERSION,
        description: "Golden statement vectors for keyproof sigchains.".to_string(),
        vectors: generate_all_vectors(),
    };

    let json = serde_json::to_string_pretty(&file).unwrap();
    println!("{}", json);
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["vectors"].as_array().unwrap().len(), 3);
}

// =============================================================================
// Rejections
// =============================================================================

#[test]
fn test_reject_tampered_statement_bytes() {
    let keypair = Keypair::from_seed(&[0x01; 32]);
    let chain = golden_chain([0x01; 32]);
    let bytes = canonical_bytes(&chain[0]);

    // Flip one bit of the signature at the end.
    let mut tampered = bytes.clone();
    let last = tampered.len() - 1;
    tampered[last] ^= 0x01;
    let statement = decode_statement(&tampered).unwrap();
    assert!(!statement.verify(&keypair.public_key()));
}

#[test]
fn test_reject_seq_gap_on_empty_chain() {
    let keypair = Keypair::from_seed(&[0x01; 32]);
    let mut chain = Sigchain::new(keypair.public_key());
    let statement = StatementBuilder::new(keypair.kid(), 100)
        .timestamp(1)
        .kind(StatementKind::UserLink)
        .payload(user(&keypair, Service::Github, "alice", 100).to_bytes().unwrap())
        .sign(&keypair);

    let err = chain.add(statement).unwrap_err();
    assert!(matches!(err, ChainError::SeqMismatch { expected: 1, got: 100 }));
    assert_eq!(err.to_string(), "seq mismatch: expected 1, got 100");
    assert!(chain.is_empty());
}

#[test]
fn test_reject_foreign_key() {
    let owner = Keypair::from_seed(&[0x01; 32]);
    let other = Keypair::from_seed(&[0x02; 32]);
    let statement = golden_chain([0x02; 32]).remove(0);

    let mut chain = Sigchain::new(owner.public_key());
    assert!(chain.add(statement).is_err());
    assert!(!golden_chain([0x02; 32])[0].verify(&owner.public_key()));
    assert!(golden_chain([0x02; 32])[0].verify(&other.public_key()));
}
