//! Proof messages: the signed statement as published on a service.
//!
//! A proof is the statement payload and signature, hex encoded between armor
//! lines:
//!
//! ```text
//! BEGIN KEYPROOF MESSAGE.
//! <hex(payload || signature), 64 columns per line>
//! END KEYPROOF MESSAGE.
//! ```

use bytes::Bytes;

use crate::crypto::Ed25519Signature;
use crate::service::ContentRule;
use crate::statement::Statement;

pub const BEGIN_ARMOR: &str = "BEGIN KEYPROOF MESSAGE.";
pub const END_ARMOR: &str = "END KEYPROOF MESSAGE.";

const LINE_WIDTH: usize = 64;
const SIGNATURE_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofMessage {
    pub payload: Bytes,
    pub signature: Ed25519Signature,
}

impl ProofMessage {
    pub fn from_statement(statement: &Statement) -> Self {
        Self {
            payload: statement.payload.clone(),
            signature: statement.signature,
        }
    }

    /// The armored text to publish.
    pub fn armor(&self) -> String {
        let mut body = hex::encode(&self.payload);
        body.push_str(&self.signature.to_hex());

        let mut out = String::with_capacity(body.len() + 64);
        out.push_str(BEGIN_ARMOR);
        out.push('\n');
        // hex is ASCII, so byte chunks are valid str boundaries.
        for chunk in body.as_bytes().chunks(LINE_WIDTH) {
            out.push_str(&String::from_utf8_lossy(chunk));
            out.push('\n');
        }
        out.push_str(END_ARMOR);
        out.push('\n');
        out
    }

    /// Whether this message carries exactly the statement's payload and signature.
    pub fn matches(&self, statement: &Statement) -> bool {
        self.payload == statement.payload && self.signature == statement.signature
    }

    /// Decode every armored message in `content`, in order of appearance.
    ///
    /// Blocks that fail to decode are skipped.
    pub fn find_all(content: &str, rule: ContentRule) -> Vec<Self> {
        let bodies = match rule {
            ContentRule::Armored => armored_bodies(content),
            ContentRule::Collapsed => collapsed_bodies(content),
        };
        bodies.iter().filter_map(|body| Self::decode_body(body)).collect()
    }

    /// The first decodable armored message in `content`.
    pub fn find_in(content: &str, rule: ContentRule) -> Option<Self> {
        Self::find_all(content, rule).into_iter().next()
    }

    /// Whether any armored message in `content` carries `statement`.
    pub fn proves(content: &str, rule: ContentRule, statement: &Statement) -> bool {
        Self::find_all(content, rule)
            .iter()
            .any(|message| message.matches(statement))
    }

    fn decode_body(body: &str) -> Option<Self> {
        let bytes = hex::decode(body).ok()?;
        if bytes.len() < SIGNATURE_LEN {
            return None;
        }
        let (payload, sig) = bytes.split_at(bytes.len() - SIGNATURE_LEN);
        let signature: [u8; 64] = sig.try_into().ok()?;
        Some(Self {
            payload: Bytes::copy_from_slice(payload),
            signature: Ed25519Signature(signature),
        })
    }
}

/// Bodies between armor lines, each line trimmed. A second begin line
/// restarts the block; an unterminated block is dropped.
fn armored_bodies(content: &str) -> Vec<String> {
    let mut bodies = Vec::new();
    let mut current: Option<String> = None;
    for line in content.lines().map(str::trim) {
        if line == BEGIN_ARMOR {
            current = Some(String::new());
        } else if line == END_ARMOR {
            bodies.extend(current.take());
        } else if let Some(body) = current.as_mut() {
            body.push_str(line);
        }
    }
    bodies
}

/// Bodies between armor markers after removing all whitespace.
fn collapsed_bodies(content: &str) -> Vec<String> {
    let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    let collapsed = strip(content);
    let begin = strip(BEGIN_ARMOR);
    let end = strip(END_ARMOR);

    let mut bodies = Vec::new();
    let mut rest = collapsed.as_str();
    while let Some(at) = rest.find(&begin) {
        rest = &rest[at + begin.len()..];
        let Some(len) = rest.find(&end) else {
            break;
        };
        let body = &rest[..len];
        // A begin marker inside the body restarts the block.
        let body = match body.rfind(&begin) {
            Some(inner) => &body[inner + begin.len()..],
            None => body,
        };
        bodies.push(body.to_string());
        rest = &rest[len + end.len()..];
    }
    bodies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::statement::StatementBuilder;

    fn statement() -> Statement {
        statement_with_payload(vec![0x5a; 100])
    }

    fn statement_with_payload(payload: Vec<u8>) -> Statement {
        let keypair = Keypair::from_seed(&[0x42; 32]);
        StatementBuilder::new(keypair.kid(), 1)
            .timestamp(1)
            .payload(payload)
            .sign(&keypair)
    }

    #[test]
    fn test_armor_layout() {
        let msg = ProofMessage::from_statement(&statement());
        let armored = msg.armor();
        let lines: Vec<&str> = armored.lines().collect();
        assert_eq!(lines.first(), Some(&BEGIN_ARMOR));
        assert_eq!(lines.last(), Some(&END_ARMOR));
        assert!(lines[1..lines.len() - 1].iter().all(|l| l.len() <= LINE_WIDTH));
    }

    #[test]
    fn test_find_armored_in_page() {
        let st = statement();
        let page = format!(
            "<html>\n  proof of alice\n{}\n</html>",
            ProofMessage::from_statement(&st)
                .armor()
                .lines()
                .map(|l| format!("    {}  ", l))
                .collect::<Vec<_>>()
                .join("\n")
        );
        let found = ProofMessage::find_in(&page, ContentRule::Armored).unwrap();
        assert!(found.matches(&st));
    }

    #[test]
    fn test_find_collapsed_reflowed() {
        let st = statement();
        let reflowed = ProofMessage::from_statement(&st)
            .armor()
            .replace('\n', " ")
            .replace("KEYPROOF ", "KEYPROOF\n");
        let tweet = format!("my key: {}", reflowed);
        assert!(ProofMessage::find_in(&tweet, ContentRule::Armored).is_none());
        let found = ProofMessage::find_in(&tweet, ContentRule::Collapsed).unwrap();
        assert!(found.matches(&st));
    }

    #[test]
    fn test_mismatch_and_garbage() {
        let st = statement();
        let keypair = Keypair::from_seed(&[0x43; 32]);
        let other = StatementBuilder::new(keypair.kid(), 1)
            .timestamp(1)
            .payload(vec![0x5a; 100])
            .sign(&keypair);
        let found =
            ProofMessage::find_in(&ProofMessage::from_statement(&other).armor(), ContentRule::Armored)
                .unwrap();
        assert!(!found.matches(&st));

        assert!(ProofMessage::find_in("nothing here", ContentRule::Armored).is_none());
        let bad = format!("{}\nzz\n{}", BEGIN_ARMOR, END_ARMOR);
        assert!(ProofMessage::find_in(&bad, ContentRule::Armored).is_none());
        let unterminated = format!("{}\nabcd", BEGIN_ARMOR);
        assert!(ProofMessage::find_in(&unterminated, ContentRule::Armored).is_none());
    }

    #[test]
    fn test_quoted_block_before_real_one() {
        let st = statement();
        let keypair = Keypair::from_seed(&[0x43; 32]);
        let other = StatementBuilder::new(keypair.kid(), 1)
            .timestamp(1)
            .payload(vec![0x11; 40])
            .sign(&keypair);
        let page = format!(
            "Quoting a friend:\n{}\nMine:\n{}",
            ProofMessage::from_statement(&other).armor(),
            ProofMessage::from_statement(&st).armor()
        );

        for rule in [ContentRule::Armored, ContentRule::Collapsed] {
            let found = ProofMessage::find_all(&page, rule);
            assert_eq!(found.len(), 2);
            assert!(found[0].matches(&other));
            assert!(ProofMessage::find_in(&page, rule).unwrap().matches(&other));
            assert!(ProofMessage::proves(&page, rule, &st));
        }
        assert!(!ProofMessage::proves(&page, ContentRule::Armored, &statement_with_payload(vec![0x22; 8])));
    }

    #[test]
    fn test_undecodable_block_is_skipped() {
        let st = statement();
        let page = format!(
            "{}\nnot hex\n{}\n{}",
            BEGIN_ARMOR,
            END_ARMOR,
            ProofMessage::from_statement(&st).armor()
        );
        assert!(ProofMessage::find_in(&page, ContentRule::Armored).unwrap().matches(&st));
        assert!(ProofMessage::proves(&page, ContentRule::Collapsed, &st));
    }
}
