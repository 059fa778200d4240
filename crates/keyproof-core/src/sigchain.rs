//! Sigchain: an append-only, hash-linked log of statements rooted at one key.
//!
//! Statements are stored as an indexed arena (`statements[seq - 1]`). Every
//! append checks seq, the stored `prev` link and the signature before
//! touching any state, so a rejected statement leaves the chain unchanged.
//!
//! Writers are expected to serialize appends per key.

use bytes::Bytes;
use std::collections::BTreeSet;

use crate::clock::Clock;
use crate::crypto::{Ed25519PublicKey, Keypair};
use crate::error::ChainError;
use crate::statement::{validate_statement, Statement, StatementBuilder, StatementKind};
use crate::types::{Kid, StatementHash};
use crate::user::User;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sigchain {
    root: Ed25519PublicKey,
    statements: Vec<Statement>,
    revoked: BTreeSet<u64>,
}

impl Sigchain {
    /// An empty chain rooted at `root`.
    pub fn new(root: Ed25519PublicKey) -> Self {
        Self {
            root,
            statements: Vec::new(),
            revoked: BTreeSet::new(),
        }
    }

    /// Rebuild a chain by replaying `statements` through [`Sigchain::add`].
    pub fn from_statements(
        root: Ed25519PublicKey,
        statements: impl IntoIterator<Item = Statement>,
    ) -> Result<Self, ChainError> {
        let mut chain = Self::new(root);
        for statement in statements {
            chain.add(statement)?;
        }
        Ok(chain)
    }

    /// Rebuild a chain from statements known to be valid, skipping checks.
    ///
    /// Only the revoked set is recomputed.
    pub fn from_trusted(root: Ed25519PublicKey, statements: Vec<Statement>) -> Self {
        let revoked = statements.iter().filter_map(Statement::revoked_seq).collect();
        Self {
            root,
            statements,
            revoked,
        }
    }

    pub fn root(&self) -> &Ed25519PublicKey {
        &self.root
    }

    pub fn kid(&self) -> Kid {
        self.root.kid()
    }

    /// Seq of the last statement, 0 for an empty chain.
    pub fn last_seq(&self) -> u64 {
        self.statements.len() as u64
    }

    pub fn last(&self) -> Option<&Statement> {
        self.statements.last()
    }

    pub fn last_hash(&self) -> Option<StatementHash> {
        self.last().map(Statement::compute_hash)
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn get(&self, seq: u64) -> Option<&Statement> {
        let idx = usize::try_from(seq.checked_sub(1)?).ok()?;
        self.statements.get(idx)
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn is_revoked(&self, seq: u64) -> bool {
        self.revoked.contains(&seq)
    }

    pub fn revoked(&self) -> &BTreeSet<u64> {
        &self.revoked
    }

    /// User-link statements that have not been revoked, in seq order.
    pub fn active_statements(&self) -> impl DoubleEndedIterator<Item = &Statement> + '_ {
        self.statements
            .iter()
            .filter(move |st| st.kind() == StatementKind::UserLink && !self.is_revoked(st.seq()))
    }

    /// Claims of the active user-link statements, in seq order.
    pub fn active_users(&self) -> Vec<User> {
        // Every user-link statement was decoded once on add.
        self.active_statements()
            .filter_map(|st| st.user().ok())
            .collect()
    }

    /// Append a statement.
    ///
    /// Fails if seq is not `last_seq() + 1`, if `prev` is not the hash of the
    /// current last statement, if the statement is not validly signed by the
    /// root key, or if a revoke names a seq that cannot be revoked.
    pub fn add(&mut self, statement: Statement) -> Result<(), ChainError> {
        let expected = self.last_seq() + 1;
        if statement.seq() != expected {
            return Err(ChainError::SeqMismatch {
                expected,
                got: statement.seq(),
            });
        }

        let expected_prev = self.last_hash();
        if statement.header.prev != expected_prev {
            return Err(ChainError::PrevMismatch {
                expected: expected_prev,
                got: statement.header.prev,
            });
        }

        validate_statement(&statement, &self.root)?;

        if let Some(target) = statement.revoked_seq() {
            self.check_revocable(target)?;
            self.revoked.insert(target);
        }
        self.statements.push(statement);
        Ok(())
    }

    /// Sign a new statement that extends this chain, without adding it.
    ///
    /// `seq` must be the next seq; the payload is not inspected first.
    pub fn generate(
        &self,
        kind: StatementKind,
        payload: impl Into<Bytes>,
        seq: u64,
        keypair: &Keypair,
        clock: &dyn Clock,
    ) -> Result<Statement, ChainError> {
        let expected = self.last_seq() + 1;
        if seq != expected {
            return Err(ChainError::SeqMismatch { expected, got: seq });
        }
        if keypair.public_key() != self.root {
            return Err(ChainError::KeyMismatch);
        }

        Ok(StatementBuilder::new(self.kid(), seq)
            .timestamp(clock.now_ms())
            .kind(kind)
            .maybe_prev(self.last_hash())
            .payload(payload)
            .sign(keypair))
    }

    /// Sign a user-link statement for `user`.
    pub fn generate_user(
        &self,
        user: &User,
        keypair: &Keypair,
        clock: &dyn Clock,
    ) -> Result<Statement, ChainError> {
        if user.seq != self.last_seq() + 1 {
            return Err(ChainError::UserSeqMismatch);
        }
        if user.kid != self.kid() {
            return Err(ChainError::KeyMismatch);
        }
        let payload = user.to_bytes()?;
        self.generate(StatementKind::UserLink, payload, user.seq, keypair, clock)
    }

    /// Append a revoke statement for `seq` and return it.
    pub fn revoke(
        &mut self,
        seq: u64,
        keypair: &Keypair,
        clock: &dyn Clock,
    ) -> Result<&Statement, ChainError> {
        self.check_revocable(seq)?;
        if keypair.public_key() != self.root {
            return Err(ChainError::KeyMismatch);
        }

        let statement = StatementBuilder::new(self.kid(), self.last_seq() + 1)
            .timestamp(clock.now_ms())
            .kind(StatementKind::Revoke)
            .maybe_prev(self.last_hash())
            .revoke(seq)
            .sign(keypair);
        self.add(statement)?;

        self.statements
            .last()
            .ok_or_else(|| ChainError::StructuralError("empty chain after revoke".into()))
    }

    fn check_revocable(&self, seq: u64) -> Result<(), ChainError> {
        let target = self.get(seq).ok_or(ChainError::InvalidRevoke {
            seq,
            reason: "out of range",
        })?;
        if self.revoked.contains(&seq) {
            return Err(ChainError::AlreadyRevoked(seq));
        }
        if target.is_revoke() {
            return Err(ChainError::InvalidRevoke {
                seq,
                reason: "cannot revoke a revoke statement",
            });
        }
        Ok(())
    }
}
