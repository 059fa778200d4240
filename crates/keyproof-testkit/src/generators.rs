//! Proptest generators for property-based testing.

use proptest::prelude::*;

use keyproof_core::{Keypair, MockClock, Service, Sigchain, Statement, User};

use crate::fixtures::{proof_url, START_MS};

pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// A valid account name.
pub fn name() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9_-]{0,15}".prop_map(String::from)
}

pub fn service() -> impl Strategy<Value = Service> {
    prop_oneof![Just(Service::Github), Just(Service::Twitter)]
}

/// Payload bytes up to `max_len`.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// One step of a generated chain history.
#[derive(Debug, Clone)]
pub enum ChainOp {
    Link { service: Service, name: String },
    /// Revoke the claim at this index into the chain, if it can be revoked.
    Revoke(usize),
}

pub fn chain_op() -> impl Strategy<Value = ChainOp> {
    prop_oneof![
        3 => (service(), name()).prop_map(|(service, name)| ChainOp::Link { service, name }),
        1 => any::<usize>().prop_map(ChainOp::Revoke),
    ]
}

/// Build a valid sigchain from `ops`. Revokes of unrevocable seqs are skipped.
pub fn build_chain(keypair: &Keypair, ops: &[ChainOp]) -> Sigchain {
    let clock = MockClock::stepping(START_MS, 1);
    let mut chain = Sigchain::new(keypair.public_key());
    for op in ops {
        match op {
            ChainOp::Link { service, name } => {
                let url = proof_url(*service, name);
                let user = User::new(
                    keypair.kid(),
                    *service,
                    name,
                    url.as_str(),
                    chain.last_seq() + 1,
                )
                .unwrap_or_else(|e| panic!("generated user {}: {}", name, e));
                let statement = chain
                    .generate_user(&user, keypair, &clock)
                    .unwrap_or_else(|e| panic!("generate_user: {}", e));
                chain
                    .add(statement)
                    .unwrap_or_else(|e| panic!("add: {}", e));
            }
            ChainOp::Revoke(index) => {
                if chain.is_empty() {
                    continue;
                }
                let seq = (*index % chain.statements().len()) as u64 + 1;
                // Already revoked or a revoke itself.
                let _ = chain.revoke(seq, keypair, &clock);
            }
        }
    }
    chain
}

/// A keypair and a valid chain of 1..=max_len operations.
pub fn sigchain(max_len: usize) -> impl Strategy<Value = (Keypair, Sigchain)> {
    (keypair(), prop::collection::vec(chain_op(), 1..=max_len)).prop_map(|(keypair, ops)| {
        let chain = build_chain(&keypair, &ops);
        (keypair, chain)
    })
}

/// Statements of a valid chain, with the keypair that signed them.
pub fn statements(max_len: usize) -> impl Strategy<Value = (Keypair, Vec<Statement>)> {
    sigchain(max_len).prop_map(|(keypair, chain)| {
        let statements = chain.statements().to_vec();
        (keypair, statements)
    })
}
