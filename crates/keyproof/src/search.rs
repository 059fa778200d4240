//! Search ranking over index entries.
//!
//! Results are grouped by KID. Each group carries all of the key's indexed
//! identities, matching ones first. Groups are ordered by descending match
//! count, then the smallest seq in the group (matching or not), then the
//! key's first index time, then KID bytes. An empty query lists every key by first index time.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use keyproof_core::{Kid, Service, User};

use crate::records::{IndexEntry, UserResult};

/// A search request. `limit` caps the number of groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub limit: Option<usize>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// All indexed identities of one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub kid: Kid,
    pub results: Vec<UserResult>,
    pub match_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    All,
    /// `name@service`, both compared exactly.
    Exact { name: String, service: String },
    /// Prefix of the name or of `name@service`.
    Prefix(String),
}

impl Query {
    pub fn parse(query: &str) -> Self {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Query::All;
        }
        match query.split_once('@') {
            Some((name, service)) if service.parse::<Service>().is_ok() => Query::Exact {
                name: name.to_string(),
                service: service.to_string(),
            },
            _ => Query::Prefix(query),
        }
    }

    /// Length of the name left after the match, or None if `user` does not
    /// match.
    fn remainder(&self, user: &User) -> Option<usize> {
        match self {
            Query::All => Some(0),
            Query::Exact { name, service } => {
                (user.name == *name && user.service.tag() == service).then_some(0)
            }
            Query::Prefix(prefix) => user
                .name
                .strip_prefix(prefix.as_str())
                .map(str::len)
                .or_else(|| user.id().strip_prefix(prefix.as_str()).map(str::len)),
        }
    }
}

struct Group {
    kid_indexed_at: i64,
    entries: Vec<(Option<usize>, UserResult)>,
}

/// Group, filter and order `entries` for `query`, keeping at most `limit`
/// groups.
pub fn rank(
    entries: impl IntoIterator<Item = IndexEntry>,
    query: &Query,
    limit: usize,
) -> Vec<SearchResult> {
    let mut groups: BTreeMap<Kid, Group> = BTreeMap::new();
    for entry in entries {
        let group = groups.entry(entry.result.user.kid).or_insert(Group {
            kid_indexed_at: entry.kid_indexed_at,
            entries: Vec::new(),
        });
        let remainder = query.remainder(&entry.result.user);
        group.entries.push((remainder, entry.result));
    }

    let mut ranked: Vec<(usize, u64, i64, SearchResult)> = groups
        .into_iter()
        .filter_map(|(kid, mut group)| {
            group.entries.sort_by_key(|(remainder, result)| match remainder {
                Some(rest) => (0, *rest, result.user.seq),
                None => (1, 0, result.user.seq),
            });
            let match_count = group.entries.iter().filter(|(r, _)| r.is_some()).count();
            if match_count == 0 {
                return None;
            }
            let min_seq = group
                .entries
                .iter()
                .map(|(_, result)| result.user.seq)
                .min()?;
            let results = group.entries.into_iter().map(|(_, result)| result).collect();
            Some((
                match_count,
                min_seq,
                group.kid_indexed_at,
                SearchResult {
                    kid,
                    results,
                    match_count,
                },
            ))
        })
        .collect();

    if *query == Query::All {
        ranked.sort_by_key(|(_, _, indexed_at, result)| (*indexed_at, result.kid));
    } else {
        ranked.sort_by_key(|(count, min_seq, indexed_at, result)| {
            (Reverse(*count), *min_seq, *indexed_at, result.kid)
        });
    }

    ranked
        .into_iter()
        .take(limit)
        .map(|(_, _, _, result)| result)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::UserStatus;
    use keyproof_core::Keypair;
    use proptest::prelude::*;

    fn kid(seed: u8) -> Kid {
        Keypair::from_seed(&[seed; 32]).kid()
    }

    fn entry(kid: Kid, service: Service, name: &str, seq: u64, indexed_at: i64) -> IndexEntry {
        let url = match service {
            Service::Github => format!("https://gist.github.com/{}/1", name),
            Service::Twitter => format!("https://twitter.com/{}/status/1", name),
        };
        IndexEntry {
            result: UserResult {
                user: User::new(kid, service, name, &url, seq).unwrap(),
                status: UserStatus::Ok,
                timestamp: 0,
                verified_at: Some(0),
                proof_digest: None,
            },
            kid_indexed_at: indexed_at,
        }
    }

    fn names(result: &SearchResult) -> Vec<&str> {
        result.results.iter().map(|r| r.user.name.as_str()).collect()
    }

    #[test]
    fn test_parse() {
        assert_eq!(Query::parse("  "), Query::All);
        assert_eq!(Query::parse("Alic"), Query::Prefix("alic".into()));
        assert_eq!(
            Query::parse("alice@twitter"),
            Query::Exact {
                name: "alice".into(),
                service: "twitter".into()
            }
        );
        assert_eq!(Query::parse("alice@tw"), Query::Prefix("alice@tw".into()));
    }

    #[test]
    fn test_group_ordering_within_kid() {
        let a = kid(1);
        let entries = vec![
            entry(a, Service::Github, "alice", 1, 0),
            entry(a, Service::Github, "alicenew", 2, 0),
        ];

        let results = rank(entries.clone(), &Query::parse("al"), 10);
        assert_eq!(results.len(), 1);
        assert_eq!(names(&results[0]), vec!["alice", "alicenew"]);
        assert_eq!(results[0].match_count, 2);

        let results = rank(entries, &Query::parse("alicene"), 10);
        assert_eq!(names(&results[0]), vec!["alicenew", "alice"]);
        assert_eq!(results[0].match_count, 1);
    }

    #[test]
    fn test_cross_group_ordering() {
        let (a, b, c) = (kid(1), kid(2), kid(3));
        let entries = vec![
            entry(a, Service::Github, "alicenew", 2, 10),
            entry(b, Service::Twitter, "alice", 1, 20),
            entry(c, Service::Github, "alfa", 1, 30),
            entry(c, Service::Twitter, "alf", 2, 30),
        ];
        let results = rank(entries, &Query::parse("al"), 10);
        let kids: Vec<Kid> = results.iter().map(|r| r.kid).collect();
        // c matches twice; b beats a on min seq.
        assert_eq!(kids, vec![c, b, a]);
    }

    #[test]
    fn test_tie_break_uses_whole_group_min_seq() {
        let (a, b) = (kid(1), kid(2));
        let entries = vec![
            entry(a, Service::Github, "zed", 1, 10),
            entry(a, Service::Twitter, "alf", 3, 10),
            entry(b, Service::Github, "alice", 2, 5),
        ];
        let results = rank(entries, &Query::parse("al"), 10);
        assert_eq!(results.iter().map(|r| r.kid).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(names(&results[0]), vec!["alf", "zed"]);
        assert_eq!(results[0].match_count, 1);
        assert_eq!(names(&results[1]), vec!["alice"]);
    }

    #[test]
    fn test_exact_and_empty() {
        let (a, b) = (kid(1), kid(2));
        let entries = vec![
            entry(b, Service::Github, "bob", 1, 5),
            entry(a, Service::Github, "alice", 1, 7),
            entry(a, Service::Twitter, "alice", 2, 7),
        ];

        let results = rank(entries.clone(), &Query::parse("alice@twitter"), 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].match_count, 1);
        assert_eq!(results[0].results[0].user.service, Service::Twitter);

        let results = rank(entries.clone(), &Query::parse("alice@tw"), 10);
        assert_eq!(results[0].match_count, 1);
        assert_eq!(results[0].results[0].user.service, Service::Twitter);

        let results = rank(entries.clone(), &Query::All, 10);
        assert_eq!(results.iter().map(|r| r.kid).collect::<Vec<_>>(), vec![b, a]);
        assert_eq!(results[1].match_count, 2);

        assert_eq!(rank(entries.clone(), &Query::All, 1).len(), 1);
        assert!(rank(entries, &Query::parse("zed"), 10).is_empty());
    }

    fn arb_entries() -> impl Strategy<Value = Vec<IndexEntry>> {
        prop::collection::vec((1u8..6, "[a-c]{1,4}", 1u64..8, 0i64..5), 0..20).prop_map(|raw| {
            raw.into_iter()
                .map(|(seed, name, seq, at)| entry(kid(seed), Service::Github, &name, seq, at))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_groups_are_well_formed(entries in arb_entries(), query in "[a-c]{0,2}") {
            let query = Query::parse(&query);
            let results = rank(entries.clone(), &query, usize::MAX);

            let mut seen = std::collections::BTreeSet::new();
            for group in &results {
                prop_assert!(seen.insert(group.kid));
                prop_assert!(group.match_count >= 1);
                prop_assert!(group.match_count <= group.results.len());
                prop_assert!(group.results.iter().all(|r| r.user.kid == group.kid));
                // Matching identities come first.
                for (i, r) in group.results.iter().enumerate() {
                    prop_assert_eq!(query.remainder(&r.user).is_some(), i < group.match_count);
                }
            }
            for pair in results.windows(2) {
                if query != Query::All {
                    prop_assert!(pair[0].match_count >= pair[1].match_count);
                }
            }
        }
    }
}
