//! Identity resolution between the roster and the status feed.
//!
//! The roster stores names as `SURNAME(S) GIVEN(S)` with no delimiter; the
//! status feed uses `GIVEN, SURNAME(S)`. Every roster name is expanded into
//! the `GIVEN, SURNAME` spellings it could plausibly have, and a status row
//! is attributed only when its (name, unit) bucket holds exactly one employee.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::model::Employee;
use crate::normalize::normalize_text;

/// Max number of trailing tokens tried as the given name.
pub const MAX_GIVEN_TOKENS: usize = 3;

const KEY_SEPARATOR: &str = "|";

/// Canonical employee key: normalized `full_name|org_code|org_desc|job_title`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EmployeeKey(String);

impl EmployeeKey {
    pub fn from_employee(e: &Employee) -> Self {
        let parts = [
            normalize_text(&e.full_name),
            normalize_text(&e.org_code),
            normalize_text(&e.org_desc),
            normalize_text(&e.job_title),
        ];
        Self(parts.join(KEY_SEPARATOR))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmployeeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Possible `GIVEN, SURNAME` keys for a roster name written `SURNAME GIVEN`.
///
/// The given name is taken as the last 1..=3 tokens, always leaving at least
/// one surname token. Ordered by given-name length.
pub fn candidate_user_keys(full_name: &str) -> Vec<String> {
    let normalized = normalize_text(full_name).replace(',', " ");
    let tokens: Vec<&str> = normalized.split_whitespace().collect();
    if tokens.len() < 2 {
        return Vec::new();
    }

    let max_given = MAX_GIVEN_TOKENS.min(tokens.len() - 1);
    (1..=max_given)
        .map(|given_len| {
            let split = tokens.len() - given_len;
            let surname = tokens[..split].join(" ");
            let given = tokens[split..].join(" ");
            format!("{given}, {surname}")
        })
        .collect()
}

/// Lookup key for a status-feed user name.
///
/// `GIVEN, SURNAME` names are re-spaced around the first comma; names
/// without a comma are used as-is after normalization.
pub fn user_key(user_name: &str) -> String {
    let s = normalize_text(user_name);
    match s.split_once(',') {
        Some((given, surname)) => format!("{}, {}", given.trim(), surname.trim()),
        None => s,
    }
}

/// Outcome of attributing one status row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(EmployeeKey),
    Unmatched,
    /// Several employees share the bucket; the row is not attributed.
    Ambiguous(Vec<EmployeeKey>),
}

/// Bucket key = (candidate user key, normalized org_desc).
type BucketKey = (String, String);

/// Precomputed multimap from (candidate name, unit) to employee keys.
#[derive(Debug, Clone, Default)]
pub struct IdentityIndex {
    buckets: BTreeMap<BucketKey, BTreeSet<EmployeeKey>>,
}

impl IdentityIndex {
    pub fn build(roster: &[Employee]) -> Self {
        let mut buckets: BTreeMap<BucketKey, BTreeSet<EmployeeKey>> = BTreeMap::new();

        for employee in roster {
            let key = EmployeeKey::from_employee(employee);
            let org_desc = normalize_text(&employee.org_desc);
            for candidate in candidate_user_keys(&employee.full_name) {
                buckets
                    .entry((candidate, org_desc.clone()))
                    .or_default()
                    .insert(key.clone());
            }
        }

        Self { buckets }
    }

    pub fn resolve(&self, user_name: &str, org_desc: &str) -> Resolution {
        let bucket = (user_key(user_name), normalize_text(org_desc));
        match self.buckets.get(&bucket) {
            Some(keys) if keys.len() > 1 => Resolution::Ambiguous(keys.iter().cloned().collect()),
            Some(keys) => keys
                .iter()
                .next()
                .cloned()
                .map(Resolution::Resolved)
                .unwrap_or(Resolution::Unmatched),
            None => Resolution::Unmatched,
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emp(full_name: &str, org_desc: &str) -> Employee {
        Employee {
            full_name: full_name.into(),
            job_title: "Operator".into(),
            org_code: "ABC".into(),
            org_desc: org_desc.into(),
            head_of_department: "Boss".into(),
        }
    }

    #[test]
    fn three_token_name_yields_two_candidates() {
        assert_eq!(
            candidate_user_keys("SANTANA MENDOZA JORGE"),
            vec!["JORGE, SANTANA MENDOZA", "MENDOZA JORGE, SANTANA"]
        );
    }

    #[test]
    fn long_name_is_capped_at_three_given_tokens() {
        let c = candidate_user_keys("de la Cruz Perez Juan Carlos");
        assert_eq!(
            c,
            vec![
                "CARLOS, DE LA CRUZ PEREZ JUAN",
                "JUAN CARLOS, DE LA CRUZ PEREZ",
                "PEREZ JUAN CARLOS, DE LA CRUZ",
            ]
        );
    }

    #[test]
    fn single_token_has_no_candidates() {
        assert!(candidate_user_keys("MADONNA").is_empty());
        assert!(candidate_user_keys("").is_empty());
    }

    #[test]
    fn roster_commas_are_ignored() {
        assert_eq!(candidate_user_keys("Lopez, Ana"), vec!["ANA, LOPEZ"]);
    }

    #[test]
    fn user_key_respaces_first_comma() {
        assert_eq!(user_key("jorge ,  Santana Mendoza"), "JORGE, SANTANA MENDOZA");
        assert_eq!(user_key("Núñez, José, Jr"), "NUNEZ, JOSE, JR");
        assert_eq!(user_key("Santana Jorge"), "SANTANA JORGE");
    }

    #[test]
    fn employee_key_joins_normalized_fields() {
        let e = emp("Peña López Ana", "Planta Norte");
        assert_eq!(
            EmployeeKey::from_employee(&e).as_str(),
            "PENA LOPEZ ANA|ABC|PLANTA NORTE|OPERATOR"
        );
    }

    #[test]
    fn resolves_single_candidate() {
        let roster = vec![emp("SANTANA MENDOZA JORGE", "U1")];
        let index = IdentityIndex::build(&roster);
        let expected = EmployeeKey::from_employee(&roster[0]);

        assert_eq!(index.resolve("Jorge, Santana Mendoza", "u1"), Resolution::Resolved(expected.clone()));
        assert_eq!(index.resolve("MENDOZA JORGE, SANTANA", "U1"), Resolution::Resolved(expected));
    }

    #[test]
    fn unit_is_part_of_the_bucket() {
        let roster = vec![emp("SANTANA MENDOZA JORGE", "U1")];
        let index = IdentityIndex::build(&roster);
        assert_eq!(index.resolve("JORGE, SANTANA MENDOZA", "U2"), Resolution::Unmatched);
    }

    #[test]
    fn homonyms_in_same_unit_are_ambiguous() {
        let mut other = emp("SANTANA MENDOZA JORGE", "U1");
        other.job_title = "Supervisor".into();
        let roster = vec![emp("SANTANA MENDOZA JORGE", "U1"), other];
        let index = IdentityIndex::build(&roster);

        match index.resolve("JORGE, SANTANA MENDOZA", "U1") {
            Resolution::Ambiguous(keys) => assert_eq!(keys.len(), 2),
            other => panic!("expected ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_roster_rows_share_one_key() {
        let roster = vec![emp("A B C", "U"), emp("A B C", "U")];
        let index = IdentityIndex::build(&roster);
        assert!(matches!(index.resolve("C, A B", "U"), Resolution::Resolved(_)));
    }

    #[test]
    fn punctuation_variants_collide() {
        // Both normalize to "LOPEZ ANA" but differ in job title.
        let mut other = emp("Lopez-Ana", "U");
        other.job_title = "Clerk".into();
        let roster = vec![emp("LOPEZ ANA", "U"), other];
        let index = IdentityIndex::build(&roster);
        assert!(matches!(index.resolve("Ana, Lopez", "U"), Resolution::Ambiguous(_)));
    }

    #[test]
    fn resolution_is_deterministic() {
        let roster = vec![
            emp("SANTANA MENDOZA JORGE", "U1"),
            emp("GARCIA LUIS", "U1"),
            emp("GARCIA LUIS", "U2"),
        ];
        let names = ["JORGE, SANTANA MENDOZA", "LUIS, GARCIA", "X, Y"];

        let run = || {
            let index = IdentityIndex::build(&roster);
            names
                .iter()
                .map(|n| index.resolve(n, "U1"))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }
}
