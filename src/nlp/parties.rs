//! Party extraction

use super::scan::{char_at, char_before, find_all, is_hangul};
use crate::document::{Domain, Party, PartyRole};
use std::collections::HashSet;

struct RoleRule {
    role: PartyRole,
    surfaces: &'static [&'static str],
}

const LABOR_ROLES: &[RoleRule] = &[
    RoleRule {
        role: PartyRole::Employer,
        surfaces: &["사용자", "사업주", "고용주", "employer", "company"],
    },
    RoleRule {
        role: PartyRole::Employee,
        surfaces: &["근로자", "employee", "worker"],
    },
];

const LEASE_ROLES: &[RoleRule] = &[
    RoleRule {
        role: PartyRole::Landlord,
        surfaces: &["임대인", "landlord", "lessor"],
    },
    RoleRule {
        role: PartyRole::Tenant,
        surfaces: &["임차인", "tenant", "lessee"],
    },
];

const NDA_ROLES: &[RoleRule] = &[
    RoleRule {
        role: PartyRole::Discloser,
        surfaces: &["공개자", "정보제공자", "disclosing party", "discloser"],
    },
    RoleRule {
        role: PartyRole::Recipient,
        surfaces: &["수령자", "정보수령자", "receiving party", "recipient"],
    },
];

const IT_ROLES: &[RoleRule] = &[
    RoleRule {
        role: PartyRole::Provider,
        surfaces: &["공급자", "수급인", "provider", "vendor", "contractor"],
    },
    RoleRule {
        role: PartyRole::Client,
        surfaces: &["발주자", "도급인", "고객", "client", "customer"],
    },
];

/// 갑/을 and Party A/B appear in contracts of every domain
const GENERIC_ROLES: &[RoleRule] = &[
    RoleRule {
        role: PartyRole::PartyA,
        surfaces: &["갑", "party a"],
    },
    RoleRule {
        role: PartyRole::PartyB,
        surfaces: &["을", "party b"],
    },
];

fn domain_roles(domain: Domain) -> &'static [RoleRule] {
    match domain {
        Domain::Labor => LABOR_ROLES,
        Domain::Lease => LEASE_ROLES,
        Domain::Nda => NDA_ROLES,
        Domain::It => IT_ROLES,
        Domain::Other => &[],
    }
}

/// Particles that may follow a single-syllable party name (갑은, 을에게)
const PARTICLES: &[&str] = &[
    "에게", "으로", "과", "와", "은", "는", "이", "가", "의", "을", "를", "에", "도",
];

/// Occurrences of a party surface in the text.
///
/// Single-syllable Hangul names (갑, 을) must stand alone or carry a
/// particle, so 을 as an object particle in "계약을" is not a party.
fn find_surface(text: &str, surface: &str) -> Vec<usize> {
    if surface.chars().count() != 1 || !surface.chars().all(is_hangul) {
        return find_all(text, surface);
    }

    find_all(text, surface)
        .into_iter()
        .filter(|&i| {
            if char_before(text, i).is_some_and(is_hangul) {
                return false;
            }
            let after = i + surface.len();
            if !char_at(text, after).is_some_and(is_hangul) {
                return true;
            }
            PARTICLES.iter().any(|particle| {
                text[after..].starts_with(particle)
                    && !char_at(text, after + particle.len()).is_some_and(is_hangul)
            })
        })
        .collect()
}

/// Parties for the document's domain plus the generic 갑/을 roles,
/// deduplicated by (role, normalized label) and ordered by first mention.
pub fn extract_parties(text: &str, domain: Domain) -> Vec<Party> {
    let mut found: Vec<(usize, Party)> = Vec::new();

    for rule in domain_roles(domain).iter().chain(GENERIC_ROLES) {
        for surface in rule.surfaces {
            if let Some(&first) = find_surface(text, surface).first() {
                let label = &text[first..first + surface.len()];
                found.push((first, Party::new(rule.role, label)));
            }
        }
    }

    found.sort_by_key(|(offset, _)| *offset);

    let mut seen = HashSet::new();
    found
        .into_iter()
        .map(|(_, party)| party)
        .filter(|party| seen.insert(party.dedup_key()))
        .collect()
}

/// Labels of the parties mentioned in a clause
pub fn parties_in(clause_text: &str, parties: &[Party]) -> Vec<String> {
    parties
        .iter()
        .filter(|party| !find_surface(clause_text, &party.label).is_empty())
        .map(|party| party.label.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labor_roles_are_extracted_in_order() {
        let text = "근로자는 성실히 근무하고 사용자는 임금을 지급한다. 근로자의 휴가는 보장된다.";
        let parties = extract_parties(text, Domain::Labor);
        assert_eq!(
            parties,
            vec![
                Party::new(PartyRole::Employee, "근로자"),
                Party::new(PartyRole::Employer, "사용자"),
            ]
        );
    }

    #[test]
    fn english_labels_keep_source_casing() {
        let text = "The Disclosing Party may share data with the Receiving Party.";
        let parties = extract_parties(text, Domain::Nda);
        let labels: Vec<&str> = parties.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Disclosing Party", "Receiving Party"]);
    }

    #[test]
    fn generic_parties_need_standalone_syllables() {
        let text = "갑은 을에게 계약을 이행한다.";
        let parties = extract_parties(text, Domain::Other);
        assert_eq!(
            parties,
            vec![
                Party::new(PartyRole::PartyA, "갑"),
                Party::new(PartyRole::PartyB, "을"),
            ]
        );

        let none = extract_parties("계약을 이행한다.", Domain::Other);
        assert!(none.is_empty());
    }

    #[test]
    fn clause_mentions() {
        let parties = vec![
            Party::new(PartyRole::Landlord, "임대인"),
            Party::new(PartyRole::Tenant, "임차인"),
        ];
        assert_eq!(
            parties_in("임차인은 차임을 지급한다.", &parties),
            vec!["임차인".to_string()]
        );
    }
}
