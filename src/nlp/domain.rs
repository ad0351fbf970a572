//! Keyword-scored domain tagging

use super::scan::find_all;
use crate::document::Domain;

struct DomainRule {
    domain: Domain,
    keywords: &'static [&'static str],
}

/// Table order is the tie-break priority: on equal scores the earlier row wins.
const DOMAIN_TABLE: &[DomainRule] = &[
    DomainRule {
        domain: Domain::Labor,
        keywords: &[
            "근로", "근로자", "사용자", "임금", "근로시간", "퇴직금", "해고", "연차",
            "수습", "employment", "employee", "employer", "wage", "wages", "salary",
            "overtime", "probation",
        ],
    },
    DomainRule {
        domain: Domain::Lease,
        keywords: &[
            "임대", "임차", "임대인", "임차인", "보증금", "월세", "차임", "전세",
            "lease", "landlord", "tenant", "lessor", "lessee", "rent", "premises",
        ],
    },
    DomainRule {
        domain: Domain::Nda,
        keywords: &[
            "비밀유지", "기밀", "비밀정보", "영업비밀", "confidential", "confidentiality",
            "non-disclosure", "nondisclosure", "disclosing party", "receiving party",
            "trade secret",
        ],
    },
    DomainRule {
        domain: Domain::It,
        keywords: &[
            "소프트웨어", "시스템", "유지보수", "라이선스", "소스코드", "클라우드",
            "software", "license", "saas", "source code", "maintenance", "hosting",
            "service level",
        ],
    },
];

impl DomainRule {
    /// Non-overlapping keyword hits. Longer keywords claim their span
    /// first, so `임차인` counts once rather than also as `임차`.
    fn score(&self, text: &str) -> usize {
        let mut keywords: Vec<&str> = self.keywords.to_vec();
        keywords.sort_by_key(|k| std::cmp::Reverse(k.len()));

        let mut claimed: Vec<(usize, usize)> = Vec::new();
        for keyword in keywords {
            for start in find_all(text, keyword) {
                let end = start + keyword.len();
                if claimed.iter().all(|&(s, e)| end <= s || start >= e) {
                    claimed.push((start, end));
                }
            }
        }
        claimed.len()
    }
}

/// Score of every domain in table order
pub fn score_domains(text: &str) -> Vec<(Domain, usize)> {
    DOMAIN_TABLE
        .iter()
        .map(|rule| (rule.domain, rule.score(text)))
        .collect()
}

/// Highest-scoring domain; ties go to the earlier table row, zero is `other`
pub fn tag_domain(text: &str) -> Domain {
    let mut best: Option<(Domain, usize)> = None;
    for (domain, score) in score_domains(text) {
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((domain, score));
        }
    }
    best.map_or(Domain::Other, |(domain, _)| domain)
}
