//! Documents and scripted model replies shared by the scenario tests

/// Two-article Korean NDA
pub const KOREAN_NDA: &str = "제1조 (목적) 본 계약은 ... 제2조 (비밀유지) 양 당사자는 ...";

/// Well-formed reply for [`KOREAN_NDA`]
pub const NDA_REPLY: &str = r#"{
    "overall_summary": "양 당사자 간 비밀유지 계약",
    "one_line_summary": "상호 비밀유지 의무를 정한 계약",
    "risk_score": 35,
    "risk_level": "중간",
    "key_points": ["비밀정보의 범위"],
    "recommended_actions": ["비밀정보 정의를 구체화할 것"],
    "clauses": [
        {"clause_id": "clause_1", "summary": "계약의 목적", "risk_level": "낮음"},
        {"clause_id": "clause_2", "summary": "비밀유지 의무", "risk_level": "높음", "risk_tags": ["confidentiality"]}
    ],
    "causal_relations": [
        {"from": "clause_1", "to": "clause_2", "relation": "conditions"}
    ]
}"#;

/// Lease with four term candidates: 보증금, 위약금, 손해배상, 손해배상책임
pub const KOREAN_LEASE: &str = "제1조 (보증금) 임차인은 보증금과 위약금을 지급한다.\n\
제2조 (손해배상) 임대인은 손해배상책임을 진다.";

/// English employment agreement split by blank lines
pub const EMPLOYMENT_AGREEMENT: &str = "Article 1 (Term) The Employer hires the Employee for one year.\n\n\
Article 2 (Wages) The Employer pays the Employee a monthly salary.\n\n\
Article 3 (Termination) Either party may terminate with thirty days notice.";

/// The NDA reply wrapped in prose and a code fence
pub fn fenced(reply: &str) -> String {
    format!("Here is the analysis you asked for:\n```json\n{}\n```\nLet me know if you need more.", reply)
}
