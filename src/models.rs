use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Phrases in `office_details` that contradict a remote position.
/// Matched case-insensitively when `is_remote` is true.
pub const OFFICE_PRESENCE_KEYWORDS: [&str; 5] = [
    "office",
    "on-site",
    "physical presence",
    "in-person",
    "hybrid",
];

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("match_score {0} is outside 0-100")]
    ScoreOutOfRange(u8),

    #[error("field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("job marked remote but office_details mentions '{0}'")]
    RemoteOfficeConflict(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PayFrequency {
    Yearly,
    Monthly,
    PerHour,
}

impl fmt::Display for PayFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayFrequency::Yearly => write!(f, "yearly"),
            PayFrequency::Monthly => write!(f, "monthly"),
            PayFrequency::PerHour => write!(f, "per hour"),
        }
    }
}

/// Salary interval as stated by the posting. Only present when the source
/// text actually mentions compensation; a missing range is not the same
/// thing as a range of zeros.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SalaryRange {
    /// Lower bound of the salary, 0 when only an upper bound is given
    #[serde(default)]
    pub min: i64,
    /// Upper bound of the salary, 0 when only a lower bound is given
    #[serde(default)]
    pub max: i64,
    /// Currency code as written in the posting (e.g. RON, EUR, USD, CHF)
    pub currency: String,
    /// Whether the amounts are yearly, monthly, or per-hour
    pub frequency: PayFrequency,
}

impl SalaryRange {
    // min <= max is deliberately not checked; postings are often ambiguous
    // about which figure is which.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.currency.trim().is_empty() {
            return Err(SchemaError::EmptyField("currency"));
        }
        Ok(())
    }
}

/// Where the job is performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Location {
    /// City the position is based in
    pub city: String,
    /// Country the position is based in
    pub country: String,
    /// True when the job can be done fully remotely
    #[serde(default)]
    pub is_remote: bool,
    /// Description of any physical-presence requirements
    pub office_details: String,
}

impl Location {
    /// A record claiming to be remote must not describe office attendance.
    /// A negated mention ("no office required") is not a presence claim.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.office_details.trim().is_empty() {
            return Err(SchemaError::EmptyField("office_details"));
        }
        if self.is_remote {
            let details = self.office_details.to_lowercase();
            for keyword in OFFICE_PRESENCE_KEYWORDS {
                if mentions_presence(&details, keyword) {
                    return Err(SchemaError::RemoteOfficeConflict(keyword.to_string()));
                }
            }
        }
        Ok(())
    }
}

/// True when `keyword` appears in `details` without an immediately
/// preceding negation. `details` must already be lowercased.
fn mentions_presence(details: &str, keyword: &str) -> bool {
    const NEGATIONS: [&str; 3] = ["no ", "not ", "without "];

    let mut search_from = 0;
    while let Some(offset) = details[search_from..].find(keyword) {
        let hit = search_from + offset;
        let prefix = &details[..hit];
        if !NEGATIONS.iter().any(|negation| prefix.ends_with(negation)) {
            return true;
        }
        search_from = hit + keyword.len();
    }
    false
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FlagSeverity {
    Low,
    Medium,
    High,
}

impl fmt::Display for FlagSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagSeverity::Low => write!(f, "low"),
            FlagSeverity::Medium => write!(f, "medium"),
            FlagSeverity::High => write!(f, "high"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum FlagCategory {
    Toxicity,
    Vague,
    Unrealistic,
    UnspecifiedSalary,
    ExcessiveExperienceRequirement,
}

impl fmt::Display for FlagCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlagCategory::Toxicity => write!(f, "toxicity"),
            FlagCategory::Vague => write!(f, "vague"),
            FlagCategory::Unrealistic => write!(f, "unrealistic"),
            FlagCategory::UnspecifiedSalary => write!(f, "unspecified salary"),
            FlagCategory::ExcessiveExperienceRequirement => {
                write!(f, "excessive experience requirement")
            }
        }
    }
}

/// A categorized concern found in the posting. Order follows the model's
/// emission order; duplicates are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RedFlag {
    /// How serious the concern is
    pub severity: FlagSeverity,
    /// Kind of problem identified
    pub category: FlagCategory,
}

/// Inferred experience level, closed vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Seniority {
    Intern,
    Junior,
    Mid,
    #[serde(rename = "Mid to Senior")]
    MidToSenior,
    Senior,
    Lead,
    Architect,
}

impl fmt::Display for Seniority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Seniority::Intern => write!(f, "Intern"),
            Seniority::Junior => write!(f, "Junior"),
            Seniority::Mid => write!(f, "Mid"),
            Seniority::MidToSenior => write!(f, "Mid to Senior"),
            Seniority::Senior => write!(f, "Senior"),
            Seniority::Lead => write!(f, "Lead"),
            Seniority::Architect => write!(f, "Architect"),
        }
    }
}

/// Full structured analysis of one job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobAnalysis {
    /// Standardized job title
    pub role_title: String,
    /// Name of the hiring company
    pub company_name: String,
    /// Inferred experience level
    pub seniority: Seniority,
    /// 0-100 score for the quality of the job description
    pub match_score: u8,
    /// Specific technologies mentioned (e.g. Python, AWS, React),
    /// in the order they were found
    pub tech_stack: Vec<String>,
    /// Warning signals found in the posting (toxicity, stress, vagueness)
    pub red_flags: Vec<RedFlag>,
    /// Short summary of the role, at most two sentences, in Romanian
    pub summary: String,
    /// Salary interval, only when the posting states one
    #[serde(default)]
    pub salary_range: Option<SalaryRange>,
    /// Where the job is located
    pub job_location: Location,
}

impl JobAnalysis {
    /// Deserializes and validates a record in one step. This is the only
    /// way the extractor obtains a `JobAnalysis`, so an invalid record is
    /// never observable downstream.
    pub fn parse(raw: &str) -> Result<Self, SchemaError> {
        let analysis: JobAnalysis = serde_json::from_str(raw)?;
        analysis.validate()?;
        Ok(analysis)
    }

    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.match_score > 100 {
            return Err(SchemaError::ScoreOutOfRange(self.match_score));
        }
        if let Some(salary) = &self.salary_range {
            salary.validate()?;
        }
        self.job_location.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_location() -> Location {
        Location {
            city: "Bucharest".to_string(),
            country: "Romania".to_string(),
            is_remote: false,
            office_details: "Office attendance three days a week".to_string(),
        }
    }

    fn sample_analysis() -> JobAnalysis {
        JobAnalysis {
            role_title: "Backend Engineer".to_string(),
            company_name: "Acme".to_string(),
            seniority: Seniority::Senior,
            match_score: 82,
            tech_stack: vec!["Rust".to_string(), "PostgreSQL".to_string()],
            red_flags: vec![],
            summary: "Rol de backend pe servicii de plăți.".to_string(),
            salary_range: None,
            job_location: sample_location(),
        }
    }

    #[test]
    fn test_remote_with_office_keyword_fails() {
        let location = Location {
            is_remote: true,
            office_details: "Office in Bucharest, hybrid".to_string(),
            ..sample_location()
        };
        let err = location.validate().unwrap_err();
        assert!(matches!(err, SchemaError::RemoteOfficeConflict(_)));
    }

    #[test]
    fn test_remote_keyword_match_is_case_insensitive() {
        let location = Location {
            is_remote: true,
            office_details: "Quarterly IN-PERSON meetups".to_string(),
            ..sample_location()
        };
        assert!(location.validate().is_err());
    }

    #[test]
    fn test_remote_with_negated_office_mention_succeeds() {
        let location = Location {
            is_remote: true,
            office_details: "Fully remote, no office required".to_string(),
            ..sample_location()
        };
        assert!(location.validate().is_ok());
    }

    #[test]
    fn test_remote_negation_applies_per_mention() {
        // The negated mention is fine; the later affirmative one is not.
        let location = Location {
            is_remote: true,
            office_details: "No office required, though hybrid is possible".to_string(),
            ..sample_location()
        };
        assert!(matches!(
            location.validate().unwrap_err(),
            SchemaError::RemoteOfficeConflict(keyword) if keyword == "hybrid"
        ));
    }

    #[test]
    fn test_remote_without_office_keyword_succeeds() {
        let location = Location {
            is_remote: true,
            office_details: "Fully remote, no travel expected".to_string(),
            ..sample_location()
        };
        assert!(location.validate().is_ok());
    }

    #[test]
    fn test_onsite_may_mention_office() {
        // The keyword check only applies to records claiming to be remote.
        assert!(sample_location().validate().is_ok());
    }

    #[test]
    fn test_empty_office_details_fails() {
        let location = Location {
            office_details: "  ".to_string(),
            ..sample_location()
        };
        assert!(matches!(
            location.validate().unwrap_err(),
            SchemaError::EmptyField("office_details")
        ));
    }

    #[test]
    fn test_score_over_100_fails() {
        let analysis = JobAnalysis {
            match_score: 101,
            ..sample_analysis()
        };
        assert!(matches!(
            analysis.validate().unwrap_err(),
            SchemaError::ScoreOutOfRange(101)
        ));
    }

    #[test]
    fn test_score_bounds_accepted() {
        for score in [0, 100] {
            let analysis = JobAnalysis {
                match_score: score,
                ..sample_analysis()
            };
            assert!(analysis.validate().is_ok());
        }
    }

    #[test]
    fn test_salary_empty_currency_fails() {
        let analysis = JobAnalysis {
            salary_range: Some(SalaryRange {
                min: 10_000,
                max: 14_000,
                currency: String::new(),
                frequency: PayFrequency::Monthly,
            }),
            ..sample_analysis()
        };
        assert!(matches!(
            analysis.validate().unwrap_err(),
            SchemaError::EmptyField("currency")
        ));
    }

    #[test]
    fn test_inverted_salary_bounds_tolerated() {
        let salary = SalaryRange {
            min: 90_000,
            max: 60_000,
            currency: "EUR".to_string(),
            frequency: PayFrequency::Yearly,
        };
        assert!(salary.validate().is_ok());
    }

    #[test]
    fn test_parse_full_record() {
        let raw = r#"{
            "role_title": "Senior Go Engineer",
            "company_name": "Acme",
            "seniority": "Mid to Senior",
            "match_score": 74,
            "tech_stack": ["Go", "Kubernetes", "Go"],
            "red_flags": [
                {"severity": "medium", "category": "unspecified-salary"},
                {"severity": "high", "category": "excessive-experience-requirement"}
            ],
            "summary": "Rol de inginer Go pentru infrastructură.",
            "job_location": {
                "city": "Cluj-Napoca",
                "country": "Romania",
                "is_remote": true,
                "office_details": "Fully remote, no attendance required"
            }
        }"#;
        let analysis = JobAnalysis::parse(raw).unwrap();
        assert_eq!(analysis.seniority, Seniority::MidToSenior);
        assert_eq!(analysis.salary_range, None);
        // Extraction order and duplicates survive as-is.
        assert_eq!(analysis.tech_stack, ["Go", "Kubernetes", "Go"]);
        assert_eq!(analysis.red_flags[0].category, FlagCategory::UnspecifiedSalary);
        assert_eq!(
            analysis.red_flags[1].category,
            FlagCategory::ExcessiveExperienceRequirement
        );
    }

    #[test]
    fn test_parse_rejects_remote_office_conflict() {
        let raw = r#"{
            "role_title": "QA Engineer",
            "company_name": "Acme",
            "seniority": "Junior",
            "match_score": 40,
            "tech_stack": [],
            "red_flags": [],
            "summary": "Rol de testare.",
            "job_location": {
                "city": "Iasi",
                "country": "Romania",
                "is_remote": true,
                "office_details": "Hybrid, 2 days on-site"
            }
        }"#;
        assert!(matches!(
            JobAnalysis::parse(raw).unwrap_err(),
            SchemaError::RemoteOfficeConflict(_)
        ));
    }

    #[test]
    fn test_parse_rejects_negative_score() {
        let raw = r#"{
            "role_title": "x", "company_name": "y", "seniority": "Mid",
            "match_score": -5, "tech_stack": [], "red_flags": [],
            "summary": "s",
            "job_location": {"city": "a", "country": "b", "office_details": "on-site"}
        }"#;
        assert!(matches!(
            JobAnalysis::parse(raw).unwrap_err(),
            SchemaError::Json(_)
        ));
    }

    #[test]
    fn test_absent_salary_differs_from_zeroed_salary() {
        let absent = sample_analysis();
        let zeroed = JobAnalysis {
            salary_range: Some(SalaryRange {
                min: 0,
                max: 0,
                currency: "EUR".to_string(),
                frequency: PayFrequency::Yearly,
            }),
            ..sample_analysis()
        };
        assert_ne!(absent, zeroed);
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&PayFrequency::PerHour).unwrap(),
            r#""per-hour""#
        );
        assert_eq!(
            serde_json::to_string(&FlagCategory::UnspecifiedSalary).unwrap(),
            r#""unspecified-salary""#
        );
        assert_eq!(
            serde_json::to_string(&Seniority::MidToSenior).unwrap(),
            r#""Mid to Senior""#
        );
        assert_eq!(
            serde_json::to_string(&FlagSeverity::Medium).unwrap(),
            r#""medium""#
        );
    }
}
