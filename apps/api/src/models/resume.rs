use serde::{Deserialize, Serialize};

/// What the user submits to start an analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeInputs {
    /// Missing fields read as empty so validation, not deserialization,
    /// rejects them.
    #[serde(default)]
    pub resume: String,
    #[serde(default)]
    pub goals: String,
    /// Target-position requirements. Optional; empty when not provided.
    #[serde(default)]
    pub requirements: String,
}

impl ResumeInputs {
    /// Resume and goals are both required; requirements are optional.
    pub fn is_complete(&self) -> bool {
        !self.resume.trim().is_empty() && !self.goals.trim().is_empty()
    }

    pub fn has_requirements(&self) -> bool {
        !self.requirements.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requirements_default_to_empty() {
        let inputs: ResumeInputs =
            serde_json::from_str(r#"{"resume": "Jane Roe", "goals": "Staff role"}"#).unwrap();
        assert!(inputs.is_complete());
        assert!(!inputs.has_requirements());
    }

    #[test]
    fn test_absent_resume_reads_as_incomplete() {
        let inputs: ResumeInputs = serde_json::from_str(r#"{"goals": "Staff role"}"#).unwrap();
        assert_eq!(inputs.resume, "");
        assert!(!inputs.is_complete());
    }

    #[test]
    fn test_whitespace_only_fields_are_incomplete() {
        let inputs = ResumeInputs {
            resume: "   ".to_string(),
            goals: "Staff role".to_string(),
            requirements: String::new(),
        };
        assert!(!inputs.is_complete());
    }
}
