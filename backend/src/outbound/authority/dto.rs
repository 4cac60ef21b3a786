//! DTO for the authority's `/validate-token` success body.
//!
//! Both fields are optional on the wire; the configured `SubjectField`
//! decides which one must be present.

use serde::Deserialize;

use super::http_validator::SubjectField;
use crate::domain::Subject;

#[derive(Debug, Deserialize)]
pub(super) struct ValidatedSubjectDto {
    #[serde(default)]
    pub(super) username: Option<String>,
    #[serde(default)]
    pub(super) user_id: Option<i64>,
}

impl ValidatedSubjectDto {
    /// Extract the configured subject, if the body carries a usable one.
    pub(super) fn into_subject(self, field: SubjectField) -> Option<Subject> {
        match field {
            SubjectField::Username => self
                .username
                .filter(|name| !name.trim().is_empty())
                .map(Subject::Username),
            SubjectField::UserId => self.user_id.filter(|id| *id > 0).map(Subject::UserId),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(body: &str) -> ValidatedSubjectDto {
        serde_json::from_str(body).expect("valid JSON")
    }

    #[rstest]
    #[case(r#"{"username":"ada","user_id":7}"#, SubjectField::Username, Some(Subject::Username("ada".into())))]
    #[case(r#"{"username":"ada","user_id":7}"#, SubjectField::UserId, Some(Subject::UserId(7)))]
    #[case(r#"{"user_id":7}"#, SubjectField::Username, None)]
    #[case(r#"{"username":"  "}"#, SubjectField::Username, None)]
    #[case(r#"{"username":"ada","user_id":0}"#, SubjectField::UserId, None)]
    #[case(r#"{}"#, SubjectField::UserId, None)]
    fn subject_extraction(
        #[case] body: &str,
        #[case] field: SubjectField,
        #[case] expected: Option<Subject>,
    ) {
        assert_eq!(parse(body).into_subject(field), expected);
    }
}
