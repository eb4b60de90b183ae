//! Membership change results

use serde::{Deserialize, Serialize};

use crate::impl_wire_code_conversions;

/// Normalized outcome of a per-subject or per-group operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultCode {
    Success,
    AlreadyExists,
    NotFound,
    Error,
}

impl_wire_code_conversions!(ResultCode {
    Success => "SUCCESS",
    AlreadyExists => "ALREADY_EXISTS",
    NotFound => "NOT_FOUND",
    Error => "ERROR",
});

impl ResultCode {
    /// Map a raw Grouper result code onto the normalized set.
    pub fn from_grouper(code: &str) -> Self {
        let code = code.trim().to_ascii_uppercase();
        match code.as_str() {
            "SUCCESS" | "SUCCESS_INSERTED" | "SUCCESS_UPDATED" => Self::Success,
            "SUCCESS_ALREADY_EXISTED" | "SUCCESS_NO_CHANGES_NEEDED" => Self::AlreadyExists,
            "SUCCESS_WASNT_IMMEDIATE" | "SUCCESS_GROUP_NOT_FOUND" => Self::NotFound,
            other if other.ends_with("NOT_FOUND") => Self::NotFound,
            _ => Self::Error,
        }
    }
}

/// Outcome of adding or removing one subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipResult {
    pub group: String,
    pub subject: String,
    pub success: bool,
    pub result_code: ResultCode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouper_code_mapping() {
        assert_eq!(ResultCode::from_grouper("SUCCESS"), ResultCode::Success);
        assert_eq!(ResultCode::from_grouper("SUCCESS_INSERTED"), ResultCode::Success);
        assert_eq!(ResultCode::from_grouper("SUCCESS_ALREADY_EXISTED"), ResultCode::AlreadyExists);
        assert_eq!(
            ResultCode::from_grouper("SUCCESS_NO_CHANGES_NEEDED"),
            ResultCode::AlreadyExists
        );
        assert_eq!(ResultCode::from_grouper("SUCCESS_WASNT_IMMEDIATE"), ResultCode::NotFound);
        assert_eq!(ResultCode::from_grouper("SUBJECT_NOT_FOUND"), ResultCode::NotFound);
        assert_eq!(ResultCode::from_grouper("GROUP_NOT_FOUND"), ResultCode::NotFound);
        assert_eq!(ResultCode::from_grouper("EXCEPTION"), ResultCode::Error);
        assert_eq!(ResultCode::from_grouper("success"), ResultCode::Success);
    }

    #[test]
    fn test_result_code_display_and_parse() {
        assert_eq!(ResultCode::AlreadyExists.to_string(), "ALREADY_EXISTS");
        assert_eq!("not_found".parse::<ResultCode>().unwrap(), ResultCode::NotFound);
    }

    #[test]
    fn test_result_code_serde_matches_display() {
        let json = serde_json::to_string(&ResultCode::AlreadyExists).unwrap();
        assert_eq!(json, "\"ALREADY_EXISTS\"");
    }
}
