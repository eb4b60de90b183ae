/// Grouper v2 JSON web-service request and response bodies
///
/// Every body is wrapped in a single root object named after the operation
/// (`WsRestFindGroupsRequest`, `WsFindGroupsResults`, ...). Booleans travel
/// as Grouper's `"T"` / `"F"` strings and unset optional fields are omitted.
use std::collections::BTreeMap;

use grouper_domain::{GroupDescriptor, GrouperError, MemberDescriptor, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A request body and the root key it is posted under.
pub(crate) trait WsRequest: Serialize {
    const ROOT: &'static str;

    fn to_envelope(&self) -> Result<Value> {
        let inner = serde_json::to_value(self).map_err(|err| {
            GrouperError::InvalidInput(format!("failed to encode {}: {err}", Self::ROOT))
        })?;
        let mut root = Map::new();
        root.insert(Self::ROOT.to_string(), inner);
        Ok(Value::Object(root))
    }
}

/// A response body and the root key it arrives under.
pub(crate) trait WsResponse: DeserializeOwned {
    const ROOT: &'static str;

    fn from_envelope(mut value: Value) -> Result<Self> {
        let inner = value
            .get_mut(Self::ROOT)
            .map(Value::take)
            .ok_or_else(|| GrouperError::Service(format!("response is missing {}", Self::ROOT)))?;
        serde_json::from_value(inner)
            .map_err(|err| GrouperError::Service(format!("malformed {}: {err}", Self::ROOT)))
    }
}

mod grouper_bool {
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "T" } else { "F" })
    }

    pub fn serialize_opt<S: Serializer>(
        value: &Option<bool>,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        match value {
            Some(value) => serialize(value, serializer),
            None => serializer.serialize_none(),
        }
    }

    /// Accepts `"T"`/`"F"`, `"true"`/`"false"` and JSON booleans.
    pub fn deserialize_opt<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Option<bool>, D::Error> {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(match raw {
            Some(Value::Bool(flag)) => Some(flag),
            Some(Value::String(text)) => match text.trim() {
                t if t.eq_ignore_ascii_case("t") || t.eq_ignore_ascii_case("true") => Some(true),
                f if f.eq_ignore_ascii_case("f") || f.eq_ignore_ascii_case("false") => Some(false),
                _ => None,
            },
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroupLookup {
    pub group_name: String,
}

impl GroupLookup {
    pub fn new(group_name: impl Into<String>) -> Self {
        Self { group_name: group_name.into() }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubjectLookup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_identifier: Option<String>,
}

impl SubjectLookup {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self { subject_id: Some(id.into()), ..Self::default() }
    }

    pub fn by_identifier(identifier: impl Into<String>) -> Self {
        Self { subject_identifier: Some(identifier.into()), ..Self::default() }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum QueryFilterType {
    FindByStemName,
    FindByGroupNameExact,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QueryFilter {
    pub query_filter_type: QueryFilterType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_of_groups: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_string: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "grouper_bool::serialize_opt")]
    pub ascending: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stem_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stem_name_scope: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "grouper_bool::serialize_opt")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}

impl QueryFilter {
    /// Every enabled group in the subtree below `stem`, sorted by extension.
    pub fn by_stem(stem: impl Into<String>, page_number: u32, page_size: u32) -> Self {
        Self {
            query_filter_type: QueryFilterType::FindByStemName,
            type_of_groups: Some("group"),
            page_size: Some(page_size),
            page_number: Some(page_number),
            sort_string: Some("extension"),
            ascending: Some(true),
            stem_name: Some(stem.into()),
            stem_name_scope: Some("ALL_IN_SUBTREE"),
            enabled: Some(true),
            group_name: None,
        }
    }

    pub fn by_exact_name(group_name: impl Into<String>) -> Self {
        Self {
            query_filter_type: QueryFilterType::FindByGroupNameExact,
            type_of_groups: None,
            page_size: None,
            page_number: None,
            sort_string: None,
            ascending: None,
            stem_name: None,
            stem_name_scope: None,
            enabled: None,
            group_name: Some(group_name.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FindGroupsRequest {
    pub ws_query_filter: QueryFilter,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "grouper_bool::serialize_opt")]
    pub include_group_detail: Option<bool>,
}

impl WsRequest for FindGroupsRequest {
    const ROOT: &'static str = "WsRestFindGroupsRequest";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GetMembersRequest {
    #[serde(serialize_with = "grouper_bool::serialize")]
    pub include_subject_detail: bool,
    pub subject_attribute_names: Vec<String>,
    pub ws_group_lookups: Vec<GroupLookup>,
}

impl WsRequest for GetMembersRequest {
    const ROOT: &'static str = "WsRestGetMembersRequest";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddMemberRequest {
    pub ws_group_lookup: GroupLookup,
    pub subject_lookups: Vec<SubjectLookup>,
    #[serde(serialize_with = "grouper_bool::serialize")]
    pub replace_all_existing: bool,
}

impl WsRequest for AddMemberRequest {
    const ROOT: &'static str = "WsRestAddMemberRequest";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeleteMemberRequest {
    pub ws_group_lookup: GroupLookup,
    pub subject_lookups: Vec<SubjectLookup>,
}

impl WsRequest for DeleteMemberRequest {
    const ROOT: &'static str = "WsRestDeleteMemberRequest";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GetGroupsRequest {
    pub subject_lookups: Vec<SubjectLookup>,
    pub subject_attribute_names: Vec<String>,
}

impl WsRequest for GetGroupsRequest {
    const ROOT: &'static str = "WsRestGetGroupsRequest";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GetSubjectsRequest {
    #[serde(serialize_with = "grouper_bool::serialize")]
    pub include_subject_detail: bool,
    pub subject_attribute_names: Vec<String>,
    pub ws_subject_lookups: Vec<SubjectLookup>,
}

impl WsRequest for GetSubjectsRequest {
    const ROOT: &'static str = "WsRestGetSubjectsRequest";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroupToSave {
    pub extension: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_extension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroupSaveEntry {
    pub ws_group_lookup: GroupLookup,
    pub ws_group: GroupToSave,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroupSaveRequest {
    pub ws_group_to_saves: Vec<GroupSaveEntry>,
}

impl WsRequest for GroupSaveRequest {
    const ROOT: &'static str = "WsRestGroupSaveRequest";
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GroupDeleteRequest {
    pub ws_group_lookups: Vec<GroupLookup>,
}

impl WsRequest for GroupDeleteRequest {
    const ROOT: &'static str = "WsRestGroupDeleteRequest";
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct ResultMetadata {
    pub result_code: Option<String>,
    pub result_message: Option<String>,
    #[serde(deserialize_with = "grouper_bool::deserialize_opt")]
    pub success: Option<bool>,
}

impl ResultMetadata {
    pub fn code(&self) -> &str {
        self.result_code.as_deref().unwrap_or("")
    }

    pub fn succeeded(&self) -> bool {
        self.success.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct WsGroup {
    pub name: String,
    pub display_name: String,
    pub uuid: String,
    pub extension: String,
}

impl From<WsGroup> for GroupDescriptor {
    fn from(group: WsGroup) -> Self {
        Self {
            name: group.name,
            display_name: group.display_name,
            uuid: group.uuid,
            extension: group.extension,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct WsSubject {
    pub id: String,
    pub result_code: Option<String>,
    pub identifier_lookup: Option<String>,
    pub attribute_values: Vec<Option<String>>,
}

impl WsSubject {
    pub fn resolved(&self) -> bool {
        self.result_code.as_deref().map_or(true, |code| code.eq_ignore_ascii_case("SUCCESS"))
    }

    /// Pair positional `attributeValues` with the response's attribute names.
    pub fn attributes(&self, names: &[String]) -> BTreeMap<String, String> {
        names
            .iter()
            .zip(&self.attribute_values)
            .filter_map(|(name, value)| value.as_ref().map(|v| (name.clone(), v.clone())))
            .collect()
    }

    pub fn into_member(self, names: &[String], username_attribute: &str) -> MemberDescriptor {
        let attributes = self.attributes(names);
        MemberDescriptor::from_attributes(self.id, attributes, username_attribute)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct FindGroupsResults {
    pub result_metadata: ResultMetadata,
    pub group_results: Vec<WsGroup>,
}

impl WsResponse for FindGroupsResults {
    const ROOT: &'static str = "WsFindGroupsResults";
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct GetMembersResult {
    pub result_metadata: ResultMetadata,
    pub ws_subjects: Vec<WsSubject>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct GetMembersResults {
    pub result_metadata: ResultMetadata,
    pub subject_attribute_names: Vec<String>,
    pub results: Vec<GetMembersResult>,
}

impl WsResponse for GetMembersResults {
    const ROOT: &'static str = "WsGetMembersResults";
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct MemberChangeResult {
    pub result_metadata: ResultMetadata,
    pub ws_subject: WsSubject,
}

impl MemberChangeResult {
    /// Grouper reports the subject outcome in `resultMetadata`; older
    /// servers only fill in `wsSubject.resultCode`.
    pub fn result_code(&self) -> &str {
        self.result_metadata
            .result_code
            .as_deref()
            .or(self.ws_subject.result_code.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct AddMemberResults {
    pub result_metadata: ResultMetadata,
    pub results: Vec<MemberChangeResult>,
}

impl WsResponse for AddMemberResults {
    const ROOT: &'static str = "WsAddMemberResults";
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct DeleteMemberResults {
    pub result_metadata: ResultMetadata,
    pub results: Vec<MemberChangeResult>,
}

impl WsResponse for DeleteMemberResults {
    const ROOT: &'static str = "WsDeleteMemberResults";
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct GetGroupsResult {
    pub result_metadata: ResultMetadata,
    pub ws_groups: Vec<WsGroup>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct GetGroupsResults {
    pub result_metadata: ResultMetadata,
    pub results: Vec<GetGroupsResult>,
}

impl WsResponse for GetGroupsResults {
    const ROOT: &'static str = "WsGetGroupsResults";
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct GetSubjectsResults {
    pub result_metadata: ResultMetadata,
    pub subject_attribute_names: Vec<String>,
    pub ws_subjects: Vec<WsSubject>,
}

impl WsResponse for GetSubjectsResults {
    const ROOT: &'static str = "WsGetSubjectsResults";
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct GroupChangeResult {
    pub result_metadata: ResultMetadata,
    pub ws_group: Option<WsGroup>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct GroupSaveResults {
    pub result_metadata: ResultMetadata,
    pub results: Vec<GroupChangeResult>,
}

impl WsResponse for GroupSaveResults {
    const ROOT: &'static str = "WsGroupSaveResults";
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct GroupDeleteResults {
    pub result_metadata: ResultMetadata,
    pub results: Vec<GroupChangeResult>,
}

impl WsResponse for GroupDeleteResults {
    const ROOT: &'static str = "WsGroupDeleteResults";
}
