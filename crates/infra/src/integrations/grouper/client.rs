/// Grouper web-service client
///
/// Each operation is a thin, protocol-exact composition over
/// [`RequestGateway`]: build the Grouper body, post it, and project the
/// response into domain values. Lookups that find nothing come back as
/// `None`, `false` or an empty list rather than an error.
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use grouper_domain::constants::{
    DEFAULT_USERNAME_ATTRIBUTE, DESCRIPTION_ATTRIBUTE, GROUPS_ENDPOINT, STEM_SEPARATOR,
    SUBJECTS_ENDPOINT,
};
use grouper_domain::utils::username::extract_username_with;
use grouper_domain::{
    GroupDescriptor, GrouperConfig, GrouperError, MemberDescriptor, MembershipResult, Page,
    Result, ResultCode,
};
use reqwest::Method;
use tracing::{debug, info, instrument, warn};

use super::types::{
    AddMemberRequest, AddMemberResults, DeleteMemberRequest, DeleteMemberResults,
    FindGroupsRequest, FindGroupsResults, GetGroupsRequest, GetGroupsResults, GetMembersRequest,
    GetMembersResults, GetSubjectsRequest, GetSubjectsResults, GroupDeleteRequest,
    GroupDeleteResults, GroupLookup, GroupSaveEntry, GroupSaveRequest, GroupSaveResults,
    GroupToSave, MemberChangeResult, QueryFilter, SubjectLookup, WsRequest, WsResponse,
};
use crate::api::{GatewayResponse, RequestGateway};
use crate::auth::AuthSession;
use crate::config::validate_api_url;
use crate::http::HttpClient;

const USER_AGENT: &str = concat!("grouper-client/", env!("CARGO_PKG_VERSION"));

/// Domain-facing Grouper API
#[derive(Debug)]
pub struct GrouperClient {
    gateway: RequestGateway,
    session: Option<Arc<AuthSession>>,
    default_stem: String,
    subject_attribute_names: Vec<String>,
    username_attribute: String,
}

impl GrouperClient {
    /// Build a client that signs its own tokens from `config.key_path`.
    ///
    /// # Errors
    /// - `GrouperError::Config` if the configuration is incomplete or the
    ///   API URL is not an absolute HTTPS URL
    /// - `GrouperError::Signing` if the private key cannot be loaded
    pub fn from_config(config: GrouperConfig) -> Result<Self> {
        config.validate()?;
        let api_url = config.normalized_api_url();
        validate_api_url(&api_url)?;

        let session = Arc::new(AuthSession::from_config(&config)?);
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .accept_invalid_certs(!config.verify_certs)
            .build()?;
        let gateway = RequestGateway::new(&api_url, http, session.clone())?;

        info!(
            api_url = %gateway.base_url(),
            entity_id = %config.entity_id,
            default_stem = %config.default_stem,
            "Grouper client ready"
        );

        Ok(Self {
            gateway,
            session: Some(session),
            default_stem: config.default_stem,
            subject_attribute_names: config.subject_attribute_names,
            username_attribute: config.username_attribute,
        })
    }

    /// Build a client around an existing gateway (custom credentials, tests).
    pub fn with_gateway(gateway: RequestGateway, default_stem: impl Into<String>) -> Self {
        Self {
            gateway,
            session: None,
            default_stem: default_stem.into(),
            subject_attribute_names: vec![
                DEFAULT_USERNAME_ATTRIBUTE.to_string(),
                DESCRIPTION_ATTRIBUTE.to_string(),
            ],
            username_attribute: DEFAULT_USERNAME_ATTRIBUTE.to_string(),
        }
    }

    /// Override which subject attributes are requested and which one holds
    /// the username.
    pub fn with_subject_attributes(
        mut self,
        names: Vec<String>,
        username_attribute: impl Into<String>,
    ) -> Self {
        self.subject_attribute_names = names;
        self.username_attribute = username_attribute.into();
        self
    }

    pub fn default_stem(&self) -> &str {
        &self.default_stem
    }

    /// The token session, when this client mints its own credentials.
    pub fn session(&self) -> Option<&Arc<AuthSession>> {
        self.session.as_ref()
    }

    /// Fully qualified group name: names already containing `:` are used
    /// as-is, bare names are placed under the default stem.
    ///
    /// # Errors
    /// Returns `GrouperError::InvalidInput` for a blank name.
    pub fn qualified_name(&self, name: &str) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GrouperError::InvalidInput("group name must not be empty".into()));
        }
        if name.contains(STEM_SEPARATOR) {
            Ok(name.to_string())
        } else {
            Ok(format!("{}{STEM_SEPARATOR}{name}", self.default_stem))
        }
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    /// All groups in the subtree below `stem` (the default stem when `None`
    /// or blank), sorted by extension.
    #[instrument(skip(self))]
    pub async fn get_groups(&self, stem: Option<&str>, page: Page) -> Result<Vec<GroupDescriptor>> {
        let stem = match stem.map(str::trim) {
            Some(stem) if !stem.is_empty() => stem,
            _ => self.default_stem.as_str(),
        };
        let request = FindGroupsRequest {
            ws_query_filter: QueryFilter::by_stem(stem, page.number, page.size),
            include_group_detail: Some(true),
        };

        let Some(results) =
            self.exchange::<_, FindGroupsResults>(Method::POST, GROUPS_ENDPOINT, &request).await?
        else {
            debug!(stem, "stem not found");
            return Ok(Vec::new());
        };

        let groups: Vec<GroupDescriptor> =
            results.group_results.into_iter().map(GroupDescriptor::from).collect();
        debug!(stem, count = groups.len(), "listed groups");
        Ok(groups)
    }

    /// Extensions (short names) of the groups below `stem`.
    pub async fn get_group_names(&self, stem: Option<&str>) -> Result<Vec<String>> {
        let groups = self.get_groups(stem, Page::default()).await?;
        Ok(groups.into_iter().map(|group| group.extension).collect())
    }

    /// Look up one group by name; `None` when it does not exist.
    #[instrument(skip(self))]
    pub async fn get_group(&self, name: &str) -> Result<Option<GroupDescriptor>> {
        let qualified = self.qualified_name(name)?;
        let request = FindGroupsRequest {
            ws_query_filter: QueryFilter::by_exact_name(qualified),
            include_group_detail: None,
        };

        let results =
            self.exchange::<_, FindGroupsResults>(Method::POST, GROUPS_ENDPOINT, &request).await?;
        Ok(results.and_then(|results| results.group_results.into_iter().next()).map(Into::into))
    }

    pub async fn group_exists(&self, name: &str) -> Result<bool> {
        Ok(self.get_group(name).await?.is_some())
    }

    pub async fn get_group_id(&self, name: &str) -> Result<Option<String>> {
        Ok(self.get_group(name).await?.map(|group| group.uuid))
    }

    /// Create a group, treating an already existing one as success.
    ///
    /// # Errors
    /// Returns `GrouperError::Service` when Grouper refuses the save, for
    /// example because the parent stem does not exist.
    #[instrument(skip(self))]
    pub async fn create_group(
        &self,
        name: &str,
        display_name: Option<&str>,
        description: Option<&str>,
    ) -> Result<GroupDescriptor> {
        let qualified = self.qualified_name(name)?;
        let extension = leaf_extension(&qualified).to_string();
        let request = GroupSaveRequest {
            ws_group_to_saves: vec![GroupSaveEntry {
                ws_group_lookup: GroupLookup::new(qualified.clone()),
                ws_group: GroupToSave {
                    extension: extension.clone(),
                    name: qualified.clone(),
                    display_extension: display_name.map(str::to_string),
                    description: description.map(str::to_string),
                },
            }],
        };

        let results = self
            .exchange::<_, GroupSaveResults>(Method::POST, GROUPS_ENDPOINT, &request)
            .await?
            .ok_or_else(|| {
                GrouperError::Service(format!("cannot create {qualified}: parent stem not found"))
            })?;

        let result = results.results.into_iter().next().ok_or_else(|| {
            GrouperError::Service(format!("group save for {qualified} returned no results"))
        })?;

        let code = result.result_metadata.code();
        let created = matches!(
            ResultCode::from_grouper(code),
            ResultCode::Success | ResultCode::AlreadyExists
        );
        if !(result.result_metadata.succeeded() || created) {
            return Err(GrouperError::Service(format!(
                "failed to create {qualified}: {code} {}",
                result.result_metadata.result_message.as_deref().unwrap_or_default()
            )));
        }

        info!(group = %qualified, result_code = code, "group saved");

        Ok(result.ws_group.map(GroupDescriptor::from).unwrap_or(GroupDescriptor {
            name: qualified,
            display_name: display_name.unwrap_or(&extension).to_string(),
            uuid: String::new(),
            extension,
        }))
    }

    /// Delete a group. Deleting a group that does not exist succeeds.
    ///
    /// Returns Grouper's success flag for the delete.
    #[instrument(skip(self))]
    pub async fn delete_group(&self, name: &str) -> Result<bool> {
        let qualified = self.qualified_name(name)?;
        let request = GroupDeleteRequest { ws_group_lookups: vec![GroupLookup::new(qualified.clone())] };

        let Some(results) =
            self.exchange::<_, GroupDeleteResults>(Method::POST, GROUPS_ENDPOINT, &request).await?
        else {
            debug!(group = %qualified, "group already absent");
            return Ok(true);
        };

        let Some(result) = results.results.into_iter().next() else {
            return Ok(false);
        };

        let code = result.result_metadata.code();
        let deleted = result.result_metadata.succeeded()
            || matches!(ResultCode::from_grouper(code), ResultCode::Success | ResultCode::NotFound);

        if deleted {
            info!(group = %qualified, result_code = code, "group deleted");
        } else {
            warn!(group = %qualified, result_code = code, "group delete rejected");
        }
        Ok(deleted)
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    /// Members of a group; an absent group has no members.
    #[instrument(skip(self))]
    pub async fn get_group_members(&self, group: &str) -> Result<Vec<MemberDescriptor>> {
        let qualified = self.qualified_name(group)?;
        let request = GetMembersRequest {
            include_subject_detail: true,
            subject_attribute_names: self.subject_attribute_names.clone(),
            ws_group_lookups: vec![GroupLookup::new(qualified.clone())],
        };

        let Some(results) =
            self.exchange::<_, GetMembersResults>(Method::POST, GROUPS_ENDPOINT, &request).await?
        else {
            return Ok(Vec::new());
        };

        let names = self.attribute_names(&results.subject_attribute_names);
        let Some(group_result) = results.results.into_iter().next() else {
            return Ok(Vec::new());
        };
        if ResultCode::from_grouper(group_result.result_metadata.code()) == ResultCode::NotFound {
            debug!(group = %qualified, "group not found");
            return Ok(Vec::new());
        }

        let members: Vec<MemberDescriptor> = group_result
            .ws_subjects
            .into_iter()
            .filter(|subject| subject.resolved())
            .map(|subject| subject.into_member(&names, &self.username_attribute))
            .collect();
        debug!(group = %qualified, count = members.len(), "listed members");
        Ok(members)
    }

    pub async fn is_user_in_group(&self, group: &str, username: &str) -> Result<bool> {
        let members = self.get_group_members(group).await?;
        Ok(members.iter().any(|member| member.username == username))
    }

    /// Add subjects (by identifier) to a group.
    ///
    /// Results are reported per subject; the call fails as a whole only
    /// when every subject fails.
    #[instrument(skip(self, subjects), fields(count = subjects.len()))]
    pub async fn add_members_to_group<S: AsRef<str>>(
        &self,
        group: &str,
        subjects: &[S],
    ) -> Result<Vec<MembershipResult>> {
        let qualified = self.qualified_name(group)?;
        if subjects.is_empty() {
            return Ok(Vec::new());
        }
        let request = AddMemberRequest {
            ws_group_lookup: GroupLookup::new(qualified.clone()),
            subject_lookups: subject_identifiers(subjects),
            replace_all_existing: false,
        };

        let results = self
            .exchange::<_, AddMemberResults>(Method::POST, GROUPS_ENDPOINT, &request)
            .await?
            .ok_or_else(|| GrouperError::Service(format!("group {qualified} not found")))?;

        let outcome = membership_results(&qualified, subjects, results.results)?;
        info!(group = %qualified, added = outcome.iter().filter(|r| r.success).count(), "members added");
        Ok(outcome)
    }

    /// Remove subjects (by identifier) from a group, with the same
    /// per-subject reporting as [`add_members_to_group`](Self::add_members_to_group).
    #[instrument(skip(self, subjects), fields(count = subjects.len()))]
    pub async fn remove_members_from_group<S: AsRef<str>>(
        &self,
        group: &str,
        subjects: &[S],
    ) -> Result<Vec<MembershipResult>> {
        let qualified = self.qualified_name(group)?;
        if subjects.is_empty() {
            return Ok(Vec::new());
        }
        let request = DeleteMemberRequest {
            ws_group_lookup: GroupLookup::new(qualified.clone()),
            subject_lookups: subject_identifiers(subjects),
        };

        let results = self
            .exchange::<_, DeleteMemberResults>(Method::DELETE, GROUPS_ENDPOINT, &request)
            .await?
            .ok_or_else(|| GrouperError::Service(format!("group {qualified} not found")))?;

        let outcome = membership_results(&qualified, subjects, results.results)?;
        info!(
            group = %qualified,
            removed = outcome.iter().filter(|r| r.success).count(),
            "members removed"
        );
        Ok(outcome)
    }

    /// Groups a subject (by subject id) belongs to.
    #[instrument(skip(self))]
    pub async fn get_groups_for_member(&self, subject_id: &str) -> Result<Vec<GroupDescriptor>> {
        let request = GetGroupsRequest {
            subject_lookups: vec![SubjectLookup::by_id(subject_id)],
            subject_attribute_names: vec![DESCRIPTION_ATTRIBUTE.to_string()],
        };

        let results =
            self.exchange::<_, GetGroupsResults>(Method::POST, SUBJECTS_ENDPOINT, &request).await?;
        Ok(results
            .and_then(|results| results.results.into_iter().next())
            .map(|result| result.ws_groups.into_iter().map(GroupDescriptor::from).collect())
            .unwrap_or_default())
    }

    // -----------------------------------------------------------------------
    // Subjects
    // -----------------------------------------------------------------------

    /// Resolve subject ids; ids Grouper does not know are omitted.
    pub async fn get_users_by_id<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<MemberDescriptor>> {
        let lookups = ids.iter().map(|id| SubjectLookup::by_id(id.as_ref())).collect();
        self.get_subjects(lookups).await
    }

    /// Resolve usernames (subject identifiers); unknown ones are omitted.
    pub async fn get_users_by_username<S: AsRef<str>>(
        &self,
        usernames: &[S],
    ) -> Result<Vec<MemberDescriptor>> {
        self.get_subjects(subject_identifiers(usernames)).await
    }

    /// Whether exactly one subject matches `identifier`.
    ///
    /// # Errors
    /// Returns `GrouperError::Service` if the identifier is ambiguous.
    pub async fn user_exists(&self, identifier: &str) -> Result<bool> {
        let matches = self.get_users_by_username(&[identifier]).await?;
        match matches.len() {
            0 => Ok(false),
            1 => Ok(true),
            n => Err(GrouperError::Service(format!(
                "identifier {identifier} matches {n} subjects"
            ))),
        }
    }

    /// Username from a subject attribute map, using this client's
    /// username attribute.
    ///
    /// # Errors
    /// Returns `GrouperError::Attribute` if the attribute is missing.
    pub fn extract_username(&self, attributes: &BTreeMap<String, String>) -> Result<String> {
        extract_username_with(attributes, &self.username_attribute)
    }

    #[instrument(skip(self, lookups), fields(count = lookups.len()))]
    async fn get_subjects(&self, lookups: Vec<SubjectLookup>) -> Result<Vec<MemberDescriptor>> {
        if lookups.is_empty() {
            return Ok(Vec::new());
        }
        let requested = lookups.len();
        let request = GetSubjectsRequest {
            include_subject_detail: true,
            subject_attribute_names: self.subject_attribute_names.clone(),
            ws_subject_lookups: lookups,
        };

        let Some(results) =
            self.exchange::<_, GetSubjectsResults>(Method::POST, SUBJECTS_ENDPOINT, &request).await?
        else {
            return Ok(Vec::new());
        };

        let names = self.attribute_names(&results.subject_attribute_names);
        let users: Vec<MemberDescriptor> = results
            .ws_subjects
            .into_iter()
            .filter(|subject| subject.resolved())
            .map(|subject| subject.into_member(&names, &self.username_attribute))
            .collect();

        if users.len() < requested {
            debug!(requested, found = users.len(), "some subjects were not found");
        }
        Ok(users)
    }

    // -----------------------------------------------------------------------
    // Plumbing
    // -----------------------------------------------------------------------

    async fn exchange<Q: WsRequest, P: WsResponse>(
        &self,
        method: Method,
        endpoint: &str,
        request: &Q,
    ) -> Result<Option<P>> {
        let body = request.to_envelope()?;
        match self.gateway.call(method, endpoint, Some(&body)).await? {
            GatewayResponse::NotFound => Ok(None),
            GatewayResponse::Body(value) => P::from_envelope(value).map(Some),
        }
    }

    /// Attribute names for positional values: the response's own list when
    /// present, otherwise the names that were requested.
    fn attribute_names(&self, from_response: &[String]) -> Vec<String> {
        if from_response.is_empty() {
            self.subject_attribute_names.clone()
        } else {
            from_response.to_vec()
        }
    }
}

fn subject_identifiers<S: AsRef<str>>(subjects: &[S]) -> Vec<SubjectLookup> {
    subjects.iter().map(|s| SubjectLookup::by_identifier(s.as_ref())).collect()
}

fn leaf_extension(qualified: &str) -> &str {
    qualified.rsplit(STEM_SEPARATOR).next().unwrap_or(qualified)
}

/// Project per-subject results, failing only when no subject succeeded.
fn membership_results<S: AsRef<str>>(
    group: &str,
    requested: &[S],
    results: Vec<MemberChangeResult>,
) -> Result<Vec<MembershipResult>> {
    if results.is_empty() {
        return Err(GrouperError::Service(format!(
            "membership change on {group} returned no per-subject results"
        )));
    }

    let outcome: Vec<MembershipResult> = results
        .into_iter()
        .enumerate()
        .map(|(index, result)| {
            let code = ResultCode::from_grouper(result.result_code());
            let success = result.result_metadata.success.unwrap_or(matches!(
                code,
                ResultCode::Success | ResultCode::AlreadyExists
            ));
            let subject = result
                .ws_subject
                .identifier_lookup
                .clone()
                .or_else(|| requested.get(index).map(|s| s.as_ref().to_string()))
                .unwrap_or_else(|| result.ws_subject.id.clone());
            MembershipResult { group: group.to_string(), subject, success, result_code: code }
        })
        .collect();

    if outcome.iter().all(|result| !result.success) {
        let codes: Vec<String> =
            outcome.iter().map(|r| format!("{}={}", r.subject, r.result_code)).collect();
        return Err(GrouperError::Service(format!(
            "every membership change on {group} failed: {}",
            codes.join(", ")
        )));
    }

    Ok(outcome)
}
