//! Quay API client for organization, team and repository management.

use crate::registry::cache::MemberCache;
use crate::types::{QuayError, Repository, Result, Role, Visibility};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Public Quay API root.
pub const DEFAULT_API_URL: &str = "https://quay.io/api/v1";

/// Maximum number of `next_page` follows when listing repositories.
pub const LIMIT_FOLLOWS: usize = 15;

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const NO_TEAM_PERMISSION: &str = "Team does not have permission for repo.";

/// Response of the team members endpoint.
#[derive(Debug, Deserialize)]
struct TeamMembersResponse {
    #[serde(default)]
    members: Vec<TeamMember>,
}

#[derive(Debug, Deserialize)]
struct TeamMember {
    name: String,
}

/// One page of the repository listing.
#[derive(Debug, Deserialize)]
struct RepositoryPage {
    #[serde(default)]
    repositories: Vec<Repository>,
    #[serde(default)]
    next_page: Option<String>,
}

/// Error body returned by the API on failed requests.
#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PermissionResponse {
    #[serde(default)]
    role: Option<String>,
}

#[derive(Serialize)]
struct CreateRepoRequest<'a> {
    repo_kind: &'a str,
    namespace: &'a str,
    visibility: Visibility,
    repository: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct DescriptionRequest<'a> {
    description: &'a str,
}

#[derive(Serialize)]
struct VisibilityRequest {
    visibility: Visibility,
}

#[derive(Serialize)]
struct RoleRequest<'a> {
    role: &'a str,
}

/// Client bound to one organization and one bearer token.
///
/// Team member lookups are cached per client. The cache is never refreshed
/// by `add_user_to_team` or `remove_user_from_team`; pass `use_cache = false`
/// to `list_team_members` when fresh data matters.
#[derive(Debug, Clone)]
pub struct QuayClient {
    client: Client,
    token: String,
    organization: String,
    api_url: String,
    team_members: MemberCache,
}

impl QuayClient {
    /// Create a client for `organization`.
    ///
    /// `host` replaces `quay.io`, giving `https://<host>/api/v1`.
    pub fn new(token: &str, organization: &str, host: Option<&str>) -> Result<Self> {
        let api_url = match host {
            Some(host) => format!("https://{}/api/v1", host.trim_end_matches('/')),
            None => DEFAULT_API_URL.to_string(),
        };

        Ok(Self {
            client: build_http_client(DEFAULT_TIMEOUT_SECS)?,
            token: token.to_string(),
            organization: organization.to_string(),
            api_url,
            team_members: MemberCache::new(),
        })
    }

    /// Use a complete API root instead of the `https://<host>/api/v1` form.
    pub fn with_api_url(mut self, api_url: &str) -> Result<Self> {
        let parsed = url::Url::parse(api_url)?;
        self.api_url = parsed.as_str().trim_end_matches('/').to_string();
        Ok(self)
    }

    /// Rebuild the HTTP client with a different request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Result<Self> {
        self.client = build_http_client(timeout_secs)?;
        Ok(self)
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// List the members of a team, pending invitations included.
    ///
    /// With `use_cache`, a previously fetched non-empty list is returned
    /// without a request. Duplicate names in the response are collapsed.
    pub async fn list_team_members(&self, team: &str, use_cache: bool) -> Result<Vec<String>> {
        if use_cache {
            if let Some(members) = self.team_members.get(team) {
                trace!("Cache hit for team {}", team);
                return Ok(members);
            }
        }

        let path = format!(
            "organization/{}/team/{}/members",
            encode(&self.organization),
            encode(team)
        );
        let response = self
            .request(Method::GET, &path)
            .query(&[("includePending", "true")])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(QuayError::TeamNotFound {
                team: team.to_string(),
                organization: self.organization.clone(),
            });
        }

        let body: TeamMembersResponse = decode(ensure_success(response).await?).await?;

        let mut seen = HashSet::new();
        let members: Vec<String> = body
            .members
            .into_iter()
            .map(|member| member.name)
            .filter(|name| seen.insert(name.clone()))
            .collect();

        debug!("Team {} has {} members", team, members.len());
        self.team_members.set(team, members.clone());

        Ok(members)
    }

    /// Check whether a user account exists.
    ///
    /// Any non-2xx status reads as "does not exist", server errors included.
    /// Only transport failures are returned as errors.
    pub async fn user_exists(&self, user: &str) -> Result<bool> {
        let path = format!("users/{}", encode(user));
        let response = self.request(Method::GET, &path).send().await?;

        if !response.status().is_success() {
            debug!("User lookup for {} returned {}", user, response.status());
            return Ok(false);
        }

        Ok(true)
    }

    /// Add a user to a team. No request is made when the cached member list
    /// already contains the user.
    pub async fn add_user_to_team(&self, user: &str, team: &str) -> Result<()> {
        let members = self.list_team_members(team, true).await?;
        if members.iter().any(|member| member == user) {
            debug!("User {} already in team {}", user, team);
            return Ok(());
        }

        let path = format!(
            "organization/{}/team/{}/members/{}",
            encode(&self.organization),
            encode(team),
            encode(user)
        );
        let response = self.request(Method::PUT, &path).send().await?;
        ensure_success(response).await?;

        info!("Added {} to team {}", user, team);
        Ok(())
    }

    /// Remove a user from a team and then from the organization.
    ///
    /// A user who is not in the team is still removed from the organization.
    pub async fn remove_user_from_team(&self, user: &str, team: &str) -> Result<()> {
        let team_path = format!(
            "organization/{}/team/{}/members/{}",
            encode(&self.organization),
            encode(team),
            encode(user)
        );
        let response = self.request(Method::DELETE, &team_path).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            let expected = format!("User {} does not belong to team {}", user, team);
            if failure_message(&body).as_deref() != Some(expected.as_str()) {
                return Err(QuayError::RequestFailed {
                    status: status.as_u16(),
                    body,
                });
            }
            debug!("{}, removing from org anyway", expected);
        }

        let org_path = format!(
            "organization/{}/members/{}",
            encode(&self.organization),
            encode(user)
        );
        let response = self.request(Method::DELETE, &org_path).send().await?;
        ensure_success(response).await?;

        info!("Removed {} from team {} and org {}", user, team, self.organization);
        Ok(())
    }

    /// List every repository in the organization, following pagination.
    pub async fn list_images(&self) -> Result<Vec<Repository>> {
        self.list_images_from(None).await
    }

    /// List repositories starting at a given page token.
    ///
    /// Fails with `TooManyPages` once more than `LIMIT_FOLLOWS` next-page
    /// tokens have been followed.
    pub async fn list_images_from(&self, page_token: Option<&str>) -> Result<Vec<Repository>> {
        let mut images = Vec::new();
        let mut next_page = page_token.map(str::to_string);
        let mut follows = 0;

        loop {
            if follows > LIMIT_FOLLOWS {
                return Err(QuayError::TooManyPages {
                    limit: LIMIT_FOLLOWS,
                });
            }

            let mut request = self
                .request(Method::GET, "repository")
                .query(&[("namespace", self.organization.as_str())]);
            if let Some(ref token) = next_page {
                request = request.query(&[("next_page", token.as_str())]);
            }

            let page: RepositoryPage = decode(ensure_success(request.send().await?).await?).await?;
            trace!(
                "Repository page {} returned {} entries",
                follows,
                page.repositories.len()
            );
            images.extend(page.repositories);

            match page.next_page.filter(|token| !token.is_empty()) {
                Some(token) => {
                    next_page = Some(token);
                    follows += 1;
                }
                None => break,
            }
        }

        debug!("Listed {} repositories in {}", images.len(), self.organization);
        Ok(images)
    }

    /// Create an image repository in the organization.
    pub async fn create_repo(&self, name: &str, description: &str, is_public: bool) -> Result<()> {
        let body = CreateRepoRequest {
            repo_kind: "image",
            namespace: &self.organization,
            visibility: Visibility::from_public(is_public),
            repository: name,
            description,
        };

        let response = self
            .request(Method::POST, "repository")
            .json(&body)
            .send()
            .await?;
        ensure_success(response).await?;

        info!("Created repository {}/{}", self.organization, name);
        Ok(())
    }

    pub async fn delete_repo(&self, name: &str) -> Result<()> {
        let response = self
            .request(Method::DELETE, &self.repo_path(name))
            .send()
            .await?;
        ensure_success(response).await?;

        info!("Deleted repository {}/{}", self.organization, name);
        Ok(())
    }

    pub async fn update_repo_description(&self, name: &str, description: &str) -> Result<()> {
        let response = self
            .request(Method::PUT, &self.repo_path(name))
            .json(&DescriptionRequest { description })
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    pub async fn make_public(&self, name: &str) -> Result<()> {
        self.set_repo_visibility(name, Visibility::Public).await
    }

    pub async fn make_private(&self, name: &str) -> Result<()> {
        self.set_repo_visibility(name, Visibility::Private).await
    }

    async fn set_repo_visibility(&self, name: &str, visibility: Visibility) -> Result<()> {
        let path = format!("{}/changevisibility", self.repo_path(name));
        let response = self
            .request(Method::POST, &path)
            .json(&VisibilityRequest { visibility })
            .send()
            .await?;
        ensure_success(response).await?;

        debug!("Repository {} is now {}", name, visibility);
        Ok(())
    }

    /// Role of a team on a repository, `None` when the team has no permission.
    pub async fn get_repo_team_permission(&self, name: &str, team: &str) -> Result<Role> {
        let response = self
            .request(Method::GET, &self.team_permission_path(name, team))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            if failure_message(&body).as_deref() == Some(NO_TEAM_PERMISSION) {
                return Ok(None);
            }
            return Err(QuayError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let permission: PermissionResponse = decode(response).await?;
        Ok(permission.role.filter(|role| !role.is_empty()))
    }

    pub async fn set_repo_team_permission(&self, name: &str, team: &str, role: &str) -> Result<()> {
        let response = self
            .request(Method::PUT, &self.team_permission_path(name, team))
            .json(&RoleRequest { role })
            .send()
            .await?;
        ensure_success(response).await?;

        info!("Granted {} on {} to team {}", role, name, team);
        Ok(())
    }

    fn repo_path(&self, name: &str) -> String {
        format!("repository/{}/{}", encode(&self.organization), encode(name))
    }

    fn team_permission_path(&self, name: &str, team: &str) -> String {
        format!("{}/permissions/team/{}", self.repo_path(name), encode(team))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }

    /// Start an authenticated request against the API root.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        trace!("{} {}", method, url);
        self.client.request(method, url).bearer_auth(&self.token)
    }
}

fn build_http_client(timeout_secs: u64) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("quaykit/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

/// Pass 2xx responses through, turn anything else into `RequestFailed`.
async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await?;
    Err(QuayError::RequestFailed {
        status: status.as_u16(),
        body,
    })
}

/// Read a JSON body. Malformed bodies surface as `JsonError`.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

/// `message` field of an API error body, if the body is JSON and has one.
fn failure_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiMessage>(body).ok()?.message
}

fn encode(segment: &str) -> Cow<'_, str> {
    urlencoding::encode(segment)
}
