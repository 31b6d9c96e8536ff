use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Response};

use crate::error::AppError;
use crate::executor::VersionDeleter;
use crate::models::{
    ApiErrorBody, OwnerKind, PackageSummary, PackageTarget, PackageType, PackageVersion,
    VersionId, VersionRecord,
};
use crate::selector::RATE_LIMIT;
use crate::source::{VersionPage, VersionSource, MAX_PAGES};

const GITHUB_JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("pkgprune/", env!("CARGO_PKG_VERSION"));

/// Client for the GitHub Packages REST API
#[derive(Clone)]
pub struct RegistryClient {
    client: Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_JSON_MEDIA_TYPE));
        headers.insert(
            HeaderName::from_static("x-github-api-version"),
            HeaderValue::from_static(API_VERSION),
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| AppError::invalid("token contains characters not allowed in a header"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn packages_url(&self, owner_kind: OwnerKind, owner: &str) -> String {
        format!(
            "{}/{}/{}/packages",
            self.base_url,
            owner_kind.path_segment(),
            urlencoding::encode(owner)
        )
    }

    fn versions_url(&self, target: &PackageTarget) -> String {
        format!(
            "{}/{}/{}/versions",
            self.packages_url(target.owner_kind, &target.owner),
            target.package_type,
            urlencoding::encode(&target.package_name)
        )
    }

    /// GET /{users|orgs}/<owner>/packages?package_type=<type> with pagination
    pub async fn list_packages(
        &self,
        owner_kind: OwnerKind,
        owner: &str,
        package_type: PackageType,
    ) -> Result<Vec<String>, AppError> {
        let url = self.packages_url(owner_kind, owner);
        let mut names = Vec::new();

        for page in 1..=MAX_PAGES {
            tracing::debug!(url = %url, page, "GET");
            let resp = self
                .client
                .get(&url)
                .query(&[
                    ("package_type", package_type.as_str().to_string()),
                    ("per_page", RATE_LIMIT.to_string()),
                    ("page", page.to_string()),
                ])
                .send()
                .await
                .map_err(|e| AppError::Fetch(format!("list packages API failed. {}", e)))?;

            if !resp.status().is_success() {
                return Err(AppError::Fetch(format!(
                    "list packages API failed. {}",
                    failure_detail(resp).await
                )));
            }

            let packages: Vec<PackageSummary> = resp
                .json()
                .await
                .map_err(|e| AppError::Fetch(format!("list packages API failed. {}", e)))?;

            let full_page = packages.len() == RATE_LIMIT;
            names.extend(packages.into_iter().map(|p| p.name));
            if !full_page {
                return Ok(names);
            }
        }

        Err(AppError::Fetch(format!(
            "list packages API failed. {} still has packages after {} pages",
            owner, MAX_PAGES
        )))
    }
}

impl VersionSource for RegistryClient {
    /// GET /{users|orgs}/<owner>/packages/<type>/<name>/versions
    async fn fetch_page(
        &self,
        target: &PackageTarget,
        page_size: usize,
        page: u32,
    ) -> Result<VersionPage, AppError> {
        let url = self.versions_url(target);
        tracing::debug!(url = %url, page, page_size, "GET");

        let resp = self
            .client
            .get(&url)
            .query(&[("per_page", page_size), ("page", page as usize)])
            .send()
            .await
            .map_err(|e| AppError::Fetch(format!("get versions API failed. {}", e)))?;

        if !resp.status().is_success() {
            return Err(AppError::Fetch(format!(
                "get versions API failed. {}",
                failure_detail(resp).await
            )));
        }

        let versions: Vec<PackageVersion> = resp
            .json()
            .await
            .map_err(|e| AppError::Fetch(format!("get versions API failed. {}", e)))?;

        let records: Vec<VersionRecord> = versions
            .into_iter()
            .map(|v| VersionRecord::from_api(v, target.package_type))
            .collect();

        Ok(VersionPage {
            has_more: records.len() == page_size,
            records,
        })
    }
}

impl VersionDeleter for RegistryClient {
    /// DELETE /{users|orgs}/<owner>/packages/<type>/<name>/versions/<id>
    async fn delete_version(&self, target: &PackageTarget, id: &VersionId) -> Result<(), AppError> {
        let url = format!(
            "{}/{}",
            self.versions_url(target),
            urlencoding::encode(&id.to_string())
        );
        tracing::debug!(url = %url, "DELETE");

        let resp = self.client.delete(&url).send().await.map_err(|e| AppError::Delete {
            id: id.to_string(),
            detail: format!("delete version API failed. {}", e),
        })?;

        if !resp.status().is_success() {
            return Err(AppError::Delete {
                id: id.to_string(),
                detail: format!("delete version API failed. {}", failure_detail(resp).await),
            });
        }

        Ok(())
    }
}

/// Best description of a failed response: the API's own message if it sent
/// one, otherwise the status line.
async fn failure_detail(resp: Response) -> String {
    let status = resp.status();
    match resp.json::<ApiErrorBody>().await {
        Ok(body) => body
            .detail()
            .map(str::to_string)
            .unwrap_or_else(|| status.to_string()),
        Err(_) => status.to_string(),
    }
}
