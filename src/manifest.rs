use std::collections::HashSet;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::Client;

use crate::error::AppError;
use crate::models::{ImageIndex, PackageTarget, VersionRecord};

const MANIFEST_MEDIA_TYPES: &str = "application/vnd.oci.image.index.v1+json, \
     application/vnd.docker.distribution.manifest.list.v2+json, \
     application/vnd.oci.image.manifest.v1+json, \
     application/vnd.docker.distribution.manifest.v2+json";

/// Reads image manifests from the container registry behind a container
/// package (ghcr.io for GitHub).
#[derive(Clone)]
pub struct ManifestClient {
    client: Client,
    base_url: String,
}

impl ManifestClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(MANIFEST_MEDIA_TYPES));
        // ghcr.io accepts the base64-encoded API token directly
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", STANDARD.encode(token)))
            .map_err(|_| AppError::invalid("token contains characters not allowed in a header"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn manifest_url(&self, target: &PackageTarget, reference: &str) -> String {
        format!(
            "{}/v2/{}/{}/manifests/{}",
            self.base_url,
            target.owner.to_lowercase(),
            target.package_name.to_lowercase(),
            reference
        )
    }

    /// GET /v2/<owner>/<name>/manifests/<reference>: digests of the
    /// per-platform manifests, empty for a single-platform image
    pub async fn child_digests(
        &self,
        target: &PackageTarget,
        reference: &str,
    ) -> Result<Vec<String>, AppError> {
        let url = self.manifest_url(target, reference);
        tracing::debug!(url = %url, "GET");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Fetch(format!("get manifest failed for {}: {}", reference, e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::Fetch(format!(
                "get manifest failed for {}: registry returned status {}",
                reference, status
            )));
        }

        let index: ImageIndex = resp.json().await.map_err(|e| {
            AppError::Fetch(format!("get manifest failed for {}: {}", reference, e))
        })?;

        Ok(index.manifests.into_iter().map(|m| m.digest).collect())
    }

    /// Digests referenced by the image index of any tagged version.
    ///
    /// A version is protected when it is a platform-specific image of a
    /// multi-platform image that is still tagged.
    pub async fn protected_digests(
        &self,
        target: &PackageTarget,
        records: &[VersionRecord],
    ) -> Result<HashSet<String>, AppError> {
        let mut protected = HashSet::new();
        for record in records.iter().filter(|r| r.tagged) {
            let children = self.child_digests(target, &record.label).await?;
            if !children.is_empty() {
                tracing::debug!(
                    parent = %record.label,
                    platforms = children.len(),
                    "protecting platform images of tagged index"
                );
            }
            protected.extend(children);
        }
        Ok(protected)
    }
}

/// Drop records whose digest is protected.
pub fn exclude_protected(
    records: Vec<VersionRecord>,
    protected: &HashSet<String>,
) -> Vec<VersionRecord> {
    if protected.is_empty() {
        return records;
    }
    records
        .into_iter()
        .filter(|r| !protected.contains(&r.label))
        .collect()
}
