//! Envelope-returning access to the national CKAN portals.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use open_data_ckan::{CkanClient, Configuration, PORTALS, Portal};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::PortalConfig;
use crate::envelope::{Envelope, Metadata, Record, to_record};
use crate::error::{EnvelopeError, Result};

/// `metadata.source` of every portal envelope
pub const CKAN_SOURCE: &str = "universal_ckan";

/// The portal operations the harness drives.
///
/// Every method answers with an [`Envelope`]; failures never surface as `Err`.
/// Detail lookups return their single record as a one-element `data`.
#[async_trait]
pub trait PortalApi: Send + Sync {
    /// Registered portals as `{code, name}` records.
    fn supported_countries(&self) -> Envelope;

    async fn test_connection(&self, country: &str) -> Envelope;

    async fn list_organizations(&self, country: &str, limit: u32) -> Envelope;

    async fn get_organization_details(&self, country: &str, name: &str) -> Envelope;

    async fn list_datasets(&self, country: &str, limit: u32) -> Envelope;

    async fn search_datasets(&self, country: &str, query: &str, limit: u32) -> Envelope;

    async fn get_dataset_details(&self, country: &str, name: &str) -> Envelope;

    async fn get_dataset_resources(&self, country: &str, name: &str) -> Envelope;

    async fn get_resource_details(&self, country: &str, id: &str) -> Envelope;
}

struct PortalClient {
    site_root: String,
    ckan: CkanClient,
}

/// [`PortalApi`] backed by one [`CkanClient`] per registered portal.
pub struct CkanPortals {
    clients: BTreeMap<&'static str, PortalClient>,
}

impl std::fmt::Debug for CkanPortals {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CkanPortals")
            .field("portals", &self.clients.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CkanPortals {
    pub fn new(config: &PortalConfig) -> Result<Self> {
        let mut clients = BTreeMap::new();
        for portal in PORTALS {
            let site_root = config
                .overrides
                .get(portal.code)
                .cloned()
                .unwrap_or_else(|| portal.base_url.to_string());
            let configuration = Configuration::for_portal(
                &site_root,
                Some(config.user_agent.clone()),
                config.timeout(),
            )?;
            clients.insert(
                portal.code,
                PortalClient {
                    site_root,
                    ckan: CkanClient::new(Arc::new(configuration)),
                },
            );
        }
        Ok(Self { clients })
    }

    /// Resolve the client for `country` and the metadata of this call.
    fn prepare(
        &self,
        country: &str,
        action: &str,
    ) -> std::result::Result<(&CkanClient, Metadata), Envelope> {
        let code = country.trim().to_lowercase();
        let metadata = Metadata::new(CKAN_SOURCE)
            .with_action(action)
            .with_country(code.as_str());

        match self.clients.get(code.as_str()) {
            Some(client) => {
                debug!(country = %code, action, base = client.ckan.base_path(), "portal request");
                Ok((&client.ckan, metadata.with("portal_url", client.site_root.as_str())))
            }
            None => Err(Envelope::unexpected(
                metadata,
                format!("Unsupported country: {}", country),
            )),
        }
    }
}

fn records<T: Serialize>(items: &[T]) -> std::result::Result<Vec<Record>, EnvelopeError> {
    items.iter().map(to_record).collect()
}

fn finish(
    metadata: Metadata,
    result: std::result::Result<Vec<Record>, EnvelopeError>,
) -> Envelope {
    let envelope = Envelope::from_result(metadata, result);
    if let Some(err) = envelope.error() {
        warn!(
            country = envelope.metadata().country.as_deref().unwrap_or_default(),
            action = envelope.metadata().action.as_deref().unwrap_or_default(),
            error = %err,
            "portal request failed"
        );
    }
    envelope
}

fn limit_param(limit: u32) -> Option<i32> {
    Some(i32::try_from(limit).unwrap_or(i32::MAX))
}

#[async_trait]
impl PortalApi for CkanPortals {
    fn supported_countries(&self) -> Envelope {
        let metadata = Metadata::new(CKAN_SOURCE)
            .with_action("get_supported_countries")
            .with_country("all");
        let portals: Vec<&Portal> = PORTALS.iter().collect();
        finish(metadata, records(&portals))
    }

    async fn test_connection(&self, country: &str) -> Envelope {
        let (ckan, metadata) = match self.prepare(country, "test_connection") {
            Ok(prepared) => prepared,
            Err(envelope) => return envelope,
        };
        let result = ckan
            .status_show()
            .await
            .map_err(EnvelopeError::from)
            .and_then(|status| to_record(&status).map(|record| vec![record]));
        finish(metadata, result)
    }

    async fn list_organizations(&self, country: &str, limit: u32) -> Envelope {
        let (ckan, metadata) = match self.prepare(country, "list_organizations") {
            Ok(prepared) => prepared,
            Err(envelope) => return envelope,
        };
        let result = ckan
            .organization_list(None, limit_param(limit), None)
            .await
            .map_err(EnvelopeError::from)
            .and_then(|orgs| records(&orgs));
        finish(metadata.with("limit", limit), result)
    }

    async fn get_organization_details(&self, country: &str, name: &str) -> Envelope {
        let (ckan, metadata) = match self.prepare(country, "get_organization_details") {
            Ok(prepared) => prepared,
            Err(envelope) => return envelope,
        };
        let result = ckan
            .organization_show(name)
            .await
            .map_err(EnvelopeError::from)
            .and_then(|org| to_record(&org).map(|record| vec![record]));
        finish(metadata.with("organization", name), result)
    }

    async fn list_datasets(&self, country: &str, limit: u32) -> Envelope {
        let (ckan, metadata) = match self.prepare(country, "list_datasets") {
            Ok(prepared) => prepared,
            Err(envelope) => return envelope,
        };
        match ckan.package_search(None, limit_param(limit), Some(0), None).await {
            Ok(found) => {
                let mut metadata = metadata.with("limit", limit);
                metadata.total_count = found.count;
                finish(metadata, records(&found.results))
            }
            Err(err) => finish(metadata, Err(err.into())),
        }
    }

    async fn search_datasets(&self, country: &str, query: &str, limit: u32) -> Envelope {
        let (ckan, metadata) = match self.prepare(country, "search_datasets") {
            Ok(prepared) => prepared,
            Err(envelope) => return envelope,
        };
        let metadata = metadata.with("query", query).with("limit", limit);
        match ckan
            .package_search(Some(query), limit_param(limit), Some(0), None)
            .await
        {
            Ok(found) => {
                let mut metadata = metadata;
                metadata.total_count = found.count;
                finish(metadata, records(&found.results))
            }
            Err(err) => finish(metadata, Err(err.into())),
        }
    }

    async fn get_dataset_details(&self, country: &str, name: &str) -> Envelope {
        let (ckan, metadata) = match self.prepare(country, "get_dataset_details") {
            Ok(prepared) => prepared,
            Err(envelope) => return envelope,
        };
        let metadata = metadata.with("dataset", name);
        match ckan.package_show(name).await {
            Ok(package) => {
                let metadata = match package.organization_name() {
                    Some(org) => metadata.with("organization", org),
                    None => metadata,
                };
                finish(metadata, to_record(&package).map(|record| vec![record]))
            }
            Err(err) => finish(metadata, Err(err.into())),
        }
    }

    async fn get_dataset_resources(&self, country: &str, name: &str) -> Envelope {
        let (ckan, metadata) = match self.prepare(country, "get_dataset_resources") {
            Ok(prepared) => prepared,
            Err(envelope) => return envelope,
        };
        let result = ckan
            .package_show(name)
            .await
            .map_err(EnvelopeError::from)
            .and_then(|package| records(package.resources.as_deref().unwrap_or_default()));
        finish(metadata.with("dataset", name), result)
    }

    async fn get_resource_details(&self, country: &str, id: &str) -> Envelope {
        let (ckan, metadata) = match self.prepare(country, "get_resource_details") {
            Ok(prepared) => prepared,
            Err(envelope) => return envelope,
        };
        let result = ckan
            .resource_show(id)
            .await
            .map_err(EnvelopeError::from)
            .and_then(|resource| to_record(&resource).map(|record| vec![record]));
        finish(metadata.with("resource_id", id), result)
    }
}
