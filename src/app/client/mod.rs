//! HTTP client for the card package catalog
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: core request loop with retry and error classification
//! - `schema`: item schema checks against the server and outgoing payloads

use serde_json::Value;
use url::Url;

use crate::app::models::{Item, ItemPayload, ItemSummary};
use crate::constants::catalog;
use crate::errors::{ClientError, ClientResult};
use crate::logging::ChannelLogger;

pub mod config;
pub mod http;
pub mod schema;

pub use config::ClientConfig;
pub use schema::{check_schema, validate_fields};

use http::HttpHandler;

/// HTTP client for the catalog
///
/// Every request goes through the same retry/classification wrapper and every
/// CRUD method is recorded on the audit channel.
#[derive(Debug)]
pub struct CatalogClient {
    http_handler: HttpHandler,
    base_url: Url,
    log: ChannelLogger,
}

impl CatalogClient {
    /// Creates a client without contacting the server
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the HTTP client cannot be built
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let client = config.build_http_client()?;
        let http_handler = HttpHandler::new(
            client,
            config.retries,
            config.retry_delay,
            config.debug_dump.clone(),
        );

        Ok(Self {
            http_handler,
            base_url: config.base_url,
            log: ChannelLogger::new("client"),
        })
    }

    /// Creates a client and verifies the server's item schema
    ///
    /// The check is skipped when `config.schema_check` is false. An
    /// unreachable docs endpoint is logged and tolerated; a schema that
    /// cannot be read or does not match is fatal.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::SchemaMismatch`/`SchemaUnreadable` on an
    /// incompatible server
    pub async fn connect(config: ClientConfig) -> ClientResult<Self> {
        let schema_check = config.schema_check;
        let client = Self::new(config)?;
        client.log.info("##### INIT ######");

        if schema_check {
            client.verify_schema().await?;
        }

        Ok(client)
    }

    /// Compare the local item schema with the one published by the server
    pub async fn verify_schema(&self) -> ClientResult<()> {
        let url = self.docs_url()?;

        let docs: Value = match self.http_handler.get_json(&url).await {
            Ok(docs) => docs,
            Err(ClientError::Json(e)) => {
                return Err(self.schema_failure(ClientError::SchemaUnreadable {
                    reason: e.to_string(),
                }));
            }
            Err(e) => {
                self.log.error(format!("{}", e));
                self.log.critical("Couldn't reach the servers.");
                return Ok(());
            }
        };
        self.log.info("Server up and running.");

        check_schema(&docs).map_err(|e| self.schema_failure(e))?;
        self.log.info("Item scheme versions match.");
        Ok(())
    }

    fn schema_failure(&self, error: ClientError) -> ClientError {
        self.log.critical(&error);
        error
    }

    /// List the catalog
    ///
    /// `tags` are ANDed by the server; `name` is a substring match.
    pub async fn list_items(
        &self,
        page: u32,
        tags: Option<&[String]>,
        name: Option<&str>,
    ) -> ClientResult<Vec<ItemSummary>> {
        self.log.info(format!(
            "LIST {}",
            audit_args(&[
                ("page", page.to_string()),
                ("tags", format!("{:?}", tags)),
                ("name", format!("{:?}", name)),
            ])
        ));

        let raw = build_list_url(&self.base_url, page, tags, name);
        let url = Url::parse(&raw).map_err(|e| ClientError::InvalidUrl {
            url: raw.clone(),
            error: e.to_string(),
        })?;
        let items = self.http_handler.get_json(&url).await?;

        self.log.info("LIST --success--");
        Ok(items)
    }

    /// Get the details of an item by exact name
    pub async fn get_item(&self, name: &str) -> ClientResult<Item> {
        self.log
            .info(format!("GET {}", audit_args(&[("name", name.to_string())])));

        let url = self.item_url(name)?;
        let item = self.http_handler.get_json(&url).await?;

        self.log.info("GET --success--");
        Ok(item)
    }

    /// Create an item; every key must belong to the item schema
    pub async fn create_item(&self, data: &ItemPayload) -> ClientResult<Item> {
        self.log.info(format!(
            "CREATE {}",
            audit_args(&[("data", Value::Object(data.clone()).to_string())])
        ));

        validate_fields(data)?;
        let body = Value::Object(data.clone());
        let item = self.http_handler.post_json(&self.base_url, &body).await?;

        self.log.info("CREATE --success--");
        Ok(item)
    }

    /// Update an item
    ///
    /// Partial updates are allowed but every key must belong to the item
    /// schema. The server echoes the stored item; an echo without any tag
    /// means the update was not applied.
    pub async fn update_item(&self, name: &str, data: &ItemPayload) -> ClientResult<Item> {
        self.log.info(format!(
            "UPDATE {}",
            audit_args(&[
                ("name", name.to_string()),
                ("data", Value::Object(data.clone()).to_string()),
            ])
        ));

        validate_fields(data)?;
        let url = self.item_url(name)?;
        let body = Value::Object(data.clone());
        let item: Item = self.http_handler.post_json(&url, &body).await?;

        if !item.tags.iter().any(|tag| !tag.is_empty()) {
            return Err(ClientError::UpdateRejected {
                name: name.to_string(),
            });
        }

        self.log.info("UPDATE --success--");
        Ok(item)
    }

    /// Fetch a raw asset (image or lorebook payload) from an absolute URL
    pub async fn fetch_asset(&self, url: &Url) -> ClientResult<Vec<u8>> {
        self.http_handler.get_bytes(url).await
    }

    /// Catalog root URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn docs_url(&self) -> ClientResult<Url> {
        self.base_url
            .join(catalog::DOCS_PATH)
            .map_err(|e| ClientError::InvalidUrl {
                url: self.base_url.to_string(),
                error: e.to_string(),
            })
    }

    /// `<root>/<name>`, with `name` percent-encoded as a single path segment
    fn item_url(&self, name: &str) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl {
                url: self.base_url.to_string(),
                error: "cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .push(name);
        Ok(url)
    }
}

/// Build the listing URL
///
/// Terms, joined with `&`: `page=N` when `N != 0`, the tags space-joined as a
/// bare term, `name=<substr>`. No terms gives the bare catalog URL.
pub fn build_list_url(
    base: &Url,
    page: u32,
    tags: Option<&[String]>,
    name: Option<&str>,
) -> String {
    let mut terms = Vec::new();

    if page != 0 {
        terms.push(format!("page={}", page));
    }
    if let Some(tags) = tags {
        terms.push(tags.join(" "));
    }
    if let Some(name) = name {
        terms.push(format!("name={}", name));
    }

    if terms.is_empty() {
        base.to_string()
    } else {
        format!("{}?{}", base, terms.join("&"))
    }
}

/// `[key=value, ...]` rendering of call arguments for the audit log
fn audit_args(args: &[(&str, String)]) -> String {
    let rendered: Vec<String> = args
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    format!("[{}]", rendered.join(", "))
}
