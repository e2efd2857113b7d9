//! Dependency-resolving package downloader
//!
//! A package is an item's metadata, its lorebook payload and optionally its
//! image, written next to each other and zipped into `<name>.zip`. Downloading
//! a package also downloads everything it depends on, depth-first and in
//! declaration order, recording each payload in a [`PackageBundle`].
//!
//! A name is recorded in the bundle before its dependencies are visited, so
//! resolution never fetches the same item twice and terminates on cyclic
//! dependency graphs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use indexmap::IndexMap;
use indicatif::{ProgressBar, ProgressStyle};
use url::Url;

use crate::app::archive::package_files;
use crate::app::client::CatalogClient;
use crate::app::models::Item;
use crate::constants::files;
use crate::errors::PackageResult;
use crate::logging::ChannelLogger;

/// Payloads resolved so far, by item name, in resolution order
///
/// `None` records an item whose payload could not be fetched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageBundle {
    packages: IndexMap<String, Option<Vec<u8>>>,
}

impl PackageBundle {
    /// Empty bundle
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` has already been resolved
    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// Record a resolved package; returns false if the name was already present
    pub fn insert(&mut self, name: impl Into<String>, payload: Option<Vec<u8>>) -> bool {
        let name = name.into();
        if self.packages.contains_key(&name) {
            return false;
        }
        self.packages.insert(name, payload);
        true
    }

    /// Payload of a resolved package, if it was fetched
    pub fn payload(&self, name: &str) -> Option<&[u8]> {
        self.packages.get(name).and_then(|p| p.as_deref())
    }

    /// Resolved names in resolution order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }

    /// Resolved packages in resolution order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&[u8]>)> {
        self.packages
            .iter()
            .map(|(name, payload)| (name.as_str(), payload.as_deref()))
    }

    /// Number of resolved packages
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Whether nothing has been resolved
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Split a comma-separated name list, trimming each name
pub fn parse_names(names: &str) -> Vec<String> {
    names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Downloads packages and their dependencies into an output directory
pub struct Downloader<'a> {
    client: &'a CatalogClient,
    output_dir: PathBuf,
    progress: ProgressBar,
    log: ChannelLogger,
}

impl<'a> Downloader<'a> {
    /// Downloader writing under `output_dir`, without a progress display
    pub fn new(client: &'a CatalogClient, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            output_dir: output_dir.into(),
            progress: ProgressBar::hidden(),
            log: ChannelLogger::new("download"),
        }
    }

    /// Show a spinner naming the package being fetched
    pub fn with_spinner(mut self) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.progress = spinner;
        self
    }

    /// Download every package of a comma-separated list into `bundle`
    ///
    /// Names already in the bundle are skipped.
    pub async fn download_many(&self, names: &str, bundle: &mut PackageBundle) -> PackageResult<()> {
        for name in parse_names(names) {
            if bundle.contains(&name) {
                self.log
                    .info(format!("Found duplicate package {}. Ignoring...", name));
                continue;
            }
            self.download(&name, bundle).await?;
        }

        self.progress.finish_and_clear();
        Ok(())
    }

    /// Download a package and, depth-first, everything it depends on
    pub async fn download(&self, name: &str, bundle: &mut PackageBundle) -> PackageResult<()> {
        let mut pending = vec![name.to_string()];

        while let Some(next) = pending.pop() {
            if bundle.contains(&next) {
                self.log
                    .info(format!("Found duplicate dependency {}. Ignoring...", next));
                continue;
            }

            let item = self.fetch_package(&next, bundle).await?;

            // Reversed so the first dependency is visited first
            for dep in item.deps.iter().rev() {
                if bundle.contains(dep) || *dep == item.name {
                    self.log
                        .info(format!("Found duplicate dependency {}. Ignoring...", dep));
                } else {
                    pending.push(dep.clone());
                }
            }
        }

        Ok(())
    }

    /// Fetch, persist and zip a single package, recording its payload
    async fn fetch_package(&self, name: &str, bundle: &mut PackageBundle) -> PackageResult<Item> {
        self.log.info(format!("Downloading the {} package.", name));
        self.log.user(format!("Downloading the {} package.", name));
        self.progress.set_message(format!("Downloading {}", name));

        let item = self.client.get_item(name).await?;
        let name = item.name.as_str();
        let mut written = Vec::new();

        if let Some(image_url) = item.image_url() {
            let image_path = self.output_dir.join(format!(
                "{}.{}",
                name,
                image_extension(image_url)
            ));
            if self.dump_asset(image_url, &image_path).await.is_some() {
                written.push(image_path);
            }
        }

        let lorebook_path = self
            .output_dir
            .join(format!("{}.{}", name, files::LOREBOOK_EXT));
        let payload = self.dump_asset(&item.file, &lorebook_path).await;
        if payload.is_some() {
            written.push(lorebook_path);
        }

        let json_path = self
            .output_dir
            .join(format!("{}.{}", name, files::METADATA_EXT));
        tokio::fs::write(&json_path, serde_json::to_vec(&item)?).await?;
        written.push(json_path);

        bundle.insert(name, payload);

        let archive = self
            .output_dir
            .join(format!("{}.{}", name, files::ARCHIVE_EXT));
        package_files(&written, &archive)?;

        Ok(item)
    }

    /// Fetch an asset referenced by an item and write it to `path`
    ///
    /// Returns the asset bytes, or `None` when the URL is not an `http(s)`
    /// URL, the fetch fails or the file cannot be written. Nothing is
    /// requested for an invalid URL.
    pub async fn dump_asset(&self, url: &str, path: &Path) -> Option<Vec<u8>> {
        let url = match Url::parse(url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            _ => {
                self.log.warn(format!("{} is not a valid url", url));
                return None;
            }
        };

        let bytes = match self.client.fetch_asset(&url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                self.log.error(format!("Failed to fetch {}: {}", url, e));
                return None;
            }
        };

        if let Err(e) = tokio::fs::write(path, &bytes).await {
            self.log
                .error(format!("Failed to write {}: {}", path.display(), e));
            return None;
        }

        Some(bytes)
    }
}

/// File extension for an image URL, from the last path segment
fn image_extension(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .and_then(|segment| {
            segment
                .rsplit_once('.')
                .map(|(_, ext)| ext.to_string())
        })
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| files::FALLBACK_IMAGE_EXT.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::client::ClientConfig;
    use serde_json::{json, Value};
    use std::fs::File;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> CatalogClient {
        let config = ClientConfig {
            retries: 0,
            schema_check: false,
            ..ClientConfig::for_url(Url::parse(&format!("{}/", server.uri())).unwrap())
        };
        CatalogClient::new(config).unwrap()
    }

    fn item(server: &MockServer, name: &str, deps: &[&str], image: &str) -> Value {
        json!({
            "id": 1,
            "name": name,
            "deps": deps,
            "tags": ["touhou"],
            "image": image,
            "desc": "",
            "file": format!("{}/files/{}.lorebook", server.uri(), name),
            "service": "NAI",
            "date_created": "2022-03-01",
            "date_updated": "2022-03-01"
        })
    }

    async fn mount_item(server: &MockServer, name: &str, deps: &[&str], image: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/{}", name)))
            .respond_with(ResponseTemplate::new(200).set_body_json(item(server, name, deps, image)))
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/files/{}.lorebook", name)))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                json!({"entries": [format!("{}-entry", name)], "categories": []}),
            ))
            .expect(1)
            .mount(server)
            .await;
    }

    fn archive_entries(path: &Path) -> Vec<String> {
        let zip = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    #[test]
    fn test_bundle_keeps_first_insert() {
        let mut bundle = PackageBundle::new();
        assert!(bundle.insert("remilia", Some(b"one".to_vec())));
        assert!(!bundle.insert("remilia", Some(b"two".to_vec())));
        assert!(bundle.insert("sakuya", None));

        assert_eq!(bundle.payload("remilia"), Some(&b"one"[..]));
        assert_eq!(bundle.payload("sakuya"), None);
        assert_eq!(bundle.names().collect::<Vec<_>>(), vec!["remilia", "sakuya"]);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(parse_names(" remilia, sakuya ,,"), vec!["remilia", "sakuya"]);
    }

    #[test]
    fn test_image_extension() {
        assert_eq!(image_extension("https://img.example.com/a/remilia.png"), "png");
        assert_eq!(image_extension("https://img.example.com/a/remilia.png?s=1"), "png");
        assert_eq!(image_extension("https://img.example.com/remilia"), "bin");
        assert_eq!(image_extension("https://img.example.com/"), "bin");
    }

    #[tokio::test]
    async fn test_invalid_asset_url_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client(&server);
        let temp_dir = TempDir::new().unwrap();
        let downloader = Downloader::new(&client, temp_dir.path());
        let target = temp_dir.path().join("remilia.png");

        assert!(downloader.dump_asset("ftp://example.com/x.png", &target).await.is_none());
        assert!(downloader.dump_asset("not a url", &target).await.is_none());
        assert!(downloader.dump_asset("", &target).await.is_none());
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_cyclic_dependencies_fetched_once() {
        let server = MockServer::start().await;
        mount_item(&server, "remilia", &["flandre", "sakuya"], "").await;
        mount_item(&server, "flandre", &["remilia", "flandre"], "").await;
        mount_item(&server, "sakuya", &["remilia"], "").await;

        let client = client(&server);
        let temp_dir = TempDir::new().unwrap();
        let downloader = Downloader::new(&client, temp_dir.path());

        let mut bundle = PackageBundle::new();
        downloader.download("remilia", &mut bundle).await.unwrap();

        assert_eq!(
            bundle.names().collect::<Vec<_>>(),
            vec!["remilia", "flandre", "sakuya"]
        );
        for name in ["remilia", "flandre", "sakuya"] {
            let archive = temp_dir.path().join(format!("{}.zip", name));
            assert_eq!(
                archive_entries(&archive),
                vec![format!("{}.json", name), format!("{}.lorebook", name)]
            );
            assert!(!temp_dir.path().join(format!("{}.json", name)).exists());
            assert!(bundle.payload(name).is_some());
        }
    }

    #[tokio::test]
    async fn test_download_many_skips_duplicates() {
        let server = MockServer::start().await;
        mount_item(&server, "remilia", &["sakuya"], "").await;
        mount_item(&server, "sakuya", &[], "").await;

        let client = client(&server);
        let temp_dir = TempDir::new().unwrap();
        let downloader = Downloader::new(&client, temp_dir.path());

        let mut bundle = PackageBundle::new();
        downloader
            .download_many("remilia, sakuya,remilia", &mut bundle)
            .await
            .unwrap();

        assert_eq!(bundle.len(), 2);
    }

    #[tokio::test]
    async fn test_image_included_and_failures_tolerated() {
        let server = MockServer::start().await;
        let image = format!("{}/img/remilia.png", server.uri());
        mount_item(&server, "remilia", &["sakuya"], &image).await;
        Mock::given(method("GET"))
            .and(path("/img/remilia.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, 0x50, 0x4e, 0x47]))
            .mount(&server)
            .await;

        // sakuya's image and payload are both gone
        let missing_image = format!("{}/img/sakuya.png", server.uri());
        Mock::given(method("GET"))
            .and(path("/sakuya"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(item(&server, "sakuya", &[], &missing_image)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client(&server);
        let temp_dir = TempDir::new().unwrap();
        let downloader = Downloader::new(&client, temp_dir.path());

        let mut bundle = PackageBundle::new();
        downloader.download("remilia", &mut bundle).await.unwrap();

        assert_eq!(
            archive_entries(&temp_dir.path().join("remilia.zip")),
            vec!["remilia.json", "remilia.lorebook", "remilia.png"]
        );
        assert_eq!(
            archive_entries(&temp_dir.path().join("sakuya.zip")),
            vec!["sakuya.json"]
        );
        assert!(bundle.contains("sakuya"));
        assert_eq!(bundle.payload("sakuya"), None);
    }

    #[tokio::test]
    async fn test_missing_item_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client(&server);
        let temp_dir = TempDir::new().unwrap();
        let downloader = Downloader::new(&client, temp_dir.path());

        let mut bundle = PackageBundle::new();
        let result = downloader.download("nobody", &mut bundle).await;
        assert!(result.is_err());
        assert!(bundle.is_empty());
    }
}
