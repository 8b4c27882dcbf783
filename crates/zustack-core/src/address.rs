//! Asset addressing
//!
//! Every playable asset lives under `/<prefix>/<location>/<bucket>/<asset>` on the
//! page and is served from the asset host as
//! `{host}/{public|private}/{location}/{bucket}/{asset}/{resource}`. Private assets
//! carry the access token as a `jwt` query parameter on every derived URL.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

/// Default asset host
pub const DEFAULT_ASSET_HOST: &str = "https://assets.zustack.com";

/// [`DEFAULT_ASSET_HOST`] as a URL
pub fn default_asset_host() -> Url {
    Url::parse(DEFAULT_ASSET_HOST).expect("default asset host is a valid URL")
}

/// Query parameter carrying the access token
pub const TOKEN_PARAM: &str = "jwt";

/// Query parameter carrying the requested seek preview count
pub const SEEK_PARAM: &str = "seek";

/// Whether an asset is served from the public or the private tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resource stored next to an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetResource {
    /// HLS master playlist
    Playlist,
    /// Poster image shown before playback
    Poster,
    /// Seek preview sprite sheet, numbered from 1
    SeekSheet(u32),
}

impl AssetResource {
    /// File name of the resource inside the asset directory
    pub fn file_name(&self) -> String {
        match self {
            AssetResource::Playlist => "master.m3u8".to_string(),
            AssetResource::Poster => "thumbnail.webp".to_string(),
            AssetResource::SeekSheet(number) => format!("seek_{:03}.jpg", number),
        }
    }
}

/// Identifies one asset for the lifetime of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAddress {
    pub location: String,
    pub bucket_id: String,
    pub asset_id: String,
    /// Bearer token for private assets
    pub access_token: Option<String>,
}

impl AssetAddress {
    /// Create a public address, validating each identifier as a path segment
    pub fn new(
        location: impl Into<String>,
        bucket_id: impl Into<String>,
        asset_id: impl Into<String>,
    ) -> Result<Self> {
        let address = Self {
            location: location.into(),
            bucket_id: bucket_id.into(),
            asset_id: asset_id.into(),
            access_token: None,
        };

        for (name, value) in [
            ("location", &address.location),
            ("bucket", &address.bucket_id),
            ("asset", &address.asset_id),
        ] {
            if !is_path_segment(value) {
                return Err(Error::MalformedAddress {
                    path: format!("/{}/{}/{}", address.location, address.bucket_id, address.asset_id),
                    missing: name,
                });
            }
        }

        Ok(address)
    }

    /// Attach an access token. Empty tokens leave the address public.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.access_token = token.filter(|t| !t.is_empty());
        self
    }

    /// Parse `/<prefix>/<location>/<bucket>/<asset>`. Trailing segments are ignored.
    pub fn from_path(path: &str) -> Result<Self> {
        let mut segments = path.trim_start_matches('/').split('/').skip(1);

        let mut next = |missing: &'static str| {
            segments
                .next()
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .ok_or_else(|| Error::MalformedAddress {
                    path: path.to_string(),
                    missing,
                })
        };

        let location = next("location")?;
        let bucket_id = next("bucket")?;
        let asset_id = next("asset")?;

        Self::new(location, bucket_id, asset_id)
    }

    pub fn visibility(&self) -> Visibility {
        if self.access_token.is_some() {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }

    pub fn is_private(&self) -> bool {
        self.visibility() == Visibility::Private
    }
}

fn is_path_segment(value: &str) -> bool {
    !value.is_empty() && !value.contains(['/', '?', '#'])
}

/// Everything the page address asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub address: AssetAddress,
    /// Number of seek preview frames requested (0 = none)
    pub seek_count: u32,
}

impl PageRequest {
    /// Read the asset address and the `seek`/`jwt` query parameters from a page URL
    pub fn from_url(page: &Url) -> Result<Self> {
        let mut token = None;
        let mut seek_count = 0;

        for (key, value) in page.query_pairs() {
            match key.as_ref() {
                TOKEN_PARAM => token = Some(value.into_owned()),
                SEEK_PARAM => {
                    seek_count = value.trim().parse::<u32>().unwrap_or_else(|_| {
                        warn!(seek = %value, "Ignoring unparseable seek count");
                        0
                    })
                }
                _ => {}
            }
        }

        let address = AssetAddress::from_path(page.path())?.with_token(token);

        Ok(Self {
            address,
            seek_count,
        })
    }
}

/// Playback and poster URLs of an asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaUrls {
    pub playback_url: Url,
    pub poster_url: Url,
}

/// Derives asset URLs from an [`AssetAddress`]
#[derive(Debug, Clone)]
pub struct AddressResolver {
    host: Url,
}

impl AddressResolver {
    pub fn new(host: Url) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &Url {
        &self.host
    }

    /// URL of a single resource of the asset
    pub fn resource_url(&self, address: &AssetAddress, resource: AssetResource) -> Result<Url> {
        let host = self.host.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!(
            "{}/{}/{}/{}/{}/{}",
            host,
            address.visibility(),
            address.location,
            address.bucket_id,
            address.asset_id,
            resource.file_name(),
        ))?;

        if let Some(token) = &address.access_token {
            url.query_pairs_mut().append_pair(TOKEN_PARAM, token);
        }

        Ok(url)
    }

    pub fn media_urls(&self, address: &AssetAddress) -> Result<MediaUrls> {
        Ok(MediaUrls {
            playback_url: self.resource_url(address, AssetResource::Playlist)?,
            poster_url: self.resource_url(address, AssetResource::Poster)?,
        })
    }
}

impl Default for AddressResolver {
    fn default() -> Self {
        Self {
            host: default_asset_host(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str) -> PageRequest {
        PageRequest::from_url(&Url::parse(url).unwrap()).unwrap()
    }

    #[test]
    fn test_parse_public_page() {
        let request = page("https://play.zustack.com/stream/eu/bkt123/file456?seek=100");
        assert_eq!(request.address.location, "eu");
        assert_eq!(request.address.bucket_id, "bkt123");
        assert_eq!(request.address.asset_id, "file456");
        assert_eq!(request.address.access_token, None);
        assert_eq!(request.seek_count, 100);
    }

    #[test]
    fn test_parse_private_page() {
        let request = page("https://play.zustack.com/stream/eu/bkt123/file456?jwt=abc");
        assert_eq!(request.address.access_token.as_deref(), Some("abc"));
        assert_eq!(request.address.visibility(), Visibility::Private);
        assert_eq!(request.seek_count, 0);
    }

    #[test]
    fn test_empty_token_is_public() {
        let request = page("https://play.zustack.com/stream/eu/b/f?jwt=");
        assert!(!request.address.is_private());
    }

    #[test]
    fn test_unparseable_seek_disables_grid() {
        assert_eq!(page("https://x.com/s/eu/b/f?seek=lots").seek_count, 0);
        assert_eq!(page("https://x.com/s/eu/b/f?seek=-4").seek_count, 0);
    }

    #[test]
    fn test_malformed_path() {
        let err = AssetAddress::from_path("/stream/eu/bkt123").unwrap_err();
        assert!(matches!(err, Error::MalformedAddress { missing: "asset", .. }));

        let err = AssetAddress::from_path("/stream//bkt/file").unwrap_err();
        assert!(matches!(err, Error::MalformedAddress { missing: "location", .. }));

        assert!(AssetAddress::from_path("/").is_err());
    }

    #[test]
    fn test_segment_validation() {
        assert!(AssetAddress::new("eu", "a/b", "f").is_err());
        assert!(AssetAddress::new("eu", "b", "f?x").is_err());
        assert!(AssetAddress::new("eu", "b", "f").is_ok());
    }

    #[test]
    fn test_public_urls() {
        let address = AssetAddress::new("eu", "bkt123", "file456").unwrap();
        let urls = AddressResolver::default().media_urls(&address).unwrap();
        assert_eq!(
            urls.playback_url.as_str(),
            "https://assets.zustack.com/public/eu/bkt123/file456/master.m3u8"
        );
        assert_eq!(
            urls.poster_url.as_str(),
            "https://assets.zustack.com/public/eu/bkt123/file456/thumbnail.webp"
        );
    }

    #[test]
    fn test_private_urls() {
        let address = AssetAddress::new("eu", "bkt123", "file456")
            .unwrap()
            .with_token(Some("abc".to_string()));
        let urls = AddressResolver::default().media_urls(&address).unwrap();
        assert_eq!(
            urls.playback_url.as_str(),
            "https://assets.zustack.com/private/eu/bkt123/file456/master.m3u8?jwt=abc"
        );
        assert!(urls.poster_url.as_str().ends_with("/thumbnail.webp?jwt=abc"));
    }

    #[test]
    fn test_default_host_shared_by_resolver_and_config() {
        let host = default_asset_host();
        assert_eq!(host.as_str(), "https://assets.zustack.com/");
        assert_eq!(AddressResolver::default().host(), &host);
        assert_eq!(crate::SessionConfig::default().asset_host, host);
    }

    #[test]
    fn test_custom_host_with_path() {
        let resolver = AddressResolver::new(Url::parse("https://cdn.example.com/media/").unwrap());
        let address = AssetAddress::new("us", "b", "f").unwrap();
        let url = resolver.resource_url(&address, AssetResource::SeekSheet(7)).unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/media/public/us/b/f/seek_007.jpg");
    }

    #[test]
    fn test_resource_names() {
        assert_eq!(AssetResource::SeekSheet(1).file_name(), "seek_001.jpg");
        assert_eq!(AssetResource::SeekSheet(42).file_name(), "seek_042.jpg");
        assert_eq!(AssetResource::SeekSheet(1000).file_name(), "seek_1000.jpg");
    }
}
