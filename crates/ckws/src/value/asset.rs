//! Binary attachments.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Token in a download URL template replaced by the file checksum.
pub const CHECKSUM_PLACEHOLDER: &str = "${f}";

/// A binary attachment field value.
///
/// An asset is either staged locally, waiting to be uploaded by a save,
/// or describes a file the server already holds. Saving a record replaces
/// its local assets with the server-confirmed descriptors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Asset {
    /// A file on the local filesystem, not yet uploaded.
    Local(PathBuf),
    /// A file the server has accepted.
    Remote(AssetDescriptor),
}

impl Asset {
    /// Stage a local file for upload.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Asset::Local(path.into())
    }

    /// Returns the staged path, if this asset has not been uploaded.
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Asset::Local(path) => Some(path),
            Asset::Remote(_) => None,
        }
    }

    /// Returns the server descriptor, if this asset has been uploaded.
    pub fn descriptor(&self) -> Option<&AssetDescriptor> {
        match self {
            Asset::Local(_) => None,
            Asset::Remote(descriptor) => Some(descriptor),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Asset::Local(_))
    }

    /// Returns the URL the asset can be downloaded from, if known.
    pub fn download_url(&self) -> Option<String> {
        self.descriptor().and_then(AssetDescriptor::download_url)
    }
}

/// Server-side description of an uploaded asset.
///
/// Produced by an upload (`fileChecksum`, `size`, `receipt`, ...) and
/// returned on fetched records with a `downloadURL` template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDescriptor {
    pub file_checksum: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_checksum: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrapping_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<String>,
    #[serde(
        rename = "downloadURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub download_url_template: Option<String>,
}

impl AssetDescriptor {
    /// Expand the download URL template with this asset's checksum.
    ///
    /// # Example
    ///
    /// ```
    /// use ckws::AssetDescriptor;
    ///
    /// let descriptor = AssetDescriptor {
    ///     file_checksum: "AbC123".to_string(),
    ///     size: Some(10),
    ///     reference_checksum: None,
    ///     wrapping_key: None,
    ///     receipt: None,
    ///     download_url_template: Some("https://cvws.example.com/B/AbC123/${f}".to_string()),
    /// };
    /// assert_eq!(
    ///     descriptor.download_url().as_deref(),
    ///     Some("https://cvws.example.com/B/AbC123/AbC123")
    /// );
    /// ```
    pub fn download_url(&self) -> Option<String> {
        self.download_url_template
            .as_ref()
            .map(|template| template.replace(CHECKSUM_PLACEHOLDER, &self.file_checksum))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(template: Option<&str>) -> AssetDescriptor {
        AssetDescriptor {
            file_checksum: "ck".to_string(),
            size: Some(3),
            reference_checksum: None,
            wrapping_key: None,
            receipt: Some("r".to_string()),
            download_url_template: template.map(str::to_string),
        }
    }

    #[test]
    fn local_asset_has_no_download_url() {
        let asset = Asset::from_file("/tmp/photo.png");
        assert!(asset.is_local());
        assert_eq!(asset.download_url(), None);
    }

    #[test]
    fn remote_asset_expands_every_placeholder() {
        let asset = Asset::Remote(descriptor(Some("https://h/${f}/x?name=${f}")));
        assert_eq!(asset.download_url().as_deref(), Some("https://h/ck/x?name=ck"));
    }

    #[test]
    fn descriptor_uses_download_url_key() {
        let json = serde_json::to_value(descriptor(Some("u"))).unwrap();
        assert_eq!(json["downloadURL"], "u");
        assert_eq!(json["fileChecksum"], "ck");
        assert!(json.get("wrappingKey").is_none());
    }
}
