//! Seek preview grid planning
//!
//! Seek previews are stored as sprite sheets of 6x6 frames. The planner emits one
//! sheet URL per started block of 36 frames; the widget tiles frames within a sheet.

use crate::address::{AddressResolver, AssetAddress, AssetResource};
use crate::Result;
use serde::{Deserialize, Serialize};
use url::Url;

/// Columns per sprite sheet
pub const SHEET_COLUMNS: u32 = 6;

/// Rows per sprite sheet
pub const SHEET_ROWS: u32 = 6;

/// Preview frames per sprite sheet
pub const FRAMES_PER_SHEET: u32 = SHEET_COLUMNS * SHEET_ROWS;

/// Default on-screen thumbnail width in pixels
pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 300;

/// Number of sheets needed to cover `requested` frames
pub fn sheet_count(requested: u32) -> u32 {
    requested.div_ceil(FRAMES_PER_SHEET)
}

/// Height of a 16:9 thumbnail of the given width
pub fn widescreen_height(width: u32) -> f64 {
    f64::from(width) * 9.0 / 16.0
}

/// Thumbnail grid configuration handed to the player widget
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeekGridConfig {
    pub enabled: bool,
    /// Number of preview frames requested
    #[serde(rename = "pic_num")]
    pub requested_count: u32,
    /// On-screen thumbnail width
    pub width: u32,
    /// On-screen thumbnail height, 16:9 until a real sheet has loaded
    pub height: f64,
    #[serde(rename = "col")]
    pub cols: u32,
    #[serde(rename = "row")]
    pub rows: u32,
    #[serde(rename = "offsetX")]
    pub offset_x: u32,
    #[serde(rename = "offsetY")]
    pub offset_y: u32,
    /// Sprite sheet URLs in playback order
    #[serde(rename = "urls")]
    pub tile_urls: Vec<Url>,
}

impl SeekGridConfig {
    /// A disabled grid with no sheets
    pub fn disabled(width: u32) -> Self {
        Self {
            enabled: false,
            requested_count: 0,
            width,
            height: widescreen_height(width),
            cols: SHEET_COLUMNS,
            rows: SHEET_ROWS,
            offset_x: 0,
            offset_y: 0,
            tile_urls: Vec::new(),
        }
    }

    /// Number of frames the emitted sheets can hold
    pub fn capacity(&self) -> u32 {
        self.tile_urls.len() as u32 * self.cols * self.rows
    }
}

impl Default for SeekGridConfig {
    fn default() -> Self {
        Self::disabled(DEFAULT_THUMBNAIL_WIDTH)
    }
}

/// Plans the sprite sheets for an asset
#[derive(Debug, Clone)]
pub struct SeekGridPlanner {
    resolver: AddressResolver,
    thumbnail_width: u32,
}

impl SeekGridPlanner {
    pub fn new(resolver: AddressResolver, thumbnail_width: u32) -> Self {
        Self {
            resolver,
            thumbnail_width,
        }
    }

    /// Sheet URLs `seek_001.jpg`.. covering `requested` frames
    pub fn sheet_urls(&self, address: &AssetAddress, requested: u32) -> Result<Vec<Url>> {
        (1..=sheet_count(requested))
            .map(|n| self.resolver.resource_url(address, AssetResource::SeekSheet(n)))
            .collect()
    }

    /// Full grid configuration; a zero request yields a disabled grid
    pub fn plan(&self, address: &AssetAddress, requested: u32) -> Result<SeekGridConfig> {
        if requested == 0 {
            return Ok(SeekGridConfig::disabled(self.thumbnail_width));
        }

        Ok(SeekGridConfig {
            enabled: true,
            requested_count: requested,
            tile_urls: self.sheet_urls(address, requested)?,
            ..SeekGridConfig::disabled(self.thumbnail_width)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner() -> SeekGridPlanner {
        SeekGridPlanner::new(AddressResolver::default(), DEFAULT_THUMBNAIL_WIDTH)
    }

    fn address() -> AssetAddress {
        AssetAddress::new("eu", "bkt123", "file456").unwrap()
    }

    #[test]
    fn test_sheet_count() {
        assert_eq!(sheet_count(0), 0);
        assert_eq!(sheet_count(1), 1);
        assert_eq!(sheet_count(36), 1);
        assert_eq!(sheet_count(37), 2);
        assert_eq!(sheet_count(100), 3);
        assert_eq!(sheet_count(108), 3);
    }

    #[test]
    fn test_zero_request_is_disabled() {
        let grid = planner().plan(&address(), 0).unwrap();
        assert!(!grid.enabled);
        assert!(grid.tile_urls.is_empty());
    }

    #[test]
    fn test_sheet_names_are_sequential() {
        let grid = planner().plan(&address(), 100).unwrap();
        assert!(grid.enabled);
        let names: Vec<_> = grid
            .tile_urls
            .iter()
            .map(|u| u.path_segments().unwrap().last().unwrap().to_string())
            .collect();
        assert_eq!(names, ["seek_001.jpg", "seek_002.jpg", "seek_003.jpg"]);
        assert!(grid.capacity() >= 100);
    }

    #[test]
    fn test_private_sheets_carry_token() {
        let address = address().with_token(Some("abc".into()));
        let urls = planner().sheet_urls(&address, 40).unwrap();
        assert_eq!(urls.len(), 2);
        for url in &urls {
            assert!(url.path().starts_with("/private/"));
            assert!(url.as_str().ends_with("?jwt=abc"));
        }
    }

    #[test]
    fn test_default_geometry() {
        let grid = planner().plan(&address(), 10).unwrap();
        assert_eq!(grid.width, 300);
        assert_eq!(grid.height, 168.75);
        assert_eq!((grid.cols, grid.rows), (6, 6));
    }

    #[test]
    fn test_widget_keys() {
        let grid = planner().plan(&address(), 10).unwrap();
        let json = serde_json::to_value(&grid).unwrap();
        assert_eq!(json["pic_num"], 10);
        assert_eq!(json["col"], 6);
        assert_eq!(json["offsetX"], 0);
        assert_eq!(json["urls"].as_array().unwrap().len(), 1);
    }
}
