//! Tile URL sources.

use thiserror::Error;

use crate::coord::TilePos;

/// Maps tile coordinates to the URL that serves them.
pub trait TileUrlSource: Send + Sync {
    /// URL of the tile at `pos`.
    fn url_for(&self, pos: TilePos) -> String;

    /// Name of the tile source, used for logging and as the store name.
    fn name(&self) -> &str;
}

/// Errors building a URL template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// The template addresses neither `{z}/{x}/{y}` nor `{quadkey}`.
    #[error("URL template '{0}' must contain {{z}}, {{x}} and {{y}}, or {{quadkey}}")]
    MissingPlaceholder(String),

    /// `{s}` is used but no subdomains were given.
    #[error("URL template '{0}' uses {{s}} but no subdomains are configured")]
    NoSubdomains(String),
}

/// URL source driven by a template string.
///
/// Supported placeholders:
/// - `{z}`, `{x}`, `{y}`: XYZ tile coordinates
/// - `{quadkey}`: Bing Maps quadkey
/// - `{s}`: a subdomain, rotated by tile so requests spread across servers
///
/// # Example
///
/// ```
/// use tilecache::coord::TilePos;
/// use tilecache::source::{TileUrlSource, XyzTemplate};
///
/// let osm = XyzTemplate::new("osm", "https://tile.openstreetmap.org/{z}/{x}/{y}.png").unwrap();
/// let pos = TilePos::new(3, 2, 4).unwrap();
/// assert_eq!(osm.url_for(pos), "https://tile.openstreetmap.org/3/2/4.png");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XyzTemplate {
    name: String,
    template: String,
    subdomains: Vec<String>,
}

impl XyzTemplate {
    /// Creates a template source.
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Result<Self, TemplateError> {
        let template = template.into();
        let xyz = ["{z}", "{x}", "{y}"].iter().all(|p| template.contains(p));
        if !xyz && !template.contains("{quadkey}") {
            return Err(TemplateError::MissingPlaceholder(template));
        }
        if template.contains("{s}") {
            return Err(TemplateError::NoSubdomains(template));
        }

        Ok(Self {
            name: name.into(),
            template,
            subdomains: Vec::new(),
        })
    }

    /// Creates a template source that rotates `{s}` over `subdomains`.
    pub fn with_subdomains<I, S>(
        name: impl Into<String>,
        template: impl Into<String>,
        subdomains: I,
    ) -> Result<Self, TemplateError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let template = template.into();
        let subdomains: Vec<String> = subdomains.into_iter().map(Into::into).collect();
        if template.contains("{s}") && subdomains.is_empty() {
            return Err(TemplateError::NoSubdomains(template));
        }

        let mut source = Self::new(name, template.replace("{s}", ""))?;
        source.template = template;
        source.subdomains = subdomains;
        Ok(source)
    }

    /// The raw template string.
    pub fn template(&self) -> &str {
        &self.template
    }
}

impl TileUrlSource for XyzTemplate {
    fn url_for(&self, pos: TilePos) -> String {
        let mut url = self
            .template
            .replace("{z}", &pos.zoom().to_string())
            .replace("{x}", &pos.x().to_string())
            .replace("{y}", &pos.y().to_string());

        if url.contains("{quadkey}") {
            url = url.replace("{quadkey}", &pos.quadkey());
        }
        if !self.subdomains.is_empty() {
            let index = (u64::from(pos.x()) + u64::from(pos.y())) % self.subdomains.len() as u64;
            url = url.replace("{s}", &self.subdomains[index as usize]);
        }
        url
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(zoom: u8, x: u32, y: u32) -> TilePos {
        TilePos::new(zoom, x, y).unwrap()
    }

    #[test]
    fn test_xyz_substitution() {
        let source = XyzTemplate::new("osm", "http://tiles/{z}/{x}/{y}.png").unwrap();
        assert_eq!(source.url_for(pos(3, 2, 4)), "http://tiles/3/2/4.png");
        assert_eq!(source.name(), "osm");
    }

    #[test]
    fn test_quadkey_substitution() {
        let source = XyzTemplate::new(
            "bing",
            "https://ecn.t0.tiles.virtualearth.net/tiles/a{quadkey}.jpeg?g=1",
        )
        .unwrap();
        assert_eq!(
            source.url_for(pos(3, 3, 5)),
            "https://ecn.t0.tiles.virtualearth.net/tiles/a213.jpeg?g=1"
        );
    }

    #[test]
    fn test_missing_placeholder_is_rejected() {
        let err = XyzTemplate::new("bad", "http://tiles/{z}/{x}.png").unwrap_err();
        assert!(matches!(err, TemplateError::MissingPlaceholder(_)));
    }

    #[test]
    fn test_subdomain_without_list_is_rejected() {
        let err = XyzTemplate::new("osm", "http://{s}.tiles/{z}/{x}/{y}.png").unwrap_err();
        assert!(matches!(err, TemplateError::NoSubdomains(_)));

        let err = XyzTemplate::with_subdomains(
            "osm",
            "http://{s}.tiles/{z}/{x}/{y}.png",
            Vec::<String>::new(),
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::NoSubdomains(_)));
    }

    #[test]
    fn test_subdomain_rotation() {
        let source =
            XyzTemplate::with_subdomains("osm", "http://{s}.tiles/{z}/{x}/{y}.png", ["a", "b", "c"])
                .unwrap();
        assert_eq!(source.url_for(pos(2, 0, 0)), "http://a.tiles/2/0/0.png");
        assert_eq!(source.url_for(pos(2, 1, 0)), "http://b.tiles/2/1/0.png");
        assert_eq!(source.url_for(pos(2, 1, 1)), "http://c.tiles/2/1/1.png");
        assert_eq!(source.url_for(pos(2, 2, 1)), "http://a.tiles/2/2/1.png");
    }
}
