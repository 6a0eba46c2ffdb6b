//! Live tile URLs.

use super::grid::TileKey;

const OSM_TEMPLATE: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";

/// A raster tile service with rotating subdomains.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSource {
    /// URL with `{s}`, `{z}`, `{x}` and `{y}` placeholders.
    pub url_template: String,
    pub subdomains: Vec<String>,
}

impl TileSource {
    pub fn new(url_template: impl Into<String>, subdomains: &[&str]) -> Self {
        Self {
            url_template: url_template.into(),
            subdomains: subdomains.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// OpenStreetMap's standard tile layer.
    pub fn openstreetmap() -> Self {
        Self::new(OSM_TEMPLATE, &["a", "b", "c"])
    }

    /// Subdomain serving `key`, picked by `(x + y) mod n` so neighbouring
    /// tiles spread across servers.
    pub fn subdomain(&self, key: TileKey) -> &str {
        if self.subdomains.is_empty() {
            return "";
        }
        let i = (u64::from(key.x) + u64::from(key.y)) % self.subdomains.len() as u64;
        &self.subdomains[i as usize]
    }

    /// Live URL for `key`.
    pub fn url(&self, key: TileKey) -> String {
        self.url_template
            .replace("{s}", self.subdomain(key))
            .replace("{z}", &key.z.to_string())
            .replace("{x}", &key.x.to_string())
            .replace("{y}", &key.y.to_string())
    }
}

impl Default for TileSource {
    fn default() -> Self {
        Self::openstreetmap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subdomains_rotate_with_x_plus_y() {
        let source = TileSource::openstreetmap();
        let key = |x, y| TileKey { z: 12, x, y };

        assert_eq!(source.url(key(1239, 1514)), "https://c.tile.openstreetmap.org/12/1239/1514.png");
        assert_eq!(source.subdomain(key(1240, 1514)), "a");
        assert_eq!(source.subdomain(key(1240, 1515)), "b");
        assert_eq!(source.subdomain(key(0, 0)), "a");
    }

    #[test]
    fn template_without_subdomains() {
        let source = TileSource::new("http://localhost/{z}/{x}/{y}.png", &[]);
        assert_eq!(source.url(TileKey { z: 1, x: 0, y: 1 }), "http://localhost/1/0/1.png");
    }
}
