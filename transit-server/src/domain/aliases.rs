//! Auxiliary services that display under another line.
//!
//! The Mattapan trolley runs as an extension of the Red Line's Ashmont
//! branch, but upstream publishes it as its own route on its own line.
//! Riders expect it coloured and labelled as Red Line, so both its route
//! id and its line id are mapped onto the parent line.

/// One alias entry: an auxiliary route/line pair and the line it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAlias {
    /// Route id of the auxiliary service, e.g. `Mattapan`.
    pub route_id: &'static str,
    /// Line id the auxiliary service is published under, e.g. `line-Mattapan`.
    pub line_id: &'static str,
    /// Canonical parent line id, e.g. `line-Red`.
    pub canonical_line_id: &'static str,
}

/// The built-in alias table.
pub const DEFAULT_ALIASES: &[RouteAlias] = &[RouteAlias {
    route_id: "Mattapan",
    line_id: "line-Mattapan",
    canonical_line_id: "line-Red",
}];

/// Lookup over an explicit alias table.
#[derive(Debug, Clone)]
pub struct RouteAliases {
    entries: Vec<RouteAlias>,
}

impl RouteAliases {
    pub fn new(entries: Vec<RouteAlias>) -> Self {
        Self { entries }
    }

    /// A table with no aliases.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Canonical line for an alias route id, if `route_id` is an alias.
    pub fn canonical_line_for_route(&self, route_id: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|a| a.route_id == route_id)
            .map(|a| a.canonical_line_id)
    }

    /// Canonical line for an alias line id, if `line_id` is an alias.
    pub fn canonical_line_for_line(&self, line_id: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|a| a.line_id == line_id)
            .map(|a| a.canonical_line_id)
    }

    /// Whether `line_id` is an auxiliary line that should not be shown on its own.
    pub fn is_alias_line(&self, line_id: &str) -> bool {
        self.canonical_line_for_line(line_id).is_some()
    }
}

impl Default for RouteAliases {
    fn default() -> Self {
        Self::new(DEFAULT_ALIASES.to_vec())
    }
}
