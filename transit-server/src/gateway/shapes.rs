//! Picking which shapes of a route to draw.
//!
//! Upstream returns every pattern variant of a route, many of them
//! overlapping. We keep the canonical patterns when there are any, and
//! otherwise the longest polylines, then thin the result so that a route
//! with branches shows each branch while a simple route shows one line.

use std::collections::HashSet;

use crate::domain::Shape;

const CANONICAL_PREFIX: &str = "canonical-";

/// Relative length spread above which shapes are treated as distinct branches.
const BRANCH_SPREAD: f64 = 0.15;

/// Limits for display shape selection.
#[derive(Debug, Clone)]
pub struct ShapeSelection {
    /// Routes known to have branches; they keep up to `max_branched` shapes.
    pub branched_routes: Vec<String>,
    pub max_branched: usize,
    /// Shapes kept for an unbranched route whose shapes differ enough in length.
    pub max_distinct: usize,
    /// Shapes kept when a route has no canonical shapes.
    pub max_fallback: usize,
}

impl Default for ShapeSelection {
    fn default() -> Self {
        Self {
            branched_routes: vec!["Red".to_string()],
            max_branched: 5,
            max_distinct: 3,
            max_fallback: 2,
        }
    }
}

impl ShapeSelection {
    fn is_branched(&self, route_id: &str) -> bool {
        self.branched_routes.iter().any(|r| r == route_id)
    }

    /// Reduce one route's shapes to the set worth drawing.
    pub fn select(&self, route_id: &str, shapes: Vec<Shape>) -> Vec<Shape> {
        let mut seen = HashSet::new();
        let canonical: Vec<Shape> = shapes
            .iter()
            .filter(|s| s.id.starts_with(CANONICAL_PREFIX))
            .filter(|s| seen.insert(s.id.clone()))
            .cloned()
            .collect();

        let mut candidates = if canonical.is_empty() {
            let mut by_length: Vec<Shape> =
                shapes.into_iter().filter(|s| !s.polyline.is_empty()).collect();
            sort_longest_first(&mut by_length);
            by_length.truncate(self.max_fallback);
            by_length
        } else {
            canonical
        };

        if candidates.len() <= 1 {
            return candidates;
        }

        sort_longest_first(&mut candidates);
        let keep = if self.is_branched(route_id) {
            self.max_branched
        } else if length_spread(&candidates) >= BRANCH_SPREAD {
            self.max_distinct
        } else {
            1
        };
        candidates.truncate(keep);
        candidates
    }
}

fn sort_longest_first(shapes: &mut [Shape]) {
    shapes.sort_by(|a, b| b.polyline.len().cmp(&a.polyline.len()));
}

/// `(max - min) / max` over polyline lengths of shapes sorted longest first.
fn length_spread(sorted: &[Shape]) -> f64 {
    let (Some(longest), Some(shortest)) = (sorted.first(), sorted.last()) else {
        return 0.0;
    };
    let max = longest.polyline.len() as f64;
    if max == 0.0 {
        return 0.0;
    }
    (max - shortest.polyline.len() as f64) / max
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(id: &str, len: usize) -> Shape {
        Shape {
            id: id.to_string(),
            polyline: "x".repeat(len),
            route_id: "Orange".to_string(),
        }
    }

    fn ids(shapes: &[Shape]) -> Vec<&str> {
        shapes.iter().map(|s| s.id.as_str()).collect()
    }

    #[test]
    fn prefers_canonical_shapes() {
        let selection = ShapeSelection::default();
        let shapes = vec![
            shape("740_0001", 900),
            shape("canonical-740_0001", 500),
            shape("canonical-740_0001", 500),
        ];

        let picked = selection.select("Orange", shapes);
        assert_eq!(ids(&picked), vec!["canonical-740_0001"]);
    }

    #[test]
    fn similar_lengths_collapse_to_longest() {
        let selection = ShapeSelection::default();
        let shapes = vec![shape("canonical-a", 480), shape("canonical-b", 500)];

        let picked = selection.select("Orange", shapes);
        assert_eq!(ids(&picked), vec!["canonical-b"]);
    }

    #[test]
    fn distinct_lengths_keep_up_to_three() {
        let selection = ShapeSelection::default();
        let shapes = vec![
            shape("canonical-a", 100),
            shape("canonical-b", 500),
            shape("canonical-c", 300),
            shape("canonical-d", 200),
        ];

        let picked = selection.select("Green-B", shapes);
        assert_eq!(ids(&picked), vec!["canonical-b", "canonical-c", "canonical-d"]);
    }

    #[test]
    fn branched_route_keeps_all_branches() {
        let selection = ShapeSelection::default();
        let shapes = vec![
            shape("canonical-931_0009", 500),
            shape("canonical-931_0010", 495),
            shape("canonical-933_0009", 520),
            shape("canonical-933_0010", 515),
        ];

        let picked = selection.select("Red", shapes);
        assert_eq!(picked.len(), 4);
        assert_eq!(picked[0].id, "canonical-933_0009");
    }

    #[test]
    fn no_canonical_falls_back_to_longest() {
        let selection = ShapeSelection::default();
        let shapes = vec![
            shape("a", 10),
            shape("b", 300),
            shape("c", 200),
            shape("empty", 0),
        ];

        // b and c differ by a third, so both survive.
        let picked = selection.select("Blue", shapes);
        assert_eq!(ids(&picked), vec!["b", "c"]);
    }

    #[test]
    fn empty_input() {
        let selection = ShapeSelection::default();
        assert!(selection.select("Blue", Vec::new()).is_empty());
    }
}
