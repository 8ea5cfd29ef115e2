//! Two-dimensional shapes and the overlap tests triggers rely on.

use glam::Vec2;

/// Closed set of shapes a trigger can compare.
///
/// Overlap is strict: shapes that merely touch along an edge or at a point do
/// not overlap.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    /// Axis-aligned rectangle.
    Rect(Rect),
    /// Circle.
    Circle(Circle),
    /// Convex polygon, typically a rotated rectangle.
    Polygon(Polygon),
}

impl Shape {
    /// Tests whether the interiors of the two shapes intersect.
    #[must_use]
    pub fn overlaps(&self, other: &Shape) -> bool {
        match (self, other) {
            (Shape::Rect(a), Shape::Rect(b)) => a.overlaps(b),
            (Shape::Circle(a), Shape::Circle(b)) => a.overlaps(b),
            (Shape::Rect(rect), Shape::Circle(circle))
            | (Shape::Circle(circle), Shape::Rect(rect)) => circle.overlaps_rect(rect),
            (Shape::Polygon(a), Shape::Polygon(b)) => a.overlaps(b),
            (Shape::Polygon(polygon), Shape::Rect(rect))
            | (Shape::Rect(rect), Shape::Polygon(polygon)) => polygon.overlaps(&rect.to_polygon()),
            (Shape::Polygon(polygon), Shape::Circle(circle))
            | (Shape::Circle(circle), Shape::Polygon(polygon)) => polygon.overlaps_circle(circle),
        }
    }
}

impl From<Rect> for Shape {
    fn from(rect: Rect) -> Self {
        Self::Rect(rect)
    }
}

impl From<Circle> for Shape {
    fn from(circle: Circle) -> Self {
        Self::Circle(circle)
    }
}

impl From<Polygon> for Shape {
    fn from(polygon: Polygon) -> Self {
        Self::Polygon(polygon)
    }
}

/// Axis-aligned rectangle anchored at its minimum corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    min: Vec2,
    size: Vec2,
}

impl Rect {
    /// Creates a rectangle from its minimum corner and dimensions.
    #[must_use]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    /// Creates a rectangle centred on the provided point.
    #[must_use]
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self {
            min: center - size * 0.5,
            size,
        }
    }

    /// Minimum corner.
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        self.min
    }

    /// Maximum corner.
    #[must_use]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    /// Width and height.
    #[must_use]
    pub const fn size(&self) -> Vec2 {
        self.size
    }

    /// Centre point.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    /// Tests whether the point lies inside the rectangle, edges included.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let max = self.max();
        point.x >= self.min.x && point.x <= max.x && point.y >= self.min.y && point.y <= max.y
    }

    /// Tests whether the two rectangles overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Rect) -> bool {
        let max = self.max();
        let other_max = other.max();
        self.min.x < other_max.x
            && max.x > other.min.x
            && self.min.y < other_max.y
            && max.y > other.min.y
    }

    /// Converts the rectangle into an equivalent four-vertex polygon.
    #[must_use]
    pub fn to_polygon(&self) -> Polygon {
        let max = self.max();
        Polygon::new(vec![
            self.min,
            Vec2::new(max.x, self.min.y),
            max,
            Vec2::new(self.min.x, max.y),
        ])
    }
}

/// Circle described by its centre and radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    center: Vec2,
    radius: f32,
}

impl Circle {
    /// Creates a circle.
    #[must_use]
    pub const fn new(center: Vec2, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Centre point.
    #[must_use]
    pub const fn center(&self) -> Vec2 {
        self.center
    }

    /// Radius.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Tests whether the two circles overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Circle) -> bool {
        let reach = self.radius + other.radius;
        self.center.distance_squared(other.center) < reach * reach
    }

    /// Tests whether the circle overlaps the rectangle.
    #[must_use]
    pub fn overlaps_rect(&self, rect: &Rect) -> bool {
        let closest = self.center.clamp(rect.min(), rect.max());
        self.center.distance_squared(closest) < self.radius * self.radius
    }
}

/// Convex polygon described by its vertices in winding order.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vec2>,
}

impl Polygon {
    /// Creates a polygon from convex vertices listed in either winding order.
    #[must_use]
    pub fn new(vertices: Vec<Vec2>) -> Self {
        Self { vertices }
    }

    /// Builds the polygon covering a rectangle rotated about its centre.
    #[must_use]
    pub fn rotated_rect(center: Vec2, size: Vec2, radians: f32) -> Self {
        let rotation = Vec2::from_angle(radians);
        let half = size * 0.5;
        let corners = [
            Vec2::new(-half.x, -half.y),
            Vec2::new(half.x, -half.y),
            Vec2::new(half.x, half.y),
            Vec2::new(-half.x, half.y),
        ];
        Self::new(
            corners
                .iter()
                .map(|corner| center + rotation.rotate(*corner))
                .collect(),
        )
    }

    /// Vertices in winding order.
    #[must_use]
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    /// Tests whether the two convex polygons overlap using separating axes.
    #[must_use]
    pub fn overlaps(&self, other: &Polygon) -> bool {
        if self.is_degenerate() || other.is_degenerate() {
            return false;
        }

        self.edge_normals()
            .chain(other.edge_normals())
            .all(|axis| overlapping(self.project(axis), other.project(axis)))
    }

    /// Tests whether the polygon overlaps the circle using separating axes.
    #[must_use]
    pub fn overlaps_circle(&self, circle: &Circle) -> bool {
        if self.is_degenerate() {
            return false;
        }

        let circle_interval = |axis: Vec2| {
            let center = circle.center().dot(axis);
            (center - circle.radius(), center + circle.radius())
        };

        let closest_vertex = self
            .vertices
            .iter()
            .copied()
            .min_by(|a, b| {
                a.distance_squared(circle.center())
                    .total_cmp(&b.distance_squared(circle.center()))
            })
            .map(|vertex| (vertex - circle.center()).normalize_or_zero())
            .filter(|axis| *axis != Vec2::ZERO);

        self.edge_normals()
            .chain(closest_vertex)
            .all(|axis| overlapping(self.project(axis), circle_interval(axis)))
    }

    fn is_degenerate(&self) -> bool {
        self.vertices.len() < 3
    }

    fn edge_normals(&self) -> impl Iterator<Item = Vec2> + '_ {
        let count = self.vertices.len();
        (0..count).filter_map(move |index| {
            let edge = self.vertices[(index + 1) % count] - self.vertices[index];
            let normal = edge.perp().normalize_or_zero();
            (normal != Vec2::ZERO).then_some(normal)
        })
    }

    fn project(&self, axis: Vec2) -> (f32, f32) {
        self.vertices
            .iter()
            .map(|vertex| vertex.dot(axis))
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), value| {
                (min.min(value), max.max(value))
            })
    }
}

fn overlapping(a: (f32, f32), b: (f32, f32)) -> bool {
    a.0 < b.1 && b.0 < a.1
}
