//! Unstructured mesh of linear (P1) triangles.
//!
//! The mesh stores:
//! - Node coordinates, bottom elevation and lumped (diagonal) mass
//! - Triangle connectivity in counter-clockwise order
//! - Linear shape-function coefficients per triangle ("koeffmat")
//! - Node-to-element incidence and node neighbourhoods
//! - Boundary-edge flags per triangle
//!
//! Shape functions are `N_j(x, y) = a_j + b_j x + c_j y` with
//! `koeffmat[j] = [a_j, b_j, c_j]`, so the element-constant gradient of a
//! nodal field is `∂f/∂x = Σ f_j b_j`, `∂f/∂y = Σ f_j c_j`.

use std::collections::HashMap;

use thiserror::Error;

use super::boundary_tags::Kennung;

/// Error type for mesh construction.
#[derive(Debug, Error)]
pub enum MeshError {
    /// Mesh without triangles.
    #[error("Mesh has no elements")]
    Empty,

    /// Triangle referencing a node that does not exist.
    #[error("Element {element} references node {node}, but the mesh has {n_nodes} nodes")]
    NodeOutOfRange {
        element: usize,
        node: usize,
        n_nodes: usize,
    },

    /// Triangle with (numerically) zero area.
    #[error("Element {element} is degenerate (area {area:e})")]
    Degenerate { element: usize, area: f64 },

    /// Node that belongs to no triangle and therefore has no mass.
    #[error("Node {node} is not connected to any element")]
    OrphanNode { node: usize },
}

/// A triangle touching a node, with the node's local position in it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Incidence {
    /// Element index
    pub element: usize,
    /// Local node index (0..3) within the element
    pub local: usize,
}

/// A mesh node (degree of freedom).
#[derive(Clone, Debug)]
pub struct MeshNode {
    pub x: f64,
    pub y: f64,
    /// Bottom elevation, positive up (m)
    pub z: f64,
    /// Diagonal of the lumped Galerkin mass matrix (Σ area/3)
    pub lumped_mass: f64,
    /// Incident triangles
    pub incident: Vec<Incidence>,
    /// Nodes sharing at least one triangle with this node (sorted)
    pub neighbours: Vec<usize>,
    /// Node lies on a boundary edge
    pub on_boundary: bool,
}

impl MeshNode {
    /// Euclidean distance in the horizontal plane.
    pub fn distance_to(&self, other: &MeshNode) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Number of incident triangles.
    pub fn n_incident(&self) -> usize {
        self.incident.len()
    }
}

/// A linear triangle.
#[derive(Clone, Debug)]
pub struct Triangle {
    /// Global node indices, counter-clockwise
    pub nodes: [usize; 3],
    /// Vertex coordinates, same order as `nodes`
    pub vertices: [(f64, f64); 3],
    /// Area (m²)
    pub area: f64,
    /// Shape-function coefficients `[a_j, b_j, c_j]`
    pub koeffmat: [[f64; 3]; 3],
    /// Length of edge k (from local node k to local node k+1)
    pub edge_lengths: [f64; 3],
    /// Boundary-edge flags
    pub kennung: Kennung,
    /// Closed elements take no part in assembly
    pub closed: bool,
}

impl Triangle {
    fn new(
        nodes: [usize; 3],
        vertices: [(f64, f64); 3],
        element: usize,
    ) -> Result<Self, MeshError> {
        let [(x0, y0), (x1, y1), (x2, y2)] = vertices;
        let two_area = (x1 - x0) * (y2 - y0) - (x2 - x0) * (y1 - y0);
        let scale = [(x1 - x0).abs(), (x2 - x0).abs(), (y1 - y0).abs(), (y2 - y0).abs()]
            .iter()
            .fold(0.0_f64, |m, v| m.max(*v));
        if two_area.abs() <= 1e-12 * scale * scale || two_area.abs() == 0.0 {
            return Err(MeshError::Degenerate {
                element,
                area: 0.5 * two_area.abs(),
            });
        }
        debug_assert!(two_area > 0.0, "triangle must be counter-clockwise");

        let mut koeffmat = [[0.0; 3]; 3];
        for j in 0..3 {
            let k = (j + 1) % 3;
            let l = (j + 2) % 3;
            let (xk, yk) = vertices[k];
            let (xl, yl) = vertices[l];
            koeffmat[j] = [
                (xk * yl - xl * yk) / two_area,
                (yk - yl) / two_area,
                (xl - xk) / two_area,
            ];
        }

        let mut edge_lengths = [0.0; 3];
        for k in 0..3 {
            let (xa, ya) = vertices[k];
            let (xb, yb) = vertices[(k + 1) % 3];
            edge_lengths[k] = ((xb - xa).powi(2) + (yb - ya).powi(2)).sqrt();
        }

        Ok(Self {
            nodes,
            vertices,
            area: 0.5 * two_area,
            koeffmat,
            edge_lengths,
            kennung: Kennung::INTERIOR,
            closed: false,
        })
    }

    /// x-derivative coefficient of local shape function `j`.
    #[inline]
    pub fn b(&self, j: usize) -> f64 {
        self.koeffmat[j][1]
    }

    /// y-derivative coefficient of local shape function `j`.
    #[inline]
    pub fn c(&self, j: usize) -> f64 {
        self.koeffmat[j][2]
    }

    /// Element-constant gradient of a nodal field.
    #[inline]
    pub fn gradient(&self, values: [f64; 3]) -> (f64, f64) {
        let mut dx = 0.0;
        let mut dy = 0.0;
        for j in 0..3 {
            dx += values[j] * self.koeffmat[j][1];
            dy += values[j] * self.koeffmat[j][2];
        }
        (dx, dy)
    }

    /// Smallest altitude (relative to the longest edge).
    pub fn min_height(&self) -> f64 {
        let longest = self.edge_lengths.iter().fold(0.0_f64, |m, &l| m.max(l));
        2.0 * self.area / longest
    }

    /// Largest altitude (relative to the shortest edge).
    pub fn max_height(&self) -> f64 {
        let shortest = self
            .edge_lengths
            .iter()
            .fold(f64::INFINITY, |m, &l| m.min(l));
        2.0 * self.area / shortest
    }

    /// Extent of the triangle along the unit direction `(ex, ey)`.
    pub fn projected_size(&self, ex: f64, ey: f64) -> f64 {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for &(x, y) in &self.vertices {
            let s = x * ex + y * ey;
            lo = lo.min(s);
            hi = hi.max(s);
        }
        hi - lo
    }

    /// Local position (0..3) of a global node, if present.
    pub fn local_index(&self, node: usize) -> Option<usize> {
        self.nodes.iter().position(|&n| n == node)
    }
}

/// Unstructured triangular mesh shared by all sub-models.
#[derive(Clone, Debug)]
pub struct TriMesh {
    pub nodes: Vec<MeshNode>,
    pub elements: Vec<Triangle>,
}

impl TriMesh {
    /// Build a mesh from node coordinates `(x, y, z)` and triangles.
    ///
    /// Clockwise triangles are reoriented. Degenerate triangles, references
    /// to missing nodes and nodes without any triangle are rejected.
    pub fn from_triangles(
        points: Vec<(f64, f64, f64)>,
        triangles: Vec<[usize; 3]>,
    ) -> Result<Self, MeshError> {
        if triangles.is_empty() {
            return Err(MeshError::Empty);
        }
        let n_nodes = points.len();

        let mut elements = Vec::with_capacity(triangles.len());
        for (e, tri) in triangles.iter().enumerate() {
            for &n in tri {
                if n >= n_nodes {
                    return Err(MeshError::NodeOutOfRange {
                        element: e,
                        node: n,
                        n_nodes,
                    });
                }
            }
            let mut nodes = *tri;
            let xy = |n: usize| (points[n].0, points[n].1);
            let (x0, y0) = xy(nodes[0]);
            let (x1, y1) = xy(nodes[1]);
            let (x2, y2) = xy(nodes[2]);
            if (x1 - x0) * (y2 - y0) - (x2 - x0) * (y1 - y0) < 0.0 {
                nodes.swap(1, 2);
            }
            let vertices = [xy(nodes[0]), xy(nodes[1]), xy(nodes[2])];
            elements.push(Triangle::new(nodes, vertices, e)?);
        }

        // Edges used by exactly one triangle are boundary edges
        let mut edge_count: HashMap<(usize, usize), usize> = HashMap::new();
        for tri in &elements {
            for k in 0..3 {
                let a = tri.nodes[k];
                let b = tri.nodes[(k + 1) % 3];
                *edge_count.entry((a.min(b), a.max(b))).or_insert(0) += 1;
            }
        }

        let mut nodes: Vec<MeshNode> = points
            .iter()
            .map(|&(x, y, z)| MeshNode {
                x,
                y,
                z,
                lumped_mass: 0.0,
                incident: Vec::new(),
                neighbours: Vec::new(),
                on_boundary: false,
            })
            .collect();

        for (e, tri) in elements.iter_mut().enumerate() {
            for k in 0..3 {
                let a = tri.nodes[k];
                let b = tri.nodes[(k + 1) % 3];
                if edge_count[&(a.min(b), a.max(b))] == 1 {
                    tri.kennung = tri.kennung.with_boundary_edge(k);
                    nodes[a].on_boundary = true;
                    nodes[b].on_boundary = true;
                }
            }
            for (local, &n) in tri.nodes.iter().enumerate() {
                let node = &mut nodes[n];
                node.lumped_mass += tri.area / 3.0;
                node.incident.push(Incidence { element: e, local });
                for &other in &tri.nodes {
                    if other != n {
                        node.neighbours.push(other);
                    }
                }
            }
        }

        for (i, node) in nodes.iter_mut().enumerate() {
            if node.incident.is_empty() {
                return Err(MeshError::OrphanNode { node: i });
            }
            node.neighbours.sort_unstable();
            node.neighbours.dedup();
        }

        Ok(Self { nodes, elements })
    }

    /// Create a uniform rectangular mesh of `[x0, x1] × [y0, y1]`.
    ///
    /// Each of the `nx × ny` cells is split into two triangles along its
    /// lower-left to upper-right diagonal. Bottom elevation is zero.
    pub fn uniform_rectangle(x0: f64, x1: f64, y0: f64, y1: f64, nx: usize, ny: usize) -> Self {
        assert!(
            nx > 0 && ny > 0,
            "Need at least one cell in each direction"
        );
        assert!(x1 > x0 && y1 > y0, "Invalid domain bounds");

        let dx = (x1 - x0) / nx as f64;
        let dy = (y1 - y0) / ny as f64;

        let mut points = Vec::with_capacity((nx + 1) * (ny + 1));
        for j in 0..=ny {
            for i in 0..=nx {
                points.push((x0 + i as f64 * dx, y0 + j as f64 * dy, 0.0));
            }
        }

        let mut triangles = Vec::with_capacity(2 * nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                let v0 = j * (nx + 1) + i;
                let v1 = v0 + 1;
                let v2 = v1 + (nx + 1);
                let v3 = v0 + (nx + 1);
                triangles.push([v0, v1, v2]);
                triangles.push([v0, v2, v3]);
            }
        }

        Self::from_triangles(points, triangles).expect("structured grid is always valid")
    }

    /// Replace the bottom elevation with `z = f(x, y)`.
    pub fn with_bathymetry(mut self, f: impl Fn(f64, f64) -> f64) -> Self {
        for node in &mut self.nodes {
            node.z = f(node.x, node.y);
        }
        self
    }

    /// Exclude an element from assembly.
    pub fn close_element(&mut self, element: usize) {
        self.elements[element].closed = true;
    }

    /// Number of nodes.
    #[inline]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of triangles.
    #[inline]
    pub fn n_elements(&self) -> usize {
        self.elements.len()
    }

    /// Node accessor.
    #[inline]
    pub fn node(&self, i: usize) -> &MeshNode {
        &self.nodes[i]
    }

    /// Element accessor.
    #[inline]
    pub fn element(&self, e: usize) -> &Triangle {
        &self.elements[e]
    }

    /// Indices of nodes on boundary edges.
    pub fn boundary_nodes(&self) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.on_boundary)
            .map(|(i, _)| i)
            .collect()
    }

    /// Total mesh area.
    pub fn total_area(&self) -> f64 {
        self.elements.iter().map(|e| e.area).sum()
    }

    /// Index of the node closest to `(x, y)`.
    pub fn nearest_node(&self, x: f64, y: f64) -> usize {
        let mut best = 0;
        let mut best_d2 = f64::INFINITY;
        for (i, n) in self.nodes.iter().enumerate() {
            let d2 = (n.x - x).powi(2) + (n.y - y).powi(2);
            if d2 < best_d2 {
                best_d2 = d2;
                best = i;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_triangle() -> TriMesh {
        TriMesh::from_triangles(
            vec![(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0)],
            vec![[0, 1, 2]],
        )
        .unwrap()
    }

    #[test]
    fn test_shape_coefficients_unit_triangle() {
        let mesh = unit_triangle();
        let t = mesh.element(0);
        assert_relative_eq!(t.area, 0.5);
        assert_eq!(t.koeffmat[0], [1.0, -1.0, -1.0]);
        assert_eq!(t.koeffmat[1], [0.0, 1.0, 0.0]);
        assert_eq!(t.koeffmat[2], [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_gradient_of_linear_field() {
        let mesh = TriMesh::from_triangles(
            vec![(0.0, 0.0, 0.0), (3.0, 0.5, 0.0), (1.0, 2.0, 0.0)],
            vec![[0, 1, 2]],
        )
        .unwrap();
        let t = mesh.element(0);
        let f = |x: f64, y: f64| 2.0 + 0.3 * x - 1.5 * y;
        let values = [f(0.0, 0.0), f(3.0, 0.5), f(1.0, 2.0)];
        let (dx, dy) = t.gradient(values);
        assert_relative_eq!(dx, 0.3, epsilon = 1e-12);
        assert_relative_eq!(dy, -1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_clockwise_triangle_is_reoriented() {
        let mesh = TriMesh::from_triangles(
            vec![(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0)],
            vec![[0, 2, 1]],
        )
        .unwrap();
        assert!(mesh.element(0).area > 0.0);
        assert_eq!(mesh.element(0).nodes, [0, 1, 2]);
    }

    #[test]
    fn test_degenerate_triangle_rejected() {
        let result = TriMesh::from_triangles(
            vec![(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (2.0, 0.0, 0.0)],
            vec![[0, 1, 2]],
        );
        assert!(matches!(result, Err(MeshError::Degenerate { element: 0, .. })));
    }

    #[test]
    fn test_out_of_range_node_rejected() {
        let result = TriMesh::from_triangles(
            vec![(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0)],
            vec![[0, 1, 3]],
        );
        assert!(matches!(
            result,
            Err(MeshError::NodeOutOfRange { node: 3, .. })
        ));
    }

    #[test]
    fn test_orphan_node_rejected() {
        let result = TriMesh::from_triangles(
            vec![
                (0.0, 0.0, 0.0),
                (1.0, 0.0, 0.0),
                (0.0, 1.0, 0.0),
                (5.0, 5.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        assert!(matches!(result, Err(MeshError::OrphanNode { node: 3 })));
    }

    #[test]
    fn test_lumped_mass_sums_to_area() {
        let mesh = TriMesh::uniform_rectangle(0.0, 4.0, 0.0, 2.0, 4, 2);
        let total: f64 = mesh.nodes.iter().map(|n| n.lumped_mass).sum();
        assert_relative_eq!(total, 8.0, epsilon = 1e-12);
        assert_relative_eq!(mesh.total_area(), 8.0, epsilon = 1e-12);
        assert_eq!(mesh.n_elements(), 16);
        assert_eq!(mesh.n_nodes(), 15);
    }

    #[test]
    fn test_boundary_detection() {
        let mesh = TriMesh::uniform_rectangle(0.0, 2.0, 0.0, 2.0, 2, 2);
        // 3x3 grid: only the centre node is interior
        let boundary = mesh.boundary_nodes();
        assert_eq!(boundary.len(), 8);
        assert!(!mesh.node(4).on_boundary);
        let n_boundary_edges: usize = mesh
            .elements
            .iter()
            .map(|t| t.kennung.boundary_edges().count())
            .sum();
        assert_eq!(n_boundary_edges, 8);
    }

    #[test]
    fn test_neighbours_and_incidence() {
        let mesh = TriMesh::uniform_rectangle(0.0, 2.0, 0.0, 2.0, 2, 2);
        let centre = mesh.node(4);
        assert_eq!(centre.n_incident(), 6);
        assert_eq!(centre.neighbours.len(), 6);
        for inc in &centre.incident {
            assert_eq!(mesh.element(inc.element).nodes[inc.local], 4);
        }
    }

    #[test]
    fn test_heights_and_projection() {
        let mesh = unit_triangle();
        let t = mesh.element(0);
        assert_relative_eq!(t.min_height(), 1.0 / 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(t.max_height(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(t.projected_size(1.0, 0.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bathymetry_and_distance() {
        let mesh = TriMesh::uniform_rectangle(0.0, 1.0, 0.0, 1.0, 1, 1)
            .with_bathymetry(|x, _| -1.0 - x);
        assert_relative_eq!(mesh.node(1).z, -2.0);
        assert_relative_eq!(mesh.node(0).distance_to(mesh.node(3)), 2.0_f64.sqrt());
        assert_eq!(mesh.nearest_node(0.9, 0.1), 1);
    }
}
