// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Vertex fusing on a uniform spatial hash grid
//!
//! Points within the distance tolerance of an already-inserted point map
//! to that point's index, so coincident boundary elements of different
//! fragments end up sharing topology. Vertices that land inside another
//! loop's edge (T-junctions) are threaded into that edge here too.

use super::BoundingBox;
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};

type Cell = (i64, i64, i64);

/// Shared vertex pool with tolerance-based lookup.
#[derive(Debug, Clone)]
pub struct VertexFuser {
    distance_squared: f64,
    cell_size: f64,
    grid: AHashMap<Cell, Vec<usize>>,
    points: Vec<Point3<f64>>,
}

impl VertexFuser {
    pub fn new(distance: f64) -> Self {
        Self {
            distance_squared: distance * distance,
            cell_size: distance.max(1e-9),
            grid: AHashMap::new(),
            points: Vec::new(),
        }
    }

    fn cell(&self, p: &Point3<f64>) -> Cell {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
            (p.z / self.cell_size).floor() as i64,
        )
    }

    /// Every pooled point within tolerance of `p`, with its squared distance.
    fn near(&self, p: &Point3<f64>) -> impl Iterator<Item = (usize, f64)> + '_ {
        let (cx, cy, cz) = self.cell(p);
        let p = *p;
        (-1..=1)
            .flat_map(move |dx| (-1..=1).flat_map(move |dy| (-1..=1).map(move |dz| (dx, dy, dz))))
            .filter_map(move |(dx, dy, dz)| self.grid.get(&(cx + dx, cy + dy, cz + dz)))
            .flatten()
            .map(move |&i| (i, (self.points[i] - p).norm_squared()))
            .filter(|&(_, d)| d <= self.distance_squared)
    }

    /// Index of the nearest existing point within tolerance, if any.
    pub fn find(&self, p: &Point3<f64>) -> Option<usize> {
        self.near(p)
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .map(|(i, _)| i)
    }

    /// Indices of all existing points within tolerance of `p`, ascending.
    pub fn within(&self, p: &Point3<f64>) -> Vec<usize> {
        let mut found: Vec<usize> = self.near(p).map(|(i, _)| i).collect();
        found.sort_unstable();
        found
    }

    /// Append `p` without fusing, returning its index.
    pub fn push(&mut self, p: Point3<f64>) -> usize {
        let index = self.points.len();
        let cell = self.cell(&p);
        self.points.push(p);
        self.grid.entry(cell).or_default().push(index);
        index
    }

    /// Fuse `p` into the pool, returning the shared index.
    pub fn insert(&mut self, p: Point3<f64>) -> usize {
        match self.find(&p) {
            Some(i) => i,
            None => self.push(p),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn into_points(self) -> Vec<Point3<f64>> {
        self.points
    }
}

/// Remap a loop through `map`, dropping consecutive duplicates (including
/// the wrap-around pair).
pub fn remap_loop(vertices: &[usize], map: impl Fn(usize) -> usize) -> Vec<usize> {
    let mut out: Vec<usize> = Vec::with_capacity(vertices.len());
    for &v in vertices {
        let m = map(v);
        if out.last() != Some(&m) {
            out.push(m);
        }
    }
    while out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    out
}

/// Candidates lying strictly inside the segment `a`-`b`, within `epsilon`
/// of it, ordered from `a` to `b`.
pub fn points_on_edge(
    a: usize,
    b: usize,
    candidates: &[usize],
    pool: &[Point3<f64>],
    epsilon: f64,
) -> Vec<usize> {
    let (pa, pb) = (pool[a], pool[b]);
    let ab = pb - pa;
    let length = ab.norm();
    if length <= epsilon {
        return Vec::new();
    }
    let mut bounds = BoundingBox::from_points([&pa, &pb]);
    bounds.expand_to_include(&(bounds.min - Vector3::repeat(epsilon)));
    bounds.expand_to_include(&(bounds.max + Vector3::repeat(epsilon)));

    let mut on_edge: Vec<(f64, usize)> = Vec::new();
    for &v in candidates {
        if v == a || v == b {
            continue;
        }
        let pv = pool[v];
        if pv.x < bounds.min.x
            || pv.y < bounds.min.y
            || pv.z < bounds.min.z
            || pv.x > bounds.max.x
            || pv.y > bounds.max.y
            || pv.z > bounds.max.z
        {
            continue;
        }
        let t = (pv - pa).dot(&ab) / (length * length);
        if t * length <= epsilon || (1.0 - t) * length <= epsilon {
            continue;
        }
        if (pv - (pa + ab * t)).norm() <= epsilon {
            on_edge.push((t, v));
        }
    }
    on_edge.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));
    on_edge.into_iter().map(|(_, v)| v).collect()
}

/// Thread every candidate lying inside an edge of the loop into that edge.
pub fn split_t_junctions(
    l: &[usize],
    candidates: &[usize],
    pool: &[Point3<f64>],
    epsilon: f64,
) -> Vec<usize> {
    let n = l.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let (a, b) = (l[i], l[(i + 1) % n]);
        out.push(a);
        out.extend(points_on_edge(a, b, candidates, pool, epsilon));
    }
    out
}
