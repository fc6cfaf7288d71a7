// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Degeneracy removal after boolean evaluation
//!
//! Cleanup identifies vertices closer than the distance tolerance, removes
//! cracks (an edge walked out and straight back), and drops loops, faces
//! and shells that no longer bound any area. Edges those removals leave
//! without a mate are re-threaded through the vertices lying on them.
//! Adjacent coplanar faces are then merged, and collinear vertices that
//! only two faces still use are dropped from both.

use super::fuse::{points_on_edge, remap_loop, VertexFuser};
use super::{Face, Loop, Region, Tolerance};
use ahash::{AHashMap, AHashSet};
use nalgebra::Point3;
use serde::Serialize;
use tracing::debug;

const REPAIR_PASSES: usize = 4;

/// What a cleanup pass removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// The region held faces before cleanup and holds none after.
    pub region_emptied: bool,
    /// No shell at all remains in the working model.
    pub model_emptied: bool,
    pub zero_length_edges: usize,
    pub cracks: usize,
    pub degenerate_loops: usize,
    /// Vertices threaded into edges that had lost their mate
    pub t_junctions: usize,
    pub faces_merged: usize,
    pub collinear_vertices: usize,
    pub faces_removed: usize,
    pub shells_removed: usize,
    pub vertices_removed: usize,
}

pub fn cleanup(region: &mut Region, tolerance: &Tolerance) -> CleanupReport {
    let mut report = CleanupReport::default();
    let had_faces = !region.is_empty();

    let alias = coincident_aliases(region, tolerance);
    prune(region, tolerance, |v| alias[v], &mut report);

    for _ in 0..REPAIR_PASSES {
        let inserted = split_open_edges(region, tolerance.epsilon());
        if inserted == 0 {
            break;
        }
        report.t_junctions += inserted;
        prune(region, tolerance, |v| v, &mut report);
    }

    report.faces_merged = merge_coplanar(region, tolerance);
    report.collinear_vertices = drop_collinear(region, tolerance);

    let shells_before = region.shells.len();
    region.shells.retain(|s| !s.faces.is_empty());
    report.shells_removed = shells_before - region.shells.len();
    report.vertices_removed = region.compact_vertices();

    report.region_emptied = had_faces && region.is_empty();
    report.model_emptied = region.shells.is_empty();

    debug!(
        zero_length_edges = report.zero_length_edges,
        cracks = report.cracks,
        degenerate_loops = report.degenerate_loops,
        t_junctions = report.t_junctions,
        faces_merged = report.faces_merged,
        collinear_vertices = report.collinear_vertices,
        faces_removed = report.faces_removed,
        shells_removed = report.shells_removed,
        "cleanup finished"
    );
    report
}

/// Remap every loop through `alias`, strip cracks, and drop loops and
/// faces that no longer bound any area.
fn prune(
    region: &mut Region,
    tolerance: &Tolerance,
    alias: impl Fn(usize) -> usize,
    report: &mut CleanupReport,
) {
    for shell in &mut region.shells {
        let before = shell.faces.len();
        shell.faces.retain_mut(|face| {
            let normal = face.plane.normal;
            let mut keep_loop = |l: &mut Loop| {
                let fused = remap_loop(&l.vertices, &alias);
                report.zero_length_edges += l.vertices.len() - fused.len();

                let (uncracked, cracks) = remove_cracks(fused);
                report.cracks += cracks;
                l.vertices = uncracked;

                let bounded = l.len() >= 3
                    && l.signed_area(&region.vertices, &normal).abs() > tolerance.distance_squared;
                if !bounded {
                    report.degenerate_loops += 1;
                }
                bounded
            };

            if !keep_loop(&mut face.outer) {
                return false;
            }
            face.holes.retain_mut(|h| keep_loop(h));
            true
        });
        report.faces_removed += before - shell.faces.len();
    }
}

/// Map each used vertex to the lowest-indexed vertex it is joined to
/// through a chain of points closer than the distance tolerance.
fn coincident_aliases(region: &Region, tolerance: &Tolerance) -> Vec<usize> {
    let mut parent: Vec<usize> = (0..region.vertices.len()).collect();
    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    let mut used = vec![false; region.vertices.len()];
    for eu in region.edge_uses() {
        used[eu.from] = true;
    }

    // Grid indices are positions in `order`, not vertex indices.
    let mut grid = VertexFuser::new(tolerance.distance);
    let mut order = Vec::new();
    for (i, point) in region.vertices.iter().enumerate().filter(|(i, _)| used[*i]) {
        for j in grid.within(point) {
            let (a, b) = (find(&mut parent, i), find(&mut parent, order[j]));
            if a != b {
                parent[a.max(b)] = a.min(b);
            }
        }
        grid.push(*point);
        order.push(i);
    }

    (0..parent.len()).map(|i| find(&mut parent, i)).collect()
}

/// Thread the endpoints of unmatched edge-uses into the unmatched edge-uses
/// they lie on. Returns the number of vertices inserted.
fn split_open_edges(region: &mut Region, epsilon: f64) -> usize {
    let mut uses: AHashMap<(usize, usize), usize> = AHashMap::new();
    for eu in region.edge_uses() {
        *uses.entry((eu.from, eu.to)).or_insert(0) += 1;
    }
    let open: AHashSet<(usize, usize)> = uses
        .iter()
        .filter(|&(&(a, b), &n)| n > uses.get(&(b, a)).copied().unwrap_or(0))
        .map(|(&edge, _)| edge)
        .collect();
    if open.is_empty() {
        return 0;
    }

    let mut candidates: Vec<usize> = open.iter().flat_map(|&(a, b)| [a, b]).collect();
    candidates.sort_unstable();
    candidates.dedup();

    let mut inserted = 0;
    let vertices = &region.vertices;
    for shell in &mut region.shells {
        for face in &mut shell.faces {
            for l in std::iter::once(&mut face.outer).chain(face.holes.iter_mut()) {
                let n = l.vertices.len();
                let mut threaded = Vec::with_capacity(n);
                for i in 0..n {
                    let (a, b) = (l.vertices[i], l.vertices[(i + 1) % n]);
                    threaded.push(a);
                    if open.contains(&(a, b)) {
                        let on_edge = points_on_edge(a, b, &candidates, vertices, epsilon);
                        inserted += on_edge.len();
                        threaded.extend(on_edge);
                    }
                }
                l.vertices = threaded;
            }
        }
    }
    inserted
}

fn coplanar(f: &Face, g: &Face, tolerance: &Tolerance) -> bool {
    f.plane.normal.dot(&g.plane.normal) >= tolerance.parallel
        && (f.plane.offset - g.plane.offset).abs() <= tolerance.epsilon()
}

/// Groups of faces joined by mated edges across which the plane does not
/// change. Each group is ascending and groups are ordered by first face.
fn coplanar_groups(faces: &[Face], tolerance: &Tolerance) -> Vec<Vec<usize>> {
    let mut parent: Vec<usize> = (0..faces.len()).collect();
    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    // `None` once a directed edge is used by more than one face
    let mut owner: AHashMap<(usize, usize), Option<usize>> = AHashMap::new();
    for (fi, face) in faces.iter().enumerate() {
        for eu in face.edge_uses() {
            owner
                .entry((eu.from, eu.to))
                .and_modify(|o| *o = None)
                .or_insert(Some(fi));
        }
    }

    for (&(a, b), &f) in &owner {
        let (Some(f), Some(&Some(g))) = (f, owner.get(&(b, a))) else {
            continue;
        };
        if f != g && coplanar(&faces[f], &faces[g], tolerance) {
            let (x, y) = (find(&mut parent, f), find(&mut parent, g));
            if x != y {
                parent[x.max(y)] = x.min(y);
            }
        }
    }

    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut group_of_root: AHashMap<usize, usize> = AHashMap::new();
    for fi in 0..faces.len() {
        let root = find(&mut parent, fi);
        let g = *group_of_root.entry(root).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[g].push(fi);
    }
    groups
}

/// One face covering every face of `group`, or `None` when the group's
/// outline does not chain into a single outer loop plus holes.
fn merge_group(faces: &[Face], group: &[usize], pool: &[Point3<f64>]) -> Option<Face> {
    let mut uses: AHashMap<(usize, usize), usize> = AHashMap::new();
    for &fi in group {
        for eu in faces[fi].edge_uses() {
            *uses.entry((eu.from, eu.to)).or_insert(0) += 1;
        }
    }

    let mut next: AHashMap<usize, usize> = AHashMap::new();
    let mut starts = Vec::new();
    for &fi in group {
        for eu in faces[fi].edge_uses() {
            let forward = uses.get(&(eu.from, eu.to)).copied().unwrap_or(0);
            match uses.get(&(eu.to, eu.from)) {
                Some(&1) if forward == 1 => continue,
                Some(_) => return None,
                None => {}
            }
            if forward != 1 || next.insert(eu.from, eu.to).is_some() {
                return None;
            }
            starts.push(eu.from);
        }
    }

    let plane = faces[group[0]].plane;
    let mut outer: Option<Loop> = None;
    let mut holes = Vec::new();
    let mut visited: AHashSet<usize> = AHashSet::new();
    for start in starts {
        if visited.contains(&start) {
            continue;
        }
        let mut vertices = Vec::new();
        let mut v = start;
        loop {
            if !visited.insert(v) {
                return None;
            }
            vertices.push(v);
            v = *next.get(&v)?;
            if v == start {
                break;
            }
        }

        let l = Loop::new(vertices);
        if l.signed_area(pool, &plane.normal) > 0.0 {
            if outer.replace(l).is_some() {
                return None;
            }
        } else {
            holes.push(l);
        }
    }
    Some(Face::with_holes(plane, outer?, holes))
}

/// Merge coplanar neighbours shell by shell. Returns the number of faces
/// absorbed into another.
fn merge_coplanar(region: &mut Region, tolerance: &Tolerance) -> usize {
    let mut absorbed_total = 0;
    let pool = &region.vertices;
    for shell in &mut region.shells {
        let mut merged: AHashMap<usize, Face> = AHashMap::new();
        let mut absorbed = vec![false; shell.faces.len()];
        for group in coplanar_groups(&shell.faces, tolerance) {
            if group.len() < 2 {
                continue;
            }
            if let Some(face) = merge_group(&shell.faces, &group, pool) {
                for &fi in &group[1..] {
                    absorbed[fi] = true;
                }
                absorbed_total += group.len() - 1;
                merged.insert(group[0], face);
            }
        }
        if merged.is_empty() {
            continue;
        }

        let faces = std::mem::take(&mut shell.faces);
        shell.faces = faces
            .into_iter()
            .enumerate()
            .filter(|(fi, _)| !absorbed[*fi])
            .map(|(fi, face)| merged.remove(&fi).unwrap_or(face))
            .collect();
    }
    absorbed_total
}

/// (shell, face, loop) with loop 0 the outer loop
type LoopId = (usize, usize, usize);

fn loop_at(region: &Region, (s, f, l): LoopId) -> &Loop {
    let face = &region.shells[s].faces[f];
    if l == 0 {
        &face.outer
    } else {
        &face.holes[l - 1]
    }
}

fn loop_at_mut(region: &mut Region, (s, f, l): LoopId) -> &mut Loop {
    let face = &mut region.shells[s].faces[f];
    if l == 0 {
        &mut face.outer
    } else {
        &mut face.holes[l - 1]
    }
}

fn neighbours(l: &Loop, v: usize) -> Option<(usize, usize)> {
    let n = l.len();
    let i = l.vertices.iter().position(|&u| u == v)?;
    Some((l.vertices[(i + n - 1) % n], l.vertices[(i + 1) % n]))
}

fn strictly_between(a: &Point3<f64>, v: &Point3<f64>, b: &Point3<f64>, epsilon: f64) -> bool {
    let ab = b - a;
    let length_squared = ab.norm_squared();
    if length_squared <= epsilon * epsilon {
        return false;
    }
    let t = (v - a).dot(&ab) / length_squared;
    t > 0.0 && t < 1.0 && (v - (a + ab * t)).norm() <= epsilon
}

/// Drop vertices used by exactly two loops that walk past them in opposite
/// directions along a straight line. Returns the number dropped.
fn drop_collinear(region: &mut Region, tolerance: &Tolerance) -> usize {
    let mut uses: Vec<Vec<LoopId>> = vec![Vec::new(); region.vertices.len()];
    for (si, shell) in region.shells.iter().enumerate() {
        for (fi, face) in shell.faces.iter().enumerate() {
            for (li, l) in face.loops().enumerate() {
                for &v in &l.vertices {
                    uses[v].push((si, fi, li));
                }
            }
        }
    }

    let mut dropped = 0;
    for (v, ids) in uses.iter().enumerate() {
        let &[x, y] = ids.as_slice() else {
            continue;
        };
        if x == y || loop_at(region, x).len() <= 3 || loop_at(region, y).len() <= 3 {
            continue;
        }
        let (Some((prev, next)), Some((mate_prev, mate_next))) =
            (neighbours(loop_at(region, x), v), neighbours(loop_at(region, y), v))
        else {
            continue;
        };
        if prev == next || prev != mate_next || next != mate_prev {
            continue;
        }
        let pool = &region.vertices;
        if !strictly_between(&pool[prev], &pool[v], &pool[next], tolerance.epsilon()) {
            continue;
        }

        loop_at_mut(region, x).vertices.retain(|&u| u != v);
        loop_at_mut(region, y).vertices.retain(|&u| u != v);
        dropped += 1;
    }
    dropped
}

/// Remove `a -> b -> a` spikes from a cyclic loop. Returns the loop and the
/// number of spikes removed.
fn remove_cracks(vertices: Vec<usize>) -> (Vec<usize>, usize) {
    let mut stack: Vec<usize> = Vec::with_capacity(vertices.len());
    let mut cracks = 0;

    for v in vertices {
        if stack.len() >= 2 && stack[stack.len() - 2] == v {
            stack.pop();
            cracks += 1;
        } else if stack.last() != Some(&v) {
            stack.push(v);
        }
    }

    // Spikes straddling the wrap-around point.
    loop {
        let n = stack.len();
        if n >= 3 && stack[n - 2] == stack[0] {
            stack.truncate(n - 2);
            cracks += 1;
        } else if n >= 3 && stack[n - 1] == stack[1] {
            stack.remove(0);
            stack.remove(0);
            cracks += 1;
        } else if n >= 2 && stack[0] == stack[n - 1] {
            stack.pop();
        } else {
            break;
        }
    }

    (stack, cracks)
}
