// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Uniform grid index for fixed-radius neighbor queries.

Points are projected onto an [`IntersectionPlane`] and bucketed into cubic
grid cells whose side equals the query radius, so a query only visits the
3x3x3 block of buckets around the query point (fewer for planar
projections, where the dropped axes collapse to a single bucket).
*/

use ahash::AHashMap;

use super::plane::IntersectionPlane;
use crate::types::Position;

/// Radius-query index over a fixed set of points
pub struct RadiusIndex {
    plane: IntersectionPlane,
    radius: f64,
    inv_cell_size: f64,
    points: Vec<Position>,
    buckets: AHashMap<[i64; 3], Vec<usize>>,
}

impl RadiusIndex {
    /// Build an index for queries of exactly `radius` under `plane`
    pub fn new(points: &[Position], radius: f64, plane: IntersectionPlane) -> Self {
        let cell_size = if radius.is_finite() && radius > 0.0 {
            radius
        } else {
            1.0
        };
        let mut index = Self {
            plane,
            radius,
            inv_cell_size: 1.0 / cell_size,
            points: points.iter().map(|p| plane.project(*p)).collect(),
            buckets: AHashMap::new(),
        };
        for (i, point) in index.points.iter().enumerate() {
            let key = index.bucket_of(point);
            index.buckets.entry(key).or_default().push(i);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[inline]
    fn bucket_of(&self, point: &Position) -> [i64; 3] {
        [
            (point[0] * self.inv_cell_size).floor() as i64,
            (point[1] * self.inv_cell_size).floor() as i64,
            (point[2] * self.inv_cell_size).floor() as i64,
        ]
    }

    /// Calls `f(i)` for every indexed point strictly closer than the radius
    /// to `query`. Order of calls is unspecified.
    pub fn for_each_within<F: FnMut(usize)>(&self, query: Position, mut f: F) {
        if self.radius.is_nan() || self.radius <= 0.0 || self.points.is_empty() {
            return;
        }
        if self.radius.is_infinite() {
            (0..self.points.len()).for_each(f);
            return;
        }
        let q = self.plane.project(query);
        let center = self.bucket_of(&q);
        let radius_sq = self.radius * self.radius;
        let span = |axis: usize| if self.plane.includes(axis) { -1..=1 } else { 0..=0 };

        for dx in span(0) {
            for dy in span(1) {
                for dz in span(2) {
                    let key = [center[0] + dx, center[1] + dy, center[2] + dz];
                    let Some(members) = self.buckets.get(&key) else {
                        continue;
                    };
                    for &i in members {
                        let p = &self.points[i];
                        let d0 = q[0] - p[0];
                        let d1 = q[1] - p[1];
                        let d2 = q[2] - p[2];
                        if d0 * d0 + d1 * d1 + d2 * d2 < radius_sq {
                            f(i);
                        }
                    }
                }
            }
        }
    }

    /// Sorted indices of the points within the radius of `query`
    pub fn query(&self, query: Position) -> Vec<usize> {
        let mut hits = Vec::new();
        self.for_each_within(query, |i| hits.push(i));
        hits.sort_unstable();
        hits
    }

    /// One sorted hit list per query point
    pub fn query_many(&self, queries: &[Position]) -> Vec<Vec<usize>> {
        queries.iter().map(|q| self.query(*q)).collect()
    }
}
