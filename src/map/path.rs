//! Geometry-to-path primitive: projects GeoJSON geometry through a
//! [`Projection`], clips it, and renders SVG path data and a planar centroid.

use geojson::{Geometry, Value};
use glam::DVec3;
use std::f64::consts::PI;
use std::fmt::Write;

use crate::map::globe::{horizon_angle, horizon_crossing, orthographic_raw, to_vec3, walk_horizon};
use crate::map::projection::{Projection, ProjectionKind, Rotator, CLIP_EPSILON};

/// Radius used when rendering point geometries as circles
const POINT_RADIUS: f64 = 4.5;

type Screen = [f64; 2];

/// Screen-space output of one geometry after clipping
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectedShape {
    /// Closed polygon rings
    pub rings: Vec<Vec<Screen>>,
    /// Open polylines
    pub lines: Vec<Vec<Screen>>,
    pub points: Vec<Screen>,
}

impl ProjectedShape {
    pub fn is_empty(&self) -> bool {
        self.rings.is_empty() && self.lines.is_empty() && self.points.is_empty()
    }

    /// SVG path data, or `None` when nothing survived clipping.
    pub fn to_path(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }

        let mut out = String::new();
        for ring in &self.rings {
            write_polyline(&mut out, ring);
            out.push('Z');
        }
        for line in &self.lines {
            write_polyline(&mut out, line);
        }
        for &[x, y] in &self.points {
            let r = fmt_num(POINT_RADIUS);
            let d = fmt_num(2.0 * POINT_RADIUS);
            let _ = write!(
                out,
                "M{},{}m0,{r}a{r},{r} 0 1,1 0,-{d}a{r},{r} 0 1,1 0,{d}z",
                fmt_num(x),
                fmt_num(y)
            );
        }
        Some(out)
    }

    /// Planar centroid: area-weighted over rings, else length-weighted over
    /// all edges, else the mean of all vertices.
    pub fn centroid(&self) -> Option<Screen> {
        let mut acc = CentroidAccumulator::default();
        for ring in &self.rings {
            acc.ring(ring);
        }
        for line in &self.lines {
            acc.line(line);
        }
        for &p in &self.points {
            acc.point(p);
        }
        acc.result()
    }
}

#[derive(Default)]
struct CentroidAccumulator {
    x0: f64,
    y0: f64,
    z0: f64,
    x1: f64,
    y1: f64,
    z1: f64,
    x2: f64,
    y2: f64,
    z2: f64,
}

impl CentroidAccumulator {
    fn point(&mut self, [x, y]: Screen) {
        self.x0 += x;
        self.y0 += y;
        self.z0 += 1.0;
    }

    fn segment(&mut self, [ax, ay]: Screen, [bx, by]: Screen) {
        let len = ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt();
        self.x1 += len * (ax + bx) / 2.0;
        self.y1 += len * (ay + by) / 2.0;
        self.z1 += len;
    }

    fn line(&mut self, line: &[Screen]) {
        for &p in line {
            self.point(p);
        }
        for w in line.windows(2) {
            self.segment(w[0], w[1]);
        }
    }

    fn ring(&mut self, ring: &[Screen]) {
        self.line(ring);
        let n = ring.len();
        if n == 0 {
            return;
        }
        self.segment(ring[n - 1], ring[0]);
        for i in 0..n {
            let [x0, y0] = ring[i];
            let [x1, y1] = ring[(i + 1) % n];
            let z = y0 * x1 - x0 * y1;
            self.x2 += z * (x0 + x1);
            self.y2 += z * (y0 + y1);
            self.z2 += z * 3.0;
        }
    }

    fn result(&self) -> Option<Screen> {
        let c = if self.z2.abs() > 1e-12 {
            [self.x2 / self.z2, self.y2 / self.z2]
        } else if self.z1 > 0.0 {
            [self.x1 / self.z1, self.y1 / self.z1]
        } else if self.z0 > 0.0 {
            [self.x0 / self.z0, self.y0 / self.z0]
        } else {
            return None;
        };
        (c[0].is_finite() && c[1].is_finite()).then_some(c)
    }
}

/// Round to three decimals and drop negative zero
fn fmt_num(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0 + 0.0
}

fn write_polyline(out: &mut String, pts: &[Screen]) {
    for (i, &[x, y]) in pts.iter().enumerate() {
        let cmd = if i == 0 { 'M' } else { 'L' };
        let _ = write!(out, "{cmd}{},{}", fmt_num(x), fmt_num(y));
    }
}

/// A path generator bound to one projection
pub struct GeoPath<'a> {
    projection: &'a Projection,
    rotator: Rotator,
}

impl<'a> GeoPath<'a> {
    pub fn new(projection: &'a Projection) -> Self {
        Self {
            projection,
            rotator: projection.rotation().rotator(),
        }
    }

    /// Path string and centroid in one pass over the geometry.
    /// Missing geometry yields `(None, None)`.
    pub fn render(&self, geometry: Option<&Geometry>) -> (Option<String>, Option<Screen>) {
        match geometry {
            Some(g) => {
                let shape = self.project(g);
                (shape.to_path(), shape.centroid())
            }
            None => (None, None),
        }
    }

    pub fn path(&self, geometry: Option<&Geometry>) -> Option<String> {
        geometry.and_then(|g| self.project(g).to_path())
    }

    pub fn centroid(&self, geometry: Option<&Geometry>) -> Option<Screen> {
        geometry.and_then(|g| self.project(g).centroid())
    }

    /// Project and clip a geometry into screen space
    pub fn project(&self, geometry: &Geometry) -> ProjectedShape {
        let mut shape = ProjectedShape::default();
        self.project_value(&geometry.value, &mut shape);
        shape
    }

    fn project_value(&self, value: &Value, out: &mut ProjectedShape) {
        match value {
            Value::Point(pos) => self.project_point(pos, out),
            Value::MultiPoint(positions) => {
                for pos in positions {
                    self.project_point(pos, out);
                }
            }
            Value::LineString(line) => self.project_line(line, false, &mut out.lines),
            Value::MultiLineString(lines) => {
                for line in lines {
                    self.project_line(line, false, &mut out.lines);
                }
            }
            Value::Polygon(rings) => {
                for ring in rings {
                    self.project_line(ring, true, &mut out.rings);
                }
            }
            Value::MultiPolygon(polygons) => {
                for rings in polygons {
                    for ring in rings {
                        self.project_line(ring, true, &mut out.rings);
                    }
                }
            }
            Value::GeometryCollection(geometries) => {
                for g in geometries {
                    self.project_value(&g.value, out);
                }
            }
        }
    }

    /// Rotated (lambda, phi) in radians, skipping malformed positions
    #[inline]
    fn rotated(&self, pos: &[f64]) -> Option<(f64, f64)> {
        match pos {
            [lon, lat, ..] if lon.is_finite() && lat.is_finite() => {
                Some(self.rotator.rotate(lon.to_radians(), lat.to_radians()))
            }
            _ => None,
        }
    }

    #[inline]
    fn screen(&self, lambda: f64, phi: f64) -> Screen {
        self.projection.to_screen(self.projection.kind().raw(lambda, phi))
    }

    fn project_point(&self, pos: &[f64], out: &mut ProjectedShape) {
        if let Some((lambda, phi)) = self.rotated(pos) {
            if self.projection.is_visible_rotated(lambda, phi) {
                out.points.push(self.screen(lambda, phi));
            }
        }
    }

    fn project_line(&self, positions: &[Vec<f64>], closed: bool, out: &mut Vec<Vec<Screen>>) {
        let mut pts: Vec<(f64, f64)> = positions.iter().filter_map(|p| self.rotated(p)).collect();
        if closed && pts.len() > 1 && pts.first() == pts.last() {
            pts.pop();
        }
        if pts.is_empty() {
            return;
        }

        match self.projection.kind() {
            ProjectionKind::Orthographic => {
                let vs: Vec<DVec3> = pts.iter().map(|&(l, p)| to_vec3(l, p)).collect();
                let pieces = if closed { clip_ring_to_horizon(&vs) } else { clip_line_to_horizon(&vs) };
                for piece in pieces {
                    out.push(
                        piece
                            .into_iter()
                            .map(|v| self.projection.to_screen(orthographic_raw(v)))
                            .collect(),
                    );
                }
            }
            ProjectionKind::EqualEarth => {
                for piece in cut_antimeridian(&pts, closed) {
                    out.push(piece.into_iter().map(|(l, p)| self.screen(l, p)).collect());
                }
            }
        }
    }
}

#[inline(always)]
fn visible(v: DVec3) -> bool {
    v.x > -CLIP_EPSILON
}

/// Split an open polyline into its visible runs
fn clip_line_to_horizon(vs: &[DVec3]) -> Vec<Vec<DVec3>> {
    let mut runs = Vec::new();
    let mut current: Vec<DVec3> = Vec::new();

    for (i, &v) in vs.iter().enumerate() {
        let prev = if i > 0 { Some(vs[i - 1]) } else { None };
        match (prev.map(visible), visible(v)) {
            (None, true) | (Some(true), true) => current.push(v),
            (Some(false), true) => {
                current.push(horizon_crossing(vs[i - 1], v));
                current.push(v);
            }
            (Some(true), false) => {
                current.push(horizon_crossing(vs[i - 1], v));
                runs.push(std::mem::take(&mut current));
            }
            _ => {}
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs.retain(|r| r.len() > 1);
    runs
}

/// Clip a closed ring at the horizon, rejoining visible runs along the
/// horizon circle.
///
/// Rings are read with the interior on the right, so an exterior ring runs
/// clockwise on screen. Leaving the visible side, the interior then lies
/// clockwise along the horizon, and each run is closed through the first
/// entry point reached turning that way. This holds however much of the
/// horizon the visible part spans.
fn clip_ring_to_horizon(vs: &[DVec3]) -> Vec<Vec<DVec3>> {
    let n = vs.len();
    let Some(start) = vs.iter().position(|&v| !visible(v)) else {
        return vec![vs.to_vec()];
    };
    if vs.iter().all(|&v| !visible(v)) {
        return Vec::new();
    }

    // Walk the ring once from a hidden vertex so every run is complete
    let mut runs: Vec<Vec<DVec3>> = Vec::new();
    let mut current: Vec<DVec3> = Vec::new();
    for i in 1..=n {
        let prev = vs[(start + i - 1) % n];
        let cur = vs[(start + i) % n];
        match (visible(prev), visible(cur)) {
            (false, true) => {
                current.push(horizon_crossing(prev, cur));
                current.push(cur);
            }
            (true, true) => current.push(cur),
            (true, false) => {
                current.push(horizon_crossing(prev, cur));
                runs.push(std::mem::take(&mut current));
            }
            (false, false) => {}
        }
    }

    let mut used = vec![false; runs.len()];
    let mut rings = Vec::new();

    for first in 0..runs.len() {
        if used[first] {
            continue;
        }
        let mut ring: Vec<DVec3> = Vec::new();
        let mut cur = first;
        loop {
            used[cur] = true;
            let run = &runs[cur];
            let skip = usize::from(!ring.is_empty());
            ring.extend(run.iter().skip(skip));

            let exit = run[run.len() - 1];
            let exit_angle = horizon_angle(exit);
            let next = (0..runs.len())
                .filter(|&j| !used[j] || j == first)
                .min_by(|&a, &b| {
                    let da = clockwise_gap(exit_angle, horizon_angle(runs[a][0]));
                    let db = clockwise_gap(exit_angle, horizon_angle(runs[b][0]));
                    da.total_cmp(&db)
                })
                .unwrap_or(first);

            walk_horizon(exit, runs[next][0], |p| ring.push(p));
            if next == first {
                // The walk ended on the ring's first vertex
                ring.pop();
                break;
            }
            // The walk ended on the next run's entry, which extend() skips
            cur = next;
        }
        if ring.len() > 2 {
            rings.push(ring);
        }
    }
    rings
}

/// Angle turned going clockwise from horizon angle `from` to `to`
fn clockwise_gap(from: f64, to: f64) -> f64 {
    (from - to).rem_euclid(2.0 * PI)
}

/// Break a rotated polyline where it jumps across the antimeridian,
/// inserting edge points at the interpolated crossing latitude.
fn cut_antimeridian(pts: &[(f64, f64)], closed: bool) -> Vec<Vec<(f64, f64)>> {
    let n = pts.len();
    let mut pieces: Vec<Vec<(f64, f64)>> = vec![vec![pts[0]]];
    let last = if closed { n } else { n - 1 };

    for i in 1..=last {
        let (l0, p0) = pts[i - 1];
        let (l1, p1) = pts[i % n];

        if (l1 - l0).abs() > PI {
            let side = if l0 >= 0.0 { 1.0 } else { -1.0 };
            let l1_unwrapped = l1 + side * 2.0 * PI;
            let span = l1_unwrapped - l0;
            let t = if span.abs() > 1e-15 { (side * PI - l0) / span } else { 0.5 };
            let phi = p0 + t * (p1 - p0);

            if let Some(piece) = pieces.last_mut() {
                piece.push((side * PI, phi));
            }
            pieces.push(vec![(-side * PI, phi)]);
        }
        if i < n {
            if let Some(piece) = pieces.last_mut() {
                piece.push((l1, p1));
            }
        }
    }

    if closed && pieces.len() > 1 {
        // The tail wraps around into the head
        if let Some(mut tail) = pieces.pop() {
            tail.append(&mut pieces[0]);
            pieces[0] = tail;
        }
    }

    pieces.retain(|p| if closed { p.len() > 2 } else { p.len() > 1 });
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::projection::Rotation;

    /// Clockwise, interior on the right
    fn square(lon: f64, lat: f64, size: f64) -> Geometry {
        Geometry::new(Value::Polygon(vec![vec![
            vec![lon, lat],
            vec![lon, lat + size],
            vec![lon + size, lat + size],
            vec![lon + size, lat],
            vec![lon, lat],
        ]]))
    }

    /// Even-odd point in polygon on screen
    fn contains(ring: &[Screen], [px, py]: Screen) -> bool {
        let mut inside = false;
        for i in 0..ring.len() {
            let [ax, ay] = ring[i];
            let [bx, by] = ring[(i + 1) % ring.len()];
            if (ay > py) != (by > py) && px < ax + (py - ay) * (bx - ax) / (by - ay) {
                inside = !inside;
            }
        }
        inside
    }

    #[test]
    fn test_polygon_path_is_closed() {
        let p = Projection::equal_earth().fit_size([960.0, 500.0]);
        let path = GeoPath::new(&p).path(Some(&square(0.0, 0.0, 10.0))).unwrap();
        assert!(path.starts_with('M'));
        assert!(path.ends_with('Z'));
        assert_eq!(path.matches('L').count(), 3);
    }

    #[test]
    fn test_centroid_of_symmetric_square() {
        let p = Projection::orthographic().fit_size([200.0, 200.0]);
        let c = GeoPath::new(&p).centroid(Some(&square(-5.0, -5.0, 10.0))).unwrap();
        assert!((c[0] - 100.0).abs() < 1e-6);
        assert!((c[1] - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_back_face_polygon_has_no_path() {
        let p = Projection::orthographic().fit_size([200.0, 200.0]);
        let (path, centroid) = GeoPath::new(&p).render(Some(&square(170.0, -5.0, 5.0)));
        assert_eq!(path, None);
        assert_eq!(centroid, None);
    }

    #[test]
    fn test_horizon_clip_stays_inside_disk() {
        let p = Projection::orthographic().fit_size([200.0, 200.0]);
        let shape = GeoPath::new(&p).project(&square(60.0, -20.0, 60.0));
        assert_eq!(shape.rings.len(), 1);
        for &[x, y] in &shape.rings[0] {
            let r = ((x - 100.0).powi(2) + (y - 100.0).powi(2)).sqrt();
            assert!(r <= 100.0 + 1e-6);
        }
    }

    #[test]
    fn test_horizon_clip_closes_through_interior() {
        // Cap north of 10°S, wound westward so the north lies on the right.
        // Seen from 45°N its visible part spans most of the horizon.
        let mut ring: Vec<Vec<f64>> = (0..36).map(|i| vec![180.0 - 10.0 * i as f64, -10.0]).collect();
        ring.push(vec![180.0, -10.0]);
        let cap = Geometry::new(Value::Polygon(vec![ring]));

        let p = Projection::orthographic()
            .fit_size([200.0, 200.0])
            .with_rotation(Rotation::new(0.0, -45.0));
        let shape = GeoPath::new(&p).project(&cap);
        assert_eq!(shape.rings.len(), 1);

        let north_pole = p.project(0.0, 90.0).unwrap();
        assert!((north_pole[1] - 29.289).abs() < 1e-2);
        assert!(contains(&shape.rings[0], north_pole));

        // Just above where 45°S meets the rim
        assert!(!contains(&shape.rings[0], [100.0, 195.0]));

        let (min_y, max_y) = shape.rings[0]
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &[_, y]| (lo.min(y), hi.max(y)));
        assert!(min_y < 1.0, "top of the disk is inside the cap: {min_y}");
        assert!(max_y < 185.0, "bottom of the disk is outside the cap: {max_y}");
        assert!(shape.centroid().unwrap()[1] < 100.0);
    }

    #[test]
    fn test_horizon_clip_joins_two_runs() {
        // A band crossing the horizon on both sides of the disk
        let band = Geometry::new(Value::Polygon(vec![vec![
            vec![-120.0, -10.0],
            vec![-120.0, 10.0],
            vec![-60.0, 10.0],
            vec![0.0, 10.0],
            vec![60.0, 10.0],
            vec![120.0, 10.0],
            vec![120.0, -10.0],
            vec![60.0, -10.0],
            vec![0.0, -10.0],
            vec![-60.0, -10.0],
            vec![-120.0, -10.0],
        ]]));
        let p = Projection::orthographic().fit_size([200.0, 200.0]);
        let shape = GeoPath::new(&p).project(&band);
        assert_eq!(shape.rings.len(), 1);
        assert!(contains(&shape.rings[0], [100.0, 100.0]));
        assert!(!contains(&shape.rings[0], [100.0, 50.0]));
        assert!(!contains(&shape.rings[0], [100.0, 150.0]));
    }

    #[test]
    fn test_line_clip_splits_runs() {
        let p = Projection::orthographic().fit_size([200.0, 200.0]);
        let line = Geometry::new(Value::LineString(vec![
            vec![-60.0, 0.0],
            vec![0.0, 0.0],
            vec![120.0, 0.0],
            vec![170.0, 0.0],
        ]));
        let shape = GeoPath::new(&p).project(&line);
        assert_eq!(shape.lines.len(), 1);
        let end = shape.lines[0].last().unwrap();
        assert!((end[0] - 200.0).abs() < 1e-6);
    }

    #[test]
    fn test_antimeridian_cut() {
        let p = Projection::equal_earth().fit_size([960.0, 500.0]);
        let line = Geometry::new(Value::LineString(vec![vec![170.0, 0.0], vec![-170.0, 10.0]]));
        let path = GeoPath::new(&p).path(Some(&line)).unwrap();
        assert_eq!(path.matches('M').count(), 2);
    }

    #[test]
    fn test_rotation_moves_antimeridian() {
        // With a -6° shift the cut sits at 174°W
        let p = Projection::equal_earth()
            .fit_size([960.0, 500.0])
            .with_rotation(Rotation::new(-6.0, 0.0));
        let line = Geometry::new(Value::LineString(vec![vec![-178.0, 0.0], vec![-170.0, 0.0]]));
        let shape = GeoPath::new(&p).project(&line);
        assert_eq!(shape.lines.len(), 2);
    }

    #[test]
    fn test_zero_scale_is_finite() {
        let p = Projection::equal_earth().fit_size([0.0, 0.0]);
        let (path, centroid) = GeoPath::new(&p).render(Some(&square(0.0, 0.0, 10.0)));
        assert!(path.is_some());
        let c = centroid.unwrap();
        assert_eq!(c, [0.0, 0.0]);
    }

    #[test]
    fn test_point_renders_circle() {
        let p = Projection::equal_earth().fit_size([960.0, 500.0]);
        let g = Geometry::new(Value::Point(vec![0.0, 0.0]));
        let path = GeoPath::new(&p).path(Some(&g)).unwrap();
        assert_eq!(path, "M480,250m0,4.5a4.5,4.5 0 1,1 0,-9a4.5,4.5 0 1,1 0,9z");
    }

    #[test]
    fn test_malformed_positions_are_skipped() {
        let p = Projection::equal_earth().fit_size([960.0, 500.0]);
        let g = Geometry::new(Value::LineString(vec![vec![0.0], vec![1.0, 1.0], vec![f64::NAN, 2.0], vec![2.0, 2.0]]));
        let shape = GeoPath::new(&p).project(&g);
        assert_eq!(shape.lines.len(), 1);
        assert_eq!(shape.lines[0].len(), 2);
    }

    #[test]
    fn test_missing_geometry() {
        let p = Projection::equal_earth();
        assert_eq!(GeoPath::new(&p).render(None), (None, None));
    }
}
