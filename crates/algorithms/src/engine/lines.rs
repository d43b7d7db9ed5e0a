//! Line dissolve: merging of overlapping collinear segments

use std::cmp::Ordering;

use geo::{Coord, LineString, MultiLineString};

const TOL: f64 = 1e-9;

/// Segment expressed on its supporting line: unit direction `dir`, signed
/// offset from the origin and the `[t0, t1]` interval along `dir`.
#[derive(Debug, Clone, Copy)]
struct Span {
    dir: Coord<f64>,
    offset: f64,
    t0: f64,
    t1: f64,
    start: Coord<f64>,
}

impl Span {
    fn new(a: Coord<f64>, b: Coord<f64>) -> Option<Self> {
        // Orient every segment the same way so that (dx, dy) is canonical
        let (start, end) = if (b.x, b.y) < (a.x, a.y) { (b, a) } else { (a, b) };
        let dx = end.x - start.x;
        let dy = end.y - start.y;
        let len = dx.hypot(dy);
        if !(len > 0.0) {
            return None;
        }
        let dir = Coord { x: dx / len, y: dy / len };
        let t0 = dir.x * start.x + dir.y * start.y;
        Some(Self {
            dir,
            offset: dir.x * start.y - dir.y * start.x,
            t0,
            t1: t0 + len,
            start,
        })
    }

    fn same_support(&self, other: &Span) -> bool {
        (self.dir.x - other.dir.x).abs() < TOL
            && (self.dir.y - other.dir.y).abs() < TOL
            && (self.offset - other.offset).abs() < TOL * self.offset.abs().max(1.0)
    }

    fn to_line_string(self) -> LineString<f64> {
        let len = self.t1 - self.t0;
        LineString::from(vec![
            self.start,
            Coord {
                x: self.start.x + self.dir.x * len,
                y: self.start.y + self.dir.y * len,
            },
        ])
    }
}

fn support_order(a: &Span, b: &Span) -> Ordering {
    a.dir
        .x
        .total_cmp(&b.dir.x)
        .then(a.dir.y.total_cmp(&b.dir.y))
        .then(a.offset.total_cmp(&b.offset))
        .then(a.t0.total_cmp(&b.t0))
}

/// Break lines into segments and merge the ones that overlap on a common
/// supporting line. The total length of the result never counts a stretch
/// twice.
pub(crate) fn merge_collinear(lines: &MultiLineString<f64>) -> MultiLineString<f64> {
    let mut spans: Vec<Span> = lines
        .0
        .iter()
        .flat_map(|ls| ls.lines())
        .filter_map(|l| Span::new(l.start, l.end))
        .collect();
    spans.sort_by(support_order);

    // Split into runs sharing a supporting line
    let mut groups: Vec<Vec<Span>> = Vec::new();
    for span in spans {
        match groups.last_mut() {
            Some(group) if group[0].same_support(&span) => group.push(span),
            _ => groups.push(vec![span]),
        }
    }

    let mut merged = Vec::new();
    for mut group in groups {
        group.sort_by(|a, b| a.t0.total_cmp(&b.t0));
        let mut current = group[0];
        for span in group.into_iter().skip(1) {
            if span.t0 <= current.t1 + TOL {
                current.t1 = current.t1.max(span.t1);
            } else {
                merged.push(current.to_line_string());
                current = span;
            }
        }
        merged.push(current.to_line_string());
    }

    MultiLineString::new(merged)
}
