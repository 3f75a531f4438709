//! Clustering of raw sliding-window hits into final detections.
//!
//! A cascade fires many times around a real face at neighbouring positions
//! and scales. Hits are clustered by edge proximity, each cluster is
//! averaged into one box, and clusters with too few members are dropped.

use crate::shared::region::BoundingBox;

/// Relative edge tolerance for two hits to count as the same face.
pub const GROUP_EPS: f64 = 0.2;

/// Groups raw detections, keeping clusters with more than `min_neighbors`
/// members. `min_neighbors == 0` returns the input unchanged.
///
/// Output order follows the first member of each cluster in the input.
pub fn group_rectangles(rects: &[BoundingBox], min_neighbors: u32, eps: f64) -> Vec<BoundingBox> {
    if min_neighbors == 0 || rects.is_empty() {
        return rects.to_vec();
    }

    let clusters = average_clusters(rects, eps);
    let threshold = min_neighbors as usize;

    clusters
        .iter()
        .enumerate()
        .filter(|(_, (_, n))| *n > threshold)
        .filter(|&(i, (r1, n1))| {
            !clusters.iter().enumerate().any(|(j, (r2, n2))| {
                j != i
                    && *n2 > threshold
                    && is_nested(r1, r2, eps)
                    && (*n2 > (*n1).max(3) || *n1 < 3)
            })
        })
        .map(|(_, (r, _))| *r)
        .collect()
}

/// Edge-wise similarity: every edge within `eps` × mean of the smaller sides.
pub fn is_similar(a: &BoundingBox, b: &BoundingBox, eps: f64) -> bool {
    let delta = eps * (a.width.min(b.width) as f64 + a.height.min(b.height) as f64) * 0.5;
    let close = |p: u32, q: u32| (p as f64 - q as f64).abs() <= delta;

    close(a.x, b.x) && close(a.y, b.y) && close(a.right(), b.right()) && close(a.bottom(), b.bottom())
}

/// Whether `inner` lies inside `outer` grown by `eps` of its size.
fn is_nested(inner: &BoundingBox, outer: &BoundingBox, eps: f64) -> bool {
    let dx = (outer.width as f64 * eps).round() as i64;
    let dy = (outer.height as f64 * eps).round() as i64;
    let (ix, iy) = (inner.x as i64, inner.y as i64);
    let (ox, oy) = (outer.x as i64, outer.y as i64);

    ix >= ox - dx
        && iy >= oy - dy
        && ix + inner.width as i64 <= ox + outer.width as i64 + dx
        && iy + inner.height as i64 <= oy + outer.height as i64 + dy
}

/// Returns `(mean box, member count)` per cluster.
fn average_clusters(rects: &[BoundingBox], eps: f64) -> Vec<(BoundingBox, usize)> {
    let mut parent: Vec<usize> = (0..rects.len()).collect();
    for i in 0..rects.len() {
        for j in (i + 1)..rects.len() {
            if is_similar(&rects[i], &rects[j], eps) {
                union(&mut parent, i, j);
            }
        }
    }

    // root -> index into `sums`, assigned in order of first appearance
    let mut label_of_root: Vec<Option<usize>> = vec![None; rects.len()];
    let mut sums: Vec<([u64; 4], usize)> = Vec::new();
    for (i, r) in rects.iter().enumerate() {
        let root = find(&mut parent, i);
        let label = *label_of_root[root].get_or_insert_with(|| {
            sums.push(([0; 4], 0));
            sums.len() - 1
        });
        let (acc, count) = &mut sums[label];
        acc[0] += r.x as u64;
        acc[1] += r.y as u64;
        acc[2] += r.width as u64;
        acc[3] += r.height as u64;
        *count += 1;
    }

    sums.into_iter()
        .map(|(acc, n)| {
            let mean = |v: u64| (v as f64 / n as f64).round() as u32;
            (
                BoundingBox::new(mean(acc[0]), mean(acc[1]), mean(acc[2]), mean(acc[3])),
                n,
            )
        })
        .collect()
}

/// Find root of element `i` with path halving.
fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[ra] = rb;
    }
}
