//! Seeded k-means (k-means++ initialisation, Lloyd iterations, restarts).

use rand::Rng;

use crate::config::KMeansParams;
use crate::zone_rng::ZoneRng;

pub(crate) type Point = [f64; 2];

/// Result of one k-means fit.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct KMeansFit {
    pub centroids: Vec<Point>,
    /// Label per input point, in input order. Each centroid is the mean
    /// of the points carrying its label.
    pub labels: Vec<u32>,
    /// Sum of squared distances to the assigned centroid.
    pub inertia: f64,
    pub iterations: usize,
    pub converged: bool,
}

#[inline]
pub(crate) fn dist2(a: &Point, b: &Point) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

/// Index of the nearest centroid. Ties go to the lower index.
#[inline]
fn nearest(point: &Point, centroids: &[Point]) -> (usize, f64) {
    let mut best = 0;
    let mut best_d = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = dist2(point, c);
        if d < best_d {
            best = i;
            best_d = d;
        }
    }
    (best, best_d)
}

/// Fit `k` clusters. Callers guarantee `1 <= k <= distinct(points)`.
///
/// Restart `r` draws from stream `r` of `seed`; the lowest inertia wins and
/// ties keep the earliest restart.
pub(crate) fn fit(points: &[Point], k: usize, seed: u64, params: &KMeansParams) -> KMeansFit {
    let mut best: Option<KMeansFit> = None;
    for restart in 0..params.restarts.max(1) {
        let mut rng = ZoneRng::for_stream(seed, restart as u64);
        let init = plus_plus_init(points, k, &mut rng);
        let fit = lloyd(points, init, params);
        tracing::debug!(
            "k-means restart {}: inertia {:.8}, {} iterations, converged={}",
            restart,
            fit.inertia,
            fit.iterations,
            fit.converged
        );
        let better = match &best {
            Some(b) => fit.inertia < b.inertia,
            None => true,
        };
        if better {
            best = Some(fit);
        }
    }
    // restarts.max(1) guarantees at least one fit.
    best.unwrap_or_else(|| lloyd(points, points[..k].to_vec(), params))
}

/// k-means++ seeding: each new centre is drawn with probability
/// proportional to its squared distance from the nearest chosen centre.
fn plus_plus_init(points: &[Point], k: usize, rng: &mut ZoneRng) -> Vec<Point> {
    let n = points.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.0.gen_range(0..n)]);

    let mut d2: Vec<f64> = points.iter().map(|p| dist2(p, &centroids[0])).collect();
    while centroids.len() < k {
        let total: f64 = d2.iter().sum();
        let chosen = if total > 0.0 {
            let target = rng.0.gen::<f64>() * total;
            let mut cumulative = 0.0;
            let mut pick = None;
            for (i, &d) in d2.iter().enumerate() {
                cumulative += d;
                if cumulative > target {
                    pick = Some(i);
                    break;
                }
            }
            // Rounding can leave `target` at the very top of the range.
            pick.or_else(|| d2.iter().rposition(|&d| d > 0.0)).unwrap_or(0)
        } else {
            0
        };
        let c = points[chosen];
        centroids.push(c);
        for (i, p) in points.iter().enumerate() {
            let d = dist2(p, &c);
            if d < d2[i] {
                d2[i] = d;
            }
        }
    }
    centroids
}

/// Mean per-axis variance of the points; scales the convergence tolerance
/// so it does not depend on the units of the coordinates.
fn mean_variance(points: &[Point]) -> f64 {
    let n = points.len() as f64;
    let mut variance = 0.0;
    for axis in 0..2 {
        let mean = points.iter().map(|p| p[axis]).sum::<f64>() / n;
        variance += points.iter().map(|p| (p[axis] - mean).powi(2)).sum::<f64>() / n;
    }
    variance / 2.0
}

/// Upper bound on the assign/update passes that settle labels and
/// centroids onto each other once the main loop has stopped.
const SETTLE_PASSES: usize = 100;

fn lloyd(points: &[Point], mut centroids: Vec<Point>, params: &KMeansParams) -> KMeansFit {
    let k = centroids.len();
    let threshold = params.tolerance * mean_variance(points);
    let mut labels = vec![usize::MAX; points.len()];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < params.max_iterations {
        iterations += 1;

        let changed = assign_step(points, &centroids, &mut labels, k);
        if !changed {
            converged = true;
            break;
        }

        let max_shift = update_centroids(points, &labels, &mut centroids);
        if max_shift <= threshold {
            converged = true;
            break;
        }
    }

    // A tolerance or iteration stop can leave labels one step behind the
    // centroids. Keep stepping until nearest-centroid labels stop moving.
    for _ in 0..SETTLE_PASSES {
        if !assign_step(points, &centroids, &mut labels, k) {
            break;
        }
        update_centroids(points, &labels, &mut centroids);
    }
    // Centres are always the means of their final members.
    update_centroids(points, &labels, &mut centroids);

    let inertia = points
        .iter()
        .zip(&labels)
        .map(|(p, &l)| dist2(p, &centroids[l]))
        .sum();

    KMeansFit {
        centroids,
        labels: labels.into_iter().map(|l| l as u32).collect(),
        inertia,
        iterations,
        converged,
    }
}

/// Relabel every point to its nearest centroid, then refill empty
/// clusters. Returns whether any label moved.
fn assign_step(points: &[Point], centroids: &[Point], labels: &mut [usize], k: usize) -> bool {
    let mut changed = false;
    for (label, p) in labels.iter_mut().zip(points) {
        let nearest_label = nearest(p, centroids).0;
        if *label != nearest_label {
            *label = nearest_label;
            changed = true;
        }
    }
    changed | reseed_empty_clusters(points, centroids, labels, k)
}

/// Move each non-empty centroid to the mean of its points. Returns the
/// largest squared shift.
fn update_centroids(points: &[Point], labels: &[usize], centroids: &mut [Point]) -> f64 {
    let k = centroids.len();
    let mut sums = vec![[0.0f64; 2]; k];
    let mut counts = vec![0usize; k];
    for (p, &l) in points.iter().zip(labels) {
        sums[l][0] += p[0];
        sums[l][1] += p[1];
        counts[l] += 1;
    }

    let mut max_shift = 0.0f64;
    for c in 0..k {
        if counts[c] == 0 {
            continue;
        }
        let updated = [sums[c][0] / counts[c] as f64, sums[c][1] / counts[c] as f64];
        max_shift = max_shift.max(dist2(&updated, &centroids[c]));
        centroids[c] = updated;
    }
    max_shift
}

/// Give every empty cluster the point farthest from its own centroid,
/// taken only from clusters that keep at least one other member. Returns
/// whether any label moved.
fn reseed_empty_clusters(points: &[Point], centroids: &[Point], labels: &mut [usize], k: usize) -> bool {
    let mut counts = vec![0usize; k];
    for &l in labels.iter() {
        counts[l] += 1;
    }
    let mut moved = false;
    for empty in 0..k {
        if counts[empty] > 0 {
            continue;
        }
        let mut far: Option<(usize, f64)> = None;
        for (i, p) in points.iter().enumerate() {
            let owner = labels[i];
            if counts[owner] < 2 {
                continue;
            }
            let d = dist2(p, &centroids[owner]);
            if far.map_or(true, |(_, best)| d > best) {
                far = Some((i, d));
            }
        }
        if let Some((i, _)) = far {
            counts[labels[i]] -= 1;
            labels[i] = empty;
            counts[empty] = 1;
            moved = true;
        }
    }
    moved
}
