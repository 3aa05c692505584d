//! K-means clustering over player skill features.
//!
//! Lloyd's algorithm with k-means++ seeding. The RNG is seeded from
//! configuration, so the same pool always yields the same grouping, and
//! cluster labels are renumbered by centroid order before they leave this
//! module.

use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::adaptive::config::KMeansConfig;
use crate::adaptive::error::EngineError;
use crate::adaptive::types::{ClusterAssignment, ClusterResult, PlayerFeatureVector};

const DIM: usize = 4;

type Point = [f64; DIM];

/// Clamp a requested cluster count to `[1, n]`.
pub fn effective_k(requested: usize, n: usize) -> usize {
    requested.min(n).max(1)
}

fn distance_squared(a: &Point, b: &Point) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index of the closest centroid; ties go to the lowest index.
fn nearest(point: &Point, centroids: &[Point]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (idx, centroid) in centroids.iter().enumerate() {
        let dist = distance_squared(point, centroid);
        if dist < best_dist {
            best = idx;
            best_dist = dist;
        }
    }
    best
}

fn cmp_points(a: &Point, b: &Point) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.partial_cmp(y).unwrap_or(Ordering::Equal) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

/// k-means++: each further centroid is drawn with probability proportional to
/// its squared distance from the nearest chosen one. Stops early when every
/// point already coincides with a centroid.
fn seed_centroids(points: &[Point], k: usize, rng: &mut StdRng) -> Vec<Point> {
    let mut centroids = Vec::with_capacity(k);
    let first = points[rng.gen_range(0..points.len())];
    centroids.push(first);

    let mut min_dist: Vec<f64> = points.iter().map(|p| distance_squared(p, &first)).collect();

    while centroids.len() < k {
        let total: f64 = min_dist.iter().sum();
        if total <= 0.0 {
            break;
        }

        let mut target = rng.gen::<f64>() * total;
        let mut chosen = None;
        for (idx, &dist) in min_dist.iter().enumerate() {
            if dist <= 0.0 {
                continue;
            }
            if target < dist {
                chosen = Some(idx);
                break;
            }
            target -= dist;
        }
        // 浮点累计误差可能导致 target 略超总和，回退到最后一个正权重点
        let Some(idx) = chosen.or_else(|| min_dist.iter().rposition(|&d| d > 0.0)) else {
            break;
        };

        let centroid = points[idx];
        centroids.push(centroid);
        for (dist, point) in min_dist.iter_mut().zip(points.iter()) {
            let d = distance_squared(point, &centroid);
            if d < *dist {
                *dist = d;
            }
        }
    }

    centroids
}

fn cluster_sizes(assignments: &[usize], k: usize) -> Vec<usize> {
    let mut counts = vec![0usize; k];
    for &cluster in assignments {
        counts[cluster] += 1;
    }
    counts
}

/// Recompute centroids as member means. A cluster left empty takes over the
/// point farthest from its own centroid (only from clusters that can spare a
/// member); if every point sits exactly on its centroid the cluster stays
/// empty and is dropped at canonicalization.
fn update_centroids(points: &[Point], assignments: &mut [usize], centroids: &mut [Point]) {
    let k = centroids.len();
    let mut counts = cluster_sizes(assignments, k);

    for empty in 0..k {
        if counts[empty] > 0 {
            continue;
        }
        let farthest = points
            .iter()
            .enumerate()
            .filter(|(idx, _)| counts[assignments[*idx]] > 1)
            .map(|(idx, point)| (idx, distance_squared(point, &centroids[assignments[idx]])))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

        if let Some((idx, dist)) = farthest {
            if dist > 0.0 {
                tracing::debug!(cluster = empty, point = idx, "Reseeding empty cluster");
                counts[assignments[idx]] -= 1;
                assignments[idx] = empty;
                counts[empty] = 1;
                centroids[empty] = points[idx];
            }
        }
    }

    let mut sums = vec![[0.0f64; DIM]; k];
    for (point, &cluster) in points.iter().zip(assignments.iter()) {
        for d in 0..DIM {
            sums[cluster][d] += point[d];
        }
    }
    for (cluster, sum) in sums.into_iter().enumerate() {
        if counts[cluster] == 0 {
            continue;
        }
        let n = counts[cluster] as f64;
        for d in 0..DIM {
            centroids[cluster][d] = sum[d] / n;
        }
    }
}

pub fn cluster(
    players: &[PlayerFeatureVector],
    k: usize,
    cfg: &KMeansConfig,
) -> Result<ClusterResult, EngineError> {
    if players.is_empty() {
        return Err(EngineError::compute("cannot cluster an empty player pool"));
    }
    if cfg.max_iterations == 0 {
        return Err(EngineError::compute("kmeans.max_iterations must be > 0"));
    }

    let points: Vec<Point> = players.iter().map(PlayerFeatureVector::as_point).collect();
    if let Some(bad) = players
        .iter()
        .zip(points.iter())
        .find(|(_, p)| p.iter().any(|v| !v.is_finite()))
    {
        return Err(EngineError::compute(format!(
            "non-finite feature vector for player {}",
            bad.0.id
        )));
    }

    let k = effective_k(k, points.len());
    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let mut centroids = seed_centroids(&points, k, &mut rng);
    let k = centroids.len();

    let mut assignments = vec![usize::MAX; points.len()];
    let mut iterations = 0;
    let mut converged = false;

    for _ in 0..cfg.max_iterations {
        iterations += 1;

        let mut changed = false;
        for (point, slot) in points.iter().zip(assignments.iter_mut()) {
            let nearest = nearest(point, &centroids);
            if *slot != nearest {
                *slot = nearest;
                changed = true;
            }
        }
        if !changed {
            converged = true;
            break;
        }

        update_centroids(&points, &mut assignments, &mut centroids);
    }

    if !converged {
        tracing::debug!(iterations, "K-means hit iteration cap before converging");
    }

    // 按质心字典序重新编号，保证同一分组在不同调用中得到相同标签
    let sizes = cluster_sizes(&assignments, k);
    let mut order: Vec<usize> = (0..k).filter(|&c| sizes[c] > 0).collect();
    order.sort_by(|&a, &b| cmp_points(&centroids[a], &centroids[b]).then(a.cmp(&b)));

    let mut relabel = vec![usize::MAX; k];
    for (label, &old) in order.iter().enumerate() {
        relabel[old] = label;
    }

    let assignments_out = players
        .iter()
        .zip(assignments.iter())
        .map(|(player, &cluster)| ClusterAssignment {
            player_id: player.id.clone(),
            cluster: relabel[cluster],
        })
        .collect();

    Ok(ClusterResult {
        players: assignments_out,
        cluster_count: order.len(),
        centroids: order.iter().map(|&c| centroids[c]).collect(),
        iterations,
        converged,
    })
}
