//! K-means clustering for the inverted-file vector index.
//!
//! Partitions chunk vectors into `k` cells under squared Euclidean distance,
//! the same metric the indexes search with.
//!
//! # Algorithm Details
//! - Initialization: K-means++ from a seeded RNG, so one seed always yields the
//!   same partition for the same vectors
//! - Max iterations: 100
//! - Convergence: no assignment changes, or mean centroid shift below 1e-6
//!
//! # Performance Characteristics
//! - O(n * k * d * iterations) time complexity
//! - O(k * d) space for centroids

use crate::vector::squared_euclidean;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

/// Maximum number of iterations for K-means clustering.
const MAX_ITERATIONS: usize = 100;

/// Convergence tolerance for centroid updates.
const CONVERGENCE_TOLERANCE: f32 = 1e-6;

/// Epsilon for floating-point comparisons.
const EPSILON: f32 = 1e-10;

/// Result of K-means clustering operation.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// Cluster centroids, each a vector of the same dimension as input vectors.
    pub centroids: Vec<Vec<f32>>,

    /// Cluster index (into `centroids`) for each input vector.
    ///
    /// Always the nearest centroid of the final `centroids`.
    pub assignments: Vec<usize>,

    /// Number of iterations until convergence.
    pub iterations: usize,

    /// False when the iteration cap was hit first.
    pub converged: bool,
}

/// Errors that can occur during clustering operations.
#[derive(Error, Debug)]
pub enum ClusteringError {
    #[error(
        "Empty vector set provided for clustering\nSuggestion: Ensure vectors are generated before clustering"
    )]
    EmptyVectorSet,

    #[error("Invalid cluster count: {0}\nSuggestion: Use k between 1 and the number of vectors")]
    InvalidClusterCount(usize),

    #[error(
        "Dimension mismatch in vectors\nSuggestion: Ensure all vectors come from the same embedding model"
    )]
    DimensionMismatch,
}

/// Performs K-means clustering on a set of vectors.
///
/// # Arguments
/// * `vectors` - Input vectors to cluster (must be non-empty and same dimension)
/// * `k` - Number of clusters (must be >= 1 and <= number of vectors)
/// * `seed` - RNG seed for K-means++ initialization
///
/// Duplicate vectors can leave fewer distinct seeds than `k`; the surplus
/// centroids then start on already chosen points and may end up empty.
#[must_use = "clustering results should be used or the computation is wasted"]
pub fn kmeans_clustering(
    vectors: &[&[f32]],
    k: usize,
    seed: u64,
) -> Result<KMeansResult, ClusteringError> {
    if vectors.is_empty() {
        return Err(ClusteringError::EmptyVectorSet);
    }

    if k == 0 || k > vectors.len() {
        return Err(ClusteringError::InvalidClusterCount(k));
    }

    let dimension = vectors[0].len();
    if vectors.iter().any(|v| v.len() != dimension) {
        return Err(ClusteringError::DimensionMismatch);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = initialize_centroids_kmeans_plus_plus(vectors, k, &mut rng);
    let mut assignments = vec![usize::MAX; vectors.len()];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < MAX_ITERATIONS {
        iterations += 1;

        let new_assignments = assign_all(vectors, &centroids);
        if new_assignments == assignments {
            converged = true;
            break;
        }
        assignments = new_assignments;

        let new_centroids = update_centroids(vectors, &assignments, &centroids);
        let movement = calculate_centroid_movement(&centroids, &new_centroids);
        centroids = new_centroids;

        if movement < CONVERGENCE_TOLERANCE {
            converged = true;
            break;
        }
    }

    if !converged {
        tracing::warn!("K-means did not fully converge after {MAX_ITERATIONS} iterations");
    }

    // Centroids may have moved after the last assignment step
    let assignments = assign_all(vectors, &centroids);

    Ok(KMeansResult {
        centroids,
        assignments,
        iterations,
        converged,
    })
}

/// Returns the index of the centroid nearest to `vector`.
///
/// Ties go to the lower centroid index.
pub fn assign_to_nearest_centroid(vector: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best_distance = f32::INFINITY;
    let mut best_cluster = 0;

    for (i, centroid) in centroids.iter().enumerate() {
        let distance = squared_euclidean(vector, centroid);
        if distance < best_distance {
            best_distance = distance;
            best_cluster = i;
        }
    }

    best_cluster
}

fn assign_all(vectors: &[&[f32]], centroids: &[Vec<f32>]) -> Vec<usize> {
    vectors
        .iter()
        .map(|vector| assign_to_nearest_centroid(vector, centroids))
        .collect()
}

/// Recomputes centroids as the mean of their assigned vectors.
///
/// A cluster that lost all members keeps its previous centroid.
fn update_centroids(
    vectors: &[&[f32]],
    assignments: &[usize],
    previous: &[Vec<f32>],
) -> Vec<Vec<f32>> {
    let dimension = vectors[0].len();
    let k = previous.len();
    let mut sums = vec![vec![0.0f32; dimension]; k];
    let mut sizes = vec![0usize; k];

    for (vector, &cluster) in vectors.iter().zip(assignments.iter()) {
        for (sum, &value) in sums[cluster].iter_mut().zip(vector.iter()) {
            *sum += value;
        }
        sizes[cluster] += 1;
    }

    sums.into_iter()
        .zip(sizes)
        .zip(previous)
        .map(|((mut sum, size), old)| {
            if size == 0 {
                old.clone()
            } else {
                for value in sum.iter_mut() {
                    *value /= size as f32;
                }
                sum
            }
        })
        .collect()
}

/// Initializes centroids using the K-means++ algorithm.
///
/// Each further centroid is drawn with probability proportional to its
/// squared distance from the nearest centroid chosen so far.
fn initialize_centroids_kmeans_plus_plus(
    vectors: &[&[f32]],
    k: usize,
    rng: &mut StdRng,
) -> Vec<Vec<f32>> {
    let mut centroids: Vec<Vec<f32>> = Vec::with_capacity(k);
    let first_idx = rng.random_range(0..vectors.len());
    centroids.push(vectors[first_idx].to_vec());

    let mut nearest: Vec<f32> = vectors
        .iter()
        .map(|v| squared_euclidean(v, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f32 = nearest.iter().sum();

        let next_idx = if total < EPSILON {
            // Every point already coincides with a centroid
            centroids.len() % vectors.len()
        } else {
            let target = rng.random::<f32>() * total;
            let mut cumulative = 0.0;
            nearest
                .iter()
                .position(|&d| {
                    cumulative += d;
                    cumulative >= target
                })
                .unwrap_or(vectors.len() - 1)
        };

        let centroid = vectors[next_idx].to_vec();
        for (best, vector) in nearest.iter_mut().zip(vectors.iter()) {
            *best = best.min(squared_euclidean(vector, &centroid));
        }
        centroids.push(centroid);
    }

    centroids
}

/// Mean squared shift of centroids between two iterations.
fn calculate_centroid_movement(old: &[Vec<f32>], new: &[Vec<f32>]) -> f32 {
    old.iter()
        .zip(new.iter())
        .map(|(old_c, new_c)| squared_euclidean(old_c, new_c))
        .sum::<f32>()
        / old.len() as f32
}
