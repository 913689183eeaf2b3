//! RANSAC ground plane segmentation.
//!
//! Uses Random Sample Consensus to find the dominant plane in a cloud,
//! then splits the cloud into ground (plane inliers) and non-ground points.

use nalgebra::{Matrix3, SymmetricEigen, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::types::{PlaneModel, PointCloud};

/// Configuration for ground segmentation.
#[derive(Clone, Debug)]
pub struct GroundSegmenterConfig {
    /// Inlier distance threshold (meters).
    /// Default: 0.1m
    pub distance_threshold: f32,

    /// Maximum number of RANSAC iterations.
    /// Default: 500
    pub max_iterations: usize,

    /// Minimum inlier count for a plane to be accepted.
    /// Default: 3
    pub min_inliers: usize,

    /// Refit the winning plane by least squares over its inliers.
    /// Default: true
    pub optimize_coefficients: bool,

    /// Fixed RNG seed (None seeds from the OS).
    pub seed: Option<u64>,
}

impl Default for GroundSegmenterConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 0.1,
            max_iterations: 500,
            min_inliers: 3,
            optimize_coefficients: true,
            seed: None,
        }
    }
}

impl GroundSegmenterConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for inlier threshold.
    pub fn with_distance_threshold(mut self, meters: f32) -> Self {
        self.distance_threshold = meters;
        self
    }

    /// Builder-style setter for maximum iterations.
    pub fn with_max_iterations(mut self, iterations: usize) -> Self {
        self.max_iterations = iterations;
        self
    }

    /// Builder-style setter for minimum inlier count.
    pub fn with_min_inliers(mut self, count: usize) -> Self {
        self.min_inliers = count;
        self
    }

    /// Builder-style setter for the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Result of plane segmentation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SegmentationResult {
    /// Inlier indices into the input cloud, ascending, no duplicates.
    pub inliers: Vec<usize>,
    /// Fitted plane; None if no plane reached `min_inliers`.
    pub plane: Option<PlaneModel>,
    /// Number of iterations performed.
    pub iterations: usize,
}

impl SegmentationResult {
    pub fn is_empty(&self) -> bool {
        self.inliers.is_empty()
    }
}

/// RANSAC plane segmenter.
pub struct GroundSegmenter {
    config: GroundSegmenterConfig,
    rng: StdRng,
}

impl GroundSegmenter {
    pub fn new(config: GroundSegmenterConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { config, rng }
    }

    pub fn config(&self) -> &GroundSegmenterConfig {
        &self.config
    }

    /// Find the dominant plane in `cloud`.
    ///
    /// Never fails: degenerate input yields an empty inlier set and no plane.
    pub fn segment(&mut self, cloud: &PointCloud) -> SegmentationResult {
        let n = cloud.len();
        let min_inliers = self.config.min_inliers.max(3);
        if n < min_inliers {
            return SegmentationResult::default();
        }

        let threshold = self.config.distance_threshold;
        let mut best_plane: Option<PlaneModel> = None;
        let mut best_count = 0usize;
        let mut iterations = 0usize;

        // Runs the full budget unless a plane already covers every point
        while iterations < self.config.max_iterations && best_count < n {
            iterations += 1;

            // Sample 3 distinct points for the minimal set
            let idx1 = self.rng.random_range(0..n);
            let mut idx2 = self.rng.random_range(0..n);
            while idx2 == idx1 {
                idx2 = self.rng.random_range(0..n);
            }
            let mut idx3 = self.rng.random_range(0..n);
            while idx3 == idx1 || idx3 == idx2 {
                idx3 = self.rng.random_range(0..n);
            }

            let (Some(p1), Some(p2), Some(p3)) = (cloud.get(idx1), cloud.get(idx2), cloud.get(idx3))
            else {
                continue;
            };
            let Some(plane) = PlaneModel::from_three_points(p1, p2, p3) else {
                continue;
            };

            let count = count_inliers(cloud, &plane, threshold);
            if count > best_count {
                best_count = count;
                best_plane = Some(plane);
            }
        }

        let Some(mut plane) = best_plane else {
            log::debug!("Ground segmentation: no plane model found ({} points)", n);
            return SegmentationResult {
                iterations,
                ..Default::default()
            };
        };

        if best_count < min_inliers {
            log::debug!(
                "Ground segmentation: best plane has {} inliers (< {})",
                best_count,
                min_inliers
            );
            return SegmentationResult {
                iterations,
                ..Default::default()
            };
        }

        let mut inliers = select_inliers(cloud, &plane, threshold);

        if self.config.optimize_coefficients
            && let Some(refit) = fit_plane_least_squares(cloud, &inliers)
        {
            let refit_inliers = select_inliers(cloud, &refit, threshold);
            if refit_inliers.len() >= inliers.len() {
                plane = refit;
                inliers = refit_inliers;
            }
        }

        SegmentationResult {
            inliers,
            plane: Some(plane),
            iterations,
        }
    }
}

impl Default for GroundSegmenter {
    fn default() -> Self {
        Self::new(GroundSegmenterConfig::default())
    }
}

/// Segment `cloud` with the given threshold and iteration budget.
pub fn segment_plane(
    cloud: &PointCloud,
    distance_threshold: f32,
    max_iterations: usize,
) -> SegmentationResult {
    GroundSegmenter::new(
        GroundSegmenterConfig::default()
            .with_distance_threshold(distance_threshold)
            .with_max_iterations(max_iterations),
    )
    .segment(cloud)
}

/// Extract points by index.
///
/// With `negative == false` returns the indexed points, otherwise the
/// complement. Out-of-range indices are ignored.
pub fn extract_indices(cloud: &PointCloud, indices: &[usize], negative: bool) -> PointCloud {
    let mut selected = vec![false; cloud.len()];
    for &i in indices {
        if let Some(slot) = selected.get_mut(i) {
            *slot = true;
        }
    }
    cloud.retain_indexed(|i| selected[i] != negative)
}

/// Split a cloud into (ground, non_ground) using a segmentation result.
pub fn partition(cloud: &PointCloud, result: &SegmentationResult) -> (PointCloud, PointCloud) {
    let ground = extract_indices(cloud, &result.inliers, false);
    let non_ground = extract_indices(cloud, &result.inliers, true);
    (ground, non_ground)
}

/// Count points within `threshold` of `plane`.
fn count_inliers(cloud: &PointCloud, plane: &PlaneModel, threshold: f32) -> usize {
    cloud
        .xs
        .iter()
        .zip(cloud.ys.iter())
        .zip(cloud.zs.iter())
        .filter(|((x, y), z)| plane.distance(**x, **y, **z) <= threshold)
        .count()
}

/// Indices of points within `threshold` of `plane`, ascending.
fn select_inliers(cloud: &PointCloud, plane: &PlaneModel, threshold: f32) -> Vec<usize> {
    (0..cloud.len())
        .filter(|&i| plane.distance(cloud.xs[i], cloud.ys[i], cloud.zs[i]) <= threshold)
        .collect()
}

/// Least-squares plane through the indexed points.
///
/// The normal is the eigenvector of the covariance matrix with the smallest
/// eigenvalue. Computed in f64.
fn fit_plane_least_squares(cloud: &PointCloud, indices: &[usize]) -> Option<PlaneModel> {
    if indices.len() < 3 {
        return None;
    }

    let n = indices.len() as f64;
    let mut centroid = Vector3::<f64>::zeros();
    for &i in indices {
        centroid += Vector3::new(cloud.xs[i] as f64, cloud.ys[i] as f64, cloud.zs[i] as f64);
    }
    centroid /= n;

    let mut covariance = Matrix3::<f64>::zeros();
    for &i in indices {
        let d = Vector3::new(cloud.xs[i] as f64, cloud.ys[i] as f64, cloud.zs[i] as f64)
            - centroid;
        covariance += d * d.transpose();
    }
    covariance /= n;

    let eigen = SymmetricEigen::new(covariance);
    let (min_idx, _) = eigen
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))?;
    let normal = eigen.eigenvectors.column(min_idx).into_owned();
    let d = -normal.dot(&centroid);

    PlaneModel::from_normal(
        Vector3::new(normal.x as f32, normal.y as f32, normal.z as f32),
        d as f32,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Point3D;
    use approx::assert_relative_eq;

    /// Flat plane at z≈0 (noise < 2cm) followed by outliers well above it.
    fn plane_with_outliers(plane_points: usize, outliers: usize, seed: u64) -> PointCloud {
        noisy_plane_with_outliers(plane_points, outliers, 0.02, seed)
    }

    /// Flat plane at z≈0 with uniform noise in ±`noise`, then outliers above it.
    fn noisy_plane_with_outliers(
        plane_points: usize,
        outliers: usize,
        noise: f32,
        seed: u64,
    ) -> PointCloud {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut cloud = PointCloud::new("os_sensor");
        for _ in 0..plane_points {
            cloud.push_xyz(
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
                rng.random_range(-noise..noise),
            );
        }
        for _ in 0..outliers {
            cloud.push_xyz(
                rng.random_range(-10.0..10.0),
                rng.random_range(-10.0..10.0),
                rng.random_range(0.5..3.0),
            );
        }
        cloud
    }

    #[test]
    fn test_recovers_flat_plane() {
        let cloud = plane_with_outliers(1000, 50, 7);
        let mut segmenter =
            GroundSegmenter::new(GroundSegmenterConfig::default().with_seed(1));

        let result = segmenter.segment(&cloud);

        let plane_hits = result.inliers.iter().filter(|&&i| i < 1000).count();
        assert!(
            plane_hits >= 950,
            "only {} of 1000 plane points recovered",
            plane_hits
        );
        assert!(result.iterations <= 500);

        let plane = result.plane.unwrap();
        assert_relative_eq!(plane.normal().z.abs(), 1.0, epsilon = 1e-2);
        // Outliers sit at least 0.5m above the plane
        assert!(result.inliers.iter().all(|&i| i < 1000));
    }

    #[test]
    fn test_recovers_plane_with_noise_near_threshold() {
        // Noise close to the 0.1 threshold
        for seed in 0..20 {
            let cloud = noisy_plane_with_outliers(1000, 50, 0.09, seed);
            let mut segmenter =
                GroundSegmenter::new(GroundSegmenterConfig::default().with_seed(seed + 100));

            let result = segmenter.segment(&cloud);

            let plane_hits = result.inliers.iter().filter(|&&i| i < 1000).count();
            assert!(
                plane_hits >= 950,
                "seed {}: only {} of 1000 plane points recovered",
                seed,
                plane_hits
            );
            assert_eq!(result.iterations, 500);
        }
    }

    #[test]
    fn test_stops_once_every_point_is_inlier() {
        let mut cloud = PointCloud::new("os_sensor");
        for i in 0..10 {
            for j in 0..10 {
                cloud.push_xyz(i as f32, j as f32, -0.5);
            }
        }
        let mut segmenter =
            GroundSegmenter::new(GroundSegmenterConfig::default().with_seed(3));

        let result = segmenter.segment(&cloud);

        assert_eq!(result.inliers.len(), 100);
        assert!(result.iterations < 500);
    }

    #[test]
    fn test_segment_plane_contract() {
        let cloud = plane_with_outliers(500, 20, 3);
        let result = segment_plane(&cloud, 0.1, 500);
        assert!(result.plane.is_some());
        assert!(result.inliers.len() >= 475);
    }

    fn sorted_points(clouds: &[&PointCloud]) -> Vec<(u32, u32, u32)> {
        let mut points: Vec<_> = clouds
            .iter()
            .flat_map(|c| c.iter())
            .map(|p| (p.x.to_bits(), p.y.to_bits(), p.z.to_bits()))
            .collect();
        points.sort_unstable();
        points
    }

    #[test]
    fn test_partition_is_exact() {
        for seed in 0..10 {
            let cloud = noisy_plane_with_outliers(300, 40, 0.05, seed);
            let mut segmenter =
                GroundSegmenter::new(GroundSegmenterConfig::default().with_seed(seed + 5));
            let result = segmenter.segment(&cloud);
            let (ground, non_ground) = partition(&cloud, &result);

            assert_eq!(ground.len(), result.inliers.len());
            assert_eq!(ground.len() + non_ground.len(), cloud.len());
            // Union of both outputs is exactly the input, each point once
            assert_eq!(sorted_points(&[&ground, &non_ground]), sorted_points(&[&cloud]));

            let plane = result.plane.unwrap();
            let threshold = segmenter.config().distance_threshold;
            assert!(ground.iter().all(|p| plane.distance(p.x, p.y, p.z) <= threshold));
            assert!(non_ground.iter().all(|p| plane.distance(p.x, p.y, p.z) > threshold));

            // Inliers are sorted and unique
            assert!(result.inliers.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_refit_improves_tilted_plane() {
        // Plane z = 0.1x tilted slightly, no noise
        let mut cloud = PointCloud::new("os_sensor");
        for i in 0..20 {
            for j in 0..20 {
                let x = i as f32 * 0.5 - 5.0;
                let y = j as f32 * 0.5 - 5.0;
                cloud.push_xyz(x, y, 0.1 * x);
            }
        }
        let mut segmenter =
            GroundSegmenter::new(GroundSegmenterConfig::default().with_seed(2));
        let result = segmenter.segment(&cloud);

        assert_eq!(result.inliers.len(), 400);
        let plane = result.plane.unwrap();
        for p in cloud.iter() {
            assert!(plane.distance(p.x, p.y, p.z) < 1e-3);
        }
    }

    // ========================================================================
    // Degenerate Input Tests
    // ========================================================================

    #[test]
    fn test_empty_cloud() {
        let cloud = PointCloud::new("os_sensor");
        let result = segment_plane(&cloud, 0.1, 500);
        assert!(result.is_empty());
        assert!(result.plane.is_none());

        let (ground, non_ground) = partition(&cloud, &result);
        assert!(ground.is_empty());
        assert!(non_ground.is_empty());
    }

    #[test]
    fn test_two_points() {
        let cloud = PointCloud::from_points(
            "os_sensor",
            &[Point3D::new(0.0, 0.0, 0.0), Point3D::new(1.0, 0.0, 0.0)],
        );
        let result = segment_plane(&cloud, 0.1, 500);
        assert!(result.is_empty());

        let (_, non_ground) = partition(&cloud, &result);
        assert_eq!(non_ground, cloud);
    }

    #[test]
    fn test_collinear_points() {
        let mut cloud = PointCloud::new("os_sensor");
        for i in 0..50 {
            let t = i as f32 * 0.1;
            cloud.push_xyz(t, 2.0 * t, 0.5 * t);
        }
        let result = segment_plane(&cloud, 0.1, 100);
        assert!(result.is_empty());
        assert!(result.plane.is_none());

        let (ground, non_ground) = partition(&cloud, &result);
        assert!(ground.is_empty());
        assert_eq!(non_ground.len(), 50);
    }

    #[test]
    fn test_min_inliers_not_reached() {
        let cloud = plane_with_outliers(10, 0, 9);
        let mut segmenter = GroundSegmenter::new(
            GroundSegmenterConfig::default()
                .with_min_inliers(100)
                .with_seed(4),
        );
        let result = segmenter.segment(&cloud);
        assert!(result.is_empty());
    }

    #[test]
    fn test_extract_indices_ignores_out_of_range() {
        let cloud = PointCloud::from_points(
            "os_sensor",
            &[
                Point3D::new(0.0, 0.0, 0.0),
                Point3D::new(1.0, 0.0, 0.0),
                Point3D::new(2.0, 0.0, 0.0),
            ],
        );
        let positive = extract_indices(&cloud, &[0, 2, 99], false);
        let negative = extract_indices(&cloud, &[0, 2, 99], true);
        assert_eq!(positive.xs, vec![0.0, 2.0]);
        assert_eq!(negative.xs, vec![1.0]);
    }
}
