//! Least-squares rigid superposition of paired point sets.
//!
//! This is the Kabsch algorithm: both sets are centered, the covariance
//! matrix between them is decomposed with an SVD, and the rotation is
//! assembled from the singular vectors with a sign fix so it never
//! reflects.

use crate::error::{Error, Result};
use nalgebra as na;

/// A rotation followed by a translation mapping mobile points onto reference points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Superposition {
    /// Proper rotation matrix (determinant +1)
    pub rotation: na::Matrix3<f64>,
    /// Translation applied after rotation
    pub translation: na::Vector3<f64>,
    /// Root-mean-square deviation of the paired points after the fit
    pub rmsd: f64,
}

fn coords_matrix(points: &[na::Vector3<f64>]) -> na::Matrix3xX<f64> {
    na::Matrix3xX::<f64>::from_columns(points)
}

impl Superposition {
    /// Find the rotation and translation that move `mobile` onto `reference`
    /// with the smallest sum of squared distances.
    ///
    /// Points are paired by index, so both slices must have the same length.
    pub fn fit(reference: &[na::Vector3<f64>], mobile: &[na::Vector3<f64>]) -> Result<Self> {
        if reference.len() != mobile.len() {
            return Err(Error::LengthMismatch {
                reference: reference.len(),
                mobile: mobile.len(),
            });
        }
        if reference.is_empty() {
            return Err(Error::EmptySelection);
        }

        let mut fixed = coords_matrix(reference);
        let mut moving = coords_matrix(mobile);
        let fixed_center = fixed.column_mean();
        let moving_center = moving.column_mean();
        for i in 0..fixed.ncols() {
            fixed.set_column(i, &(fixed.column(i) - fixed_center));
            moving.set_column(i, &(moving.column(i) - moving_center));
        }

        // Cross-covariance of the centered sets
        let covariance: na::Matrix3<f64> = &moving * fixed.transpose();
        let svd = covariance.svd(true, true);
        let u = svd.u.ok_or(Error::Svd)?;
        let v = svd.v_t.ok_or(Error::Svd)?.transpose();

        let mut correction = na::Matrix3::<f64>::identity();
        if (v * u.transpose()).determinant() < 0.0 {
            correction[(2, 2)] = -1.0;
        }
        let rotation = v * correction * u.transpose();
        let translation = fixed_center - rotation * moving_center;

        let mut fitted = Self {
            rotation,
            translation,
            rmsd: 0.0,
        };
        fitted.rmsd = fitted.rmsd_to(reference, mobile);
        Ok(fitted)
    }

    /// Transform a single point.
    pub fn apply(&self, point: &na::Vector3<f64>) -> na::Vector3<f64> {
        self.rotation * point + self.translation
    }

    /// Transform a `(x, y, z)` tuple as used by [`pdbtbx::Atom::pos`].
    pub fn apply_tuple(&self, point: (f64, f64, f64)) -> (f64, f64, f64) {
        let moved = self.apply(&na::Vector3::new(point.0, point.1, point.2));
        (moved.x, moved.y, moved.z)
    }

    /// Distance between each reference point and its transformed mobile partner.
    pub fn deviations(
        &self,
        reference: &[na::Vector3<f64>],
        mobile: &[na::Vector3<f64>],
    ) -> Vec<f64> {
        reference
            .iter()
            .zip(mobile)
            .map(|(r, m)| (self.apply(m) - r).norm())
            .collect()
    }

    fn rmsd_to(&self, reference: &[na::Vector3<f64>], mobile: &[na::Vector3<f64>]) -> f64 {
        let sum_sq: f64 = self
            .deviations(reference, mobile)
            .iter()
            .map(|d| d * d)
            .sum();
        (sum_sq / reference.len() as f64).sqrt()
    }
}
