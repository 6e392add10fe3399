//! Face alignment via 4-DOF similarity transform.
//!
//! Aligns detected faces to a canonical position using the five InsightFace
//! reference landmarks and least-squares estimation. The reference points are
//! defined for a 112×112 crop and scaled to whatever input size a model needs.

use crate::types::{BoundingBox, Landmarks};
use image::imageops::FilterType;
use image::{Rgb, RgbImage};

/// ArcFace reference landmarks for a 112×112 output.
const REFERENCE_LANDMARKS_112: Landmarks = [
    (38.2946, 51.6963), // left eye
    (73.5318, 51.5014), // right eye
    (56.0252, 71.7366), // nose
    (41.5493, 92.3655), // left mouth
    (70.7299, 92.2041), // right mouth
];

const REFERENCE_SIZE: f32 = 112.0;

/// Reference landmarks scaled to a `width`×`height` crop.
fn reference_landmarks(width: u32, height: u32) -> Landmarks {
    let sx = width as f32 / REFERENCE_SIZE;
    let sy = height as f32 / REFERENCE_SIZE;
    REFERENCE_LANDMARKS_112.map(|(x, y)| (x * sx, y * sy))
}

/// Estimate a 2×3 similarity transform (4-DOF: scale, rotation, translation)
/// from `src` landmarks to `dst` landmarks using least-squares.
///
/// Returns [a, -b, tx, b, a, ty] representing the matrix:
/// ```text
/// | a  -b  tx |
/// | b   a  ty |
/// ```
fn estimate_similarity_transform(src: &Landmarks, dst: &Landmarks) -> [f32; 6] {
    // Each point pair (sx, sy) -> (dx, dy) contributes two rows:
    //   sx * a - sy * b + tx = dx
    //   sy * a + sx * b + ty = dy
    let mut ata = [0.0f32; 16];
    let mut atb = [0.0f32; 4];

    for i in 0..5 {
        let (sx, sy) = src[i];
        let (dx, dy) = dst[i];

        let r1 = [sx, -sy, 1.0, 0.0];
        let r2 = [sy, sx, 0.0, 1.0];

        for j in 0..4 {
            for k in 0..4 {
                ata[j * 4 + k] += r1[j] * r1[k] + r2[j] * r2[k];
            }
            atb[j] += r1[j] * dx + r2[j] * dy;
        }
    }

    let x = solve_4x4(&ata, &atb);
    let (a, b, tx, ty) = (x[0], x[1], x[2], x[3]);

    [a, -b, tx, b, a, ty]
}

/// Solve a 4×4 linear system via Gaussian elimination with partial pivoting.
#[allow(clippy::needless_range_loop)]
fn solve_4x4(ata: &[f32; 16], atb: &[f32; 4]) -> [f32; 4] {
    let mut m = [[0.0f32; 5]; 4];
    for i in 0..4 {
        for j in 0..4 {
            m[i][j] = ata[i * 4 + j];
        }
        m[i][4] = atb[i];
    }

    for col in 0..4 {
        let mut max_row = col;
        let mut max_val = m[col][col].abs();
        for row in (col + 1)..4 {
            if m[row][col].abs() > max_val {
                max_val = m[row][col].abs();
                max_row = row;
            }
        }
        m.swap(col, max_row);

        let pivot = m[col][col];
        if pivot.abs() < 1e-12 {
            return [1.0, 0.0, 0.0, 0.0]; // degenerate landmarks: identity
        }

        for row in (col + 1)..4 {
            let factor = m[row][col] / pivot;
            for j in col..5 {
                m[row][j] -= factor * m[col][j];
            }
        }
    }

    let mut x = [0.0f32; 4];
    for i in (0..4).rev() {
        x[i] = m[i][4];
        for j in (i + 1)..4 {
            x[i] -= m[i][j] * x[j];
        }
        x[i] /= m[i][i];
    }

    x
}

/// Apply a 2×3 similarity warp to an RGB image, producing an `out_w`×`out_h` crop.
///
/// Uses bilinear interpolation. Out-of-bounds pixels are black.
fn warp_affine(src: &RgbImage, matrix: &[f32; 6], out_w: u32, out_h: u32) -> RgbImage {
    let (a, tx) = (matrix[0], matrix[2]);
    let (b, ty) = (matrix[3], matrix[5]);

    let mut output = RgbImage::new(out_w, out_h);

    // M = [[a, -b], [b, a]], det = a^2 + b^2
    let det = a * a + b * b;
    if det.abs() < 1e-12 {
        return output;
    }
    let ia = a / det;
    let ib = b / det;

    let (src_w, src_h) = (src.width() as i32, src.height() as i32);
    let sample = |x: i32, y: i32, c: usize| -> f32 {
        if x >= 0 && x < src_w && y >= 0 && y < src_h {
            src.get_pixel(x as u32, y as u32).0[c] as f32
        } else {
            0.0
        }
    };

    for oy in 0..out_h {
        for ox in 0..out_w {
            // src = M_inv * (dst - t)
            let dx = ox as f32 - tx;
            let dy = oy as f32 - ty;
            let sx = ia * dx + ib * dy;
            let sy = -ib * dx + ia * dy;

            let x0 = sx.floor() as i32;
            let y0 = sy.floor() as i32;
            let fx = sx - x0 as f32;
            let fy = sy - y0 as f32;

            let mut px = [0u8; 3];
            for (c, out) in px.iter_mut().enumerate() {
                let val = sample(x0, y0, c) * (1.0 - fx) * (1.0 - fy)
                    + sample(x0 + 1, y0, c) * fx * (1.0 - fy)
                    + sample(x0, y0 + 1, c) * (1.0 - fx) * fy
                    + sample(x0 + 1, y0 + 1, c) * fx * fy;
                *out = val.round().clamp(0.0, 255.0) as u8;
            }
            output.put_pixel(ox, oy, Rgb(px));
        }
    }

    output
}

/// Align a face to a canonical `width`×`height` crop from its five landmarks.
pub fn align_face(img: &RgbImage, landmarks: &Landmarks, width: u32, height: u32) -> RgbImage {
    let matrix = estimate_similarity_transform(landmarks, &reference_landmarks(width, height));
    warp_affine(img, &matrix, width, height)
}

/// Produce a `width`×`height` face crop: aligned when landmarks are known,
/// otherwise the bounding box region resized.
pub fn face_crop(img: &RgbImage, face: &BoundingBox, width: u32, height: u32) -> RgbImage {
    match &face.landmarks {
        Some(landmarks) => align_face(img, landmarks, width, height),
        None => {
            let area = face.region(img.width(), img.height());
            let cropped = image::imageops::crop_imm(img, area.x, area.y, area.w, area.h).to_image();
            image::imageops::resize(&cropped, width, height, FilterType::Triangle)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform() {
        let pts = REFERENCE_LANDMARKS_112;
        let m = estimate_similarity_transform(&pts, &pts);

        assert!((m[0] - 1.0).abs() < 1e-4, "a = {}", m[0]);
        assert!(m[1].abs() < 1e-4, "-b = {}", m[1]);
        assert!(m[2].abs() < 1e-3, "tx = {}", m[2]);
        assert!(m[3].abs() < 1e-4, "b = {}", m[3]);
        assert!((m[4] - 1.0).abs() < 1e-4, "a2 = {}", m[4]);
        assert!(m[5].abs() < 1e-3, "ty = {}", m[5]);
    }

    #[test]
    fn test_scaled_transform() {
        // Source landmarks at 2x scale → transform should have a ≈ 0.5
        let src = REFERENCE_LANDMARKS_112.map(|(x, y)| (x * 2.0, y * 2.0));
        let m = estimate_similarity_transform(&src, &REFERENCE_LANDMARKS_112);
        assert!((m[0] - 0.5).abs() < 0.05, "a = {}, expected ~0.5", m[0]);
    }

    #[test]
    fn test_reference_landmarks_scale_with_output() {
        let scaled = reference_landmarks(224, 224);
        assert!((scaled[0].0 - 2.0 * REFERENCE_LANDMARKS_112[0].0).abs() < 1e-4);
        assert!((scaled[4].1 - 2.0 * REFERENCE_LANDMARKS_112[4].1).abs() < 1e-4);
    }

    #[test]
    fn test_align_face_output_size() {
        let img = RgbImage::from_pixel(640, 480, Rgb([128, 128, 128]));
        let aligned = align_face(&img, &REFERENCE_LANDMARKS_112, 160, 160);
        assert_eq!(aligned.dimensions(), (160, 160));
    }

    #[test]
    fn test_landmark_roundtrip() {
        // A bright patch at the source left eye must land near the reference left eye.
        let mut img = RgbImage::new(200, 200);
        let src_landmarks: Landmarks = [
            (80.0, 60.0),
            (120.0, 60.0),
            (100.0, 85.0),
            (85.0, 110.0),
            (115.0, 110.0),
        ];
        for dy in 0..5 {
            for dx in 0..5 {
                img.put_pixel(78 + dx, 58 + dy, Rgb([255, 0, 0]));
            }
        }

        let aligned = align_face(&img, &src_landmarks, 112, 112);

        let ref_x = REFERENCE_LANDMARKS_112[0].0.round() as u32;
        let ref_y = REFERENCE_LANDMARKS_112[0].1.round() as u32;
        let mut max_red = 0u8;
        for y in ref_y - 1..=ref_y + 1 {
            for x in ref_x - 1..=ref_x + 1 {
                max_red = max_red.max(aligned.get_pixel(x, y).0[0]);
            }
        }
        assert!(max_red > 100, "expected bright patch near ({ref_x}, {ref_y}), max={max_red}");
    }

    #[test]
    fn test_face_crop_without_landmarks_resizes_region() {
        let img = RgbImage::from_pixel(100, 80, Rgb([10, 20, 30]));
        let face = BoundingBox {
            x: 10.0, y: 10.0, width: 40.0, height: 40.0,
            confidence: 0.9, landmarks: None,
        };
        let crop = face_crop(&img, &face, 47, 55);
        assert_eq!(crop.dimensions(), (47, 55));
        assert_eq!(crop.get_pixel(20, 20).0, [10, 20, 30]);
    }
}
