use serde::Serialize;

/// Five-point facial landmarks: [left_eye, right_eye, nose, left_mouth, right_mouth].
pub type Landmarks = [(f32, f32); 5];

/// Bounding box for a detected face, with optional facial landmarks.
#[derive(Debug, Clone)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    pub landmarks: Option<Landmarks>,
}

impl BoundingBox {
    /// A box covering the whole image, used when detection is skipped or not enforced.
    pub fn whole_image(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            confidence: 0.0,
            landmarks: None,
        }
    }

    /// Integer pixel region clamped to the image bounds.
    pub fn region(&self, img_width: u32, img_height: u32) -> FacialArea {
        let x = self.x.max(0.0).round() as u32;
        let y = self.y.max(0.0).round() as u32;
        let x = x.min(img_width.saturating_sub(1));
        let y = y.min(img_height.saturating_sub(1));
        let w = (self.width.max(1.0).round() as u32).min(img_width - x);
        let h = (self.height.max(1.0).round() as u32).min(img_height - y);
        FacialArea { x, y, w, h }
    }
}

/// Pixel region of a face inside its source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FacialArea {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Face embedding vector produced by a recognition model.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub values: Vec<f32>,
}

/// One detected face of an image together with its embedding.
#[derive(Debug, Clone)]
pub struct RepresentedFace {
    pub embedding: Embedding,
    pub area: FacialArea,
    pub confidence: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_clamps_to_image() {
        let bbox = BoundingBox {
            x: -5.0, y: 10.0, width: 200.0, height: 50.0,
            confidence: 0.9, landmarks: None,
        };
        let area = bbox.region(100, 100);
        assert_eq!(area, FacialArea { x: 0, y: 10, w: 100, h: 50 });
    }

    #[test]
    fn test_whole_image_has_zero_confidence() {
        let bbox = BoundingBox::whole_image(64, 48);
        assert_eq!(bbox.confidence, 0.0);
        assert_eq!(bbox.region(64, 48), FacialArea { x: 0, y: 0, w: 64, h: 48 });
    }
}
