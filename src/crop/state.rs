//! # Crop Geometry Module
//!
//! Geometria del crop del thumbnail, senza alcuna operazione sui pixel.
//!
//! ## Modello:
//! - L'immagine sorgente viene prima ruotata (0/90/180/270°)
//! - L'area di crop è il rettangolo più grande con l'aspect ratio richiesto
//!   che entra nell'immagine ruotata, diviso per lo zoom (1.0×–3.0×)
//! - L'area parte centrata e viene spostata dall'offset di pan, sempre
//!   limitato in modo che l'area resti dentro l'immagine
//!
//! ## Esempio:
//! ```rust,ignore
//! let mut state = CropState::new(1920, 1080, 16.0 / 9.0);
//! state.set_zoom(1.5);
//! state.rotate();
//! let region = state.pixel_region();
//! ```

use serde::Serialize;

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 3.0;

/// Rotazione in senso orario, a passi di 90°
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Next value in the 0 → 90 → 180 → 270 → 0 cycle
    pub fn next(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg90,
            Self::Deg90 => Self::Deg180,
            Self::Deg180 => Self::Deg270,
            Self::Deg270 => Self::Deg0,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// Whether the rotation swaps width and height
    pub fn is_sideways(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }
}

/// Rettangolo in pixel dell'immagine ruotata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Interactive crop geometry for one source image
#[derive(Debug, Clone, PartialEq)]
pub struct CropState {
    source_width: u32,
    source_height: u32,
    aspect: f64,
    offset_x: f64,
    offset_y: f64,
    zoom: f64,
    rotation: Rotation,
}

impl CropState {
    pub fn new(source_width: u32, source_height: u32, aspect: f64) -> Self {
        Self {
            source_width,
            source_height,
            aspect,
            offset_x: 0.0,
            offset_y: 0.0,
            zoom: MIN_ZOOM,
            rotation: Rotation::Deg0,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Current pan offset from the centred position, in rotated-image pixels
    pub fn offset(&self) -> (f64, f64) {
        (self.offset_x, self.offset_y)
    }

    /// Set zoom, clamped to [`MIN_ZOOM`, `MAX_ZOOM`]
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = if zoom.is_finite() {
            zoom.clamp(MIN_ZOOM, MAX_ZOOM)
        } else {
            MIN_ZOOM
        };
        self.clamp_offset();
    }

    /// Advance the rotation by 90° and return the new value
    pub fn rotate(&mut self) -> Rotation {
        self.rotation = self.rotation.next();
        self.clamp_offset();
        self.rotation
    }

    /// Set the absolute pan offset
    pub fn set_offset(&mut self, x: f64, y: f64) {
        self.offset_x = if x.is_finite() { x } else { 0.0 };
        self.offset_y = if y.is_finite() { y } else { 0.0 };
        self.clamp_offset();
    }

    /// Move the crop area by a relative amount
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.set_offset(self.offset_x + dx, self.offset_y + dy);
    }

    /// Dimensions of the source once rotated
    pub fn rotated_dimensions(&self) -> (u32, u32) {
        if self.rotation.is_sideways() {
            (self.source_height, self.source_width)
        } else {
            (self.source_width, self.source_height)
        }
    }

    /// Crop area size before rounding
    fn crop_size(&self) -> (f64, f64) {
        let (width, height) = self.rotated_dimensions();
        let (width, height) = (width as f64, height as f64);

        let (base_width, base_height) = if width / height > self.aspect {
            (height * self.aspect, height)
        } else {
            (width, width / self.aspect)
        };

        (base_width / self.zoom, base_height / self.zoom)
    }

    fn max_offset(&self) -> (f64, f64) {
        let (width, height) = self.rotated_dimensions();
        let (crop_width, crop_height) = self.crop_size();
        (
            ((width as f64 - crop_width) / 2.0).max(0.0),
            ((height as f64 - crop_height) / 2.0).max(0.0),
        )
    }

    fn clamp_offset(&mut self) {
        let (max_x, max_y) = self.max_offset();
        self.offset_x = self.offset_x.clamp(-max_x, max_x);
        self.offset_y = self.offset_y.clamp(-max_y, max_y);
    }

    /// Pixel region of the rotated image selected by the current geometry
    pub fn pixel_region(&self) -> PixelRegion {
        let (width, height) = self.rotated_dimensions();
        let (crop_width, crop_height) = self.crop_size();

        let region_width = (crop_width.round() as u32).clamp(1, width.max(1));
        let region_height = (crop_height.round() as u32).clamp(1, height.max(1));

        let left = (width as f64 - crop_width) / 2.0 + self.offset_x;
        let top = (height as f64 - crop_height) / 2.0 + self.offset_y;

        let x = (left.round().max(0.0) as u32).min(width.saturating_sub(region_width));
        let y = (top.round().max(0.0) as u32).min(height.saturating_sub(region_height));

        PixelRegion {
            x,
            y,
            width: region_width,
            height: region_height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_cycle_stays_in_set() {
        let mut rotation = Rotation::Deg0;
        let mut seen = Vec::new();
        for _ in 0..9 {
            rotation = rotation.next();
            seen.push(rotation.degrees());
        }
        assert_eq!(seen, vec![90, 180, 270, 0, 90, 180, 270, 0, 90]);
        assert!(seen.iter().all(|d| [0, 90, 180, 270].contains(d)));
    }

    #[test]
    fn test_zoom_is_bounded() {
        let mut state = CropState::new(1920, 1080, 16.0 / 9.0);
        state.set_zoom(0.2);
        assert_eq!(state.zoom(), MIN_ZOOM);
        state.set_zoom(7.0);
        assert_eq!(state.zoom(), MAX_ZOOM);
        state.set_zoom(f64::NAN);
        assert_eq!(state.zoom(), MIN_ZOOM);
        state.set_zoom(2.25);
        assert_eq!(state.zoom(), 2.25);
    }

    #[test]
    fn test_full_frame_region_without_zoom() {
        let state = CropState::new(1920, 1080, 16.0 / 9.0);
        assert_eq!(
            state.pixel_region(),
            PixelRegion { x: 0, y: 0, width: 1920, height: 1080 }
        );
    }

    #[test]
    fn test_region_with_zoom_and_rotation() {
        let mut state = CropState::new(1920, 1080, 16.0 / 9.0);
        state.set_zoom(1.5);
        assert_eq!(state.rotate(), Rotation::Deg90);

        // rotated image is 1080x1920: widest 16:9 box is 1080x607.5, zoomed to 720x405
        assert_eq!(state.rotated_dimensions(), (1080, 1920));
        let region = state.pixel_region();
        assert_eq!((region.width, region.height), (720, 405));
        assert_eq!(region.x, 180);
        assert_eq!(region.y, 758);
    }

    #[test]
    fn test_pan_is_clamped_inside_image() {
        let mut state = CropState::new(1920, 1080, 16.0 / 9.0);
        state.set_zoom(2.0);
        // crop is 960x540, so the centre can move at most 480 / 270 pixels
        state.pan(10_000.0, -10_000.0);
        assert_eq!(state.offset(), (480.0, -270.0));

        let region = state.pixel_region();
        assert_eq!(region, PixelRegion { x: 960, y: 0, width: 960, height: 540 });
    }

    #[test]
    fn test_zoom_out_reclamps_offset() {
        let mut state = CropState::new(1920, 1080, 16.0 / 9.0);
        state.set_zoom(3.0);
        state.set_offset(600.0, 300.0);
        state.set_zoom(1.0);
        assert_eq!(state.offset(), (0.0, 0.0));
    }

    #[test]
    fn test_tall_aspect_on_wide_source() {
        let state = CropState::new(1920, 1080, 9.0 / 16.0);
        let region = state.pixel_region();
        assert_eq!(region.height, 1080);
        assert_eq!(region.width, 608);
        assert_eq!(region.x, 656);
    }
}
