//! # Crop Modal Module
//!
//! Sessione interattiva di crop del thumbnail.
//!
//! ## Ciclo di vita:
//! 1. `open()`: decodifica l'immagine e crea lo stato di crop
//! 2. `pan()` / `set_zoom()` / `rotate()`: modificano la geometria
//! 3. `confirm()`: rasterizza la regione e restituisce UN solo `ThumbnailBlob`,
//!    poi chiude la modal
//! 4. `cancel()`: scarta lo stato senza effetti collaterali
//!
//! Se la rasterizzazione fallisce l'errore viene loggato e la modal resta
//! aperta con lo stesso stato, pronta per un nuovo tentativo.

use crate::crop::state::{CropState, PixelRegion, Rotation};
use crate::error::UploadError;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, ColorType, DynamicImage, GenericImageView};
use std::path::Path;
use tracing::{debug, error};

/// Thumbnail JPEG prodotto dalla conferma del crop
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailBlob {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ThumbnailBlob {
    pub const MIME: &'static str = "image/jpeg";
    pub const FILE_NAME: &'static str = "thumbnail.jpg";

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

struct OpenCrop {
    source: DynamicImage,
    state: CropState,
}

/// Interactive crop surface for a single source image
pub struct CropModal {
    open: Option<OpenCrop>,
    quality: u8,
}

impl CropModal {
    /// Open the modal on an already decoded image
    pub fn open(source: DynamicImage, aspect: f64, quality: u8) -> Result<Self, UploadError> {
        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            return Err(UploadError::Crop("Source image has no pixels".to_string()));
        }
        if !aspect.is_finite() || aspect <= 0.0 {
            return Err(UploadError::Crop(format!("Invalid aspect ratio: {}", aspect)));
        }

        debug!("Opened crop modal on {}x{} image (aspect {:.3})", width, height, aspect);

        Ok(Self {
            open: Some(OpenCrop {
                source,
                state: CropState::new(width, height, aspect),
            }),
            quality: quality.clamp(1, 100),
        })
    }

    /// Decode an image file and open the modal on it
    pub fn open_path(path: &Path, aspect: f64, quality: u8) -> Result<Self, UploadError> {
        let source = image::open(path)?;
        Self::open(source, aspect, quality)
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Current geometry, if the modal is open
    pub fn state(&self) -> Option<&CropState> {
        self.open.as_ref().map(|open| &open.state)
    }

    fn state_mut(&mut self) -> Result<&mut CropState, UploadError> {
        self.open
            .as_mut()
            .map(|open| &mut open.state)
            .ok_or_else(|| UploadError::Crop("Crop modal is closed".to_string()))
    }

    pub fn pan(&mut self, dx: f64, dy: f64) -> Result<(), UploadError> {
        self.state_mut()?.pan(dx, dy);
        Ok(())
    }

    pub fn set_offset(&mut self, x: f64, y: f64) -> Result<(), UploadError> {
        self.state_mut()?.set_offset(x, y);
        Ok(())
    }

    pub fn set_zoom(&mut self, zoom: f64) -> Result<(), UploadError> {
        self.state_mut()?.set_zoom(zoom);
        Ok(())
    }

    /// Rotate by a further 90°
    pub fn rotate(&mut self) -> Result<Rotation, UploadError> {
        Ok(self.state_mut()?.rotate())
    }

    /// Rasterize the selected region; closes the modal only on success
    pub fn confirm(&mut self) -> Result<ThumbnailBlob, UploadError> {
        let open = self
            .open
            .as_ref()
            .ok_or_else(|| UploadError::Crop("Crop modal is closed".to_string()))?;

        let region = open.state.pixel_region();
        match rasterize(&open.source, open.state.rotation(), region, self.quality) {
            Ok(blob) => {
                debug!(
                    "Cropped thumbnail {}x{} at ({}, {}), {} bytes",
                    blob.width,
                    blob.height,
                    region.x,
                    region.y,
                    blob.len()
                );
                self.open = None;
                Ok(blob)
            }
            Err(e) => {
                error!("Error creating cropped image: {}", e);
                Err(UploadError::Crop(format!("Failed to crop image: {}", e)))
            }
        }
    }

    /// Discard the crop state without producing anything
    pub fn cancel(&mut self) {
        if self.open.take().is_some() {
            debug!("Crop cancelled");
        }
    }
}

/// Rotate, crop at native resolution, encode as JPEG
fn rasterize(
    source: &DynamicImage,
    rotation: Rotation,
    region: PixelRegion,
    quality: u8,
) -> Result<ThumbnailBlob, UploadError> {
    let rotated = match rotation {
        Rotation::Deg0 => source.to_rgb8(),
        Rotation::Deg90 => imageops::rotate90(&source.to_rgb8()),
        Rotation::Deg180 => imageops::rotate180(&source.to_rgb8()),
        Rotation::Deg270 => imageops::rotate270(&source.to_rgb8()),
    };

    let cropped =
        imageops::crop_imm(&rotated, region.x, region.y, region.width, region.height).to_image();
    let (width, height) = cropped.dimensions();

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality).encode(
        cropped.as_raw(),
        width,
        height,
        ColorType::Rgb8,
    )?;

    Ok(ThumbnailBlob { bytes, width, height })
}
