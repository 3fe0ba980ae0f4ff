//! # Thumbnail Crop Module
//!
//! Pipeline di crop del thumbnail, separata in sottomoduli:
//! - `state`: Geometria del crop (pan, zoom, rotazione, regione in pixel)
//! - `modal`: Sessione interattiva che produce un singolo thumbnail JPEG

pub mod modal;
pub mod state;

pub use modal::{CropModal, ThumbnailBlob};
pub use state::{CropState, PixelRegion, Rotation, MAX_ZOOM, MIN_ZOOM};
