pub mod colormap;
pub mod raster;
pub mod surface;
pub mod text;
pub mod transform;
