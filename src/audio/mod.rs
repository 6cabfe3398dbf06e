pub mod decode;
pub mod frame;
pub mod playback;
pub mod tap;
