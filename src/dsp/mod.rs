pub mod analyser;
pub mod peak;
pub mod window;
