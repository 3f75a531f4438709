pub mod cropping;
pub mod detection;
pub mod imaging;
pub mod pipeline;
pub mod shared;
