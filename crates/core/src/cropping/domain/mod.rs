pub mod crop_mode;
pub mod region_deriver;
pub mod square_placement;
