pub mod cascade_face_detector;
pub mod lbp_cascade;
pub mod preprocess;
