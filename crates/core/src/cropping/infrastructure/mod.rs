pub mod frame_cropper;
