pub const CASCADE_NAME: &str = "lbpcascade_animeface.xml";
pub const CASCADE_URL: &str =
    "https://raw.githubusercontent.com/nagadomi/lbpcascade_animeface/master/lbpcascade_animeface.xml";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp", "gif"];

/// Bytes per pixel of every [`Frame`](super::frame::Frame) (RGBA).
pub const FRAME_CHANNELS: u8 = 4;
