pub mod annotation_writer;
pub mod image_file_reader;
pub mod png_file_writer;
