pub mod threaded_crop_executor;
