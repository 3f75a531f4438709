pub mod crop_executor;
pub mod crop_faces_use_case;
pub mod crop_report;
pub mod crop_settings;
pub mod infrastructure;
pub mod output_naming;
pub mod pipeline_logger;
