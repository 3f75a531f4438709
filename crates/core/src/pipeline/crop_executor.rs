use std::path::PathBuf;
use std::sync::Arc;

use crate::pipeline::crop_faces_use_case::CropFacesUseCase;
use crate::pipeline::crop_report::CropReport;
use crate::pipeline::pipeline_logger::PipelineLogger;

/// Abstracts how a batch of inputs is pushed through [`CropFacesUseCase`].
///
/// Implementations must return one report entry per input, in input order,
/// whatever order the files actually finish in.
pub trait CropExecutor: Send {
    fn execute(
        &self,
        use_case: Arc<CropFacesUseCase>,
        inputs: &[PathBuf],
        logger: &mut dyn PipelineLogger,
    ) -> CropReport;
}
