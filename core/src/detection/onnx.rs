//! ONNX Runtime backed detector for exported YOLOv8 models

use super::yolo::{decode_output, parse_labels};
use super::Detector;
use crate::error::{OrthoscanError, Result};
use crate::types::Detection;

use image::imageops::FilterType;
use image::DynamicImage;
use log::debug;
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Square input resolution used by the exported models
pub const DEFAULT_INPUT_SIZE: u32 = 640;

/// A YOLOv8 detection model loaded once and reused across report runs
pub struct OnnxDetector {
    session: Mutex<Session>,
    model_path: PathBuf,
    input_name: String,
    output_name: String,
    labels: Vec<String>,
    input_size: u32,
}

impl OnnxDetector {
    /// Loads the model and its class-name file
    pub fn from_files(model_path: &Path, labels_path: PathBuf) -> Result<Self> {
        let labels_text = std::fs::read_to_string(&labels_path).map_err(|e| {
            OrthoscanError::ModelLoad(format!(
                "cannot read labels {}: {}",
                labels_path.display(),
                e
            ))
        })?;
        let labels = parse_labels(&labels_text);

        let session = Session::builder()
            .and_then(|b| b.commit_from_file(model_path))
            .map_err(|e| {
                OrthoscanError::ModelLoad(format!(
                    "failed to create ONNX session for {}: {}",
                    model_path.display(),
                    e
                ))
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| OrthoscanError::ModelLoad("model declares no inputs".to_string()))?;
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| OrthoscanError::ModelLoad("model declares no outputs".to_string()))?;

        Ok(Self {
            session: Mutex::new(session),
            model_path: model_path.to_path_buf(),
            input_name,
            output_name,
            labels,
            input_size: DEFAULT_INPUT_SIZE,
        })
    }

    /// Builder: Override the square model input size
    pub fn with_input_size(mut self, size: u32) -> Self {
        self.input_size = size.max(32);
        self
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Resizes to the model input and lays pixels out as normalised NCHW
    fn preprocess(&self, image: &DynamicImage) -> Array4<f32> {
        let size = self.input_size;
        let resized = image
            .resize_exact(size, size, FilterType::Triangle)
            .to_rgb8();

        let mut tensor = Array4::<f32>::zeros((1, 3, size as usize, size as usize));
        for (x, y, pixel) in resized.enumerate_pixels() {
            for c in 0..3 {
                tensor[[0, c, y as usize, x as usize]] = pixel[c] as f32 / 255.0;
            }
        }
        tensor
    }
}

impl Detector for OnnxDetector {
    fn detect(&self, image: &DynamicImage, threshold: f32) -> Result<Vec<Detection>> {
        let input = self.preprocess(image);
        let input_tensor = TensorRef::from_array_view(input.view()).map_err(|e| {
            OrthoscanError::InvalidValue(format!("failed to convert input tensor: {}", e))
        })?;
        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let mut session = self.session.lock().map_err(|_| {
            OrthoscanError::InvalidValue(format!(
                "session lock poisoned for {}",
                self.model_path.display()
            ))
        })?;
        let outputs = session.run(inputs).map_err(|e| {
            OrthoscanError::InvalidValue(format!(
                "ONNX Runtime inference failed for {}: {}",
                self.model_path.display(),
                e
            ))
        })?;

        let (shape, data) = outputs[self.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .map_err(|e| {
                OrthoscanError::InvalidValue(format!(
                    "failed to extract output '{}': {}",
                    self.output_name, e
                ))
            })?;
        let dims: Vec<i64> = shape.iter().copied().collect();

        let scale = (
            image.width() as f32 / self.input_size as f32,
            image.height() as f32 / self.input_size as f32,
        );
        let detections = decode_output(
            &dims,
            data,
            &self.labels,
            threshold,
            scale,
            (image.width(), image.height()),
        )?;

        debug!(
            "{}: {} detections above {:.2}",
            self.model_path.display(),
            detections.len(),
            threshold
        );
        Ok(detections)
    }
}
