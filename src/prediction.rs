use std::path::Path;

use tracing::{info, instrument};

use crate::api::PredictionApi;
use crate::error::{Error, Result};
use crate::models::ImagePrediction;

/// Read `image_path` and run it against `iteration_id`.
#[instrument(skip(api))]
pub async fn predict_file<P>(
    api: &P,
    project_id: &str,
    iteration_id: &str,
    image_path: &Path,
) -> Result<ImagePrediction>
where
    P: PredictionApi + ?Sized,
{
    let image = tokio::fs::read(image_path).await.map_err(|source| Error::Io {
        path: image_path.to_path_buf(),
        source,
    })?;
    let result = api.predict_image(project_id, iteration_id, image).await?;
    info!(detections = result.predictions.len(), "prediction received");
    Ok(result)
}

/// One line per detection, in the order the service returned them.
pub fn report_lines(result: &ImagePrediction) -> Vec<String> {
    result.predictions.iter().map(|p| p.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BoundingBox, Prediction};

    fn prediction(tag: &str, probability: f64) -> Prediction {
        Prediction {
            probability,
            tag_id: format!("{}-id", tag),
            tag_name: tag.into(),
            bounding_box: Some(BoundingBox {
                left: 0.1,
                top: 0.2,
                width: 0.3,
                height: 0.4,
            }),
        }
    }

    #[test]
    fn lines_keep_service_order_and_do_not_filter() {
        let result = ImagePrediction {
            id: "p".into(),
            project: "proj".into(),
            iteration: "it".into(),
            created: None,
            predictions: vec![
                prediction("Scissors", 0.0012),
                prediction("Fork", 0.9534),
                prediction("Fork", 0.5),
            ],
        };
        assert_eq!(
            report_lines(&result),
            vec![
                "Scissors: 0.12% 0.1,0.2,0.3,0.4",
                "Fork: 95.34% 0.1,0.2,0.3,0.4",
                "Fork: 50.00% 0.1,0.2,0.3,0.4",
            ]
        );
    }
}
