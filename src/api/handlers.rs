// Geometry endpoint handlers module
// Each handler decodes its request, runs one geometry operation and wraps the
// result in its success envelope. Geometry work is CPU bound and runs on the
// blocking pool so it never stalls the connection tasks.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use serde::de::DeserializeOwned;

use super::multipart::read_convert_form;
use super::response::success;
use super::types::{
    AnalyzeRequest, AnalyzeResponse, BufferRequest, BufferResponse, ConvertResponse,
    HealthResponse, IntersectionRequest, IntersectionResponse, SimplifyRequest, SimplifyResponse,
    VoronoiRequest, VoronoiResponse, STATUS_SUCCESS,
};
use crate::error::{ApiError, ApiResult};
use crate::geometry::{self, simplify::vertex_count};
use crate::logger;

type ApiResponse = ApiResult<Response<Full<Bytes>>>;

fn decode<T: DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    Ok(serde_json::from_slice(body)?)
}

/// Run `work` on the blocking pool; a panicked task surfaces as an I/O error
async fn run_blocking<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> ApiResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Io(std::io::Error::other(e)))?
}

pub fn health() -> Response<Full<Bytes>> {
    success(&HealthResponse {
        status: "ok",
        message: "Geospatial API is running",
    })
}

pub async fn buffer(body: Bytes, debug: bool) -> ApiResponse {
    let req: BufferRequest = decode(&body)?;
    let geometry = geometry::parse_geometry(req.geometry.ok_or(ApiError::MissingInput("geometry"))?)?;
    logger::log_debug(debug, &format!("buffer: distance {} m", req.distance));

    let distance = req.distance;
    let buffered = run_blocking(move || geometry::buffer_meters(&geometry, distance)).await?;
    Ok(success(&BufferResponse {
        status: STATUS_SUCCESS,
        buffer: geometry::single_feature_collection(&buffered),
    }))
}

pub async fn simplify(body: Bytes, debug: bool) -> ApiResponse {
    let req: SimplifyRequest = decode(&body)?;
    let geometry = geometry::parse_geometry(req.geometry.ok_or(ApiError::MissingInput("geometry"))?)?;

    let tolerance = req.tolerance;
    let (geometry, simplified) = run_blocking(move || {
        let simplified = geometry::simplify(&geometry, tolerance)?;
        Ok((geometry, simplified))
    })
    .await?;
    logger::log_debug(
        debug,
        &format!(
            "simplify: tolerance {}, {} -> {} vertices",
            req.tolerance,
            vertex_count(&geometry),
            vertex_count(&simplified)
        ),
    );
    Ok(success(&SimplifyResponse {
        status: STATUS_SUCCESS,
        simplified: geometry::single_feature_collection(&simplified),
    }))
}

pub async fn intersection(body: Bytes) -> ApiResponse {
    let req: IntersectionRequest = decode(&body)?;
    let a = geometry::parse_geometry(req.geometry1.ok_or(ApiError::MissingInput("geometry1"))?)?;
    let b = geometry::parse_geometry(req.geometry2.ok_or(ApiError::MissingInput("geometry2"))?)?;

    let result = run_blocking(move || Ok(geometry::intersection(&a, &b))).await?;
    Ok(success(&IntersectionResponse {
        status: STATUS_SUCCESS,
        intersects: result.is_some(),
        intersection: result.as_ref().map(geometry::single_feature_collection),
    }))
}

pub async fn analyze(body: Bytes, debug: bool) -> ApiResponse {
    let req: AnalyzeRequest = decode(&body)?;
    let collection = req.geojson.ok_or(ApiError::MissingInput("geojson"))?;
    let features = geometry::parse_features(&collection)?;
    logger::log_debug(debug, &format!("analyze: {} features", features.len()));

    let statistics = run_blocking(move || geometry::analyze(&features)).await?;
    Ok(success(&AnalyzeResponse {
        status: STATUS_SUCCESS,
        statistics,
    }))
}

pub async fn convert(content_type: Option<&str>, body: Bytes, debug: bool) -> ApiResponse {
    let form = read_convert_form(content_type, body).await?;
    logger::log_debug(
        debug,
        &format!(
            "convert: {} ({} bytes) -> {:?}",
            form.file_name,
            form.content.len(),
            form.format
        ),
    );

    // staging and reading the upload is blocking file I/O
    let data = run_blocking(move || {
        geometry::convert_upload(&form.file_name, &form.content, form.format)
    })
    .await?;

    Ok(success(&ConvertResponse {
        status: STATUS_SUCCESS,
        data,
    }))
}

pub async fn voronoi(body: Bytes, debug: bool) -> ApiResponse {
    let req: VoronoiRequest = decode(&body)?;
    let points = req.points.ok_or(ApiError::MissingInput("points"))?;

    let count = points.len();
    let cells = run_blocking(move || geometry::voronoi(&points)).await?;
    logger::log_debug(
        debug,
        &format!("voronoi: {count} points, {} bounded cells", cells.features.len()),
    );
    Ok(success(&VoronoiResponse {
        status: STATUS_SUCCESS,
        voronoi: cells,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_blocking_leaves_runtime_thread() {
        let caller = std::thread::current().id();
        let worker = run_blocking(|| Ok(std::thread::current().id())).await.unwrap();
        assert_ne!(worker, caller);
    }

    #[tokio::test]
    async fn test_run_blocking_panic_is_io_error() {
        let err = run_blocking(|| -> ApiResult<()> { panic!("geometry task failed") })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Io(_)));
    }

    #[tokio::test]
    async fn test_run_blocking_passes_errors_through() {
        let err = run_blocking(|| -> ApiResult<()> { Err(ApiError::MissingInput("points")) })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::MissingInput("points")));
    }
}
