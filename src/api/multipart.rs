// Multipart upload extraction for the convert endpoint

use std::convert::Infallible;

use hyper::body::Bytes;

use crate::error::{ApiError, ApiResult};
use crate::geometry::OutputFormat;

/// The parts of a convert form the endpoint uses
#[derive(Debug)]
pub struct ConvertForm {
    pub file_name: String,
    pub content: Bytes,
    pub format: OutputFormat,
}

/// Pull the `file` part and `format` field out of a buffered multipart body.
///
/// A request that is not multipart, or has no `file` part with a file name,
/// has no file.
pub async fn read_convert_form(content_type: Option<&str>, body: Bytes) -> ApiResult<ConvertForm> {
    let boundary = content_type
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or(ApiError::NoFileProvided)?;

    let stream = futures::stream::once(async move { Ok::<Bytes, Infallible>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut file: Option<(String, Bytes)> = None;
    let mut format: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_string).unwrap_or_default();
                let content = field.bytes().await?;
                if !file_name.is_empty() {
                    file = Some((file_name, content));
                }
            }
            Some("format") => format = Some(field.text().await?),
            // unknown parts are skipped by dropping them
            _ => {}
        }
    }

    let (file_name, content) = file.ok_or(ApiError::NoFileProvided)?;
    let format = match format {
        Some(f) => f.parse()?,
        None => OutputFormat::default(),
    };

    Ok(ConvertForm {
        file_name,
        content,
        format,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub const BOUNDARY: &str = "geoapi-test-boundary";

    /// (name, file name, content) parts -> (content type, body)
    pub fn form(parts: &[(&str, Option<&str>, &str)]) -> (String, Bytes) {
        let mut body = String::new();
        for (name, file_name, content) in parts {
            body.push_str(&format!("--{BOUNDARY}\r\n"));
            match file_name {
                Some(f) => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )),
                None => body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
                )),
            }
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        (
            format!("multipart/form-data; boundary={BOUNDARY}"),
            Bytes::from(body),
        )
    }

    #[tokio::test]
    async fn test_file_and_format() {
        let (ct, body) = form(&[
            ("format", None, "wkt"),
            ("file", Some("a.wkt"), "POINT(1 2)"),
        ]);
        let parsed = read_convert_form(Some(ct.as_str()), body).await.unwrap();
        assert_eq!(parsed.file_name, "a.wkt");
        assert_eq!(&parsed.content[..], b"POINT(1 2)");
        assert_eq!(parsed.format, OutputFormat::Wkt);
    }

    #[tokio::test]
    async fn test_default_format() {
        let (ct, body) = form(&[("file", Some("a.geojson"), "{}")]);
        let parsed = read_convert_form(Some(ct.as_str()), body).await.unwrap();
        assert_eq!(parsed.format, OutputFormat::GeoJson);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let (ct, body) = form(&[("format", None, "geojson")]);
        assert!(matches!(
            read_convert_form(Some(ct.as_str()), body).await,
            Err(ApiError::NoFileProvided)
        ));

        assert!(matches!(
            read_convert_form(Some("application/json"), Bytes::from_static(b"{}")).await,
            Err(ApiError::NoFileProvided)
        ));
        assert!(matches!(
            read_convert_form(None, Bytes::new()).await,
            Err(ApiError::NoFileProvided)
        ));
    }

    #[tokio::test]
    async fn test_unsupported_format() {
        let (ct, body) = form(&[
            ("file", Some("a.geojson"), "{}"),
            ("format", None, "kml"),
        ]);
        let err = read_convert_form(Some(ct.as_str()), body).await.unwrap_err();
        assert_eq!(err.to_string(), "Unsupported output format: kml");
    }
}
