//! APPEND request encoding.

use mediasend_protocol::constants::MEDIA_FIELD;
use mediasend_protocol::messages::FormFields;
use reqwest::multipart::{Form, Part};

use crate::error::UploadError;

/// Builds a `multipart/form-data` POST to `uri` carrying `fields` as text
/// parts and `chunk` as the binary `media` part. The boundary header is
/// set by the form.
pub fn encode_append(
    http: &reqwest::Client,
    uri: &str,
    fields: FormFields,
    chunk: Vec<u8>,
) -> Result<reqwest::Request, UploadError> {
    let media = Part::bytes(chunk)
        .mime_str("application/octet-stream")
        .map_err(|e| UploadError::Encode {
            reason: e.to_string(),
        })?;

    let form = fields
        .into_iter()
        .fold(Form::new(), |form, (name, value)| form.text(name, value))
        .part(MEDIA_FIELD, media);

    http.post(uri)
        .multipart(form)
        .build()
        .map_err(|e| UploadError::Encode {
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediasend_protocol::MediaId;
    use mediasend_protocol::messages::append_fields;
    use reqwest::header::CONTENT_TYPE;

    #[test]
    fn sets_multipart_boundary_header() {
        let http = reqwest::Client::new();
        let req = encode_append(
            &http,
            "http://127.0.0.1:9/upload",
            append_fields(MediaId::new(5), 0),
            vec![1, 2, 3],
        )
        .unwrap();

        assert_eq!(req.method(), reqwest::Method::POST);
        assert_eq!(req.url().as_str(), "http://127.0.0.1:9/upload");
        let ct = req.headers().get(CONTENT_TYPE).unwrap().to_str().unwrap();
        assert!(
            ct.starts_with("multipart/form-data; boundary="),
            "unexpected content type: {ct}"
        );
    }

    #[test]
    fn invalid_uri_is_encode_error() {
        let http = reqwest::Client::new();
        let err = encode_append(&http, "not a url", Vec::new(), vec![0]).unwrap_err();
        assert!(matches!(err, UploadError::Encode { .. }));
    }
}
