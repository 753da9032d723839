//! Form body extraction
//!
//! Page handlers decide between a login redirect, a 404 and a re-rendered
//! form themselves, so a POST body must never reject the request before the
//! handler runs. [`FormData`] reads urlencoded and `multipart/form-data`
//! bodies and falls back to an empty form for anything it cannot read.

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::convert::Infallible;

/// Submitted form fields, defaulted when the body is missing or unreadable
#[derive(Debug, Clone, Default)]
pub struct FormData<T>(pub T);

impl<S, T> FromRequest<S> for FormData<T>
where
    T: DeserializeOwned + Default + Send,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let parsed = if is_multipart(&req) {
            read_multipart(req, state).await
        } else {
            Form::<T>::from_request(req, state)
                .await
                .map(|Form(value)| value)
                .map_err(|e| e.body_text())
        };

        Ok(Self(parsed.unwrap_or_else(|reason| {
            tracing::debug!("Unreadable form body, using empty form: {}", reason);
            T::default()
        })))
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim_start().starts_with("multipart/form-data"))
}

/// Collect the text fields of a multipart body. File parts are skipped.
async fn read_multipart<S, T>(req: Request, state: &S) -> Result<T, String>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    let mut multipart = Multipart::from_request(req, state)
        .await
        .map_err(|e| e.body_text())?;

    let mut fields = Map::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        if field.file_name().is_some() {
            continue;
        }
        let text = field.text().await.map_err(|e| e.to_string())?;
        fields.insert(name, Value::String(text));
    }

    serde_json::from_value(Value::Object(fields)).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Sample {
        #[serde(default)]
        title: String,
        #[serde(default)]
        slug: Option<String>,
    }

    async fn extract(content_type: Option<&str>, body: &str) -> Sample {
        let mut builder = axum::http::Request::builder().method("POST").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        let req = builder.body(Body::from(body.to_string())).unwrap();

        let FormData(sample) = FormData::<Sample>::from_request(req, &()).await.unwrap();
        sample
    }

    #[tokio::test]
    async fn test_urlencoded_body() {
        let sample = extract(
            Some("application/x-www-form-urlencoded"),
            "title=%D0%97%D0%B0%D0%B3%D0%BE%D0%BB%D0%BE%D0%B2%D0%BE%D0%BA&slug=note",
        )
        .await;
        assert_eq!(sample.title, "Заголовок");
        assert_eq!(sample.slug.as_deref(), Some("note"));
    }

    #[tokio::test]
    async fn test_multipart_body() {
        let body = "--XYZ\r\n\
                    Content-Disposition: form-data; name=\"title\"\r\n\r\n\
                    Заголовок\r\n\
                    --XYZ\r\n\
                    Content-Disposition: form-data; name=\"attachment\"; filename=\"a.txt\"\r\n\
                    Content-Type: text/plain\r\n\r\n\
                    ignored\r\n\
                    --XYZ--\r\n";
        let sample = extract(Some("multipart/form-data; boundary=XYZ"), body).await;
        assert_eq!(sample.title, "Заголовок");
        assert_eq!(sample.slug, None);
    }

    #[tokio::test]
    async fn test_missing_or_foreign_body_is_empty_form() {
        assert_eq!(extract(None, "").await, Sample::default());
        assert_eq!(extract(Some("application/json"), "{\"title\":\"x\"}").await, Sample::default());
        assert_eq!(
            extract(Some("multipart/form-data; boundary=XYZ"), "not multipart").await,
            Sample::default()
        );
    }
}
