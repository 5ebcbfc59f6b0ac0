//! The download endpoint: validation, dispatch, and best-effort fallback.
//!
//! This service never surfaces an error to the client: any classified
//! failure is logged and counted, and the caller is redirected to the
//! upstream bouncer so the download still succeeds, just unattributed.

use crate::attribution::{parse_query_no_escape, Validator};
use crate::handlers::{bouncer_url, DownloadParams, StubHandler, StubResponse};
use crate::infra::error::StubError;
use crate::infra::reporter::ErrorReporter;
use warp::http::header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use warp::http::{Response, StatusCode};
use warp::hyper::Body;

/// Cache lifetime for directly served installer bytes.
const DIRECT_CACHE_CONTROL: &str = "max-age=604800";

/// Top-level handler for `GET /`.
pub struct StubService {
    handler: StubHandler,
    validator: Validator,
    reporter: ErrorReporter,
    bouncer_base_url: String,
}

impl StubService {
    #[must_use]
    pub fn new(
        handler: StubHandler,
        validator: Validator,
        reporter: ErrorReporter,
        bouncer_base_url: &str,
    ) -> Self {
        Self {
            handler,
            validator,
            reporter,
            bouncer_base_url: bouncer_base_url.to_string(),
        }
    }

    /// Serve one download request given its raw query string and Referer
    /// header.
    pub async fn serve(&self, raw_query: &str, referer: &str) -> Response<Body> {
        let query = parse_query_no_escape(raw_query);
        let params = DownloadParams {
            product: query.get("product").to_string(),
            os: query.get("os").to_string(),
            lang: query.get("lang").to_string(),
        };

        let attribution_code = query.get("attribution_code");
        let code = match self.validator.validate(
            attribution_code,
            query.get("attribution_sig"),
            referer,
        ) {
            Ok(code) => code,
            Err(err) => {
                self.handle_error(
                    &StubError::from(err),
                    &params,
                    raw_query,
                    trim_to_len(attribution_code, 200),
                );
                return self.redirect_bouncer(&params);
            }
        };

        log::info!(
            "download_started dltoken={} visit_id={} client_id={} client_id_ga4={} session_id={} dlsource={} product={} os={} lang={}",
            code.download_token(),
            code.visit_id(),
            code.client_id,
            code.client_id_ga4,
            code.session_id,
            code.download_source,
            params.product,
            params.os,
            params.lang,
        );

        let response = match self.handler.serve_stub(&params, &code).await {
            Ok(StubResponse::Direct { body, content_type }) => {
                let length = body.len();
                Response::builder()
                    .status(StatusCode::OK)
                    .header(CACHE_CONTROL, DIRECT_CACHE_CONTROL)
                    .header(CONTENT_TYPE, content_type)
                    .header(CONTENT_LENGTH, length)
                    .body(Body::from(body))
                    .expect("direct response build")
            }
            Ok(StubResponse::Redirect { location }) => redirect(&location),
            Err(err) => {
                self.handle_error(&err, &params, raw_query, attribution_code);
                return self.redirect_bouncer(&params);
            }
        };

        log::info!(
            "download_finished dltoken={} visit_id={} client_id={} client_id_ga4={} session_id={} dlsource={} product={} os={} lang={}",
            code.download_token(),
            code.visit_id(),
            code.client_id,
            code.client_id_ga4,
            code.session_id,
            code.download_source,
            params.product,
            params.os,
            params.lang,
        );

        response
    }

    fn handle_error(&self, err: &StubError, params: &DownloadParams, raw_query: &str, code: &str) {
        let error_type = err.error_type();
        metrics::counter!("request.error", "error_type" => error_type).increment(1);

        match error_type {
            "fetchstub" => log::error!(
                "stub request failed error_type={error_type} error={err} status_code={} fetch_stub_url={} product={} os={} lang={}",
                err.fetch_status().unwrap_or_default(),
                err.fetch_url().unwrap_or_default(),
                params.product,
                params.os,
                params.lang,
            ),
            _ => log::error!(
                "stub request failed error_type={error_type} error={err} code={code} product={} os={} lang={}",
                params.product,
                params.os,
                params.lang,
            ),
        }

        self.reporter
            .capture_message(&err.to_string(), &format!("/?{raw_query}"));
    }

    fn redirect_bouncer(&self, params: &DownloadParams) -> Response<Body> {
        redirect(&bouncer_url(
            &params.product,
            &params.lang,
            &params.os,
            &self.bouncer_base_url,
        ))
    }
}

/// A 302 Found with the given location.
#[must_use]
pub fn redirect(location: &str) -> Response<Body> {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, location)
        .body(Body::empty())
        .expect("redirect response build")
}

fn trim_to_len(s: &str, max: usize) -> &str {
    if s.len() <= max {
        s
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        &s[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_to_len_respects_char_boundaries() {
        assert_eq!(trim_to_len("short", 200), "short");
        assert_eq!(trim_to_len("abcdef", 3), "abc");
        // 'é' is two bytes; trimming inside it backs off
        assert_eq!(trim_to_len("aé", 2), "a");
    }

    #[test]
    fn redirect_builds_302() {
        let response = redirect("https://example.com/next");
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(LOCATION).unwrap(),
            "https://example.com/next"
        );
    }
}
