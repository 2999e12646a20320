use std::time::Duration;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, Response};

use reflex_core::csrf::CSRF_HEADER;
use reflex_core::report::{FinishRequest, ReportError, ResultsService, ServiceResponse};

fn transport(context: &str, err: JsValue) -> ReportError {
    ReportError::Transport(format!("{context}: {err:?}"))
}

/// Results service reached through `window.fetch`, relative to the page
/// origin.
pub struct FetchResultsService {
    window: web_sys::Window,
}

impl FetchResultsService {
    pub fn new(window: web_sys::Window) -> Self {
        Self { window }
    }

    fn build_request(&self, request: &FinishRequest) -> Result<Request, ReportError> {
        let headers = Headers::new().map_err(|e| transport("headers", e))?;
        headers
            .set("Content-Type", "application/json")
            .map_err(|e| transport("headers", e))?;
        if let Some(token) = &request.csrf_token {
            headers
                .set(CSRF_HEADER, token)
                .map_err(|e| transport("headers", e))?;
        }

        let init = RequestInit::new();
        init.set_method("POST");
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(&request.body()?));

        Request::new_with_str_and_init(&request.path, &init).map_err(|e| transport("request", e))
    }
}

impl ResultsService for FetchResultsService {
    async fn submit(&self, request: &FinishRequest) -> Result<ServiceResponse, ReportError> {
        let req = self.build_request(request)?;
        let value = JsFuture::from(self.window.fetch_with_request(&req))
            .await
            .map_err(|e| transport("fetch", e))?;
        let response: Response = value.dyn_into().map_err(|e| transport("response", e))?;
        let status = response.status();
        let text = response.text().map_err(|e| transport("body", e))?;
        let body = JsFuture::from(text)
            .await
            .map_err(|e| transport("body", e))?
            .as_string()
            .unwrap_or_default();
        Ok(ServiceResponse { status, body })
    }

    async fn backoff(&self, delay: Duration) {
        let window = self.window.clone();
        let millis = delay.as_millis().min(i32::MAX as u128) as i32;
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            let _ = window
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis);
        });
        let _ = JsFuture::from(promise).await;
    }
}
