use crate::console::ConsoleMakeWriter;
use crate::is_development_install_type;
use js_sys::{Array, Function, Object, Promise, Reflect, Uint8Array};
use redirect_core::request::{RequestBody, UploadData};
use redirect_core::{
    BlockingResponse, Clock, InterceptedRequest, Interceptors, ListenerKind, LoggingConfig,
    NavigationHost, RedirectConfig, RedirectError, RequestDetails, RequestInterceptor,
    ResourceType,
};
use std::cell::RefCell;
use std::sync::Arc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = log)]
    fn console_log(line: &str);

    #[wasm_bindgen(catch, js_namespace = ["browser", "tabs"], js_name = update)]
    fn tabs_update(tab_id: i32, update_properties: &JsValue) -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["browser", "management"], js_name = getSelf)]
    fn management_get_self() -> Result<Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["browser", "webRequest", "onBeforeRequest"], js_name = addListener)]
    fn add_before_request_listener(
        callback: &Function,
        filter: &JsValue,
        extra_info_spec: &Array,
    ) -> Result<(), JsValue>;
}

thread_local! {
    static INTERCEPTORS: RefCell<Option<Interceptors<BrowserHost>>> = RefCell::new(None);
}

/// `Date.now()`; `SystemTime` is unavailable on `wasm32-unknown-unknown`.
struct JsClock;

impl Clock for JsClock {
    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}

/// Host backed by the WebExtension `tabs` API.
pub struct BrowserHost;

impl NavigationHost for BrowserHost {
    fn navigate_tab(&self, tab_id: i32, url: &str) -> Result<(), RedirectError> {
        let props = Object::new();
        Reflect::set(&props, &"url".into(), &JsValue::from_str(url))
            .map_err(|e| RedirectError::Navigation(format!("{:?}", e)))?;
        // Fire and forget: the listener has to answer before the update settles
        tabs_update(tab_id, &props).map_err(|e| RedirectError::Navigation(format!("{:?}", e)))?;
        Ok(())
    }
}

/// Install the interceptors and register both `onBeforeRequest` listeners.
///
/// `config_json` is an optional JSON interceptor config; defaults apply when absent.
#[wasm_bindgen]
pub fn start(config_json: Option<String>) -> Result<(), JsValue> {
    let config = match config_json {
        Some(json) => RedirectConfig::from_json_str(&json).map_err(to_js_error)?,
        None => RedirectConfig::default(),
    };

    let interceptors =
        Interceptors::with_clock(&config, BrowserHost, Arc::new(JsClock)).map_err(to_js_error)?;
    let listeners = interceptors.listeners();
    INTERCEPTORS.with(|state| *state.borrow_mut() = Some(interceptors));

    for listener in listeners {
        let kind = listener.kind;
        let callback =
            Closure::<dyn Fn(JsValue) -> JsValue>::new(move |details| on_before_request(kind, details));

        let urls: Array = listener.urls.iter().map(|u| JsValue::from_str(u)).collect();
        let filter = Object::new();
        Reflect::set(&filter, &"urls".into(), &urls)?;
        let extra: Array = listener
            .extra_info_spec
            .iter()
            .map(|s| JsValue::from_str(s))
            .collect();

        add_before_request_listener(callback.as_ref().unchecked_ref(), &filter, &extra)?;
        // Listeners live as long as the background page
        callback.forget();
    }

    detect_install_type()
}

/// Enables diagnostics once `management.getSelf()` reports a development install.
fn detect_install_type() -> Result<(), JsValue> {
    let on_info = Closure::<dyn FnMut(JsValue)>::new(|info: JsValue| {
        let development = Reflect::get(&info, &"installType".into())
            .ok()
            .and_then(|v| v.as_string())
            .map(|t| is_development_install_type(&t))
            .unwrap_or(false);
        if !development {
            return;
        }

        let _ = redirect_core::logging::init_logging_with_writer(
            &LoggingConfig::console().with_level("debug"),
            ConsoleMakeWriter::new(console_log),
        );
        INTERCEPTORS.with(|state| {
            if let Some(interceptors) = state.borrow_mut().as_mut() {
                interceptors.set_diagnostics(true);
            }
        });
        tracing::info!("Development install, diagnostics enabled");
    });

    let _ = management_get_self()?.then(&on_info);
    on_info.forget();
    Ok(())
}

fn on_before_request(kind: ListenerKind, details: JsValue) -> JsValue {
    let req = match read_details(&details) {
        Some(req) => req,
        None => return JsValue::UNDEFINED,
    };

    let response = INTERCEPTORS.with(|state| {
        state.borrow().as_ref().map(|interceptors| match kind {
            ListenerKind::Watch => interceptors.on_watch_request(&req),
            ListenerKind::Player => interceptors.on_player_request(&req),
        })
    });

    match response {
        Some(response) if !response.is_noop() => to_js_response(&response),
        _ => JsValue::UNDEFINED,
    }
}

fn read_details(details: &JsValue) -> Option<InterceptedRequest> {
    let request_id = get_string(details, "requestId")?;
    let url = get_string(details, "url")?;

    let request_body = Reflect::get(details, &"requestBody".into())
        .ok()
        .filter(|b| b.is_object())
        .map(|body| RequestBody {
            raw: read_raw_chunks(&body),
            error: get_string(&body, "error"),
        });

    let details = RequestDetails {
        request_id,
        url,
        method: get_string(details, "method").unwrap_or_else(|| "GET".to_string()),
        resource_type: get_string(details, "type")
            .map(|t| ResourceType::parse(&t))
            .unwrap_or_default(),
        tab_id: Reflect::get(details, &"tabId".into())
            .ok()
            .and_then(|v| v.as_f64())
            .map(|v| v as i32)
            .unwrap_or(-1),
        origin_url: get_string(details, "originUrl"),
        document_url: get_string(details, "documentUrl"),
        request_body,
    };
    Some(details.into())
}

fn read_raw_chunks(body: &JsValue) -> Option<Vec<UploadData>> {
    let raw = Reflect::get(body, &"raw".into()).ok()?;
    if !Array::is_array(&raw) {
        return None;
    }
    let chunks = Array::from(&raw)
        .iter()
        .map(|chunk| {
            let bytes = Reflect::get(&chunk, &"bytes".into())
                .ok()
                .filter(|b| !b.is_undefined() && !b.is_null())
                .map(|b| Uint8Array::new(&b).to_vec());
            UploadData { bytes }
        })
        .collect();
    Some(chunks)
}

fn get_string(obj: &JsValue, key: &str) -> Option<String> {
    Reflect::get(obj, &JsValue::from_str(key))
        .ok()
        .and_then(|v| v.as_string())
}

fn to_js_response(response: &BlockingResponse) -> JsValue {
    let result = Object::new();
    if let Some(url) = &response.redirect_url {
        let _ = Reflect::set(&result, &"redirectUrl".into(), &JsValue::from_str(url));
    }
    if response.cancel {
        let _ = Reflect::set(&result, &"cancel".into(), &JsValue::TRUE);
    }
    result.into()
}

fn to_js_error(err: RedirectError) -> JsValue {
    JsValue::from_str(&err.to_string())
}
