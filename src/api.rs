//! Typed wrappers around the Tauri command bridge to the rendering backend.
//!
//! Every call is asynchronous and may fail; callers log failures and move on.
//! The backend uses camelCase argument names, so payload structs are serialized
//! through serde with that convention and handed over as a `JsValue`.

use js_sys::JSON;
use serde::Serialize;
use wasm_bindgen::prelude::wasm_bindgen;
use wasm_bindgen::JsValue;

use crate::transform::Transform;
use crate::types::{PreviewInfo, ViewportGeometry};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["window", "__TAURI__", "core"], js_name = invoke, catch)]
    async fn tauri_invoke(cmd: &str, args: JsValue) -> Result<JsValue, JsValue>;
}

fn to_args<T: Serialize>(args: &T) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(args).map_err(|err| JsValue::from_str(&err.to_string()))?;
    JSON::parse(&json)
}

fn from_value<T: serde::de::DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    let json = String::from(JSON::stringify(&value)?);
    serde_json::from_str(&json).map_err(|err| JsValue::from_str(&err.to_string()))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoadImageArgs<'a> {
    path: &'a str,
    preview_path: Option<&'a str>,
    viewport_x: f64,
    viewport_y: f64,
    viewport_width: f64,
    viewport_height: f64,
    defer_full_image_load: bool,
}

/// Begin a proxy-or-full decode for `path`. The backend answers with the
/// request id correlating all follow-up calls for this load.
pub async fn load_image(
    path: &str,
    preview_path: Option<&str>,
    geometry: ViewportGeometry,
    defer_full: bool,
) -> Result<u64, JsValue> {
    let args = to_args(&LoadImageArgs {
        path,
        preview_path,
        viewport_x: geometry.x,
        viewport_y: geometry.y,
        viewport_width: geometry.width,
        viewport_height: geometry.height,
        defer_full_image_load: defer_full,
    })?;
    let value = tauri_invoke("load_image", args).await?;
    value
        .as_f64()
        .map(|id| id as u64)
        .ok_or_else(|| JsValue::from_str("load_image returned a non-numeric request id"))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestArgs<'a> {
    path: &'a str,
    request_id: u64,
}

/// Promote a deferred load to a full-resolution decode.
pub async fn start_full_image_load(path: &str, request_id: u64) -> Result<(), JsValue> {
    let args = to_args(&RequestArgs { path, request_id })?;
    tauri_invoke("start_full_image_load", args).await?;
    Ok(())
}

/// Hot-swap the displayed texture for an in-flight request without a new load.
pub async fn swap_requested_texture(path: &str, request_id: u64) -> Result<(), JsValue> {
    let args = to_args(&RequestArgs { path, request_id })?;
    tauri_invoke("swap_requested_texture", args).await?;
    Ok(())
}

pub async fn update_viewport(geometry: ViewportGeometry) -> Result<(), JsValue> {
    let args = to_args(&geometry)?;
    tauri_invoke("update_viewport", args).await?;
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateTransformArgs {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

pub async fn update_transform(transform: Transform) -> Result<(), JsValue> {
    let args = to_args(&UpdateTransformArgs {
        scale: transform.scale,
        offset_x: transform.offset_x,
        offset_y: transform.offset_y,
    })?;
    tauri_invoke("update_transform", args).await?;
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PathArgs<'a> {
    path: &'a str,
}

/// Ask the backend to prepare a mid-resolution preview for `path`.
pub async fn prepare_preview(path: &str) -> Result<PreviewInfo, JsValue> {
    let args = to_args(&PathArgs { path })?;
    let value = tauri_invoke("prepare_preview", args).await?;
    from_value(value)
}

/// Fetch the cached thumbnail path for `path`, generating it if needed.
pub async fn get_thumbnail(path: &str) -> Result<String, JsValue> {
    let args = to_args(&PathArgs { path })?;
    let value = tauri_invoke("get_thumbnail", args).await?;
    value
        .as_string()
        .ok_or_else(|| JsValue::from_str("get_thumbnail returned a non-string path"))
}
