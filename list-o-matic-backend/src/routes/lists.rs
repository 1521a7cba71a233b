use http::StatusCode;
use list_o_matic_database::models::Visibility;
use serde::Deserialize;
use uuid::Uuid;

use super::{created, json, ok, AppResult, RouteContext};
use crate::registry::RegistryError;

#[derive(Deserialize)]
pub struct CreateList {
    name: String,
    #[serde(default)]
    visibility: Option<u8>,
}

#[derive(Deserialize)]
pub struct VisibilityUpdate {
    new_visibility: u8,
}

fn visibility(value: u8) -> Result<Visibility, RegistryError> {
    Ok(Visibility::try_from(value)?)
}

pub fn all(cx: &RouteContext<'_>) -> AppResult {
    json(StatusCode::OK, &cx.registry.list_all(cx.caller)?)
}

pub fn one(cx: &RouteContext<'_>, list: Uuid) -> AppResult {
    json(StatusCode::OK, &cx.registry.get_list(list, cx.caller)?)
}

pub fn create(cx: &RouteContext<'_>) -> AppResult {
    let request: CreateList = cx.json_body()?;
    let visibility = request
        .visibility
        .map(visibility)
        .transpose()?
        .unwrap_or_default();
    created(cx.registry.create_list(&request.name, visibility)?)
}

pub fn delete(cx: &RouteContext<'_>, list: Uuid) -> AppResult {
    cx.registry.delete_list(list)?;
    ok()
}

pub fn set_visibility(cx: &RouteContext<'_>, list: Uuid) -> AppResult {
    let request: VisibilityUpdate = cx.json_body()?;
    cx.registry
        .set_visibility(list, visibility(request.new_visibility)?)?;
    ok()
}
