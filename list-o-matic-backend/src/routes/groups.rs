use http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use super::{created, json, ok, AppResult, RouteContext};

#[derive(Deserialize)]
pub struct CreateGroup {
    name: String,
}

pub fn all(cx: &RouteContext<'_>, list: Uuid) -> AppResult {
    json(StatusCode::OK, &cx.registry.groups(list, cx.caller)?)
}

pub fn one(cx: &RouteContext<'_>, list: Uuid, group: Uuid) -> AppResult {
    json(StatusCode::OK, &cx.registry.group(list, group, cx.caller)?)
}

pub fn create(cx: &RouteContext<'_>, list: Uuid) -> AppResult {
    let request: CreateGroup = cx.json_body()?;
    created(cx.registry.create_group(list, &request.name)?)
}

pub fn delete(cx: &RouteContext<'_>, list: Uuid, group: Uuid) -> AppResult {
    cx.registry.delete_group(list, group)?;
    ok()
}
