use http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use super::{created, json, ok, AppResult, RouteContext};

#[derive(Deserialize)]
pub struct CreateApplication {
    name: String,
}

pub fn all(cx: &RouteContext<'_>, list: Uuid, group: Uuid) -> AppResult {
    json(
        StatusCode::OK,
        &cx.registry.applications(list, group, cx.caller)?,
    )
}

pub fn create(cx: &RouteContext<'_>, list: Uuid, group: Uuid) -> AppResult {
    let request: CreateApplication = cx.json_body()?;
    created(
        cx.registry
            .create_application(list, group, &request.name, cx.caller)?,
    )
}

pub fn delete(cx: &RouteContext<'_>, list: Uuid, group: Uuid, application: Uuid) -> AppResult {
    cx.registry
        .delete_application(list, group, application, cx.caller)?;
    ok()
}
