use http::StatusCode;
use list_o_matic_database::models::Attendee;
use uuid::Uuid;

use super::{created, json, ok, AppResult, RouteContext};

pub fn all(cx: &RouteContext<'_>, list: Uuid) -> AppResult {
    json(StatusCode::OK, &cx.registry.attendees(list, cx.caller)?)
}

pub fn one(cx: &RouteContext<'_>, list: Uuid, attendee: Uuid) -> AppResult {
    json(
        StatusCode::OK,
        &cx.registry.attendee(list, attendee, cx.caller)?,
    )
}

pub fn create(cx: &RouteContext<'_>, list: Uuid) -> AppResult {
    let attendee: Attendee = cx.json_body()?;
    created(cx.registry.create_attendee(list, attendee)?)
}

pub fn delete(cx: &RouteContext<'_>, list: Uuid, attendee: Uuid) -> AppResult {
    cx.registry.delete_attendee(list, attendee)?;
    ok()
}
