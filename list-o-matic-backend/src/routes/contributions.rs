use http::StatusCode;
use serde::Deserialize;
use uuid::Uuid;

use super::{json, markdown, ok, AppResult, RouteContext};

/// `?group=<uuid>&application=<uuid>`
#[derive(Deserialize)]
pub struct StartContribution {
    group: Uuid,
    application: Uuid,
}

pub fn start(cx: &RouteContext<'_>, list: Uuid) -> AppResult {
    let request: StartContribution = cx.query()?;
    let current = cx
        .registry
        .start_contribution(list, request.group, request.application)?;
    json(StatusCode::OK, &current)
}

/// Answers with the finished contribution, `null` if nobody was speaking.
pub fn stop(cx: &RouteContext<'_>, list: Uuid) -> AppResult {
    json(StatusCode::OK, &cx.registry.stop_contribution(list)?)
}

pub fn reset(cx: &RouteContext<'_>, list: Uuid) -> AppResult {
    cx.registry.reset_history(list)?;
    ok()
}

pub fn time_distribution(cx: &RouteContext<'_>, list: Uuid) -> AppResult {
    json(
        StatusCode::OK,
        &cx.registry.time_distribution(list, cx.caller)?,
    )
}

pub fn report(cx: &RouteContext<'_>, list: Uuid) -> AppResult {
    markdown(cx.registry.report(list)?)
}
