//! Maps requests onto [`Registry`] operations.
//!
//! `/public/...` serves everybody and hides private lists, `/protected/...` requires
//! a privileged caller.

pub mod applications;
pub mod attendees;
pub mod contributions;
pub mod groups;
pub mod lists;

use bytes::Bytes;
use http::{header, Method, Response, StatusCode};
use http_body_util::Full;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::access::Caller;
use crate::error::AppError;
use crate::registry::Registry;

pub type AppResult = Result<Response<Full<Bytes>>, AppError>;

/// Everything a handler may look at besides the ids in the path.
pub struct RouteContext<'a> {
    pub registry: &'a Registry,
    pub caller: Caller,
    pub query: Option<&'a str>,
    pub body: &'a Bytes,
}

impl RouteContext<'_> {
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        Ok(serde_json::from_slice(self.body)?)
    }

    pub fn query<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        Ok(serde_urlencoded::from_str(self.query.unwrap_or_default())?)
    }
}

#[derive(Serialize)]
struct Created {
    uuid: Uuid,
}

pub fn route(method: &Method, path: &str, cx: &RouteContext<'_>) -> AppResult {
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
    match segments.as_slice() {
        ["public", "list", rest @ ..] => public(method.as_str(), rest, cx),
        ["protected", "list", rest @ ..] => {
            if !cx.caller.is_privileged() {
                return Err(AppError::Unauthorized);
            }
            protected(method.as_str(), rest, cx)
        }
        _ => Err(AppError::RouteNotFound),
    }
}

fn public(method: &str, path: &[&str], cx: &RouteContext<'_>) -> AppResult {
    match (path, method) {
        ([], "GET") => lists::all(cx),
        ([list], "GET") => lists::one(cx, id(list)?),
        ([list, "group"], "GET") => groups::all(cx, id(list)?),
        ([list, "group", group], "GET") => groups::one(cx, id(list)?, id(group)?),
        ([list, "time_distribution"], "GET") => {
            contributions::time_distribution(cx, id(list)?)
        }
        ([list, "group", group, "application"], "GET") => {
            applications::all(cx, id(list)?, id(group)?)
        }
        ([list, "group", group, "application"], "POST") => {
            applications::create(cx, id(list)?, id(group)?)
        }
        ([list, "group", group, "application", application], "DELETE") => {
            applications::delete(cx, id(list)?, id(group)?, id(application)?)
        }
        ([] | [_] | [_, "group" | "time_distribution"] | [_, "group", _], _)
        | ([_, "group", _, "application"] | [_, "group", _, "application", _], _) => {
            Err(AppError::MethodNotAllowed)
        }
        _ => Err(AppError::RouteNotFound),
    }
}

fn protected(method: &str, path: &[&str], cx: &RouteContext<'_>) -> AppResult {
    match (path, method) {
        ([], "GET") => lists::all(cx),
        ([], "POST") => lists::create(cx),
        ([list], "GET") => lists::one(cx, id(list)?),
        ([list], "DELETE") => lists::delete(cx, id(list)?),
        ([list, "visibility"], "POST") => lists::set_visibility(cx, id(list)?),
        ([list, "group"], "GET") => groups::all(cx, id(list)?),
        ([list, "group"], "POST") => groups::create(cx, id(list)?),
        ([list, "group", group], "GET") => groups::one(cx, id(list)?, id(group)?),
        ([list, "group", group], "DELETE") => groups::delete(cx, id(list)?, id(group)?),
        ([list, "group", group, "application"], "GET") => {
            applications::all(cx, id(list)?, id(group)?)
        }
        ([list, "group", group, "application"], "POST") => {
            applications::create(cx, id(list)?, id(group)?)
        }
        ([list, "group", group, "application", application], "DELETE") => {
            applications::delete(cx, id(list)?, id(group)?, id(application)?)
        }
        ([list, "start_contribution"], "GET") => contributions::start(cx, id(list)?),
        ([list, "stop_contribution"], "GET") => contributions::stop(cx, id(list)?),
        ([list, "reset_past_contributions"], "GET") => contributions::reset(cx, id(list)?),
        ([list, "time_distribution"], "GET") => {
            contributions::time_distribution(cx, id(list)?)
        }
        ([list, "mdreport"], "GET") => contributions::report(cx, id(list)?),
        ([list, "attendee"], "GET") => attendees::all(cx, id(list)?),
        ([list, "attendee"], "POST") => attendees::create(cx, id(list)?),
        ([list, "attendee", attendee], "GET") => attendees::one(cx, id(list)?, id(attendee)?),
        ([list, "attendee", attendee], "DELETE") => {
            attendees::delete(cx, id(list)?, id(attendee)?)
        }
        (
            []
            | [_]
            | [
                _,
                "visibility"
                | "group"
                | "start_contribution"
                | "stop_contribution"
                | "reset_past_contributions"
                | "time_distribution"
                | "mdreport"
                | "attendee",
            ]
            | [_, "group" | "attendee", _]
            | [_, "group", _, "application"]
            | [_, "group", _, "application", _],
            _,
        ) => Err(AppError::MethodNotAllowed),
        _ => Err(AppError::RouteNotFound),
    }
}

fn id(segment: &str) -> Result<Uuid, AppError> {
    Ok(Uuid::parse_str(segment)?)
}

pub fn json<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> AppResult {
    let body = serde_json::to_vec(value)?;
    Ok(Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.essence_str())
        .body(Full::new(Bytes::from(body)))?)
}

pub fn created(uuid: Uuid) -> AppResult {
    json(StatusCode::CREATED, &Created { uuid })
}

pub fn ok() -> AppResult {
    Ok(Response::builder()
        .status(StatusCode::OK)
        .body(Full::new(Bytes::new()))?)
}

pub fn markdown(text: String) -> AppResult {
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/markdown; charset=utf-8")
        .body(Full::new(Bytes::from(text)))?)
}
