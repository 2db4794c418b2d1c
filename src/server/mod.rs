//! HTTP surface.
//!
//! One resource, `/api/issues/{project}`, with the verb selecting the
//! operation. `route` does all the decoding and outcome mapping without
//! touching the network; `run`/`serve` wrap it in a hyper http1 server.

use crate::error::{DeskError, Result};
use crate::model::{IssueFields, IssueFilter};
use crate::service::IssueService;
use crate::storage::IssueStore;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use serde_json::{Value, json};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

const ISSUES_PREFIX: &str = "/api/issues/";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

type Shared<S> = Arc<Mutex<IssueService<S>>>;

/// Dispatch one decoded request to the service.
///
/// Returns the status and JSON body to send. Business outcomes, including
/// business errors, are always 200.
pub fn route<S: IssueStore>(
    service: &mut IssueService<S>,
    method: &Method,
    path: &str,
    query: Option<&str>,
    content_type: Option<&str>,
    body: &[u8],
) -> (StatusCode, Value) {
    let project = match project_from_path(path) {
        Ok(Some(project)) => project,
        Ok(None) => return (StatusCode::NOT_FOUND, json!({ "error": "not found" })),
        Err(err) => return render_error(&err),
    };

    match *method {
        Method::GET => match decode_filter(query) {
            Ok(filter) => render(service.list(&project, &filter)),
            Err(err) => render_error(&err),
        },
        Method::POST => match decode_fields(content_type, body) {
            Ok(fields) => render(service.create(&project, &fields)),
            Err(err) => render_error(&err),
        },
        Method::PUT => match decode_fields(content_type, body) {
            Ok(fields) => render(service.update(&project, &fields)),
            Err(err) => render_error(&err),
        },
        Method::DELETE => match decode_fields(content_type, body) {
            Ok(fields) => render(service.delete(&project, &fields)),
            Err(err) => render_error(&err),
        },
        _ => (
            StatusCode::METHOD_NOT_ALLOWED,
            json!({ "error": "method not allowed" }),
        ),
    }
}

/// Extract the percent-decoded project name.
///
/// `Ok(None)` means the path is not an issues resource.
fn project_from_path(path: &str) -> Result<Option<String>> {
    let Some(rest) = path.strip_prefix(ISSUES_PREFIX) else {
        return Ok(None);
    };
    let segment = rest.strip_suffix('/').unwrap_or(rest);
    if segment.is_empty() || segment.contains('/') {
        return Ok(None);
    }
    let project = urlencoding::decode(segment)
        .map_err(|e| DeskError::invalid_request(format!("project name: {e}")))?;
    Ok(Some(project.into_owned()))
}

/// Decode the query string; a repeated key keeps its last value.
fn decode_filter(query: Option<&str>) -> Result<IssueFilter> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query.unwrap_or_default())
        .map_err(|e| DeskError::invalid_request(format!("query string: {e}")))?;
    Ok(IssueFilter::from_pairs(pairs))
}

fn decode_fields(content_type: Option<&str>, body: &[u8]) -> Result<IssueFields> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(IssueFields::default());
    }
    let is_form = content_type.is_some_and(|ct| {
        ct.split(';')
            .next()
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
    });
    if is_form {
        serde_urlencoded::from_bytes(body)
            .map_err(|e| DeskError::invalid_request(format!("form body: {e}")))
    } else {
        serde_json::from_slice(body)
            .map_err(|e| DeskError::invalid_request(format!("JSON body: {e}")))
    }
}

fn render<T: Serialize>(outcome: Result<T>) -> (StatusCode, Value) {
    match outcome.and_then(|value| serde_json::to_value(value).map_err(DeskError::from)) {
        Ok(body) => (StatusCode::OK, body),
        Err(err) => render_error(&err),
    }
}

fn render_error(err: &DeskError) -> (StatusCode, Value) {
    if err.is_business() {
        return (StatusCode::OK, json!({ "error": err.to_string() }));
    }
    if let DeskError::InvalidRequest { reason } = err {
        debug!(%reason, "rejecting undecodable request");
        return (StatusCode::BAD_REQUEST, json!({ "error": err.to_string() }));
    }
    error!(error = %err, "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": "internal error" }),
    )
}

/// Bind `listen` and serve until interrupted.
///
/// # Errors
///
/// Returns an error if the address cannot be bound.
pub async fn run<S>(listen: SocketAddr, service: IssueService<S>) -> Result<()>
where
    S: IssueStore + Send + 'static,
{
    let listener = TcpListener::bind(listen).await?;
    info!("issue desk listening on {}", listener.local_addr()?);
    serve(listener, service).await
}

/// Serve connections from an already bound listener until Ctrl-C.
///
/// # Errors
///
/// Currently only returns when the shutdown signal arrives.
pub async fn serve<S>(listener: TcpListener, service: IssueService<S>) -> Result<()>
where
    S: IssueStore + Send + 'static,
{
    let shared: Shared<S> = Arc::new(Mutex::new(service));

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let shared = Arc::clone(&shared);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        let service = service_fn(move |req| {
                            let shared = Arc::clone(&shared);
                            async move { handle_request(shared, req).await }
                        });

                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                            warn!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                return Ok(());
            }
        }
    }
}

async fn handle_request<S>(
    shared: Shared<S>,
    req: Request<Incoming>,
) -> std::result::Result<Response<Full<Bytes>>, Infallible>
where
    S: IssueStore + Send + 'static,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    debug!("{} {}", method, path);

    let body = match req.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!("request body error: {}", e);
            return Ok(json_response(
                StatusCode::BAD_REQUEST,
                &json!({ "error": "failed to read request body" }),
            ));
        }
    };

    let routed = tokio::task::spawn_blocking(move || {
        let mut service = shared.lock().unwrap_or_else(PoisonError::into_inner);
        route(
            &mut *service,
            &method,
            &path,
            query.as_deref(),
            content_type.as_deref(),
            &body,
        )
    })
    .await;

    let (status, value) = routed.unwrap_or_else(|e| {
        error!("request handler panicked: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "error": "internal error" }),
        )
    });
    Ok(json_response(status, &value))
}

fn json_response(status: StatusCode, body: &Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn svc() -> IssueService<MemoryStore> {
        IssueService::new(MemoryStore::new())
    }

    fn json_body(value: &Value) -> Vec<u8> {
        value.to_string().into_bytes()
    }

    #[test]
    fn project_segment_is_decoded() {
        assert_eq!(
            project_from_path("/api/issues/my%20project").unwrap(),
            Some("my project".to_string())
        );
        assert_eq!(
            project_from_path("/api/issues/apitest/").unwrap(),
            Some("apitest".to_string())
        );
        assert_eq!(project_from_path("/api/issues/").unwrap(), None);
        assert_eq!(project_from_path("/api/issues/a/b").unwrap(), None);
        assert_eq!(project_from_path("/api/other/a").unwrap(), None);
    }

    #[test]
    fn unknown_paths_and_methods() {
        let mut service = svc();
        let (status, body) = route(&mut service, &Method::GET, "/nope", None, None, b"");
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "not found" }));

        let (status, _) = route(&mut service, &Method::PATCH, "/api/issues/p", None, None, b"");
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[test]
    fn business_errors_are_200() {
        let mut service = svc();
        let (status, body) = route(
            &mut service,
            &Method::POST,
            "/api/issues/p",
            None,
            Some("application/json"),
            &json_body(&json!({ "issue_title": "only a title" })),
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "error": "required field(s) missing" }));

        let (status, body) = route(&mut service, &Method::DELETE, "/api/issues/p", None, None, b"");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "error": "missing _id" }));
    }

    #[test]
    fn malformed_json_is_400() {
        let mut service = svc();
        let (status, body) = route(
            &mut service,
            &Method::PUT,
            "/api/issues/p",
            None,
            Some("application/json"),
            b"{not json",
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request"));
    }

    #[test]
    fn form_bodies_are_accepted() {
        let mut service = svc();
        let (status, body) = route(
            &mut service,
            &Method::POST,
            "/api/issues/p",
            None,
            Some("application/x-www-form-urlencoded; charset=UTF-8"),
            b"issue_title=Form&issue_text=From+a+form&created_by=me&assigned_to=",
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["issue_text"], "From a form");
        assert_eq!(body["assigned_to"], "");
        assert_eq!(body["open"], true);
    }

    #[test]
    fn list_reads_query_filters() {
        let mut service = svc();
        for text in ["a", "b", "a"] {
            route(
                &mut service,
                &Method::POST,
                "/api/issues/p",
                None,
                None,
                &json_body(&json!({ "issue_title": "t", "issue_text": text, "created_by": "me" })),
            );
        }
        let (status, body) = route(
            &mut service,
            &Method::GET,
            "/api/issues/p",
            Some("issue_title=t&issue_text=a"),
            None,
            b"",
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (_, body) = route(
            &mut service,
            &Method::GET,
            "/api/issues/p",
            Some("priority=high"),
            None,
            b"",
        );
        assert_eq!(body, json!([]));
    }

    #[test]
    fn repeated_query_keys_keep_the_last_value() {
        let mut service = svc();
        for title in ["t", "u"] {
            route(
                &mut service,
                &Method::POST,
                "/api/issues/p",
                None,
                None,
                &json_body(&json!({ "issue_title": title, "issue_text": "x", "created_by": "me" })),
            );
        }
        let (status, body) = route(
            &mut service,
            &Method::GET,
            "/api/issues/p",
            Some("issue_title=t&issue_title=t"),
            None,
            b"",
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["issue_title"], "t");

        let (status, body) = route(
            &mut service,
            &Method::GET,
            "/api/issues/p",
            Some("issue_title=t&issue_title=u"),
            None,
            b"",
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["issue_title"], "u");
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (status, body) = route(
            &mut service,
            &Method::GET,
            "/api/issues/p",
            Some("sort=asc&sort=desc"),
            None,
            b"",
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }
}
