//! Route dispatch for the control surface.
//!
//! | Route | Method | Action |
//! |-------|--------|--------|
//! | `/detect` | any | device descriptor |
//! | `/state` | GET | requested state of one light |
//! | `/state` | PUT | apply per-light changes |
//! | `/` | any | query-form control, status document |
//! | `/reset` | any | restart |
//! | `/factory` | any | factory reset |
//!
//! Restart and factory reset are returned as [`SystemAction`]s; the control
//! loop runs them after the response has gone out.

use core::fmt::Write as _;

use log::{debug, warn};

use crate::app::commands::SystemAction;
use crate::app::ports::{EventSink, StoragePort};
use crate::app::service::LightService;
use crate::error::ControlError;

use super::payload::{parse_light_arg, parse_root_query, parse_state_update};
use super::request::{ControlRequest, HttpResponse, Method};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routed {
    pub response: HttpResponse,
    pub action: Option<SystemAction>,
}

impl Routed {
    fn reply(response: HttpResponse) -> Self {
        Self { response, action: None }
    }
}

pub fn dispatch(
    service: &mut LightService,
    req: &ControlRequest,
    store: &mut impl StoragePort,
    sink: &mut impl EventSink,
) -> Routed {
    debug!("{} {} ({} args)", req.method.as_str(), req.path, req.args.len());

    match (req.path.as_str(), req.method) {
        ("/detect", _) => Routed::reply(HttpResponse::json(200, &service.detect())),
        ("/state", Method::Get) => Routed::reply(get_state(service, req)),
        ("/state", Method::Put) => Routed::reply(put_state(service, req, store, sink)),
        ("/", _) => root(service, req, store, sink),
        ("/reset", _) => Routed {
            response: HttpResponse::text(200, "reset"),
            action: Some(SystemAction::Restart),
        },
        ("/factory", _) => Routed {
            response: HttpResponse::text(200, "factory reset"),
            action: Some(SystemAction::FactoryReset),
        },
        _ => Routed::reply(not_found(req)),
    }
}

fn get_state(service: &LightService, req: &ControlRequest) -> HttpResponse {
    match parse_light_arg(req).and_then(|idx| service.get_state(idx)) {
        Ok(state) => HttpResponse::json(200, &state),
        Err(e) => rejected(&e, e.to_string()),
    }
}

fn put_state(
    service: &mut LightService,
    req: &ControlRequest,
    store: &mut impl StoragePort,
    sink: &mut impl EventSink,
) -> HttpResponse {
    let result = parse_state_update(&req.body)
        .and_then(|(doc, changes)| service.set_state(&changes, store, sink).map(|()| doc));
    match result {
        Ok(doc) => HttpResponse::json(200, &doc),
        Err(e) => {
            warn!("PUT /state rejected: {e}");
            rejected(&e, format!("FAIL. {}", req.body))
        }
    }
}

fn root(
    service: &mut LightService,
    req: &ControlRequest,
    store: &mut impl StoragePort,
    sink: &mut impl EventSink,
) -> Routed {
    let result = parse_root_query(req).and_then(|cmd| service.apply_root(&cmd, store, sink));
    match result {
        Ok(action) => Routed {
            response: HttpResponse::json(200, &service.status()),
            action,
        },
        Err(e) => {
            warn!("/ rejected: {e}");
            Routed::reply(rejected(&e, e.to_string()))
        }
    }
}

/// `400` for bad input, `500` when the store failed.
fn rejected(e: &ControlError, body: String) -> HttpResponse {
    let status = if *e == ControlError::StorageFailed { 500 } else { 400 };
    HttpResponse::text(status, body)
}

fn not_found(req: &ControlRequest) -> HttpResponse {
    let mut msg = String::from("File Not Found\n\n");
    let _ = write!(
        msg,
        "URI: {}\nMethod: {}\nArguments: {}\n",
        req.path,
        req.method.as_str(),
        req.args.len()
    );
    for (name, value) in &req.args {
        let _ = writeln!(msg, " {name}: {value}");
    }
    HttpResponse::text(404, msg)
}
