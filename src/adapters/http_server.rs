//! ESP-IDF HTTP server adapter.
//!
//! Handlers run on the httpd task and never touch light state: each
//! request is flattened into a [`ControlRequest`], pushed through the
//! [`RequestBridge`], and answered with whatever the control loop posts
//! back (or `503` on timeout).  `POST /update` is the exception; firmware
//! upload is streamed straight into an [`OtaManager`] on the httpd task.

use core::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::anyhow;
use esp_idf_svc::http::server::{Configuration as HttpConfiguration, EspHttpConnection, EspHttpServer, Request};
use esp_idf_svc::http::{Headers, Method as EspMethod};
use esp_idf_svc::io::{Read, Write};
use log::info;

use crate::control::bridge::RESPONSE_TIMEOUT_MS;
use crate::control::{ControlRequest, HttpResponse, Method, RequestBridge};
use crate::ota::{self, OtaError, OtaManager};

/// Largest control payload accepted; bigger bodies are truncated.
const MAX_BODY: usize = 2048;
const OTA_CHUNK: usize = 1024;
const UPDATE_TOKEN_HEADER: &str = "X-Update-Token";

/// Set while an upload is being streamed.
static UPDATE_BUSY: AtomicBool = AtomicBool::new(false);

type HttpRequest<'r, 'c> = Request<&'r mut EspHttpConnection<'c>>;

fn method_of(m: EspMethod) -> Method {
    match m {
        EspMethod::Get => Method::Get,
        EspMethod::Put => Method::Put,
        EspMethod::Post => Method::Post,
        EspMethod::Delete => Method::Delete,
        _ => Method::Other,
    }
}

fn read_body(req: &mut HttpRequest<'_, '_>) -> anyhow::Result<String> {
    let len = (req.content_len().unwrap_or(0) as usize).min(MAX_BODY);
    let mut body = vec![0u8; len];
    if len > 0 {
        req.read_exact(&mut body).map_err(|e| anyhow!("body read failed: {e:?}"))?;
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

fn write_response(req: HttpRequest<'_, '_>, resp: &HttpResponse) -> anyhow::Result<()> {
    req.into_response(resp.status, None, &[("Content-Type", resp.content_type.as_str())])?
        .write_all(resp.body.as_bytes())?;
    Ok(())
}

/// Forward one request through the bridge and write the loop's answer.
fn forward(bridge: &'static RequestBridge, mut req: HttpRequest<'_, '_>) -> anyhow::Result<()> {
    let method = method_of(req.method());
    let body = read_body(&mut req)?;
    let control = ControlRequest::new(method, req.uri(), body);
    let resp = bridge.round_trip(control, RESPONSE_TIMEOUT_MS, |ms| {
        std::thread::sleep(Duration::from_millis(u64::from(ms)))
    });
    write_response(req, &resp)
}

fn ota_status(e: OtaError) -> u16 {
    match e {
        OtaError::AuthFailed => 401,
        OtaError::AlreadyInProgress => 409,
        OtaError::InvalidSize => 400,
        _ => 500,
    }
}

/// Stream the request body into the inactive partition.
fn receive_update(req: &mut HttpRequest<'_, '_>, mgr: &mut OtaManager, token: &str) -> Result<(), OtaError> {
    ota::authorize(token, req.header(UPDATE_TOKEN_HEADER)).map_err(|e| {
        ota::report(e);
        e
    })?;

    // oversized lengths saturate so the session rejects and logs them
    let size = req.content_len().unwrap_or(0);
    mgr.begin(u32::try_from(size).unwrap_or(u32::MAX))?;

    let mut buf = [0u8; OTA_CHUNK];
    loop {
        let n = match req.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(_) => return Err(mgr.connection_lost()),
        };
        mgr.write(&buf[..n])?;
    }
    mgr.finalize()
}

fn handle_update(mut req: HttpRequest<'_, '_>, token: &str) -> anyhow::Result<()> {
    if UPDATE_BUSY.swap(true, Ordering::AcqRel) {
        ota::report(OtaError::AlreadyInProgress);
        return write_response(req, &HttpResponse::text(ota_status(OtaError::AlreadyInProgress), "FAIL"));
    }

    let mut mgr = OtaManager::new();
    let result = receive_update(&mut req, &mut mgr, token);
    UPDATE_BUSY.store(false, Ordering::Release);

    match result {
        Ok(()) => {
            write_response(req, &HttpResponse::text(200, "OK"))?;
            std::thread::sleep(Duration::from_millis(1000));
            mgr.reboot();
        }
        Err(e) => write_response(req, &HttpResponse::text(ota_status(e), "FAIL")),
    }
}

/// Register every control route and the update endpoint.
///
/// The returned server must be kept alive for as long as requests should
/// be served.
pub fn start(bridge: &'static RequestBridge, update_token: &str) -> anyhow::Result<EspHttpServer<'static>> {
    let conf = HttpConfiguration {
        stack_size: 16 * 1024,
        uri_match_wildcard: true,
        ..Default::default()
    };
    let mut server = EspHttpServer::new(&conf)?;

    let routes: [(&str, EspMethod); 7] = [
        ("/detect", EspMethod::Get),
        ("/state", EspMethod::Get),
        ("/state", EspMethod::Put),
        ("/", EspMethod::Get),
        ("/", EspMethod::Post),
        ("/reset", EspMethod::Get),
        ("/factory", EspMethod::Get),
    ];
    for (path, method) in routes {
        server.fn_handler::<anyhow::Error, _>(path, method, move |req| forward(bridge, req))?;
    }

    let token: heapless::String<32> = update_token.try_into().map_err(|_| anyhow!("update token too long"))?;
    server.fn_handler::<anyhow::Error, _>("/update", EspMethod::Post, move |req| handle_update(req, &token))?;

    // registered last so it only sees what nothing else matched
    for method in [EspMethod::Get, EspMethod::Put, EspMethod::Post, EspMethod::Delete] {
        server.fn_handler::<anyhow::Error, _>("/*", method, move |req| forward(bridge, req))?;
    }

    info!("HTTP: server started");
    Ok(server)
}
