// File: common/mod.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2025
// - Volker Schwaberow <volker@schwaberow.de>

#![allow(dead_code)]

use stampede::config::ConfigParameter;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Mounts a GET handler on `route` answering `status` with `body` after `delay`.
pub async fn mount_get(server: &MockServer, route: &str, status: u16, body: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_string(body)
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

pub fn redirect_to(status: u16, location: &str) -> ResponseTemplate {
    ResponseTemplate::new(status).insert_header("location", location)
}

/// GET-only config with short timeouts and no file output.
pub fn test_config(target: &str, requests: u64, workers: usize) -> ConfigParameter {
    let mut config = ConfigParameter::new();
    config.set_target(target);
    config.set_requests(requests);
    config.set_workers(workers);
    config.set_post_ratio(0.0);
    config.set_connect_timeout(Duration::from_secs(2));
    config.set_read_timeout(Duration::from_secs(5));
    config.set_progress_interval(Duration::from_millis(50));
    config.set_no_save(true);
    config.set_suppress_stats(true);
    config
}

/// Config whose per-request deadline is 500 ms.
pub fn short_timeout_config(target: &str, requests: u64, workers: usize) -> ConfigParameter {
    let mut config = test_config(target, requests, workers);
    config.set_connect_timeout(Duration::from_millis(200));
    config.set_read_timeout(Duration::from_millis(300));
    config
}

/// Returns a loopback port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}
