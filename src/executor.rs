// File: executor.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use chrono::Utc;
use log::{debug, trace};
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{Response, StatusCode, Url};
use std::net::IpAddr;
use std::time::{Duration, Instant};

use crate::config::ConfigParameter;
use crate::errors::LoadResult;
use crate::failure::{describe, FailureKind};
use crate::headers::random_headers;
use crate::outcome::{OutcomeRecord, RequestMethod, ResponseData, DNS_FAILED};

pub const MAX_REDIRECTS: u32 = 10;

/// One concrete request: method, URL (with cache buster), form body and headers.
#[derive(Debug, Clone)]
pub struct RequestPlan {
    pub method: RequestMethod,
    pub url: Url,
    pub form: Vec<(String, String)>,
    pub headers: HeaderMap,
}

impl RequestPlan {
    /// Picks GET or POST according to `post_ratio` and fills in randomized
    /// query and form data.
    pub fn random(target: &Url, post_ratio: f64, cache_bust: bool) -> Self {
        let mut rng = rand::thread_rng();

        if rng.gen_bool(post_ratio) {
            let password: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(12)
                .map(char::from)
                .collect();
            let form = vec![
                (
                    "username".to_string(),
                    format!("user{}", rng.gen_range(1000..10000)),
                ),
                ("password".to_string(), password),
                (
                    "remember".to_string(),
                    (if rng.gen_bool(0.5) { "on" } else { "off" }).to_string(),
                ),
            ];
            RequestPlan {
                method: RequestMethod::Post,
                url: target.clone(),
                form,
                headers: random_headers(),
            }
        } else {
            let mut url = target.clone();
            if cache_bust {
                url.query_pairs_mut()
                    .append_pair("_", &rng.gen::<u64>().to_string());
            }
            RequestPlan {
                method: RequestMethod::Get,
                url,
                form: Vec::new(),
                headers: random_headers(),
            }
        }
    }

    pub fn get(target: &Url) -> Self {
        RequestPlan {
            method: RequestMethod::Get,
            url: target.clone(),
            form: Vec::new(),
            headers: random_headers(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    pub seconds: f64,
    pub ip: IpAddr,
}

/// Resolves the URL's host, bounded by `limit`. IP literals resolve instantly.
pub async fn resolve_host(url: &Url, limit: Duration) -> Result<Resolution, String> {
    let host = url
        .host_str()
        .ok_or_else(|| format!("{} has no host", url))?;

    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = bare.parse::<IpAddr>() {
        return Ok(Resolution { seconds: 0.0, ip });
    }

    let port = url.port_or_known_default().unwrap_or(80);
    let start = Instant::now();
    match tokio::time::timeout(limit, tokio::net::lookup_host((host, port))).await {
        Ok(Ok(mut addrs)) => match addrs.next() {
            Some(addr) => Ok(Resolution {
                seconds: start.elapsed().as_secs_f64(),
                ip: addr.ip(),
            }),
            None => Err(format!("no addresses found for {}", host)),
        },
        Ok(Err(e)) => Err(format!("failed to resolve {}: {}", host, e)),
        Err(_) => Err(format!(
            "resolution of {} timed out after {:.1}s",
            host,
            limit.as_secs_f64()
        )),
    }
}

pub fn build_client(config: &ConfigParameter) -> LoadResult<reqwest::Client> {
    let builder = reqwest::Client::builder()
        .connect_timeout(config.connect_timeout())
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(config.workers());

    let builder = match config.proxy() {
        Some(proxy) => builder.proxy(reqwest::Proxy::all(proxy)?),
        None => builder.no_proxy(),
    };

    Ok(builder.build()?)
}

/// Performs single requests against a shared client. `execute` never fails:
/// every problem is folded into the returned record.
#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: reqwest::Client,
    connect_timeout: Duration,
    request_timeout: Duration,
    post_ratio: f64,
    cache_bust: bool,
}

impl RequestExecutor {
    pub fn new(config: &ConfigParameter) -> LoadResult<Self> {
        Ok(RequestExecutor {
            client: build_client(config)?,
            connect_timeout: config.connect_timeout(),
            request_timeout: config.request_timeout(),
            post_ratio: config.post_ratio(),
            cache_bust: config.cache_bust(),
        })
    }

    pub async fn execute(&self, target: &Url, request_index: u64) -> OutcomeRecord {
        let plan = RequestPlan::random(target, self.post_ratio, self.cache_bust);
        self.execute_plan(plan, request_index).await
    }

    pub async fn execute_plan(&self, plan: RequestPlan, request_index: u64) -> OutcomeRecord {
        let started_at = Utc::now();
        let url = plan.url.to_string();

        let resolution = match resolve_host(&plan.url, self.connect_timeout).await {
            Ok(resolution) => resolution,
            Err(detail) => {
                debug!("#{} {}", request_index, detail);
                return OutcomeRecord::transport_failure(
                    request_index,
                    plan.method,
                    url,
                    started_at,
                    Some(DNS_FAILED),
                    None,
                    None,
                    FailureKind::Dns,
                    &detail,
                );
            }
        };
        let dns_seconds = Some(resolution.seconds);
        let server_ip = Some(resolution.ip);

        let start = Instant::now();
        let (response, redirect_count) = match self.send_following(&plan, start).await {
            Ok(sent) => sent,
            Err(e) => {
                let kind = FailureKind::from_reqwest(&e);
                let detail = describe(&e);
                debug!("#{} {} {}: {}", request_index, plan.method.as_str(), kind, detail);
                return OutcomeRecord::transport_failure(
                    request_index,
                    plan.method,
                    url,
                    started_at,
                    dns_seconds,
                    server_ip,
                    Some(start.elapsed().as_secs_f64()),
                    kind,
                    &detail,
                );
            }
        };

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();

        match response.bytes().await {
            Ok(body) => {
                trace!(
                    "#{} {} {} -> {} ({} bytes)",
                    request_index,
                    plan.method.as_str(),
                    url,
                    status_code,
                    body.len()
                );
                OutcomeRecord::from_response(
                    request_index,
                    plan.method,
                    url,
                    started_at,
                    dns_seconds,
                    server_ip,
                    ResponseData {
                        status_code,
                        elapsed_seconds: start.elapsed().as_secs_f64(),
                        response_bytes: body.len() as u64,
                        redirect_count,
                        final_url,
                    },
                )
            }
            Err(e) => {
                let kind = FailureKind::from_reqwest(&e);
                let detail = format!("Failed to read body: {}", describe(&e));
                debug!("#{} {}: {}", request_index, kind, detail);
                OutcomeRecord::transport_failure(
                    request_index,
                    plan.method,
                    url,
                    started_at,
                    dns_seconds,
                    server_ip,
                    Some(start.elapsed().as_secs_f64()),
                    kind,
                    &detail,
                )
            }
        }
    }

    /// Sends the plan and follows redirects by hand so the hops can be counted.
    /// All hops share one deadline of `request_timeout` measured from `start`.
    async fn send_following(
        &self,
        plan: &RequestPlan,
        start: Instant,
    ) -> Result<(Response, u32), reqwest::Error> {
        let mut url = plan.url.clone();
        let mut method = plan.method;
        let mut redirects = 0u32;

        loop {
            let remaining = self.request_timeout.saturating_sub(start.elapsed());
            let builder = match method {
                RequestMethod::Get => self.client.get(url.clone()),
                RequestMethod::Post => self.client.post(url.clone()).form(&plan.form),
            };
            let response = builder
                .headers(plan.headers.clone())
                .timeout(remaining)
                .send()
                .await?;

            let status = response.status();
            if status.is_redirection() && redirects < MAX_REDIRECTS {
                if let Some(next) = redirect_target(&response, &url) {
                    redirects += 1;
                    if matches!(
                        status,
                        StatusCode::MOVED_PERMANENTLY | StatusCode::FOUND | StatusCode::SEE_OTHER
                    ) {
                        method = RequestMethod::Get;
                    }
                    trace!("redirect {} -> {}", url, next);
                    url = next;
                    continue;
                }
            }

            return Ok((response, redirects));
        }
    }
}

fn redirect_target(response: &Response, current: &Url) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    current.join(location).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Url {
        Url::parse("https://example.com/login").unwrap()
    }

    #[test]
    fn test_plan_all_get_with_cache_bust() {
        for _ in 0..20 {
            let plan = RequestPlan::random(&target(), 0.0, true);
            assert_eq!(plan.method, RequestMethod::Get);
            assert!(plan.form.is_empty());
            assert!(plan.url.query_pairs().any(|(k, _)| k == "_"));
        }
    }

    #[test]
    fn test_plan_get_without_cache_bust() {
        let plan = RequestPlan::random(&target(), 0.0, false);
        assert_eq!(plan.url, target());
    }

    #[test]
    fn test_plan_all_post_has_form() {
        for _ in 0..20 {
            let plan = RequestPlan::random(&target(), 1.0, true);
            assert_eq!(plan.method, RequestMethod::Post);
            assert_eq!(plan.url, target());
            let keys: Vec<&str> = plan.form.iter().map(|(k, _)| k.as_str()).collect();
            assert_eq!(keys, vec!["username", "password", "remember"]);
            assert_eq!(plan.form[1].1.len(), 12);
            assert!(plan.form[0].1.starts_with("user"));
        }
    }

    #[test]
    fn test_plan_mix_roughly_follows_ratio() {
        let posts = (0..2000)
            .filter(|_| RequestPlan::random(&target(), 0.3, false).method == RequestMethod::Post)
            .count();
        assert!(posts > 400 && posts < 800, "got {} posts", posts);
    }

    #[tokio::test]
    async fn test_resolve_ip_literal() {
        let url = Url::parse("http://127.0.0.1:8080/").unwrap();
        let resolution = resolve_host(&url, Duration::from_secs(1)).await.unwrap();
        assert_eq!(resolution.seconds, 0.0);
        assert_eq!(resolution.ip, "127.0.0.1".parse::<IpAddr>().unwrap());
    }

    #[tokio::test]
    async fn test_resolve_ipv6_literal() {
        let url = Url::parse("http://[::1]:8080/").unwrap();
        let resolution = resolve_host(&url, Duration::from_secs(1)).await.unwrap();
        assert_eq!(resolution.ip, "::1".parse::<IpAddr>().unwrap());
    }

    #[tokio::test]
    async fn test_resolve_invalid_domain_fails() {
        let url = Url::parse("http://no-such-host.invalid/").unwrap();
        assert!(resolve_host(&url, Duration::from_secs(5)).await.is_err());
    }
}
