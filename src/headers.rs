// File: headers.rs
// SPDX-License-Identifier: MIT OR Apache-2.0
//
// Copyright (c) 2023-2025
// - Volker Schwaberow <volker@schwaberow.de>

use log::debug;
use once_cell::sync::Lazy;
use rand::rngs::{OsRng, StdRng};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION, REFERER,
    USER_AGENT,
};

pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.2478.51",
];

const REFERERS: &[&str] = &[
    "https://www.google.com/",
    "https://yandex.ru/",
    "https://www.bing.com/",
    "https://duckduckgo.com/",
];

const ACCEPT_VALUE: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE_VALUE: &str = "ru-RU,ru;q=0.8,en-US;q=0.5,en;q=0.3";

static FALLBACK_HEADERS: Lazy<HeaderMap> = Lazy::new(|| {
    let mut headers = base_headers();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENTS[0]));
    headers
});

/// Builds a fresh browser-like header set. Falls back to a fixed set when the
/// OS randomness source cannot be read.
pub fn random_headers() -> HeaderMap {
    let mut seed = <StdRng as SeedableRng>::Seed::default();
    match OsRng.try_fill_bytes(&mut seed) {
        Ok(()) => headers_with(&mut StdRng::from_seed(seed)),
        Err(e) => {
            debug!("Randomness unavailable, using fallback headers: {}", e);
            fallback_headers()
        }
    }
}

pub fn fallback_headers() -> HeaderMap {
    FALLBACK_HEADERS.clone()
}

pub fn headers_with<R: Rng + ?Sized>(rng: &mut R) -> HeaderMap {
    let mut headers = base_headers();

    let agent = USER_AGENTS.choose(rng).copied().unwrap_or(USER_AGENTS[0]);
    headers.insert(USER_AGENT, HeaderValue::from_static(agent));

    if rng.gen_bool(0.5) {
        if let Some(referer) = REFERERS.choose(rng) {
            headers.insert(REFERER, HeaderValue::from_static(*referer));
        }
    }
    if rng.gen_bool(0.5) {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    }

    headers
}

fn base_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
    headers
}
