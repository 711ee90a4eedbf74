//! Resumable paginated fetching against the tracker's REST API.
//!
//! Each sub-query of a [`Request`] is paged independently: follow the
//! page's `next` pointer (after repairing the service's known URL
//! defect), accumulate items, and stop when the completion predicate is
//! satisfied. Completed results go to the weekly full cache; any abort
//! persists the accumulated items plus a resume cursor to the partial
//! cache first, so the failure is loud but the work is not lost.
//!
//! One transient page failure is retried once after a fixed delay.
//! Everything else aborts the whole multi-page operation; silently
//! dropping pages would undercount issues, which is worse than failing.

pub mod cache;
pub mod request;

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{MetricsError, Result};
use crate::metadata::{FIELD_CREATED, FIELD_STATUS_CHANGED, NEXT_URL_REWRITES};
use crate::model::lenient_i64;
use crate::util::time::three_months_before;

pub use cache::{FetchCache, PartialFetch};
pub use request::{
    FixedIssueListRequest, IssueListRequest, Request, SingleIssueRequest, UserCommentsRequest,
};

/// Hard cap on page requests per sub-query per invocation.
pub const MAX_PAGES: u32 = 200;

/// Delay before the single transient-failure retry.
const RETRY_DELAY: Duration = Duration::from_secs(10);

const APP_USER_AGENT: &str = concat!("tracker_metrics/", env!("CARGO_PKG_VERSION"));

/// One page of a list response.
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<Value>,
    pub next: Option<String>,
}

/// Delivers raw response bodies. Production uses blocking reqwest;
/// tests script it.
pub trait PageSource {
    /// GET a URL and return the body.
    ///
    /// # Errors
    ///
    /// Returns `TransientHttp` for 429/503, `HttpStatus` for any other
    /// non-2xx status, and `Http` for transport failures.
    fn get(&self, url: &str) -> Result<String>;
}

/// Blocking HTTP page source.
#[derive(Debug)]
pub struct HttpSource {
    client: reqwest::blocking::Client,
}

impl HttpSource {
    /// # Errors
    ///
    /// Returns an error if the client cannot be built.
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }
}

impl PageSource for HttpSource {
    fn get(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send()?;
        let status = response.status().as_u16();
        if status == 429 || status == 503 {
            return Err(MetricsError::TransientHttp {
                url: url.to_string(),
                status,
            });
        }
        if !response.status().is_success() {
            return Err(MetricsError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }
        Ok(response.text()?)
    }
}

/// When a multi-page fetch may stop.
#[derive(Debug, Clone, Copy)]
pub enum Completion {
    /// Follow `next` until the service stops offering one.
    Exhaustive,
    /// Stop once the oldest item on a page carries `field` at or before
    /// `cutoff` (the service returns newest first). Still stops early
    /// when `next` disappears.
    OlderThan { cutoff: i64, field: &'static str },
}

impl Completion {
    /// Bounded-recent completion: three months of status changes before
    /// `now`.
    #[must_use]
    pub fn recent_activity(now: DateTime<Utc>) -> Self {
        Self::OlderThan {
            cutoff: three_months_before(now),
            field: FIELD_STATUS_CHANGED,
        }
    }

    /// Bounded-recent completion for comment feeds, which sort by
    /// creation time rather than status changes.
    #[must_use]
    pub fn recent_comments(now: DateTime<Utc>) -> Self {
        Self::OlderThan {
            cutoff: three_months_before(now),
            field: FIELD_CREATED,
        }
    }

    fn satisfied(self, page: &Page) -> bool {
        if page.next.is_none() {
            return true;
        }
        match self {
            Self::Exhaustive => false,
            Self::OlderThan { cutoff, field } => {
                // An absent field or an empty page reads as zero, which
                // satisfies any cutoff.
                let oldest = page
                    .items
                    .last()
                    .and_then(|item| item.get(field))
                    .and_then(lenient_i64)
                    .unwrap_or(0);
                oldest <= cutoff
            }
        }
    }
}

/// Drives paginated retrieval with weekly caching and resume.
pub struct PagedFetcher<'s> {
    source: &'s dyn PageSource,
    cache: FetchCache,
    retry_delay: Duration,
}

impl<'s> PagedFetcher<'s> {
    #[must_use]
    pub fn new(source: &'s dyn PageSource, cache: FetchCache) -> Self {
        Self {
            source,
            cache,
            retry_delay: RETRY_DELAY,
        }
    }

    /// Shorten the transient-retry delay. Tests use zero.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Fetch every sub-query of `request`, using this week's full cache
    /// entries where present.
    ///
    /// # Errors
    ///
    /// Returns the first sub-query's fatal error; earlier sub-queries
    /// already cached stay cached.
    pub fn fetch(
        &self,
        request: &dyn Request,
        completion: Completion,
    ) -> Result<HashMap<String, Vec<Value>>> {
        info!(label = %request.label(), "fetching");
        let mut results = HashMap::new();
        for (key, url) in request.urls() {
            if let Some(items) = self.cache.read_full(&url)? {
                debug!(key, items = items.len(), "full cache hit");
                results.insert(key, items);
                continue;
            }
            let items = self.do_fetch(&key, &url, completion)?;
            results.insert(key, items);
        }
        Ok(results)
    }

    /// Load every sub-query from the full cache, touching nothing else.
    ///
    /// # Errors
    ///
    /// Returns `CacheMiss` naming the first absent sub-query.
    pub fn fetch_all_from_cache(&self, request: &dyn Request) -> Result<HashMap<String, Vec<Value>>> {
        let mut results = HashMap::new();
        for (key, url) in request.urls() {
            let items = self
                .cache
                .read_full(&url)?
                .ok_or_else(|| MetricsError::CacheMiss { query: key.clone() })?;
            results.insert(key, items);
        }
        Ok(results)
    }

    /// Page through one sub-query, resuming from a partial entry when
    /// one exists.
    fn do_fetch(&self, key: &str, url: &str, completion: Completion) -> Result<Vec<Value>> {
        let (mut items, mut page_index) = match self.cache.read_partial(url)? {
            Some(partial) => {
                info!(key, resume_page = partial.resume_page, "resuming partial fetch");
                (partial.items, partial.resume_page)
            }
            None => (Vec::new(), 0),
        };

        let mut page_url = page_parameter(url, page_index);
        let mut pages_fetched = 0u32;

        loop {
            if pages_fetched >= MAX_PAGES {
                self.cache.write_partial(
                    url,
                    &PartialFetch {
                        items,
                        resume_page: page_index,
                    },
                )?;
                return Err(MetricsError::PageCapReached {
                    query: key.to_string(),
                    pages: MAX_PAGES,
                });
            }

            let page = match self.fetch_page(&page_url) {
                Ok(page) => page,
                Err(err) => {
                    self.cache.write_partial(
                        url,
                        &PartialFetch {
                            items,
                            resume_page: page_index,
                        },
                    )?;
                    return Err(MetricsError::FetchAborted {
                        query: key.to_string(),
                        page: page_index,
                        source: Box::new(err),
                    });
                }
            };
            pages_fetched += 1;

            let done = completion.satisfied(&page);
            let next = page.next;
            items.extend(page.items);

            if done {
                debug!(key, pages = pages_fetched, items = items.len(), "fetch complete");
                self.cache.write_full(url, &items)?;
                return Ok(items);
            }

            // satisfied() only returns false while a next pointer exists
            let Some(next) = next else {
                self.cache.write_full(url, &items)?;
                return Ok(items);
            };
            page_url = rewrite_next_url(&next);
            page_index += 1;
        }
    }

    /// One page request with the single transient retry.
    fn fetch_page(&self, url: &str) -> Result<Page> {
        match self.try_page(url) {
            Ok(page) => Ok(page),
            Err(err) if err.is_transient() => {
                warn!(url, error = %err, "transient page failure, retrying once");
                thread::sleep(self.retry_delay);
                self.try_page(url)
            }
            Err(err) => Err(err),
        }
    }

    fn try_page(&self, url: &str) -> Result<Page> {
        let body = self.source.get(url)?;
        parse_page(url, &body)
    }
}

/// Parse a response body into a page. List endpoints wrap items in
/// `{list, next}`; single-object endpoints are normalized to a one-item
/// page with no `next`.
fn parse_page(url: &str, body: &str) -> Result<Page> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| MetricsError::PageParse {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let Value::Object(ref map) = value else {
        return Err(MetricsError::PageParse {
            url: url.to_string(),
            reason: "expected a JSON object".to_string(),
        });
    };

    if let Some(list) = map.get("list") {
        let Some(items) = list.as_array() else {
            return Err(MetricsError::PageParse {
                url: url.to_string(),
                reason: "'list' is not an array".to_string(),
            });
        };
        let next = map
            .get("next")
            .and_then(Value::as_str)
            .map(ToString::to_string);
        return Ok(Page {
            items: items.clone(),
            next,
        });
    }

    Ok(Page {
        items: vec![value],
        next: None,
    })
}

/// Repair the service's `next` URLs, which point at the HTML endpoint.
fn rewrite_next_url(next: &str) -> String {
    let mut url = next.to_string();
    for (defective, repaired) in NEXT_URL_REWRITES {
        url = url.replace(defective, repaired);
    }
    url
}

/// URL for a page index. Page zero is the bare URL.
fn page_parameter(url: &str, page: u32) -> String {
    if page == 0 {
        url.to_string()
    } else if url.contains('?') {
        format!("{url}&page={page}")
    } else {
        format!("{url}?page={page}")
    }
}
