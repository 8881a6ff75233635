//! The recursive unit of crawl work
//!
//! A [`CrawlTask`] is "crawl this one URL to this remaining depth, before this
//! deadline". Visiting a task either stops at one of its entry checks or parses
//! the page, merges its words into the shared [`CrawlState`] and yields one
//! child task per discovered link. A URL reached again with more depth than
//! before yields its cached links again instead of being re-parsed.

use crate::crawler::parser::{PageParser, ParsedPage};
use crate::state::{Claim, CrawlState};
use crate::{CrawlError, ParseError};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;

/// Everything the tasks of one crawl share
pub(crate) struct CrawlContext<P> {
    pub parser: Arc<P>,
    pub state: CrawlState,
    /// Bounds the number of parse calls in flight
    pub permits: Semaphore,
    pub parse_timeout: Option<Duration>,
    /// Visit children inline, depth-first, instead of spawning them
    pub sequential: bool,
}

/// Why a task stopped without fanning out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Skip {
    DepthExhausted,
    DeadlinePassed,
    Excluded,
    AlreadyVisited,
    /// Deeper arrival while the page is still being parsed
    ParseInFlight,
}

/// One URL to crawl, with the depth budget and deadline it inherited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    url: String,
    remaining_depth: u32,
    deadline: Instant,
}

impl CrawlTask {
    pub fn new(url: impl Into<String>, remaining_depth: u32, deadline: Instant) -> Self {
        Self {
            url: url.into(),
            remaining_depth,
            deadline,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn remaining_depth(&self) -> u32 {
        self.remaining_depth
    }

    /// Runs this task and its whole subtree
    ///
    /// In sequential mode the subtree is walked with [`depth_first`];
    /// otherwise every child runs as its own runtime task.
    pub(crate) fn run<P: PageParser>(
        self,
        ctx: Arc<CrawlContext<P>>,
    ) -> BoxFuture<'static, Result<(), CrawlError>> {
        async move {
            if ctx.sequential {
                return depth_first(vec![self], &ctx).await;
            }

            let children = self.visit_guarded(&ctx).await?;
            join_all(children, &ctx).await
        }
        .boxed()
    }

    /// Visits this task's URL, turning a panic into [`CrawlError::TaskFailed`]
    async fn visit_guarded<P: PageParser>(
        &self,
        ctx: &CrawlContext<P>,
    ) -> Result<Vec<CrawlTask>, CrawlError> {
        match AssertUnwindSafe(self.visit(ctx)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!("Crawl task for {} panicked: {}", self.url, message);
                Err(CrawlError::TaskFailed {
                    url: self.url.clone(),
                    message,
                })
            }
        }
    }

    /// Runs the entry checks and the parse, and returns the child tasks
    async fn visit<P: PageParser>(
        &self,
        ctx: &CrawlContext<P>,
    ) -> Result<Vec<CrawlTask>, CrawlError> {
        if self.remaining_depth == 0 {
            return Ok(self.skipped(Skip::DepthExhausted));
        }

        let (links, depth) = {
            let _permit = ctx
                .permits
                .acquire()
                .await
                .map_err(|e| CrawlError::TaskFailed {
                    url: self.url.clone(),
                    message: e.to_string(),
                })?;

            // Checked after the permit so time spent queued counts against the deadline
            if Instant::now() >= self.deadline {
                return Ok(self.skipped(Skip::DeadlinePassed));
            }
            if ctx.state.is_excluded(&self.url) {
                return Ok(self.skipped(Skip::Excluded));
            }

            match ctx.state.try_claim(&self.url, self.remaining_depth) {
                Claim::Covered => return Ok(self.skipped(Skip::AlreadyVisited)),
                Claim::Deeper(None) => return Ok(self.skipped(Skip::ParseInFlight)),
                Claim::Deeper(Some(links)) => {
                    tracing::debug!(
                        "Revisiting links of {} with remaining depth {}",
                        self.url,
                        self.remaining_depth
                    );
                    (links, self.remaining_depth)
                }
                Claim::First => {
                    tracing::debug!(
                        "Parsing {} (remaining depth {})",
                        self.url,
                        self.remaining_depth
                    );

                    let links: Arc<[String]> = match self.parse(ctx).await {
                        Ok(page) => {
                            ctx.state.merge(&page.word_counts);
                            page.links.into()
                        }
                        Err(e) => {
                            // The URL stays claimed so it is not retried within this crawl
                            tracing::warn!("Failed to parse {}: {}", self.url, e);
                            Arc::from(Vec::new())
                        }
                    };
                    let depth = ctx.state.record_links(&self.url, Arc::clone(&links));
                    (links, depth)
                }
            }
        };

        // Children at depth 0 would stop at their first check
        if links.is_empty() || depth <= 1 {
            return Ok(Vec::new());
        }

        tracing::trace!("{} links {} pages", self.url, links.len());

        Ok(links
            .iter()
            .map(|link| CrawlTask::new(link.clone(), depth - 1, self.deadline))
            .collect())
    }

    async fn parse<P: PageParser>(&self, ctx: &CrawlContext<P>) -> Result<ParsedPage, ParseError> {
        let parse = ctx.parser.parse(&self.url);
        match ctx.parse_timeout {
            Some(limit) => tokio::time::timeout(limit, parse)
                .await
                .unwrap_or_else(|_| {
                    Err(ParseError::Timeout {
                        url: self.url.clone(),
                    })
                }),
            None => parse.await,
        }
    }

    fn skipped(&self, reason: Skip) -> Vec<CrawlTask> {
        tracing::trace!("Skipping {}: {:?}", self.url, reason);
        Vec::new()
    }
}

/// Visits every task and its descendants one at a time, depth-first
///
/// Pending tasks live on an explicit stack, so arbitrarily deep link chains
/// do not grow the call stack.
pub(crate) async fn depth_first<P: PageParser>(
    roots: Vec<CrawlTask>,
    ctx: &CrawlContext<P>,
) -> Result<(), CrawlError> {
    let mut pending: Vec<CrawlTask> = roots.into_iter().rev().collect();

    while let Some(task) = pending.pop() {
        let children = task.visit_guarded(ctx).await?;
        pending.extend(children.into_iter().rev());
    }

    Ok(())
}

/// Spawns every task onto the runtime and waits for all of them
///
/// The first failure is returned as soon as it is observed. Tasks still
/// running at that point are detached rather than aborted, and finish on
/// their own or at the deadline.
pub(crate) async fn join_all<P: PageParser>(
    tasks: Vec<CrawlTask>,
    ctx: &Arc<CrawlContext<P>>,
) -> Result<(), CrawlError> {
    let mut set = JoinSet::new();
    for task in tasks {
        set.spawn(task.run(Arc::clone(ctx)));
    }

    while let Some(joined) = set.join_next().await {
        let failure = match joined {
            Ok(Ok(())) => continue,
            Ok(Err(e)) => e,
            Err(join_error) => CrawlError::TaskFailed {
                url: String::from("<unknown>"),
                message: join_error.to_string(),
            },
        };
        set.detach_all();
        return Err(failure);
    }

    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
