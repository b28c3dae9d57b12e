//! The post list adapter.
//!
//! [`PostListAdapter`] owns the backing sequence of posts and a pool of row
//! views. Network work runs on tokio tasks; every completion comes back as an
//! [`AdapterEvent`] on the channel handed to [`PostListAdapter::new`], and the
//! host applies it with [`PostListAdapter::handle_event`] from its own loop.
//! All adapter state is therefore only ever touched from that loop.
//!
//! # Row views and bindings
//!
//! `render_row` binds a row into a view, either a fresh one or a recycled one
//! whose previous row scrolled away. Each bind gets a new binding token and
//! the image request carries it. A request that completes after its view was
//! rebound is not cancelled, but its result is dropped when applied.

use crate::feed::{FeedClient, FetchError, ParseError, ParseReport};
use crate::image::{Bitmap, ImageError, ImageLoader, ImageSlot};
use crate::post::Post;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use url::Url;

/// Handle to a row view in the adapter's view pool.
pub type ViewId = usize;

/// Completions delivered from background tasks to the host loop.
#[derive(Debug)]
pub enum AdapterEvent {
    FeedLoaded(Result<ParseReport, FetchError>),
    /// Fields:
    /// - `view`: The view the request was issued for
    /// - `binding`: The view's binding token when the request was spawned
    /// - `url`: Resolved image URL
    /// - `result`: The decoded image or the error from fetching
    ImageLoaded {
        view: ViewId,
        binding: u64,
        url: Url,
        result: Result<Bitmap, ImageError>,
    },
    TaskPanicked {
        task: &'static str,
        error: String,
    },
}

/// Load failures, as seen by observers. They never propagate past the adapter.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The feed document could not be fetched. Backing sequence unchanged.
    #[error("Feed request failed: {0}")]
    FeedTransport(#[source] FetchError),
    /// The feed document has no `items` array. Backing sequence is now empty.
    #[error("Malformed feed: {0}")]
    MalformedFeed(String),
    /// One entry was skipped.
    #[error("Malformed post entry at index {index}: {reason}")]
    MalformedPostEntry { index: usize, reason: String },
    /// The row's image slot now shows the fallback.
    #[error("Image request failed for {url}: {source}")]
    ImageTransport { url: String, source: ImageError },
}

impl From<ParseError> for LoadError {
    fn from(error: ParseError) -> Self {
        match error {
            ParseError::MalformedFeed(reason) => LoadError::MalformedFeed(reason),
            ParseError::MalformedPostEntry { index, reason } => {
                LoadError::MalformedPostEntry { index, reason }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Row {index} out of bounds ({rows} rows)")]
    OutOfBounds { index: usize, rows: usize },
    #[error("Adapter is closed")]
    Closed,
}

/// Receives change notifications from the adapter.
///
/// Called from `handle_event`, on the host loop.
pub trait ListObserver: Send {
    /// The backing sequence was replaced; `rows` is the new row count.
    fn content_changed(&mut self, rows: usize);

    /// A view's image slot changed.
    fn row_changed(&mut self, _view: ViewId) {}

    /// A load failed. Already logged by the adapter.
    fn load_failed(&mut self, _error: &LoadError) {}
}

/// A bound row: text plus the state of its image request.
#[derive(Debug, Clone)]
pub struct RowView {
    row: usize,
    binding: u64,
    title: String,
    description: String,
    image_url: Option<Url>,
    image: ImageSlot,
}

impl RowView {
    /// Row index this view is currently bound to.
    pub fn row(&self) -> usize {
        self.row
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn image_url(&self) -> Option<&Url> {
        self.image_url.as_ref()
    }

    pub fn image(&self) -> &ImageSlot {
        &self.image
    }
}

pub struct PostListAdapter {
    feed: FeedClient,
    images: ImageLoader,
    events: mpsc::Sender<AdapterEvent>,
    posts: Vec<Post>,
    views: Vec<RowView>,
    next_binding: u64,
    observers: Vec<Box<dyn ListObserver>>,
    tasks: JoinSet<()>,
    closed: bool,
}

impl PostListAdapter {
    /// Create the adapter and immediately start the feed fetch.
    ///
    /// Must be called from within a tokio runtime. Every construction fetches
    /// the feed again; nothing is shared between adapters except the HTTP
    /// client the loaders were built with.
    pub fn new(feed: FeedClient, images: ImageLoader, events: mpsc::Sender<AdapterEvent>) -> Self {
        let mut adapter = Self {
            feed,
            images,
            events,
            posts: Vec::new(),
            views: Vec::new(),
            next_binding: 0,
            observers: Vec::new(),
            tasks: JoinSet::new(),
            closed: false,
        };
        adapter.spawn_feed_load();
        adapter
    }

    /// Fetch the feed again. The result replaces the backing sequence.
    pub fn refresh(&mut self) {
        if self.closed {
            tracing::debug!("Ignoring refresh on closed adapter");
            return;
        }
        self.spawn_feed_load();
    }

    pub fn add_observer(&mut self, observer: impl ListObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn row_count(&self) -> usize {
        self.posts.len()
    }

    pub fn post(&self, index: usize) -> Option<&Post> {
        self.posts.get(index)
    }

    pub fn view(&self, id: ViewId) -> Option<&RowView> {
        self.views.get(id)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Bind row `index` into a view and issue its image request.
    ///
    /// `recycled` is a view previously returned by this adapter that the host
    /// no longer needs for its old row. An unknown id is treated as `None`.
    /// Title and description are bound right away; the image slot starts as
    /// [`ImageSlot::Loading`].
    ///
    /// # Errors
    ///
    /// - [`RenderError::OutOfBounds`] if `index >= row_count()`
    /// - [`RenderError::Closed`] after [`close`](Self::close)
    pub fn render_row(
        &mut self,
        index: usize,
        recycled: Option<ViewId>,
    ) -> Result<ViewId, RenderError> {
        if self.closed {
            return Err(RenderError::Closed);
        }
        let post = self.posts.get(index).ok_or(RenderError::OutOfBounds {
            index,
            rows: self.posts.len(),
        })?;

        self.next_binding += 1;
        let binding = self.next_binding;
        let resolved = self.images.resolve(&post.image_path);
        let view = RowView {
            row: index,
            binding,
            title: post.title.clone(),
            description: post.description.clone(),
            image_url: resolved.as_ref().ok().cloned(),
            image: ImageSlot::Loading,
        };

        let id = match recycled.filter(|id| *id < self.views.len()) {
            Some(id) => {
                tracing::trace!(view = id, from = self.views[id].row, to = index, "Rebinding view");
                self.views[id] = view;
                id
            }
            None => {
                self.views.push(view);
                self.views.len() - 1
            }
        };

        match resolved {
            Ok(url) => self.spawn_image_load(id, binding, url),
            Err(source) => {
                tracing::warn!(row = index, error = %source, "Image URL invalid, showing fallback");
                self.views[id].image = ImageSlot::Fallback;
                let url = match &source {
                    ImageError::InvalidUrl { url, .. } => url.clone(),
                    _ => String::new(),
                };
                self.notify_failed(&LoadError::ImageTransport { url, source });
                self.notify_row_changed(id);
            }
        }

        Ok(id)
    }

    /// Apply a completion delivered on the event channel.
    pub fn handle_event(&mut self, event: AdapterEvent) {
        self.reap_finished();

        if self.closed {
            tracing::debug!(?event, "Dropping event delivered after close");
            return;
        }

        match event {
            AdapterEvent::FeedLoaded(Ok(ParseReport { posts, errors })) => {
                for error in errors {
                    self.notify_failed(&LoadError::from(error));
                }
                self.posts = posts;
                let rows = self.posts.len();
                tracing::debug!(rows, "Backing sequence replaced");
                for observer in &mut self.observers {
                    observer.content_changed(rows);
                }
            }
            AdapterEvent::FeedLoaded(Err(error)) => {
                tracing::warn!(url = %self.feed.url(), error = %error, "Feed request failed");
                self.notify_failed(&LoadError::FeedTransport(error));
            }
            AdapterEvent::ImageLoaded {
                view,
                binding,
                url,
                result,
            } => self.apply_image(view, binding, url, result),
            AdapterEvent::TaskPanicked { task, error } => {
                tracing::error!(task, error = %error, "Background task panicked");
            }
        }
    }

    /// Abort in-flight requests and stop accepting work.
    ///
    /// Row count and bound views stay readable.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let in_flight = self.tasks.len();
        self.tasks.abort_all();
        tracing::debug!(in_flight, "Adapter closed");
    }

    fn apply_image(
        &mut self,
        view: ViewId,
        binding: u64,
        url: Url,
        result: Result<Bitmap, ImageError>,
    ) {
        let Some(slot) = self.views.get_mut(view) else {
            tracing::warn!(view, "Image result for unknown view");
            return;
        };

        if slot.binding != binding {
            tracing::debug!(
                view,
                expected = slot.binding,
                got = binding,
                url = %url,
                "Ignoring stale image (view was rebound)"
            );
            return;
        }

        let failure = match result {
            Ok(bitmap) => {
                slot.image = ImageSlot::Loaded(Arc::new(bitmap));
                None
            }
            Err(source) => {
                tracing::warn!(url = %url, error = %source, "Image request failed, showing fallback");
                slot.image = ImageSlot::Fallback;
                Some(LoadError::ImageTransport {
                    url: url.to_string(),
                    source,
                })
            }
        };

        if let Some(error) = failure {
            self.notify_failed(&error);
        }
        self.notify_row_changed(view);
    }

    fn notify_failed(&mut self, error: &LoadError) {
        for observer in &mut self.observers {
            observer.load_failed(error);
        }
    }

    fn notify_row_changed(&mut self, view: ViewId) {
        for observer in &mut self.observers {
            observer.row_changed(view);
        }
    }

    fn spawn_feed_load(&mut self) {
        self.reap_finished();
        let feed = self.feed.clone();
        let tx = self.events.clone();
        self.tasks.spawn(async move {
            let event = match catch_task_panic(feed.fetch_feed()).await {
                Ok(result) => AdapterEvent::FeedLoaded(result),
                Err(error) => AdapterEvent::TaskPanicked {
                    task: "feed_load",
                    error,
                },
            };
            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, event = "FeedLoaded", "Channel send failed (receiver dropped)");
            }
        });
    }

    fn spawn_image_load(&mut self, view: ViewId, binding: u64, url: Url) {
        let images = self.images.clone();
        let tx = self.events.clone();
        self.tasks.spawn(async move {
            let outcome = catch_task_panic(images.fetch_image(&url)).await;
            let event = image_loaded_event(view, binding, url, outcome);
            if let Err(e) = tx.send(event).await {
                tracing::warn!(error = %e, event = "ImageLoaded", "Channel send failed (receiver dropped)");
            }
        });
    }

    /// Drop join handles of tasks that already finished.
    fn reap_finished(&mut self) {
        while self.tasks.try_join_next().is_some() {}
    }
}

impl std::fmt::Debug for PostListAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostListAdapter")
            .field("feed_url", &self.feed.url())
            .field("rows", &self.posts.len())
            .field("views", &self.views.len())
            .field("observers", &self.observers.len())
            .field("in_flight", &self.tasks.len())
            .field("closed", &self.closed)
            .finish()
    }
}

/// Completion event for an image task. A panic still resolves the view's
/// request, as an [`ImageError::Panicked`] failure.
fn image_loaded_event(
    view: ViewId,
    binding: u64,
    url: Url,
    outcome: Result<Result<Bitmap, ImageError>, String>,
) -> AdapterEvent {
    let result = outcome.unwrap_or_else(|panic| {
        tracing::error!(task = "image_load", view, url = %url, error = %panic, "Background task panicked");
        Err(ImageError::Panicked(panic))
    });
    AdapterEvent::ImageLoaded {
        view,
        binding,
        url,
        result,
    }
}

/// Run a future, turning a panic into an error message.
async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            }
        })
}
