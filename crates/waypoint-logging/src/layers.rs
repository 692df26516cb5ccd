//! Subscriber layers
//!
//! [`StopContextLayer`] stamps each new span with the stop that was in
//! scope (see [`StopContextGuard`]) when the span was created.
//! [`json_layer`] is the JSON-lines formatter shared by the console and
//! file sinks.

use tracing::{Subscriber, span};
use tracing_subscriber::fmt::format::{Format, Json, JsonFields as JsonFieldFormatter};
use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::config::JsonFields;
use crate::context::{StopContextData, StopContextGuard};

/// Stop recorded on a span by [`StopContextLayer`]
#[derive(Debug, Clone)]
pub struct StopContextExtension {
    pub data: StopContextData,
}

/// Layer that copies the thread's current stop onto new spans
#[derive(Debug, Clone, Copy, Default)]
pub struct StopContextLayer;

impl StopContextLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for StopContextLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, _attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        let Some(data) = StopContextGuard::current() else {
            return;
        };
        if let Some(span) = ctx.span(id) {
            span.extensions_mut().insert(StopContextExtension { data });
        }
    }
}

/// JSON-lines formatter writing to `writer`
pub fn json_layer<S, W>(
    writer: W,
    fields: &JsonFields,
) -> fmt::Layer<S, JsonFieldFormatter, Format<Json>, W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(fields.span_list)
        .flatten_event(fields.flatten)
        .with_thread_ids(fields.thread)
        .with_thread_names(fields.thread)
        .with_file(fields.source_location)
        .with_line_number(fields.source_location)
        .with_writer(writer)
}
