//! Orchestrator module for the harvesting pipeline.
//!
//! Coordinates the consumer, processor, and loader components. One
//! [`Harvester`] drives every source; each flow takes the immutable
//! descriptor plus the mutable run state and cursor.

mod state;

pub use state::{FlowOutcome, HarvestReport, RunState, RunStats};

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::consumer::{QueryBuilder, QueryParams, SourceClient, API_PAGE_SIZE};
use crate::cursor::{CursorStore, OffsetCursor, PagingCursor, SectionCursor};
use crate::errors::PipelineError;
use crate::loader::BulkWriter;
use crate::processor::DocumentMapper;
use crate::quota::RateLimiter;
use nyt_indexer_shared::{PagingMode, SourceDescriptor};

/// Consecutive zero-progress iterations after which a flow gives up.
const STALL_LIMIT: u32 = 2;

/// Configuration for the harvester.
#[derive(Debug, Clone)]
pub struct HarvesterConfig {
    /// Offset to start offset-paginated sources from, ignoring saved cursors.
    pub start_offset: Option<u64>,
    /// Source enumerating the sections of section-iterated sources.
    pub sections_source: SourceDescriptor,
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            start_offset: None,
            sections_source: SourceDescriptor::news_sections(),
        }
    }
}

/// Result of one fetch-map-write iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// The page was fetched and every document written.
    Written { num_results: Option<u64> },
    /// The page was fetched and had no results.
    Empty,
    /// Fetch or write failed. The cursor must stay where it is.
    Failed,
}

/// Drives the three ingestion flows.
///
/// The harvester:
/// - Builds one request per iteration and passes it through the rate limiter
/// - Maps each page into a batch and writes it with a single bulk call
/// - Advances the cursor only after a fully successful write, and saves it
///   to the cursor store right away
/// - Loads cursors before each source in [`Harvester::run`]
pub struct Harvester {
    query_builder: QueryBuilder,
    source: Arc<dyn SourceClient>,
    limiter: RateLimiter,
    writer: BulkWriter,
    cursors: Arc<dyn CursorStore>,
    config: HarvesterConfig,
}

impl Harvester {
    /// Create a new harvester with the default configuration.
    pub fn new(
        query_builder: QueryBuilder,
        source: Arc<dyn SourceClient>,
        limiter: RateLimiter,
        writer: BulkWriter,
        cursors: Arc<dyn CursorStore>,
    ) -> Self {
        Self::with_config(
            query_builder,
            source,
            limiter,
            writer,
            cursors,
            HarvesterConfig::default(),
        )
    }

    /// Create a new harvester with custom configuration.
    pub fn with_config(
        query_builder: QueryBuilder,
        source: Arc<dyn SourceClient>,
        limiter: RateLimiter,
        writer: BulkWriter,
        cursors: Arc<dyn CursorStore>,
        config: HarvesterConfig,
    ) -> Self {
        Self {
            query_builder,
            source,
            limiter,
            writer,
            cursors,
            config,
        }
    }

    /// Harvest every descriptor in order.
    ///
    /// Stops after the first source that exhausts the daily quota, since the
    /// cap is shared by all of them.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<HarvestReport>)` - One report per source that ran
    /// * `Err(PipelineError)` - Only for cursor store or configuration failures
    #[instrument(skip(self, descriptors, state), fields(sources = descriptors.len()))]
    pub async fn run(
        &self,
        descriptors: &[SourceDescriptor],
        state: &mut RunState,
    ) -> Result<Vec<HarvestReport>, PipelineError> {
        info!("Starting harvest run");
        let mut reports = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            let outcome = self.run_source(descriptor, state).await?;
            info!(
                collection = %descriptor.target_collection,
                outcome = %outcome,
                calls_this_run = state.quota.calls_this_run,
                "Source finished"
            );

            reports.push(HarvestReport {
                collection: descriptor.target_collection.clone(),
                outcome,
            });

            if outcome == FlowOutcome::QuotaExhausted {
                warn!("Daily quota exhausted, ending run");
                break;
            }
        }

        info!(
            calls_this_run = state.quota.calls_this_run,
            pages_written = state.stats.pages_written,
            pages_failed = state.stats.pages_failed,
            documents_written = state.stats.documents_written,
            records_rejected = state.stats.records_rejected,
            fetch_failures = state.stats.fetch_failures,
            "Harvest run finished"
        );
        Ok(reports)
    }

    async fn run_source(
        &self,
        descriptor: &SourceDescriptor,
        state: &mut RunState,
    ) -> Result<FlowOutcome, PipelineError> {
        let collection = descriptor.target_collection.as_str();

        match descriptor.paging_mode {
            PagingMode::None => self.run_flat(descriptor, state).await,
            PagingMode::SectionIteration => {
                let mut cursor = match self.cursors.load(collection).await? {
                    Some(PagingCursor::Section(cursor)) => cursor,
                    Some(other) => {
                        warn!(cursor = ?other, "Ignoring saved cursor of another paging mode");
                        SectionCursor::default()
                    }
                    None => SectionCursor::default(),
                };

                let outcome = self.run_sections(descriptor, state, &mut cursor).await?;
                if outcome == FlowOutcome::Completed {
                    cursor = SectionCursor::default();
                }
                self.cursors
                    .save(collection, &PagingCursor::Section(cursor))
                    .await?;
                Ok(outcome)
            }
            PagingMode::Offset => {
                let offset = match (self.config.start_offset, self.cursors.load(collection).await?) {
                    (Some(offset), _) => offset,
                    (None, Some(PagingCursor::Offset(cursor))) => cursor.offset,
                    (None, Some(other)) => {
                        warn!(cursor = ?other, "Ignoring saved cursor of another paging mode");
                        0
                    }
                    (None, None) => 0,
                };
                let mut cursor = OffsetCursor::new(offset, API_PAGE_SIZE);

                let outcome = self.run_offset(descriptor, state, &mut cursor).await?;
                self.cursors
                    .save(collection, &PagingCursor::Offset(cursor))
                    .await?;
                Ok(outcome)
            }
        }
    }

    /// Flow A: one call, one batch.
    #[instrument(skip(self, descriptor, state), fields(collection = %descriptor.target_collection))]
    pub async fn run_flat(
        &self,
        descriptor: &SourceDescriptor,
        state: &mut RunState,
    ) -> Result<FlowOutcome, PipelineError> {
        let outcome = match self.step(descriptor, &QueryParams::none(), state).await {
            Ok(Step::Written { .. }) | Ok(Step::Empty) => FlowOutcome::Completed,
            Ok(Step::Failed) => FlowOutcome::Incomplete,
            Err(PipelineError::QuotaExhausted { .. }) => FlowOutcome::QuotaExhausted,
            Err(e) => return Err(e),
        };

        info!(outcome = %outcome, "Flat list harvested");
        Ok(outcome)
    }

    /// Flow B: enumerate the sections once, then harvest them one by one
    /// starting at `cursor.index`.
    #[instrument(skip(self, descriptor, state, cursor), fields(collection = %descriptor.target_collection, start_index = cursor.index))]
    pub async fn run_sections(
        &self,
        descriptor: &SourceDescriptor,
        state: &mut RunState,
        cursor: &mut SectionCursor,
    ) -> Result<FlowOutcome, PipelineError> {
        let sections = match self.list_sections(state).await {
            Ok(Some(sections)) => sections,
            Ok(None) => return Ok(FlowOutcome::Incomplete),
            Err(PipelineError::QuotaExhausted { .. }) => return Ok(FlowOutcome::QuotaExhausted),
            Err(e) => return Err(e),
        };
        info!(sections = sections.len(), "Section list fetched");

        let mut zero_progress = 0;
        while let Some(section) = sections.get(cursor.index) {
            match self.harvest_section(descriptor, section, state, cursor).await? {
                FlowOutcome::QuotaExhausted => return Ok(FlowOutcome::QuotaExhausted),
                FlowOutcome::Completed => zero_progress = 0,
                _ => {
                    zero_progress += 1;
                    if zero_progress >= STALL_LIMIT {
                        warn!(section = %section, "No progress on section, giving up");
                        return Ok(FlowOutcome::Stalled);
                    }
                }
            }
        }

        Ok(FlowOutcome::Completed)
    }

    /// One section of Flow B.
    ///
    /// # Returns
    ///
    /// * `Completed` - The section was written (or was empty) and the cursor advanced
    /// * `Incomplete` - Fetch or write failed; the cursor is unchanged
    /// * `QuotaExhausted` - No call was made
    #[instrument(skip(self, descriptor, state, cursor), fields(collection = %descriptor.target_collection, index = cursor.index))]
    pub async fn harvest_section(
        &self,
        descriptor: &SourceDescriptor,
        section: &str,
        state: &mut RunState,
        cursor: &mut SectionCursor,
    ) -> Result<FlowOutcome, PipelineError> {
        match self
            .step(descriptor, &QueryParams::section(section), state)
            .await
        {
            Ok(Step::Written { .. }) | Ok(Step::Empty) => {
                cursor.advance();
                self.save_cursor(descriptor, PagingCursor::Section(*cursor)).await?;
                info!(next_index = cursor.index, "Section harvested");
                Ok(FlowOutcome::Completed)
            }
            Ok(Step::Failed) => Ok(FlowOutcome::Incomplete),
            Err(PipelineError::QuotaExhausted { .. }) => Ok(FlowOutcome::QuotaExhausted),
            Err(e) => Err(e),
        }
    }

    /// Flow C: page through the source until it runs dry.
    #[instrument(skip(self, descriptor, state, cursor), fields(collection = %descriptor.target_collection, start_offset = cursor.offset))]
    pub async fn run_offset(
        &self,
        descriptor: &SourceDescriptor,
        state: &mut RunState,
        cursor: &mut OffsetCursor,
    ) -> Result<FlowOutcome, PipelineError> {
        let mut zero_progress = 0;

        loop {
            let params = QueryParams::page(cursor.offset, cursor.page_size);
            match self.step(descriptor, &params, state).await {
                Ok(Step::Written { num_results }) => {
                    zero_progress = 0;
                    cursor.advance();
                    self.save_cursor(descriptor, PagingCursor::Offset(*cursor)).await?;
                    info!(next_offset = cursor.offset, "Page harvested");

                    if let Some(total) = num_results {
                        if cursor.offset >= total {
                            info!(total = total, "All reported hits retrieved");
                            return Ok(FlowOutcome::AllHitsRetrieved);
                        }
                    }
                }
                Ok(Step::Empty) => {
                    info!(offset = cursor.offset, "Empty page, source exhausted");
                    return Ok(FlowOutcome::EmptyPage);
                }
                Ok(Step::Failed) => {
                    zero_progress += 1;
                    if zero_progress >= STALL_LIMIT {
                        warn!(offset = cursor.offset, "No progress on page, giving up");
                        return Ok(FlowOutcome::Stalled);
                    }
                }
                Err(PipelineError::QuotaExhausted { .. }) => return Ok(FlowOutcome::QuotaExhausted),
                Err(e) => return Err(e),
            }
        }
    }

    async fn save_cursor(
        &self,
        descriptor: &SourceDescriptor,
        cursor: PagingCursor,
    ) -> Result<(), PipelineError> {
        self.cursors.save(&descriptor.target_collection, &cursor).await
    }

    /// Fetch the section list, dropping blanks and duplicates.
    ///
    /// `Ok(None)` when the list could not be fetched.
    async fn list_sections(&self, state: &mut RunState) -> Result<Option<Vec<String>>, PipelineError> {
        let descriptor = &self.config.sections_source;
        let request = self.query_builder.build(descriptor, &QueryParams::none())?;

        self.limiter.acquire(&mut state.quota).await?;
        let fetched = self.source.fetch(&request).await;
        self.limiter.record_call(&mut state.quota);

        let page = match fetched {
            Ok(page) => page,
            Err(e) if e.is_terminal() => return Err(e),
            Err(e) => {
                error!(url = %request.redacted(), error = %e, "Failed to fetch section list");
                state.stats.fetch_failures += 1;
                return Ok(None);
            }
        };

        let mut seen = HashSet::new();
        let sections = page
            .results
            .iter()
            .filter_map(|record| record.get("section").and_then(Value::as_str))
            .map(str::trim)
            .filter(|section| !section.is_empty())
            .filter(|section| seen.insert(section.to_string()))
            .map(str::to_string)
            .collect();

        Ok(Some(sections))
    }

    /// The iteration shared by every flow: acquire, fetch, map, write.
    ///
    /// Quota exhaustion and terminal errors are returned as `Err`; everything
    /// else is logged, counted and reported as a [`Step`].
    async fn step(
        &self,
        descriptor: &SourceDescriptor,
        params: &QueryParams,
        state: &mut RunState,
    ) -> Result<Step, PipelineError> {
        let request = match self.query_builder.build(descriptor, params) {
            Ok(request) => request,
            Err(e) => {
                error!(error = %e, params = ?params, "Failed to build request");
                return Ok(Step::Failed);
            }
        };

        self.limiter.acquire(&mut state.quota).await?;
        let fetched = self.source.fetch(&request).await;
        self.limiter.record_call(&mut state.quota);

        let page = match fetched {
            Ok(page) => page,
            Err(e) if e.is_terminal() => return Err(e),
            Err(e) => {
                error!(url = %request.redacted(), error = %e, "Failed to fetch page");
                state.stats.fetch_failures += 1;
                return Ok(Step::Failed);
            }
        };

        if page.is_empty() {
            return Ok(Step::Empty);
        }

        let num_results = page.num_results;
        let mapped =
            DocumentMapper::for_kind(descriptor.kind).map(&descriptor.target_collection, page.results);
        state.stats.records_rejected += mapped.rejected as u64;

        match self.writer.write(&mapped.batch).await {
            Ok(result) if result.succeeded => {
                state.stats.pages_written += 1;
                state.stats.documents_written += result.written_count as u64;
                Ok(Step::Written { num_results })
            }
            Ok(result) => {
                warn!(
                    written = result.written_count,
                    failed = result.failed_count,
                    "Page partially written, cursor not advanced"
                );
                state.stats.pages_failed += 1;
                state.stats.documents_written += result.written_count as u64;
                state.stats.documents_failed += result.failed_count as u64;
                Ok(Step::Failed)
            }
            Err(e) => {
                warn!(error = %e, "Failed to write page, cursor not advanced");
                state.stats.pages_failed += 1;
                state.stats.documents_failed += mapped.batch.len() as u64;
                Ok(Step::Failed)
            }
        }
    }
}
