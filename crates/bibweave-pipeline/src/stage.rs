//! The stage skeleton: load, process with a worker pool, save.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use bibweave_core::{fmt_num, merge_year_map, run_pool, WorkQueue};
use serde::Serialize;

use crate::aggregate::YearAggregate;
use crate::context::PipelineContext;

#[derive(Debug)]
pub enum StageError {
    /// The stage's input file does not exist; an earlier stage must run
    /// first. Fatal for the conference, not for the whole run.
    InputMissing(PathBuf),
    /// Loading inputs failed (network for base, file parse for the rest).
    Load(anyhow::Error),
    /// Writing the stage file failed.
    Save(io::Error),
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputMissing(path) => {
                write!(f, "input file {} not found (run the previous stage first)", path.display())
            }
            Self::Load(e) => write!(f, "loading stage input: {e}"),
            Self::Save(e) => write!(f, "saving stage output: {e}"),
        }
    }
}

impl std::error::Error for StageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InputMissing(_) => None,
            Self::Load(e) => e.source(),
            Self::Save(e) => Some(e),
        }
    }
}

/// Per-conference outcome of one stage run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSummary {
    pub stage: &'static str,
    pub conference: String,
    pub processed: usize,
    pub enriched: usize,
    pub failed: usize,
}

impl fmt::Display for StageSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} processed, {} enriched, {} failed",
            self.stage,
            self.conference,
            fmt_num(self.processed),
            fmt_num(self.enriched),
            fmt_num(self.failed)
        )
    }
}

/// One processed item, destined for a year bucket of the output file.
pub struct Processed<T> {
    pub year: String,
    pub output: T,
    /// Whether any external source contributed data beyond the input.
    pub enriched: bool,
}

/// A pipeline stage over one conference.
///
/// `run` is the template: load everything, drain a work queue with the
/// configured number of workers, merge the year-keyed result into the
/// stage file. Implementations supply the three stage-specific pieces.
/// `process` must absorb per-item failures and return `None`; a panic
/// would take the whole pool down.
pub trait Stage: Sync {
    type Item: Send + Sync;
    type Output: Serialize + Send;

    fn name(&self) -> &'static str;

    /// All items for the conference and year range.
    fn load(
        &self,
        ctx: &PipelineContext,
        conference: &str,
        years: &[u16],
    ) -> Result<Vec<Self::Item>, StageError>;

    /// One item, fully enriched; `None` counts as failed.
    fn process(&self, ctx: &PipelineContext, item: &Self::Item) -> Option<Processed<Self::Output>>;

    /// Where this stage's output for the conference lives.
    fn output_path(&self, ctx: &PipelineContext, conference: &str) -> PathBuf;

    fn run(
        &self,
        ctx: &PipelineContext,
        conference: &str,
        years: &[u16],
    ) -> Result<StageSummary, StageError> {
        let status = ctx.progress.status_line(self.name());
        status.set_message(format!("loading {conference}"));
        let loaded = self.load(ctx, conference, years);
        status.finish_and_clear();
        let items = loaded?;
        let total = items.len();
        log::info!(
            "[{}] {conference}: processing {} item(s) with {} worker(s)",
            self.name(),
            fmt_num(total),
            ctx.config.workers
        );

        let queue = WorkQueue::new(items);
        let aggregate: YearAggregate<Self::Output> = YearAggregate::new();
        let failed = AtomicUsize::new(0);
        let enriched = AtomicUsize::new(0);
        let bar = ctx.progress.stage_bar(self.name(), total as u64);

        run_pool(ctx.config.workers, &queue, |item| {
            match self.process(ctx, item) {
                Some(processed) => {
                    if processed.enriched {
                        enriched.fetch_add(1, Ordering::Relaxed);
                    }
                    aggregate.push(processed.year, processed.output);
                }
                None => {
                    failed.fetch_add(1, Ordering::Relaxed);
                }
            }
            bar.inc(1);
        });
        bar.finish_and_clear();

        let path = self.output_path(ctx, conference);
        merge_year_map(&path, &aggregate.into_map()).map_err(StageError::Save)?;

        let summary = StageSummary {
            stage: self.name(),
            conference: conference.to_string(),
            processed: total,
            enriched: enriched.into_inner(),
            failed: failed.into_inner(),
        };
        log::info!("{summary}");
        Ok(summary)
    }
}

/// Classify a stage-input read error: a missing file is an ordering
/// problem, anything else is a real load failure.
pub(crate) fn classify_input_error(path: PathBuf, e: io::Error) -> StageError {
    if e.kind() == io::ErrorKind::NotFound {
        StageError::InputMissing(path)
    } else {
        StageError::Load(anyhow::Error::new(e).context(format!("reading {}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use bibweave_core::{load_year_map, GateConfig, RequestGate};
    use bibweave_sources::{Crossref, OpenAlex, SemanticScholar};

    use crate::context::{PipelineConfig, PipelineContext};

    /// Items divisible by three fail, the rest succeed.
    struct FlakyStage;

    impl Stage for FlakyStage {
        type Item = (String, u32);
        type Output = u32;

        fn name(&self) -> &'static str {
            "flaky"
        }

        fn load(
            &self,
            _ctx: &PipelineContext,
            _conference: &str,
            _years: &[u16],
        ) -> Result<Vec<(String, u32)>, StageError> {
            Ok((0..10).map(|n| ("2024".to_string(), n)).collect())
        }

        fn process(
            &self,
            _ctx: &PipelineContext,
            (year, n): &(String, u32),
        ) -> Option<Processed<u32>> {
            if n % 3 == 0 {
                return None;
            }
            Some(Processed {
                year: year.clone(),
                output: *n,
                enriched: n % 2 == 0,
            })
        }

        fn output_path(&self, ctx: &PipelineContext, conference: &str) -> PathBuf {
            ctx.config
                .output_dir
                .join("flaky")
                .join(format!("{conference}_flaky_data.json"))
        }
    }

    fn offline_ctx(output_dir: PathBuf) -> (PipelineContext, tempfile::TempDir) {
        let cache = tempfile::tempdir().unwrap();
        let gate = Arc::new(RequestGate::new(GateConfig::default(), cache.path()).unwrap());
        let ctx = PipelineContext::with_clients(
            OpenAlex::with_base(gate.clone(), "http://127.0.0.1:1"),
            SemanticScholar::with_base(gate.clone(), "http://127.0.0.1:1", None),
            Crossref::with_base(gate, "http://127.0.0.1:1"),
            PipelineConfig {
                workers: 4,
                output_dir,
                ..Default::default()
            },
        );
        (ctx, cache)
    }

    #[test]
    fn failing_items_are_counted_and_excluded_without_stopping_siblings() {
        let out = tempfile::tempdir().unwrap();
        let (ctx, _cache) = offline_ctx(out.path().to_path_buf());

        let summary = FlakyStage.run(&ctx, "abc", &[2024]).unwrap();
        assert_eq!(summary.processed, 10);
        assert_eq!(summary.failed, 4); // 0, 3, 6, 9
        assert_eq!(summary.enriched, 3); // 2, 4, 8

        let map = load_year_map::<u32>(&FlakyStage.output_path(&ctx, "abc")).unwrap();
        let mut values = map["2024"].clone();
        values.sort_unstable();
        assert_eq!(values, vec![1, 2, 4, 5, 7, 8]);
    }

    #[test]
    fn input_missing_display_names_the_path() {
        let e = StageError::InputMissing(PathBuf::from("/x/base/abc_base_data.json"));
        let msg = e.to_string();
        assert!(msg.contains("abc_base_data.json"));
        assert!(msg.contains("previous stage"));
    }

    #[test]
    fn missing_file_classifies_as_input_missing() {
        let e = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert!(matches!(
            classify_input_error(PathBuf::from("/x"), e),
            StageError::InputMissing(_)
        ));
    }

    #[test]
    fn other_io_errors_classify_as_load() {
        let e = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(
            classify_input_error(PathBuf::from("/x"), e),
            StageError::Load(_)
        ));
    }
}
