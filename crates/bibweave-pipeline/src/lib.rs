//! bibweave-pipeline — staged enrichment over conferences.
//!
//! Three stages, each reading the previous stage's year-keyed file:
//! base (index harvest + affiliations), extended (abstracts, TLDRs,
//! citation stubs), citations (resolved cited papers). A conference
//! failing one stage does not stop the others.

pub mod aggregate;
pub mod base;
pub mod citations;
pub mod context;
pub mod extended;
pub mod stage;

pub use base::BaseStage;
pub use citations::CitationsStage;
pub use context::{filter_years, year_range, PipelineConfig, PipelineContext};
pub use extended::ExtendedStage;
pub use stage::{Processed, Stage, StageError, StageSummary};

/// Which stages to run, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Base,
    Extended,
    Citations,
}

impl StageKind {
    pub const ALL: [StageKind; 3] = [StageKind::Base, StageKind::Extended, StageKind::Citations];
}

/// Outcome of a multi-conference run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub summaries: Vec<StageSummary>,
    /// Conference-level failures: (conference, stage, message).
    pub failures: Vec<(String, &'static str, String)>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

fn run_one(
    kind: StageKind,
    ctx: &PipelineContext,
    conference: &str,
    years: &[u16],
) -> (&'static str, Result<StageSummary, StageError>) {
    match kind {
        StageKind::Base => ("base", BaseStage.run(ctx, conference, years)),
        StageKind::Extended => ("extended", ExtendedStage.run(ctx, conference, years)),
        StageKind::Citations => ("citations", CitationsStage.run(ctx, conference, years)),
    }
}

/// Run the given stages for every conference. A stage failure skips the
/// conference's remaining stages but never its siblings.
pub fn run_stages(
    kinds: &[StageKind],
    ctx: &PipelineContext,
    conferences: &[String],
    years: &[u16],
) -> RunReport {
    let mut report = RunReport::default();
    for conference in conferences {
        for kind in kinds {
            let (name, result) = run_one(*kind, ctx, conference, years);
            match result {
                Ok(summary) => report.summaries.push(summary),
                Err(e) => {
                    log::error!("[{name}] {conference}: {e}");
                    report.failures.push((conference.clone(), name, e.to_string()));
                    break;
                }
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_is_base_extended_citations() {
        assert_eq!(
            StageKind::ALL,
            [StageKind::Base, StageKind::Extended, StageKind::Citations]
        );
    }

    #[test]
    fn empty_report_is_success() {
        assert!(RunReport::default().is_success());
    }
}
