use crate::cli::filters::FilterSelection;
use crate::data::model::TripTable;

// ---------------------------------------------------------------------------
// Session phases
// ---------------------------------------------------------------------------

/// Where the main loop is within one analysis pass. Each phase carries the
/// value the next one consumes, so a table never outlives its pass.
#[derive(Debug, Default)]
pub enum Phase {
    #[default]
    CollectingFilters,
    Loading(FilterSelection),
    Analyzing(TripTable),
    AskingRestart,
    Done,
}

impl Phase {
    pub fn is_done(&self) -> bool {
        matches!(self, Phase::Done)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Phase::CollectingFilters => "collecting filters",
            Phase::Loading(_) => "loading",
            Phase::Analyzing(_) => "analyzing",
            Phase::AskingRestart => "asking restart",
            Phase::Done => "done",
        }
    }
}
