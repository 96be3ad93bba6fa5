use std::fmt;

/// The stages a workflow passes through, in the order they can occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Spatial search for atom contacts, one part of the contact type at a time.
    AtomContacts,
    /// Atom graph to residue graph.
    Collapse,
    /// Template contacts mapped to alignment columns and tallied.
    VoteCounting,
    /// Column pairs with enough votes written into the target graph.
    Consensus,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::AtomContacts => "Atom Contacts",
            Phase::Collapse => "Collapse",
            Phase::VoteCounting => "Vote Counting",
            Phase::Consensus => "Consensus",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Events emitted while a graph is built or averaged.
///
/// Every `PhaseStart` is matched by a `PhaseFinish` of the same phase. Inside
/// [`Phase::AtomContacts`] each contact-type part (`"BB"`, `"Ca/Cb"`, ...) opens
/// with `PartStart`, emits one `PairProcessed` per within-cutoff atom pair and
/// closes with `PartFinish`.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart(Phase),
    PhaseFinish(Phase),

    PartStart { part: String, candidate_pairs: u64 },
    PairProcessed,
    PartFinish { part: String, contacts: usize },
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards progress events to an optional callback.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Runs `step` between the start and finish events of `phase`.
    ///
    /// The finish event is only sent when `step` succeeds.
    pub fn phase<T, E>(&self, phase: Phase, step: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        self.report(Progress::PhaseStart(phase));
        let value = step()?;
        self.report(Progress::PhaseFinish(phase));
        Ok(value)
    }
}
