use crate::clause::{Lit, Var};
use crate::core::HostArg;
use std::default::Default;

/// The embedding multi-theory solver, seen from the SAT core.
///
/// The core drives the search; the host can propagate literals of its own,
/// veto candidate models, justify its propagations during conflict analysis,
/// and observe every state change it may need to mirror (new variables,
/// assignments, decision levels, backtracking).
///
/// Level bookkeeping (`create_level`, `pop_levels`, `n_levels`) and
/// [`Host::explain`] must be implemented; the event notifications default to
/// no-ops so a host only implements what it reacts to.
pub trait Host {
    /// Theory propagation pass, run whenever boolean propagation reaches a
    /// fixpoint without a conflict.
    ///
    /// The host may enqueue literals with [`HostArg::propagate`] or report
    /// that the current partial assignment is theory-inconsistent with
    /// [`HostArg::raise_conflict`]. This is best effort; anything missed here
    /// is caught again by [`Host::check_full_assignment`].
    ///
    /// The default implementation does nothing.
    fn propagate(&mut self, _acts: &mut HostArg) {}

    /// Final veto, invoked when propagation is clean and no branching
    /// candidate remains.
    ///
    /// If the candidate model is not acceptable, the host *must* call
    /// [`HostArg::raise_conflict`] with a clause that is false in the current
    /// trail. It may instead (or also) extend the trail with
    /// [`HostArg::propagate`]; the search then resumes.
    fn check_full_assignment(&mut self, _acts: &mut HostArg) {}

    /// Justify a literal the host enqueued without a reason clause.
    ///
    /// `p` is true in a prefix of the current trail. The returned slice is a
    /// clause implying `p`: its first literal is `p` and every other literal
    /// is false at the level `p` was assigned. The core copies it immediately
    /// and never retains the slice.
    fn explain(&mut self, _p: Lit) -> &[Lit];

    /// Push a new backtracking level.
    fn create_level(&mut self);

    /// Pop `n` levels. `first_decision` is the decision literal of the
    /// shallowest cancelled level.
    fn pop_levels(&mut self, n: usize, first_decision: Lit);

    /// Number of levels currently pushed.
    fn n_levels(&self) -> usize;

    /// A variable was created.
    fn on_var_added(&mut self, _v: Var) {}

    /// A variable that was not eligible for branching became eligible.
    fn on_became_decidable(&mut self, _v: Var) {}

    /// A literal became true on the trail (by decision or propagation).
    fn on_assignment(&mut self, _p: Lit) {}

    /// A clause entered the clause database (original or learnt).
    fn on_clause_added(&mut self, _c: &[Lit]) {}

    /// The formula became unsatisfiable at the root level.
    fn on_unsat(&mut self) {}

    /// Substitute the branching variable chosen by the activity heuristic.
    ///
    /// Only consulted when the custom-branching option is enabled. The
    /// returned variable must be unassigned.
    fn change_branch_choice(&mut self, v: Var) -> Var {
        v
    }
}

/// Trivial host that never propagates and accepts every model.
pub struct EmptyHost(usize);

impl EmptyHost {
    /// New empty host.
    pub fn new() -> Self {
        EmptyHost(0)
    }
}

impl Default for EmptyHost {
    fn default() -> Self {
        EmptyHost::new()
    }
}

impl Host for EmptyHost {
    fn explain(&mut self, _p: Lit) -> &[Lit] {
        unreachable!("empty host never propagates")
    }
    fn create_level(&mut self) {
        self.0 += 1
    }
    fn pop_levels(&mut self, n: usize, _first_decision: Lit) {
        debug_assert!(self.0 >= n);
        self.0 -= n
    }
    fn n_levels(&self) -> usize {
        self.0
    }
}
