/* Main Interface */

use crate::clause::{lbool, Lit, Var};
use crate::host::Host;

/// Main interface for the solver: adding clauses, allocating variables, and
/// searching for a model under assumptions.
///
/// Every entry point that can change the assignment or the clause database
/// takes the [`Host`] so that the embedding solver observes each event; plain
/// SAT usage passes an [`crate::EmptyHost`].
pub trait SolverInterface {
    /// Creates a new SAT variable in the solver. If 'decision' is cleared, variable will not be
    /// used as a decision variable (NOTE! This has effects on the meaning of a SATISFIABLE result).
    ///
    /// `upol` is the user polarity: branching on this variable always picks
    /// the given phase unless `UNDEF`.
    fn new_var<H: Host>(&mut self, h: &mut H, upol: lbool, dvar: bool) -> Var;

    /// Create a new variable with the default polarity, eligible for branching.
    fn new_var_default<H: Host>(&mut self, h: &mut H) -> Var;

    /// Add a clause to the solver. Returns `false` if the solver is in
    /// an `UNSAT` state.
    ///
    /// The clause is normalized: duplicate literals are merged, tautologies
    /// dropped, root-false literals removed, and units propagated. When
    /// called under a non-root decision level with fewer than two non-false
    /// literals, the solver first backjumps to the root.
    fn add_clause_reuse<H: Host>(&mut self, h: &mut H, clause: &mut Vec<Lit>) -> bool;

    /// Add a clause produced by the host's own conflict analysis.
    ///
    /// Unit clauses force a backjump to the root level. Must only be called
    /// from a quiescent point (never from inside a host callback while
    /// conflict analysis is running).
    fn add_learned_clause<H: Host>(&mut self, h: &mut H, clause: &[Lit]) -> bool;

    /// Set the assumptions used by the next `solve_limited` calls.
    ///
    /// Each assumption is decided first, one per decision level, before free
    /// branching; their violation is reported through [`SolverInterface::unsat_core`].
    fn set_assumptions(&mut self, assumps: &[Lit]);

    /// Search for a model under the current assumptions (with resource constraints).
    ///
    /// With `nosearch`, only propagate the assumptions and ask no decision;
    /// the result is `TRUE` if propagation completed without conflict.
    fn solve_limited<H: Host>(&mut self, h: &mut H, nosearch: bool) -> lbool;

    /// Simplify the clause database according to the current top-level assigment. Currently, the only
    /// thing done here is the removal of satisfied clauses, but more things can be put here.
    fn simplify<H: Host>(&mut self, h: &mut H) -> bool;

    /// Backtrack to the given decision level (keeping all assignments at that
    /// level but not beyond).
    fn cancel_until<H: Host>(&mut self, h: &mut H, level: u32);

    /// Make a variable eligible (or ineligible) for branching.
    fn set_decidable<H: Host>(&mut self, h: &mut H, v: Var, dvar: bool);

    /// Capture the current state so it can be restored with
    /// [`SolverInterface::reset_state`]. Nested saves are not supported.
    fn save_state(&mut self);

    /// Restore the state captured by the last [`SolverInterface::save_state`]:
    /// backtrack to the saved level, drop clauses added since the save and
    /// *all* learnt clauses.
    fn reset_state<H: Host>(&mut self, h: &mut H);

    /// `false` if the solver is known to be in a conflicting state at the root.
    fn is_ok(&self) -> bool;

    /// Query whole model
    ///
    /// Precondition: last result was `Sat` (ie `lbool::TRUE`)
    fn get_model(&self) -> &[lbool];

    /// Query model for var
    fn value_var(&self, v: Var) -> lbool;

    /// Query model for lit
    fn value_lit(&self, l: Lit) -> lbool;

    /// Value of this literal if it's assigned at level 0, or `UNDEF` otherwise
    fn value_lvl_0(&self, l: Lit) -> lbool;

    /// Obtain the slice of literals that are proved at level 0.
    ///
    /// These literals will keep this value from now on.
    fn proved_at_lvl_0(&self) -> &[Lit];

    /// Return unsat core (as a subset of assumptions).
    ///
    /// Precondition: last result was `Unsat`
    fn unsat_core(&self) -> &[Lit];

    /// Does this literal occur in the unsat-core?
    fn unsat_core_contains_lit(&self, lit: Lit) -> bool;

    /// Does this variable occur in the unsat-core?
    fn unsat_core_contains_var(&self, v: Var) -> bool;

    fn num_vars(&self) -> u32;
    fn num_clauses(&self) -> u64;
    fn num_conflicts(&self) -> u64;
    fn num_propagations(&self) -> u64;
    fn num_decisions(&self) -> u64;
    fn num_restarts(&self) -> u64;

    /// Print some current statistics to standard output.
    fn print_stats(&self);

    /// Stop the search after this many conflicts (negative: no limit).
    fn set_conflict_budget(&mut self, b: i64);

    /// Stop the search after this many propagations (negative: no limit).
    fn set_propagation_budget(&mut self, b: i64);

    /// Remove both budgets.
    fn budget_off(&mut self);
}
