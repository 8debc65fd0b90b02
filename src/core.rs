/*****************************************************************************************[core.rs]
Copyright (c) 2003-2006, Niklas Een, Niklas Sorensson (MiniSat)
Copyright (c) 2007-2010, Niklas Sorensson (MiniSat)

Permission is hereby granted, free of charge, to any person obtaining a copy of this software and
associated documentation files (the "Software"), to deal in the Software without restriction,
including without limitation the rights to use, copy, modify, merge, publish, distribute,
sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all copies or
substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT
NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT
OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
**************************************************************************************************/

use {
    crate::callbacks::{Callbacks, ProgressStatus},
    crate::clause::{
        self, lbool, CRef, ClauseAllocator, ClauseRef, DeletePred, LSet, Lit, OccLists,
        OccListsData, VMap, Var,
    },
    crate::heap::{Comparator, Heap, HeapData},
    crate::host::Host,
    crate::interface::SolverInterface,
    std::{cmp, f64, fmt, mem,
        sync::atomic::{AtomicBool, Ordering},
    },
};

/// The main solver structure
///
/// A `Solver` object contains the whole state of the SAT core, including
/// a clause allocator, literals, clauses, and statistics.
///
/// It is parametrized by `Callbacks`; the embedding [`Host`] is passed to
/// each entry point that can change the assignment or the clause database.
pub struct Solver<Cb: Callbacks> {
    // Extra results: (read-only member variable)
    /// If problem is satisfiable, this vector contains the model (if any).
    model: Vec<lbool>,
    /// If problem is unsatisfiable (possibly under assumptions),
    /// this vector represent the final conflict clause expressed in the assumptions.
    conflict: LSet,

    cb: Cb, // the callbacks
    asynch_interrupt: AtomicBool,

    /// List of problem clauses.
    clauses: Vec<CRef>,
    /// List of learnt clauses.
    learnts: Vec<CRef>,

    /// State captured by `save_state`.
    saved: Option<SavedState>,

    v: SolverV,
    tmp_c_host: Vec<Lit>, // used for host conflicts
}

/// The current assignments.
struct VarState {
    /// A heuristic measurement of the activity of a variable.
    activity: VMap<f64>,
    /// Current assignment for each variable.
    ass: VMap<lbool>,
    /// Stores reason and level for each variable.
    vardata: VMap<VarData>,
    /// Amount to bump next variable with.
    var_inc: f64,
    var_decay: f64,

    /// Assignment stack; stores all assigments made in the order they were made.
    trail: Vec<Lit>,
    /// Separator indices for different decision levels in `trail`.
    trail_lim: Vec<i32>,
}

struct SolverV {
    vars: VarState,

    learntsize_adjust_start_confl: i32,
    learntsize_adjust_inc: f64,
    max_learnts: f64,
    learntsize_adjust_confl: f64,
    learntsize_adjust_cnt: i32,

    /// Remove satisfied original clauses in `simplify`? Turned off while a
    /// saved state is active.
    remove_satisfied: bool,

    // Statistics: (read-only member variable)
    solves: u64,
    starts: u64,
    decisions: u64,
    rnd_decisions: u64,
    propagations: u64,
    conflicts: u64,
    dec_vars: u64,
    max_literals: u64,
    tot_literals: u64,

    num_clauses: u64,
    num_learnts: u64,
    clauses_literals: u64,
    learnts_literals: u64,

    // Mode of operation:
    clause_decay: f64,
    random_var_freq: f64,
    random_seed: f64,
    luby_restart: bool,
    /// Controls conflict clause minimization (0=none, 1=basic, 2=deep).
    ccmin_mode: i32,
    /// Controls the level of phase saving (0=none, 1=limited, 2=full).
    phase_saving: i32,
    /// Use random polarities for branching heuristics.
    rnd_pol: bool,
    /// Initialize variable activities with a small random value.
    rnd_init_act: bool,
    /// The fraction of wasted memory allowed before a garbage collection is triggered.
    garbage_frac: f64,
    /// Minimum number to set the learnts limit to.
    min_learnts_lim: i32,

    /// The initial restart limit. (default 100)
    restart_first: i32,
    /// The factor with which the restart limit is multiplied in each restart. (default 2)
    restart_inc: f64,
    /// The intitial limit for learnt clauses is a factor of the original clauses. (default 1 / 3)
    learntsize_factor: f64,
    /// The limit for learnt clauses is multiplied with this factor each restart. (default 1.1)
    learntsize_inc: f64,

    /// Let the host substitute branching candidates?
    use_custom_branch: bool,
    /// Probability of consulting the host for a branching candidate; decays
    /// toward 0.25 each time it fires.
    custom_branch_freq: f64,

    /// The preferred polarity of each variable.
    polarity: VMap<bool>,
    /// The users preferred polarity of each variable.
    user_pol: VMap<lbool>,
    /// Declares if a variable is eligible for selection in the decision heuristic.
    decision: VMap<bool>,
    /// `watches[lit]` is a list of constraints watching 'lit' (will go there if literal becomes true).
    watches_data: OccListsData<Lit, Watcher>,
    /// A priority queue of variables ordered with respect to the variable activity.
    order_heap_data: HeapData<Var>,
    /// If `false`, the constraints are already unsatisfiable. No part of the solver state may be used!
    ok: bool,
    /// Amount to bump next clause with.
    cla_inc: f64,
    /// Head of queue (as index into the trail).
    qhead: i32,
    /// Number of top-level assignments since last execution of 'simplify()'.
    simp_db_assigns: i32,
    /// Remaining number of propagations that must be made before next execution of 'simplify()'.
    simp_db_props: i64,
    /// Set by `search()`.
    progress_estimate: f64,
    /// All variables are assigned and the candidate model was handed to the
    /// host for a final check. Reset on backtrack.
    full_assignment: bool,

    /// Next variable to be created.
    next_var: Var,
    ca: ClauseAllocator,

    /// Current set of assumptions provided to solve by the user.
    assumptions: Vec<Lit>,

    // Temporaries (to reduce allocation overhead). Each variable is prefixed by the method in
    // which it is used, except `seen` which is used in several places.
    seen: VMap<Seen>,
    minimize_stack: Vec<Lit>,
    analyze_toclear: Vec<Lit>,
    /// Buffer for explanation clauses obtained from the host mid-analysis.
    /// Consumed by a single resolution step; nothing outlives that step.
    tmp_explain: Vec<Lit>,

    // Resource contraints:
    conflict_budget: i64,
    propagation_budget: i64,
}

/// Snapshot taken by `save_state`.
///
/// Restoring truncates the trail and the clause lists, so lengths are all
/// that needs capturing.
struct SavedState {
    ok: bool,
    level: u32,
    qhead: i32,
    trail_len: usize,
    clauses_len: usize,
}

/// Print the model as DIMACS
pub struct SolverPrintDimacs<'a, Cb: Callbacks + 'a> {
    s: &'a Solver<Cb>,
}

impl<'a, Cb: Callbacks> fmt::Display for SolverPrintDimacs<'a, Cb> {
    fn fmt(&self, out: &mut fmt::Formatter) -> fmt::Result {
        write!(out, "v ")?;
        for (i, &val) in self.s.model.iter().enumerate() {
            if val == lbool::TRUE {
                write!(out, "{} ", i + 1)?
            } else if val == lbool::FALSE {
                write!(out, "-{} ", i + 1)?
            }
        }
        writeln!(out, "0")
    }
}

// public API
impl<Cb: Callbacks> SolverInterface for Solver<Cb> {
    fn new_var<H: Host>(&mut self, th: &mut H, upol: lbool, dvar: bool) -> Var {
        self.v.new_var(th, upol, dvar)
    }

    fn new_var_default<H: Host>(&mut self, th: &mut H) -> Var {
        self.new_var(th, lbool::UNDEF, true)
    }

    fn add_clause_reuse<H: Host>(&mut self, th: &mut H, clause: &mut Vec<Lit>) -> bool {
        debug!("add clause {:?}", clause);
        if !self.v.ok {
            return false;
        }
        clause.sort_unstable();
        clause.dedup();
        if self.v.decision_level() > 0 {
            // under a partial assignment the two watches must be non-false;
            // otherwise restart the addition from the root
            let nonfalse = clause
                .iter()
                .filter(|&&l| self.v.value_lit(l) != lbool::FALSE)
                .take(2)
                .count();
            if nonfalse < 2 {
                self.cancel_until(th, 0);
            }
        }
        self.add_clause_(th, clause)
    }

    fn add_learned_clause<H: Host>(&mut self, th: &mut H, clause: &[Lit]) -> bool {
        debug!("add host-learned clause {:?}", clause);
        if !self.v.ok {
            return false;
        }
        if clause.len() > 1 {
            let mut lits = clause.to_vec();
            self.v.sort_clause_lits(&mut lits);
            let cr = self.v.ca.alloc_with_learnt(&lits, true);
            self.learnts.push(cr);
            th.on_clause_added(&lits);
            self.cb.on_new_clause(&lits, clause::Kind::Host);
            self.v.attach_clause(th, cr);
            self.v.cla_bump_activity(&self.learnts, cr);
            true
        } else {
            debug_assert_eq!(clause.len(), 1);
            self.cancel_until(th, 0);
            let mut ps = clause.to_vec();
            self.add_clause_reuse(th, &mut ps)
        }
    }

    fn set_assumptions(&mut self, assumps: &[Lit]) {
        self.v.assumptions.clear();
        self.v.assumptions.extend_from_slice(assumps);
    }

    fn solve_limited<H: Host>(&mut self, th: &mut H, nosearch: bool) -> lbool {
        self.asynch_interrupt.store(false, Ordering::SeqCst);
        self.solve_internal(th, nosearch)
    }

    #[inline(always)]
    fn simplify<H: Host>(&mut self, th: &mut H) -> bool {
        self.simplify_internal(th)
    }

    fn cancel_until<H: Host>(&mut self, th: &mut H, level: u32) {
        self.v.cancel_until(th, level)
    }

    fn set_decidable<H: Host>(&mut self, th: &mut H, v: Var, dvar: bool) {
        self.v.set_decidable(th, v, dvar)
    }

    fn save_state(&mut self) {
        debug_assert!(self.saved.is_none(), "nested save_state");
        self.v.remove_satisfied = false;
        self.saved = Some(SavedState {
            ok: self.v.ok,
            level: self.v.decision_level(),
            qhead: self.v.qhead,
            trail_len: self.v.vars.trail.len(),
            clauses_len: self.clauses.len(),
        });
    }

    fn reset_state<H: Host>(&mut self, th: &mut H) {
        let saved = self
            .saved
            .take()
            .expect("reset_state without a preceding save_state");
        self.v.ok = saved.ok;
        self.v.cancel_until(th, saved.level);

        // drop assignments appended at the saved levels since the save
        while self.v.vars.trail.len() > saved.trail_len {
            let p = self.v.vars.trail.pop().expect("trail underflow");
            let x = p.var();
            self.v.vars.ass[x] = lbool::UNDEF;
            self.v.insert_var_order(x);
        }
        self.v.qhead = cmp::min(saved.qhead, self.v.vars.trail.len() as i32);

        // remove clauses added since the save
        while self.clauses.len() > saved.clauses_len {
            let cr = self.clauses.pop().expect("clause list underflow");
            self.v.remove_clause(cr);
        }
        // remove all learnt clauses
        while let Some(cr) = self.learnts.pop() {
            self.v.remove_clause(cr);
        }

        self.v.remove_satisfied = true;
        self.check_garbage();
    }

    fn is_ok(&self) -> bool {
        self.v.ok
    }

    fn get_model(&self) -> &[lbool] {
        &self.model
    }

    fn value_var(&self, v: Var) -> lbool {
        self.model
            .get(v.idx() as usize)
            .map_or(lbool::UNDEF, |&v| v)
    }
    fn value_lit(&self, v: Lit) -> lbool {
        self.value_var(v.var()) ^ !v.sign()
    }

    fn value_lvl_0(&self, lit: Lit) -> lbool {
        let mut res = self.v.value_lit(lit);
        if self.v.level(lit.var()) != 0 {
            res = lbool::UNDEF;
        }
        res
    }

    fn proved_at_lvl_0(&self) -> &[Lit] {
        self.v.vars.proved_at_lvl_0()
    }

    fn unsat_core(&self) -> &[Lit] {
        self.conflict.as_slice()
    }

    fn unsat_core_contains_lit(&self, lit: Lit) -> bool {
        self.conflict.has(lit)
    }

    fn unsat_core_contains_var(&self, v: Var) -> bool {
        let lit = Lit::new(v, true);
        self.unsat_core_contains_lit(lit) || self.unsat_core_contains_lit(!lit)
    }

    fn num_vars(&self) -> u32 {
        self.v.num_vars()
    }
    fn num_clauses(&self) -> u64 {
        self.v.num_clauses
    }
    fn num_conflicts(&self) -> u64 {
        self.v.conflicts
    }
    fn num_propagations(&self) -> u64 {
        self.v.propagations
    }
    fn num_decisions(&self) -> u64 {
        self.v.decisions
    }
    fn num_restarts(&self) -> u64 {
        self.v.starts
    }

    fn print_stats(&self) {
        println!("c restarts              : {}", self.v.starts);
        println!("c conflicts             : {:<12}", self.v.conflicts);
        println!(
            "c decisions             : {:<12}   ({:4.2} % random)",
            self.v.decisions,
            self.v.rnd_decisions as f32 * 100.0 / self.v.decisions as f32
        );
        println!("c propagations          : {:<12}", self.v.propagations);
        println!(
            "c conflict literals     : {:<12}   ({:4.2} % deleted)",
            self.v.tot_literals,
            (self.v.max_literals - self.v.tot_literals) as f64 * 100.0 / self.v.max_literals as f64
        );
    }

    fn set_conflict_budget(&mut self, b: i64) {
        self.v.conflict_budget = b;
    }
    fn set_propagation_budget(&mut self, b: i64) {
        self.v.propagation_budget = b;
    }
    fn budget_off(&mut self) {
        self.v.conflict_budget = -1;
        self.v.propagation_budget = -1;
    }
}

impl<Cb: Callbacks + Default> Default for Solver<Cb> {
    fn default() -> Self {
        Solver::new(SolverOpts::default(), Default::default())
    }
}

// partial check, or full-assignment check?
enum HostCall {
    Partial,
    Final,
}

// main algorithm
impl<Cb: Callbacks> Solver<Cb> {
    /// Create a new solver with the given options and callbacks.
    pub fn new(opts: SolverOpts, cb: Cb) -> Self {
        assert!(opts.check());
        Self {
            model: vec![],
            conflict: LSet::new(),
            cb,
            clauses: vec![],
            learnts: vec![],
            saved: None,
            asynch_interrupt: AtomicBool::new(false),
            v: SolverV::new(&opts),
            tmp_c_host: vec![],
        }
    }

    /// Begins a new decision level.
    fn new_decision_level<H: Host>(&mut self, th: &mut H) {
        trace!("new decision level {}", 1 + self.v.decision_level());
        self.v.vars.new_decision_level();
        th.create_level();
        debug_assert_eq!(
            self.v.decision_level() as usize,
            th.n_levels(),
            "same number of levels for host and trail"
        );
    }

    fn simplify_internal<H: Host>(&mut self, th: &mut H) -> bool {
        debug_assert_eq!(self.v.decision_level(), 0);

        if !self.v.ok {
            return false;
        }
        if self.v.bcp(th).is_some() {
            self.v.ok = false;
            th.on_unsat();
            return false;
        }

        if self.v.num_assigns() as i32 == self.v.simp_db_assigns || self.v.simp_db_props > 0 {
            return true;
        }

        self.remove_satisfied(ClauseSetSelect::Learnt); // Remove satisfied learnt clauses
        if self.v.remove_satisfied {
            self.remove_satisfied(ClauseSetSelect::Original); // remove satisfied normal clauses
        }
        self.check_garbage();
        self.v.rebuild_order_heap();

        self.v.simp_db_assigns = self.v.num_assigns() as i32;
        // (shouldn't depend on stats really, but it will do for now)
        self.v.simp_db_props = (self.v.clauses_literals + self.v.learnts_literals) as i64;

        true
    }

    /// Search for a model the specified number of conflicts.
    ///
    /// Use negative value for `nof_conflicts` indicate infinity.
    ///
    /// # Output:
    ///
    /// - `lbool::TRUE` if a partial assigment that is consistent with respect to the clauseset
    ///    and accepted by the host is found. If all variables are decision variables, this means
    ///    that the clause set is satisfiable.
    /// - `lbool::FALSE` if the clause set is unsatisfiable.
    /// - `lbool::UNDEF` if the bound on number of conflicts is reached.
    fn search<H: Host>(
        &mut self,
        th: &mut H,
        nof_conflicts: i32,
        nosearch: bool,
        tmp_learnt: &mut Vec<Lit>,
    ) -> lbool {
        debug_assert!(self.v.ok);
        let mut conflict_c = 0;
        self.v.starts += 1;

        'main: loop {
            if self.stop_requested() {
                return lbool::UNDEF;
            }

            // boolean propagation
            let confl = self.v.bcp(th);

            if let Some(confl) = confl {
                // conflict analysis
                self.v.conflicts += 1;
                conflict_c += 1;
                if self.v.decision_level() == 0 {
                    return lbool::FALSE;
                }

                let learnt = self
                    .v
                    .analyze(Conflict::Bcp(confl), &self.learnts, tmp_learnt, th);
                self.add_learnt_and_backtrack(th, learnt, clause::Kind::Learnt);
                if !self.v.ok {
                    return lbool::FALSE;
                }

                self.v.vars.var_decay_activity();
                self.v.cla_decay_activity();

                self.v.learntsize_adjust_cnt -= 1;
                if self.v.learntsize_adjust_cnt == 0 {
                    self.v.learntsize_adjust_confl *= self.v.learntsize_adjust_inc;
                    self.v.learntsize_adjust_cnt = self.v.learntsize_adjust_confl as i32;
                    self.v.max_learnts *= self.v.learntsize_inc;

                    let trail_lim_head = self
                        .v
                        .vars
                        .trail_lim
                        .first()
                        .cloned()
                        .unwrap_or(self.v.vars.trail.len() as i32);
                    let v = &self.v;
                    self.cb.on_progress(|| ProgressStatus {
                        conflicts: v.conflicts as i32,
                        dec_vars: v.dec_vars as i32 - trail_lim_head,
                        n_clauses: v.num_clauses,
                        n_clause_lits: v.clauses_literals as i32,
                        max_learnt: v.max_learnts as i32,
                        n_learnt: v.num_learnts,
                        n_learnt_lits: v.learnts_literals as f64 / v.num_learnts as f64,
                        progress_estimate: v.progress_estimate() * 100.0,
                    });
                }
            } else {
                // no boolean conflict
                if (nof_conflicts >= 0 && conflict_c >= nof_conflicts) || !self.within_budget() {
                    // Reached bound on number of conflicts:
                    self.v.progress_estimate = self.v.progress_estimate();
                    self.v.cancel_until(th, 0);
                    return lbool::UNDEF;
                }

                // Simplify the set of problem clauses:
                if self.v.decision_level() == 0 && !self.simplify_internal(th) {
                    return lbool::FALSE;
                }

                if self.learnts.len() as f64 - self.v.num_assigns() as f64 >= self.v.max_learnts {
                    // Reduce the set of learnt clauses:
                    self.reduce_db();
                }

                // give the host a chance to propagate on the partial model
                {
                    let th_res = self.call_host(th, HostCall::Partial, tmp_learnt);

                    if th_res == lbool::UNDEF {
                        // some host propagations, do not decide yet
                        continue 'main;
                    } else if th_res == lbool::FALSE {
                        // conflict, we backtracked and propagated a SAT literal
                        self.v.conflicts += 1;
                        conflict_c += 1;
                        if !self.v.ok {
                            return lbool::FALSE;
                        }
                        continue 'main;
                    }
                }

                // select the next decision (using assumptions, or variable heap)
                let mut next = Lit::UNDEF;
                while (self.v.decision_level() as usize) < self.v.assumptions.len() {
                    // Perform user provided assumption:
                    let p = self.v.assumptions[self.v.decision_level() as usize];
                    if self.v.value_lit(p) == lbool::TRUE {
                        // Dummy decision level, since `p` is true already:
                        self.new_decision_level(th);
                    } else if self.v.value_lit(p) == lbool::FALSE {
                        // assumption `p` is impossible, express the conflict
                        // in terms of the other assumptions
                        let mut conflict = mem::replace(&mut self.conflict, LSet::new());
                        self.v.analyze_final(th, !p, &mut conflict);
                        self.cb
                            .on_new_clause(conflict.as_slice(), clause::Kind::Learnt);
                        self.conflict = conflict;
                        return lbool::FALSE;
                    } else {
                        next = p;
                        break;
                    }
                }

                if next == Lit::UNDEF {
                    if nosearch {
                        // all assumptions are placed and propagated
                        return lbool::TRUE;
                    }

                    // new variable decision:
                    next = self.pick_branch_lit(th);

                    if next == Lit::UNDEF {
                        // no decision left: let the host verify the candidate model
                        self.v.full_assignment = true;
                        let th_res = self.call_host(th, HostCall::Final, tmp_learnt);

                        if th_res == lbool::TRUE {
                            if !self.v.order_heap_data.is_empty() {
                                // the host made variables available again
                                continue 'main;
                            }
                            // Model found and validated by the host
                            return lbool::TRUE;
                        } else if th_res == lbool::UNDEF {
                            // some propagations during the final check
                            continue 'main;
                        } else {
                            debug_assert_eq!(th_res, lbool::FALSE);
                            // conflict, we backtracked and propagated a SAT literal
                            self.v.conflicts += 1;
                            conflict_c += 1;
                            if !self.v.ok {
                                return lbool::FALSE;
                            }
                            continue 'main;
                        }
                    }
                    // proper decision, keep `next`
                    self.v.decisions += 1;
                }

                debug_assert_ne!(next, Lit::UNDEF);

                // Increase decision level and enqueue `next`
                // with no justification since it's a decision
                self.new_decision_level(th);
                debug!("pick-next {:?}", next);
                self.v.enqueue(th, next, CRef::UNDEF);
            }
        }
    }

    /// Add a learnt clause and backtrack/propagate as necessary
    fn add_learnt_and_backtrack<H: Host>(
        &mut self,
        th: &mut H,
        learnt: LearntClause,
        k: clause::Kind,
    ) {
        self.cb.on_new_clause(learnt.clause, k);
        self.v.cancel_until(th, learnt.backtrack_lvl as u32);

        // propagate the only lit of `learnt.clause` that isn't false
        if learnt.clause.len() == 1 {
            // directly propagate the unit clause at level 0
            self.v.enqueue(th, learnt.clause[0], CRef::UNDEF);
        } else if learnt.clause.is_empty() {
            self.v.ok = false;
            th.on_unsat();
        } else {
            // propagate the lit, justified by `cr`
            let cr = self.v.ca.alloc_with_learnt(learnt.clause, true);
            self.learnts.push(cr);
            th.on_clause_added(learnt.clause);
            self.v.attach_clause(th, cr);
            self.v.cla_bump_activity(&self.learnts, cr);
            self.v.enqueue(th, learnt.clause[0], cr);
        }
    }

    /// Hand the current (possibly partial) model to the host.
    ///
    /// Returns `UNDEF` if the host propagated something, `TRUE` if
    /// the host accepted the model without propagations, and `FALSE` if
    /// the host rejected the model.
    fn call_host<H: Host>(&mut self, th: &mut H, k: HostCall, tmp_learnt: &mut Vec<Lit>) -> lbool {
        let mut th_arg = {
            let confl_cl = &mut self.tmp_c_host;
            confl_cl.clear();
            HostArg {
                v: &mut self.v,
                lits: confl_cl,
                has_propagated: false,
                conflict: HostConflict::Nil,
            }
        };
        // call the host
        match k {
            HostCall::Partial => th.propagate(&mut th_arg),
            HostCall::Final => th.check_full_assignment(&mut th_arg),
        }
        match th_arg.conflict {
            HostConflict::Clause => {
                let mut local_confl_cl = vec![];
                mem::swap(&mut local_confl_cl, th_arg.lits);
                drop(th_arg);

                debug!("host conflict {:?}", local_confl_cl);
                self.v.sort_clause_lits(&mut local_confl_cl); // as if it were a normal clause
                local_confl_cl.dedup();
                let learnt = {
                    let r = Conflict::Host {
                        lits: &local_confl_cl,
                    };
                    self.v.analyze(r, &self.learnts, tmp_learnt, th)
                };
                self.add_learnt_and_backtrack(th, learnt, clause::Kind::Host);
                mem::swap(&mut local_confl_cl, &mut self.tmp_c_host); // re-use buffer
                lbool::FALSE
            }
            HostConflict::Prop(p) => {
                // conflict: propagation of a lit known to be false
                drop(th_arg);
                debug!("inconsistent host propagation {:?}", p);
                let learnt = self
                    .v
                    .analyze(Conflict::HostProp(p), &self.learnts, tmp_learnt, th);
                self.add_learnt_and_backtrack(th, learnt, clause::Kind::Host);
                lbool::FALSE
            }
            HostConflict::Nil => {
                let has_propagated = th_arg.has_propagated;
                drop(th_arg);
                if has_propagated {
                    lbool::UNDEF
                } else {
                    lbool::TRUE // Model validated without further work needed
                }
            }
        }
    }

    /// Main solve method (assumptions given in `self.v.assumptions`).
    fn solve_internal<H: Host>(&mut self, th: &mut H, nosearch: bool) -> lbool {
        debug_assert!(self.v.decision_level() == 0);
        self.model.clear();
        self.conflict.clear();
        if !self.v.ok {
            return lbool::FALSE;
        }

        self.v.solves += 1;
        let mut tmp_learnt: Vec<Lit> = vec![];

        self.v.max_learnts = self.num_clauses() as f64 * self.v.learntsize_factor;
        if self.v.max_learnts < self.v.min_learnts_lim as f64 {
            self.v.max_learnts = self.v.min_learnts_lim as f64;
        }

        self.v.learntsize_adjust_confl = self.v.learntsize_adjust_start_confl as f64;
        self.v.learntsize_adjust_cnt = self.v.learntsize_adjust_confl as i32;
        let mut status;

        info!("search.start");
        self.cb.on_start();

        // Search:
        let mut curr_restarts: i32 = 0;
        loop {
            let rest_base = if self.v.luby_restart {
                utils::luby(self.v.restart_inc, curr_restarts)
            } else {
                f64::powi(self.v.restart_inc, curr_restarts)
            };
            let nof_conflicts = (rest_base * self.v.restart_first as f64) as i32;
            status = self.search(th, nof_conflicts, nosearch, &mut tmp_learnt);
            if nosearch || !self.within_budget() {
                break;
            }

            if status != lbool::UNDEF {
                break;
            } else {
                info!("search.restart({})", curr_restarts);
                curr_restarts += 1;
                self.cb.on_restart();
            }
        }

        self.cb.on_result(status);

        if status == lbool::TRUE {
            // Extend & copy model:
            let num_vars = self.num_vars();
            self.model.resize(num_vars as usize, lbool::UNDEF);
            for i in 0..num_vars {
                self.model[i as usize] = self.v.value(Var::from_idx(i));
            }
            #[cfg(debug_assertions)]
            {
                if !nosearch {
                    for &cr in &self.clauses {
                        debug_assert!(
                            self.v.satisfied(self.v.ca.get_ref(cr)),
                            "model leaves a clause unsatisfied"
                        );
                    }
                }
            }
        } else if status == lbool::FALSE && self.conflict.len() == 0 {
            // NOTE: we may return `false` without an empty conflict in case we had assumptions. In
            // this case `self.conflict` contains the unsat-core but adding new clauses might
            // succeed in the absence of these assumptions.
            self.v.ok = false;
            th.on_unsat();
        }

        self.v.cancel_until(th, 0);
        debug!("res: {:?}", status);
        status
    }

    /// Pick a literal to make a decision with.
    fn pick_branch_lit<H: Host>(&mut self, th: &mut H) -> Lit {
        let (mut next, peeked) = self.v.pick_branch_candidate();

        if next != Var::UNDEF {
            if self.v.use_custom_branch {
                // the candidate stays in the heap: the host may pick another
                // variable, and an assigned top is discarded lazily anyway
                if utils::drand(&mut self.v.random_seed) < self.v.custom_branch_freq {
                    if self.v.custom_branch_freq > 0.25 {
                        self.v.custom_branch_freq -= 0.01;
                    }
                    next = th.change_branch_choice(next);
                    debug_assert!(self.v.value(next) == lbool::UNDEF);
                }
            } else if peeked {
                self.v.order_heap().remove_min();
            }
        }

        self.v.polarity_lit(next)
    }

    /// Remove half of the learnt clauses, minus the clauses locked by the current assignment. Locked
    /// clauses are clauses that are reason to some assignment. Binary clauses are never removed.
    fn reduce_db(&mut self) {
        let extra_lim = self.v.cla_inc / self.learnts.len() as f64; // Remove any clause below this activity

        debug!("reduce_db.start");

        {
            let ca = &self.v.ca;
            self.learnts.sort_unstable_by(|&x, &y| {
                let x = ca.get_ref(x);
                let y = ca.get_ref(y);
                debug_assert!(x.learnt());
                debug_assert!(y.learnt());
                Ord::cmp(&(x.size() <= 2), &(y.size() <= 2)).then(
                    PartialOrd::partial_cmp(&x.activity(), &y.activity()).expect("NaN activity"),
                )
            });
        }
        // Don't delete binary or locked clauses. From the rest, delete clauses from the first half
        // and clauses with activity smaller than `extra_lim`:
        let mut j = 0;
        for i in 0..self.learnts.len() {
            let cr = self.learnts[i];
            let cond = {
                let c = self.v.ca.get_ref(cr);
                c.size() > 2
                    && !self.v.locked(c)
                    && (i < self.learnts.len() / 2 || (c.activity() as f64) < extra_lim)
            };
            if cond {
                self.v.remove_clause(cr);
                self.cb.on_delete_clause(self.v.ca.get_ref(cr).lits());
            } else {
                self.learnts[j] = cr;
                j += 1;
            }
        }

        let _deleted = self.learnts.len() - j;
        self.learnts.truncate(j);

        debug!("reduce_db.done (deleted {})", _deleted);

        self.check_garbage();
    }

    /// Shrink the given set to contain only non-satisfied clauses.
    fn remove_satisfied(&mut self, which: ClauseSetSelect) {
        debug_assert_eq!(self.v.decision_level(), 0);
        let cs: &mut Vec<CRef> = match which {
            ClauseSetSelect::Learnt => &mut self.learnts,
            ClauseSetSelect::Original => &mut self.clauses,
        };
        let self_v = &mut self.v;
        cs.retain(|&cr| {
            let satisfied = self_v.satisfied(self_v.ca.get_ref(cr));
            if satisfied {
                self_v.remove_clause(cr);
                debug!("remove satisfied clause {:?}", self_v.ca.get_ref(cr).lits());
            } else {
                let amount_shaved = {
                    let mut c = self_v.ca.get_mut(cr);
                    // Trim clause (but keep the 2 first lits as they are watching):
                    debug_assert_eq!(self_v.vars.value_lit(c[0]), lbool::UNDEF);
                    debug_assert_eq!(self_v.vars.value_lit(c[1]), lbool::UNDEF);
                    let mut k = 2;
                    let orig_size = c.size();
                    let mut end = c.size();
                    while k < end {
                        if self_v.vars.value_lit(c[k]) == lbool::FALSE {
                            // this lit is false at level 0, remove it from `c`
                            debug_assert!(self_v.vars.level(c[k].var()) == 0);
                            end -= 1;
                            c[k] = c[end];
                        } else {
                            k += 1;
                        }
                    }
                    c.shrink(end);
                    (orig_size - end) as usize
                };
                // needed for correct wasted-space accounting
                self_v.ca.free_amount(amount_shaved);
            }
            !satisfied
        });
    }

    /// Garbage collect the clause allocator by moving alive clauses into
    /// another allocator.
    fn garbage_collect(&mut self) {
        // Initialize the next region to a size corresponding to the estimated utilization degree. This
        // is not precise but should avoid some unnecessary reallocations for the new region:
        let mut to = ClauseAllocator::with_start_cap(self.v.ca.len() - self.v.ca.wasted());

        self.v
            .reloc_all(&mut self.learnts, &mut self.clauses, &mut to);

        self.cb.on_gc(self.v.ca.len(), to.len());
        self.v.ca = to;
    }

    /// Check whether the space wasted by dead clauses in the clause allocator exceeds
    /// the threshold
    fn check_garbage(&mut self) {
        if self.v.ca.wasted() as f64 > self.v.ca.len() as f64 * self.v.garbage_frac {
            self.garbage_collect();
        }
    }

    /// Temporary access to the callbacks
    pub fn cb_mut(&mut self) -> &mut Cb {
        &mut self.cb
    }

    /// Temporary access to the callbacks
    pub fn cb(&self) -> &Cb {
        &self.cb
    }

    pub fn dimacs_model(&self) -> SolverPrintDimacs<Cb> {
        SolverPrintDimacs { s: self }
    }

    /// Did the last search reach a full assignment that was handed to the
    /// host for validation?
    pub fn is_full_assignment(&self) -> bool {
        self.v.full_assignment
    }

    /// Interrupt search asynchronously
    pub fn interrupt_async(&self) {
        self.asynch_interrupt.store(true, Ordering::Relaxed);
    }

    fn has_been_interrupted(&self) -> bool {
        self.asynch_interrupt.load(Ordering::Relaxed)
    }

    fn stop_requested(&self) -> bool {
        self.has_been_interrupted() || self.cb.stop()
    }

    fn within_budget(&self) -> bool {
        !self.has_been_interrupted()
            && (self.v.conflict_budget < 0 || self.v.conflicts < self.v.conflict_budget as u64)
            && (self.v.propagation_budget < 0
                || self.v.propagations < self.v.propagation_budget as u64)
            && !self.cb.stop()
    }

    /// Literals of every original clause, for boundary output.
    pub(crate) fn original_clauses(&self) -> impl Iterator<Item = &[Lit]> + '_ {
        let v = &self.v;
        self.clauses.iter().map(move |&cr| v.ca.get_ref(cr).lits())
    }

    pub(crate) fn current_value_lit(&self, l: Lit) -> lbool {
        self.v.value_lit(l)
    }

    /// Add clause; the problem becomes unsatisfiable if it reduces to the
    /// empty clause, or if its unit propagation closes a conflict.
    ///
    /// Precondition: `clause` is sorted and deduplicated.
    fn add_clause_<H: Host>(&mut self, th: &mut H, clause: &mut Vec<Lit>) -> bool {
        if !self.v.ok {
            return false;
        }

        let mut last_lit = Lit::UNDEF;
        let mut j = 0;
        // remove root-false literals, spot tautologies and root-satisfied clauses
        for i in 0..clause.len() {
            let lit_i = clause[i];
            let value = self.v.value_lit(lit_i);
            let lvl = self.v.level_lit(lit_i);
            if (value == lbool::TRUE && lvl == 0) || lit_i == !last_lit {
                return true; // tauto or satisfied already at level 0
            } else if !(value == lbool::FALSE && lvl == 0) && lit_i != last_lit {
                // not a duplicate
                last_lit = lit_i;
                clause[j] = lit_i;
                j += 1;
            }
        }

        clause.truncate(j);
        if clause.is_empty() {
            self.v.ok = false;
            th.on_unsat();
            return false;
        } else if clause.len() == 1 {
            debug_assert_eq!(self.v.decision_level(), 0, "unit under a partial assignment");
            self.v.enqueue(th, clause[0], CRef::UNDEF);
            if self.v.bcp(th).is_some() {
                self.v.ok = false;
                th.on_unsat();
                return false;
            }
        } else {
            if self.v.decision_level() > 0 {
                // the watched positions must hold the non-false literals
                self.v.sort_clause_lits(clause);
            }
            let cr = self.v.ca.alloc_with_learnt(&clause, false);
            self.clauses.push(cr);
            th.on_clause_added(&clause);
            self.v.attach_clause(th, cr);
        }

        true
    }
}

/// Host-triggered conflict.
#[derive(Clone, Copy)]
enum HostConflict {
    Nil,
    Clause,
    Prop(Lit),
}

/// The temporary argument passed to the host's propagation and
/// full-assignment callbacks.
///
/// This is where the host can enqueue propagations or reject the model.
pub struct HostArg<'a> {
    v: &'a mut SolverV,
    lits: &'a mut Vec<Lit>,
    has_propagated: bool,
    conflict: HostConflict,
}

/// Temporary representation of a learnt clause, produced in `analyze`.
struct LearntClause<'a> {
    clause: &'a [Lit],  // the clause
    backtrack_lvl: i32, // where to backtrack?
}

#[derive(Clone, Copy, Debug)]
enum Conflict<'a> {
    /// boolean propagation conflict
    Bcp(CRef),
    /// clause provided by the host, false under the current trail
    Host { lits: &'a [Lit] },
    /// the host propagated a literal that is false
    HostProp(Lit),
}

#[derive(Clone, Copy, Debug)]
enum ResolveWith<'a> {
    Init(Conflict<'a>), // initial conflict
    Resolve(Lit, CRef), // propagation of lit because of clause
}

impl SolverV {
    #[inline(always)]
    pub fn num_assigns(&self) -> u32 {
        self.vars.num_assigns()
    }

    #[inline(always)]
    fn num_vars(&self) -> u32 {
        self.next_var.idx()
    }

    #[inline(always)]
    pub fn level(&self, x: Var) -> i32 {
        self.vars.level(x)
    }

    #[inline(always)]
    pub fn level_lit(&self, x: Lit) -> i32 {
        self.level(x.var())
    }

    #[inline(always)]
    pub fn value(&self, x: Var) -> lbool {
        self.vars.value(x)
    }

    #[inline(always)]
    pub fn value_lit(&self, x: Lit) -> lbool {
        self.vars.value_lit(x)
    }

    #[inline(always)]
    pub fn decision_level(&self) -> u32 {
        self.vars.decision_level()
    }

    #[inline(always)]
    fn reason(&self, x: Var) -> CRef {
        self.vars.reason(x)
    }

    fn order_heap(&mut self) -> Heap<Var, VarOrder> {
        self.order_heap_data.promote(VarOrder {
            activity: &self.vars.activity,
        })
    }

    /// Make `v` eligible (or ineligible) for branching; no-op if nothing changes.
    fn set_decidable<H: Host>(&mut self, th: &mut H, v: Var, dvar: bool) {
        let newly = dvar && !self.decision[v];
        if newly {
            self.dec_vars += 1;
        } else if !dvar && self.decision[v] {
            self.dec_vars -= 1;
        }
        self.decision[v] = dvar;
        self.insert_var_order(v);
        if newly {
            th.on_became_decidable(v);
        }
    }

    /// Both watched literals of a clause must cover it for the host: when all
    /// decision variables are assigned every clause has to be satisfied, so a
    /// non-false watch is promoted to a decision variable if needed.
    fn check_decision_vars<H: Host>(&mut self, th: &mut H, c0: Lit, c1: Lit) {
        debug_assert!(
            self.value_lit(c0) != lbool::FALSE || self.value_lit(c1) != lbool::FALSE,
            "both watches false"
        );
        if self.value_lit(c0) == lbool::FALSE {
            self.set_decidable(th, c1.var(), true);
        } else if self.value_lit(c1) == lbool::FALSE {
            self.set_decidable(th, c0.var(), true);
        } else if !self.decision[c0.var()] && !self.decision[c1.var()] {
            let choice = utils::irand(&mut self.random_seed, 2);
            let w = if choice == 0 { c0 } else { c1 };
            self.set_decidable(th, w.var(), true);
        }
    }

    fn insert_var_order(&mut self, x: Var) {
        if !self.order_heap().in_heap(x) && self.decision[x] {
            self.order_heap().insert(x);
        }
    }

    fn cla_decay_activity(&mut self) {
        self.cla_inc *= 1.0 / self.clause_decay;
    }

    fn cla_bump_activity(&mut self, learnts: &[CRef], cr: CRef) {
        let new_activity = {
            let mut c = self.ca.get_mut(cr);
            let r = c.activity() + self.cla_inc as f32;
            c.set_activity(r);
            r
        };
        if new_activity > 1e20 {
            // Rescale:
            for &learnt in learnts.iter() {
                let mut c = self.ca.get_mut(learnt);
                let r = c.activity() * 1e-20;
                c.set_activity(r);
            }
            self.cla_inc *= 1e-20;
        }
    }

    /// Find an unassigned decision variable, either at random or from the top
    /// of the activity order. The boolean says whether the candidate is the
    /// (still unpopped) top of the heap.
    fn pick_branch_candidate(&mut self) -> (Var, bool) {
        let mut next = Var::UNDEF;

        // Random decision:
        if utils::drand(&mut self.random_seed) < self.random_var_freq
            && !self.order_heap_data.is_empty()
        {
            let idx_tmp =
                utils::irand(&mut self.random_seed, self.order_heap_data.len() as i32) as usize;
            next = self.order_heap_data[idx_tmp];
            if self.value(next) == lbool::UNDEF && self.decision[next] {
                self.rnd_decisions += 1;
            }
        }

        // Activity based decision; assigned or undecidable entries are stale
        // and get dropped as they surface.
        let mut peeked = false;
        while next == Var::UNDEF || self.value(next) != lbool::UNDEF || !self.decision[next] {
            if peeked {
                self.order_heap().remove_min();
                peeked = false;
            }
            match self.order_heap_data.peek() {
                None => {
                    next = Var::UNDEF;
                    break;
                }
                Some(v) => {
                    next = v;
                    peeked = true;
                }
            }
        }
        (next, peeked)
    }

    /// Choose polarity based on different polarity modes (global or per-variable).
    fn polarity_lit(&mut self, next: Var) -> Lit {
        if next == Var::UNDEF {
            Lit::UNDEF
        } else if self.user_pol[next] != lbool::UNDEF {
            Lit::new(next, self.user_pol[next] == lbool::TRUE)
        } else if self.rnd_pol {
            Lit::new(next, utils::drand(&mut self.random_seed) < 0.5)
        } else {
            Lit::new(next, self.polarity[next])
        }
    }

    fn watches(&mut self) -> OccLists<Lit, Watcher, WatcherDeleted> {
        self.watches_data.promote(WatcherDeleted { ca: &self.ca })
    }

    fn new_var<H: Host>(&mut self, th: &mut H, upol: lbool, dvar: bool) -> Var {
        let v = self.next_var;
        self.next_var = Var::from_idx(self.next_var.idx() + 1);
        self.watches_data.init(Lit::new(v, false));
        self.watches_data.init(Lit::new(v, true));
        self.vars.ass.insert_default(v, lbool::UNDEF);
        self.vars
            .vardata
            .insert_default(v, VarData::new(CRef::UNDEF, 0));
        if self.rnd_init_act {
            self.vars
                .activity
                .insert_default(v, utils::drand(&mut self.random_seed) * 0.00001);
        } else {
            self.vars.activity.insert_default(v, 0.0);
        }
        self.seen.insert_default(v, Seen::UNDEF);
        self.polarity.insert_default(v, false);
        self.user_pol.insert_default(v, upol);
        self.decision.reserve_default(v);
        let len = self.vars.trail.len();
        if v.idx() as usize > len {
            self.vars.trail.reserve(v.idx() as usize + 1 - len);
        }
        th.on_var_added(v);
        self.set_decidable(th, v, dvar);
        v
    }

    /// Put `p` on the trail and notify the host.
    fn enqueue<H: Host>(&mut self, th: &mut H, p: Lit, from: CRef) {
        self.vars.unchecked_enqueue(p, from);
        th.on_assignment(p);
    }

    /// Analyze conflict and produce a reason clause.
    ///
    /// The decision level is first reduced to the maximum assignment level
    /// among the conflicting literals; assignments above it cannot have
    /// contributed.
    ///
    /// # Post-conditions:
    ///
    /// - `backtrack_lvl` is returned.
    /// - `out_learnt[0]` is the asserting literal at level `backtrack_lvl`.
    /// - if `out_learnt.size() > 1` then `out_learnt[1]` has the greatest decision level of the
    ///   rest of literals. There may be others from the same level though.
    fn analyze<'a, H: Host>(
        &mut self,
        orig: Conflict<'a>,
        learnts: &[CRef],
        out_learnt: &'a mut Vec<Lit>,
        th: &mut H,
    ) -> LearntClause<'a> {
        out_learnt.clear();

        debug!("analyze.start {:?}", orig);

        if let Conflict::HostProp(p) = orig {
            // the initial conflict is the host's justification of `p`, which
            // is false in the current trail
            let expl = th.explain(p);
            debug_assert_eq!(expl[0], p);
            self.tmp_explain.clear();
            self.tmp_explain.extend_from_slice(expl);
        }

        // at what level did the conflict happen?
        let conflict_level = {
            let lits: &[Lit] = match orig {
                Conflict::Bcp(cr) => self.ca.get_ref(cr).lits(),
                Conflict::Host { lits } => lits,
                Conflict::HostProp(_) => &self.tmp_explain,
            };
            debug_assert!(lits.iter().all(|&q| self.value_lit(q) == lbool::FALSE));
            debug_assert!(!lits.is_empty(), "conflict clause should have at least 1 lit");
            lits.iter().map(|&q| self.level_lit(q)).max().unwrap_or(0)
        };

        if let Conflict::Host { lits } = orig {
            if lits.len() == 1 {
                // unit clause: learn the clause itself at level 0
                trace!("analyze: learn unit clause {:?} itself", lits);
                return LearntClause {
                    clause: lits,
                    backtrack_lvl: 0,
                };
            }
        }
        if conflict_level == 0 {
            // all at level 0: empty clause
            trace!("analyze: conflict level 0, learn empty clause");
            return LearntClause {
                clause: &[],
                backtrack_lvl: 0,
            };
        }

        self.cancel_until(th, conflict_level as u32);

        let mut cur_clause = ResolveWith::Init(orig);
        let mut path_c = 0;
        #[allow(unused)]
        let mut p = Lit::UNDEF;

        out_learnt.push(Lit::UNDEF); // leave room for the UIP

        let mut index = self.vars.trail.len();

        loop {
            // obtain the literals to resolve with
            let lits: &[Lit] = match cur_clause {
                ResolveWith::Init(Conflict::Host { lits }) => lits,
                ResolveWith::Init(Conflict::HostProp(_)) => &self.tmp_explain,
                ResolveWith::Init(Conflict::Bcp(cr)) => {
                    // bump activity if `cr` is a learnt clause
                    let mut c = self.ca.get_ref(cr);
                    if c.learnt() {
                        self.cla_bump_activity(learnts, cr);
                        c = self.ca.get_ref(cr); // re-borrow
                    }
                    c.lits()
                }
                ResolveWith::Resolve(lit, cr) if cr == CRef::UNDEF => {
                    // `lit` was enqueued by the host without a reason clause;
                    // ask for its justification now. The clause is consumed by
                    // this single resolution step.
                    debug_assert!(path_c > 0);
                    let expl = th.explain(lit);
                    debug_assert_eq!(expl[0], lit);
                    self.tmp_explain.clear();
                    self.tmp_explain.extend_from_slice(&expl[1..]);
                    &self.tmp_explain
                }
                ResolveWith::Resolve(lit, cr) => {
                    // bump activity if `cr` is a learnt clause
                    let mut c = self.ca.get_ref(cr);
                    if c.learnt() {
                        self.cla_bump_activity(learnts, cr);
                        c = self.ca.get_ref(cr); // re-borrow
                    }

                    let lits = c.lits();

                    // `c` propagated `lit` at position 0; skip it, it cannot
                    // appear in the learnt clause
                    debug_assert_eq!(lit.var(), lits[0].var());
                    &lits[1..]
                }
            };
            trace!(
                "analyze.resolve-with {:?} (p: {:?}, path_c: {})",
                lits,
                p,
                path_c
            );

            for &q in lits {
                let lvl = self.vars.level(q.var());
                debug_assert!(lvl <= conflict_level);
                if !self.seen[q.var()].is_seen() && lvl > 0 {
                    self.vars
                        .var_bump_activity(&mut self.order_heap_data, q.var());
                    self.seen[q.var()] = Seen::SOURCE;
                    if lvl == conflict_level {
                        // at conflict level: need to eliminate this lit by resolution
                        path_c += 1;
                    } else {
                        out_learnt.push(q); // part of the learnt clause
                    }
                } else {
                    debug_assert_ne!(
                        self.seen[q.var()],
                        Seen::REMOVABLE,
                        "cycle in the conflict graph around {:?}",
                        q
                    );
                }
            }

            // Select next literal in the trail to look at:
            while !self.seen[self.vars.trail[index - 1].var()].is_seen() {
                debug_assert_eq!(
                    self.vars.level(self.vars.trail[index - 1].var()),
                    conflict_level
                );
                index -= 1;
            }

            p = self.vars.trail[index - 1];
            index -= 1;
            cur_clause = ResolveWith::Resolve(p, self.vars.reason(p.var()));
            self.seen[p.var()] = Seen::REMOVABLE;
            path_c -= 1;

            if path_c <= 0 {
                break;
            }
        }

        // cleanup literals flagged `REMOVABLE`
        index = self.vars.trail.len() - 1;
        loop {
            let q = self.vars.trail[index];
            if self.seen[q.var()] == Seen::REMOVABLE {
                self.seen[q.var()] = Seen::UNDEF;
            }
            if q == p {
                break;
            }
            // decrease the index only when looping again, `p` may sit at 0
            index -= 1;
        }

        debug_assert_ne!(p, Lit::UNDEF);
        debug_assert!(self.value_lit(p) == lbool::TRUE);
        out_learnt[0] = !p;

        trace!("analyze-learnt: {:?} (before minimization)", &out_learnt);
        self.max_literals += out_learnt.len() as u64;

        self.minimize_conflict(out_learnt);

        // Find correct backtrack level:
        let btlevel = if out_learnt.len() == 1 {
            0
        } else {
            let mut max_i = 1;
            let mut max_level = self.level(out_learnt[max_i].var());
            // Find the first literal assigned at the next-highest level:
            for i in 2..out_learnt.len() {
                let level = self.level(out_learnt[i].var());
                if level > max_level {
                    max_i = i;
                    max_level = level;
                }
            }
            // Swap-in this literal at index 1:
            out_learnt.swap(max_i, 1);
            self.level_lit(out_learnt[1])
        };

        for &lit in &self.analyze_toclear {
            self.seen[lit.var()] = Seen::UNDEF; // (`seen[]` is now cleared)
        }
        debug_assert!(out_learnt
            .iter()
            .all(|&l| self.value_lit(l) == lbool::FALSE));
        LearntClause {
            backtrack_lvl: btlevel,
            clause: out_learnt,
        }
    }

    /// An abstraction of the level of a variable
    #[inline]
    fn abstract_level(&self, v: Var) -> u32 {
        1 << (self.level(v) & 31)
    }

    fn minimize_conflict(&mut self, out_learnt: &mut Vec<Lit>) {
        // Simplify conflict clause:
        self.analyze_toclear.clear();
        self.analyze_toclear.extend_from_slice(&out_learnt);
        let new_size = if self.ccmin_mode == 2 {
            let mut abstract_levels = 0;
            for a in out_learnt[1..].iter() {
                abstract_levels |= self.abstract_level(a.var())
            }

            let mut j = 1;
            for i in 1..out_learnt.len() {
                let lit = out_learnt[i];
                // can eliminate `lit` only if it has a reason clause and is redundant
                if self.reason(lit.var()) == CRef::UNDEF
                    || !self.lit_redundant(lit, abstract_levels)
                {
                    out_learnt[j] = lit;
                    j += 1;
                }
            }
            j
        } else if self.ccmin_mode == 1 {
            let mut j = 1;
            for i in 1..out_learnt.len() {
                let lit = out_learnt[i];
                let x = lit.var();
                let reason = self.reason(x);

                let mut retain = true;
                if reason == CRef::UNDEF {
                    debug_assert!(self.level(x) > 0);
                } else {
                    // keep `lit` iff its reason has a literal outside the clause
                    retain = false;
                    let c = self.ca.get_ref(reason);
                    for k in 1..c.size() {
                        let v = c[k].var();
                        if !self.seen[v].is_seen() && self.level(v) > 0 {
                            retain = true;
                            break;
                        }
                    }
                }
                if retain {
                    out_learnt[j] = lit;
                    j += 1;
                }
            }
            j
        } else {
            out_learnt.len()
        };

        self.tot_literals += new_size as u64;
        debug_assert!(new_size <= out_learnt.len());
        out_learnt.truncate(new_size);
    }

    /// Specialized analysis procedure to express the final conflict in terms of assumptions.
    /// Calculates the (possibly empty) set of assumptions that led to the assignment of `p`, and
    /// stores the result in `out_conflict`.
    fn analyze_final<H: Host>(&mut self, th: &mut H, p: Lit, out_conflict: &mut LSet) {
        out_conflict.clear();
        out_conflict.insert(p);
        debug!("analyze_final lit={:?}", p);

        if self.decision_level() == 0 {
            return; // no assumptions
        }

        self.seen[p.var()] = Seen::SOURCE;

        for i in (self.vars.trail_lim[0] as usize..self.vars.trail.len()).rev() {
            let lit = self.vars.trail[i];
            let x = lit.var();
            if self.seen[x].is_seen() {
                let reason = self.reason(x);
                if reason == CRef::UNDEF {
                    debug_assert!(self.level(x) > 0);
                    if self.vars.trail_lim[(self.level(x) - 1) as usize] as usize == i {
                        // a decision, i.e. one of the assumptions
                        out_conflict.insert(!lit);
                    } else {
                        // host propagation: resolve with its justification
                        let expl = th.explain(lit);
                        debug_assert_eq!(expl[0], lit);
                        for &q in &expl[1..] {
                            if self.vars.level(q.var()) > 0 {
                                self.seen[q.var()] = Seen::SOURCE;
                            }
                        }
                    }
                } else {
                    let c = self.ca.get_ref(reason);
                    for j in 1..c.size() {
                        if self.vars.level(c[j].var()) > 0 {
                            self.seen[c[j].var()] = Seen::SOURCE;
                        }
                    }
                }
                self.seen[x] = Seen::UNDEF;
            }
        }

        self.seen[p.var()] = Seen::UNDEF;
        debug_assert!(self.seen.iter().all(|(_, &s)| s == Seen::UNDEF));
    }

    /// Check if `p` can be removed from a conflict clause `C`.
    ///
    /// It can be removed from `C` if it is propagation-implied
    /// by literals of level 0 exclusively or if `C x p.reason` subsumes `C`.
    fn lit_redundant(&mut self, p: Lit, abstract_levels: u32) -> bool {
        self.minimize_stack.clear();
        self.minimize_stack.push(p);

        let top = self.analyze_toclear.len();

        while self.minimize_stack.len() > 0 {
            let q = *self.minimize_stack.last().unwrap();
            let cr = self.reason(q.var());
            debug_assert_ne!(cr, CRef::UNDEF);
            self.minimize_stack.pop();

            let c = self.ca.get_ref(cr);
            // `q` comes from some propagation with `c`, check if these lits can
            // also be eliminated or are already in the learnt clause
            for &l in c.lits()[1..].iter() {
                // Variable at level 0 or previously removable: just skip
                if self.vars.level(l.var()) == 0 || self.seen[l.var()] == Seen::SOURCE {
                    continue;
                }

                if self.reason(l.var()) != CRef::UNDEF
                    && (self.abstract_level(l.var()) & abstract_levels) != 0
                {
                    // NOTE: if the level of `l` isn't in `abstract_levels`, it
                    // comes from a decision level unrelated to the learnt
                    // clause and cannot be eliminated by resolution from it.
                    self.seen[l.var()] = Seen::SOURCE;
                    self.minimize_stack.push(l);
                    self.analyze_toclear.push(l);
                } else {
                    // cannot remove `l`, cancel
                    for a in self.analyze_toclear[top..].iter() {
                        self.seen[a.var()] = Seen::UNDEF;
                    }
                    self.analyze_toclear.truncate(top);
                    return false;
                }
            }
        }

        true
    }

    /// Propagates all enqueued facts.
    ///
    /// If a conflict arises, the conflicting clause is returned,
    /// otherwise `None`.
    ///
    /// # Post-conditions:
    ///
    /// - the propagation queue is empty, even if there was a conflict.
    fn bcp<H: Host>(&mut self, th: &mut H) -> Option<CRef> {
        let mut confl = None;
        let mut num_props: u32 = 0;

        while (self.qhead as usize) < self.vars.trail.len() {
            // `p` is the next enqueued fact to propagate.
            let p = self.vars.trail[self.qhead as usize];
            self.qhead += 1;
            num_props += 1;

            // compact the list first if lazy detaches smudged it
            self.watches_data
                .lookup_mut_pred(p, &WatcherDeleted { ca: &self.ca });

            let mut i: usize = 0;
            let mut j: usize = 0;
            let end: usize = self.watches_data[p].len();
            'clauses: while i < end {
                let Watcher { cref: cr, blocker } = self.watches_data[p][i];

                // Try to avoid inspecting the clause:
                if self.vars.value_lit(blocker) == lbool::TRUE {
                    // the blocker satisfies the clause; keeping its variable
                    // decidable is the cheapest way to keep a decidable watch
                    self.set_decidable(th, blocker.var(), true);
                    self.watches_data[p][j] = Watcher::new(cr, blocker);
                    j += 1;
                    i += 1;
                    continue;
                }

                // Make sure the false literal is data[1]:
                let false_lit = !p;
                let first = {
                    let mut c = self.ca.get_mut(cr);
                    if c[0] == false_lit {
                        c[0] = c[1];
                        c[1] = false_lit;
                    }
                    debug_assert_eq!(c[1], false_lit);
                    c[0]
                };
                i += 1;

                // If 0th watch is true, then clause is already satisfied.
                let w = Watcher::new(cr, first);
                if first != blocker && self.vars.value_lit(first) == lbool::TRUE {
                    self.watches_data[p][j] = w;
                    j += 1;
                    self.check_decision_vars(th, first, false_lit);
                    continue;
                }

                // Look for new watch:
                let new_watch = {
                    let mut c = self.ca.get_mut(cr);
                    let mut found = Lit::UNDEF;
                    for k in 2..c.size() {
                        if self.vars.value_lit(c[k]) != lbool::FALSE {
                            let l = c[k];
                            c[1] = l;
                            c[k] = false_lit;
                            found = l;
                            break;
                        }
                    }
                    found
                };
                if new_watch != Lit::UNDEF {
                    debug_assert_ne!(!new_watch, p);
                    self.watches_data[!new_watch].push(w);
                    self.check_decision_vars(th, first, new_watch);
                    continue 'clauses;
                }

                // Did not find watch -- clause is unit under assignment:
                self.watches_data[p][j] = w;
                j += 1;
                if self.vars.value_lit(first) == lbool::FALSE {
                    confl = Some(cr);
                    self.qhead = self.vars.trail.len() as i32;
                    // Copy the remaining watches:
                    while i < end {
                        let w2 = self.watches_data[p][i];
                        self.watches_data[p][j] = w2;
                        j += 1;
                        i += 1;
                    }
                } else {
                    self.enqueue(th, first, cr);
                    self.check_decision_vars(th, first, false_lit);
                }
            }
            self.watches_data[p].truncate(j);
        }
        self.propagations += num_props as u64;
        self.simp_db_props -= num_props as i64;

        confl
    }

    fn rebuild_order_heap(&mut self) {
        let mut vs = vec![];
        for v in (0..self.num_vars()).map(Var::from_idx) {
            if self.decision[v] && self.value(v) == lbool::UNDEF {
                vs.push(v);
            }
        }
        self.order_heap().build(&vs);
    }

    /// Sort literals of `clause` so that unassigned literals are first,
    /// followed by literals in decreasing assignment level
    fn sort_clause_lits(&self, clause: &mut [Lit]) {
        // sort clause to put unassigned/high level lits first
        clause.sort_unstable_by(|&lit1, &lit2| {
            let has_val1 = self.value_lit(lit1) != lbool::UNDEF;
            let has_val2 = self.value_lit(lit2) != lbool::UNDEF;

            // unassigned variables come first
            if has_val1 && !has_val2 {
                return cmp::Ordering::Greater;
            }
            if !has_val1 && has_val2 {
                return cmp::Ordering::Less;
            }

            let lvl1 = self.level_lit(lit1);
            let lvl2 = self.level_lit(lit2);
            if lvl1 != lvl2 {
                lvl2.cmp(&lvl1) // higher level come first
            } else {
                lit1.cmp(&lit2) // otherwise default comparison
            }
        });

        // check that the first literal is a proper watch
        debug_assert!(
            self.value_lit(clause[0]) == lbool::UNDEF || {
                let lvl0 = self.level_lit(clause[0]);
                clause[1..].iter().all(|&lit2| self.level_lit(lit2) <= lvl0)
            }
        );
    }

    /// Move to the given clause allocator, where clause indices might differ
    fn reloc_all(
        &mut self,
        learnts: &mut Vec<CRef>,
        clauses: &mut Vec<CRef>,
        to: &mut ClauseAllocator,
    ) {
        macro_rules! is_removed {
            ($ca:expr, $cr:expr) => {
                $ca.get_ref($cr).mark() == 1
            };
        }
        // All watchers:
        self.watches().clean_all();
        for v in (0..self.num_vars()).map(Var::from_idx) {
            for s in 0..2 {
                let p = Lit::new(v, s != 0);
                for watch in &mut self.watches_data[p] {
                    self.ca.reloc(&mut watch.cref, to);
                }
            }
        }

        // All reasons:
        for &lit in &self.vars.trail {
            let v = lit.var();

            // Note: it is not safe to call `locked()` on a relocated clause. This is why we keep
            // `dangling` reasons here. It is safe and does not hurt.
            let reason = self.vars.reason(v);
            if reason != CRef::UNDEF {
                let cond = {
                    let c = self.ca.get_ref(reason);
                    c.reloced() || self.locked(c)
                };
                if cond {
                    debug_assert!(!is_removed!(self.ca, reason));
                    self.ca.reloc(&mut self.vars.vardata[v].reason, to);
                }
            }
        }

        // All learnt:
        {
            let mut j = 0;
            for i in 0..learnts.len() {
                let mut cr = learnts[i];
                if !is_removed!(self.ca, cr) {
                    self.ca.reloc(&mut cr, to);
                    learnts[j] = cr;
                    j += 1;
                }
            }
            learnts.truncate(j);
        }

        // All original:
        {
            let mut j = 0;
            for i in 0..clauses.len() {
                let mut cr = clauses[i];
                if !is_removed!(self.ca, cr) {
                    self.ca.reloc(&mut cr, to);
                    clauses[j] = cr;
                    j += 1;
                }
            }
            clauses.truncate(j);
        }
    }

    /// Attach a clause to watcher lists
    fn attach_clause<H: Host>(&mut self, th: &mut H, cr: CRef) {
        let (c0, c1, learnt, size) = {
            let c = self.ca.get_ref(cr);
            debug_assert!(c.size() > 1);
            (c[0], c[1], c.learnt(), c.size())
        };
        self.watches()[!c0].push(Watcher::new(cr, c1));
        self.watches()[!c1].push(Watcher::new(cr, c0));
        if learnt {
            self.num_learnts += 1;
            self.learnts_literals += size as u64;
        } else {
            debug_assert!(
                self.value_lit(c0) != lbool::FALSE || self.value_lit(c1) != lbool::FALSE
            );
            self.num_clauses += 1;
            self.clauses_literals += size as u64;
        }
        // an asserting learnt clause is attached with a false second watch;
        // the invariant is restored once its first literal is enqueued
        if !learnt || self.value_lit(c0) != lbool::FALSE || self.value_lit(c1) != lbool::FALSE {
            self.check_decision_vars(th, c0, c1);
        }
    }

    /// Revert to the state at given level (keeping all assignment at `level` but not beyond).
    fn cancel_until<H: Host>(&mut self, th: &mut H, level: u32) {
        if self.decision_level() > level {
            self.full_assignment = false;
            let n_levels = self.decision_level() as usize - level as usize;
            let trail_lim_last = *self.vars.trail_lim.last().expect("trail_lim is empty") as usize;
            let trail_lim_level = self.vars.trail_lim[level as usize] as usize;
            let first_decision = self.vars.trail[trail_lim_level];
            for c in (trail_lim_level..self.vars.trail.len()).rev() {
                let x = self.vars.trail[c].var();
                self.vars.ass[x] = lbool::UNDEF;
                if self.phase_saving > 1 || (self.phase_saving == 1 && c > trail_lim_last) {
                    self.polarity[x] = self.vars.trail[c].sign();
                }
                self.insert_var_order(x);
            }
            self.qhead = trail_lim_level as i32;
            self.vars.trail.truncate(trail_lim_level);
            self.vars.trail_lim.truncate(level as usize);
            th.pop_levels(n_levels, first_decision);
            debug_assert_eq!(
                self.decision_level() as usize,
                th.n_levels(),
                "same number of levels for host and trail"
            );
        }
    }

    /// Detach a clause from watcher lists.
    ///
    /// param `strict` means we remove the clause from watchers eagerly, instead
    /// of just marking the watchlist as "dirty"
    fn detach_clause(&mut self, cr: CRef, strict: bool) {
        let (c0, c1, csize, clearnt) = {
            let c = self.ca.get_ref(cr);
            (c[0], c[1], c.size(), c.learnt())
        };
        debug_assert!(csize > 1);

        let mut watches = self.watches_data.promote(WatcherDeleted { ca: &self.ca });

        // Strict or lazy detaching:
        if strict {
            let pos = watches[!c0]
                .iter()
                .position(|x| x == &Watcher::new(cr, c1))
                .expect("watcher not found");
            watches[!c0].remove(pos);
            let pos = watches[!c1]
                .iter()
                .position(|x| x == &Watcher::new(cr, c0))
                .expect("watcher not found");
            watches[!c1].remove(pos);
        } else {
            watches.smudge(!c0);
            watches.smudge(!c1);
        }

        if clearnt {
            self.num_learnts -= 1;
            self.learnts_literals -= csize as u64;
        } else {
            self.num_clauses -= 1;
            self.clauses_literals -= csize as u64;
        }
    }

    /// Detach and free a clause.
    fn remove_clause(&mut self, cr: CRef) {
        self.detach_clause(cr, false);
        {
            let c = self.ca.get_ref(cr);
            // Don't leave pointers to free'd memory!
            if self.locked(c) {
                self.vars.vardata[c[0].var()].reason = CRef::UNDEF;
            }
        }
        self.ca.get_mut(cr).set_mark(1); // used in reloc
        self.ca.free(cr);
    }

    pub fn satisfied(&self, c: ClauseRef) -> bool {
        c.iter().any(|&lit| self.value_lit(lit) == lbool::TRUE)
    }

    /// Returns `true` if a clause is a reason for some implication in the current state.
    fn locked(&self, c: ClauseRef) -> bool {
        let reason = self.reason(c[0].var());
        self.value_lit(c[0]) == lbool::TRUE
            && reason != CRef::UNDEF
            && self.ca.get_ref(reason) == c
    }

    fn progress_estimate(&self) -> f64 {
        let mut progress = 0.0;
        let f = 1.0 / self.num_vars() as f64;

        for i in 0..self.decision_level() + 1 {
            let beg: i32 = if i == 0 {
                0
            } else {
                self.vars.trail_lim[i as usize - 1]
            };
            let end: i32 = if i == self.decision_level() {
                self.vars.trail.len() as i32
            } else {
                self.vars.trail_lim[i as usize]
            };
            progress += f64::powi(f, i as i32) * (end - beg) as f64;
        }

        progress / self.num_vars() as f64
    }

    fn new(opts: &SolverOpts) -> Self {
        Self {
            vars: VarState::new(opts),
            num_clauses: 0,
            num_learnts: 0,
            clauses_literals: 0,
            learnts_literals: 0,

            clause_decay: opts.clause_decay,
            random_var_freq: opts.random_var_freq,
            random_seed: opts.random_seed,
            luby_restart: opts.luby_restart,
            ccmin_mode: opts.ccmin_mode,
            phase_saving: opts.phase_saving,
            rnd_pol: false,
            rnd_init_act: opts.rnd_init_act,
            garbage_frac: opts.garbage_frac,
            min_learnts_lim: opts.min_learnts_lim,
            restart_first: opts.restart_first,
            restart_inc: opts.restart_inc,
            use_custom_branch: opts.use_custom_branch,
            custom_branch_freq: opts.custom_branch_freq,

            // Parameters (experimental):
            learntsize_adjust_start_confl: 100,
            learntsize_adjust_inc: 1.5,

            // Statistics: (formerly in 'SolverStats')
            solves: 0,
            starts: 0,
            decisions: 0,
            rnd_decisions: 0,
            propagations: 0,
            conflicts: 0,
            dec_vars: 0,
            max_literals: 0,
            tot_literals: 0,

            // Parameters (the rest):
            learntsize_factor: 1.0 / 3.0,
            learntsize_inc: 1.1,

            polarity: VMap::new(),
            user_pol: VMap::new(),
            decision: VMap::new(),
            watches_data: OccListsData::new(),
            order_heap_data: HeapData::new(),
            ok: true,
            cla_inc: 1.0,
            qhead: 0,
            simp_db_assigns: -1,
            simp_db_props: 0,
            progress_estimate: 0.0,
            full_assignment: false,
            remove_satisfied: true,
            next_var: Var::from_idx(0),

            ca: ClauseAllocator::new(),
            assumptions: vec![],

            seen: VMap::new(),
            minimize_stack: vec![],
            analyze_toclear: vec![],
            tmp_explain: vec![],
            max_learnts: 0.0,
            learntsize_adjust_confl: 0.0,
            learntsize_adjust_cnt: 0,

            // Resource constraints:
            conflict_budget: -1,
            propagation_budget: -1,
        }
    }
}

impl VarState {
    fn new(opts: &SolverOpts) -> Self {
        Self {
            ass: VMap::new(),
            vardata: VMap::new(),
            activity: VMap::new(),
            var_inc: 1.0,
            var_decay: opts.var_decay,
            trail: vec![],
            trail_lim: vec![],
        }
    }

    #[inline(always)]
    pub fn num_assigns(&self) -> u32 {
        self.trail.len() as u32
    }

    /// Begins a new decision level.
    fn new_decision_level(&mut self) {
        let lvl = self.trail.len() as i32;
        self.trail_lim.push(lvl);
    }

    fn proved_at_lvl_0(&self) -> &[Lit] {
        // find where the end of the level-0 part of the trail is
        let end = self
            .trail_lim
            .get(0)
            .map_or(self.trail.len(), |&x| x as usize);
        &self.trail[..end]
    }

    #[inline(always)]
    pub fn value(&self, x: Var) -> lbool {
        self.ass[x]
    }

    #[inline(always)]
    fn value_lit(&self, x: Lit) -> lbool {
        self.ass[x.var()] ^ !x.sign()
    }

    #[inline(always)]
    fn level(&self, x: Var) -> i32 {
        self.vardata[x].level
    }

    #[inline(always)]
    fn reason(&self, x: Var) -> CRef {
        self.vardata[x].reason
    }

    fn var_decay_activity(&mut self) {
        self.var_inc *= 1.0 / self.var_decay;
    }

    #[inline(always)]
    pub fn decision_level(&self) -> u32 {
        self.trail_lim.len() as u32
    }

    fn unchecked_enqueue(&mut self, p: Lit, from: CRef) {
        debug_assert_eq!(
            self.value_lit(p),
            lbool::UNDEF,
            "lit {:?} should be undef",
            p
        );
        self.ass[p.var()] = lbool::new(p.sign());
        self.vardata[p.var()] = VarData::new(from, self.decision_level() as i32);
        self.trail.push(p);
    }

    /// Increase a variable with the current 'bump' value.
    fn var_bump_activity(&mut self, order_heap_data: &mut HeapData<Var>, v: Var) {
        self.activity[v] += self.var_inc;
        if self.activity[v] > 1e100 {
            // Rescale:
            for (_, x) in self.activity.iter_mut() {
                *x *= 1e-100;
            }
            self.var_inc *= 1e-100;
        }

        // Update order_heap with respect to new activity:
        let mut order_heap = order_heap_data.promote(VarOrder {
            activity: &self.activity,
        });
        if order_heap.in_heap(v) {
            order_heap.decrease(v);
        }
    }
}

impl<'a> HostArg<'a> {
    #[inline]
    pub fn is_ok(&self) -> bool {
        match self.conflict {
            HostConflict::Nil => true,
            HostConflict::Prop(_) | HostConflict::Clause => false,
        }
    }

    /// Value of given var in current model.
    #[inline(always)]
    pub fn value(&self, v: Var) -> lbool {
        self.v.vars.value(v)
    }

    /// Value of given literal in current model.
    #[inline(always)]
    pub fn value_lit(&self, lit: Lit) -> lbool {
        self.v.vars.value_lit(lit)
    }

    /// Current (possibly partial) model.
    #[inline(always)]
    pub fn model(&self) -> &[Lit] {
        &self.v.vars.trail
    }

    /// Propagate the literal `p`, which is host-implied by the current trail.
    ///
    /// This will add `p` on the trail without a reason clause. The host must
    /// be ready to justify `p` via [`Host::explain`] if asked to during
    /// conflict resolution.
    ///
    /// Returns `true` if propagation succeeded (or did nothing), `false`
    /// if the propagation results in an immediate conflict.
    /// If this returns `false`, the host should avoid doing more work and
    /// return as early as reasonably possible.
    pub fn propagate(&mut self, p: Lit) -> bool {
        if !self.is_ok() {
            return false;
        }
        let v_p = self.v.vars.value_lit(p);
        if v_p == lbool::TRUE {
            true
        } else if v_p == lbool::UNDEF {
            // propagate on the fly
            self.has_propagated = true;
            self.v.vars.unchecked_enqueue(p, CRef::UNDEF);
            true
        } else {
            debug_assert_eq!(v_p, lbool::FALSE);
            // conflict
            self.conflict = HostConflict::Prop(p);
            false
        }
    }

    /// Reject the current (possibly partial) model.
    ///
    /// This will force the SAT core to backtrack. All propagations added with
    /// `propagate` during this session will be discarded.
    ///
    /// ## Params
    /// - `lits` a clause that is a tautology of the host's theory
    ///     and that is false in the current (partial) model.
    pub fn raise_conflict(&mut self, lits: &[Lit]) {
        if lits.is_empty() {
            panic!("conflicts must have a least one literal")
        }
        if self.is_ok() {
            self.conflict = HostConflict::Clause;
            self.lits.clear();
            self.lits.extend_from_slice(lits);
        }
    }
}

#[derive(Debug)]
enum ClauseSetSelect {
    Original,
    Learnt,
}

#[derive(Debug, Clone, Copy)]
struct VarData {
    reason: CRef,
    level: i32,
}

#[derive(Debug, Clone, Copy)]
struct Watcher {
    cref: CRef,
    blocker: Lit,
}

struct VarOrder<'a> {
    activity: &'a VMap<f64>,
}

/// Predicate to test whether a clause has been removed from some lit's watchlist
struct WatcherDeleted<'a> {
    ca: &'a ClauseAllocator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
enum Seen {
    UNDEF,
    SOURCE,
    REMOVABLE,
}

mod utils {
    /// Finite subsequences of the Luby-sequence:
    ///
    /// > 0: 1
    /// > 1: 1 1 2
    /// > 2: 1 1 2 1 1 2 4
    /// > 3: 1 1 2 1 1 2 4 1 1 2 1 1 2 4 8
    /// ...
    pub(super) fn luby(y: f64, mut x: i32) -> f64 {
        // Find the finite subsequence that contains index 'x', and the
        // size of that subsequence:
        let mut size = 1;
        let mut seq = 0;
        while size < x + 1 {
            seq += 1;
            size = 2 * size + 1;
        }

        while size - 1 != x {
            size = (size - 1) >> 1;
            seq -= 1;
            x = x % size;
        }

        f64::powi(y, seq)
    }

    /// Generate a random double:
    pub(super) fn drand(seed: &mut f64) -> f64 {
        *seed *= 1389796.0;
        let q = (*seed / 2147483647.0) as i32;
        *seed -= q as f64 * 2147483647.0;
        *seed / 2147483647.0
    }

    /// Generate a random integer:
    pub(super) fn irand(seed: &mut f64, size: i32) -> i32 {
        (drand(seed) * size as f64) as i32
    }
}

impl Default for VarData {
    fn default() -> Self {
        Self {
            reason: CRef::UNDEF,
            level: 0,
        }
    }
}

impl VarData {
    #[inline(always)]
    pub(super) fn new(reason: CRef, level: i32) -> Self {
        Self { reason, level }
    }
}

impl PartialEq for Watcher {
    #[inline(always)]
    fn eq(&self, rhs: &Self) -> bool {
        self.cref == rhs.cref
    }
}
impl Eq for Watcher {}

impl Watcher {
    fn new(cref: CRef, blocker: Lit) -> Self {
        Self { cref, blocker }
    }
}

impl<'a> Comparator<Var> for VarOrder<'a> {
    fn cmp(&self, lhs: &Var, rhs: &Var) -> cmp::Ordering {
        // max activity first; ties broken by index so runs are reproducible
        PartialOrd::partial_cmp(&self.activity[*rhs], &self.activity[*lhs])
            .expect("NaN activity")
            .then_with(|| lhs.idx().cmp(&rhs.idx()))
    }
}

impl<'a> DeletePred<Watcher> for WatcherDeleted<'a> {
    #[inline]
    fn deleted(&self, w: &Watcher) -> bool {
        self.ca.get_ref(w.cref).mark() == 1
    }
}

impl Default for Seen {
    #[inline]
    fn default() -> Self {
        Seen::UNDEF
    }
}

impl Seen {
    #[inline(always)]
    fn is_seen(&self) -> bool {
        *self != Seen::UNDEF
    }
}

pub struct SolverOpts {
    pub var_decay: f64,
    pub clause_decay: f64,
    pub random_var_freq: f64,
    pub random_seed: f64,
    pub ccmin_mode: i32,
    pub phase_saving: i32,
    pub rnd_init_act: bool,
    pub luby_restart: bool,
    pub restart_first: i32,
    pub restart_inc: f64,
    pub garbage_frac: f64,
    pub min_learnts_lim: i32,
    /// Hand branching candidates to [`Host::change_branch_choice`]?
    pub use_custom_branch: bool,
    /// Initial probability of consulting the host for a branch.
    pub custom_branch_freq: f64,
}

impl Default for SolverOpts {
    fn default() -> SolverOpts {
        Self {
            var_decay: 0.95,
            clause_decay: 0.999,
            random_var_freq: 0.0,
            random_seed: 91648253.0,
            ccmin_mode: 2,
            phase_saving: 2,
            rnd_init_act: false,
            luby_restart: true,
            restart_first: 100,
            restart_inc: 2.0,
            garbage_frac: 0.20,
            min_learnts_lim: 0,
            use_custom_branch: false,
            custom_branch_freq: 0.75,
        }
    }
}

impl SolverOpts {
    /// Check that options are valid.
    pub fn check(&self) -> bool {
        (0.0 < self.var_decay && self.var_decay < 1.0)
            && (0.0 < self.clause_decay && self.clause_decay < 1.0)
            && (0.0 <= self.random_var_freq && self.random_var_freq <= 1.0)
            && (0.0 < self.random_seed && self.random_seed < f64::INFINITY)
            && (0 <= self.ccmin_mode && self.ccmin_mode <= 2)
            && (0 <= self.phase_saving && self.phase_saving <= 2)
            && 1 <= self.restart_first
            && (1.0 < self.restart_inc && self.restart_inc < f64::INFINITY)
            && (0.0 < self.garbage_frac && self.garbage_frac < f64::INFINITY)
            && 0 <= self.min_learnts_lim
            && (0.25 <= self.custom_branch_freq && self.custom_branch_freq <= 1.0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{BasicSolver, EmptyHost};

    fn lit(s: &mut BasicSolver, h: &mut EmptyHost, i: i32) -> Lit {
        debug_assert!(i != 0);
        let idx = (i.abs() - 1) as u32;
        while s.num_vars() <= idx {
            s.new_var_default(h);
        }
        Lit::new(Var::from_idx(idx), i > 0)
    }

    fn add(s: &mut BasicSolver, h: &mut EmptyHost, c: &[i32]) -> bool {
        let mut ps: Vec<Lit> = c.iter().map(|&i| lit(s, h, i)).collect();
        s.add_clause_reuse(h, &mut ps)
    }

    fn solve(s: &mut BasicSolver, h: &mut EmptyHost) -> lbool {
        s.solve_limited(h, false)
    }

    #[test]
    fn test_empty_formula_is_sat() {
        let mut s = BasicSolver::default();
        let mut h = EmptyHost::new();
        assert_eq!(solve(&mut s, &mut h), lbool::TRUE);
        assert!(s.get_model().is_empty());
    }

    #[test]
    fn test_contradictory_units() {
        let mut s = BasicSolver::default();
        let mut h = EmptyHost::new();
        assert!(add(&mut s, &mut h, &[1]));
        assert!(!add(&mut s, &mut h, &[-1]));
        assert!(!s.is_ok());
        assert_eq!(solve(&mut s, &mut h), lbool::FALSE);
    }

    #[test]
    fn test_duplicate_literal_collapses_to_unit() {
        let mut s = BasicSolver::default();
        let mut h = EmptyHost::new();
        assert!(add(&mut s, &mut h, &[1, 1]));
        assert_eq!(s.num_clauses(), 0); // stored as a unit fact, not a clause
        assert_eq!(solve(&mut s, &mut h), lbool::TRUE);
        assert_eq!(s.value_var(Var::from_idx(0)), lbool::TRUE);
    }

    #[test]
    fn test_tautology_is_dropped() {
        let mut s = BasicSolver::default();
        let mut h = EmptyHost::new();
        assert!(add(&mut s, &mut h, &[1, -1]));
        assert_eq!(s.num_clauses(), 0);
        assert_eq!(solve(&mut s, &mut h), lbool::TRUE);
    }

    #[test]
    fn test_simple_sat_forces_b() {
        // (a | b) & (-a | b) & (a | -b) is satisfied only by a=b=true
        let mut s = BasicSolver::default();
        let mut h = EmptyHost::new();
        add(&mut s, &mut h, &[1, 2]);
        add(&mut s, &mut h, &[-1, 2]);
        add(&mut s, &mut h, &[1, -2]);
        assert_eq!(solve(&mut s, &mut h), lbool::TRUE);
        assert_eq!(s.value_var(Var::from_idx(1)), lbool::TRUE);
        assert_eq!(s.value_var(Var::from_idx(0)), lbool::TRUE);
    }

    #[test]
    fn test_assumptions_force_c() {
        let mut s = BasicSolver::default();
        let mut h = EmptyHost::new();
        add(&mut s, &mut h, &[1, 2, 3]);
        add(&mut s, &mut h, &[-1, -2]);
        add(&mut s, &mut h, &[-2, -3]);
        add(&mut s, &mut h, &[-1, -3]);
        let a = Lit::new(Var::from_idx(0), true);
        let b = Lit::new(Var::from_idx(1), true);
        s.set_assumptions(&[!a, !b]);
        assert_eq!(solve(&mut s, &mut h), lbool::TRUE);
        assert_eq!(s.value_var(Var::from_idx(2)), lbool::TRUE);
        // solver is still usable without the assumptions
        s.set_assumptions(&[]);
        assert_eq!(solve(&mut s, &mut h), lbool::TRUE);
    }

    #[test]
    fn test_failed_assumption_reported() {
        let mut s = BasicSolver::default();
        let mut h = EmptyHost::new();
        add(&mut s, &mut h, &[1]);
        add(&mut s, &mut h, &[-1, 2]);
        let b = Lit::new(Var::from_idx(1), true);
        s.set_assumptions(&[!b]);
        assert_eq!(solve(&mut s, &mut h), lbool::FALSE);
        assert!(s.is_ok()); // only unsat under the assumptions
        assert!(s.unsat_core_contains_lit(b));
        assert!(s.unsat_core_contains_var(Var::from_idx(1)));
        s.set_assumptions(&[]);
        assert_eq!(solve(&mut s, &mut h), lbool::TRUE);
    }

    /// p(i) sits in hole h(i): variable index pigeon * holes + hole.
    fn pigeonhole(s: &mut BasicSolver, h: &mut EmptyHost, pigeons: i32, holes: i32) {
        let v = |p: i32, hl: i32| p * holes + hl + 1;
        for p in 0..pigeons {
            let c: Vec<i32> = (0..holes).map(|hl| v(p, hl)).collect();
            add(s, h, &c);
        }
        for hl in 0..holes {
            for p1 in 0..pigeons {
                for p2 in (p1 + 1)..pigeons {
                    add(s, h, &[-v(p1, hl), -v(p2, hl)]);
                }
            }
        }
    }

    #[test]
    fn test_pigeonhole_3_2_unsat() {
        let mut s = BasicSolver::default();
        let mut h = EmptyHost::new();
        pigeonhole(&mut s, &mut h, 3, 2);
        assert_eq!(solve(&mut s, &mut h), lbool::FALSE);
        assert!(!s.is_ok());
        assert!(s.unsat_core().is_empty());
    }

    #[test]
    fn test_pigeonhole_assumption_core() {
        let mut s = BasicSolver::default();
        let mut h = EmptyHost::new();
        pigeonhole(&mut s, &mut h, 3, 2);
        let p1h1 = Lit::new(Var::from_idx(0), true);
        s.set_assumptions(&[p1h1]);
        assert_eq!(solve(&mut s, &mut h), lbool::FALSE);
        // unsat with or without the assumption; the core is a subset of the
        // (negated) assumptions
        for &l in s.unsat_core() {
            assert_eq!(l, !p1h1);
        }
    }

    #[test]
    fn test_nondecidable_var_is_never_decided() {
        let mut s = BasicSolver::default();
        let mut h = EmptyHost::new();
        let a = s.new_var_default(&mut h);
        let b = s.new_var(&mut h, lbool::UNDEF, false);
        let mut c1 = vec![Lit::new(a, false), Lit::new(b, true)];
        let mut c2 = vec![Lit::new(a, false), Lit::new(b, false)];
        s.add_clause_reuse(&mut h, &mut c1);
        s.add_clause_reuse(&mut h, &mut c2);
        assert_eq!(solve(&mut s, &mut h), lbool::TRUE);
        // `a` is false, both clauses satisfied; `b` was neither decided nor forced
        assert_eq!(s.value_var(a), lbool::FALSE);
        assert_eq!(s.value_var(b), lbool::UNDEF);
        assert_eq!(s.num_decisions(), 1);
    }

    #[test]
    fn test_save_reset_restores_satisfiability() {
        let mut s = BasicSolver::default();
        let mut h = EmptyHost::new();
        add(&mut s, &mut h, &[1, 2]);
        add(&mut s, &mut h, &[-1, 2]);
        assert_eq!(solve(&mut s, &mut h), lbool::TRUE);

        s.save_state();
        add(&mut s, &mut h, &[-2, 3]);
        add(&mut s, &mut h, &[-2, -3]);
        assert_eq!(solve(&mut s, &mut h), lbool::FALSE);
        assert!(!s.is_ok());

        s.reset_state(&mut h);
        assert!(s.is_ok());
        assert_eq!(solve(&mut s, &mut h), lbool::TRUE);
        assert_eq!(s.value_var(Var::from_idx(1)), lbool::TRUE);
    }

    #[test]
    fn test_conflict_budget_reports_unknown() {
        let mut s = BasicSolver::default();
        let mut h = EmptyHost::new();
        pigeonhole(&mut s, &mut h, 4, 3);
        s.set_conflict_budget(1);
        assert_eq!(solve(&mut s, &mut h), lbool::UNDEF);
        assert!(s.is_ok());
        s.budget_off();
        assert_eq!(solve(&mut s, &mut h), lbool::FALSE);
    }

    #[test]
    fn test_proved_at_lvl_0() {
        let mut s = BasicSolver::default();
        let mut h = EmptyHost::new();
        add(&mut s, &mut h, &[2]);
        add(&mut s, &mut h, &[-2, 1]);
        let b = Lit::new(Var::from_idx(1), true);
        let a = Lit::new(Var::from_idx(0), true);
        assert!(s.proved_at_lvl_0().contains(&b));
        assert!(s.proved_at_lvl_0().contains(&a));
        assert_eq!(s.value_lvl_0(a), lbool::TRUE);
        assert_eq!(s.value_lvl_0(!a), lbool::FALSE);
    }

    #[test]
    fn test_nosearch_only_propagates() {
        let mut s = BasicSolver::default();
        let mut h = EmptyHost::new();
        add(&mut s, &mut h, &[-1, 2]);
        add(&mut s, &mut h, &[3, 4]);
        let a = Lit::new(Var::from_idx(0), true);
        s.set_assumptions(&[a]);
        assert_eq!(s.solve_limited(&mut h, true), lbool::TRUE);
        assert_eq!(s.num_decisions(), 0);
        // the assumption and its consequence are in the model, the untouched
        // clause is not decided
        assert_eq!(s.value_var(Var::from_idx(0)), lbool::TRUE);
        assert_eq!(s.value_var(Var::from_idx(1)), lbool::TRUE);
        assert_eq!(s.value_var(Var::from_idx(2)), lbool::UNDEF);
    }

    #[test]
    fn test_luby_prefix() {
        let seq: Vec<f64> = (0..7).map(|x| utils::luby(2.0, x)).collect();
        assert_eq!(seq, vec![1.0, 1.0, 2.0, 1.0, 1.0, 2.0, 4.0]);
    }

    #[test]
    fn test_drand_is_reproducible() {
        let mut s1 = 91648253.0;
        let mut s2 = 91648253.0;
        for _ in 0..100 {
            let a = utils::drand(&mut s1);
            let b = utils::drand(&mut s2);
            assert_eq!(a, b);
            assert!(0.0 <= a && a < 1.0);
        }
    }
}
