//! End-to-end tests: solver results against an independent reference
//! procedure, assumption handling, and the host integration points.

use propsat::{lbool, BasicSolver, EmptyHost, Host, HostArg, Lit, SolverInterface, Var};

/// Builds a problem over variables named by positive integers (DIMACS style).
struct Problem {
    s: BasicSolver,
    h: EmptyHost,
    vars: Vec<Var>,
}

impl Problem {
    fn new() -> Self {
        Problem {
            s: BasicSolver::default(),
            h: EmptyHost::new(),
            vars: vec![],
        }
    }

    fn var(&mut self, i: usize) -> Var {
        while self.vars.len() <= i {
            let v = self.s.new_var_default(&mut self.h);
            self.vars.push(v);
        }
        self.vars[i]
    }

    fn lit(&mut self, l: i32) -> Lit {
        assert!(l != 0);
        let v = self.var((l.abs() - 1) as usize);
        Lit::new(v, l > 0)
    }

    fn add(&mut self, c: &[i32]) -> bool {
        let mut ps: Vec<Lit> = c.iter().map(|&l| self.lit(l)).collect();
        self.s.add_clause_reuse(&mut self.h, &mut ps)
    }

    fn solve(&mut self) -> lbool {
        self.s.solve_limited(&mut self.h, false)
    }

    fn solve_under(&mut self, assumps: &[i32]) -> lbool {
        let lits: Vec<Lit> = assumps.iter().map(|&l| self.lit(l)).collect();
        self.s.set_assumptions(&lits);
        self.s.solve_limited(&mut self.h, false)
    }
}

/// Reference decision procedure: plain recursive DPLL with unit propagation.
/// Slow but independent of everything in the crate.
fn oracle_sat(n_vars: usize, clauses: &[Vec<i32>]) -> bool {
    fn go(assign: &mut Vec<i8>, clauses: &[Vec<i32>]) -> bool {
        loop {
            let mut changed = false;
            for c in clauses {
                let mut unassigned = 0usize;
                let mut last = 0i32;
                let mut sat = false;
                for &l in c {
                    match assign[(l.abs() - 1) as usize] {
                        0 => {
                            unassigned += 1;
                            last = l;
                        }
                        v => {
                            if (v > 0) == (l > 0) {
                                sat = true;
                                break;
                            }
                        }
                    }
                }
                if sat {
                    continue;
                }
                match unassigned {
                    0 => return false,
                    1 => {
                        assign[(last.abs() - 1) as usize] = if last > 0 { 1 } else { -1 };
                        changed = true;
                    }
                    _ => {}
                }
            }
            if !changed {
                break;
            }
        }
        match assign.iter().position(|&v| v == 0) {
            None => true,
            Some(i) => {
                for &val in &[1i8, -1] {
                    let saved = assign.clone();
                    assign[i] = val;
                    if go(assign, clauses) {
                        return true;
                    }
                    *assign = saved;
                }
                false
            }
        }
    }
    let mut assign = vec![0i8; n_vars];
    go(&mut assign, clauses)
}

/// Fixed-seed generator so failures are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }
    fn below(&mut self, n: u64) -> u64 {
        (self.next() >> 33) % n
    }
}

fn random_3sat(rng: &mut Lcg, n_vars: usize, n_clauses: usize) -> Vec<Vec<i32>> {
    let mut clauses = Vec::with_capacity(n_clauses);
    for _ in 0..n_clauses {
        let mut c = vec![];
        while c.len() < 3 {
            let v = rng.below(n_vars as u64) as i32 + 1;
            if c.iter().any(|&l: &i32| l.abs() == v) {
                continue;
            }
            let sign = rng.below(2) == 0;
            c.push(if sign { v } else { -v });
        }
        clauses.push(c);
    }
    clauses
}

#[test]
fn random_3sat_agrees_with_oracle() {
    let mut rng = Lcg(0xdead_beef);
    let n_vars = 50;
    let n_clauses = 200; // ratio 4.0
    for instance in 0..100 {
        let clauses = random_3sat(&mut rng, n_vars, n_clauses);
        let expected = oracle_sat(n_vars, &clauses);

        let mut p = Problem::new();
        let mut trivially_unsat = false;
        for c in &clauses {
            if !p.add(c) {
                trivially_unsat = true;
            }
        }
        let res = if trivially_unsat {
            lbool::FALSE
        } else {
            p.solve()
        };
        assert_eq!(
            res,
            lbool::new(expected),
            "instance {} disagrees with the reference procedure",
            instance
        );

        if expected {
            // the model must satisfy every input clause
            for c in &clauses {
                let ok = c.iter().any(|&l| {
                    let v = p.vars[(l.abs() - 1) as usize];
                    p.s.value_var(v) == lbool::new(l > 0)
                });
                assert!(ok, "instance {}: clause {:?} not satisfied", instance, c);
            }
        }
    }
}

#[test]
fn unsat_core_is_minimal() {
    // b is irrelevant; a and c clash
    let mut p = Problem::new();
    p.add(&[-1, -3]);
    assert_eq!(p.solve_under(&[1, 2, 3]), lbool::FALSE);

    let a = p.lit(1);
    let b = p.lit(2);
    let c = p.lit(3);
    assert!(p.s.unsat_core_contains_lit(!a));
    assert!(p.s.unsat_core_contains_lit(!c));
    assert!(!p.s.unsat_core_contains_lit(!b));
    assert!(!p.s.unsat_core_contains_lit(b));

    // dropping either core member restores satisfiability
    assert_eq!(p.solve_under(&[2, 3]), lbool::TRUE);
    assert_eq!(p.solve_under(&[1, 2]), lbool::TRUE);
}

fn add_pigeonhole(p: &mut Problem, pigeons: i32, holes: i32) {
    let v = |pg: i32, hl: i32| pg * holes + hl + 1;
    for pg in 0..pigeons {
        let c: Vec<i32> = (0..holes).map(|hl| v(pg, hl)).collect();
        p.add(&c);
    }
    for hl in 0..holes {
        for p1 in 0..pigeons {
            for p2 in (p1 + 1)..pigeons {
                p.add(&[-v(p1, hl), -v(p2, hl)]);
            }
        }
    }
}

#[test]
fn pigeonhole_4_3_unsat() {
    let mut p = Problem::new();
    add_pigeonhole(&mut p, 4, 3);
    assert_eq!(p.solve(), lbool::FALSE);
    assert!(!p.s.is_ok());
}

#[test]
fn save_reset_roundtrip() {
    let mut p = Problem::new();
    p.add(&[1, 2]);
    p.add(&[-1, 2]);
    assert_eq!(p.solve(), lbool::TRUE);

    p.s.save_state();
    p.add(&[-2]);
    assert_eq!(p.solve(), lbool::FALSE);
    p.s.reset_state(&mut p.h);

    assert!(p.s.is_ok());
    assert_eq!(p.solve(), lbool::TRUE);
    let b = p.lit(2);
    assert_eq!(p.s.value_lit(b), lbool::TRUE);
}

#[test]
fn stop_callback_interrupts_search() {
    let mut p = Problem::new();
    add_pigeonhole(&mut p, 5, 4);
    p.s.cb_mut().set_stop(|| true);
    assert_eq!(p.solve(), lbool::UNDEF);
    assert!(p.s.is_ok());
}

/// Host enforcing an implication chain v0 -> v1 -> ... -> v{n-1} by theory
/// propagation, with lazily produced justifications.
struct ChainHost {
    chain: Vec<Var>,
    levels: usize,
    expl: Vec<Lit>,
}

impl ChainHost {
    fn new(chain: Vec<Var>) -> Self {
        ChainHost {
            chain,
            levels: 0,
            expl: vec![],
        }
    }

    fn propagate_chain(&mut self, acts: &mut HostArg) {
        for i in 0..self.chain.len() - 1 {
            if acts.value(self.chain[i]) == lbool::TRUE
                && acts.value(self.chain[i + 1]) != lbool::TRUE
            {
                if !acts.propagate(Lit::new(self.chain[i + 1], true)) {
                    return;
                }
            }
        }
    }
}

impl Host for ChainHost {
    fn propagate(&mut self, acts: &mut HostArg) {
        self.propagate_chain(acts)
    }

    fn check_full_assignment(&mut self, acts: &mut HostArg) {
        self.propagate_chain(acts)
    }

    fn explain(&mut self, p: Lit) -> &[Lit] {
        let i = self
            .chain
            .iter()
            .position(|&v| Lit::new(v, true) == p)
            .expect("explanation for an unknown literal");
        assert!(i > 0, "chain start is never propagated");
        self.expl.clear();
        self.expl.push(p);
        self.expl.push(Lit::new(self.chain[i - 1], false));
        &self.expl
    }

    fn create_level(&mut self) {
        self.levels += 1;
    }
    fn pop_levels(&mut self, n: usize, _first_decision: Lit) {
        self.levels -= n;
    }
    fn n_levels(&self) -> usize {
        self.levels
    }
}

#[test]
fn host_propagations_are_explained_in_conflicts() {
    let mut s = BasicSolver::default();
    let mut h = EmptyHost::new();
    // v0 prefers TRUE so the search first walks into the host conflict
    let v0 = s.new_var(&mut h, lbool::TRUE, true);
    let v1 = s.new_var_default(&mut h);
    let v2 = s.new_var_default(&mut h);
    let mut c = vec![Lit::new(v0, false), Lit::new(v2, false)];
    s.add_clause_reuse(&mut h, &mut c);

    let mut chain = ChainHost::new(vec![v0, v1, v2]);
    assert_eq!(s.solve_limited(&mut chain, false), lbool::TRUE);
    // the chain forces v2 from v0, so v0 cannot be true
    assert_eq!(s.value_var(v0), lbool::FALSE);
    // the host accepted the final model
    if s.value_var(v1) == lbool::TRUE {
        assert_eq!(s.value_var(v2), lbool::TRUE);
    }
}

/// Host that rejects any full assignment giving `x` and `y` the same value.
struct DistinctHost {
    x: Var,
    y: Var,
    levels: usize,
    vetoed: usize,
}

impl Host for DistinctHost {
    fn check_full_assignment(&mut self, acts: &mut HostArg) {
        let vx = acts.value(self.x);
        let vy = acts.value(self.y);
        if vx != lbool::UNDEF && vx == vy {
            self.vetoed += 1;
            let sign = vx == lbool::FALSE;
            acts.raise_conflict(&[Lit::new(self.x, sign), Lit::new(self.y, sign)]);
        }
    }

    fn explain(&mut self, _p: Lit) -> &[Lit] {
        unreachable!("this host never propagates")
    }

    fn create_level(&mut self) {
        self.levels += 1;
    }
    fn pop_levels(&mut self, n: usize, _first_decision: Lit) {
        self.levels -= n;
    }
    fn n_levels(&self) -> usize {
        self.levels
    }
}

#[test]
fn host_can_veto_full_assignments() {
    let mut s = BasicSolver::default();
    let mut h = EmptyHost::new();
    let x = s.new_var_default(&mut h);
    let y = s.new_var_default(&mut h);

    let mut host = DistinctHost {
        x,
        y,
        levels: 0,
        vetoed: 0,
    };
    assert_eq!(s.solve_limited(&mut host, false), lbool::TRUE);
    assert!(host.vetoed > 0, "the first candidate model must be rejected");
    assert_ne!(s.value_var(x), s.value_var(y));
}

#[test]
fn adding_clauses_after_solving_is_incremental() {
    let mut p = Problem::new();
    p.add(&[1, 2]);
    assert_eq!(p.solve(), lbool::TRUE);
    // forbid the model found and re-solve until the space is exhausted
    let mut models = 0;
    loop {
        let blocking: Vec<i32> = (1..=2)
            .map(|i| {
                let v = p.vars[(i - 1) as usize];
                if p.s.value_var(v) == lbool::TRUE {
                    -i
                } else {
                    i
                }
            })
            .collect();
        models += 1;
        if !p.add(&blocking) || p.solve() != lbool::TRUE {
            break;
        }
        assert!(models < 4, "more models than assignments");
    }
    // (1 | 2) has exactly three models over its two variables
    assert_eq!(models, 3);
}
