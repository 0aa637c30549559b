#![allow(non_snake_case)]

use serde::Serialize;

use crate::config::{StepConfig, STEP_SNAP_TOL};
use crate::load::Load;
use crate::prelude::*;
use crate::system::SystemMatrices;

//------------------------------------------------------------------------------
// State
//------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct State {
    pub t: f64,     // time
    pub U: VectorD, // displacement
    pub V: VectorD, // velocity
    pub F: VectorD, // external force at t
}

impl State {
    pub fn new(ndofs: usize, t0: f64) -> Self {
        State {
            t: t0,
            U: VectorD::zeros(ndofs),
            V: VectorD::zeros(ndofs),
            F: VectorD::zeros(ndofs),
        }
    }
    pub fn time(&self) -> f64 {
        self.t
    }
    pub fn displacement(&self) -> &VectorD {
        &self.U
    }
    pub fn velocity(&self) -> &VectorD {
        &self.V
    }
}

//------------------------------------------------------------------------------
// Time series
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    pub time: f64,
    pub displacement: VectorD,
    pub velocity: Option<VectorD>,
}

/// Append-only record of the response, one sample per step boundary.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TimeSeries {
    samples: Vec<Sample>,
}

impl TimeSeries {
    pub fn with_capacity(capacity: usize) -> Self {
        TimeSeries {
            samples: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, state: &State, record_velocity: bool) {
        self.samples.push(Sample {
            time: state.t,
            displacement: state.U.clone(),
            velocity: record_velocity.then(|| state.V.clone()),
        });
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }
    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }
    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }
    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }
    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect_vec()
    }

    /// Scalar response history `(t, u[dof])` of a single degree of freedom
    pub fn dof_history(&self, dof: usize) -> Vec<(f64, f64)> {
        self.samples
            .iter()
            .filter_map(|s| s.displacement.get(dof).map(|&u| (s.time, u)))
            .collect_vec()
    }

    /// Total mechanical energy at each sample, `None` unless velocities were recorded
    pub fn energies(&self, system: &SystemMatrices) -> Option<Vec<f64>> {
        self.samples
            .iter()
            .map(|s| {
                s.velocity
                    .as_ref()
                    .map(|V| system.energy(&s.displacement, V))
            })
            .collect()
    }
}

//------------------------------------------------------------------------------
// Solver
//------------------------------------------------------------------------------

/// Constant-average-acceleration (trapezoidal) integrator for one run.
///
/// Each step solves `(M + (h/2)C + (h/2)^2 K) V' = R` for the new velocity
/// with a Cholesky factorization computed once for the nominal step, then
/// updates the displacement with the average velocity. A truncated final
/// step is re-factorized with its own step size. The load is fixed for the
/// whole run and evaluated at each step boundary.
pub struct TrapezoidalSolver<'a, L: Load> {
    system: &'a SystemMatrices,
    load: &'a L,
    h: f64,        // nominal time step (sec)
    end_time: f64, // end time (sec)
    num_steps: usize,
    step: usize, // completed steps
    record_velocity: bool,
    factorization: Cholesky,
    state: State,
    state_next: State,
    R: VectorD, // residual vector
    W: VectorD, // stiffness work vector
}

impl<'a, L: Load> TrapezoidalSolver<'a, L> {
    pub fn new(
        system: &'a SystemMatrices,
        config: &StepConfig,
        U0: &VectorD,
        V0: &VectorD,
        load: &'a L,
    ) -> Result<Self> {
        config.validate()?;
        system.check_vector("initial displacement", U0)?;
        system.check_vector("initial velocity", V0)?;

        let ndofs = system.ndofs();
        let h = config.time_step;

        // Initial state with load evaluated at t = 0
        let mut state = State::new(ndofs, 0.);
        state.U.copy_from(U0);
        state.V.copy_from(V0);
        load.load_into(0., &mut state.F)?;

        let factorization = factorize(system, h)?;

        Ok(TrapezoidalSolver {
            system,
            load,
            h,
            end_time: config.end_time,
            num_steps: config.num_steps(),
            step: 0,
            record_velocity: config.record_velocity,
            factorization,
            state_next: state.clone(),
            state,
            R: VectorD::zeros(ndofs),
            W: VectorD::zeros(ndofs),
        })
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Planned number of steps including a truncated final step
    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    pub fn is_finished(&self) -> bool {
        self.step >= self.num_steps
    }

    /// Advance one step. Returns `false` without doing anything once the end time is reached.
    pub fn step(&mut self) -> Result<bool> {
        if self.is_finished() {
            return Ok(false);
        }

        // Step times are multiples of the nominal step, the last one lands on the end time
        let k = self.step + 1;
        let (t_next, h) = if k < self.num_steps {
            (k as f64 * self.h, self.h)
        } else {
            (self.end_time, self.final_step_size(k)?)
        };

        self.advance(t_next, h)?;
        self.step = k;
        log::trace!("Step {}: t = {}", self.step, self.state.t);
        Ok(true)
    }

    /// Size of the last step, re-factorizing when it is shorter than the nominal step
    fn final_step_size(&mut self, k: usize) -> Result<f64> {
        let h_step = self.end_time - self.state.t;
        let noise = STEP_SNAP_TOL * k as f64 * self.h;
        debug_assert!(h_step <= self.h + noise, "final step {} exceeds {}", h_step, self.h);

        if (h_step - self.h).abs() <= noise {
            return Ok(self.h);
        }
        log::debug!(
            "Truncated final step at t = {}: re-factorizing with h = {:e}",
            self.state.t,
            h_step
        );
        self.factorization = factorize(self.system, h_step)?;
        Ok(h_step)
    }

    fn advance(&mut self, t_next: f64, h: f64) -> Result<()> {
        let sys = self.system;
        let hh = h / 2.;

        // Evaluate load at the new time
        self.load.load_into(t_next, &mut self.state_next.F)?;

        let (state, state_next) = (&self.state, &mut self.state_next);

        // Stiffness argument (h/2)^2 V + h U
        self.W.copy_from(&state.U);
        self.W.axpy(hh * hh, &state.V, h);

        // Residual R = M V - C (h/2) V - K W + (h/2)(F + F')
        self.R.gemv(1., &sys.M, &state.V, 0.);
        self.R.gemv(-hh, &sys.C, &state.V, 1.);
        self.R.gemv(-1., &sys.K, &self.W, 1.);
        self.R.axpy(hh, &state.F, 1.);
        self.R.axpy(hh, &state_next.F, 1.);

        // Solve for the new velocity
        state_next.V.copy_from(&self.R);
        self.factorization.solve_mut(&mut state_next.V);

        // Displacement from the average velocity
        state_next.U.copy_from(&state.U);
        state_next.U.axpy(hh, &state.V, 1.);
        state_next.U.axpy(hh, &state_next.V, 1.);

        state_next.t = t_next;

        self.advance_state();
        Ok(())
    }

    fn advance_state(&mut self) {
        std::mem::swap(&mut self.state, &mut self.state_next);
    }

    /// Run to the end time, recording the initial state and every step boundary.
    pub fn solve(mut self) -> Result<TimeSeries> {
        log::info!(
            "Trapezoidal integration: {} dofs, h = {:e}, end time = {}, {} steps",
            self.system.ndofs(),
            self.h,
            self.end_time,
            self.num_steps
        );

        let mut series = TimeSeries::with_capacity(self.num_steps + 1);
        series.push(&self.state, self.record_velocity);
        while self.step()? {
            series.push(&self.state, self.record_velocity);
        }

        log::info!("Trapezoidal integration finished at t = {}", self.state.t);
        Ok(series)
    }
}

/// Cholesky factorization of the dynamic stiffness for step `h`
fn factorize(system: &SystemMatrices, h: f64) -> Result<Cholesky> {
    Cholesky::new(system.dynamic_stiffness(h)).ok_or(Error::Factorization { time_step: h })
}

/// Integrate from the initial state `(U0, V0)` at t = 0 to `config.end_time`.
pub fn integrate<L: Load>(
    system: &SystemMatrices,
    config: &StepConfig,
    U0: &VectorD,
    V0: &VectorD,
    load: &L,
) -> Result<TimeSeries> {
    TrapezoidalSolver::new(system, config, U0, V0, load)?.solve()
}
