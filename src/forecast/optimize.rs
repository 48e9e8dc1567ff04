use argmin::core::{CostFunction, Error, Executor, State, TerminationReason};
use argmin::solver::neldermead::NelderMead;
use crate::forecast::ModelError;

/// Nelder-Mead settings for fitting the model objective.
#[derive(Debug, Clone)]
pub struct Minimizer {
    pub max_iter: usize,
    /// Stop once the objective values across the simplex have this standard deviation
    pub sd_tolerance: f64,
}

#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Non-finite objective values are reported as +inf so the simplex moves away from them.
struct Objective<F> {
    f: F,
}

impl<F: Fn(&[f64]) -> f64> CostFunction for Objective<F> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, Error> {
        let value = (self.f)(param);
        Ok(if value.is_finite() { value } else { f64::INFINITY })
    }
}

impl Default for Minimizer {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            sd_tolerance: 1e-8,
        }
    }
}

impl Minimizer {
    pub fn new(max_iter: usize) -> Self {
        Self { max_iter, ..Self::default() }
    }

    pub fn with_sd_tolerance(mut self, sd_tolerance: f64) -> Self {
        self.sd_tolerance = sd_tolerance;
        self
    }

    pub fn minimize<F>(&self, objective: F, start: &[f64]) -> Result<Minimum, ModelError>
    where
        F: Fn(&[f64]) -> f64,
    {
        let problem = Objective { f: objective };

        if start.is_empty() {
            let value = problem.cost(&Vec::new()).map_err(fit_error)?;
            return Ok(Minimum {
                x: Vec::new(),
                value,
                iterations: 0,
                converged: true,
            });
        }

        let solver = NelderMead::new(initial_simplex(start))
            .with_sd_tolerance(self.sd_tolerance)
            .map_err(fit_error)?;

        let result = Executor::new(problem, solver)
            .configure(|state| state.max_iters(self.max_iter as u64))
            .run()
            .map_err(fit_error)?;

        let state = result.state();
        let x = state
            .get_best_param()
            .cloned()
            .ok_or_else(|| ModelError::Fit("optimiser returned no parameters".to_string()))?;

        Ok(Minimum {
            x,
            value: state.get_best_cost(),
            iterations: state.get_iter() as usize,
            converged: !matches!(
                state.get_termination_reason(),
                Some(TerminationReason::MaxItersReached)
            ),
        })
    }
}

/// Start point plus one vertex per coordinate, each nudged by 5% (or 0.1 from zero).
fn initial_simplex(start: &[f64]) -> Vec<Vec<f64>> {
    let mut simplex = Vec::with_capacity(start.len() + 1);
    simplex.push(start.to_vec());
    for i in 0..start.len() {
        let mut vertex = start.to_vec();
        vertex[i] = if vertex[i] != 0.0 { vertex[i] * 1.05 } else { 0.1 };
        simplex.push(vertex);
    }
    simplex
}

fn fit_error(e: Error) -> ModelError {
    ModelError::Fit(format!("optimiser failed: {}", e))
}
