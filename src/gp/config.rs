//! GP run configuration.
//!
//! [`GpConfig`] holds all parameters of the generational loop.

/// Configuration for a genetic programming run.
///
/// # Builder Pattern
///
/// ```
/// use symreg::gp::GpConfig;
///
/// let config = GpConfig::default()
///     .with_population_size(200)
///     .with_max_length(30)
///     .with_seed(42);
/// assert_eq!(config.population_size, 200);
/// ```
#[derive(Debug, Clone)]
pub struct GpConfig {
    /// Number of individuals in the population.
    pub population_size: usize,

    /// Maximum number of generations before termination.
    pub max_generations: usize,

    /// Maximum tree length in nodes; initial targets are drawn uniformly
    /// from `1..=max_length`.
    pub max_length: usize,

    /// Hard tree depth ceiling.
    pub max_depth: usize,

    /// Probability of recombining two parents (otherwise the first parent
    /// is cloned).
    pub crossover_probability: f64,

    /// Probability of mutating an offspring.
    pub mutation_probability: f64,

    /// Per-child probability of forcing a leaf during initialization.
    pub irregularity_bias: f64,

    /// Fraction of the population preserved unchanged each generation.
    pub elite_ratio: f64,

    /// Tournament size used for parent selection.
    pub tournament_size: usize,

    /// Generations without improvement before stopping; 0 disables.
    pub stagnation_limit: usize,

    /// Global evaluation budget in individual evaluations; `None` is
    /// unlimited.
    pub budget: Option<u64>,

    /// Per-individual coefficient-tuning budget; 0 disables local search.
    pub local_iterations: usize,

    /// Random seed; `None` draws one from the system.
    pub seed: Option<u64>,
}

impl Default for GpConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 100,
            max_length: 50,
            max_depth: 10,
            crossover_probability: 0.9,
            mutation_probability: 0.25,
            irregularity_bias: 0.0,
            elite_ratio: 0.05,
            tournament_size: 3,
            stagnation_limit: 0,
            budget: None,
            local_iterations: 0,
            seed: None,
        }
    }
}

impl GpConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    pub fn with_max_length(mut self, n: usize) -> Self {
        self.max_length = n;
        self
    }

    pub fn with_max_depth(mut self, n: usize) -> Self {
        self.max_depth = n;
        self
    }

    pub fn with_crossover_probability(mut self, p: f64) -> Self {
        self.crossover_probability = p.clamp(0.0, 1.0);
        self
    }

    pub fn with_mutation_probability(mut self, p: f64) -> Self {
        self.mutation_probability = p.clamp(0.0, 1.0);
        self
    }

    pub fn with_irregularity_bias(mut self, bias: f64) -> Self {
        self.irregularity_bias = bias.clamp(0.0, 1.0);
        self
    }

    pub fn with_elite_ratio(mut self, ratio: f64) -> Self {
        self.elite_ratio = ratio.clamp(0.0, 1.0);
        self
    }

    pub fn with_tournament_size(mut self, k: usize) -> Self {
        self.tournament_size = k;
        self
    }

    pub fn with_stagnation_limit(mut self, limit: usize) -> Self {
        self.stagnation_limit = limit;
        self
    }

    pub fn with_budget(mut self, budget: u64) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn with_local_iterations(mut self, iterations: usize) -> Self {
        self.local_iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size < 2 {
            return Err("population_size must be at least 2".into());
        }
        if self.max_generations == 0 {
            return Err("max_generations must be at least 1".into());
        }
        if self.max_length == 0 {
            return Err("max_length must be at least 1".into());
        }
        if self.max_depth == 0 {
            return Err("max_depth must be at least 1".into());
        }
        let elite_count = (self.population_size as f64 * self.elite_ratio) as usize;
        if elite_count >= self.population_size {
            return Err("elite_ratio too high: elites fill entire population".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(GpConfig::default().validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = GpConfig::default()
            .with_population_size(60)
            .with_max_generations(20)
            .with_max_length(25)
            .with_max_depth(8)
            .with_crossover_probability(0.8)
            .with_mutation_probability(0.1)
            .with_elite_ratio(0.1)
            .with_tournament_size(5)
            .with_stagnation_limit(15)
            .with_budget(1000)
            .with_local_iterations(50)
            .with_seed(7);
        assert_eq!(config.population_size, 60);
        assert_eq!(config.max_generations, 20);
        assert_eq!(config.max_length, 25);
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.tournament_size, 5);
        assert_eq!(config.stagnation_limit, 15);
        assert_eq!(config.budget, Some(1000));
        assert_eq!(config.local_iterations, 50);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_probabilities_clamped() {
        let config = GpConfig::default()
            .with_crossover_probability(1.5)
            .with_mutation_probability(-0.5);
        assert!((config.crossover_probability - 1.0).abs() < 1e-12);
        assert!(config.mutation_probability.abs() < 1e-12);
    }

    #[test]
    fn test_invalid_configs_rejected() {
        assert!(GpConfig::default().with_population_size(1).validate().is_err());
        assert!(GpConfig::default().with_max_generations(0).validate().is_err());
        assert!(GpConfig::default().with_max_length(0).validate().is_err());
        assert!(GpConfig::default()
            .with_population_size(10)
            .with_elite_ratio(1.0)
            .validate()
            .is_err());
    }
}
