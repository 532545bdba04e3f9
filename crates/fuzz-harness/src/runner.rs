//! Fuzz test runner
//!
//! Drives a proptest strategy through a check closure outside of `#[test]`,
//! so the same properties can run from the CLI with larger case counts.

use proptest::strategy::{Strategy, ValueTree};
use proptest::test_runner::{RngAlgorithm, TestRng, TestRunner};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

// ============================================================================
// Configuration
// ============================================================================

/// Fuzz test configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzConfig {
    /// Number of test cases to run
    pub cases: u32,
    /// Maximum shrink iterations on failure
    pub max_shrink_iters: u32,
    /// Random seed (0 = random)
    pub seed: u64,
    /// Failures recorded before a target stops early
    pub max_failures: usize,
}

impl Default for FuzzConfig {
    fn default() -> Self {
        Self {
            cases: 10_000,
            max_shrink_iters: 1000,
            seed: 0,
            max_failures: 20,
        }
    }
}

impl FuzzConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cases(mut self, n: u32) -> Self {
        self.cases = n;
        self
    }

    pub fn seed(mut self, s: u64) -> Self {
        self.seed = s;
        self
    }

    pub fn max_failures(mut self, n: usize) -> Self {
        self.max_failures = n;
        self
    }

    /// Generate proptest config from this
    pub fn to_proptest_config(&self) -> proptest::test_runner::Config {
        let mut config = proptest::test_runner::Config::default();
        config.cases = self.cases;
        config.max_shrink_iters = self.max_shrink_iters;
        if self.seed != 0 {
            config.rng_algorithm = RngAlgorithm::ChaCha;
        }
        config
    }

    fn test_runner(&self) -> TestRunner {
        let config = self.to_proptest_config();
        if self.seed == 0 {
            return TestRunner::new(config);
        }
        let mut seed = [0u8; 32];
        seed[..8].copy_from_slice(&self.seed.to_le_bytes());
        TestRunner::new_with_rng(config, TestRng::from_seed(RngAlgorithm::ChaCha, &seed))
    }
}

// ============================================================================
// Results
// ============================================================================

/// Result of a fuzz test run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzResult {
    pub name: String,
    pub cases_run: u64,
    pub cases_passed: u64,
    pub cases_failed: u64,
    pub duration_ms: u64,
    pub failures: Vec<FuzzFailure>,
    pub passed: bool,
}

impl FuzzResult {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            cases_run: 0,
            cases_passed: 0,
            cases_failed: 0,
            duration_ms: 0,
            failures: Vec::new(),
            passed: true,
        }
    }

    pub fn record_pass(&mut self) {
        self.cases_run += 1;
        self.cases_passed += 1;
    }

    pub fn record_fail(&mut self, failure: FuzzFailure) {
        self.cases_run += 1;
        self.cases_failed += 1;
        self.passed = false;
        self.failures.push(failure);
    }

    pub fn finalize(&mut self, duration: Duration) {
        self.duration_ms = duration.as_millis() as u64;
    }

    /// Cases per second
    pub fn throughput(&self) -> f64 {
        if self.duration_ms == 0 {
            return 0.0;
        }
        self.cases_run as f64 * 1000.0 / self.duration_ms as f64
    }

    /// Print summary to stdout
    pub fn print_summary(&self) {
        println!(
            "{:<32} {:>8} cases {:>6} failed {:>8.0} cases/s  {}",
            self.name,
            self.cases_run,
            self.cases_failed,
            self.throughput(),
            if self.passed { "PASSED" } else { "FAILED" }
        );
        for (i, f) in self.failures.iter().enumerate().take(5) {
            println!("  [{}] {}", i + 1, f.message);
            if let Some(ref input) = f.input {
                println!("      Input: {}", input);
            }
        }
        if self.failures.len() > 5 {
            println!("  ... and {} more", self.failures.len() - 5);
        }
    }
}

/// Details of a test failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzFailure {
    pub message: String,
    pub input: Option<String>,
}

// ============================================================================
// Runner
// ============================================================================

/// Main fuzz test runner
pub struct FuzzRunner {
    config: FuzzConfig,
    results: Vec<FuzzResult>,
}

impl FuzzRunner {
    pub fn new(config: FuzzConfig) -> Self {
        Self {
            config,
            results: Vec::new(),
        }
    }

    /// Run `check` against `config.cases` values drawn from `strategy`.
    pub fn run<S, F>(&mut self, name: &str, strategy: S, check: F) -> &FuzzResult
    where
        S: Strategy,
        S::Value: Debug,
        F: Fn(&S::Value) -> Result<(), String>,
    {
        let mut result = FuzzResult::new(name);
        let mut runner = self.config.test_runner();
        let start = Instant::now();

        for _ in 0..self.config.cases {
            let value = match strategy.new_tree(&mut runner) {
                Ok(tree) => tree.current(),
                Err(reason) => {
                    warn!(fuzz_target = name, %reason, "strategy rejected too many inputs");
                    break;
                }
            };
            match check(&value) {
                Ok(()) => result.record_pass(),
                Err(message) => result.record_fail(FuzzFailure {
                    message,
                    input: Some(format!("{:?}", value)),
                }),
            }
            if result.failures.len() >= self.config.max_failures {
                break;
            }
        }

        result.finalize(start.elapsed());
        debug!(fuzz_target = name, cases = result.cases_run, passed = result.passed, "fuzz target done");
        self.results.push(result);
        &self.results[self.results.len() - 1]
    }

    pub fn results(&self) -> &[FuzzResult] {
        &self.results
    }

    pub fn all_passed(&self) -> bool {
        self.results.iter().all(|r| r.passed)
    }

    /// Print summary of all tests
    pub fn print_all_summaries(&self) {
        for result in &self.results {
            result.print_summary();
        }

        let total_cases: u64 = self.results.iter().map(|r| r.cases_run).sum();
        let total_failed: u64 = self.results.iter().map(|r| r.cases_failed).sum();
        println!(
            "TOTAL: {} targets, {} cases, {} failed, {}",
            self.results.len(),
            total_cases,
            total_failed,
            if self.all_passed() { "ALL PASSED" } else { "SOME FAILED" }
        );
    }
}
