use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rebal_types::ChainMetric;

use crate::config::OptimizerConfig;
use crate::error::EngineError;
use crate::predictor::predict_apy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizedChain {
    pub chain_name: String,
    pub allocation: Decimal,
    pub predicted_apy: Decimal,
}

/// Result of one optimization run, with the statistics of the search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizationOutcome {
    pub chains: Vec<OptimizedChain>,
    pub iterations: usize,
    pub moves: usize,
    /// False when the search stopped on the iteration cap rather than on a pass without moves.
    pub converged: bool,
    pub daily_return_before: Decimal,
    pub daily_return_after: Decimal,
}

impl OptimizationOutcome {
    pub fn chain(&self, chain_name: &str) -> Option<&OptimizedChain> {
        self.chains.iter().find(|c| c.chain_name == chain_name)
    }

    pub fn total_allocation(&self) -> Decimal {
        self.chains.iter().map(|c| c.allocation).sum()
    }
}

/// Candidate transfer of one step from a source chain to a destination chain.
#[derive(Debug, Clone, Copy)]
struct PairMove {
    source_apy: Decimal,
    destination_apy: Decimal,
    gain: Decimal,
}

/// Greedy pairwise reallocation of a fixed fund across chains.
///
/// Each pass walks every ordered `(source, destination)` pair in snapshot order and
/// moves one `move_amount` step as soon as the pair's annual return improves by more
/// than `min_improvement`. Moves are committed immediately, so later pairs of the same
/// pass see the updated allocations and APYs. The search stops after a pass without
/// any move, or after `max_iterations` passes.
///
/// This is a local search: the result depends on the chain order and is not
/// guaranteed to be the global optimum.
#[derive(Debug, Clone, Copy)]
pub struct AllocationOptimizer {
    config: OptimizerConfig,
}

impl AllocationOptimizer {
    pub const fn new(config: OptimizerConfig) -> Self {
        Self { config }
    }

    pub const fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Optimize the allocation of `chains`, whose `current_allocation` holds the seed.
    pub fn optimize(
        &self,
        mut chains: Vec<ChainMetric>,
    ) -> Result<OptimizationOutcome, EngineError> {
        if chains.is_empty() {
            return Err(EngineError::NoChainData);
        }

        let move_amount = self.config.move_amount;
        let daily_return_before = aggregate_daily_return(&chains);

        let mut iterations = 0;
        let mut moves = 0;
        let mut converged = false;

        for iteration in 1..=self.config.max_iterations {
            iterations = iteration;
            let mut improved = false;

            for i in 0..chains.len() {
                for j in 0..chains.len() {
                    if i == j {
                        continue;
                    }

                    let Some(pair_move) = self.evaluate_move(&chains[i], &chains[j]) else {
                        continue;
                    };

                    let source = &mut chains[i];
                    source.current_allocation -= move_amount;
                    source.current_apy = pair_move.source_apy;

                    let destination = &mut chains[j];
                    destination.current_allocation += move_amount;
                    destination.current_apy = pair_move.destination_apy;

                    tracing::debug!(
                        iteration,
                        from = %chains[i].chain_name,
                        to = %chains[j].chain_name,
                        amount = %move_amount,
                        gain = %pair_move.gain,
                        "Committed rebalance move"
                    );

                    moves += 1;
                    improved = true;
                }
            }

            if !improved {
                converged = true;
                break;
            }
        }

        let daily_return_after = aggregate_daily_return(&chains);

        Ok(OptimizationOutcome {
            chains: chains
                .into_iter()
                .map(|c| OptimizedChain {
                    chain_name: c.chain_name,
                    allocation: c.current_allocation,
                    predicted_apy: c.current_apy,
                })
                .collect(),
            iterations,
            moves,
            converged,
            daily_return_before,
            daily_return_after,
        })
    }

    fn evaluate_move(&self, source: &ChainMetric, destination: &ChainMetric) -> Option<PairMove> {
        let move_amount = self.config.move_amount;
        if source.current_allocation < move_amount {
            return None;
        }

        let source_apy = predict_apy(
            source.current_apy,
            source.total_liquidity,
            -move_amount,
            source.elasticity_factor,
        );
        let destination_apy = predict_apy(
            destination.current_apy,
            destination.total_liquidity,
            move_amount,
            destination.elasticity_factor,
        );

        let current_return = annual_return(source.current_allocation, source.current_apy)
            + annual_return(destination.current_allocation, destination.current_apy);
        let potential_return = annual_return(source.current_allocation - move_amount, source_apy)
            + annual_return(destination.current_allocation + move_amount, destination_apy);

        (potential_return > current_return + self.config.min_improvement).then_some(PairMove {
            source_apy,
            destination_apy,
            gain: potential_return - current_return,
        })
    }
}

fn annual_return(allocation: Decimal, apy: Decimal) -> Decimal {
    allocation * apy / Decimal::ONE_HUNDRED
}

/// Expected daily dollar return of a set of chains at their current APYs.
pub fn aggregate_daily_return(chains: &[ChainMetric]) -> Decimal {
    chains.iter().map(ChainMetric::daily_return).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    fn chain(
        name: &str,
        allocation: Decimal,
        apy: Decimal,
        liquidity: Decimal,
        elasticity: Decimal,
    ) -> ChainMetric {
        ChainMetric {
            chain_name: name.to_string(),
            current_apy: apy,
            current_utilization: dec!(75),
            total_liquidity: liquidity,
            elasticity_factor: elasticity,
            current_allocation: allocation,
        }
    }

    fn total(chains: &[ChainMetric]) -> Decimal {
        chains.iter().map(|c| c.current_allocation).sum()
    }

    fn optimizer() -> AllocationOptimizer {
        AllocationOptimizer::new(OptimizerConfig::default())
    }

    #[test]
    fn test_moves_funds_towards_higher_yield_chain() {
        let chains = vec![
            chain("a", dec!(4_000_000), dec!(4.0), dec!(100_000_000), dec!(0.1)),
            chain("b", dec!(1_000_000), dec!(6.0), dec!(20_000_000), dec!(0.2)),
        ];

        let outcome = optimizer().optimize(chains).unwrap();

        let a = outcome.chain("a").unwrap();
        let b = outcome.chain("b").unwrap();
        assert!(a.allocation < dec!(4_000_000));
        assert!(b.allocation > dec!(1_000_000));
        assert_eq!(outcome.total_allocation(), dec!(5_000_000));

        // One A -> B step per pass, the reverse move never pays, so the cap is hit
        assert_eq!(outcome.iterations, 10);
        assert_eq!(outcome.moves, 10);
        assert!(!outcome.converged);
        assert_eq!(a.allocation, dec!(3_000_000));
        assert_eq!(b.allocation, dec!(2_000_000));
        assert_eq!(a.predicted_apy, dec!(3.9));
        assert_eq!(b.predicted_apy, dec!(7.0));
        assert!(outcome.daily_return_after > outcome.daily_return_before);
    }

    #[test]
    fn test_conservation_across_many_chains() {
        let chains = vec![
            chain("ethereum", dec!(2_500_000), dec!(3.2), dec!(400_000_000), dec!(0.05)),
            chain("arbitrum", dec!(1_200_000), dec!(5.9), dec!(35_000_000), dec!(0.25)),
            chain("base", dec!(800_000), dec!(7.4), dec!(12_000_000), dec!(0.4)),
            chain("polygon", dec!(500_000), dec!(2.1), dec!(8_000_000), dec!(0.15)),
        ];
        let before = total(&chains);

        let outcome = optimizer().optimize(chains).unwrap();

        assert_eq!(outcome.total_allocation(), before);
        assert!(outcome.iterations <= 10);
        assert!(outcome.daily_return_after >= outcome.daily_return_before);
        assert!(outcome.chains.iter().all(|c| c.allocation >= Decimal::ZERO));
        assert!(outcome.chains.iter().all(|c| c.predicted_apy >= Decimal::ZERO));
    }

    #[test]
    fn test_single_chain_is_unchanged() {
        let chains = vec![chain(
            "ethereum",
            dec!(5_000_000),
            dec!(4.2),
            dec!(100_000_000),
            dec!(0.1),
        )];

        let outcome = optimizer().optimize(chains).unwrap();

        assert_eq!(outcome.moves, 0);
        assert_eq!(outcome.iterations, 1);
        assert!(outcome.converged);
        assert_eq!(outcome.chains[0].allocation, dec!(5_000_000));
        assert_eq!(outcome.chains[0].predicted_apy, dec!(4.2));
        assert_eq!(outcome.daily_return_after, outcome.daily_return_before);
    }

    #[test]
    fn test_allocations_below_step_are_not_moved() {
        let chains = vec![
            chain("a", dec!(99_999), dec!(1.0), dec!(10_000_000), dec!(0.1)),
            chain("b", dec!(50_000), dec!(9.0), dec!(10_000_000), dec!(0.1)),
        ];

        let outcome = optimizer().optimize(chains).unwrap();

        assert_eq!(outcome.moves, 0);
        assert!(outcome.converged);
        assert_eq!(outcome.chain("a").unwrap().allocation, dec!(99_999));
        assert_eq!(outcome.chain("b").unwrap().allocation, dec!(50_000));
    }

    #[test]
    fn test_equilibrium_converges_without_moves() {
        // Inflows dilute the rate on both chains, so no step pays off
        let chains = vec![
            chain("a", dec!(1_000_000), dec!(5.0), dec!(10_000_000), dec!(-0.1)),
            chain("b", dec!(1_000_000), dec!(5.0), dec!(10_000_000), dec!(-0.1)),
        ];

        let outcome = optimizer().optimize(chains).unwrap();

        assert!(outcome.converged);
        assert_eq!(outcome.moves, 0);
        assert_eq!(outcome.chain("a").unwrap().predicted_apy, dec!(5.0));
    }

    #[test]
    fn test_empty_set_reports_no_data() {
        let result = optimizer().optimize(Vec::new());
        assert!(matches!(result, Err(EngineError::NoChainData)));
    }

    #[test]
    fn test_chain_without_seed_can_receive_funds() {
        let chains = vec![
            chain("a", dec!(1_000_000), dec!(2.0), dec!(500_000_000), dec!(0.01)),
            chain("b", Decimal::ZERO, dec!(8.0), dec!(500_000_000), dec!(0.01)),
        ];

        let outcome = optimizer().optimize(chains).unwrap();

        assert!(outcome.chain("b").unwrap().allocation > Decimal::ZERO);
        assert_eq!(outcome.total_allocation(), dec!(1_000_000));
    }

    #[test]
    fn test_deterministic() {
        let chains = vec![
            chain("a", dec!(3_000_000), dec!(4.5), dec!(60_000_000), dec!(0.12)),
            chain("b", dec!(1_500_000), dec!(5.5), dec!(25_000_000), dec!(0.18)),
            chain("c", dec!(500_000), dec!(6.5), dec!(9_000_000), dec!(0.3)),
        ];

        let first = optimizer().optimize(chains.clone()).unwrap();
        let second = optimizer().optimize(chains).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_iteration_cap_is_respected() {
        let config = OptimizerConfig {
            max_iterations: 3,
            ..OptimizerConfig::default()
        };
        let chains = vec![
            chain("a", dec!(4_000_000), dec!(4.0), dec!(100_000_000), dec!(0.1)),
            chain("b", dec!(1_000_000), dec!(6.0), dec!(20_000_000), dec!(0.2)),
        ];

        let outcome = AllocationOptimizer::new(config).optimize(chains).unwrap();

        assert_eq!(outcome.iterations, 3);
        assert_eq!(outcome.chain("b").unwrap().allocation, dec!(1_300_000));
    }
}
