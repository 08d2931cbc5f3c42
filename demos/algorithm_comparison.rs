//! Monte Carlo comparison of every strategy family.
//!
//! Usage: `algorithm_comparison [mus] [sims] [horizon]`, e.g.
//! `algorithm_comparison 0.22,0.1,0.7 1000 200`. Defaults to Bernoulli arms
//! `0.1,0.3,0.2,0.8`, 5000 simulations and 300 trials.

use banditry::sim::{ArmSpec, MonteCarlo, Simulation};
use banditry::{BanditError, Result, StrategyConfig};

fn parse_arg<T: std::str::FromStr>(arg: Option<String>, default: T, what: &str) -> Result<T> {
    match arg {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|_| BanditError::InvalidParameter {
            message: format!("{what} '{raw}' malformed"),
        }),
    }
}

fn parse_mus(raw: &str) -> Result<Vec<f64>> {
    raw.split(',')
        .map(|mu| {
            mu.trim()
                .parse::<f64>()
                .map_err(|e| BanditError::InvalidParameter {
                    message: format!("mu '{mu}' malformed: {e}"),
                })
        })
        .collect()
}

fn report(config: &StrategyConfig, sim: &Simulation, best: &[usize]) {
    let accuracy = sim.accuracy(best);
    let performance = sim.performance();
    let cumulative = sim.cumulative();
    let at = |series: &[f64], trial: usize| series[(trial - 1).min(series.len() - 1)];
    let mid = sim.trials.div_ceil(2);

    println!(
        "  {:<24} {:>8.3} {:>8.3} {:>8.3} {:>10.1}",
        config.to_string(),
        at(&accuracy, mid),
        at(&accuracy, sim.trials),
        at(&performance, sim.trials),
        at(&cumulative, sim.trials),
    );
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("banditry=info".parse().expect("valid directive")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let mus = parse_mus(&args.next().unwrap_or_else(|| "0.1,0.3,0.2,0.8".to_string()))?;
    let defaults = MonteCarlo::default();
    let runner = MonteCarlo::new(
        parse_arg(args.next(), defaults.sims, "sims")?,
        parse_arg(args.next(), defaults.trials, "horizon")?,
    )
    .with_seed(2013);

    let arms = ArmSpec::bernoullis(&mus);
    let best = ArmSpec::best_arms(&arms);

    println!("Banditry: Multi-Armed Bandit Strategy Comparison\n");
    println!("{}", "=".repeat(64));
    println!("Bernoulli arms: {mus:?}");
    println!("Best arm(s): {best:?}");
    println!("{} simulations x {} trials", runner.sims, runner.trials);
    println!("{}", "=".repeat(64));

    let groups: [(&str, Vec<StrategyConfig>); 4] = [
        (
            "Epsilon Greedy",
            [0.1, 0.2, 0.3, 0.4, 0.5]
                .iter()
                .map(|&e| StrategyConfig::new("epsilon-greedy", &[e]))
                .collect(),
        ),
        (
            "Softmax",
            [0.1, 0.2, 0.3, 0.4, 0.5]
                .iter()
                .map(|&t| StrategyConfig::new("softmax", &[t]))
                .collect(),
        ),
        ("UCB1", vec![StrategyConfig::new("ucb1", &[])]),
        (
            "Thompson Sampling",
            [0.5, 1.0, 2.0]
                .iter()
                .map(|&a| StrategyConfig::new("thompson", &[a]))
                .collect(),
        ),
    ];

    for (name, configs) in &groups {
        println!("\n{name}");
        println!("{}", "-".repeat(name.len()));
        println!(
            "  {:<24} {:>8} {:>8} {:>8} {:>10}",
            "strategy", "acc@mid", "acc", "reward", "cumulative"
        );
        for config in configs {
            let sim = runner.run(|seed| config.build_seeded(arms.len(), seed), &arms)?;
            report(config, &sim, &best);
        }
    }

    Ok(())
}
