//! `rgql delays` – print the backoff schedule for the configured retry policy.

use anyhow::Result;
use rgql_core::config::RgqlConfig;

pub fn run_delays(cfg: &RgqlConfig) -> Result<()> {
    let policy = cfg.retry_policy();
    if !policy.enabled || policy.max_attempts <= 1 {
        println!("Retries disabled: every failure is final.");
        return Ok(());
    }

    println!(
        "max_attempts={} base={} jitter={}",
        policy.max_attempts, policy.exponential_base, policy.jitter
    );
    println!("{:<8} {:<12} {}", "RETRY", "DELAY", "JITTER RANGE");
    for index in 0..policy.max_attempts - 1 {
        let delay = policy.clamped_delay(index);
        let range = if policy.jitter {
            format!("{:.3}s - {:.3}s", delay.as_secs_f64() * 0.5, delay.as_secs_f64() * 1.5)
        } else {
            "-".to_string()
        };
        println!("{:<8} {:<12} {}", index + 1, format!("{:.3}s", delay.as_secs_f64()), range);
    }
    Ok(())
}
